// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::models::{Currencies, LatestRates, TimeSeries};

pub const DEFAULT_BASE_URL: &str = "https://api.frankfurter.app";

/// Read-only access to an upstream exchange rate source
#[async_trait::async_trait]
pub trait RatesClientTrait: Send + Sync {
    async fn get_currencies(&self) -> Result<Currencies>;
    async fn get_latest(&self, base: &str, symbols: &[String]) -> Result<LatestRates>;
    async fn get_historical(
        &self,
        date: NaiveDate,
        base: &str,
        symbols: &[String],
    ) -> Result<LatestRates>;
    async fn get_timeseries(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        base: &str,
        symbols: &[String],
    ) -> Result<TimeSeries>;
}

/// Client for the Frankfurter API
#[derive(Clone)]
pub struct FrankfurterClient {
    client: Client,
    base_url: String,
}

impl FrankfurterClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn rates_query(base: &str, symbols: &[String]) -> Vec<(&'static str, String)> {
        let mut query = vec![("base", base.to_string())];
        if !symbols.is_empty() {
            query.push(("symbols", symbols.join(",")));
        }
        query
    }

    async fn make_request<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(%url, ?query, "upstream request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        let text = response.text().await.context("Failed to get response text")?;

        if !status.is_success() {
            anyhow::bail!("Upstream request to {} failed: {} - {}", url, status, text);
        }

        serde_json::from_str(&text).with_context(|| format!("Failed to parse response from {}", url))
    }
}

#[async_trait::async_trait]
impl RatesClientTrait for FrankfurterClient {
    async fn get_currencies(&self) -> Result<Currencies> {
        self.make_request("currencies", &[]).await
    }

    async fn get_latest(&self, base: &str, symbols: &[String]) -> Result<LatestRates> {
        self.make_request("latest", &Self::rates_query(base, symbols))
            .await
    }

    async fn get_historical(
        &self,
        date: NaiveDate,
        base: &str,
        symbols: &[String],
    ) -> Result<LatestRates> {
        let path = date.format("%Y-%m-%d").to_string();
        self.make_request(&path, &Self::rates_query(base, symbols))
            .await
    }

    async fn get_timeseries(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        base: &str,
        symbols: &[String],
    ) -> Result<TimeSeries> {
        let path = format!(
            "{}..{}",
            start_date.format("%Y-%m-%d"),
            end_date.format("%Y-%m-%d")
        );
        self.make_request(&path, &Self::rates_query(base, symbols))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    /// Serve a tiny Frankfurter look-alike on a random local port
    async fn spawn_upstream() -> String {
        async fn currencies() -> Json<Value> {
            Json(json!({"EUR": "Euro", "USD": "United States Dollar"}))
        }

        async fn latest(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
            Json(json!({
                "amount": 1.0,
                "base": q.get("base").cloned().unwrap_or_default(),
                "date": "2024-03-01",
                "rates": {"EUR": 0.9234},
                "echo_symbols": q.get("symbols"),
            }))
        }

        async fn by_path(
            Path(segment): Path<String>,
            Query(q): Query<HashMap<String, String>>,
        ) -> Result<Json<Value>, StatusCode> {
            let base = q.get("base").cloned().unwrap_or_default();
            if base == "XXX" {
                return Err(StatusCode::NOT_FOUND);
            }
            if let Some((start, end)) = segment.split_once("..") {
                return Ok(Json(json!({
                    "amount": 1.0,
                    "base": base,
                    "start_date": start,
                    "end_date": end,
                    "rates": {
                        start: {"EUR": 0.90},
                        end: {"EUR": 0.92}
                    }
                })));
            }
            Ok(Json(json!({
                "amount": 1.0,
                "base": base,
                "date": segment,
                "rates": {"EUR": 0.8812}
            })))
        }

        let app = Router::new()
            .route("/currencies", get(currencies))
            .route("/latest", get(latest))
            .route("/{segment}", get(by_path));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_get_currencies() -> Result<()> {
        let client = FrankfurterClient::new(spawn_upstream().await);
        let currencies = client.get_currencies().await?;
        assert_eq!(currencies.len(), 2);
        assert_eq!(currencies["EUR"], "Euro");
        Ok(())
    }

    #[tokio::test]
    async fn test_get_latest() -> Result<()> {
        let client = FrankfurterClient::new(spawn_upstream().await);
        let latest = client
            .get_latest("USD", &["EUR".to_string(), "GBP".to_string()])
            .await?;
        assert_eq!(latest.base, "USD");
        assert_eq!(latest.date, date("2024-03-01"));
        assert_eq!(latest.rates["EUR"], 0.9234);
        Ok(())
    }

    #[tokio::test]
    async fn test_symbols_sent_as_csv_and_omitted_when_empty() -> Result<()> {
        let client = FrankfurterClient::new(spawn_upstream().await);

        let symbols = ["EUR".to_string(), "GBP".to_string()];
        let raw: Value = client
            .make_request("latest", &FrankfurterClient::rates_query("USD", &symbols))
            .await?;
        assert_eq!(raw["base"], "USD");
        assert_eq!(raw["echo_symbols"], "EUR,GBP");

        let raw: Value = client
            .make_request("latest", &FrankfurterClient::rates_query("USD", &[]))
            .await?;
        assert!(raw["echo_symbols"].is_null());
        Ok(())
    }

    #[test]
    fn test_rates_query() {
        let query = FrankfurterClient::rates_query("EUR", &[]);
        assert_eq!(query, vec![("base", "EUR".to_string())]);

        let query = FrankfurterClient::rates_query("EUR", &["JPY".to_string(), "CHF".to_string()]);
        assert_eq!(
            query,
            vec![("base", "EUR".to_string()), ("symbols", "JPY,CHF".to_string())]
        );
    }

    #[tokio::test]
    async fn test_get_historical_and_timeseries() -> Result<()> {
        let client = FrankfurterClient::new(format!("{}/", spawn_upstream().await));

        let historical = client
            .get_historical(date("2023-12-29"), "USD", &[])
            .await?;
        assert_eq!(historical.date, date("2023-12-29"));

        let series = client
            .get_timeseries(date("2024-01-01"), date("2024-01-31"), "USD", &["EUR".to_string()])
            .await?;
        assert_eq!(series.start_date, date("2024-01-01"));
        assert_eq!(series.end_date, date("2024-01-31"));
        assert_eq!(series.rates.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let client = FrankfurterClient::new(spawn_upstream().await);
        let result = client.get_historical(date("2024-01-02"), "XXX", &[]).await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("404"), "unexpected error: {}", err);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_an_error() {
        // Bind and drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = FrankfurterClient::new(format!("http://{}", addr));
        assert!(client.get_currencies().await.is_err());
    }
}
