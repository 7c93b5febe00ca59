// SPDX-FileCopyrightText: 2025 Joost van der Laan
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::RatesClientTrait;
use crate::models::{
    compute_report, compute_stats, convert_amount, major_symbols_for, normalize_currency_code,
    parse_symbols_csv, round_rate, Currencies, LatestRates, PairReport, RateSeries, SymbolStats,
    DEFAULT_BASE, REPORT_WINDOW_DAYS, SAMPLE_SYMBOLS,
};

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("{} must be a date in YYYY-MM-DD format, got '{}'", field, value))
}

fn parse_base(base: Option<&str>) -> Result<String> {
    match base.map(str::trim).filter(|b| !b.is_empty()) {
        Some(base) => normalize_currency_code(base),
        None => Ok(DEFAULT_BASE.to_string()),
    }
}

fn parse_optional_symbols(symbols: Option<&str>) -> Result<Vec<String>> {
    symbols.map(parse_symbols_csv).unwrap_or_else(|| Ok(Vec::new()))
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// Inputs, as sent by callers

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConvertInput {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RatesInput {
    pub base: Option<String>,
    pub symbols: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HistoricalInput {
    pub date: String,
    pub base: Option<String>,
    pub symbols: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TimeseriesInput {
    pub start_date: String,
    pub end_date: String,
    pub base: Option<String>,
    pub symbols: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReportInput {
    pub base: Option<String>,
}

// Validated parameters

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertParams {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatesParams {
    pub base: String,
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalParams {
    pub date: NaiveDate,
    pub base: String,
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeseriesParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub base: String,
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportParams {
    pub base: String,
    /// Last day of the report window
    pub end_date: NaiveDate,
}

impl ConvertInput {
    pub fn validate(self) -> Result<ConvertParams> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            anyhow::bail!("amount must be a positive number");
        }
        Ok(ConvertParams {
            from: normalize_currency_code(&self.from)?,
            to: normalize_currency_code(&self.to)?,
            amount: self.amount,
        })
    }
}

impl RatesInput {
    pub fn validate(self) -> Result<RatesParams> {
        Ok(RatesParams {
            base: parse_base(self.base.as_deref())?,
            symbols: parse_optional_symbols(self.symbols.as_deref())?,
        })
    }
}

impl HistoricalInput {
    pub fn validate(self) -> Result<HistoricalParams> {
        let date = parse_date("date", &self.date)?;
        if date > today() {
            anyhow::bail!("date {} is in the future", date);
        }
        Ok(HistoricalParams {
            date,
            base: parse_base(self.base.as_deref())?,
            symbols: parse_optional_symbols(self.symbols.as_deref())?,
        })
    }
}

impl TimeseriesInput {
    pub fn validate(self) -> Result<TimeseriesParams> {
        let start_date = parse_date("startDate", &self.start_date)?;
        let end_date = parse_date("endDate", &self.end_date)?;
        if start_date > end_date {
            anyhow::bail!("startDate {} is after endDate {}", start_date, end_date);
        }
        let symbols = parse_symbols_csv(&self.symbols)?;
        if symbols.is_empty() {
            anyhow::bail!("symbols must list at least one currency code");
        }
        Ok(TimeseriesParams {
            start_date,
            end_date,
            base: parse_base(self.base.as_deref())?,
            symbols,
        })
    }
}

impl ReportInput {
    pub fn validate(self) -> Result<ReportParams> {
        Ok(ReportParams {
            base: parse_base(self.base.as_deref())?,
            end_date: today(),
        })
    }
}

// Outputs

#[derive(Debug, Clone, Serialize)]
pub struct RatesOutput {
    pub base: String,
    pub date: NaiveDate,
    pub rates: BTreeMap<String, f64>,
}

impl From<LatestRates> for RatesOutput {
    fn from(latest: LatestRates) -> Self {
        Self {
            base: latest.base,
            date: latest.date,
            rates: latest.rates,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewOutput {
    pub currencies: Currencies,
    pub count: usize,
    pub sample_rates: RatesOutput,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertOutput {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub converted: f64,
    pub rate: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesOutput {
    pub base: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rates: RateSeries,
    pub stats: BTreeMap<String, SymbolStats>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutput {
    pub base: String,
    pub generated_at: DateTime<Utc>,
    pub period: ReportPeriod,
    pub pairs: BTreeMap<String, PairReport>,
}

// Operations

/// Currency list plus a handful of USD sample rates, fetched concurrently
pub async fn overview(client: &dyn RatesClientTrait) -> Result<OverviewOutput> {
    let sample: Vec<String> = SAMPLE_SYMBOLS.iter().map(|s| s.to_string()).collect();
    let (currencies, latest) = futures::try_join!(
        client.get_currencies(),
        client.get_latest(DEFAULT_BASE, &sample)
    )?;

    Ok(OverviewOutput {
        count: currencies.len(),
        currencies,
        sample_rates: latest.into(),
        timestamp: Utc::now(),
    })
}

pub async fn convert(client: &dyn RatesClientTrait, params: ConvertParams) -> Result<ConvertOutput> {
    let (rate, date) = if params.from == params.to {
        (1.0, today())
    } else {
        let latest = client
            .get_latest(&params.from, std::slice::from_ref(&params.to))
            .await?;
        let rate = latest
            .rates
            .get(&params.to)
            .copied()
            .with_context(|| format!("No rate returned for {} to {}", params.from, params.to))?;
        (rate, latest.date)
    };

    Ok(ConvertOutput {
        converted: convert_amount(params.amount, rate),
        rate: round_rate(rate),
        from: params.from,
        to: params.to,
        amount: params.amount,
        date,
    })
}

pub async fn rates(client: &dyn RatesClientTrait, params: RatesParams) -> Result<RatesOutput> {
    let latest = client.get_latest(&params.base, &params.symbols).await?;
    Ok(latest.into())
}

pub async fn historical(
    client: &dyn RatesClientTrait,
    params: HistoricalParams,
) -> Result<RatesOutput> {
    let rates = client
        .get_historical(params.date, &params.base, &params.symbols)
        .await?;
    Ok(rates.into())
}

pub async fn timeseries(
    client: &dyn RatesClientTrait,
    params: TimeseriesParams,
) -> Result<TimeseriesOutput> {
    let series = client
        .get_timeseries(params.start_date, params.end_date, &params.base, &params.symbols)
        .await?;
    let stats = compute_stats(series.rates.values(), &params.symbols);

    Ok(TimeseriesOutput {
        base: series.base,
        start_date: series.start_date,
        end_date: series.end_date,
        rates: series.rates,
        stats,
    })
}

/// Current rates, 30-day stats and volatility for the major currencies
pub async fn report(client: &dyn RatesClientTrait, params: ReportParams) -> Result<ReportOutput> {
    let symbols = major_symbols_for(&params.base);
    let start_date = params.end_date - Duration::days(REPORT_WINDOW_DAYS);

    let (latest, series) = futures::try_join!(
        client.get_latest(&params.base, &symbols),
        client.get_timeseries(start_date, params.end_date, &params.base, &symbols)
    )?;

    let pairs = compute_report(series.rates.values(), &latest.rates, &symbols);

    Ok(ReportOutput {
        base: params.base,
        generated_at: Utc::now(),
        period: ReportPeriod {
            start_date,
            end_date: params.end_date,
        },
        pairs,
    })
}
