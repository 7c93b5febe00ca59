// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

use super::analytics::{self, AnalyticsInput};
use crate::entrypoints::Entrypoint;
use crate::error::AppError;
use crate::exchange_rates::{
    self, ConvertInput, ConvertParams, HistoricalInput, HistoricalParams, RatesInput,
    RatesParams, ReportInput, ReportParams, TimeseriesInput, TimeseriesParams,
};
use crate::payments::{
    NewTransaction, PriceEntry, SettleResponse, VerifiedPayment, PAYMENT_HEADER,
    PAYMENT_RESPONSE_HEADER,
};
use crate::state::AppContext;

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/entrypoints", get(list_entrypoints))
        .route("/entrypoints/{key}/invoke", post(invoke))
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct InvokeRequest {
    #[serde(default)]
    input: Value,
}

/// A validated invocation, ready to run
#[derive(Debug)]
enum Call {
    Overview,
    Convert(ConvertParams),
    Rates(RatesParams),
    Historical(HistoricalParams),
    Timeseries(TimeseriesParams),
    Report(ReportParams),
    Analytics(AnalyticsInput),
    AnalyticsTransactions(AnalyticsInput),
    AnalyticsCsv(AnalyticsInput),
}

/// Absent input reads as an empty object so optional-only inputs fall back to defaults
fn parse_input<T: DeserializeOwned>(input: Value) -> Result<T, AppError> {
    let input = if input.is_null() { json!({}) } else { input };
    Ok(serde_json::from_value(input)?)
}

impl Call {
    fn parse(entrypoint: Entrypoint, input: Value) -> Result<Self, AppError> {
        let call = match entrypoint {
            Entrypoint::Overview => Call::Overview,
            Entrypoint::Convert => Call::Convert(
                parse_input::<ConvertInput>(input)?
                    .validate()
                    .map_err(AppError::bad_request)?,
            ),
            Entrypoint::Rates => Call::Rates(
                parse_input::<RatesInput>(input)?
                    .validate()
                    .map_err(AppError::bad_request)?,
            ),
            Entrypoint::Historical => Call::Historical(
                parse_input::<HistoricalInput>(input)?
                    .validate()
                    .map_err(AppError::bad_request)?,
            ),
            Entrypoint::Timeseries => Call::Timeseries(
                parse_input::<TimeseriesInput>(input)?
                    .validate()
                    .map_err(AppError::bad_request)?,
            ),
            Entrypoint::Report => Call::Report(
                parse_input::<ReportInput>(input)?
                    .validate()
                    .map_err(AppError::bad_request)?,
            ),
            Entrypoint::Analytics => Call::Analytics(parse_input(input)?),
            Entrypoint::AnalyticsTransactions => Call::AnalyticsTransactions(parse_input(input)?),
            Entrypoint::AnalyticsCsv => Call::AnalyticsCsv(parse_input(input)?),
        };
        Ok(call)
    }
}

fn to_output<T: Serialize>(value: T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

async fn run(ctx: &AppContext, call: Call) -> Result<Value, AppError> {
    let client = ctx.rates.as_ref();
    let tracker = ctx.tracker.as_deref();
    match call {
        Call::Overview => to_output(
            exchange_rates::overview(client)
                .await
                .map_err(AppError::upstream)?,
        ),
        Call::Convert(params) => to_output(
            exchange_rates::convert(client, params)
                .await
                .map_err(AppError::upstream)?,
        ),
        Call::Rates(params) => to_output(
            exchange_rates::rates(client, params)
                .await
                .map_err(AppError::upstream)?,
        ),
        Call::Historical(params) => to_output(
            exchange_rates::historical(client, params)
                .await
                .map_err(AppError::upstream)?,
        ),
        Call::Timeseries(params) => to_output(
            exchange_rates::timeseries(client, params)
                .await
                .map_err(AppError::upstream)?,
        ),
        Call::Report(params) => to_output(
            exchange_rates::report(client, params)
                .await
                .map_err(AppError::upstream)?,
        ),
        Call::Analytics(input) => Ok(analytics::summary(tracker, input).await),
        Call::AnalyticsTransactions(input) => Ok(analytics::transactions(tracker, input).await),
        Call::AnalyticsCsv(input) => Ok(analytics::csv(tracker, input).await),
    }
}

async fn list_entrypoints(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let enabled = ctx.payments_enabled();
    let entrypoints: Vec<PriceEntry> = ctx
        .pricing
        .entries()
        .into_iter()
        .map(|entry| {
            if enabled {
                entry
            } else {
                PriceEntry {
                    price: 0,
                    paid: false,
                    ..entry
                }
            }
        })
        .collect();
    Json(json!({
        "paymentsEnabled": enabled,
        "entrypoints": entrypoints,
    }))
}

/// x402 carries the settlement as base64-encoded JSON
fn encode_settlement(settlement: &SettleResponse) -> Result<HeaderValue, AppError> {
    let json = serde_json::to_vec(settlement).map_err(|e| AppError::Internal(e.to_string()))?;
    HeaderValue::from_str(&BASE64.encode(json)).map_err(|e| AppError::Internal(e.to_string()))
}

async fn record_settlement(
    ctx: &AppContext,
    entrypoint: Entrypoint,
    price: u64,
    payment: &VerifiedPayment,
    settlement: &SettleResponse,
) {
    let Some(tracker) = &ctx.tracker else {
        return;
    };
    let tx = NewTransaction {
        entrypoint: entrypoint.key().to_string(),
        amount: price,
        payer: settlement.payer.clone().or_else(|| payment.payer.clone()),
        network: settlement
            .network
            .clone()
            .unwrap_or_else(|| payment.requirements.network.clone()),
        transaction: settlement.transaction.clone(),
    };
    if let Err(e) = tracker.record(tx).await {
        tracing::warn!(%entrypoint, error = %e, "failed to record settled payment");
    }
}

async fn invoke(
    State(ctx): State<Arc<AppContext>>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let entrypoint: Entrypoint = key
        .parse()
        .map_err(|_| AppError::NotFound(format!("unknown entrypoint '{}'", key)))?;

    let request: InvokeRequest = if body.iter().all(u8::is_ascii_whitespace) {
        InvokeRequest::default()
    } else {
        serde_json::from_slice(&body)?
    };
    let call = Call::parse(entrypoint, request.input)?;

    let price = ctx.effective_price(entrypoint);
    let payment = match &ctx.paywall {
        Some(paywall) if price > 0 => {
            let header = headers
                .get(PAYMENT_HEADER)
                .and_then(|value| value.to_str().ok());
            Some(paywall.verify(header, entrypoint, price).await?)
        }
        _ => None,
    };

    let started = Instant::now();
    let output = match run(&ctx, call).await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(%entrypoint, error = %e, "entrypoint failed");
            return Err(e);
        }
    };
    tracing::info!(
        %entrypoint,
        price,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "entrypoint succeeded"
    );

    let mut response = Json(json!({
        "status": "succeeded",
        "entrypoint": entrypoint.key(),
        "output": output,
    }))
    .into_response();

    if let (Some(paywall), Some(payment)) = (&ctx.paywall, payment) {
        let settlement = paywall.settle(&payment).await?;
        tracing::info!(
            %entrypoint,
            amount = price,
            transaction = settlement.transaction.as_deref().unwrap_or("-"),
            "payment settled"
        );
        record_settlement(&ctx, entrypoint, price, &payment, &settlement).await;

        let value = encode_settlement(&settlement)?;
        response.headers_mut().insert(PAYMENT_RESPONSE_HEADER, value);
    }

    Ok(response)
}
