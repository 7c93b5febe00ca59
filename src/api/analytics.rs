// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Read-only payment analytics. These never fail the request: when the
//! tracker is missing or errors, the payload is empty and carries an `error`.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::payments::{format_amount, AnalyticsSummary, PaymentTracker};

pub const DEFAULT_TRANSACTION_LIMIT: usize = 50;
pub const MAX_TRANSACTION_LIMIT: usize = 1_000;

/// USDC has 6 decimals
const ASSET_DECIMALS: u32 = 6;

const TRACKER_UNAVAILABLE: &str = "payment tracker unavailable";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnalyticsInput {
    pub window_ms: Option<u64>,
    pub limit: Option<usize>,
}

impl AnalyticsInput {
    fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_TRANSACTION_LIMIT)
            .clamp(1, MAX_TRANSACTION_LIMIT)
    }
}

fn summary_payload(summary: &AnalyticsSummary) -> Value {
    let mut payload = serde_json::to_value(summary).unwrap_or_else(|_| json!({}));
    payload["totalRevenueFormatted"] = json!(format_amount(summary.total_revenue, ASSET_DECIMALS));
    payload
}

fn empty_summary(window_ms: Option<u64>, error: &str) -> Value {
    let mut payload = summary_payload(&AnalyticsSummary {
        window_ms,
        ..AnalyticsSummary::default()
    });
    payload["error"] = json!(error);
    payload
}

pub async fn summary(tracker: Option<&dyn PaymentTracker>, input: AnalyticsInput) -> Value {
    let Some(tracker) = tracker else {
        return empty_summary(input.window_ms, TRACKER_UNAVAILABLE);
    };
    match tracker.summary(input.window_ms).await {
        Ok(summary) => summary_payload(&summary),
        Err(e) => {
            tracing::warn!(error = %e, "analytics summary failed");
            empty_summary(input.window_ms, &e.to_string())
        }
    }
}

pub async fn transactions(tracker: Option<&dyn PaymentTracker>, input: AnalyticsInput) -> Value {
    let empty = |error: &str| {
        json!({
            "windowMs": input.window_ms,
            "transactions": [],
            "count": 0,
            "error": error,
        })
    };
    let Some(tracker) = tracker else {
        return empty(TRACKER_UNAVAILABLE);
    };
    match tracker.transactions(input.window_ms, Some(input.limit())).await {
        Ok(transactions) => json!({
            "windowMs": input.window_ms,
            "count": transactions.len(),
            "transactions": transactions,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "analytics transactions failed");
            empty(&e.to_string())
        }
    }
}

pub async fn csv(tracker: Option<&dyn PaymentTracker>, input: AnalyticsInput) -> Value {
    let empty = |error: &str| json!({ "windowMs": input.window_ms, "csv": "", "error": error });
    let Some(tracker) = tracker else {
        return empty(TRACKER_UNAVAILABLE);
    };
    match tracker.export_csv(input.window_ms).await {
        Ok(csv) => json!({ "windowMs": input.window_ms, "csv": csv }),
        Err(e) => {
            tracing::warn!(error = %e, "analytics csv export failed");
            empty(&e.to_string())
        }
    }
}
