// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Currency code to display name, as returned by `/currencies`
pub type Currencies = BTreeMap<String, String>;

/// Rates for a single date. Upstream may send `null` for a missing rate.
pub type RateSnapshot = BTreeMap<String, Option<f64>>;

/// Date ordered rate snapshots
pub type RateSeries = BTreeMap<NaiveDate, RateSnapshot>;

/// Response of `/latest` and `/{date}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestRates {
    #[serde(default)]
    pub amount: Option<f64>,
    pub base: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub rates: BTreeMap<String, f64>,
}

/// Response of `/{start}..{end}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    #[serde(default)]
    pub amount: Option<f64>,
    pub base: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub rates: RateSeries,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timeseries_with_gaps_and_nulls() {
        let body = r#"{
            "amount": 1.0,
            "base": "USD",
            "start_date": "2024-01-01",
            "end_date": "2024-01-05",
            "rates": {
                "2024-01-05": {"EUR": 0.91, "GBP": null},
                "2024-01-02": {"EUR": 0.90, "GBP": 0.78}
            }
        }"#;

        let series: TimeSeries = serde_json::from_str(body).unwrap();
        assert_eq!(series.base, "USD");
        assert_eq!(series.rates.len(), 2);

        let dates: Vec<_> = series.rates.keys().map(|d| d.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-05"]);

        let last = series.rates.values().last().unwrap();
        assert_eq!(last.get("GBP"), Some(&None));
    }

    #[test]
    fn test_parse_latest_without_amount() {
        let body = r#"{"base":"EUR","date":"2024-03-01","rates":{"USD":1.0834}}"#;
        let latest: LatestRates = serde_json::from_str(body).unwrap();
        assert_eq!(latest.amount, None);
        assert_eq!(latest.rates["USD"], 1.0834);
    }
}
