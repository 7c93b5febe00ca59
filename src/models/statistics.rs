// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Summary statistics over a series of exchange rate snapshots.
//!
//! All arithmetic is done on unrounded values; rounding happens once, when a
//! value is placed into [`SymbolStats`] or [`PairReport`].

use serde::Serialize;
use std::collections::BTreeMap;

use super::currencies::{round_pct, round_rate};
use super::exchange_rates::RateSnapshot;

/// Per-symbol stats over a date range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    /// Percent change from the first to the last observation. `None` when
    /// the first observation is zero.
    pub change: Option<f64>,
}

/// Per-symbol entry of the aggregate report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairReport {
    pub current: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub change: Option<f64>,
    /// Range over mean, in percent. `None` when the average is zero.
    pub volatility: Option<f64>,
}

/// Unrounded aggregates for one symbol
#[derive(Debug, Clone, Copy, PartialEq)]
struct Summary {
    first: f64,
    last: f64,
    min: f64,
    max: f64,
    avg: f64,
}

impl Summary {
    fn from_values(values: &[f64]) -> Option<Self> {
        let first = *values.first()?;
        let last = *values.last()?;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        Some(Self {
            first,
            last,
            min,
            max,
            avg,
        })
    }

    fn change_pct(&self) -> Option<f64> {
        if self.first == 0.0 {
            return None;
        }
        Some((self.last - self.first) / self.first * 100.0)
    }

    fn volatility_pct(&self) -> Option<f64> {
        if self.avg == 0.0 {
            return None;
        }
        Some((self.max - self.min) / self.avg * 100.0)
    }

    fn stats(&self) -> SymbolStats {
        SymbolStats {
            min: round_rate(self.min),
            max: round_rate(self.max),
            avg: round_rate(self.avg),
            change: self.change_pct().map(round_pct),
        }
    }
}

/// Values for `symbol` in date order, skipping dates where it is missing
fn symbol_values<'a, I>(series: I, symbol: &str) -> Vec<f64>
where
    I: IntoIterator<Item = &'a RateSnapshot>,
{
    series
        .into_iter()
        .filter_map(|snapshot| snapshot.get(symbol).copied().flatten())
        .filter(|v| !v.is_nan())
        .collect()
}

fn summarize<'a, I>(series: I, symbol: &str) -> Option<Summary>
where
    I: IntoIterator<Item = &'a RateSnapshot>,
{
    Summary::from_values(&symbol_values(series, symbol))
}

/// Compute min/max/avg/change for each requested symbol.
///
/// Symbols that never appear in the series produce no entry.
pub fn compute_stats<'a, I>(series: I, symbols: &[String]) -> BTreeMap<String, SymbolStats>
where
    I: IntoIterator<Item = &'a RateSnapshot> + Clone,
{
    symbols
        .iter()
        .filter_map(|symbol| {
            summarize(series.clone(), symbol).map(|summary| (symbol.clone(), summary.stats()))
        })
        .collect()
}

/// Compute the aggregate report entries: series stats plus volatility, and
/// the current rate taken from a separately fetched snapshot.
pub fn compute_report<'a, I>(
    series: I,
    current: &BTreeMap<String, f64>,
    symbols: &[String],
) -> BTreeMap<String, PairReport>
where
    I: IntoIterator<Item = &'a RateSnapshot> + Clone,
{
    symbols
        .iter()
        .filter_map(|symbol| {
            let summary = summarize(series.clone(), symbol)?;
            let stats = summary.stats();
            Some((
                symbol.clone(),
                PairReport {
                    current: current.get(symbol).copied().map(round_rate),
                    min: stats.min,
                    max: stats.max,
                    avg: stats.avg,
                    change: stats.change,
                    volatility: summary.volatility_pct().map(round_pct),
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exchange_rates::RateSeries;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series(rows: Vec<(&str, Vec<(&str, Option<f64>)>)>) -> RateSeries {
        rows.into_iter()
            .map(|(d, rates)| {
                let snapshot = rates
                    .into_iter()
                    .map(|(sym, v)| (sym.to_string(), v))
                    .collect::<RateSnapshot>();
                (date(d), snapshot)
            })
            .collect()
    }

    fn syms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_three_day_eur_scenario() {
        let s = series(vec![
            ("2024-01-01", vec![("EUR", Some(0.90))]),
            ("2024-01-02", vec![("EUR", Some(0.92))]),
            ("2024-01-03", vec![("EUR", Some(0.88))]),
        ]);

        let stats = compute_stats(s.values(), &syms(&["EUR"]));
        let eur = &stats["EUR"];
        assert_relative_eq!(eur.min, 0.88);
        assert_relative_eq!(eur.max, 0.92);
        assert_relative_eq!(eur.avg, 0.9);
        assert_relative_eq!(eur.change.unwrap(), -2.22);
    }

    #[test]
    fn test_change_uses_date_order_not_extremes() {
        // Keys are inserted out of order; the BTreeMap sorts them by date.
        let s = series(vec![
            ("2024-02-03", vec![("GBP", Some(0.80))]),
            ("2024-02-01", vec![("GBP", Some(0.75))]),
            ("2024-02-02", vec![("GBP", Some(0.70))]),
        ]);

        let stats = compute_stats(s.values(), &syms(&["GBP"]));
        let gbp = &stats["GBP"];
        assert_relative_eq!(gbp.min, 0.70);
        assert_relative_eq!(gbp.max, 0.80);
        // (0.80 - 0.75) / 0.75 * 100 = 6.666..
        assert_relative_eq!(gbp.change.unwrap(), 6.67);
    }

    #[test]
    fn test_missing_and_null_values_are_skipped() {
        let s = series(vec![
            ("2024-01-01", vec![("EUR", Some(1.0)), ("JPY", Some(140.0))]),
            ("2024-01-02", vec![("EUR", None), ("JPY", Some(150.0))]),
            ("2024-01-03", vec![("JPY", Some(f64::NAN))]),
            ("2024-01-04", vec![("EUR", Some(3.0))]),
        ]);

        let stats = compute_stats(s.values(), &syms(&["EUR", "JPY"]));
        let eur = &stats["EUR"];
        assert_relative_eq!(eur.avg, 2.0);
        assert_relative_eq!(eur.change.unwrap(), 200.0);

        let jpy = &stats["JPY"];
        assert_relative_eq!(jpy.avg, 145.0);
        assert_relative_eq!(jpy.max, 150.0);
    }

    #[test]
    fn test_zero_is_a_valid_rate() {
        let s = series(vec![
            ("2024-01-01", vec![("XAU", Some(2.0))]),
            ("2024-01-02", vec![("XAU", Some(0.0))]),
        ]);

        let stats = compute_stats(s.values(), &syms(&["XAU"]));
        let xau = &stats["XAU"];
        assert_relative_eq!(xau.min, 0.0);
        assert_relative_eq!(xau.avg, 1.0);
        assert_relative_eq!(xau.change.unwrap(), -100.0);
    }

    #[test]
    fn test_zero_first_value_yields_no_change() {
        let s = series(vec![
            ("2024-01-01", vec![("XAU", Some(0.0))]),
            ("2024-01-02", vec![("XAU", Some(2.0))]),
        ]);

        let stats = compute_stats(s.values(), &syms(&["XAU"]));
        assert_eq!(stats["XAU"].change, None);

        let json = serde_json::to_value(&stats["XAU"]).unwrap();
        assert!(json["change"].is_null());
    }

    #[test]
    fn test_zero_average_yields_no_volatility() {
        let s = series(vec![
            ("2024-01-01", vec![("XAU", Some(0.0))]),
            ("2024-01-02", vec![("XAU", Some(0.0))]),
        ]);

        let report = compute_report(s.values(), &BTreeMap::new(), &syms(&["XAU"]));
        assert_eq!(report["XAU"].volatility, None);
        assert_eq!(report["XAU"].change, None);
        assert_eq!(report["XAU"].current, None);
    }

    #[test]
    fn test_absent_symbol_is_omitted() {
        let s = series(vec![("2024-01-01", vec![("EUR", Some(0.9))])]);

        let stats = compute_stats(s.values(), &syms(&["EUR", "XYZ"]));
        assert_eq!(stats.len(), 1);
        assert!(!stats.contains_key("XYZ"));

        let report = compute_report(s.values(), &BTreeMap::new(), &syms(&["XYZ"]));
        assert!(report.is_empty());
    }

    #[test]
    fn test_empty_series_yields_empty_mapping() {
        let s = RateSeries::new();
        assert!(compute_stats(s.values(), &syms(&["EUR"])).is_empty());
    }

    #[test]
    fn test_single_date_series() {
        let s = series(vec![("2024-05-01", vec![("EUR", Some(0.9271)), ("CHF", Some(0.9134))])]);

        let stats = compute_stats(s.values(), &syms(&["EUR", "CHF"]));
        for st in stats.values() {
            assert_eq!(st.change, Some(0.0));
            assert_eq!(st.min, st.max);
            assert_eq!(st.min, st.avg);
        }
    }

    #[test]
    fn test_volatility_uses_unrounded_values() {
        let s = series(vec![
            ("2024-01-01", vec![("JPY", Some(140.12344))]),
            ("2024-01-02", vec![("JPY", Some(150.56786))]),
        ]);
        let current = BTreeMap::from([("JPY".to_string(), 151.234567)]);

        let report = compute_report(s.values(), &current, &syms(&["JPY"]));
        let jpy = &report["JPY"];

        let (min, max) = (140.12344_f64, 150.56786_f64);
        let expected = round_pct((max - min) / ((min + max) / 2.0) * 100.0);
        assert_relative_eq!(jpy.volatility.unwrap(), expected);
        assert_relative_eq!(jpy.current.unwrap(), 151.2346);
        assert_relative_eq!(jpy.min, 140.1234);
        assert_relative_eq!(jpy.max, 150.5679);
    }

    #[test]
    fn test_min_avg_max_ordering_and_change_sign() {
        let rows: Vec<Vec<f64>> = vec![
            vec![1.1, 1.2, 1.05, 1.3],
            vec![150.0, 149.5, 151.25],
            vec![0.5, 0.5, 0.5],
            vec![7.2, 7.1],
        ];

        for values in rows {
            let s: RateSeries = values
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let d = date("2024-01-01") + chrono::Duration::days(i as i64);
                    (d, RateSnapshot::from([("CNY".to_string(), Some(*v))]))
                })
                .collect();

            let stats = compute_stats(s.values(), &syms(&["CNY"]));
            let cny = &stats["CNY"];
            assert!(cny.min <= cny.avg && cny.avg <= cny.max);

            let first = values[0];
            let last = *values.last().unwrap();
            let change = cny.change.unwrap();
            if first == last {
                assert_eq!(change, 0.0);
            } else {
                assert_eq!(change.signum(), (last - first).signum());
            }
        }
    }
}
