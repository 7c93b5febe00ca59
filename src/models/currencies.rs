// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;

pub const DEFAULT_BASE: &str = "USD";

/// Symbols shown in the free overview
pub const SAMPLE_SYMBOLS: [&str; 4] = ["EUR", "GBP", "JPY", "CHF"];

/// Major pairs covered by the aggregate report
pub const MAJOR_SYMBOLS: [&str; 6] = ["EUR", "GBP", "JPY", "CHF", "AUD", "CAD"];

pub const REPORT_WINDOW_DAYS: i64 = 30;

/// Round half away from zero to a fixed number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Rate-like quantities (rates, min/max/avg, converted rate) use 4 places
pub fn round_rate(value: f64) -> f64 {
    round_to(value, 4)
}

/// Percentages use 2 places
pub fn round_pct(value: f64) -> f64 {
    round_to(value, 2)
}

/// Convert an amount using a quoted rate, rounded to cents
pub fn convert_amount(amount: f64, rate: f64) -> f64 {
    round_to(amount * rate, 2)
}

/// Validate a 3-letter currency code and return it uppercased
pub fn normalize_currency_code(code: &str) -> Result<String> {
    let code = code.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        anyhow::bail!("invalid currency code '{}': expected 3 letters", code);
    }
    Ok(code.to_ascii_uppercase())
}

/// Parse a comma separated list of currency codes.
///
/// Empty segments are ignored and duplicates are dropped, keeping the first
/// occurrence.
pub fn parse_symbols_csv(csv: &str) -> Result<Vec<String>> {
    let mut symbols: Vec<String> = Vec::new();
    for part in csv.split(',') {
        if part.trim().is_empty() {
            continue;
        }
        let code = normalize_currency_code(part)?;
        if !symbols.contains(&code) {
            symbols.push(code);
        }
    }
    Ok(symbols)
}

/// The report's major symbols, minus the base currency itself
pub fn major_symbols_for(base: &str) -> Vec<String> {
    MAJOR_SYMBOLS
        .iter()
        .filter(|s| **s != base)
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_relative_eq!(round_to(2.5, 0), 3.0);
        assert_relative_eq!(round_to(-2.5, 0), -3.0);
        assert_relative_eq!(round_pct(-2.2222), -2.22);
        assert_relative_eq!(round_rate(2.7 / 3.0), 0.9);
        assert_relative_eq!(round_rate(1.23456), 1.2346);
    }

    #[test]
    fn test_rounding_is_idempotent() {
        for value in [0.88, 0.9, 1.0834, 157.2349, -2.22, 0.0001, 12345.6789] {
            let once = round_rate(value);
            assert_eq!(round_rate(once), once);
            let once = round_pct(value);
            assert_eq!(round_pct(once), once);
        }
    }

    #[test]
    fn test_convert_amount() {
        assert_relative_eq!(convert_amount(100.0, 0.9), 90.0);
        assert_relative_eq!(convert_amount(12.5, 1.0834), 13.54);
        assert_relative_eq!(convert_amount(1.0, 157.23), 157.23);
    }

    #[test]
    fn test_normalize_currency_code() {
        assert_eq!(normalize_currency_code("usd").unwrap(), "USD");
        assert_eq!(normalize_currency_code(" eur ").unwrap(), "EUR");
        assert!(normalize_currency_code("US").is_err());
        assert!(normalize_currency_code("EURO").is_err());
        assert!(normalize_currency_code("U5D").is_err());
        assert!(normalize_currency_code("").is_err());
    }

    #[test]
    fn test_parse_symbols_csv() {
        let symbols = parse_symbols_csv("eur, gbp,,JPY,eur").unwrap();
        assert_eq!(symbols, vec!["EUR", "GBP", "JPY"]);

        assert!(parse_symbols_csv("").unwrap().is_empty());
        assert!(parse_symbols_csv("EUR,POUND").is_err());
    }

    #[test]
    fn test_major_symbols_exclude_base() {
        let symbols = major_symbols_for("EUR");
        assert_eq!(symbols, vec!["GBP", "JPY", "CHF", "AUD", "CAD"]);
        assert_eq!(major_symbols_for("USD").len(), 6);
    }
}
