// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use std::fmt;
use std::str::FromStr;

/// Named operations exposed to callers, each individually priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entrypoint {
    Overview,
    Convert,
    Rates,
    Historical,
    Timeseries,
    Report,
    Analytics,
    AnalyticsTransactions,
    AnalyticsCsv,
}

impl Entrypoint {
    pub const ALL: [Entrypoint; 9] = [
        Entrypoint::Overview,
        Entrypoint::Convert,
        Entrypoint::Rates,
        Entrypoint::Historical,
        Entrypoint::Timeseries,
        Entrypoint::Report,
        Entrypoint::Analytics,
        Entrypoint::AnalyticsTransactions,
        Entrypoint::AnalyticsCsv,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Entrypoint::Overview => "overview",
            Entrypoint::Convert => "convert",
            Entrypoint::Rates => "rates",
            Entrypoint::Historical => "historical",
            Entrypoint::Timeseries => "timeseries",
            Entrypoint::Report => "report",
            Entrypoint::Analytics => "analytics",
            Entrypoint::AnalyticsTransactions => "analytics-transactions",
            Entrypoint::AnalyticsCsv => "analytics-csv",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Entrypoint::Overview => "Supported currencies and a few sample USD rates",
            Entrypoint::Convert => "Convert an amount between two currencies at the latest rate",
            Entrypoint::Rates => "Latest rates for a base currency",
            Entrypoint::Historical => "Rates for a base currency on a given date",
            Entrypoint::Timeseries => {
                "Daily rates between two dates with min, max, average and change per currency"
            }
            Entrypoint::Report => {
                "Current rates, 30-day statistics and volatility for six major currencies"
            }
            Entrypoint::Analytics => "Payment revenue summary",
            Entrypoint::AnalyticsTransactions => "Recent settled payments",
            Entrypoint::AnalyticsCsv => "Settled payments as CSV",
        }
    }

    pub fn is_analytics(self) -> bool {
        matches!(
            self,
            Entrypoint::Analytics | Entrypoint::AnalyticsTransactions | Entrypoint::AnalyticsCsv
        )
    }
}

impl fmt::Display for Entrypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Entrypoint {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Entrypoint::ALL
            .into_iter()
            .find(|e| e.key() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown entrypoint '{}'", s))
    }
}
