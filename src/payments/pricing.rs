// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::PricingConfig;
use crate::entrypoints::Entrypoint;

/// Fixed price per entrypoint in the asset's smallest unit. Zero means free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTable {
    prices: BTreeMap<Entrypoint, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceEntry {
    pub key: &'static str,
    pub description: &'static str,
    pub price: u64,
    pub paid: bool,
}

impl PriceTable {
    pub fn from_config(config: &PricingConfig) -> Self {
        let prices = Entrypoint::ALL
            .into_iter()
            .map(|e| {
                let price = match e {
                    Entrypoint::Convert => config.convert,
                    Entrypoint::Rates => config.rates,
                    Entrypoint::Historical => config.historical,
                    Entrypoint::Timeseries => config.timeseries,
                    Entrypoint::Report => config.report,
                    _ => 0,
                };
                (e, price)
            })
            .collect();
        Self { prices }
    }

    pub fn price(&self, entrypoint: Entrypoint) -> u64 {
        self.prices.get(&entrypoint).copied().unwrap_or(0)
    }

    pub fn is_paid(&self, entrypoint: Entrypoint) -> bool {
        self.price(entrypoint) > 0
    }

    /// Entries in declaration order
    pub fn entries(&self) -> Vec<PriceEntry> {
        Entrypoint::ALL
            .into_iter()
            .map(|e| PriceEntry {
                key: e.key(),
                description: e.description(),
                price: self.price(e),
                paid: self.is_paid(e),
            })
            .collect()
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::from_config(&PricingConfig::default())
    }
}

/// Render a micro-unit amount as a decimal string, e.g. 2500 -> "0.0025"
pub fn format_amount(amount: u64, decimals: u32) -> String {
    let scale = 10u64.pow(decimals);
    let whole = amount / scale;
    let frac = amount % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}
