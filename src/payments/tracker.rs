// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use csv::Writer;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::config::DEFAULT_MAX_TRANSACTIONS;

/// A settled payment, as handed to the tracker
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub entrypoint: String,
    pub amount: u64,
    pub payer: Option<String>,
    pub network: String,
    pub transaction: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: u64,
    pub entrypoint: String,
    pub amount: u64,
    pub payer: Option<String>,
    pub network: String,
    pub transaction: Option<String>,
    pub settled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntrypointRevenue {
    pub count: usize,
    pub revenue: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub window_ms: Option<u64>,
    pub total_transactions: usize,
    pub total_revenue: u64,
    pub by_entrypoint: BTreeMap<String, EntrypointRevenue>,
    pub first_transaction_at: Option<DateTime<Utc>>,
    pub last_transaction_at: Option<DateTime<Utc>>,
}

impl AnalyticsSummary {
    pub fn from_transactions(window_ms: Option<u64>, transactions: &[Transaction]) -> Self {
        let mut summary = Self {
            window_ms,
            ..Self::default()
        };
        for tx in transactions {
            summary.total_transactions += 1;
            summary.total_revenue += tx.amount;
            let entry = summary.by_entrypoint.entry(tx.entrypoint.clone()).or_default();
            entry.count += 1;
            entry.revenue += tx.amount;
            summary.first_transaction_at = Some(match summary.first_transaction_at {
                Some(t) => t.min(tx.settled_at),
                None => tx.settled_at,
            });
            summary.last_transaction_at = Some(match summary.last_transaction_at {
                Some(t) => t.max(tx.settled_at),
                None => tx.settled_at,
            });
        }
        summary
    }
}

/// Records settled payments and answers analytics queries
#[async_trait::async_trait]
pub trait PaymentTracker: Send + Sync {
    async fn record(&self, tx: NewTransaction) -> Result<Transaction>;

    /// Transactions inside the window, newest first
    async fn transactions(&self, window_ms: Option<u64>, limit: Option<usize>)
        -> Result<Vec<Transaction>>;

    async fn summary(&self, window_ms: Option<u64>) -> Result<AnalyticsSummary> {
        let transactions = self.transactions(window_ms, None).await?;
        Ok(AnalyticsSummary::from_transactions(window_ms, &transactions))
    }

    async fn export_csv(&self, window_ms: Option<u64>) -> Result<String> {
        let transactions = self.transactions(window_ms, None).await?;
        transactions_to_csv(&transactions)
    }
}

pub fn transactions_to_csv(transactions: &[Transaction]) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record([
        "id",
        "entrypoint",
        "amount",
        "payer",
        "network",
        "transaction",
        "settled_at",
    ])?;
    for tx in transactions {
        writer.write_record([
            tx.id.to_string().as_str(),
            tx.entrypoint.as_str(),
            tx.amount.to_string().as_str(),
            tx.payer.as_deref().unwrap_or(""),
            tx.network.as_str(),
            tx.transaction.as_deref().unwrap_or(""),
            tx.settled_at.to_rfc3339().as_str(),
        ])?;
    }
    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

/// Process-lifetime tracker holding at most `capacity` transactions.
/// Nothing is persisted.
pub struct InMemoryTracker {
    next_id: AtomicU64,
    capacity: usize,
    transactions: RwLock<VecDeque<Transaction>>,
}

impl Default for InMemoryTracker {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_TRANSACTIONS)
    }
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            next_id: AtomicU64::new(0),
            capacity: capacity.max(1),
            transactions: RwLock::new(VecDeque::new()),
        }
    }

    async fn insert_at(&self, tx: NewTransaction, settled_at: DateTime<Utc>) -> Transaction {
        let tx = Transaction {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            entrypoint: tx.entrypoint,
            amount: tx.amount,
            payer: tx.payer,
            network: tx.network,
            transaction: tx.transaction,
            settled_at,
        };
        let mut transactions = self.transactions.write().await;
        transactions.push_back(tx.clone());
        while transactions.len() > self.capacity {
            transactions.pop_front();
        }
        tx
    }
}

#[async_trait::async_trait]
impl PaymentTracker for InMemoryTracker {
    async fn record(&self, tx: NewTransaction) -> Result<Transaction> {
        Ok(self.insert_at(tx, Utc::now()).await)
    }

    async fn transactions(
        &self,
        window_ms: Option<u64>,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>> {
        let cutoff = match window_ms {
            Some(ms) => {
                let ms = i64::try_from(ms).unwrap_or(i64::MAX);
                Utc::now().checked_sub_signed(Duration::milliseconds(ms))
            }
            None => None,
        };

        let transactions = self.transactions.read().await;
        let selected = transactions
            .iter()
            .rev()
            .filter(|tx| cutoff.map_or(true, |c| tx.settled_at >= c))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(selected)
    }
}
