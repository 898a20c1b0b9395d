//! Bounded audit trail of price and cost-basis changes.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of entries retained unless configured otherwise.
pub const DEFAULT_PRICE_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryEntry {
    pub price: Decimal,
    pub cost_basis: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
    pub editor: Option<String>,
}

/// Oldest-first sequence of price entries, evicted FIFO past its limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceHistory(VecDeque<PriceHistoryEntry>);

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry`, then drop from the front until at most `limit` remain.
    pub fn record(&mut self, entry: PriceHistoryEntry, limit: usize) {
        self.0.push_back(entry);
        while self.0.len() > limit {
            self.0.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceHistoryEntry> {
        self.0.iter()
    }

    pub fn oldest(&self) -> Option<&PriceHistoryEntry> {
        self.0.front()
    }

    pub fn latest(&self) -> Option<&PriceHistoryEntry> {
        self.0.back()
    }
}
