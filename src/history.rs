//! Unified history projection over one user's ledger events.
//!
//! Five typed projections are unioned into a single stream of tagged
//! entries: deposits, inbound transfers, canceled payments (each a
//! credit), outbound transfers and reservations (each a debit, carried
//! as a negative amount). A reservation appears regardless of how it
//! later settled; a cancellation additionally appears as its own credit
//! entry timestamped at cancellation.

use crate::amount::Amount;
use crate::error::{LedgerError, Result};
use crate::event::UserId;
use crate::store::LedgerState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Tag identifying which projection an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Deposit,
    MoneyReceived,
    PaymentCanceled,
    MoneySent,
    Payment,
}

/// One row of a user's history view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// Source projection.
    #[serde(rename = "type")]
    pub kind: EntryKind,

    /// Counterparty reference: `user#<id>` for transfers,
    /// `order#<id> service#<id>` for payments, empty for deposits.
    pub comment: String,

    /// Signed amount: positive for credits, negative for debits.
    pub amount: Amount,

    /// Event timestamp the entry sorts by.
    pub ts: DateTime<Utc>,
}

/// Sort direction, parsed from the query-string values `ASC`/`DESC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            other => Err(LedgerError::InvalidSortOrder(other.to_string())),
        }
    }
}

/// Sorting and pagination parameters for a history request.
///
/// A date direction always wins over an amount direction; with neither,
/// entries come back ascending by timestamp. `limit` and `offset` are
/// both required; there is no implicit cap on `limit`.
#[derive(Debug, Clone, Copy)]
pub struct HistoryQuery {
    /// Secondary sort key, used only when `date_sort` is absent.
    pub amount_sort: Option<SortOrder>,

    /// Primary sort key.
    pub date_sort: Option<SortOrder>,

    /// Page size. Zero yields an empty page.
    pub limit: usize,

    /// Entries skipped before the page starts.
    pub offset: usize,
}

/// Builds the unordered union of the five projections for one user.
pub fn project(state: &LedgerState, user: UserId) -> Vec<HistoryEntry> {
    let mut entries = Vec::new();

    for d in state.deposits().iter().filter(|d| d.user == user) {
        entries.push(HistoryEntry {
            kind: EntryKind::Deposit,
            comment: String::new(),
            amount: d.amount,
            ts: d.deposited_at,
        });
    }

    for t in state.transfers().iter().filter(|t| t.to == user) {
        entries.push(HistoryEntry {
            kind: EntryKind::MoneyReceived,
            comment: format!("user#{}", t.from),
            amount: t.amount,
            ts: t.sent_at,
        });
    }

    for p in state.payments().iter().filter(|p| p.user == user) {
        if let Some(canceled_at) = p.canceled_at {
            entries.push(HistoryEntry {
                kind: EntryKind::PaymentCanceled,
                comment: format!("order#{} service#{}", p.order, p.service),
                amount: p.amount,
                ts: canceled_at,
            });
        }
    }

    for t in state.transfers().iter().filter(|t| t.from == user) {
        entries.push(HistoryEntry {
            kind: EntryKind::MoneySent,
            comment: format!("user#{}", t.to),
            amount: -t.amount,
            ts: t.sent_at,
        });
    }

    for p in state.payments().iter().filter(|p| p.user == user) {
        entries.push(HistoryEntry {
            kind: EntryKind::Payment,
            comment: format!("order#{} service#{}", p.order, p.service),
            amount: -p.amount,
            ts: p.reserved_at,
        });
    }

    entries
}

/// Applies the single active sort key, then the `offset`/`limit` page.
///
/// Sorting is stable, so entries tying on the sort key keep the fixed
/// projection union order.
pub fn sort_and_page(mut entries: Vec<HistoryEntry>, query: &HistoryQuery) -> Vec<HistoryEntry> {
    match (query.date_sort, query.amount_sort) {
        (Some(SortOrder::Asc), _) | (None, None) => entries.sort_by(|a, b| a.ts.cmp(&b.ts)),
        (Some(SortOrder::Desc), _) => entries.sort_by(|a, b| b.ts.cmp(&a.ts)),
        (None, Some(SortOrder::Asc)) => entries.sort_by(|a, b| a.amount.cmp(&b.amount)),
        (None, Some(SortOrder::Desc)) => entries.sort_by(|a, b| b.amount.cmp(&a.amount)),
    }

    entries
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect()
}
