//! Immutable ledger event rows.
//!
//! Deposits and transfers are written once and never mutated; balances
//! and history are derived by folding over them. Payment rows live in
//! the [`crate::payment`] module since they carry lifecycle state.

use crate::amount::Amount;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// User identifier. Users have no standalone record; existence is
/// inferred from having at least one deposit or inbound transfer.
pub type UserId = u64;

/// External service identifier, part of a payment's key.
pub type ServiceId = u64;

/// Service-side order identifier, part of a payment's key.
pub type OrderId = u64;

/// Row identifier assigned by the store, monotonically increasing.
pub type RowId = u64;

/// A deposit crediting a user's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositRow {
    /// Store-assigned row ID.
    pub id: RowId,

    /// Credited user.
    pub user: UserId,

    /// Deposited amount, always positive.
    pub amount: Amount,

    /// When the deposit was written.
    pub deposited_at: DateTime<Utc>,
}

/// A peer-to-peer transfer. Debits `from`, credits `to`; both effects
/// are realized through the balance derivation reading this single row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRow {
    /// Store-assigned row ID.
    pub id: RowId,

    /// Sender. Never equal to `to`.
    pub from: UserId,

    /// Recipient.
    pub to: UserId,

    /// Transferred amount, always positive.
    pub amount: Amount,

    /// When the transfer was written.
    pub sent_at: DateTime<Utc>,
}
