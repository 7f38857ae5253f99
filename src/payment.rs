//! Payment rows and their settlement lifecycle.
//!
//! A payment starts reserved and settles exactly once: confirmed (the
//! debit becomes permanent) or canceled (the debit is reversed). The
//! transition methods are the only code that touches the settlement
//! timestamps.

use crate::amount::Amount;
use crate::error::{LedgerError, Result};
use crate::event::{OrderId, RowId, ServiceId, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle state of a payment, derived from its settlement timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    /// Funds debited, awaiting settlement.
    Reserved,
    /// Debit permanent. Terminal.
    Confirmed,
    /// Debit reversed. Terminal.
    Canceled,
}

/// A service payment reservation.
///
/// # Invariants
///
/// - `confirmed_at` and `canceled_at` are never both set
/// - each settlement timestamp is set at most once
/// - the row counts toward the owner's debit sum until canceled, so
///   confirming changes no balance and canceling restores `amount`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRow {
    /// Store-assigned row ID.
    pub id: RowId,

    /// Paying user.
    pub user: UserId,

    /// Service being paid, part of the reservation key.
    pub service: ServiceId,

    /// Service-side order, part of the reservation key.
    pub order: OrderId,

    /// Reserved amount, always positive.
    pub amount: Amount,

    /// When the reservation was written.
    pub reserved_at: DateTime<Utc>,

    /// Set once by [`PaymentRow::confirm`].
    pub confirmed_at: Option<DateTime<Utc>>,

    /// Set once by [`PaymentRow::cancel`].
    pub canceled_at: Option<DateTime<Utc>>,
}

impl PaymentRow {
    /// Creates a freshly reserved payment.
    pub fn reserved(
        id: RowId,
        user: UserId,
        service: ServiceId,
        order: OrderId,
        amount: Amount,
        reserved_at: DateTime<Utc>,
    ) -> Self {
        PaymentRow {
            id,
            user,
            service,
            order,
            amount,
            reserved_at,
            confirmed_at: None,
            canceled_at: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PaymentState {
        if self.confirmed_at.is_some() {
            PaymentState::Confirmed
        } else if self.canceled_at.is_some() {
            PaymentState::Canceled
        } else {
            PaymentState::Reserved
        }
    }

    /// `true` once the payment reached a terminal state.
    pub fn is_settled(&self) -> bool {
        self.state() != PaymentState::Reserved
    }

    /// `true` while the row counts toward its owner's debit sum.
    /// Reserved and confirmed payments debit; only canceled ones don't.
    pub fn debits_balance(&self) -> bool {
        self.canceled_at.is_none()
    }

    /// `true` if the row matches the reservation key.
    pub fn matches(&self, user: UserId, service: ServiceId, order: OrderId) -> bool {
        self.user == user && self.service == service && self.order == order
    }

    /// Marks the payment confirmed. The debit already happened at
    /// reservation time, so the owner's balance is unaffected.
    ///
    /// Fails with a conflict if the payment already settled.
    pub fn confirm(&mut self) -> Result<()> {
        match self.state() {
            PaymentState::Confirmed => Err(LedgerError::AlreadyConfirmed(self.id)),
            PaymentState::Canceled => Err(LedgerError::AlreadyCanceled(self.id)),
            PaymentState::Reserved => {
                self.confirmed_at = Some(Utc::now());
                Ok(())
            }
        }
    }

    /// Marks the payment canceled, excluding it from the debit sum and
    /// thereby restoring `amount` to the owner's balance.
    ///
    /// Fails with a conflict if the payment already settled.
    pub fn cancel(&mut self) -> Result<()> {
        match self.state() {
            PaymentState::Confirmed => Err(LedgerError::AlreadyConfirmed(self.id)),
            PaymentState::Canceled => Err(LedgerError::AlreadyCanceled(self.id)),
            PaymentState::Reserved => {
                self.canceled_at = Some(Utc::now());
                Ok(())
            }
        }
    }
}
