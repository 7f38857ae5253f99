//! The ledger engine: the operation surface consumed by the transport
//! layer.
//!
//! Every operation runs inside exactly one store transaction. Debiting
//! operations (reserve, transfer) perform their balance check and their
//! event append under the same exclusive transaction, so two concurrent
//! calls racing on one user cannot both pass the sufficiency check
//! against a stale balance and drive it negative.
//!
//! Inputs arrive already decoded by the transport layer; the engine
//! still enforces the positive-amount and distinct-party rules because
//! it owns the error taxonomy for them.

use crate::amount::Amount;
use crate::balance;
use crate::error::{LedgerError, Result};
use crate::event::{OrderId, ServiceId, UserId};
use crate::history::{self, HistoryEntry, HistoryQuery};
use crate::store::{LedgerStore, MemoryStore};
use log::debug;

/// The balance and payment-reservation engine.
///
/// Generic over the transactional store so tests can inject failing or
/// pre-seeded backends; [`Ledger::in_memory`] is the common entry point.
pub struct Ledger<S = MemoryStore> {
    store: S,
}

impl Ledger<MemoryStore> {
    /// Creates an engine over an empty in-memory store.
    pub fn in_memory() -> Self {
        Ledger::new(MemoryStore::new())
    }
}

impl Default for Ledger<MemoryStore> {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<S: LedgerStore> Ledger<S> {
    /// Creates an engine over the given store.
    pub fn new(store: S) -> Self {
        Ledger { store }
    }

    /// Derives the user's current balance from one consistent snapshot.
    ///
    /// Fails with `NoBalance` for users who never received funds.
    pub fn balance(&self, user: UserId) -> Result<Amount> {
        self.store.read(|state| {
            if !balance::has_balance(state, user) {
                return Err(LedgerError::NoBalance(user));
            }
            Ok(balance::balance_of(state, user))
        })
    }

    /// Whether the user passes the existence check: at least one
    /// deposit or one inbound transfer.
    pub fn has_balance(&self, user: UserId) -> Result<bool> {
        self.store.read(|state| Ok(balance::has_balance(state, user)))
    }

    /// Credits `amount` to the user. Deposits have no existence
    /// precondition; they are what establishes existence.
    pub fn deposit(&self, user: UserId, amount: Amount) -> Result<()> {
        ensure_positive(amount)?;

        self.store.write(|state| {
            let row = state.append_deposit(user, amount);
            debug!("deposited {} to user {} (row {})", amount, user, row.id);
            Ok(())
        })
    }

    /// Reserves `amount` for a service payment, debiting the available
    /// balance immediately.
    ///
    /// Fails with `NoBalance` for nonexistent users,
    /// `InsufficientBalance` when the balance cannot cover `amount`,
    /// and `AlreadyReserved` when a non-canceled payment already holds
    /// the (user, service, order) key.
    pub fn reserve(
        &self,
        user: UserId,
        service: ServiceId,
        order: OrderId,
        amount: Amount,
    ) -> Result<()> {
        ensure_positive(amount)?;

        self.store.write(|state| {
            if !balance::has_balance(state, user) {
                return Err(LedgerError::NoBalance(user));
            }

            let available = balance::balance_of(state, user);
            if available < amount {
                debug!(
                    "reserve rejected for user {}: available {}, requested {}",
                    user, available, amount
                );
                return Err(LedgerError::InsufficientBalance {
                    user,
                    available,
                    requested: amount,
                });
            }

            if state.find_active_payment(user, service, order).is_some() {
                return Err(LedgerError::AlreadyReserved {
                    user,
                    service,
                    order,
                });
            }

            let row = state.append_payment(user, service, order, amount);
            debug!(
                "reserved {} for user {}, service {}, order {} (row {})",
                amount, user, service, order, row.id
            );
            Ok(())
        })
    }

    /// Confirms a reserved payment, making the debit permanent. No
    /// balance change: the funds were already debited at reservation.
    ///
    /// Fails with `PaymentNotFound` when no row matches the key and
    /// with a conflict when the payment already settled.
    pub fn confirm(&self, user: UserId, service: ServiceId, order: OrderId) -> Result<()> {
        self.store.write(|state| {
            let payment = state
                .find_payment_mut(user, service, order)
                .ok_or(LedgerError::PaymentNotFound {
                    user,
                    service,
                    order,
                })?;
            payment.confirm()?;
            debug!(
                "confirmed payment {} for user {}, service {}, order {}",
                payment.id, user, service, order
            );
            Ok(())
        })
    }

    /// Cancels a reserved payment, restoring `amount` to the balance
    /// by excluding the row from the debit sum.
    ///
    /// Same failure modes as [`Ledger::confirm`].
    pub fn cancel(&self, user: UserId, service: ServiceId, order: OrderId) -> Result<()> {
        self.store.write(|state| {
            let payment = state
                .find_payment_mut(user, service, order)
                .ok_or(LedgerError::PaymentNotFound {
                    user,
                    service,
                    order,
                })?;
            payment.cancel()?;
            debug!(
                "canceled payment {} for user {}, service {}, order {}, released {}",
                payment.id, user, service, order, payment.amount
            );
            Ok(())
        })
    }

    /// Moves `amount` from one user to another by appending a single
    /// transfer row; both sides of the movement are realized through
    /// the balance derivation.
    ///
    /// Fails with `SelfTransfer` when both sides name the same user,
    /// `NoBalance` for nonexistent senders, and `InsufficientBalance`
    /// when the sender cannot cover `amount`.
    pub fn transfer(&self, from: UserId, to: UserId, amount: Amount) -> Result<()> {
        ensure_positive(amount)?;
        if from == to {
            return Err(LedgerError::SelfTransfer(from));
        }

        self.store.write(|state| {
            if !balance::has_balance(state, from) {
                return Err(LedgerError::NoBalance(from));
            }

            let available = balance::balance_of(state, from);
            if available < amount {
                return Err(LedgerError::InsufficientBalance {
                    user: from,
                    available,
                    requested: amount,
                });
            }

            let row = state.append_transfer(from, to, amount);
            debug!(
                "transferred {} from user {} to user {} (row {})",
                amount, from, to, row.id
            );
            Ok(())
        })
    }

    /// Returns one sorted page of the user's unified history.
    ///
    /// Fails with `NoBalance` for users who never received funds,
    /// mirroring the other read operations.
    pub fn history(&self, user: UserId, query: HistoryQuery) -> Result<Vec<HistoryEntry>> {
        self.store.read(|state| {
            if !balance::has_balance(state, user) {
                return Err(LedgerError::NoBalance(user));
            }
            Ok(history::sort_and_page(history::project(state, user), &query))
        })
    }
}

fn ensure_positive(amount: Amount) -> Result<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::NonPositiveAmount(amount))
    }
}
