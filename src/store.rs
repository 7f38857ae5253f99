//! Transactional ledger storage.
//!
//! [`LedgerState`] holds the three append-only tables: deposits,
//! transfers, and payments. [`LedgerStore`] is the transaction
//! boundary: every engine operation runs inside exactly one `read` or
//! `write` call, which is what keeps check-then-insert sequences atomic
//! under concurrent callers. Rows are timestamped by the store at the
//! moment they are written.

use crate::amount::Amount;
use crate::error::{LedgerError, Result};
use crate::event::{DepositRow, OrderId, RowId, ServiceId, TransferRow, UserId};
use crate::payment::PaymentRow;
use chrono::Utc;
use std::sync::RwLock;

/// The transaction boundary over ledger state.
///
/// `read` sees a consistent snapshot; `write` has exclusive access for
/// the whole closure, so a balance check and the event append it guards
/// commit together or not at all.
///
/// Callers keep operations all-or-nothing by performing every check
/// before the first mutation; an error returned after a mutation would
/// leave a partial write visible.
pub trait LedgerStore: Send + Sync {
    /// Runs `f` against a consistent snapshot of the ledger.
    fn read<T>(&self, f: impl FnOnce(&LedgerState) -> Result<T>) -> Result<T>;

    /// Runs `f` with exclusive access to the ledger.
    fn write<T>(&self, f: impl FnOnce(&mut LedgerState) -> Result<T>) -> Result<T>;
}

/// The append-only event log.
///
/// Rows are only ever appended; the single exception is a payment's
/// pair of settlement timestamps, updated through
/// [`LedgerState::find_payment_mut`].
#[derive(Debug, Default)]
pub struct LedgerState {
    deposits: Vec<DepositRow>,
    transfers: Vec<TransferRow>,
    payments: Vec<PaymentRow>,
    next_id: RowId,
}

impl LedgerState {
    fn next_id(&mut self) -> RowId {
        self.next_id += 1;
        self.next_id
    }

    /// Appends a deposit row stamped with the current time.
    pub fn append_deposit(&mut self, user: UserId, amount: Amount) -> &DepositRow {
        let id = self.next_id();
        self.deposits.push(DepositRow {
            id,
            user,
            amount,
            deposited_at: Utc::now(),
        });
        // Safety: just pushed
        self.deposits.last().expect("deposit row just appended")
    }

    /// Appends a transfer row stamped with the current time.
    pub fn append_transfer(&mut self, from: UserId, to: UserId, amount: Amount) -> &TransferRow {
        let id = self.next_id();
        self.transfers.push(TransferRow {
            id,
            from,
            to,
            amount,
            sent_at: Utc::now(),
        });
        self.transfers.last().expect("transfer row just appended")
    }

    /// Appends a freshly reserved payment row stamped with the current time.
    pub fn append_payment(
        &mut self,
        user: UserId,
        service: ServiceId,
        order: OrderId,
        amount: Amount,
    ) -> &PaymentRow {
        let id = self.next_id();
        self.payments.push(PaymentRow::reserved(
            id,
            user,
            service,
            order,
            amount,
            Utc::now(),
        ));
        self.payments.last().expect("payment row just appended")
    }

    /// Latest payment row for the key, settled or not.
    ///
    /// A key's history is zero or more canceled rows followed by at
    /// most one active row (reservation rejects active duplicates), so
    /// the latest row is the active one whenever it exists.
    pub fn find_payment(&self, user: UserId, service: ServiceId, order: OrderId) -> Option<&PaymentRow> {
        self.payments
            .iter()
            .rev()
            .find(|p| p.matches(user, service, order))
    }

    /// Mutable variant of [`LedgerState::find_payment`], used by the
    /// settlement transitions.
    pub fn find_payment_mut(
        &mut self,
        user: UserId,
        service: ServiceId,
        order: OrderId,
    ) -> Option<&mut PaymentRow> {
        self.payments
            .iter_mut()
            .rev()
            .find(|p| p.matches(user, service, order))
    }

    /// Non-canceled payment row holding the key, if any. Reservation
    /// uniqueness is scoped to these rows: a canceled payment frees its
    /// key, a confirmed one blocks it permanently.
    pub fn find_active_payment(
        &self,
        user: UserId,
        service: ServiceId,
        order: OrderId,
    ) -> Option<&PaymentRow> {
        self.payments
            .iter()
            .find(|p| p.matches(user, service, order) && p.debits_balance())
    }

    /// All deposit rows, in append order.
    pub fn deposits(&self) -> &[DepositRow] {
        &self.deposits
    }

    /// All transfer rows, in append order.
    pub fn transfers(&self) -> &[TransferRow] {
        &self.transfers
    }

    /// All payment rows, in append order.
    pub fn payments(&self) -> &[PaymentRow] {
        &self.payments
    }
}

/// In-memory ledger store for tests, demos, and embedding.
///
/// A whole-ledger `RwLock` realizes the transactional contract:
/// exclusive write guards serialize every money-moving operation, read
/// guards are consistent snapshots. Coarser than per-user row locks,
/// and sufficient for the non-negative-balance guarantee.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<LedgerState>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl LedgerStore for MemoryStore {
    fn read<T>(&self, f: impl FnOnce(&LedgerState) -> Result<T>) -> Result<T> {
        let guard = self
            .inner
            .read()
            .map_err(|_| LedgerError::Store("ledger lock poisoned".into()))?;
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut LedgerState) -> Result<T>) -> Result<T> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| LedgerError::Store("ledger lock poisoned".into()))?;
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_append_assigns_increasing_ids() {
        let mut state = LedgerState::default();
        let d1 = state.append_deposit(1, Amount::new(100)).id;
        let t1 = state.append_transfer(1, 2, Amount::new(30)).id;
        let p1 = state.append_payment(1, 5, 9, Amount::new(40)).id;

        assert!(d1 < t1 && t1 < p1);
        assert_eq!(state.deposits().len(), 1);
        assert_eq!(state.transfers().len(), 1);
        assert_eq!(state.payments().len(), 1);
    }

    #[test]
    fn test_find_payment_returns_latest_row_for_key() {
        let mut state = LedgerState::default();
        state.append_payment(1, 5, 9, Amount::new(40));
        state
            .find_payment_mut(1, 5, 9)
            .expect("payment just appended")
            .cancel()
            .unwrap();
        let second = state.append_payment(1, 5, 9, Amount::new(25)).id;

        let found = state.find_payment(1, 5, 9).expect("two rows match");
        assert_eq!(found.id, second);
        assert_eq!(found.amount, Amount::new(25));
    }

    #[test]
    fn test_active_lookup_skips_canceled_rows() {
        let mut state = LedgerState::default();
        state.append_payment(1, 5, 9, Amount::new(40));
        assert!(state.find_active_payment(1, 5, 9).is_some());

        state
            .find_payment_mut(1, 5, 9)
            .expect("payment just appended")
            .cancel()
            .unwrap();
        assert!(state.find_active_payment(1, 5, 9).is_none());
        assert!(state.find_payment(1, 5, 9).is_some());
    }

    #[test]
    fn test_timestamps_are_monotone_in_append_order() {
        let mut state = LedgerState::default();
        let first = state.append_deposit(1, Amount::new(10)).deposited_at;
        let second = state.append_deposit(1, Amount::new(20)).deposited_at;
        assert!(first <= second);
    }

    #[test]
    fn test_poisoned_lock_surfaces_as_store_error() {
        let store = Arc::new(MemoryStore::new());

        let poisoner = Arc::clone(&store);
        let _ = thread::spawn(move || {
            let _: Result<()> = poisoner.write(|_| panic!("poison the lock"));
        })
        .join();

        let err = store.read(|_| Ok(())).unwrap_err();
        assert_eq!(err, LedgerError::Store("ledger lock poisoned".into()));
        assert!(err.is_retryable());
    }
}
