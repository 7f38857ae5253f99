//! Balance derivation over a ledger snapshot.
//!
//! Balances are never stored. A user's balance is the fold of four
//! event streams read from one snapshot:
//!
//! ```text
//! sum(deposits) + sum(transfers in) - sum(transfers out)
//!               - sum(payments where not canceled)
//! ```
//!
//! Reserved and confirmed payments both subtract; cancellation is the
//! only transition that restores funds.

use crate::amount::Amount;
use crate::event::UserId;
use crate::store::LedgerState;

/// Derives the user's current balance from the snapshot.
pub fn balance_of(state: &LedgerState, user: UserId) -> Amount {
    let deposited: Amount = state
        .deposits()
        .iter()
        .filter(|d| d.user == user)
        .map(|d| d.amount)
        .sum();

    let received: Amount = state
        .transfers()
        .iter()
        .filter(|t| t.to == user)
        .map(|t| t.amount)
        .sum();

    let sent: Amount = state
        .transfers()
        .iter()
        .filter(|t| t.from == user)
        .map(|t| t.amount)
        .sum();

    let debited: Amount = state
        .payments()
        .iter()
        .filter(|p| p.user == user && p.debits_balance())
        .map(|p| p.amount)
        .sum();

    deposited + received - sent - debited
}

/// The existence check gating every money-moving operation.
///
/// Deliberately narrower than "has any activity": only a deposit or an
/// inbound transfer establishes existence. A user known solely as a
/// sender or as a reservation owner is treated as balance-less.
pub fn has_balance(state: &LedgerState, user: UserId) -> bool {
    state.deposits().iter().any(|d| d.user == user)
        || state.transfers().iter().any(|t| t.to == user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ledger_derives_zero() {
        let state = LedgerState::default();
        assert_eq!(balance_of(&state, 1), Amount::ZERO);
        assert!(!has_balance(&state, 1));
    }

    #[test]
    fn test_deposits_accumulate() {
        let mut state = LedgerState::default();
        state.append_deposit(1, Amount::new(100));
        state.append_deposit(1, Amount::new(50));
        state.append_deposit(2, Amount::new(7));

        assert_eq!(balance_of(&state, 1), Amount::new(150));
        assert_eq!(balance_of(&state, 2), Amount::new(7));
    }

    #[test]
    fn test_transfer_moves_both_sides() {
        let mut state = LedgerState::default();
        state.append_deposit(1, Amount::new(100));
        state.append_transfer(1, 2, Amount::new(30));

        assert_eq!(balance_of(&state, 1), Amount::new(70));
        assert_eq!(balance_of(&state, 2), Amount::new(30));
    }

    #[test]
    fn test_reserved_and_confirmed_payments_debit() {
        let mut state = LedgerState::default();
        state.append_deposit(1, Amount::new(100));
        state.append_payment(1, 5, 9, Amount::new(40));
        assert_eq!(balance_of(&state, 1), Amount::new(60));

        state
            .find_payment_mut(1, 5, 9)
            .expect("payment just appended")
            .confirm()
            .unwrap();
        assert_eq!(balance_of(&state, 1), Amount::new(60));
    }

    #[test]
    fn test_canceled_payment_is_excluded() {
        let mut state = LedgerState::default();
        state.append_deposit(1, Amount::new(100));
        state.append_payment(1, 5, 9, Amount::new(40));
        state
            .find_payment_mut(1, 5, 9)
            .expect("payment just appended")
            .cancel()
            .unwrap();

        assert_eq!(balance_of(&state, 1), Amount::new(100));
    }

    #[test]
    fn test_existence_requires_inbound_credit() {
        let mut state = LedgerState::default();
        // Rows written directly: a sender and a reservation owner who
        // never received anything stay balance-less.
        state.append_transfer(3, 4, Amount::new(10));
        state.append_payment(5, 1, 1, Amount::new(10));

        assert!(!has_balance(&state, 3));
        assert!(!has_balance(&state, 5));
        assert!(has_balance(&state, 4));

        state.append_deposit(3, Amount::new(1));
        assert!(has_balance(&state, 3));
    }
}
