//! # Balance Engine
//!
//! An append-only ledger engine tracking per-user balances with a
//! reserve/confirm/cancel lifecycle for service payments.
//!
//! ## Design Principles
//!
//! - **Derived balances**: no balance is ever stored; a user's balance
//!   is a fold over their deposit, transfer, and payment events
//! - **Single-transaction operations**: every operation runs inside
//!   one store transaction, so balance checks and event appends commit
//!   atomically and concurrent debits cannot overdraw an account
//! - **Reservation lifecycle**: a payment debits the balance when
//!   reserved and settles exactly once, either confirmed (permanent)
//!   or canceled (reversed)
//! - **Integer money**: amounts are exact minor currency units
//!
//! ## Example
//!
//! ```
//! use balance_engine::{Amount, Ledger};
//!
//! let ledger = Ledger::in_memory();
//! ledger.deposit(1, Amount::new(100)).unwrap();
//! ledger.reserve(1, 5, 9, Amount::new(40)).unwrap();
//! assert_eq!(ledger.balance(1).unwrap(), Amount::new(60));
//!
//! ledger.cancel(1, 5, 9).unwrap();
//! assert_eq!(ledger.balance(1).unwrap(), Amount::new(100));
//! ```

pub mod amount;
pub mod balance;
pub mod error;
pub mod event;
pub mod history;
pub mod ledger;
pub mod payment;
pub mod store;

pub use amount::Amount;
pub use balance::{balance_of, has_balance};
pub use error::{ErrorKind, LedgerError, Result};
pub use event::{DepositRow, OrderId, RowId, ServiceId, TransferRow, UserId};
pub use history::{EntryKind, HistoryEntry, HistoryQuery, SortOrder};
pub use ledger::Ledger;
pub use payment::{PaymentRow, PaymentState};
pub use store::{LedgerState, LedgerStore, MemoryStore};
