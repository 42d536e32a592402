//! Atomic account-to-account transfers
//!
//! # Protocol
//!
//! ```text
//! validate → BEGIN → transfer row → debit entry → credit entry
//!          → balance(lower id) → balance(higher id) → COMMIT
//! ```
//!
//! Any failure after `BEGIN` rolls back all writes of the unit.
//!
//! # Safety Invariants
//!
//! 1. **Atomicity**: the transfer record, both entries and both balance deltas commit together.
//! 2. **No lost updates**: balances change only through `add_account_balance`, which
//!    serializes writers on the account row.
//! 3. **Deadlock freedom**: row locks are always taken in ascending account id order.

pub mod engine;

pub use engine::TransferEngine;
