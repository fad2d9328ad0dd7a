//! Customer balance reconciliation
//!
//! - [`BalanceReconciler`] applies invoice and payment deltas
//! - [`KeyedLocks`] and [`IsolationGuard`] serialize sequences per key
//! - [`BalanceHook`] is called when a payment settles a balance

pub mod engine;
pub mod hooks;
pub mod locks;

pub use engine::{BalanceChange, BalanceReconciler};
pub use hooks::{BalanceHook, NoopBalanceHook};
pub use locks::{Isolation, IsolationGuard, KeyGuard, KeyedLocks};
