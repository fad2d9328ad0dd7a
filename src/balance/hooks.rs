//! Extension point for settled balances

use super::BalanceChange;
use async_trait::async_trait;

/// Called when a payment leaves a customer's balance at or below zero
///
/// Runs inside the reconciliation guard, after the new balance has been
/// written. No business rule is attached by default.
#[async_trait]
pub trait BalanceHook: Send + Sync {
    async fn balance_settled(&self, change: &BalanceChange);
}

/// Hook that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBalanceHook;

#[async_trait]
impl BalanceHook for NoopBalanceHook {
    async fn balance_settled(&self, change: &BalanceChange) {
        tracing::info!(
            customer_id = %change.customer_id,
            balance = change.current,
            "customer balance settled"
        );
    }
}
