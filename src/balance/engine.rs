//! Balance reconciliation
//!
//! Every invoice and payment lifecycle event shifts the referenced
//! customer's running balance. Each sequence reads the prior state, computes
//! the new balance, writes it to the customer and then writes or deletes the
//! triggering record. There is no transaction spanning those writes: the
//! first failing step aborts the sequence and earlier writes stay in place.
//!
//! With [`Isolation::PerKey`] a sequence holds the locks of the record it
//! edits and of every customer it touches until it completes, so concurrent
//! sequences on the same customer cannot lose updates.

use super::hooks::{BalanceHook, NoopBalanceHook};
use super::locks::{Isolation, IsolationGuard, KeyedLocks};
use crate::core::error::{TallyError, TallyResult};
use crate::core::repository::Repository;
use crate::core::store::DocumentStore;
use crate::entities::{Customer, Invoice, InvoiceStatus, PaymentCapture};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// One balance write
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceChange {
    pub customer_id: Uuid,
    pub previous: f64,
    pub current: f64,
}

impl BalanceChange {
    pub fn delta(&self) -> f64 {
        self.current - self.previous
    }
}

fn ensure_finite(field: &str, value: f64) -> TallyResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TallyError::Validation(format!(
            "{field} must be a finite number, got {value}"
        )))
    }
}

/// Applies balance deltas for invoice and payment lifecycle events
#[derive(Clone)]
pub struct BalanceReconciler {
    customers: Repository<Customer>,
    invoices: Repository<Invoice>,
    payments: Repository<PaymentCapture>,
    locks: KeyedLocks,
    isolation: Isolation,
    hook: Arc<dyn BalanceHook>,
}

impl BalanceReconciler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            customers: Repository::new(store.clone()),
            invoices: Repository::new(store.clone()),
            payments: Repository::new(store),
            locks: KeyedLocks::new(),
            isolation: Isolation::default(),
            hook: Arc::new(NoopBalanceHook),
        }
    }

    pub fn with_isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn BalanceHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn isolation(&self) -> Isolation {
        self.isolation
    }

    fn guard(&self) -> IsolationGuard {
        IsolationGuard::new(&self.locks, self.isolation)
    }

    /// Read the customer, compute its new balance and write it back
    ///
    /// Must run under a guard holding the customer's lock. A result that
    /// overflows to infinity is rejected before the write.
    async fn adjust<F>(&self, customer_id: Uuid, compute: F) -> TallyResult<BalanceChange>
    where
        F: FnOnce(f64) -> f64,
    {
        let customer = self.customers.require(&customer_id).await?;
        let previous = customer.balance;
        let current = compute(previous);
        ensure_finite("balance", current)?;

        self.customers
            .set_field(&customer_id, "balance", current)
            .await?;

        tracing::debug!(
            customer_id = %customer_id,
            previous,
            current,
            delta = current - previous,
            "customer balance written"
        );

        Ok(BalanceChange {
            customer_id,
            previous,
            current,
        })
    }

    // ------------------------------------------------------------------
    // Delta operations
    // ------------------------------------------------------------------

    /// Add an invoice total to the customer's balance
    ///
    /// Fails with `NotFound` and writes nothing when the customer is absent.
    pub async fn apply_invoice_created(
        &self,
        customer_id: Uuid,
        total: f64,
    ) -> TallyResult<BalanceChange> {
        ensure_finite("total", total)?;
        let mut guard = self.guard();
        guard.lock_customers(&[customer_id]).await;

        self.adjust(customer_id, |b| b + total).await
    }

    /// Subtract a payment amount from the customer's balance
    ///
    /// The balance hook runs when the result is at or below zero.
    pub async fn apply_payment_created(
        &self,
        customer_id: Uuid,
        amount: f64,
    ) -> TallyResult<BalanceChange> {
        ensure_finite("amount", amount)?;
        let mut guard = self.guard();
        guard.lock_customers(&[customer_id]).await;

        self.payment_created(customer_id, amount).await
    }

    async fn payment_created(&self, customer_id: Uuid, amount: f64) -> TallyResult<BalanceChange> {
        let change = self.adjust(customer_id, |b| b - amount).await?;
        if change.current <= 0.0 {
            self.hook.balance_settled(&change).await;
        }
        Ok(change)
    }

    /// Replace a stored invoice's contribution with `new_total` for
    /// `new_customer`
    ///
    /// Only the balances are written; the invoice record is left as is.
    pub async fn apply_invoice_edited(
        &self,
        invoice_id: Uuid,
        new_customer: Uuid,
        new_total: f64,
    ) -> TallyResult<Vec<BalanceChange>> {
        ensure_finite("total", new_total)?;
        let mut guard = self.guard();
        guard.lock_record(invoice_id).await;

        let previous = self.invoices.require(&invoice_id).await?;
        let old_customer = previous.customer_ref()?;
        guard.lock_customers(&[old_customer, new_customer]).await;

        self.invoice_edited(old_customer, previous.total, new_customer, new_total)
            .await
    }

    async fn invoice_edited(
        &self,
        old_customer: Uuid,
        old_total: f64,
        new_customer: Uuid,
        new_total: f64,
    ) -> TallyResult<Vec<BalanceChange>> {
        if old_customer == new_customer {
            let change = self
                .adjust(new_customer, |b| (b - old_total) + new_total)
                .await?;
            return Ok(vec![change]);
        }

        // Both customers must exist before either is written
        self.customers.require(&new_customer).await?;
        let reversed = self.adjust(old_customer, |b| b - old_total).await?;
        let applied = self.adjust(new_customer, |b| b + new_total).await?;

        tracing::info!(
            from = %old_customer,
            to = %new_customer,
            "invoice moved between customers"
        );
        Ok(vec![reversed, applied])
    }

    /// Replace a stored payment's contribution with `new_amount` for
    /// `new_customer`
    ///
    /// Only the balances are written; the payment record is left as is.
    pub async fn apply_payment_edited(
        &self,
        payment_id: Uuid,
        new_customer: Uuid,
        new_amount: f64,
    ) -> TallyResult<Vec<BalanceChange>> {
        ensure_finite("amount", new_amount)?;
        let mut guard = self.guard();
        guard.lock_record(payment_id).await;

        let previous = self.payments.require(&payment_id).await?;
        let old_customer = previous.customer_ref()?;
        guard.lock_customers(&[old_customer, new_customer]).await;

        self.payment_edited(old_customer, previous.amount, new_customer, new_amount)
            .await
    }

    async fn payment_edited(
        &self,
        old_customer: Uuid,
        old_amount: f64,
        new_customer: Uuid,
        new_amount: f64,
    ) -> TallyResult<Vec<BalanceChange>> {
        if old_customer == new_customer {
            let change = self
                .adjust(new_customer, |b| (b + old_amount) - new_amount)
                .await?;
            return Ok(vec![change]);
        }

        self.customers.require(&new_customer).await?;
        let reversed = self.adjust(old_customer, |b| b + old_amount).await?;
        let applied = self.adjust(new_customer, |b| b - new_amount).await?;

        tracing::info!(
            from = %old_customer,
            to = %new_customer,
            "payment moved between customers"
        );
        Ok(vec![reversed, applied])
    }

    /// Give a payment back to its customer and delete the payment
    ///
    /// A payment captured against an invoice sets that invoice back to
    /// `unpaid`; an invoice deleted in the meantime is skipped.
    pub async fn revert_payment(&self, payment_id: Uuid) -> TallyResult<BalanceChange> {
        let mut guard = self.guard();
        guard.lock_record(payment_id).await;

        let payment = self.payments.require(&payment_id).await?;
        let customer_id = payment.customer_ref()?;
        guard.lock_customers(&[customer_id]).await;

        let change = self.adjust(customer_id, |b| b + payment.amount).await?;
        self.payments.delete(&payment_id).await?;

        if let Some(invoice_id) = payment.invoice_id {
            match self
                .invoices
                .set_field(&invoice_id, "status", InvoiceStatus::Unpaid.as_str())
                .await
            {
                Ok(()) => {}
                Err(TallyError::NotFound { .. }) => {
                    tracing::debug!(invoice_id = %invoice_id, "settled invoice already gone");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            payment_id = %payment_id,
            customer_id = %customer_id,
            balance = change.current,
            "payment reverted"
        );
        Ok(change)
    }

    /// Take an invoice back off its customer's balance and delete the invoice
    pub async fn revert_invoice(&self, invoice_id: Uuid) -> TallyResult<BalanceChange> {
        let mut guard = self.guard();
        guard.lock_record(invoice_id).await;

        let invoice = self.invoices.require(&invoice_id).await?;
        let customer_id = invoice.customer_ref()?;
        guard.lock_customers(&[customer_id]).await;

        let change = self.adjust(customer_id, |b| b - invoice.total).await?;
        self.invoices.delete(&invoice_id).await?;

        tracing::info!(
            invoice_id = %invoice_id,
            customer_id = %customer_id,
            balance = change.current,
            "invoice reverted"
        );
        Ok(change)
    }

    // ------------------------------------------------------------------
    // Record operations
    // ------------------------------------------------------------------

    /// Charge the invoice to its customer, then store it
    pub async fn record_invoice(&self, invoice: Invoice) -> TallyResult<Invoice> {
        ensure_finite("total", invoice.total)?;
        let customer_id = invoice.customer_ref()?;

        let mut guard = self.guard();
        guard.lock_customers(&[customer_id]).await;

        let change = self.adjust(customer_id, |b| b + invoice.total).await?;
        let created = self.invoices.insert(invoice).await?;

        tracing::info!(
            invoice_id = ?created.id,
            customer_id = %customer_id,
            balance = change.current,
            "invoice recorded"
        );
        Ok(created)
    }

    /// Credit the payment to its customer, store it and, when captured
    /// against an invoice, mark that invoice paid
    ///
    /// An unknown invoice fails with `NotFound` before anything is written.
    pub async fn record_payment(
        &self,
        mut payment: PaymentCapture,
        invoice_id: Option<Uuid>,
    ) -> TallyResult<PaymentCapture> {
        ensure_finite("amount", payment.amount)?;
        let customer_id = payment.customer_ref()?;

        let mut guard = self.guard();
        if let Some(invoice_id) = invoice_id {
            guard.lock_record(invoice_id).await;
            self.invoices.require(&invoice_id).await?;
        }
        guard.lock_customers(&[customer_id]).await;

        let change = self.payment_created(customer_id, payment.amount).await?;

        payment.invoice_id = invoice_id;
        let created = self.payments.insert(payment).await?;

        if let Some(invoice_id) = invoice_id {
            self.invoices
                .set_field(&invoice_id, "status", InvoiceStatus::Paid.as_str())
                .await?;
        }

        tracing::info!(
            payment_id = ?created.id,
            customer_id = %customer_id,
            invoice_id = ?invoice_id,
            balance = change.current,
            "payment recorded"
        );
        Ok(created)
    }

    /// Rebalance for the edited invoice, then overwrite its editable fields
    pub async fn amend_invoice(&self, invoice_id: Uuid, invoice: Invoice) -> TallyResult<Invoice> {
        ensure_finite("total", invoice.total)?;
        let new_customer = invoice.customer_ref()?;

        let mut guard = self.guard();
        guard.lock_record(invoice_id).await;

        let previous = self.invoices.require(&invoice_id).await?;
        let old_customer = previous.customer_ref()?;
        guard.lock_customers(&[old_customer, new_customer]).await;

        self.invoice_edited(old_customer, previous.total, new_customer, invoice.total)
            .await?;
        self.invoices
            .set_fields(&invoice_id, invoice.editable_fields()?)
            .await?;

        tracing::info!(invoice_id = %invoice_id, total = invoice.total, "invoice amended");
        self.invoices.require(&invoice_id).await
    }

    /// Rebalance for the edited payment, then overwrite its editable fields
    pub async fn amend_payment(
        &self,
        payment_id: Uuid,
        payment: PaymentCapture,
    ) -> TallyResult<PaymentCapture> {
        ensure_finite("amount", payment.amount)?;
        let new_customer = payment.customer_ref()?;

        let mut guard = self.guard();
        guard.lock_record(payment_id).await;

        let previous = self.payments.require(&payment_id).await?;
        let old_customer = previous.customer_ref()?;
        guard.lock_customers(&[old_customer, new_customer]).await;

        self.payment_edited(old_customer, previous.amount, new_customer, payment.amount)
            .await?;
        self.payments
            .set_fields(&payment_id, payment.editable_fields())
            .await?;

        tracing::info!(payment_id = %payment_id, amount = payment.amount, "payment amended");
        self.payments.require(&payment_id).await
    }

    /// Overwrite a customer's editable fields, balance included
    ///
    /// Takes the customer's lock so a manual edit cannot interleave with a
    /// running delta.
    pub async fn overwrite_customer(
        &self,
        customer_id: Uuid,
        customer: Customer,
    ) -> TallyResult<Customer> {
        ensure_finite("balance", customer.balance)?;

        let mut guard = self.guard();
        guard.lock_customers(&[customer_id]).await;

        self.customers
            .set_fields(&customer_id, customer.editable_fields())
            .await?;

        tracing::info!(
            customer_id = %customer_id,
            balance = customer.balance,
            "customer overwritten"
        );
        self.customers.require(&customer_id).await
    }
}
