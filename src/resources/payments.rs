//! Payment capture handlers

use super::payload::Payload;
use super::state::{AppState, parse_id};
use crate::balance::BalanceChange;
use crate::core::error::TallyResult;
use crate::core::store::{Filter, Sort};
use crate::entities::PaymentCapture;
use crate::server::registry::ResourceDescriptor;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

pub async fn capture_payment(
    State(state): State<AppState>,
    Payload(payment): Payload<PaymentCapture>,
) -> TallyResult<(StatusCode, Json<PaymentCapture>)> {
    let created = state.balances.record_payment(payment, None).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Capture a payment that settles the invoice in the path
pub async fn capture_invoice_payment(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
    Payload(payment): Payload<PaymentCapture>,
) -> TallyResult<(StatusCode, Json<PaymentCapture>)> {
    let invoice_id = parse_id(&invoice_id)?;
    let created = state
        .balances
        .record_payment(payment, Some(invoice_id))
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_payments(
    State(state): State<AppState>,
) -> TallyResult<Json<Vec<PaymentCapture>>> {
    let payments = state
        .payments
        .list(&Filter::all(), Some(&Sort::descending("timestamp")))
        .await?;
    Ok(Json(payments))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TallyResult<Json<PaymentCapture>> {
    let id = parse_id(&id)?;
    Ok(Json(state.payments.require(&id).await?))
}

pub async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(payment): Payload<PaymentCapture>,
) -> TallyResult<Json<PaymentCapture>> {
    let id = parse_id(&id)?;
    Ok(Json(state.balances.amend_payment(id, payment).await?))
}

pub async fn revert_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TallyResult<Json<BalanceChange>> {
    let id = parse_id(&id)?;
    Ok(Json(state.balances.revert_payment(id).await?))
}

/// Routes for `/payment/capture` and `/payments`
pub struct PaymentResource {
    state: AppState,
}

impl PaymentResource {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl ResourceDescriptor for PaymentResource {
    fn name(&self) -> &str {
        "payments"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/payment/capture", post(capture_payment))
            .route("/payment/capture/{invoice_id}", post(capture_invoice_payment))
            .route("/payments", get(list_payments))
            .route("/payments/{id}", get(get_payment).put(update_payment))
            .route("/payments/revert/{id}", delete(revert_payment))
            .with_state(self.state.clone())
    }
}
