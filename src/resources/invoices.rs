//! Invoice handlers

use super::payload::Payload;
use super::state::{AppState, parse_id};
use crate::balance::BalanceChange;
use crate::core::error::TallyResult;
use crate::core::store::{Filter, Sort};
use crate::entities::{Invoice, InvoiceStatus};
use crate::server::registry::ResourceDescriptor;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

pub async fn create_invoice(
    State(state): State<AppState>,
    Payload(invoice): Payload<Invoice>,
) -> TallyResult<(StatusCode, Json<Invoice>)> {
    let created = state.balances.record_invoice(invoice).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_invoices(State(state): State<AppState>) -> TallyResult<Json<Vec<Invoice>>> {
    let invoices = state
        .invoices
        .list(&Filter::all(), Some(&Sort::descending("timestamp")))
        .await?;
    Ok(Json(invoices))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TallyResult<Json<Invoice>> {
    let id = parse_id(&id)?;
    Ok(Json(state.invoices.require(&id).await?))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(invoice): Payload<Invoice>,
) -> TallyResult<Json<Invoice>> {
    let id = parse_id(&id)?;
    Ok(Json(state.balances.amend_invoice(id, invoice).await?))
}

/// Delete an invoice without touching the customer's balance
pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TallyResult<Json<Value>> {
    let id = parse_id(&id)?;
    state.invoices.delete(&id).await?;
    tracing::info!(invoice_id = %id, "invoice deleted");
    Ok(Json(json!({ "deletedCount": 1 })))
}

pub async fn revert_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TallyResult<Json<BalanceChange>> {
    let id = parse_id(&id)?;
    Ok(Json(state.balances.revert_invoice(id).await?))
}

pub async fn set_invoice_status(
    State(state): State<AppState>,
    Path((id, status)): Path<(String, String)>,
) -> TallyResult<Json<Invoice>> {
    let id = parse_id(&id)?;
    let status = InvoiceStatus::from(status);
    state
        .invoices
        .set_field(&id, "status", status.as_str())
        .await?;
    Ok(Json(state.invoices.require(&id).await?))
}

/// Routes for `/invoices`
pub struct InvoiceResource {
    state: AppState,
}

impl InvoiceResource {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl ResourceDescriptor for InvoiceResource {
    fn name(&self) -> &str {
        "invoices"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/invoices", post(create_invoice).get(list_invoices))
            .route(
                "/invoices/{id}",
                get(get_invoice).put(update_invoice).delete(delete_invoice),
            )
            .route("/invoices/revert/{id}", delete(revert_invoice))
            .route("/invoices/status/{id}/{status}", get(set_invoice_status))
            .with_state(self.state.clone())
    }
}
