//! Customer handlers
//!
//! Creating a customer writes its opening balance as sent. Editing a customer
//! is a manual override of every editable field, balance included, and goes
//! through the reconciler so it cannot interleave with a running delta.

use super::payload::Payload;
use super::state::{AppState, parse_id};
use crate::core::error::TallyResult;
use crate::core::store::{Filter, Sort};
use crate::entities::{ActivityStatus, Customer};
use crate::server::registry::ResourceDescriptor;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

pub async fn create_customer(
    State(state): State<AppState>,
    Payload(customer): Payload<Customer>,
) -> TallyResult<(StatusCode, Json<Customer>)> {
    let created = state.customers.insert(customer).await?;
    tracing::info!(
        customer_id = ?created.id,
        balance = created.balance,
        "customer created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_customers(State(state): State<AppState>) -> TallyResult<Json<Vec<Customer>>> {
    let customers = state
        .customers
        .list(&Filter::all(), Some(&Sort::ascending("name")))
        .await?;
    Ok(Json(customers))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TallyResult<Json<Customer>> {
    let id = parse_id(&id)?;
    Ok(Json(state.customers.require(&id).await?))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(customer): Payload<Customer>,
) -> TallyResult<Json<Customer>> {
    let id = parse_id(&id)?;
    Ok(Json(state.balances.overwrite_customer(id, customer).await?))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TallyResult<Json<Value>> {
    let id = parse_id(&id)?;
    state.customers.delete(&id).await?;
    Ok(Json(json!({ "deletedCount": 1 })))
}

async fn set_status(
    state: &AppState,
    raw_id: &str,
    status: ActivityStatus,
) -> TallyResult<Customer> {
    let id = parse_id(raw_id)?;
    state
        .customers
        .set_field(&id, "status", status.as_str())
        .await?;
    state.customers.require(&id).await
}

pub async fn disable_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TallyResult<Json<Customer>> {
    Ok(Json(set_status(&state, &id, ActivityStatus::Disabled).await?))
}

pub async fn enable_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TallyResult<Json<Customer>> {
    Ok(Json(set_status(&state, &id, ActivityStatus::Active).await?))
}

/// Routes for `/customer` and `/customers`
pub struct CustomerResource {
    state: AppState,
}

impl CustomerResource {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl ResourceDescriptor for CustomerResource {
    fn name(&self) -> &str {
        "customers"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/customer", post(create_customer))
            .route("/customers", get(list_customers))
            .route(
                "/customer/{id}",
                get(get_customer)
                    .put(update_customer)
                    .delete(delete_customer),
            )
            .route("/customer/disabled/{id}", delete(disable_customer))
            .route("/customer/enabled/{id}", get(enable_customer))
            .with_state(self.state.clone())
    }
}
