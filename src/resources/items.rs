//! Item (product) catalogue handlers

use super::payload::Payload;
use super::state::{AppState, parse_id};
use crate::core::error::TallyResult;
use crate::core::store::{Filter, Sort};
use crate::entities::{ActivityStatus, Item};
use crate::server::registry::ResourceDescriptor;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

pub async fn create_item(
    State(state): State<AppState>,
    Payload(item): Payload<Item>,
) -> TallyResult<(StatusCode, Json<Item>)> {
    let created = state.items.insert(item).await?;
    tracing::info!(item_id = ?created.id, name = %created.name, "item created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_items(State(state): State<AppState>) -> TallyResult<Json<Vec<Item>>> {
    let items = state
        .items
        .list(&Filter::all(), Some(&Sort::ascending("name")))
        .await?;
    Ok(Json(items))
}

pub async fn list_disabled_items(State(state): State<AppState>) -> TallyResult<Json<Vec<Item>>> {
    let items = state
        .items
        .list(
            &Filter::eq("status", ActivityStatus::Disabled.as_str()),
            Some(&Sort::ascending("name")),
        )
        .await?;
    Ok(Json(items))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TallyResult<Json<Item>> {
    let id = parse_id(&id)?;
    Ok(Json(state.items.require(&id).await?))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(item): Payload<Item>,
) -> TallyResult<Json<Item>> {
    let id = parse_id(&id)?;
    state.items.set_fields(&id, item.editable_fields()).await?;
    Ok(Json(state.items.require(&id).await?))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TallyResult<Json<Value>> {
    let id = parse_id(&id)?;
    state.items.delete(&id).await?;
    Ok(Json(json!({ "deletedCount": 1 })))
}

async fn set_status(state: &AppState, raw_id: &str, status: ActivityStatus) -> TallyResult<Item> {
    let id = parse_id(raw_id)?;
    state.items.set_field(&id, "status", status.as_str()).await?;
    state.items.require(&id).await
}

pub async fn disable_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TallyResult<Json<Item>> {
    Ok(Json(set_status(&state, &id, ActivityStatus::Disabled).await?))
}

pub async fn enable_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TallyResult<Json<Item>> {
    Ok(Json(set_status(&state, &id, ActivityStatus::Active).await?))
}

/// Routes for `/items`
pub struct ItemResource {
    state: AppState,
}

impl ItemResource {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl ResourceDescriptor for ItemResource {
    fn name(&self) -> &str {
        "items"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/items", post(create_item).get(list_items))
            .route("/items/disabled", get(list_disabled_items))
            .route(
                "/items/{id}",
                get(get_item).put(update_item).delete(delete_item),
            )
            .route("/items/disabled/{id}", delete(disable_item))
            .route("/items/enabled/{id}", get(enable_item))
            .with_state(self.state.clone())
    }
}
