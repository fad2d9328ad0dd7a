//! ServerBuilder for fluent API to build the HTTP server

use super::registry::ResourceRegistry;
use crate::balance::{BalanceHook, BalanceReconciler};
use crate::config::{AppConfig, CorsConfig};
use crate::core::error::{TallyError, TallyResult};
use crate::core::store::DocumentStore;
use crate::resources::{
    AppState, CustomerResource, InvoiceResource, ItemResource, PaymentResource, UploadResource,
};
use crate::storage::{InMemoryObjectStore, ObjectStore};
use anyhow::Result;
use axum::http::{HeaderValue, Method, header};
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builder for the HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config(config)
///     .with_document_store(InMemoryDocumentStore::new())
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: AppConfig,
    store: Option<Arc<dyn DocumentStore>>,
    objects: Option<Arc<dyn ObjectStore>>,
    hook: Option<Arc<dyn BalanceHook>>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            store: None,
            objects: None,
            hook: None,
            custom_routes: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the document store (required)
    pub fn with_document_store(self, store: impl DocumentStore + 'static) -> Self {
        self.with_shared_document_store(Arc::new(store))
    }

    pub fn with_shared_document_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the object store receiving uploads; defaults to an in-memory one
    pub fn with_object_store(mut self, objects: Arc<dyn ObjectStore>) -> Self {
        self.objects = Some(objects);
        self
    }

    /// Replace the hook called when a payment settles a balance
    pub fn with_balance_hook(mut self, hook: Arc<dyn BalanceHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Add routes that are not part of a resource
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the handler state
    pub fn build_state(&self) -> TallyResult<AppState> {
        let store = self.store.clone().ok_or_else(|| {
            TallyError::Config("DocumentStore is required. Call .with_document_store()".into())
        })?;
        let objects = self
            .objects
            .clone()
            .unwrap_or_else(|| Arc::new(InMemoryObjectStore::new()));

        let mut balances =
            BalanceReconciler::new(store.clone()).with_isolation(self.config.balance.isolation);
        if let Some(hook) = self.hook.clone() {
            balances = balances.with_hook(hook);
        }

        Ok(AppState::new(
            store,
            balances,
            objects,
            self.config.objects.bucket.clone(),
        ))
    }

    /// Build the final router
    ///
    /// Merges the health routes, every resource and the custom routes, then
    /// wraps them in the CORS and request tracing layers.
    pub fn build(mut self) -> TallyResult<Router> {
        let state = self.build_state()?;

        let mut registry = ResourceRegistry::new();
        registry.register(Box::new(ItemResource::new(state.clone())));
        registry.register(Box::new(CustomerResource::new(state.clone())));
        registry.register(Box::new(InvoiceResource::new(state.clone())));
        registry.register(Box::new(PaymentResource::new(state.clone())));
        registry.register(Box::new(UploadResource::new(
            state,
            self.config.uploads.max_bytes,
        )));

        tracing::debug!(resources = ?registry.names(), "registered resources");

        let mut app = health_routes().merge(registry.build_routes());
        for custom in std::mem::take(&mut self.custom_routes) {
            app = app.merge(custom);
        }

        Ok(app
            .layer(cors_layer(&self.config.cors))
            .layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// Binds to `server.bind` and handles SIGTERM and SIGINT (Ctrl+C).
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.server.bind.clone();
        let app = self.build()?;
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build health check routes
fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "tally"
    }))
}

/// CORS policy for browser clients
///
/// A `*` origin with credentials mirrors the request origin, since browsers
/// reject a literal wildcard on credentialed requests.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let wildcard = config.allowed_origins.iter().any(|o| o == "*");
    let origins = if wildcard && config.allow_credentials {
        AllowOrigin::mirror_request()
    } else if wildcard {
        AllowOrigin::any()
    } else {
        let list: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(list)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::SET_COOKIE])
        .expose_headers([header::SET_COOKIE])
        .allow_credentials(config.allow_credentials)
}

/// Wait for SIGTERM or Ctrl+C
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
