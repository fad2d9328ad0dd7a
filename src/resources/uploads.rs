//! File upload passthrough to the object store

use super::state::AppState;
use crate::core::error::{TallyError, TallyResult};
use crate::server::registry::ResourceDescriptor;
use crate::storage::PutObject;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use std::path::Path;

/// Multipart field carrying the files
pub const FILES_FIELD: &str = "files";

/// Object name and content type for an uploaded file
///
/// Names are the upload time in nanoseconds followed by the original
/// extension. Files with an extension are typed `image/{ext}`.
pub fn object_meta(file_name: &str, nanos: i64) -> (String, String) {
    match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some(ext) => (format!("{nanos}.{ext}"), format!("image/{ext}")),
        None => (nanos.to_string(), "application/octet-stream".to_string()),
    }
}

/// Store every `files` part and return their public URLs in upload order
pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> TallyResult<Json<Vec<String>>> {
    let started = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let mut urls = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| TallyError::Upload(e.to_string()))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| TallyError::Upload(e.to_string()))?;

        // Offset by position so files in one request never share a name
        let (name, content_type) = object_meta(&file_name, started + urls.len() as i64);
        let url = state
            .objects
            .put_object(PutObject {
                bucket: state.bucket.clone(),
                name: name.clone(),
                bytes: bytes.to_vec(),
                content_type,
            })
            .await
            .map_err(|e| TallyError::Upload(format!("{e:#}")))?;

        tracing::debug!(file = %file_name, object = %name, "file uploaded");
        urls.push(url);
    }

    tracing::info!(count = urls.len(), "upload complete");
    Ok(Json(urls))
}

/// Routes for `/upload`
pub struct UploadResource {
    state: AppState,
    max_bytes: usize,
}

impl UploadResource {
    pub fn new(state: AppState, max_bytes: usize) -> Self {
        Self { state, max_bytes }
    }
}

impl ResourceDescriptor for UploadResource {
    fn name(&self) -> &str {
        "uploads"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/upload", post(upload_files))
            .layer(DefaultBodyLimit::max(self.max_bytes))
            .with_state(self.state.clone())
    }
}
