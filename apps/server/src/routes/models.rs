// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model lifecycle endpoints: upload, list, unload, clear, export.

use crate::error::ApiError;
use crate::services::cache::DiskCache;
use crate::services::decoder::NativeFragment;
use crate::types::{ClearResponse, FromCacheRequest, LoadResponse, ModelListResponse, UnloadResponse};
use crate::AppState;
use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use fragview_lifecycle::LoadRequest;

/// Extract file name and data from a multipart request.
async fn extract_file(multipart: &mut Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default();
        tracing::debug!(field_name = %field_name, "Processing multipart field");

        if field_name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            if file_name.is_empty() {
                tracing::warn!("Multipart 'file' field has no file name");
                return Err(ApiError::MissingFile);
            }
            let bytes = field.bytes().await?;
            tracing::debug!(file_name = %file_name, size = bytes.len(), "Extracted file from multipart");
            return Ok((file_name, bytes.to_vec()));
        }
    }

    tracing::warn!("No 'file' field found in multipart request");
    Err(ApiError::MissingFile)
}

/// Run a load through the controller and cache the payload.
async fn load_payload(
    state: &AppState,
    name: String,
    data: Vec<u8>,
) -> Result<Json<LoadResponse>, ApiError> {
    let cache_key = DiskCache::generate_key(&data);

    // Cache the payload in the background so a future from-cache load
    // can skip the upload.
    let cache = state.cache.clone();
    let key = cache_key.clone();
    let payload = data.clone();
    tokio::spawn(async move {
        if let Err(e) = cache.set_bytes(&key, &payload).await {
            tracing::error!(error = %e, "Failed to cache payload");
        }
    });

    let model = state.lifecycle.load(LoadRequest::new(name, data)).await?;

    Ok(Json(LoadResponse { cache_key, model }))
}

/// POST /api/v1/models - Upload a file and load it.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<LoadResponse>, ApiError> {
    let (name, data) = extract_file(&mut multipart).await?;

    if data.len() > state.config.max_file_size_mb * 1024 * 1024 {
        return Err(ApiError::FileTooLarge {
            max_mb: state.config.max_file_size_mb,
        });
    }

    tracing::info!(name = %name, size = data.len(), "Upload received");
    load_payload(&state, name, data).await
}

/// POST /api/v1/models/from-cache/:hash - Load a previously cached payload.
pub async fn from_cache(
    State(state): State<AppState>,
    Path(hash): Path<String>,
    Json(request): Json<FromCacheRequest>,
) -> Result<Json<LoadResponse>, ApiError> {
    let data = state
        .cache
        .get_bytes(&hash)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Cache key not found: {}", hash)))?;

    tracing::info!(hash = %hash, name = %request.name, "Loading from cache");
    load_payload(&state, request.name, data).await
}

/// GET /api/v1/models - List loaded models.
pub async fn list(State(state): State<AppState>) -> Json<ModelListResponse> {
    Json(ModelListResponse {
        models: state.lifecycle.models(),
    })
}

/// DELETE /api/v1/models/:id - Unload one model.
pub async fn unload(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UnloadResponse>, ApiError> {
    state.lifecycle.unload(&id)?;
    Ok(Json(UnloadResponse { model_id: id }))
}

/// DELETE /api/v1/models - Clear all loaded models.
pub async fn clear(State(state): State<AppState>) -> Json<ClearResponse> {
    let report = state.lifecycle.clear();
    Json(ClearResponse { report })
}

/// GET /api/v1/models/:id/export - Download the loaded bundle.
///
/// Mirrors the viewer's "download fragments" control: the decoded
/// bundle is handed back as a binary attachment.
pub async fn export(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let exported = state
        .lifecycle
        .with_model(&id, |info, handle| {
            handle
                .as_any()
                .downcast_ref::<NativeFragment>()
                .map(|fragment| (info.name.clone(), fragment.bundle_bytes().to_vec()))
        })
        .ok_or_else(|| ApiError::NotFound(format!("No loaded model with id '{}'", id)))?;

    let (name, bytes) =
        exported.ok_or_else(|| ApiError::Internal("model handle is not exportable".into()))?;

    tracing::info!(model_id = %id, size = bytes.len(), "Exporting bundle");

    let file_name = format!("{}.frag", id);
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        )
        .header("X-Source-Name", name)
        .header(header::CONTENT_LENGTH, bytes.len())
        .body(Body::from(bytes))
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(response)
}
