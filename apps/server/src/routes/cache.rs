// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Payload cache probe endpoint.

use crate::types::CacheCheckResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

/// GET /api/v1/cache/check/:hash - Check whether a payload is cached.
///
/// Lets a client skip the upload for a file it has loaded before: on a
/// hit it can call `POST /api/v1/models/from-cache/:hash` instead.
pub async fn check(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Json<CacheCheckResponse> {
    let cached = state.cache.has(&hash).await;
    tracing::debug!(hash = %hash, cached, "Cache probe");
    Json(CacheCheckResponse { hash, cached })
}
