// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use fragview_lifecycle::{ClearReport, ModelInfo};
use serde::Serialize;

/// Response to a successful model load.
#[derive(Debug, Serialize)]
pub struct LoadResponse {
    /// Content hash of the uploaded payload (cache key).
    pub cache_key: String,
    /// Snapshot of the loaded model.
    pub model: ModelInfo,
}

/// Currently loaded models, sorted by identifier.
#[derive(Debug, Serialize)]
pub struct ModelListResponse {
    pub models: Vec<ModelInfo>,
}

/// Response to unloading one model.
#[derive(Debug, Serialize)]
pub struct UnloadResponse {
    /// Identifier of the unloaded model.
    pub model_id: String,
}

/// Response to clearing all models.
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    /// Removal and disposal-failure report from the controller.
    pub report: ClearReport,
}

/// Payload cache probe result.
#[derive(Debug, Serialize)]
pub struct CacheCheckResponse {
    /// Content hash that was probed.
    pub hash: String,
    /// Whether the payload is cached.
    pub cached: bool,
}
