// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Health check endpoint.

use axum::Json;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
}

/// API information response.
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

/// Endpoint information.
#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

/// GET /api/v1/health - Health check endpoint.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "fragview-server",
    })
}

/// GET / - API information endpoint.
pub async fn info() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "fragview-server",
        version: env!("CARGO_PKG_VERSION"),
        description: "Model-hosting server for fragment-based BIM viewers",
        endpoints: vec![
            EndpointInfo {
                method: "GET",
                path: "/api/v1/health",
                description: "Health check endpoint",
            },
            EndpointInfo {
                method: "POST",
                path: "/api/v1/models",
                description: "Upload and load a model (multipart)",
            },
            EndpointInfo {
                method: "GET",
                path: "/api/v1/models",
                description: "List loaded models",
            },
            EndpointInfo {
                method: "DELETE",
                path: "/api/v1/models/:id",
                description: "Unload one model",
            },
            EndpointInfo {
                method: "DELETE",
                path: "/api/v1/models",
                description: "Clear all loaded models",
            },
            EndpointInfo {
                method: "GET",
                path: "/api/v1/models/:id/export",
                description: "Download the loaded bundle",
            },
            EndpointInfo {
                method: "POST",
                path: "/api/v1/models/from-cache/:hash",
                description: "Re-load a previously cached payload",
            },
            EndpointInfo {
                method: "GET",
                path: "/api/v1/cache/check/:hash",
                description: "Payload cache probe",
            },
            EndpointInfo {
                method: "GET",
                path: "/api/v1/events",
                description: "Lifecycle event stream (Server-Sent Events)",
            },
        ],
    })
}
