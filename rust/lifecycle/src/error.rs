// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error taxonomy for lifecycle operations.
//!
//! Every variant is recoverable: errors are returned to the caller of
//! the operation that failed (and mirrored as terminal events where a
//! load was already in flight) and never abort unrelated loads.

use thiserror::Error;

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors produced by the model lifecycle controller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The file extension is not in the recognized allowlist.
    #[error("unsupported file format: {name}")]
    UnsupportedFormat { name: String },

    /// A load for this identifier is already in flight.
    #[error("a load for model '{0}' is already in flight")]
    AlreadyLoading(String),

    /// The decoder collaborator rejected the payload.
    #[error("decode failed for '{model_id}': {message}")]
    Decode { model_id: String, message: String },

    /// No loaded model with this identifier.
    #[error("no loaded model with id '{0}'")]
    NotFound(String),

    /// The load was superseded by an unload before it terminated.
    #[error("load of '{0}' was canceled")]
    Canceled(String),

    /// The model was removed, but releasing its decoder handle failed.
    #[error("failed to dispose model '{model_id}': {message}")]
    Dispose { model_id: String, message: String },
}

/// Decoder-side failure: an opaque diagnostic from the collaborator.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DecodeFailure {
    /// Diagnostic message, attached verbatim to the `Failed` event.
    pub message: String,
}

impl DecodeFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure to release a decoder handle.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct DisposeError(pub String);

/// One failed disposal during [`clear`](crate::ModelLifecycle::clear).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClearFailure {
    /// Identifier of the model whose handle failed to dispose.
    pub model_id: String,
    /// Disposal diagnostic.
    pub message: String,
}

/// Outcome of a `clear` operation: best-effort, collect-and-report-all.
///
/// Every tracked model is removed and a `Removed` event emitted for it
/// even when its disposal failed; the failures are collected here.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClearReport {
    /// Identifiers removed from the tracked set, in removal order.
    pub removed: Vec<String>,
    /// Disposal failures, if any.
    pub failures: Vec<ClearFailure>,
}

impl ClearReport {
    /// Whether every disposal succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
