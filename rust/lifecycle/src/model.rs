// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loaded-model bookkeeping.

use crate::decoder::FragmentHandle;
use crate::request::SourceKind;

/// Snapshot of a loaded (or loading) model, handed to observers.
///
/// Observers must treat snapshots as read-only; the tracked set is
/// mutated only by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelInfo {
    /// Identifier derived from the file name, unique among currently
    /// loaded models.
    pub id: String,
    /// Original file name, including extension.
    pub name: String,
    /// Source kind the file was classified as.
    pub kind: SourceKind,
    /// Raw payload length in bytes.
    pub byte_len: usize,
}

/// A tracked model: its snapshot plus the opaque decoder handle.
///
/// The handle is exclusively owned by the controller and disposed on
/// unload, clear, or replacement.
pub(crate) struct LoadedModel {
    pub info: ModelInfo,
    pub handle: Box<dyn FragmentHandle>,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}
