// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Load requests and source-kind classification.

use crate::error::LoadError;

/// Kind of a loadable file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SourceKind {
    /// A file that requires decoding into renderable form (`.ifc`).
    GeometrySource,
    /// A file already in the renderer's native format (`.frag`).
    PrecompiledBundle,
}

impl SourceKind {
    /// Classify a file name by its extension (case-insensitive).
    ///
    /// Returns `None` for unrecognized extensions; callers turn that
    /// into [`LoadError::UnsupportedFormat`] before any side effect.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.').map(|(_, ext)| ext)?;
        if ext.eq_ignore_ascii_case("ifc") {
            Some(SourceKind::GeometrySource)
        } else if ext.eq_ignore_ascii_case("frag") {
            Some(SourceKind::PrecompiledBundle)
        } else {
            None
        }
    }

    /// Short label used in logs and serialized events.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::GeometrySource => "geometry_source",
            SourceKind::PrecompiledBundle => "precompiled_bundle",
        }
    }
}

/// Derive the model identifier from a file name: the file stem,
/// i.e. the name with its final extension removed.
pub fn derive_model_id(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

/// Progress hook a caller may attach to a single load.
pub type ProgressHook = Box<dyn Fn(f32) + Send + Sync>;

/// A request to load one file. Transient: exists only for the duration
/// of the load operation.
pub struct LoadRequest {
    /// Original file name, including extension.
    pub name: String,
    /// Raw file payload, handed opaquely to the decoder.
    pub bytes: Vec<u8>,
    /// Optional per-request progress hook, invoked in addition to the
    /// broadcast `Progress` events.
    pub on_progress: Option<ProgressHook>,
}

impl LoadRequest {
    /// Create a request for the given file name and payload.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            on_progress: None,
        }
    }

    /// Attach a progress hook to this request.
    pub fn with_progress(mut self, hook: impl Fn(f32) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(hook));
        self
    }

    /// Classify this request, rejecting unrecognized extensions.
    pub fn kind(&self) -> Result<SourceKind, LoadError> {
        SourceKind::from_name(&self.name).ok_or_else(|| LoadError::UnsupportedFormat {
            name: self.name.clone(),
        })
    }
}

impl std::fmt::Debug for LoadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadRequest")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_extensions() {
        assert_eq!(
            SourceKind::from_name("office.ifc"),
            Some(SourceKind::GeometrySource)
        );
        assert_eq!(
            SourceKind::from_name("school_str.frag"),
            Some(SourceKind::PrecompiledBundle)
        );
        assert_eq!(
            SourceKind::from_name("OFFICE.IFC"),
            Some(SourceKind::GeometrySource)
        );
    }

    #[test]
    fn rejects_unknown_extensions() {
        assert_eq!(SourceKind::from_name("box.xyz"), None);
        assert_eq!(SourceKind::from_name("noextension"), None);
        assert_eq!(SourceKind::from_name("archive.ifc.zip"), None);
    }

    #[test]
    fn derives_id_from_stem() {
        assert_eq!(derive_model_id("box.ifc"), "box");
        assert_eq!(derive_model_id("a.b.ifc"), "a.b");
        assert_eq!(derive_model_id("noextension"), "noextension");
        // Dotfile-style names keep the full name rather than an empty stem
        assert_eq!(derive_model_id(".ifc"), ".ifc");
    }
}
