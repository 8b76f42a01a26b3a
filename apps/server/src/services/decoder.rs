// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Native decoder collaborator for the lifecycle controller.
//!
//! Geometry decoding proper is delegated to the viewer's own engine;
//! this decoder validates the payload envelope, fingerprints the
//! content with SHA-256 (reporting fractional progress per chunk on a
//! blocking task), and retains the bytes so a loaded bundle can be
//! exported back to the client.

use fragview_lifecycle::{DecodeFailure, DecodeJob, Decoder, DisposeError, FragmentHandle, SourceKind};
use futures::future::BoxFuture;
use sha2::{Digest, Sha256};

/// STEP physical-file header every IFC file must open with.
const STEP_HEADER: &[u8] = b"ISO-10303-21";

/// Chunk size for fingerprinting, sized so large uploads produce a
/// useful progress curve.
const FINGERPRINT_CHUNK: usize = 1 << 20;

/// Decoded model handle: the validated payload plus its content hash.
pub struct NativeFragment {
    bytes: Vec<u8>,
    fingerprint: String,
}

impl NativeFragment {
    /// The bundle bytes, for export back to the client.
    pub fn bundle_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// SHA-256 content hash of the payload.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl FragmentHandle for NativeFragment {
    fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    fn dispose(&mut self) -> Result<(), DisposeError> {
        self.bytes = Vec::new();
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// The server's decoding collaborator.
pub struct NativeDecoder;

impl NativeDecoder {
    fn validate(job: &DecodeJob) -> Result<(), DecodeFailure> {
        match job.kind {
            SourceKind::GeometrySource => {
                if !job.bytes.starts_with(STEP_HEADER) {
                    return Err(DecodeFailure::new(
                        "not a STEP file: missing ISO-10303-21 header",
                    ));
                }
            }
            SourceKind::PrecompiledBundle => {
                if job.bytes.is_empty() {
                    return Err(DecodeFailure::new("empty fragment bundle"));
                }
            }
        }
        Ok(())
    }
}

impl Decoder for NativeDecoder {
    fn decode(
        &self,
        job: DecodeJob,
    ) -> BoxFuture<'static, Result<Box<dyn FragmentHandle>, DecodeFailure>> {
        Box::pin(async move {
            Self::validate(&job)?;

            let DecodeJob {
                name,
                bytes,
                progress,
                ..
            } = job;

            // Fingerprinting is CPU work; keep it off the runtime.
            let (bytes, fingerprint) = tokio::task::spawn_blocking(move || {
                let total = bytes.len().max(1);
                let mut hasher = Sha256::new();
                let mut done = 0usize;
                for chunk in bytes.chunks(FINGERPRINT_CHUNK) {
                    hasher.update(chunk);
                    done += chunk.len();
                    progress.report(done as f32 / total as f32);
                }
                (bytes, hex::encode(hasher.finalize()))
            })
            .await
            .map_err(|e| DecodeFailure::new(format!("decode task failed: {e}")))?;

            tracing::debug!(name = %name, fingerprint = %fingerprint, "payload decoded");
            Ok(Box::new(NativeFragment { bytes, fingerprint }) as Box<dyn FragmentHandle>)
        })
    }
}
