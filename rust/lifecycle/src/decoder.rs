// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collaborator contracts: decoder, fragment handle, scene sink.
//!
//! The controller treats all three as black boxes with narrow
//! contracts. It never interprets handle internals and never manages
//! rendering.

use crate::error::{DecodeFailure, DisposeError};
use crate::model::ModelInfo;
use crate::request::SourceKind;
use futures_util::future::BoxFuture;
use tokio::sync::mpsc;

/// Opaque reference to decoded geometry, owned exclusively by the
/// controller.
pub trait FragmentHandle: Send {
    /// Size of the decoded payload in bytes.
    fn byte_len(&self) -> usize;

    /// Release the underlying resource. Called at most once, before
    /// the handle is dropped.
    fn dispose(&mut self) -> std::result::Result<(), DisposeError>;

    /// Downcast support for hosts that know the concrete handle type
    /// (e.g. to export the decoded bundle).
    fn as_any(&self) -> &dyn std::any::Any;
}

impl std::fmt::Debug for dyn FragmentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentHandle")
            .field("byte_len", &self.byte_len())
            .finish()
    }
}

/// Progress channel handed to the decoder for one decode job.
///
/// Reports are forwarded to subscribers as `Progress` events. Sending
/// never blocks; reports arriving after the decoder has completed are
/// drained before the terminal event and can never produce a second
/// terminal.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<f32>,
}

impl ProgressSink {
    /// Create a sink and its receiving end. The controller builds one
    /// per load; decoder implementations use this to unit-test their
    /// progress reporting.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<f32>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Report a completion fraction in `0.0..=1.0`. Reports are
    /// expected to be non-decreasing; the controller forwards them
    /// without filtering.
    pub fn report(&self, fraction: f32) {
        // Receiver gone means the load already terminated; drop it.
        let _ = self.tx.send(fraction);
    }
}

/// One decode operation handed to the [`Decoder`].
pub struct DecodeJob {
    /// Original file name, including extension.
    pub name: String,
    /// Classified source kind.
    pub kind: SourceKind,
    /// Raw file payload.
    pub bytes: Vec<u8>,
    /// Progress channel; the decoder may report fractions in
    /// `0.0..=1.0` or not at all.
    pub progress: ProgressSink,
}

impl std::fmt::Debug for DecodeJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeJob")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Asynchronous decoding collaborator.
///
/// Implementations may decode jobs concurrently or serialize them
/// internally; the controller imposes no ordering across distinct
/// model identifiers.
pub trait Decoder: Send + Sync {
    /// Decode one payload into an opaque fragment handle.
    fn decode(
        &self,
        job: DecodeJob,
    ) -> BoxFuture<'static, std::result::Result<Box<dyn FragmentHandle>, DecodeFailure>>;
}

/// Scene attachment sink: receives the handle on success and the
/// identifier on removal. Purely a collaborator; the controller does
/// not manage rendering.
///
/// Both methods run while the controller's state is locked and must
/// not call back into the controller.
pub trait SceneSink: Send + Sync {
    /// A model entered the tracked set.
    fn attach(&self, info: &ModelInfo, handle: &dyn FragmentHandle);

    /// A model left the tracked set.
    fn detach(&self, model_id: &str);
}
