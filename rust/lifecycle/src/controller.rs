// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The model lifecycle controller.
//!
//! Serializes and tracks load/unload operations against the decoder
//! collaborator and fans lifecycle events out to subscribers. All
//! state (tracked set, in-flight table, subscriber list) lives behind
//! one mutex that is never held across an await; every event is
//! broadcast while that mutex is held, which gives all subscribers a
//! single global event order.

use crate::decoder::{DecodeJob, Decoder, FragmentHandle, ProgressSink, SceneSink};
use crate::error::{ClearFailure, ClearReport, DecodeFailure, LoadError, Result};
use crate::event::LifecycleEvent;
use crate::model::{LoadedModel, ModelInfo};
use crate::request::{derive_model_id, LoadRequest};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Identifier of one event subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Receiving end of a subscription. Dropping the stream implicitly
/// unsubscribes on the next broadcast.
#[derive(Debug)]
pub struct EventStream {
    id: SubscriberId,
    rx: mpsc::UnboundedReceiver<LifecycleEvent>,
}

impl EventStream {
    /// Identifier to pass to [`ModelLifecycle::unsubscribe`].
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next event. Returns `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<LifecycleEvent> {
        self.rx.recv().await
    }

    /// Non-blocking poll for an already-delivered event.
    pub fn try_recv(&mut self) -> Option<LifecycleEvent> {
        self.rx.try_recv().ok()
    }

    /// Consume the stream, exposing the raw receiver (e.g. to wrap in
    /// a stream adapter for SSE forwarding).
    pub fn into_receiver(self) -> mpsc::UnboundedReceiver<LifecycleEvent> {
        self.rx
    }
}

struct Inner {
    models: FxHashMap<String, LoadedModel>,
    in_flight: FxHashMap<String, Arc<AtomicBool>>,
    subscribers: Vec<(SubscriberId, mpsc::UnboundedSender<LifecycleEvent>)>,
    next_subscriber: u64,
}

impl Inner {
    /// Deliver an event to every live subscriber, pruning closed ones.
    fn broadcast(&mut self, event: LifecycleEvent) {
        tracing::trace!(model_id = event.model_id(), ?event, "lifecycle event");
        self.subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }
}

/// Tracks zero-or-more loaded models and drives asynchronous loads
/// against the decoder collaborator.
///
/// Cheap to share behind an [`Arc`]; all operations take `&self`.
pub struct ModelLifecycle {
    decoder: Arc<dyn Decoder>,
    scene: Option<Arc<dyn SceneSink>>,
    inner: Mutex<Inner>,
}

impl ModelLifecycle {
    /// Create a controller over the given decoder, with no scene sink.
    pub fn new(decoder: Arc<dyn Decoder>) -> Self {
        Self {
            decoder,
            scene: None,
            inner: Mutex::new(Inner {
                models: FxHashMap::default(),
                in_flight: FxHashMap::default(),
                subscribers: Vec::new(),
                next_subscriber: 0,
            }),
        }
    }

    /// Create a controller that also notifies a scene sink on
    /// attach/detach.
    pub fn with_scene_sink(decoder: Arc<dyn Decoder>, scene: Arc<dyn SceneSink>) -> Self {
        let mut controller = Self::new(decoder);
        controller.scene = Some(scene);
        controller
    }

    fn state(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves state consistent
        // enough to keep serving; recover instead of propagating.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register an observer. The stream receives every subsequent
    /// lifecycle event in global emission order.
    pub fn subscribe(&self) -> EventStream {
        let mut inner = self.state();
        let id = SubscriberId(inner.next_subscriber);
        inner.next_subscriber += 1;
        let (tx, rx) = mpsc::unbounded_channel();
        inner.subscribers.push((id, tx));
        EventStream { id, rx }
    }

    /// Remove an observer. Events already delivered to its channel
    /// remain readable.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.state().subscribers.retain(|(sub, _)| *sub != id);
    }

    /// Load one file.
    ///
    /// Rejects unrecognized extensions (`UnsupportedFormat`, before
    /// any event or state change) and duplicate in-flight identifiers
    /// (`AlreadyLoading`). Otherwise emits `Started`, forwards decoder
    /// progress, and finishes with exactly one terminal event.
    ///
    /// A successful load whose identifier matches an already-loaded
    /// model replaces it: the prior handle is disposed and `Removed`
    /// emitted before `Succeeded`. Reload-after-edit is the common
    /// viewer flow, so collision means replace rather than reject.
    pub async fn load(&self, request: LoadRequest) -> Result<ModelInfo> {
        let kind = request.kind()?;
        let LoadRequest {
            name,
            bytes,
            on_progress,
        } = request;

        let info = ModelInfo {
            id: derive_model_id(&name),
            name: name.clone(),
            kind,
            byte_len: bytes.len(),
        };
        let cancel = Arc::new(AtomicBool::new(false));

        {
            let mut inner = self.state();
            if inner.in_flight.contains_key(&info.id) {
                return Err(LoadError::AlreadyLoading(info.id));
            }
            inner.in_flight.insert(info.id.clone(), cancel.clone());
            inner.broadcast(LifecycleEvent::Started { info: info.clone() });
        }
        tracing::debug!(
            model_id = %info.id,
            kind = kind.label(),
            bytes = info.byte_len,
            "load started"
        );

        let (progress, mut progress_rx) = ProgressSink::channel();
        let mut decode = self.decoder.decode(DecodeJob {
            name,
            kind,
            bytes,
            progress,
        });

        let mut progress_open = true;
        let outcome = loop {
            if !progress_open {
                // Decoder dropped its sink; nothing left but completion.
                break (&mut decode).await;
            }
            tokio::select! {
                result = &mut decode => break result,
                report = progress_rx.recv() => match report {
                    Some(fraction) => {
                        self.forward_progress(&info.id, fraction, &cancel, on_progress.as_deref());
                    }
                    None => progress_open = false,
                },
            }
        };

        // Drain progress reports that raced completion so nothing can
        // follow the terminal event for this load.
        while let Ok(fraction) = progress_rx.try_recv() {
            self.forward_progress(&info.id, fraction, &cancel, on_progress.as_deref());
        }
        progress_rx.close();

        self.finish_load(info, outcome, &cancel)
    }

    fn forward_progress(
        &self,
        model_id: &str,
        fraction: f32,
        cancel: &AtomicBool,
        hook: Option<&(dyn Fn(f32) + Send + Sync)>,
    ) {
        // A canceled load has no further observable progress.
        if cancel.load(Ordering::SeqCst) {
            return;
        }
        if let Some(hook) = hook {
            hook(fraction);
        }
        self.state().broadcast(LifecycleEvent::Progress {
            model_id: model_id.to_string(),
            fraction,
        });
    }

    fn finish_load(
        &self,
        info: ModelInfo,
        outcome: std::result::Result<Box<dyn FragmentHandle>, DecodeFailure>,
        cancel: &AtomicBool,
    ) -> Result<ModelInfo> {
        let mut inner = self.state();
        inner.in_flight.remove(&info.id);

        if cancel.load(Ordering::SeqCst) {
            // Superseded by unload: the resource returned late by the
            // decoder must still be released.
            if let Ok(mut handle) = outcome {
                if let Err(e) = handle.dispose() {
                    tracing::warn!(model_id = %info.id, error = %e, "failed to dispose canceled load");
                }
            }
            inner.broadcast(LifecycleEvent::Canceled {
                model_id: info.id.clone(),
            });
            tracing::debug!(model_id = %info.id, "load canceled");
            return Err(LoadError::Canceled(info.id));
        }

        match outcome {
            Ok(handle) => {
                if let Some(mut old) = inner.models.remove(&info.id) {
                    if let Err(e) = old.handle.dispose() {
                        tracing::warn!(model_id = %info.id, error = %e, "failed to dispose replaced model");
                    }
                    inner.broadcast(LifecycleEvent::Removed {
                        model_id: info.id.clone(),
                    });
                    if let Some(scene) = &self.scene {
                        scene.detach(&info.id);
                    }
                }
                inner.models.insert(
                    info.id.clone(),
                    LoadedModel {
                        info: info.clone(),
                        handle,
                    },
                );
                inner.broadcast(LifecycleEvent::Succeeded { info: info.clone() });
                if let Some(scene) = &self.scene {
                    if let Some(model) = inner.models.get(&info.id) {
                        scene.attach(&info, model.handle.as_ref());
                    }
                }
                tracing::info!(model_id = %info.id, bytes = info.byte_len, "model loaded");
                Ok(info)
            }
            Err(failure) => {
                inner.broadcast(LifecycleEvent::Failed {
                    model_id: info.id.clone(),
                    message: failure.message.clone(),
                });
                tracing::warn!(model_id = %info.id, error = %failure.message, "decode failed");
                Err(LoadError::Decode {
                    model_id: info.id,
                    message: failure.message,
                })
            }
        }
    }

    /// Unload one model.
    ///
    /// Cancels the load if one is in flight for this identifier (its
    /// terminal event becomes `Canceled`). Removes and disposes the
    /// tracked model if present. Unloading an unknown identifier is a
    /// reported error (`NotFound`), never fatal.
    pub fn unload(&self, id: &str) -> Result<()> {
        let mut inner = self.state();

        let canceled = match inner.in_flight.get(id) {
            Some(cancel) => {
                cancel.store(true, Ordering::SeqCst);
                tracing::debug!(model_id = id, "canceled in-flight load");
                true
            }
            None => false,
        };

        match inner.models.remove(id) {
            Some(mut model) => {
                let disposed = model.handle.dispose();
                inner.broadcast(LifecycleEvent::Removed {
                    model_id: id.to_string(),
                });
                if let Some(scene) = &self.scene {
                    scene.detach(id);
                }
                tracing::info!(model_id = id, "model unloaded");
                disposed.map_err(|e| LoadError::Dispose {
                    model_id: id.to_string(),
                    message: e.0,
                })
            }
            None if canceled => Ok(()),
            None => Err(LoadError::NotFound(id.to_string())),
        }
    }

    /// Dispose every tracked model, best-effort.
    ///
    /// One `Removed` event per model regardless of dispose outcome; a
    /// failure to dispose one model never prevents disposing the
    /// others. No-op on an empty set.
    pub fn clear(&self) -> ClearReport {
        let mut inner = self.state();
        let mut ids: Vec<String> = inner.models.keys().cloned().collect();
        ids.sort_unstable();

        let mut report = ClearReport::default();
        for id in ids {
            if let Some(mut model) = inner.models.remove(&id) {
                if let Err(e) = model.handle.dispose() {
                    tracing::warn!(model_id = %id, error = %e, "failed to dispose model during clear");
                    report.failures.push(ClearFailure {
                        model_id: id.clone(),
                        message: e.0,
                    });
                }
                inner.broadcast(LifecycleEvent::Removed {
                    model_id: id.clone(),
                });
                if let Some(scene) = &self.scene {
                    scene.detach(&id);
                }
                report.removed.push(id);
            }
        }
        if !report.removed.is_empty() {
            tracing::info!(
                removed = report.removed.len(),
                failures = report.failures.len(),
                "cleared tracked models"
            );
        }
        report
    }

    /// Snapshot of all tracked models, sorted by identifier.
    pub fn models(&self) -> Vec<ModelInfo> {
        let inner = self.state();
        let mut infos: Vec<ModelInfo> = inner.models.values().map(|m| m.info.clone()).collect();
        infos.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    /// Whether a model with this identifier is tracked.
    pub fn contains(&self, id: &str) -> bool {
        self.state().models.contains_key(id)
    }

    /// Number of tracked models.
    pub fn len(&self) -> usize {
        self.state().models.len()
    }

    /// Whether the tracked set is empty.
    pub fn is_empty(&self) -> bool {
        self.state().models.is_empty()
    }

    /// Borrow a tracked model's snapshot and handle.
    ///
    /// The closure runs while the controller's state is locked and
    /// must not call back into the controller.
    pub fn with_model<R>(
        &self,
        id: &str,
        f: impl FnOnce(&ModelInfo, &dyn FragmentHandle) -> R,
    ) -> Option<R> {
        let inner = self.state();
        inner
            .models
            .get(id)
            .map(|model| f(&model.info, model.handle.as_ref()))
    }
}

impl std::fmt::Debug for ModelLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.state();
        f.debug_struct("ModelLifecycle")
            .field("models", &inner.models.len())
            .field("in_flight", &inner.in_flight.len())
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}
