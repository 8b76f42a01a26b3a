// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the model lifecycle controller, driven by a
//! scripted stub decoder.

use fragview_lifecycle::{
    DecodeFailure, DecodeJob, Decoder, DisposeError, EventStream, FragmentHandle, LifecycleEvent,
    LoadError, LoadRequest, ModelInfo, ModelLifecycle, SceneSink, SourceKind,
};
use futures_util::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

struct StubHandle {
    name: String,
    len: usize,
    fail_dispose: bool,
    disposals: Arc<Mutex<Vec<String>>>,
}

impl FragmentHandle for StubHandle {
    fn byte_len(&self) -> usize {
        self.len
    }

    fn dispose(&mut self) -> Result<(), DisposeError> {
        self.disposals.lock().unwrap().push(self.name.clone());
        if self.fail_dispose {
            Err(DisposeError("handle busy".into()))
        } else {
            Ok(())
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Stub decoder scripted per file name.
///
/// - payload `b"fail"` rejects with a diagnostic;
/// - a gated name waits until the test releases it;
/// - everything else reports 0.5 progress and succeeds.
#[derive(Default)]
struct StubDecoder {
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    fail_dispose: Mutex<HashSet<String>>,
    disposals: Arc<Mutex<Vec<String>>>,
}

impl StubDecoder {
    fn gate(&self, name: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(name.to_string(), rx);
        tx
    }

    fn fail_dispose_of(&self, name: &str) {
        self.fail_dispose.lock().unwrap().insert(name.to_string());
    }

    fn disposed(&self) -> Vec<String> {
        self.disposals.lock().unwrap().clone()
    }
}

impl Decoder for StubDecoder {
    fn decode(
        &self,
        job: DecodeJob,
    ) -> BoxFuture<'static, Result<Box<dyn FragmentHandle>, DecodeFailure>> {
        let gate = self.gates.lock().unwrap().remove(&job.name);
        let fail_dispose = self.fail_dispose.lock().unwrap().contains(&job.name);
        let disposals = self.disposals.clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if job.bytes == b"fail" {
                return Err(DecodeFailure::new("unexpected magic bytes"));
            }
            job.progress.report(0.5);
            Ok(Box::new(StubHandle {
                name: job.name,
                len: job.bytes.len(),
                fail_dispose,
                disposals,
            }) as Box<dyn FragmentHandle>)
        })
    }
}

fn controller() -> (Arc<ModelLifecycle>, Arc<StubDecoder>) {
    let decoder = Arc::new(StubDecoder::default());
    let lifecycle = Arc::new(ModelLifecycle::new(decoder.clone()));
    (lifecycle, decoder)
}

async fn next(events: &mut EventStream) -> LifecycleEvent {
    tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event stream closed")
}

fn assert_one_terminal(events: &[LifecycleEvent], model_id: &str) {
    let terminals = events
        .iter()
        .filter(|e| e.is_terminal() && e.model_id() == model_id)
        .count();
    assert_eq!(terminals, 1, "expected exactly one terminal for {model_id}: {events:?}");
}

#[tokio::test]
async fn load_ifc_emits_started_progress_succeeded() {
    let (lifecycle, _) = controller();
    let mut events = lifecycle.subscribe();

    let info = lifecycle
        .load(LoadRequest::new("box.ifc", b"ISO-10303-21".to_vec()))
        .await
        .unwrap();
    assert_eq!(info.id, "box");
    assert_eq!(info.kind, SourceKind::GeometrySource);
    assert_eq!(info.byte_len, 12);

    let seen = vec![
        next(&mut events).await,
        next(&mut events).await,
        next(&mut events).await,
    ];
    assert!(matches!(&seen[0], LifecycleEvent::Started { info } if info.id == "box"));
    assert!(
        matches!(&seen[1], LifecycleEvent::Progress { model_id, fraction } if model_id == "box" && *fraction == 0.5)
    );
    assert!(matches!(&seen[2], LifecycleEvent::Succeeded { info } if info.id == "box"));
    assert_one_terminal(&seen, "box");

    assert_eq!(
        lifecycle.models().iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
        vec!["box"]
    );
}

#[tokio::test]
async fn unsupported_extension_fails_before_any_event() {
    let (lifecycle, _) = controller();
    let mut events = lifecycle.subscribe();

    let err = lifecycle
        .load(LoadRequest::new("box.xyz", b"whatever".to_vec()))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LoadError::UnsupportedFormat {
            name: "box.xyz".into()
        }
    );

    assert!(events.try_recv().is_none());
    assert!(lifecycle.is_empty());
}

#[tokio::test]
async fn duplicate_in_flight_load_is_rejected() {
    let (lifecycle, decoder) = controller();
    let mut events = lifecycle.subscribe();
    let release = decoder.gate("slow.ifc");

    let first = {
        let lifecycle = lifecycle.clone();
        tokio::spawn(async move {
            lifecycle
                .load(LoadRequest::new("slow.ifc", vec![0u8; 16]))
                .await
        })
    };

    // Wait for the first load to register as in flight.
    assert!(matches!(
        next(&mut events).await,
        LifecycleEvent::Started { .. }
    ));

    let err = lifecycle
        .load(LoadRequest::new("slow.ifc", vec![0u8; 16]))
        .await
        .unwrap_err();
    assert_eq!(err, LoadError::AlreadyLoading("slow".into()));

    // The first load proceeds unaffected.
    release.send(()).unwrap();
    let info = first.await.unwrap().unwrap();
    assert_eq!(info.id, "slow");
    assert!(lifecycle.contains("slow"));
}

#[tokio::test]
async fn unload_during_load_cancels_and_releases_late_handle() {
    let (lifecycle, decoder) = controller();
    let mut events = lifecycle.subscribe();
    let release = decoder.gate("racy.ifc");

    let load = {
        let lifecycle = lifecycle.clone();
        tokio::spawn(async move {
            lifecycle
                .load(LoadRequest::new("racy.ifc", vec![0u8; 8]))
                .await
        })
    };

    assert!(matches!(
        next(&mut events).await,
        LifecycleEvent::Started { .. }
    ));

    // Cancel while the decoder is still working.
    lifecycle.unload("racy").unwrap();
    release.send(()).unwrap();

    let err = load.await.unwrap().unwrap_err();
    assert_eq!(err, LoadError::Canceled("racy".into()));

    // Terminal is Canceled; no Progress leaks after cancellation, and
    // the model never appears in the tracked set.
    let terminal = next(&mut events).await;
    assert_eq!(
        terminal,
        LifecycleEvent::Canceled {
            model_id: "racy".into()
        }
    );
    assert!(!lifecycle.contains("racy"));

    // The handle the decoder returned late was still released.
    assert_eq!(decoder.disposed(), vec!["racy.ifc".to_string()]);
}

#[tokio::test]
async fn decode_failure_is_recovered_locally() {
    let (lifecycle, _) = controller();
    let mut events = lifecycle.subscribe();

    let err = lifecycle
        .load(LoadRequest::new("bad.ifc", b"fail".to_vec()))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LoadError::Decode {
            model_id: "bad".into(),
            message: "unexpected magic bytes".into()
        }
    );

    let seen = vec![next(&mut events).await, next(&mut events).await];
    assert!(matches!(&seen[0], LifecycleEvent::Started { .. }));
    assert!(
        matches!(&seen[1], LifecycleEvent::Failed { model_id, message }
            if model_id == "bad" && message == "unexpected magic bytes")
    );
    assert!(lifecycle.is_empty());

    // A later load is unaffected by the failure.
    lifecycle
        .load(LoadRequest::new("good.ifc", vec![0u8; 4]))
        .await
        .unwrap();
    assert!(lifecycle.contains("good"));
}

#[tokio::test]
async fn unload_unknown_id_is_not_found() {
    let (lifecycle, _) = controller();
    assert_eq!(
        lifecycle.unload("ghost"),
        Err(LoadError::NotFound("ghost".into()))
    );
}

#[tokio::test]
async fn clear_on_empty_set_emits_nothing() {
    let (lifecycle, _) = controller();
    let mut events = lifecycle.subscribe();

    let report = lifecycle.clear();
    assert!(report.removed.is_empty());
    assert!(report.is_clean());
    assert!(events.try_recv().is_none());
}

#[tokio::test]
async fn clear_is_best_effort_across_dispose_failures() {
    let (lifecycle, decoder) = controller();
    decoder.fail_dispose_of("b.frag");

    lifecycle
        .load(LoadRequest::new("a.ifc", vec![0u8; 4]))
        .await
        .unwrap();
    lifecycle
        .load(LoadRequest::new("b.frag", vec![0u8; 4]))
        .await
        .unwrap();

    let mut events = lifecycle.subscribe();
    let report = lifecycle.clear();

    // Both disposal attempts occurred, in identifier order.
    assert_eq!(decoder.disposed(), vec!["a.ifc".to_string(), "b.frag".to_string()]);
    assert_eq!(report.removed, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].model_id, "b");

    // One removal notification per model, failure or not.
    assert_eq!(
        next(&mut events).await,
        LifecycleEvent::Removed { model_id: "a".into() }
    );
    assert_eq!(
        next(&mut events).await,
        LifecycleEvent::Removed { model_id: "b".into() }
    );
    assert!(lifecycle.is_empty());
}

#[tokio::test]
async fn colliding_identifier_replaces_prior_model() {
    let (lifecycle, decoder) = controller();

    lifecycle
        .load(LoadRequest::new("box.ifc", vec![0u8; 4]))
        .await
        .unwrap();

    let mut events = lifecycle.subscribe();
    let info = lifecycle
        .load(LoadRequest::new("box.ifc", vec![0u8; 99]))
        .await
        .unwrap();
    assert_eq!(info.byte_len, 99);

    // Prior entry disposed and removed before the replacement lands.
    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(next(&mut events).await);
    }
    assert!(matches!(&seen[0], LifecycleEvent::Started { .. }));
    let removed_at = seen
        .iter()
        .position(|e| matches!(e, LifecycleEvent::Removed { .. }))
        .expect("replacement emits Removed");
    let succeeded_at = seen
        .iter()
        .position(|e| matches!(e, LifecycleEvent::Succeeded { .. }))
        .expect("replacement emits Succeeded");
    assert!(removed_at < succeeded_at);

    assert_eq!(decoder.disposed(), vec!["box.ifc".to_string()]);
    assert_eq!(lifecycle.len(), 1);
    assert_eq!(lifecycle.models()[0].byte_len, 99);
}

#[tokio::test]
async fn unsubscribed_observer_stops_receiving() {
    let (lifecycle, _) = controller();
    let mut kept = lifecycle.subscribe();
    let dropped = lifecycle.subscribe();
    lifecycle.unsubscribe(dropped.id());

    lifecycle
        .load(LoadRequest::new("box.ifc", vec![0u8; 4]))
        .await
        .unwrap();

    assert!(matches!(
        next(&mut kept).await,
        LifecycleEvent::Started { .. }
    ));
    let mut dropped = dropped;
    assert!(dropped.try_recv().is_none());
}

#[tokio::test]
async fn progress_hook_is_invoked() {
    let (lifecycle, _) = controller();
    let fractions = Arc::new(Mutex::new(Vec::new()));
    let sink = fractions.clone();

    lifecycle
        .load(
            LoadRequest::new("box.ifc", vec![0u8; 4])
                .with_progress(move |f| sink.lock().unwrap().push(f)),
        )
        .await
        .unwrap();

    assert_eq!(*fractions.lock().unwrap(), vec![0.5]);
}

#[derive(Default)]
struct RecordingScene {
    log: Mutex<Vec<String>>,
}

impl SceneSink for RecordingScene {
    fn attach(&self, info: &ModelInfo, handle: &dyn FragmentHandle) {
        self.log
            .lock()
            .unwrap()
            .push(format!("attach {} ({} bytes)", info.id, handle.byte_len()));
    }

    fn detach(&self, model_id: &str) {
        self.log.lock().unwrap().push(format!("detach {model_id}"));
    }
}

#[tokio::test]
async fn scene_sink_sees_attach_and_detach() {
    let decoder = Arc::new(StubDecoder::default());
    let scene = Arc::new(RecordingScene::default());
    let lifecycle = ModelLifecycle::with_scene_sink(decoder, scene.clone());

    lifecycle
        .load(LoadRequest::new("site.frag", vec![0u8; 7]))
        .await
        .unwrap();
    lifecycle.unload("site").unwrap();

    assert_eq!(
        *scene.log.lock().unwrap(),
        vec!["attach site (7 bytes)".to_string(), "detach site".to_string()]
    );
}

#[tokio::test]
async fn identifiers_stay_unique_across_operations() {
    let (lifecycle, _) = controller();

    lifecycle
        .load(LoadRequest::new("a.ifc", vec![0u8; 1]))
        .await
        .unwrap();
    lifecycle
        .load(LoadRequest::new("b.frag", vec![0u8; 2]))
        .await
        .unwrap();
    lifecycle
        .load(LoadRequest::new("a.ifc", vec![0u8; 3]))
        .await
        .unwrap();
    lifecycle.unload("b").unwrap();
    lifecycle
        .load(LoadRequest::new("b.frag", vec![0u8; 4]))
        .await
        .unwrap();

    let ids: Vec<String> = lifecycle.models().into_iter().map(|m| m.id).collect();
    assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
}
