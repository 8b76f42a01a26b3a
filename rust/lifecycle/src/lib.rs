// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # FragView Lifecycle
//!
//! Model lifecycle controller for fragment-based BIM viewers.
//!
//! The controller accepts files (IFC geometry sources or precompiled
//! fragment bundles), drives asynchronous decoding against a pluggable
//! [`Decoder`] collaborator, tracks the set of loaded models, and fans
//! [`LifecycleEvent`]s out to subscribers. Rendering, parsing, and UI
//! are out of scope: the decoder and the scene are black boxes behind
//! narrow trait contracts.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fragview_lifecycle::{LoadRequest, ModelLifecycle};
//!
//! let lifecycle = ModelLifecycle::new(decoder);
//! let mut events = lifecycle.subscribe();
//!
//! let info = lifecycle
//!     .load(LoadRequest::new("office.ifc", bytes))
//!     .await?;
//! assert_eq!(info.id, "office");
//!
//! lifecycle.unload("office")?;
//! ```
//!
//! ## Guarantees
//!
//! - Exactly one terminal event (`Succeeded`, `Failed`, or `Canceled`)
//!   per accepted load, with `Progress` strictly in between.
//! - Model identifiers are unique in the tracked set at all times.
//! - Every subscriber observes the same global event order.
//! - `unload` during an in-flight load cancels it: the model never
//!   enters the tracked set, even if the decoder reports success late.
//!
//! ## Feature Flags
//!
//! - `serde`: serialization support for events and model snapshots

pub mod controller;
pub mod decoder;
pub mod error;
pub mod event;
pub mod model;
pub mod request;

pub use controller::{EventStream, ModelLifecycle, SubscriberId};
pub use decoder::{DecodeJob, Decoder, FragmentHandle, ProgressSink, SceneSink};
pub use error::{ClearFailure, ClearReport, DecodeFailure, DisposeError, LoadError, Result};
pub use event::LifecycleEvent;
pub use model::ModelInfo;
pub use request::{derive_model_id, LoadRequest, SourceKind};
