// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle events broadcast to subscribers.

use crate::model::ModelInfo;

/// Event emitted by the controller as models move through their
/// lifecycle.
///
/// For a single accepted load the sequence is strictly ordered:
/// `Started`, zero or more `Progress`, then exactly one of
/// `Succeeded`, `Failed`, or `Canceled`. `Removed` fires once per
/// model leaving the tracked set (unload, clear, or replacement by a
/// colliding load).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum LifecycleEvent {
    /// A load was accepted and handed to the decoder.
    Started {
        /// Snapshot of the model being loaded.
        info: ModelInfo,
    },

    /// Fractional progress reported by the decoder, forwarded
    /// unfiltered.
    Progress {
        /// Identifier of the model being loaded.
        model_id: String,
        /// Completion fraction in `0.0..=1.0`.
        fraction: f32,
    },

    /// The decoder produced a handle and the model entered the
    /// tracked set.
    Succeeded {
        /// Snapshot of the loaded model.
        info: ModelInfo,
    },

    /// The decoder rejected the payload; nothing entered the tracked
    /// set.
    Failed {
        /// Identifier the load was registered under.
        model_id: String,
        /// Diagnostic message from the decoder.
        message: String,
    },

    /// The load was superseded by an `unload` before it terminated.
    Canceled {
        /// Identifier the load was registered under.
        model_id: String,
    },

    /// A model left the tracked set.
    Removed {
        /// Identifier of the removed model.
        model_id: String,
    },
}

impl LifecycleEvent {
    /// Identifier of the model this event concerns.
    pub fn model_id(&self) -> &str {
        match self {
            LifecycleEvent::Started { info } | LifecycleEvent::Succeeded { info } => &info.id,
            LifecycleEvent::Progress { model_id, .. }
            | LifecycleEvent::Failed { model_id, .. }
            | LifecycleEvent::Canceled { model_id }
            | LifecycleEvent::Removed { model_id } => model_id,
        }
    }

    /// Whether this is a terminal event for a load (`Succeeded`,
    /// `Failed`, or `Canceled`).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleEvent::Succeeded { .. }
                | LifecycleEvent::Failed { .. }
                | LifecycleEvent::Canceled { .. }
        )
    }
}
