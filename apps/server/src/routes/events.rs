// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle event stream (Server-Sent Events).
//!
//! Each connected client gets its own subscription; events arrive in
//! the controller's global emission order. Disconnecting drops the
//! subscription.

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::StreamExt;
use std::convert::Infallible;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// GET /api/v1/events - Follow lifecycle events over SSE.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.lifecycle.subscribe().into_receiver();
    tracing::debug!("Event stream subscriber connected");

    let stream = UnboundedReceiverStream::new(rx).map(|event| {
        let json = serde_json::to_string(&event).unwrap_or_else(|e| {
            format!("{{\"type\":\"error\",\"message\":\"{}\"}}", e)
        });
        Ok(Event::default().data(json))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
