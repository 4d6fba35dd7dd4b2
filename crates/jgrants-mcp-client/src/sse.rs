// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response body decoding for streamable HTTP.
//!
//! The server may answer a POST with a plain JSON envelope or with a
//! `text/event-stream` carrying one or more envelopes. Streams are parsed
//! with `eventsource-stream` and the envelope answering our request wins.

use eventsource_stream::Eventsource;
use futures::StreamExt;
use jgrants_core::JgrantsError;
use jgrants_security::network_error;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::message::{JsonRpcResponse, RequestId};

/// Reads the envelope answering `expected`. Transport failures while reading
/// surface as [`JgrantsError::Network`].
pub async fn read_envelope(
    response: reqwest::Response,
    expected: &RequestId,
) -> Result<JsonRpcResponse, JgrantsError> {
    let is_stream = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/event-stream"));

    if !is_stream {
        let body = response.bytes().await.map_err(network_error)?;
        return serde_json::from_slice(&body)
            .map_err(|e| JgrantsError::parse("response is not a JSON-RPC envelope", e));
    }

    let mut events = response.bytes_stream().eventsource();
    while let Some(event) = events.next().await {
        let event = event.map_err(|e| JgrantsError::Protocol(format!("event stream error: {e}")))?;
        if event.data.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<JsonRpcResponse>(&event.data) {
            Ok(envelope) if envelope.id.as_ref() == Some(expected) => return Ok(envelope),
            Ok(envelope) => {
                debug!(id = ?envelope.id, "skipping event for another request");
            }
            Err(e) => debug!(event = %event.event, "skipping non-envelope event: {e}"),
        }
    }

    Err(JgrantsError::Protocol(format!(
        "event stream ended without a response to request {expected}"
    )))
}
