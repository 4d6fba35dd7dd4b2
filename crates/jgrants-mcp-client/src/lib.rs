// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Protocol transport: JSON-RPC 2.0 tool calls against the intermediary
//! server over streamable HTTP.
//!
//! [`McpClient`] owns the session handshake and the `tools/call` exchange;
//! [`McpSource`] maps the [`SubsidySource`](jgrants_core::SubsidySource)
//! operations onto the server's tools.

pub mod client;
pub mod message;
pub mod session;
pub mod source;
pub mod sse;

pub use client::{McpClient, SESSION_HEADER};
pub use session::SessionState;
pub use source::McpSource;
