// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound connection policy shared by every jgrants HTTP client.

pub mod tls;

pub use tls::{HttpClientSettings, build_client, is_localhost, network_error, validate_url};
