// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Direct transport: the public jGrants REST API behind a bounded retry loop.
//!
//! [`ApiClient`] performs raw fetches; [`DirectApiSource`] maps the
//! [`SubsidySource`](jgrants_core::SubsidySource) operations onto it.

pub mod client;
pub mod retry;
pub mod source;

pub use client::ApiClient;
pub use retry::{RetryClass, RetryPolicy, default_classification};
pub use source::DirectApiSource;
