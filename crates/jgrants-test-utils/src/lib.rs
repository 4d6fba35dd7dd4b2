// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for jgrants integration tests.
//!
//! Provides a scripted extraction provider and a harness that points a real
//! [`SubsidyService`](jgrants_service::SubsidyService) at a local mock
//! upstream, so tests run without network access.
//!
//! # Components
//!
//! - [`MockProvider`] - Extraction provider with pre-configured replies
//! - [`TestHarness`] - Service wired to a `wiremock` upstream (direct or mcp)

pub mod harness;
pub mod mock_provider;

pub use harness::TestHarness;
pub use mock_provider::{MockProvider, MockReply};
