// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The boundary a presentation layer talks to.
//!
//! [`SubsidyService`] picks a transport from configuration, owns the query
//! extractor, and validates queries before any network work happens.

pub mod service;
pub mod wiring;

pub use service::{SearchOutcome, SubsidyService};
