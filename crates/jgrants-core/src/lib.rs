// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the jgrants subsidy search layer.
//!
//! This crate provides the query schema, result types, the crate-wide error
//! type, the adapter traits both transports and the extraction provider
//! implement, and the pure normalization functions that turn raw upstream
//! payloads into result types.

pub mod content;
pub mod error;
pub mod normalize;
pub mod overview;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{FailureCause, JgrantsError, NetworkFailure};
pub use normalize::NormalizeOptions;
pub use types::{
    AccessDescriptor, AdapterType, HealthStatus, RenderedContent, SearchQuery, SubsidyDetail,
    SubsidySummary,
};

// Re-export all adapter traits at crate root.
pub use traits::{PluginAdapter, ProviderAdapter, SubsidySource};
