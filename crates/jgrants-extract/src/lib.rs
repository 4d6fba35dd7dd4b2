// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns free text into a [`SearchQuery`](jgrants_core::SearchQuery).
//!
//! The language-understanding call is untrusted: whatever it returns (or
//! fails to return), [`QueryExtractor::extract`] produces a submittable query.

pub mod extractor;
pub mod prompt;

pub use extractor::{DegradeReason, Extraction, ExtractorSettings, QueryExtractor};
