// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for language-understanding services.

use async_trait::async_trait;

use crate::error::JgrantsError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse};

/// Adapter for language-understanding services.
///
/// A provider performs exactly one request per call; callers that want
/// resilience decide for themselves what to do on error.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, JgrantsError>;
}
