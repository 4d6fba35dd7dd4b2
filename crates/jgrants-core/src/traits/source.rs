// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The subsidy-fetching capability shared by both transports.

use async_trait::async_trait;

use crate::error::JgrantsError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AccessDescriptor, Overview, RenderedContent, SearchQuery, SubsidyDetail, SubsidySummary};

/// Fetches subsidies, details and attachment content.
///
/// Implemented by the direct API transport and by the protocol-server
/// transport; which one is used is decided when the service is built.
#[async_trait]
pub trait SubsidySource: PluginAdapter {
    /// Runs a catalog search. The query has already been validated.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SubsidySummary>, JgrantsError>;

    /// Fetches one subsidy; [`JgrantsError::NotFound`] when the id is unknown.
    async fn get_detail(&self, id: &str) -> Result<SubsidyDetail, JgrantsError>;

    /// Fetches and renders one attachment.
    async fn get_file_content(
        &self,
        access: &AccessDescriptor,
    ) -> Result<RenderedContent, JgrantsError>;

    /// Returns catalog statistics.
    async fn overview(&self) -> Result<Overview, JgrantsError>;
}
