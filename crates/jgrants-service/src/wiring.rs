// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Construction of the configured transport and extraction provider.

use std::sync::Arc;

use jgrants_api::DirectApiSource;
use jgrants_config::model::{ExtractionConfig, JgrantsConfig, TransportKind};
use jgrants_core::{JgrantsError, ProviderAdapter, SubsidySource};
use tracing::{info, warn};

/// A constructed transport plus whether it skips TLS verification.
pub struct Transport {
    pub source: Arc<dyn SubsidySource>,
    pub tls_verification_disabled: bool,
}

/// Builds the transport named by `transport.kind`.
pub fn build_transport(config: &JgrantsConfig) -> Result<Transport, JgrantsError> {
    match config.transport.kind {
        TransportKind::Direct => {
            let source = DirectApiSource::from_config(config)?;
            let tls_verification_disabled = source.client().tls_verification_disabled();
            Ok(Transport {
                source: Arc::new(source),
                tls_verification_disabled,
            })
        }
        TransportKind::Mcp => build_mcp(config),
    }
}

#[cfg(feature = "mcp-client")]
fn build_mcp(config: &JgrantsConfig) -> Result<Transport, JgrantsError> {
    let source = jgrants_mcp_client::McpSource::from_config(config)?;
    let tls_verification_disabled = source.client().tls_verification_disabled();
    Ok(Transport {
        source: Arc::new(source),
        tls_verification_disabled,
    })
}

#[cfg(not(feature = "mcp-client"))]
fn build_mcp(_config: &JgrantsConfig) -> Result<Transport, JgrantsError> {
    Err(JgrantsError::Config(
        "transport.kind = \"mcp\" requires the mcp-client feature".to_string(),
    ))
}

/// Builds the extraction provider, or `None` when extraction will take the
/// literal-keyword path.
pub fn build_provider(config: &ExtractionConfig) -> Option<Arc<dyn ProviderAdapter>> {
    if !config.enabled {
        info!("query extraction disabled, using literal keywords");
        return None;
    }
    anthropic_provider(config)
}

#[cfg(feature = "anthropic")]
fn anthropic_provider(config: &ExtractionConfig) -> Option<Arc<dyn ProviderAdapter>> {
    match jgrants_anthropic::AnthropicProvider::new(config) {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            warn!(error = %e, "query extraction unavailable, using literal keywords");
            None
        }
    }
}

#[cfg(not(feature = "anthropic"))]
fn anthropic_provider(_config: &ExtractionConfig) -> Option<Arc<dyn ProviderAdapter>> {
    warn!("built without the anthropic feature, using literal keywords");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use jgrants_core::PluginAdapter;

    #[test]
    fn default_config_builds_direct_transport() {
        let transport = build_transport(&JgrantsConfig::default()).unwrap();
        assert_eq!(transport.source.name(), "direct");
        assert!(!transport.tls_verification_disabled);
    }

    #[cfg(feature = "mcp-client")]
    #[test]
    fn mcp_kind_builds_protocol_transport() {
        let mut config = JgrantsConfig::default();
        config.transport.kind = TransportKind::Mcp;
        config.mcp.accept_invalid_certs = true;
        let transport = build_transport(&config).unwrap();
        assert_eq!(transport.source.name(), "mcp");
        assert!(transport.tls_verification_disabled);
    }

    #[test]
    fn disabled_extraction_has_no_provider() {
        let config = ExtractionConfig {
            enabled: false,
            api_key: Some("sk-test".into()),
            ..ExtractionConfig::default()
        };
        assert!(build_provider(&config).is_none());
    }

    #[cfg(feature = "anthropic")]
    #[test]
    fn configured_key_builds_provider() {
        let config = ExtractionConfig {
            api_key: Some("sk-test".into()),
            ..ExtractionConfig::default()
        };
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "anthropic");
    }
}
