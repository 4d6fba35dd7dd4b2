// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for jgrants.
//!
//! TOML files are merged in XDG order, overridden by `JGRANTS_*` environment
//! variables, rejected on unknown keys with "did you mean" suggestions, and
//! then checked for semantic constraints.
//!
//! # Usage
//!
//! ```no_run
//! use jgrants_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("upstream: {}", config.upstream.base_url);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{JgrantsConfig, TransportKind};

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<JgrantsConfig, Vec<ConfigError>> {
    finish(loader::load_config(), loader::search_paths())
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_from_path(path: &Path) -> Result<JgrantsConfig, Vec<ConfigError>> {
    if !path.is_file() {
        return Err(vec![ConfigError::Other(format!(
            "config file `{}` does not exist",
            path.display()
        ))]);
    }
    finish(loader::load_config_from_path(path), vec![path.to_path_buf()])
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<JgrantsConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

fn finish(
    loaded: Result<JgrantsConfig, figment::Error>,
    paths: Vec<std::path::PathBuf>,
) -> Result<JgrantsConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources: Vec<(String, String)> = paths
                .iter()
                .filter_map(|p| {
                    std::fs::read_to_string(p)
                        .ok()
                        .map(|content| (p.display().to_string(), content))
                })
                .collect();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}
