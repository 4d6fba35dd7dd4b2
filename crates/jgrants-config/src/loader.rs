// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered config merging with Figment.
//!
//! Merge order (later overrides earlier): compiled defaults,
//! `/etc/jgrants/jgrants.toml`, `~/.config/jgrants/jgrants.toml`,
//! `./jgrants.toml`, then `JGRANTS_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::JgrantsConfig;

/// Top-level sections, used to turn `JGRANTS_MCP_BASE_URL` into `mcp.base_url`.
const SECTIONS: &[&str] = &[
    "logging",
    "transport",
    "upstream",
    "retry",
    "mcp",
    "extraction",
    "results",
];

/// Config files consulted by [`load_config`], lowest precedence first.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/jgrants/jgrants.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("jgrants/jgrants.toml"));
    }
    paths.push(PathBuf::from("jgrants.toml"));
    paths
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<JgrantsConfig, figment::Error> {
    search_paths()
        .into_iter()
        .fold(defaults(), |figment, path| figment.merge(Toml::file(path)))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<JgrantsConfig, figment::Error> {
    defaults().merge(Toml::string(toml_content)).extract()
}

/// Load configuration from one file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<JgrantsConfig, figment::Error> {
    defaults()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

fn defaults() -> Figment {
    Figment::new().merge(Serialized::defaults(JgrantsConfig::default()))
}

/// Maps the first `_` after a known section name to a dot.
///
/// `Env::split("_")` would break keys such as `base_url`.
fn env_provider() -> Env {
    Env::prefixed("JGRANTS_").map(|key| map_env_key(&key.as_str().to_ascii_lowercase()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
