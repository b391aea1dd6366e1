//! Connection configuration for the catalog flows.
//!
//! A JSON config file provides the base values; CLI flags override them.
//! Nothing is read from the environment.
use crate::catalog::rest::DEFAULT_ENDPOINT;
use crate::catalog::ResourceRef;
use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which [`crate::catalog::CatalogService`] implementation to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Data Catalog v1 REST API.
    Rest,
    /// In-process emulator, optionally persisted to `state_path`.
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_file: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

fn default_backend() -> BackendKind {
    BackendKind::Rest
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Values supplied on the command line; `None` keeps the file/default value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub project: Option<String>,
    pub location: Option<String>,
    pub backend: Option<BackendKind>,
    pub endpoint: Option<String>,
    pub access_token_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub state_path: Option<PathBuf>,
}

pub fn default_config() -> CatalogConfig {
    CatalogConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        project: None,
        location: default_location(),
        backend: default_backend(),
        endpoint: default_endpoint(),
        access_token_file: None,
        timeout_secs: DEFAULT_TIMEOUT_SECS,
        state_path: None,
    }
}

pub fn load_config(path: &Path) -> Result<CatalogConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: CatalogConfig =
        serde_json::from_slice(&bytes).context("parse catalog config JSON")?;
    Ok(config)
}

/// Check that the config can address resources and reach its backend.
pub fn validate_config(config: &CatalogConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported catalog config schema_version {}",
            config.schema_version
        ));
    }
    let project = config
        .project
        .as_deref()
        .filter(|project| !project.trim().is_empty())
        .ok_or_else(|| anyhow!("project is required (set it in the config or pass --project)"))?;
    ResourceRef::location(project, &config.location)
        .with_context(|| format!("invalid project {project:?} or location"))?;
    if config.timeout_secs == 0 {
        return Err(anyhow!("timeout_secs must be greater than zero"));
    }
    match config.backend {
        BackendKind::Rest => {
            if !config.endpoint.starts_with("https://") && !config.endpoint.starts_with("http://")
            {
                return Err(anyhow!(
                    "endpoint must be an http(s) URL (got {:?})",
                    config.endpoint
                ));
            }
            if config.access_token_file.is_none() {
                return Err(anyhow!(
                    "the rest backend needs access_token_file (or --access-token-file)"
                ));
            }
        }
        BackendKind::Local => {}
    }
    Ok(())
}

/// Merge the optional config file with CLI overrides and validate the result.
pub fn resolve_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<CatalogConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => default_config(),
    };
    if let Some(project) = &overrides.project {
        config.project = Some(project.clone());
    }
    if let Some(location) = &overrides.location {
        config.location = location.clone();
    }
    if let Some(backend) = overrides.backend {
        config.backend = backend;
    }
    if let Some(endpoint) = &overrides.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(token_file) = &overrides.access_token_file {
        config.access_token_file = Some(token_file.clone());
    }
    if let Some(timeout) = overrides.timeout_secs {
        config.timeout_secs = timeout;
    }
    if let Some(state_path) = &overrides.state_path {
        config.state_path = Some(state_path.clone());
    }
    validate_config(&config)?;
    Ok(config)
}

impl CatalogConfig {
    /// Project id; only call on a validated config.
    pub fn project_id(&self) -> &str {
        self.project.as_deref().unwrap_or_default()
    }
}

/// Read a bearer token from a file, ignoring surrounding whitespace.
pub fn read_access_token(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read access token {}", path.display()))?;
    let token = text.trim();
    if token.is_empty() {
        return Err(anyhow!("access token file {} is empty", path.display()));
    }
    Ok(token.to_string())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
