//! Concrete catalog flows built on the provisioning engine.
//!
//! Each flow is a plan builder plus a small runner; the runners only take a
//! [`CatalogService`], so they work the same against the REST API and the
//! local emulator.
pub mod custom_entry;
pub mod search;
pub mod tag_table;

use crate::catalog::local::LocalCatalog;
use crate::catalog::rest::RestCatalog;
use crate::catalog::{CatalogService, Policy, ResourceRef};
use crate::config::{read_access_token, BackendKind, CatalogConfig};
use crate::policy::PolicyEditor;
use anyhow::{anyhow, Context, Result};
use std::time::Duration;

/// Instantiate the backend a validated config points at.
pub fn open_catalog(config: &CatalogConfig) -> Result<Box<dyn CatalogService>> {
    match config.backend {
        BackendKind::Rest => {
            let token_path = config
                .access_token_file
                .as_deref()
                .ok_or_else(|| anyhow!("the rest backend needs an access token file"))?;
            let token = read_access_token(token_path)?;
            tracing::debug!(endpoint = %config.endpoint, "using REST catalog");
            Ok(Box::new(RestCatalog::new(
                &config.endpoint,
                &token,
                Duration::from_secs(config.timeout_secs),
            )))
        }
        BackendKind::Local => match config.state_path.as_deref() {
            Some(path) => {
                tracing::debug!(state = %path.display(), "using persisted local catalog");
                Ok(Box::new(LocalCatalog::open(path)?))
            }
            None => {
                tracing::debug!("using in-memory local catalog");
                Ok(Box::new(LocalCatalog::in_memory()))
            }
        },
    }
}

/// `projects/{project}/locations/{location}` for a validated config.
pub fn location_of(config: &CatalogConfig) -> Result<ResourceRef> {
    ResourceRef::location(config.project_id(), &config.location).context("resolve location")
}

/// Grant `role` to `member` on a tag template.
pub fn grant_template_role(
    service: &dyn CatalogService,
    template: &ResourceRef,
    role: &str,
    member: &str,
) -> Result<Policy> {
    PolicyEditor::new(service)
        .grant_role(template, role, member)
        .map_err(|err| {
            let kind = err.kind();
            anyhow::Error::new(err)
                .context(format!("grant {role} on {template} ({})", kind.as_str()))
        })
}
