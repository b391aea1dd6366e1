//! Read-modify-write of a resource's IAM policy.
use crate::catalog::{Binding, CatalogError, CatalogService, ErrorKind, Policy, ResourceRef};
use std::fmt;
use thiserror::Error;

/// Role that lets a member attach tags built from a template.
pub const TAG_TEMPLATE_USER_ROLE: &str = "roles/datacatalog.tagTemplateUser";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyStage {
    Fetch,
    Write,
}

impl fmt::Display for PolicyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyStage::Fetch => f.write_str("fetch policy"),
            PolicyStage::Write => f.write_str("write policy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} for {resource} failed: {source}")]
pub struct PolicyError {
    pub stage: PolicyStage,
    pub resource: ResourceRef,
    pub source: CatalogError,
}

impl PolicyError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

pub struct PolicyEditor<'a> {
    service: &'a dyn CatalogService,
}

impl<'a> PolicyEditor<'a> {
    pub fn new(service: &'a dyn CatalogService) -> Self {
        Self { service }
    }

    /// Append `{role, [member]}` to the current policy and write it back.
    ///
    /// The fetched policy (including its etag) is the only base for the
    /// write, so a concurrent modification surfaces as `Conflict`. Existing
    /// bindings for the same role are left alone; a separate binding is
    /// appended.
    pub fn grant_role(
        &self,
        resource: &ResourceRef,
        role: &str,
        member: &str,
    ) -> Result<Policy, PolicyError> {
        let fail = |stage: PolicyStage| {
            move |source: CatalogError| PolicyError {
                stage,
                resource: resource.clone(),
                source,
            }
        };

        let mut policy = self
            .service
            .get_policy(resource)
            .map_err(fail(PolicyStage::Fetch))?;
        tracing::debug!(
            resource = %resource,
            bindings = policy.bindings.len(),
            etag = policy.etag.as_deref().unwrap_or(""),
            "fetched policy"
        );

        policy.bindings.push(Binding::new(role, member));

        let updated = self
            .service
            .set_policy(resource, &policy)
            .map_err(fail(PolicyStage::Write))?;
        tracing::info!(resource = %resource, role, member, "granted role");
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
