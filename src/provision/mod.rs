//! Idempotent provisioning: best-effort cleanup, then ordered creation.
//!
//! A [`ProvisioningPlan`] is plain data; [`Provisioner`] is the single
//! interpreter for it. Cleanup is advisory and never fails a run. The first
//! creation failure aborts the run without rollback, so a rerun relies on the
//! next cleanup phase to clear whatever was already created.
mod plan;

use crate::catalog::{
    CatalogError, CatalogService, ErrorKind, Handle, LookupCriteria, ResourceKind,
    ResourcePayload, ResourceRef, Tag, TagValue,
};
use std::collections::BTreeMap;
use thiserror::Error;

pub use plan::ProvisioningPlan;

/// Where a step finds a resource name it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleRef {
    /// A name known before the run starts.
    Fixed(ResourceRef),
    /// The handle returned by an earlier step of the same plan.
    Step(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    /// Create `parent/{collection}/{id}`; deleted during cleanup.
    Create {
        parent: HandleRef,
        id: String,
        payload: ResourcePayload,
    },
    /// Resolve a resource owned by someone else; never cleaned up.
    Lookup { criteria: LookupCriteria },
    /// Attach a tag instance of `template` to the entry at `parent`.
    AttachTag {
        parent: HandleRef,
        template: HandleRef,
        fields: BTreeMap<String, TagValue>,
    },
}

impl StepAction {
    /// Kind of resource whose handle the step yields.
    pub fn yields(&self) -> ResourceKind {
        match self {
            StepAction::Create { payload, .. } => payload.kind(),
            StepAction::Lookup { .. } => ResourceKind::Entry,
            StepAction::AttachTag { .. } => ResourceKind::Tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProvisioningStep {
    pub label: String,
    pub action: StepAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CleanupOutcome {
    Deleted,
    /// Nothing to delete; the normal first-run condition.
    Absent,
    /// Delete failed for another reason; logged and ignored.
    Failed(CatalogError),
}

impl CleanupOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CleanupOutcome::Deleted => "deleted",
            CleanupOutcome::Absent => "absent",
            CleanupOutcome::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanupRecord {
    pub step: usize,
    pub kind: ResourceKind,
    pub target: ResourceRef,
    pub outcome: CleanupOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProvisioningReport {
    pub cleanup: Vec<CleanupRecord>,
    /// One handle per step, in step order.
    pub handles: Vec<Handle>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProvisioningError {
    #[error("invalid provisioning plan: {0}")]
    InvalidPlan(String),
    #[error("step {index} ({label}) failed: {source}")]
    Step {
        index: usize,
        label: String,
        source: CatalogError,
    },
}

impl ProvisioningError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProvisioningError::Step { source, .. } => source.kind(),
            ProvisioningError::InvalidPlan(_) => ErrorKind::InvalidArgument,
        }
    }
}

pub struct Provisioner<'a> {
    service: &'a dyn CatalogService,
}

impl<'a> Provisioner<'a> {
    pub fn new(service: &'a dyn CatalogService) -> Self {
        Self { service }
    }

    /// Run the plan: cleanup, then creation. The report carries one handle
    /// per step alongside the cleanup outcomes.
    pub fn run(&self, plan: &ProvisioningPlan) -> Result<ProvisioningReport, ProvisioningError> {
        plan.validate().map_err(ProvisioningError::InvalidPlan)?;
        let cleanup = self.cleanup(plan);
        let handles = self.create_all(plan)?;
        Ok(ProvisioningReport { cleanup, handles })
    }

    /// Delete every statically named creation target, children first.
    pub fn cleanup(&self, plan: &ProvisioningPlan) -> Vec<CleanupRecord> {
        let mut records = Vec::new();
        for (step, kind, target) in plan.cleanup_targets() {
            let outcome = match self.service.delete_resource(&target, kind.force_delete()) {
                Ok(()) => {
                    tracing::info!(step, target = %target, "deleted {kind}");
                    CleanupOutcome::Deleted
                }
                Err(err) if err.is_not_found() => {
                    tracing::info!(step, target = %target, "{kind} does not exist");
                    CleanupOutcome::Absent
                }
                Err(err) => {
                    tracing::warn!(
                        step,
                        target = %target,
                        error_kind = err.kind().as_str(),
                        error = %err,
                        "cannot delete {kind}"
                    );
                    CleanupOutcome::Failed(err)
                }
            };
            records.push(CleanupRecord {
                step,
                kind,
                target,
                outcome,
            });
        }
        records
    }

    fn create_all(&self, plan: &ProvisioningPlan) -> Result<Vec<Handle>, ProvisioningError> {
        let mut handles: Vec<Handle> = Vec::with_capacity(plan.steps().len());
        for (index, step) in plan.steps().iter().enumerate() {
            let fail = |source: CatalogError| ProvisioningError::Step {
                index,
                label: step.label.clone(),
                source,
            };
            let result = match &step.action {
                StepAction::Create {
                    parent,
                    id,
                    payload,
                } => {
                    let parent = resolve(parent, &handles)?;
                    self.service.create_resource(&parent, id, payload)
                }
                StepAction::Lookup { criteria } => self.service.lookup_resource(criteria),
                StepAction::AttachTag {
                    parent,
                    template,
                    fields,
                } => {
                    let parent = resolve(parent, &handles)?;
                    let tag = Tag {
                        template: resolve(template, &handles)?,
                        fields: fields.clone(),
                    };
                    self.service.create_tag(&parent, &tag)
                }
            };
            let handle = result.map_err(fail)?;
            tracing::info!(
                step = index,
                label = %step.label,
                name = %handle.name,
                "created {}",
                handle.kind
            );
            handles.push(handle);
        }
        Ok(handles)
    }
}

fn resolve(reference: &HandleRef, handles: &[Handle]) -> Result<ResourceRef, ProvisioningError> {
    match reference {
        HandleRef::Fixed(name) => Ok(name.clone()),
        HandleRef::Step(index) => handles
            .get(*index)
            .map(|handle| handle.name.clone())
            .ok_or_else(|| {
                ProvisioningError::InvalidPlan(format!("step {index} has not produced a handle"))
            }),
    }
}
