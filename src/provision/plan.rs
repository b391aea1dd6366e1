//! Plan construction and static checks.
use super::{HandleRef, ProvisioningStep, StepAction};
use crate::catalog::{validate_short_id, ResourceKind, ResourcePayload, ResourceRef, TagValue};
use std::collections::{BTreeMap, BTreeSet};

/// Ordered list of steps; step `i` may only depend on steps `< i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvisioningPlan {
    steps: Vec<ProvisioningStep>,
}

impl ProvisioningPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[ProvisioningStep] {
        &self.steps
    }

    /// Append a step and return its index for later [`HandleRef::Step`] use.
    pub fn push(&mut self, label: &str, action: StepAction) -> usize {
        self.steps.push(ProvisioningStep {
            label: label.to_string(),
            action,
        });
        self.steps.len() - 1
    }

    pub fn create(
        &mut self,
        label: &str,
        parent: HandleRef,
        id: &str,
        payload: ResourcePayload,
    ) -> usize {
        self.push(
            label,
            StepAction::Create {
                parent,
                id: id.to_string(),
                payload,
            },
        )
    }

    pub fn attach_tag(
        &mut self,
        label: &str,
        parent: HandleRef,
        template: HandleRef,
        fields: BTreeMap<String, TagValue>,
    ) -> usize {
        self.push(
            label,
            StepAction::AttachTag {
                parent,
                template,
                fields,
            },
        )
    }

    /// Name a `Create` step will produce, when derivable before the run.
    pub fn expected_name(&self, index: usize) -> Option<ResourceRef> {
        let step = self.steps.get(index)?;
        let StepAction::Create {
            parent,
            id,
            payload,
        } = &step.action
        else {
            return None;
        };
        let parent = match parent {
            HandleRef::Fixed(name) => name.clone(),
            HandleRef::Step(earlier) if *earlier < index => self.expected_name(*earlier)?,
            HandleRef::Step(_) => return None,
        };
        parent.child(payload.kind().collection(), id).ok()
    }

    /// Cleanup targets in reverse step order, so children precede parents.
    /// Every `Create` of a validated plan has a statically known name.
    pub fn cleanup_targets(&self) -> Vec<(usize, ResourceKind, ResourceRef)> {
        (0..self.steps.len())
            .rev()
            .filter_map(|index| {
                let name = self.expected_name(index)?;
                Some((index, self.steps[index].action.yields(), name))
            })
            .collect()
    }

    /// Reject plans that could not run to completion regardless of remote state.
    pub fn validate(&self) -> Result<(), String> {
        if self.steps.is_empty() {
            return Err("plan has no steps".to_string());
        }
        let mut targets = BTreeSet::new();
        for (index, step) in self.steps.iter().enumerate() {
            let at = |message: String| format!("step {index} ({}): {message}", step.label);
            if step.label.trim().is_empty() {
                return Err(format!("step {index}: label must not be empty"));
            }
            match &step.action {
                StepAction::Create {
                    parent,
                    id,
                    payload,
                } => {
                    validate_short_id(id, "id").map_err(|err| at(err.to_string()))?;
                    if let HandleRef::Step(earlier) = parent {
                        let yielded = self.check_reference(index, *earlier).map_err(at)?;
                        let nests = match payload.kind() {
                            ResourceKind::Entry => yielded == ResourceKind::EntryGroup,
                            _ => false,
                        };
                        if !nests {
                            return Err(at(format!(
                                "a {} cannot be created under a {yielded}",
                                payload.kind()
                            )));
                        }
                    }
                    if let Some(name) = self.expected_name(index) {
                        if !targets.insert(name.clone()) {
                            return Err(at(format!("{name} is created twice")));
                        }
                    }
                }
                StepAction::Lookup { .. } => {}
                StepAction::AttachTag {
                    parent,
                    template,
                    fields,
                } => {
                    if let HandleRef::Step(earlier) = parent {
                        let yielded = self.check_reference(index, *earlier).map_err(at)?;
                        if yielded != ResourceKind::Entry {
                            return Err(at(format!("tags attach to entries, not a {yielded}")));
                        }
                    }
                    if let HandleRef::Step(earlier) = template {
                        let yielded = self.check_reference(index, *earlier).map_err(at)?;
                        if yielded != ResourceKind::TagTemplate {
                            return Err(at(format!(
                                "tag template reference points at a {yielded}"
                            )));
                        }
                        if let StepAction::Create {
                            payload: ResourcePayload::TagTemplate(declared),
                            ..
                        } = &self.steps[*earlier].action
                        {
                            declared
                                .check_tag_fields(fields)
                                .map_err(|err| at(err.to_string()))?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn check_reference(&self, index: usize, earlier: usize) -> Result<ResourceKind, String> {
        if earlier >= index {
            return Err(format!(
                "references step {earlier}, which does not run before it"
            ));
        }
        Ok(self.steps[earlier].action.yields())
    }
}
