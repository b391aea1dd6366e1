//! In-process catalog emulator.
//!
//! Enforces the same error taxonomy as the remote service (missing parents,
//! duplicate ids, undeclared tag fields, stale policy etags) so flows can be
//! exercised offline. State optionally persists to a JSON file between runs.
use super::error::{CatalogError, CatalogResult};
use super::names::TAGS;
use super::{
    validate_short_id, CatalogService, Handle, LookupCriteria, Policy, ResourceKind,
    ResourcePayload, ResourceRef, SearchPage, SearchRequest, SearchResult, Tag,
};
use crate::staging::write_json_atomic;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_PAGE_SIZE: usize = 10;
const MEMBER_PREFIXES: &[&str] = &["user:", "group:", "serviceAccount:", "domain:"];
const MEMBER_LITERALS: &[&str] = &["allUsers", "allAuthenticatedUsers"];

/// Serialized emulator state.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LocalState {
    #[serde(default)]
    pub resources: BTreeMap<ResourceRef, ResourcePayload>,
    #[serde(default)]
    pub tags: BTreeMap<ResourceRef, Tag>,
    #[serde(default)]
    pub policies: BTreeMap<ResourceRef, Policy>,
    #[serde(default)]
    pub next_tag_id: u64,
}

pub struct LocalCatalog {
    state: RefCell<LocalState>,
    path: Option<PathBuf>,
}

impl LocalCatalog {
    /// Ephemeral emulator; state is lost when the process exits.
    pub fn in_memory() -> Self {
        Self {
            state: RefCell::new(LocalState::default()),
            path: None,
        }
    }

    /// Emulator backed by a JSON state file; a missing file starts empty.
    pub fn open(path: &Path) -> Result<Self> {
        let state = if path.is_file() {
            let bytes =
                fs::read(path).with_context(|| format!("read catalog state {}", path.display()))?;
            serde_json::from_slice(&bytes).context("parse catalog state JSON")?
        } else {
            LocalState::default()
        };
        Ok(Self {
            state: RefCell::new(state),
            path: Some(path.to_path_buf()),
        })
    }

    #[cfg(test)]
    pub fn contains(&self, name: &ResourceRef) -> bool {
        self.state.borrow().resources.contains_key(name)
    }

    /// Tags currently attached to `entry`.
    #[cfg(test)]
    pub fn tags_on(&self, entry: &ResourceRef) -> Vec<Tag> {
        let state = self.state.borrow();
        state
            .tags
            .iter()
            .filter(|(name, _)| name.parent().as_ref() == Some(entry))
            .map(|(_, tag)| tag.clone())
            .collect()
    }

    #[cfg(test)]
    pub fn seed(&self, name: ResourceRef, payload: ResourcePayload) {
        self.state.borrow_mut().resources.insert(name, payload);
    }

    fn persist(&self, state: &LocalState) -> CatalogResult<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        write_json_atomic(path, state)
            .map_err(|err| CatalogError::Other(format!("persist catalog state: {err:#}")))
    }

    /// Persist `next`, then make it the live state. A failed write leaves
    /// memory untouched.
    fn commit(&self, current: &mut LocalState, next: LocalState) -> CatalogResult<()> {
        self.persist(&next)?;
        *current = next;
        Ok(())
    }

    fn ensure_exists(state: &LocalState, name: &ResourceRef) -> CatalogResult<()> {
        if name.is_location() || state.resources.contains_key(name) {
            return Ok(());
        }
        Err(CatalogError::not_found(name.as_str()))
    }
}

impl CatalogService for LocalCatalog {
    fn delete_resource(&self, name: &ResourceRef, force: bool) -> CatalogResult<()> {
        let mut state = self.state.borrow_mut();
        if name.collection() == TAGS {
            if !state.tags.contains_key(name) {
                return Err(CatalogError::not_found(name.as_str()));
            }
            let mut next = state.clone();
            next.tags.remove(name);
            return self.commit(&mut state, next);
        }
        let Some(payload) = state.resources.get(name) else {
            return Err(CatalogError::not_found(name.as_str()));
        };
        let kind = payload.kind();

        let has_children = state
            .resources
            .keys()
            .any(|other| other.is_descendant_of(name));
        if has_children && !force {
            return Err(CatalogError::Conflict {
                entity: name.to_string(),
                message: format!("{kind} is not empty"),
            });
        }
        let tags_in_use = state.tags.values().any(|tag| &tag.template == name);
        if tags_in_use && !force {
            return Err(CatalogError::Conflict {
                entity: name.to_string(),
                message: "tag template is in use; delete with force".to_string(),
            });
        }

        let mut next = state.clone();
        next.resources.retain(|other, _| other != name && !other.is_descendant_of(name));
        next.tags.retain(|tag_name, tag| &tag.template != name && !tag_name.is_descendant_of(name));
        next.policies.retain(|other, _| other != name && !other.is_descendant_of(name));
        self.commit(&mut state, next)?;
        tracing::debug!(name = %name, kind = %kind, force, "local catalog delete");
        Ok(())
    }

    fn create_resource(
        &self,
        parent: &ResourceRef,
        id: &str,
        payload: &ResourcePayload,
    ) -> CatalogResult<Handle> {
        let kind = payload.kind();
        validate_short_id(id, kind.id_param().unwrap_or("id"))?;
        if !payload.allowed_parent(parent) {
            return Err(CatalogError::invalid(format!(
                "a {kind} cannot be created under {parent}"
            )));
        }
        if let ResourcePayload::TagTemplate(template) = payload {
            if template.fields.is_empty() {
                return Err(CatalogError::invalid(
                    "tag template must declare at least one field",
                ));
            }
        }

        let mut state = self.state.borrow_mut();
        Self::ensure_exists(&state, parent)?;
        let name = parent.child(kind.collection(), id)?;
        if state.resources.contains_key(&name) {
            return Err(CatalogError::already_exists(name.as_str()));
        }
        let mut next = state.clone();
        next.resources.insert(name.clone(), payload.clone());
        self.commit(&mut state, next)?;
        tracing::debug!(name = %name, kind = %kind, "local catalog create");
        Ok(Handle::new(kind, name))
    }

    fn lookup_resource(&self, criteria: &LookupCriteria) -> CatalogResult<Handle> {
        let state = self.state.borrow();
        let LookupCriteria::LinkedResource(uri) = criteria;
        state
            .resources
            .iter()
            .find_map(|(name, payload)| match payload {
                ResourcePayload::Entry(entry) if &entry.linked_resource == uri => {
                    Some(Handle::new(ResourceKind::Entry, name.clone()))
                }
                _ => None,
            })
            .ok_or_else(|| CatalogError::not_found(criteria.to_string()))
    }

    fn get_policy(&self, resource: &ResourceRef) -> CatalogResult<Policy> {
        let state = self.state.borrow();
        if !state.resources.contains_key(resource) {
            return Err(CatalogError::not_found(resource.as_str()));
        }
        Ok(state
            .policies
            .get(resource)
            .cloned()
            .unwrap_or_else(|| Policy {
                version: Some(1),
                etag: Some(etag_for(0)),
                ..Policy::default()
            }))
    }

    fn set_policy(&self, resource: &ResourceRef, policy: &Policy) -> CatalogResult<Policy> {
        validate_policy(policy)?;
        let mut state = self.state.borrow_mut();
        if !state.resources.contains_key(resource) {
            return Err(CatalogError::not_found(resource.as_str()));
        }
        let current_etag = state
            .policies
            .get(resource)
            .and_then(|stored| stored.etag.clone())
            .unwrap_or_else(|| etag_for(0));
        if let Some(incoming) = policy.etag.as_deref() {
            if incoming != current_etag {
                return Err(CatalogError::Conflict {
                    entity: resource.to_string(),
                    message: format!("etag {incoming} is stale (current {current_etag})"),
                });
            }
        }
        let generation = etag_generation(&current_etag) + 1;
        let stored = Policy {
            version: Some(policy.version.unwrap_or(1)),
            etag: Some(etag_for(generation)),
            ..policy.clone()
        };
        let mut next = state.clone();
        next.policies.insert(resource.clone(), stored.clone());
        self.commit(&mut state, next)?;
        Ok(stored)
    }

    fn create_tag(&self, parent: &ResourceRef, tag: &Tag) -> CatalogResult<Handle> {
        let mut state = self.state.borrow_mut();
        match state.resources.get(parent) {
            Some(ResourcePayload::Entry(_)) => {}
            Some(other) => {
                return Err(CatalogError::invalid(format!(
                    "tags attach to entries, not to a {}",
                    other.kind()
                )))
            }
            None => return Err(CatalogError::not_found(parent.as_str())),
        }
        let template = match state.resources.get(&tag.template) {
            Some(ResourcePayload::TagTemplate(template)) => template,
            _ => return Err(CatalogError::not_found(tag.template.as_str())),
        };
        template.check_tag_fields(&tag.fields)?;
        let duplicate = state.tags.iter().any(|(name, existing)| {
            name.parent().as_ref() == Some(parent) && existing.template == tag.template
        });
        if duplicate {
            return Err(CatalogError::already_exists(format!(
                "tag for {} on {parent}",
                tag.template
            )));
        }

        let mut next = state.clone();
        next.next_tag_id += 1;
        let name = parent.child(TAGS, &format!("tag_{}", next.next_tag_id))?;
        next.tags.insert(name.clone(), tag.clone());
        self.commit(&mut state, next)?;
        Ok(Handle::new(ResourceKind::Tag, name))
    }

    fn search_catalog(&self, request: &SearchRequest) -> CatalogResult<SearchPage> {
        if request.scope.is_empty() {
            return Err(CatalogError::invalid(
                "search scope must include at least one organization or project",
            ));
        }
        let offset = match request.page_token.as_deref() {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| CatalogError::invalid(format!("invalid page token {token:?}")))?,
            None => 0,
        };
        let page_size = request
            .page_size
            .map(|size| size as usize)
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let state = self.state.borrow();
        let matches: Vec<SearchResult> = state
            .resources
            .iter()
            .filter(|(name, _)| in_scope(name, request))
            .map(|(name, payload)| search_result(name, payload))
            .filter(|result| query_matches(&request.query, result))
            .collect();
        let end = (offset + page_size).min(matches.len());
        let results = matches.get(offset..end).unwrap_or_default().to_vec();
        let next_page_token = (end < matches.len()).then(|| end.to_string());
        Ok(SearchPage {
            results,
            next_page_token,
        })
    }
}

fn etag_for(generation: u64) -> String {
    format!("etag-{generation}")
}

fn etag_generation(etag: &str) -> u64 {
    etag.strip_prefix("etag-")
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

fn validate_policy(policy: &Policy) -> CatalogResult<()> {
    for binding in &policy.bindings {
        if !binding.role.starts_with("roles/") {
            return Err(CatalogError::invalid(format!(
                "role {:?} must start with roles/",
                binding.role
            )));
        }
        if binding.members.is_empty() {
            return Err(CatalogError::invalid(format!(
                "binding for {} has no members",
                binding.role
            )));
        }
        let mut seen = std::collections::BTreeSet::new();
        for member in &binding.members {
            let well_formed = MEMBER_LITERALS.contains(&member.as_str())
                || MEMBER_PREFIXES.iter().any(|prefix| {
                    member
                        .strip_prefix(prefix)
                        .is_some_and(|rest| !rest.is_empty())
                });
            if !well_formed {
                return Err(CatalogError::invalid(format!(
                    "member {member:?} must be prefixed with user:, group:, serviceAccount: or domain:"
                )));
            }
            if !seen.insert(member.as_str()) {
                return Err(CatalogError::invalid(format!(
                    "member {member} appears twice in the binding for {}",
                    binding.role
                )));
            }
        }
    }
    Ok(())
}

fn in_scope(name: &ResourceRef, request: &SearchRequest) -> bool {
    // Organizations are not modelled locally; an org scope covers every project.
    if !request.scope.include_org_ids.is_empty() {
        return true;
    }
    let project = name.as_str().split('/').nth(1).unwrap_or_default();
    request
        .scope
        .include_project_ids
        .iter()
        .any(|id| id == project)
}

fn search_result(name: &ResourceRef, payload: &ResourcePayload) -> SearchResult {
    let (result_type, subtype, linked) = match payload {
        ResourcePayload::EntryGroup(_) => ("ENTRY_GROUP", "entry_group".to_string(), ""),
        ResourcePayload::TagTemplate(_) => ("TAG_TEMPLATE", "tag_template".to_string(), ""),
        ResourcePayload::Entry(entry) => {
            let subtype = if entry.user_specified_type.is_empty() {
                "entry".to_string()
            } else {
                format!("entry.{}", entry.user_specified_type)
            };
            ("ENTRY", subtype, entry.linked_resource.as_str())
        }
    };
    SearchResult {
        search_result_type: result_type.to_string(),
        search_result_subtype: subtype,
        relative_resource_name: name.to_string(),
        linked_resource: linked.to_string(),
    }
}

/// Minimal query language: `type=<kind>`, `name:<fragment>` and bare terms,
/// all of which must match.
fn query_matches(query: &str, result: &SearchResult) -> bool {
    query.split_whitespace().all(|term| {
        if let Some(wanted) = term.strip_prefix("type=") {
            let wanted = wanted.to_ascii_lowercase();
            result.search_result_type.eq_ignore_ascii_case(&wanted)
                || result.search_result_subtype == wanted
                || result.search_result_subtype == format!("entry.{wanted}")
        } else if let Some(fragment) = term.strip_prefix("name:") {
            result
                .relative_resource_name
                .rsplit('/')
                .next()
                .is_some_and(|id| id.contains(fragment))
        } else {
            result.relative_resource_name.contains(term) || result.linked_resource.contains(term)
        }
    })
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
