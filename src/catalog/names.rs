//! Hierarchical resource names.
//!
//! Names follow the `projects/{p}/locations/{l}/{collection}/{id}/...` layout
//! used by the catalog service. They are composed locally from short ids and
//! never mutated; handles returned by the service are parsed back into the
//! same type so later steps can use them as parents.
use super::error::{CatalogError, CatalogResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

pub const ENTRY_GROUPS: &str = "entryGroups";
pub const ENTRIES: &str = "entries";
pub const TAG_TEMPLATES: &str = "tagTemplates";
pub const TAGS: &str = "tags";

fn short_id_regex() -> &'static Regex {
    static SHORT_ID: OnceLock<Regex> = OnceLock::new();
    SHORT_ID.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").expect("valid regex"))
}

fn segment_regex() -> &'static Regex {
    static SEGMENT: OnceLock<Regex> = OnceLock::new();
    SEGMENT.get_or_init(|| Regex::new(r"^[A-Za-z0-9_@.\-]+$").expect("valid regex"))
}

/// Validate a caller-supplied short id (entry group, entry, template).
pub fn validate_short_id(id: &str, label: &str) -> CatalogResult<()> {
    if short_id_regex().is_match(id) {
        return Ok(());
    }
    Err(CatalogError::invalid(format!(
        "{label} must start with a letter or underscore and contain at most 64 letters, digits or underscores (got {id:?})"
    )))
}

fn validate_segment(value: &str, label: &str) -> CatalogResult<()> {
    if segment_regex().is_match(value) {
        return Ok(());
    }
    Err(CatalogError::invalid(format!(
        "{label} contains invalid characters (got {value:?})"
    )))
}

/// Opaque, hierarchical name of a remote catalog resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceRef(String);

impl ResourceRef {
    /// `projects/{project}/locations/{location}`.
    pub fn location(project: &str, location: &str) -> CatalogResult<Self> {
        validate_segment(project, "project")?;
        validate_segment(location, "location")?;
        Ok(Self(format!("projects/{project}/locations/{location}")))
    }

    #[cfg(test)]
    pub fn entry_group(project: &str, location: &str, group_id: &str) -> CatalogResult<Self> {
        Self::location(project, location)?.child(ENTRY_GROUPS, group_id)
    }

    #[cfg(test)]
    pub fn entry(
        project: &str,
        location: &str,
        group_id: &str,
        entry_id: &str,
    ) -> CatalogResult<Self> {
        Self::entry_group(project, location, group_id)?.child(ENTRIES, entry_id)
    }

    pub fn tag_template(project: &str, location: &str, template_id: &str) -> CatalogResult<Self> {
        Self::location(project, location)?.child(TAG_TEMPLATES, template_id)
    }

    /// Append a `collection/id` pair below this name.
    pub fn child(&self, collection: &str, id: &str) -> CatalogResult<Self> {
        validate_segment(collection, "collection")?;
        validate_segment(id, "id")?;
        Ok(Self(format!("{}/{collection}/{id}", self.0)))
    }

    /// Parse a canonical name returned by the service.
    pub fn parse(name: &str) -> CatalogResult<Self> {
        let segments: Vec<&str> = name.split('/').collect();
        if segments.len() < 4 || segments.len() % 2 != 0 {
            return Err(CatalogError::invalid(format!(
                "resource name must be collection/id pairs (got {name:?})"
            )));
        }
        if segments[0] != "projects" || segments[2] != "locations" {
            return Err(CatalogError::invalid(format!(
                "resource name must start with projects/{{p}}/locations/{{l}} (got {name:?})"
            )));
        }
        for segment in &segments {
            validate_segment(segment, "resource name")?;
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the enclosing resource, `None` for a location.
    pub fn parent(&self) -> Option<Self> {
        let segments: Vec<&str> = self.0.split('/').collect();
        if segments.len() <= 4 {
            return None;
        }
        Some(Self(segments[..segments.len() - 2].join("/")))
    }

    /// Collection segment of the last `collection/id` pair.
    pub fn collection(&self) -> &str {
        let mut parts = self.0.rsplit('/');
        parts.next();
        parts.next().unwrap_or_default()
    }

    /// Short id of the last `collection/id` pair.
    #[cfg(test)]
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    pub fn is_location(&self) -> bool {
        self.0.split('/').count() == 4
    }

    pub fn is_descendant_of(&self, ancestor: &ResourceRef) -> bool {
        self.0.len() > ancestor.0.len()
            && self.0.starts_with(&ancestor.0)
            && self.0.as_bytes()[ancestor.0.len()] == b'/'
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ResourceRef {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceRef> for String {
    fn from(value: ResourceRef) -> Self {
        value.0
    }
}

#[cfg(test)]
#[path = "names_tests.rs"]
mod tests;
