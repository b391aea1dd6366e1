//! Typed catalog resources as they travel over the wire.
//!
//! Field names mirror the service's camelCase JSON so the same types serve
//! the REST client, the local emulator state file and `--json` output.
use super::error::{CatalogError, CatalogResult};
use super::names::{ResourceRef, ENTRIES, ENTRY_GROUPS, TAGS, TAG_TEMPLATES};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of resource a handle or payload refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    EntryGroup,
    Entry,
    TagTemplate,
    Tag,
}

impl ResourceKind {
    /// Collection segment the resource lives under.
    pub fn collection(self) -> &'static str {
        match self {
            ResourceKind::EntryGroup => ENTRY_GROUPS,
            ResourceKind::Entry => ENTRIES,
            ResourceKind::TagTemplate => TAG_TEMPLATES,
            ResourceKind::Tag => TAGS,
        }
    }

    /// Query parameter carrying the caller-chosen id on create.
    pub fn id_param(self) -> Option<&'static str> {
        match self {
            ResourceKind::EntryGroup => Some("entryGroupId"),
            ResourceKind::Entry => Some("entryId"),
            ResourceKind::TagTemplate => Some("tagTemplateId"),
            ResourceKind::Tag => None,
        }
    }

    /// Templates in use by tags can only be removed with `force`.
    pub fn force_delete(self) -> bool {
        matches!(self, ResourceKind::TagTemplate)
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::EntryGroup => "entry group",
            ResourceKind::Entry => "entry",
            ResourceKind::TagTemplate => "tag template",
            ResourceKind::Tag => "tag",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical identifier returned by a create or lookup call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle {
    pub kind: ResourceKind,
    pub name: ResourceRef,
}

impl Handle {
    pub fn new(kind: ResourceKind, name: ResourceRef) -> Self {
        Self { kind, name }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryGroup {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub column: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub columns: Vec<ColumnSchema>,
}

/// Custom entry describing an asset managed outside the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_specified_system: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_specified_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub linked_resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrimitiveType {
    Double,
    String,
    Bool,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumType {
    pub allowed_values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    PrimitiveType(PrimitiveType),
    EnumType(EnumType),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagTemplateField {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl TagTemplateField {
    pub fn primitive(display_name: &str, primitive: PrimitiveType) -> Self {
        Self {
            display_name: display_name.to_string(),
            field_type: FieldType::PrimitiveType(primitive),
        }
    }

    pub fn enumeration(display_name: &str, allowed: &[&str]) -> Self {
        Self {
            display_name: display_name.to_string(),
            field_type: FieldType::EnumType(EnumType {
                allowed_values: allowed
                    .iter()
                    .map(|value| EnumValue {
                        display_name: value.to_string(),
                    })
                    .collect(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagTemplate {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, TagTemplateField>,
}

impl TagTemplate {
    /// Check that a tag only sets declared fields, each with a matching type.
    pub fn check_tag_fields(&self, fields: &BTreeMap<String, TagValue>) -> CatalogResult<()> {
        for (name, value) in fields {
            let declared = self.fields.get(name).ok_or_else(|| {
                CatalogError::invalid(format!("tag field {name:?} is not declared by the template"))
            })?;
            if !value.matches(&declared.field_type) {
                return Err(CatalogError::invalid(format!(
                    "tag field {name:?} does not match the declared {} type",
                    declared.field_type.label()
                )));
            }
        }
        Ok(())
    }
}

impl FieldType {
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::PrimitiveType(PrimitiveType::Double) => "DOUBLE",
            FieldType::PrimitiveType(PrimitiveType::String) => "STRING",
            FieldType::PrimitiveType(PrimitiveType::Bool) => "BOOL",
            FieldType::PrimitiveType(PrimitiveType::Timestamp) => "TIMESTAMP",
            FieldType::EnumType(_) => "ENUM",
        }
    }
}

/// Typed value of one tag field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TagValue {
    StringValue(String),
    DoubleValue(f64),
    BoolValue(bool),
    TimestampValue(String),
    EnumValue(EnumValue),
}

impl TagValue {
    pub fn string(value: &str) -> Self {
        TagValue::StringValue(value.to_string())
    }

    pub fn enumeration(display_name: &str) -> Self {
        TagValue::EnumValue(EnumValue {
            display_name: display_name.to_string(),
        })
    }

    fn matches(&self, field_type: &FieldType) -> bool {
        match (self, field_type) {
            (TagValue::StringValue(_), FieldType::PrimitiveType(PrimitiveType::String))
            | (TagValue::DoubleValue(_), FieldType::PrimitiveType(PrimitiveType::Double))
            | (TagValue::BoolValue(_), FieldType::PrimitiveType(PrimitiveType::Bool))
            | (TagValue::TimestampValue(_), FieldType::PrimitiveType(PrimitiveType::Timestamp)) => {
                true
            }
            (TagValue::EnumValue(value), FieldType::EnumType(allowed)) => allowed
                .allowed_values
                .iter()
                .any(|candidate| candidate.display_name == value.display_name),
            _ => false,
        }
    }
}

/// Instance of a template attached to an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub template: ResourceRef,
    #[serde(default)]
    pub fields: BTreeMap<String, TagValue>,
}

/// Creation payload for resources with caller-chosen ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourcePayload {
    EntryGroup(EntryGroup),
    Entry(Entry),
    TagTemplate(TagTemplate),
}

impl ResourcePayload {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourcePayload::EntryGroup(_) => ResourceKind::EntryGroup,
            ResourcePayload::Entry(_) => ResourceKind::Entry,
            ResourcePayload::TagTemplate(_) => ResourceKind::TagTemplate,
        }
    }

    /// Collections this kind may be created under.
    pub fn allowed_parent(&self, parent: &ResourceRef) -> bool {
        match self {
            ResourcePayload::EntryGroup(_) | ResourcePayload::TagTemplate(_) => {
                parent.is_location()
            }
            ResourcePayload::Entry(_) => parent.collection() == ENTRY_GROUPS,
        }
    }
}

/// How an existing resource is located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LookupCriteria {
    LinkedResource(String),
}

impl fmt::Display for LookupCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupCriteria::LinkedResource(uri) => write!(f, "linked resource {uri}"),
        }
    }
}

/// One role binding. Fields this crate does not model, such as `condition`,
/// are kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Binding {
    pub fn new(role: &str, member: &str) -> Self {
        Self {
            role: role.to_string(),
            members: vec![member.to_string()],
            extra: Map::new(),
        }
    }
}

/// Access-control policy attached to a resource.
///
/// `extra` carries unmodelled top-level fields (`auditConfigs` and the like)
/// through a read-modify-write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchScope {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_org_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_project_ids: Vec<String>,
}

impl SearchScope {
    pub fn is_empty(&self) -> bool {
        self.include_org_ids.is_empty() && self.include_project_ids.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub scope: SearchScope,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default)]
    pub search_result_type: String,
    #[serde(default)]
    pub search_result_subtype: String,
    #[serde(default)]
    pub relative_resource_name: String,
    #[serde(default)]
    pub linked_resource: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}
