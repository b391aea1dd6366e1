//! Register an asset managed by an external system.
use crate::catalog::{
    CatalogService, ColumnSchema, Entry, EntryGroup, PrimitiveType, ResourcePayload, ResourceRef,
    Schema, TagTemplate, TagTemplateField, TagValue,
};
use crate::provision::{HandleRef, ProvisioningPlan, ProvisioningReport, Provisioner};
use anyhow::Result;
use std::collections::BTreeMap;

pub const LINKED_RESOURCE: &str = "//my-onprem-server.com/dataAssets/my-awesome-data-asset";
const SYSTEM: &str = "onprem_data_system";
const ASSET_TYPE: &str = "onprem_data_asset";

/// Ids the caller picks for the three created resources.
#[derive(Debug, Clone)]
pub struct CustomEntryIds<'a> {
    pub entry_group: &'a str,
    pub entry: &'a str,
    pub tag_template: &'a str,
}

fn column(name: &str, column_type: &str) -> ColumnSchema {
    ColumnSchema {
        column: name.to_string(),
        column_type: column_type.to_string(),
        description: "This columns consists of ....".to_string(),
        mode: "NULLABLE".to_string(),
    }
}

fn entry_group() -> EntryGroup {
    EntryGroup {
        display_name: "My awesome Entry Group".to_string(),
        description: "This Entry Group represents an external system".to_string(),
    }
}

fn entry() -> Entry {
    Entry {
        user_specified_system: SYSTEM.to_string(),
        user_specified_type: ASSET_TYPE.to_string(),
        display_name: "My awesome data asset".to_string(),
        description: "This data asset is managed by an external system.".to_string(),
        linked_resource: LINKED_RESOURCE.to_string(),
        schema: Some(Schema {
            columns: vec![
                column("first_column", "STRING"),
                column("second_column", "DOUBLE"),
            ],
        }),
    }
}

fn tag_template() -> TagTemplate {
    let mut fields = BTreeMap::new();
    fields.insert(
        "source".to_string(),
        TagTemplateField::primitive("Source of data asset", PrimitiveType::String),
    );
    TagTemplate {
        display_name: "Demo Tag Template".to_string(),
        fields,
    }
}

/// Entry group, custom entry inside it, tag template, and a tag on the entry.
pub fn build_plan(location: &ResourceRef, ids: &CustomEntryIds<'_>) -> ProvisioningPlan {
    let mut plan = ProvisioningPlan::new();
    let group = plan.create(
        "entry group",
        HandleRef::Fixed(location.clone()),
        ids.entry_group,
        ResourcePayload::EntryGroup(entry_group()),
    );
    let entry_step = plan.create(
        "entry",
        HandleRef::Step(group),
        ids.entry,
        ResourcePayload::Entry(entry()),
    );
    let template = plan.create(
        "tag template",
        HandleRef::Fixed(location.clone()),
        ids.tag_template,
        ResourcePayload::TagTemplate(tag_template()),
    );
    let mut fields = BTreeMap::new();
    fields.insert(
        "source".to_string(),
        TagValue::string("On-premises system name"),
    );
    plan.attach_tag(
        "tag",
        HandleRef::Step(entry_step),
        HandleRef::Step(template),
        fields,
    );
    plan
}

pub fn run(
    service: &dyn CatalogService,
    location: &ResourceRef,
    ids: &CustomEntryIds<'_>,
) -> Result<ProvisioningReport> {
    let plan = build_plan(location, ids);
    Provisioner::new(service)
        .run(&plan)
        .map_err(|err| {
            let kind = err.kind();
            anyhow::Error::new(err).context(format!("provision custom entry ({})", kind.as_str()))
        })
}
