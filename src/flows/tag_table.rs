//! Tag an existing BigQuery table entry with a freshly created template.
use crate::catalog::{
    CatalogService, LookupCriteria, PrimitiveType, ResourcePayload, ResourceRef, TagTemplate,
    TagTemplateField, TagValue,
};
use crate::provision::{HandleRef, ProvisioningPlan, ProvisioningReport, Provisioner, StepAction};
use anyhow::Result;
use std::collections::BTreeMap;

const PII_TYPES: &[&str] = &["EMAIL", "SOCIAL SECURITY NUMBER", "NONE"];

/// Linked-resource URI the catalog records for a BigQuery table.
pub fn table_resource(project: &str, dataset: &str, table: &str) -> String {
    format!("//bigquery.googleapis.com/projects/{project}/datasets/{dataset}/tables/{table}")
}

fn tag_template() -> TagTemplate {
    let mut fields = BTreeMap::new();
    fields.insert(
        "source".to_string(),
        TagTemplateField::primitive("Source of data asset", PrimitiveType::String),
    );
    fields.insert(
        "num_rows".to_string(),
        TagTemplateField::primitive("Number of rows in data asset", PrimitiveType::Double),
    );
    fields.insert(
        "has_pii".to_string(),
        TagTemplateField::primitive("Has PII", PrimitiveType::Bool),
    );
    fields.insert(
        "pii_type".to_string(),
        TagTemplateField::enumeration("PII type", PII_TYPES),
    );
    TagTemplate {
        display_name: "Demo Tag Template".to_string(),
        fields,
    }
}

fn tag_fields() -> BTreeMap<String, TagValue> {
    let mut fields = BTreeMap::new();
    fields.insert(
        "source".to_string(),
        TagValue::string("Copied from tlc_yellow_trips_2017"),
    );
    fields.insert("num_rows".to_string(), TagValue::DoubleValue(113_496_874.0));
    fields.insert("has_pii".to_string(), TagValue::BoolValue(false));
    fields.insert("pii_type".to_string(), TagValue::enumeration("NONE"));
    fields
}

/// Template creation, table entry lookup, then a tag on the looked-up entry.
pub fn build_plan(
    location: &ResourceRef,
    template_id: &str,
    linked_resource: &str,
) -> ProvisioningPlan {
    let mut plan = ProvisioningPlan::new();
    let template = plan.create(
        "tag template",
        HandleRef::Fixed(location.clone()),
        template_id,
        ResourcePayload::TagTemplate(tag_template()),
    );
    let table = plan.push(
        "table entry lookup",
        StepAction::Lookup {
            criteria: LookupCriteria::LinkedResource(linked_resource.to_string()),
        },
    );
    plan.attach_tag(
        "tag",
        HandleRef::Step(table),
        HandleRef::Step(template),
        tag_fields(),
    );
    plan
}

pub fn run(
    service: &dyn CatalogService,
    location: &ResourceRef,
    template_id: &str,
    linked_resource: &str,
) -> Result<ProvisioningReport> {
    let plan = build_plan(location, template_id, linked_resource);
    Provisioner::new(service)
        .run(&plan)
        .map_err(|err| {
            let kind = err.kind();
            anyhow::Error::new(err).context(format!(
                "tag table {linked_resource} ({})",
                kind.as_str()
            ))
        })
}
