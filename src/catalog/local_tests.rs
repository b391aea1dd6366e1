use super::*;
use crate::catalog::{
    Binding, Entry, EntryGroup, ErrorKind, PrimitiveType, SearchScope, TagTemplate,
    TagTemplateField, TagValue,
};

fn group_payload() -> ResourcePayload {
    ResourcePayload::EntryGroup(EntryGroup {
        display_name: "group".to_string(),
        description: String::new(),
    })
}

fn entry_payload(linked: &str) -> ResourcePayload {
    ResourcePayload::Entry(Entry {
        user_specified_system: "onprem_data_system".to_string(),
        user_specified_type: "onprem_data_asset".to_string(),
        linked_resource: linked.to_string(),
        ..Entry::default()
    })
}

fn template_payload() -> ResourcePayload {
    let mut template = TagTemplate {
        display_name: "Demo".to_string(),
        ..TagTemplate::default()
    };
    template.fields.insert(
        "source".to_string(),
        TagTemplateField::primitive("Source", PrimitiveType::String),
    );
    template.fields.insert(
        "pii_type".to_string(),
        TagTemplateField::enumeration("PII type", &["EMAIL", "NONE"]),
    );
    ResourcePayload::TagTemplate(template)
}

fn location() -> ResourceRef {
    ResourceRef::location("p", "us-central1").expect("location")
}

#[test]
fn create_requires_existing_parent_and_unique_id() {
    let catalog = LocalCatalog::in_memory();
    let group_name = ResourceRef::entry_group("p", "us-central1", "g").expect("group name");

    let err = catalog
        .create_resource(&group_name, "e", &entry_payload("//x"))
        .expect_err("parent group missing");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let group = catalog
        .create_resource(&location(), "g", &group_payload())
        .expect("create group");
    assert_eq!(group.name, group_name);
    assert_eq!(group.kind, ResourceKind::EntryGroup);

    let err = catalog
        .create_resource(&location(), "g", &group_payload())
        .expect_err("duplicate group");
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn create_rejects_misplaced_payloads() {
    let catalog = LocalCatalog::in_memory();
    let err = catalog
        .create_resource(&location(), "e", &entry_payload("//x"))
        .expect_err("entries live under entry groups");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = catalog
        .create_resource(&location(), "bad-id", &group_payload())
        .expect_err("dash is not a valid id character");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn delete_of_non_empty_group_needs_children_removed_first() {
    let catalog = LocalCatalog::in_memory();
    let group = catalog
        .create_resource(&location(), "g", &group_payload())
        .expect("group");
    let entry = catalog
        .create_resource(&group.name, "e", &entry_payload("//x"))
        .expect("entry");

    let err = catalog
        .delete_resource(&group.name, false)
        .expect_err("group still has an entry");
    assert_eq!(err.kind(), ErrorKind::Conflict);

    catalog.delete_resource(&entry.name, false).expect("delete entry");
    catalog.delete_resource(&group.name, false).expect("delete group");
    assert!(!catalog.contains(&group.name));

    let err = catalog
        .delete_resource(&group.name, false)
        .expect_err("already gone");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn tags_must_use_declared_fields_with_matching_types() {
    let catalog = LocalCatalog::in_memory();
    let group = catalog
        .create_resource(&location(), "g", &group_payload())
        .expect("group");
    let entry = catalog
        .create_resource(&group.name, "e", &entry_payload("//x"))
        .expect("entry");
    let template = catalog
        .create_resource(&location(), "t", &template_payload())
        .expect("template");

    let mut fields = BTreeMap::new();
    fields.insert("undeclared".to_string(), TagValue::string("x"));
    let err = catalog
        .create_tag(
            &entry.name,
            &Tag {
                template: template.name.clone(),
                fields,
            },
        )
        .expect_err("undeclared field");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let mut fields = BTreeMap::new();
    fields.insert("source".to_string(), TagValue::BoolValue(true));
    let err = catalog
        .create_tag(
            &entry.name,
            &Tag {
                template: template.name.clone(),
                fields,
            },
        )
        .expect_err("type mismatch");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let mut fields = BTreeMap::new();
    fields.insert("source".to_string(), TagValue::string("system"));
    fields.insert("pii_type".to_string(), TagValue::enumeration("NONE"));
    let tag = Tag {
        template: template.name.clone(),
        fields,
    };
    let handle = catalog.create_tag(&entry.name, &tag).expect("valid tag");
    assert_eq!(handle.kind, ResourceKind::Tag);
    assert_eq!(handle.name.parent().as_ref(), Some(&entry.name));
    assert_eq!(catalog.tags_on(&entry.name), vec![tag.clone()]);

    let err = catalog
        .create_tag(&entry.name, &tag)
        .expect_err("one tag per template per entry");
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn forced_template_delete_removes_its_tags() {
    let catalog = LocalCatalog::in_memory();
    let group = catalog
        .create_resource(&location(), "g", &group_payload())
        .expect("group");
    let entry = catalog
        .create_resource(&group.name, "e", &entry_payload("//x"))
        .expect("entry");
    let template = catalog
        .create_resource(&location(), "t", &template_payload())
        .expect("template");
    let tag = Tag {
        template: template.name.clone(),
        fields: BTreeMap::new(),
    };
    catalog.create_tag(&entry.name, &tag).expect("tag");

    let err = catalog
        .delete_resource(&template.name, false)
        .expect_err("template in use");
    assert_eq!(err.kind(), ErrorKind::Conflict);

    catalog
        .delete_resource(&template.name, true)
        .expect("forced delete");
    assert!(catalog.tags_on(&entry.name).is_empty());
}

#[test]
fn lookup_finds_entries_by_linked_resource() {
    let catalog = LocalCatalog::in_memory();
    let table = "//bigquery.googleapis.com/projects/p/datasets/d/tables/t";
    let name = ResourceRef::parse("projects/p/locations/us/entryGroups/@bigquery/entries/abc")
        .expect("bigquery entry name");
    catalog.seed(name.clone(), entry_payload(table));

    let handle = catalog
        .lookup_resource(&LookupCriteria::LinkedResource(table.to_string()))
        .expect("lookup");
    assert_eq!(handle.name, name);

    let err = catalog
        .lookup_resource(&LookupCriteria::LinkedResource("//missing".to_string()))
        .expect_err("no such entry");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn set_policy_enforces_etag_and_member_format() {
    let catalog = LocalCatalog::in_memory();
    let template = catalog
        .create_resource(&location(), "t", &template_payload())
        .expect("template");

    let mut policy = catalog.get_policy(&template.name).expect("initial policy");
    assert!(policy.bindings.is_empty());
    policy.bindings.push(Binding::new(
        "roles/datacatalog.tagTemplateUser",
        "user:a@example.com",
    ));
    let stored = catalog
        .set_policy(&template.name, &policy)
        .expect("first write");
    assert_ne!(stored.etag, policy.etag, "etag advances on write");

    let err = catalog
        .set_policy(&template.name, &policy)
        .expect_err("stale etag");
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let mut bad = stored.clone();
    bad.bindings.push(Binding::new("roles/viewer", "a@example.com"));
    let err = catalog
        .set_policy(&template.name, &bad)
        .expect_err("member missing prefix");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let mut duplicated = stored.clone();
    duplicated.bindings[0]
        .members
        .push("user:a@example.com".to_string());
    let err = catalog
        .set_policy(&template.name, &duplicated)
        .expect_err("members unique within a binding");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let missing = ResourceRef::tag_template("p", "us-central1", "missing").expect("name");
    let err = catalog.get_policy(&missing).expect_err("missing resource");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn search_filters_by_scope_and_query_and_pages() {
    let catalog = LocalCatalog::in_memory();
    for id in ["g1", "g2", "g3"] {
        catalog
            .create_resource(&location(), id, &group_payload())
            .expect("group");
    }
    catalog
        .create_resource(&location(), "t", &template_payload())
        .expect("template");

    let request = SearchRequest {
        scope: SearchScope {
            include_project_ids: vec!["p".to_string()],
            ..SearchScope::default()
        },
        query: "type=entry_group".to_string(),
        page_size: Some(2),
        page_token: None,
    };
    let first = catalog.search_catalog(&request).expect("first page");
    assert_eq!(first.results.len(), 2);
    let token = first.next_page_token.clone().expect("more results");
    let second = catalog
        .search_catalog(&SearchRequest {
            page_token: Some(token),
            ..request.clone()
        })
        .expect("second page");
    assert_eq!(second.results.len(), 1);
    assert!(second.next_page_token.is_none());

    let other_project = SearchRequest {
        scope: SearchScope {
            include_project_ids: vec!["other".to_string()],
            ..SearchScope::default()
        },
        ..request.clone()
    };
    assert!(catalog
        .search_catalog(&other_project)
        .expect("search")
        .results
        .is_empty());

    let unscoped = SearchRequest {
        scope: SearchScope::default(),
        ..request
    };
    let err = catalog.search_catalog(&unscoped).expect_err("scope required");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn persisted_state_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("catalog.json");
    {
        let catalog = LocalCatalog::open(&path).expect("open empty");
        catalog
            .create_resource(&location(), "g", &group_payload())
            .expect("group");
    }
    let reopened = LocalCatalog::open(&path).expect("reopen");
    let group = ResourceRef::entry_group("p", "us-central1", "g").expect("group name");
    assert!(reopened.contains(&group));
    let err = reopened
        .create_resource(&location(), "g", &group_payload())
        .expect_err("state was persisted");
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn failed_persist_leaves_memory_unchanged() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("catalog.json");
    let catalog = LocalCatalog::open(&path).expect("open empty");
    let template = catalog
        .create_resource(&location(), "t", &template_payload())
        .expect("template");

    // A directory in place of the state file makes every later write fail.
    std::fs::remove_file(&path).expect("remove state file");
    std::fs::create_dir(&path).expect("block state path");

    let err = catalog
        .create_resource(&location(), "g", &group_payload())
        .expect_err("persist fails");
    assert_eq!(err.kind(), ErrorKind::Other);
    let group = ResourceRef::entry_group("p", "us-central1", "g").expect("group name");
    assert!(!catalog.contains(&group));

    let before = catalog.get_policy(&template.name).expect("policy");
    let mut policy = before.clone();
    policy.bindings.push(Binding::new("roles/viewer", "user:a@example.com"));
    catalog
        .set_policy(&template.name, &policy)
        .expect_err("persist fails");
    assert_eq!(catalog.get_policy(&template.name).expect("policy"), before);

    catalog
        .delete_resource(&template.name, true)
        .expect_err("persist fails");
    assert!(catalog.contains(&template.name));
}
