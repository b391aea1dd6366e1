//! Test double that records every verb and can inject failures.
use super::local::LocalCatalog;
use super::{
    CatalogError, CatalogResult, CatalogService, Handle, LookupCriteria, Policy, ResourcePayload,
    ResourceRef, SearchPage, SearchRequest, Tag,
};
use std::cell::RefCell;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Delete(ResourceRef),
    Create { parent: ResourceRef, id: String },
    Lookup(LookupCriteria),
    GetPolicy(ResourceRef),
    SetPolicy(ResourceRef, Policy),
    CreateTag { parent: ResourceRef, tag: Tag },
    Search(SearchRequest),
}

pub(crate) struct RecordingCatalog {
    pub(crate) inner: LocalCatalog,
    calls: RefCell<Vec<Call>>,
    id_suffix: String,
    delete_failures: RefCell<Vec<(ResourceRef, CatalogError)>>,
    create_failures: RefCell<Vec<(String, CatalogError)>>,
    set_policy_failure: RefCell<Option<CatalogError>>,
}

impl RecordingCatalog {
    pub(crate) fn new() -> Self {
        Self {
            inner: LocalCatalog::in_memory(),
            calls: RefCell::new(Vec::new()),
            id_suffix: String::new(),
            delete_failures: RefCell::new(Vec::new()),
            create_failures: RefCell::new(Vec::new()),
            set_policy_failure: RefCell::new(None),
        }
    }

    /// Service that assigns its own names: every created id gets `suffix`.
    pub(crate) fn with_id_suffix(suffix: &str) -> Self {
        Self {
            id_suffix: suffix.to_string(),
            ..Self::new()
        }
    }

    pub(crate) fn fail_delete(&self, name: ResourceRef, err: CatalogError) {
        self.delete_failures.borrow_mut().push((name, err));
    }

    pub(crate) fn fail_create(&self, id: &str, err: CatalogError) {
        self.create_failures
            .borrow_mut()
            .push((id.to_string(), err));
    }

    pub(crate) fn fail_set_policy(&self, err: CatalogError) {
        *self.set_policy_failure.borrow_mut() = Some(err);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl CatalogService for RecordingCatalog {
    fn delete_resource(&self, name: &ResourceRef, force: bool) -> CatalogResult<()> {
        self.record(Call::Delete(name.clone()));
        let injected = self
            .delete_failures
            .borrow()
            .iter()
            .find(|(target, _)| target == name)
            .map(|(_, err)| err.clone());
        if let Some(err) = injected {
            return Err(err);
        }
        self.inner.delete_resource(name, force)
    }

    fn create_resource(
        &self,
        parent: &ResourceRef,
        id: &str,
        payload: &ResourcePayload,
    ) -> CatalogResult<Handle> {
        self.record(Call::Create {
            parent: parent.clone(),
            id: id.to_string(),
        });
        let injected = self
            .create_failures
            .borrow()
            .iter()
            .find(|(target, _)| target == id)
            .map(|(_, err)| err.clone());
        if let Some(err) = injected {
            return Err(err);
        }
        let assigned = format!("{id}{}", self.id_suffix);
        self.inner.create_resource(parent, &assigned, payload)
    }

    fn lookup_resource(&self, criteria: &LookupCriteria) -> CatalogResult<Handle> {
        self.record(Call::Lookup(criteria.clone()));
        self.inner.lookup_resource(criteria)
    }

    fn get_policy(&self, resource: &ResourceRef) -> CatalogResult<Policy> {
        self.record(Call::GetPolicy(resource.clone()));
        self.inner.get_policy(resource)
    }

    fn set_policy(&self, resource: &ResourceRef, policy: &Policy) -> CatalogResult<Policy> {
        self.record(Call::SetPolicy(resource.clone(), policy.clone()));
        if let Some(err) = self.set_policy_failure.borrow().clone() {
            return Err(err);
        }
        self.inner.set_policy(resource, policy)
    }

    fn create_tag(&self, parent: &ResourceRef, tag: &Tag) -> CatalogResult<Handle> {
        self.record(Call::CreateTag {
            parent: parent.clone(),
            tag: tag.clone(),
        });
        self.inner.create_tag(parent, tag)
    }

    fn search_catalog(&self, request: &SearchRequest) -> CatalogResult<SearchPage> {
        self.record(Call::Search(request.clone()));
        self.inner.search_catalog(request)
    }
}
