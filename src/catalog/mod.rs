//! Catalog service surface: names, payloads, errors and backends.
//!
//! Orchestration code only ever talks to [`CatalogService`]; the REST client
//! and the local emulator are interchangeable behind it.
mod error;
pub mod local;
mod names;
pub mod rest;
#[cfg(test)]
pub(crate) mod testing;
mod types;

pub use error::{CatalogError, CatalogResult, ErrorKind};
pub use names::{validate_short_id, ResourceRef};
pub use types::{
    Binding, ColumnSchema, Entry, EntryGroup, Handle, LookupCriteria, Policy, PrimitiveType,
    ResourceKind, ResourcePayload, Schema, SearchPage, SearchRequest, SearchResult, SearchScope,
    Tag, TagTemplate, TagTemplateField, TagValue,
};

/// Verbs consumed from the remote catalog/policy service.
///
/// Every method is a single blocking request/response call. Implementations
/// never retry.
pub trait CatalogService {
    /// Delete a resource. `force` also removes dependants (tags of a template).
    fn delete_resource(&self, name: &ResourceRef, force: bool) -> CatalogResult<()>;

    /// Create a resource with a caller-chosen id under `parent`.
    fn create_resource(
        &self,
        parent: &ResourceRef,
        id: &str,
        payload: &ResourcePayload,
    ) -> CatalogResult<Handle>;

    /// Resolve an existing entry.
    fn lookup_resource(&self, criteria: &LookupCriteria) -> CatalogResult<Handle>;

    fn get_policy(&self, resource: &ResourceRef) -> CatalogResult<Policy>;

    /// Replace the policy; the service echoes the stored policy back.
    fn set_policy(&self, resource: &ResourceRef, policy: &Policy) -> CatalogResult<Policy>;

    /// Attach a tag to an entry.
    fn create_tag(&self, parent: &ResourceRef, tag: &Tag) -> CatalogResult<Handle>;

    /// Fetch one page of search results.
    fn search_catalog(&self, request: &SearchRequest) -> CatalogResult<SearchPage>;
}
