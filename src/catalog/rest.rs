//! Catalog backend that talks to the Data Catalog v1 REST API.
//!
//! Requests are blocking and carry a bearer token read from configuration.
//! The agent is configured not to treat HTTP error statuses as transport
//! errors so the service's JSON error body can be mapped onto
//! [`CatalogError`] kinds.
use super::error::{CatalogError, CatalogResult};
use super::{
    CatalogService, Handle, LookupCriteria, Policy, ResourceKind, ResourcePayload, ResourceRef,
    SearchPage, SearchRequest, Tag,
};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use ureq::http::Response;
use ureq::{Agent, Body};

pub const DEFAULT_ENDPOINT: &str = "https://datacatalog.googleapis.com/v1";
/// Highest policy version; asking for it makes the service return conditions.
const POLICY_VERSION: i32 = 3;

#[derive(Clone)]
pub struct RestCatalog {
    agent: Agent,
    endpoint: String,
    bearer: String,
}

impl RestCatalog {
    pub fn new(endpoint: &str, access_token: &str, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bearer: format!("Bearer {}", access_token.trim()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    fn post_json<T: DeserializeOwned>(
        &self,
        entity: &str,
        url: String,
        query: Option<(&str, &str)>,
        body: &Value,
    ) -> CatalogResult<T> {
        let start = Instant::now();
        let mut request = self
            .agent
            .post(&url)
            .header("Authorization", self.bearer.as_str());
        if let Some((key, value)) = query {
            request = request.query(key, value);
        }
        let result = request.send_json(body);
        tracing::debug!(
            method = "POST",
            url = %url,
            elapsed_ms = start.elapsed().as_millis(),
            "catalog request complete"
        );
        decode(entity, result)
    }
}

impl CatalogService for RestCatalog {
    fn delete_resource(&self, name: &ResourceRef, force: bool) -> CatalogResult<()> {
        let url = self.url(name.as_str());
        let mut request = self
            .agent
            .delete(&url)
            .header("Authorization", self.bearer.as_str());
        if force {
            request = request.query("force", "true");
        }
        let _: IgnoredAny = decode(name.as_str(), request.call())?;
        tracing::debug!(method = "DELETE", url = %url, force, "catalog request complete");
        Ok(())
    }

    fn create_resource(
        &self,
        parent: &ResourceRef,
        id: &str,
        payload: &ResourcePayload,
    ) -> CatalogResult<Handle> {
        let kind = payload.kind();
        let entity = format!("{parent}/{}/{id}", kind.collection());
        let url = self.url(&format!("{parent}/{}", kind.collection()));
        let query = kind.id_param().map(|param| (param, id));
        let body = payload_body(payload)?;
        let created: NamedResource = self.post_json(&entity, url, query, &body)?;
        Ok(Handle::new(kind, created.resource_ref()?))
    }

    fn lookup_resource(&self, criteria: &LookupCriteria) -> CatalogResult<Handle> {
        let url = self.url("entries:lookup");
        let request = self
            .agent
            .get(&url)
            .header("Authorization", self.bearer.as_str());
        let request = match criteria {
            LookupCriteria::LinkedResource(uri) => request.query("linkedResource", uri),
        };
        let found: NamedResource = decode(&criteria.to_string(), request.call())?;
        tracing::debug!(method = "GET", url = %url, "catalog request complete");
        Ok(Handle::new(ResourceKind::Entry, found.resource_ref()?))
    }

    fn get_policy(&self, resource: &ResourceRef) -> CatalogResult<Policy> {
        let url = self.url(&format!("{resource}:getIamPolicy"));
        let body = json!({ "options": { "requestedPolicyVersion": POLICY_VERSION } });
        self.post_json(resource.as_str(), url, None, &body)
    }

    fn set_policy(&self, resource: &ResourceRef, policy: &Policy) -> CatalogResult<Policy> {
        let url = self.url(&format!("{resource}:setIamPolicy"));
        let body = json!({ "policy": policy });
        self.post_json(resource.as_str(), url, None, &body)
    }

    fn create_tag(&self, parent: &ResourceRef, tag: &Tag) -> CatalogResult<Handle> {
        let url = self.url(&format!("{parent}/tags"));
        let body = serde_json::to_value(tag)
            .map_err(|err| CatalogError::Other(format!("failed to serialize tag: {err}")))?;
        let created: NamedResource = self.post_json(parent.as_str(), url, None, &body)?;
        Ok(Handle::new(ResourceKind::Tag, created.resource_ref()?))
    }

    fn search_catalog(&self, request: &SearchRequest) -> CatalogResult<SearchPage> {
        let url = self.url("catalog:search");
        let body = serde_json::to_value(request).map_err(|err| {
            CatalogError::Other(format!("failed to serialize search request: {err}"))
        })?;
        self.post_json("catalog search", url, None, &body)
    }
}

fn payload_body(payload: &ResourcePayload) -> CatalogResult<Value> {
    let encoded = match payload {
        ResourcePayload::EntryGroup(group) => serde_json::to_value(group),
        ResourcePayload::Entry(entry) => serde_json::to_value(entry),
        ResourcePayload::TagTemplate(template) => serde_json::to_value(template),
    };
    encoded.map_err(|err| {
        CatalogError::Other(format!(
            "failed to serialize {} payload: {err}",
            payload.kind()
        ))
    })
}

fn decode<T: DeserializeOwned>(
    entity: &str,
    result: Result<Response<Body>, ureq::Error>,
) -> CatalogResult<T> {
    let mut response = result
        .map_err(|err| CatalogError::Other(format!("http request for {entity} failed: {err}")))?;
    let status = response.status();
    let text = response.body_mut().read_to_string().map_err(|err| {
        CatalogError::Other(format!("failed to read response for {entity}: {err}"))
    })?;
    if !status.is_success() {
        return Err(map_error_body(status.as_u16(), entity, &text));
    }
    let text = if text.trim().is_empty() { "null" } else { &text };
    serde_json::from_str(text).map_err(|err| {
        CatalogError::Other(format!(
            "failed to decode response for {entity}: {err}; body={text}"
        ))
    })
}

/// Translate a service error body into the shared taxonomy.
///
/// The canonical `status` string wins over the HTTP code because 409 is used
/// for both `ALREADY_EXISTS` and `ABORTED`.
pub(crate) fn map_error_body(http_status: u16, entity: &str, body: &str) -> CatalogError {
    let parsed: Option<ErrorEnvelope> = serde_json::from_str(body).ok();
    let (status, message) = match parsed {
        Some(envelope) => (envelope.error.status, envelope.error.message),
        None => (String::new(), body.trim().to_string()),
    };
    match (status.as_str(), http_status) {
        ("NOT_FOUND", _) => CatalogError::not_found(entity),
        ("ALREADY_EXISTS", _) => CatalogError::already_exists(entity),
        ("INVALID_ARGUMENT", _) => CatalogError::invalid(message),
        ("ABORTED" | "FAILED_PRECONDITION", _) => CatalogError::Conflict {
            entity: entity.to_string(),
            message,
        },
        ("", 404) => CatalogError::not_found(entity),
        ("", 409) => CatalogError::already_exists(entity),
        ("", 400) => CatalogError::invalid(message),
        ("", 412) => CatalogError::Conflict {
            entity: entity.to_string(),
            message,
        },
        (status, code) => {
            let label = if status.is_empty() { "UNKNOWN" } else { status };
            CatalogError::Other(format!("{entity}: {code} {label} {message}"))
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

#[derive(Deserialize)]
struct NamedResource {
    name: String,
}

impl NamedResource {
    fn resource_ref(&self) -> CatalogResult<ResourceRef> {
        ResourceRef::parse(&self.name)
    }
}

#[cfg(test)]
#[path = "rest_tests.rs"]
mod tests;
