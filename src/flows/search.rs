//! Paged catalog search.
use crate::catalog::{CatalogService, SearchRequest, SearchResult, SearchScope};
use anyhow::{anyhow, Context, Result};

/// Collect results page by page until the service runs out or `limit` is hit.
pub fn collect(
    service: &dyn CatalogService,
    scope: SearchScope,
    query: &str,
    page_size: Option<u32>,
    limit: Option<usize>,
) -> Result<Vec<SearchResult>> {
    if scope.is_empty() {
        return Err(anyhow!(
            "search needs at least one --org or --scope-project"
        ));
    }
    let mut request = SearchRequest {
        scope,
        query: query.to_string(),
        page_size,
        page_token: None,
    };
    let mut results = Vec::new();
    let mut pages = 0usize;
    loop {
        let page = service
            .search_catalog(&request)
            .with_context(|| format!("search catalog page {}", pages + 1))?;
        pages += 1;
        results.extend(page.results);
        if limit.is_some_and(|limit| results.len() >= limit) {
            break;
        }
        match page.next_page_token.filter(|token| !token.is_empty()) {
            Some(token) if request.page_token.as_deref() != Some(token.as_str()) => {
                request.page_token = Some(token);
            }
            Some(token) => {
                return Err(anyhow!("search returned the same page token {token:?} twice"));
            }
            None => break,
        }
    }
    if let Some(limit) = limit {
        results.truncate(limit);
    }
    tracing::info!(query, pages, results = results.len(), "search complete");
    Ok(results)
}
