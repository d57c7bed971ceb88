use std::sync::Arc;

use futures::future::join_all;

use crate::config::AppConfig;
use crate::models::{Event, EventPage, EventQuery};
use crate::providers::{self, EventProvider, ProviderError};

/// The one seam callers list and look up events through; which provider
/// answers is decided once, when the facade is built.
#[derive(Clone)]
pub struct Listing {
    provider: Arc<dyn EventProvider>,
}

impl Listing {
    pub fn new(provider: Arc<dyn EventProvider>) -> Self {
        Self { provider }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let provider = providers::select_provider(config);
        tracing::info!(provider = provider.name(), "event provider selected");
        Self::new(provider)
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn list_page(
        &self,
        query: &EventQuery,
        page: u32,
        page_size: u32,
    ) -> Result<EventPage, ProviderError> {
        if page_size == 0 {
            return Err(ProviderError::InvalidRequest(
                "page size must be positive".to_string(),
            ));
        }
        self.provider.list_page(query, page, page_size).await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Event>, ProviderError> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }
        self.provider.get_by_id(id).await
    }

    /// Looks every id up concurrently and keeps the ones that resolve, in
    /// input order. Ids that no longer resolve are dropped; the first failed
    /// lookup fails the whole resolution.
    pub async fn resolve_ids(&self, ids: &[String]) -> Result<Vec<Event>, ProviderError> {
        let lookups = ids.iter().map(|id| async move { (id, self.get_by_id(id).await) });
        let mut events = Vec::with_capacity(ids.len());
        for (id, result) in join_all(lookups).await {
            match result {
                Ok(Some(event)) => events.push(event),
                Ok(None) => tracing::warn!(id = %id, "favorite no longer resolves; skipping"),
                Err(err) => {
                    tracing::warn!(id = %id, "favorite lookup failed: {err}");
                    return Err(err);
                }
            }
        }
        Ok(events)
    }
}
