pub mod base;
pub mod synthetic;
pub mod ticketmaster;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{AppConfig, ProviderKind};
use crate::models::{Event, EventPage, EventQuery};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("ticketmaster error ({status})")]
    Status { status: u16 },
    #[error("http error: {0}")]
    Http(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Status { status } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// One data source able to answer listing and lookup requests.
#[async_trait]
pub trait EventProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn list_page(
        &self,
        query: &EventQuery,
        page: u32,
        page_size: u32,
    ) -> Result<EventPage, ProviderError>;

    /// `Ok(None)` when the id does not resolve under this provider's id rules.
    async fn get_by_id(&self, id: &str) -> Result<Option<Event>, ProviderError>;
}

pub fn select_provider(config: &AppConfig) -> Arc<dyn EventProvider> {
    match config.provider() {
        ProviderKind::Ticketmaster => Arc::new(ticketmaster::TicketmasterClient::from_config(config)),
        ProviderKind::Synthetic => {
            if config.requested_provider == ProviderKind::Ticketmaster {
                tracing::warn!("ticketmaster selected without an api key; using synthetic events");
            }
            Arc::new(synthetic::SyntheticCatalog::from_config(config))
        }
    }
}
