//! Paged result lists for one view: first page, next page, refresh.
//!
//! A [`Liveness`] token is captured when the feed is created. Once the view
//! is dismissed, results that arrive afterwards are dropped instead of
//! being applied to state nobody is looking at.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::listing::Listing;
use crate::models::{Event, EventQuery};
use crate::providers::ProviderError;

pub const DEFAULT_PAGE_SIZE: u32 = 30;

#[derive(Debug, Clone)]
pub struct Liveness {
    alive: Arc<AtomicBool>,
}

impl Default for Liveness {
    fn default() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl Liveness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dismiss(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { added: usize },
    /// Nothing requested: no first page yet, or the provider reported no more.
    Skipped,
    /// The view went away while the request was in flight.
    Discarded,
}

pub struct Feed {
    listing: Listing,
    query: EventQuery,
    page_size: u32,
    events: Vec<Event>,
    page: Option<u32>,
    has_more: bool,
    last_error: Option<String>,
    liveness: Liveness,
}

impl Feed {
    pub fn new(listing: Listing, query: EventQuery, page_size: u32) -> Self {
        Self {
            listing,
            query,
            page_size,
            events: Vec::new(),
            page: None,
            has_more: true,
            last_error: None,
            liveness: Liveness::new(),
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Index of the last page merged in, if any.
    pub fn page(&self) -> Option<u32> {
        self.page
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn query(&self) -> &EventQuery {
        &self.query
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    /// Replaces the feed with page 0. Earlier results stay put when this fails.
    pub async fn load_first(&mut self) -> Result<LoadOutcome, ProviderError> {
        self.last_error = None;
        let result = self.listing.list_page(&self.query, 0, self.page_size).await;
        if !self.liveness.is_alive() {
            tracing::debug!("view dismissed; dropping first page");
            return Ok(LoadOutcome::Discarded);
        }

        match result {
            Ok(page) => {
                let added = page.events.len();
                self.events = page.events;
                self.page = Some(0);
                self.has_more = page.has_more;
                Ok(LoadOutcome::Applied { added })
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn refresh(&mut self) -> Result<LoadOutcome, ProviderError> {
        self.load_first().await
    }

    /// Appends the following page. A failure keeps every page loaded so far.
    pub async fn load_next(&mut self) -> Result<LoadOutcome, ProviderError> {
        let Some(current) = self.page else {
            return Ok(LoadOutcome::Skipped);
        };
        if !self.has_more {
            return Ok(LoadOutcome::Skipped);
        }

        let next = current.saturating_add(1);
        let result = self.listing.list_page(&self.query, next, self.page_size).await;
        if !self.liveness.is_alive() {
            tracing::debug!(page = next, "view dismissed; dropping page");
            return Ok(LoadOutcome::Discarded);
        }

        match result {
            Ok(page) => {
                let added = page.events.len();
                self.events.extend(page.events);
                self.page = Some(next);
                self.has_more = page.has_more;
                Ok(LoadOutcome::Applied { added })
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::models::EventPage;
    use crate::providers::synthetic::SyntheticCatalog;
    use crate::providers::EventProvider;

    fn catalog(total: u64) -> SyntheticCatalog {
        let anchor = NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid anchor");
        SyntheticCatalog::with_anchor(total, anchor, chrono_tz::UTC)
    }

    /// Serves synthetic pages but fails every request numbered in `fail_pages`.
    struct ScriptedProvider {
        inner: SyntheticCatalog,
        fail_pages: Vec<u32>,
        calls: AtomicUsize,
        dismiss_on_call: Option<(usize, Liveness)>,
    }

    #[async_trait]
    impl EventProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn list_page(
            &self,
            query: &EventQuery,
            page: u32,
            page_size: u32,
        ) -> Result<EventPage, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((at, liveness)) = &self.dismiss_on_call {
                if *at == call {
                    liveness.dismiss();
                }
            }
            if self.fail_pages.contains(&page) {
                return Err(ProviderError::Status { status: 503 });
            }
            self.inner.list_page(query, page, page_size).await
        }

        async fn get_by_id(&self, id: &str) -> Result<Option<Event>, ProviderError> {
            self.inner.get_by_id(id).await
        }
    }

    fn scripted(total: u64, fail_pages: Vec<u32>) -> Arc<ScriptedProvider> {
        Arc::new(ScriptedProvider {
            inner: catalog(total),
            fail_pages,
            calls: AtomicUsize::new(0),
            dismiss_on_call: None,
        })
    }

    #[tokio::test]
    async fn appends_pages_until_exhausted() {
        let provider = scripted(7, Vec::new());
        let mut feed = Feed::new(Listing::new(provider.clone()), EventQuery::default(), 3);

        assert_eq!(feed.load_next().await.expect("nothing yet"), LoadOutcome::Skipped);
        assert_eq!(
            feed.load_first().await.expect("first"),
            LoadOutcome::Applied { added: 3 }
        );
        assert_eq!(
            feed.load_next().await.expect("second"),
            LoadOutcome::Applied { added: 3 }
        );
        assert_eq!(
            feed.load_next().await.expect("third"),
            LoadOutcome::Applied { added: 1 }
        );
        assert!(!feed.has_more());
        assert_eq!(feed.page(), Some(2));
        assert_eq!(feed.load_next().await.expect("exhausted"), LoadOutcome::Skipped);

        let ids: Vec<_> = feed.events().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["mock-0", "mock-1", "mock-2", "mock-3", "mock-4", "mock-5", "mock-6"]
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failed_next_page_keeps_loaded_results() {
        let mut feed = Feed::new(
            Listing::new(scripted(100, vec![1])),
            EventQuery::default(),
            5,
        );
        feed.load_first().await.expect("first page");

        let err = feed.load_next().await.expect_err("page 1 fails");
        assert_eq!(err.status(), Some(503));
        assert_eq!(feed.events().len(), 5);
        assert_eq!(feed.page(), Some(0));
        assert!(feed.has_more());
        assert_eq!(feed.last_error(), Some("ticketmaster error (503)"));
    }

    #[tokio::test]
    async fn refresh_resets_to_the_first_page() {
        let mut feed = Feed::new(Listing::new(scripted(100, Vec::new())), EventQuery::default(), 4);
        feed.load_first().await.expect("first");
        feed.load_next().await.expect("second");
        assert_eq!(feed.events().len(), 8);

        feed.refresh().await.expect("refresh");
        assert_eq!(feed.events().len(), 4);
        assert_eq!(feed.page(), Some(0));
        assert_eq!(feed.last_error(), None);
    }

    #[tokio::test]
    async fn dismissed_view_discards_in_flight_results() {
        let liveness = Liveness::new();
        let provider = Arc::new(ScriptedProvider {
            inner: catalog(100),
            fail_pages: Vec::new(),
            calls: AtomicUsize::new(0),
            dismiss_on_call: Some((2, liveness.clone())),
        });
        let mut feed = Feed::new(Listing::new(provider), EventQuery::default(), 10);
        feed.liveness = liveness;

        feed.load_first().await.expect("first");
        assert_eq!(
            feed.load_next().await.expect("discarded"),
            LoadOutcome::Discarded
        );
        assert_eq!(feed.events().len(), 10);
        assert_eq!(feed.page(), Some(0));
    }

    #[tokio::test]
    async fn liveness_clones_share_state() {
        let feed = Feed::new(
            Listing::new(scripted(10, Vec::new())),
            EventQuery::default(),
            DEFAULT_PAGE_SIZE,
        );
        let handle = feed.liveness();
        assert!(handle.is_alive());
        handle.dismiss();
        assert!(!feed.liveness().is_alive());
    }
}
