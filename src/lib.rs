mod config;
mod db;
mod favorites;
pub mod feed;
mod listing;
mod models;
pub mod providers;
mod utils;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

pub use config::{AppConfig, ProviderKind, DEFAULT_TOTAL_EVENTS};
pub use db::{load_json, save_json, KeyValueStore, MemoryStore, SqliteStore, StorageError};
pub use favorites::{FavoriteIds, FavoritesPersistence, FavoritesStore, KvFavorites, FAVORITES_KEY};
pub use feed::{Feed, LoadOutcome, Liveness};
pub use listing::Listing;
pub use models::{Event, EventCategory, EventPage, EventQuery, ParseCategoryError};
pub use providers::{EventProvider, ProviderError};
pub use utils::{format_event_datetime, format_event_datetime_in};

/// Everything a front end needs: paged listing, lookup and favorites.
pub struct EventsApp {
    listing: Listing,
    favorites: FavoritesStore,
}

impl EventsApp {
    pub fn new(listing: Listing, favorites: FavoritesStore) -> Self {
        Self { listing, favorites }
    }

    /// Selects the provider, opens the local store and hydrates favorites.
    pub async fn bootstrap(config: &AppConfig) -> anyhow::Result<Self> {
        let path = config.database_path();
        let store = SqliteStore::open(&path)
            .with_context(|| format!("failed to open local store at {}", path.display()))?;
        let favorites = FavoritesStore::new(Arc::new(KvFavorites::new(Arc::new(store))));
        let app = Self::new(Listing::from_config(config), favorites);
        app.hydrate_favorites().await;
        Ok(app)
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    pub async fn list_page(
        &self,
        query: &EventQuery,
        page: u32,
        page_size: u32,
    ) -> Result<EventPage, ProviderError> {
        self.listing.list_page(query, page, page_size).await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Event>, ProviderError> {
        self.listing.get_by_id(id).await
    }

    pub fn feed(&self, query: EventQuery, page_size: u32) -> Feed {
        Feed::new(self.listing.clone(), query, page_size)
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.is_favorite(id)
    }

    pub fn toggle_favorite(&self, id: &str) -> bool {
        self.favorites.toggle(id)
    }

    pub async fn hydrate_favorites(&self) {
        self.favorites.hydrate().await;
    }

    /// Resolves every favorite id through the active provider; ids that no
    /// longer resolve are left out, lookup failures are returned.
    pub async fn favorite_events(&self) -> Result<Vec<Event>, ProviderError> {
        let ids = self.favorites.ids();
        self.listing.resolve_ids(&ids).await
    }

    pub async fn shutdown(&self) {
        self.favorites.flush().await;
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
