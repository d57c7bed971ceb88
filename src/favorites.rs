use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::db::{self, KeyValueStore, StorageError};

pub const FAVORITES_KEY: &str = "favorites:v1";

/// Read-only view of the favorite ids, oldest favorite first.
pub type FavoriteIds = Arc<Vec<String>>;

#[async_trait]
pub trait FavoritesPersistence: Send + Sync {
    async fn load(&self) -> Result<Vec<String>, StorageError>;
    async fn save(&self, ids: Vec<String>) -> Result<(), StorageError>;
}

/// Keeps the id list as a JSON array under [`FAVORITES_KEY`].
pub struct KvFavorites {
    store: Arc<dyn KeyValueStore>,
}

impl KvFavorites {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FavoritesPersistence for KvFavorites {
    async fn load(&self) -> Result<Vec<String>, StorageError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            db::load_json(store.as_ref(), FAVORITES_KEY, Vec::<String>::new())
        })
        .await
        .map_err(|err| StorageError::Task(err.to_string()))
    }

    async fn save(&self, ids: Vec<String>) -> Result<(), StorageError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || db::save_json(store.as_ref(), FAVORITES_KEY, &ids))
            .await
            .map_err(|err| StorageError::Task(err.to_string()))?
    }
}

/// Owns the canonical favorites set for the session.
///
/// Mutations apply in memory at once and are published to subscribers; the
/// write of the full set back to storage is spawned and never awaited by the
/// mutator. Write failures are logged and otherwise ignored, and writes from
/// quick successive toggles may land out of order.
pub struct FavoritesStore {
    state: watch::Sender<FavoriteIds>,
    persistence: Arc<dyn FavoritesPersistence>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl FavoritesStore {
    pub fn new(persistence: Arc<dyn FavoritesPersistence>) -> Self {
        let (state, _) = watch::channel(FavoriteIds::default());
        Self {
            state,
            persistence,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the in-memory set with whatever storage holds; empty on failure.
    pub async fn hydrate(&self) {
        let stored = match self.persistence.load().await {
            Ok(ids) => ids,
            Err(err) => {
                tracing::warn!("failed to load favorites: {err}");
                Vec::new()
            }
        };

        let mut ids: Vec<String> = Vec::with_capacity(stored.len());
        for id in stored {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        tracing::debug!(count = ids.len(), "favorites hydrated");
        self.state.send_replace(Arc::new(ids));
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.state.borrow().iter().any(|existing| existing == id)
    }

    pub fn ids(&self) -> FavoriteIds {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FavoriteIds> {
        self.state.subscribe()
    }

    /// Adds `id` if absent, removes it if present. Returns whether it is now a favorite.
    pub fn toggle(&self, id: &str) -> bool {
        let mut now_favorite = false;
        let mut snapshot = Vec::new();
        self.state.send_modify(|current| {
            let ids = Arc::make_mut(current);
            match ids.iter().position(|existing| existing == id) {
                Some(index) => {
                    ids.remove(index);
                }
                None => {
                    ids.push(id.to_string());
                    now_favorite = true;
                }
            }
            snapshot = ids.clone();
        });
        self.persist(snapshot);
        now_favorite
    }

    /// Waits for writes spawned so far. Only needed before the process exits.
    pub async fn flush(&self) {
        let handles = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };
        for handle in handles {
            if let Err(err) = handle.await {
                tracing::warn!("favorites write task failed: {err}");
            }
        }
    }

    fn persist(&self, ids: Vec<String>) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("no async runtime; favorites change not persisted");
            return;
        };
        let persistence = Arc::clone(&self.persistence);
        let handle = runtime.spawn(async move {
            if let Err(err) = persistence.save(ids).await {
                tracing::warn!("failed to persist favorites: {err}");
            }
        });
        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|task| !task.is_finished());
            pending.push(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[derive(Default)]
    struct RecordingPersistence {
        initial: Vec<String>,
        fail_load: bool,
        fail_save: bool,
        saves: Mutex<Vec<Vec<String>>>,
    }

    impl RecordingPersistence {
        fn saves(&self) -> Vec<Vec<String>> {
            self.saves.lock().expect("saves lock").clone()
        }
    }

    #[async_trait]
    impl FavoritesPersistence for RecordingPersistence {
        async fn load(&self) -> Result<Vec<String>, StorageError> {
            if self.fail_load {
                return Err(StorageError::Task("disk unavailable".to_string()));
            }
            Ok(self.initial.clone())
        }

        async fn save(&self, ids: Vec<String>) -> Result<(), StorageError> {
            self.saves.lock().expect("saves lock").push(ids);
            if self.fail_save {
                return Err(StorageError::Task("disk full".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn double_toggle_restores_membership_with_one_write_each() {
        let persistence = Arc::new(RecordingPersistence::default());
        let store = FavoritesStore::new(persistence.clone());

        assert!(store.toggle("mock-7"));
        assert!(store.is_favorite("mock-7"));
        assert!(!store.toggle("mock-7"));
        assert!(!store.is_favorite("mock-7"));

        store.flush().await;
        let mut saves = persistence.saves();
        saves.sort_by_key(Vec::len);
        assert_eq!(saves, vec![Vec::<String>::new(), vec!["mock-7".to_string()]]);
        assert!(store.ids().is_empty());
    }

    #[tokio::test]
    async fn hydrate_loads_and_dedupes_stored_ids() {
        let persistence = Arc::new(RecordingPersistence {
            initial: vec!["a".to_string(), "b".to_string(), "a".to_string()],
            ..RecordingPersistence::default()
        });
        let store = FavoritesStore::new(persistence.clone());
        store.hydrate().await;

        assert_eq!(*store.ids(), vec!["a".to_string(), "b".to_string()]);
        assert!(store.is_favorite("b"));
        assert!(persistence.saves().is_empty());
    }

    #[tokio::test]
    async fn failed_load_hydrates_an_empty_set() {
        let store = FavoritesStore::new(Arc::new(RecordingPersistence {
            fail_load: true,
            ..RecordingPersistence::default()
        }));
        store.hydrate().await;
        assert!(store.ids().is_empty());
    }

    #[tokio::test]
    async fn failed_writes_are_swallowed() {
        let persistence = Arc::new(RecordingPersistence {
            fail_save: true,
            ..RecordingPersistence::default()
        });
        let store = FavoritesStore::new(persistence.clone());

        assert!(store.toggle("mock-1"));
        store.flush().await;

        assert!(store.is_favorite("mock-1"));
        assert_eq!(persistence.saves().len(), 1);
    }

    #[tokio::test]
    async fn subscribers_see_every_change() {
        let store = FavoritesStore::new(Arc::new(RecordingPersistence::default()));
        let mut updates = store.subscribe();

        store.toggle("x");
        assert!(updates.has_changed().expect("sender alive"));
        assert_eq!(*updates.borrow_and_update().clone(), vec!["x".to_string()]);

        store.toggle("y");
        store.toggle("x");
        assert_eq!(*updates.borrow_and_update().clone(), vec!["y".to_string()]);
    }

    #[test]
    fn toggling_outside_a_runtime_still_updates_memory() {
        let store = FavoritesStore::new(Arc::new(RecordingPersistence::default()));
        assert!(store.toggle("offline"));
        assert!(store.is_favorite("offline"));
    }

    #[tokio::test]
    async fn kv_persistence_round_trips_through_storage() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let first = FavoritesStore::new(Arc::new(KvFavorites::new(Arc::clone(&kv))));
        first.hydrate().await;
        first.toggle("mock-3");
        first.flush().await;
        first.toggle("G5vYZ9");
        first.flush().await;

        let second = FavoritesStore::new(Arc::new(KvFavorites::new(kv)));
        second.hydrate().await;
        assert!(second.is_favorite("mock-3"));
        assert!(second.is_favorite("G5vYZ9"));
    }
}
