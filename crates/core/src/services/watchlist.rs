use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{Movie, Session, WATCHLIST_FIELD, WatchlistEntry, WatchlistStatus};
use crate::services::account_store::AccountStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchlistOutcome {
    Applied,
    /// Nothing to do; no remote call was made.
    Skipped,
}

/// One remote array element: decoded for display, plus the exact value the store holds.
///
/// The store removes by value, so removal sends `value` untouched, never a re-encoding
/// of `entry`.
struct Mirrored {
    entry: WatchlistEntry,
    value: Value,
}

impl Mirrored {
    fn decode(value: Value) -> Result<Self> {
        let entry = serde_json::from_value(value.clone())?;
        Ok(Self { entry, value })
    }
}

/// In-memory mirror of the signed-in user's watchlist.
///
/// The remote document is the source of truth. The mirror changes only after the
/// store confirms a mutation, and a failed call leaves it exactly as it was.
pub struct WatchlistSync {
    store: Arc<dyn AccountStore>,
    session: Option<Session>,
    entries: Vec<Mirrored>,
    status: WatchlistStatus,
}

impl WatchlistSync {
    pub fn new(store: Arc<dyn AccountStore>, session: Option<Session>) -> Self {
        Self {
            store,
            session,
            entries: Vec::new(),
            status: WatchlistStatus::Unloaded,
        }
    }

    pub fn entries(&self) -> Vec<&WatchlistEntry> {
        self.entries.iter().map(|m| &m.entry).collect()
    }

    pub fn status(&self) -> WatchlistStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == WatchlistStatus::Loading
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Local membership test; never calls the store.
    pub fn is_in_watchlist(&self, movie_id: i64) -> bool {
        self.entries.iter().any(|m| m.entry.id() == movie_id)
    }

    /// Switches to a newly signed-in user. The mirror is emptied until the next load.
    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
        self.entries.clear();
        self.status = WatchlistStatus::Unloaded;
    }

    /// Forgets the user and the mirror without contacting the store.
    pub fn sign_out(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!(uid = %session.uid(), "Watchlist cleared on sign-out");
        }
        self.entries.clear();
        self.status = WatchlistStatus::Unloaded;
    }

    /// Mirrors the remote watchlist, creating an empty one if the user has none.
    pub async fn load(&mut self) -> Result<WatchlistOutcome> {
        let Some(session) = self.session.clone() else {
            self.entries.clear();
            self.status = WatchlistStatus::Unloaded;
            return Ok(WatchlistOutcome::Skipped);
        };

        let previous = self.status;
        self.status = WatchlistStatus::Loading;

        match self.fetch(&session).await {
            Ok(entries) => {
                tracing::debug!(uid = %session.uid(), count = entries.len(), "Watchlist loaded");
                self.entries = entries;
                self.status = WatchlistStatus::Ready;
                Ok(WatchlistOutcome::Applied)
            }
            Err(e) => {
                tracing::error!(uid = %session.uid(), error = %e, "Error fetching watchlist");
                self.status = previous;
                Err(e)
            }
        }
    }

    /// Same as [`load`](Self::load); for pull-to-refresh.
    pub async fn reload(&mut self) -> Result<WatchlistOutcome> {
        self.load().await
    }

    async fn fetch(&self, session: &Session) -> Result<Vec<Mirrored>> {
        let document = self.store.get_document(session).await?;

        match document.and_then(|mut doc| doc.remove(WATCHLIST_FIELD)) {
            Some(Value::Array(items)) => items.into_iter().map(Mirrored::decode).collect(),
            _ => {
                let mut fields = Map::new();
                fields.insert(WATCHLIST_FIELD.to_string(), Value::Array(Vec::new()));
                self.store.merge_document(session, fields).await?;
                Ok(Vec::new())
            }
        }
    }

    /// Adds `movie` remotely, then to the mirror.
    ///
    /// Skipped without a session or when the movie is already mirrored.
    pub async fn add(&mut self, movie: Movie) -> Result<WatchlistOutcome> {
        let Some(session) = self.session.as_ref() else {
            return Ok(WatchlistOutcome::Skipped);
        };
        if self.is_in_watchlist(movie.id) {
            return Ok(WatchlistOutcome::Skipped);
        }

        let entry = WatchlistEntry::now(movie);
        let value = serde_json::to_value(&entry)?;

        if let Err(e) = self
            .store
            .array_union(session, WATCHLIST_FIELD, vec![value.clone()])
            .await
        {
            tracing::error!(movie_id = entry.id(), error = %e, "Error adding to watchlist");
            return Err(e);
        }

        self.entries.push(Mirrored { entry, value });
        Ok(WatchlistOutcome::Applied)
    }

    /// Removes every mirrored entry for `movie_id` remotely, then from the mirror.
    ///
    /// The store removes by value, so the mirrored elements are sent exactly as they were
    /// read. If the remote array no longer holds an equal value, the remote side is left
    /// as it is.
    pub async fn remove(&mut self, movie_id: i64) -> Result<WatchlistOutcome> {
        let Some(session) = self.session.as_ref() else {
            return Ok(WatchlistOutcome::Skipped);
        };
        let values: Vec<Value> = self
            .entries
            .iter()
            .filter(|m| m.entry.id() == movie_id)
            .map(|m| m.value.clone())
            .collect();
        if values.is_empty() {
            return Ok(WatchlistOutcome::Skipped);
        }

        if let Err(e) = self
            .store
            .array_remove(session, WATCHLIST_FIELD, values)
            .await
        {
            tracing::error!(movie_id, error = %e, "Error removing from watchlist");
            return Err(e);
        }

        self.entries.retain(|m| m.entry.id() != movie_id);
        Ok(WatchlistOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory_store::MemoryAccountStore;
    use crate::test_helpers::fixtures;
    use serde_json::json;

    async fn setup() -> (Arc<MemoryAccountStore>, WatchlistSync) {
        let store = Arc::new(MemoryAccountStore::new());
        let user = store.sign_up("ada@example.com", "hunter22").await.unwrap();
        let sync = WatchlistSync::new(store.clone(), Some(Session::new(user)));
        (store, sync)
    }

    fn remote_ids(store: &MemoryAccountStore, sync: &WatchlistSync) -> Vec<i64> {
        let uid = sync.session().unwrap().uid();
        store.document(uid).unwrap()[WATCHLIST_FIELD]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_load_initializes_missing_watchlist() {
        let (store, mut sync) = setup().await;
        let uid = sync.session().unwrap().uid().to_string();
        store.put_document(&uid, json!({ "displayName": "Ada" }).as_object().cloned().unwrap());

        sync.load().await.unwrap();

        assert_eq!(sync.status(), WatchlistStatus::Ready);
        assert!(sync.entries().is_empty());
        let document = store.document(&uid).unwrap();
        assert_eq!(document[WATCHLIST_FIELD], json!([]));
        assert_eq!(document["displayName"], "Ada");
    }

    #[tokio::test]
    async fn test_load_mirrors_remote_array_verbatim() {
        let (store, mut sync) = setup().await;
        let uid = sync.session().unwrap().uid().to_string();
        let first = WatchlistEntry {
            movie: fixtures::movie(2, "Arrival"),
            added_at: "2024-01-01T00:00:00.000Z".to_string(),
        };
        let second = WatchlistEntry {
            movie: fixtures::movie(1, "Dune"),
            added_at: "2024-01-02T00:00:00.000Z".to_string(),
        };
        store.put_document(
            &uid,
            json!({ "watchlist": [first, second] }).as_object().cloned().unwrap(),
        );

        sync.load().await.unwrap();

        assert_eq!(sync.entries(), vec![&first, &second]);
        assert!(sync.is_in_watchlist(1));
        assert!(!sync.is_in_watchlist(3));
    }

    #[tokio::test]
    async fn test_remove_sends_stored_value_unchanged() {
        let (store, mut sync) = setup().await;
        let uid = sync.session().unwrap().uid().to_string();
        store.put_document(
            &uid,
            json!({
                "watchlist": [{
                    "id": 550,
                    "title": "Fight Club",
                    "posterPath": null,
                    "backdropPath": null,
                    "releaseDate": "1999-10-15",
                    "voteAverage": 8,
                    "overview": "",
                    "mediaType": "movie",
                    "addedAt": "2024-01-01T00:00:00.000Z"
                }]
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        sync.load().await.unwrap();
        assert_eq!(sync.entries()[0].movie.vote_average, 8.0);

        assert_eq!(sync.remove(550).await.unwrap(), WatchlistOutcome::Applied);

        assert!(sync.entries().is_empty());
        assert!(remote_ids(&store, &sync).is_empty());
        sync.reload().await.unwrap();
        assert!(!sync.is_in_watchlist(550));
    }

    #[tokio::test]
    async fn test_remove_clears_duplicate_ids() {
        let (store, mut sync) = setup().await;
        let uid = sync.session().unwrap().uid().to_string();
        let entry = |added_at: &str| WatchlistEntry {
            movie: fixtures::movie(1, "Dune"),
            added_at: added_at.to_string(),
        };
        store.put_document(
            &uid,
            json!({ "watchlist": [entry("2024-01-01T00:00:00.000Z"), entry("2024-02-01T00:00:00.000Z")] })
                .as_object()
                .cloned()
                .unwrap(),
        );
        sync.load().await.unwrap();

        sync.remove(1).await.unwrap();

        assert!(sync.entries().is_empty());
        assert!(remote_ids(&store, &sync).is_empty());
    }

    #[tokio::test]
    async fn test_add_then_remove_round_trip() {
        let (store, mut sync) = setup().await;
        sync.load().await.unwrap();
        let before = sync.entries().len();

        sync.add(fixtures::movie(438631, "Dune")).await.unwrap();
        assert!(sync.is_in_watchlist(438631));
        assert_eq!(remote_ids(&store, &sync), vec![438631]);

        sync.remove(438631).await.unwrap();
        assert!(!sync.is_in_watchlist(438631));
        assert_eq!(sync.entries().len(), before);
        assert!(remote_ids(&store, &sync).is_empty());
    }

    #[tokio::test]
    async fn test_adding_twice_keeps_one_entry() {
        let (store, mut sync) = setup().await;
        sync.load().await.unwrap();
        let movie = fixtures::movie(603, "The Matrix");

        assert_eq!(sync.add(movie.clone()).await.unwrap(), WatchlistOutcome::Applied);
        assert_eq!(sync.add(movie).await.unwrap(), WatchlistOutcome::Skipped);

        assert_eq!(sync.entries().len(), 1);
        assert_eq!(remote_ids(&store, &sync), vec![603]);
    }

    #[tokio::test]
    async fn test_failed_add_leaves_mirror_unchanged() {
        let (store, mut sync) = setup().await;
        sync.load().await.unwrap();

        store.fail_next_call();
        assert!(sync.add(fixtures::movie(1, "Dune")).await.is_err());

        assert!(sync.entries().is_empty());
        assert!(remote_ids(&store, &sync).is_empty());
    }

    #[tokio::test]
    async fn test_failed_remove_leaves_mirror_unchanged() {
        let (store, mut sync) = setup().await;
        sync.load().await.unwrap();
        sync.add(fixtures::movie(1, "Dune")).await.unwrap();

        store.fail_next_call();
        assert!(sync.remove(1).await.is_err());

        assert!(sync.is_in_watchlist(1));
        assert_eq!(remote_ids(&store, &sync), vec![1]);
    }

    #[tokio::test]
    async fn test_remove_unknown_id_makes_no_call() {
        let (store, mut sync) = setup().await;
        sync.load().await.unwrap();
        let calls = store.call_count();

        assert_eq!(sync.remove(42).await.unwrap(), WatchlistOutcome::Skipped);
        assert_eq!(store.call_count(), calls);
    }

    #[tokio::test]
    async fn test_remove_after_drift_keeps_remote_entry() {
        let (store, mut sync) = setup().await;
        sync.load().await.unwrap();
        sync.add(fixtures::movie(1, "Dune")).await.unwrap();

        // Another device re-added the movie with a different timestamp.
        let uid = sync.session().unwrap().uid().to_string();
        let drifted = WatchlistEntry {
            movie: fixtures::movie(1, "Dune"),
            added_at: "1999-01-01T00:00:00.000Z".to_string(),
        };
        store.put_document(
            &uid,
            json!({ "watchlist": [drifted] }).as_object().cloned().unwrap(),
        );

        sync.remove(1).await.unwrap();

        assert!(!sync.is_in_watchlist(1));
        assert_eq!(remote_ids(&store, &sync), vec![1]);

        sync.reload().await.unwrap();
        assert_eq!(sync.entries(), vec![&drifted]);
    }

    #[tokio::test]
    async fn test_signed_out_operations_are_skipped() {
        let store = Arc::new(MemoryAccountStore::new());
        let mut sync = WatchlistSync::new(store.clone(), None);

        assert_eq!(
            sync.add(fixtures::movie(1, "Dune")).await.unwrap(),
            WatchlistOutcome::Skipped
        );
        assert_eq!(sync.remove(1).await.unwrap(), WatchlistOutcome::Skipped);
        assert_eq!(sync.load().await.unwrap(), WatchlistOutcome::Skipped);
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_sign_out_empties_without_remote_calls() {
        let (store, mut sync) = setup().await;
        sync.load().await.unwrap();
        sync.add(fixtures::movie(1, "Dune")).await.unwrap();
        let calls = store.call_count();

        sync.sign_out();

        assert_eq!(sync.status(), WatchlistStatus::Unloaded);
        assert!(sync.entries().is_empty());
        assert!(sync.session().is_none());
        assert_eq!(store.call_count(), calls);
    }

    #[tokio::test]
    async fn test_switching_user_empties_mirror() {
        let (store, mut sync) = setup().await;
        sync.load().await.unwrap();
        sync.add(fixtures::movie(1, "Dune")).await.unwrap();
        let other = store.sign_up("grace@example.com", "hunter22").await.unwrap();
        let calls = store.call_count();

        sync.set_session(Session::new(other.clone()));

        assert!(sync.entries().is_empty());
        assert_eq!(sync.status(), WatchlistStatus::Unloaded);
        assert_eq!(store.call_count(), calls);

        sync.load().await.unwrap();
        assert_eq!(sync.session().unwrap().uid(), other.uid);
        assert!(!sync.is_in_watchlist(1));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_state() {
        let (store, mut sync) = setup().await;
        sync.load().await.unwrap();
        sync.add(fixtures::movie(7, "Heat")).await.unwrap();

        store.fail_next_call();
        assert!(sync.reload().await.is_err());

        assert_eq!(sync.status(), WatchlistStatus::Ready);
        assert!(sync.is_in_watchlist(7));
    }
}
