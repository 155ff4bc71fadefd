//! Directory service
//!
//! Refreshes a session's friend and potential-friend lists from the
//! user directory, and manages friend edges.
//!
//! Every refresh is a serial two-phase pipeline: resolve the caller's
//! friend ids, then scan the whole directory and partition it
//! client-side. A list in the session cache is replaced only once both
//! phases have succeeded, so a failed refresh leaves the previous
//! contents in place.

use std::collections::HashSet;
use std::sync::Arc;

use crate::data::{Filter, Friend, Item, RecordStore, SessionCache, User, map_scan};
use crate::error::AppError;
use crate::metrics::REFRESHES_TOTAL;

use super::RelationshipResolver;

/// Which lists a refresh rebuilds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pipeline {
    Friends,
    PotentialFriends,
    Directory,
}

impl Pipeline {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Friends => "friends",
            Self::PotentialFriends => "potential_friends",
            Self::Directory => "directory",
        }
    }
}

/// Directory partitioned around one user
#[derive(Debug, Default)]
struct Partition {
    friends: Vec<User>,
    potential_friends: Vec<User>,
}

/// Split `directory` into friends and everyone else, keeping scan order
///
/// `current_user_id` is never a potential friend. It is only listed as
/// a friend when it has an edge to itself.
fn partition(directory: Vec<User>, friend_ids: &HashSet<String>, current_user_id: &str) -> Partition {
    let mut partition = Partition::default();
    for user in directory {
        if friend_ids.contains(&user.id) {
            partition.friends.push(user);
        } else if user.id != current_user_id {
            partition.potential_friends.push(user);
        }
    }
    partition
}

/// Directory service
pub struct DirectoryService {
    store: Arc<dyn RecordStore>,
    resolver: RelationshipResolver,
    users_table: String,
    friends_table: String,
}

impl DirectoryService {
    /// Create new directory service
    pub fn new(
        store: Arc<dyn RecordStore>,
        users_table: impl Into<String>,
        friends_table: impl Into<String>,
    ) -> Self {
        let friends_table = friends_table.into();
        Self {
            resolver: RelationshipResolver::new(store.clone(), friends_table.clone()),
            store,
            users_table: users_table.into(),
            friends_table,
        }
    }

    /// Access the relationship resolver
    pub fn resolver(&self) -> &RelationshipResolver {
        &self.resolver
    }

    // =========================================================================
    // Refresh pipelines
    // =========================================================================

    /// Refresh the friend list of `session`
    ///
    /// A user with no edges gets an empty list without the directory
    /// being scanned.
    ///
    /// # Errors
    /// Resolver or scan errors, unchanged. The cached list is untouched
    /// on error.
    pub async fn refresh_friend_list(
        &self,
        session: &SessionCache,
        user_id: &str,
    ) -> Result<(), AppError> {
        let result = self.run(Pipeline::Friends, session, user_id).await;
        Self::observe(Pipeline::Friends, user_id, &result);
        result
    }

    /// Refresh the potential-friend list of `session`
    ///
    /// Potential friends are all directory users who are neither
    /// `current_user_id` nor among its friends.
    ///
    /// # Errors
    /// Resolver or scan errors, unchanged. The cached list is untouched
    /// on error.
    pub async fn refresh_potential_friend_list(
        &self,
        session: &SessionCache,
        current_user_id: &str,
    ) -> Result<(), AppError> {
        let result = self
            .run(Pipeline::PotentialFriends, session, current_user_id)
            .await;
        Self::observe(Pipeline::PotentialFriends, current_user_id, &result);
        result
    }

    /// Refresh both lists from a single resolve and a single scan
    pub async fn refresh_directory(
        &self,
        session: &SessionCache,
        current_user_id: &str,
    ) -> Result<(), AppError> {
        let result = self
            .run(Pipeline::Directory, session, current_user_id)
            .await;
        Self::observe(Pipeline::Directory, current_user_id, &result);
        result
    }

    async fn run(
        &self,
        pipeline: Pipeline,
        session: &SessionCache,
        user_id: &str,
    ) -> Result<(), AppError> {
        // Phase 1: friend edges
        let friend_ids: HashSet<String> = self
            .resolver
            .resolve_friend_ids(user_id)
            .await?
            .into_iter()
            .collect();

        if pipeline == Pipeline::Friends && friend_ids.is_empty() {
            tracing::debug!(user_id = %user_id, "User has no friends; skipping directory scan");
            session.replace_friend_list(Vec::new()).await;
            return Ok(());
        }

        // Phase 2: whole directory, filtered here
        let directory = self.scan_directory().await?;
        let Partition {
            friends,
            potential_friends,
        } = partition(directory, &friend_ids, user_id);

        tracing::debug!(
            user_id = %user_id,
            pipeline = pipeline.as_str(),
            friends = friends.len(),
            potential_friends = potential_friends.len(),
            "Directory partitioned"
        );

        match pipeline {
            Pipeline::Friends => session.replace_friend_list(friends).await,
            Pipeline::PotentialFriends => {
                session
                    .replace_potential_friend_list(potential_friends)
                    .await
            }
            Pipeline::Directory => {
                session.replace_friend_list(friends).await;
                session
                    .replace_potential_friend_list(potential_friends)
                    .await;
            }
        }

        Ok(())
    }

    async fn scan_directory(&self) -> Result<Vec<User>, AppError> {
        let records = self.store.scan(&self.users_table, &Filter::all()).await?;
        Ok(map_scan(&self.users_table, records))
    }

    fn observe(pipeline: Pipeline, user_id: &str, result: &Result<(), AppError>) {
        match result {
            Ok(()) => {
                REFRESHES_TOTAL
                    .with_label_values(&[pipeline.as_str(), "success"])
                    .inc();
            }
            Err(error) => {
                REFRESHES_TOTAL
                    .with_label_values(&[pipeline.as_str(), "error"])
                    .inc();
                error.record();
                tracing::warn!(
                    user_id = %user_id,
                    pipeline = pipeline.as_str(),
                    %error,
                    "Directory refresh failed"
                );
            }
        }
    }

    // =========================================================================
    // Edges and lookups
    // =========================================================================

    /// Add a directed friend edge `current_user_id -> friend_user_id`
    ///
    /// Always writes a new edge with a fresh id: calling twice for the
    /// same pair stores two edges, and the reverse edge is never created.
    ///
    /// # Returns
    /// The stored edge
    pub async fn add_friend(
        &self,
        current_user_id: &str,
        friend_user_id: &str,
    ) -> Result<Friend, AppError> {
        if current_user_id.is_empty() || friend_user_id.is_empty() {
            return Err(AppError::Validation(
                "both user ids are required to add a friend".to_string(),
            ));
        }

        let edge = Friend::new(current_user_id, friend_user_id);
        self.store
            .put(&self.friends_table, edge.to_record())
            .await?;

        tracing::info!(
            edge_id = %edge.id,
            user_id = %current_user_id,
            friend_id = %friend_user_id,
            "Friend edge added"
        );
        Ok(edge)
    }

    /// Get a single user by id
    ///
    /// # Errors
    /// `NotFound` when no such key exists, `MalformedRecord` when the
    /// stored item cannot be mapped, store errors unchanged
    pub async fn get_user(&self, user_id: &str) -> Result<User, AppError> {
        if user_id.is_empty() {
            return Err(AppError::Validation("user id cannot be empty".to_string()));
        }

        let record = self
            .store
            .get(&self.users_table, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                table: self.users_table.clone(),
                key: user_id.to_string(),
            })?;

        User::from_record(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MemoryStore, MockRecordStore, Record};

    fn ids(users: &[Arc<User>]) -> Vec<&str> {
        users.iter().map(|u| u.id.as_str()).collect()
    }

    fn user_records(ids: &[&str]) -> Vec<Record> {
        ids.iter().map(|id| User::new(*id).to_record()).collect()
    }

    fn edge_record(owner: &str, target: &str) -> Record {
        Friend::new(owner, target).to_record()
    }

    #[test]
    fn partition_excludes_self_and_keeps_order() {
        let directory = vec![
            User::new("u4"),
            User::new("u1"),
            User::new("u2"),
            User::new("u3"),
        ];
        let friend_ids: HashSet<String> = ["u2".to_string()].into_iter().collect();

        let partition = partition(directory, &friend_ids, "u1");
        let friends: Vec<_> = partition.friends.iter().map(|u| u.id.as_str()).collect();
        let others: Vec<_> = partition
            .potential_friends
            .iter()
            .map(|u| u.id.as_str())
            .collect();
        assert_eq!(friends, vec!["u2"]);
        assert_eq!(others, vec!["u4", "u3"]);
    }

    #[test]
    fn partition_self_edge_lists_self_as_friend() {
        let directory = vec![User::new("u1"), User::new("u2")];
        let friend_ids: HashSet<String> = ["u1".to_string()].into_iter().collect();

        let partition = partition(directory, &friend_ids, "u1");
        let friends: Vec<_> = partition.friends.iter().map(|u| u.id.as_str()).collect();
        let others: Vec<_> = partition
            .potential_friends
            .iter()
            .map(|u| u.id.as_str())
            .collect();
        assert_eq!(friends, vec!["u1"]);
        assert_eq!(others, vec!["u2"]);
    }

    #[tokio::test]
    async fn test_friend_refresh_skips_scan_without_edges() {
        let mut store = MockRecordStore::new();
        store
            .expect_scan()
            .withf(|table, _| table == "Friend")
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
        // The directory table must never be scanned
        store
            .expect_scan()
            .withf(|table, _| table == "User")
            .never();

        let service = DirectoryService::new(Arc::new(store), "User", "Friend");
        let session = SessionCache::new();
        session.add_friend(User::new("stale")).await;

        service.refresh_friend_list(&session, "u1").await.unwrap();
        assert!(session.friend_list().await.is_empty());
    }

    #[tokio::test]
    async fn test_resolver_error_leaves_cache_untouched() {
        let mut store = MockRecordStore::new();
        store
            .expect_scan()
            .returning(|_, _| Err(AppError::Transport("network down".to_string())));

        let service = DirectoryService::new(Arc::new(store), "User", "Friend");
        let session = SessionCache::new();
        session.add_friend(User::new("kept")).await;
        session.add_potential_friend(User::new("kept-too")).await;

        let result = service.refresh_friend_list(&session, "u1").await;
        assert!(matches!(result, Err(AppError::Transport(_))));
        let result = service.refresh_potential_friend_list(&session, "u1").await;
        assert!(matches!(result, Err(AppError::Transport(_))));

        assert_eq!(ids(&session.friend_list().await), vec!["kept"]);
        assert_eq!(ids(&session.potential_friend_list().await), vec!["kept-too"]);
    }

    #[tokio::test]
    async fn test_directory_scan_error_is_surfaced_verbatim() {
        let mut store = MockRecordStore::new();
        store
            .expect_scan()
            .withf(|table, _| table == "Friend")
            .returning(|_, _| Ok(vec![edge_record("u1", "u2")]));
        store
            .expect_scan()
            .withf(|table, filter| table == "User" && filter.is_empty())
            .returning(|_, _| Err(AppError::Transport("ProvisionedThroughputExceeded".to_string())));

        let service = DirectoryService::new(Arc::new(store), "User", "Friend");
        let session = SessionCache::new();
        session.add_friend(User::new("previous")).await;

        let error = service
            .refresh_friend_list(&session, "u1")
            .await
            .unwrap_err();
        assert!(
            matches!(error, AppError::Transport(message) if message == "ProvisionedThroughputExceeded")
        );
        // No clear, no partial directory data
        assert_eq!(ids(&session.friend_list().await), vec!["previous"]);
    }

    #[tokio::test]
    async fn test_potential_refresh_without_edges_still_scans() {
        let mut store = MockRecordStore::new();
        store
            .expect_scan()
            .withf(|table, _| table == "Friend")
            .returning(|_, _| Ok(Vec::new()));
        store
            .expect_scan()
            .withf(|table, _| table == "User")
            .times(1)
            .returning(|_, _| Ok(user_records(&["u1", "u2", "u3"])));

        let service = DirectoryService::new(Arc::new(store), "User", "Friend");
        let session = SessionCache::new();

        service
            .refresh_potential_friend_list(&session, "u1")
            .await
            .unwrap();
        assert_eq!(ids(&session.potential_friend_list().await), vec!["u2", "u3"]);
    }

    #[tokio::test]
    async fn test_refresh_directory_fills_both_lists() {
        let store = Arc::new(MemoryStore::new());
        for id in ["u1", "u2", "u3"] {
            store.put("User", User::new(id).to_record()).await.unwrap();
        }
        store.put("Friend", edge_record("u1", "u2")).await.unwrap();

        let service = DirectoryService::new(store, "User", "Friend");
        let session = SessionCache::new();
        service.refresh_directory(&session, "u1").await.unwrap();

        assert_eq!(ids(&session.friend_list().await), vec!["u2"]);
        assert_eq!(ids(&session.potential_friend_list().await), vec!["u3"]);
    }

    #[tokio::test]
    async fn test_add_friend_twice_creates_two_edges() {
        let store = Arc::new(MemoryStore::new());
        let service = DirectoryService::new(store.clone(), "User", "Friend");

        let first = service.add_friend("u1", "u2").await.unwrap();
        let second = service.add_friend("u1", "u2").await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.len("Friend").await, 2);
        // No reverse edge
        let reverse = service.resolver().resolve_friend_ids("u2").await.unwrap();
        assert!(reverse.is_empty());
    }

    #[tokio::test]
    async fn test_add_friend_rejects_empty_ids() {
        let service = DirectoryService::new(Arc::new(MemoryStore::new()), "User", "Friend");
        assert!(matches!(
            service.add_friend("", "u2").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.add_friend("u1", "").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_get_user_distinguishes_missing_from_transport() {
        let mut store = MockRecordStore::new();
        store
            .expect_get()
            .withf(|_, key| key == "missing")
            .returning(|_, _| Ok(None));
        store
            .expect_get()
            .withf(|_, key| key == "u1")
            .returning(|_, _| Ok(Some(User::new("u1").with_username("alice").to_record())));
        store
            .expect_get()
            .withf(|_, key| key == "offline")
            .returning(|_, _| Err(AppError::Transport("timeout".to_string())));

        let service = DirectoryService::new(Arc::new(store), "User", "Friend");

        let user = service.get_user("u1").await.unwrap();
        assert_eq!(user.username.as_deref(), Some("alice"));

        let missing = service.get_user("missing").await.unwrap_err();
        assert!(matches!(missing, AppError::NotFound { key, .. } if key == "missing"));

        let offline = service.get_user("offline").await.unwrap_err();
        assert!(matches!(offline, AppError::Transport(_)));
    }
}
