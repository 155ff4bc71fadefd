//! Session cache
//!
//! Holds the last refreshed friend and potential-friend lists for one
//! signed-in user. Volatile; lives as long as the session that owns it.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::models::User;
use crate::metrics::CACHE_SIZE;

const FRIENDS: &str = "friends";
const POTENTIAL_FRIENDS: &str = "potential_friends";

const DEFAULT_SESSION: &str = "default";

/// Friend and potential-friend lists of one session
///
/// Each list sits behind its own lock. The directory service swaps a
/// whole list at once, so readers see either the previous refresh or
/// the next one.
pub struct SessionCache {
    /// Label of this session in the cache size gauge
    name: String,
    friend_list: RwLock<Vec<Arc<User>>>,
    potential_friend_list: RwLock<Vec<Arc<User>>>,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::named(DEFAULT_SESSION)
    }
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session cache reported under its own `session` gauge label
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            friend_list: RwLock::new(Vec::new()),
            potential_friend_list: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn set_size(&self, list: &str, size: usize) {
        CACHE_SIZE
            .with_label_values(&[self.name.as_str(), list])
            .set(size as i64);
    }

    // =========================================================================
    // Friends
    // =========================================================================

    pub async fn clear_friend_list(&self) {
        self.friend_list.write().await.clear();
        self.set_size(FRIENDS, 0);
    }

    pub async fn add_friend(&self, user: User) {
        let mut list = self.friend_list.write().await;
        list.push(Arc::new(user));
        self.set_size(FRIENDS, list.len());
    }

    /// Replace the whole friend list
    pub async fn replace_friend_list(&self, users: Vec<User>) {
        let users: Vec<Arc<User>> = users.into_iter().map(Arc::new).collect();
        self.set_size(FRIENDS, users.len());
        *self.friend_list.write().await = users;
    }

    /// Snapshot of the friend list
    pub async fn friend_list(&self) -> Vec<Arc<User>> {
        self.friend_list.read().await.clone()
    }

    // =========================================================================
    // Potential friends
    // =========================================================================

    pub async fn clear_potential_friend_list(&self) {
        self.potential_friend_list.write().await.clear();
        self.set_size(POTENTIAL_FRIENDS, 0);
    }

    pub async fn add_potential_friend(&self, user: User) {
        let mut list = self.potential_friend_list.write().await;
        list.push(Arc::new(user));
        self.set_size(POTENTIAL_FRIENDS, list.len());
    }

    /// Replace the whole potential-friend list
    pub async fn replace_potential_friend_list(&self, users: Vec<User>) {
        let users: Vec<Arc<User>> = users.into_iter().map(Arc::new).collect();
        self.set_size(POTENTIAL_FRIENDS, users.len());
        *self.potential_friend_list.write().await = users;
    }

    /// Snapshot of the potential-friend list
    pub async fn potential_friend_list(&self) -> Vec<Arc<User>> {
        self.potential_friend_list.read().await.clone()
    }
}
