//! Session storage
//!
//! `SessionStore` is the seam between this service and the protocol handler
//! that runs the provider login. The handler records the outcome as a
//! [`SessionState`] under the id carried by the session cookie; the gate
//! reads it back on every request.
//!
//! A handler co-located in this process is mounted next to
//! [`build_router`](crate::build_router) and shares the same
//! `Arc<dyn SessionStore>` (`AppState::sessions`), writing through
//! [`SessionStore::put`]. A handler in another process needs an
//! implementation backed by storage both processes reach. On its own the
//! in-memory store only serves the login bypass and tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use ssobroker_types::SessionState;

/// Session state keyed by session id
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: &str) -> Option<SessionState>;

    async fn put(&self, id: &str, state: SessionState);
}

/// Maximum number of live sessions held in memory
pub const MAX_SESSIONS: u64 = 100_000;

/// In-process session store; idle sessions are evicted after the TTL
#[derive(Clone)]
pub struct MemorySessionStore {
    cache: Cache<String, Arc<SessionState>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_SESSIONS)
                .time_to_idle(ttl)
                .build(),
        }
    }
}

impl std::fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionStore")
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &str) -> Option<SessionState> {
        self.cache.get(id).await.map(|state| (*state).clone())
    }

    async fn put(&self, id: &str, state: SessionState) {
        self.cache.insert(id.to_string(), Arc::new(state)).await;
    }
}
