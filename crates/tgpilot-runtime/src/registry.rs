//! Process-wide session registry.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use tgpilot_models::SessionKey;

use crate::session::SessionHandle;

/// Maps session keys to handles.
///
/// Lookup and creation happen under one write lock, so concurrent requests
/// for the same key always share a single handle. State lives only as long
/// as the process.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionKey, Arc<SessionHandle>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the handle for `key`.
    pub async fn get(&self, key: &SessionKey) -> Option<Arc<SessionHandle>> {
        self.sessions.read().await.get(key).cloned()
    }

    /// Gets the handle for `key`, creating an empty one if absent.
    ///
    /// Returns the handle and whether it was created by this call.
    pub async fn get_or_create(&self, key: &SessionKey) -> (Arc<SessionHandle>, bool) {
        let mut sessions = self.sessions.write().await;
        if let Some(handle) = sessions.get(key) {
            return (Arc::clone(handle), false);
        }

        debug!(session = %key, "registering session");
        let handle = Arc::new(SessionHandle::new(key.clone()));
        sessions.insert(key.clone(), Arc::clone(&handle));
        (handle, true)
    }

    /// Removes the handle for `key`. Removing an absent key is a no-op.
    pub async fn remove(&self, key: &SessionKey) -> Option<Arc<SessionHandle>> {
        self.sessions.write().await.remove(key)
    }

    /// Removes the entry for the handle's key only if it is still `handle`.
    pub async fn remove_if_same(&self, handle: &Arc<SessionHandle>) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(handle.key()) {
            Some(current) if Arc::ptr_eq(current, handle) => {
                sessions.remove(handle.key());
                true
            }
            _ => false,
        }
    }

    /// Calls `f` for every registered handle.
    pub async fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&SessionKey, &Arc<SessionHandle>),
    {
        let sessions = self.sessions.read().await;
        for (key, handle) in sessions.iter() {
            f(key, handle);
        }
    }

    /// Removes and returns every handle.
    pub async fn drain(&self) -> Vec<Arc<SessionHandle>> {
        let mut sessions = self.sessions.write().await;
        sessions.drain().map(|(_, handle)| handle).collect()
    }

    /// Number of registered handles.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns true if no handle is registered.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
