use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// One live realtime connection occupying a user's presence slot.
#[derive(Clone)]
pub struct PresenceSlot<S> {
    pub user_id: Uuid,
    pub username: String,
    pub conn_id: ConnectionId,
    pub session: S,
}

/// Process-wide user -> connection map. One slot per user: a second
/// connection from the same user overwrites the first, so only the most
/// recent connection is addressable.
///
/// Generic over the session handle so the slot semantics can be tested
/// without a live socket.
pub struct PresenceRegistry<S> {
    slots: Arc<RwLock<HashMap<Uuid, PresenceSlot<S>>>>,
}

pub type WsPresenceRegistry = PresenceRegistry<actix_ws::Session>;

impl<S: Clone> PresenceRegistry<S> {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Unconditionally overwrite any existing slot for the user
    /// (last-write-wins).
    pub async fn upsert(&self, slot: PresenceSlot<S>) {
        self.slots.write().await.insert(slot.user_id, slot);
    }

    /// Delete the user's slot only if it is still owned by `conn_id`.
    /// Returns whether a slot was removed.
    ///
    /// The ownership check keeps a stale disconnect (an older connection
    /// closing after a newer one registered) from evicting the live entry.
    pub async fn remove(&self, user_id: Uuid, conn_id: ConnectionId) -> bool {
        let mut slots = self.slots.write().await;
        match slots.get(&user_id) {
            Some(slot) if slot.conn_id == conn_id => {
                slots.remove(&user_id);
                true
            }
            _ => false,
        }
    }

    pub async fn lookup(&self, user_id: Uuid) -> Option<PresenceSlot<S>> {
        self.slots.read().await.get(&user_id).cloned()
    }

    /// Every live slot, for presence broadcasts.
    pub async fn snapshot(&self) -> Vec<PresenceSlot<S>> {
        self.slots.read().await.values().cloned().collect()
    }
}

impl<S: Clone> Default for PresenceRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(user_id: Uuid, conn_id: ConnectionId) -> PresenceSlot<()> {
        PresenceSlot {
            user_id,
            username: "user".to_string(),
            conn_id,
            session: (),
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_previous_connection() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let c1 = Uuid::new_v4();
        let c2 = Uuid::new_v4();

        registry.upsert(slot(user, c1)).await;
        registry.upsert(slot(user, c2)).await;

        let current = registry.lookup(user).await.unwrap();
        assert_eq!(current.conn_id, c2);
    }

    #[tokio::test]
    async fn stale_disconnect_does_not_evict_newer_connection() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let c1 = Uuid::new_v4();
        let c2 = Uuid::new_v4();

        registry.upsert(slot(user, c1)).await;
        registry.upsert(slot(user, c2)).await;

        // c1's disconnect arrives after c2 took the slot
        assert!(!registry.remove(user, c1).await);
        assert_eq!(registry.lookup(user).await.unwrap().conn_id, c2);

        // the owner can still remove it
        assert!(registry.remove(user, c2).await);
        assert!(registry.lookup(user).await.is_none());
    }

    #[tokio::test]
    async fn remove_of_absent_user_is_a_noop() {
        let registry: PresenceRegistry<()> = PresenceRegistry::new();
        assert!(!registry.remove(Uuid::new_v4(), Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn snapshot_returns_every_live_slot() {
        let registry = PresenceRegistry::new();
        registry.upsert(slot(Uuid::new_v4(), Uuid::new_v4())).await;
        registry.upsert(slot(Uuid::new_v4(), Uuid::new_v4())).await;

        assert_eq!(registry.snapshot().await.len(), 2);
    }
}
