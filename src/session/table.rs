//! Concurrency-safe mapping from conversation identifier to remote session.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::error::Result;
use crate::platform::Session;

/// Conversation identifier -> session slot.
///
/// Each key owns a slot that is inserted atomically through the entry API and
/// initialised at most once. Remote creation runs on the slot, after the map
/// shard lock is released, so concurrent first turns for the same conversation
/// await a single creation and all observe the same handle. No map guard is
/// ever held across an await.
#[derive(Debug, Default)]
pub struct SessionTable {
    slots: DashMap<String, Arc<OnceCell<Session>>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `conversation_id`, creating it with `create` if
    /// there is none yet.
    ///
    /// If `create` fails the error is returned and the next call retries.
    /// Callers already waiting on the same slot retry on it; once nobody is
    /// waiting the empty slot is dropped from the table.
    pub async fn get_or_create<F, Fut>(&self, conversation_id: &str, create: F) -> Result<Session>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Session>>,
    {
        let slot = self
            .slots
            .entry(conversation_id.to_string())
            .or_default()
            .value()
            .clone();
        let outcome = slot.get_or_try_init(create).await.cloned();
        if outcome.is_err() {
            let failed = Arc::as_ptr(&slot);
            drop(slot);
            // Only the map still holds the slot: nobody is waiting to retry on it.
            self.slots.remove_if(conversation_id, |_, current| {
                Arc::as_ptr(current) == failed
                    && current.get().is_none()
                    && Arc::strong_count(current) == 1
            });
        }
        outcome
    }

    /// Detach the session for `conversation_id`. Does not contact the platform.
    ///
    /// Returns `None` if the conversation is unknown or its session was never
    /// successfully created.
    pub fn remove(&self, conversation_id: &str) -> Option<Session> {
        self.slots
            .remove(conversation_id)
            .and_then(|(_, slot)| slot.get().cloned())
    }

    /// Drain the table, returning every created session.
    pub fn remove_all(&self) -> Vec<Session> {
        let mut drained = Vec::new();
        self.slots.retain(|_, slot| {
            if let Some(session) = slot.get() {
                drained.push(session.clone());
            }
            false
        });
        drained
    }

    /// Session currently bound to `conversation_id`, if created.
    pub fn get(&self, conversation_id: &str) -> Option<Session> {
        self.slots
            .get(conversation_id)
            .and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, conversation_id: &str) -> bool {
        self.slots.contains_key(conversation_id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Conversation identifiers with a slot in the table.
    pub fn conversation_ids(&self) -> Vec<String> {
        self.slots.iter().map(|entry| entry.key().clone()).collect()
    }
}
