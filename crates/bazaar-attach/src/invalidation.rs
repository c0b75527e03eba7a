//! Per-chat epochs for cached message lists.
//!
//! Anything holding a cached message list records the chat's epoch when it
//! fills the cache and treats the list as stale once the epoch has moved.

use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
pub struct MessageListCache {
    epochs: Mutex<HashMap<String, u64>>,
}

impl MessageListCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current epoch for `chat_id` (0 if never invalidated).
    pub fn epoch(&self, chat_id: &str) -> u64 {
        self.epochs.lock().get(chat_id).copied().unwrap_or(0)
    }

    /// Mark every cached message list for `chat_id` stale. Returns the new epoch.
    pub fn invalidate(&self, chat_id: &str) -> u64 {
        let mut epochs = self.epochs.lock();
        let epoch = epochs.entry(chat_id.to_string()).or_insert(0);
        *epoch += 1;
        tracing::debug!(chat_id, epoch = *epoch, "message lists invalidated");
        *epoch
    }

    /// True if a list cached at `epoch` is still current.
    pub fn is_current(&self, chat_id: &str, epoch: u64) -> bool {
        self.epoch(chat_id) == epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_chat_starts_at_zero() {
        let cache = MessageListCache::new();
        assert_eq!(cache.epoch("chat-1"), 0);
        assert!(cache.is_current("chat-1", 0));
    }

    #[test]
    fn invalidate_bumps_only_that_chat() {
        let cache = MessageListCache::new();
        let seen = cache.epoch("chat-1");
        assert_eq!(cache.invalidate("chat-1"), 1);
        assert!(!cache.is_current("chat-1", seen));
        assert!(cache.is_current("chat-2", 0));
    }
}
