//! Cancellation handles for in-flight chat streams

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use uuid::Uuid;

/// Registry of in-flight streams, keyed by stream id
#[derive(Clone, Default)]
pub struct StreamRegistry {
    streams: Arc<DashMap<String, CancellationToken>>,
}

impl StreamRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session; it stays registered until the returned handle is dropped
    #[must_use]
    pub fn register(&self) -> StreamSession {
        let id = Uuid::new_v4().to_string();
        let token = CancellationToken::new();
        self.streams.insert(id.clone(), token.clone());
        debug!("Registered stream {} ({} active)", id, self.streams.len());

        StreamSession {
            id,
            token,
            streams: Arc::clone(&self.streams),
        }
    }

    /// Signal one session. Returns false for unknown or already stopped ids.
    pub fn cancel(&self, stream_id: &str) -> bool {
        match self.streams.get(stream_id) {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                info!("Stopping stream {}", stream_id);
                true
            }
            _ => false,
        }
    }

    /// Signal every registered session, returning how many were still running
    pub fn cancel_all(&self) -> usize {
        let mut stopped = 0;
        for entry in self.streams.iter() {
            if !entry.value().is_cancelled() {
                entry.value().cancel();
                stopped += 1;
            }
        }
        info!("Stopping {} streams", stopped);
        stopped
    }

    #[must_use]
    pub fn contains(&self, stream_id: &str) -> bool {
        self.streams.contains_key(stream_id)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.streams.len()
    }
}

/// One request's stream handle; deregisters itself on drop
pub struct StreamSession {
    id: String,
    token: CancellationToken,
    streams: Arc<DashMap<String, CancellationToken>>,
}

impl StreamSession {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Token observed by this session's relay
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.streams.remove(&self.id);
        debug!("Stream {} closed", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_deregisters_on_drop() {
        let registry = StreamRegistry::new();
        let session = registry.register();
        let id = session.id().to_string();
        assert!(registry.contains(&id));

        drop(session);
        assert!(!registry.contains(&id));
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn test_cancel_targets_one_session() {
        let registry = StreamRegistry::new();
        let a = registry.register();
        let b = registry.register();

        assert!(registry.cancel(a.id()));
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());

        // already stopped
        assert!(!registry.cancel(a.id()));
        assert!(!registry.cancel("unknown"));
    }

    #[test]
    fn test_cancel_all_counts_running_sessions() {
        let registry = StreamRegistry::new();
        let a = registry.register();
        let b = registry.register();
        registry.cancel(a.id());

        assert_eq!(registry.cancel_all(), 1);
        assert!(a.is_cancelled() && b.is_cancelled());

        // sessions opened afterwards start fresh
        let c = registry.register();
        assert!(!c.is_cancelled());
    }

    #[test]
    fn test_token_clone_observes_cancel() {
        let registry = StreamRegistry::new();
        let session = registry.register();
        let token = session.token();
        registry.cancel_all();
        assert!(token.is_cancelled());
    }
}
