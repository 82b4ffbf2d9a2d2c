//! Per-chat dialogue storage with idle expiry.
//!
//! Implements teloxide's [`Storage`] so the dispatcher can use it in place of
//! `InMemStorage`. A session that has not been written for longer than the
//! TTL reads as absent, which puts the chat back in the idle state.

use dashmap::DashMap;
use futures::future::BoxFuture;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};
use teloxide::dispatching::dialogue::Storage;
use teloxide::types::ChatId;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

#[derive(Debug)]
struct Session<D> {
    state: D,
    touched: Instant,
}

#[derive(Debug)]
pub struct SessionStore<D> {
    sessions: DashMap<ChatId, Session<D>>,
    ttl: Duration,
}

impl<D> SessionStore<D>
where
    D: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Arc<Self> {
        info!(ttl_secs = ttl.as_secs(), "Session store initialized");
        Arc::new(Self {
            sessions: DashMap::new(),
            ttl,
        })
    }

    fn is_expired(&self, session: &Session<D>, now: Instant) -> bool {
        now.duration_since(session.touched) >= self.ttl
    }

    /// Current state of `chat_id` as seen at `now`
    pub fn get_at(&self, chat_id: ChatId, now: Instant) -> Option<D> {
        match self.sessions.get(&chat_id) {
            Some(session) if !self.is_expired(&session, now) => return Some(session.state.clone()),
            Some(_) => {}
            None => return None,
        }

        // The read guard is released before removing
        self.sessions
            .remove_if(&chat_id, |_, session| self.is_expired(session, now));
        debug!(chat_id = %chat_id, "Session expired");
        None
    }

    /// Store `state` for `chat_id`, restarting its TTL at `now`
    pub fn set_at(&self, chat_id: ChatId, state: D, now: Instant) {
        self.sessions.insert(
            chat_id,
            Session {
                state,
                touched: now,
            },
        );
    }

    /// Returns `true` when a session was removed
    pub fn remove(&self, chat_id: ChatId) -> bool {
        self.sessions.remove(&chat_id).is_some()
    }

    /// Drop every session idle since before `now - ttl`
    pub fn evict_expired_at(&self, now: Instant) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| now.duration_since(session.touched) < self.ttl);
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Periodically evict expired sessions until the runtime shuts down
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(every);
            loop {
                ticker.tick().await;
                let evicted = store.evict_expired_at(Instant::now());
                if evicted > 0 {
                    info!(evicted, remaining = store.len(), "Evicted expired sessions");
                }
            }
        })
    }
}

impl<D> Storage<D> for SessionStore<D>
where
    D: Clone + Send + Sync + 'static,
{
    type Error = Infallible;

    fn remove_dialogue(self: Arc<Self>, chat_id: ChatId) -> BoxFuture<'static, Result<(), Self::Error>>
    where
        D: Send + 'static,
    {
        Box::pin(async move {
            self.remove(chat_id);
            Ok(())
        })
    }

    fn update_dialogue(
        self: Arc<Self>,
        chat_id: ChatId,
        dialogue: D,
    ) -> BoxFuture<'static, Result<(), Self::Error>>
    where
        D: Send + 'static,
    {
        Box::pin(async move {
            self.set_at(chat_id, dialogue, Instant::now());
            Ok(())
        })
    }

    fn get_dialogue(self: Arc<Self>, chat_id: ChatId) -> BoxFuture<'static, Result<Option<D>, Self::Error>> {
        Box::pin(async move { Ok(self.get_at(chat_id, Instant::now())) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn test_session_expires_after_ttl() {
        let store = SessionStore::<u32>::new(TTL);
        let t0 = Instant::now();
        store.set_at(ChatId(1), 7, t0);

        assert_eq!(store.get_at(ChatId(1), t0 + Duration::from_secs(59)), Some(7));
        assert_eq!(store.get_at(ChatId(1), t0 + TTL), None);
        // The expired entry was dropped on read
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_restarts_ttl() {
        let store = SessionStore::<u32>::new(TTL);
        let t0 = Instant::now();
        store.set_at(ChatId(1), 1, t0);
        store.set_at(ChatId(1), 2, t0 + Duration::from_secs(50));

        assert_eq!(store.get_at(ChatId(1), t0 + Duration::from_secs(100)), Some(2));
    }

    #[test]
    fn test_evict_expired_keeps_fresh_sessions() {
        let store = SessionStore::<u32>::new(TTL);
        let t0 = Instant::now();
        store.set_at(ChatId(1), 1, t0);
        store.set_at(ChatId(2), 2, t0 + Duration::from_secs(30));

        assert_eq!(store.evict_expired_at(t0 + Duration::from_secs(70)), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_at(ChatId(2), t0 + Duration::from_secs(70)), Some(2));
    }

    #[tokio::test]
    async fn test_storage_trait_round() {
        let store = SessionStore::<String>::new(TTL);

        Arc::clone(&store)
            .update_dialogue(ChatId(5), "editing".to_string())
            .await
            .unwrap();
        let state = Arc::clone(&store).get_dialogue(ChatId(5)).await.unwrap();
        assert_eq!(state.as_deref(), Some("editing"));

        Arc::clone(&store).remove_dialogue(ChatId(5)).await.unwrap();
        // Removing twice is not an error
        Arc::clone(&store).remove_dialogue(ChatId(5)).await.unwrap();
        assert_eq!(Arc::clone(&store).get_dialogue(ChatId(5)).await.unwrap(), None);
    }
}
