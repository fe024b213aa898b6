use std::collections::HashMap;
use std::time::{Duration, Instant};

use insk_core::{ChatMessage, Transcript};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

struct Session {
    transcript: Transcript,
    last_seen: Instant,
}

/// Chat transcripts keyed by session id.
///
/// A session ends when it is deleted or idle for longer than the TTL. When the
/// store is full, creating a session evicts the least recently used one.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_IDLE_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    fn is_live(&self, session: &Session, now: Instant) -> bool {
        now.duration_since(session.last_seen) <= self.idle_ttl
    }

    pub async fn create(&self) -> (Uuid, Transcript) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_seen) <= self.idle_ttl);
        if sessions.len() < before {
            debug!("Expired {} idle chat sessions", before - sessions.len());
        }
        while sessions.len() >= self.max_sessions {
            let oldest = sessions.iter().min_by_key(|(_, s)| s.last_seen).map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    debug!("Evicted chat session {}", id);
                }
                None => break,
            }
        }

        let id = Uuid::new_v4();
        let transcript = Transcript::new();
        sessions.insert(
            id,
            Session {
                transcript: transcript.clone(),
                last_seen: now,
            },
        );
        (id, transcript)
    }

    pub async fn get(&self, id: &Uuid) -> Option<Transcript> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id).filter(|s| self.is_live(s, now))?;
        session.last_seen = now;
        Some(session.transcript.clone())
    }

    pub async fn contains(&self, id: &Uuid) -> bool {
        let now = Instant::now();
        self.sessions
            .read()
            .await
            .get(id)
            .map_or(false, |s| self.is_live(s, now))
    }

    /// Appends a question and its answer as one step, so concurrent posts to
    /// the same session never interleave. Returns the new transcript length, or
    /// `None` when the session has ended.
    pub async fn push_exchange(&self, id: &Uuid, question: ChatMessage, answer: ChatMessage) -> Option<usize> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id).filter(|s| self.is_live(s, now))?;
        session.transcript.push(question);
        session.transcript.push(answer);
        session.last_seen = now;
        Some(session.transcript.len())
    }

    /// Ends a session. Returns whether it existed.
    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .read()
            .await
            .values()
            .filter(|s| self.is_live(s, now))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = SessionStore::new();
        let (id, transcript) = store.create().await;
        assert_eq!(transcript.len(), 1);
        assert!(store.contains(&id).await);

        let len = store
            .push_exchange(&id, ChatMessage::user("hi"), ChatMessage::assistant("hello"))
            .await;
        assert_eq!(len, Some(3));
        let messages = store.get(&id).await.unwrap().messages().to_vec();
        assert_eq!(messages[1].content, "hi");
        assert_eq!(messages[2].content, "hello");

        let unknown = Uuid::new_v4();
        assert_eq!(store.push_exchange(&unknown, ChatMessage::user("x"), ChatMessage::assistant("y")).await, None);
        assert_eq!(store.len().await, 1);

        assert!(store.remove(&id).await);
        assert!(!store.remove(&id).await);
        assert!(store.get(&id).await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let store = SessionStore::with_limits(Duration::from_millis(20), 10);
        let (stale, _) = store.create().await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(!store.contains(&stale).await);
        assert!(store.get(&stale).await.is_none());
        assert_eq!(store.len().await, 0);

        let (fresh, _) = store.create().await;
        assert!(store.contains(&fresh).await);
        assert_eq!(store.sessions.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_full_store_evicts_least_recently_used() {
        let store = SessionStore::with_limits(DEFAULT_IDLE_TTL, 2);
        let (first, _) = store.create().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let (second, _) = store.create().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(store.get(&first).await.is_some());
        tokio::time::sleep(Duration::from_millis(5)).await;

        let (third, _) = store.create().await;
        assert_eq!(store.len().await, 2);
        assert!(store.contains(&first).await);
        assert!(!store.contains(&second).await);
        assert!(store.contains(&third).await);
    }
}
