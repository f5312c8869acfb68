use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Duration, NaiveDateTime, Utc};

use crate::models::ConversationState;

/// Keyed storage for in-progress dialogues. Injected through `AppState` so
/// the eviction policy is a property of the store, not of the state machine.
pub trait SessionStore: Send + Sync {
    fn get(&self, session_id: &str) -> Option<ConversationState>;
    fn put(&self, session_id: &str, state: ConversationState);
    fn delete(&self, session_id: &str);
}

struct Entry {
    state: ConversationState,
    expires_at: NaiveDateTime,
}

/// In-memory store with a per-entry TTL. Expired entries are dropped on
/// read and swept on every write, so the map cannot grow without bound.
pub struct MemorySessionStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(30))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str) -> Option<ConversationState> {
        let mut entries = self.entries.lock().unwrap();
        let now = Utc::now().naive_utc();

        match entries.get(session_id) {
            Some(entry) if entry.expires_at > now => Some(entry.state.clone()),
            Some(_) => {
                entries.remove(session_id);
                None
            }
            None => None,
        }
    }

    fn put(&self, session_id: &str, state: ConversationState) {
        let mut entries = self.entries.lock().unwrap();
        let now = Utc::now().naive_utc();

        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            session_id.to_string(),
            Entry {
                state,
                expires_at: now + self.ttl,
            },
        );
    }

    fn delete(&self, session_id: &str) {
        self.entries.lock().unwrap().remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Step;

    #[test]
    fn test_put_get_delete() {
        let store = MemorySessionStore::new();
        assert!(store.get("s1").is_none());

        let mut state = ConversationState::default();
        state.patient_name = Some("Alice".to_string());
        state.step = Step::BookingRequest;
        store.put("s1", state);

        let loaded = store.get("s1").unwrap();
        assert_eq!(loaded.patient_name.as_deref(), Some("Alice"));
        assert_eq!(loaded.step, Step::BookingRequest);

        store.delete("s1");
        assert!(store.get("s1").is_none());
    }

    #[test]
    fn test_sessions_are_independent() {
        let store = MemorySessionStore::new();
        store.put("s1", ConversationState::default());

        let mut other = ConversationState::default();
        other.step = Step::Completed;
        store.put("s2", other);

        assert_eq!(store.get("s1").unwrap().step, Step::Welcome);
        assert_eq!(store.get("s2").unwrap().step, Step::Completed);
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let store = MemorySessionStore::with_ttl(Duration::minutes(-1));
        store.put("s1", ConversationState::default());
        assert!(store.get("s1").is_none());
    }

    #[test]
    fn test_write_sweeps_expired_entries() {
        let store = MemorySessionStore::with_ttl(Duration::minutes(-1));
        store.put("stale", ConversationState::default());
        store.put("fresh", ConversationState::default());

        let entries = store.entries.lock().unwrap();
        assert!(!entries.contains_key("stale"));
    }
}
