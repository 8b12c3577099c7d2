//! Token blacklist. Best-effort, process-local; losing it on restart only
//! means revoked tokens live until their own `exp`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::clock::SharedClock;

/// How long a revoked `jti` is remembered.
pub const BLACKLIST_TTL_HOURS: i64 = 24;

pub trait RevocationStore: Send + Sync {
    fn insert(&self, jti: &str, expires_at: DateTime<Utc>);
    fn get(&self, jti: &str) -> Option<DateTime<Utc>>;
    fn remove(&self, jti: &str);
    /// Removes `jti` only if it lapsed at or before `now`, in one step.
    /// Returns whether an entry was removed.
    fn remove_if_expired(&self, jti: &str, now: DateTime<Utc>) -> bool;
    /// Drops entries that expired at or before `now`; returns how many.
    fn evict_expired(&self, now: DateTime<Utc>) -> usize;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    entries: DashMap<String, DateTime<Utc>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RevocationStore for InMemoryRevocationStore {
    fn insert(&self, jti: &str, expires_at: DateTime<Utc>) {
        self.entries.insert(jti.to_string(), expires_at);
    }

    fn get(&self, jti: &str) -> Option<DateTime<Utc>> {
        self.entries.get(jti).map(|entry| *entry.value())
    }

    fn remove(&self, jti: &str) {
        self.entries.remove(jti);
    }

    fn remove_if_expired(&self, jti: &str, now: DateTime<Utc>) -> bool {
        self.entries
            .remove_if(jti, |_, expires_at| *expires_at <= now)
            .is_some()
    }

    fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

pub struct TokenBlacklist {
    store: Arc<dyn RevocationStore>,
    clock: SharedClock,
    ttl: Duration,
}

impl TokenBlacklist {
    pub fn new(store: Arc<dyn RevocationStore>, clock: SharedClock) -> Self {
        Self {
            store,
            clock,
            ttl: Duration::hours(BLACKLIST_TTL_HOURS),
        }
    }

    pub fn in_memory(clock: SharedClock) -> Self {
        Self::new(Arc::new(InMemoryRevocationStore::new()), clock)
    }

    pub fn revoke(&self, jti: &str) {
        let expires_at = self.clock.now() + self.ttl;
        self.store.insert(jti, expires_at);
        tracing::info!(jti = %jti, expires_at = %expires_at, "token revoked");
    }

    /// Unknown or lapsed entries are simply "not revoked".
    pub fn is_revoked(&self, jti: &str) -> bool {
        let now = self.clock.now();
        if self.store.remove_if_expired(jti, now) {
            return false;
        }
        // a revoke racing this call reads as revoked
        matches!(self.store.get(jti), Some(expires_at) if expires_at > now)
    }

    pub fn sweep(&self) -> usize {
        let evicted = self.store.evict_expired(self.clock.now());
        if evicted > 0 {
            tracing::debug!(evicted, "blacklist sweep");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn revoked_tokens_expire_after_a_day() {
        let clock = Arc::new(ManualClock::default());
        let blacklist = TokenBlacklist::in_memory(clock.clone());

        assert!(!blacklist.is_revoked("jti-1"));
        blacklist.revoke("jti-1");
        assert!(blacklist.is_revoked("jti-1"));

        clock.advance(Duration::hours(23));
        assert!(blacklist.is_revoked("jti-1"));

        clock.advance(Duration::hours(1));
        assert!(!blacklist.is_revoked("jti-1"));
        assert!(blacklist.is_empty());
    }

    #[test]
    fn sweep_only_drops_lapsed_entries() {
        let clock = Arc::new(ManualClock::default());
        let blacklist = TokenBlacklist::in_memory(clock.clone());

        blacklist.revoke("old");
        clock.advance(Duration::hours(12));
        blacklist.revoke("new");
        clock.advance(Duration::hours(13));

        assert_eq!(blacklist.sweep(), 1);
        assert_eq!(blacklist.len(), 1);
        assert!(blacklist.is_revoked("new"));
    }

    #[test]
    fn remove_if_expired_keeps_live_entries() {
        let store = InMemoryRevocationStore::new();
        let now = chrono::Utc::now();
        store.insert("live", now + Duration::minutes(5));
        store.insert("lapsed", now - Duration::minutes(5));

        assert!(!store.remove_if_expired("live", now));
        assert!(store.remove_if_expired("lapsed", now));
        assert!(!store.remove_if_expired("missing", now));

        assert_eq!(store.get("live"), Some(now + Duration::minutes(5)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn re_revoking_a_lapsed_jti_is_honoured() {
        let clock = Arc::new(ManualClock::default());
        let blacklist = TokenBlacklist::in_memory(clock.clone());

        blacklist.revoke("jti-2");
        clock.advance(Duration::hours(BLACKLIST_TTL_HOURS));
        blacklist.revoke("jti-2");

        assert!(blacklist.is_revoked("jti-2"));
        assert_eq!(blacklist.len(), 1);
    }

    #[test]
    fn separate_stores_are_isolated() {
        let clock = Arc::new(ManualClock::default());
        let a = TokenBlacklist::in_memory(clock.clone());
        let b = TokenBlacklist::in_memory(clock);

        a.revoke("shared-jti");
        assert!(a.is_revoked("shared-jti"));
        assert!(!b.is_revoked("shared-jti"));
    }
}
