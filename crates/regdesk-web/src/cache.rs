//! Short-lived response cache for department listings and status lookups.
//!
//! Entries carry an optional student-id tag so a change to one record can
//! evict every status response that was built from it. Student invalidations
//! also bump a generation counter; a fill that read the store before the bump
//! is discarded instead of caching a stale snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use regdesk_core::{Department, Lookup};

pub const DEPARTMENT_TTL: Duration = Duration::from_secs(30);
pub const STATUS_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    student_id: Option<String>,
    expires_at: Instant,
}

#[derive(Default)]
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    generation: AtomicU64,
}

pub fn department_key(department: Department) -> String {
    format!("dept:{department}:students")
}

pub fn status_key(lookup: &Lookup) -> String {
    let kind = match lookup {
        Lookup::StudentId(_) => "id",
        Lookup::ApplicationNumber(_) => "app",
        Lookup::Email(_) => "email",
        Lookup::Phone(_) => "phone",
    };
    format!("status:{kind}:{}", lookup.value())
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let entry = self.entries.get(key)?;
        if Instant::now() >= entry.expires_at {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        tracing::debug!("cache hit: {key}");
        Some(entry.value.clone())
    }

    pub fn insert(
        &self,
        key: String,
        value: serde_json::Value,
        student_id: Option<String>,
        ttl: Duration,
    ) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                student_id,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Current invalidation generation. Take it before reading the store.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Inserts unless a student invalidation happened since `generation`.
    ///
    /// Returns whether the entry was kept.
    pub fn insert_if_unchanged(
        &self,
        key: String,
        value: serde_json::Value,
        student_id: Option<String>,
        ttl: Duration,
        generation: u64,
    ) -> bool {
        if self.generation() != generation {
            return false;
        }
        self.insert(key.clone(), value, student_id, ttl);
        // An invalidation that bumped between the check and the insert may
        // already have run its sweep.
        if self.generation() != generation {
            self.entries.remove(&key);
            return false;
        }
        true
    }

    pub fn invalidate_department(&self, department: Department) {
        self.entries.remove(&department_key(department));
        tracing::debug!("cache invalidated for department: {department}");
    }

    pub fn invalidate_student(&self, student_id: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries
            .retain(|_, e| e.student_id.as_deref() != Some(student_id));
        tracing::debug!("cache invalidated for student: {student_id}");
    }

    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, e| e.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expired_entries_are_not_returned() {
        let cache = ResponseCache::new();
        cache.insert("k".to_string(), json!(1), None, Duration::ZERO);
        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn invalidate_student_drops_every_tagged_entry() {
        let cache = ResponseCache::new();
        let id = Some("2025111111".to_string());
        cache.insert("status:id:2025111111".into(), json!("a"), id.clone(), STATUS_TTL);
        cache.insert("status:email:a@x.io".into(), json!("b"), id, STATUS_TTL);
        cache.insert("status:id:other".into(), json!("c"), Some("other".into()), STATUS_TTL);

        cache.invalidate_student("2025111111");
        assert!(cache.get("status:email:a@x.io").is_none());
        assert_eq!(cache.get("status:id:other"), Some(json!("c")));
    }

    #[test]
    fn department_keys_are_per_department() {
        let cache = ResponseCache::new();
        cache.insert(department_key(Department::Civil), json!([]), None, DEPARTMENT_TTL);
        cache.insert(department_key(Department::Chemical), json!([]), None, DEPARTMENT_TTL);
        cache.invalidate_department(Department::Civil);
        assert!(cache.get(&department_key(Department::Civil)).is_none());
        assert!(cache.get(&department_key(Department::Chemical)).is_some());
    }

    #[test]
    fn status_key_includes_lookup_kind() {
        assert_eq!(
            status_key(&Lookup::Phone("9876543210".into())),
            "status:phone:9876543210"
        );
    }

    #[test]
    fn fill_started_before_invalidation_is_discarded() {
        let cache = ResponseCache::new();
        let key = "status:id:2025111111".to_string();
        let before = cache.generation();

        // A photo upload lands while the status read is in flight.
        cache.invalidate_student("2025111111");

        let kept = cache.insert_if_unchanged(
            key.clone(),
            json!({ "status": "pending" }),
            Some("2025111111".into()),
            STATUS_TTL,
            before,
        );
        assert!(!kept);
        assert!(cache.get(&key).is_none());

        let now = cache.generation();
        assert!(cache.insert_if_unchanged(key.clone(), json!({}), None, STATUS_TTL, now));
        assert!(cache.get(&key).is_some());
    }

    #[test]
    fn cleanup_removes_only_expired() {
        let cache = ResponseCache::new();
        cache.insert("old".into(), json!(1), None, Duration::ZERO);
        cache.insert("new".into(), json!(2), None, STATUS_TTL);
        cache.cleanup_expired();
        assert_eq!(cache.len(), 1);
    }
}
