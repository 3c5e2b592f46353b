use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{GenerateRequest, GenerateResponse};

struct Entry {
    response: GenerateResponse,
    inserted_at: Instant,
}

/// Bounded, time-expiring cache of completions keyed by the full request.
///
/// Identical prompts within the TTL reuse the stored completion instead of
/// paying for a second model call. When the cache is full, expired entries are
/// purged first and then the oldest entry is evicted.
pub struct ResponseCache {
    entries: Mutex<HashMap<GenerateRequest, Entry>>,
    ttl: Duration,
    capacity: usize,
}

impl ResponseCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    pub fn get(&self, req: &GenerateRequest) -> Option<GenerateResponse> {
        self.get_at(req, Instant::now())
    }

    pub fn insert(&self, req: GenerateRequest, response: GenerateResponse) {
        self.insert_at(req, response, Instant::now());
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_at(&self, req: &GenerateRequest, now: Instant) -> Option<GenerateResponse> {
        let mut entries = self.lock();
        let entry = entries.get(req)?;
        if now.duration_since(entry.inserted_at) < self.ttl {
            return Some(entry.response.clone());
        }
        entries.remove(req);
        None
    }

    fn insert_at(&self, req: GenerateRequest, response: GenerateResponse, now: Instant) {
        if self.capacity == 0 {
            return;
        }

        let mut entries = self.lock();
        if !entries.contains_key(&req) && entries.len() >= self.capacity {
            let ttl = self.ttl;
            entries.retain(|_, entry| now.duration_since(entry.inserted_at) < ttl);

            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(key, _)| key.clone());
                if let Some(key) = oldest {
                    entries.remove(&key);
                }
            }
        }

        entries.insert(
            req,
            Entry {
                response,
                inserted_at: now,
            },
        );
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<GenerateRequest, Entry>> {
        // A poisoned lock only means another thread panicked mid-insert; the map is still usable.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model: "gpt-4.1-mini".to_string(),
            system: "You are a helpful assistant.".to_string(),
            prompt: prompt.to_string(),
            max_tokens: 1500,
        }
    }

    fn response(content: &str) -> GenerateResponse {
        GenerateResponse {
            content: content.to_string(),
            model: "gpt-4.1-mini".to_string(),
            input_tokens: 10,
            output_tokens: 20,
            finish_reason: "stop".to_string(),
        }
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = ResponseCache::new(10, Duration::from_secs(300));
        cache.insert(request("a"), response("first"));

        let hit = cache.get(&request("a")).unwrap();
        assert_eq!(hit.content, "first");
        assert!(cache.get(&request("b")).is_none());
    }

    #[test]
    fn test_key_includes_every_request_field() {
        let cache = ResponseCache::new(10, Duration::from_secs(300));
        cache.insert(request("a"), response("first"));

        let mut other_model = request("a");
        other_model.model = "gpt-4.1".to_string();
        let mut other_limit = request("a");
        other_limit.max_tokens = 10;

        assert!(cache.get(&other_model).is_none());
        assert!(cache.get(&other_limit).is_none());
    }

    #[test]
    fn test_expired_entry_misses_and_is_dropped() {
        let cache = ResponseCache::new(10, Duration::from_secs(300));
        let start = Instant::now();
        cache.insert_at(request("a"), response("first"), start);

        assert!(cache.get_at(&request("a"), start + Duration::from_secs(299)).is_some());
        assert!(cache.get_at(&request("a"), start + Duration::from_secs(300)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_full_cache_evicts_oldest() {
        let cache = ResponseCache::new(2, Duration::from_secs(300));
        let start = Instant::now();
        cache.insert_at(request("a"), response("a"), start);
        cache.insert_at(request("b"), response("b"), start + Duration::from_secs(1));
        cache.insert_at(request("c"), response("c"), start + Duration::from_secs(2));

        let now = start + Duration::from_secs(3);
        assert_eq!(cache.len(), 2);
        assert!(cache.get_at(&request("a"), now).is_none());
        assert!(cache.get_at(&request("b"), now).is_some());
        assert!(cache.get_at(&request("c"), now).is_some());
    }

    #[test]
    fn test_full_cache_prefers_purging_expired() {
        let cache = ResponseCache::new(2, Duration::from_secs(10));
        let start = Instant::now();
        cache.insert_at(request("old"), response("old"), start);
        cache.insert_at(request("b"), response("b"), start + Duration::from_secs(9));
        cache.insert_at(request("c"), response("c"), start + Duration::from_secs(11));

        let now = start + Duration::from_secs(12);
        assert!(cache.get_at(&request("b"), now).is_some());
        assert!(cache.get_at(&request("c"), now).is_some());
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = ResponseCache::new(0, Duration::from_secs(300));
        cache.insert(request("a"), response("a"));
        assert!(cache.is_empty());
    }
}
