use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Single-slot cache with wall-clock expiry. Readers inside the window share
/// one `Arc` of the stored value; an expired or invalidated slot reads as
/// empty. Per-process only.
#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: Duration,
    slot: Mutex<Option<Entry<T>>>,
}

#[derive(Debug)]
struct Entry<T> {
    stored_at: Instant,
    value: Arc<T>,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, slot: Mutex::new(None) }
    }

    pub fn get(&self) -> Option<Arc<T>> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match &*slot {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    pub fn put(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Entry {
            stored_at: Instant::now(),
            value: value.clone(),
        });
        value
    }

    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn readers_inside_ttl_share_one_reference() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let stored = cache.put(vec![1, 2, 3]);

        let first = cache.get().unwrap();
        let second = cache.get().unwrap();
        assert!(Arc::ptr_eq(&stored, &first));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn expired_slot_reads_as_empty() {
        let cache = TtlCache::new(Duration::from_millis(20));
        cache.put(vec![1]);
        assert!(cache.get().is_some());

        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get().is_none());
    }

    #[test]
    fn invalidate_clears_the_slot() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.put(vec![1]);
        cache.invalidate();
        assert!(cache.get().is_none());
    }
}
