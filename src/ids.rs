//! Monotonic job id allocator.
//!
//! A single mutex guards the counter; `next` and `last_issued` never
//! observe a torn value between them.

use std::sync::Mutex;

/// Source of strictly increasing job ids, starting at 1.
pub struct IdAllocator {
    next_id: Mutex<u64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(1),
        }
    }

    /// Allocate and return the next id, starting from 1.
    #[allow(clippy::unwrap_used)]
    pub fn next(&self) -> u64 {
        let mut guard = self.next_id.lock().unwrap();
        let id = *guard;
        *guard += 1;
        id
    }

    /// The largest id issued so far, or 0 if none have been issued.
    #[allow(clippy::unwrap_used)]
    pub fn last_issued(&self) -> u64 {
        let guard = self.next_id.lock().unwrap();
        *guard - 1
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn starts_at_one() {
        let alloc = IdAllocator::new();
        assert_eq!(alloc.last_issued(), 0);
        assert_eq!(alloc.next(), 1);
        assert_eq!(alloc.next(), 2);
        assert_eq!(alloc.last_issued(), 2);
    }

    #[test]
    fn concurrent_allocation_has_no_gaps_or_duplicates() {
        let alloc = Arc::new(IdAllocator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let alloc = Arc::clone(&alloc);
            handles.push(thread::spawn(move || {
                (0..100).map(|_| alloc.next()).collect::<Vec<_>>()
            }));
        }

        let mut ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("worker thread panicked"))
            .collect();
        ids.sort_unstable();

        let expected: Vec<u64> = (1..=800).collect();
        assert_eq!(ids, expected);
        assert_eq!(alloc.last_issued(), 800);
    }
}
