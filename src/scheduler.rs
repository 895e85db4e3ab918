//! Deferred work with cancellation handles.
//!
//! Entries carry a payload and a deadline. Nothing runs on its own: the owner
//! polls `take_due` from its event loop, which keeps everything on one thread
//! and lets tests fire entries deterministically.

use std::time::Instant;

/// Identifies one scheduled entry so it can be cancelled before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeleteHandle(u64);

#[derive(Debug)]
struct Entry<T> {
    handle: DeleteHandle,
    due: Instant,
    payload: T,
}

#[derive(Debug)]
pub struct Deferred<T> {
    entries: Vec<Entry<T>>,
    next_handle: u64,
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Deferred {
            entries: Vec::new(),
            next_handle: 1,
        }
    }
}

impl<T> Deferred<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, payload: T, due: Instant) -> DeleteHandle {
        let handle = DeleteHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push(Entry { handle, due, payload });
        handle
    }

    /// Remove an entry that has not fired yet and hand back its payload.
    pub fn cancel(&mut self, handle: DeleteHandle) -> Option<T> {
        let idx = self.entries.iter().position(|e| e.handle == handle)?;
        Some(self.entries.remove(idx).payload)
    }

    /// Remove and return every entry whose deadline is at or before `now`,
    /// earliest deadline first.
    pub fn take_due(&mut self, now: Instant) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.due <= now);
        self.entries = pending;
        due.sort_by_key(|e| (e.due, e.handle.0));
        due.into_iter().map(|e| e.payload).collect()
    }

    /// Remove and return every entry regardless of deadline, earliest first.
    pub fn drain(&mut self) -> Vec<T> {
        let mut all = std::mem::take(&mut self.entries);
        all.sort_by_key(|e| (e.due, e.handle.0));
        all.into_iter().map(|e| e.payload).collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.due).min()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.payload)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_take_due_respects_deadlines() {
        let t0 = Instant::now();
        let mut q = Deferred::new();
        q.schedule("late", t0 + Duration::from_millis(500));
        q.schedule("early", t0 + Duration::from_millis(300));

        assert!(q.take_due(t0 + Duration::from_millis(299)).is_empty());
        assert_eq!(q.next_deadline(), Some(t0 + Duration::from_millis(300)));
        assert_eq!(q.take_due(t0 + Duration::from_millis(300)), vec!["early"]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.take_due(t0 + Duration::from_secs(10)), vec!["late"]);
        assert!(q.is_empty());
        assert_eq!(q.next_deadline(), None);
    }

    #[test]
    fn test_cancel_only_affects_unfired_entries() {
        let t0 = Instant::now();
        let mut q = Deferred::new();
        let a = q.schedule(1, t0);
        let b = q.schedule(2, t0);
        assert_ne!(a, b);

        assert_eq!(q.cancel(a), Some(1));
        assert_eq!(q.len(), 1);
        assert_eq!(q.cancel(a), None);

        assert_eq!(q.take_due(t0), vec![2]);
        assert_eq!(q.cancel(b), None);
    }

    #[test]
    fn test_drain_ignores_deadlines() {
        let t0 = Instant::now();
        let mut q = Deferred::new();
        q.schedule('b', t0 + Duration::from_secs(2));
        q.schedule('a', t0 + Duration::from_secs(1));
        assert_eq!(q.drain(), vec!['a', 'b']);
        assert!(q.is_empty());
    }
}
