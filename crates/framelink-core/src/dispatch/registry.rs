use std::sync::Arc;

use crate::source::Tick;

/// Handle identifying a registered listener.
///
/// Identifiers come from a monotonic counter and are never reused within a
/// registry's lifetime, so a stale handle can only ever miss.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ListenId(u64);

/// Callback invoked once per tick.
pub type Listener = Arc<dyn Fn(Tick) + Send + Sync>;

/// Identity-keyed listener set.
///
/// Entries keep registration order, so a snapshot iterates
/// deterministically for a fixed registration sequence.
#[derive(Default)]
pub struct ListenerRegistry {
    next: u64,
    entries: Vec<(ListenId, Listener)>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` and returns a fresh identifier.
    pub fn add(&mut self, listener: Listener) -> ListenId {
        self.next += 1;
        let id = ListenId(self.next);
        self.entries.push((id, listener));
        id
    }

    /// Removes at most one entry. Returns whether anything was removed;
    /// removing an unknown or already-removed id is a no-op.
    pub fn remove(&mut self, id: ListenId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    /// Point-in-time copy in registration order.
    ///
    /// Safe to iterate while the live set is mutated: entries added after
    /// the snapshot are absent from it, and removed entries stay callable
    /// through their cloned `Arc` for the duration of the iteration.
    pub fn snapshot(&self) -> Vec<(ListenId, Listener)> {
        self.entries
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect()
    }

    /// Drops every entry. Identifiers are not reset.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
