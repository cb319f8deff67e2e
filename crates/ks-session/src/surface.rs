//! Per-surface tracking state.

use std::collections::HashMap;
use std::time::Instant;

use crate::types::SurfaceId;

#[derive(Debug, Default, Clone, Copy)]
struct SurfaceState {
    last_input: Option<Instant>,
    selecting: bool,
}

/// Tracking records keyed by surface. Entries are removed only by
/// `dispose` or `clear`.
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    surfaces: HashMap<SurfaceId, SurfaceState>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, surface: SurfaceId) {
        self.surfaces.entry(surface).or_default();
    }

    pub fn record_input(&mut self, surface: SurfaceId, at: Instant) {
        self.surfaces.entry(surface).or_default().last_input = Some(at);
    }

    pub fn last_input(&self, surface: SurfaceId) -> Option<Instant> {
        self.surfaces.get(&surface).and_then(|s| s.last_input)
    }

    pub fn begin_selection(&mut self, surface: SurfaceId) {
        self.surfaces.entry(surface).or_default().selecting = true;
    }

    /// Clear the selection-in-progress mark, returning whether it was set.
    pub fn take_selection(&mut self, surface: SurfaceId) -> bool {
        match self.surfaces.get_mut(&surface) {
            Some(state) => std::mem::take(&mut state.selecting),
            None => false,
        }
    }

    pub fn is_selecting(&self, surface: SurfaceId) -> bool {
        self.surfaces.get(&surface).is_some_and(|s| s.selecting)
    }

    /// Remove every record for `surface`. Returns whether one existed.
    pub fn dispose(&mut self, surface: SurfaceId) -> bool {
        self.surfaces.remove(&surface).is_some()
    }

    pub fn contains(&self, surface: SurfaceId) -> bool {
        self.surfaces.contains_key(&surface)
    }

    pub fn surfaces(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        self.surfaces.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn clear(&mut self) {
        self.surfaces.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_selection_mark_is_taken_once() {
        let mut r = SurfaceRegistry::new();
        let s = SurfaceId(1);
        assert!(!r.take_selection(s));
        r.begin_selection(s);
        assert!(r.is_selecting(s));
        assert!(r.take_selection(s));
        assert!(!r.take_selection(s));
    }

    #[test]
    fn test_dispose_removes_everything() {
        let mut r = SurfaceRegistry::new();
        let now = Instant::now();
        r.record_input(SurfaceId(1), now);
        r.begin_selection(SurfaceId(1));
        r.record_input(SurfaceId(2), now + Duration::from_millis(5));

        assert!(r.dispose(SurfaceId(1)));
        assert!(!r.contains(SurfaceId(1)));
        assert_eq!(r.last_input(SurfaceId(1)), None);
        assert!(!r.is_selecting(SurfaceId(1)));
        assert_eq!(r.len(), 1);
        assert!(!r.dispose(SurfaceId(1)));
    }

    #[test]
    fn test_open_keeps_existing_record() {
        let mut r = SurfaceRegistry::new();
        let now = Instant::now();
        r.record_input(SurfaceId(3), now);
        r.open(SurfaceId(3));
        assert_eq!(r.last_input(SurfaceId(3)), Some(now));
    }
}
