//! Single-threaded cooperative scheduler for deferred engine work.
//!
//! Tasks are keyed: scheduling a task replaces any pending task with the same
//! key. Nothing runs on its own; the owner drains due tasks with `take_due`
//! on the event thread.

use std::time::Instant;

use ks_core::focus::FocusArea;

use crate::types::SurfaceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKey {
    CaretCheck(SurfaceId),
    FocusApply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Inspect the character before `offset` once the selection has settled.
    CaretCheck {
        surface: SurfaceId,
        offset: usize,
        moved_at: Instant,
    },
    /// Apply the configured default for a focus area.
    FocusApply { area: FocusArea },
}

impl Task {
    pub fn key(&self) -> TaskKey {
        match self {
            Self::CaretCheck { surface, .. } => TaskKey::CaretCheck(*surface),
            Self::FocusApply { .. } => TaskKey::FocusApply,
        }
    }
}

#[derive(Debug)]
struct Scheduled {
    due: Instant,
    seq: u64,
    task: Task,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    pending: Vec<Scheduled>,
    seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Instant, task: Task) {
        self.cancel(task.key());
        self.seq += 1;
        self.pending.push(Scheduled {
            due,
            seq: self.seq,
            task,
        });
    }

    pub fn cancel(&mut self, key: TaskKey) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.task.key() != key);
        self.pending.len() != before
    }

    pub fn cancel_surface(&mut self, surface: SurfaceId) -> bool {
        self.cancel(TaskKey::CaretCheck(surface))
    }

    /// Remove and return tasks due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<Task> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|s| s.due <= now);
        self.pending = pending;
        due.sort_by_key(|s| (s.due, s.seq));
        due.into_iter().map(|s| s.task).collect()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|s| s.due).min()
    }

    pub fn is_pending(&self, key: TaskKey) -> bool {
        self.pending.iter().any(|s| s.task.key() == key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn caret(surface: u64, offset: usize, at: Instant) -> Task {
        Task::CaretCheck {
            surface: SurfaceId(surface),
            offset,
            moved_at: at,
        }
    }

    #[test]
    fn test_reschedule_replaces_same_key() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(t0, caret(1, 3, t0));
        s.schedule(t0 + Duration::from_millis(1), caret(1, 4, t0));
        s.schedule(t0, caret(2, 0, t0));
        assert_eq!(s.len(), 2);

        let due = s.take_due(t0 + Duration::from_millis(1));
        assert_eq!(due, vec![caret(2, 0, t0), caret(1, 4, t0)]);
        assert!(s.is_empty());
    }

    #[test]
    fn test_take_due_leaves_future_tasks() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(t0 + Duration::from_millis(5), Task::FocusApply {
            area: FocusArea::RenameField,
        });
        s.schedule(t0 + Duration::from_millis(1), caret(1, 0, t0));

        assert!(s.take_due(t0).is_empty());
        assert_eq!(s.next_due(), Some(t0 + Duration::from_millis(1)));
        assert_eq!(s.take_due(t0 + Duration::from_millis(2)).len(), 1);
        assert!(s.is_pending(TaskKey::FocusApply));
    }

    #[test]
    fn test_cancel_surface() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(t0, caret(7, 1, t0));
        s.schedule(t0, Task::FocusApply {
            area: FocusArea::RenameField,
        });
        assert!(s.cancel_surface(SurfaceId(7)));
        assert!(!s.cancel_surface(SurfaceId(7)));
        assert_eq!(s.take_due(t0), vec![Task::FocusApply {
            area: FocusArea::RenameField
        }]);
    }
}
