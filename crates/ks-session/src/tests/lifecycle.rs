use ks_core::InputState;

use super::{Harness, IDLE};
use crate::scheduler::TaskKey;
use crate::{HostEvent, MouseButton};

#[test]
fn test_dispose_purges_tracking_and_pending_check() {
    let mut h = Harness::new(InputState::Chinese);
    let s = h.open(1, "");
    h.type_text(s, "ab");
    h.send(HostEvent::MousePressed {
        surface: s,
        button: MouseButton::Primary,
    });
    assert!(h.engine.surfaces().contains(s));
    assert!(h.engine.scheduler().is_pending(TaskKey::CaretCheck(s)));

    h.dispose(s);
    assert!(!h.engine.surfaces().contains(s));
    assert!(!h.engine.scheduler().is_pending(TaskKey::CaretCheck(s)));
    assert_eq!(h.settle(), None);
}

#[test]
fn test_events_for_disposed_surface_are_no_ops() {
    let mut h = Harness::new(InputState::Chinese);
    let s = h.open(1, "abc");
    h.dispose(s);

    h.send(HostEvent::DocumentChanged { surfaces: vec![s] });
    h.send(HostEvent::MousePressed {
        surface: s,
        button: MouseButton::Primary,
    });
    h.move_caret(s, 2);
    h.send(HostEvent::SurfaceOpened { surface: s });

    assert!(h.engine.surfaces().is_empty());
    assert!(h.engine.scheduler().is_empty());
    assert_eq!(h.settle(), None);
    assert_eq!(h.ime.toggles(), 0);
}

#[test]
fn test_check_firing_after_host_disposal_purges() {
    let mut h = Harness::new(InputState::Chinese);
    let s = h.open(1, "abc");
    h.move_caret(s, 2);
    // Host closes the surface before its disposal event reaches the engine.
    h.host.doc(s).disposed = true;
    assert_eq!(h.settle(), None);
    assert!(!h.engine.surfaces().contains(s));
}

#[test]
fn test_reused_identity_starts_clean() {
    let mut h = Harness::new(InputState::Chinese);
    let s = h.open(1, "");
    h.type_text(s, "abc");
    h.dispose(s);

    // Same id, new surface: the old edit time must not suppress navigation.
    let s = h.open(1, "xyz");
    h.move_caret(s, 2);
    assert!(h.settle().is_some());
}

#[test]
fn test_disposing_one_surface_keeps_others() {
    let mut h = Harness::new(InputState::Chinese);
    let a = h.open(1, "a");
    let b = h.open(2, "b");
    h.move_caret(a, 1);
    h.move_caret(b, 1);
    h.dispose(a);

    assert!(h.engine.surfaces().contains(b));
    let d = h.settle().unwrap();
    assert_eq!(d.surface, Some(b));
}

#[test]
fn test_engine_dispose_clears_everything() {
    let mut h = Harness::new(InputState::Chinese);
    let a = h.open(1, "a");
    h.open(2, "b");
    h.move_caret(a, 1);
    h.focus(&["RenameDialog"]);

    h.engine.dispose();
    assert!(h.engine.surfaces().is_empty());
    assert!(h.engine.scheduler().is_empty());
    h.advance(IDLE);
    assert_eq!(h.tick(), None);
    assert_eq!(h.ime.toggles(), 0);
}
