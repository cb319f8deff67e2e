//! Interfaces the engine consumes from the editor and the presentation layer.

use std::ops::Range;

use ks_core::InputState;

use crate::types::{Selection, SurfaceId};

/// Read-only view of the editor, queried on the event thread.
pub trait EditorHost {
    fn is_disposed(&self, surface: SurfaceId) -> bool;

    fn caret_offset(&self, surface: SurfaceId) -> usize;

    /// Current selection, or `None` when nothing is selected.
    fn selection(&self, surface: SurfaceId) -> Option<Selection>;

    /// Text in a character-offset range; `None` when out of bounds.
    fn text(&self, surface: SurfaceId, range: Range<usize>) -> Option<String>;
}

/// Receives the state the engine switched to. Must not block.
pub trait FeedbackSink {
    /// `surface` is `None` for focus-area decisions.
    fn notify_mode_changed(&self, surface: Option<SurfaceId>, state: InputState);
}

/// Character immediately before `offset`.
pub(crate) fn char_before(
    host: &dyn EditorHost,
    surface: SurfaceId,
    offset: usize,
) -> Option<char> {
    if offset == 0 {
        return None;
    }
    host.text(surface, offset - 1..offset)?.chars().next_back()
}
