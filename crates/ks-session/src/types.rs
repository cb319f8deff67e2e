use std::fmt;
use std::time::{Duration, Instant};

use ks_core::focus::FocusArea;
use ks_core::InputState;

/// Stable handle for one editing surface, assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Secondary,
    Middle,
}

/// Selected range in character offsets, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Caret inside the selection or one position outside either bound.
    /// Empty selections never hold the caret.
    pub fn holds_caret(&self, offset: usize) -> bool {
        !self.is_empty() && offset + 1 >= self.start && offset <= self.end + 1
    }
}

/// Editor notifications, each delivered with the time it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A document changed; every surface showing it is listed.
    DocumentChanged { surfaces: Vec<SurfaceId> },
    CaretMoved {
        surface: SurfaceId,
        old_offset: usize,
        new_offset: usize,
    },
    MousePressed {
        surface: SurfaceId,
        button: MouseButton,
    },
    MouseReleased {
        surface: SurfaceId,
        button: MouseButton,
    },
    SurfaceOpened { surface: SurfaceId },
    SurfaceDisposed { surface: SurfaceId },
    /// Focus owner changed. `chain` holds container type names from the
    /// focused component outward.
    FocusChanged { chain: Vec<String> },
}

impl HostEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DocumentChanged { .. } => "document_changed",
            Self::CaretMoved { .. } => "caret_moved",
            Self::MousePressed { .. } => "mouse_pressed",
            Self::MouseReleased { .. } => "mouse_released",
            Self::SurfaceOpened { .. } => "surface_opened",
            Self::SurfaceDisposed { .. } => "surface_disposed",
            Self::FocusChanged { .. } => "focus_changed",
        }
    }
}

/// Engine delays. Not part of the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Caret moves closer than this to the last edit are typing side effects.
    pub input_threshold: Duration,
    /// Delay before inspecting a moved caret, letting the selection settle.
    pub caret_settle: Duration,
    /// Delay before applying the rename-field default.
    pub rename_defer: Duration,
    pub keystroke_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            input_threshold: Duration::from_millis(100),
            caret_settle: Duration::from_millis(1),
            rename_defer: Duration::from_millis(1),
            keystroke_interval: ks_core::backend::keystroke::MIN_PRESS_INTERVAL,
        }
    }
}

/// What produced a desired state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Caret,
    SelectionRelease,
    Focus(FocusArea),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The input method was already in the desired state.
    Unchanged,
    Switched,
    /// A toggle was needed but the strategy did not perform it.
    SwitchFailed,
}

/// Result of one decision cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub trigger: Trigger,
    pub surface: Option<SurfaceId>,
    pub desired: InputState,
    pub current: InputState,
    pub outcome: Outcome,
    pub at: Instant,
}
