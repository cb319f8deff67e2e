//! Input-method switch backend.
//!
//! A switch strategy answers two questions about the OS input method: what
//! mode it is in now, and how to flip it. `StrategyRegistry` hands out one
//! long-lived instance per `StrategyKind`.

pub mod automation;
pub mod keystroke;
pub mod probe;
pub mod registry;

use std::fmt;
use std::str::FromStr;

pub use automation::{AutomationError, CacheState, UiAutomationSwitcher};
pub use keystroke::KeystrokeSwitcher;
pub use probe::ImeProbe;
pub use registry::{Strategy, StrategyRegistry};

use crate::InputState;

/// Two-method contract every switch strategy implements.
///
/// Neither method fails: OS errors are logged inside the strategy and
/// degrade to "no change performed" / `InputState::English`.
pub trait ModeSwitch {
    /// Request a mode flip. Returns `true` when a flip was actually issued.
    fn toggle(&mut self) -> bool;

    fn current_state(&mut self) -> InputState;
}

/// Closed set of switch strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StrategyKind {
    /// Simulated left-Shift tap.
    Keystroke,
    /// Default action on the taskbar input indicator.
    #[default]
    UiAutomation,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 2] = [Self::Keystroke, Self::UiAutomation];

    pub fn name(self) -> &'static str {
        match self {
            Self::Keystroke => "keystroke",
            Self::UiAutomation => "ui-automation",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StrategyError {
    #[error("invalid switcher strategy: {0:?}")]
    InvalidStrategyName(String),
}

impl FromStr for StrategyKind {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keystroke" | "KeyboardSwitcher" => Ok(Self::Keystroke),
            "ui-automation" | "UIAutomationSwitcher" => Ok(Self::UiAutomation),
            _ => Err(StrategyError::InvalidStrategyName(s.to_string())),
        }
    }
}
