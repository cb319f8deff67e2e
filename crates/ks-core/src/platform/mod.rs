//! Native OS capabilities behind narrow traits.
//!
//! The switch strategies only see `ImeQuery`, `KeyInjector` and
//! `AutomationApi`. Windows gets real bindings; other platforms get an
//! unsupported backend whose calls fail cleanly, and tests use fakes.

#[cfg(not(windows))]
mod unsupported;
#[cfg(windows)]
mod win32;

use std::fmt;
use std::sync::Arc;

/// IME attached to the foreground window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImeStatus {
    /// The window has no IME window at all (typical for English-only layouts).
    NoImeWindow,
    /// Raw conversion mode reported by the IME window; 0 is alphanumeric.
    ConversionMode(isize),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("no foreground window")]
    NoForegroundWindow,
    #[error("IME query unsupported on this platform")]
    Unsupported,
    #[error("IME query failed: {0}")]
    Native(String),
}

pub trait ImeQuery: Send + Sync {
    fn foreground_ime_status(&self) -> Result<ImeStatus, ProbeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectError {
    #[error("keyboard injection unsupported on this platform")]
    Unsupported,
    #[error("keyboard injection rejected: {sent} of {expected} events sent")]
    Rejected { sent: u32, expected: u32 },
    #[error("keyboard injection failed: {0}")]
    Native(String),
}

pub trait KeyInjector: Send + Sync {
    /// Press and release the key that IME frameworks treat as "switch mode".
    fn tap_switch_key(&self) -> Result<(), InjectError>;
}

/// Error surfaced by an accessibility call.
///
/// The message carries the OS error signature (e.g. `0x80040201`); the
/// switch state machine classifies faults by those signatures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AutomationFault {
    pub message: String,
}

/// UIA_E_ELEMENTNOTAVAILABLE: the element reference went stale.
pub const STALE_ELEMENT_SIGNATURES: [&str; 2] = ["0x80040201", "element reference is stale"];
/// The thread's COM apartment was already initialized with another model.
pub const CHANGED_MODE_SIGNATURE: &str = "RPC_E_CHANGED_MODE";
/// The automation client object could not be created.
pub const CREATE_FAILED_SIGNATURE: &str = "CoCreateInstance(CUIAutomation)";

impl AutomationFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn is_stale_element(&self) -> bool {
        STALE_ELEMENT_SIGNATURES
            .iter()
            .any(|sig| self.message.contains(sig))
    }

    pub fn is_changed_mode(&self) -> bool {
        self.message.contains(CHANGED_MODE_SIGNATURE)
    }

    pub fn is_create_failure(&self) -> bool {
        self.message.contains(CREATE_FAILED_SIGNATURE)
    }
}

/// Accessibility-tree operations needed to find and press the input indicator.
pub trait AutomationApi {
    type Window;
    type Element: Clone;

    /// Make sure the automation client exists. Called before every lookup;
    /// must be cheap once connected.
    fn connect(&mut self) -> Result<(), AutomationFault> {
        Ok(())
    }

    /// Taskbar window by class name; `None` when absent.
    fn find_tray_window(&mut self) -> Result<Option<Self::Window>, AutomationFault>;

    /// Automation root for a window handle; `None` when the lookup yields nothing.
    fn element_from_window(
        &mut self,
        window: &Self::Window,
    ) -> Result<Option<Self::Element>, AutomationFault>;

    /// All button-typed descendants of `root`, in tree order.
    fn find_buttons(&mut self, root: &Self::Element) -> Result<Vec<Self::Element>, AutomationFault>;

    fn name(&mut self, element: &Self::Element) -> Result<String, AutomationFault>;

    fn invoke_default_action(&mut self, element: &Self::Element) -> Result<(), AutomationFault>;
}

/// Taskbar UI generation; decides where the indicator usually sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellGeneration {
    Windows10,
    Windows11,
    Unknown,
}

impl ShellGeneration {
    pub fn from_build(build: u32) -> Self {
        match build {
            22000.. => Self::Windows11,
            10240..=21999 => Self::Windows10,
            _ => Self::Unknown,
        }
    }

    /// Offsets from the end of the taskbar button list to probe first.
    pub fn probe_offsets(self) -> &'static [usize] {
        match self {
            Self::Windows10 => &[4, 5],
            Self::Windows11 | Self::Unknown => &[5, 4],
        }
    }

    pub fn detect() -> Self {
        #[cfg(windows)]
        {
            win32::build_number().map_or(Self::Unknown, Self::from_build)
        }
        #[cfg(not(windows))]
        {
            Self::Unknown
        }
    }
}

impl fmt::Display for ShellGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Windows10 => "Windows 10",
            Self::Windows11 => "Windows 11",
            Self::Unknown => "unknown shell",
        })
    }
}

#[cfg(windows)]
pub type NativeAutomation = win32::UiAutomation;
#[cfg(not(windows))]
pub type NativeAutomation = unsupported::UnsupportedAutomation;

/// Everything a `StrategyRegistry` needs to build its strategies.
pub struct Backend<A> {
    pub ime: Arc<dyn ImeQuery>,
    pub keys: Arc<dyn KeyInjector>,
    pub automation: Box<dyn FnMut() -> A>,
    pub generation: ShellGeneration,
}

/// Bindings for the current OS.
pub fn native() -> Backend<NativeAutomation> {
    #[cfg(windows)]
    {
        Backend {
            ime: Arc::new(win32::Imm32),
            keys: Arc::new(win32::ShiftTap),
            automation: Box::new(win32::UiAutomation::default),
            generation: ShellGeneration::detect(),
        }
    }
    #[cfg(not(windows))]
    {
        Backend {
            ime: Arc::new(unsupported::UnsupportedIme),
            keys: Arc::new(unsupported::UnsupportedKeys),
            automation: Box::new(|| unsupported::UnsupportedAutomation),
            generation: ShellGeneration::Unknown,
        }
    }
}
