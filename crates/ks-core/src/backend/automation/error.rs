use crate::platform::AutomationFault;

/// Failure of one pipeline step while locating or pressing the indicator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AutomationError {
    #[error("COM initialization failed: {0}")]
    ComInitFailed(AutomationFault),
    #[error("UI automation client could not be created: {0}")]
    AutomationCreateFailed(AutomationFault),
    #[error("taskbar window not found{}", cause(.0))]
    TrayWindowNotFound(Option<AutomationFault>),
    #[error("no automation element for the taskbar window{}", cause(.0))]
    ElementFromHandleFailed(Option<AutomationFault>),
    #[error("taskbar button search returned nothing{}", cause(.0))]
    ButtonsNotFound(Option<AutomationFault>),
    #[error("indicator default action failed: {0}")]
    ButtonInvokeFailed(AutomationFault),
    #[error("none of {scanned} taskbar buttons looks like the input indicator")]
    NoValidButton { scanned: usize },
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<AutomationError>,
    },
}

fn cause(fault: &Option<AutomationFault>) -> String {
    fault
        .as_ref()
        .map(|f| format!(": {f}"))
        .unwrap_or_default()
}

impl AutomationError {
    /// Stable tag for logs.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ComInitFailed(_) => "com_init_failed",
            Self::AutomationCreateFailed(_) => "automation_create_failed",
            Self::TrayWindowNotFound(_) => "tray_window_not_found",
            Self::ElementFromHandleFailed(_) => "element_from_handle_failed",
            Self::ButtonsNotFound(_) => "buttons_not_found",
            Self::ButtonInvokeFailed(_) => "button_invoke_failed",
            Self::NoValidButton { .. } => "no_valid_button",
            Self::RetriesExhausted { .. } => "retries_exhausted",
        }
    }

    /// Client setup failures won't be fixed by searching again.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::ComInitFailed(_) | Self::AutomationCreateFailed(_) | Self::RetriesExhausted { .. }
        )
    }

    pub fn fault(&self) -> Option<&AutomationFault> {
        match self {
            Self::ComInitFailed(f) | Self::AutomationCreateFailed(f) | Self::ButtonInvokeFailed(f) => {
                Some(f)
            }
            Self::TrayWindowNotFound(f)
            | Self::ElementFromHandleFailed(f)
            | Self::ButtonsNotFound(f) => f.as_ref(),
            Self::NoValidButton { .. } => None,
            Self::RetriesExhausted { last, .. } => last.fault(),
        }
    }

    /// Whether the cached lookup state should be dropped. A failed default
    /// action on a live element leaves the element cached.
    pub fn invalidates_cache(&self) -> bool {
        match self {
            Self::ButtonInvokeFailed(fault) => fault.is_stale_element(),
            _ => true,
        }
    }

    /// The element reference went stale mid-operation.
    pub fn is_stale(&self) -> bool {
        self.fault().is_some_and(AutomationFault::is_stale_element)
    }

    /// Innermost error; unwraps `RetriesExhausted`.
    pub fn last(&self) -> &AutomationError {
        match self {
            Self::RetriesExhausted { last, .. } => last.last(),
            other => other,
        }
    }

    /// Wrap a fault raised by a lookup step, diverting threading-model
    /// faults to `ComInitFailed`.
    pub(crate) fn at_step(
        fault: AutomationFault,
        step: fn(Option<AutomationFault>) -> AutomationError,
    ) -> Self {
        if fault.is_changed_mode() {
            Self::ComInitFailed(fault)
        } else {
            step(Some(fault))
        }
    }

    pub(crate) fn from_connect(fault: AutomationFault) -> Self {
        if fault.is_create_failure() && !fault.is_changed_mode() {
            Self::AutomationCreateFailed(fault)
        } else {
            Self::ComInitFailed(fault)
        }
    }

    pub(crate) fn from_invoke(fault: AutomationFault) -> Self {
        if fault.is_changed_mode() {
            Self::ComInitFailed(fault)
        } else {
            Self::ButtonInvokeFailed(fault)
        }
    }
}
