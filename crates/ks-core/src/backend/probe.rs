//! Native IME mode probe.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::platform::{ImeQuery, ImeStatus};
use crate::InputState;

/// Reads the foreground window's IME conversion mode.
///
/// Never fails: a missing IME window means English, and any lookup error is
/// logged and also reported as English.
#[derive(Clone)]
pub struct ImeProbe {
    ime: Arc<dyn ImeQuery>,
}

impl ImeProbe {
    pub fn new(ime: Arc<dyn ImeQuery>) -> Self {
        Self { ime }
    }

    pub fn current_state(&self) -> InputState {
        match self.ime.foreground_ime_status() {
            Ok(ImeStatus::NoImeWindow) => {
                debug!("no IME window for foreground window, assuming English");
                InputState::English
            }
            Ok(ImeStatus::ConversionMode(0)) => InputState::English,
            Ok(ImeStatus::ConversionMode(mode)) => {
                debug!(mode, "IME in native conversion mode");
                InputState::Chinese
            }
            Err(e) => {
                warn!(error = %e, "IME probe failed, assuming English");
                InputState::English
            }
        }
    }
}
