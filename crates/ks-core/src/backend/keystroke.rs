//! Keystroke switch strategy: tap left Shift to flip the IME mode.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, debug_span, info, warn};

use super::probe::ImeProbe;
use super::ModeSwitch;
use crate::platform::KeyInjector;
use crate::InputState;

/// Taps closer together than this are dropped. Cursor, selection and focus
/// triggers can race; two taps would flip the mode back.
pub const MIN_PRESS_INTERVAL: Duration = Duration::from_millis(100);

pub struct KeystrokeSwitcher {
    keys: Arc<dyn KeyInjector>,
    probe: ImeProbe,
    min_interval: Duration,
    last_press: Option<Instant>,
}

impl KeystrokeSwitcher {
    pub fn new(keys: Arc<dyn KeyInjector>, probe: ImeProbe) -> Self {
        Self {
            keys,
            probe,
            min_interval: MIN_PRESS_INTERVAL,
            last_press: None,
        }
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    pub fn set_min_interval(&mut self, min_interval: Duration) {
        self.min_interval = min_interval;
    }

    /// Tap the switch key unless the previous tap was less than
    /// `min_interval` before `now`.
    pub fn toggle_at(&mut self, now: Instant) -> bool {
        let _span = debug_span!("keystroke_toggle").entered();
        if let Some(last) = self.last_press {
            if now.saturating_duration_since(last) < self.min_interval {
                debug!("switch key tapped too recently, dropping");
                return false;
            }
        }

        let started = Instant::now();
        match self.keys.tap_switch_key() {
            Ok(()) => {
                self.last_press = Some(now);
                info!(
                    elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
                    "switch key tapped"
                );
                true
            }
            Err(e) => {
                warn!(error = %e, "switch key injection failed");
                false
            }
        }
    }
}

impl ModeSwitch for KeystrokeSwitcher {
    fn toggle(&mut self) -> bool {
        self.toggle_at(Instant::now())
    }

    fn current_state(&mut self) -> InputState {
        self.probe.current_state()
    }
}
