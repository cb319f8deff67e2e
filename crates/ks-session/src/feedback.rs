//! Routes mode-change notifications to the configured indicator style.

use std::time::Duration;

use ks_core::settings::{FeedbackKind, Rgb, SharedSettings};
use ks_core::InputState;
use tracing::debug;

use crate::host::FeedbackSink;
use crate::types::SurfaceId;

/// What the presentation layer should draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Recolor the caret; `dark` is for dark editor themes.
    CaretColor { light: Rgb, dark: Rgb },
    /// Short-lived label next to the caret.
    Balloon {
        label: &'static str,
        duration: Duration,
    },
}

/// Host side that actually draws indicators.
pub trait IndicatorRenderer {
    fn render(&self, surface: Option<SurfaceId>, indicator: Indicator);
}

/// `FeedbackSink` that picks the indicator style from the settings at
/// notification time.
pub struct FeedbackRouter {
    settings: SharedSettings,
    renderer: Box<dyn IndicatorRenderer>,
}

impl FeedbackRouter {
    pub fn new(settings: SharedSettings, renderer: Box<dyn IndicatorRenderer>) -> Self {
        Self { settings, renderer }
    }

    pub fn indicator_for(&self, state: InputState) -> Indicator {
        self.settings.read(|s| match s.feedback_kind() {
            FeedbackKind::CaretColor => {
                let light = s.feedback.caret_color(state);
                Indicator::CaretColor {
                    light,
                    dark: light.dark_variant(),
                }
            }
            FeedbackKind::Balloon => Indicator::Balloon {
                label: state.label(),
                duration: Duration::from_millis(s.feedback.balloon_duration_ms),
            },
        })
    }
}

impl FeedbackSink for FeedbackRouter {
    fn notify_mode_changed(&self, surface: Option<SurfaceId>, state: InputState) {
        let indicator = self.indicator_for(state);
        debug!(?surface, %state, ?indicator, "rendering mode indicator");
        self.renderer.render(surface, indicator);
    }
}
