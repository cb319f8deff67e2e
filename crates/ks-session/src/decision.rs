use std::time::Instant;

use ks_core::backend::ModeSwitch;
use ks_core::focus::FocusArea;
use ks_core::platform::AutomationApi;
use ks_core::InputState;
use tracing::{debug, info, warn};

use super::types::{Decision, Outcome, SurfaceId, Trigger};
use super::ContextEngine;

impl<A: AutomationApi> ContextEngine<A> {
    pub(crate) fn apply_focus_default(&mut self, area: FocusArea, now: Instant) -> Option<Decision> {
        let desired = self.settings.read(|s| s.defaults.for_area(area))?;
        Some(self.decide(Trigger::Focus(area), None, desired, now))
    }

    /// Compare `desired` with the input method's state and toggle on mismatch.
    /// The strategy is resolved from the settings on every call.
    pub(crate) fn decide(
        &mut self,
        trigger: Trigger,
        surface: Option<SurfaceId>,
        desired: InputState,
        now: Instant,
    ) -> Decision {
        let kind = self.settings.read(|s| s.switcher());
        let strategy = self.registry.resolve(kind);
        let current = strategy.current_state();

        let outcome = if current == desired {
            debug!(?trigger, %desired, "input method already matches");
            Outcome::Unchanged
        } else if strategy.toggle() {
            info!(?trigger, from = %current, to = %desired, strategy = %kind, "input method switched");
            self.sink.notify_mode_changed(surface, desired);
            Outcome::Switched
        } else {
            warn!(?trigger, %desired, strategy = %kind, "input method switch not performed");
            Outcome::SwitchFailed
        };

        Decision {
            trigger,
            surface,
            desired,
            current,
            outcome,
            at: now,
        }
    }
}
