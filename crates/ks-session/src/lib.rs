//! Context-aware input-method switching driven by editor events.
//!
//! `ContextEngine` receives host notifications (document edits, caret moves,
//! mouse gestures, focus changes), filters out the ones caused by typing or
//! selecting, works out which input mode the context calls for, and flips the
//! OS input method through the configured switch strategy when it disagrees.
//!
//! Everything runs on the caller's thread. Deferred checks are queued in a
//! `Scheduler` and executed by `ContextEngine::tick`.

mod decision;
mod events;
pub mod feedback;
pub mod host;
pub mod scheduler;
pub mod surface;
pub mod types;

#[cfg(test)]
mod tests;

use std::time::Instant;

use ks_core::backend::StrategyRegistry;
use ks_core::platform::{AutomationApi, NativeAutomation};
use ks_core::settings::SharedSettings;
use tracing::debug;

pub use feedback::{FeedbackRouter, Indicator, IndicatorRenderer};
pub use host::{EditorHost, FeedbackSink};
pub use types::{
    Decision, HostEvent, MouseButton, Outcome, Selection, SurfaceId, Timing, Trigger,
};

use scheduler::Scheduler;
use surface::SurfaceRegistry;

pub struct ContextEngine<A: AutomationApi = NativeAutomation> {
    settings: SharedSettings,
    registry: StrategyRegistry<A>,
    sink: Box<dyn FeedbackSink>,
    surfaces: SurfaceRegistry,
    scheduler: Scheduler,
    timing: Timing,
}

impl ContextEngine<NativeAutomation> {
    /// Engine on the current OS's bindings.
    pub fn native(settings: SharedSettings, sink: Box<dyn FeedbackSink>) -> Self {
        let registry = StrategyRegistry::native(&settings.snapshot());
        Self::new(settings, registry, sink)
    }
}

impl<A: AutomationApi> ContextEngine<A> {
    pub fn new(
        settings: SharedSettings,
        registry: StrategyRegistry<A>,
        sink: Box<dyn FeedbackSink>,
    ) -> Self {
        Self {
            settings,
            registry,
            sink,
            surfaces: SurfaceRegistry::new(),
            scheduler: Scheduler::new(),
            timing: Timing::default(),
        }
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.registry.set_keystroke_interval(timing.keystroke_interval);
        self.timing = timing;
        self
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn registry_mut(&mut self) -> &mut StrategyRegistry<A> {
        &mut self.registry
    }

    pub fn surfaces(&self) -> &SurfaceRegistry {
        &self.surfaces
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Earliest pending deferred check, if any.
    pub fn next_due(&self) -> Option<Instant> {
        self.scheduler.next_due()
    }

    /// Drop all pending work and tracking state.
    pub fn dispose(&mut self) {
        debug!(
            surfaces = self.surfaces.len(),
            pending = self.scheduler.len(),
            "engine disposed"
        );
        self.scheduler.clear();
        self.surfaces.clear();
    }
}
