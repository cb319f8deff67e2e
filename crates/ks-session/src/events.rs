use std::time::Instant;

use ks_core::classify::classify_char;
use ks_core::focus::{classify_focus, FocusArea};
use ks_core::platform::AutomationApi;
use ks_core::InputState;
use tracing::{debug, debug_span};

use super::host::{char_before, EditorHost};
use super::scheduler::Task;
use super::types::{Decision, HostEvent, MouseButton, SurfaceId, Trigger};
use super::ContextEngine;

impl<A: AutomationApi> ContextEngine<A> {
    /// Process one host notification. Returns the decision when the event
    /// was acted on immediately; deferred work runs in `tick`.
    pub fn handle_event(
        &mut self,
        host: &dyn EditorHost,
        event: HostEvent,
        now: Instant,
    ) -> Option<Decision> {
        let _span = debug_span!("handle_event", kind = event.kind()).entered();
        match event {
            HostEvent::DocumentChanged { surfaces } => {
                for surface in surfaces {
                    if !host.is_disposed(surface) {
                        self.surfaces.record_input(surface, now);
                    }
                }
                None
            }
            HostEvent::CaretMoved {
                surface,
                new_offset,
                ..
            } => {
                if host.is_disposed(surface) {
                    return None;
                }
                self.scheduler.schedule(
                    now + self.timing.caret_settle,
                    Task::CaretCheck {
                        surface,
                        offset: new_offset,
                        moved_at: now,
                    },
                );
                None
            }
            HostEvent::MousePressed { surface, button } => {
                if button == MouseButton::Primary && !host.is_disposed(surface) {
                    self.surfaces.begin_selection(surface);
                }
                None
            }
            HostEvent::MouseReleased { surface, button } => {
                if button != MouseButton::Primary || host.is_disposed(surface) {
                    return None;
                }
                self.on_selection_release(host, surface, now)
            }
            HostEvent::SurfaceOpened { surface } => {
                if !host.is_disposed(surface) {
                    self.surfaces.open(surface);
                }
                None
            }
            HostEvent::SurfaceDisposed { surface } => {
                self.forget_surface(surface);
                None
            }
            HostEvent::FocusChanged { chain } => self.on_focus_changed(&chain, now),
        }
    }

    /// Run deferred checks due at `now`. At most one decision is applied per
    /// tick: a due focus default wins over every caret check in the same
    /// tick, otherwise the latest caret check with a desired state wins.
    pub fn tick(&mut self, host: &dyn EditorHost, now: Instant) -> Option<Decision> {
        let due = self.scheduler.take_due(now);
        if due.is_empty() {
            return None;
        }
        let _span = debug_span!("tick", due = due.len()).entered();

        let focus = due.iter().rev().find_map(|task| match task {
            Task::FocusApply { area } => Some(*area),
            Task::CaretCheck { .. } => None,
        });
        if let Some(area) = focus {
            if due.len() > 1 {
                debug!(superseded = due.len() - 1, "focus default supersedes caret checks");
            }
            return self.apply_focus_default(area, now);
        }

        let mut winner = None;
        for task in due {
            if let Task::CaretCheck {
                surface,
                offset,
                moved_at,
            } = task
            {
                if let Some(desired) = self.check_caret(host, surface, offset, moved_at) {
                    winner = Some((surface, desired));
                }
            }
        }
        let (surface, desired) = winner?;
        Some(self.decide(Trigger::Caret, Some(surface), desired, now))
    }

    fn check_caret(
        &mut self,
        host: &dyn EditorHost,
        surface: SurfaceId,
        offset: usize,
        moved_at: Instant,
    ) -> Option<InputState> {
        if host.is_disposed(surface) {
            self.forget_surface(surface);
            return None;
        }
        if let Some(selection) = host.selection(surface) {
            if selection.holds_caret(offset) {
                debug!(%surface, offset, ?selection, "caret at selection, skipping");
                return None;
            }
        }
        if let Some(last_input) = self.surfaces.last_input(surface) {
            let idle = moved_at.saturating_duration_since(last_input);
            if idle <= self.timing.input_threshold {
                debug!(
                    %surface,
                    idle_ms = idle.as_millis() as u64,
                    "caret moved by typing, skipping"
                );
                return None;
            }
        }
        let c = char_before(host, surface, offset)?;
        Some(classify_char(c))
    }

    fn on_selection_release(
        &mut self,
        host: &dyn EditorHost,
        surface: SurfaceId,
        now: Instant,
    ) -> Option<Decision> {
        if !self.surfaces.take_selection(surface) {
            return None;
        }
        let selection = host.selection(surface)?;
        if selection.is_empty() {
            return None;
        }
        let offset = host.caret_offset(surface);
        let desired = classify_char(char_before(host, surface, offset)?);
        Some(self.decide(Trigger::SelectionRelease, Some(surface), desired, now))
    }

    fn on_focus_changed(&mut self, chain: &[String], now: Instant) -> Option<Decision> {
        let area = self
            .settings
            .read(|s| classify_focus(chain.iter().map(String::as_str), &s.focus));
        debug!(area = area.as_str(), "focus changed");
        match area {
            FocusArea::Other => None,
            FocusArea::RenameField => {
                self.scheduler
                    .schedule(now + self.timing.rename_defer, Task::FocusApply { area });
                None
            }
            FocusArea::Editor | FocusArea::Terminal | FocusArea::Search => {
                self.apply_focus_default(area, now)
            }
        }
    }

    fn forget_surface(&mut self, surface: SurfaceId) {
        let tracked = self.surfaces.dispose(surface);
        let cancelled = self.scheduler.cancel_surface(surface);
        if tracked || cancelled {
            debug!(%surface, cancelled, "surface forgotten");
        }
    }
}
