//! Headless replay of an editor event script.
//!
//! A script is a TOML file with an `initial_state` for the simulated input
//! method and an ordered list of `[[step]]` tables. The engine runs against
//! an in-memory host, a simulated IME and a simulated taskbar indicator, on a
//! virtual clock that only moves on `wait` steps and between typed characters.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::ops::Range;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ks_core::backend::{StrategyError, StrategyKind, StrategyRegistry};
use ks_core::platform::{
    AutomationApi, AutomationFault, Backend, ImeQuery, ImeStatus, InjectError, KeyInjector,
    ProbeError, ShellGeneration,
};
use ks_core::settings::{Settings, SharedSettings};
use ks_core::InputState;
use ks_session::{
    ContextEngine, Decision, EditorHost, FeedbackSink, HostEvent, MouseButton, Outcome, Selection,
    SurfaceId, Timing, Trigger,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

/// Virtual time between two typed characters.
const KEYSTROKE_GAP: Duration = Duration::from_millis(30);

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("script parse error: {0}")]
    Parse(String),
    #[error("step {index}: {reason}")]
    InvalidStep { index: usize, reason: String },
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayScript {
    pub initial_state: InputState,
    /// Overrides `strategy.switcher` from the settings.
    #[serde(default)]
    pub switcher: Option<String>,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Step {
    Open {
        surface: u64,
        #[serde(default)]
        text: String,
    },
    Close {
        surface: u64,
    },
    /// Insert text at the caret, one character at a time.
    Type {
        surface: u64,
        text: String,
    },
    Caret {
        surface: u64,
        offset: usize,
    },
    /// Mouse drag selecting `start..end`, caret left at `end`.
    Select {
        surface: u64,
        start: usize,
        end: usize,
    },
    Focus {
        chain: Vec<String>,
    },
    Wait {
        ms: u64,
    },
}

pub fn parse_script(toml_str: &str) -> Result<ReplayScript, ReplayError> {
    let script: ReplayScript =
        toml::from_str(toml_str).map_err(|e| ReplayError::Parse(e.to_string()))?;
    for (index, step) in script.steps.iter().enumerate() {
        if let Step::Select { start, end, .. } = step {
            if start > end {
                return Err(ReplayError::InvalidStep {
                    index,
                    reason: format!("selection start {start} is after end {end}"),
                });
            }
        }
    }
    Ok(script)
}

pub fn load_script(path: &Path) -> Result<ReplayScript, ReplayError> {
    parse_script(&fs::read_to_string(path)?)
}

/// One decision taken during replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayRecord {
    pub at_ms: u64,
    pub step: usize,
    pub trigger: String,
    pub surface: Option<u64>,
    pub desired: InputState,
    pub current: InputState,
    pub outcome: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub records: Vec<ReplayRecord>,
    pub notifications: Vec<(Option<u64>, InputState)>,
    pub toggles: u32,
    pub final_state: InputState,
}

fn trigger_name(trigger: Trigger) -> String {
    match trigger {
        Trigger::Caret => "caret".to_string(),
        Trigger::SelectionRelease => "selection".to_string(),
        Trigger::Focus(area) => format!("focus:{}", area.as_str()),
    }
}

fn outcome_name(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Unchanged => "unchanged",
        Outcome::Switched => "switched",
        Outcome::SwitchFailed => "switch_failed",
    }
}

// ---------------------------------------------------------------------------
// Simulated OS
// ---------------------------------------------------------------------------

struct SimulatedIme {
    state: Mutex<InputState>,
    toggles: AtomicU32,
}

impl SimulatedIme {
    fn state(&self) -> InputState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn flip(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = state.toggled();
        self.toggles.fetch_add(1, Ordering::SeqCst);
    }
}

impl ImeQuery for SimulatedIme {
    fn foreground_ime_status(&self) -> Result<ImeStatus, ProbeError> {
        Ok(match self.state() {
            InputState::English => ImeStatus::ConversionMode(0),
            InputState::Chinese => ImeStatus::ConversionMode(1),
        })
    }
}

impl KeyInjector for SimulatedIme {
    fn tap_switch_key(&self) -> Result<(), InjectError> {
        self.flip();
        Ok(())
    }
}

/// Taskbar with one indicator button named after the current mode.
struct SimulatedTaskbar {
    ime: Arc<SimulatedIme>,
}

impl AutomationApi for SimulatedTaskbar {
    type Window = ();
    type Element = ();

    fn find_tray_window(&mut self) -> Result<Option<()>, AutomationFault> {
        Ok(Some(()))
    }

    fn element_from_window(&mut self, _window: &()) -> Result<Option<()>, AutomationFault> {
        Ok(Some(()))
    }

    fn find_buttons(&mut self, _root: &()) -> Result<Vec<()>, AutomationFault> {
        Ok(vec![()])
    }

    fn name(&mut self, _element: &()) -> Result<String, AutomationFault> {
        Ok(match self.ime.state() {
            InputState::English => "英语模式".to_string(),
            InputState::Chinese => "中文模式".to_string(),
        })
    }

    fn invoke_default_action(&mut self, _element: &()) -> Result<(), AutomationFault> {
        self.ime.flip();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scripted host
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Surface {
    text: Vec<char>,
    caret: usize,
    selection: Option<Selection>,
    disposed: bool,
}

#[derive(Default)]
struct ScriptedHost {
    surfaces: HashMap<SurfaceId, Surface>,
}

impl EditorHost for ScriptedHost {
    fn is_disposed(&self, surface: SurfaceId) -> bool {
        self.surfaces.get(&surface).map_or(true, |s| s.disposed)
    }

    fn caret_offset(&self, surface: SurfaceId) -> usize {
        self.surfaces.get(&surface).map_or(0, |s| s.caret)
    }

    fn selection(&self, surface: SurfaceId) -> Option<Selection> {
        self.surfaces.get(&surface).and_then(|s| s.selection)
    }

    fn text(&self, surface: SurfaceId, range: Range<usize>) -> Option<String> {
        let s = self.surfaces.get(&surface)?;
        Some(s.text.get(range)?.iter().collect())
    }
}

#[derive(Clone, Default)]
struct Notifications(Rc<RefCell<Vec<(Option<u64>, InputState)>>>);

impl FeedbackSink for Notifications {
    fn notify_mode_changed(&self, surface: Option<SurfaceId>, state: InputState) {
        self.0.borrow_mut().push((surface.map(|s| s.0), state));
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

struct Replay {
    engine: ContextEngine<SimulatedTaskbar>,
    host: ScriptedHost,
    start: Instant,
    now: Instant,
    step: usize,
    records: Vec<ReplayRecord>,
}

impl Replay {
    fn record(&mut self, decision: Option<Decision>) {
        let Some(d) = decision else { return };
        self.records.push(ReplayRecord {
            at_ms: d.at.saturating_duration_since(self.start).as_millis() as u64,
            step: self.step,
            trigger: trigger_name(d.trigger),
            surface: d.surface.map(|s| s.0),
            desired: d.desired,
            current: d.current,
            outcome: outcome_name(d.outcome),
        });
    }

    fn send(&mut self, event: HostEvent) {
        let decision = self.engine.handle_event(&self.host, event, self.now);
        self.record(decision);
    }

    /// Move the clock to `target`, running deferred checks as they fall due.
    fn advance_to(&mut self, target: Instant) {
        while let Some(due) = self.engine.next_due() {
            if due > target {
                break;
            }
            self.now = self.now.max(due);
            let decision = self.engine.tick(&self.host, self.now);
            self.record(decision);
        }
        self.now = self.now.max(target);
    }

    fn run_step(&mut self, step: &Step) {
        match step {
            Step::Open { surface, text } => {
                let id = SurfaceId(*surface);
                let chars: Vec<char> = text.chars().collect();
                let caret = chars.len();
                self.host.surfaces.insert(
                    id,
                    Surface {
                        text: chars,
                        caret,
                        ..Default::default()
                    },
                );
                self.send(HostEvent::SurfaceOpened { surface: id });
            }
            Step::Close { surface } => {
                let id = SurfaceId(*surface);
                if let Some(s) = self.host.surfaces.get_mut(&id) {
                    s.disposed = true;
                }
                self.send(HostEvent::SurfaceDisposed { surface: id });
            }
            Step::Type { surface, text } => {
                let id = SurfaceId(*surface);
                for c in text.chars() {
                    let Some(s) = self.host.surfaces.get_mut(&id) else {
                        break;
                    };
                    let old = s.caret.min(s.text.len());
                    s.text.insert(old, c);
                    s.caret = old + 1;
                    s.selection = None;
                    self.send(HostEvent::DocumentChanged { surfaces: vec![id] });
                    self.send(HostEvent::CaretMoved {
                        surface: id,
                        old_offset: old,
                        new_offset: old + 1,
                    });
                    self.advance_to(self.now + KEYSTROKE_GAP);
                }
            }
            Step::Caret { surface, offset } => {
                let id = SurfaceId(*surface);
                let old = match self.host.surfaces.get_mut(&id) {
                    Some(s) => std::mem::replace(&mut s.caret, *offset),
                    None => 0,
                };
                self.send(HostEvent::CaretMoved {
                    surface: id,
                    old_offset: old,
                    new_offset: *offset,
                });
            }
            Step::Select {
                surface,
                start,
                end,
            } => {
                let id = SurfaceId(*surface);
                self.send(HostEvent::MousePressed {
                    surface: id,
                    button: MouseButton::Primary,
                });
                if let Some(s) = self.host.surfaces.get_mut(&id) {
                    s.selection = Some(Selection::new(*start, *end));
                    s.caret = *end;
                }
                self.send(HostEvent::MouseReleased {
                    surface: id,
                    button: MouseButton::Primary,
                });
            }
            Step::Focus { chain } => self.send(HostEvent::FocusChanged {
                chain: chain.clone(),
            }),
            Step::Wait { ms } => self.advance_to(self.now + Duration::from_millis(*ms)),
        }
    }
}

/// Run `script` to completion, draining deferred checks at the end.
pub fn run(script: &ReplayScript, mut settings: Settings) -> Result<ReplayReport, ReplayError> {
    if let Some(name) = &script.switcher {
        settings.set_switcher(name.parse::<StrategyKind>()?);
    }
    let _span = debug_span!("replay", steps = script.steps.len()).entered();

    let ime = Arc::new(SimulatedIme {
        state: Mutex::new(script.initial_state),
        toggles: AtomicU32::new(0),
    });
    let taskbar_ime = ime.clone();
    let backend = Backend {
        ime: ime.clone(),
        keys: ime.clone(),
        automation: Box::new(move || SimulatedTaskbar {
            ime: taskbar_ime.clone(),
        }),
        generation: ShellGeneration::Windows11,
    };
    let registry = StrategyRegistry::new(backend, &settings);
    let notifications = Notifications::default();
    let engine = ContextEngine::new(
        SharedSettings::new(settings),
        registry,
        Box::new(notifications.clone()),
    )
    // Keystroke pacing is wall-clock based; the replay clock is virtual.
    .with_timing(Timing {
        keystroke_interval: Duration::ZERO,
        ..Timing::default()
    });

    let start = Instant::now();
    let mut replay = Replay {
        engine,
        host: ScriptedHost::default(),
        start,
        now: start,
        step: 0,
        records: Vec::new(),
    };
    for (index, step) in script.steps.iter().enumerate() {
        replay.step = index;
        debug!(index, ?step, "replay step");
        replay.run_step(step);
    }
    if let Some(last_due) = replay.engine.next_due() {
        replay.advance_to(last_due);
    }
    replay.engine.dispose();

    let notifications = notifications.0.borrow().clone();
    Ok(ReplayReport {
        records: replay.records,
        notifications,
        toggles: ime.toggles.load(Ordering::SeqCst),
        final_state: ime.state(),
    })
}
