mod lifecycle;

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ks_core::backend::StrategyRegistry;
use ks_core::platform::{
    AutomationApi, AutomationFault, Backend, ImeQuery, ImeStatus, InjectError, KeyInjector,
    ProbeError, ShellGeneration,
};
use ks_core::settings::{SharedSettings, Settings};
use ks_core::InputState;

use crate::{ContextEngine, Decision, EditorHost, FeedbackSink, HostEvent, Selection, SurfaceId};
use crate::{MouseButton, Timing};

// ---------------------------------------------------------------------------
// Simulated input method
// ---------------------------------------------------------------------------

/// OS input method shared by the probe, the key injector and the taskbar.
pub(super) struct SimIme {
    state: Mutex<InputState>,
    toggles: AtomicU32,
    broken: AtomicBool,
}

impl SimIme {
    pub fn new(state: InputState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
            toggles: AtomicU32::new(0),
            broken: AtomicBool::new(false),
        })
    }

    pub fn state(&self) -> InputState {
        *self.state.lock().unwrap()
    }

    pub fn set_state(&self, state: InputState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn toggles(&self) -> u32 {
        self.toggles.load(Ordering::SeqCst)
    }

    /// Make every switch attempt fail.
    pub fn break_switching(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    fn flip(&self) -> bool {
        if self.broken.load(Ordering::SeqCst) {
            return false;
        }
        let mut state = self.state.lock().unwrap();
        *state = state.toggled();
        self.toggles.fetch_add(1, Ordering::SeqCst);
        true
    }
}

impl ImeQuery for SimIme {
    fn foreground_ime_status(&self) -> Result<ImeStatus, ProbeError> {
        Ok(match self.state() {
            InputState::English => ImeStatus::ConversionMode(0),
            InputState::Chinese => ImeStatus::ConversionMode(1),
        })
    }
}

impl KeyInjector for SimIme {
    fn tap_switch_key(&self) -> Result<(), InjectError> {
        if self.flip() {
            Ok(())
        } else {
            Err(InjectError::Rejected {
                sent: 0,
                expected: 2,
            })
        }
    }
}

/// Taskbar with a single indicator button whose name follows the IME state.
pub(super) struct SimTaskbar {
    ime: Arc<SimIme>,
}

impl AutomationApi for SimTaskbar {
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
        if self.ime.flip() {
            Ok(())
        } else {
            Err(AutomationFault::new("0x80004005 default action failed"))
        }
    }
}

// ---------------------------------------------------------------------------
// Host and sink
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub(super) struct Doc {
    pub text: Vec<char>,
    pub caret: usize,
    pub selection: Option<Selection>,
    pub disposed: bool,
}

#[derive(Debug, Default)]
pub(super) struct TestHost {
    pub docs: HashMap<SurfaceId, Doc>,
}

impl TestHost {
    pub fn doc(&mut self, surface: SurfaceId) -> &mut Doc {
        self.docs.entry(surface).or_default()
    }
}

impl EditorHost for TestHost {
    fn is_disposed(&self, surface: SurfaceId) -> bool {
        self.docs.get(&surface).map_or(true, |d| d.disposed)
    }

    fn caret_offset(&self, surface: SurfaceId) -> usize {
        self.docs.get(&surface).map_or(0, |d| d.caret)
    }

    fn selection(&self, surface: SurfaceId) -> Option<Selection> {
        self.docs.get(&surface).and_then(|d| d.selection)
    }

    fn text(&self, surface: SurfaceId, range: Range<usize>) -> Option<String> {
        let doc = self.docs.get(&surface)?;
        Some(doc.text.get(range)?.iter().collect())
    }
}

#[derive(Debug, Default, Clone)]
pub(super) struct RecordingSink(Rc<RefCell<Vec<(Option<SurfaceId>, InputState)>>>);

impl RecordingSink {
    pub fn seen(&self) -> Vec<(Option<SurfaceId>, InputState)> {
        self.0.borrow().clone()
    }
}

impl FeedbackSink for RecordingSink {
    fn notify_mode_changed(&self, surface: Option<SurfaceId>, state: InputState) {
        self.0.borrow_mut().push((surface, state));
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub(super) const SETTLE: Duration = Duration::from_millis(1);
pub(super) const IDLE: Duration = Duration::from_millis(250);

/// Engine wired to a scripted host, a simulated IME and a recording sink,
/// with its own clock.
pub(super) struct Harness {
    pub engine: ContextEngine<SimTaskbar>,
    pub host: TestHost,
    pub ime: Arc<SimIme>,
    pub sink: RecordingSink,
    pub settings: SharedSettings,
    pub now: Instant,
}

impl Harness {
    pub fn new(initial: InputState) -> Self {
        Self::with_settings(Settings::default(), initial)
    }

    pub fn with_settings(settings: Settings, initial: InputState) -> Self {
        let ime = SimIme::new(initial);
        let taskbar_ime = ime.clone();
        let backend = Backend {
            ime: ime.clone(),
            keys: ime.clone(),
            automation: Box::new(move || SimTaskbar {
                ime: taskbar_ime.clone(),
            }),
            generation: ShellGeneration::Windows11,
        };
        let registry = StrategyRegistry::new(backend, &settings);
        let settings = SharedSettings::new(settings);
        let sink = RecordingSink::default();
        let engine = ContextEngine::new(settings.clone(), registry, Box::new(sink.clone()))
            .with_timing(Timing {
                keystroke_interval: Duration::ZERO,
                ..Timing::default()
            });
        Self {
            engine,
            host: TestHost::default(),
            ime,
            sink,
            settings,
            now: Instant::now(),
        }
    }

    pub fn send(&mut self, event: HostEvent) -> Option<Decision> {
        self.engine.handle_event(&self.host, event, self.now)
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    pub fn tick(&mut self) -> Option<Decision> {
        self.engine.tick(&self.host, self.now)
    }

    /// Advance past the caret-settle delay and run due checks.
    pub fn settle(&mut self) -> Option<Decision> {
        self.advance(SETTLE);
        self.tick()
    }

    pub fn open(&mut self, id: u64, text: &str) -> SurfaceId {
        let surface = SurfaceId(id);
        let doc = self.host.doc(surface);
        doc.text = text.chars().collect();
        doc.caret = doc.text.len();
        doc.disposed = false;
        self.send(HostEvent::SurfaceOpened { surface });
        surface
    }

    /// Insert `text` at the caret the way an editor reports typing:
    /// document change first, then the caret move it causes. A caret past
    /// the end of the text types at the end.
    pub fn type_text(&mut self, surface: SurfaceId, text: &str) {
        for c in text.chars() {
            let doc = self.host.doc(surface);
            let old = doc.caret.min(doc.text.len());
            doc.text.insert(old, c);
            doc.caret = old + 1;
            self.send(HostEvent::DocumentChanged {
                surfaces: vec![surface],
            });
            self.send(HostEvent::CaretMoved {
                surface,
                old_offset: old,
                new_offset: old + 1,
            });
        }
    }

    pub fn move_caret(&mut self, surface: SurfaceId, offset: usize) -> Option<Decision> {
        let doc = self.host.doc(surface);
        let old = doc.caret;
        doc.caret = offset;
        self.send(HostEvent::CaretMoved {
            surface,
            old_offset: old,
            new_offset: offset,
        })
    }

    /// Press, drag-select `start..end` leaving the caret at `end`, release.
    pub fn drag_select(&mut self, surface: SurfaceId, start: usize, end: usize) -> Option<Decision> {
        self.send(HostEvent::MousePressed {
            surface,
            button: MouseButton::Primary,
        });
        let doc = self.host.doc(surface);
        doc.selection = Some(Selection::new(start, end));
        doc.caret = end;
        self.send(HostEvent::MouseReleased {
            surface,
            button: MouseButton::Primary,
        })
    }

    pub fn dispose(&mut self, surface: SurfaceId) {
        self.host.doc(surface).disposed = true;
        self.send(HostEvent::SurfaceDisposed { surface });
    }

    pub fn focus(&mut self, chain: &[&str]) -> Option<Decision> {
        self.send(HostEvent::FocusChanged {
            chain: chain.iter().map(|s| s.to_string()).collect(),
        })
    }
}
