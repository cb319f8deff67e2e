//! UI-automation switch strategy.
//!
//! Finds the taskbar input indicator by walking the accessibility tree and
//! presses it through its default action. The located element and the
//! button result set are cached; a cached indicator is re-validated by name
//! on every use. A failed attempt drops the whole cache unless only the
//! default action failed on a still-valid element.
//!
//! Lookup order:
//! 1. cached indicator (name still matches)
//! 2. cached result set, rescanned
//! 3. fresh search: taskbar window -> root element -> all descendant buttons
//!
//! A result set is scanned by probing a few offsets from its end first (the
//! indicator's usual position for the shell generation), then walking the
//! rest back to front.

mod error;

use std::time::Instant;

use tracing::{debug, debug_span, error, info, warn};

pub use error::AutomationError;

use super::probe::ImeProbe;
use super::ModeSwitch;
use crate::platform::{AutomationApi, ShellGeneration};
use crate::settings::AutomationSettings;
use crate::InputState;

// Whole mode phrases only. Indicator names also carry the keyboard language
// ("中文(简体，中国)", "Chinese (Simplified, China)"), which says nothing
// about the current mode.
const CHINESE_MARKERS: [&str; 2] = ["中文模式", "chinese mode"];
const ENGLISH_MARKERS: [&str; 2] = ["英语模式", "english mode"];

/// What the switcher currently remembers about the taskbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    NoCache,
    /// A button result set, but no confirmed indicator.
    ResultSet,
    Indicator,
}

struct Cache<E> {
    root: Option<E>,
    buttons: Option<Vec<E>>,
    indicator: Option<E>,
}

impl<E> Default for Cache<E> {
    fn default() -> Self {
        Self {
            root: None,
            buttons: None,
            indicator: None,
        }
    }
}

pub struct UiAutomationSwitcher<A: AutomationApi> {
    api: A,
    probe: ImeProbe,
    indicator_names: Vec<String>,
    probe_offsets: Vec<usize>,
    max_attempts: u32,
    cache: Cache<A::Element>,
    searches: u32,
}

impl<A: AutomationApi> UiAutomationSwitcher<A> {
    /// Explicit `probe_offsets` in `settings` win over the generation's
    /// default order.
    pub fn new(
        api: A,
        probe: ImeProbe,
        settings: &AutomationSettings,
        generation: ShellGeneration,
    ) -> Self {
        let probe_offsets = settings
            .probe_offsets
            .clone()
            .unwrap_or_else(|| generation.probe_offsets().to_vec());
        Self {
            api,
            probe,
            indicator_names: settings.indicator_names.clone(),
            probe_offsets,
            max_attempts: settings.max_attempts.max(1),
            cache: Cache::default(),
            searches: 0,
        }
    }

    pub fn cache_state(&self) -> CacheState {
        if self.cache.indicator.is_some() {
            CacheState::Indicator
        } else if self.cache.buttons.is_some() {
            CacheState::ResultSet
        } else {
            CacheState::NoCache
        }
    }

    /// Number of full descendant searches run so far.
    pub fn search_count(&self) -> u32 {
        self.searches
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn invalidate(&mut self) {
        self.cache = Cache::default();
    }

    fn is_indicator(&self, name: &str) -> bool {
        self.indicator_names.iter().any(|n| name.contains(n.as_str()))
    }

    /// Press the indicator, retrying with a cold cache up to `max_attempts`.
    /// Returns the pressed element's name.
    pub fn try_toggle(&mut self) -> Result<String, AutomationError> {
        let mut attempt = 1;
        loop {
            let err = match self.press() {
                Ok(name) => return Ok(name),
                Err(e) => e,
            };
            if err.invalidates_cache() {
                self.invalidate();
            }
            if !err.is_retryable() {
                return Err(err);
            }
            if attempt >= self.max_attempts {
                return Err(AutomationError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }
            if err.is_stale() {
                warn!(attempt, tag = err.tag(), "stale UI element, searching again");
            } else {
                warn!(attempt, tag = err.tag(), error = %err, "indicator attempt failed, searching again");
            }
            attempt += 1;
        }
    }

    fn press(&mut self) -> Result<String, AutomationError> {
        let (element, name) = self.locate()?;
        self.api
            .invoke_default_action(&element)
            .map_err(AutomationError::from_invoke)?;
        Ok(name)
    }

    /// Locate the indicator; returns it with its current name.
    fn locate(&mut self) -> Result<(A::Element, String), AutomationError> {
        self.api.connect().map_err(AutomationError::from_connect)?;

        if let Some(indicator) = self.cache.indicator.take() {
            match self.api.name(&indicator) {
                Ok(name) if self.is_indicator(&name) => {
                    self.cache.indicator = Some(indicator.clone());
                    return Ok((indicator, name));
                }
                Ok(name) => debug!(name = %name, "cached indicator no longer matches"),
                Err(fault) => debug!(error = %fault, "cached indicator unreadable"),
            }
        }

        if let Some(buttons) = self.cache.buttons.take() {
            if let Some(found) = self.scan(&buttons) {
                self.cache.buttons = Some(buttons);
                self.cache.indicator = Some(found.0.clone());
                return Ok(found);
            }
            debug!("cached result set lost the indicator");
        }

        let root = match self.cache.root.clone() {
            Some(root) => root,
            None => self.find_root()?,
        };
        self.cache.root = Some(root.clone());

        let started = Instant::now();
        let buttons = self
            .api
            .find_buttons(&root)
            .map_err(|f| AutomationError::at_step(f, AutomationError::ButtonsNotFound))?;
        self.searches += 1;
        debug!(
            count = buttons.len(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "taskbar buttons found"
        );
        if buttons.is_empty() {
            return Err(AutomationError::ButtonsNotFound(None));
        }

        let found = self.scan(&buttons);
        let scanned = buttons.len();
        self.cache.buttons = Some(buttons);
        match found {
            Some((element, name)) => {
                self.cache.indicator = Some(element.clone());
                Ok((element, name))
            }
            None => Err(AutomationError::NoValidButton { scanned }),
        }
    }

    fn find_root(&mut self) -> Result<A::Element, AutomationError> {
        let window = self
            .api
            .find_tray_window()
            .map_err(|f| AutomationError::at_step(f, AutomationError::TrayWindowNotFound))?
            .ok_or(AutomationError::TrayWindowNotFound(None))?;
        self.api
            .element_from_window(&window)
            .map_err(|f| AutomationError::at_step(f, AutomationError::ElementFromHandleFailed))?
            .ok_or(AutomationError::ElementFromHandleFailed(None))
    }

    /// Candidate indices: configured offsets from the end, then everything
    /// else back to front.
    fn scan_order(&self, len: usize) -> Vec<usize> {
        let mut order = Vec::with_capacity(len);
        for &offset in &self.probe_offsets {
            if (1..=len).contains(&offset) && !order.contains(&(len - offset)) {
                order.push(len - offset);
            }
        }
        let probed = order.len();
        for index in (0..len).rev() {
            if !order[..probed].contains(&index) {
                order.push(index);
            }
        }
        order
    }

    fn scan(&mut self, buttons: &[A::Element]) -> Option<(A::Element, String)> {
        for index in self.scan_order(buttons.len()) {
            let element = &buttons[index];
            match self.api.name(element) {
                Ok(name) if self.is_indicator(&name) => {
                    debug!(index, from_end = buttons.len() - index, name = %name, "indicator found");
                    return Some((element.clone(), name));
                }
                Ok(_) => {}
                Err(fault) => debug!(index, error = %fault, "button name unreadable"),
            }
        }
        None
    }
}

/// Mode marker in an indicator name, e.g. "中文模式" or "English mode".
/// `None` when the name carries neither marker or both.
pub fn marker_state(name: &str) -> Option<InputState> {
    let name = name.to_lowercase();
    let chinese = CHINESE_MARKERS.iter().any(|m| name.contains(m));
    let english = ENGLISH_MARKERS.iter().any(|m| name.contains(m));
    match (chinese, english) {
        (true, false) => Some(InputState::Chinese),
        (false, true) => Some(InputState::English),
        _ => None,
    }
}

impl<A: AutomationApi> ModeSwitch for UiAutomationSwitcher<A> {
    fn toggle(&mut self) -> bool {
        let _span = debug_span!("automation_toggle").entered();
        let started = Instant::now();
        let result = self.try_toggle();
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        match result {
            Ok(name) => {
                info!(indicator = %name, elapsed_ms, "input indicator pressed");
                true
            }
            Err(e) => {
                error!(
                    tag = e.tag(),
                    cause = e.last().tag(),
                    error = %e,
                    elapsed_ms,
                    "input indicator toggle failed"
                );
                false
            }
        }
    }

    fn current_state(&mut self) -> InputState {
        let _span = debug_span!("automation_current_state").entered();
        match self.locate() {
            Ok((_, name)) => {
                if let Some(state) = marker_state(&name) {
                    return state;
                }
                debug!(name = %name, "indicator name carries no single mode marker");
            }
            Err(e) => {
                self.invalidate();
                debug!(tag = e.tag(), "indicator lookup failed, using IME probe");
            }
        }
        self.probe.current_state()
    }
}
