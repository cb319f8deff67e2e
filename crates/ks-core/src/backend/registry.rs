//! One long-lived switch strategy per `StrategyKind`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;

use tracing::info;

use super::automation::UiAutomationSwitcher;
use super::keystroke::{KeystrokeSwitcher, MIN_PRESS_INTERVAL};
use super::probe::ImeProbe;
use super::{ModeSwitch, StrategyError, StrategyKind};
use crate::platform::{self, AutomationApi, Backend, NativeAutomation};
use crate::settings::{AutomationSettings, Settings};
use crate::InputState;

/// A constructed switch strategy.
pub enum Strategy<A: AutomationApi> {
    Keystroke(KeystrokeSwitcher),
    UiAutomation(UiAutomationSwitcher<A>),
}

impl<A: AutomationApi> Strategy<A> {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Keystroke(_) => StrategyKind::Keystroke,
            Self::UiAutomation(_) => StrategyKind::UiAutomation,
        }
    }
}

impl<A: AutomationApi> ModeSwitch for Strategy<A> {
    fn toggle(&mut self) -> bool {
        match self {
            Self::Keystroke(s) => s.toggle(),
            Self::UiAutomation(s) => s.toggle(),
        }
    }

    fn current_state(&mut self) -> InputState {
        match self {
            Self::Keystroke(s) => s.current_state(),
            Self::UiAutomation(s) => s.current_state(),
        }
    }
}

/// Builds strategies on first use and keeps them for the registry's lifetime,
/// so the UI-automation cache survives between toggles.
pub struct StrategyRegistry<A: AutomationApi> {
    backend: Backend<A>,
    automation: AutomationSettings,
    keystroke_interval: Duration,
    strategies: HashMap<StrategyKind, Strategy<A>>,
}

impl StrategyRegistry<NativeAutomation> {
    pub fn native(settings: &Settings) -> Self {
        Self::new(platform::native(), settings)
    }
}

impl<A: AutomationApi> StrategyRegistry<A> {
    pub fn new(backend: Backend<A>, settings: &Settings) -> Self {
        Self {
            backend,
            automation: settings.automation.clone(),
            keystroke_interval: MIN_PRESS_INTERVAL,
            strategies: HashMap::new(),
        }
    }

    /// Minimum gap between keystroke taps (default `MIN_PRESS_INTERVAL`).
    pub fn with_keystroke_interval(mut self, interval: Duration) -> Self {
        self.keystroke_interval = interval;
        self
    }

    /// Also applies to an already constructed keystroke strategy.
    pub fn set_keystroke_interval(&mut self, interval: Duration) {
        self.keystroke_interval = interval;
        if let Some(Strategy::Keystroke(s)) = self.strategies.get_mut(&StrategyKind::Keystroke) {
            s.set_min_interval(interval);
        }
    }

    pub fn probe(&self) -> ImeProbe {
        ImeProbe::new(self.backend.ime.clone())
    }

    pub fn is_constructed(&self, kind: StrategyKind) -> bool {
        self.strategies.contains_key(&kind)
    }

    pub fn resolve(&mut self, kind: StrategyKind) -> &mut Strategy<A> {
        match self.strategies.entry(kind) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let probe = ImeProbe::new(self.backend.ime.clone());
                let strategy = match kind {
                    StrategyKind::Keystroke => Strategy::Keystroke(
                        KeystrokeSwitcher::new(self.backend.keys.clone(), probe)
                            .with_min_interval(self.keystroke_interval),
                    ),
                    StrategyKind::UiAutomation => {
                        Strategy::UiAutomation(UiAutomationSwitcher::new(
                            (self.backend.automation)(),
                            probe,
                            &self.automation,
                            self.backend.generation,
                        ))
                    }
                };
                info!(
                    strategy = %kind,
                    generation = %self.backend.generation,
                    "switch strategy created"
                );
                entry.insert(strategy)
            }
        }
    }

    pub fn resolve_name(&mut self, name: &str) -> Result<&mut Strategy<A>, StrategyError> {
        let kind = name.parse::<StrategyKind>()?;
        Ok(self.resolve(kind))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::platform::{
        AutomationFault, ImeQuery, ImeStatus, InjectError, KeyInjector, ProbeError,
        ShellGeneration,
    };

    struct EnglishIme;

    impl ImeQuery for EnglishIme {
        fn foreground_ime_status(&self) -> Result<ImeStatus, ProbeError> {
            Ok(ImeStatus::ConversionMode(0))
        }
    }

    #[derive(Default)]
    struct Taps(AtomicU32);

    impl KeyInjector for Taps {
        fn tap_switch_key(&self) -> Result<(), InjectError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct NoTaskbar;

    impl AutomationApi for NoTaskbar {
        type Window = ();
        type Element = ();

        fn find_tray_window(&mut self) -> Result<Option<()>, AutomationFault> {
            Ok(None)
        }
        fn element_from_window(&mut self, _: &()) -> Result<Option<()>, AutomationFault> {
            Ok(None)
        }
        fn find_buttons(&mut self, _: &()) -> Result<Vec<()>, AutomationFault> {
            Ok(Vec::new())
        }
        fn name(&mut self, _: &()) -> Result<String, AutomationFault> {
            Ok(String::new())
        }
        fn invoke_default_action(&mut self, _: &()) -> Result<(), AutomationFault> {
            Ok(())
        }
    }

    fn registry(
        taps: Arc<Taps>,
        created: Arc<AtomicU32>,
    ) -> StrategyRegistry<NoTaskbar> {
        let backend = Backend {
            ime: Arc::new(EnglishIme),
            keys: taps,
            automation: Box::new(move || {
                created.fetch_add(1, Ordering::SeqCst);
                NoTaskbar
            }),
            generation: ShellGeneration::Windows11,
        };
        StrategyRegistry::new(backend, &Settings::default())
            .with_keystroke_interval(Duration::ZERO)
    }

    #[test]
    fn test_resolve_constructs_once() {
        let created = Arc::new(AtomicU32::new(0));
        let mut r = registry(Arc::default(), created.clone());
        assert!(!r.is_constructed(StrategyKind::UiAutomation));

        for _ in 0..3 {
            let s = r.resolve(StrategyKind::UiAutomation);
            assert_eq!(s.kind(), StrategyKind::UiAutomation);
            assert!(!s.toggle());
        }
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(r.is_constructed(StrategyKind::UiAutomation));
        assert!(!r.is_constructed(StrategyKind::Keystroke));
    }

    #[test]
    fn test_resolve_by_name() {
        let taps = Arc::new(Taps::default());
        let mut r = registry(taps.clone(), Arc::default());

        let s = r.resolve_name("KeyboardSwitcher").unwrap();
        assert_eq!(s.kind(), StrategyKind::Keystroke);
        assert!(s.toggle());
        assert!(s.toggle(), "zero interval never rate-limits");
        assert_eq!(s.current_state(), InputState::English);
        assert_eq!(taps.0.load(Ordering::SeqCst), 2);

        assert!(matches!(
            r.resolve_name("BalloonSwitcher"),
            Err(StrategyError::InvalidStrategyName(_))
        ));
    }
}
