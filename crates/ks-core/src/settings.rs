//! Settings loaded from TOML.
//!
//! - `parse_settings_toml(content)` parses and validates a complete settings file
//! - `Settings::default()` is the embedded `default_settings.toml`
//! - `SharedSettings` is the handle the engine reads once per decision cycle;
//!   `SharedSettings::replace` takes effect on the next event

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use serde::Deserialize;

use crate::backend::StrategyKind;
use crate::focus::{FocusArea, FocusPatterns};
use crate::InputState;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("invalid strategy name for {field}: {name:?}")]
    InvalidStrategyName { field: &'static str, name: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    strategy: StrategyNames,
    pub defaults: AreaDefaults,
    pub automation: AutomationSettings,
    pub feedback: FeedbackSettings,
    pub focus: FocusPatterns,
    /// Parsed `strategy.switcher`.
    #[serde(skip)]
    switcher: StrategyKind,
    /// Parsed `strategy.feedback`.
    #[serde(skip)]
    feedback_kind: FeedbackKind,
}

#[derive(Debug, Clone, Deserialize)]
struct StrategyNames {
    switcher: String,
    feedback: String,
}

impl Settings {
    pub fn switcher(&self) -> StrategyKind {
        self.switcher
    }

    pub fn feedback_kind(&self) -> FeedbackKind {
        self.feedback_kind
    }

    pub fn set_switcher(&mut self, kind: StrategyKind) {
        self.switcher = kind;
        self.strategy.switcher = kind.name().to_string();
    }

    pub fn set_feedback_kind(&mut self, kind: FeedbackKind) {
        self.feedback_kind = kind;
        self.strategy.feedback = kind.name().to_string();
    }
}

impl Default for Settings {
    fn default() -> Self {
        parse_settings_toml(DEFAULT_SETTINGS_TOML).expect("embedded settings TOML must be valid")
    }
}

/// Mode applied when focus enters each area (`[defaults]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AreaDefaults {
    pub editor: InputState,
    pub rename: InputState,
    pub terminal: InputState,
    pub search: InputState,
}

impl AreaDefaults {
    /// Configured state for `area`; `Other` has none.
    pub fn for_area(&self, area: FocusArea) -> Option<InputState> {
        match area {
            FocusArea::Editor => Some(self.editor),
            FocusArea::RenameField => Some(self.rename),
            FocusArea::Terminal => Some(self.terminal),
            FocusArea::Search => Some(self.search),
            FocusArea::Other => None,
        }
    }
}

pub const MAX_AUTOMATION_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AutomationSettings {
    pub max_attempts: u32,
    pub indicator_names: Vec<String>,
    #[serde(default)]
    pub probe_offsets: Option<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedbackSettings {
    pub chinese_caret_color: Rgb,
    pub english_caret_color: Rgb,
    pub balloon_duration_ms: u64,
}

impl FeedbackSettings {
    pub fn caret_color(&self, state: InputState) -> Rgb {
        match state {
            InputState::Chinese => self.chinese_caret_color,
            InputState::English => self.english_caret_color,
        }
    }
}

/// How the presentation layer shows a mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeedbackKind {
    #[default]
    CaretColor,
    Balloon,
}

impl FeedbackKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::CaretColor => "caret-color",
            Self::Balloon => "balloon",
        }
    }
}

impl FromStr for FeedbackKind {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "caret-color" | "CursorColorStrategy" => Ok(Self::CaretColor),
            "balloon" | "BalloonStrategy" => Ok(Self::Balloon),
            _ => Err(SettingsError::InvalidStrategyName {
                field: "strategy.feedback",
                name: s.to_string(),
            }),
        }
    }
}

/// `#RRGGBB` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Variant used on dark themes: every channel brightened by 30.
    pub fn dark_variant(self) -> Self {
        Self {
            r: self.r.saturating_add(30),
            g: self.g.saturating_add(30),
            b: self.b.saturating_add(30),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| format!("expected #RRGGBB, got {s:?}"))?;
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("{s:?}: {e}"))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let mut s: Settings =
        toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    s.switcher = s
        .strategy
        .switcher
        .parse()
        .map_err(|_| SettingsError::InvalidStrategyName {
            field: "strategy.switcher",
            name: s.strategy.switcher.clone(),
        })?;
    s.feedback_kind = s.strategy.feedback.parse()?;
    validate(&s)?;
    Ok(s)
}

pub fn load_settings_file(path: &Path) -> Result<Settings, SettingsError> {
    let content = fs::read_to_string(path)?;
    parse_settings_toml(&content)
}

fn invalid(field: &str, reason: &str) -> SettingsError {
    SettingsError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    if !(1..=MAX_AUTOMATION_ATTEMPTS).contains(&s.automation.max_attempts) {
        return Err(invalid("automation.max_attempts", "must be between 1 and 3"));
    }
    if s.automation.indicator_names.is_empty() {
        return Err(invalid("automation.indicator_names", "must not be empty"));
    }
    if s.automation.indicator_names.iter().any(|n| n.is_empty()) {
        return Err(invalid(
            "automation.indicator_names",
            "entries must be non-empty",
        ));
    }
    if let Some(offsets) = &s.automation.probe_offsets {
        if offsets.contains(&0) {
            return Err(invalid("automation.probe_offsets", "offsets start at 1"));
        }
    }
    if s.feedback.balloon_duration_ms == 0 {
        return Err(invalid("feedback.balloon_duration_ms", "must be positive"));
    }

    macro_rules! check_patterns {
        ($field:ident) => {
            if s.focus.$field.iter().any(|p| p.is_empty()) {
                return Err(invalid(
                    concat!("focus.", stringify!($field)),
                    "patterns must be non-empty",
                ));
            }
        };
    }
    check_patterns!(editor);
    check_patterns!(rename);
    check_patterns!(terminal);
    check_patterns!(search);

    Ok(())
}

/// Settings handle shared between the configuration layer and the engine.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings(Arc<RwLock<Settings>>);

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self(Arc::new(RwLock::new(settings)))
    }

    /// Run `f` against the current settings.
    pub fn read<R>(&self, f: impl FnOnce(&Settings) -> R) -> R {
        let guard = self.0.read().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    pub fn snapshot(&self) -> Settings {
        self.read(Settings::clone)
    }

    pub fn replace(&self, settings: Settings) {
        let mut guard = self.0.write().unwrap_or_else(|e| e.into_inner());
        *guard = settings;
    }

    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        let mut guard = self.0.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard);
    }
}
