//! Input-method state values shared by every layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Desired or observed input-method mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputState {
    English,
    Chinese,
}

impl InputState {
    pub fn toggled(self) -> Self {
        match self {
            Self::English => Self::Chinese,
            Self::Chinese => Self::English,
        }
    }

    /// Short label used by the balloon indicator.
    pub fn label(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Chinese => "中",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Chinese => "chinese",
        }
    }
}

impl fmt::Display for InputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown input state: {0:?} (expected \"english\" or \"chinese\")")]
pub struct ParseInputStateError(pub String);

impl FromStr for InputState {
    type Err = ParseInputStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Self::English),
            "chinese" | "zh" | "中" => Ok(Self::Chinese),
            _ => Err(ParseInputStateError(s.to_string())),
        }
    }
}
