//! Classification of the focused UI component into a named focus area.
//!
//! The host reports the focused component's type name followed by the type
//! names of its ancestors. Each name is matched, in chain order, against the
//! configured substrings for the editor, rename field, terminal and search
//! areas (checked in that order). The first hit wins; an exhausted chain is
//! `Other`.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusArea {
    Editor,
    RenameField,
    Terminal,
    Search,
    Other,
}

impl FocusArea {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Editor => "editor",
            Self::RenameField => "rename",
            Self::Terminal => "terminal",
            Self::Search => "search",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FocusArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container type-name substrings per focus area (`[focus]` in settings).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FocusPatterns {
    pub editor: Vec<String>,
    pub rename: Vec<String>,
    pub terminal: Vec<String>,
    pub search: Vec<String>,
}

impl FocusPatterns {
    fn ordered(&self) -> [(FocusArea, &[String]); 4] {
        [
            (FocusArea::Editor, &self.editor),
            (FocusArea::RenameField, &self.rename),
            (FocusArea::Terminal, &self.terminal),
            (FocusArea::Search, &self.search),
        ]
    }

    /// Area matched by a single component type name, if any.
    pub fn match_component(&self, type_name: &str) -> Option<FocusArea> {
        self.ordered().into_iter().find_map(|(area, patterns)| {
            patterns
                .iter()
                .any(|p| type_name.contains(p.as_str()))
                .then_some(area)
        })
    }
}

/// Walk the focus chain (focused component first) and classify it.
pub fn classify_focus<'a, I>(chain: I, patterns: &FocusPatterns) -> FocusArea
where
    I: IntoIterator<Item = &'a str>,
{
    chain
        .into_iter()
        .find_map(|type_name| patterns.match_component(type_name))
        .unwrap_or(FocusArea::Other)
}
