//! Aggregate style statistics learned from a reference deck.
//!
//! [`StylePatterns`] is built once per deck and then only read. Every field
//! has a fixed default, so a sparse deck or a partial persisted document still
//! yields a fully populated value.

use crate::deck::Bounds;
use crate::error::{Error, Result};
use crate::types::{Alignment, ParagraphSpacing};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Default margin used when no text-frame shape has known bounds.
pub const DEFAULT_MARGIN: i64 = 36;

/// Style statistics of a reference deck.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylePatterns {
    pub colors: ColorPatterns,
    pub fonts: FontPatterns,
    pub spacing: SpacingPatterns,
    pub layouts: LayoutPatterns,
}

impl StylePatterns {
    /// Parse a persisted style-patterns document. Missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::StyleDocument(e.to_string()))
    }

    /// Serialize to the pretty-printed interchange format.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a persisted style-patterns document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Write the interchange document to disk.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorPatterns {
    /// Most frequent text color.
    pub primary: String,

    /// Most frequent slide background color.
    pub background: String,

    /// Up to three most frequent non-text shape fills.
    pub accent: Vec<String>,
}

impl Default for ColorPatterns {
    fn default() -> Self {
        Self {
            primary: "#000000".to_string(),
            background: "#FFFFFF".to_string(),
            accent: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontPatterns {
    /// Most frequent font name.
    pub primary: String,
    pub sizes: FontSizes,
    pub styles: FontStyles,
}

impl Default for FontPatterns {
    fn default() -> Self {
        Self {
            primary: "Arial".to_string(),
            sizes: FontSizes::default(),
            styles: FontStyles::default(),
        }
    }
}

/// Mean point sizes per placeholder role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSizes {
    pub title: u32,
    pub body: u32,
    pub header: u32,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            title: 32,
            body: 18,
            header: 24,
        }
    }
}

/// Deck-wide majority flags. Each is set when the number of runs carrying the
/// attribute exceeds half the slide count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontStyles {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacingPatterns {
    pub paragraph: ParagraphSpacing,
    pub margins: Margins,
    pub preferred_alignment: Alignment,
}

/// Mean distances from text-frame shapes to the slide edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub left: i64,
    pub right: i64,
    pub top: i64,
    pub bottom: i64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: DEFAULT_MARGIN,
            right: DEFAULT_MARGIN,
            top: DEFAULT_MARGIN,
            bottom: DEFAULT_MARGIN,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutPatterns {
    /// Layout names by descending usage.
    pub common_layouts: Vec<String>,

    /// Per-layout statistics in order of first use in the deck. This order
    /// breaks ties in the layout matcher and survives a save/load cycle.
    pub layout_patterns: IndexMap<String, LayoutPattern>,
}

/// Kinds of content a layout typically holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentElement {
    Text,
    Table,
    Chart,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutPattern {
    /// Number of slides using this layout.
    pub frequency: u32,
    pub elements: LayoutElements,
    pub content_structure: ContentStructure,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutElements {
    /// Placeholder type → occurrence count.
    pub placeholders: BTreeMap<String, u32>,

    /// Distinct shape kinds seen on the layout.
    pub shapes: BTreeSet<String>,

    pub typical_elements: BTreeSet<ContentElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentStructure {
    pub title_location: Option<Bounds>,
    pub grid_layout: Option<GridLayout>,
    pub has_header: bool,
    pub has_footer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub columns: usize,
    pub rows: usize,
}
