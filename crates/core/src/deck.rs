//! In-memory model of a reference deck.
//!
//! Every attribute is optional: decks are read as they are, and the style
//! extractor skips whatever is missing.

use crate::types::Alignment;
use serde::{Deserialize, Serialize};

/// Default slide width (10 inches).
pub const DEFAULT_SLIDE_WIDTH: i64 = 9_144_000;

/// Default slide height (7.5 inches).
pub const DEFAULT_SLIDE_HEIGHT: i64 = 6_858_000;

/// A reference presentation used only as a statistics source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDeck {
    /// Slide width in linear units.
    pub slide_width: i64,

    /// Slide height in linear units.
    pub slide_height: i64,

    /// Slides in presentation order.
    pub slides: Vec<DeckSlide>,
}

impl Default for ReferenceDeck {
    fn default() -> Self {
        Self::new(DEFAULT_SLIDE_WIDTH, DEFAULT_SLIDE_HEIGHT)
    }
}

impl ReferenceDeck {
    /// Create an empty deck with the given slide size.
    pub fn new(slide_width: i64, slide_height: i64) -> Self {
        Self {
            slide_width,
            slide_height,
            slides: Vec::new(),
        }
    }

    /// Add a slide to the deck.
    pub fn add_slide(&mut self, slide: DeckSlide) {
        self.slides.push(slide);
    }
}

/// A single slide of a reference deck.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckSlide {
    /// Name of the slide layout the slide was built from.
    pub layout_name: String,

    /// Solid background color as `#RRGGBB`, if any.
    pub background: Option<String>,

    /// Top-level shapes in document order.
    pub shapes: Vec<DeckShape>,
}

impl DeckSlide {
    /// Create an empty slide using the named layout.
    pub fn new(layout_name: impl Into<String>) -> Self {
        Self {
            layout_name: layout_name.into(),
            background: None,
            shapes: Vec::new(),
        }
    }

    /// Placeholder shapes on this slide.
    pub fn placeholders(&self) -> impl Iterator<Item = &DeckShape> {
        self.shapes.iter().filter(|s| s.placeholder.is_some())
    }
}

/// Placeholder type of a shape, as named in the deck's markup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceholderRole {
    Title,
    CenterTitle,
    Subtitle,
    Body,
    /// Generic content placeholder (also used when no type is given).
    Object,
    Header,
    Footer,
    Date,
    SlideNumber,
    Chart,
    Table,
    Picture,
    Other(String),
}

/// Size bucket a placeholder's runs are tallied into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBucket {
    Title,
    Body,
    Header,
}

impl PlaceholderRole {
    /// Parse a placeholder type attribute; a missing type means [`Self::Object`].
    pub fn from_type(value: Option<&str>) -> Self {
        match value {
            None | Some("obj") => Self::Object,
            Some("title") => Self::Title,
            Some("ctrTitle") => Self::CenterTitle,
            Some("subTitle") => Self::Subtitle,
            Some("body") => Self::Body,
            Some("hdr") => Self::Header,
            Some("ftr") => Self::Footer,
            Some("dt") => Self::Date,
            Some("sldNum") => Self::SlideNumber,
            Some("chart") => Self::Chart,
            Some("tbl") => Self::Table,
            Some("pic") => Self::Picture,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    /// Type name as it appears in markup.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Title => "title",
            Self::CenterTitle => "ctrTitle",
            Self::Subtitle => "subTitle",
            Self::Body => "body",
            Self::Object => "obj",
            Self::Header => "hdr",
            Self::Footer => "ftr",
            Self::Date => "dt",
            Self::SlideNumber => "sldNum",
            Self::Chart => "chart",
            Self::Table => "tbl",
            Self::Picture => "pic",
            Self::Other(name) => name,
        }
    }

    /// Font-size bucket for runs in this placeholder, if any.
    pub fn size_bucket(&self) -> Option<SizeBucket> {
        match self {
            Self::Title => Some(SizeBucket::Title),
            Self::Body | Self::Object => Some(SizeBucket::Body),
            Self::CenterTitle | Self::Header => Some(SizeBucket::Header),
            _ => None,
        }
    }

    pub fn is_title(&self) -> bool {
        matches!(self, Self::Title)
    }

    pub fn is_body(&self) -> bool {
        matches!(self, Self::Body | Self::Object)
    }
}

/// Position and size of a deck shape in linear units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

/// A top-level shape of a reference slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckShape {
    /// Shape kind label, e.g. `PLACEHOLDER`, `TEXT_BOX`, `PICTURE`.
    pub kind: String,

    /// Placeholder role, for placeholder shapes.
    pub placeholder: Option<PlaceholderRole>,

    /// Solid fill color as `#RRGGBB`, if any.
    pub fill: Option<String>,

    /// Position and size, if known.
    pub bounds: Option<Bounds>,

    pub has_chart: bool,
    pub has_table: bool,

    /// Paragraphs of the shape's text frame; `None` when the shape has none.
    pub text: Option<Vec<DeckParagraph>>,
}

impl DeckShape {
    /// Create a shape of the given kind with no attributes.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn has_text_frame(&self) -> bool {
        self.text.is_some()
    }

    /// Iterate over every run in the text frame.
    pub fn runs(&self) -> impl Iterator<Item = &DeckRun> {
        self.text.iter().flatten().flat_map(|p| p.runs.iter())
    }
}

/// A paragraph of a text frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckParagraph {
    pub alignment: Option<Alignment>,

    /// Space before, in points.
    pub space_before: Option<f64>,

    /// Space after, in points.
    pub space_after: Option<f64>,

    /// Line spacing as a multiple of single spacing.
    pub line_spacing: Option<f64>,

    pub runs: Vec<DeckRun>,
}

/// A run of formatted text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckRun {
    pub text: String,
    pub font_name: Option<String>,

    /// Font size in points.
    pub size: Option<f64>,

    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,

    /// Color as `#RRGGBB`.
    pub color: Option<String>,
}
