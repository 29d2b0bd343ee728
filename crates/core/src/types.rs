//! Canonical records for generated slides.
//!
//! Field names serialize exactly as the rendering collaborator expects them:
//! `layout{name,type}`, `shapes[]{type,location,textContent[]{text,style}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Title used when an outline entry carries none.
pub const DEFAULT_TITLE: &str = "Untitled Slide";

/// Visual hint used when an outline entry carries none.
pub const DEFAULT_VISUAL_HINT: &str = "Basic layout";

/// Slide category, given explicitly or inferred from title keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideCategory {
    ExecutiveSummary,
    ProblemStatement,
    Solution,
    Roadmap,
    Data,
    Conclusion,
    Content,
}

impl SlideCategory {
    /// Parse a canonical category name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "executive_summary" => Some(Self::ExecutiveSummary),
            "problem_statement" => Some(Self::ProblemStatement),
            "solution" => Some(Self::Solution),
            "roadmap" => Some(Self::Roadmap),
            "data" => Some(Self::Data),
            "conclusion" => Some(Self::Conclusion),
            "content" => Some(Self::Content),
            _ => None,
        }
    }

    /// Canonical snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExecutiveSummary => "executive_summary",
            Self::ProblemStatement => "problem_statement",
            Self::Solution => "solution",
            Self::Roadmap => "roadmap",
            Self::Data => "data",
            Self::Conclusion => "conclusion",
            Self::Content => "content",
        }
    }

    /// Default layout name for content of this category, e.g. `Executive_Summary`.
    pub fn layout_name(&self) -> String {
        let mut out = String::with_capacity(self.as_str().len());
        let mut start_of_word = true;
        for c in self.as_str().chars() {
            if start_of_word {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            start_of_word = !c.is_alphabetic();
        }
        out
    }
}

/// Minimal per-slide descriptor from the outline pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideOutlineEntry {
    /// Slide title, never empty.
    pub title: String,

    /// Slide category.
    #[serde(rename = "type")]
    pub category: SlideCategory,

    /// Key points in presentation order.
    pub key_points: Vec<String>,

    /// Free-form visual description.
    #[serde(rename = "visuals")]
    pub visual_hint: String,
}

impl SlideOutlineEntry {
    /// Create an entry with default key points and visual hint.
    pub fn new(title: impl Into<String>, category: SlideCategory) -> Self {
        Self {
            title: title.into(),
            category,
            key_points: Vec::new(),
            visual_hint: DEFAULT_VISUAL_HINT.to_string(),
        }
    }

    /// Replace the key points.
    pub fn with_key_points<I, S>(mut self, points: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_points = points.into_iter().map(Into::into).collect();
        self
    }
}

/// Slide layout reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: String,
}

/// Role of a shape on a generated slide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShapeKind {
    Title,
    Body,
    Other(String),
}

impl From<String> for ShapeKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "TITLE" => Self::Title,
            "BODY" => Self::Body,
            _ => Self::Other(value),
        }
    }
}

impl From<ShapeKind> for String {
    fn from(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Title => "TITLE".to_string(),
            ShapeKind::Body => "BODY".to_string(),
            ShapeKind::Other(name) => name,
        }
    }
}

/// Shape position and size in linear units (914400 per inch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Location {
    /// Default placement for body shapes and for missing location fields.
    pub const BODY: Location = Location::new(1_000_000, 2_500_000, 8_000_000, 4_000_000);

    /// Placement of a synthesized title shape.
    pub const TITLE: Location = Location::new(1_000_000, 1_000_000, 8_000_000, 1_000_000);

    pub const fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// All alignments, in tie-break order.
    pub const ALL: [Alignment; 4] = [Self::Left, Self::Center, Self::Right, Self::Justify];
}

/// Paragraph spacing in points, line spacing as a multiple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphSpacing {
    pub before: u32,
    pub after: u32,
    pub line: f64,
}

impl Default for ParagraphSpacing {
    fn default() -> Self {
        Self {
            before: 6,
            after: 6,
            line: 1.15,
        }
    }
}

/// Run-level text style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_size: u32,
    pub is_bold: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_spacing: Option<ParagraphSpacing>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_italic: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_underline: Option<bool>,
}

impl TextStyle {
    /// Plain style with only size and weight set.
    pub fn new(font_size: u32, is_bold: bool) -> Self {
        Self {
            font_size,
            is_bold,
            color: None,
            font_name: None,
            alignment: None,
            paragraph_spacing: None,
            is_italic: None,
            is_underline: None,
        }
    }
}

/// A run of text with its style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub style: TextStyle,
}

impl TextRun {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// A positioned shape on a generated slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(rename = "type")]
    pub kind: ShapeKind,

    pub location: Location,

    #[serde(rename = "textContent", default)]
    pub text_content: Vec<TextRun>,

    /// Table payload, carried through untouched.
    #[serde(rename = "tableContent", default, skip_serializing_if = "Option::is_none")]
    pub table_content: Option<Value>,

    /// Chart payload, carried through untouched.
    #[serde(rename = "chartContent", default, skip_serializing_if = "Option::is_none")]
    pub chart_content: Option<Value>,
}

impl Shape {
    /// Create a text shape.
    pub fn new(kind: ShapeKind, location: Location, text_content: Vec<TextRun>) -> Self {
        Self {
            kind,
            location,
            text_content,
            table_content: None,
            chart_content: None,
        }
    }
}

/// Expanded per-shape slide structure from the second generation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedContent {
    pub layout: Layout,
    pub shapes: Vec<Shape>,
}

impl DetailedContent {
    /// Whether any shape has the given kind.
    pub fn has_kind(&self, kind: &ShapeKind) -> bool {
        self.shapes.iter().any(|s| &s.kind == kind)
    }

    /// Iterate over every text run in shape order.
    pub fn runs(&self) -> impl Iterator<Item = &TextRun> {
        self.shapes.iter().flat_map(|s| s.text_content.iter())
    }
}

/// Detailed content with deck styling stamped onto every run and a resolved
/// layout name. Handed to the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledSlideRecord {
    pub layout: Layout,
    pub shapes: Vec<Shape>,
}

impl From<StyledSlideRecord> for DetailedContent {
    fn from(record: StyledSlideRecord) -> Self {
        Self {
            layout: record.layout,
            shapes: record.shapes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_layout_name() {
        assert_eq!(
            SlideCategory::ExecutiveSummary.layout_name(),
            "Executive_Summary"
        );
        assert_eq!(SlideCategory::Data.layout_name(), "Data");
    }

    #[test]
    fn test_category_from_name() {
        assert_eq!(
            SlideCategory::from_name("Problem_Statement"),
            Some(SlideCategory::ProblemStatement)
        );
        assert_eq!(SlideCategory::from_name("matrix"), None);
    }

    #[test]
    fn test_shape_kind_serializes_as_type_string() {
        let shape = Shape::new(ShapeKind::Title, Location::TITLE, Vec::new());
        let json = serde_json::to_value(&shape).unwrap();
        assert_eq!(json["type"], "TITLE");
        assert!(json.get("tableContent").is_none());

        let other: ShapeKind = serde_json::from_value(serde_json::json!("PICTURE")).unwrap();
        assert_eq!(other, ShapeKind::Other("PICTURE".to_string()));
    }

    #[test]
    fn test_text_style_field_names() {
        let mut style = TextStyle::new(24, false);
        style.font_name = Some("Arial".to_string());
        style.alignment = Some(Alignment::Center);
        let json = serde_json::to_value(&style).unwrap();
        assert_eq!(json["fontSize"], 24);
        assert_eq!(json["isBold"], false);
        assert_eq!(json["fontName"], "Arial");
        assert_eq!(json["alignment"], "center");
        assert!(json.get("color").is_none());
    }

    #[test]
    fn test_outline_entry_canonical_keys() {
        let entry = SlideOutlineEntry::new("Next Steps", SlideCategory::Roadmap)
            .with_key_points(["Hire", "Launch"]);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "roadmap");
        assert_eq!(json["visuals"], "Basic layout");
        assert_eq!(json["key_points"][1], "Launch");
    }
}
