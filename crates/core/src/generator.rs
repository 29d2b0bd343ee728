//! Generation seam and the degrade-and-continue slide pipeline.
//!
//! Backends are reached only through [`ContentGenerator`]. The bundled
//! [`PromptedGenerator`] drives any [`TextBackend`] with compact-key prompts
//! and turns its raw text into canonical records, substituting canned
//! fallback records whenever the text cannot be recovered.

use crate::error::{Error, Result};
use crate::matcher::apply_style;
use crate::normalize::{body_shape, normalize_content, normalize_outline, title_shape};
use crate::patterns::StylePatterns;
use crate::recover::recover_value;
use crate::types::{
    DetailedContent, Layout, SlideCategory, SlideOutlineEntry, StyledSlideRecord,
};

/// Layout type of fallback slide content.
const FALLBACK_LAYOUT_TYPE: &str = "basic";

/// Capability interface for text-generation backends.
pub trait ContentGenerator {
    /// Produce an outline for a presentation brief.
    fn generate_outline(&self, brief: &str) -> Result<Vec<SlideOutlineEntry>>;

    /// Produce detailed content for one outline entry.
    fn generate_slide_content(&self, entry: &SlideOutlineEntry) -> Result<DetailedContent>;
}

/// A model endpoint that completes a prompt. Errors signal backend failure.
pub trait TextBackend {
    fn complete(&self, prompt: &str) -> Result<String>;
}

impl<F> TextBackend for F
where
    F: Fn(&str) -> Result<String>,
{
    fn complete(&self, prompt: &str) -> Result<String> {
        self(prompt)
    }
}

/// Outline used when the model's outline cannot be recovered.
pub fn fallback_outline(brief: &str) -> Vec<SlideOutlineEntry> {
    let mut entry = SlideOutlineEntry::new("Executive Summary", SlideCategory::ExecutiveSummary);
    entry.key_points = brief
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| vec![line.to_string()])
        .unwrap_or_default();
    entry.visual_hint = "Title slide with key message".to_string();
    vec![entry]
}

/// Slide content used when the model's content cannot be recovered.
pub fn fallback_content(entry: &SlideOutlineEntry) -> DetailedContent {
    DetailedContent {
        layout: Layout {
            name: entry.category.layout_name(),
            kind: FALLBACK_LAYOUT_TYPE.to_string(),
        },
        shapes: vec![title_shape(entry), body_shape(entry)],
    }
}

/// Recover and normalize raw outline text, falling back on failure.
pub fn outline_from_text(raw: &str, brief: &str) -> Vec<SlideOutlineEntry> {
    let parsed = recover_value(raw)
        .map_err(Error::from)
        .and_then(|value| normalize_outline(&value));

    match parsed {
        Ok(entries) if !entries.is_empty() => entries,
        Ok(_) => {
            log::warn!("Model returned an empty outline, using fallback");
            fallback_outline(brief)
        }
        Err(e) => {
            log::error!("Failed to parse outline from model response: {}", e);
            fallback_outline(brief)
        }
    }
}

/// Recover and normalize raw slide-content text, falling back on failure.
pub fn content_from_text(raw: &str, entry: &SlideOutlineEntry) -> DetailedContent {
    let parsed = recover_value(raw)
        .map_err(Error::from)
        .and_then(|value| normalize_content(&value, entry));

    parsed.unwrap_or_else(|e| {
        log::error!(
            "Failed to parse content for slide '{}' from model response: {}",
            entry.title,
            e
        );
        fallback_content(entry)
    })
}

/// Prompt asking for a compact-key outline.
pub fn outline_prompt(brief: &str) -> String {
    format!(
        r#"Create a McKinsey-style presentation outline.

Brief: {brief}

Example format:
[{{
  "t": "Executive Summary",
  "k": ["Key point 1", "Key point 2"],
  "v": "2x2 matrix"
}}]

Requirements:
1. Each slide needs clear message
2. Use action-oriented titles
3. 3-4 key points per slide
4. Specific visual type

Return array of slides following this exact format."#
    )
}

/// Prompt asking for compact-key detailed content of one slide.
pub fn slide_content_prompt(entry: &SlideOutlineEntry) -> String {
    let quoted = |s: &str| serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s));
    let key_points = serde_json::to_string(&entry.key_points).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"Create slide content.

Input: {{
  "t": {title},
  "type": "{category}",
  "k": {key_points},
  "v": {visuals}
}}

Return JSON with this structure:
{{
  "l": {{"n": "type_name", "t": "content_type"}},
  "s": [
    {{
      "t": "TITLE",
      "p": {{"x": 1000000, "y": 1000000, "w": 8000000, "h": 1000000}},
      "c": [{{"t": "text", "s": {{"f": 32, "b": true}}}}]
    }}
  ]
}}

Rules:
1. Keep JSON compact
2. Use short keys
3. Include all points
4. Match visual type"#,
        title = quoted(&entry.title),
        category = entry.category.as_str(),
        visuals = quoted(&entry.visual_hint),
    )
}

/// [`ContentGenerator`] that prompts a [`TextBackend`] and recovers its output.
///
/// Unrecoverable text degrades to fallback records; backend failures are
/// returned to the caller.
#[derive(Debug, Clone)]
pub struct PromptedGenerator<B> {
    backend: B,
}

impl<B: TextBackend> PromptedGenerator<B> {
    /// Wrap a backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: TextBackend> ContentGenerator for PromptedGenerator<B> {
    fn generate_outline(&self, brief: &str) -> Result<Vec<SlideOutlineEntry>> {
        let raw = self.backend.complete(&outline_prompt(brief))?;
        log::debug!("Raw outline response: {}", raw);
        Ok(outline_from_text(&raw, brief))
    }

    fn generate_slide_content(&self, entry: &SlideOutlineEntry) -> Result<DetailedContent> {
        let raw = self.backend.complete(&slide_content_prompt(entry))?;
        log::debug!("Raw slide content response: {}", raw);
        Ok(content_from_text(&raw, entry))
    }
}

/// Runs generation, normalization, matching and styling for a whole deck.
///
/// Holds the style patterns by shared reference; they are never modified.
pub struct SlidePipeline<'a, G> {
    generator: G,
    patterns: &'a StylePatterns,
}

impl<'a, G: ContentGenerator> SlidePipeline<'a, G> {
    pub fn new(generator: G, patterns: &'a StylePatterns) -> Self {
        Self {
            generator,
            patterns,
        }
    }

    /// Build styled slides for a brief. Never fails: an unusable outline or
    /// slide degrades to fallback content.
    pub fn run(&self, brief: &str) -> Vec<StyledSlideRecord> {
        let outline = self.generator.generate_outline(brief).unwrap_or_else(|e| {
            log::error!("Outline generation failed: {}", e);
            fallback_outline(brief)
        });
        log::info!("Generated {} slides in outline", outline.len());

        outline.iter().map(|entry| self.style_slide(entry)).collect()
    }

    /// Generate and style a single slide.
    pub fn style_slide(&self, entry: &SlideOutlineEntry) -> StyledSlideRecord {
        let content = self
            .generator
            .generate_slide_content(entry)
            .unwrap_or_else(|e| {
                log::error!("Content generation failed for '{}': {}", entry.title, e);
                fallback_content(entry)
            });
        apply_style(&content, self.patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShapeKind;

    fn entry() -> SlideOutlineEntry {
        SlideOutlineEntry::new("The \"Big\" Problem", SlideCategory::ProblemStatement)
            .with_key_points(["Churn at 20%"])
    }

    #[test]
    fn test_fallback_outline_uses_first_line() {
        let outline = fallback_outline("Grow APAC revenue\nSecond line");
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].title, "Executive Summary");
        assert_eq!(outline[0].key_points, vec!["Grow APAC revenue"]);
        assert_eq!(outline[0].visual_hint, "Title slide with key message");

        assert!(fallback_outline("").first().unwrap().key_points.is_empty());
    }

    #[test]
    fn test_fallback_content() {
        let content = fallback_content(&entry());
        assert_eq!(content.layout.name, "Problem_Statement");
        assert_eq!(content.layout.kind, "basic");
        assert_eq!(content.shapes[0].kind, ShapeKind::Title);
        assert_eq!(content.shapes[0].text_content[0].text, "The \"Big\" Problem");
        assert_eq!(content.shapes[1].text_content[0].text, "Churn at 20%");
    }

    #[test]
    fn test_content_from_garbage_falls_back() {
        let content = content_from_text("I'm sorry, I can't do that.", &entry());
        assert_eq!(content, fallback_content(&entry()));
    }

    #[test]
    fn test_content_from_text_is_not_fallback_when_valid() {
        let raw = r#"{"l": {"n": "Title Only"}, "s": [{"t": "TITLE", "c": [{"t": "Hi"}]}]}"#;
        let content = content_from_text(raw, &entry());
        assert_eq!(content.layout.name, "Title Only");
        assert_eq!(content.layout.kind, "content");
        assert_eq!(content.shapes.len(), 2);
    }

    #[test]
    fn test_outline_from_text_edge_cases() {
        let outline = outline_from_text("\"just a string\" {}", "Brief");
        // `{}` is recovered as an empty object, which is a single default entry.
        assert_eq!(outline[0].title, "Untitled Slide");

        let outline = outline_from_text("[]", "Brief");
        assert_eq!(outline, fallback_outline("Brief"));
    }

    #[test]
    fn test_slide_prompt_escapes_title() {
        let prompt = slide_content_prompt(&entry());
        assert!(prompt.contains(r#""t": "The \"Big\" Problem""#));
        assert!(prompt.contains(r#""type": "problem_statement""#));
        assert!(prompt.contains(r#""k": ["Churn at 20%"]"#));
    }

    #[test]
    fn test_outline_prompt_embeds_brief() {
        assert!(outline_prompt("Cut costs").contains("Brief: Cut costs"));
    }
}
