//! Layout matching and style stamping.
//!
//! Every run receives the same deck-wide styling: primary color and font,
//! paragraph spacing, preferred alignment, and the majority bold/italic/
//! underline flags. Only the font size differs between TITLE and other shapes.
//! Per-run nuance of the reference deck is deliberately not reproduced.

use crate::patterns::{ContentElement, LayoutPattern, StylePatterns};
use crate::types::{DetailedContent, ShapeKind, StyledSlideRecord, TextStyle};
use std::collections::BTreeSet;

/// Content elements a slide needs its layout to support. Text is always
/// required.
pub fn required_elements(content: &DetailedContent) -> BTreeSet<ContentElement> {
    let mut required = BTreeSet::from([ContentElement::Text]);
    if content.shapes.iter().any(|s| s.table_content.is_some()) {
        required.insert(ContentElement::Table);
    }
    if content.shapes.iter().any(|s| s.chart_content.is_some()) {
        required.insert(ContentElement::Chart);
    }
    required
}

/// `2 × |required ∩ typical| + frequency`.
pub fn score_layout(required: &BTreeSet<ContentElement>, pattern: &LayoutPattern) -> u32 {
    let matching = required
        .intersection(&pattern.elements.typical_elements)
        .count() as u32;
    matching * 2 + pattern.frequency
}

/// Name of the best-scoring layout, or `None` when the deck has no layouts.
/// Ties go to the layout first used in the reference deck.
pub fn best_layout<'a>(content: &DetailedContent, patterns: &'a StylePatterns) -> Option<&'a str> {
    let required = required_elements(content);
    let mut best: Option<(&str, u32)> = None;

    for (name, pattern) in &patterns.layouts.layout_patterns {
        let score = score_layout(&required, pattern);
        log::debug!("Layout '{}' scored {}", name, score);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((name.as_str(), score));
        }
    }

    best.map(|(name, _)| name)
}

/// Style stamped onto runs of a shape of the given kind.
fn stamped_style(kind: &ShapeKind, patterns: &StylePatterns) -> TextStyle {
    let fonts = &patterns.fonts;
    let font_size = match kind {
        ShapeKind::Title => fonts.sizes.title,
        _ => fonts.sizes.body,
    };

    TextStyle {
        font_size,
        is_bold: fonts.styles.bold,
        color: Some(patterns.colors.primary.clone()),
        font_name: Some(fonts.primary.clone()),
        alignment: Some(patterns.spacing.preferred_alignment),
        paragraph_spacing: Some(patterns.spacing.paragraph),
        is_italic: Some(fonts.styles.italic),
        is_underline: Some(fonts.styles.underline),
    }
}

/// Resolve the layout and stamp deck styling onto every run.
pub fn apply_style(content: &DetailedContent, patterns: &StylePatterns) -> StyledSlideRecord {
    let mut layout = content.layout.clone();
    if let Some(name) = best_layout(content, patterns) {
        layout.name = name.to_string();
    }

    let shapes = content
        .shapes
        .iter()
        .map(|shape| {
            let style = stamped_style(&shape.kind, patterns);
            let mut shape = shape.clone();
            for run in &mut shape.text_content {
                run.style = style.clone();
            }
            shape
        })
        .collect();

    StyledSlideRecord { layout, shapes }
}
