//! Style pattern extraction from a reference deck.
//!
//! Colors, fonts, spacing and layouts are tallied independently. Any missing
//! attribute is simply left out of its tally, so a malformed shape never
//! aborts extraction.

use crate::deck::{Bounds, DeckSlide, ReferenceDeck, SizeBucket};
use crate::patterns::{
    ColorPatterns, ContentElement, ContentStructure, FontPatterns, FontSizes, FontStyles,
    GridLayout, LayoutPattern, LayoutPatterns, Margins, SpacingPatterns, StylePatterns,
    DEFAULT_MARGIN,
};
use crate::types::{Alignment, ParagraphSpacing};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

/// Number of accent colors kept.
const ACCENT_COUNT: usize = 3;

/// Fraction of slide height treated as header or footer band.
const EDGE_BAND: f64 = 0.1;

/// Frequency table that remembers first-seen order, so ties resolve
/// deterministically to the earliest key.
#[derive(Debug)]
struct Tally<K> {
    counts: Vec<(K, usize)>,
    index: HashMap<K, usize>,
}

impl<K: Clone + Eq + Hash> Tally<K> {
    fn new() -> Self {
        Self {
            counts: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(key.clone(), self.counts.len());
                self.counts.push((key, 1));
            }
        }
    }

    /// Most frequent key; earliest wins ties.
    fn argmax(&self) -> Option<&K> {
        let mut best: Option<&(K, usize)> = None;
        for entry in &self.counts {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(k, _)| k)
    }

    /// Keys by descending count; earlier keys first among equals.
    fn ranked(&self) -> Vec<K> {
        let mut sorted: Vec<&(K, usize)> = self.counts.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.into_iter().map(|(k, _)| k.clone()).collect()
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn rounded_mean(values: &[f64]) -> Option<i64> {
    mean(values).map(|m| m.round() as i64)
}

/// Builds [`StylePatterns`] from reference decks.
#[derive(Debug, Clone, Default)]
pub struct StyleExtractor;

impl StyleExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }

    /// Analyze a deck. Pure: the deck is only read.
    pub fn extract(&self, deck: &ReferenceDeck) -> StylePatterns {
        log::debug!("Extracting style patterns from {} slides", deck.slides.len());

        StylePatterns {
            colors: self.extract_colors(deck),
            fonts: self.extract_fonts(deck),
            spacing: self.extract_spacing(deck),
            layouts: self.extract_layouts(deck),
        }
    }

    fn extract_colors(&self, deck: &ReferenceDeck) -> ColorPatterns {
        let mut background = Tally::new();
        let mut text = Tally::new();
        let mut fills = Tally::new();

        for slide in &deck.slides {
            if let Some(color) = &slide.background {
                background.add(color.clone());
            }
            for shape in &slide.shapes {
                for run in shape.runs() {
                    if let Some(color) = &run.color {
                        text.add(color.clone());
                    }
                }
                if let Some(color) = &shape.fill {
                    fills.add(color.clone());
                }
            }
        }

        let defaults = ColorPatterns::default();
        ColorPatterns {
            primary: text.argmax().cloned().unwrap_or(defaults.primary),
            background: background.argmax().cloned().unwrap_or(defaults.background),
            accent: fills.ranked().into_iter().take(ACCENT_COUNT).collect(),
        }
    }

    fn extract_fonts(&self, deck: &ReferenceDeck) -> FontPatterns {
        let mut names = Tally::new();
        let mut title_sizes = Vec::new();
        let mut body_sizes = Vec::new();
        let mut header_sizes = Vec::new();
        let (mut bold, mut italic, mut underline) = (0usize, 0usize, 0usize);

        for shape in deck.slides.iter().flat_map(|s| s.shapes.iter()) {
            let bucket = shape.placeholder.as_ref().and_then(|p| p.size_bucket());

            for run in shape.runs() {
                if let Some(name) = run.font_name.as_ref().filter(|n| !n.is_empty()) {
                    names.add(name.clone());
                }
                if let (Some(size), Some(bucket)) = (run.size, bucket) {
                    match bucket {
                        SizeBucket::Title => title_sizes.push(size),
                        SizeBucket::Body => body_sizes.push(size),
                        SizeBucket::Header => header_sizes.push(size),
                    }
                }
                bold += usize::from(run.bold == Some(true));
                italic += usize::from(run.italic == Some(true));
                underline += usize::from(run.underline == Some(true));
            }
        }

        // Majority is measured against the slide count, not the run count.
        let majority = |count: usize| count as f64 > deck.slides.len() as f64 * 0.5;
        let size = |values: &[f64], default: u32| {
            rounded_mean(values)
                .and_then(|m| u32::try_from(m).ok())
                .unwrap_or(default)
        };
        let defaults = FontPatterns::default();

        FontPatterns {
            primary: names.argmax().cloned().unwrap_or(defaults.primary),
            sizes: FontSizes {
                title: size(&title_sizes, defaults.sizes.title),
                body: size(&body_sizes, defaults.sizes.body),
                header: size(&header_sizes, defaults.sizes.header),
            },
            styles: FontStyles {
                bold: majority(bold),
                italic: majority(italic),
                underline: majority(underline),
            },
        }
    }

    fn extract_spacing(&self, deck: &ReferenceDeck) -> SpacingPatterns {
        let mut before = Vec::new();
        let mut after = Vec::new();
        let mut line = Vec::new();
        let (mut left, mut right, mut top, mut bottom) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        let mut alignment: BTreeMap<usize, usize> = BTreeMap::new();

        for shape in deck.slides.iter().flat_map(|s| s.shapes.iter()) {
            let Some(paragraphs) = &shape.text else {
                continue;
            };

            if let Some(b) = shape.bounds {
                left.push(b.left as f64);
                top.push(b.top as f64);
                // Bounds come straight from markup and may be out of range.
                right.push(deck.slide_width.saturating_sub(b.left.saturating_add(b.width)) as f64);
                bottom.push(deck.slide_height.saturating_sub(b.top.saturating_add(b.height)) as f64);
            }

            for paragraph in paragraphs {
                before.extend(paragraph.space_before.filter(|v| *v != 0.0));
                after.extend(paragraph.space_after.filter(|v| *v != 0.0));
                line.extend(paragraph.line_spacing.filter(|v| *v != 0.0));

                if let Some(align) = paragraph.alignment {
                    let slot = Alignment::ALL.iter().position(|a| *a == align).unwrap_or(0);
                    *alignment.entry(slot).or_insert(0) += 1;
                }
            }
        }

        let defaults = ParagraphSpacing::default();
        let points = |values: &[f64], default: u32| {
            rounded_mean(values)
                .and_then(|m| u32::try_from(m).ok())
                .unwrap_or(default)
        };
        let margin = |values: &[f64]| rounded_mean(values).unwrap_or(DEFAULT_MARGIN);

        // Ties go to the earliest of left, center, right, justify.
        let mut preferred = Alignment::Left;
        let mut best = 0;
        for (slot, count) in alignment {
            if count > best {
                best = count;
                preferred = Alignment::ALL[slot];
            }
        }

        SpacingPatterns {
            paragraph: ParagraphSpacing {
                before: points(&before, defaults.before),
                after: points(&after, defaults.after),
                line: mean(&line)
                    .map(|m| (m * 10.0).round() / 10.0)
                    .unwrap_or(defaults.line),
            },
            margins: Margins {
                left: margin(&left),
                right: margin(&right),
                top: margin(&top),
                bottom: margin(&bottom),
            },
            preferred_alignment: preferred,
        }
    }

    fn extract_layouts(&self, deck: &ReferenceDeck) -> LayoutPatterns {
        let mut usage = Tally::new();
        let mut patterns: IndexMap<String, LayoutPattern> = IndexMap::new();

        for slide in &deck.slides {
            usage.add(slide.layout_name.clone());
            let pattern = patterns.entry(slide.layout_name.clone()).or_default();
            pattern.frequency += 1;
            self.analyze_layout_slide(deck, slide, pattern);
        }

        LayoutPatterns {
            common_layouts: usage.ranked(),
            layout_patterns: patterns,
        }
    }

    /// Fold one slide's placeholders and shapes into its layout's pattern.
    fn analyze_layout_slide(&self, deck: &ReferenceDeck, slide: &DeckSlide, pattern: &mut LayoutPattern) {
        let mut title: Option<Bounds> = None;
        let mut body_lefts = BTreeSet::new();
        let mut body_tops = BTreeSet::new();

        for shape in slide.placeholders() {
            let Some(role) = &shape.placeholder else {
                continue;
            };
            *pattern
                .elements
                .placeholders
                .entry(role.as_str().to_string())
                .or_insert(0) += 1;

            if role.is_title() {
                if let Some(bounds) = shape.bounds {
                    title = Some(bounds);
                }
            } else if role.is_body() {
                if let Some(bounds) = shape.bounds {
                    body_lefts.insert(bounds.left);
                    body_tops.insert(bounds.top);
                }
            }
        }

        let structure: &mut ContentStructure = &mut pattern.content_structure;
        if title.is_some() {
            structure.title_location = title;
        }
        if body_lefts.len() > 1 && body_tops.len() > 1 {
            structure.grid_layout = Some(GridLayout {
                columns: body_lefts.len(),
                rows: body_tops.len(),
            });
        }

        let height = deck.slide_height as f64;
        for shape in &slide.shapes {
            if let Some(bounds) = shape.bounds {
                let top = bounds.top as f64;
                if top < height * EDGE_BAND {
                    structure.has_header = true;
                }
                if top > height * (1.0 - EDGE_BAND) {
                    structure.has_footer = true;
                }
            }

            if !shape.kind.is_empty() {
                pattern.elements.shapes.insert(shape.kind.clone());
            }
            if shape.has_chart {
                pattern.elements.typical_elements.insert(ContentElement::Chart);
            }
            if shape.has_table {
                pattern.elements.typical_elements.insert(ContentElement::Table);
            }
            if shape.has_text_frame() {
                pattern.elements.typical_elements.insert(ContentElement::Text);
            }
        }
    }
}
