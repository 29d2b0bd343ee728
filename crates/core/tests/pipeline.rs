use slide_core::generator::fallback_content;
use slide_core::patterns::{ContentElement, LayoutPattern};
use slide_core::{
    ContentGenerator, DetailedContent, Error, PromptedGenerator, Result, ShapeKind, SlidePipeline,
    SlideOutlineEntry, StyleExtractor, StylePatterns,
};
use slide_core::{DeckShape, DeckSlide, ReferenceDeck};
use std::cell::RefCell;

/// Backend that replays canned responses in order.
struct ScriptedBackend {
    responses: RefCell<Vec<Result<String>>>,
}

impl ScriptedBackend {
    fn new(responses: Vec<Result<String>>) -> Self {
        let mut responses = responses;
        responses.reverse();
        Self {
            responses: RefCell::new(responses),
        }
    }
}

impl slide_core::TextBackend for ScriptedBackend {
    fn complete(&self, _prompt: &str) -> Result<String> {
        self.responses
            .borrow_mut()
            .pop()
            .unwrap_or_else(|| Err(Error::Backend("script exhausted".to_string())))
    }
}

fn patterns() -> StylePatterns {
    let mut patterns = StylePatterns::default();
    patterns.fonts.primary = "Georgia".to_string();
    let mut text = LayoutPattern {
        frequency: 4,
        ..LayoutPattern::default()
    };
    text.elements.typical_elements.insert(ContentElement::Text);
    patterns
        .layouts
        .layout_patterns
        .insert("Title and Content".to_string(), text);
    patterns
}

#[test]
fn test_pipeline_end_to_end() {
    let backend = ScriptedBackend::new(vec![
        Ok("```json\n[{'t': 'Market Overview', 'k': ['Demand up',], 'v': 'chart'},\n {'t': 'Next Steps', 'k': ['Hire']}]\n```".to_string()),
        Ok("{\"l\": {\"n\": \"Custom\"}, \"s\": [{\"t\": \"TITLE\", \"c\": [{\"t\": \"Demand is rising\", \"s\": {\"f\": 30, \"b\": True}}]}]}".to_string()),
        Ok("Sorry, no JSON today.".to_string()),
    ]);
    let patterns = patterns();
    let pipeline = SlidePipeline::new(PromptedGenerator::new(backend), &patterns);

    let slides = pipeline.run("Grow in APAC");
    assert_eq!(slides.len(), 2);

    let first = &slides[0];
    assert_eq!(first.layout.name, "Title and Content");
    assert_eq!(first.shapes[0].text_content[0].text, "Demand is rising");
    assert_eq!(first.shapes[0].text_content[0].style.font_size, 32);
    assert_eq!(first.shapes[1].kind, ShapeKind::Body);
    assert_eq!(first.shapes[1].text_content[0].text, "Demand up");
    assert_eq!(first.shapes[1].text_content[0].style.font_size, 18);
    assert_eq!(
        first.shapes[1].text_content[0].style.font_name.as_deref(),
        Some("Georgia")
    );

    // Unrecoverable text degrades to the fallback slide, still styled.
    let second = &slides[1];
    assert_eq!(second.layout.name, "Title and Content");
    assert_eq!(second.layout.kind, "basic");
    assert_eq!(second.shapes[0].text_content[0].text, "Next Steps");
    assert_eq!(second.shapes[1].text_content[0].text, "Hire");
}

#[test]
fn test_pipeline_backend_failure_degrades() {
    let backend = ScriptedBackend::new(vec![Err(Error::Backend("connection refused".to_string()))]);
    let patterns = StylePatterns::default();
    let pipeline = SlidePipeline::new(PromptedGenerator::new(backend), &patterns);

    let slides = pipeline.run("Cut costs by 10%");
    assert_eq!(slides.len(), 1);
    assert_eq!(slides[0].layout.name, "Executive_Summary");
    assert_eq!(slides[0].shapes[0].text_content[0].text, "Executive Summary");
    assert_eq!(slides[0].shapes[1].text_content[0].text, "Cut costs by 10%");
}

/// Generator that implements the capability trait directly.
struct Canned;

impl ContentGenerator for Canned {
    fn generate_outline(&self, _brief: &str) -> Result<Vec<SlideOutlineEntry>> {
        Ok((0..8)
            .map(|i| {
                SlideOutlineEntry::new(format!("Slide {}", i), slide_core::SlideCategory::Content)
                    .with_key_points([format!("Point {}", i)])
            })
            .collect())
    }

    fn generate_slide_content(&self, entry: &SlideOutlineEntry) -> Result<DetailedContent> {
        Ok(fallback_content(entry))
    }
}

#[test]
fn test_patterns_shared_across_threads() {
    let mut deck = ReferenceDeck::default();
    let mut slide = DeckSlide::new("Only Layout");
    slide.shapes.push(DeckShape {
        text: Some(Vec::new()),
        ..DeckShape::new("TEXT_BOX")
    });
    deck.add_slide(slide);
    let patterns = StyleExtractor::new().extract(&deck);

    let outline = Canned.generate_outline("brief").unwrap();
    let styled: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = outline
            .iter()
            .map(|entry| {
                let patterns = &patterns;
                scope.spawn(move || {
                    let content = Canned.generate_slide_content(entry).unwrap();
                    slide_core::apply_style(&content, patterns)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(styled.len(), 8);
    for (i, slide) in styled.iter().enumerate() {
        assert_eq!(slide.layout.name, "Only Layout");
        assert_eq!(slide.shapes[1].text_content[0].text, format!("Point {}", i));
    }
}
