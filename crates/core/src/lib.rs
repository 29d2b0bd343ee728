//! Recovery and normalization of generated slide text, and style-pattern
//! extraction and matching against a reference deck.

pub mod deck;
pub mod error;
pub mod extract;
pub mod generator;
pub mod matcher;
pub mod normalize;
pub mod patterns;
pub mod recover;
pub mod types;

pub use deck::{DeckParagraph, DeckRun, DeckShape, DeckSlide, PlaceholderRole, ReferenceDeck};
pub use error::{Error, RecoveryError, Result};
pub use extract::StyleExtractor;
pub use generator::{ContentGenerator, PromptedGenerator, SlidePipeline, TextBackend};
pub use matcher::apply_style;
pub use normalize::{normalize_content, normalize_outline};
pub use patterns::StylePatterns;
pub use recover::{recover_json, recover_value};
pub use types::{
    DetailedContent, Layout, Location, Shape, ShapeKind, SlideCategory, SlideOutlineEntry,
    StyledSlideRecord, TextRun, TextStyle,
};
