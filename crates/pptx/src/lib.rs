//! PPTX (Office Open XML) reader for reference decks.
//!
//! Parses .pptx files, which are ZIP archives of XML parts, into the
//! [`slide_core::ReferenceDeck`] model used for style extraction.

pub mod parser;

pub use parser::PptxParser;
