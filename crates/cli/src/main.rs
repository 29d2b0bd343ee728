//! CLI for extracting reference-deck styles and recovering generated slides.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use slide_core::generator::{content_from_text, outline_from_text};
use slide_core::normalize::infer_category;
use slide_core::types::DEFAULT_TITLE;
use slide_core::{apply_style, SlideCategory, SlideOutlineEntry, StyleExtractor, StylePatterns};
use slide_pptx::PptxParser;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Extract style patterns from decks and turn model output into styled slides.
#[derive(Parser, Debug)]
#[command(name = "slide-forge")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read a reference .pptx and emit its style patterns as JSON
    Extract {
        /// Reference deck (.pptx)
        deck: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Recover and normalize raw model output
    Recover {
        /// File with the model response, or `-` for stdin
        input: String,

        /// What the response describes
        #[arg(short, long, value_enum, default_value = "outline")]
        kind: RecordKind,

        /// Slide title used for content fallbacks and missing shapes
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Recover slide content and stamp it with a deck's style patterns
    Style {
        /// Style patterns JSON produced by `extract`
        #[arg(short, long)]
        patterns: PathBuf,

        /// File with the model response, or `-` for stdin
        input: String,

        /// Slide title used for fallbacks and missing shapes
        #[arg(short, long)]
        title: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RecordKind {
    Outline,
    Content,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match args.command {
        Command::Extract { deck, output } => extract(&deck, output.as_deref()),
        Command::Recover { input, kind, title } => {
            let raw = read_input(&input)?;
            let title = title.unwrap_or_default();
            match kind {
                RecordKind::Outline => print_json(&outline_from_text(&raw, &title)),
                RecordKind::Content => print_json(&content_from_text(&raw, &entry_for(&title))),
            }
        }
        Command::Style {
            patterns,
            input,
            title,
        } => {
            let patterns = StylePatterns::load(&patterns)
                .with_context(|| format!("Failed to load style patterns from {}", patterns.display()))?;
            let raw = read_input(&input)?;
            let entry = entry_for(&title.unwrap_or_default());
            let content = content_from_text(&raw, &entry);
            print_json(&apply_style(&content, &patterns))
        }
    }
}

/// Extract style patterns from a deck and write them out.
fn extract(deck_path: &Path, output: Option<&Path>) -> Result<()> {
    log::debug!("Reading reference deck {}", deck_path.display());
    let deck = PptxParser::new()
        .parse_path(deck_path)
        .with_context(|| format!("Failed to read {}", deck_path.display()))?;

    log::info!("Found {} slides", deck.slides.len());
    let patterns = StyleExtractor::new().extract(&deck);

    match output {
        Some(path) => {
            patterns
                .save(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Written to: {}", path.display());
            Ok(())
        }
        None => {
            let json = patterns.to_json().context("Failed to serialize style patterns")?;
            println!("{}", json);
            Ok(())
        }
    }
}

/// Outline entry standing in for the slide being recovered.
fn entry_for(title: &str) -> SlideOutlineEntry {
    if title.trim().is_empty() {
        return SlideOutlineEntry::new(DEFAULT_TITLE, SlideCategory::Content);
    }
    SlideOutlineEntry::new(title.trim(), infer_category(title))
}

/// Read model output from a file, or from stdin for `-`.
fn read_input(input: &str) -> Result<String> {
    let mut raw = String::new();
    if input == "-" {
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read stdin")?;
    } else {
        File::open(input)
            .and_then(|mut f| f.read_to_string(&mut raw))
            .with_context(|| format!("Failed to read {}", input))?;
    }
    Ok(raw)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", json).context("Failed to write to stdout")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_style_command() {
        let args = Args::parse_from(["slide-forge", "-v", "style", "-p", "deck.json", "-", "-t", "Next Steps"]);
        assert!(args.verbose);
        match args.command {
            Command::Style {
                patterns,
                input,
                title,
            } => {
                assert_eq!(patterns, PathBuf::from("deck.json"));
                assert_eq!(input, "-");
                assert_eq!(title.as_deref(), Some("Next Steps"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_entry_for_title() {
        let entry = entry_for("  Next Steps ");
        assert_eq!(entry.title, "Next Steps");
        assert_eq!(entry.category, SlideCategory::Roadmap);

        let untitled = entry_for("");
        assert_eq!(untitled.title, "Untitled Slide");
        assert_eq!(untitled.category, SlideCategory::Content);
    }

    #[test]
    fn test_read_input_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "- Grow 10%").unwrap();
        let raw = read_input(file.path().to_str().unwrap()).unwrap();
        assert_eq!(raw, "- Grow 10%");
        assert!(read_input("/nonexistent/response.txt").is_err());
    }
}
