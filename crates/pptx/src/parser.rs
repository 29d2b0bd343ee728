//! PPTX reference-deck reader.
//!
//! Reads slide size, slide order, layouts, backgrounds, and the top-level
//! shapes of every slide into a [`ReferenceDeck`]. Only what the markup states
//! directly is recorded; theme and master styles are not resolved, except that
//! placeholders without their own position inherit it from the slide layout.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use slide_core::deck::{
    Bounds, DeckParagraph, DeckRun, DeckShape, DeckSlide, PlaceholderRole, ReferenceDeck,
    DEFAULT_SLIDE_HEIGHT, DEFAULT_SLIDE_WIDTH,
};
use slide_core::types::Alignment;
use slide_core::{Error, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

/// Layout name recorded for slides whose layout cannot be resolved.
const UNKNOWN_LAYOUT: &str = "Unknown";

/// Elements that start a shape inside `p:spTree`.
const SHAPE_ELEMENTS: &[&[u8]] = &[b"sp", b"pic", b"graphicFrame", b"grpSp", b"cxnSp"];

/// Parser for PPTX (Office Open XML) reference decks.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from disk.
    pub fn parse_path(&self, path: impl AsRef<Path>) -> Result<ReferenceDeck> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::StyleExtraction(format!("Failed to open {}: {}", path.display(), e))
        })?;
        self.parse(BufReader::new(file))
    }

    /// Parse a PPTX file from a reader.
    ///
    /// An archive that cannot be opened, or one without a presentation part,
    /// is an error. Individual slides that fail to parse are skipped.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<ReferenceDeck> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::StyleExtraction(format!("Failed to open ZIP: {}", e)))?;

        let presentation_xml = read_file_from_archive(&mut archive, PRESENTATION_PATH)?;
        let info = parse_presentation_info(&presentation_xml)?;
        let mut deck = ReferenceDeck::new(info.width, info.height);

        let slide_order = self.get_slide_order(&mut archive, &info.slide_rel_ids)?;
        let mut layouts: HashMap<String, LayoutInfo> = HashMap::new();

        for (idx, slide_path) in slide_order.iter().enumerate() {
            match self.parse_slide(&mut archive, slide_path, &mut layouts) {
                Ok(slide) => deck.add_slide(slide),
                Err(e) => log::warn!("Skipping slide {} ({}): {}", idx + 1, slide_path, e),
            }
        }

        log::debug!(
            "Read {} slides using {} layouts",
            deck.slides.len(),
            layouts.len()
        );
        Ok(deck)
    }

    /// Get the ordered list of slide paths.
    ///
    /// Uses the `p:sldIdLst` order when present, otherwise falls back to the
    /// numbers embedded in relationship ids and targets.
    fn get_slide_order<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_rel_ids: &[String],
    ) -> Result<Vec<String>> {
        let rels_content = read_file_from_archive(archive, PRESENTATION_RELS_PATH)?;
        let slides: Vec<Relationship> = parse_relationships(&rels_content)?
            .into_iter()
            .filter(|r| r.rel_type.ends_with("/slide"))
            .collect();

        if !slide_rel_ids.is_empty() {
            return Ok(slide_rel_ids
                .iter()
                .filter_map(|id| slides.iter().find(|r| &r.id == id))
                .map(|r| resolve_target("ppt", &r.target))
                .collect());
        }

        let mut numbered: Vec<(String, Option<usize>)> = slides
            .iter()
            .map(|r| {
                let order = extract_slide_number(&r.id).or_else(|| extract_slide_number(&r.target));
                (resolve_target("ppt", &r.target), order)
            })
            .collect();

        numbered.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(numbered.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide, resolving (and caching) its layout.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        layouts: &mut HashMap<String, LayoutInfo>,
    ) -> Result<DeckSlide> {
        let content = read_file_from_archive(archive, slide_path)?;
        let part = parse_part(&content)?;

        let layout_path = self.find_layout_path(archive, slide_path);
        let layout = match layout_path {
            Some(path) => {
                if !layouts.contains_key(&path) {
                    let info = self.parse_layout(archive, &path).unwrap_or_else(|e| {
                        log::warn!("Failed to read layout {}: {}", path, e);
                        LayoutInfo::unnamed(&path)
                    });
                    layouts.insert(path.clone(), info);
                }
                layouts.get(&path)
            }
            None => None,
        };

        let mut slide = DeckSlide::new(
            layout
                .map(|l| l.name.clone())
                .unwrap_or_else(|| UNKNOWN_LAYOUT.to_string()),
        );
        slide.background = part.background;

        for (mut shape, key) in part.shapes.into_iter().zip(part.keys) {
            if shape.bounds.is_none() {
                if let (Some(layout), Some(key)) = (layout, key.as_ref()) {
                    shape.bounds = layout.bounds_for(key);
                }
            }
            slide.shapes.push(shape);
        }

        Ok(slide)
    }

    /// Locate the layout part referenced by a slide's relationships.
    fn find_layout_path<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Option<String> {
        let rels_path = rels_path_for(slide_path);
        let rels = read_file_from_archive(archive, &rels_path)
            .and_then(|content| parse_relationships(&content))
            .map_err(|e| log::warn!("No relationships for {}: {}", slide_path, e))
            .ok()?;

        let base = parent_dir(slide_path);
        rels.into_iter()
            .find(|r| r.rel_type.ends_with("/slideLayout"))
            .map(|r| resolve_target(base, &r.target))
    }

    fn parse_layout<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        layout_path: &str,
    ) -> Result<LayoutInfo> {
        let content = read_file_from_archive(archive, layout_path)?;
        let part = parse_part(&content)?;

        let placeholders = part
            .keys
            .into_iter()
            .zip(part.shapes)
            .filter_map(|(key, shape)| Some((key?, shape.bounds?)))
            .collect();

        Ok(LayoutInfo {
            name: part.name.unwrap_or_else(|| file_stem(layout_path)),
            placeholders,
        })
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a file from the ZIP archive.
fn read_file_from_archive<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive.by_name(path).map_err(|e| {
        Error::StyleExtraction(format!("File not found in archive '{}': {}", path, e))
    })?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::StyleExtraction(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

/// Slide size and slide order from `ppt/presentation.xml`.
#[derive(Debug)]
struct PresentationInfo {
    width: i64,
    height: i64,
    slide_rel_ids: Vec<String>,
}

fn parse_presentation_info(xml: &str) -> Result<PresentationInfo> {
    let mut info = PresentationInfo {
        width: DEFAULT_SLIDE_WIDTH,
        height: DEFAULT_SLIDE_HEIGHT,
        slide_rel_ids: Vec::new(),
    };

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"sldSz" => {
                    if let Some(cx) = attr(e, b"cx").and_then(|v| v.parse().ok()) {
                        info.width = cx;
                    }
                    if let Some(cy) = attr(e, b"cy").and_then(|v| v.parse().ok()) {
                        info.height = cy;
                    }
                }
                b"sldId" => {
                    if let Some(id) = relationship_id_attr(e) {
                        info.slide_rel_ids.push(id);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::StyleExtraction(format!(
                    "Error parsing presentation part: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(info)
}

/// A package relationship.
#[derive(Debug, Clone)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut rels = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                rels.push(Relationship {
                    id: attr(e, b"Id").unwrap_or_default(),
                    rel_type: attr(e, b"Type").unwrap_or_default(),
                    target: attr(e, b"Target").unwrap_or_default(),
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::StyleExtraction(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(rels)
}

/// How a slide placeholder is matched to its layout placeholder.
#[derive(Debug, Clone, PartialEq)]
struct PlaceholderKey {
    idx: Option<String>,
    role: PlaceholderRole,
}

/// Name and placeholder positions of a slide layout.
#[derive(Debug, Clone)]
struct LayoutInfo {
    name: String,
    placeholders: Vec<(PlaceholderKey, Bounds)>,
}

impl LayoutInfo {
    fn unnamed(path: &str) -> Self {
        Self {
            name: file_stem(path),
            placeholders: Vec::new(),
        }
    }

    /// Inherited bounds: match by `idx` first, then by placeholder type.
    fn bounds_for(&self, key: &PlaceholderKey) -> Option<Bounds> {
        let by_idx = key.idx.as_ref().and_then(|idx| {
            self.placeholders
                .iter()
                .find(|(k, _)| k.idx.as_ref() == Some(idx))
        });
        by_idx
            .or_else(|| self.placeholders.iter().find(|(k, _)| k.role == key.role))
            .map(|(_, bounds)| *bounds)
    }
}

/// Shapes and background of a slide or layout part.
#[derive(Debug, Default)]
struct ParsedPart {
    /// `p:cSld@name`, if non-empty.
    name: Option<String>,
    background: Option<String>,
    shapes: Vec<DeckShape>,
    /// Placeholder key per shape, aligned with `shapes`.
    keys: Vec<Option<PlaceholderKey>>,
}

/// A top-level shape being read.
struct ShapeBuilder {
    element: Vec<u8>,
    shape: DeckShape,
    key: Option<PlaceholderKey>,
    offset: Option<(i64, i64)>,
    extent: Option<(i64, i64)>,
    text_box: bool,
}

impl ShapeBuilder {
    fn new(element: &[u8]) -> Self {
        let mut shape = DeckShape::default();
        // Every `p:sp` carries a text frame, even an empty one.
        if element == b"sp" {
            shape.text = Some(Vec::new());
        }
        Self {
            element: element.to_vec(),
            shape,
            key: None,
            offset: None,
            extent: None,
            text_box: false,
        }
    }

    fn kind_label(&self) -> &'static str {
        if self.shape.placeholder.is_some() {
            return "PLACEHOLDER";
        }
        match self.element.as_slice() {
            b"sp" if self.text_box => "TEXT_BOX",
            b"sp" => "AUTO_SHAPE",
            b"pic" => "PICTURE",
            b"graphicFrame" if self.shape.has_chart => "CHART",
            b"graphicFrame" if self.shape.has_table => "TABLE",
            b"graphicFrame" => "GRAPHIC_FRAME",
            b"grpSp" => "GROUP",
            b"cxnSp" => "CONNECTOR",
            _ => "UNKNOWN",
        }
    }

    fn finish(mut self) -> (DeckShape, Option<PlaceholderKey>) {
        self.shape.kind = self.kind_label().to_string();
        self.shape.bounds = self.offset.zip(self.extent).map(|((left, top), (width, height))| Bounds {
            left,
            top,
            width,
            height,
        });
        (self.shape, self.key)
    }

    fn last_paragraph(&mut self) -> Option<&mut DeckParagraph> {
        self.shape.text.as_mut().and_then(|t| t.last_mut())
    }

    fn last_run(&mut self) -> Option<&mut DeckRun> {
        self.last_paragraph().and_then(|p| p.runs.last_mut())
    }
}

/// Streaming reader for slide and layout XML, tracking the element path.
struct PartParser {
    stack: Vec<Vec<u8>>,
    part: ParsedPart,
    current: Option<ShapeBuilder>,
    /// Depth of shapes nested inside the current top-level shape (groups).
    nested: usize,
}

impl PartParser {
    fn new() -> Self {
        Self {
            stack: Vec::new(),
            part: ParsedPart::default(),
            current: None,
            nested: 0,
        }
    }

    /// Local name of the ancestor `n` levels up (0 = parent).
    fn ancestor(&self, n: usize) -> &[u8] {
        self.stack
            .len()
            .checked_sub(n + 1)
            .map(|i| self.stack[i].as_slice())
            .unwrap_or_default()
    }

    fn within(&self, name: &[u8]) -> bool {
        self.stack.iter().any(|s| s.as_slice() == name)
    }

    fn open(&mut self, e: &BytesStart, is_empty: bool) {
        let name = e.local_name().as_ref().to_vec();

        if SHAPE_ELEMENTS.contains(&name.as_slice()) {
            if self.current.is_some() {
                if !is_empty {
                    self.nested += 1;
                }
            } else if self.within(b"spTree") {
                self.current = Some(ShapeBuilder::new(&name));
                if is_empty {
                    self.finish_shape();
                }
            }
        } else if self.current.is_some() {
            if self.nested == 0 {
                self.shape_element(&name, e);
            }
        } else if name == b"cSld" {
            self.part.name = attr(e, b"name").filter(|n| !n.is_empty());
        } else if name == b"srgbClr" && self.within(b"bg") && self.part.background.is_none() {
            self.part.background = attr(e, b"val").and_then(|v| hex_color(&v));
        }

        if !is_empty {
            self.stack.push(name);
        }
    }

    fn close(&mut self, name: &[u8]) {
        self.stack.pop();

        if self.current.is_some() && SHAPE_ELEMENTS.contains(&name) {
            if self.nested > 0 {
                self.nested -= 1;
            } else {
                self.finish_shape();
            }
        }
    }

    fn text(&mut self, text: &str) {
        if self.nested > 0 || self.ancestor(0) != b"t" {
            return;
        }
        if !matches!(self.ancestor(1), b"r" | b"fld") {
            return;
        }
        if let Some(run) = self.current.as_mut().and_then(|b| b.last_run()) {
            run.text.push_str(text);
        }
    }

    fn finish_shape(&mut self) {
        if let Some(builder) = self.current.take() {
            let (shape, key) = builder.finish();
            self.part.shapes.push(shape);
            self.part.keys.push(key);
        }
    }

    /// Record an attribute-bearing element inside the current top-level shape.
    fn shape_element(&mut self, name: &[u8], e: &BytesStart) {
        let parent = self.ancestor(0).to_vec();
        let grandparent = self.ancestor(1).to_vec();
        let Some(builder) = self.current.as_mut() else {
            return;
        };

        match name {
            b"ph" => {
                let role = PlaceholderRole::from_type(attr(e, b"type").as_deref());
                builder.shape.placeholder = Some(role.clone());
                builder.key = Some(PlaceholderKey {
                    idx: attr(e, b"idx"),
                    role,
                });
            }
            b"cNvSpPr" => {
                builder.text_box = attr(e, b"txBox").and_then(|v| parse_bool(&v)) == Some(true);
            }
            b"off" if parent == b"xfrm" => {
                builder.offset = int_attr(e, b"x").zip(int_attr(e, b"y"));
            }
            b"ext" if parent == b"xfrm" => {
                builder.extent = int_attr(e, b"cx").zip(int_attr(e, b"cy"));
            }
            b"srgbClr" if parent == b"solidFill" => {
                let color = attr(e, b"val").and_then(|v| hex_color(&v));
                match grandparent.as_slice() {
                    b"spPr" => builder.shape.fill = color,
                    b"rPr" => {
                        if let Some(run) = builder.last_run() {
                            run.color = color;
                        }
                    }
                    _ => {}
                }
            }
            b"chart" => builder.shape.has_chart = true,
            b"tbl" => builder.shape.has_table = true,
            // Only the shape's own text body; table cells are not text frames.
            b"p" if parent == b"txBody" && grandparent == b"sp" => {
                if let Some(text) = builder.shape.text.as_mut() {
                    text.push(DeckParagraph::default());
                }
            }
            b"pPr" if parent == b"p" => {
                if let Some(paragraph) = builder.last_paragraph() {
                    paragraph.alignment = attr(e, b"algn").and_then(|v| alignment(&v));
                }
            }
            b"spcPct" if parent == b"lnSpc" => {
                if let Some(paragraph) = builder.last_paragraph() {
                    paragraph.line_spacing = float_attr(e, b"val").map(|v| v / 100_000.0);
                }
            }
            b"spcPts" if matches!(parent.as_slice(), b"spcBef" | b"spcAft") => {
                let points = float_attr(e, b"val").map(|v| v / 100.0);
                if let Some(paragraph) = builder.last_paragraph() {
                    if parent == b"spcBef" {
                        paragraph.space_before = points;
                    } else {
                        paragraph.space_after = points;
                    }
                }
            }
            b"r" | b"fld" if parent == b"p" => {
                if let Some(paragraph) = builder.last_paragraph() {
                    paragraph.runs.push(DeckRun::default());
                }
            }
            b"rPr" if matches!(parent.as_slice(), b"r" | b"fld") => {
                if let Some(run) = builder.last_run() {
                    run.size = float_attr(e, b"sz").map(|v| v / 100.0);
                    run.bold = attr(e, b"b").and_then(|v| parse_bool(&v));
                    run.italic = attr(e, b"i").and_then(|v| parse_bool(&v));
                    run.underline = attr(e, b"u").map(|v| v != "none");
                }
            }
            b"latin" if parent == b"rPr" => {
                if let Some(run) = builder.last_run() {
                    run.font_name = attr(e, b"typeface").filter(|t| !t.is_empty());
                }
            }
            _ => {}
        }
    }
}

/// Parse slide or layout XML into shapes.
fn parse_part(xml: &str) -> Result<ParsedPart> {
    // Untrimmed: run text keeps its leading and trailing spaces.
    let mut reader = Reader::from_str(xml);
    let mut parser = PartParser::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => parser.open(e, false),
            Ok(Event::Empty(ref e)) => parser.open(e, true),
            Ok(Event::End(ref e)) => parser.close(e.local_name().as_ref()),
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default();
                parser.text(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::StyleExtraction(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(parser.part)
}

/// Value of an attribute by local name.
fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Value of a namespaced `r:id` attribute.
fn relationship_id_attr(e: &BytesStart) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == b"id")
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn int_attr(e: &BytesStart, key: &[u8]) -> Option<i64> {
    attr(e, key).and_then(|v| v.trim().parse().ok())
}

fn float_attr(e: &BytesStart, key: &[u8]) -> Option<f64> {
    attr(e, key).and_then(|v| v.trim().parse().ok())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

fn alignment(value: &str) -> Option<Alignment> {
    match value {
        "l" => Some(Alignment::Left),
        "ctr" => Some(Alignment::Center),
        "r" => Some(Alignment::Right),
        "just" => Some(Alignment::Justify),
        _ => None,
    }
}

/// Normalize a six-digit hex color to `#RRGGBB`.
fn hex_color(value: &str) -> Option<String> {
    let value = value.trim();
    if value.len() == 6 && value.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("#{}", value.to_ascii_uppercase()))
    } else {
        None
    }
}

/// Path of the relationships part for a package part.
fn rels_path_for(part_path: &str) -> String {
    let (dir, file) = part_path.rsplit_once('/').unwrap_or(("", part_path));
    if dir.is_empty() {
        format!("_rels/{}.rels", file)
    } else {
        format!("{}/_rels/{}.rels", dir, file)
    }
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn file_stem(path: &str) -> String {
    let file = path.rsplit('/').next().unwrap_or(path);
    file.trim_end_matches(".xml").to_string()
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".rels").trim_end_matches(".xml");
    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
