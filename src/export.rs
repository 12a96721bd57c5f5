use anyhow::{anyhow, bail, Context, Result};
use printpdf::{Mm, PdfDocument};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::normalize::strip_emphasis;
use crate::notify::{Notice, Notifier};

pub const EXPORT_FAILED: &str = "There was an error generating the PDF. Please try again.";
pub const ORIGINAL_FILENAME: &str = "original_resume.pdf";
pub const OPTIMIZED_FILENAME: &str = "optimized_resume.pdf";

// Embedded so exported text is not limited to the PDF base-14 encodings.
const FONT_BYTES: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

// US letter, portrait, one inch margin.
const PAGE_WIDTH_IN: f32 = 8.5;
const PAGE_HEIGHT_IN: f32 = 11.0;
const MARGIN_IN: f32 = 1.0;
const FONT_SIZE_PT: f32 = 12.0;
const LINE_HEIGHT: f32 = 1.6;
// DejaVu Sans averages a little over half an em per glyph.
const AVG_GLYPH_EM: f32 = 0.55;

const MM_PER_IN: f32 = 25.4;
const PT_PER_IN: f32 = 72.0;

/// Receives a finished document, e.g. a downloads folder.
pub trait SaveTarget {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf>;
}

pub struct DirectoryTarget {
    dir: PathBuf,
}

impl DirectoryTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SaveTarget for DirectoryTarget {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        // Never let a filename escape the target directory.
        let name = Path::new(filename)
            .file_name()
            .with_context(|| format!("Invalid export filename: {:?}", filename))?;
        let path = self.dir.join(name);
        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved(PathBuf),
    /// Nowhere to save to; nothing was generated.
    Skipped,
    Failed,
}

/// Render `content` to a PDF and hand it to `target`.
///
/// Failures are logged and reported through `notifier`, never returned.
pub fn export_pdf(
    content: &str,
    filename: &str,
    target: Option<&dyn SaveTarget>,
    notifier: &dyn Notifier,
) -> ExportOutcome {
    let Some(target) = target else {
        warn!(filename, "no save target available, skipping export");
        return ExportOutcome::Skipped;
    };

    match render_pdf(content, filename).and_then(|bytes| target.save(filename, &bytes)) {
        Ok(path) => {
            info!(path = %path.display(), "exported PDF");
            ExportOutcome::Saved(path)
        }
        Err(e) => {
            error!(filename, "Error generating PDF: {:#}", e);
            notifier.notify(Notice::Error(EXPORT_FAILED.to_string()));
            ExportOutcome::Failed
        }
    }
}

pub fn render_pdf(content: &str, title: &str) -> Result<Vec<u8>> {
    let width = Mm(PAGE_WIDTH_IN * MM_PER_IN);
    let height = Mm(PAGE_HEIGHT_IN * MM_PER_IN);
    let margin = MARGIN_IN * MM_PER_IN;
    let line_step = FONT_SIZE_PT * LINE_HEIGHT / PT_PER_IN * MM_PER_IN;
    let first_baseline = (PAGE_HEIGHT_IN - MARGIN_IN) * MM_PER_IN - FONT_SIZE_PT / PT_PER_IN * MM_PER_IN;

    let pages = paginate(&strip_emphasis(content));
    let missing = unsupported_chars(pages.iter().flatten().map(String::as_str))?;
    if !missing.is_empty() {
        bail!("No glyphs for {:?}", missing.iter().collect::<String>());
    }

    let (doc, first_page, first_layer) = PdfDocument::new(title, width, height, "Layer 1");
    let font = doc
        .add_external_font(FONT_BYTES)
        .map_err(|e| anyhow!("Failed to load embedded font: {}", e))?;

    for (i, lines) in pages.iter().enumerate() {
        let (page, layer) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(width, height, "Layer 1")
        };
        let layer = doc.get_page(page).get_layer(layer);
        for (row, line) in lines.iter().enumerate() {
            let y = first_baseline - row as f32 * line_step;
            layer.use_text(line.as_str(), FONT_SIZE_PT, Mm(margin), Mm(y), &font);
        }
    }

    doc.save_to_bytes()
        .map_err(|e| anyhow!("Failed to serialize PDF: {}", e))
}

/// Characters in `lines` the embedded font cannot draw, deduplicated in order of appearance.
fn unsupported_chars<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Vec<char>> {
    let face = ttf_parser::Face::parse(FONT_BYTES, 0)
        .map_err(|e| anyhow!("Failed to parse embedded font: {}", e))?;
    let mut missing = Vec::new();
    for ch in lines.into_iter().flat_map(str::chars) {
        if face.glyph_index(ch).is_none() && !missing.contains(&ch) {
            missing.push(ch);
        }
    }
    Ok(missing)
}

fn columns_per_line() -> usize {
    let usable_pt = (PAGE_WIDTH_IN - 2.0 * MARGIN_IN) * PT_PER_IN;
    (usable_pt / (FONT_SIZE_PT * AVG_GLYPH_EM)) as usize
}

fn lines_per_page() -> usize {
    let usable_pt = (PAGE_HEIGHT_IN - 2.0 * MARGIN_IN) * PT_PER_IN;
    (usable_pt / (FONT_SIZE_PT * LINE_HEIGHT)) as usize
}

/// Wrap text to the printable width and split it into pages. Always yields one page.
pub fn paginate(text: &str) -> Vec<Vec<String>> {
    let width = columns_per_line();
    let mut lines = Vec::new();
    for raw in text.lines() {
        let raw: String = raw
            .replace('\t', "    ")
            .chars()
            .filter(|c| !c.is_control())
            .collect();
        if raw.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        lines.extend(textwrap::wrap(&raw, width).into_iter().map(|l| l.into_owned()));
    }

    if lines.is_empty() {
        return vec![Vec::new()];
    }
    lines
        .chunks(lines_per_page())
        .map(|chunk| chunk.to_vec())
        .collect()
}
