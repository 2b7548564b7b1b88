//! Layout backends: turn a styled [`Flowable`] stream into document bytes.
//!
//! [`PdfBackend`] is the only production backend. It wraps text greedily at
//! word boundaries, flows lines down a single frame per page and writes the
//! result with `pdf-writer` using the two standard Helvetica faces.

use super::fonts::{to_winansi_bytes, Face};
use super::{unescape_markup, Flowable};
use crate::config::{PageGeometry, RenderConfig};
use crate::error::RenderError;
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};
use tracing::debug;

/// Tolerance for float comparisons on the vertical cursor.
const EPS: f32 = 1e-3;

/// Seam between the markdown front end and the document writer.
pub trait LayoutBackend: Send + Sync {
    /// Lay out `flowables` on pages of `geometry` and return the encoded
    /// document. Failures carry a human-readable message.
    fn build(&self, flowables: &[Flowable], geometry: &PageGeometry)
        -> Result<Vec<u8>, RenderError>;
}

/// PDF writer backed by `pdf-writer`.
#[derive(Debug, Clone, Copy)]
pub struct PdfBackend {
    compress: bool,
}

impl Default for PdfBackend {
    fn default() -> Self {
        Self { compress: true }
    }
}

impl PdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            compress: config.compress,
        }
    }

    /// Deflate page content streams.
    pub fn compress(mut self, v: bool) -> Self {
        self.compress = v;
        self
    }
}

impl LayoutBackend for PdfBackend {
    fn build(
        &self,
        flowables: &[Flowable],
        geometry: &PageGeometry,
    ) -> Result<Vec<u8>, RenderError> {
        let pages = paginate(flowables, geometry)?;
        debug!(
            "Laid out {} flowables on {} page(s)",
            flowables.len(),
            pages.len()
        );
        Ok(write_pdf(&pages, geometry, self.compress))
    }
}

// ── Layout ───────────────────────────────────────────────────────────────

#[derive(Debug)]
struct PlacedLine {
    face: Face,
    size: f32,
    x: f32,
    /// Baseline, measured from the bottom edge.
    y: f32,
    text: String,
}

#[derive(Debug, Default)]
struct PageLines {
    lines: Vec<PlacedLine>,
}

fn check_geometry(g: &PageGeometry) -> Result<(), RenderError> {
    if !(g.width > 0.0 && g.height > 0.0) {
        return Err(RenderError::backend(format!(
            "page size must be positive, got {}x{}",
            g.width, g.height
        )));
    }
    if g.frame_width() <= 0.0 || g.frame_height() <= 0.0 {
        return Err(RenderError::backend(
            "page margins leave no room for the text frame",
        ));
    }
    Ok(())
}

/// Flow the blocks down the frame, opening a new page whenever the next
/// line's leading would cross the bottom margin.
fn paginate(flowables: &[Flowable], g: &PageGeometry) -> Result<Vec<PageLines>, RenderError> {
    check_geometry(g)?;

    let top = g.height - g.margin_top;
    let bottom = g.margin_bottom;
    let frame_width = g.frame_width();

    let mut pages = vec![PageLines::default()];
    let mut y = top;
    // Set when a spacer overflowed; the page is only opened once text follows.
    let mut page_break = false;

    for flowable in flowables {
        match flowable {
            Flowable::Spacer { height } => {
                if y - height < bottom - EPS {
                    page_break = true;
                    y = top;
                } else {
                    y -= height;
                }
            }
            Flowable::Text { markup, style } => {
                if style.font_size <= 0.0 || style.leading <= 0.0 {
                    return Err(RenderError::backend(format!(
                        "invalid text style: size {} leading {}",
                        style.font_size, style.leading
                    )));
                }
                if style.leading > g.frame_height() {
                    return Err(RenderError::backend(format!(
                        "a {}pt line does not fit in a {:.1}pt frame",
                        style.leading,
                        g.frame_height()
                    )));
                }

                let face = Face::for_bold(style.bold);
                let text = unescape_markup(markup);
                let lines = wrap(&text, face, style.font_size, frame_width);
                if lines.is_empty() {
                    continue;
                }
                if page_break {
                    pages.push(PageLines::default());
                    page_break = false;
                }

                if y < top - EPS {
                    y -= style.space_before;
                }
                for line in lines {
                    if y - style.leading < bottom - EPS {
                        pages.push(PageLines::default());
                        y = top;
                    }
                    let baseline = y - style.font_size;
                    y -= style.leading;
                    if let Some(page) = pages.last_mut() {
                        page.lines.push(PlacedLine {
                            face,
                            size: style.font_size,
                            x: g.margin_left,
                            y: baseline,
                            text: line,
                        });
                    }
                }
                y -= style.space_after;
            }
        }
    }

    Ok(pages)
}

/// Greedy word wrap. Runs of whitespace collapse to one space; a word wider
/// than the frame is broken between characters.
fn wrap(text: &str, face: Face, size: f32, width: f32) -> Vec<String> {
    let space = face.text_width(" ", size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_w = 0.0f32;

    for word in text.split_whitespace() {
        let w = face.text_width(word, size);
        if !current.is_empty() {
            if current_w + space + w <= width + EPS {
                current.push(' ');
                current.push_str(word);
                current_w += space + w;
                continue;
            }
            lines.push(std::mem::take(&mut current));
            current_w = 0.0;
        }
        if w <= width + EPS {
            current.push_str(word);
            current_w = w;
            continue;
        }
        for ch in word.chars() {
            let cw = face.char_width_1000(ch) * size / 1000.0;
            if !current.is_empty() && current_w + cw > width + EPS {
                lines.push(std::mem::take(&mut current));
                current_w = 0.0;
            }
            current.push(ch);
            current_w += cw;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ── PDF output ───────────────────────────────────────────────────────────

fn page_content(page: &PageLines) -> Vec<u8> {
    let mut content = Content::new();
    for line in &page.lines {
        content.begin_text();
        content.set_font(Name(line.face.resource_name()), line.size);
        content.next_line(line.x, line.y);
        content.show(Str(&to_winansi_bytes(&line.text)));
        content.end_text();
    }
    content.finish().to_vec()
}

fn write_pdf(pages: &[PageLines], g: &PageGeometry, compress: bool) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let fonts: Vec<(Face, Ref)> = [Face::Regular, Face::Bold]
        .into_iter()
        .map(|face| (face, alloc()))
        .collect();
    let n = pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    for (face, font_ref) in &fonts {
        pdf.type1_font(*font_ref)
            .base_font(Name(face.base_font()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, g.width, g.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        let mut font_dict = resources.fonts();
        for (face, font_ref) in &fonts {
            font_dict.pair(Name(face.resource_name()), *font_ref);
        }
    }

    for (page, content_id) in pages.iter().zip(&content_ids) {
        let raw = page_content(page);
        if compress {
            let deflated = miniz_oxide::deflate::compress_to_vec_zlib(&raw, 6);
            pdf.stream(*content_id, &deflated)
                .filter(Filter::FlateDecode);
        } else {
            pdf.stream(*content_id, &raw);
        }
    }

    pdf.finish()
}
