//! Heading/outline extraction for OCR markdown.
//!
//! The OCR text is a restricted markdown dialect: a heading is a line that
//! starts with one to six `#` markers, then whitespace, then the title. This
//! module scans it line by line (no regex, no markdown parser) and returns
//! the headings in document order for the on-screen outline.
//!
//! Nesting is visual only: an entry's indent is proportional to its level and
//! there are no parent/child links between entries.

use serde::{Deserialize, Serialize};

/// Character that introduces a heading line.
pub const HEADING_MARKER: char = '#';

/// Deepest heading level; lines with more markers are not headings.
pub const MAX_HEADING_LEVEL: usize = 6;

/// One heading found in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Number of leading markers, 1–6.
    pub level: u8,
    /// Heading text with surrounding whitespace removed.
    pub text: String,
}

/// Outline of a document plus the page counter shown next to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub entries: Vec<OutlineEntry>,
    /// Number of `# Page N` headings (inserted once per OCR page).
    pub page_count: usize,
}

impl Outline {
    pub fn heading_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Visual indent for an entry: `(level - 1) * step`.
    pub fn indent(entry: &OutlineEntry, step: u32) -> u32 {
        u32::from(entry.level.saturating_sub(1)) * step
    }
}

/// Split a heading line into `(level, text)`.
///
/// Returns `None` unless the line starts with 1–6 markers, followed by at
/// least one whitespace character, followed by non-empty text. The returned
/// text is trimmed on both sides.
pub fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let level = line.chars().take_while(|&c| c == HEADING_MARKER).count();
    if level == 0 || level > MAX_HEADING_LEVEL {
        return None;
    }
    // Markers are ASCII, so `level` is also the byte offset.
    let rest = &line[level..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() {
        return None;
    }
    Some((level as u8, text))
}

/// `true` for lines of the form `# Page <digits>` (anything may follow the digits).
pub fn is_page_heading(line: &str) -> bool {
    let Some(rest) = line.strip_prefix("# Page") else {
        return false;
    };
    let digits = rest.trim_start();
    digits.len() < rest.len() && digits.starts_with(|c: char| c.is_ascii_digit())
}

/// Extract every heading, in document order.
///
/// Never fails; returns an empty vector when the text has no heading lines.
pub fn extract_outline(text: &str) -> Vec<OutlineEntry> {
    text.lines()
        .filter_map(parse_heading)
        .map(|(level, text)| OutlineEntry {
            level,
            text: text.to_string(),
        })
        .collect()
}

/// Count the `# Page N` headings in the text.
pub fn count_pages(text: &str) -> usize {
    text.lines().filter(|line| is_page_heading(line)).count()
}

/// Outline and page count from a single pass over the lines.
pub fn summarize(text: &str) -> Outline {
    let mut outline = Outline::default();
    for line in text.lines() {
        if is_page_heading(line) {
            outline.page_count += 1;
        }
        if let Some((level, text)) = parse_heading(line) {
            outline.entries.push(OutlineEntry {
                level,
                text: text.to_string(),
            });
        }
    }
    outline
}
