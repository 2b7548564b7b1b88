//! Page assembly: join per-page OCR markdown into one document.
//!
//! Every page, the first included, is preceded by a horizontal rule and a
//! level-1 `# Page N` heading. The outline counts those headings to show the
//! page total, so the exact separator text matters.

use super::ocr::OcrPage;

/// Separator written before page `number` (1-based).
pub fn page_separator(number: usize) -> String {
    format!("\n\n---\n\n# Page {number}\n\n")
}

/// Concatenate pages in index order. Page numbers follow that order and start
/// at 1 regardless of the indices the provider reported.
pub fn assemble_markdown(pages: &[OcrPage]) -> String {
    let mut ordered: Vec<&OcrPage> = pages.iter().collect();
    ordered.sort_by_key(|p| p.index);

    let mut out = String::with_capacity(pages.iter().map(|p| p.markdown.len() + 24).sum());
    for (i, page) in ordered.into_iter().enumerate() {
        out.push_str(&page_separator(i + 1));
        out.push_str(&page.markdown);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::count_pages;

    fn page(index: usize, markdown: &str) -> OcrPage {
        OcrPage {
            index,
            markdown: markdown.to_string(),
        }
    }

    #[test]
    fn separator_precedes_every_page() {
        let md = assemble_markdown(&[page(0, "alpha"), page(1, "beta")]);
        assert_eq!(
            md,
            "\n\n---\n\n# Page 1\n\nalpha\n\n---\n\n# Page 2\n\nbeta"
        );
    }

    #[test]
    fn pages_are_sorted_by_index() {
        let md = assemble_markdown(&[page(2, "GAMMA"), page(0, "ALPHA"), page(1, "BETA")]);
        let a = md.find("ALPHA").unwrap();
        let b = md.find("BETA").unwrap();
        let c = md.find("GAMMA").unwrap();
        assert!(a < b && b < c);
        assert!(md.find("# Page 1").unwrap() < a);
    }

    #[test]
    fn empty_page_still_gets_heading() {
        let md = assemble_markdown(&[page(0, ""), page(1, "text")]);
        assert_eq!(count_pages(&md), 2);
    }

    #[test]
    fn no_pages_is_empty_text() {
        assert_eq!(assemble_markdown(&[]), "");
    }
}
