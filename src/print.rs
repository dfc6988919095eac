use std::{fs, path::PathBuf};

use encoding_rs::WINDOWS_1252;
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use tracing::info;

use crate::{
    document::model::{Document, Inline},
    error::{NotepadError, Result},
};

const FONT_NAME: Name<'static> = Name(b"F1");

/// Where a printed document goes. A toolkit binding would wrap the native
/// print dialog; the crate ships a PDF target.
pub trait Printer {
    fn print(&mut self, doc: &Document, title: &str) -> Result<PrintSummary>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintSummary {
    pub pages: usize,
}

/// Page geometry in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub font_size: f32,
}

impl Default for PageSetup {
    /// A4 with half-inch-ish margins.
    fn default() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
            margin: 48.0,
            font_size: 12.0,
        }
    }
}

impl PageSetup {
    fn leading(&self) -> f32 {
        self.font_size * 1.2
    }

    fn lines_per_page(&self) -> usize {
        let usable = (self.height - 2.0 * self.margin).max(self.leading());
        ((usable / self.leading()).floor() as usize).max(1)
    }

    /// Helvetica averages about half an em per glyph.
    fn chars_per_line(&self) -> usize {
        let usable = (self.width - 2.0 * self.margin).max(self.font_size);
        ((usable / (self.font_size * 0.5)).floor() as usize).max(1)
    }
}

#[derive(Debug, Clone)]
pub struct PdfPrinter {
    pub path: PathBuf,
    pub setup: PageSetup,
}

impl PdfPrinter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            setup: PageSetup::default(),
        }
    }
}

impl Printer for PdfPrinter {
    fn print(&mut self, doc: &Document, title: &str) -> Result<PrintSummary> {
        let pages = paginate(doc, &self.setup);
        let bytes = render_pdf(&pages, title, &self.setup);
        fs::write(&self.path, bytes).map_err(|e| NotepadError::io(&self.path, e))?;
        info!(path = %self.path.display(), pages = pages.len(), "document printed");
        Ok(PrintSummary { pages: pages.len() })
    }
}

/// Lays the document out as wrapped lines, split into pages. Images print
/// as a bracketed placeholder.
pub fn paginate(doc: &Document, setup: &PageSetup) -> Vec<Vec<String>> {
    let width = setup.chars_per_line();
    let mut lines = Vec::new();
    for paragraph in &doc.content {
        let mut text = String::new();
        for inline in &paragraph.inlines {
            match inline {
                Inline::Text(run) => text.push_str(&run.text),
                Inline::Image(image) => text.push_str(&format!("[image {}x{}]", image.width, image.height)),
            }
        }
        wrap_line(&text, width, &mut lines);
    }

    let per_page = setup.lines_per_page();
    let mut pages: Vec<Vec<String>> = lines.chunks(per_page).map(<[String]>::to_vec).collect();
    if pages.is_empty() {
        pages.push(Vec::new());
    }
    pages
}

fn wrap_line(text: &str, width: usize, out: &mut Vec<String>) {
    if text.is_empty() {
        out.push(String::new());
        return;
    }

    let mut current = String::new();
    let mut current_len = 0usize;
    for word in text.split_inclusive(' ') {
        let word_len = word.chars().count();
        let visible_len = word.trim_end().chars().count();
        if current_len + visible_len > width && current_len > 0 {
            out.push(current.trim_end().to_string());
            current.clear();
            current_len = 0;
        }
        if visible_len > width {
            for ch in word.chars() {
                if current_len == width {
                    out.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                current.push(ch);
                current_len += 1;
            }
        } else {
            current.push_str(word);
            current_len += word_len;
        }
    }
    out.push(current.trim_end().to_string());
}

pub fn render_pdf(pages: &[Vec<String>], title: &str, setup: &PageSetup) -> Vec<u8> {
    let catalog_id = Ref::new(1);
    let tree_id = Ref::new(2);
    let font_id = Ref::new(3);
    let info_id = Ref::new(4);
    let page_ids: Vec<Ref> = (0..pages.len()).map(|i| Ref::new(5 + 2 * i as i32)).collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids(page_ids.iter().copied())
        .count(pages.len() as i32);
    pdf.type1_font(font_id).base_font(Name(b"Helvetica"));
    pdf.document_info(info_id)
        .title(TextStr(title))
        .creator(TextStr("Notepad"));

    for (lines, page_id) in pages.iter().zip(page_ids.iter().copied()) {
        let content_id = Ref::new(page_id.get() + 1);

        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, setup.width, setup.height));
        page.parent(tree_id);
        page.contents(content_id);
        page.resources().fonts().pair(FONT_NAME, font_id);
        page.finish();

        let mut content = Content::new();
        let mut y = setup.height - setup.margin - setup.font_size;
        for line in lines {
            if !line.is_empty() {
                content.begin_text();
                content.set_font(FONT_NAME, setup.font_size);
                content.next_line(setup.margin, y);
                content.show(Str(&encode_line(line)));
                content.end_text();
            }
            y -= setup.leading();
        }
        pdf.stream(content_id, &content.finish());
    }

    pdf.finish()
}

/// Helvetica's built-in encoding covers Windows-1252; anything else prints as `?`.
fn encode_line(line: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(line.len());
    let mut buf = [0u8; 4];
    for ch in line.chars() {
        let (bytes, _, unmappable) = WINDOWS_1252.encode(ch.encode_utf8(&mut buf));
        if unmappable {
            out.push(b'?');
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::model::{Fragment, ImageRef, RunStyle};

    fn doc(text: &str) -> Document {
        Document::from_fragment(Fragment::from_text(text, &RunStyle::default()), RunStyle::default())
    }

    #[test]
    fn long_paragraphs_wrap_at_word_boundaries() {
        let setup = PageSetup {
            width: 2.0 * 48.0 + 60.0,
            ..PageSetup::default()
        };
        assert_eq!(setup.chars_per_line(), 10);

        let pages = paginate(&doc("alpha beta gamma delta"), &setup);
        assert_eq!(pages[0], vec!["alpha beta", "gamma", "delta"]);
    }

    #[test]
    fn overlong_words_are_hard_broken() {
        let mut lines = Vec::new();
        wrap_line("abcdefghij", 4, &mut lines);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn splits_into_pages_and_keeps_blank_lines() {
        let setup = PageSetup::default();
        let per_page = setup.lines_per_page();
        let text = vec!["line"; per_page + 1].join("\n");

        let pages = paginate(&doc(&text), &setup);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1], vec!["line"]);

        assert_eq!(paginate(&doc("a\n\nb"), &setup)[0], vec!["a", "", "b"]);
        assert_eq!(paginate(&Document::default(), &setup), vec![vec![String::new()]]);
    }

    #[test]
    fn images_print_as_placeholders() {
        let mut d = doc("x");
        d.content[0].inlines.push(Inline::Image(ImageRef {
            key: "k".into(),
            width: 4,
            height: 3,
        }));
        let pages = paginate(&d, &PageSetup::default());
        assert_eq!(pages[0], vec!["x[image 4x3]"]);
    }

    #[test]
    fn unmappable_characters_become_question_marks() {
        assert_eq!(encode_line("café €"), b"caf\xe9 \x80".to_vec());
        assert_eq!(encode_line("日本"), b"??".to_vec());
    }

    #[test]
    fn pdf_printer_writes_a_pdf_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.pdf");
        let mut printer = PdfPrinter::new(&path);

        let summary = printer.print(&doc("hello (world)"), "hello.txt").expect("print");
        assert_eq!(summary.pages, 1);

        let bytes = fs::read(&path).expect("read pdf");
        assert!(bytes.starts_with(b"%PDF-"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("Helvetica"));
        assert!(text.contains("%%EOF"));
    }

    #[test]
    fn pdf_printer_reports_unwritable_targets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut printer = PdfPrinter::new(dir.path().join("missing").join("out.pdf"));
        let err = printer.print(&doc("x"), "x").expect_err("should fail");
        assert!(matches!(err, NotepadError::Io { .. }));
    }
}
