use std::sync::OnceLock;

use regex::Regex;

use crate::document::{
    DocumentFormat,
    model::{Document, Fragment, ImageRef, Inline, Paragraph, ParagraphAlignment, RunStyle},
};

/// Heuristic used when opening files: true when the first tag of `text`
/// is a recognisable HTML element or doctype.
pub fn might_be_rich_text(text: &str) -> bool {
    static RICH: OnceLock<Option<Regex>> = OnceLock::new();
    let regex = RICH.get_or_init(|| {
        Regex::new(
            r"(?is)^\s*(?:<!--.*?-->\s*)*<(?:!doctype\s+html|html|head|body|meta|style|title|p|div|span|font|b|i|u|em|strong|br|img|table|h[1-6])\b",
        )
        .ok()
    });
    regex.as_ref().is_some_and(|re| re.is_match(text))
}

pub fn to_html(doc: &Document) -> String {
    let mut body = String::new();
    for paragraph in &doc.content {
        body.push_str(&paragraph_to_html(paragraph));
        body.push('\n');
    }

    let mut body_css = String::new();
    if let Some(family) = &doc.default_style.font_family {
        body_css.push_str(&format!("font-family:'{}';", escape_html_text(family)));
    }
    if let Some(size) = doc.default_style.font_size {
        body_css.push_str(&format!("font-size:{}pt;", format_points(size)));
    }

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><meta name=\"generator\" content=\"notepad\"></head><body style=\"{body_css}\">\n{body}</body></html>\n"
    )
}

pub fn fragment_to_html(fragment: &Fragment) -> String {
    fragment
        .paragraphs
        .iter()
        .map(|inlines| format!("<p>{}</p>", inlines_to_html(inlines)))
        .collect()
}

fn paragraph_to_html(paragraph: &Paragraph) -> String {
    let content = inlines_to_html(&paragraph.inlines);
    let content = if content.is_empty() {
        "<br/>".to_string()
    } else {
        content
    };
    match paragraph.alignment {
        ParagraphAlignment::Left => format!("<p>{content}</p>"),
        other => format!("<p style=\"text-align:{};\">{content}</p>", other.css()),
    }
}

fn inlines_to_html(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(run) => {
                if run.text.is_empty() {
                    continue;
                }
                let escaped = escape_html_text(&run.text);
                let css = style_to_css(&run.style);
                if css.is_empty() {
                    out.push_str(&escaped);
                } else {
                    out.push_str("<span style=\"");
                    out.push_str(&css);
                    out.push_str("\">");
                    out.push_str(&escaped);
                    out.push_str("</span>");
                }
            }
            Inline::Image(image) => {
                out.push_str(&format!("<img src=\"{}\"", escape_html_text(&image.key)));
                if image.width > 0 && image.height > 0 {
                    out.push_str(&format!(" width=\"{}\" height=\"{}\"", image.width, image.height));
                }
                out.push_str(" />");
            }
        }
    }
    out
}

pub fn from_html(html: &str, base: &RunStyle) -> Document {
    let parsed = parse_html(html);
    let mut doc = Document::new(base.clone());
    doc.content.clear();
    for (inlines, alignment) in parsed {
        let id = doc.allocate_block_id();
        let mut paragraph = Paragraph::new(id);
        paragraph.inlines = inlines;
        paragraph.alignment = alignment;
        paragraph.normalize();
        doc.content.push(paragraph);
    }
    if doc.content.is_empty() {
        let id = doc.allocate_block_id();
        doc.content.push(Paragraph::new(id));
    }
    doc.metadata.format = DocumentFormat::Html;
    doc
}

pub fn fragment_from_html(html: &str) -> Fragment {
    Fragment {
        paragraphs: parse_html(html).into_iter().map(|(inlines, _)| inlines).collect(),
    }
}

fn parse_html(raw_html: &str) -> Vec<(Vec<Inline>, ParagraphAlignment)> {
    let html = extract_html_fragment(raw_html);
    let mut parser = HtmlParser::default();
    let mut i = 0usize;

    while i < html.len() {
        let byte = html.as_bytes()[i];
        if byte == b'<' {
            if let Some(end_rel) = html[i..].find('>') {
                let end = i + end_rel;
                let tag = html[i + 1..end].trim();
                parser.flush_run();
                parser.handle_tag(tag);
                i = end + 1;
                continue;
            }
        }
        if byte == b'&' {
            if let Some((decoded, next)) = decode_html_entity(html, i) {
                parser.push_text(&decoded, true);
                i = next;
                continue;
            }
        }

        let ch = html[i..].chars().next().unwrap_or('\0');
        let mut buf = [0u8; 4];
        parser.push_text(ch.encode_utf8(&mut buf), false);
        i += ch.len_utf8();
    }

    parser.finish()
}

struct HtmlParser {
    style_stack: Vec<RunStyle>,
    paragraphs: Vec<(Vec<Inline>, ParagraphAlignment)>,
    current: Vec<Inline>,
    alignment: ParagraphAlignment,
    text: String,
    skip_depth: usize,
    block_open: bool,
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self {
            style_stack: vec![RunStyle::default()],
            paragraphs: Vec::new(),
            current: Vec::new(),
            alignment: ParagraphAlignment::Left,
            text: String::new(),
            skip_depth: 0,
            block_open: false,
        }
    }
}

impl HtmlParser {
    fn style(&self) -> RunStyle {
        self.style_stack.last().cloned().unwrap_or_default()
    }

    fn at_paragraph_start(&self) -> bool {
        self.text.is_empty() && self.current.is_empty()
    }

    /// Whitespace collapses to a single space; entities such as `&nbsp;` are literal.
    fn push_text(&mut self, text: &str, literal: bool) {
        if self.skip_depth > 0 {
            return;
        }
        if !literal && text.chars().all(char::is_whitespace) {
            let last_is_space = self.text.ends_with(' ')
                || (self.text.is_empty()
                    && matches!(self.current.last(), Some(Inline::Text(run)) if run.text.ends_with(' ')));
            if self.at_paragraph_start() || last_is_space {
                return;
            }
            self.text.push(' ');
            return;
        }
        self.text.push_str(text);
    }

    fn flush_run(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let style = self.style();
        let text = std::mem::take(&mut self.text);
        if let Some(Inline::Text(last)) = self.current.last_mut() {
            if last.style == style {
                last.text.push_str(&text);
                return;
            }
        }
        self.current.push(Inline::text(text, style));
    }

    fn finish_paragraph(&mut self) {
        self.flush_run();
        if let Some(Inline::Text(last)) = self.current.last_mut() {
            let trimmed = last.text.trim_end_matches(' ').len();
            last.text.truncate(trimmed);
        }
        let inlines = std::mem::take(&mut self.current);
        self.paragraphs.push((inlines, self.alignment));
        self.alignment = ParagraphAlignment::Left;
        self.block_open = false;
    }

    fn finish(mut self) -> Vec<(Vec<Inline>, ParagraphAlignment)> {
        self.flush_run();
        if !self.current.is_empty() || self.block_open {
            self.finish_paragraph();
        }
        self.paragraphs
    }

    fn handle_tag(&mut self, tag: &str) {
        if tag.is_empty() || tag.starts_with('!') || tag.starts_with('?') {
            return;
        }

        let closing = tag.starts_with('/');
        let trimmed = tag.trim_matches('/');
        let name = trimmed
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        if matches!(name.as_str(), "head" | "style" | "script" | "title") {
            if closing {
                self.skip_depth = self.skip_depth.saturating_sub(1);
            } else if !tag.ends_with('/') {
                self.skip_depth += 1;
            }
            return;
        }
        if self.skip_depth > 0 {
            return;
        }

        if closing {
            match name.as_str() {
                "b" | "strong" | "i" | "em" | "u" | "ins" | "span" | "font" | "body" => self.pop_style(),
                "p" | "div" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    if self.block_open || !self.at_paragraph_start() {
                        self.finish_paragraph();
                    }
                    self.pop_style();
                }
                _ => {}
            }
            return;
        }

        match name.as_str() {
            "b" | "strong" => self.push_modified_style(|s| s.bold = true),
            "i" | "em" => self.push_modified_style(|s| s.italic = true),
            "u" | "ins" => self.push_modified_style(|s| s.underline = true),
            "span" | "body" => {
                let css = extract_attr_value(tag, "style").unwrap_or_default();
                self.push_modified_style(|s| apply_inline_css(s, &css));
            }
            "font" => {
                let face = extract_attr_value(tag, "face");
                self.push_modified_style(|s| {
                    if let Some(face) = face {
                        s.font_family = first_font_family(&face);
                    }
                });
            }
            "p" | "div" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if !self.at_paragraph_start() {
                    self.finish_paragraph();
                }
                let css = extract_attr_value(tag, "style").unwrap_or_default();
                self.alignment = extract_attr_value(tag, "align")
                    .and_then(|v| ParagraphAlignment::from_css(&v))
                    .or_else(|| css_alignment(&css))
                    .unwrap_or(ParagraphAlignment::Left);
                self.block_open = true;
                let heading = name.starts_with('h');
                self.push_modified_style(|s| {
                    apply_inline_css(s, &css);
                    if heading {
                        s.bold = true;
                    }
                });
            }
            "br" => {
                self.finish_paragraph();
                self.block_open = true;
            }
            "img" => {
                let Some(src) = extract_attr_value(tag, "src") else {
                    return;
                };
                let width = extract_attr_value(tag, "width").and_then(|v| v.parse().ok()).unwrap_or(0);
                let height = extract_attr_value(tag, "height").and_then(|v| v.parse().ok()).unwrap_or(0);
                self.current.push(Inline::Image(ImageRef {
                    key: src,
                    width,
                    height,
                }));
            }
            _ => {}
        }
    }

    fn push_modified_style<F>(&mut self, mutator: F)
    where
        F: FnOnce(&mut RunStyle),
    {
        let mut next = self.style();
        mutator(&mut next);
        self.style_stack.push(next);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }
}

fn extract_html_fragment(raw_html: &str) -> &str {
    if let (Some(start_marker), Some(end_marker)) = (
        raw_html.find("<!--StartFragment-->"),
        raw_html.find("<!--EndFragment-->"),
    ) {
        let start = start_marker + "<!--StartFragment-->".len();
        if start <= end_marker {
            return &raw_html[start..end_marker];
        }
    }

    raw_html
}

fn extract_attr_value(tag: &str, attr_name: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    let key = format!("{attr_name}=");
    let idx = lower
        .match_indices(&key)
        .find(|(idx, _)| *idx == 0 || lower.as_bytes()[idx - 1].is_ascii_whitespace())
        .map(|(idx, _)| idx)?;
    let rest = tag[idx + key.len()..].trim_start();
    let quote = rest.chars().next()?;
    if quote == '"' || quote == '\'' {
        let end = rest[1..].find(quote)?;
        Some(decode_entities(&rest[1..1 + end]))
    } else {
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '/')
            .unwrap_or(rest.len());
        Some(decode_entities(&rest[..end]))
    }
}

fn css_alignment(css: &str) -> Option<ParagraphAlignment> {
    css.split(';').find_map(|decl| {
        let (key, value) = decl.split_once(':')?;
        if key.trim().eq_ignore_ascii_case("text-align") {
            ParagraphAlignment::from_css(value)
        } else {
            None
        }
    })
}

fn apply_inline_css(style: &mut RunStyle, css: &str) {
    for decl in css.split(';') {
        let Some((key, value)) = decl.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let raw_value = value.trim();
        let value = raw_value.to_ascii_lowercase();
        match key.as_str() {
            "font-weight" => {
                style.bold = value.contains("bold")
                    || value.parse::<u32>().map(|w| w >= 600).unwrap_or(false);
            }
            "font-style" => style.italic = value.contains("italic") || value.contains("oblique"),
            "text-decoration" | "text-decoration-line" => {
                style.underline = value.contains("underline");
            }
            "font-family" => style.font_family = first_font_family(raw_value),
            "font-size" => {
                if let Some(size) = parse_font_size(&value) {
                    style.font_size = Some(size);
                }
            }
            _ => {}
        }
    }
}

fn first_font_family(value: &str) -> Option<String> {
    let family = value
        .split(',')
        .next()?
        .trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .trim();
    (!family.is_empty()).then(|| family.to_string())
}

fn parse_font_size(value: &str) -> Option<f32> {
    let value = value.trim();
    let (number, factor) = if let Some(pt) = value.strip_suffix("pt") {
        (pt, 1.0)
    } else if let Some(px) = value.strip_suffix("px") {
        (px, 0.75)
    } else {
        return None;
    };
    let parsed = number.trim().parse::<f32>().ok()?;
    (parsed.is_finite() && parsed > 0.0).then_some(parsed * factor)
}

fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut i = 0usize;
    while i < input.len() {
        if input.as_bytes()[i] == b'&' {
            if let Some((decoded, next)) = decode_html_entity(input, i) {
                out.push_str(&decoded);
                i = next;
                continue;
            }
        }
        let ch = input[i..].chars().next().unwrap_or('\0');
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

fn decode_html_entity(input: &str, offset: usize) -> Option<(String, usize)> {
    let tail = &input[offset..];
    for (entity, decoded) in [
        ("&amp;", "&"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&apos;", "'"),
        ("&nbsp;", "\u{a0}"),
    ] {
        if tail.starts_with(entity) {
            return Some((decoded.to_string(), offset + entity.len()));
        }
    }

    if let Some(rest) = tail.strip_prefix("&#") {
        let end = rest.find(';')?;
        let body = &rest[..end];
        let value = if let Some(hex) = body.strip_prefix('x').or_else(|| body.strip_prefix('X')) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            body.parse::<u32>().ok()?
        };
        let decoded = char::from_u32(value)?.to_string();
        return Some((decoded, offset + 2 + end + 1));
    }

    None
}

fn escape_html_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn style_to_css(style: &RunStyle) -> String {
    let mut css = String::new();
    if let Some(family) = &style.font_family {
        css.push_str(&format!("font-family:'{}';", escape_html_text(family)));
    }
    if let Some(size) = style.font_size {
        css.push_str(&format!("font-size:{}pt;", format_points(size)));
    }
    if style.bold {
        css.push_str("font-weight:bold;");
    }
    if style.italic {
        css.push_str("font-style:italic;");
    }
    if style.underline {
        css.push_str("text-decoration:underline;");
    }
    css
}

fn format_points(size: f32) -> String {
    if size.fract() == 0.0 {
        format!("{}", size as u32)
    } else {
        format!("{size:.1}")
    }
}
