use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use ropey::Rope;

use crate::document::{
    DocumentFormat,
    model::{Document, Fragment, Inline, RunStyle},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding_name: &'static str,
}

pub fn from_plain_text(text: &str, base: &RunStyle) -> Document {
    let rope = Rope::from_str(text);
    let paragraphs = rope
        .lines()
        .map(|line| {
            let line = line.to_string();
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                Vec::new()
            } else {
                vec![Inline::text(line, base.clone())]
            }
        })
        .collect();

    let mut doc = Document::from_fragment(Fragment { paragraphs }, base.clone());
    doc.metadata.format = DocumentFormat::PlainText;
    doc
}

/// Paragraphs joined with `\n`. Images have no textual form and are skipped.
pub fn to_plain_text(doc: &Document) -> String {
    doc.content
        .iter()
        .map(|p| p.plain_text())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn decode_text(bytes: &[u8]) -> DecodedText {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return decode_with_encoding(rest, UTF_8);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_with_encoding(rest, UTF_16LE);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_with_encoding(rest, UTF_16BE);
    }

    if let Ok(as_utf8) = std::str::from_utf8(bytes) {
        return DecodedText {
            text: as_utf8.to_string(),
            encoding_name: UTF_8.name(),
        };
    }

    // Legacy 8-bit text files.
    decode_with_encoding(bytes, WINDOWS_1252)
}

fn decode_with_encoding(bytes: &[u8], encoding: &'static Encoding) -> DecodedText {
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    DecodedText {
        text: text.into_owned(),
        encoding_name: encoding.name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_boms_and_legacy_bytes() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFhi").text, "hi");
        assert_eq!(decode_text(&[0xFF, 0xFE, b'h', 0, b'i', 0]).encoding_name, "UTF-16LE");
        let legacy = decode_text(&[b'c', b'a', b'f', 0xE9]);
        assert_eq!(legacy.text, "café");
        assert_eq!(legacy.encoding_name, "windows-1252");
    }

    #[test]
    fn plain_text_round_trips_line_structure() {
        let base = RunStyle {
            font_family: Some("Times".into()),
            font_size: Some(14.0),
            ..RunStyle::default()
        };
        let doc = from_plain_text("first\r\nsecond\n\nfourth\n", &base);
        assert_eq!(doc.content.len(), 5);
        assert_eq!(to_plain_text(&doc), "first\nsecond\n\nfourth\n");
        assert!(!doc.dirty);
    }
}
