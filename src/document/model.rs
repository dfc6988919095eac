use std::{collections::BTreeMap, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::DocumentFormat;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub metadata: DocumentMetadata,
    pub content: Vec<Paragraph>,
    /// Resource key (file URL or generated key) to embedded image bytes.
    pub resources: BTreeMap<String, ImageResource>,
    pub default_style: RunStyle,
    pub dirty: bool,
    next_block_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    pub file_path: Option<PathBuf>,
    pub format: DocumentFormat,
    pub modified: Option<DateTime<Utc>>,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            file_path: None,
            format: DocumentFormat::PlainText,
            modified: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paragraph {
    pub id: BlockId,
    pub inlines: Vec<Inline>,
    pub alignment: ParagraphAlignment,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Inline {
    Text(Run),
    Image(ImageRef),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RunStyle {
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRef {
    pub key: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ImageResource {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ParagraphAlignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl ParagraphAlignment {
    pub fn css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }

    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" | "middle" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            "justify" => Some(Self::Justify),
            _ => None,
        }
    }
}

/// A run of paragraphs detached from any document, used for clipboard
/// payloads and as the unit of insertion and deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Fragment {
    pub paragraphs: Vec<Vec<Inline>>,
}

impl Inline {
    pub fn char_len(&self) -> usize {
        match self {
            Self::Text(run) => run.text.chars().count(),
            Self::Image(_) => 1,
        }
    }

    pub fn text(text: impl Into<String>, style: RunStyle) -> Self {
        Self::Text(Run {
            text: text.into(),
            style,
        })
    }
}

impl RunStyle {
    /// Fill unset family and size from `base`.
    pub fn resolved(&self, base: &RunStyle) -> RunStyle {
        RunStyle {
            font_family: self.font_family.clone().or_else(|| base.font_family.clone()),
            font_size: self.font_size.or(base.font_size),
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
        }
    }
}

impl Paragraph {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            inlines: Vec::new(),
            alignment: ParagraphAlignment::Left,
        }
    }

    pub fn char_len(&self) -> usize {
        self.inlines.iter().map(Inline::char_len).sum()
    }

    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for inline in &self.inlines {
            if let Inline::Text(run) = inline {
                out.push_str(&run.text);
            }
        }
        out
    }

    /// Splits the inlines at a char offset, leaving the head in `self`.
    pub fn split_off(&mut self, offset: usize) -> Vec<Inline> {
        let index = split_inlines_at(&mut self.inlines, offset);
        self.inlines.split_off(index)
    }

    /// Style of the char just before `offset` (the first char at offset 0).
    /// Images carry no style, so the nearest text run before them wins.
    pub fn style_at(&self, offset: usize) -> Option<&RunStyle> {
        let target = offset.saturating_sub(1);
        let mut acc = 0usize;
        let mut last_text = None;
        for inline in &self.inlines {
            let len = inline.char_len();
            match inline {
                Inline::Text(run) if len > 0 => {
                    if target < acc + len {
                        return Some(&run.style);
                    }
                    last_text = Some(&run.style);
                }
                Inline::Image(_) if target < acc + len && last_text.is_some() => {
                    return last_text;
                }
                _ => {}
            }
            acc += len;
        }
        last_text
    }

    pub fn normalize(&mut self) {
        merge_adjacent_runs(&mut self.inlines);
    }
}

impl Fragment {
    pub fn from_text(text: &str, style: &RunStyle) -> Self {
        let paragraphs = text
            .split('\n')
            .map(|line| {
                let line = line.strip_suffix('\r').unwrap_or(line);
                if line.is_empty() {
                    Vec::new()
                } else {
                    vec![Inline::text(line, style.clone())]
                }
            })
            .collect();
        Self { paragraphs }
    }

    pub fn single(inline: Inline) -> Self {
        Self {
            paragraphs: vec![vec![inline]],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.len() <= 1 && self.paragraphs.iter().all(|p| p.is_empty())
    }

    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|inlines| {
                inlines
                    .iter()
                    .filter_map(|inline| match inline {
                        Inline::Text(run) => Some(run.text.as_str()),
                        Inline::Image(_) => None,
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(RunStyle::default())
    }
}

impl Document {
    pub fn new(default_style: RunStyle) -> Self {
        Self {
            metadata: DocumentMetadata::default(),
            content: vec![Paragraph::new(BlockId(1))],
            resources: BTreeMap::new(),
            default_style,
            dirty: false,
            next_block_id: 2,
        }
    }

    pub fn from_fragment(fragment: Fragment, default_style: RunStyle) -> Self {
        let mut doc = Self::new(default_style);
        doc.content.clear();
        for inlines in fragment.paragraphs {
            let id = doc.allocate_block_id();
            let mut paragraph = Paragraph::new(id);
            paragraph.inlines = inlines;
            paragraph.normalize();
            doc.content.push(paragraph);
        }
        if doc.content.is_empty() {
            let id = doc.allocate_block_id();
            doc.content.push(Paragraph::new(id));
        }
        doc
    }

    pub fn allocate_block_id(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id.max(1));
        self.next_block_id = id.0 + 1;
        id
    }

    /// Make sure freshly allocated ids never collide with ids already present.
    pub fn reserve_ids_from(&mut self, paragraphs: &[Paragraph]) {
        if let Some(max) = paragraphs.iter().map(|p| p.id.0).max() {
            self.next_block_id = self.next_block_id.max(max + 1);
        }
    }

    pub fn first_block_id(&self) -> BlockId {
        self.content.first().map(|p| p.id).unwrap_or_default()
    }

    pub fn last_block_id(&self) -> BlockId {
        self.content.last().map(|p| p.id).unwrap_or_default()
    }

    pub fn paragraph_index(&self, id: BlockId) -> Option<usize> {
        self.content.iter().position(|p| p.id == id)
    }

    pub fn paragraph(&self, id: BlockId) -> Option<&Paragraph> {
        self.content.iter().find(|p| p.id == id)
    }

    /// Registers an image under `key`. Returns `false` when the key already
    /// existed and its bytes were replaced.
    pub fn register_resource(&mut self, key: impl Into<String>, resource: ImageResource) -> bool {
        self.resources.insert(key.into(), resource).is_none()
    }

    pub fn resource(&self, key: &str) -> Option<&ImageResource> {
        self.resources.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.content.iter().all(|p| p.inlines.is_empty())
    }

    pub fn image_count(&self) -> usize {
        self.content
            .iter()
            .flat_map(|p| p.inlines.iter())
            .filter(|inline| matches!(inline, Inline::Image(_)))
            .count()
    }
}

/// Splits the inline holding `offset` so that a boundary exists there and
/// returns the index of the first inline at or after it.
pub fn split_inlines_at(inlines: &mut Vec<Inline>, offset: usize) -> usize {
    if offset == 0 {
        return 0;
    }

    let mut acc = 0usize;
    for i in 0..inlines.len() {
        let len = inlines[i].char_len();
        let end = acc + len;
        if offset == end {
            return i + 1;
        }
        if offset > acc && offset < end {
            if let Inline::Text(run) = &mut inlines[i] {
                let cut = run
                    .text
                    .char_indices()
                    .nth(offset - acc)
                    .map(|(byte, _)| byte)
                    .unwrap_or(run.text.len());
                let tail = run.text.split_off(cut);
                let style = run.style.clone();
                inlines.insert(i + 1, Inline::text(tail, style));
                return i + 1;
            }
            return i + 1;
        }
        acc = end;
    }

    inlines.len()
}

pub fn merge_adjacent_runs(inlines: &mut Vec<Inline>) {
    inlines.retain(|inline| !matches!(inline, Inline::Text(run) if run.text.is_empty()));

    let mut i = 0;
    while i + 1 < inlines.len() {
        let mergeable = matches!(
            (&inlines[i], &inlines[i + 1]),
            (Inline::Text(a), Inline::Text(b)) if a.style == b.style
        );
        if mergeable {
            if let Inline::Text(next) = inlines.remove(i + 1) {
                if let Inline::Text(run) = &mut inlines[i] {
                    run.text.push_str(&next.text);
                }
            }
        } else {
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> RunStyle {
        RunStyle {
            bold: true,
            ..RunStyle::default()
        }
    }

    #[test]
    fn split_respects_multibyte_chars() {
        let mut inlines = vec![Inline::text("héllo", RunStyle::default())];
        let idx = split_inlines_at(&mut inlines, 2);
        assert_eq!(idx, 1);
        assert_eq!(inlines[0], Inline::text("hé", RunStyle::default()));
        assert_eq!(inlines[1], Inline::text("llo", RunStyle::default()));
    }

    #[test]
    fn merge_joins_equal_styles_and_keeps_images() {
        let mut inlines = vec![
            Inline::text("a", RunStyle::default()),
            Inline::text("b", RunStyle::default()),
            Inline::Image(ImageRef {
                key: "k".into(),
                width: 1,
                height: 1,
            }),
            Inline::text("", bold()),
            Inline::text("c", bold()),
        ];
        merge_adjacent_runs(&mut inlines);
        assert_eq!(inlines.len(), 3);
        assert_eq!(inlines[0], Inline::text("ab", RunStyle::default()));
        assert_eq!(inlines[2], Inline::text("c", bold()));
    }

    #[test]
    fn style_at_reads_char_before_cursor() {
        let mut paragraph = Paragraph::new(BlockId(1));
        paragraph.inlines = vec![
            Inline::text("ab", RunStyle::default()),
            Inline::text("cd", bold()),
        ];

        assert_eq!(paragraph.style_at(0), Some(&RunStyle::default()));
        assert_eq!(paragraph.style_at(2), Some(&RunStyle::default()));
        assert_eq!(paragraph.style_at(3), Some(&bold()));
        assert_eq!(paragraph.style_at(4), Some(&bold()));
    }

    #[test]
    fn fragment_from_text_splits_lines() {
        let fragment = Fragment::from_text("one\r\n\ntwo", &RunStyle::default());
        assert_eq!(fragment.paragraphs.len(), 3);
        assert!(fragment.paragraphs[1].is_empty());
        assert_eq!(fragment.plain_text(), "one\n\ntwo");
    }

    #[test]
    fn allocated_ids_skip_reserved_ones() {
        let mut doc = Document::default();
        doc.reserve_ids_from(&[Paragraph::new(BlockId(40))]);
        assert_eq!(doc.allocate_block_id(), BlockId(41));
    }
}
