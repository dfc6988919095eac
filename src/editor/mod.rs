use std::time::Instant;

use tracing::debug;

use crate::{
    document::model::{
        BlockId,
        Document,
        Fragment,
        ImageRef,
        Inline,
        Paragraph,
        ParagraphAlignment,
        RunStyle,
        split_inlines_at,
    },
    editor::{
        commands::{EditCommand, RunStylePatch},
        cursor::{CursorPosition, CursorState, SelectionRange, clamp_position},
        undo::{UndoEntry, UndoStack},
    },
};

pub mod clipboard;
pub mod commands;
pub mod cursor;
pub mod image_ops;
pub mod inserter;
pub mod undo;

pub const FALLBACK_FONT_FAMILY: &str = "Times";
pub const FALLBACK_FONT_SIZE: f32 = 14.0;

/// Character and paragraph formatting at the cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatSnapshot {
    pub font_family: String,
    pub point_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub alignment: ParagraphAlignment,
}

impl Default for FormatSnapshot {
    fn default() -> Self {
        Self {
            font_family: FALLBACK_FONT_FAMILY.to_string(),
            point_size: FALLBACK_FONT_SIZE,
            bold: false,
            italic: false,
            underline: false,
            alignment: ParagraphAlignment::Left,
        }
    }
}

#[derive(Debug, Default)]
pub struct EditEngine {
    pub cursor: CursorState,
    pub undo: UndoStack,
    /// Format for the next insertion when formatting was changed without a selection.
    pub pending_format: Option<RunStyle>,
}

impl EditEngine {
    /// Applies `command`, records it for undo and returns the caret after it.
    pub fn apply_command(&mut self, doc: &mut Document, command: EditCommand) -> Option<CursorPosition> {
        let (inverse, caret) = apply_to_document(doc, &command)?;
        let bytes = estimate_command_size(&command);
        self.undo.push(UndoEntry {
            command,
            inverse,
            bytes,
            timestamp: Instant::now(),
        });
        doc.dirty = true;
        Some(caret)
    }

    pub fn undo(&mut self, doc: &mut Document) -> bool {
        let Some(entry) = self.undo.pop_undo() else {
            return false;
        };
        if let Some((_, caret)) = apply_to_document(doc, &entry.inverse) {
            self.move_to(doc, caret);
        }
        doc.dirty = true;
        true
    }

    pub fn redo(&mut self, doc: &mut Document) -> bool {
        let Some(entry) = self.undo.pop_redo() else {
            return false;
        };
        if let Some((_, caret)) = apply_to_document(doc, &entry.command) {
            self.move_to(doc, caret);
        }
        doc.dirty = true;
        true
    }

    /// Forget history and park the cursor at the start, e.g. after loading a file.
    pub fn reset(&mut self, doc: &Document) {
        self.undo.clear();
        self.pending_format = None;
        self.cursor = CursorState::collapsed_at(CursorPosition::new(doc.first_block_id(), 0));
    }

    pub fn move_to(&mut self, doc: &Document, pos: CursorPosition) {
        self.cursor.set_position(clamp_position(doc, pos));
        self.pending_format = None;
    }

    pub fn select(&mut self, doc: &Document, anchor: CursorPosition, position: CursorPosition) {
        self.cursor
            .select(clamp_position(doc, anchor), clamp_position(doc, position));
        self.pending_format = None;
    }

    pub fn select_all(&mut self, doc: &Document) {
        self.cursor.select_all(doc);
        self.pending_format = None;
    }

    pub fn selection(&self, doc: &Document) -> Option<SelectionRange> {
        self.cursor.selection(doc)
    }

    pub fn selected_fragment(&self, doc: &Document) -> Option<Fragment> {
        self.selection(doc).map(|range| extract_fragment(doc, range))
    }

    /// Removes the selection, returning what was removed.
    pub fn delete_selection(&mut self, doc: &mut Document) -> Option<Fragment> {
        let range = self.selection(doc)?;
        let removed = extract_fragment(doc, range);
        let caret = self.apply_command(doc, EditCommand::DeleteRange { range })?;
        self.cursor.set_position(caret);
        Some(removed)
    }

    /// Style that newly typed text receives at the cursor.
    pub fn insertion_style(&self, doc: &Document) -> RunStyle {
        if let Some(pending) = &self.pending_format {
            return pending.clone();
        }
        let pos = clamp_position(doc, self.cursor.position);
        doc.paragraph(pos.block_id)
            .and_then(|p| p.style_at(pos.offset))
            .cloned()
            .unwrap_or_else(|| doc.default_style.clone())
    }

    pub fn insert_text(&mut self, doc: &mut Document, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let style = self.insertion_style(doc);
        self.insert_fragment(doc, Fragment::from_text(text, &style))
    }

    /// Replaces the selection (if any) with `fragment` and moves the cursor
    /// past the inserted content.
    pub fn insert_fragment(&mut self, doc: &mut Document, fragment: Fragment) -> bool {
        if fragment.paragraphs.is_empty() {
            return false;
        }
        let pending = self.pending_format.take();
        self.delete_selection(doc);
        self.pending_format = pending;

        let at = clamp_position(doc, self.cursor.position);
        let new_ids = (1..fragment.paragraphs.len())
            .map(|_| doc.allocate_block_id())
            .collect();
        match self.apply_command(doc, EditCommand::InsertFragment { at, fragment, new_ids }) {
            Some(caret) => {
                self.cursor.set_position(caret);
                true
            }
            None => false,
        }
    }

    pub fn insert_image(&mut self, doc: &mut Document, image: ImageRef) -> bool {
        self.insert_fragment(doc, Fragment::single(Inline::Image(image)))
    }

    /// Formats the selection, or the pending format when nothing is selected.
    pub fn merge_char_format(&mut self, doc: &mut Document, patch: &RunStylePatch) {
        match self.selection(doc) {
            Some(range) => {
                let (anchor, position) = (self.cursor.anchor, self.cursor.position);
                self.apply_command(
                    doc,
                    EditCommand::FormatRange {
                        range,
                        patch: patch.clone(),
                    },
                );
                self.cursor.select(anchor, position);
            }
            None => {
                let mut style = self.insertion_style(doc);
                patch.apply(&mut style);
                self.pending_format = Some(style);
            }
        }
    }

    /// Aligns every paragraph touched by the selection, or the cursor's paragraph.
    pub fn set_alignment(&mut self, doc: &mut Document, alignment: ParagraphAlignment) {
        let (first, last) = match self.selection(doc) {
            Some(range) => (range.start.block_id, range.end.block_id),
            None => {
                let pos = clamp_position(doc, self.cursor.position);
                (pos.block_id, pos.block_id)
            }
        };
        let unchanged = paragraph_span(doc, first, last)
            .map(|span| doc.content[span].iter().all(|p| p.alignment == alignment))
            .unwrap_or(true);
        if unchanged {
            return;
        }
        let (anchor, position) = (self.cursor.anchor, self.cursor.position);
        self.apply_command(doc, EditCommand::SetAlignment { first, last, alignment });
        self.cursor.select(anchor, position);
    }

    /// Replaces the whole document body, undoably.
    pub fn replace_all(&mut self, doc: &mut Document, fragment: Fragment) {
        let mut paragraphs = Vec::with_capacity(fragment.paragraphs.len().max(1));
        for inlines in fragment.paragraphs {
            let mut paragraph = Paragraph::new(doc.allocate_block_id());
            paragraph.inlines = inlines;
            paragraph.normalize();
            paragraphs.push(paragraph);
        }
        if paragraphs.is_empty() {
            paragraphs.push(Paragraph::new(doc.allocate_block_id()));
        }
        self.pending_format = None;
        if let Some(caret) = self.apply_command(doc, EditCommand::ReplaceAll { paragraphs }) {
            self.cursor.set_position(caret);
        }
    }

    pub fn format_snapshot(&self, doc: &Document) -> FormatSnapshot {
        let style = self.insertion_style(doc).resolved(&doc.default_style);
        let pos = clamp_position(doc, self.cursor.position);
        let alignment = doc
            .paragraph(pos.block_id)
            .map(|p| p.alignment)
            .unwrap_or_default();

        FormatSnapshot {
            font_family: style
                .font_family
                .unwrap_or_else(|| FALLBACK_FONT_FAMILY.to_string()),
            point_size: style.font_size.unwrap_or(FALLBACK_FONT_SIZE),
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
            alignment,
        }
    }
}

/// Copies the content between the two ends of `range` without modifying `doc`.
pub fn extract_fragment(doc: &Document, range: SelectionRange) -> Fragment {
    let Some(span) = paragraph_span(doc, range.start.block_id, range.end.block_id) else {
        return Fragment::default();
    };
    let last_index = span.end() - span.start();
    let paragraphs = doc.content[span]
        .iter()
        .enumerate()
        .map(|(i, paragraph)| {
            let mut inlines = paragraph.inlines.clone();
            let len = paragraph.char_len();
            let start = if i == 0 { range.start.offset.min(len) } else { 0 };
            let end = if i == last_index { range.end.offset.min(len) } else { len };
            let end = end.max(start);
            let end_idx = split_inlines_at(&mut inlines, end);
            inlines.truncate(end_idx);
            let start_idx = split_inlines_at(&mut inlines, start);
            inlines.drain(..start_idx);
            inlines
        })
        .collect();
    Fragment { paragraphs }
}

fn paragraph_span(doc: &Document, first: BlockId, last: BlockId) -> Option<std::ops::RangeInclusive<usize>> {
    let a = doc.paragraph_index(first)?;
    let b = doc.paragraph_index(last)?;
    Some(a.min(b)..=a.max(b))
}

/// Applies a command and returns its inverse plus the caret position after it.
fn apply_to_document(doc: &mut Document, command: &EditCommand) -> Option<(EditCommand, CursorPosition)> {
    match command {
        EditCommand::InsertFragment {
            at,
            fragment,
            new_ids,
        } => {
            if fragment.paragraphs.is_empty() {
                return None;
            }
            let index = doc.paragraph_index(at.block_id)?;
            let old = doc.content[index].clone();
            let offset = at.offset.min(old.char_len());

            let mut ids = new_ids.clone();
            while ids.len() + 1 < fragment.paragraphs.len() {
                ids.push(doc.allocate_block_id());
            }

            let paragraph = &mut doc.content[index];
            let tail = paragraph.split_off(offset);
            let alignment = paragraph.alignment;
            let mut parts = fragment.paragraphs.iter();
            if let Some(first) = parts.next() {
                paragraph.inlines.extend(first.iter().cloned());
            }

            let caret = if fragment.paragraphs.len() == 1 {
                let caret_offset = paragraph.char_len();
                paragraph.inlines.extend(tail);
                paragraph.normalize();
                CursorPosition::new(at.block_id, caret_offset)
            } else {
                paragraph.normalize();
                let mut created = Vec::with_capacity(fragment.paragraphs.len() - 1);
                for (inlines, id) in parts.zip(ids.iter().copied()) {
                    let mut next = Paragraph::new(id);
                    next.alignment = alignment;
                    next.inlines = inlines.clone();
                    created.push(next);
                }
                let last = created.last_mut()?;
                let caret = CursorPosition::new(last.id, last.char_len());
                last.inlines.extend(tail);
                for p in created.iter_mut() {
                    p.normalize();
                }
                doc.reserve_ids_from(&created);
                doc.content.splice(index + 1..index + 1, created);
                caret
            };

            Some((
                EditCommand::ReplaceParagraphs {
                    first: at.block_id,
                    count: fragment.paragraphs.len(),
                    paragraphs: vec![old],
                },
                caret,
            ))
        }
        EditCommand::DeleteRange { range } => {
            if range.is_empty() {
                return None;
            }
            let span = paragraph_span(doc, range.start.block_id, range.end.block_id)?;
            let (first_index, last_index) = (*span.start(), *span.end());
            let old: Vec<Paragraph> = doc.content[span].to_vec();

            let end_len = doc.content[last_index].char_len();
            let tail = doc.content[last_index].split_off(range.end.offset.min(end_len));
            let first = &mut doc.content[first_index];
            let start = range.start.offset.min(first.char_len());
            first.split_off(start);
            first.inlines.extend(tail);
            first.normalize();
            doc.content.drain(first_index + 1..=last_index);

            Some((
                EditCommand::ReplaceParagraphs {
                    first: range.start.block_id,
                    count: 1,
                    paragraphs: old,
                },
                CursorPosition::new(range.start.block_id, start),
            ))
        }
        EditCommand::FormatRange { range, patch } => {
            if range.is_empty() {
                return None;
            }
            let span = paragraph_span(doc, range.start.block_id, range.end.block_id)?;
            let (first_index, last_index) = (*span.start(), *span.end());
            let old: Vec<Paragraph> = doc.content[span.clone()].to_vec();

            for index in span {
                let paragraph = &mut doc.content[index];
                let len = paragraph.char_len();
                let start = if index == first_index { range.start.offset.min(len) } else { 0 };
                let end = if index == last_index { range.end.offset.min(len) } else { len };
                apply_style_patch(paragraph, start, end.max(start), patch);
            }

            Some((
                EditCommand::ReplaceParagraphs {
                    first: range.start.block_id,
                    count: old.len(),
                    paragraphs: old,
                },
                range.end,
            ))
        }
        EditCommand::SetAlignment {
            first,
            last,
            alignment,
        } => {
            let span = paragraph_span(doc, *first, *last)?;
            let old: Vec<Paragraph> = doc.content[span.clone()].to_vec();
            let first_id = old.first()?.id;
            for paragraph in &mut doc.content[span] {
                paragraph.alignment = *alignment;
            }
            Some((
                EditCommand::ReplaceParagraphs {
                    first: first_id,
                    count: old.len(),
                    paragraphs: old,
                },
                CursorPosition::new(*last, 0),
            ))
        }
        EditCommand::ReplaceParagraphs {
            first,
            count,
            paragraphs,
        } => {
            let replacement_first = paragraphs.first()?.id;
            let index = doc.paragraph_index(*first)?;
            let end = (index + count).min(doc.content.len());
            let old: Vec<Paragraph> = doc.content.splice(index..end, paragraphs.iter().cloned()).collect();
            doc.reserve_ids_from(paragraphs);

            let last = paragraphs.last()?;
            Some((
                EditCommand::ReplaceParagraphs {
                    first: replacement_first,
                    count: paragraphs.len(),
                    paragraphs: old,
                },
                CursorPosition::new(last.id, last.char_len()),
            ))
        }
        EditCommand::ReplaceAll { paragraphs } => {
            if paragraphs.is_empty() {
                return None;
            }
            let old = std::mem::replace(&mut doc.content, paragraphs.clone());
            doc.reserve_ids_from(paragraphs);
            debug!(paragraphs = paragraphs.len(), "document body replaced");
            Some((
                EditCommand::ReplaceAll { paragraphs: old },
                CursorPosition::new(doc.first_block_id(), 0),
            ))
        }
    }
}

fn apply_style_patch(paragraph: &mut Paragraph, start: usize, end: usize, patch: &RunStylePatch) {
    let start_idx = split_inlines_at(&mut paragraph.inlines, start);
    let end_idx = split_inlines_at(&mut paragraph.inlines, end);

    for inline in paragraph.inlines.iter_mut().take(end_idx).skip(start_idx) {
        if let Inline::Text(run) = inline {
            patch.apply(&mut run.style);
        }
    }

    paragraph.normalize();
}

fn estimate_command_size(cmd: &EditCommand) -> usize {
    let paragraphs_size = |ps: &[Paragraph]| -> usize {
        ps.iter()
            .flat_map(|p| p.inlines.iter())
            .map(|inline| match inline {
                Inline::Text(run) => run.text.len() + 32,
                Inline::Image(image) => image.key.len() + 32,
            })
            .sum::<usize>()
            + 64 * ps.len()
    };
    match cmd {
        EditCommand::InsertFragment { fragment, .. } => fragment.plain_text().len() + 32,
        EditCommand::ReplaceParagraphs { paragraphs, .. } | EditCommand::ReplaceAll { paragraphs } => {
            paragraphs_size(paragraphs.as_slice())
        }
        _ => 24,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(text: &str) -> Document {
        Document::from_fragment(Fragment::from_text(text, &RunStyle::default()), RunStyle::default())
    }

    fn pos(doc: &Document, paragraph: usize, offset: usize) -> CursorPosition {
        CursorPosition::new(doc.content[paragraph].id, offset)
    }

    fn texts(doc: &Document) -> Vec<String> {
        doc.content.iter().map(|p| p.plain_text()).collect()
    }

    #[test]
    fn typing_then_undo_and_redo() {
        let mut doc = doc_with("");
        let mut engine = EditEngine::default();
        engine.reset(&doc);

        engine.insert_text(&mut doc, "hello");
        engine.insert_text(&mut doc, "\nworld");
        assert_eq!(texts(&doc), vec!["hello", "world"]);
        assert_eq!(engine.cursor.position, pos(&doc, 1, 5));
        assert!(doc.dirty);

        assert!(engine.undo(&mut doc));
        assert_eq!(texts(&doc), vec!["hello"]);
        assert!(engine.undo(&mut doc));
        assert_eq!(texts(&doc), vec![""]);
        assert!(!engine.undo(&mut doc));

        assert!(engine.redo(&mut doc));
        assert!(engine.redo(&mut doc));
        assert_eq!(texts(&doc), vec!["hello", "world"]);
    }

    #[test]
    fn insert_replaces_selection_across_paragraphs() {
        let mut doc = doc_with("abc\ndef\nghi");
        let mut engine = EditEngine::default();
        engine.select(&doc, pos(&doc, 0, 1), pos(&doc, 2, 2));

        let removed = engine.selected_fragment(&doc).expect("selection");
        assert_eq!(removed.plain_text(), "bc\ndef\ngh");

        engine.insert_text(&mut doc, "X");
        assert_eq!(texts(&doc), vec!["aXi"]);

        engine.undo(&mut doc);
        engine.undo(&mut doc);
        assert_eq!(texts(&doc), vec!["abc", "def", "ghi"]);
    }

    #[test]
    fn formatting_a_selection_splits_runs() {
        let mut doc = doc_with("abcdef");
        let mut engine = EditEngine::default();
        engine.select(&doc, pos(&doc, 0, 2), pos(&doc, 0, 4));
        engine.merge_char_format(&mut doc, &RunStylePatch::bold(true));

        let inlines = &doc.content[0].inlines;
        assert_eq!(inlines.len(), 3);
        assert_eq!(inlines[1], Inline::text("cd", RunStyle { bold: true, ..RunStyle::default() }));
        assert!(engine.cursor.has_selection());

        engine.move_to(&doc, pos(&doc, 0, 3));
        assert!(engine.format_snapshot(&doc).bold);
        engine.move_to(&doc, pos(&doc, 0, 5));
        assert!(!engine.format_snapshot(&doc).bold);

        engine.undo(&mut doc);
        assert_eq!(doc.content[0].inlines.len(), 1);
    }

    #[test]
    fn formatting_without_selection_sets_pending_format() {
        let mut doc = doc_with("ab");
        let mut engine = EditEngine::default();
        engine.move_to(&doc, pos(&doc, 0, 2));
        engine.merge_char_format(&mut doc, &RunStylePatch::italic(true));
        assert!(engine.format_snapshot(&doc).italic);
        assert!(!doc.dirty);

        engine.insert_text(&mut doc, "c");
        assert_eq!(doc.content[0].inlines[1], Inline::text("c", RunStyle { italic: true, ..RunStyle::default() }));
    }

    #[test]
    fn alignment_applies_to_touched_paragraphs() {
        let mut doc = doc_with("a\nb\nc");
        let mut engine = EditEngine::default();
        engine.select(&doc, pos(&doc, 0, 1), pos(&doc, 1, 0));
        engine.set_alignment(&mut doc, ParagraphAlignment::Center);

        let alignments: Vec<_> = doc.content.iter().map(|p| p.alignment).collect();
        assert_eq!(
            alignments,
            vec![ParagraphAlignment::Center, ParagraphAlignment::Center, ParagraphAlignment::Left]
        );
        engine.undo(&mut doc);
        assert!(doc.content.iter().all(|p| p.alignment == ParagraphAlignment::Left));
    }

    #[test]
    fn images_take_one_position() {
        let mut doc = doc_with("ab");
        let mut engine = EditEngine::default();
        engine.move_to(&doc, pos(&doc, 0, 1));
        engine.insert_image(
            &mut doc,
            ImageRef {
                key: "k".into(),
                width: 1,
                height: 1,
            },
        );
        assert_eq!(doc.content[0].char_len(), 3);
        assert_eq!(engine.cursor.position.offset, 2);
        assert_eq!(doc.image_count(), 1);
    }

    #[test]
    fn replace_all_clears_and_undoes() {
        let mut doc = doc_with("keep\nme");
        let mut engine = EditEngine::default();
        engine.replace_all(&mut doc, Fragment::default());
        assert!(doc.is_empty());
        engine.undo(&mut doc);
        assert_eq!(texts(&doc), vec!["keep", "me"]);
    }

    #[test]
    fn snapshot_falls_back_to_document_defaults() {
        let doc = Document::new(RunStyle {
            font_family: Some("Courier".into()),
            font_size: Some(10.0),
            ..RunStyle::default()
        });
        let engine = EditEngine::default();
        let snapshot = engine.format_snapshot(&doc);
        assert_eq!(snapshot.font_family, "Courier");
        assert_eq!(snapshot.point_size, 10.0);
        assert_eq!(snapshot.alignment, ParagraphAlignment::Left);
    }
}
