use std::cmp::Ordering;

use crate::document::model::{BlockId, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorPosition {
    pub block_id: BlockId,
    pub offset: usize,
}

impl Default for CursorPosition {
    fn default() -> Self {
        Self {
            block_id: BlockId(1),
            offset: 0,
        }
    }
}

impl CursorPosition {
    pub fn new(block_id: BlockId, offset: usize) -> Self {
        Self { block_id, offset }
    }
}

/// An ordered range: `start` never comes after `end` in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: CursorPosition,
    pub end: CursorPosition,
}

impl SelectionRange {
    pub fn ordered(doc: &Document, a: CursorPosition, b: CursorPosition) -> Self {
        if compare_positions(doc, a, b) == Ordering::Greater {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
}

/// Orders positions by paragraph order in `doc`, then by offset. Positions in
/// unknown paragraphs sort last.
pub fn compare_positions(doc: &Document, a: CursorPosition, b: CursorPosition) -> Ordering {
    let ia = doc.paragraph_index(a.block_id).unwrap_or(usize::MAX);
    let ib = doc.paragraph_index(b.block_id).unwrap_or(usize::MAX);
    (ia, a.offset).cmp(&(ib, b.offset))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Left,
    Right,
    Home,
    End,
    Up,
    Down,
    DocumentStart,
    DocumentEnd,
}

#[derive(Debug, Clone, Default)]
pub struct CursorState {
    pub position: CursorPosition,
    pub anchor: CursorPosition,
}

impl CursorState {
    pub fn collapsed_at(pos: CursorPosition) -> Self {
        Self {
            position: pos,
            anchor: pos,
        }
    }

    pub fn has_selection(&self) -> bool {
        self.position != self.anchor
    }

    pub fn set_position(&mut self, pos: CursorPosition) {
        self.position = pos;
        self.anchor = pos;
    }

    pub fn select(&mut self, anchor: CursorPosition, position: CursorPosition) {
        self.anchor = anchor;
        self.position = position;
    }

    pub fn selection(&self, doc: &Document) -> Option<SelectionRange> {
        self.has_selection()
            .then(|| SelectionRange::ordered(doc, self.anchor, self.position))
    }

    pub fn select_all(&mut self, doc: &Document) {
        let last_len = doc.content.last().map(|p| p.char_len()).unwrap_or(0);
        self.anchor = CursorPosition::new(doc.first_block_id(), 0);
        self.position = CursorPosition::new(doc.last_block_id(), last_len);
    }

    pub fn move_simple(&mut self, doc: &Document, movement: Movement, keep_anchor: bool) {
        let pos = clamp_position(doc, self.position);
        let Some(index) = doc.paragraph_index(pos.block_id) else {
            return;
        };
        let len = doc.content[index].char_len();

        let next = match movement {
            Movement::Left if pos.offset > 0 => CursorPosition::new(pos.block_id, pos.offset - 1),
            Movement::Left if index > 0 => {
                let prev = &doc.content[index - 1];
                CursorPosition::new(prev.id, prev.char_len())
            }
            Movement::Right if pos.offset < len => CursorPosition::new(pos.block_id, pos.offset + 1),
            Movement::Right if index + 1 < doc.content.len() => {
                CursorPosition::new(doc.content[index + 1].id, 0)
            }
            Movement::Home => CursorPosition::new(pos.block_id, 0),
            Movement::End => CursorPosition::new(pos.block_id, len),
            Movement::Up if index > 0 => {
                let prev = &doc.content[index - 1];
                CursorPosition::new(prev.id, pos.offset.min(prev.char_len()))
            }
            Movement::Down if index + 1 < doc.content.len() => {
                let next = &doc.content[index + 1];
                CursorPosition::new(next.id, pos.offset.min(next.char_len()))
            }
            Movement::DocumentStart => CursorPosition::new(doc.first_block_id(), 0),
            Movement::DocumentEnd => {
                let last_len = doc.content.last().map(|p| p.char_len()).unwrap_or(0);
                CursorPosition::new(doc.last_block_id(), last_len)
            }
            _ => pos,
        };

        self.position = next;
        if !keep_anchor {
            self.anchor = next;
        }
    }
}

pub fn clamp_position(doc: &Document, pos: CursorPosition) -> CursorPosition {
    match doc.paragraph(pos.block_id) {
        Some(paragraph) => CursorPosition::new(pos.block_id, pos.offset.min(paragraph.char_len())),
        None => {
            let last_len = doc.content.last().map(|p| p.char_len()).unwrap_or(0);
            CursorPosition::new(doc.last_block_id(), last_len)
        }
    }
}
