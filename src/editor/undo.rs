use std::{collections::VecDeque, time::Instant};

use crate::{document::model::Inline, editor::commands::EditCommand};

const COALESCE_WINDOW_MS: u128 = 500;
const MAX_UNDO_STEPS: usize = 1000;
const MAX_UNDO_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct UndoEntry {
    pub command: EditCommand,
    pub inverse: EditCommand,
    pub bytes: usize,
    pub timestamp: Instant,
}

#[derive(Debug)]
pub struct UndoStack {
    undo: VecDeque<UndoEntry>,
    redo: VecDeque<UndoEntry>,
    used_bytes: usize,
    max_steps: usize,
    max_bytes: usize,
}

impl UndoStack {
    pub fn with_limits(max_steps: usize, max_bytes: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            used_bytes: 0,
            max_steps: max_steps.max(32),
            max_bytes: max_bytes.max(64 * 1024),
        }
    }

    pub fn push(&mut self, mut entry: UndoEntry) {
        self.redo.clear();
        if self.try_coalesce(&mut entry) {
            return;
        }

        self.used_bytes += entry.bytes;
        self.undo.push_back(entry);
        self.enforce_limits();
    }

    pub fn pop_undo(&mut self) -> Option<UndoEntry> {
        let entry = self.undo.pop_back()?;
        self.used_bytes = self.used_bytes.saturating_sub(entry.bytes);
        self.redo.push_back(entry.clone());
        Some(entry)
    }

    pub fn pop_redo(&mut self) -> Option<UndoEntry> {
        let entry = self.redo.pop_back()?;
        self.used_bytes += entry.bytes;
        self.undo.push_back(entry.clone());
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.used_bytes = 0;
    }

    /// Folds consecutive single-run typing into the previous entry. The
    /// previous inverse stays valid because it snapshots the paragraph from
    /// before the first keystroke.
    fn try_coalesce(&mut self, next: &mut UndoEntry) -> bool {
        let Some(last) = self.undo.back_mut() else {
            return false;
        };

        let elapsed = next.timestamp.saturating_duration_since(last.timestamp).as_millis();
        if elapsed > COALESCE_WINDOW_MS {
            return false;
        }

        let (
            EditCommand::InsertFragment {
                at: at1,
                fragment: f1,
                ..
            },
            EditCommand::InsertFragment {
                at: at2,
                fragment: f2,
                ..
            },
        ) = (&mut last.command, &next.command)
        else {
            return false;
        };

        let (Some(Inline::Text(r1)), Some(Inline::Text(r2))) =
            (single_inline_mut(&mut f1.paragraphs), single_inline(&f2.paragraphs))
        else {
            return false;
        };

        let contiguous = at1.block_id == at2.block_id && at2.offset == at1.offset + r1.text.chars().count();
        if !contiguous || r1.style != r2.style || !r2.text.chars().all(is_coalescable_char) {
            return false;
        }

        r1.text.push_str(&r2.text);
        last.bytes += next.bytes;
        last.timestamp = next.timestamp;
        self.used_bytes += next.bytes;
        self.enforce_limits();
        true
    }

    fn enforce_limits(&mut self) {
        while self.undo.len() > self.max_steps || self.used_bytes > self.max_bytes {
            if let Some(front) = self.undo.pop_front() {
                self.used_bytes = self.used_bytes.saturating_sub(front.bytes);
            } else {
                break;
            }
        }
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::with_limits(MAX_UNDO_STEPS, MAX_UNDO_BYTES)
    }
}

fn single_inline(paragraphs: &[Vec<Inline>]) -> Option<&Inline> {
    match paragraphs {
        [only] if only.len() == 1 => only.first(),
        _ => None,
    }
}

fn single_inline_mut(paragraphs: &mut [Vec<Inline>]) -> Option<&mut Inline> {
    match paragraphs {
        [only] if only.len() == 1 => only.first_mut(),
        _ => None,
    }
}

fn is_coalescable_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
