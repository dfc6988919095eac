use crate::{
    document::model::{BlockId, Fragment, Paragraph, ParagraphAlignment, RunStyle},
    editor::cursor::{CursorPosition, SelectionRange},
};

#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// `new_ids` names the paragraphs created when the fragment spans
    /// several of them, so that redo recreates the same ids.
    InsertFragment {
        at: CursorPosition,
        fragment: Fragment,
        new_ids: Vec<BlockId>,
    },
    DeleteRange {
        range: SelectionRange,
    },
    FormatRange {
        range: SelectionRange,
        patch: RunStylePatch,
    },
    SetAlignment {
        first: BlockId,
        last: BlockId,
        alignment: ParagraphAlignment,
    },
    /// Replaces `count` paragraphs starting at `first`.
    ReplaceParagraphs {
        first: BlockId,
        count: usize,
        paragraphs: Vec<Paragraph>,
    },
    ReplaceAll {
        paragraphs: Vec<Paragraph>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStylePatch {
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
}

impl RunStylePatch {
    pub fn font_family(family: impl Into<String>) -> Self {
        Self {
            font_family: Some(family.into()),
            ..Self::default()
        }
    }

    pub fn font_size(size: f32) -> Self {
        Self {
            font_size: Some(size),
            ..Self::default()
        }
    }

    pub fn bold(value: bool) -> Self {
        Self {
            bold: Some(value),
            ..Self::default()
        }
    }

    pub fn italic(value: bool) -> Self {
        Self {
            italic: Some(value),
            ..Self::default()
        }
    }

    pub fn underline(value: bool) -> Self {
        Self {
            underline: Some(value),
            ..Self::default()
        }
    }

    pub fn apply(&self, style: &mut RunStyle) {
        if let Some(family) = &self.font_family {
            style.font_family = Some(family.clone());
        }
        if let Some(size) = self.font_size {
            style.font_size = Some(size);
        }
        if let Some(v) = self.bold {
            style.bold = v;
        }
        if let Some(v) = self.italic {
            style.italic = v;
        }
        if let Some(v) = self.underline {
            style.underline = v;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Open,
    Save,
    SaveAs,
    Print,
    Close,
    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
    SelectAll,
    Bold,
    Italic,
    Underline,
}

impl Shortcut {
    /// Parses key chords such as `ctrl+shift+s`. Case and spacing are ignored.
    pub fn from_keys(keys: &str) -> Option<Self> {
        let normalized = keys
            .split('+')
            .map(|part| part.trim().to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join("+");
        let shortcut = match normalized.as_str() {
            "ctrl+o" => Self::Open,
            "ctrl+s" => Self::Save,
            "ctrl+shift+s" => Self::SaveAs,
            "ctrl+p" => Self::Print,
            "ctrl+w" | "ctrl+f4" => Self::Close,
            "ctrl+z" => Self::Undo,
            "ctrl+y" | "ctrl+shift+z" => Self::Redo,
            "ctrl+x" => Self::Cut,
            "ctrl+c" => Self::Copy,
            "ctrl+v" => Self::Paste,
            "ctrl+a" => Self::SelectAll,
            "ctrl+b" => Self::Bold,
            "ctrl+i" => Self::Italic,
            "ctrl+u" => Self::Underline,
            _ => return None,
        };
        Some(shortcut)
    }
}
