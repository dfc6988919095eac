use crate::{document::model::ParagraphAlignment, settings::EditorConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarButtonType {
    Icon,
    Toggle,
    Separator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    Open,
    Save,
    SaveAs,
    Print,
    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
    SelectAll,
    ClearAll,
    Close,
    Bold,
    Italic,
    Underline,
    AlignLeft,
    AlignCenter,
    AlignRight,
    AlignJustify,
    WordWrap,
}

impl ToolbarAction {
    pub fn alignment(self) -> Option<ParagraphAlignment> {
        match self {
            Self::AlignLeft => Some(ParagraphAlignment::Left),
            Self::AlignCenter => Some(ParagraphAlignment::Center),
            Self::AlignRight => Some(ParagraphAlignment::Right),
            Self::AlignJustify => Some(ParagraphAlignment::Justify),
            _ => None,
        }
    }

    pub fn for_alignment(alignment: ParagraphAlignment) -> Self {
        match alignment {
            ParagraphAlignment::Left => Self::AlignLeft,
            ParagraphAlignment::Center => Self::AlignCenter,
            ParagraphAlignment::Right => Self::AlignRight,
            ParagraphAlignment::Justify => Self::AlignJustify,
        }
    }
}

/// Controls whose change notifications can be suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlId {
    FontFamily,
    FontSize,
    Bold,
    Italic,
    Underline,
    /// The four exclusive alignment toggles, blocked together.
    AlignmentGroup,
    WordWrap,
}

impl ControlId {
    fn actions(self) -> &'static [ToolbarAction] {
        match self {
            Self::Bold => &[ToolbarAction::Bold],
            Self::Italic => &[ToolbarAction::Italic],
            Self::Underline => &[ToolbarAction::Underline],
            Self::AlignmentGroup => &[
                ToolbarAction::AlignLeft,
                ToolbarAction::AlignCenter,
                ToolbarAction::AlignRight,
                ToolbarAction::AlignJustify,
            ],
            Self::WordWrap => &[ToolbarAction::WordWrap],
            Self::FontFamily | Self::FontSize => &[],
        }
    }
}

/// Change notifications, queued until the owner drains them.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    FontFamilyChanged(String),
    FontSizeChanged(String),
    Toggled { action: ToolbarAction, checked: bool },
    Triggered(ToolbarAction),
}

#[derive(Debug, Clone)]
pub struct ToolbarButton {
    pub id: &'static str,
    pub label: String,
    pub tooltip: String,
    pub action: ToolbarAction,
    pub kind: ToolbarButtonType,
    pub enabled: bool,
    pub checked: bool,
    signals_blocked: bool,
}

impl ToolbarButton {
    pub fn is_checkable(&self) -> bool {
        self.kind == ToolbarButtonType::Toggle
    }

    pub fn signals_blocked(&self) -> bool {
        self.signals_blocked
    }
}

/// An editable combo box: a list of items plus the current text.
#[derive(Debug, Clone, Default)]
pub struct ComboControl {
    pub items: Vec<String>,
    current: String,
    signals_blocked: bool,
}

impl ComboControl {
    pub fn new(items: Vec<String>, current: impl Into<String>) -> Self {
        Self {
            items,
            current: current.into(),
            signals_blocked: false,
        }
    }

    pub fn current_text(&self) -> &str {
        &self.current
    }

    pub fn signals_blocked(&self) -> bool {
        self.signals_blocked
    }

    /// Returns true when the text actually changed.
    fn set_current_text(&mut self, text: &str) -> bool {
        if self.current == text {
            return false;
        }
        self.current = text.to_string();
        true
    }
}

/// The main toolbar and format controls of the editor window.
#[derive(Debug, Clone)]
pub struct Toolbar {
    pub buttons: Vec<ToolbarButton>,
    pub font_family: ComboControl,
    pub font_size: ComboControl,
    events: Vec<ControlEvent>,
}

impl Default for Toolbar {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl Toolbar {
    pub fn new(config: &EditorConfig) -> Self {
        let mut toolbar = Self {
            buttons: default_buttons(),
            font_family: ComboControl::new(default_font_catalog(), config.default_font_family.clone()),
            font_size: ComboControl::new(config.font_size_labels(), format_size(config.default_font_size)),
            events: Vec::new(),
        };
        if let Some(left) = toolbar.button_mut(ToolbarAction::AlignLeft) {
            left.checked = true;
        }
        if let Some(wrap) = toolbar.button_mut(ToolbarAction::WordWrap) {
            wrap.checked = config.default_wrap;
        }
        toolbar
    }

    pub fn button(&self, action: ToolbarAction) -> Option<&ToolbarButton> {
        self.buttons
            .iter()
            .find(|b| b.action == action && b.kind != ToolbarButtonType::Separator)
    }

    fn button_mut(&mut self, action: ToolbarAction) -> Option<&mut ToolbarButton> {
        self.buttons
            .iter_mut()
            .find(|b| b.action == action && b.kind != ToolbarButtonType::Separator)
    }

    /// Looks a button up by its stable id, e.g. `"align_center"`.
    pub fn action_for_id(&self, id: &str) -> Option<ToolbarAction> {
        self.buttons
            .iter()
            .find(|b| b.id == id && b.kind != ToolbarButtonType::Separator)
            .map(|b| b.action)
    }

    pub fn is_checked(&self, action: ToolbarAction) -> bool {
        self.button(action).is_some_and(|b| b.checked)
    }

    pub fn checked_alignment(&self) -> Vec<ParagraphAlignment> {
        self.buttons
            .iter()
            .filter(|b| b.checked)
            .filter_map(|b| b.action.alignment())
            .collect()
    }

    pub fn set_enabled(&mut self, action: ToolbarAction, enabled: bool) {
        if let Some(button) = self.button_mut(action) {
            button.enabled = enabled;
        }
    }

    /// Suspends or resumes notifications for `id`, returning the previous state.
    pub fn block_signals(&mut self, id: ControlId, blocked: bool) -> bool {
        let previous = self.signals_blocked(id);
        match id {
            ControlId::FontFamily => self.font_family.signals_blocked = blocked,
            ControlId::FontSize => self.font_size.signals_blocked = blocked,
            _ => {
                for action in id.actions() {
                    if let Some(button) = self.button_mut(*action) {
                        button.signals_blocked = blocked;
                    }
                }
            }
        }
        previous
    }

    pub fn signals_blocked(&self, id: ControlId) -> bool {
        match id {
            ControlId::FontFamily => self.font_family.signals_blocked,
            ControlId::FontSize => self.font_size.signals_blocked,
            _ => id
                .actions()
                .iter()
                .all(|action| self.button(*action).is_some_and(|b| b.signals_blocked)),
        }
    }

    pub fn set_font_family(&mut self, family: &str) {
        if self.font_family.set_current_text(family) && !self.font_family.signals_blocked {
            self.events.push(ControlEvent::FontFamilyChanged(family.to_string()));
        }
    }

    pub fn set_font_size_text(&mut self, text: &str) {
        if self.font_size.set_current_text(text) && !self.font_size.signals_blocked {
            self.events.push(ControlEvent::FontSizeChanged(text.to_string()));
        }
    }

    pub fn set_font_size(&mut self, points: f32) {
        self.set_font_size_text(&format_size(points));
    }

    /// Sets a toggle's checked state. Checking one alignment toggle unchecks
    /// the other three.
    pub fn set_checked(&mut self, action: ToolbarAction, checked: bool) {
        let exclusive = action.alignment().is_some();
        if exclusive && !checked {
            return;
        }

        let mut changes = Vec::new();
        for button in &mut self.buttons {
            if !button.is_checkable() {
                continue;
            }
            let target = if button.action == action {
                checked
            } else if exclusive && button.action.alignment().is_some() {
                false
            } else {
                continue;
            };
            if button.checked != target {
                button.checked = target;
                if !button.signals_blocked {
                    changes.push(ControlEvent::Toggled {
                        action: button.action,
                        checked: target,
                    });
                }
            }
        }
        self.events.extend(changes);
    }

    /// A click on `action`: toggles checkable buttons, then reports the trigger.
    pub fn activate(&mut self, action: ToolbarAction) {
        let Some(button) = self.button(action) else {
            return;
        };
        if !button.enabled || button.kind == ToolbarButtonType::Separator {
            return;
        }
        let (checkable, checked, blocked) = (button.is_checkable(), button.checked, button.signals_blocked);
        if checkable {
            let next = action.alignment().is_some() || !checked;
            self.set_checked(action, next);
        }
        if !blocked {
            self.events.push(ControlEvent::Triggered(action));
        }
    }

    pub fn take_events(&mut self) -> Vec<ControlEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }
}

fn default_buttons() -> Vec<ToolbarButton> {
    vec![
        btn("open", "Open", "Open a file", ToolbarAction::Open, ToolbarButtonType::Icon),
        btn("save", "Save", "Save", ToolbarAction::Save, ToolbarButtonType::Icon),
        btn("save_as", "Save As", "Save under a new name", ToolbarAction::SaveAs, ToolbarButtonType::Icon),
        btn("print", "Print", "Print", ToolbarAction::Print, ToolbarButtonType::Icon),
        sep(),
        btn("undo", "Undo", "Undo", ToolbarAction::Undo, ToolbarButtonType::Icon),
        btn("redo", "Redo", "Redo", ToolbarAction::Redo, ToolbarButtonType::Icon),
        btn("cut", "Cut", "Cut", ToolbarAction::Cut, ToolbarButtonType::Icon),
        btn("copy", "Copy", "Copy", ToolbarAction::Copy, ToolbarButtonType::Icon),
        btn("paste", "Paste", "Paste", ToolbarAction::Paste, ToolbarButtonType::Icon),
        btn("select_all", "Select All", "Select all", ToolbarAction::SelectAll, ToolbarButtonType::Icon),
        btn("clear", "Clear", "Clear the document", ToolbarAction::ClearAll, ToolbarButtonType::Icon),
        sep(),
        btn("bold", "B", "Bold", ToolbarAction::Bold, ToolbarButtonType::Toggle),
        btn("italic", "I", "Italic", ToolbarAction::Italic, ToolbarButtonType::Toggle),
        btn("underline", "U", "Underline", ToolbarAction::Underline, ToolbarButtonType::Toggle),
        sep(),
        btn("align_left", "Left", "Align left", ToolbarAction::AlignLeft, ToolbarButtonType::Toggle),
        btn("align_center", "Center", "Align center", ToolbarAction::AlignCenter, ToolbarButtonType::Toggle),
        btn("align_right", "Right", "Align right", ToolbarAction::AlignRight, ToolbarButtonType::Toggle),
        btn("justify", "Justify", "Justify", ToolbarAction::AlignJustify, ToolbarButtonType::Toggle),
        sep(),
        btn("wrap", "Wrap", "Wrap lines at the window edge", ToolbarAction::WordWrap, ToolbarButtonType::Toggle),
        sep(),
        btn("close", "Close", "Close the window", ToolbarAction::Close, ToolbarButtonType::Icon),
    ]
}

fn btn(
    id: &'static str,
    label: &'static str,
    tooltip: &'static str,
    action: ToolbarAction,
    kind: ToolbarButtonType,
) -> ToolbarButton {
    ToolbarButton {
        id,
        label: label.to_string(),
        tooltip: tooltip.to_string(),
        action,
        kind,
        enabled: true,
        checked: false,
        signals_blocked: false,
    }
}

fn sep() -> ToolbarButton {
    ToolbarButton {
        id: "sep",
        label: String::new(),
        tooltip: String::new(),
        action: ToolbarAction::WordWrap,
        kind: ToolbarButtonType::Separator,
        enabled: false,
        checked: false,
        signals_blocked: false,
    }
}

pub fn format_size(size: f32) -> String {
    if (size - size.round()).abs() < f32::EPSILON {
        format!("{}", size.round() as i32)
    } else {
        format!("{size:.1}")
    }
}

fn default_font_catalog() -> Vec<String> {
    [
        "Times",
        "Arial",
        "Courier New",
        "DejaVu Sans",
        "Georgia",
        "Helvetica",
        "Liberation Serif",
        "Times New Roman",
        "Verdana",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}
