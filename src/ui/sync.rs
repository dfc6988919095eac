use std::ops::{Deref, DerefMut};

use tracing::trace;

use crate::{
    editor::FormatSnapshot,
    ui::toolbar::{ControlId, Toolbar, ToolbarAction, format_size},
};

/// The controls that mirror the format at the cursor.
pub const FORMAT_CONTROLS: [ControlId; 6] = [
    ControlId::FontFamily,
    ControlId::FontSize,
    ControlId::Bold,
    ControlId::Italic,
    ControlId::Underline,
    ControlId::AlignmentGroup,
];

/// Suspends notifications on a set of controls for as long as it lives.
/// Each control gets back the blocked state it had before, including when
/// the scope is left by an early return or a panic.
pub struct NotificationBlocker<'a> {
    toolbar: &'a mut Toolbar,
    previous: Vec<(ControlId, bool)>,
}

impl<'a> NotificationBlocker<'a> {
    pub fn new(toolbar: &'a mut Toolbar, controls: &[ControlId]) -> Self {
        let previous = controls
            .iter()
            .map(|id| (*id, toolbar.block_signals(*id, true)))
            .collect();
        Self { toolbar, previous }
    }
}

impl Deref for NotificationBlocker<'_> {
    type Target = Toolbar;

    fn deref(&self) -> &Toolbar {
        self.toolbar
    }
}

impl DerefMut for NotificationBlocker<'_> {
    fn deref_mut(&mut self) -> &mut Toolbar {
        self.toolbar
    }
}

impl Drop for NotificationBlocker<'_> {
    fn drop(&mut self) {
        for (id, blocked) in self.previous.drain(..).rev() {
            self.toolbar.block_signals(id, blocked);
        }
    }
}

pub struct FormatSynchronizer;

impl FormatSynchronizer {
    /// Writes `snapshot` onto the format controls without any of them
    /// reporting a change.
    pub fn sync(toolbar: &mut Toolbar, snapshot: &FormatSnapshot) {
        let mut controls = NotificationBlocker::new(toolbar, &FORMAT_CONTROLS);
        controls.set_font_family(&snapshot.font_family);
        controls.set_font_size_text(&format_size(snapshot.point_size));
        controls.set_checked(ToolbarAction::Bold, snapshot.bold);
        controls.set_checked(ToolbarAction::Italic, snapshot.italic);
        controls.set_checked(ToolbarAction::Underline, snapshot.underline);
        controls.set_checked(ToolbarAction::for_alignment(snapshot.alignment), true);
        trace!(?snapshot, "format controls synced");
    }
}
