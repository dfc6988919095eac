use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    document::{
        self,
        model::{Document, Fragment, ParagraphAlignment, RunStyle},
    },
    editor::{
        EditEngine,
        FormatSnapshot,
        clipboard::{Clipboard, MimePayload},
        commands::{RunStylePatch, Shortcut},
        cursor::Movement,
        inserter::{ContentInserter, InsertOutcome, TextSurface},
    },
    print::Printer,
    settings::{EditorConfig, SettingsStore},
    ui::{
        LineWrapMode,
        dialog::{Dialogs, ErrorDialogKind, ErrorDialogState},
        sync::{FormatSynchronizer, NotificationBlocker},
        toolbar::{ControlEvent, ControlId, Toolbar, ToolbarAction},
    },
};

const APP_NAME: &str = "Notepad";
const UNTITLED: &str = "Untitled";

/// The main window's state: the document, its cursor and history, the
/// format controls and the file the document belongs to.
#[derive(Debug)]
pub struct App {
    pub doc: Document,
    pub engine: EditEngine,
    pub toolbar: Toolbar,
    pub clipboard: Clipboard,
    inserter: ContentInserter,
    config: EditorConfig,
    path: Option<PathBuf>,
    wrap_mode: LineWrapMode,
    settings: Option<SettingsStore>,
    close_requested: bool,
}

impl App {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_inserter(ContentInserter::new(config.clone()))
    }

    /// Builds the window around an existing inserter, e.g. one with a
    /// deterministic key source.
    pub fn with_inserter(inserter: ContentInserter) -> Self {
        let config = inserter.config().clone();
        let doc = Document::new(default_style(&config));
        let mut engine = EditEngine::default();
        engine.reset(&doc);

        let mut app = Self {
            doc,
            engine,
            toolbar: Toolbar::new(&config),
            clipboard: Clipboard::default(),
            inserter,
            wrap_mode: LineWrapMode::from_enabled(config.default_wrap),
            config,
            path: None,
            settings: None,
            close_requested: false,
        };
        app.update_format();
        app
    }

    /// Loads the editor configuration from `store` and keeps the store so
    /// that the wrap preference is written back on exit.
    pub fn with_settings(store: SettingsStore) -> Self {
        let config = EditorConfig::from_settings(store.settings());
        let mut app = Self::new(config);
        app.settings = Some(store);
        app
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn wrap_mode(&self) -> LineWrapMode {
        self.wrap_mode
    }

    pub fn settings_mut(&mut self) -> Option<&mut SettingsStore> {
        self.settings.as_mut()
    }

    /// Set once the user asked to close the window. The host ends its loop.
    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    pub fn close(&mut self) {
        info!(dirty = self.doc.dirty, "close requested");
        self.close_requested = true;
    }

    pub fn window_title(&self) -> String {
        let name = self
            .path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned());
        match name {
            Some(name) => format!("{name} - {APP_NAME}"),
            None => format!("*{UNTITLED} - {APP_NAME}"),
        }
    }

    pub fn format_snapshot(&self) -> FormatSnapshot {
        self.engine.format_snapshot(&self.doc)
    }

    /// Mirrors the cursor's format onto the controls. Runs after every
    /// selection change and every edit.
    pub fn update_format(&mut self) {
        let snapshot = self.format_snapshot();
        FormatSynchronizer::sync(&mut self.toolbar, &snapshot);
        self.refresh_actions();
    }

    fn refresh_actions(&mut self) {
        let has_selection = self.engine.cursor.has_selection();
        self.toolbar.set_enabled(ToolbarAction::Undo, self.engine.undo.can_undo());
        self.toolbar.set_enabled(ToolbarAction::Redo, self.engine.undo.can_redo());
        self.toolbar.set_enabled(ToolbarAction::Cut, has_selection);
        self.toolbar.set_enabled(ToolbarAction::Copy, has_selection);
    }

    pub fn on_selection_changed(&mut self) {
        self.update_format();
    }

    // File actions

    pub fn file_open(&mut self, dialogs: &mut dyn Dialogs) -> bool {
        match dialogs.open_file_name() {
            Some(path) => self.open_path(&path, dialogs),
            None => false,
        }
    }

    /// Loads `path` into the window. On failure the current document stays.
    pub fn open_path(&mut self, path: &Path, dialogs: &mut dyn Dialogs) -> bool {
        let base = default_style(&self.config);
        match document::load_document(path, &self.config, &base) {
            Ok(doc) => {
                self.doc = doc;
                self.engine.reset(&self.doc);
                self.path = Some(path.to_path_buf());
                self.update_format();
                true
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "open failed");
                dialogs.critical(&ErrorDialogState::new(ErrorDialogKind::OpenFailed, &err));
                false
            }
        }
    }

    pub fn file_save(&mut self, dialogs: &mut dyn Dialogs) -> bool {
        match self.path.clone() {
            Some(path) => self.save_to(&path, dialogs),
            None => self.file_save_as(dialogs),
        }
    }

    pub fn file_save_as(&mut self, dialogs: &mut dyn Dialogs) -> bool {
        let Some(path) = dialogs.save_file_name() else {
            debug!("save as cancelled");
            return false;
        };
        self.save_to(&path, dialogs)
    }

    /// Writes the document to `path`. The remembered path only changes once
    /// the write has succeeded.
    pub fn save_to(&mut self, path: &Path, dialogs: &mut dyn Dialogs) -> bool {
        match document::save_document(path, &self.doc, &self.config) {
            Ok(format) => {
                self.doc.dirty = false;
                self.doc.metadata.format = format;
                self.doc.metadata.file_path = Some(path.to_path_buf());
                self.path = Some(path.to_path_buf());
                true
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "save failed");
                dialogs.critical(&ErrorDialogState::new(ErrorDialogKind::SaveFailed, &err));
                false
            }
        }
    }

    pub fn file_print(&mut self, printer: &mut dyn Printer, dialogs: &mut dyn Dialogs) -> bool {
        let title = self
            .path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNTITLED.to_string());
        match printer.print(&self.doc, &title) {
            Ok(summary) => {
                info!(pages = summary.pages, "print finished");
                true
            }
            Err(err) => {
                warn!(error = %err, "print failed");
                dialogs.critical(&ErrorDialogState::new(ErrorDialogKind::PrintFailed, &err));
                false
            }
        }
    }

    // Edit actions

    pub fn type_text(&mut self, text: &str) {
        if self.engine.insert_text(&mut self.doc, text) {
            self.update_format();
        }
    }

    pub fn move_cursor(&mut self, movement: Movement, keep_anchor: bool) {
        self.engine.cursor.move_simple(&self.doc, movement, keep_anchor);
        self.engine.pending_format = None;
        self.on_selection_changed();
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.engine.undo(&mut self.doc);
        self.update_format();
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.engine.redo(&mut self.doc);
        self.update_format();
        changed
    }

    /// Puts the selection on the clipboard as plain text and HTML.
    pub fn copy(&mut self) -> bool {
        let Some(fragment) = self.engine.selected_fragment(&self.doc) else {
            return false;
        };
        self.clipboard.set(MimePayload::from_fragment(&fragment));
        true
    }

    pub fn cut(&mut self) -> bool {
        if !self.copy() {
            return false;
        }
        self.engine.delete_selection(&mut self.doc);
        self.update_format();
        true
    }

    pub fn paste(&mut self) -> InsertOutcome {
        let Some(payload) = self.clipboard.payload().cloned() else {
            return InsertOutcome::Nothing;
        };
        self.insert_payload(&payload)
    }

    pub fn select_all(&mut self) {
        self.engine.select_all(&self.doc);
        self.on_selection_changed();
    }

    pub fn clear_all(&mut self) {
        self.engine.replace_all(&mut self.doc, Fragment::default());
        self.update_format();
    }

    pub fn toggle_wrap(&mut self) {
        self.set_wrap(!self.wrap_mode.is_wrapping());
    }

    pub fn set_wrap(&mut self, enabled: bool) {
        self.wrap_mode = LineWrapMode::from_enabled(enabled);
        {
            let mut controls = NotificationBlocker::new(&mut self.toolbar, &[ControlId::WordWrap]);
            controls.set_checked(ToolbarAction::WordWrap, enabled);
        }
        if let Some(store) = self.settings.as_mut() {
            store.update(|settings| settings.editor.word_wrap = enabled);
        }
        debug!(mode = ?self.wrap_mode, "line wrap changed");
    }

    // Format actions

    pub fn set_font_family(&mut self, family: &str) {
        let family = family.trim();
        if family.is_empty() {
            self.update_format();
            return;
        }
        self.merge_format(RunStylePatch::font_family(family));
    }

    /// Applies a point size, clamped to the configured range.
    pub fn set_font_size(&mut self, size: f32) {
        if !size.is_finite() {
            self.update_format();
            return;
        }
        let min = *self.config.font_sizes.start() as f32;
        let max = *self.config.font_sizes.end() as f32;
        self.merge_format(RunStylePatch::font_size(size.clamp(min, max)));
    }

    pub fn set_bold(&mut self, bold: bool) {
        self.merge_format(RunStylePatch::bold(bold));
    }

    pub fn set_italic(&mut self, italic: bool) {
        self.merge_format(RunStylePatch::italic(italic));
    }

    pub fn set_underline(&mut self, underline: bool) {
        self.merge_format(RunStylePatch::underline(underline));
    }

    pub fn toggle_bold(&mut self) {
        let bold = self.format_snapshot().bold;
        self.set_bold(!bold);
    }

    pub fn toggle_italic(&mut self) {
        let italic = self.format_snapshot().italic;
        self.set_italic(!italic);
    }

    pub fn toggle_underline(&mut self) {
        let underline = self.format_snapshot().underline;
        self.set_underline(!underline);
    }

    pub fn set_alignment(&mut self, alignment: ParagraphAlignment) {
        self.engine.set_alignment(&mut self.doc, alignment);
        self.update_format();
    }

    fn merge_format(&mut self, patch: RunStylePatch) {
        self.engine.merge_char_format(&mut self.doc, &patch);
        self.update_format();
    }

    // Control events

    /// Drains the control notifications and runs the matching actions.
    /// Actions that need a dialog or a printer get them from the caller.
    pub fn process_control_events(&mut self, dialogs: &mut dyn Dialogs, printer: &mut dyn Printer) {
        loop {
            let events = self.toolbar.take_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                self.handle_control_event(event, dialogs, printer);
            }
        }
    }

    fn handle_control_event(&mut self, event: ControlEvent, dialogs: &mut dyn Dialogs, printer: &mut dyn Printer) {
        debug!(?event, "control event");
        match event {
            ControlEvent::FontFamilyChanged(family) => self.set_font_family(&family),
            ControlEvent::FontSizeChanged(text) => match text.trim().parse::<f32>() {
                Ok(size) => self.set_font_size(size),
                Err(_) => {
                    debug!(%text, "ignoring unparsable font size");
                    self.update_format();
                }
            },
            ControlEvent::Toggled { action, checked } => match action {
                ToolbarAction::Bold => self.set_bold(checked),
                ToolbarAction::Italic => self.set_italic(checked),
                ToolbarAction::Underline => self.set_underline(checked),
                ToolbarAction::WordWrap => self.set_wrap(checked),
                _ => {
                    if let (Some(alignment), true) = (action.alignment(), checked) {
                        self.set_alignment(alignment);
                    }
                }
            },
            ControlEvent::Triggered(action) => {
                self.trigger(action, dialogs, printer);
            }
        }
    }

    /// Runs a push-button action. Checkable actions are handled through
    /// their toggle notification.
    pub fn trigger(&mut self, action: ToolbarAction, dialogs: &mut dyn Dialogs, printer: &mut dyn Printer) {
        match action {
            ToolbarAction::Open => {
                self.file_open(dialogs);
            }
            ToolbarAction::Save => {
                self.file_save(dialogs);
            }
            ToolbarAction::SaveAs => {
                self.file_save_as(dialogs);
            }
            ToolbarAction::Print => {
                self.file_print(printer, dialogs);
            }
            ToolbarAction::Undo => {
                self.undo();
            }
            ToolbarAction::Redo => {
                self.redo();
            }
            ToolbarAction::Cut => {
                self.cut();
            }
            ToolbarAction::Copy => {
                self.copy();
            }
            ToolbarAction::Paste => {
                self.paste();
            }
            ToolbarAction::SelectAll => self.select_all(),
            ToolbarAction::ClearAll => self.clear_all(),
            ToolbarAction::Close => self.close(),
            ToolbarAction::Bold
            | ToolbarAction::Italic
            | ToolbarAction::Underline
            | ToolbarAction::AlignLeft
            | ToolbarAction::AlignCenter
            | ToolbarAction::AlignRight
            | ToolbarAction::AlignJustify
            | ToolbarAction::WordWrap => {}
        }
    }

    /// Keyboard shortcuts route through the same actions as the toolbar.
    pub fn shortcut(&mut self, shortcut: Shortcut, dialogs: &mut dyn Dialogs, printer: &mut dyn Printer) {
        match shortcut {
            Shortcut::Open => self.trigger(ToolbarAction::Open, dialogs, printer),
            Shortcut::Save => self.trigger(ToolbarAction::Save, dialogs, printer),
            Shortcut::SaveAs => self.trigger(ToolbarAction::SaveAs, dialogs, printer),
            Shortcut::Print => self.trigger(ToolbarAction::Print, dialogs, printer),
            Shortcut::Close => self.trigger(ToolbarAction::Close, dialogs, printer),
            Shortcut::Undo => self.trigger(ToolbarAction::Undo, dialogs, printer),
            Shortcut::Redo => self.trigger(ToolbarAction::Redo, dialogs, printer),
            Shortcut::Cut => self.trigger(ToolbarAction::Cut, dialogs, printer),
            Shortcut::Copy => self.trigger(ToolbarAction::Copy, dialogs, printer),
            Shortcut::Paste => self.trigger(ToolbarAction::Paste, dialogs, printer),
            Shortcut::SelectAll => self.trigger(ToolbarAction::SelectAll, dialogs, printer),
            Shortcut::Bold => self.toggle_bold(),
            Shortcut::Italic => self.toggle_italic(),
            Shortcut::Underline => self.toggle_underline(),
        }
    }
}

impl TextSurface for App {
    fn can_accept_payload(&self, payload: &MimePayload) -> bool {
        self.inserter.can_accept_payload(payload)
    }

    fn insert_payload(&mut self, payload: &MimePayload) -> InsertOutcome {
        let outcome = self
            .inserter
            .insert_payload(&mut self.doc, &mut self.engine, payload);
        if outcome != InsertOutcome::Nothing {
            self.update_format();
        }
        outcome
    }
}

fn default_style(config: &EditorConfig) -> RunStyle {
    RunStyle {
        font_family: Some(config.default_font_family.clone()),
        font_size: Some(config.default_font_size),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        document::txt::to_plain_text,
        editor::inserter::KeyGenerator,
        error::{NotepadError, Result},
        print::PrintSummary,
        ui::dialog::ScriptedDialogs,
    };

    #[derive(Default)]
    struct RecordingPrinter {
        titles: Vec<String>,
        fail: bool,
    }

    impl Printer for RecordingPrinter {
        fn print(&mut self, _doc: &Document, title: &str) -> Result<PrintSummary> {
            if self.fail {
                return Err(NotepadError::Print("printer offline".into()));
            }
            self.titles.push(title.to_string());
            Ok(PrintSummary { pages: 1 })
        }
    }

    fn app_with_text(text: &str) -> App {
        let mut app = App::new(EditorConfig::default());
        app.type_text(text);
        app
    }

    #[test]
    fn new_window_is_untitled_in_the_default_font() {
        let app = App::new(EditorConfig::default());
        assert_eq!(app.window_title(), "*Untitled - Notepad");
        assert_eq!(app.toolbar.font_family.current_text(), "Times");
        assert_eq!(app.toolbar.font_size.current_text(), "14");
        assert!(app.wrap_mode().is_wrapping());
        assert!(!app.toolbar.has_pending_events());
    }

    #[test]
    fn save_dispatches_on_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = app_with_text("hello");
        app.select_all();
        app.set_bold(true);
        let mut dialogs = ScriptedDialogs::default();

        let html = dir.path().join("page.HTML");
        assert!(app.save_to(&html, &mut dialogs));
        let written = fs::read_to_string(&html).expect("read html");
        assert!(written.contains("<html"));
        assert!(written.contains("hello"));

        let txt = dir.path().join("notes.txt");
        assert!(app.save_to(&txt, &mut dialogs));
        assert_eq!(fs::read_to_string(&txt).expect("read txt"), "hello");

        let bare = dir.path().join("README");
        assert!(app.save_to(&bare, &mut dialogs));
        assert_eq!(fs::read_to_string(&bare).expect("read bare"), "hello");

        assert_eq!(app.window_title(), "README - Notepad");
        assert!(dialogs.take_errors().is_empty());
    }

    #[test]
    fn failed_save_reports_once_and_keeps_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = app_with_text("keep me");
        let mut dialogs = ScriptedDialogs::default();
        let good = dir.path().join("good.txt");
        assert!(app.save_to(&good, &mut dialogs));
        app.type_text("!");
        let before = app.doc.clone();

        dialogs.queue_save(dir.path().join("missing").join("bad.html"));
        assert!(!app.file_save_as(&mut dialogs));

        let errors = dialogs.take_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorDialogKind::SaveFailed);
        assert_eq!(app.path(), Some(good.as_path()));
        assert_eq!(app.doc, before);
        assert_eq!(app.window_title(), "good.txt - Notepad");
    }

    #[test]
    fn save_without_a_path_asks_and_cancel_does_nothing() {
        let mut app = app_with_text("draft");
        let mut dialogs = ScriptedDialogs::default();

        assert!(!app.file_save(&mut dialogs));
        assert!(app.path().is_none());
        assert!(app.doc.dirty);
        assert!(dialogs.take_errors().is_empty());
    }

    #[test]
    fn open_replaces_document_and_resets_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("in.txt");
        fs::write(&path, "first\nsecond").expect("write");

        let mut app = app_with_text("old");
        let mut dialogs = ScriptedDialogs::default();
        dialogs.queue_open(&path);
        assert!(app.file_open(&mut dialogs));

        assert_eq!(to_plain_text(&app.doc), "first\nsecond");
        assert_eq!(app.window_title(), "in.txt - Notepad");
        assert!(!app.engine.undo.can_undo());
        assert!(!app.undo());
    }

    #[test]
    fn failed_open_keeps_the_current_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = app_with_text("stay");
        let mut dialogs = ScriptedDialogs::default();
        dialogs.queue_open(dir.path().join("nope.txt"));

        assert!(!app.file_open(&mut dialogs));
        assert_eq!(dialogs.take_errors().len(), 1);
        assert_eq!(to_plain_text(&app.doc), "stay");
        assert!(app.path().is_none());
    }

    #[test]
    fn print_uses_file_name_and_reports_failures() {
        let mut app = app_with_text("x");
        let mut dialogs = ScriptedDialogs::default();
        let mut printer = RecordingPrinter::default();
        assert!(app.file_print(&mut printer, &mut dialogs));
        assert_eq!(printer.titles, vec!["Untitled"]);

        printer.fail = true;
        assert!(!app.file_print(&mut printer, &mut dialogs));
        let errors = dialogs.take_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorDialogKind::PrintFailed);
    }

    #[test]
    fn selection_change_syncs_controls_silently() {
        let mut app = app_with_text("ab");
        app.select_all();
        app.set_bold(true);
        app.set_alignment(ParagraphAlignment::Center);
        app.toolbar.take_events();

        app.move_cursor(Movement::DocumentStart, false);
        app.move_cursor(Movement::Right, false);

        assert!(app.toolbar.is_checked(ToolbarAction::Bold));
        assert_eq!(app.toolbar.checked_alignment(), vec![ParagraphAlignment::Center]);
        assert!(!app.toolbar.has_pending_events());
    }

    #[test]
    fn toolbar_clicks_format_the_selection() {
        let mut app = app_with_text("word");
        app.select_all();
        let mut dialogs = ScriptedDialogs::default();
        let mut printer = RecordingPrinter::default();

        app.toolbar.activate(ToolbarAction::Italic);
        app.toolbar.activate(ToolbarAction::AlignRight);
        app.toolbar.set_font_size_text("20");
        app.process_control_events(&mut dialogs, &mut printer);

        let snapshot = app.format_snapshot();
        assert!(snapshot.italic);
        assert_eq!(snapshot.point_size, 20.0);
        assert_eq!(snapshot.alignment, ParagraphAlignment::Right);
        assert!(!app.toolbar.has_pending_events());
    }

    #[test]
    fn font_size_is_clamped_and_garbage_is_ignored() {
        let mut app = app_with_text("a");
        app.select_all();
        app.set_font_size(1000.0);
        assert_eq!(app.format_snapshot().point_size, 288.0);

        let mut dialogs = ScriptedDialogs::default();
        let mut printer = RecordingPrinter::default();
        app.toolbar.set_font_size_text("big");
        app.process_control_events(&mut dialogs, &mut printer);
        assert_eq!(app.toolbar.font_size.current_text(), "288");
    }

    #[test]
    fn copy_then_paste_duplicates_the_selection() {
        let mut app = app_with_text("dup");
        app.select_all();
        assert!(app.copy());
        app.move_cursor(Movement::DocumentEnd, false);
        assert_eq!(app.paste(), InsertOutcome::Fallback);
        assert_eq!(to_plain_text(&app.doc), "dupdup");
    }

    #[test]
    fn cut_and_clear_remove_text_undoably() {
        let mut app = app_with_text("gone");
        assert!(!app.cut());
        app.select_all();
        assert!(app.cut());
        assert_eq!(to_plain_text(&app.doc), "");
        assert!(app.undo());
        assert_eq!(to_plain_text(&app.doc), "gone");

        app.clear_all();
        assert_eq!(to_plain_text(&app.doc), "");
        assert!(app.undo());
        assert_eq!(to_plain_text(&app.doc), "gone");
    }

    #[test]
    fn wrap_toggle_mirrors_the_action_without_feedback() {
        let mut app = App::new(EditorConfig::default());
        app.toggle_wrap();
        assert_eq!(app.wrap_mode(), LineWrapMode::NoWrap);
        assert!(!app.toolbar.is_checked(ToolbarAction::WordWrap));
        assert!(!app.toolbar.has_pending_events());

        let mut dialogs = ScriptedDialogs::default();
        let mut printer = RecordingPrinter::default();
        app.toolbar.activate(ToolbarAction::WordWrap);
        app.process_control_events(&mut dialogs, &mut printer);
        assert_eq!(app.wrap_mode(), LineWrapMode::WidgetWidth);
    }

    #[test]
    fn pasted_images_use_the_injected_key_source() {
        struct Counter(u32);
        impl KeyGenerator for Counter {
            fn next_key(&mut self) -> String {
                self.0 += 1;
                format!("img-{}", self.0)
            }
        }

        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(2, 2)
            .write_to(&mut png, image::ImageFormat::Png)
            .expect("encode");
        let inserter = ContentInserter::with_keys(EditorConfig::default(), Box::new(Counter(0)));
        let mut app = App::with_inserter(inserter);

        let outcome = app.insert_payload(&MimePayload::from_image(png.into_inner()));
        assert_eq!(outcome, InsertOutcome::ClipboardImage("img-1".into()));
        assert!(app.undo());
        assert_eq!(app.doc.image_count(), 0);
        assert!(app.doc.resource("img-1").is_some());
    }

    #[test]
    fn wrap_preference_is_kept_in_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SettingsStore::with_path(dir.path().join("settings.json"));
        let mut app = App::with_settings(store);
        app.toggle_wrap();

        let store = app.settings_mut().expect("store");
        assert!(!store.settings().editor.word_wrap);
        assert!(store.has_pending_write());
    }

    #[test]
    fn select_all_and_clear_buttons_edit_the_document() {
        let mut app = app_with_text("wipe me");
        let mut dialogs = ScriptedDialogs::default();
        let mut printer = RecordingPrinter::default();

        app.toolbar.activate(ToolbarAction::SelectAll);
        app.process_control_events(&mut dialogs, &mut printer);
        assert!(app.engine.cursor.has_selection());
        assert!(app.toolbar.button(ToolbarAction::Copy).is_some_and(|b| b.enabled));

        app.toolbar.activate(ToolbarAction::ClearAll);
        app.process_control_events(&mut dialogs, &mut printer);
        assert_eq!(to_plain_text(&app.doc), "");
        assert!(app.undo());
        assert_eq!(to_plain_text(&app.doc), "wipe me");
    }

    #[test]
    fn close_from_button_or_shortcut_asks_the_host_to_exit() {
        let mut dialogs = ScriptedDialogs::default();
        let mut printer = RecordingPrinter::default();

        let mut clicked = App::new(EditorConfig::default());
        assert!(!clicked.close_requested());
        clicked.toolbar.activate(ToolbarAction::Close);
        clicked.process_control_events(&mut dialogs, &mut printer);
        assert!(clicked.close_requested());

        let mut typed = App::new(EditorConfig::default());
        let shortcut = Shortcut::from_keys("ctrl+w").expect("close shortcut");
        typed.shortcut(shortcut, &mut dialogs, &mut printer);
        assert!(typed.close_requested());
        assert!(dialogs.take_errors().is_empty());
    }
}
