use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{
    app::App,
    document::{html::to_html, model::ParagraphAlignment, txt::to_plain_text},
    editor::{
        clipboard::MimePayload,
        commands::Shortcut,
        cursor::Movement,
        inserter::{InsertOutcome, TextSurface},
    },
    print::PdfPrinter,
    ui::{
        dialog::ScriptedDialogs,
        toolbar::{ControlEvent, ToolbarAction},
    },
};

/// One line of input to the shell.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Open(PathBuf),
    Save,
    SaveAs(PathBuf),
    Print(PathBuf),
    Type(String),
    Newline,
    Drop(Vec<PathBuf>),
    PasteImage(PathBuf),
    Click(String),
    Keys(String),
    Font(String),
    Size(String),
    Bold,
    Italic,
    Underline,
    Align(ParagraphAlignment),
    Move { movement: Movement, select: bool },
    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
    SelectAll,
    Clear,
    Wrap,
    Title,
    Text,
    Html,
    Format,
    Help,
    Quit,
}

impl ShellCommand {
    /// Parses `verb [argument]`. Blank lines and `#` comments yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }
        let (verb, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
        let arg = rest.trim();
        let need_arg = |what: &str| {
            if arg.is_empty() {
                Err(format!("{verb}: missing {what}"))
            } else {
                Ok(arg.to_string())
            }
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "open" => Self::Open(need_arg("path")?.into()),
            "save" => Self::Save,
            "saveas" => Self::SaveAs(need_arg("path")?.into()),
            "print" => Self::Print(need_arg("path")?.into()),
            // keeps the text verbatim, including leading spaces
            "type" => Self::Type(rest.to_string()),
            "enter" => Self::Newline,
            "drop" => {
                let paths = split_paths(arg);
                if paths.is_empty() {
                    return Err("drop: missing paths".to_string());
                }
                Self::Drop(paths)
            }
            "paste-image" => Self::PasteImage(need_arg("path")?.into()),
            "click" => Self::Click(need_arg("button id")?),
            "keys" => Self::Keys(need_arg("key chord")?),
            "font" => Self::Font(need_arg("family")?),
            "size" => Self::Size(need_arg("size")?),
            "bold" => Self::Bold,
            "italic" => Self::Italic,
            "underline" => Self::Underline,
            "align" => Self::Align(
                ParagraphAlignment::from_css(arg).ok_or_else(|| format!("align: unknown alignment {arg:?}"))?,
            ),
            "move" | "select" => Self::Move {
                movement: parse_movement(arg).ok_or_else(|| format!("{verb}: unknown movement {arg:?}"))?,
                select: verb.eq_ignore_ascii_case("select"),
            },
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            "cut" => Self::Cut,
            "copy" => Self::Copy,
            "paste" => Self::Paste,
            "selectall" => Self::SelectAll,
            "clear" => Self::Clear,
            "wrap" => Self::Wrap,
            "title" => Self::Title,
            "text" => Self::Text,
            "html" => Self::Html,
            "format" => Self::Format,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command {other:?}")),
        };
        Ok(Some(command))
    }
}

/// Whitespace-separated paths; `"double quotes"` keep spaces.
fn split_paths(arg: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for ch in arg.chars() {
        match ch {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    paths.push(PathBuf::from(std::mem::take(&mut current)));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        paths.push(PathBuf::from(current));
    }
    paths
}

fn parse_movement(arg: &str) -> Option<Movement> {
    let movement = match arg.to_ascii_lowercase().as_str() {
        "left" => Movement::Left,
        "right" => Movement::Right,
        "up" => Movement::Up,
        "down" => Movement::Down,
        "home" => Movement::Home,
        "end" => Movement::End,
        "start" => Movement::DocumentStart,
        "finish" | "bottom" => Movement::DocumentEnd,
        _ => return None,
    };
    Some(movement)
}

const HELP: &str = "\
commands: open PATH | save | saveas PATH | print PDF | type TEXT | enter
          drop PATH... | paste-image PATH | click BUTTON | keys CHORD
          font FAMILY | size N | bold | italic | underline | align left|center|right|justify
          move|select left|right|up|down|home|end|start|finish
          undo | redo | cut | copy | paste | selectall | clear | wrap
          click close | keys ctrl+w
          title | text | html | format | help | quit";

/// Drives an [`App`] from text commands, standing in for a window's event
/// loop. File dialogs are answered by the paths given on the command line.
#[derive(Debug)]
pub struct Shell {
    pub app: App,
    pub dialogs: ScriptedDialogs,
    printer: PdfPrinter,
}

impl Shell {
    pub fn new(app: App) -> Self {
        Self {
            app,
            dialogs: ScriptedDialogs::default(),
            printer: PdfPrinter::new("notepad.pdf"),
        }
    }

    /// Reads commands until end of input, `quit`, or a close request.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            match ShellCommand::parse(&line) {
                Ok(Some(ShellCommand::Quit)) => break,
                Ok(Some(command)) => self.execute(command, &mut output)?,
                Ok(None) => {}
                Err(message) => {
                    debug!(%line, "rejected shell input");
                    writeln!(output, "? {message}")?;
                }
            }
            output.flush()?;
            if self.app.close_requested() {
                debug!("window closed");
                break;
            }
        }
        Ok(())
    }

    pub fn execute<W: Write>(&mut self, command: ShellCommand, output: &mut W) -> io::Result<()> {
        let app = &mut self.app;
        match command {
            ShellCommand::Open(path) => {
                if app.open_path(&path, &mut self.dialogs) {
                    writeln!(output, "{}", app.window_title())?;
                }
            }
            ShellCommand::Save => {
                app.file_save(&mut self.dialogs);
            }
            ShellCommand::SaveAs(path) => {
                self.dialogs.queue_save(path);
                if app.file_save_as(&mut self.dialogs) {
                    writeln!(output, "{}", app.window_title())?;
                }
            }
            ShellCommand::Print(path) => {
                self.printer.path = path;
                app.file_print(&mut self.printer, &mut self.dialogs);
            }
            ShellCommand::Type(text) => app.type_text(&text),
            ShellCommand::Newline => app.type_text("\n"),
            ShellCommand::Drop(paths) => {
                let paths = paths.iter().map(|p| absolute(p)).collect::<Vec<_>>();
                let outcome = app.insert_payload(&MimePayload::from_files(&paths));
                report_outcome(output, &outcome)?;
            }
            ShellCommand::PasteImage(path) => match fs::read(&path) {
                Ok(bytes) => {
                    app.clipboard.set(MimePayload::from_image(bytes));
                    let outcome = app.paste();
                    report_outcome(output, &outcome)?;
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "cannot read image for paste");
                    writeln!(output, "? {}: {err}", path.display())?;
                }
            },
            ShellCommand::Click(id) => match app.toolbar.action_for_id(&id) {
                Some(action) => {
                    app.toolbar.activate(action);
                    app.process_control_events(&mut self.dialogs, &mut self.printer);
                }
                None => writeln!(output, "? no button {id:?}")?,
            },
            ShellCommand::Keys(chord) => match Shortcut::from_keys(&chord) {
                Some(shortcut) => app.shortcut(shortcut, &mut self.dialogs, &mut self.printer),
                None => writeln!(output, "? unknown shortcut {chord:?}")?,
            },
            // The combos report their change like a user edit would.
            ShellCommand::Font(family) => {
                app.toolbar.set_font_family(&family);
                app.process_control_events(&mut self.dialogs, &mut self.printer);
            }
            ShellCommand::Size(size) => {
                app.toolbar.set_font_size_text(&size);
                app.process_control_events(&mut self.dialogs, &mut self.printer);
            }
            ShellCommand::Bold => app.toggle_bold(),
            ShellCommand::Italic => app.toggle_italic(),
            ShellCommand::Underline => app.toggle_underline(),
            ShellCommand::Align(alignment) => app.set_alignment(alignment),
            ShellCommand::Move { movement, select } => app.move_cursor(movement, select),
            ShellCommand::Undo => {
                app.undo();
            }
            ShellCommand::Redo => {
                app.redo();
            }
            ShellCommand::Cut => {
                app.cut();
            }
            ShellCommand::Copy => {
                app.copy();
            }
            ShellCommand::Paste => {
                let outcome = app.paste();
                report_outcome(output, &outcome)?;
            }
            ShellCommand::SelectAll => app.select_all(),
            ShellCommand::Clear => app.clear_all(),
            ShellCommand::Wrap => app.toggle_wrap(),
            ShellCommand::Title => writeln!(output, "{}", app.window_title())?,
            ShellCommand::Text => writeln!(output, "{}", to_plain_text(&app.doc))?,
            ShellCommand::Html => write!(output, "{}", to_html(&app.doc))?,
            ShellCommand::Format => {
                let toolbar = &app.toolbar;
                let mut flags = Vec::new();
                for (action, name) in [
                    (ToolbarAction::Bold, "bold"),
                    (ToolbarAction::Italic, "italic"),
                    (ToolbarAction::Underline, "underline"),
                    (ToolbarAction::WordWrap, "wrap"),
                ] {
                    if toolbar.is_checked(action) {
                        flags.push(name);
                    }
                }
                let alignment = toolbar
                    .checked_alignment()
                    .first()
                    .map(|a| a.css())
                    .unwrap_or("none");
                writeln!(
                    output,
                    "{} {}pt {} [{}]",
                    toolbar.font_family.current_text(),
                    toolbar.font_size.current_text(),
                    alignment,
                    flags.join(" ")
                )?;
            }
            ShellCommand::Help => writeln!(output, "{HELP}")?,
            ShellCommand::Quit => {}
        }

        for error in self.dialogs.take_errors() {
            writeln!(output, "! {}: {}", error.title, error.body)?;
        }
        if self.app.toolbar.has_pending_events() {
            // Controls written outside a sync scope; drain them so they are not replayed later.
            let events: Vec<ControlEvent> = self.app.toolbar.take_events();
            debug!(count = events.len(), "dropping stray control events");
        }
        Ok(())
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn report_outcome<W: Write>(output: &mut W, outcome: &InsertOutcome) -> io::Result<()> {
    match outcome {
        InsertOutcome::ImagesFromUrls(count) => writeln!(output, "inserted {count} image(s)"),
        InsertOutcome::ClipboardImage(key) => writeln!(output, "inserted image {key}"),
        InsertOutcome::Fallback => writeln!(output, "inserted text"),
        InsertOutcome::Nothing => writeln!(output, "nothing to insert"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::EditorConfig;

    fn run(shell: &mut Shell, script: &str) -> String {
        let mut out = Vec::new();
        shell.run(script.as_bytes(), &mut out).expect("run");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn parses_verbs_and_arguments() {
        assert_eq!(ShellCommand::parse("   "), Ok(None));
        assert_eq!(ShellCommand::parse("# note"), Ok(None));
        assert_eq!(ShellCommand::parse("type  two spaces"), Ok(Some(ShellCommand::Type(" two spaces".into()))));
        assert_eq!(
            ShellCommand::parse("align Center"),
            Ok(Some(ShellCommand::Align(ParagraphAlignment::Center)))
        );
        assert_eq!(
            ShellCommand::parse("select end"),
            Ok(Some(ShellCommand::Move {
                movement: Movement::End,
                select: true,
            }))
        );
        assert_eq!(
            ShellCommand::parse("drop /a.png \"/b c.png\""),
            Ok(Some(ShellCommand::Drop(vec!["/a.png".into(), "/b c.png".into()])))
        );
        assert!(ShellCommand::parse("saveas").is_err());
        assert!(ShellCommand::parse("frobnicate").is_err());
    }

    #[test]
    fn scripted_session_edits_and_saves() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("out.txt");
        let mut shell = Shell::new(App::new(EditorConfig::default()));

        let script = format!(
            "type hello\nenter\ntype world\nselectall\nclick bold\nformat\nsaveas {}\ntext\nquit\ntype ignored\n",
            target.display()
        );
        let out = run(&mut shell, &script);

        assert!(out.contains("Times 14pt left [bold wrap]"), "{out}");
        assert!(out.contains("out.txt - Notepad"), "{out}");
        assert!(out.contains("hello\nworld"), "{out}");
        assert_eq!(fs::read_to_string(&target).expect("read"), "hello\nworld");
    }

    #[test]
    fn failures_are_printed_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bad = dir.path().join("missing").join("x.html");
        let mut shell = Shell::new(App::new(EditorConfig::default()));

        let out = run(&mut shell, &format!("type x\nsaveas {}\nbogus\n", bad.display()));
        assert_eq!(out.matches("! Save failed").count(), 1, "{out}");
        assert!(out.contains("? unknown command"), "{out}");
        assert_eq!(shell.app.window_title(), "*Untitled - Notepad");
    }

    #[test]
    fn size_and_font_go_through_the_controls() {
        let mut shell = Shell::new(App::new(EditorConfig::default()));
        let out = run(&mut shell, "type abc\nselectall\nsize 22\nfont Arial\nformat\n");
        assert!(out.contains("Arial 22pt"), "{out}");
        assert!(!shell.app.toolbar.has_pending_events());
    }

    #[test]
    fn close_button_and_shortcut_end_the_session() {
        let mut shell = Shell::new(App::new(EditorConfig::default()));
        let out = run(&mut shell, "type kept\nkeys ctrl+w\ntype dropped\ntext\n");
        assert!(out.is_empty(), "{out}");
        assert_eq!(to_plain_text(&shell.app.doc), "kept");

        let mut shell = Shell::new(App::new(EditorConfig::default()));
        let out = run(&mut shell, "type a\nclick clear\ntext\nclick close\ntype b\n");
        assert_eq!(out, "\n");
        assert!(shell.app.close_requested());
        assert_eq!(to_plain_text(&shell.app.doc), "");
    }
}
