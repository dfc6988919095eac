use std::{collections::VecDeque, path::PathBuf};

use crate::error::NotepadError;

/// Modal dialogs the window shell can show.
pub trait Dialogs {
    /// Asks for a file to open. `None` when the user cancels.
    fn open_file_name(&mut self) -> Option<PathBuf>;
    /// Asks for a save target. `None` when the user cancels.
    fn save_file_name(&mut self) -> Option<PathBuf>;
    fn critical(&mut self, error: &ErrorDialogState);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDialogKind {
    OpenFailed,
    SaveFailed,
    PrintFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDialogState {
    pub kind: ErrorDialogKind,
    pub title: String,
    pub body: String,
}

impl ErrorDialogState {
    pub fn new(kind: ErrorDialogKind, error: &NotepadError) -> Self {
        let title = match kind {
            ErrorDialogKind::OpenFailed => "Open failed",
            ErrorDialogKind::SaveFailed => "Save failed",
            ErrorDialogKind::PrintFailed => "Print failed",
        };
        Self {
            kind,
            title: title.to_string(),
            body: error.to_string(),
        }
    }
}

/// Answers dialogs from queued paths and records every critical message.
/// Drives the line shell and tests.
#[derive(Debug, Default)]
pub struct ScriptedDialogs {
    pub open_paths: VecDeque<PathBuf>,
    pub save_paths: VecDeque<PathBuf>,
    pub errors: Vec<ErrorDialogState>,
}

impl ScriptedDialogs {
    pub fn queue_open(&mut self, path: impl Into<PathBuf>) {
        self.open_paths.push_back(path.into());
    }

    pub fn queue_save(&mut self, path: impl Into<PathBuf>) {
        self.save_paths.push_back(path.into());
    }

    pub fn take_errors(&mut self) -> Vec<ErrorDialogState> {
        std::mem::take(&mut self.errors)
    }
}

impl Dialogs for ScriptedDialogs {
    fn open_file_name(&mut self) -> Option<PathBuf> {
        self.open_paths.pop_front()
    }

    fn save_file_name(&mut self) -> Option<PathBuf> {
        self.save_paths.pop_front()
    }

    fn critical(&mut self, error: &ErrorDialogState) {
        self.errors.push(error.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_answers_come_in_order_then_cancel() {
        let mut dialogs = ScriptedDialogs::default();
        dialogs.queue_save("a.txt");
        dialogs.queue_save("b.html");
        assert_eq!(dialogs.save_file_name(), Some(PathBuf::from("a.txt")));
        assert_eq!(dialogs.save_file_name(), Some(PathBuf::from("b.html")));
        assert_eq!(dialogs.save_file_name(), None);
        assert_eq!(dialogs.open_file_name(), None);
    }

    #[test]
    fn error_state_carries_the_failure_text() {
        let err = NotepadError::io(
            "/missing/x.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        let state = ErrorDialogState::new(ErrorDialogKind::SaveFailed, &err);
        assert_eq!(state.title, "Save failed");
        assert!(state.body.contains("/missing/x.txt"));
        assert!(state.body.contains("no such file"));
    }
}
