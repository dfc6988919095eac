pub mod app;
pub mod document;
pub mod editor;
pub mod error;
pub mod logging;
pub mod print;
pub mod settings;
pub mod shell;
pub mod ui;

pub use app::App;
pub use error::{NotepadError, Result};
