use std::{io, path::PathBuf, process::ExitCode};

use notepad::{App, logging, settings::SettingsStore, shell::Shell};
use tracing::{info, warn};

fn main() -> ExitCode {
    logging::init();

    let store = SettingsStore::load();
    info!(settings = %store.path().display(), "starting");
    let mut shell = Shell::new(App::with_settings(store));

    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        let opened = shell.app.open_path(&path, &mut shell.dialogs);
        for error in shell.dialogs.take_errors() {
            eprintln!("{}: {}", error.title, error.body);
        }
        if opened {
            println!("{}", shell.app.window_title());
        }
    }

    let result = shell.run(io::stdin().lock(), io::stdout().lock());

    if let Some(store) = shell.app.settings_mut() {
        if let Err(err) = store.flush() {
            warn!(error = %err, "could not write settings");
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("notepad: {err}");
            ExitCode::FAILURE
        }
    }
}
