//! CLI smoke entry point.
//!
//! # Responsibility
//! - Wire config, logging, storage, identity and the notes screen end-to-end
//!   without the Flutter shell.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `pocketnotes_cli [config.toml]`. Without a config the database
//! lives in memory.

use pocketnotes_core::{
    init_logging_from_config, App, AppConfig, LoginMsg, NotesMsg, RegisterMsg, Route, UiEvent,
};
use std::process::ExitCode;

const SMOKE_EMAIL: &str = "smoke@pocketnotes.local";
const SMOKE_PASSWORD: &str = "smoke-password";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("pocketnotes smoke failed: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    println!("pocketnotes_core ping={}", pocketnotes_core::ping());
    println!("pocketnotes_core version={}", pocketnotes_core::core_version());

    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load(&path).map_err(|err| err.to_string())?,
        None => AppConfig::default(),
    }
    .with_env_overrides()
    .map_err(|err| err.to_string())?;

    if init_logging_from_config(&config.logging)? {
        println!("logging level={}", config.logging.level);
    }

    let mut app = App::open(&config).map_err(|err| err.to_string())?;

    app.dispatch(UiEvent::Login(LoginMsg::OpenRegister));
    app.dispatch(UiEvent::Register(RegisterMsg::EmailChanged(
        SMOKE_EMAIL.to_string(),
    )));
    app.dispatch(UiEvent::Register(RegisterMsg::PasswordChanged(
        SMOKE_PASSWORD.to_string(),
    )));
    app.dispatch(UiEvent::Register(RegisterMsg::Submit));
    // A reused database already has the account; the duplicate dialog is fine.
    if app.route() != &Route::Login {
        app.dispatch(UiEvent::Register(RegisterMsg::BackToLogin));
    }
    app.take_dialogs();

    app.dispatch(UiEvent::Login(LoginMsg::EmailChanged(SMOKE_EMAIL.to_string())));
    app.dispatch(UiEvent::Login(LoginMsg::PasswordChanged(
        SMOKE_PASSWORD.to_string(),
    )));
    app.dispatch(UiEvent::Login(LoginMsg::Submit));
    if !matches!(app.route(), Route::Home { .. }) {
        return Err(describe_dialogs(&mut app, "login did not reach home"));
    }

    app.dispatch(UiEvent::Notes(NotesMsg::OpenAdd));
    app.dispatch(UiEvent::Notes(NotesMsg::TitleChanged("Smoke".to_string())));
    app.dispatch(UiEvent::Notes(NotesMsg::ContentChanged(
        "written by pocketnotes_cli".to_string(),
    )));
    app.dispatch(UiEvent::Notes(NotesMsg::Save));

    let notes = app
        .notes_screen()
        .map(|screen| screen.notes.len())
        .unwrap_or_default();
    if notes == 0 {
        return Err(describe_dialogs(&mut app, "saved note is not listed"));
    }
    println!("route={} notes={notes}", app.route().name());

    app.dispatch(UiEvent::Notes(NotesMsg::Logout));
    println!("route={}", app.route().name());
    Ok(())
}

fn describe_dialogs(app: &mut App, context: &str) -> String {
    let messages = app
        .take_dialogs()
        .into_iter()
        .map(|dialog| format!("{}: {}", dialog.title, dialog.message))
        .collect::<Vec<_>>();
    if messages.is_empty() {
        context.to_string()
    } else {
        format!("{context} ({})", messages.join("; "))
    }
}
