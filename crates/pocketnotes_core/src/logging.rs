//! Rolling file logs for the app core.
//!
//! # Responsibility
//! - Start the `flexi_logger` backend exactly once per process.
//! - Keep log lines metadata-only: no passwords, emails, titles or bodies.
//!
//! # Invariants
//! - A second init with the same level and directory is a no-op.
//! - A second init with a different level or directory is rejected.
//! - Nothing in here panics.

use crate::config::LoggingConfig;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Once;

const LOG_FILE_BASENAME: &str = "pocketnotes";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 4 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: Once = Once::new();

/// Validated `level + dir` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    level: &'static str,
    dir: PathBuf,
}

impl LogSettings {
    fn parse(level: &str, log_dir: &str) -> Result<Self, String> {
        Ok(Self {
            level: parse_level(level)?,
            dir: parse_log_dir(log_dir)?,
        })
    }

    /// `Ok` when `self` asks for exactly what is already running.
    fn matches_active(&self, active: &LogSettings) -> Result<(), String> {
        if active.dir != self.dir {
            return Err(format!(
                "logging already initialized at `{}`; refusing to switch to `{}`",
                active.dir.display(),
                self.dir.display()
            ));
        }
        if active.level != self.level {
            return Err(format!(
                "logging already initialized with level `{}`; refusing to switch to `{}`",
                active.level, self.level
            ));
        }
        Ok(())
    }
}

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

/// Starts rolling file logs under `log_dir` at `level`.
///
/// `level` is one of `trace|debug|info|warn|error` (`warning` is accepted),
/// `log_dir` must be absolute and is created when missing.
///
/// # Errors
/// Returns a readable message for an unknown level, a bad directory, a
/// backend start failure, or a conflicting re-init.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    let requested = LogSettings::parse(level, log_dir)?;

    if let Some(active) = ACTIVE.get() {
        return requested.matches_active(&active.settings);
    }

    // Two racing first calls: the loser compares against the winner below.
    let active = ACTIVE.get_or_try_init(|| start_backend(requested.clone()))?;
    requested.matches_active(&active.settings)
}

/// Starts file logging from config. A config without `dir` leaves logging off.
///
/// Returns whether file logging is active afterwards.
pub fn init_logging_from_config(config: &LoggingConfig) -> Result<bool, String> {
    let Some(dir) = config.dir.as_deref() else {
        return Ok(false);
    };
    let dir = dir
        .to_str()
        .ok_or_else(|| format!("log_dir is not valid UTF-8: `{}`", dir.display()))?;
    init_logging(&config.level, dir)?;
    Ok(true)
}

/// Active `(level, dir)`, if logging was started.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE
        .get()
        .map(|active| (active.settings.level, active.settings.dir.clone()))
}

/// `debug` in debug builds, `info` in release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_backend(settings: LogSettings) -> Result<ActiveLogger, String> {
    std::fs::create_dir_all(&settings.dir).map_err(|err| {
        format!(
            "failed to create log directory `{}`: {err}",
            settings.dir.display()
        )
    })?;

    let handle = Logger::try_with_str(settings.level)
        .map_err(|err| format!("invalid log level `{}`: {err}", settings.level))?
        .log_to_file(
            FileSpec::default()
                .directory(settings.dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    PANIC_HOOK.call_once(install_panic_hook);

    info!(
        "event=core_start module=core status=ok platform={} version={} debug={}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION"),
        cfg!(debug_assertions)
    );
    info!(
        "event=logging_init module=core status=ok level={} log_dir={}",
        settings.level,
        settings.dir.display()
    );

    Ok(ActiveLogger {
        settings,
        _handle: handle,
    })
}

fn parse_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn parse_log_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log_dir cannot be empty".to_string());
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(format!("log_dir must be an absolute path, got `{trimmed}`"));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook() {
    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Payload may carry note text: single line, capped length.
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location,
            single_line(&payload, MAX_PANIC_PAYLOAD_CHARS)
        );
        previous_hook(panic_info);
    }));
}

fn single_line(value: &str, max_chars: usize) -> String {
    let flattened = value.replace(['\n', '\r'], " ");
    let mut clipped = flattened.chars().take(max_chars).collect::<String>();
    if flattened.chars().count() > max_chars {
        clipped.push_str("...");
    }
    clipped
}

#[cfg(test)]
mod tests {
    use super::{
        init_logging, init_logging_from_config, logging_status, parse_level, parse_log_dir,
        single_line, LogSettings,
    };
    use crate::config::LoggingConfig;
    use std::path::PathBuf;

    fn scratch_dir(suffix: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "pocketnotes-logging-{suffix}-{}-{}",
            std::process::id(),
            uuid::Uuid::new_v4()
        ))
    }

    #[test]
    fn parse_level_accepts_known_values() {
        assert_eq!(parse_level("INFO").unwrap(), "info");
        assert_eq!(parse_level(" warning ").unwrap(), "warn");
        assert!(parse_level("verbose").is_err());
    }

    #[test]
    fn parse_log_dir_rejects_relative_and_empty_paths() {
        assert!(parse_log_dir("logs/dev").unwrap_err().contains("absolute"));
        assert!(parse_log_dir("  ").is_err());
    }

    #[test]
    fn settings_conflict_names_the_changed_part() {
        let active = LogSettings {
            level: "info",
            dir: PathBuf::from("/var/log/pocketnotes"),
        };
        let other_level = LogSettings {
            level: "debug",
            ..active.clone()
        };
        assert!(other_level.matches_active(&active).unwrap_err().contains("level"));
        assert!(active.matches_active(&active).is_ok());
    }

    #[test]
    fn config_without_dir_leaves_logging_off() {
        let config = LoggingConfig {
            level: "info".to_string(),
            dir: None,
        };
        assert_eq!(init_logging_from_config(&config), Ok(false));
    }

    #[test]
    fn single_line_removes_newlines_and_truncates() {
        let flattened = single_line("line1\nline2\rline3", 8);
        assert!(!flattened.contains('\n'));
        assert!(!flattened.contains('\r'));
        assert!(flattened.ends_with("..."));
    }

    #[test]
    fn init_logging_is_idempotent_for_same_config_and_rejects_conflicts() {
        let log_dir = scratch_dir("idempotent");
        let log_dir_str = log_dir.to_str().unwrap().to_string();
        let second_dir = scratch_dir("different");

        init_logging("info", &log_dir_str).unwrap();
        init_logging("INFO", &log_dir_str).unwrap();

        let level_error = init_logging("debug", &log_dir_str).unwrap_err();
        assert!(level_error.contains("refusing to switch"));

        let dir_error = init_logging("info", second_dir.to_str().unwrap()).unwrap_err();
        assert!(dir_error.contains("refusing to switch"));

        let config = LoggingConfig {
            level: "info".to_string(),
            dir: Some(log_dir.clone()),
        };
        assert_eq!(init_logging_from_config(&config), Ok(true));

        let (active_level, active_dir) = logging_status().unwrap();
        assert_eq!(active_level, "info");
        assert_eq!(active_dir, log_dir);
    }
}
