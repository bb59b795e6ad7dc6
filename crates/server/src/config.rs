use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

pub const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    /// Capacity of the push broadcast channel.
    pub event_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8443".into(),
            database_url: "sqlite://./data/server.db".into(),
            event_capacity: 256,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    database_url: Option<String>,
    event_capacity: Option<usize>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file_settings(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file_settings(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<FileSettings>(raw) {
        Ok(cfg) => cfg,
        Err(error) => {
            warn!(%error, file = SETTINGS_FILE, "ignoring unreadable settings file");
            return;
        }
    };
    if let Some(v) = file_cfg.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.event_capacity {
        settings.event_capacity = v;
    }
}

/// Later keys win, so `APP__*` beats the short names.
fn apply_env_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    for key in ["SERVER_BIND", "APP__BIND_ADDR"] {
        if let Some(v) = var(key) {
            settings.server_bind = v;
        }
    }
    for key in ["DATABASE_URL", "APP__DATABASE_URL"] {
        if let Some(v) = var(key) {
            settings.database_url = v;
        }
    }
    if let Some(v) = var("APP__EVENT_CAPACITY") {
        match v.parse::<usize>() {
            Ok(parsed) if parsed > 0 => settings.event_capacity = parsed,
            _ => warn!(value = %v, "ignoring invalid APP__EVENT_CAPACITY"),
        }
    }
}

const MEMORY_URL: &str = "sqlite::memory:";

/// Normalizes `raw` into a sqlx sqlite url and creates the directory the
/// database file lives in.
pub fn prepare_database_url(raw: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw);
    if let Some(dir) = sqlite_file(&database_url).as_deref().and_then(Path::parent) {
        fs::create_dir_all(dir).with_context(|| {
            format!("failed to create database directory '{}'", dir.display())
        })?;
    }
    Ok(database_url)
}

/// Bare paths become `sqlite://` urls. Windows drive paths take the single
/// colon form (`sqlite:C:/..`) since sqlx reads `sqlite://C:` as a host.
fn normalize_database_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return Settings::default().database_url;
    }
    if raw.starts_with(MEMORY_URL) {
        return raw.to_string();
    }

    let path = match raw.strip_prefix("sqlite://") {
        Some(path) if is_windows_drive_path(path) => path,
        Some(_) => return raw.to_string(),
        None if raw.contains("://") => return raw.to_string(),
        None => raw.strip_prefix("sqlite:").unwrap_or(raw),
    };
    let path = path.replace('\\', "/");
    if is_windows_drive_path(&path) {
        format!("sqlite:{path}")
    } else {
        format!("sqlite://{path}")
    }
}

fn is_windows_drive_path(path: &str) -> bool {
    let mut chars = path.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(drive), Some(':'), Some('/' | '\\')) if drive.is_ascii_alphabetic()
    )
}

fn sqlite_file(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with(MEMORY_URL) {
        return None;
    }
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    rest.split('?')
        .next()
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
