//! Application directory paths for Lantern.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! # Directory Layout
//!
//! | Purpose | Linux | macOS |
//! |---------|-------|-------|
//! | Data (history, logs) | `~/.local/share/lantern/` | `~/Library/Application Support/lantern/` |
//! | Config | `~/.config/lantern/` | `~/Library/Application Support/lantern/` |
//! | Cache | `~/.cache/lantern/` | `~/Library/Caches/lantern/` |
//!
//! Each root can be redirected with an environment variable:
//!
//! - `LANTERN_DATA_DIR` overrides [`data_dir`]
//! - `LANTERN_CONFIG_DIR` overrides [`config_dir`]
//! - `LANTERN_CACHE_DIR` overrides [`cache_dir`]

use std::path::PathBuf;

/// `$var` if set, else `base()/lantern`, else a temp-dir fallback.
fn resolve(var: &str, base: fn() -> Option<PathBuf>, fallback: &str) -> PathBuf {
    std::env::var_os(var)
        .map(PathBuf::from)
        .or_else(|| base().map(|d| d.join("lantern")))
        .unwrap_or_else(|| std::env::temp_dir().join(fallback))
}

/// Root for persistent data such as logs.
#[must_use]
pub fn data_dir() -> PathBuf {
    resolve("LANTERN_DATA_DIR", dirs::data_dir, "lantern-data")
}

/// Where `config.toml` lives.
#[must_use]
pub fn config_dir() -> PathBuf {
    resolve("LANTERN_CONFIG_DIR", dirs::config_dir, "lantern-config")
}

/// Usage history and typeahead state.
#[must_use]
pub fn cache_dir() -> PathBuf {
    resolve("LANTERN_CACHE_DIR", dirs::cache_dir, "lantern-cache")
}

/// `data_dir()/logs`.
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Default config file, `config_dir()/config.toml`.
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Usage history file (`cache_dir()/history.json`).
#[must_use]
pub fn history_file() -> PathBuf {
    cache_dir().join("history.json")
}

/// Typeahead query list (`cache_dir()/typeahead.json`).
#[must_use]
pub fn typeahead_file() -> PathBuf {
    cache_dir().join("typeahead.json")
}
