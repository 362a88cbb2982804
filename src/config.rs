//! Launcher configuration loaded from `config.toml`.
//!
//! Every section is optional; missing fields fall back to defaults.
//!
//! ```toml
//! [query]
//! typeahead = true
//! provider_timeout_ms = 2000
//!
//! [query.scoring]
//! usage_decay_days = 14
//!
//! [[static_providers]]
//! name = "power"
//! prefix = "!"
//! entries = [{ label = "Shutdown" }, { label = "Reboot" }]
//!
//! [[command_providers]]
//! name = "runner"
//! prefix = ">"
//! command = "compgen"
//! args = ["-c"]
//! ```

use lantern_query::{Entry, MatchingPolicy, QueryConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::app_dirs;
use crate::error::{LanternError, Result};

/// Top-level launcher configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanternConfig {
    pub query: QueryConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
    pub static_providers: Vec<StaticProviderConfig>,
    pub command_providers: Vec<CommandProviderConfig>,
}

/// Usage history persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Record activations and use them for ranking.
    pub enabled: bool,
    /// History file; defaults to `history.json` in the cache directory.
    pub path: Option<PathBuf>,
    /// Typeahead file; defaults to `typeahead.json` in the cache directory.
    pub typeahead_path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            typeahead_path: None,
        }
    }
}

impl HistoryConfig {
    pub fn history_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(app_dirs::history_file)
    }

    pub fn typeahead_path(&self) -> PathBuf {
        self.typeahead_path
            .clone()
            .unwrap_or_else(app_dirs::typeahead_file)
    }
}

/// Diagnostic logging. Output goes to stderr and optionally a daily file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub filter: String,
    /// Also write a daily-rotated log file.
    pub file: bool,
    /// Log directory; defaults to `logs/` in the data directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "lantern=info,lantern_query=info".into(),
            file: false,
            directory: None,
        }
    }
}

impl LoggingConfig {
    pub fn log_dir(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(app_dirs::logs_dir)
    }
}

/// One entry of a static provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticEntryConfig {
    pub label: String,
    /// History key; defaults to `provider:label`.
    pub identifier: Option<String>,
    pub subtitle: String,
    pub searchable: String,
    pub categories: Vec<String>,
    pub matching: MatchingPolicy,
    pub window_class: Option<String>,
}

impl StaticEntryConfig {
    /// Builds the engine entry for `provider`.
    pub fn to_entry(&self, provider: &str) -> Entry {
        let entry = match &self.identifier {
            Some(id) => Entry::with_identifier(provider, id.clone(), self.label.clone()),
            None => Entry::new(provider, self.label.clone()),
        };
        let entry = entry
            .subtitle(self.subtitle.clone())
            .searchable(self.searchable.clone())
            .categories(self.categories.iter().cloned())
            .matching(self.matching);
        match &self.window_class {
            Some(class) => entry.window_class(class.clone()),
            None => entry,
        }
    }
}

/// A provider with a fixed list of entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticProviderConfig {
    pub name: String,
    pub prefix: Option<char>,
    pub switcher_exclusive: bool,
    pub entries: Vec<StaticEntryConfig>,
}

/// A provider that runs a command and lists one entry per stdout line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandProviderConfig {
    pub name: String,
    pub prefix: Option<char>,
    pub switcher_exclusive: bool,
    pub command: String,
    pub args: Vec<String>,
    /// Append the query text as the last argument.
    pub pass_query: bool,
    pub matching: MatchingPolicy,
    /// Only match the first N words of the query; 0 matches all.
    pub match_field_limit: usize,
    /// Ignore any score already attached to the entries.
    pub recalculate_score: bool,
}

impl Default for CommandProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            prefix: None,
            switcher_exclusive: false,
            command: String::new(),
            args: Vec::new(),
            pass_query: false,
            matching: MatchingPolicy::Fuzzy,
            match_field_limit: 0,
            recalculate_score: false,
        }
    }
}

impl LanternConfig {
    /// Parses `path`; absent keys take their defaults.
    ///
    /// # Errors
    ///
    /// Fails when the file is unreadable or not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads `path` if given, otherwise the default config file if it exists.
    ///
    /// # Errors
    ///
    /// An explicitly named file that is missing or malformed is an error; a
    /// missing default file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = app_dirs::config_file();
                if default.exists() {
                    Self::from_file(&default)?
                } else {
                    tracing::debug!(path = %default.display(), "no config file; using defaults");
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Writes the config as TOML, creating missing parent directories.
    ///
    /// # Errors
    ///
    /// Fails on serialization or I/O errors.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Restricts every query to `modules`, replacing any configured allow-list.
    pub fn restrict_to(&mut self, modules: Vec<String>) {
        if !modules.is_empty() {
            self.query.allow_list = Some(modules);
        }
    }

    /// Validates the query settings and the provider definitions.
    pub fn validate(&self) -> Result<()> {
        self.query.validate()?;

        let names = self
            .static_providers
            .iter()
            .map(|p| p.name.as_str())
            .chain(self.command_providers.iter().map(|p| p.name.as_str()));
        let mut seen = std::collections::HashSet::new();
        for name in names {
            if name.trim().is_empty() {
                return Err(LanternError::Config("provider name must not be empty".into()));
            }
            if !seen.insert(name) {
                return Err(LanternError::Config(format!(
                    "provider `{name}` is defined more than once"
                )));
            }
        }

        if let Some(bad) = self
            .command_providers
            .iter()
            .find(|p| p.command.trim().is_empty())
        {
            return Err(LanternError::Config(format!(
                "command provider `{}` has no command",
                bad.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = LanternConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.history.enabled);
        assert_eq!(config.logging.filter, "lantern=info,lantern_query=info");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: LanternConfig = toml::from_str(
            r#"
            [query]
            typeahead = true

            [[command_providers]]
            name = "runner"
            prefix = ">"
            command = "compgen"
            args = ["-c"]
            "#,
        )
        .unwrap();
        assert!(config.query.typeahead);
        assert_eq!(config.query.provider_timeout_ms, 3_000);
        assert_eq!(config.command_providers[0].prefix, Some('>'));
        assert!(!config.command_providers[0].pass_query);
    }

    #[test]
    fn static_entry_builds_engine_entry() {
        let entry = StaticEntryConfig {
            label: "Shutdown".into(),
            categories: vec!["power".into()],
            matching: MatchingPolicy::AlwaysBottom,
            ..Default::default()
        }
        .to_entry("power");
        assert_eq!(entry.identifier(), "power:Shutdown");
        assert_eq!(entry.matching, MatchingPolicy::AlwaysBottom);
        assert_eq!(entry.categories, vec!["power"]);
    }

    #[test]
    fn duplicate_provider_names_rejected() {
        let config = LanternConfig {
            static_providers: vec![StaticProviderConfig {
                name: "power".into(),
                ..Default::default()
            }],
            command_providers: vec![CommandProviderConfig {
                name: "power".into(),
                command: "true".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn empty_command_rejected() {
        let config = LanternConfig {
            command_providers: vec![CommandProviderConfig {
                name: "runner".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn restrict_to_sets_allow_list() {
        let mut config = LanternConfig::default();
        config.restrict_to(Vec::new());
        assert!(config.query.allow_list.is_none());
        config.restrict_to(vec!["calc".into()]);
        assert_eq!(config.query.allow_list, Some(vec!["calc".to_string()]));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = LanternConfig::from_file(Path::new("/nonexistent/lantern.toml"));
        assert!(matches!(result, Err(LanternError::Io(_))));
    }
}
