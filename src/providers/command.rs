//! Provider that lists the stdout lines of an external command.
//!
//! The child is killed if the provider future is dropped, which is what
//! happens when the dispatcher times it out or the cycle is superseded.

use async_trait::async_trait;
use lantern_query::{Entry, Provider, ProviderError};
use std::process::Stdio;
use tokio::process::Command;

use crate::config::CommandProviderConfig;

/// Runs `command args... [query]` and turns each non-blank output line into an entry.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    config: CommandProviderConfig,
}

impl CommandProvider {
    pub fn new(config: CommandProviderConfig) -> Self {
        Self { config }
    }

    fn to_entry(&self, line: &str) -> Entry {
        let mut entry = Entry::new(self.config.name.as_str(), line).matching(self.config.matching);
        entry.match_field_limit = self.config.match_field_limit;
        entry.recalculate_score = self.config.recalculate_score;
        entry
    }
}

#[async_trait]
impl Provider for CommandProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn prefix(&self) -> Option<char> {
        self.config.prefix
    }

    fn switcher_exclusive(&self) -> bool {
        self.config.switcher_exclusive
    }

    async fn entries(&self, query: &str) -> Result<Vec<Entry>, ProviderError> {
        let mut command = Command::new(&self.config.command);
        command
            .args(&self.config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if self.config.pass_query {
            command.arg(query);
        }

        let output = command.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Failed(format!(
                "`{}` exited with {}: {}",
                self.config.command,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let entries: Vec<Entry> = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| self.to_entry(line))
            .collect();
        tracing::debug!(provider = %self.config.name, count = entries.len(), "command listed entries");
        Ok(entries)
    }
}
