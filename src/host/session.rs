//! One launcher session: the dispatcher plus activation bookkeeping.

use chrono::Utc;
use lantern_query::{Dispatcher, History, NoHistory, ProviderRegistry, TypeaheadStore};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::LanternConfig;
use crate::error::Result;
use crate::host::contract::{HostCommand, HostEvent};
use crate::presenter::JsonLinesPresenter;
use crate::store::{self, HistoryStore};

/// Whether the host loop should keep reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Owns the dispatcher and the persistent state touched by activations.
pub struct LauncherSession {
    dispatcher: Dispatcher,
    presenter: Arc<JsonLinesPresenter>,
    history: Option<HistoryStore>,
    typeahead: Arc<TypeaheadStore>,
    typeahead_path: Option<PathBuf>,
    query: String,
}

impl LauncherSession {
    /// Loads history and typeahead state and builds the dispatcher.
    ///
    /// # Errors
    ///
    /// Fails on invalid query configuration or outside a Tokio runtime.
    pub fn new(
        config: &LanternConfig,
        registry: ProviderRegistry,
        presenter: Arc<JsonLinesPresenter>,
    ) -> Result<Self> {
        let history = config
            .history
            .enabled
            .then(|| HistoryStore::load(config.history.history_path()));
        let engine_history: Arc<dyn History> = match &history {
            Some(store) => store.memory(),
            None => Arc::new(NoHistory),
        };

        let typeahead_path = (config.history.enabled && config.query.typeahead)
            .then(|| config.history.typeahead_path());
        let typeahead = Arc::new(match &typeahead_path {
            Some(path) => store::load_typeahead(path),
            None => TypeaheadStore::new(),
        });

        let dispatcher = Dispatcher::new(
            registry,
            engine_history,
            Arc::clone(&presenter) as Arc<dyn lantern_query::Presenter>,
            config.query.clone(),
        )?
        .with_typeahead(Arc::clone(&typeahead));

        tracing::info!(
            providers = ?dispatcher.registry().names(),
            history = history.is_some(),
            "launcher session ready"
        );

        Ok(Self {
            dispatcher,
            presenter,
            history,
            typeahead,
            typeahead_path,
            query: String::new(),
        })
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Applies one front-end command.
    pub fn handle(&mut self, command: HostCommand) -> Flow {
        match command {
            HostCommand::Query { text } => {
                self.dispatcher.submit(&text);
                self.query = text;
            }
            HostCommand::Pin { provider } => match self.dispatcher.pin(&provider) {
                Ok(_) => self.query.clear(),
                Err(e) => self.presenter.emit(HostEvent::Error {
                    message: e.to_string(),
                }),
            },
            HostCommand::Unpin => {
                self.dispatcher.unpin(&self.query);
            }
            HostCommand::Clear => {
                self.query.clear();
                self.dispatcher.clear();
            }
            HostCommand::Activate { index } => self.activate(index),
            HostCommand::ResetHistory => {
                if let Some(history) = &self.history {
                    history.reset();
                }
                self.persist();
            }
            HostCommand::ClearTypeahead => {
                self.typeahead.clear();
                tracing::info!("typeahead queries cleared");
                self.persist();
            }
            HostCommand::Stop => {
                self.dispatcher.clear();
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    fn activate(&mut self, index: usize) {
        let Some(entry) = self.presenter.entry_at(index) else {
            self.presenter.emit(HostEvent::Error {
                message: format!("no entry at index {index}"),
            });
            return;
        };

        if let Some(history) = &self.history {
            history.record_use(entry.identifier(), &self.query, Utc::now());
        }
        self.typeahead.record(&self.query);
        self.persist();

        tracing::info!(identifier = entry.identifier(), "entry activated");
        self.presenter.emit(HostEvent::Activated {
            identifier: entry.identifier().to_string(),
            label: entry.label().to_string(),
        });
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            tracing::warn!(error = %e, "failed to persist launcher state");
        }
    }

    /// Writes history and typeahead state to disk.
    ///
    /// # Errors
    ///
    /// Returns the first write failure.
    pub fn save(&self) -> Result<()> {
        if let Some(history) = &self.history {
            history.save()?;
        }
        if let Some(path) = &self.typeahead_path {
            store::save_typeahead(path, &self.typeahead)?;
        }
        Ok(())
    }
}
