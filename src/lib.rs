//! Lantern: keyboard-driven application launcher.
//!
//! This crate is the host around the `lantern-query` engine:
//! configuration, provider implementations, history persistence and a
//! line-delimited JSON protocol over stdin/stdout for front ends.
//!
//! # Architecture
//!
//! - **Config**: `config.toml` describes the query settings and providers
//! - **Providers**: static entry lists and external commands
//! - **Engine**: `lantern-query` routes, fans out, scores and ranks
//! - **Presenter**: engine callbacks become protocol events
//! - **Host**: reads commands, records activations, writes events

pub mod app_dirs;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod presenter;
pub mod providers;
pub mod store;

pub use config::LanternConfig;
pub use error::{LanternError, Result};
pub use host::stdio::{run_host, run_stdio};
pub use presenter::JsonLinesPresenter;
