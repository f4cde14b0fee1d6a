//! progwatch core library: configuration types, loading and validation.
//!
//! Public API surface:
//! - [`types`]: newtypes and configuration structs
//! - [`error`]: [`ConfigError`]
//! - [`config`]: load / validate / save / init

pub mod config;
pub mod error;
pub mod types;

pub use error::ConfigError;
pub use types::{
    ClassCode, ExportConfig, LogConfig, PollConfig, PublishConfig, WatchedFile, WatcherConfig,
};
