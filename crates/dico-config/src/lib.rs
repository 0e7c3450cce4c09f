//! Configuration for the `dicod` dictionary server.
//!
//! The daemon reads a JSON document describing where to listen, how to log,
//! which module instances to load and which databases to serve. Command-line
//! flags parsed by [`Cli`] override individual settings. Validation catches
//! dangling references between databases, module instances and virtual
//! database members before anything is opened.

mod cli;
mod config;
mod database;
mod defaults;
mod logging;
mod socket;

pub use cli::Cli;
pub use config::{Config, ConfigError};
pub use database::{DatabaseDecl, LanguagesDecl, MemberConditionDecl, MemberDecl, ModuleDecl};
pub use defaults::{
    DEFAULT_CONTENT_TYPE, DEFAULT_LEV_DISTANCE, DEFAULT_LOG_FILTER, DEFAULT_PORT,
    DEFAULT_TRANSFER_ENCODING, default_listen, default_log_filter, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};
