//! Server configuration document.

use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::{DatabaseDecl, ModuleDecl};
use crate::defaults::{
    default_lev_distance, default_listen, default_log_filter_string, default_log_format,
};
use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read configuration file '{path}': {source}")]
    Read {
        /// File that was being read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
    /// The configuration document is malformed.
    #[error("cannot parse configuration{}: {source}", origin_suffix(.origin.as_ref()))]
    Parse {
        /// File the document came from, when known.
        origin: Option<Utf8PathBuf>,
        /// Parser diagnostics.
        #[source]
        source: Arc<serde_json::Error>,
    },
    /// Two modules or two databases share a name.
    #[error("duplicate {what} '{name}'")]
    Duplicate {
        /// `module` or `database`.
        what: &'static str,
        /// Conflicting name.
        name: String,
    },
    /// A database names a module instance that is not declared.
    #[error("database '{database}' refers to undeclared module '{handler}'")]
    UnknownHandler {
        /// Database name.
        database: String,
        /// Missing module instance.
        handler: String,
    },
    /// A database has neither a handler nor members.
    #[error("database '{database}' needs a handler or members")]
    MissingHandler {
        /// Database name.
        database: String,
    },
    /// A virtual database lists a database that is not declared before it.
    #[error("virtual database '{database}' refers to unknown member '{member}'")]
    UnknownMember {
        /// Virtual database name.
        database: String,
        /// Missing member.
        member: String,
    },
    /// A database name collides with a wildcard.
    #[error("database name '{name}' is reserved")]
    ReservedName {
        /// Offending name.
        name: String,
    },
    /// The Levenshtein distance is outside 1..=9.
    #[error("Levenshtein distance must be between 1 and 9, got {value}")]
    LevDistance {
        /// Configured value.
        value: usize,
    },
}

fn origin_suffix(origin: Option<&Utf8PathBuf>) -> String {
    origin.map(|path| format!(" file '{path}'")).unwrap_or_default()
}

/// Complete server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Endpoint to accept connections on.
    pub listen: SocketEndpoint,
    /// `tracing` filter directive.
    pub log_filter: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// Log every protocol line exchanged with clients.
    pub transcript: bool,
    /// Append define/match/compare counts and elapsed time to the final
    /// `250` line of DEFINE and MATCH replies.
    pub timing: bool,
    /// Host name announced in the banner; the system host name when unset.
    pub hostname: Option<String>,
    /// Greeting text announced in the banner.
    pub banner: Option<String>,
    /// Text returned by `SHOW SERVER`.
    pub server_info: Option<String>,
    /// Replacement for the generated `HELP` listing. A leading `+` appends
    /// the text to the listing instead.
    pub help_text: Option<String>,
    /// Protocol capabilities to enable, e.g. `xlev`, `mime`.
    pub capabilities: Vec<String>,
    /// Strategy used for `MATCH db . word`.
    pub default_strategy: Option<String>,
    /// Initial Levenshtein distance of every session.
    pub lev_distance: usize,
    /// Module instances to load.
    pub modules: Vec<ModuleDecl>,
    /// Databases to serve, in search order.
    pub databases: Vec<DatabaseDecl>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            transcript: false,
            timing: false,
            hostname: None,
            banner: None,
            server_info: None,
            help_text: None,
            capabilities: Vec::new(),
            default_strategy: None,
            lev_distance: default_lev_distance(),
            modules: Vec::new(),
            databases: Vec::new(),
        }
    }
}

impl Config {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents and the
    /// validation errors of [`Config::validate`].
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, None)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// as [`Config::from_json`].
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })?;
        Self::parse(&text, Some(path))
    }

    fn parse(text: &str, origin: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            origin: origin.map(Utf8Path::to_path_buf),
            source: Arc::new(source),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross references between declarations.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=9).contains(&self.lev_distance) {
            return Err(ConfigError::LevDistance {
                value: self.lev_distance,
            });
        }
        let mut modules = HashSet::new();
        for module in &self.modules {
            if !modules.insert(module.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    what: "module",
                    name: module.name.clone(),
                });
            }
        }
        let mut databases = HashSet::new();
        for database in &self.databases {
            validate_database(database, &modules, &databases)?;
            databases.insert(database.name.as_str());
        }
        Ok(())
    }

    /// Databases in declaration order.
    pub fn databases(&self) -> impl Iterator<Item = &DatabaseDecl> {
        self.databases.iter()
    }
}

fn validate_database(
    database: &DatabaseDecl,
    modules: &HashSet<&str>,
    earlier: &HashSet<&str>,
) -> Result<(), ConfigError> {
    let name = database.name.as_str();
    if matches!(name, "!" | "*") || name.is_empty() {
        return Err(ConfigError::ReservedName {
            name: name.to_owned(),
        });
    }
    if earlier.contains(name) {
        return Err(ConfigError::Duplicate {
            what: "database",
            name: name.to_owned(),
        });
    }
    match &database.handler {
        Some(handler) if !modules.contains(handler.as_str()) => {
            return Err(ConfigError::UnknownHandler {
                database: name.to_owned(),
                handler: handler.clone(),
            });
        }
        None if !database.is_virtual() => {
            return Err(ConfigError::MissingHandler {
                database: name.to_owned(),
            });
        }
        _ => {}
    }
    if let Some(member) = database
        .members
        .iter()
        .find(|member| !earlier.contains(member.name.as_str()))
    {
        return Err(ConfigError::UnknownMember {
            database: name.to_owned(),
            member: member.name.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests;
