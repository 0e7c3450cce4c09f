//! Module and database declarations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::defaults::{default_content_type, default_transfer_encoding};

/// A module instance: a named, initialised implementation of some kind.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ModuleDecl {
    /// Instance name referenced by databases.
    pub name: String,
    /// Implementation kind, e.g. `dictionary`. Defaults to the name.
    #[serde(default)]
    pub kind: Option<String>,
    /// Arguments passed to the module's `init`.
    #[serde(default)]
    pub args: Vec<String>,
}

impl ModuleDecl {
    /// Declares a module instance whose kind equals its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            args: Vec::new(),
        }
    }

    /// Implementation kind to resolve.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or(&self.name)
    }
}

/// Source and target languages of a database.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LanguagesDecl {
    /// Headword languages.
    #[serde(default)]
    pub source: Vec<String>,
    /// Definition languages.
    #[serde(default)]
    pub target: Vec<String>,
}

/// Participation condition of a virtual database member.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MemberConditionDecl {
    /// Always consulted.
    #[default]
    Any,
    /// Consulted only in MIME mode.
    Mime,
    /// Consulted only outside MIME mode.
    NoMime,
}

/// A member of a virtual database.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MemberDecl {
    /// Name of the member database.
    pub name: String,
    /// When the member takes part.
    #[serde(default)]
    pub condition: MemberConditionDecl,
}

/// A database exposed to clients.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DatabaseDecl {
    /// Name clients use to address the database.
    pub name: String,
    /// Module instance serving the database. Virtual databases (those with
    /// members) may leave it unset.
    #[serde(default)]
    pub handler: Option<String>,
    /// Arguments passed to the module's `init_db`.
    #[serde(default)]
    pub args: Vec<String>,
    /// Overrides the module's description.
    #[serde(default)]
    pub description: Option<String>,
    /// Overrides the module's information text.
    #[serde(default)]
    pub info: Option<String>,
    /// Overrides the module's languages.
    #[serde(default)]
    pub languages: Option<LanguagesDecl>,
    /// Hides the database from listings and wildcard searches.
    #[serde(default)]
    pub hidden: bool,
    /// Content type announced when the module supplies no headers.
    #[serde(default = "default_content_type")]
    pub content_type: String,
    /// Transfer encoding announced when the module supplies no headers.
    #[serde(default = "default_transfer_encoding")]
    pub transfer_encoding: String,
    /// Members of a virtual database.
    #[serde(default)]
    pub members: Vec<MemberDecl>,
}

impl DatabaseDecl {
    /// Declares a database served by `handler`.
    #[must_use]
    pub fn new(name: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: Some(handler.into()),
            args: Vec::new(),
            description: None,
            info: None,
            languages: None,
            hidden: false,
            content_type: default_content_type(),
            transfer_encoding: default_transfer_encoding(),
            members: Vec::new(),
        }
    }

    /// Sets the `init_db` arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Returns `true` when the database federates other databases.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        !self.members.is_empty()
    }
}
