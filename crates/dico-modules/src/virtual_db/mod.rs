//! Virtual databases federating other configured databases.
//!
//! The member list arrives as [`InitExtra`] holding a `Vec<VirtualMember>`.
//! Each member carries a condition deciding, per query, whether it takes
//! part given the session's MIME mode. Results concatenate member results in
//! member order; [`ModuleResult::result_db`] reports which member produced
//! an item so its headers and name are used for it.

use std::sync::Arc;

use dico::module::{Capabilities, EntryPoint, EntryPoints, InitExtra};
use dico::strategy::{MatchKey, Strategy};
use dico::stream::{ByteStream, StreamError};
use dico::{
    DatabaseBackend, DatabaseError, DatabaseFlags, DatabaseInstance, DatabaseModule,
    ModuleDescriptor, ModuleError, ModuleResult, ResultHandle,
};
use strum::{Display, EnumString};
use tracing::warn;

use crate::MODULES_TARGET;

/// When a member takes part in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MemberCondition {
    /// Always.
    #[default]
    Any,
    /// Only when the session enabled MIME headers.
    Mime,
    /// Only when the session did not enable MIME headers.
    NoMime,
}

impl MemberCondition {
    /// Returns `true` when the member is consulted for a query with the
    /// given MIME mode.
    #[must_use]
    pub const fn admits(self, mime: bool) -> bool {
        match self {
            Self::Any => true,
            Self::Mime => mime,
            Self::NoMime => !mime,
        }
    }
}

/// A database taking part in a virtual database.
#[derive(Debug, Clone)]
pub struct VirtualMember {
    /// The member database.
    pub database: Arc<DatabaseInstance>,
    /// Participation condition.
    pub condition: MemberCondition,
}

impl VirtualMember {
    /// Creates a member entry.
    #[must_use]
    pub const fn new(database: Arc<DatabaseInstance>, condition: MemberCondition) -> Self {
        Self {
            database,
            condition,
        }
    }
}

/// The `virtual` module.
#[derive(Debug, Default, Clone, Copy)]
pub struct VirtualModule;

impl DatabaseModule for VirtualModule {
    fn descriptor(&self) -> ModuleDescriptor {
        ModuleDescriptor::new(
            Capabilities::INIT_EXT | Capabilities::REENTRANT,
            EntryPoints::DATABASE_REQUIRED
                .with(EntryPoint::InitDbExt)
                .with(EntryPoint::Flags)
                .with(EntryPoint::CompareCount)
                .with(EntryPoint::ResultDb),
        )
    }

    fn init_db_ext(
        &self,
        name: &str,
        args: &[String],
        extra: InitExtra,
    ) -> Result<Box<dyn DatabaseBackend>, ModuleError> {
        if let Some(arg) = args.first() {
            return Err(ModuleError::invalid_arguments(format!(
                "{name}: unexpected argument '{arg}'"
            )));
        }
        let members = extra.downcast::<Vec<VirtualMember>>().map_err(|_| {
            ModuleError::invalid_arguments(format!("{name}: no member databases given"))
        })?;
        if members.is_empty() {
            return Err(ModuleError::invalid_arguments(format!(
                "{name}: no member databases given"
            )));
        }
        Ok(Box::new(VirtualBackend {
            name: name.to_owned(),
            members: *members,
        }))
    }
}

/// One virtual database.
#[derive(Debug)]
pub struct VirtualBackend {
    name: String,
    members: Vec<VirtualMember>,
}

impl VirtualBackend {
    fn federate<F>(&self, key: &MatchKey<'_>, query: F) -> Option<Box<dyn ModuleResult>>
    where
        F: Fn(&Arc<DatabaseInstance>) -> Result<Option<ResultHandle>, DatabaseError>,
    {
        let parts: Vec<ResultHandle> = self
            .members
            .iter()
            .filter(|member| member.condition.admits(key.mime) && member.database.is_open())
            .filter_map(|member| match query(&member.database) {
                Ok(handle) => handle,
                Err(error) => {
                    warn!(
                        target: MODULES_TARGET,
                        database = %self.name,
                        member = member.database.name(),
                        error = %error,
                        "member query failed; skipping"
                    );
                    None
                }
            })
            .filter(|handle| !handle.is_empty())
            .collect();
        if parts.is_empty() {
            return None;
        }
        Some(Box::new(VirtualResult { parts }))
    }
}

impl DatabaseBackend for VirtualBackend {
    fn flags(&self) -> DatabaseFlags {
        if self
            .members
            .iter()
            .all(|member| member.condition == MemberCondition::Any)
        {
            DatabaseFlags::VIRTUAL
        } else {
            DatabaseFlags::empty()
        }
    }

    fn match_word(
        &self,
        strategy: &Strategy,
        key: &MatchKey<'_>,
    ) -> Result<Option<Box<dyn ModuleResult>>, ModuleError> {
        Ok(self.federate(key, |database| database.match_word(strategy, key)))
    }

    fn define(&self, key: &MatchKey<'_>) -> Result<Option<Box<dyn ModuleResult>>, ModuleError> {
        Ok(self.federate(key, |database| database.define(key)))
    }
}

/// Member results in member order.
#[derive(Debug)]
pub struct VirtualResult {
    parts: Vec<ResultHandle>,
}

impl VirtualResult {
    fn locate(&self, index: usize) -> Option<(&ResultHandle, usize)> {
        let mut rest = index;
        for part in &self.parts {
            let count = part.count();
            if rest < count {
                return Some((part, rest));
            }
            rest -= count;
        }
        None
    }
}

impl ModuleResult for VirtualResult {
    fn count(&self) -> usize {
        self.parts.iter().map(ResultHandle::count).sum()
    }

    fn compare_count(&self) -> usize {
        self.parts.iter().map(ResultHandle::compare_count).sum()
    }

    fn output(&self, index: usize, out: &mut dyn ByteStream) -> Result<(), StreamError> {
        match self.locate(index) {
            Some((part, local)) => part.output(local, out),
            None => Ok(()),
        }
    }

    fn result_db(&self, index: usize) -> Option<Arc<DatabaseInstance>> {
        self.locate(index)
            .map(|(part, local)| part.database_for(local))
    }
}
