//! Module descriptors: contract version, capability bits and the set of
//! declared entry points.

use std::fmt;
use std::ops::BitOr;

use super::ModuleContractError;

/// Contract version implemented by this engine.
pub const ENGINE_VERSION: ModuleVersion = ModuleVersion::new(1, 2);

/// First contract version whose modules may supply MIME headers.
pub const MIME_HEADER_VERSION: ModuleVersion = ModuleVersion::new(1, 1);

// ---------------------------------------------------------------------------
// ModuleVersion
// ---------------------------------------------------------------------------

/// Version of the module contract a module was written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleVersion {
    major: u16,
    minor: u16,
}

impl ModuleVersion {
    /// Creates a version.
    #[must_use]
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Major version number.
    #[must_use]
    pub const fn major(self) -> u16 {
        self.major
    }

    /// Minor version number.
    #[must_use]
    pub const fn minor(self) -> u16 {
        self.minor
    }

    /// Returns `true` when a module of this version can be served by an
    /// engine implementing `engine`: same major, minor not newer.
    #[must_use]
    pub const fn is_compatible_with(self, engine: Self) -> bool {
        self.major == engine.major && self.minor <= engine.minor
    }

    /// Returns `true` when modules of this version may supply MIME headers.
    #[must_use]
    pub fn supports_mime_header(self) -> bool {
        self >= MIME_HEADER_VERSION
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Capability bits declared by a module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u32);

impl Capabilities {
    /// No database support: the module only registers strategies.
    pub const NODB: Self = Self(0x01);
    /// Databases are created through `init_db_ext` with extra data.
    pub const INIT_EXT: Self = Self(0x02);
    /// Queries against one database may run concurrently.
    pub const REENTRANT: Self = Self(0x04);

    /// No capabilities.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns `true` when every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bit pattern.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Operations of the module contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    /// Module-wide initialisation.
    Init,
    /// Plain database construction.
    InitDb,
    /// Database construction with extra data.
    InitDbExt,
    /// Opening a database.
    Open,
    /// Closing a database.
    Close,
    /// Long database information.
    Info,
    /// Short database description.
    Descr,
    /// Source and target languages.
    Lang,
    /// Database flags.
    Flags,
    /// MIME header text.
    MimeHeader,
    /// Word matching.
    Match,
    /// Word definition.
    Define,
    /// Writing one result item.
    OutputResult,
    /// Number of result items.
    ResultCount,
    /// Number of comparisons made for a result.
    CompareCount,
    /// Database that produced a result item.
    ResultDb,
    /// Releasing a result.
    FreeResult,
}

impl EntryPoint {
    /// Every entry point, in contract order.
    pub const ALL: [Self; 17] = [
        Self::Init,
        Self::InitDb,
        Self::InitDbExt,
        Self::Open,
        Self::Close,
        Self::Info,
        Self::Descr,
        Self::Lang,
        Self::Flags,
        Self::MimeHeader,
        Self::Match,
        Self::Define,
        Self::OutputResult,
        Self::ResultCount,
        Self::CompareCount,
        Self::ResultDb,
        Self::FreeResult,
    ];

    const fn bit(self) -> u32 {
        1 << self as u32
    }

    /// Contract name of the entry point.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::InitDb => "init_db",
            Self::InitDbExt => "init_db_ext",
            Self::Open => "open",
            Self::Close => "close",
            Self::Info => "db_info",
            Self::Descr => "db_descr",
            Self::Lang => "db_lang",
            Self::Flags => "db_flags",
            Self::MimeHeader => "db_mime_header",
            Self::Match => "match",
            Self::Define => "define",
            Self::OutputResult => "output_result",
            Self::ResultCount => "result_count",
            Self::CompareCount => "compare_count",
            Self::ResultDb => "result_db",
            Self::FreeResult => "free_result",
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of entry points a module implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EntryPoints(u32);

impl EntryPoints {
    /// Entry points every database module must provide.
    pub const DATABASE_REQUIRED: Self = Self::empty()
        .with(EntryPoint::Match)
        .with(EntryPoint::Define)
        .with(EntryPoint::OutputResult)
        .with(EntryPoint::ResultCount)
        .with(EntryPoint::FreeResult);

    /// No entry points.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Adds an entry point.
    #[must_use]
    pub const fn with(self, entry: EntryPoint) -> Self {
        Self(self.0 | entry.bit())
    }

    /// Returns `true` when `entry` is declared.
    #[must_use]
    pub const fn contains(self, entry: EntryPoint) -> bool {
        self.0 & entry.bit() != 0
    }

    /// Iterates declared entry points in contract order.
    pub fn iter(self) -> impl Iterator<Item = EntryPoint> {
        EntryPoint::ALL
            .into_iter()
            .filter(move |entry| self.contains(*entry))
    }
}

impl FromIterator<EntryPoint> for EntryPoints {
    fn from_iter<I: IntoIterator<Item = EntryPoint>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

// ---------------------------------------------------------------------------
// ModuleDescriptor
// ---------------------------------------------------------------------------

/// Static description of a module, checked once when it is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Contract version.
    pub version: ModuleVersion,
    /// Capability bits.
    pub capabilities: Capabilities,
    /// Implemented entry points.
    pub entry_points: EntryPoints,
}

impl ModuleDescriptor {
    /// Describes a module written against the current engine version.
    #[must_use]
    pub const fn new(capabilities: Capabilities, entry_points: EntryPoints) -> Self {
        Self {
            version: ENGINE_VERSION,
            capabilities,
            entry_points,
        }
    }

    /// Overrides the contract version.
    #[must_use]
    pub const fn with_version(mut self, version: ModuleVersion) -> Self {
        self.version = version;
        self
    }

    /// Returns `true` when the module declares `entry`.
    #[must_use]
    pub const fn declares(&self, entry: EntryPoint) -> bool {
        self.entry_points.contains(entry)
    }

    /// Returns `true` when the module has capability `capability`.
    #[must_use]
    pub const fn has(&self, capability: Capabilities) -> bool {
        self.capabilities.contains(capability)
    }

    /// Checks the descriptor against the contract.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleContractError`] when the version is incompatible, a
    /// database module misses a required entry point or declares the wrong
    /// init flavour, or `open`/`close` are not declared as a pair.
    pub fn validate(&self, module: &str) -> Result<(), ModuleContractError> {
        if !self.version.is_compatible_with(ENGINE_VERSION) {
            return Err(ModuleContractError::IncompatibleVersion {
                module: module.to_owned(),
                version: self.version,
                engine: ENGINE_VERSION,
            });
        }
        if self.has(Capabilities::NODB) {
            return Ok(());
        }
        let (wanted, unwanted) = if self.has(Capabilities::INIT_EXT) {
            (EntryPoint::InitDbExt, EntryPoint::InitDb)
        } else {
            (EntryPoint::InitDb, EntryPoint::InitDbExt)
        };
        if let Some(entry) = EntryPoints::DATABASE_REQUIRED
            .with(wanted)
            .iter()
            .find(|entry| !self.declares(*entry))
        {
            return Err(ModuleContractError::MissingEntryPoint {
                module: module.to_owned(),
                entry,
            });
        }
        if self.declares(unwanted) {
            return Err(ModuleContractError::UnexpectedEntryPoint {
                module: module.to_owned(),
                entry: unwanted,
            });
        }
        if self.declares(EntryPoint::Open) != self.declares(EntryPoint::Close) {
            return Err(ModuleContractError::UnpairedOpenClose {
                module: module.to_owned(),
            });
        }
        Ok(())
    }
}
