// crates/archconf-types/src/error.rs
// Fatal resolution errors and non-fatal diagnostics

use serde::Serialize;
use std::fmt;

/// Build features whose presence is validated against library paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Feature {
    Mpi,
    Netcdf,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::Mpi => write!(f, "MPI"),
            Feature::Netcdf => write!(f, "NetCDF"),
        }
    }
}

/// Errors that make a configuration unusable. All of them are detected
/// while loading, before any compiler is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Reading the arch file failed
    Io { path: String, message: String },
    /// The arch file is not valid make assignment syntax
    Parse(String),
    /// A `--set` override could not be parsed
    InvalidOverride { text: String, reason: String },
    /// A required executable is blank
    MissingTool { key: &'static str },
    /// A feature is enabled but one of its paths is blank
    MissingLibrary {
        feature: Feature,
        key: &'static str,
    },
    /// The same `-D` name declared twice in CPP_DEFS
    DuplicateDefine { name: String },
    /// A variable expands to itself
    RecursiveVariable { name: String },
    /// Expansion nested deeper than the limit
    ExpansionDepth { name: String },
    /// No built-in preset with that name
    UnknownPreset { name: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "failed to read '{}': {}", path, message)
            }
            ConfigError::Parse(msg) => write!(f, "parse error: {}", msg),
            ConfigError::InvalidOverride { text, reason } => {
                write!(f, "invalid override '{}': {}", text, reason)
            }
            ConfigError::MissingTool { key } => {
                write!(f, "required tool {} is not set", key)
            }
            ConfigError::MissingLibrary { feature, key } => {
                write!(f, "{} is enabled but {} is empty", feature, key)
            }
            ConfigError::DuplicateDefine { name } => {
                write!(f, "preprocessor definition '{}' declared more than once", name)
            }
            ConfigError::RecursiveVariable { name } => {
                write!(f, "recursive variable '{}' references itself", name)
            }
            ConfigError::ExpansionDepth { name } => {
                write!(
                    f,
                    "expansion depth limit exceeded while expanding '{}'",
                    name
                )
            }
            ConfigError::UnknownPreset { name } => write!(f, "unknown preset '{}'", name),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Info,
    Warning,
}

/// Non-fatal findings collected while resolving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum Diagnostic {
    /// A CPP_DEFS token that is passed through without interpretation
    UnknownFlag { token: String },
    /// An assignment to a key the resolver does not consume
    UnknownKey { key: String },
    /// A reference to a variable that is never assigned
    UndefinedVariable { name: String },
    /// The stub MPI object is linked although FC is an MPI wrapper
    WrapperWithStub { compiler: String },
    /// OpenMP is enabled for compiling but not for linking
    OpenMpLinkMismatch,
    /// LINK_LIBS names no BLAS/LAPACK provider
    NoLapack,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::UnknownKey { .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownFlag { token } => {
                write!(f, "unrecognized preprocessor flag '{}' passed through", token)
            }
            Diagnostic::UnknownKey { key } => write!(f, "key '{}' is not used by the build", key),
            Diagnostic::UndefinedVariable { name } => {
                write!(f, "variable '{}' is undefined and expands to nothing", name)
            }
            Diagnostic::WrapperWithStub { compiler } => write!(
                f,
                "compiler '{}' is an MPI wrapper but the stub MPI object is linked",
                compiler
            ),
            Diagnostic::OpenMpLinkMismatch => {
                write!(f, "OPT enables OpenMP but OPT_LNK does not")
            }
            Diagnostic::NoLapack => write!(f, "LINK_LIBS names no BLAS/LAPACK library"),
        }
    }
}
