//! Real-vs-stub MPI binding.
//!
//! Decided once per resolution; a resolved configuration is always in
//! exactly one of the two states.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, Diagnostic, Feature};
use crate::keys;
use crate::linkage::LinkageSet;
use crate::toolchain::Toolchain;

/// How the caller wants MPI handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum MpiMode {
    /// Real MPI if the file shows any sign of it, the stub otherwise
    #[default]
    Auto,
    Enabled,
    Disabled,
}

impl FromStr for MpiMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(MpiMode::Auto),
            "on" | "yes" | "true" => Ok(MpiMode::Enabled),
            "off" | "no" | "false" => Ok(MpiMode::Disabled),
            other => Err(format!("expected auto, on or off, found '{}'", other)),
        }
    }
}

impl fmt::Display for MpiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MpiMode::Auto => write!(f, "auto"),
            MpiMode::Enabled => write!(f, "on"),
            MpiMode::Disabled => write!(f, "off"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state")]
pub enum MpiBinding {
    Real {
        /// The compiler wrapper supplies include and link flags
        wrapper: bool,
        /// MPI_INC tokens
        include: Vec<String>,
        /// MPI `-l` names found in LINK_LIBS
        libraries: Vec<String>,
    },
    Stub {
        /// OBJ_MPI tokens, linked in place of an MPI library
        objects: Vec<String>,
    },
}

impl MpiBinding {
    pub fn select(
        mode: MpiMode,
        toolchain: &Toolchain,
        mpi_inc: &str,
        obj_mpi: &str,
        linkage: &LinkageSet,
        diags: &mut Vec<Diagnostic>,
    ) -> Result<Self, ConfigError> {
        let wrapper = toolchain.compiler().is_mpi_wrapper();
        let include: Vec<String> = mpi_inc.split_whitespace().map(str::to_string).collect();
        let libraries: Vec<String> = linkage
            .mpi_libraries()
            .into_iter()
            .map(str::to_string)
            .collect();

        let real = match mode {
            MpiMode::Enabled => true,
            MpiMode::Disabled => false,
            MpiMode::Auto => wrapper || !include.is_empty() || !libraries.is_empty(),
        };
        log::debug!(
            "MPI mode {}: wrapper={} include={:?} libraries={:?} -> {}",
            mode,
            wrapper,
            include,
            libraries,
            if real { "real" } else { "stub" }
        );

        if real {
            if !wrapper {
                if include.is_empty() {
                    return Err(ConfigError::MissingLibrary {
                        feature: Feature::Mpi,
                        key: keys::MPI_INC,
                    });
                }
                if libraries.is_empty() {
                    return Err(ConfigError::MissingLibrary {
                        feature: Feature::Mpi,
                        key: keys::LINK_LIBS,
                    });
                }
            }
            return Ok(MpiBinding::Real {
                wrapper,
                include,
                libraries,
            });
        }

        let objects: Vec<String> = obj_mpi.split_whitespace().map(str::to_string).collect();
        if objects.is_empty() {
            return Err(ConfigError::MissingLibrary {
                feature: Feature::Mpi,
                key: keys::OBJ_MPI,
            });
        }
        if wrapper {
            diags.push(Diagnostic::WrapperWithStub {
                compiler: toolchain.compiler().to_string(),
            });
        }
        Ok(MpiBinding::Stub { objects })
    }

    pub fn is_real(&self) -> bool {
        matches!(self, MpiBinding::Real { .. })
    }

    /// Compiler include arguments (empty for the stub).
    pub fn include_args(&self) -> &[String] {
        match self {
            MpiBinding::Real { include, .. } => include.as_slice(),
            MpiBinding::Stub { .. } => &[],
        }
    }

    /// Objects linked in place of MPI (empty for real MPI).
    pub fn stub_objects(&self) -> &[String] {
        match self {
            MpiBinding::Real { .. } => &[],
            MpiBinding::Stub { objects } => objects.as_slice(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::ToolValues;

    fn toolchain(fc: &str) -> Toolchain {
        Toolchain::resolve(
            &ToolValues {
                fc,
                ld: fc,
                ar: "ar",
                ranlib: "ranlib",
                cpp: "",
            },
            true,
        )
        .unwrap()
    }

    fn links(s: &str) -> LinkageSet {
        LinkageSet::parse(s, &mut Vec::new())
    }

    fn select(
        mode: MpiMode,
        fc: &str,
        inc: &str,
        obj: &str,
        libs: &str,
    ) -> Result<MpiBinding, ConfigError> {
        MpiBinding::select(mode, &toolchain(fc), inc, obj, &links(libs), &mut Vec::new())
    }

    #[test]
    fn auto_with_wrapper_is_real() {
        let b = select(MpiMode::Auto, "mpiifx", "", "", "-llapack").unwrap();
        assert!(b.is_real());
        assert!(b.stub_objects().is_empty());
    }

    #[test]
    fn auto_without_evidence_needs_stub() {
        let b = select(MpiMode::Auto, "gfortran", "", "nullmpi.o", "-llapack").unwrap();
        assert_eq!(
            b,
            MpiBinding::Stub {
                objects: vec!["nullmpi.o".into()]
            }
        );
        let err = select(MpiMode::Auto, "gfortran", "", "", "-llapack").unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingLibrary {
                feature: Feature::Mpi,
                key: "OBJ_MPI"
            }
        );
    }

    #[test]
    fn enabled_without_wrapper_needs_include_and_library() {
        let err = select(MpiMode::Enabled, "gfortran", "", "", "-lmpi").unwrap_err();
        assert!(matches!(err, ConfigError::MissingLibrary { key: "MPI_INC", .. }));
        let err = select(MpiMode::Enabled, "gfortran", "-I/opt/mpi/include", "", "-llapack")
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingLibrary { key: "LINK_LIBS", .. }));
        let ok = select(MpiMode::Enabled, "gfortran", "-I/opt/mpi/include", "", "-lmpi").unwrap();
        assert_eq!(ok.include_args(), ["-I/opt/mpi/include"]);
    }

    #[test]
    fn disabled_with_wrapper_warns() {
        let mut diags = Vec::new();
        let b = MpiBinding::select(
            MpiMode::Disabled,
            &toolchain("mpif90"),
            "",
            "nullmpi.o",
            &links("-llapack"),
            &mut diags,
        )
        .unwrap();
        assert!(!b.is_real());
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("on".parse::<MpiMode>(), Ok(MpiMode::Enabled));
        assert_eq!("off".parse::<MpiMode>(), Ok(MpiMode::Disabled));
        assert!("maybe".parse::<MpiMode>().is_err());
    }
}
