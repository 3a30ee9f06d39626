//! Compiler, linker and archiver selection for one platform.

use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::error::ConfigError;
use crate::keys;

/// Compiler driver names that wrap a Fortran compiler with MPI include and
/// link flags.
const MPI_WRAPPERS: &[&str] = &["ftn", "mpifort", "mpif90", "mpif77", "mpiifort", "mpiifx", "mpifrt"];

/// One executable plus the fixed arguments written next to it
/// (e.g. `mpif90 -f90=ifx`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tool {
    program: String,
    args: Vec<String>,
}

impl Tool {
    /// `None` for a blank value.
    pub fn parse(value: &str) -> Option<Tool> {
        let mut words = value.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Tool {
            program,
            args: words.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Program followed by its fixed arguments.
    pub fn argv(&self) -> Vec<String> {
        let mut v = Vec::with_capacity(1 + self.args.len());
        v.push(self.program.clone());
        v.extend(self.args.iter().cloned());
        v
    }

    pub fn is_mpi_wrapper(&self) -> bool {
        let base = Path::new(&self.program)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.program);
        MPI_WRAPPERS.contains(&base)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for a in &self.args {
            write!(f, " {}", a)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toolchain {
    compiler: Tool,
    linker: Tool,
    archiver: Tool,
    ranlib: Tool,
    /// External preprocessor; absent when the compiler preprocesses itself
    preprocessor: Option<Tool>,
}

/// Expanded values of the tool keys.
#[derive(Debug, Default)]
pub struct ToolValues<'a> {
    pub fc: &'a str,
    pub ld: &'a str,
    pub ar: &'a str,
    pub ranlib: &'a str,
    pub cpp: &'a str,
}

impl Toolchain {
    /// `compiler_preprocesses` is true when the compile flags already run
    /// the preprocessor, which makes CPP optional.
    pub fn resolve(v: &ToolValues<'_>, compiler_preprocesses: bool) -> Result<Self, ConfigError> {
        let required = |key: &'static str, value: &str| {
            Tool::parse(value).ok_or(ConfigError::MissingTool { key })
        };
        let compiler = required(keys::FC, v.fc)?;
        let linker = required(keys::LD, v.ld)?;
        let archiver = required(keys::AR, v.ar)?;
        let ranlib = required(keys::RANLIB, v.ranlib)?;
        let preprocessor = Tool::parse(v.cpp);
        if preprocessor.is_none() && !compiler_preprocesses {
            return Err(ConfigError::MissingTool { key: keys::CPP });
        }
        Ok(Toolchain {
            compiler,
            linker,
            archiver,
            ranlib,
            preprocessor,
        })
    }

    pub fn compiler(&self) -> &Tool {
        &self.compiler
    }
    pub fn linker(&self) -> &Tool {
        &self.linker
    }
    pub fn archiver(&self) -> &Tool {
        &self.archiver
    }
    pub fn ranlib(&self) -> &Tool {
        &self.ranlib
    }
    pub fn preprocessor(&self) -> Option<&Tool> {
        self.preprocessor.as_ref()
    }
}

/// The platform a configuration was loaded for, e.g. `linux_intel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformProfile {
    id: String,
    toolchain: Toolchain,
}

impl PlatformProfile {
    pub fn new(id: impl Into<String>, toolchain: Toolchain) -> Self {
        PlatformProfile {
            id: id.into(),
            toolchain,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values<'a>() -> ToolValues<'a> {
        ToolValues {
            fc: "mpiifx",
            ld: "mpiifx",
            ar: "ar",
            ranlib: "ranlib",
            cpp: "/usr/bin/cpp",
        }
    }

    #[test]
    fn all_tools_present() {
        let tc = Toolchain::resolve(&values(), true).unwrap();
        assert_eq!(tc.compiler().program(), "mpiifx");
        assert_eq!(tc.preprocessor().map(Tool::program), Some("/usr/bin/cpp"));
    }

    #[test]
    fn blank_tool_is_error() {
        for (key, v) in [
            ("FC", ToolValues { fc: "  ", ..values() }),
            ("LD", ToolValues { ld: "", ..values() }),
            ("AR", ToolValues { ar: "", ..values() }),
            ("RANLIB", ToolValues { ranlib: "", ..values() }),
        ] {
            assert_eq!(
                Toolchain::resolve(&v, true).unwrap_err(),
                ConfigError::MissingTool { key }
            );
        }
    }

    #[test]
    fn cpp_needed_only_without_compiler_preprocessing() {
        let v = ToolValues { cpp: "", ..values() };
        assert!(Toolchain::resolve(&v, true).is_ok());
        assert_eq!(
            Toolchain::resolve(&v, false).unwrap_err(),
            ConfigError::MissingTool { key: "CPP" }
        );
    }

    #[test]
    fn wrapper_detection_uses_file_name() {
        assert!(Tool::parse("/opt/intel/bin/mpiifx").unwrap().is_mpi_wrapper());
        assert!(Tool::parse("mpif90 -f90=ifx").unwrap().is_mpi_wrapper());
        assert!(!Tool::parse("gfortran").unwrap().is_mpi_wrapper());
    }

    #[test]
    fn tool_keeps_fixed_arguments() {
        let t = Tool::parse("mpif90  -f90=ifx").unwrap();
        assert_eq!(t.argv(), ["mpif90", "-f90=ifx"]);
        assert_eq!(t.to_string(), "mpif90 -f90=ifx");
    }
}
