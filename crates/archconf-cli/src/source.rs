//! Choosing which arch file to resolve.
//!
//! PDAF's makefiles pick `make.arch/$(PDAF_ARCH).h`; the same convention
//! applies here when neither a file nor a preset is given explicitly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use archconf_types::{load_file, load_preset, BuildConfig, ResolveOptions};

/// Maximum arch file size in bytes (1MB)
pub const MAX_SOURCE_SIZE: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchSource {
    File(PathBuf),
    Preset(String),
}

impl ArchSource {
    /// Explicit file, then explicit preset, then `PDAF_ARCH` (as a file in
    /// `arch_dir` when given, as a preset name otherwise).
    pub fn select(
        file: Option<PathBuf>,
        preset: Option<String>,
        arch: Option<String>,
        arch_dir: Option<PathBuf>,
    ) -> Result<Self> {
        if let Some(f) = file {
            return Ok(ArchSource::File(f));
        }
        if let Some(p) = preset {
            return Ok(ArchSource::Preset(p));
        }
        match (arch, arch_dir) {
            (Some(a), Some(dir)) => Ok(ArchSource::File(dir.join(format!("{}.h", a)))),
            (Some(a), None) => Ok(ArchSource::Preset(a)),
            (None, _) => bail!("no arch file given: pass --file or --preset, or set PDAF_ARCH"),
        }
    }

    pub fn load(&self, opts: &ResolveOptions) -> Result<BuildConfig> {
        match self {
            ArchSource::File(path) => {
                check_size(path)?;
                Ok(load_file(path, opts)?)
            }
            ArchSource::Preset(name) => {
                log::info!("loading preset {}", name);
                Ok(load_preset(name, opts)?)
            }
        }
    }
}

fn check_size(path: &Path) -> Result<()> {
    let len = std::fs::metadata(path)
        .with_context(|| format!("Failed to read arch file '{}'", path.display()))?
        .len();
    if len > MAX_SOURCE_SIZE as u64 {
        bail!(
            "arch file exceeds {}MB limit ({} bytes)",
            MAX_SOURCE_SIZE / 1_000_000,
            len
        );
    }
    Ok(())
}

pub fn read_source(path: &Path) -> Result<String> {
    check_size(path)?;
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read arch file '{}'", path.display()))
}

/// Snapshot of the process environment for `--use-env`.
pub fn environment() -> BTreeMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_file_wins() {
        let s = ArchSource::select(
            Some("a.h".into()),
            Some("linux_intel".into()),
            Some("x".into()),
            None,
        )
        .unwrap();
        assert_eq!(s, ArchSource::File("a.h".into()));
    }

    #[test]
    fn pdaf_arch_with_directory_is_a_file() {
        let s = ArchSource::select(None, None, Some("linux_intel".into()), Some("make.arch".into()))
            .unwrap();
        assert_eq!(
            s,
            ArchSource::File(PathBuf::from("make.arch").join("linux_intel.h"))
        );
    }

    #[test]
    fn pdaf_arch_alone_is_a_preset() {
        let s = ArchSource::select(None, None, Some("linux_gfortran".into()), None).unwrap();
        assert_eq!(s, ArchSource::Preset("linux_gfortran".into()));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("big.h");
        std::fs::write(&path, "#".repeat(MAX_SOURCE_SIZE + 1)).expect("write file");
        let err = ArchSource::File(path)
            .load(&ResolveOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("1MB limit"), "{err}");
    }

    #[test]
    fn file_source_uses_file_stem() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("linux_serial.h");
        std::fs::write(
            &path,
            "FC = gfortran\nLD = $(FC)\nAR = ar\nRANLIB = ranlib\nOPT = -cpp\n\
             LINK_LIBS = -llapack\nOBJ_MPI = nullmpi.o\n",
        )
        .expect("write file");
        let cfg = ArchSource::File(path)
            .load(&ResolveOptions::default())
            .unwrap();
        assert_eq!(cfg.platform().id(), "linux_serial");
    }

    #[test]
    fn nothing_given_is_error() {
        assert!(ArchSource::select(None, None, None, None).is_err());
    }
}
