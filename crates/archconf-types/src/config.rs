// crates/archconf-types/src/config.rs
// Resolution of a parsed arch file into an immutable build configuration

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use archconf_ast::ast::ArchFile;
use archconf_parse::parse_str;

use crate::defines::DefineSet;
use crate::error::{ConfigError, Diagnostic, Feature, Severity};
use crate::keys;
use crate::linkage::LinkageSet;
use crate::module_output::ModuleOutputPolicy;
use crate::mpi::{MpiBinding, MpiMode};
use crate::optimization::OptimizationProfile;
use crate::presets;
use crate::toolchain::{PlatformProfile, ToolValues, Toolchain};
use crate::vars::{Override, VarTable};

/// Build features the caller asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Features {
    pub mpi: MpiMode,
    /// NetCDF output (e.g. the Lorenz-96 model)
    pub netcdf: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub features: Features,
    /// Command-line style `KEY=VALUE` assignments
    pub overrides: Vec<Override>,
    /// Values for names the file references but never assigns
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetcdfPaths {
    link: Vec<String>,
    include: Vec<String>,
}

impl NetcdfPaths {
    pub fn require(nc_lib: &str, nc_inc: &str) -> Result<Self, ConfigError> {
        let link: Vec<String> = nc_lib.split_whitespace().map(str::to_string).collect();
        let include: Vec<String> = nc_inc.split_whitespace().map(str::to_string).collect();
        if link.is_empty() {
            return Err(ConfigError::MissingLibrary {
                feature: Feature::Netcdf,
                key: keys::NC_LIB,
            });
        }
        if include.is_empty() {
            return Err(ConfigError::MissingLibrary {
                feature: Feature::Netcdf,
                key: keys::NC_INC,
            });
        }
        Ok(NetcdfPaths { link, include })
    }

    pub fn link_args(&self) -> &[String] {
        &self.link
    }

    pub fn include_args(&self) -> &[String] {
        &self.include
    }
}

/// AR_SPEC and RAN_SPEC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveSpec {
    archiver_flags: Vec<String>,
    ranlib_flags: Vec<String>,
}

impl ArchiveSpec {
    pub fn new(ar_spec: &str, ran_spec: &str) -> Self {
        ArchiveSpec {
            archiver_flags: ar_spec.split_whitespace().map(str::to_string).collect(),
            ranlib_flags: ran_spec.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn archiver_flags(&self) -> &[String] {
        &self.archiver_flags
    }

    pub fn ranlib_flags(&self) -> &[String] {
        &self.ranlib_flags
    }
}

/// Everything a build needs from one arch file, resolved once and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfig {
    platform: PlatformProfile,
    features: Features,
    defines: DefineSet,
    optimization: OptimizationProfile,
    linkage: LinkageSet,
    module_output: ModuleOutputPolicy,
    mpi: MpiBinding,
    netcdf: Option<NetcdfPaths>,
    archive: ArchiveSpec,
    diagnostics: Vec<Diagnostic>,
}

/// The fields that define the build, without diagnostics.
#[derive(Serialize)]
struct FingerprintView<'a> {
    platform: &'a PlatformProfile,
    features: &'a Features,
    defines: &'a DefineSet,
    optimization: &'a OptimizationProfile,
    linkage: &'a LinkageSet,
    module_output: &'a ModuleOutputPolicy,
    mpi: &'a MpiBinding,
    netcdf: &'a Option<NetcdfPaths>,
    archive: &'a ArchiveSpec,
}

impl BuildConfig {
    pub fn platform(&self) -> &PlatformProfile {
        &self.platform
    }
    pub fn toolchain(&self) -> &Toolchain {
        self.platform.toolchain()
    }
    pub fn features(&self) -> Features {
        self.features
    }
    pub fn defines(&self) -> &DefineSet {
        &self.defines
    }
    pub fn optimization(&self) -> &OptimizationProfile {
        &self.optimization
    }
    pub fn linkage(&self) -> &LinkageSet {
        &self.linkage
    }
    pub fn module_output(&self) -> &ModuleOutputPolicy {
        &self.module_output
    }
    pub fn mpi(&self) -> &MpiBinding {
        &self.mpi
    }
    pub fn netcdf(&self) -> Option<&NetcdfPaths> {
        self.netcdf.as_ref()
    }
    pub fn archive(&self) -> &ArchiveSpec {
        &self.archive
    }
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
    }

    /// SHA-256 over the resolved settings, prefixed with "sha256:".
    ///
    /// Diagnostics are excluded, so a rendered copy of a file has the same
    /// fingerprint as the file it came from.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let view = FingerprintView {
            platform: &self.platform,
            features: &self.features,
            defines: &self.defines,
            optimization: &self.optimization,
            linkage: &self.linkage,
            module_output: &self.module_output,
            mpi: &self.mpi,
            netcdf: &self.netcdf,
            archive: &self.archive,
        };
        // plain data without maps; serializing cannot fail
        let bytes = serde_json::to_vec(&view).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        format!("sha256:{:x}", hasher.finalize())
    }
}

/// Resolve a parsed arch file for `platform`.
pub fn resolve(
    platform: &str,
    file: &ArchFile,
    opts: &ResolveOptions,
) -> Result<BuildConfig, ConfigError> {
    let mut diags = Vec::new();
    let table = VarTable::build(file, &opts.overrides, &opts.environment, &mut diags)?;

    for name in table.names() {
        if !keys::is_recognized(name) {
            diags.push(Diagnostic::UnknownKey {
                key: name.to_string(),
            });
        }
    }

    let mut values = BTreeMap::new();
    for key in keys::RECOGNIZED {
        values.insert(*key, table.value_of(key, &mut diags)?);
    }
    let get = |key: &str| values.get(key).map(String::as_str).unwrap_or("");

    let optimization = OptimizationProfile::parse(get(keys::OPT), get(keys::OPT_LNK), &mut diags);
    let toolchain = Toolchain::resolve(
        &ToolValues {
            fc: get(keys::FC),
            ld: get(keys::LD),
            ar: get(keys::AR),
            ranlib: get(keys::RANLIB),
            cpp: get(keys::CPP),
        },
        optimization.preprocesses(),
    )?;
    let defines = DefineSet::parse(get(keys::CPP_DEFS), &mut diags)?;
    let linkage = LinkageSet::parse(get(keys::LINK_LIBS), &mut diags);
    let module_output = ModuleOutputPolicy::new(get(keys::MODULEOPT));
    let mpi = MpiBinding::select(
        opts.features.mpi,
        &toolchain,
        get(keys::MPI_INC),
        get(keys::OBJ_MPI),
        &linkage,
        &mut diags,
    )?;
    let netcdf = if opts.features.netcdf {
        Some(NetcdfPaths::require(get(keys::NC_LIB), get(keys::NC_INC))?)
    } else {
        None
    };
    let archive = ArchiveSpec::new(get(keys::AR_SPEC), get(keys::RAN_SPEC));

    for d in &diags {
        match d.severity() {
            Severity::Warning => log::warn!("{}: {}", platform, d),
            Severity::Info => log::debug!("{}: {}", platform, d),
        }
    }
    log::debug!(
        "resolved {}: compiler {}, MPI {}",
        platform,
        toolchain.compiler(),
        if mpi.is_real() { "real" } else { "stub" }
    );

    Ok(BuildConfig {
        platform: PlatformProfile::new(platform, toolchain),
        features: opts.features,
        defines,
        optimization,
        linkage,
        module_output,
        mpi,
        netcdf,
        archive,
        diagnostics: diags,
    })
}

/// Parse and resolve arch file text.
pub fn load_str(
    platform: &str,
    file_name: &str,
    src: &str,
    opts: &ResolveOptions,
) -> Result<BuildConfig, ConfigError> {
    let file = parse_str(file_name, src).map_err(|e| ConfigError::Parse(e.to_string()))?;
    resolve(platform, &file, opts)
}

/// Read, parse and resolve an arch file. The platform id is the file stem,
/// so `make.arch/linux_intel.h` resolves as `linux_intel`.
pub fn load_file(path: &Path, opts: &ResolveOptions) -> Result<BuildConfig, ConfigError> {
    let shown = path.display().to_string();
    let src = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: shown.clone(),
        message: e.to_string(),
    })?;
    let platform = platform_id(path);
    log::info!("loading arch file {} as '{}'", shown, platform);
    load_str(&platform, &shown, &src, opts)
}

/// Resolve one of the built-in presets.
pub fn load_preset(name: &str, opts: &ResolveOptions) -> Result<BuildConfig, ConfigError> {
    let preset = presets::find(name).ok_or_else(|| ConfigError::UnknownPreset {
        name: name.to_string(),
    })?;
    load_str(preset.name, &format!("<preset:{}>", preset.name), preset.source, opts)
}

pub fn platform_id(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}
