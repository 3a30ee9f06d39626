#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![forbid(unsafe_code)]

mod commands;
mod config;
mod defines;
mod error;
pub mod keys;
mod linkage;
mod module_output;
mod mpi;
mod optimization;
pub mod presets;
mod render;
mod toolchain;
mod vars;

pub use config::{
    load_file, load_preset, load_str, platform_id, resolve, ArchiveSpec, BuildConfig, Features,
    NetcdfPaths, ResolveOptions,
};
pub use defines::{CppArg, DefineEffect, DefineFlag, DefineSet, KnownDefine};
pub use error::{ConfigError, Diagnostic, Feature, Severity};
pub use linkage::{LinkArg, LinkageSet};
pub use module_output::ModuleOutputPolicy;
pub use mpi::{MpiBinding, MpiMode};
pub use optimization::OptimizationProfile;
pub use toolchain::{PlatformProfile, Tool, ToolValues, Toolchain};
pub use vars::{Override, VarTable};
