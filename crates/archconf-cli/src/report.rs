//! Human-readable and JSON output for resolved configurations.

use std::fmt::Write;

use archconf_types::{BuildConfig, DefineEffect, Diagnostic, MpiBinding, Severity};
use serde::Serialize;

/// Machine-readable result of `archconf check`.
#[derive(Debug, Serialize)]
pub struct CheckReport<'a> {
    pub platform: &'a str,
    pub fingerprint: String,
    pub mpi: &'static str,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}

impl<'a> CheckReport<'a> {
    pub fn new(cfg: &'a BuildConfig) -> Self {
        let (warnings, notes): (Vec<&Diagnostic>, Vec<&Diagnostic>) = cfg
            .diagnostics()
            .iter()
            .partition(|d| d.severity() == Severity::Warning);
        CheckReport {
            platform: cfg.platform().id(),
            fingerprint: cfg.fingerprint(),
            mpi: mpi_state(cfg),
            warnings: warnings.iter().map(|d| d.to_string()).collect(),
            notes: notes.iter().map(|d| d.to_string()).collect(),
        }
    }
}

fn mpi_state(cfg: &BuildConfig) -> &'static str {
    if cfg.mpi().is_real() {
        "real"
    } else {
        "stub"
    }
}

/// Quote tokens that a POSIX shell would split or expand.
pub fn shell_join(argv: &[String]) -> String {
    argv.iter()
        .map(|a| {
            let plain = !a.is_empty()
                && a.chars().all(|c| {
                    c.is_ascii_alphanumeric() || "-_./=,:+@%".contains(c)
                });
            if plain {
                a.clone()
            } else {
                format!("'{}'", a.replace('\'', r"'\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn summary(cfg: &BuildConfig) -> String {
    let tc = cfg.toolchain();
    let mut out = String::new();
    let _ = writeln!(out, "platform:     {}", cfg.platform().id());
    let _ = writeln!(out, "compiler:     {}", tc.compiler());
    let _ = writeln!(out, "linker:       {}", tc.linker());
    let _ = writeln!(out, "archiver:     {} / {}", tc.archiver(), tc.ranlib());
    match tc.preprocessor() {
        Some(cpp) => {
            let _ = writeln!(out, "preprocessor: {}", cpp);
        }
        None => {
            let _ = writeln!(out, "preprocessor: (compiler)");
        }
    }

    let _ = writeln!(out, "defines:");
    for flag in cfg.defines().flags() {
        let meaning = match flag.effect {
            DefineEffect::Recognized(k) => k.description(),
            DefineEffect::Unknown => "unrecognized, passed through",
        };
        let _ = writeln!(out, "  {:<28} {}", flag.token(), meaning);
    }

    let opt = cfg.optimization();
    let _ = writeln!(out, "compile flags: {}", opt.compile_flags().join(" "));
    let _ = writeln!(out, "link flags:    {}", opt.link_flags().join(" "));
    let _ = writeln!(
        out,
        "openmp: {}  double precision: {}",
        opt.openmp(),
        opt.double_precision()
    );
    let _ = writeln!(out, "link libraries: {}", cfg.linkage().tokens().join(" "));
    let _ = writeln!(
        out,
        "module flag:  {}",
        cfg.module_output().flag().unwrap_or("(none)")
    );

    match cfg.mpi() {
        MpiBinding::Real {
            wrapper,
            include,
            libraries,
        } => {
            let _ = writeln!(
                out,
                "MPI: real{}",
                if *wrapper { " (compiler wrapper)" } else { "" }
            );
            if !include.is_empty() {
                let _ = writeln!(out, "  include:   {}", include.join(" "));
            }
            if !libraries.is_empty() {
                let _ = writeln!(out, "  libraries: {}", libraries.join(" "));
            }
        }
        MpiBinding::Stub { objects } => {
            let _ = writeln!(out, "MPI: stub ({})", objects.join(" "));
        }
    }

    match cfg.netcdf() {
        Some(nc) => {
            let _ = writeln!(
                out,
                "NetCDF: {} | {}",
                nc.include_args().join(" "),
                nc.link_args().join(" ")
            );
        }
        None => {
            let _ = writeln!(out, "NetCDF: not requested");
        }
    }
    let _ = writeln!(out, "fingerprint: {}", cfg.fingerprint());
    out
}
