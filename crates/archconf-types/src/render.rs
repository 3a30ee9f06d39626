//! Canonical, fully expanded arch file for a resolved configuration.

use std::fmt::Write;

use crate::config::BuildConfig;
use crate::keys;

/// Make-escape a value: `$` doubles, `#` gets a backslash.
fn escape(value: &str) -> String {
    value.replace('$', "$$").replace('#', "\\#")
}

fn join(tokens: &[String]) -> String {
    tokens.join(" ")
}

impl BuildConfig {
    /// Key/value pairs in canonical order, values already expanded.
    pub fn canonical_values(&self) -> Vec<(&'static str, String)> {
        let tc = self.toolchain();
        let nc_lib = self
            .netcdf()
            .map(|nc| join(nc.link_args()))
            .unwrap_or_default();
        let nc_inc = self
            .netcdf()
            .map(|nc| join(nc.include_args()))
            .unwrap_or_default();

        vec![
            (keys::FC, tc.compiler().to_string()),
            (keys::LD, tc.linker().to_string()),
            (keys::AR, tc.archiver().to_string()),
            (keys::RANLIB, tc.ranlib().to_string()),
            (
                keys::CPP,
                tc.preprocessor().map(|t| t.to_string()).unwrap_or_default(),
            ),
            (keys::CPP_DEFS, self.defines().tokens().join(" ")),
            (keys::OPT, join(self.optimization().compile_flags())),
            (keys::OPT_LNK, join(self.optimization().link_flags())),
            (keys::LINK_LIBS, self.linkage().tokens().join(" ")),
            (keys::AR_SPEC, join(self.archive().archiver_flags())),
            (keys::RAN_SPEC, join(self.archive().ranlib_flags())),
            (
                keys::MODULEOPT,
                self.module_output().flag().unwrap_or_default().to_string(),
            ),
            (keys::MPI_INC, join(self.mpi().include_args())),
            (keys::OBJ_MPI, join(self.mpi().stub_objects())),
            (keys::NC_LIB, nc_lib),
            (keys::NC_INC, nc_inc),
        ]
    }

    /// Arch file text that resolves to this configuration again.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Resolved arch file for {}", self.platform().id());
        let _ = writeln!(
            out,
            "# MPI: {}",
            if self.mpi().is_real() { "real" } else { "stub" }
        );
        let _ = writeln!(out, "# fingerprint: {}", self.fingerprint());
        out.push('\n');

        let values = self.canonical_values();
        let width = values.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in values {
            let value = escape(&value);
            if value.is_empty() {
                let _ = writeln!(out, "{:<width$} =", key, width = width);
            } else if value.ends_with('\\') {
                // a comment keeps the final backslash from joining the next line
                let _ = writeln!(out, "{:<width$} = {} #", key, value, width = width);
            } else {
                let _ = writeln!(out, "{:<width$} = {}", key, value, width = width);
            }
        }
        out
    }
}
