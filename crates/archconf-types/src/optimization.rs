use serde::Serialize;

use crate::error::Diagnostic;

const OPENMP_FLAGS: &[&str] = &["-qopenmp", "-fopenmp", "-openmp", "-fiopenmp", "-mp", "-homp"];
const PREPROCESS_FLAGS: &[&str] = &["-cpp", "-fpp", "-Mpreprocess", "-eZ", "-xf95-cpp-input"];
const REAL8_FLAGS: &[&str] = &["-r8", "-fdefault-real-8", "-Mr8", "-autodouble"];

/// Compile (OPT) and link (OPT_LNK) flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptimizationProfile {
    compile: Vec<String>,
    link: Vec<String>,
}

fn words(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

fn any_of(flags: &[String], set: &[&str]) -> bool {
    flags.iter().any(|f| set.contains(&f.as_str()))
}

impl OptimizationProfile {
    pub fn parse(opt: &str, opt_lnk: &str, diags: &mut Vec<Diagnostic>) -> Self {
        let profile = OptimizationProfile {
            compile: words(opt),
            link: words(opt_lnk),
        };
        if profile.openmp() && !any_of(&profile.link, OPENMP_FLAGS) {
            diags.push(Diagnostic::OpenMpLinkMismatch);
        }
        profile
    }

    pub fn compile_flags(&self) -> &[String] {
        &self.compile
    }

    pub fn link_flags(&self) -> &[String] {
        &self.link
    }

    /// Shared-memory parallelization requested for compiling.
    pub fn openmp(&self) -> bool {
        any_of(&self.compile, OPENMP_FLAGS)
    }

    /// The compiler runs the C preprocessor itself.
    pub fn preprocesses(&self) -> bool {
        any_of(&self.compile, PREPROCESS_FLAGS)
    }

    /// Default REAL kind promoted to double precision.
    pub fn double_precision(&self) -> bool {
        any_of(&self.compile, REAL8_FLAGS)
            || self
                .compile
                .windows(2)
                .any(|w| w[0] == "-real-size" && w[1] == "64")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intel_reference_flags() {
        let mut diags = Vec::new();
        let p = OptimizationProfile::parse("-O3 -cpp -qopenmp", "-O3 -cpp -qopenmp", &mut diags);
        assert!(p.openmp());
        assert!(p.preprocesses());
        assert!(!p.double_precision());
        assert!(diags.is_empty());
    }

    #[test]
    fn openmp_missing_at_link_is_reported() {
        let mut diags = Vec::new();
        let p = OptimizationProfile::parse("-O2 -fopenmp", "-O2", &mut diags);
        assert!(p.openmp());
        assert_eq!(diags, vec![Diagnostic::OpenMpLinkMismatch]);
    }

    #[test]
    fn double_precision_forms() {
        let mut d = Vec::new();
        assert!(OptimizationProfile::parse("-O3 -fdefault-real-8", "", &mut d).double_precision());
        assert!(OptimizationProfile::parse("-real-size 64", "", &mut d).double_precision());
        assert!(!OptimizationProfile::parse("-real-size 32", "", &mut d).double_precision());
    }
}
