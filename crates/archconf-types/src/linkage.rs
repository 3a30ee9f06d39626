//! Ordered linker arguments from LINK_LIBS.
//!
//! Link order decides symbol resolution for static archives, so the set is
//! a sequence, never re-sorted or de-duplicated.

use serde::Serialize;

use crate::error::Diagnostic;

const LAPACK_LIBS: &[&str] = &["lapack", "blas", "openblas", "flexiblas", "scalapack", "sci"];
const MKL_FLAGS: &[&str] = &["-mkl", "-qmkl"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LinkArg {
    /// `-L<path>`
    SearchPath(String),
    /// `-l<name>`
    Library(String),
    /// Objects, archives, rpaths and other linker options
    Raw(String),
}

impl LinkArg {
    pub fn token(&self) -> String {
        match self {
            LinkArg::SearchPath(p) => format!("-L{}", p),
            LinkArg::Library(l) => format!("-l{}", l),
            LinkArg::Raw(r) => r.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkageSet {
    args: Vec<LinkArg>,
}

impl LinkageSet {
    pub fn parse(text: &str, diags: &mut Vec<Diagnostic>) -> Self {
        let mut args = Vec::new();
        let mut words = text.split_whitespace();
        while let Some(w) = words.next() {
            let arg = if w == "-L" || w == "-l" {
                // separated form: `-L /usr/lib`
                match words.next() {
                    Some(next) if w == "-L" => LinkArg::SearchPath(next.to_string()),
                    Some(next) => LinkArg::Library(next.to_string()),
                    None => LinkArg::Raw(w.to_string()),
                }
            } else if let Some(p) = w.strip_prefix("-L") {
                LinkArg::SearchPath(p.to_string())
            } else if let Some(l) = w.strip_prefix("-l") {
                LinkArg::Library(l.to_string())
            } else {
                LinkArg::Raw(w.to_string())
            };
            args.push(arg);
        }

        let set = LinkageSet { args };
        if !set.has_lapack() {
            diags.push(Diagnostic::NoLapack);
        }
        set
    }

    pub fn args(&self) -> &[LinkArg] {
        &self.args
    }

    /// Linker command-line tokens, in declaration order.
    pub fn tokens(&self) -> Vec<String> {
        self.args.iter().map(LinkArg::token).collect()
    }

    pub fn search_paths(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter_map(|a| match a {
            LinkArg::SearchPath(p) => Some(p.as_str()),
            _ => None,
        })
    }

    pub fn libraries(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter_map(|a| match a {
            LinkArg::Library(l) => Some(l.as_str()),
            _ => None,
        })
    }

    pub fn has_library(&self, name: &str) -> bool {
        self.libraries().any(|l| l == name)
    }

    /// `-l` names that belong to an MPI implementation.
    pub fn mpi_libraries(&self) -> Vec<&str> {
        self.libraries()
            .filter(|l| l.starts_with("mpi") || l.starts_with("pmpi"))
            .collect()
    }

    /// Some BLAS/LAPACK provider is linked (reference libs, OpenBLAS, MKL).
    pub fn has_lapack(&self) -> bool {
        self.args.iter().any(|a| match a {
            LinkArg::Library(l) => LAPACK_LIBS.contains(&l.as_str()) || l.starts_with("mkl"),
            LinkArg::Raw(r) => {
                let flag = r.split('=').next().unwrap_or(r);
                MKL_FLAGS.contains(&flag)
                    || r.contains("liblapack")
                    || r.contains("libopenblas")
                    || r.contains("libmkl")
            }
            LinkArg::SearchPath(_) => false,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_preserved() {
        let mut diags = Vec::new();
        let set = LinkageSet::parse("-L/usr/lib -llapack  -lblas   -lm", &mut diags);
        assert_eq!(set.tokens(), ["-L/usr/lib", "-llapack", "-lblas", "-lm"]);
        assert!(diags.is_empty());
    }

    #[test]
    fn classifies_arguments() {
        let set = LinkageSet::parse(
            "-L /opt/mpi/lib -lmpi_mpifh -lmpi -Wl,-rpath,/opt/x libfoo.a -qmkl=sequential",
            &mut Vec::new(),
        );
        assert_eq!(set.search_paths().collect::<Vec<_>>(), ["/opt/mpi/lib"]);
        assert_eq!(set.mpi_libraries(), ["mpi_mpifh", "mpi"]);
        assert!(set.has_lapack());
        assert_eq!(set.args()[3], LinkArg::Raw("-Wl,-rpath,/opt/x".into()));
    }

    #[test]
    fn missing_lapack_is_reported() {
        let mut diags = Vec::new();
        LinkageSet::parse("-lm", &mut diags);
        assert_eq!(diags, vec![Diagnostic::NoLapack]);
    }
}
