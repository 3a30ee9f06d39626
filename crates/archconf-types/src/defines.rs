//! Preprocessor definitions from CPP_DEFS.

use serde::Serialize;
use std::collections::HashSet;

use crate::error::{ConfigError, Diagnostic};

/// Definitions with a known meaning in PDAF builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KnownDefine {
    UsePdaf,
    BlockingMpiExchange,
    PdafNoUpdate,
    F77,
}

impl KnownDefine {
    pub const ALL: &'static [KnownDefine] = &[
        KnownDefine::UsePdaf,
        KnownDefine::BlockingMpiExchange,
        KnownDefine::PdafNoUpdate,
        KnownDefine::F77,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KnownDefine::UsePdaf => "USE_PDAF",
            KnownDefine::BlockingMpiExchange => "BLOCKING_MPI_EXCHANGE",
            KnownDefine::PdafNoUpdate => "PDAF_NO_UPDATE",
            KnownDefine::F77 => "F77",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            KnownDefine::UsePdaf => "include the PDAF assimilation library",
            KnownDefine::BlockingMpiExchange => {
                "exchange model/PDAF data with blocking MPI calls"
            }
            KnownDefine::PdafNoUpdate => "skip the analysis step of the filter",
            KnownDefine::F77 => "parse arguments without get_command_argument()",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DefineEffect {
    Recognized(KnownDefine),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefineFlag {
    pub name: String,
    pub value: Option<String>,
    pub effect: DefineEffect,
}

impl DefineFlag {
    pub fn token(&self) -> String {
        match &self.value {
            Some(v) => format!("-D{}={}", self.name, v),
            None => format!("-D{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CppArg {
    Define(DefineFlag),
    /// Anything that is not a `-D` token, passed to the compiler as is
    Verbatim(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DefineSet {
    args: Vec<CppArg>,
}

impl DefineSet {
    pub fn parse(text: &str, diags: &mut Vec<Diagnostic>) -> Result<Self, ConfigError> {
        let mut args = Vec::new();
        let mut seen = HashSet::new();
        let mut words = text.split_whitespace();

        while let Some(word) = words.next() {
            let body = match word.strip_prefix("-D") {
                // `-D NAME` is accepted and normalized to `-DNAME`
                Some("") => match words.next() {
                    Some(next) => next,
                    None => {
                        verbatim(&mut args, word, diags);
                        continue;
                    }
                },
                Some(body) => body,
                None => {
                    verbatim(&mut args, word, diags);
                    continue;
                }
            };

            let (name, value) = match body.split_once('=') {
                Some((n, v)) => (n, Some(v.to_string())),
                None => (body, None),
            };
            if name.is_empty() {
                verbatim(&mut args, word, diags);
                continue;
            }
            if !seen.insert(name.to_string()) {
                return Err(ConfigError::DuplicateDefine {
                    name: name.to_string(),
                });
            }

            let effect = match KnownDefine::from_name(name) {
                Some(k) => DefineEffect::Recognized(k),
                None => DefineEffect::Unknown,
            };
            let flag = DefineFlag {
                name: name.to_string(),
                value,
                effect,
            };
            if effect == DefineEffect::Unknown {
                diags.push(Diagnostic::UnknownFlag { token: flag.token() });
            }
            args.push(CppArg::Define(flag));
        }

        Ok(DefineSet { args })
    }

    /// Compiler arguments in declaration order.
    pub fn tokens(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| match a {
                CppArg::Define(d) => d.token(),
                CppArg::Verbatim(s) => s.clone(),
            })
            .collect()
    }

    pub fn flags(&self) -> impl Iterator<Item = &DefineFlag> {
        self.args.iter().filter_map(|a| match a {
            CppArg::Define(d) => Some(d),
            CppArg::Verbatim(_) => None,
        })
    }

    pub fn get(&self, name: &str) -> Option<&DefineFlag> {
        self.flags().find(|d| d.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|d| d.value.as_deref())
    }

    pub fn is_set(&self, known: KnownDefine) -> bool {
        self.contains(known.name())
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

fn verbatim(args: &mut Vec<CppArg>, word: &str, diags: &mut Vec<Diagnostic>) {
    diags.push(Diagnostic::UnknownFlag {
        token: word.to_string(),
    });
    args.push(CppArg::Verbatim(word.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn use_pdaf_yields_single_token() {
        let mut diags = Vec::new();
        let set = DefineSet::parse("-DUSE_PDAF", &mut diags).unwrap();
        assert_eq!(set.tokens(), ["-DUSE_PDAF"]);
        assert!(set.is_set(KnownDefine::UsePdaf));
        assert!(diags.is_empty());
    }

    #[test]
    fn values_and_separated_form() {
        let mut diags = Vec::new();
        let set = DefineSet::parse("-D PDAF_NO_UPDATE -DNLEV=4", &mut diags).unwrap();
        assert_eq!(set.tokens(), ["-DPDAF_NO_UPDATE", "-DNLEV=4"]);
        assert_eq!(set.value("NLEV"), Some("4"));
        assert_eq!(
            diags,
            vec![Diagnostic::UnknownFlag {
                token: "-DNLEV=4".into()
            }]
        );
    }

    #[test]
    fn non_define_tokens_pass_through() {
        let mut diags = Vec::new();
        let set = DefineSet::parse("-DUSE_PDAF -UF77 -I/opt/inc", &mut diags).unwrap();
        assert_eq!(set.tokens(), ["-DUSE_PDAF", "-UF77", "-I/opt/inc"]);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn duplicate_name_is_error() {
        let err = DefineSet::parse("-DUSE_PDAF -DUSE_PDAF=1", &mut Vec::new()).unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateDefine {
                name: "USE_PDAF".into()
            }
        );
    }

    #[test]
    fn all_known_names_round_trip() {
        for k in KnownDefine::ALL {
            assert_eq!(KnownDefine::from_name(k.name()), Some(*k));
        }
    }
}
