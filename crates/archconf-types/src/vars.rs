//! Make-compatible variable table and expansion.
//!
//! Assignments are applied in file order. Recursive (`=`) bindings keep
//! their references and are expanded on use; simple (`:=`) bindings are
//! expanded once when assigned. Command-line overrides win over file
//! assignments unless the file uses `override`.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use archconf_ast::ast::{ArchFile, AssignOp, Fragment, Modifier};
use archconf_parse::parse_str;

use crate::error::{ConfigError, Diagnostic};

/// Maximum nesting of variable references
const MAX_EXPANSION_DEPTH: usize = 64;

/// A `KEY=VALUE` override given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub name: String,
    pub value: String,
}

impl FromStr for Override {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidOverride {
            text: s.to_string(),
            reason: reason.to_string(),
        };
        let (name, value) = s.split_once('=').ok_or_else(|| invalid("expected KEY=VALUE"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid("empty key"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        {
            return Err(invalid("key may only contain letters, digits, '_', '.' and '-'"));
        }
        Ok(Override {
            name: name.to_string(),
            value: value.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Recursive,
    Simple,
}

#[derive(Debug, Clone)]
struct Binding {
    flavor: Flavor,
    parts: Vec<Fragment>,
    from_command_line: bool,
}

#[derive(Debug, Default)]
pub struct VarTable {
    vars: HashMap<String, Binding>,
    /// First-definition order, for deterministic iteration
    order: Vec<String>,
    env: BTreeMap<String, String>,
}

impl VarTable {
    /// Apply `overrides` and then every assignment of `file`.
    ///
    /// `env` is consulted for names that are never assigned.
    pub fn build(
        file: &ArchFile,
        overrides: &[Override],
        env: &BTreeMap<String, String>,
        diags: &mut Vec<Diagnostic>,
    ) -> Result<Self, ConfigError> {
        let mut table = VarTable {
            env: env.clone(),
            ..VarTable::default()
        };

        for ov in overrides {
            let parts = override_fragments(ov)?;
            table.define(
                &ov.name,
                Binding {
                    flavor: Flavor::Recursive,
                    parts,
                    from_command_line: true,
                },
            );
        }

        for assign in file.assignments() {
            let name = assign.name.text.as_str();
            let forced = assign.modifiers.contains(&Modifier::Override);
            let existing = table.vars.get(name);
            if !forced && existing.is_some_and(|b| b.from_command_line) {
                log::debug!("{} set on the command line; file assignment ignored", name);
                continue;
            }

            let parts = assign.value.parts.clone();
            let binding = match assign.op {
                AssignOp::Recursive => Binding {
                    flavor: Flavor::Recursive,
                    parts,
                    from_command_line: false,
                },
                AssignOp::Simple => Binding {
                    flavor: Flavor::Simple,
                    parts: vec![Fragment::Text(table.expand_fragments(&parts, diags)?)],
                    from_command_line: false,
                },
                AssignOp::Conditional => {
                    // an environment variable counts as defined
                    if existing.is_some() || table.env.contains_key(name) {
                        continue;
                    }
                    Binding {
                        flavor: Flavor::Recursive,
                        parts,
                        from_command_line: false,
                    }
                }
                AssignOp::Append => match existing.cloned().or_else(|| table.env_binding(name)) {
                    None => Binding {
                        flavor: Flavor::Recursive,
                        parts,
                        from_command_line: false,
                    },
                    Some(mut prev) => {
                        let tail = match prev.flavor {
                            Flavor::Recursive => parts,
                            Flavor::Simple => {
                                vec![Fragment::Text(table.expand_fragments(&parts, diags)?)]
                            }
                        };
                        if !prev.parts.is_empty() && !tail.is_empty() {
                            prev.parts.push(Fragment::Text(" ".to_string()));
                        }
                        prev.parts.extend(tail);
                        prev.from_command_line = false;
                        prev
                    }
                },
            };
            table.define(name, binding);
        }

        Ok(table)
    }

    fn define(&mut self, name: &str, binding: Binding) {
        if !self.vars.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.vars.insert(name.to_string(), binding);
    }

    /// Environment value of an unassigned name, as a recursive binding.
    fn env_binding(&self, name: &str) -> Option<Binding> {
        self.env.get(name).map(|value| Binding {
            flavor: Flavor::Recursive,
            parts: vec![Fragment::Text(value.clone())],
            from_command_line: false,
        })
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Value of a key the file may leave out entirely.
    ///
    /// An absent key is "" without a diagnostic; `UndefinedVariable` is only
    /// raised for `$(NAME)` references.
    pub fn value_of(&self, name: &str, diags: &mut Vec<Diagnostic>) -> Result<String, ConfigError> {
        if !self.is_defined(name) && !self.env.contains_key(name) {
            return Ok(String::new());
        }
        self.expand(name, diags)
    }

    /// Assigned names in first-definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Fully expanded value of `name`; undefined names expand to "".
    pub fn expand(&self, name: &str, diags: &mut Vec<Diagnostic>) -> Result<String, ConfigError> {
        let mut stack = Vec::new();
        self.expand_name(name, &mut stack, diags)
    }

    fn expand_fragments(
        &self,
        parts: &[Fragment],
        diags: &mut Vec<Diagnostic>,
    ) -> Result<String, ConfigError> {
        let mut stack = Vec::new();
        self.expand_parts(parts, &mut stack, diags)
    }

    fn expand_name(
        &self,
        name: &str,
        stack: &mut Vec<String>,
        diags: &mut Vec<Diagnostic>,
    ) -> Result<String, ConfigError> {
        if stack.iter().any(|n| n == name) {
            return Err(ConfigError::RecursiveVariable {
                name: name.to_string(),
            });
        }
        if stack.len() >= MAX_EXPANSION_DEPTH {
            return Err(ConfigError::ExpansionDepth {
                name: name.to_string(),
            });
        }

        let Some(binding) = self.vars.get(name) else {
            if let Some(value) = self.env.get(name) {
                return Ok(value.clone());
            }
            let diag = Diagnostic::UndefinedVariable {
                name: name.to_string(),
            };
            if !diags.contains(&diag) {
                diags.push(diag);
            }
            return Ok(String::new());
        };

        stack.push(name.to_string());
        let out = self.expand_parts(&binding.parts, stack, diags);
        stack.pop();
        out
    }

    fn expand_parts(
        &self,
        parts: &[Fragment],
        stack: &mut Vec<String>,
        diags: &mut Vec<Diagnostic>,
    ) -> Result<String, ConfigError> {
        let mut out = String::new();
        for part in parts {
            match part {
                Fragment::Text(t) => out.push_str(t),
                Fragment::Ref(name) => out.push_str(&self.expand_name(name, stack, diags)?),
            }
        }
        Ok(out)
    }
}

/// Parse an override value with the same rules as a file assignment, so
/// `--set LD='$(FC)'` behaves like `LD = $(FC)`.
fn override_fragments(ov: &Override) -> Result<Vec<Fragment>, ConfigError> {
    let src = format!("{} = {}", ov.name, ov.value);
    let file = parse_str("<override>", &src).map_err(|e| ConfigError::InvalidOverride {
        text: format!("{}={}", ov.name, ov.value),
        reason: e.to_string(),
    })?;
    let parts = file
        .assignments()
        .next()
        .map(|a| a.value.parts.clone())
        .unwrap_or_default();
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(src: &str, overrides: &[&str]) -> Result<(VarTable, Vec<Diagnostic>), ConfigError> {
        let file = parse_str("<test>", src).expect("parse failed");
        let overrides: Vec<Override> = overrides
            .iter()
            .map(|s| s.parse().expect("bad override"))
            .collect();
        let mut diags = Vec::new();
        let t = VarTable::build(&file, &overrides, &BTreeMap::new(), &mut diags)?;
        Ok((t, diags))
    }

    fn value(t: &VarTable, name: &str) -> String {
        t.expand(name, &mut Vec::new()).unwrap()
    }

    #[test]
    fn recursive_binding_sees_later_assignment() {
        let (t, _) = table("LD = $(FC)\nFC = mpiifx\n", &[]).unwrap();
        assert_eq!(value(&t, "LD"), "mpiifx");
    }

    #[test]
    fn simple_binding_expands_at_definition() {
        let (t, _) = table("B := $(A)x\nA = 1\n", &[]).unwrap();
        assert_eq!(value(&t, "B"), "x");
    }

    #[test]
    fn conditional_does_not_replace() {
        let (t, _) = table("FC = ifx\nFC ?= gfortran\nAR ?= ar\n", &[]).unwrap();
        assert_eq!(value(&t, "FC"), "ifx");
        assert_eq!(value(&t, "AR"), "ar");
    }

    #[test]
    fn append_adds_single_space() {
        let (t, _) = table("OPT = -O3\nOPT += -qopenmp\nNEW += x\n", &[]).unwrap();
        assert_eq!(value(&t, "OPT"), "-O3 -qopenmp");
        assert_eq!(value(&t, "NEW"), "x");
    }

    #[test]
    fn append_to_empty_value_has_no_leading_space() {
        let (t, _) = table("AR_SPEC =\nAR_SPEC += -v\n", &[]).unwrap();
        assert_eq!(value(&t, "AR_SPEC"), "-v");
    }

    #[test]
    fn self_reference_is_error() {
        let (t, _) = table("A = $(B)\nB = $(A)\n", &[]).unwrap();
        let err = t.expand("A", &mut Vec::new()).unwrap_err();
        assert_eq!(
            err,
            ConfigError::RecursiveVariable {
                name: "A".to_string()
            }
        );
    }

    #[test]
    fn simple_self_append_is_fine() {
        let (t, _) = table("A := x\nA := $(A) y\n", &[]).unwrap();
        assert_eq!(value(&t, "A"), "x y");
    }

    #[test]
    fn undefined_reference_is_reported_once() {
        let (t, _) = table("A = $(NOPE) $(NOPE)\n", &[]).unwrap();
        let mut diags = Vec::new();
        assert_eq!(t.expand("A", &mut diags).unwrap(), " ");
        assert_eq!(
            diags,
            vec![Diagnostic::UndefinedVariable {
                name: "NOPE".to_string()
            }]
        );
    }

    #[test]
    fn command_line_wins_unless_override() {
        let (t, _) = table("FC = ifx\noverride AR = xiar\n", &["FC=gfortran", "AR=ar"]).unwrap();
        assert_eq!(value(&t, "FC"), "gfortran");
        assert_eq!(value(&t, "AR"), "xiar");
    }

    #[test]
    fn override_value_may_reference_variables() {
        let (t, _) = table("FC = ifx\n", &["LD=$(FC) -static"]).unwrap();
        assert_eq!(value(&t, "LD"), "ifx -static");
    }

    #[test]
    fn environment_fills_unassigned_names() {
        let file = parse_str("<test>", "NC_INC = -I$(NETCDF_DIR)/include").unwrap();
        let env = BTreeMap::from([("NETCDF_DIR".to_string(), "/opt/nc".to_string())]);
        let t = VarTable::build(&file, &[], &env, &mut Vec::new()).unwrap();
        assert_eq!(value(&t, "NC_INC"), "-I/opt/nc/include");
    }

    fn env_table(src: &str, env: &[(&str, &str)]) -> VarTable {
        let file = parse_str("<test>", src).unwrap();
        let env: BTreeMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        VarTable::build(&file, &[], &env, &mut Vec::new()).unwrap()
    }

    #[test]
    fn environment_counts_as_defined_for_conditional() {
        let t = env_table("FC ?= gfortran\nAR ?= ar\n", &[("FC", "ifx")]);
        assert_eq!(value(&t, "FC"), "ifx");
        assert_eq!(value(&t, "AR"), "ar");
    }

    #[test]
    fn append_extends_environment_value() {
        let t = env_table("OPT += -g\n", &[("OPT", "-O2")]);
        assert_eq!(value(&t, "OPT"), "-O2 -g");
    }

    #[test]
    fn plain_assignment_replaces_environment_value() {
        let t = env_table("FC = gfortran\n", &[("FC", "ifx")]);
        assert_eq!(value(&t, "FC"), "gfortran");
    }

    #[test]
    fn absent_key_is_empty_without_diagnostic() {
        let (t, _) = table("A = $(NOPE)\n", &[]).unwrap();
        let mut diags = Vec::new();
        assert_eq!(t.value_of("CPP", &mut diags).unwrap(), "");
        assert!(diags.is_empty());
        assert_eq!(t.value_of("A", &mut diags).unwrap(), "");
        assert_eq!(
            diags,
            vec![Diagnostic::UndefinedVariable {
                name: "NOPE".to_string()
            }]
        );
    }

    #[test]
    fn override_syntax() {
        assert!("FC".parse::<Override>().is_err());
        assert!("=x".parse::<Override>().is_err());
        assert!("F C=x".parse::<Override>().is_err());
        let ov: Override = "OPT= -O2 ".parse().unwrap();
        assert_eq!(ov.value, "-O2");
    }
}
