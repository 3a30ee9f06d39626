use serde::Serialize;

/// Where the compiler writes `.mod` interface files (MODULEOPT).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleOutputPolicy {
    flag: Option<String>,
}

impl ModuleOutputPolicy {
    pub fn new(value: &str) -> Self {
        let value = value.trim();
        ModuleOutputPolicy {
            flag: (!value.is_empty()).then(|| value.to_string()),
        }
    }

    pub fn flag(&self) -> Option<&str> {
        self.flag.as_deref()
    }

    /// Arguments that place module files in `dir`. Empty when the compiler
    /// default (the working directory) is used.
    pub fn args(&self, dir: &str) -> Vec<String> {
        match self.flag.as_deref() {
            None => Vec::new(),
            Some("-J") => vec![format!("-J{}", dir)],
            Some(flag) => vec![flag.to_string(), dir.to_string()],
        }
    }
}
