//! Environment handed to spawned processes
//!
//! The child sees exactly the variables held here; nothing leaks in from the
//! parent unless [`Environment::inherit`] copied it.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::process::Command;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<OsString, OsString>,
}

impl Environment {
    /// Snapshot of the current process environment
    pub fn inherit() -> Self {
        Self {
            vars: std::env::vars_os().collect(),
        }
    }

    /// No variables at all
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn without(mut self, key: impl AsRef<OsStr>) -> Self {
        self.vars.remove(key.as_ref());
        self
    }

    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars.get(key.as_ref()).map(OsString::as_os_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub(crate) fn apply(&self, command: &mut Command) {
        command.env_clear();
        command.envs(&self.vars);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let env = Environment::empty()
            .with("A", "1")
            .with("B", "2")
            .without("A");
        assert_eq!(env.len(), 1);
        assert_eq!(env.get("B"), Some(OsStr::new("2")));
        assert_eq!(env.get("A"), None);
    }

    #[test]
    fn test_later_value_wins() {
        let env = Environment::empty().with("MODE", "a").with("MODE", "b");
        assert_eq!(env.len(), 1);
        assert_eq!(env.get("MODE"), Some(OsStr::new("b")));
        assert!(Environment::empty().is_empty());
    }

    #[test]
    fn test_inherit_sees_path() {
        if std::env::var_os("PATH").is_some() {
            assert!(Environment::inherit().get("PATH").is_some());
        }
    }
}
