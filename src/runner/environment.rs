use std::{
    collections::{btree_map, BTreeMap},
    path::Path,
};

pub const WINEPREFIX: &str = "WINEPREFIX";
pub const WINEDEBUG: &str = "WINEDEBUG";
pub const WINEBOOT_HIDE_DIALOG: &str = "WINEBOOT_HIDE_DIALOG";

/// Environment handed to a wine process
///
/// Keys are unique, setting an existing key replaces its value so layering
/// sources with [`Environment::extend`] lets the last source win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults every bottle invocation starts from
    pub fn for_prefix(prefix: &Path) -> Self {
        let mut env = Self::prefix_only(prefix);
        env.set(WINEDEBUG, "fixme-all");
        env.set(WINEBOOT_HIDE_DIALOG, "1");
        env
    }

    /// Only `WINEPREFIX`, used when talking to wineserver
    pub fn prefix_only(prefix: &Path) -> Self {
        let mut env = Self::new();
        env.set(WINEPREFIX, prefix.to_string_lossy());
        env
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.vars.iter()
    }

    /// Size in bytes of the `KEY=value\0` block the child receives
    pub fn byte_size(&self) -> usize {
        self.vars.iter().map(|(k, v)| k.len() + v.len() + 2).sum()
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Environment {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = Self::new();
        env.extend(iter);
        env
    }
}

impl<'a> IntoIterator for &'a Environment {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.iter()
    }
}

impl IntoIterator for Environment {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.into_iter()
    }
}
