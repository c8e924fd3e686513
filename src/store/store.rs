use std::collections::HashMap;

use anyhow::{anyhow, Result};

use super::GeomTable;

/// One analytical session: a set of named tables, rebuilt from files on
/// every run and dropped when the session goes out of scope.
#[derive(Debug, Default)]
pub struct GeomStore {
    tables: HashMap<String, GeomTable>,
}

impl GeomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Register a table under `name`. Returns `false` (and leaves the
    /// existing table untouched) when the name is already taken, so loads
    /// are idempotent within a session.
    pub fn register(&mut self, name: &str, table: GeomTable) -> bool {
        if self.tables.contains_key(name) {
            return false;
        }
        self.tables.insert(name.to_string(), table);
        true
    }

    pub fn get(&self, name: &str) -> Result<&GeomTable> {
        self.tables
            .get(name)
            .ok_or_else(|| anyhow!("no table named '{name}' in the store"))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut GeomTable> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| anyhow!("no table named '{name}' in the store"))
    }

    pub fn drop_table(&mut self, name: &str) -> bool {
        self.tables.remove(name).is_some()
    }

    /// Drop every table whose name is not in `keep`.
    pub fn retain(&mut self, keep: &[&str]) {
        self.tables.retain(|name, _| keep.contains(&name.as_str()));
    }

    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
