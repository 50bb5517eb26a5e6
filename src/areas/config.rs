//! Configuration
//!
//! # Scopes
//!
//! - **Global**: user-level settings
//! - **Local**: repository settings in `.grove/config.toml`
//!
//! Local values override global ones. Writes always go to the local file.
//!
//! # Global Config Location
//!
//! 1. `$GROVE_CONFIG_GLOBAL` if set
//! 2. `<config dir>/grove/config.toml` (e.g. `$XDG_CONFIG_HOME/grove/config.toml`)
//!
//! # Keys
//!
//! Keys are dotted: `section.key` or `section.subsection.key`. The subsection
//! may itself contain dots or slashes (`branch.feature/x.remote`) and maps to a
//! nested TOML table:
//!
//! ```toml
//! [core]
//! hash = "sha1"
//!
//! [branch."feature/x"]
//! remote = "origin"
//! merge = "refs/heads/feature/x"
//! ```

use crate::artifacts::core::error::{Error, Result};
use crate::artifacts::core::fsutil;
use crate::artifacts::objects::object_id::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// File name of the local configuration inside the repository directory
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the global configuration path
pub const GLOBAL_CONFIG_ENV: &str = "GROVE_CONFIG_GLOBAL";

const READ_ONLY_KEYS: &[(&str, Option<&str>, &str)] = &[("core", None, "hash")];

/// `[core]` section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreSection {
    #[serde(default)]
    pub hash: HashAlgorithm,
}

/// Parsed dotted key
#[derive(Debug, Clone, PartialEq, Eq)]
struct Key<'k> {
    section: &'k str,
    subsection: Option<&'k str>,
    name: &'k str,
}

impl<'k> Key<'k> {
    fn parse(key: &'k str) -> Result<Self> {
        let invalid = |reason| Error::invalid_argument("config_key", key, reason);
        let is_identifier =
            |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        let (section, rest) = key
            .split_once('.')
            .ok_or_else(|| invalid("expected 'section.key'"))?;
        let (subsection, name) = match rest.rsplit_once('.') {
            Some((subsection, name)) => (Some(subsection), name),
            None => (None, rest),
        };

        if !is_identifier(section) || !is_identifier(name) {
            return Err(invalid("section and key must be alphanumeric"));
        }
        if subsection.is_some_and(str::is_empty) {
            return Err(invalid("empty subsection"));
        }

        Ok(Key {
            section,
            subsection,
            name,
        })
    }

    /// Keys fixed at init: object ids already on disk depend on them
    fn check_writable(&self, operation: &'static str, key: &str) -> Result<()> {
        if READ_ONLY_KEYS.contains(&(self.section, self.subsection, self.name)) {
            return Err(Error::invalid_argument(operation, key, "read-only after init"));
        }
        Ok(())
    }

    /// Table path leading to the value
    fn tables(&self) -> Vec<&'k str> {
        std::iter::once(self.section).chain(self.subsection).collect()
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(value) => value.clone(),
        other => other.to_string(),
    }
}

fn lookup<'t>(table: &'t Table, key: &Key) -> Option<&'t Value> {
    let mut current = table;
    for name in key.tables() {
        current = current.get(name)?.as_table()?;
    }
    current.get(key.name)
}

fn remove(table: &mut Table, path: &[&str], name: &str) -> Option<Value> {
    match path.split_first() {
        None => table.remove(name),
        Some((first, rest)) => match table.get_mut(*first) {
            Some(Value::Table(child)) => remove(child, rest, name),
            _ => None,
        },
    }
}

/// Remove the tables along `path` that were left empty, deepest first
fn prune(table: &mut Table, path: &[&str]) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    let Some(Value::Table(child)) = table.get_mut(*first) else {
        return;
    };

    prune(child, rest);
    if child.is_empty() {
        table.remove(*first);
    }
}

/// Flatten nested tables into dotted keys
fn flatten(prefix: &str, table: &Table, out: &mut Vec<(String, String)>) {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        match value {
            Value::Table(inner) => flatten(&key, inner, out),
            other => out.push((key, display_value(other))),
        }
    }
}

/// One configuration file
#[derive(Debug, Clone, Default)]
struct ConfigFile {
    path: Option<PathBuf>,
    table: Table,
}

impl ConfigFile {
    fn load(path: Option<PathBuf>) -> Result<Self> {
        let Some(file_path) = path.as_deref() else {
            return Ok(ConfigFile::default());
        };

        let table = match std::fs::read_to_string(file_path) {
            Ok(content) => content
                .parse::<Table>()
                .map_err(|e| Error::corrupt("load_config", file_path.display(), e.message()))?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Table::new(),
            Err(error) => return Err(Error::io("load_config", file_path.display())(error)),
        };

        Ok(ConfigFile { path, table })
    }

    fn save(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let content = toml::to_string(&self.table)
            .map_err(|e| Error::invalid_argument("write_config", path.display(), e))?;

        fsutil::write_atomically("write_config", path, content.as_bytes())
    }
}

/// Merged configuration of a repository
#[derive(Debug, Clone, Default)]
pub struct Config {
    global: ConfigFile,
    local: ConfigFile,
}

impl Config {
    /// Location of the global configuration file, if one can be determined
    pub fn global_path() -> Option<PathBuf> {
        match std::env::var_os(GLOBAL_CONFIG_ENV) {
            Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => dirs::config_dir().map(|dir| dir.join("grove").join(CONFIG_FILE)),
        }
    }

    /// Load the global file and the repository's local file
    ///
    /// Missing files are empty; unparsable ones are errors.
    pub fn load(git_dir: &Path) -> Result<Self> {
        Self::load_from(git_dir.join(CONFIG_FILE), Self::global_path())
    }

    pub fn load_from(local: PathBuf, global: Option<PathBuf>) -> Result<Self> {
        Ok(Config {
            global: ConfigFile::load(global)?,
            local: ConfigFile::load(Some(local))?,
        })
    }

    pub fn local_path(&self) -> Option<&Path> {
        self.local.path.as_deref()
    }

    /// Value of a key, local first
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let key = Key::parse(key)?;

        Ok(lookup(&self.local.table, &key)
            .or_else(|| lookup(&self.global.table, &key))
            .map(display_value))
    }

    /// Set a key in the local file and persist it
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parsed = Key::parse(key)?;
        parsed.check_writable("config_set", key)?;

        let mut table = &mut self.local.table;
        for name in parsed.tables() {
            let entry = table
                .entry(name.to_string())
                .or_insert_with(|| Value::Table(Table::new()));
            if !entry.is_table() {
                *entry = Value::Table(Table::new());
            }
            table = entry
                .as_table_mut()
                .ok_or_else(|| Error::invalid_argument("config_set", key, "not a section"))?;
        }
        table.insert(parsed.name.to_string(), Value::String(value.to_string()));
        tracing::debug!(key, value, "set config value");

        self.local.save()
    }

    /// Remove a key from the local file
    ///
    /// # Returns
    ///
    /// Whether the key was present
    pub fn unset(&mut self, key: &str) -> Result<bool> {
        let parsed = Key::parse(key)?;
        parsed.check_writable("config_unset", key)?;

        let tables = parsed.tables();
        if remove(&mut self.local.table, &tables, parsed.name).is_none() {
            return Ok(false);
        }
        prune(&mut self.local.table, &tables);
        tracing::debug!(key, "unset config value");

        self.local.save()?;
        Ok(true)
    }

    /// Every key with its effective value, sorted
    pub fn list(&self) -> Vec<(String, String)> {
        let mut global = Vec::new();
        flatten("", &self.global.table, &mut global);
        let mut local = Vec::new();
        flatten("", &self.local.table, &mut local);

        let mut merged = std::collections::BTreeMap::new();
        merged.extend(global);
        merged.extend(local);
        merged.into_iter().collect()
    }

    pub fn core(&self) -> Result<CoreSection> {
        match self.local.table.get("core") {
            Some(value) => value
                .clone()
                .try_into()
                .map_err(|e: toml::de::Error| Error::corrupt("load_config", "core", e.message())),
            None => Ok(CoreSection::default()),
        }
    }

    /// Write the `[core]` section, replacing any previous one
    ///
    /// Only repository creation calls this; `core.hash` cannot change once
    /// objects exist.
    pub(crate) fn init_core(&mut self, core: CoreSection) -> Result<()> {
        let value = Value::try_from(core)
            .map_err(|e| Error::invalid_argument("config_init", "core", e))?;
        self.local.table.insert("core".to_string(), value);

        self.local.save()
    }

    pub fn user_name(&self) -> Result<Option<String>> {
        self.get("user.name")
    }

    pub fn user_email(&self) -> Result<Option<String>> {
        self.get("user.email")
    }

    /// `(remote, merge)` configured for a local branch
    pub fn branch_upstream(&self, branch: &str) -> Result<Option<(String, String)>> {
        let remote = self.get(&format!("branch.{branch}.remote"))?;
        let merge = self.get(&format!("branch.{branch}.merge"))?;

        Ok(remote.zip(merge))
    }

    pub fn set_branch_upstream(&mut self, branch: &str, remote: &str, merge: &str) -> Result<()> {
        self.set(&format!("branch.{branch}.remote"), remote)?;
        self.set(&format!("branch.{branch}.merge"), merge)
    }

    pub fn unset_branch_upstream(&mut self, branch: &str) -> Result<()> {
        self.unset(&format!("branch.{branch}.remote"))?;
        self.unset(&format!("branch.{branch}.merge"))?;
        Ok(())
    }
}
