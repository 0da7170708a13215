use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;

use crate::models::Role;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".employee-directory";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "directory.sqlite";
const LOG_FILE_NAME: &str = "directory.log";
/// Last role picked in the UI, kept next to the database file.
const ROLE_FILE_NAME: &str = "role";
const DEFAULT_LOG_FILTER: &str = "employee_directory=info";

pub const DB_PATH_VAR: &str = "EMPLOYEE_DIRECTORY_DB";
pub const LOG_PATH_VAR: &str = "EMPLOYEE_DIRECTORY_LOG";
pub const ROLE_VAR: &str = "EMPLOYEE_DIRECTORY_ROLE";
pub const LOG_FILTER_VAR: &str = "RUST_LOG";

/// Runtime settings resolved from the environment.
///
/// | Env var                   | Default                                    |
/// |---------------------------|--------------------------------------------|
/// | `EMPLOYEE_DIRECTORY_DB`   | `~/.employee-directory/directory.sqlite`   |
/// | `EMPLOYEE_DIRECTORY_LOG`  | `~/.employee-directory/directory.log`      |
/// | `EMPLOYEE_DIRECTORY_ROLE` | saved role, else `visitor`                 |
/// | `RUST_LOG`                | `employee_directory=info`                  |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    /// Role the UI starts in. Switchable at runtime; never enforced.
    pub role: Role,
    /// Where the UI saves the role it was last switched to.
    pub role_path: PathBuf,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve settings through an arbitrary lookup so tests do not have to
    /// mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = match value(DB_PATH_VAR) {
            Some(path) => PathBuf::from(path),
            None => data_dir()?.join(DB_FILE_NAME),
        };
        let log_path = match value(LOG_PATH_VAR) {
            Some(path) => PathBuf::from(path),
            None => data_dir()?.join(LOG_FILE_NAME),
        };
        let role_path = db_path.with_file_name(ROLE_FILE_NAME);
        // An unreadable or garbled saved role falls back to the default.
        let role = match value(ROLE_VAR) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("{ROLE_VAR} has an invalid value"))?,
            None => load_role(&role_path).ok().flatten().unwrap_or_default(),
        };
        let log_filter = value(LOG_FILTER_VAR).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            db_path,
            log_path,
            role,
            role_path,
            log_filter,
        })
    }
}

/// Read a previously saved role. `Ok(None)` when nothing was saved yet.
pub fn load_role(path: &Path) -> Result<Option<Role>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()))
        }
    };
    let role = raw
        .parse::<Role>()
        .with_context(|| format!("{} holds an invalid role", path.display()))?;
    Ok(Some(role))
}

/// Persist the role so the next start picks it up.
pub fn save_role(path: &Path, role: Role) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", role.key()))
        .with_context(|| format!("failed to save role to {}", path.display()))
}

/// Resolve the application data directory inside the user's home.
fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;

    fn lookup(pairs: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn paths(dir: &TempDir) -> Vec<(&'static str, String)> {
        vec![
            (DB_PATH_VAR, dir.path().join("dir.sqlite").display().to_string()),
            (LOG_PATH_VAR, dir.path().join("dir.log").display().to_string()),
        ]
    }

    #[test]
    fn explicit_values_win() {
        let dir = TempDir::new().unwrap();
        let mut pairs = paths(&dir);
        pairs.push((ROLE_VAR, "admin".to_string()));
        pairs.push((LOG_FILTER_VAR, "debug".to_string()));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.db_path, dir.path().join("dir.sqlite"));
        assert_eq!(config.log_path, dir.path().join("dir.log"));
        assert_eq!(config.role_path, dir.path().join("role"));
        assert_eq!(config.role, Role::Admin);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn role_and_filter_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let mut pairs = paths(&dir);
        pairs.push((ROLE_VAR, "  ".to_string()));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.role, Role::Visitor);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut pairs = paths(&dir);
        pairs.push((ROLE_VAR, "owner".to_string()));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();

        assert!(format!("{err:#}").contains("unknown role 'owner'"));
    }

    #[test]
    fn saved_role_is_loaded_on_next_start() {
        let dir = TempDir::new().unwrap();
        let pairs = paths(&dir);
        let first = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(load_role(&first.role_path).unwrap(), None);

        save_role(&first.role_path, Role::Employee).unwrap();
        assert_eq!(load_role(&first.role_path).unwrap(), Some(Role::Employee));

        let second = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(second.role, Role::Employee);
    }

    #[test]
    fn env_role_beats_saved_role() {
        let dir = TempDir::new().unwrap();
        save_role(&dir.path().join(ROLE_FILE_NAME), Role::Employee).unwrap();

        let mut pairs = paths(&dir);
        pairs.push((ROLE_VAR, "admin".to_string()));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.role, Role::Admin);
    }

    #[test]
    fn garbled_saved_role_falls_back_to_visitor() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(ROLE_FILE_NAME), "owner").unwrap();

        let config = Config::from_lookup(lookup(&paths(&dir))).unwrap();
        assert!(load_role(&config.role_path).is_err());
        assert_eq!(config.role, Role::Visitor);
    }
}
