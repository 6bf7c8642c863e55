//! Secret loading: a TOML secrets file first, then the process environment.
//!
//! Each source must supply every required key on its own; keys are never
//! mixed across sources. When neither source is complete the loader logs
//! what is missing and yields nothing, and the server runs unconfigured.

use crate::config::AppConfig;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Completion service credential
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Geocoding service credential
pub const HERE_API_KEY: &str = "HERE_API_KEY";
/// MySQL host
pub const CHAT311_HOSTNAME: &str = "CHAT311_HOSTNAME";
/// MySQL database name
pub const CHAT311_DATABASE: &str = "CHAT311_DATABASE";
/// MySQL user
pub const CHAT311_USERNAME: &str = "CHAT311_USERNAME";
/// MySQL password
pub const CHAT311_PASSWORD: &str = "CHAT311_PASSWORD";

/// The fixed key set
pub const SECRET_KEYS: [&str; 6] = [
    OPENAI_API_KEY,
    HERE_API_KEY,
    CHAT311_HOSTNAME,
    CHAT311_DATABASE,
    CHAT311_USERNAME,
    CHAT311_PASSWORD,
];

/// Where a complete set of secrets was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    /// The secrets file
    File,
    /// Process environment variables
    Environment,
}

/// A complete set of credentials
#[derive(Clone)]
pub struct Secrets {
    values: HashMap<&'static str, String>,
    source: SecretSource,
}

impl Secrets {
    /// Keys `config` cannot run without
    pub fn required_keys(config: &AppConfig) -> Vec<&'static str> {
        let mut keys = vec![OPENAI_API_KEY];
        if config.needs_geocoder() {
            keys.push(HERE_API_KEY);
        }
        if config.needs_mysql() {
            keys.extend([CHAT311_HOSTNAME, CHAT311_DATABASE, CHAT311_USERNAME, CHAT311_PASSWORD]);
        }
        keys
    }

    /// Load from `path`, falling back to the environment
    pub fn load(path: &Path, required: &[&'static str]) -> Option<Self> {
        let file = read_secrets_file(path);
        Self::load_from(file.as_ref(), required, |key| std::env::var(key).ok())
    }

    /// Resolve secrets from an already-read file table and an environment lookup
    pub fn load_from(
        file: Option<&HashMap<String, String>>,
        required: &[&'static str],
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<Self> {
        if let Some(table) = file {
            match Self::collect(required, |key| table.get(key).cloned(), SecretSource::File) {
                Ok(secrets) => {
                    info!("Loaded configuration from secrets file");
                    return Some(secrets);
                }
                Err(missing) => {
                    for key in missing {
                        warn!("Variable missing from secrets file: {}", key);
                    }
                    warn!("Unable to load configuration from secrets file");
                }
            }
        }

        match Self::collect(required, &env, SecretSource::Environment) {
            Ok(secrets) => {
                info!("Loaded configuration from shell environment");
                Some(secrets)
            }
            Err(missing) => {
                for key in missing {
                    warn!("Variable missing from shell environment: {}", key);
                }
                warn!("Unable to load configuration from secrets file or shell environment");
                None
            }
        }
    }

    fn collect(
        required: &[&'static str],
        lookup: impl Fn(&str) -> Option<String>,
        source: SecretSource,
    ) -> Result<Self, Vec<&'static str>> {
        let values: HashMap<&'static str, String> = SECRET_KEYS
            .iter()
            .filter_map(|key| {
                lookup(*key)
                    .filter(|value| !value.is_empty())
                    .map(|value| (*key, value))
            })
            .collect();

        let missing: Vec<&'static str> = required
            .iter()
            .copied()
            .filter(|key| !values.contains_key(key))
            .collect();

        if missing.is_empty() {
            Ok(Self { values, source })
        } else {
            Err(missing)
        }
    }

    /// Value for one of [`SECRET_KEYS`]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Where these secrets came from
    pub fn source(&self) -> SecretSource {
        self.source
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("Secrets")
            .field("keys", &keys)
            .field("source", &self.source)
            .finish()
    }
}

/// Read the string values of [`SECRET_KEYS`] from a TOML file
///
/// Other entries (numbers, sections, unrelated keys) are ignored.
fn read_secrets_file(path: &Path) -> Option<HashMap<String, String>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Unable to read secrets file {}: {}", path.display(), e);
            return None;
        }
    };
    match contents.parse::<toml::Table>() {
        Ok(table) => Some(secret_entries(&table)),
        Err(e) => {
            warn!("Unable to parse secrets file {}: {}", path.display(), e);
            None
        }
    }
}

fn secret_entries(table: &toml::Table) -> HashMap<String, String> {
    SECRET_KEYS
        .iter()
        .filter_map(|key| match table.get(*key) {
            Some(toml::Value::String(value)) => Some((key.to_string(), value.clone())),
            Some(_) => {
                warn!("Secrets file entry {} is not a string", key);
                None
            }
            None => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseKind;

    fn table(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_required_keys_follow_config() {
        let mut config = AppConfig::default();
        assert_eq!(Secrets::required_keys(&config), vec![OPENAI_API_KEY, HERE_API_KEY]);

        config.builder.coordinate_strategy = chat311_builder::CoordinateStrategy::Model;
        config.storage.database = DatabaseKind::Mysql;
        assert_eq!(
            Secrets::required_keys(&config),
            vec![OPENAI_API_KEY, CHAT311_HOSTNAME, CHAT311_DATABASE, CHAT311_USERNAME, CHAT311_PASSWORD]
        );
    }

    #[test]
    fn test_file_wins_when_complete() {
        let file = table(&[(OPENAI_API_KEY, "sk-file"), (HERE_API_KEY, "here-file")]);
        let secrets = Secrets::load_from(Some(&file), &[OPENAI_API_KEY], |_| Some("env".to_string())).unwrap();

        assert_eq!(secrets.source(), SecretSource::File);
        assert_eq!(secrets.get(OPENAI_API_KEY), Some("sk-file"));
        // optional keys present in the chosen source are kept
        assert_eq!(secrets.get(HERE_API_KEY), Some("here-file"));
    }

    #[test]
    fn test_incomplete_file_falls_back_to_environment() {
        let file = table(&[(OPENAI_API_KEY, "sk-file")]);
        let env = |key: &str| match key {
            OPENAI_API_KEY => Some("sk-env".to_string()),
            HERE_API_KEY => Some("here-env".to_string()),
            _ => None,
        };

        let secrets = Secrets::load_from(Some(&file), &[OPENAI_API_KEY, HERE_API_KEY], env).unwrap();

        assert_eq!(secrets.source(), SecretSource::Environment);
        assert_eq!(secrets.get(OPENAI_API_KEY), Some("sk-env"));
    }

    #[test]
    fn test_nothing_complete_is_none() {
        let file = table(&[(HERE_API_KEY, "here")]);
        assert!(Secrets::load_from(Some(&file), &[OPENAI_API_KEY], no_env).is_none());
        assert!(Secrets::load_from(None, &[OPENAI_API_KEY], no_env).is_none());
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let file = table(&[(OPENAI_API_KEY, "")]);
        assert!(Secrets::load_from(Some(&file), &[OPENAI_API_KEY], no_env).is_none());
    }

    #[test]
    fn test_debug_hides_values() {
        let file = table(&[(OPENAI_API_KEY, "sk-very-secret")]);
        let secrets = Secrets::load_from(Some(&file), &[OPENAI_API_KEY], no_env).unwrap();
        let rendered = format!("{:?}", secrets);
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains(OPENAI_API_KEY));
    }

    #[test]
    fn test_load_ignores_non_string_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        std::fs::write(
            &path,
            "OPENAI_API_KEY = \"sk-from-disk\"\nDB_PORT = 3306\n\n[connections.chat311]\nurl = \"mysql://x\"\n",
        )
        .unwrap();

        let secrets = Secrets::load(&path, &[OPENAI_API_KEY]).unwrap();
        assert_eq!(secrets.source(), SecretSource::File);
        assert_eq!(secrets.get(OPENAI_API_KEY), Some("sk-from-disk"));
    }

    #[test]
    fn test_non_string_secret_counts_as_missing() {
        let table: toml::Table = "OPENAI_API_KEY = 42\nHERE_API_KEY = \"here\"\n".parse().unwrap();
        let entries = secret_entries(&table);

        assert_eq!(entries.get(HERE_API_KEY).map(String::as_str), Some("here"));
        assert!(!entries.contains_key(OPENAI_API_KEY));
    }

    #[test]
    fn test_load_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        std::fs::write(&path, "OPENAI_API_KEY = \"sk-from-disk\"\n").unwrap();

        let secrets = Secrets::load(&path, &[OPENAI_API_KEY]).unwrap();
        assert_eq!(secrets.get(OPENAI_API_KEY), Some("sk-from-disk"));
        assert_eq!(secrets.source(), SecretSource::File);
    }
}
