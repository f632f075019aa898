//! Engine configuration from environment variables.

use std::str::FromStr;
use std::time::Duration;

use duelcard_domain::CriticalRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub store: StoreBackend,
    pub db_path: String,
    /// How long a card may wait on one side before the view shows a notice.
    pub stale_wait: Duration,
    /// Compare-and-swap attempts per card update before giving up.
    pub update_retries: u32,
    pub critical_rules: CriticalRules,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::Memory,
            db_path: "duelcard.db".into(),
            stale_wait: Duration::from_secs(60),
            update_retries: 5,
            critical_rules: CriticalRules::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            store: parsed(&lookup, "DUELCARD_STORE", defaults.store),
            db_path: lookup("DUELCARD_DB").unwrap_or(defaults.db_path),
            stale_wait: Duration::from_secs(parsed(
                &lookup,
                "DUELCARD_STALE_WAIT_SECS",
                defaults.stale_wait.as_secs(),
            )),
            update_retries: parsed(&lookup, "DUELCARD_UPDATE_RETRIES", defaults.update_retries)
                .max(1),
            critical_rules: CriticalRules {
                allow_lucky: parsed(
                    &lookup,
                    "DUELCARD_ALLOW_LUCKY",
                    defaults.critical_rules.allow_lucky,
                ),
                allow_unlucky: parsed(
                    &lookup,
                    "DUELCARD_ALLOW_UNLUCKY",
                    defaults.critical_rules.allow_unlucky,
                ),
            },
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, default = ?default, "Ignoring invalid setting");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(EngineConfig::from_lookup(lookup(&[])), EngineConfig::default());
    }

    #[test]
    fn values_are_read_from_the_environment() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("DUELCARD_STORE", "sqlite"),
            ("DUELCARD_DB", "/tmp/table.db"),
            ("DUELCARD_STALE_WAIT_SECS", "15"),
            ("DUELCARD_UPDATE_RETRIES", "9"),
            ("DUELCARD_ALLOW_UNLUCKY", "false"),
        ]));
        assert_eq!(config.store, StoreBackend::Sqlite);
        assert_eq!(config.db_path, "/tmp/table.db");
        assert_eq!(config.stale_wait, Duration::from_secs(15));
        assert_eq!(config.update_retries, 9);
        assert!(config.critical_rules.allow_lucky);
        assert!(!config.critical_rules.allow_unlucky);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("DUELCARD_STORE", "postgres"),
            ("DUELCARD_STALE_WAIT_SECS", "soon"),
            ("DUELCARD_UPDATE_RETRIES", "0"),
        ]));
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.stale_wait, Duration::from_secs(60));
        assert_eq!(config.update_retries, 1);
    }
}
