use std::{net::SocketAddr, str::FromStr, time::Duration};

use crate::{app_error, error::AppError};

pub const DEFAULT_NAMESPACE: &str = "code-analyzer";
pub const DEFAULT_EVENT_LIMIT: usize = 5;
pub const DEFAULT_KIND_TIMEOUT: Duration = Duration::from_secs(10);

const BIND_ADDR: &str = "INSIGHT_BIND_ADDR";
const DEFAULT_NAMESPACE_VAR: &str = "INSIGHT_DEFAULT_NAMESPACE";
const KIND_TIMEOUT_SECS: &str = "INSIGHT_KIND_TIMEOUT_SECS";
const EVENT_LIMIT: &str = "INSIGHT_EVENT_LIMIT";
const SKIP_DISCOVERY: &str = "INSIGHT_SKIP_DISCOVERY";

/// Runtime settings, read from the process environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub default_namespace: String,
    /// Upper bound for a single resource-kind list call.
    pub kind_timeout: Duration,
    /// How many of the most recent events end up in a snapshot.
    pub event_limit: usize,
    pub skip_discovery: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            kind_timeout: DEFAULT_KIND_TIMEOUT,
            event_limit: DEFAULT_EVENT_LIMIT,
            skip_discovery: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let bind_addr = parse_var(&lookup, BIND_ADDR)?.unwrap_or(defaults.bind_addr);

        let default_namespace = match lookup(DEFAULT_NAMESPACE_VAR) {
            Some(ns) if ns.trim().is_empty() => {
                return Err(app_error!("{DEFAULT_NAMESPACE_VAR} must not be empty"));
            }
            Some(ns) => ns.trim().to_string(),
            None => defaults.default_namespace,
        };

        let kind_timeout = match parse_var::<u64>(&lookup, KIND_TIMEOUT_SECS)? {
            Some(0) => return Err(app_error!("{KIND_TIMEOUT_SECS} must be greater than zero")),
            Some(secs) => Duration::from_secs(secs),
            None => defaults.kind_timeout,
        };

        let event_limit = match parse_var::<usize>(&lookup, EVENT_LIMIT)? {
            Some(0) => return Err(app_error!("{EVENT_LIMIT} must be greater than zero")),
            Some(limit) => limit,
            None => defaults.event_limit,
        };
        let skip_discovery = parse_var(&lookup, SKIP_DISCOVERY)?.unwrap_or(defaults.skip_discovery);

        Ok(Self {
            bind_addr,
            default_namespace,
            kind_timeout,
            event_limit,
            skip_discovery,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| app_error!("Can't parse {key}={raw}: {e}")),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(config.default_namespace, "code-analyzer");
        assert_eq!(config.kind_timeout, Duration::from_secs(10));
        assert_eq!(config.event_limit, 5);
        assert!(!config.skip_discovery);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("INSIGHT_BIND_ADDR", "127.0.0.1:8080"),
            ("INSIGHT_DEFAULT_NAMESPACE", " staging "),
            ("INSIGHT_KIND_TIMEOUT_SECS", "3"),
            ("INSIGHT_EVENT_LIMIT", "20"),
            ("INSIGHT_SKIP_DISCOVERY", "true"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.default_namespace, "staging");
        assert_eq!(config.kind_timeout, Duration::from_secs(3));
        assert_eq!(config.event_limit, 20);
        assert!(config.skip_discovery);
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = Config::from_lookup(lookup(&[("INSIGHT_EVENT_LIMIT", "five")])).unwrap_err();
        assert!(err.message.contains("INSIGHT_EVENT_LIMIT=five"), "{err}");

        let err = Config::from_lookup(lookup(&[("INSIGHT_KIND_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(err.message.contains("greater than zero"), "{err}");

        let err = Config::from_lookup(lookup(&[("INSIGHT_EVENT_LIMIT", "0")])).unwrap_err();
        assert!(err.message.contains("INSIGHT_EVENT_LIMIT must be greater than zero"), "{err}");

        let err = Config::from_lookup(lookup(&[("INSIGHT_DEFAULT_NAMESPACE", "  ")])).unwrap_err();
        assert!(err.message.contains("must not be empty"), "{err}");
    }
}
