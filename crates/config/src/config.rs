use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const DEFAULT_CHAIN_ID: &str = "dev";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_DATADIR: &str = "register-db";
const DEFAULT_MAX_SLOTS: usize = 100;
const DEFAULT_MAX_CHUNK_SIZE: u64 = 100;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_MAX_FETCH_ATTEMPTS: u32 = 5;
const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
/// Upper bound of `fetcher.max_slots` and `fetcher.max_chunk_size`.
const FETCHER_LIMIT: u64 = 10_000;
const DEFAULT_SUBSCRIBER_BUFFER: usize = 100;
const DEFAULT_REGISTER_METHOD: &str = "tokenscout_registerToken";
const DEFAULT_REGISTER_SUFFIX: &str = "_gnoswap_register";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// JSON-RPC endpoint of the remote chain node.
    pub remote_url: String,

    /// Chain every fetched block is expected to belong to.
    #[serde(default = "default_chain_id")]
    pub chain_id: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// The data directory where database contents reside.
    #[serde(default = "default_datadir")]
    pub datadir: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            datadir: default_datadir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherSection {
    /// Upper bound on ranges reserved at once.
    #[serde(default = "default_max_slots")]
    pub max_slots: usize,

    /// Upper bound on heights per range.
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_max_fetch_attempts")]
    pub max_fetch_attempts: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl FetcherSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for FetcherSection {
    fn default() -> Self {
        Self {
            max_slots: DEFAULT_MAX_SLOTS,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_fetch_attempts: DEFAULT_MAX_FETCH_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Skip packages that don't build a banker from literal metadata.
    #[serde(default)]
    pub require_banker_metadata: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Events buffered per subscriber before new ones are dropped.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    /// Registration service endpoint. Registration is only logged when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default = "default_register_method")]
    pub method: String,

    /// Appended to a package path to name its registration realm.
    #[serde(default = "default_register_suffix")]
    pub register_suffix: String,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            method: default_register_method(),
            register_suffix: default_register_suffix(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Service label to append to the service name (e.g., "prod", "dev").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_label: Option<String>,

    /// Directory path for file-based logging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_prefix: Option<String>,

    /// Use JSON format for logs instead of compact format.
    #[serde(default)]
    pub json_format: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub client: ClientConfig,

    #[serde(default)]
    pub db: DbConfig,

    #[serde(default)]
    pub fetcher: FetcherSection,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub registrar: RegistrarConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Checks the values serde can't.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("client.remote_url", &self.client.remote_url)?;
        if self.client.chain_id.trim().is_empty() {
            return Err(ConfigError::invalid("client.chain_id", "must not be empty"));
        }
        check_fetcher_bound(
            "fetcher.max_slots",
            u64::try_from(self.fetcher.max_slots).unwrap_or(u64::MAX),
        )?;
        check_fetcher_bound("fetcher.max_chunk_size", self.fetcher.max_chunk_size)?;
        if self.fetcher.max_fetch_attempts == 0 {
            return Err(ConfigError::invalid(
                "fetcher.max_fetch_attempts",
                "must be positive",
            ));
        }
        if let Some(endpoint) = &self.registrar.endpoint {
            check_url("registrar.endpoint", endpoint)?;
        }
        if self.registrar.method.is_empty() {
            return Err(ConfigError::invalid("registrar.method", "must not be empty"));
        }
        Ok(())
    }
}

fn check_fetcher_bound(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if !(1..=FETCHER_LIMIT).contains(&value) {
        return Err(ConfigError::invalid(
            field,
            format!("{value} is outside 1..={FETCHER_LIMIT}"),
        ));
    }
    Ok(())
}

fn check_url(field: &'static str, url: &str) -> Result<(), ConfigError> {
    let host = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| ConfigError::invalid(field, format!("'{url}' is not an http(s) url")))?;

    if host.is_empty() || host.starts_with('/') || host.contains(char::is_whitespace) {
        return Err(ConfigError::invalid(field, format!("'{url}' has no valid host")));
    }
    Ok(())
}

fn default_chain_id() -> String {
    DEFAULT_CHAIN_ID.to_owned()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_datadir() -> PathBuf {
    DEFAULT_DATADIR.into()
}

fn default_max_slots() -> usize {
    DEFAULT_MAX_SLOTS
}

fn default_max_chunk_size() -> u64 {
    DEFAULT_MAX_CHUNK_SIZE
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_max_fetch_attempts() -> u32 {
    DEFAULT_MAX_FETCH_ATTEMPTS
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

fn default_subscriber_buffer() -> usize {
    DEFAULT_SUBSCRIBER_BUFFER
}

fn default_register_method() -> String {
    DEFAULT_REGISTER_METHOD.to_owned()
}

fn default_register_suffix() -> String {
    DEFAULT_REGISTER_SUFFIX.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Config {
        toml::from_str::<Config>(s).expect("config parses")
    }

    #[test]
    fn test_config_load() {
        let config = parse(
            r#"
            [client]
            remote_url = "http://127.0.0.1:26657"
            chain_id = "test5"
            request_timeout_ms = 2500

            [db]
            datadir = "/path/to/data/directory"

            [fetcher]
            max_slots = 8
            max_chunk_size = 50
            poll_interval_ms = 200
            max_fetch_attempts = 3
            retry_delay_ms = 100

            [detection]
            require_banker_metadata = true

            [events]
            subscriber_buffer = 16

            [registrar]
            endpoint = "http://127.0.0.1:8645"
            method = "register"
            register_suffix = "_reg"

            [logging]
            json_format = true
            log_dir = "logs"
        "#,
        );

        assert_eq!(config.client.chain_id, "test5");
        assert_eq!(config.client.request_timeout(), Duration::from_millis(2500));
        assert_eq!(config.db.datadir, PathBuf::from("/path/to/data/directory"));
        assert_eq!(config.fetcher.max_slots, 8);
        assert_eq!(config.fetcher.max_chunk_size, 50);
        assert_eq!(config.fetcher.poll_interval(), Duration::from_millis(200));
        assert_eq!(config.fetcher.retry_delay(), Duration::from_millis(100));
        assert!(config.detection.require_banker_metadata);
        assert_eq!(config.events.subscriber_buffer, 16);
        assert_eq!(
            config.registrar.endpoint.as_deref(),
            Some("http://127.0.0.1:8645")
        );
        assert_eq!(config.registrar.register_suffix, "_reg");
        assert!(config.logging.json_format);
        assert_eq!(config.logging.log_dir, Some(PathBuf::from("logs")));
        config.validate().unwrap();
    }

    #[test]
    fn test_config_defaults() {
        let config = parse(
            r#"
            [client]
            remote_url = "https://rpc.example.org"
        "#,
        );

        assert_eq!(config.client.chain_id, DEFAULT_CHAIN_ID);
        assert_eq!(config.client.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
        assert_eq!(config.db.datadir, PathBuf::from(DEFAULT_DATADIR));
        assert_eq!(config.fetcher.max_slots, DEFAULT_MAX_SLOTS);
        assert_eq!(config.fetcher.max_chunk_size, DEFAULT_MAX_CHUNK_SIZE);
        assert_eq!(config.fetcher.max_fetch_attempts, DEFAULT_MAX_FETCH_ATTEMPTS);
        assert!(!config.detection.require_banker_metadata);
        assert_eq!(config.events.subscriber_buffer, DEFAULT_SUBSCRIBER_BUFFER);
        assert_eq!(config.registrar.endpoint, None);
        assert_eq!(config.registrar.method, DEFAULT_REGISTER_METHOD);
        assert_eq!(config.registrar.register_suffix, DEFAULT_REGISTER_SUFFIX);
        assert!(!config.logging.json_format);
        config.validate().unwrap();
    }

    #[test]
    fn test_remote_url_is_required() {
        assert!(toml::from_str::<Config>("[fetcher]\nmax_slots = 4\n").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = parse("[client]\nremote_url = \"http://localhost:26657\"\n");

        let cases: [(&str, fn(&mut Config)); 9] = [
            ("fetcher.max_slots", |c| c.fetcher.max_slots = 0),
            ("fetcher.max_slots", |c| c.fetcher.max_slots = 10_001),
            ("fetcher.max_chunk_size", |c| c.fetcher.max_chunk_size = 0),
            ("fetcher.max_chunk_size", |c| {
                c.fetcher.max_chunk_size = 1 << 60
            }),
            ("fetcher.max_fetch_attempts", |c| {
                c.fetcher.max_fetch_attempts = 0
            }),
            ("client.chain_id", |c| c.client.chain_id = " ".to_string()),
            ("client.remote_url", |c| {
                c.client.remote_url = "localhost:26657".to_string()
            }),
            ("client.remote_url", |c| {
                c.client.remote_url = "http://".to_string()
            }),
            ("registrar.endpoint", |c| {
                c.registrar.endpoint = Some("ftp://signer".to_string())
            }),
        ];

        for (field, mutate) in cases {
            let mut config = base.clone();
            mutate(&mut config);
            match config.validate() {
                Err(ConfigError::InvalidValue { field: got, .. }) => assert_eq!(got, field),
                other => panic!("expected {field} to be rejected, got {other:?}"),
            }
        }

        let mut config = base.clone();
        config.fetcher.max_slots = 10_000;
        config.fetcher.max_chunk_size = 10_000;
        config.validate().unwrap();
    }
}
