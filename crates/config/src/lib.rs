//! Configuration of the tokenscout service.

mod config;
mod errors;
mod overrides;

pub use config::{
    ClientConfig, Config, DbConfig, DetectionConfig, EventsConfig, FetcherSection, LoggingConfig,
    RegistrarConfig,
};
pub use errors::ConfigError;
pub use overrides::{apply_override, load_config_value, parse_override, Override};
