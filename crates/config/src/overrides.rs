//! Layering of `key=value` overrides on top of the TOML file.

use std::{fs, path::Path};

use toml::{value::Table, Value};

use crate::{Config, ConfigError};

/// A single dotted-path assignment, e.g. `fetcher.max_slots=8`.
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    path: Vec<String>,
    value: Value,
}

impl Override {
    pub fn new(path: &str, value: impl Into<Value>) -> Self {
        Self {
            path: path.split('.').map(str::to_owned).collect(),
            value: value.into(),
        }
    }

    pub fn path(&self) -> String {
        self.path.join(".")
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Parses `a.b.c=value`. The value is read as a TOML literal when it is one and as a
/// plain string otherwise.
pub fn parse_override(raw: &str) -> Result<Override, ConfigError> {
    let (key, val) = raw
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidOverride(raw.to_owned()))?;

    let key = key.trim();
    if key.is_empty() || key.split('.').any(|seg| seg.trim().is_empty()) {
        return Err(ConfigError::InvalidOverride(raw.to_owned()));
    }

    Ok(Override {
        path: key.split('.').map(|seg| seg.trim().to_owned()).collect(),
        value: parse_value(val.trim()),
    })
}

fn parse_value(raw: &str) -> Value {
    toml::from_str::<Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut doc| doc.remove("v"))
        .unwrap_or_else(|| Value::String(raw.to_owned()))
}

/// Sets the value at the override's path, creating missing tables on the way.
pub fn apply_override(ov: &Override, table: &mut Table) -> Result<(), ConfigError> {
    let Some((last, parents)) = ov.path.split_last() else {
        return Err(ConfigError::InvalidOverride(ov.path()));
    };

    let mut cur = table;
    for key in parents {
        let entry = cur
            .entry(key.clone())
            .or_insert_with(|| Value::Table(Table::new()));
        cur = match entry {
            Value::Table(next) => next,
            _ => {
                return Err(ConfigError::TraverseNonTableAt {
                    key: key.clone(),
                    path: ov.path(),
                })
            }
        };
    }

    cur.insert(last.clone(), ov.value.clone());
    Ok(())
}

/// Reads the config file as a raw TOML value, or an empty table without one.
pub fn load_config_value(path: Option<&Path>) -> Result<Value, ConfigError> {
    let Some(path) = path else {
        return Ok(Value::Table(Table::new()));
    };

    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_owned(),
        source,
    })?;
    Ok(toml::from_str(&raw)?)
}

impl Config {
    /// Loads the file at `path`, applies `overrides` in order and validates the result.
    pub fn load(path: Option<&Path>, overrides: &[Override]) -> Result<Self, ConfigError> {
        let mut value = load_config_value(path)?;
        let table = value
            .as_table_mut()
            .ok_or_else(|| ConfigError::TraverseNonTableAt {
                key: "<root>".to_owned(),
                path: String::new(),
            })?;

        for ov in overrides {
            apply_override(ov, table)?;
        }

        let config: Config = value.try_into()?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_parse_override_typed_values() {
        let ov = parse_override("fetcher.max_slots=8").unwrap();
        assert_eq!(ov.path(), "fetcher.max_slots");
        assert_eq!(ov.value(), &Value::Integer(8));

        let ov = parse_override("detection.require_banker_metadata = true").unwrap();
        assert_eq!(ov.path(), "detection.require_banker_metadata");
        assert_eq!(ov.value(), &Value::Boolean(true));

        let ov = parse_override("client.remote_url=http://10.0.0.1:26657").unwrap();
        assert_eq!(
            ov.value(),
            &Value::String("http://10.0.0.1:26657".to_string())
        );

        let ov = parse_override(r#"client.chain_id="1234""#).unwrap();
        assert_eq!(ov.value(), &Value::String("1234".to_string()));
    }

    #[test]
    fn test_parse_override_rejects_malformed() {
        for raw in ["fetcher.max_slots", "=3", "fetcher..max_slots=3", ".a=1"] {
            assert!(
                matches!(parse_override(raw), Err(ConfigError::InvalidOverride(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_apply_override_creates_tables() {
        let mut table = Table::new();
        apply_override(&Override::new("registrar.endpoint", "http://signer"), &mut table)
            .unwrap();

        let registrar = table["registrar"].as_table().unwrap();
        assert_eq!(registrar["endpoint"].as_str(), Some("http://signer"));
    }

    #[test]
    fn test_apply_override_into_primitive() {
        let mut table: Table = toml::from_str("[client]\nremote_url = \"http://a\"\n").unwrap();
        let err = apply_override(&Override::new("client.remote_url.host", "b"), &mut table)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TraverseNonTableAt { ref key, .. } if key == "remote_url"
        ));
    }

    #[test]
    fn test_load_without_file() {
        let overrides = [
            Override::new("client.remote_url", "http://127.0.0.1:26657"),
            parse_override("fetcher.max_chunk_size=25").unwrap(),
            Override::new("db.datadir", "/var/lib/tokenscout"),
        ];
        let config = Config::load(None, &overrides).unwrap();

        assert_eq!(config.client.remote_url, "http://127.0.0.1:26657");
        assert_eq!(config.fetcher.max_chunk_size, 25);
        assert_eq!(config.db.datadir, PathBuf::from("/var/lib/tokenscout"));
    }

    #[test]
    fn test_load_validates() {
        let overrides = [
            Override::new("client.remote_url", "http://127.0.0.1:26657"),
            parse_override("fetcher.max_slots=0").unwrap(),
        ];
        assert!(matches!(
            Config::load(None, &overrides),
            Err(ConfigError::InvalidValue {
                field: "fetcher.max_slots",
                ..
            })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/tokenscout.toml")), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
