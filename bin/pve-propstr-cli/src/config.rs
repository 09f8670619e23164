// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;
use std::str::FromStr;

use pve_propstr::UnknownFields;
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

/// Settings read from the optional `--config` file. Every section and key
/// may be omitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub decode: DecodeConfig,
    pub log: LogConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// What to do with keys a record does not know.
    pub unknown_fields: UnknownFields,

    /// Stop decoding a document at the first key that fails.
    pub fail_fast: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// One of slog's level names: `critical`, `error`, `warning`, `info`,
    /// `debug` or `trace`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl LogConfig {
    pub fn level(&self) -> Result<slog::Level, ParseError> {
        slog::Level::from_str(&self.level)
            .map_err(|_| ParseError::Level(self.level.clone()))
    }
}

/// Errors which may be returned when parsing the configuration file.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Cannot parse toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown log level {0:?}")]
    Level(String),
}

/// Parses a TOML file into a configuration object.
pub fn parse<P: AsRef<Path>>(path: P) -> Result<Config, ParseError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let cfg = toml::from_str::<Config>(&contents)?;
    cfg.log.level()?;
    Ok(cfg)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn config_can_be_serialized_as_toml() {
        let config = Config {
            decode: DecodeConfig {
                unknown_fields: UnknownFields::Ignore,
                fail_fast: true,
            },
            log: LogConfig { level: "debug".to_string() },
        };
        let serialized = toml::ser::to_string(&config).unwrap();
        let deserialized: Config = toml::de::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn empty_config_is_default() {
        let cfg: Config = toml::de::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.decode.unknown_fields, UnknownFields::Reject);
        assert_eq!(cfg.log.level().unwrap(), slog::Level::Info);
    }

    #[test]
    fn parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[decode]
unknown_fields = "ignore"

[log]
level = "warning"
"#
        )
        .unwrap();

        let cfg = parse(file.path()).unwrap();
        assert_eq!(cfg.decode.unknown_fields, UnknownFields::Ignore);
        assert!(!cfg.decode.fail_fast);
        assert_eq!(cfg.log.level().unwrap(), slog::Level::Warning);
    }

    #[test]
    fn parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[decode]\nunknown_fields = \"maybe\"").unwrap();
        assert!(matches!(parse(file.path()), Err(ParseError::Toml(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[log]\nlevel = \"loud\"").unwrap();
        assert!(matches!(parse(file.path()), Err(ParseError::Level(_))));

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(parse(missing), Err(ParseError::Io(_))));
    }
}
