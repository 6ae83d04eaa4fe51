use std::{fs, io, path::{Path, PathBuf}};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use wsbind_codegen::options::{ImportOptions, ReflectOptions};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read configuration file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration")]
    Parse(#[from] toml::de::Error),
}

/// Settings read from `--config`; command-line flags override them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub import: ImportOptions,
    pub reflect: ReflectOptions,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;

        debug!(path = %path.display(), "loaded configuration");
        Ok(toml::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wsbind_codegen::options::GenerationStyle;

    #[test]
    fn reads_both_tables() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"
            [import]
            protocol = "HttpGet"
            module = "stock"
            style = "server"
            reserved_names = ["Client"]

            [reflect]
            protocols = ["Soap", "HttpPost"]
            "#
        )
        .expect("write");

        let config = Config::load(file.path()).expect("config");
        assert_eq!(config.import.protocol.as_deref(), Some("HttpGet"));
        assert_eq!(config.import.module, "stock");
        assert_eq!(config.import.style, GenerationStyle::Server);
        assert_eq!(config.import.reserved_names, ["Client"]);
        assert!(!config.import.generate_async);
        assert_eq!(config.reflect.protocols, ["Soap", "HttpPost"]);
    }

    #[test]
    fn missing_tables_take_defaults() {
        let file = tempfile::NamedTempFile::new().expect("temp file");

        let config = Config::load(file.path()).expect("config");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "[import]\nlanguage = \"cs\"\n").expect("write");

        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("wsbind.toml");

        assert!(matches!(Config::load(&path), Err(ConfigError::Read { .. })));
    }
}
