use crate::{ConfigError, ConfigErrorResult};

use std::path::Path;

use log::warn;

/// Extra `-Key=Value` launch arguments from the key/value args file.
///
/// Pairs are kept in key order so the assembled command line is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchArgs {
    pairs: Vec<(String, String)>,
}

impl LaunchArgs {
    /// Load the args file. A missing file yields no extra arguments.
    pub fn load(path: &Path) -> ConfigErrorResult<Self> {
        if !path.exists() {
            warn!(
                "Launch args file {} not found, using fixed flags only",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&contents).map_err(|e| match e {
            ConfigError::Toml { source, .. } => ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse a TOML table of scalar values.
    pub fn parse(contents: &str) -> ConfigErrorResult<Self> {
        let table: toml::Table = toml::from_str(contents).map_err(|e| ConfigError::Toml {
            path: Path::new("<inline>").to_path_buf(),
            source: e,
        })?;

        let mut pairs = Vec::with_capacity(table.len());
        for (key, value) in table {
            if key.trim().is_empty() || key.contains(char::is_whitespace) {
                return Err(ConfigError::launch(format!(
                    "launch argument key {key:?} must be a single word"
                )));
            }

            let rendered = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    return Err(ConfigError::launch(format!(
                        "launch argument {key} must be a scalar, got {}",
                        other.type_str()
                    )));
                }
            };

            pairs.push((key, rendered));
        }

        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(Self { pairs })
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Render as `-Key=Value` command-line arguments.
    pub fn to_flags(&self) -> Vec<String> {
        self.pairs
            .iter()
            .map(|(key, value)| format!("-{key}={value}"))
            .collect()
    }
}
