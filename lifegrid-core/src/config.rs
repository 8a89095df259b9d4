//! Configuration loading for LIFEGRID.
//!
//! Precedence: a `--config <path>` argument in the list the caller passes,
//! then the `LIFEGRID_CONFIG` environment variable, then built-in defaults.

use crate::{
    ConfigError, Horizon, LifegridResult, DEFAULT_HORIZON_YEARS, DEFAULT_TAG_SUGGESTION_LIMIT,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Key the browser client persists under, shared so exports interoperate.
pub const DEFAULT_STORE_KEY: &str = "life_calendar_user";

/// Default directory for file-backed persistence.
pub const DEFAULT_DATA_DIR: &str = ".lifegrid";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LifegridConfig {
    /// Years of life covered by the grid.
    pub horizon_years: u32,
    /// Name the root aggregate is persisted under.
    pub store_key: String,
    /// Directory holding file-backed stores.
    pub data_dir: PathBuf,
    /// Maximum tag suggestions offered at once.
    pub tag_suggestion_limit: usize,
}

impl Default for LifegridConfig {
    fn default() -> Self {
        Self {
            horizon_years: DEFAULT_HORIZON_YEARS,
            store_key: DEFAULT_STORE_KEY.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            tag_suggestion_limit: DEFAULT_TAG_SUGGESTION_LIMIT,
        }
    }
}

impl LifegridConfig {
    /// Load from the file named by `args`, or defaults when no path is given.
    ///
    /// `args` are command-line arguments without the program name; a binary
    /// passes `std::env::args().skip(1)`. Both `--config <path>` and
    /// `--config=<path>` are accepted, other arguments are ignored.
    pub fn load_from_args<I, S>(args: I) -> LifegridResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let path = match config_path_from_args(args)? {
            Some(path) => Some(path),
            None => config_path_from_env(),
        };
        let config = match path {
            Some(path) => Self::from_path(&path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file. Missing fields take their defaults.
    pub fn from_path(path: &Path) -> LifegridResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: LifegridConfig = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `LIFEGRID_HORIZON_YEARS` (default: 90)
    /// - `LIFEGRID_STORE_KEY` (default: `life_calendar_user`)
    /// - `LIFEGRID_DATA_DIR` (default: `.lifegrid`)
    /// - `LIFEGRID_TAG_SUGGESTION_LIMIT` (default: 8)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            horizon_years: std::env::var("LIFEGRID_HORIZON_YEARS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.horizon_years),
            store_key: std::env::var("LIFEGRID_STORE_KEY").unwrap_or(defaults.store_key),
            data_dir: std::env::var("LIFEGRID_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            tag_suggestion_limit: std::env::var("LIFEGRID_TAG_SUGGESTION_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.tag_suggestion_limit),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LifegridResult<()> {
        if Horizon::new(self.horizon_years).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "horizon_years".to_string(),
                value: self.horizon_years.to_string(),
                reason: format!("must be between 1 and {}", crate::MAX_HORIZON_YEARS),
            }
            .into());
        }

        if self.store_key.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "store_key".to_string(),
            }
            .into());
        }

        if self.store_key.contains(['/', '\\']) || self.store_key.starts_with('.') {
            return Err(ConfigError::InvalidValue {
                field: "store_key".to_string(),
                value: self.store_key.clone(),
                reason: "must be a plain name without path separators".to_string(),
            }
            .into());
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "data_dir".to_string(),
            }
            .into());
        }

        if self.tag_suggestion_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tag_suggestion_limit".to_string(),
                value: "0".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Validated horizon. Call after [`validate`](Self::validate).
    pub fn horizon(&self) -> LifegridResult<Horizon> {
        Horizon::new(self.horizon_years).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: "horizon_years".to_string(),
                value: self.horizon_years.to_string(),
                reason: format!("must be between 1 and {}", crate::MAX_HORIZON_YEARS),
            }
            .into()
        })
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("LIFEGRID_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args<I, S>(args: I) -> LifegridResult<Option<PathBuf>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let arg = arg.as_ref();
        if let Some(path) = arg.strip_prefix("--config=") {
            return Ok(Some(PathBuf::from(path)));
        }
        if arg == "--config" {
            return match args.next() {
                Some(path) => Ok(Some(PathBuf::from(path.as_ref()))),
                None => Err(ConfigError::MissingRequired {
                    field: "--config <path>".to_string(),
                }
                .into()),
            };
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LifegridError;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = LifegridConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.horizon().unwrap().years(), 90);
        assert_eq!(config.store_key, "life_calendar_user");
    }

    #[test]
    fn test_from_path_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "horizon_years = 100\nstore_key = \"alice\"").unwrap();

        let config = LifegridConfig::from_path(file.path()).unwrap();
        assert_eq!(config.horizon_years, 100);
        assert_eq!(config.store_key, "alice");
        assert_eq!(config.tag_suggestion_limit, DEFAULT_TAG_SUGGESTION_LIMIT);
    }

    #[test]
    fn test_from_path_rejects_unknown_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "theme = \"dark\"").unwrap();

        let err = LifegridConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, LifegridError::Config(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_from_path_missing_file() {
        let missing = Path::new("/nonexistent/lifegrid.toml");
        let err = LifegridConfig::from_path(missing).unwrap_err();
        assert!(matches!(err, LifegridError::Config(ConfigError::Io { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_horizon = LifegridConfig {
            horizon_years: 0,
            ..LifegridConfig::default()
        };
        assert!(zero_horizon.validate().is_err());
        assert!(zero_horizon.horizon().is_err());

        let path_key = LifegridConfig {
            store_key: "../escape".to_string(),
            ..LifegridConfig::default()
        };
        assert!(path_key.validate().is_err());

        let blank_key = LifegridConfig {
            store_key: "  ".to_string(),
            ..LifegridConfig::default()
        };
        assert!(matches!(
            blank_key.validate().unwrap_err(),
            LifegridError::Config(ConfigError::MissingRequired { .. })
        ));

        let no_suggestions = LifegridConfig {
            tag_suggestion_limit: 0,
            ..LifegridConfig::default()
        };
        assert!(no_suggestions.validate().is_err());
    }

    #[test]
    fn test_load_from_args_reads_named_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "horizon_years = 80").unwrap();
        let path = file.path().display().to_string();

        let args = ["--verbose", "--config", path.as_str()];
        let config = LifegridConfig::load_from_args(args).unwrap();
        assert_eq!(config.horizon_years, 80);

        let inline = format!("--config={}", path);
        let config = LifegridConfig::load_from_args([inline.as_str()]).unwrap();
        assert_eq!(config.horizon_years, 80);
    }

    #[test]
    fn test_load_from_args_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "horizon_years = 0").unwrap();
        let path = file.path().display().to_string();

        let err = LifegridConfig::load_from_args(["--config", path.as_str()]).unwrap_err();
        assert!(matches!(err, LifegridError::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_load_from_args_requires_path_after_flag() {
        let err = LifegridConfig::load_from_args(["--config"]).unwrap_err();
        assert!(matches!(err, LifegridError::Config(ConfigError::MissingRequired { .. })));
    }
}
