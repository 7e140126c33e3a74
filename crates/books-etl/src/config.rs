//! Configuration management
//!
//! Settings come from one file (format picked by extension, YAML by default)
//! overlaid by `BOOKS_`-prefixed environment variables, `__` separating
//! nesting levels:
//!
//! ```yaml
//! s3:
//!   url: s3://books-bucket/incoming
//! dynamodb:
//!   table: books
//! aws:
//!   region: us-east-1
//!   endpoint_url: http://localhost:4566
//!   force_path_style: true
//! ```
//!
//! `BOOKS_S3__URL=s3://other-bucket` overrides `s3.url`.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::storage::StoreUrl;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "application.yaml";

/// Prefix of environment variables overriding file settings
pub const ENV_PREFIX: &str = "BOOKS";

pub const KEY_S3_URL: &str = "s3.url";
pub const KEY_TABLE: &str = "dynamodb.table";
pub const KEY_AWS_REGION: &str = "aws.region";
pub const KEY_AWS_ENDPOINT_URL: &str = "aws.endpoint_url";
pub const KEY_AWS_FORCE_PATH_STYLE: &str = "aws.force_path_style";

/// Job configuration, loaded once and immutable afterwards
#[derive(Debug, Clone)]
pub struct Config {
    /// Where input files are read from
    pub store: StoreUrl,
    /// Target key-value table
    pub table_name: String,
    pub aws: AwsConfig,
}

/// Optional overrides for AWS client construction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: Option<String>,
    /// Custom endpoint, e.g. LocalStack or MinIO
    pub endpoint_url: Option<String>,
    /// Path-style S3 addressing, required by most S3 emulators
    pub force_path_style: bool,
}

impl Config {
    /// Load and validate configuration from `path` plus the environment
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;

        Self::from_settings(&settings)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    fn from_settings(settings: &config::Config) -> Result<Self> {
        let store_url = required(settings, KEY_S3_URL)?;
        let store = store_url
            .parse::<StoreUrl>()
            .with_context(|| format!("Setting '{}' is not a valid store URL", KEY_S3_URL))?;

        let config = Config {
            store,
            table_name: required(settings, KEY_TABLE)?,
            aws: AwsConfig {
                region: optional(settings, KEY_AWS_REGION),
                endpoint_url: optional(settings, KEY_AWS_ENDPOINT_URL),
                force_path_style: flag(settings, KEY_AWS_FORCE_PATH_STYLE)?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            bail!("Setting '{}' must not be blank", KEY_TABLE);
        }

        Ok(())
    }
}

fn required(settings: &config::Config, key: &str) -> Result<String> {
    match settings.get_string(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        Ok(_) => bail!("Setting '{}' must not be blank", key),
        Err(config::ConfigError::NotFound(_)) => bail!("Setting '{}' is not configured", key),
        Err(e) => Err(e).with_context(|| format!("Setting '{}' could not be read", key)),
    }
}

/// Boolean setting, `false` when absent
fn flag(settings: &config::Config, key: &str) -> Result<bool> {
    match settings.get_bool(key) {
        Ok(value) => Ok(value),
        Err(config::ConfigError::NotFound(_)) => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Setting '{}' could not be read", key)),
    }
}

fn optional(settings: &config::Config, key: &str) -> Option<String> {
    settings
        .get_string(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_load_valid_configuration() {
        let file = yaml_file("s3:\n  url: https://example-bucket.s3.amazonaws.com\ndynamodb:\n  table: books\n");

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.store.as_str(), "https://example-bucket.s3.amazonaws.com");
        assert_eq!(config.store.bucket(), "example-bucket.s3.amazonaws.com");
        assert_eq!(config.store.prefix(), "");
        assert_eq!(config.table_name, "books");
        assert_eq!(config.aws, AwsConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_aws_overrides() {
        let file = yaml_file(
            "s3:\n  url: s3://books-bucket/incoming\ndynamodb:\n  table: books\naws:\n  region: sa-east-1\n  endpoint_url: http://localhost:4566\n  force_path_style: true\n",
        );

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.store.prefix(), "incoming");
        assert_eq!(config.aws.region.as_deref(), Some("sa-east-1"));
        assert_eq!(config.aws.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert!(config.aws.force_path_style);
    }

    #[test]
    #[serial]
    fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(dir.path().join("application.yaml")).is_err());
    }

    #[test]
    #[serial]
    fn test_missing_store_url_fails() {
        let file = yaml_file("dynamodb:\n  table: books\n");

        let err = Config::load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("'s3.url' is not configured"));
    }

    #[test]
    #[serial]
    fn test_missing_table_fails() {
        let file = yaml_file("s3:\n  url: s3://books-bucket\n");

        let err = Config::load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("'dynamodb.table' is not configured"));
    }

    #[test]
    #[serial]
    fn test_blank_values_fail() {
        let file = yaml_file("s3:\n  url: \"   \"\ndynamodb:\n  table: books\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("'s3.url' must not be blank"));

        let file = yaml_file("s3:\n  url: s3://books-bucket\ndynamodb:\n  table: \"\"\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("'dynamodb.table' must not be blank"));
    }

    #[test]
    #[serial]
    fn test_invalid_store_url_fails() {
        let file = yaml_file("s3:\n  url: not-a-url\ndynamodb:\n  table: books\n");

        let err = Config::load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("not a valid store URL"));
    }

    #[test]
    #[serial]
    fn test_mistyped_flag_fails() {
        let file = yaml_file(
            "s3:\n  url: s3://books-bucket\ndynamodb:\n  table: books\naws:\n  force_path_style: sometimes\n",
        );

        let err = Config::load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("'aws.force_path_style' could not be read"));
    }

    #[test]
    #[serial]
    fn test_flag_from_environment() {
        let file = yaml_file("s3:\n  url: s3://books-bucket\ndynamodb:\n  table: books\n");
        std::env::set_var("BOOKS_AWS__FORCE_PATH_STYLE", "true");

        let result = Config::load(file.path());
        std::env::remove_var("BOOKS_AWS__FORCE_PATH_STYLE");

        assert!(result.unwrap().aws.force_path_style);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let file = yaml_file("s3:\n  url: s3://books-bucket\ndynamodb:\n  table: books\n");
        std::env::set_var("BOOKS_DYNAMODB__TABLE", "books-staging");

        let result = Config::load(file.path());
        std::env::remove_var("BOOKS_DYNAMODB__TABLE");

        assert_eq!(result.unwrap().table_name, "books-staging");
    }
}
