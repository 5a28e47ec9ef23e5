use std::collections::HashMap;
use std::env;
use std::num::NonZeroU32;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use config::{Config as HierarchicalConfig, Environment};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name of storefront managed directories
const STOREFRONT_DIR_NAME: &str = "storefront";
const STOREFRONT_CONFIG_DIR_VAR: &str = "STOREFRONT_CONFIG_DIR";
const STOREFRONT_ENV_PREFIX: &str = "STOREFRONT_";
pub const STOREFRONT_CONFIG_FILE: &str = "storefront.toml";

pub const DEFAULT_CATALOG_URL: &str = "http://127.0.0.1:8000/api/v1";
pub const DEFAULT_PAGE_LIMIT: u32 = 25;
/// The backend refuses larger pages.
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// Base URL of the shop API
    pub catalog_url: String,

    /// Number of products per page
    pub page_limit: u32,

    /// Bearer token sent with every catalog request
    #[serde(default)]
    pub access_token: Option<String>,

    /// User agent sent with every catalog request
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Directory the user's configuration file is read from
    /// (default: `$XDG_CONFIG_HOME/storefront`)
    pub config_dir: PathBuf,
}

impl Config {
    /// Creates a [Config] from the environment and config files
    ///
    /// Sources are layered, later ones take precedence:
    /// defaults, `/etc/storefront/storefront.toml`,
    /// `$XDG_CONFIG_HOME/storefront/storefront.toml`
    /// or `$STOREFRONT_CONFIG_DIR/storefront.toml` if set,
    /// and `STOREFRONT_*` environment variables.
    pub fn parse() -> Result<Config> {
        let config: Config = Self::raw_config()?
            .try_deserialize()
            .context("Could not parse config")?;
        config.page_limit()?;
        Ok(config)
    }

    /// The configured page size, validated against the backend limit.
    pub fn page_limit(&self) -> Result<NonZeroU32> {
        match NonZeroU32::new(self.page_limit) {
            Some(limit) if limit.get() <= MAX_PAGE_LIMIT => Ok(limit),
            _ => bail!(
                "'page_limit' must be between 1 and {MAX_PAGE_LIMIT}, found {}",
                self.page_limit
            ),
        }
    }

    fn raw_config() -> Result<HierarchicalConfig> {
        let config_dir = match env::var(STOREFRONT_CONFIG_DIR_VAR) {
            Ok(v) => {
                debug!("`${STOREFRONT_CONFIG_DIR_VAR}` set: {v}");
                PathBuf::from(v)
            },
            Err(_) => {
                let config_dir = dirs::config_dir()
                    .context("Could not determine the user's config directory")?
                    .join(STOREFRONT_DIR_NAME);
                debug!("`${STOREFRONT_CONFIG_DIR_VAR}` not set, using {config_dir:?}");
                config_dir
            },
        };

        let mut builder = HierarchicalConfig::builder()
            .set_default("catalog_url", DEFAULT_CATALOG_URL)?
            .set_default("page_limit", DEFAULT_PAGE_LIMIT)?
            // Config dir is added to the config for completeness;
            // the config file cannot change the config dir.
            .set_override("config_dir", config_dir.to_string_lossy().as_ref())?;

        // read from /etc
        builder = builder.add_source(
            config::File::from(
                PathBuf::from("/etc")
                    .join(STOREFRONT_DIR_NAME)
                    .join(STOREFRONT_CONFIG_FILE),
            )
            .format(config::FileFormat::Toml)
            .required(false),
        );

        builder = builder.add_source(
            config::File::from(config_dir.join(STOREFRONT_CONFIG_FILE))
                .format(config::FileFormat::Toml)
                .required(false),
        );

        // override via env variables
        let storefront_envs: HashMap<String, String> = env::vars()
            .filter_map(|(k, v)| {
                k.strip_prefix(STOREFRONT_ENV_PREFIX)
                    .map(|k| (k.to_lowercase(), v))
            })
            .filter(|(k, _)| k != "config_dir")
            .collect();

        let final_config = builder
            .add_source(
                Environment::default()
                    .source(Some(storefront_envs))
                    .try_parsing(true),
            )
            .build()?;
        Ok(final_config)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    /// Run `f` with an empty user config directory
    /// and without any `STOREFRONT_*` overrides of the caller.
    fn with_config_dir<R>(
        vars: &[(&str, Option<&str>)],
        config_file: Option<&str>,
        f: impl FnOnce() -> R,
    ) -> R {
        let tempdir = tempfile::tempdir().unwrap();
        if let Some(content) = config_file {
            std::fs::write(tempdir.path().join(STOREFRONT_CONFIG_FILE), content).unwrap();
        }
        let config_dir = tempdir.path().to_string_lossy().to_string();

        let mut all_vars = vec![
            (STOREFRONT_CONFIG_DIR_VAR, Some(config_dir.as_str())),
            ("STOREFRONT_CATALOG_URL", None),
            ("STOREFRONT_PAGE_LIMIT", None),
            ("STOREFRONT_ACCESS_TOKEN", None),
            ("STOREFRONT_USER_AGENT", None),
        ];
        all_vars.extend_from_slice(vars);
        temp_env::with_vars(all_vars, f)
    }

    #[test]
    fn defaults_apply_without_sources() {
        let config = with_config_dir(&[], None, || Config::parse().unwrap());

        assert_eq!(config.catalog_url, DEFAULT_CATALOG_URL);
        assert_eq!(config.page_limit().unwrap().get(), DEFAULT_PAGE_LIMIT);
        assert_eq!(config.access_token, None);
    }

    #[test]
    fn config_file_overrides_defaults() {
        let config = with_config_dir(
            &[],
            Some(indoc! {r#"
                catalog_url = "https://shop.example.com/api/v1"
                page_limit = 10
                user_agent = "storefront-test"
            "#}),
            || Config::parse().unwrap(),
        );

        assert_eq!(config.catalog_url, "https://shop.example.com/api/v1");
        assert_eq!(config.page_limit, 10);
        assert_eq!(config.user_agent.as_deref(), Some("storefront-test"));
    }

    #[test]
    fn env_overrides_config_file() {
        let config = with_config_dir(
            &[
                ("STOREFRONT_PAGE_LIMIT", Some("50")),
                ("STOREFRONT_ACCESS_TOKEN", Some("secret")),
            ],
            Some("page_limit = 10\n"),
            || Config::parse().unwrap(),
        );

        assert_eq!(config.page_limit, 50);
        assert_eq!(config.access_token.as_deref(), Some("secret"));
    }

    #[test]
    fn page_limit_above_backend_maximum_is_rejected() {
        let result = with_config_dir(&[("STOREFRONT_PAGE_LIMIT", Some("500"))], None, || {
            Config::parse()
        });
        assert!(result.is_err());

        let result = with_config_dir(&[("STOREFRONT_PAGE_LIMIT", Some("0"))], None, || {
            Config::parse()
        });
        assert!(result.is_err());
    }
}
