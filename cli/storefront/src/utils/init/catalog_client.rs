use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, bail};
use storefront_catalog::{
    CatalogClient,
    CatalogClientConfig,
    Client,
    MockClient,
    STOREFRONT_CATALOG_MOCK_DATA_VAR,
};
use tracing::debug;

use crate::config::Config;

/// Initialize the catalog client
///
/// - Initialize a mock client if `$_STOREFRONT_USE_CATALOG_MOCK` points to mock data
/// - Initialize a real client otherwise
pub fn init_catalog_client(config: &Config) -> Result<Client, anyhow::Error> {
    if let Ok(path_str) = std::env::var(STOREFRONT_CATALOG_MOCK_DATA_VAR) {
        let path = PathBuf::from(path_str);
        if !path.exists() {
            bail!("path to mock data file doesn't exist: {}", path.display());
        }

        debug!(mock_data_path = %path.display(), "using mock catalog client");
        return Ok(MockClient::from_file(&path)?.into());
    }

    let mut extra_headers: BTreeMap<String, String> = BTreeMap::new();

    // Pass in a bool if we are running in CI, so requests can reflect this in the headers
    if std::env::var("CI").is_ok() {
        extra_headers.insert("storefront-ci".to_string(), "true".to_string());
    };

    debug!("using catalog client with url: {}", config.catalog_url);
    let client = CatalogClient::new(CatalogClientConfig {
        catalog_url: config.catalog_url.clone(),
        access_token: config.access_token.clone(),
        extra_headers,
        user_agent: config.user_agent.clone(),
    })
    .context("Could not create catalog client")?;
    Ok(client.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> Config {
        Config {
            catalog_url: url.to_string(),
            page_limit: 25,
            access_token: None,
            user_agent: None,
            config_dir: PathBuf::from("/nonexistent"),
        }
    }

    #[test]
    fn mock_client_from_env() {
        let tempdir = tempfile::tempdir().unwrap();
        let mock_file = tempdir.path().join("responses.json");
        std::fs::write(&mock_file, r#"[{"brands": []}]"#).unwrap();

        let client = temp_env::with_var(STOREFRONT_CATALOG_MOCK_DATA_VAR, Some(&mock_file), || {
            init_catalog_client(&config("not a url")).unwrap()
        });

        assert!(matches!(client, Client::Mock(mock) if mock.remaining() == 1));
    }

    #[test]
    fn missing_mock_file_is_an_error() {
        let result = temp_env::with_var(
            STOREFRONT_CATALOG_MOCK_DATA_VAR,
            Some("/nonexistent/responses.json"),
            || init_catalog_client(&config(crate::config::DEFAULT_CATALOG_URL)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn invalid_catalog_url_is_an_error() {
        let result = temp_env::with_var_unset(STOREFRONT_CATALOG_MOCK_DATA_VAR, || {
            init_catalog_client(&config("not a url"))
        });
        assert!(result.is_err());
    }
}
