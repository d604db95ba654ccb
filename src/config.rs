//! Session configuration loading and validation.
//!
//! Loads configuration from a TOML file with environment variable overrides.
//! Keys use the same camelCase names as the authentication library's config object.

use crate::auth::fragment::strip_fragment;
use crate::error::SessionError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::Path;
use url::Url;

/// Authority used when none is configured.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/common";

/// Default number of seconds before expiry a cached token is treated as stale.
const DEFAULT_EXPIRE_OFFSET_SECONDS: u64 = 300;

/// Where the authentication context keeps its token cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheLocation {
    #[default]
    SessionStorage,
    LocalStorage,
}

/// Configuration handed to the authentication context at initialization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub client_id: String,

    #[serde(default = "default_authority")]
    pub authority: String,

    /// Defaults to the current page URL without its fragment.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Defaults to the current page URL without its fragment.
    #[serde(default)]
    pub post_logout_redirect_uri: Option<String>,

    /// Resource used to decide whether the user is authenticated. Defaults to the client id.
    #[serde(default)]
    pub login_resource: Option<String>,

    #[serde(default)]
    pub cache_location: CacheLocation,

    /// Maps URL prefixes to the resource that protects them.
    #[serde(default)]
    pub endpoints: HashMap<String, String>,

    #[serde(default)]
    pub anonymous_endpoints: Vec<String>,

    #[serde(default)]
    pub extra_query_parameter: Option<String>,

    #[serde(default = "default_expire_offset")]
    pub expire_offset_seconds: u64,

    #[serde(default)]
    pub pop_up: bool,

    #[serde(default = "default_true")]
    pub navigate_to_login_request_url: bool,
}

fn default_authority() -> String {
    DEFAULT_AUTHORITY.to_string()
}

fn default_expire_offset() -> u64 {
    DEFAULT_EXPIRE_OFFSET_SECONDS
}

fn default_true() -> bool {
    true
}

impl SessionConfig {
    /// Create a configuration with defaults for everything but the client id.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            authority: default_authority(),
            redirect_uri: None,
            post_logout_redirect_uri: None,
            login_resource: None,
            cache_location: CacheLocation::default(),
            endpoints: HashMap::new(),
            anonymous_endpoints: Vec::new(),
            extra_query_parameter: None,
            expire_offset_seconds: DEFAULT_EXPIRE_OFFSET_SECONDS,
            pop_up: false,
            navigate_to_login_request_url: true,
        }
    }

    /// Set the authority endpoint.
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse session configuration")
    }

    /// Load configuration from a TOML file with environment variable overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config = Self::from_toml_str(&text)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(client_id) = env::var("ADAL_CLIENT_ID") {
            self.client_id = client_id;
        }

        if let Ok(authority) = env::var("ADAL_AUTHORITY") {
            self.authority = authority;
        }

        if let Ok(redirect_uri) = env::var("ADAL_REDIRECT_URI") {
            self.redirect_uri = Some(redirect_uri);
        }

        if let Ok(uri) = env::var("ADAL_POST_LOGOUT_REDIRECT_URI") {
            self.post_logout_redirect_uri = Some(uri);
        }

        if let Ok(resource) = env::var("ADAL_LOGIN_RESOURCE") {
            self.login_resource = Some(resource);
        }
    }

    /// Validate that required configuration is present and well formed.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.client_id.trim().is_empty() {
            return Err(SessionError::Configuration(
                "client_id is required. Set ADAL_CLIENT_ID or clientId in the config file".into(),
            ));
        }

        Url::parse(&self.authority).map_err(|e| {
            SessionError::Configuration(format!("invalid authority {:?}: {}", self.authority, e))
        })?;

        for uri in [&self.redirect_uri, &self.post_logout_redirect_uri]
            .into_iter()
            .flatten()
        {
            Url::parse(uri).map_err(|e| {
                SessionError::Configuration(format!("invalid redirect URI {:?}: {}", uri, e))
            })?;
        }

        Ok(())
    }

    /// Fill unset redirect URIs with the current page URL minus its fragment.
    pub fn apply_default_redirects(&mut self, current_href: &str) {
        let page = strip_fragment(current_href);
        if page.is_empty() {
            return;
        }

        if self.redirect_uri.as_deref().unwrap_or_default().is_empty() {
            self.redirect_uri = Some(page.to_string());
        }

        if self
            .post_logout_redirect_uri
            .as_deref()
            .unwrap_or_default()
            .is_empty()
        {
            self.post_logout_redirect_uri = Some(page.to_string());
        }
    }

    /// The resource whose cached token decides the authenticated status.
    pub fn login_resource(&self) -> &str {
        self.login_resource.as_deref().unwrap_or(&self.client_id)
    }

    /// Whether requests to `url` should go out without a token.
    pub fn is_anonymous_endpoint(&self, url: &str) -> bool {
        self.anonymous_endpoints
            .iter()
            .any(|prefix| url.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
clientId = "abc"
authority = "https://login.example.com/tenant"
cacheLocation = "localStorage"
anonymousEndpoints = ["https://app.example/public"]

[endpoints]
"https://api.example/" = "https://api.example"
"#;

    #[test]
    fn test_config_parsing() {
        let config = SessionConfig::from_toml_str(EXAMPLE).unwrap();
        assert_eq!(config.client_id, "abc");
        assert_eq!(config.authority, "https://login.example.com/tenant");
        assert_eq!(config.cache_location, CacheLocation::LocalStorage);
        assert_eq!(config.expire_offset_seconds, 300);
        assert!(config.navigate_to_login_request_url);
        assert!(!config.pop_up);
        assert_eq!(
            config.endpoints.get("https://api.example/").map(String::as_str),
            Some("https://api.example")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::from_toml_str(r#"clientId = "abc""#).unwrap();
        assert_eq!(config, SessionConfig::new("abc"));
        assert_eq!(config.authority, DEFAULT_AUTHORITY);
        assert_eq!(config.login_resource(), "abc");
    }

    #[test]
    fn test_missing_client_id_is_rejected() {
        let config = SessionConfig::new("  ");
        assert!(matches!(
            config.validate(),
            Err(SessionError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_authority_is_rejected() {
        let config = SessionConfig::new("abc").with_authority("not a url");
        assert!(matches!(
            config.validate(),
            Err(SessionError::Configuration(_))
        ));
    }

    #[test]
    fn test_default_redirects_strip_fragment() {
        let mut config = SessionConfig::new("abc").with_authority("https://login.example.com/tenant");
        config.apply_default_redirects("https://app.example/#foo");

        assert_eq!(config.redirect_uri.as_deref(), Some("https://app.example/"));
        assert_eq!(
            config.post_logout_redirect_uri.as_deref(),
            Some("https://app.example/")
        );
    }

    #[test]
    fn test_explicit_redirects_are_kept() {
        let mut config = SessionConfig::new("abc");
        config.redirect_uri = Some("https://app.example/auth".into());
        config.apply_default_redirects("https://app.example/home#x");

        assert_eq!(config.redirect_uri.as_deref(), Some("https://app.example/auth"));
        assert_eq!(
            config.post_logout_redirect_uri.as_deref(),
            Some("https://app.example/home")
        );
    }

    #[test]
    fn test_anonymous_endpoints() {
        let config = SessionConfig::from_toml_str(EXAMPLE).unwrap();
        assert!(config.is_anonymous_endpoint("https://app.example/public/logo.png"));
        assert!(!config.is_anonymous_endpoint("https://api.example/me"));
    }

    #[test]
    fn test_login_resource_override() {
        let mut config = SessionConfig::new("abc");
        config.login_resource = Some("https://graph.example".into());
        assert_eq!(config.login_resource(), "https://graph.example");
    }
}
