//! adalsession - inspect a session configuration against a page URL.
//!
//! Prints the finalized redirect URIs and, when the URL carries an
//! authentication response, the decoded fragment with tokens redacted.

use adalsession::auth::fragment::{self, parse_fragment};
use adalsession::browser::{Location, MemoryLocation};
use adalsession::SessionConfig;
use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "adalsession.toml";

const USAGE: &str = "Usage: adalsession <page-url> [--config <path>]";

fn main() {
    // Load .env file (if present) before anything else
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    init_logging();

    let (page_url, config_path) = match parse_args(std::env::args().skip(1)) {
        Some(args) => args,
        None => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(&page_url, &config_path) {
        error!("{:#}", e);
        eprintln!("Configuration error: {:#}", e);
        eprintln!("\nSet ADAL_CLIENT_ID (and optionally ADAL_AUTHORITY) or fix the config file.");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<(String, PathBuf)> {
    let mut page_url = None;
    let mut config_path = std::env::var("ADAL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => config_path = PathBuf::from(args.next()?),
            "--help" | "-h" => return None,
            _ if page_url.is_none() => page_url = Some(arg),
            _ => return None,
        }
    }

    Some((page_url?, config_path))
}

fn run(page_url: &str, config_path: &Path) -> Result<()> {
    let mut config = SessionConfig::load(config_path)?;
    info!("Configuration loaded from {}", config_path.display());

    config.apply_default_redirects(page_url);
    config.validate().context("Finalized configuration is invalid")?;

    let location = MemoryLocation::new(page_url);
    let hash = location.hash();

    let callback = if fragment::is_callback_fragment(&hash) {
        Value::Object(redacted_parameters(&hash))
    } else {
        Value::Null
    };

    let report = json!({
        "clientId": config.client_id,
        "authority": config.authority,
        "loginResource": config.login_resource(),
        "redirectUri": config.redirect_uri,
        "postLogoutRedirectUri": config.post_logout_redirect_uri,
        "callback": callback,
    });

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to render report")?
    );

    Ok(())
}

fn redacted_parameters(hash: &str) -> Map<String, Value> {
    parse_fragment(hash)
        .into_iter()
        .map(|(key, value)| {
            let shown = match key.as_str() {
                fragment::ACCESS_TOKEN | fragment::ID_TOKEN => "[REDACTED]".to_string(),
                _ => value,
            };
            (key, Value::String(shown))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_parse_args() {
        let (url, path) =
            parse_args(args(&["https://app.example/", "--config", "x.toml"])).unwrap();
        assert_eq!(url, "https://app.example/");
        assert_eq!(path, PathBuf::from("x.toml"));

        assert!(parse_args(args(&[])).is_none());
        assert!(parse_args(args(&["a", "b"])).is_none());
        assert!(parse_args(args(&["a", "--config"])).is_none());
    }

    #[test]
    fn test_tokens_are_redacted() {
        let params = redacted_parameters("#access_token=secret&state=s1");
        assert_eq!(params.get("access_token"), Some(&Value::from("[REDACTED]")));
        assert_eq!(params.get("state"), Some(&Value::from("s1")));
    }
}
