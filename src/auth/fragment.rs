//! URL fragment handling for implicit-flow responses.
//!
//! The identity provider returns tokens in the URL fragment
//! (`#access_token=...&state=...`). These helpers decode that fragment and
//! classify it; the authentication context decides what the state means.

use std::collections::HashMap;
use url::form_urlencoded;

pub const ACCESS_TOKEN: &str = "access_token";
pub const ID_TOKEN: &str = "id_token";
pub const ERROR: &str = "error";
pub const ERROR_DESCRIPTION: &str = "error_description";
pub const STATE: &str = "state";

/// Which kind of request a callback answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Login,
    RenewToken,
    Unknown,
}

/// A decoded authentication response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    /// True when the fragment has the shape of an authentication response.
    pub valid: bool,
    pub parameters: HashMap<String, String>,
    /// True when `state_response` matches a request this context issued.
    pub state_match: bool,
    pub state_response: String,
    pub request_type: RequestType,
}

impl RequestInfo {
    /// Classify `hash` against the pending login state and renewal states.
    ///
    /// Context implementations use this to answer `request_info`.
    pub fn from_hash(hash: &str, login_state: Option<&str>, renew_states: &[String]) -> Self {
        let parameters = parse_fragment(hash);
        let valid = has_response_parameters(&parameters);
        let state_response = parameters.get(STATE).cloned().unwrap_or_default();

        let mut info = Self {
            valid,
            parameters,
            state_match: false,
            state_response,
            request_type: RequestType::Unknown,
        };

        if !info.valid || info.state_response.is_empty() {
            return info;
        }

        if login_state == Some(info.state_response.as_str()) {
            info.request_type = RequestType::Login;
            info.state_match = true;
        } else if renew_states.iter().any(|s| *s == info.state_response) {
            info.request_type = RequestType::RenewToken;
            info.state_match = true;
        }

        info
    }

    pub fn access_token(&self) -> Option<&str> {
        self.non_empty(ACCESS_TOKEN)
    }

    pub fn id_token(&self) -> Option<&str> {
        self.non_empty(ID_TOKEN)
    }

    pub fn error(&self) -> Option<&str> {
        self.non_empty(ERROR)
    }

    fn non_empty(&self, key: &str) -> Option<&str> {
        self.parameters
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Decode a URL fragment into its parameters.
///
/// Accepts the fragment with or without the leading `#` and tolerates the
/// `#/` prefix left behind by hash-based routers.
pub fn parse_fragment(hash: &str) -> HashMap<String, String> {
    let trimmed = hash.trim_start_matches('#').trim_start_matches('/');

    form_urlencoded::parse(trimmed.as_bytes())
        .into_owned()
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// Whether `hash` looks like an authentication response.
pub fn is_callback_fragment(hash: &str) -> bool {
    has_response_parameters(&parse_fragment(hash))
}

fn has_response_parameters(parameters: &HashMap<String, String>) -> bool {
    [ERROR_DESCRIPTION, ERROR, ACCESS_TOKEN, ID_TOKEN]
        .iter()
        .any(|key| parameters.contains_key(*key))
}

/// Remove the fragment (and its `#`) from a URL string.
pub fn strip_fragment(href: &str) -> &str {
    match href.find('#') {
        Some(idx) => &href[..idx],
        None => href,
    }
}
