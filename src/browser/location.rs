//! Current page location.

use crate::auth::fragment::strip_fragment;
use std::sync::Mutex;

/// Read and rewrite the current page URL.
pub trait Location: Send + Sync {
    fn href(&self) -> String;

    /// The fragment including its leading `#`, or an empty string.
    fn hash(&self) -> String {
        let href = self.href();
        match href.find('#') {
            Some(idx) => href[idx..].to_string(),
            None => String::new(),
        }
    }

    /// Replace the visible URL without a navigation.
    fn replace_href(&self, href: &str);

    /// Drop the fragment from the visible URL. Returns true if there was one.
    fn clear_hash(&self) -> bool {
        let href = self.href();
        let stripped = strip_fragment(&href);
        if stripped.len() == href.len() {
            return false;
        }
        self.replace_href(stripped);
        true
    }
}

/// In-process location for hosts without a browser.
#[derive(Debug, Default)]
pub struct MemoryLocation {
    href: Mutex<String>,
}

impl MemoryLocation {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: Mutex::new(href.into()),
        }
    }
}

impl Location for MemoryLocation {
    fn href(&self) -> String {
        self.href
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn replace_href(&self, href: &str) {
        *self
            .href
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = href.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash() {
        let location = MemoryLocation::new("https://app.example/page#id_token=t");
        assert_eq!(location.hash(), "#id_token=t");

        let location = MemoryLocation::new("https://app.example/page");
        assert_eq!(location.hash(), "");
    }

    #[test]
    fn test_clear_hash() {
        let location = MemoryLocation::new("https://app.example/page#state=s");
        assert!(location.clear_hash());
        assert_eq!(location.href(), "https://app.example/page");

        assert!(!location.clear_hash());
        assert_eq!(location.href(), "https://app.example/page");
    }
}
