//! Client configuration.

use crate::error::ApiError;

/// Public endpoint of the bike-share information service.
pub const DEFAULT_BASE_URL: &str = "https://hanetwi.ddns.net/bikeshare/api/v1";

pub const ENV_BASE_URL: &str = "BIKESHARE_API_URL";
pub const ENV_CERT: &str = "BIKESHARE_API_CERT";

/// Immutable settings for a `BikeshareClient`.
///
/// `cert` is sent as-is in the `cert` header of every request when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub cert: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cert: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            cert: None,
        }
    }

    pub fn with_cert(mut self, cert: &str) -> Self {
        self.cert = Some(cert.to_string());
        self
    }

    /// Read `BIKESHARE_API_URL` and `BIKESHARE_API_CERT`. Both are optional;
    /// the URL falls back to the public endpoint.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let base_url = lookup(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if base_url.trim().is_empty() {
            return Err(ApiError::Config(format!("{ENV_BASE_URL} is empty")));
        }
        let cert = lookup(ENV_CERT).filter(|cert| !cert.is_empty());
        Ok(Self { base_url, cert })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_public_endpoint() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.cert.is_none());
    }

    #[test]
    fn reads_url_and_cert() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://localhost:3000"),
            (ENV_CERT, "secret"),
        ]))
        .unwrap();
        assert_eq!(config, ClientConfig::new("http://localhost:3000").with_cert("secret"));
    }

    #[test]
    fn empty_cert_is_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[(ENV_CERT, "")])).unwrap();
        assert!(config.cert.is_none());
    }

    #[test]
    fn empty_url_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_BASE_URL, "  ")])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }
}
