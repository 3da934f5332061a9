//! HTTP client construction
//!
//! One client is built per process and shared by every adapter; reqwest
//! pools connections internally. An optional proxy (HTTP or SOCKS5) routes
//! all outbound calls.

use reqwest::{Client, Proxy};
use std::time::Duration;

use crate::FetchError;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request ceiling in seconds; deadlines passed to fetches are usually tighter
    pub timeout_secs: u64,
    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Proxy URL, e.g. `socks5h://127.0.0.1:9050`
    pub proxy: Option<String>,
    /// Fixed user agent; a browser-like one is picked at random when unset
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            proxy: std::env::var("VERITY_PROXY").ok().filter(|p| !p.is_empty()),
            user_agent: None,
        }
    }
}

impl HttpConfig {
    pub fn with_proxy(mut self, proxy: &str) -> Self {
        self.proxy = Some(proxy.to_string());
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }
}

/// User agents for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:137.0) Gecko/20100101 Firefox/137.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.7; rv:137.0) Gecko/20100101 Firefox/137.0",
];

/// Get a random user agent
pub fn random_user_agent() -> &'static str {
    use rand::Rng;
    let idx = rand::thread_rng().gen_range(0..USER_AGENTS.len());
    USER_AGENTS[idx]
}

/// Create the shared HTTP client
pub fn create_client(config: &HttpConfig) -> Result<Client, FetchError> {
    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| random_user_agent().to_string());

    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .user_agent(user_agent);

    if let Some(proxy) = &config.proxy {
        let proxy = Proxy::all(proxy).map_err(|e| FetchError::ClientBuild(e.to_string()))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| FetchError::ClientBuild(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn test_random_user_agent() {
        let ua = random_user_agent();
        assert!(ua.contains("Mozilla"));
    }

    #[test]
    fn test_create_client_with_socks_proxy() {
        let config = HttpConfig::default().with_proxy("socks5h://127.0.0.1:9050");
        assert!(create_client(&config).is_ok());
    }

    #[test]
    fn test_bad_proxy_is_client_build_error() {
        let config = HttpConfig::default().with_proxy("not a proxy url");
        assert!(matches!(create_client(&config), Err(FetchError::ClientBuild(_))));
    }
}
