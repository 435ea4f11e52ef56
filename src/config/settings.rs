use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://streamlabs.com/api/v2.0";
pub const DEFAULT_DONATION_PULL_LIMIT: u32 = 5;

/// Process settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Address the web endpoint listens on
    pub bind_addr: SocketAddr,
    /// JSON file holding credentials and panel login
    pub properties_path: PathBuf,
    /// Streamlabs API base URL
    pub api_url: String,
    /// Whether the endpoint is reached over TLS (decides the redirect scheme)
    pub secure: bool,
    /// Donations requested per pull
    pub donation_pull_limit: u32,
    /// Currency donations are converted to, empty for the account default
    pub currency_code: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 25000)),
            properties_path: PathBuf::from("botlogin.json"),
            api_url: DEFAULT_API_URL.to_string(),
            secure: false,
            donation_pull_limit: DEFAULT_DONATION_PULL_LIMIT,
            currency_code: String::new(),
        }
    }
}

impl Settings {
    /// Create settings from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: lookup("BIND_ADDR")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.bind_addr),
            properties_path: lookup("PROPERTIES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.properties_path),
            api_url: lookup("STREAMLABS_API_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            secure: lookup("WEB_SECURE")
                .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.secure),
            donation_pull_limit: lookup("STREAMLABS_DONATION_LIMIT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.donation_pull_limit),
            currency_code: lookup("STREAMLABS_CURRENCY").unwrap_or(defaults.currency_code),
        }
    }
}
