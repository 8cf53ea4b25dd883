use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://grok.ylsagi.com";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:145.0) Gecko/20100101 Firefox/145.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub upstream: UpstreamConfig,
}

/// Everything the outbound client injects into each upstream call.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Session cookie copied from a logged-in browser. Empty = header omitted.
    pub cookie: String,
    pub user_agent: String,
    /// Fixed analytics id sent as `x-statsig-id`. Empty = header omitted.
    pub statsig_id: String,
    pub timeout: Duration,
}

impl UpstreamConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cookie: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            statsig_id: String::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn origin(&self) -> &str {
        &self.base_url
    }

    pub fn referer(&self) -> String {
        format!("{}/", self.base_url)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut upstream =
            UpstreamConfig::new(lookup("GROK_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()));
        upstream.cookie = lookup("GROK_COOKIE").unwrap_or_default();
        upstream.statsig_id = lookup("GROK_STATSIG_ID").unwrap_or_default();
        if let Some(ua) = lookup("GROK_USER_AGENT") {
            upstream.user_agent = ua;
        }
        upstream.timeout = Duration::from_secs(
            lookup("UPSTREAM_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );

        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            upstream,
        }
    }
}
