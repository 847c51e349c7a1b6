use anyhow::{Context, Result};
use std::collections::HashMap;
use std::time::Duration;

/// Placeholder secret used when `DASHBOARD_SECRET` is unset. Must be overridden in any real deployment.
pub const DEFAULT_DASHBOARD_SECRET: &str = "changeme_local";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Process configuration, built once at startup and handed to `AppState::new`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Expected value of the `x-dashboard-secret` request header.
    pub dashboard_secret: String,
    /// Bearer credential for the completion API. `None` turns every insight request into a 500.
    pub openai_api_key: Option<String>,
    pub model: String,
    pub port: u16,
    pub bind_host: String,
    /// Base URL of the completion API, without trailing slash.
    pub openai_base_url: String,
    /// Overall timeout for the outbound call. `None` keeps the transport default (no timeout).
    pub upstream_timeout: Option<Duration>,
    pub proxy: ProxyConfig,
    pub cors: CorsConfig,
}

/// Outbound proxy settings for the provider client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProxyConfig {
    /// Disable every proxy, including system ones.
    pub disabled: bool,
    pub http: Option<String>,
    pub https: Option<String>,
}

/// Cross-origin policy. A `None` list allows any value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorsConfig {
    pub allowed_origins: Option<Vec<String>>,
    pub allowed_methods: Option<Vec<String>>,
    pub allowed_headers: Option<Vec<String>>,
    pub allow_credentials: bool,
    pub max_age: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dashboard_secret: DEFAULT_DASHBOARD_SECRET.to_string(),
            openai_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            port: DEFAULT_PORT,
            bind_host: DEFAULT_BIND_HOST.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            upstream_timeout: None,
            proxy: ProxyConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build configuration from the process environment.
    ///
    /// Environment:
    /// - DASHBOARD_SECRET                   -> shared secret (default `changeme_local`)
    /// - OPENAI_API_KEY                     -> provider credential (required at request time)
    /// - OPENAI_MODEL                       -> model identifier (default `gpt-4o-mini`)
    /// - PORT                               -> listening port (default 8080)
    /// - BIND_HOST                          -> listening host (default 0.0.0.0)
    /// - OPENAI_BASE_URL                    -> completion API base (default public endpoint)
    /// - INSIGHTS_UPSTREAM_TIMEOUT_SECONDS  -> outbound timeout in seconds (u64, unset = none)
    /// - INSIGHTS_NO_PROXY                  -> 1|true|yes|on disables all proxies
    /// - HTTP_PROXY / http_proxy            -> HTTP proxy
    /// - HTTPS_PROXY / https_proxy          -> HTTPS proxy
    /// - CORS_ALLOWED_ORIGINS               -> "*" or comma-separated origins
    /// - CORS_ALLOWED_METHODS               -> "*" or comma-separated methods
    /// - CORS_ALLOWED_HEADERS               -> "*" or comma-separated request header names
    /// - CORS_ALLOW_CREDENTIALS             -> 1|true|yes|on
    /// - CORS_MAX_AGE                       -> preflight max age in seconds (u64)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("PORT") {
            Some(p) => p
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT value: {p}"))?,
            None => DEFAULT_PORT,
        };

        let upstream_timeout = match get("INSIGHTS_UPSTREAM_TIMEOUT_SECONDS") {
            Some(s) => Some(Duration::from_secs(s.parse::<u64>().with_context(|| {
                format!("Invalid INSIGHTS_UPSTREAM_TIMEOUT_SECONDS value: {s}")
            })?)),
            None => None,
        };

        let openai_base_url = get("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let proxy = ProxyConfig {
            disabled: get("INSIGHTS_NO_PROXY").is_some_and(|v| truthy(&v)),
            http: get("HTTP_PROXY").or_else(|| get("http_proxy")),
            https: get("HTTPS_PROXY").or_else(|| get("https_proxy")),
        };

        let cors = CorsConfig {
            allowed_origins: get("CORS_ALLOWED_ORIGINS").and_then(|v| parse_list(&v)),
            allowed_methods: get("CORS_ALLOWED_METHODS").and_then(|v| parse_list(&v)),
            allowed_headers: get("CORS_ALLOWED_HEADERS").and_then(|v| parse_list(&v)),
            allow_credentials: get("CORS_ALLOW_CREDENTIALS").is_some_and(|v| truthy(&v)),
            max_age: match get("CORS_MAX_AGE") {
                Some(s) => Some(Duration::from_secs(
                    s.parse::<u64>()
                        .with_context(|| format!("Invalid CORS_MAX_AGE value: {s}"))?,
                )),
                None => None,
            },
        };

        Ok(Self {
            dashboard_secret: get("DASHBOARD_SECRET")
                .unwrap_or_else(|| DEFAULT_DASHBOARD_SECRET.to_string()),
            openai_api_key: get("OPENAI_API_KEY"),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            port,
            bind_host: get("BIND_HOST").unwrap_or_else(|| DEFAULT_BIND_HOST.to_string()),
            openai_base_url,
            upstream_timeout,
            proxy,
            cors,
        })
    }

    /// Build configuration from a fixed map, mostly useful in tests.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.dashboard_secret == DEFAULT_DASHBOARD_SECRET
    }
}

fn truthy(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Split a comma-separated list. `None` means "any": empty, or `*` anywhere in the list.
fn parse_list(raw: &str) -> Option<Vec<String>> {
    let items: Vec<String> = raw
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if items.is_empty() || items.iter().any(|p| p == "*") {
        return None;
    }
    Some(items)
}
