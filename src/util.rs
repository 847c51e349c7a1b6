use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{AppConfig, CorsConfig};
use crate::provider::OpenAiClient;

/// Initialize dotenv and structured tracing based on RUST_LOG.
///
/// - Supports explicit env file paths via ENV_FILE or DOTENV_PATH
/// - Falls back to default `.env` discovery
/// - Logs the source used
pub fn init_tracing() {
    let mut env_source: String = "none".into();
    for key in ["ENV_FILE", "DOTENV_PATH"] {
        if let Ok(p) = std::env::var(key) {
            let p = p.trim();
            if !p.is_empty()
                && std::path::Path::new(p).is_file()
                && dotenvy::from_filename(p).is_ok()
            {
                env_source = format!("{p} ({key})");
                break;
            }
        }
    }

    if env_source == "none" {
        if let Ok(path) = dotenvy::dotenv() {
            env_source = path.display().to_string();
        }
    }

    // RUST_LOG may come from the env file loaded above
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".into());
    let subscriber = fmt().with_env_filter(EnvFilter::new(filter)).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    tracing::info!("Environment loaded from: {}", env_source);
}

/// Shared, immutable application state used by the handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub provider: OpenAiClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let http = build_http_client(&config);
        let provider = OpenAiClient::new(http, &config);
        Self { config, provider }
    }
}

/// Build the outbound HTTP client from `AppConfig::upstream_timeout` and `AppConfig::proxy`.
pub fn build_http_client(config: &AppConfig) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();

    if let Some(timeout) = config.upstream_timeout {
        builder = builder.timeout(timeout);
    }

    let proxy = &config.proxy;
    if proxy.disabled {
        builder = builder.no_proxy();
    } else {
        if let Some(p) = proxy
            .http
            .as_deref()
            .and_then(|u| reqwest::Proxy::http(u).ok())
        {
            builder = builder.proxy(p);
        }
        if let Some(p) = proxy
            .https
            .as_deref()
            .and_then(|u| reqwest::Proxy::https(u).ok())
        {
            builder = builder.proxy(p);
        }
    }

    builder = builder.user_agent(format!("insight-relay/{}", env!("CARGO_PKG_VERSION")));

    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "falling back to default HTTP client");
        reqwest::Client::new()
    })
}

/// Entries of an explicit list, or `None` when any value is allowed.
fn explicit(list: &Option<Vec<String>>) -> Option<&[String]> {
    match list.as_deref() {
        Some(items) if !items.iter().any(|i| i.trim() == "*") => Some(items),
        _ => None,
    }
}

/// Build the CORS layer. Missing lists and lists with no usable entry are permissive (Any).
pub fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new();

    let origins: Vec<http::HeaderValue> = explicit(&cors.allowed_origins)
        .unwrap_or_default()
        .iter()
        .filter_map(|o| http::HeaderValue::from_str(o.trim()).ok())
        .collect();
    let any_origin = origins.is_empty();
    layer = if any_origin {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    };

    let methods: Vec<http::Method> = explicit(&cors.allowed_methods)
        .unwrap_or_default()
        .iter()
        .filter_map(|m| http::Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes()).ok())
        .collect();
    let any_method = methods.is_empty();
    layer = if any_method {
        layer.allow_methods(Any)
    } else {
        layer.allow_methods(AllowMethods::list(methods))
    };

    let headers: Vec<http::header::HeaderName> = explicit(&cors.allowed_headers)
        .unwrap_or_default()
        .iter()
        .filter_map(|h| http::header::HeaderName::try_from(h.trim()).ok())
        .collect();
    let any_header = headers.is_empty();
    layer = if any_header {
        layer.allow_headers(Any)
    } else {
        layer.allow_headers(AllowHeaders::list(headers))
    };

    // tower-http rejects credentials combined with any wildcard
    if cors.allow_credentials {
        if any_origin || any_method || any_header {
            tracing::warn!(
                "CORS_ALLOW_CREDENTIALS ignored: origins, methods and headers must be explicit lists"
            );
        } else {
            layer = layer.allow_credentials(true);
        }
    }

    if let Some(max_age) = cors.max_age {
        layer = layer.max_age(max_age);
    }

    layer
}
