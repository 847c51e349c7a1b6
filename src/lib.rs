#![forbid(unsafe_code)]
#![doc = r#"
Insight Relay

Accept microservice health telemetry, ask an OpenAI chat model for an SRE analysis, and return
the answer in a fixed JSON envelope.

Crate highlights
- HTTP server (in `server`): `POST /api/ai-insights` (gated by the `x-dashboard-secret` header)
  and `GET /health`.
- Prompting: a fixed system instruction plus a pretty-printed dump of the services.
- Normalization: strict JSON, then the outermost `{...}` span, then the raw text as `{ "text": ... }`.

Modules
- `config`: `AppConfig`, built once from the environment.
- `auth`: shared-secret middleware.
- `models`: Chat Completions request subset and the insight payload/envelope types.
- `prompt`: prompt construction.
- `provider`: outbound Chat Completions client.
- `normalize`: best-effort parsing of the model output.
- `error`: request error taxonomy and JSON rendering.
- `server`: Axum router and handlers.
- `util`: shared helpers (tracing, HTTP client, CORS, app state).
"#]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod prompt;
pub mod provider;
pub mod server;
pub mod util;

pub use crate::config::AppConfig;
pub use crate::error::AppError;
pub use crate::normalize::normalize_content;
pub use crate::server::build_router;
pub use crate::util::AppState;
