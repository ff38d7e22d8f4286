/// Default API server URL.
/// Override at runtime with PUBLIC_API_BASE_URL (a `.env` file is honored).
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to, without a trailing slash.
    pub api_base_url: String,
    /// Enables debug logging of API failures.
    pub debug: bool,
}

impl ClientConfig {
    pub fn new(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            debug: false,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_vars(
            std::env::var("PUBLIC_API_BASE_URL").ok(),
            std::env::var("PUBLIC_DEBUG").ok(),
        )
    }

    /// Build from raw `PUBLIC_API_BASE_URL` / `PUBLIC_DEBUG` values.
    /// Debug is on only for the exact string `"true"`.
    pub fn from_vars(base_url: Option<String>, debug: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let debug = debug.as_deref() == Some("true");
        Self::new(&base_url).with_debug(debug)
    }
}
