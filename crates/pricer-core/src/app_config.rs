use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    /// Set when running inside a hosted function runtime rather than a local process.
    pub hosted: bool,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub vision_model: String,
    pub upstream_timeout_secs: u64,
    pub max_body_bytes: usize,
    pub serpapi_configured: bool,
    pub google_api_configured: bool,
    pub google_search_engine_configured: bool,
}

impl AppConfig {
    /// Whether raw model replies and unredacted upstream errors may be
    /// returned to callers.
    ///
    /// Only true for local, non-production processes.
    #[must_use]
    pub fn verbose(&self) -> bool {
        self.env != Environment::Production && !self.hosted
    }

    #[must_use]
    pub fn has_openai_key(&self) -> bool {
        self.openai_api_key.is_some()
    }

    /// Human-readable runtime label used in response bodies.
    #[must_use]
    pub fn runtime_label(&self) -> String {
        if self.hosted {
            "AWS Lambda".to_string()
        } else {
            self.env.to_string()
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("hosted", &self.hosted)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("openai_base_url", &self.openai_base_url)
            .field("vision_model", &self.vision_model)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("serpapi_configured", &self.serpapi_configured)
            .field("google_api_configured", &self.google_api_configured)
            .field(
                "google_search_engine_configured",
                &self.google_search_engine_configured,
            )
            .finish()
    }
}
