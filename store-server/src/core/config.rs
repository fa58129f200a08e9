/// Server configuration
///
/// # Environment variables
///
/// Every field can be overridden through an environment variable:
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | HTTP_PORT | 3000 | HTTP API port |
/// | WORK_DIR | ./work_dir | Directory for logs and local files |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | LOG_LEVEL | info | Default tracing filter (RUST_LOG wins) |
///
/// # Examples
///
/// ```ignore
/// HTTP_PORT=8080 ENVIRONMENT=production cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API port
    pub http_port: u16,
    /// Directory for logs and local files
    pub work_dir: String,
    /// Running environment: development | staging | production
    pub environment: String,
    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./work_dir".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
