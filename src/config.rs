/// Runtime configuration, read from the environment.
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | ROYAL_QUADS_DB | royal_quads.db | SQLite database file |
/// | BIND_ADDR | 0.0.0.0 | HTTP listen address |
/// | HTTP_PORT | 3000 | HTTP listen port |
/// | LOG_FORMAT | pretty | `pretty` or `json` |
/// | ENVIRONMENT | development | Deployment name, logged at startup |
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub bind_addr: String,
    pub http_port: u16,
    pub log_format: LogFormat,
    pub environment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "royal_quads.db".into(),
            bind_addr: "0.0.0.0".into(),
            http_port: 3000,
            log_format: LogFormat::Pretty,
            environment: "development".into(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: std::env::var("ROYAL_QUADS_DB").unwrap_or(defaults.db_path),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.http_port),
            log_format: match std::env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => defaults.log_format,
            },
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.http_port)
    }
}
