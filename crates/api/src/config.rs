//! Server configuration

/// Top-level server settings, loaded once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP listener binds to
    pub bind_address: String,
    /// Origins allowed by the CORS layer
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // Default to localhost for development/self-hosted; production
        // deployments should set ALLOWED_ORIGINS explicitly
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            bind_address,
            allowed_origins,
        }
    }
}
