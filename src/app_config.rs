// Runtime configuration, read from the environment (and `.env` via dotenv).
//
// Environment variables:
// - `APP_HOST` / `APP_PORT` - where the HTTP server binds (default 0.0.0.0:4002)
// - `APP_URL` - root URL Mattermost uses to reach us (goes into the manifest)
// - `APP_SECRET` - JWT secret shared with Mattermost; unset disables verification
// - `GOOGLE_AUTH_URL`, `GOOGLE_TOKEN_URL`, `GOOGLE_DRIVE_API_URL`,
//   `GOOGLE_UPLOAD_API_URL` - endpoint overrides, mostly for testing

use std::net::SocketAddr;

use crate::infra::google::GoogleEndpoints;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub root_url: String,
    pub app_secret: Option<String>,
    pub google: GoogleEndpoints,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("root_url", &self.root_url)
            .field("jwt_enabled", &self.app_secret.is_some())
            .field("google", &self.google)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = var("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = var("APP_PORT").unwrap_or_else(|| "4002".to_string());
        let bind_addr: SocketAddr =
            format!("{}:{}", host, port)
                .parse()
                .map_err(|_| ConfigError::Invalid {
                    name: "APP_HOST/APP_PORT",
                    value: format!("{}:{}", host, port),
                })?;

        let root_url = var("APP_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", bind_addr.port()))
            .trim_end_matches('/')
            .to_string();
        if !root_url.starts_with("http://") && !root_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "APP_URL",
                value: root_url,
            });
        }

        let defaults = GoogleEndpoints::default();
        let google = GoogleEndpoints {
            auth_url: var("GOOGLE_AUTH_URL").unwrap_or(defaults.auth_url),
            token_url: var("GOOGLE_TOKEN_URL").unwrap_or(defaults.token_url),
            drive_api_url: var("GOOGLE_DRIVE_API_URL").unwrap_or(defaults.drive_api_url),
            upload_api_url: var("GOOGLE_UPLOAD_API_URL").unwrap_or(defaults.upload_api_url),
        };

        Ok(Self {
            bind_addr,
            root_url,
            app_secret: var("APP_SECRET"),
            google,
        })
    }
}
