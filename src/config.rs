use std::time::Duration;

use crate::error::AppError;
use crate::store::StoreConfig;

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// Request body ceiling. Must accommodate base64-encoded images.
    pub max_body_bytes: usize,
    pub offline_timeout_secs: u64,
    pub session_ttl_secs: u64,
    pub daily_image_quota: u32,
    pub quota_window_secs: u64,
    pub request_timeout_secs: u64,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?,
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .unwrap_or_else(|_| "8388608".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid MAX_BODY_BYTES: {}", e)))?,
            offline_timeout_secs: std::env::var("OFFLINE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid OFFLINE_TIMEOUT_SECS: {}", e)))?,
            session_ttl_secs: std::env::var("SESSION_TTL_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid SESSION_TTL_SECS: {}", e)))?,
            daily_image_quota: std::env::var("DAILY_IMAGE_QUOTA")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid DAILY_IMAGE_QUOTA: {}", e)))?,
            quota_window_secs: std::env::var("QUOTA_WINDOW_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid QUOTA_WINDOW_SECS: {}", e)))?,
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid REQUEST_TIMEOUT_SECS: {}", e)))?,
            rate_limit_max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid RATE_LIMIT_MAX_REQUESTS: {}", e)))?,
            rate_limit_window_secs: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid RATE_LIMIT_WINDOW_SECS: {}", e)))?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            session_ttl: Duration::from_secs(self.session_ttl_secs),
            offline_timeout: Duration::from_secs(self.offline_timeout_secs),
            daily_image_quota: self.daily_image_quota,
            quota_window: Duration::from_secs(self.quota_window_secs),
        }
    }
}
