//! Configuration management for the Cropwise platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with CROPWISE__ prefix
//!
//! Provider API keys and the JWT secret have no defaults and must be supplied
//! through a file or the environment.

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Weather API configuration
    pub weather: WeatherConfig,

    /// Generative-language API configuration
    pub generative: GenerativeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiration in seconds
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Weather API base URL (OpenWeatherMap 2.5)
    pub api_endpoint: String,

    /// Weather API key
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerativeConfig {
    /// Generative-language API base URL
    pub api_endpoint: String,

    /// API key sent in the x-goog-api-key header
    pub api_key: String,

    /// Model used for soil discovery and soil detail
    pub model: String,

    /// Model used for crop recommendations; falls back to `model`
    pub recommendation_model: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Upper bound on reply length
    pub max_output_tokens: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl GenerativeConfig {
    pub fn recommendation_model(&self) -> &str {
        self.recommendation_model.as_deref().unwrap_or(&self.model)
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("CROPWISE_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 3600)?
            .set_default("jwt.refresh_token_expiry", 604800)?
            .set_default("weather.api_endpoint", "https://api.openweathermap.org/data/2.5")?
            .set_default("weather.timeout_secs", 15)?
            .set_default(
                "generative.api_endpoint",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("generative.model", "gemini-2.0-flash-lite")?
            .set_default("generative.temperature", 0.2)?
            .set_default("generative.max_output_tokens", 1000)?
            .set_default("generative.timeout_secs", 60)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (CROPWISE__ prefix)
            .add_source(
                Environment::with_prefix("CROPWISE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
