//! Weather API client for fetching current conditions
//!
//! Integrates with the OpenWeatherMap 2.5 API, querying by free-text location
//! in metric units.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use shared::{LocationQuery, WeatherSnapshot};
use std::time::Duration;

use crate::config::WeatherConfig;
use crate::error::{AppError, AppResult};

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// OpenWeatherMap API response for current weather
#[derive(Debug, Deserialize)]
struct OWMCurrentResponse {
    #[serde(default)]
    weather: Vec<OWMWeather>,
    main: OWMMain,
    wind: OWMWind,
}

#[derive(Debug, Deserialize)]
struct OWMWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OWMMain {
    temp: f64,
    pressure: i32,
    humidity: i32,
}

#[derive(Debug, Deserialize)]
struct OWMWind {
    speed: f64,
}

impl WeatherClient {
    /// Create a new WeatherClient from configuration
    pub fn new(config: &WeatherConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Create a new WeatherClient with custom base URL (for testing)
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch current weather conditions for a free-text location
    pub async fn get_current_weather(&self, location: &LocationQuery) -> AppResult<WeatherSnapshot> {
        let url = format!("{}/weather", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", location.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Weather API request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::info!(location = %location, "Weather provider does not know location");
            return Err(AppError::LocationNotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "Weather API error");
            return Err(AppError::WeatherServiceError {
                status: status.as_u16(),
            });
        }

        let data: OWMCurrentResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse weather response: {}", e))
        })?;

        Ok(Self::convert_current_response(data))
    }

    /// Convert OpenWeatherMap current response to our format
    fn convert_current_response(data: OWMCurrentResponse) -> WeatherSnapshot {
        let weather = data.weather.into_iter().next();

        WeatherSnapshot {
            temperature_celsius: data.main.temp,
            humidity_percent: data.main.humidity,
            conditions: weather.as_ref().map(|w| w.description.clone()).unwrap_or_default(),
            icon: weather.map(|w| w.icon).unwrap_or_default(),
            wind_speed_mps: data.wind.speed,
            pressure_hpa: data.main.pressure,
        }
    }
}
