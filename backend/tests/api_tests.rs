//! HTTP API tests
//!
//! Exercises the router end to end with in-memory providers. Requests that
//! would reach PostgreSQL are not covered here; the pool is lazy and never
//! connects.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use cropwise_backend::config::{
    DatabaseConfig, GenerativeConfig, JwtConfig, ServerConfig, WeatherConfig,
};
use cropwise_backend::pipeline::{LocationStore, PipelineRegistry, SoilAdvisor, WeatherProvider};
use cropwise_backend::services::auth::Claims;
use cropwise_backend::{create_app, AppError, AppResult, AppState, Config};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use shared::{
    CropRecommendation, LocationQuery, SoilDetail, SoilTypeOption, Suitability, WeatherSnapshot,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "api-test-secret";

struct StaticWeather;

#[async_trait]
impl WeatherProvider for StaticWeather {
    async fn current_weather(&self, location: &LocationQuery) -> AppResult<WeatherSnapshot> {
        if location.as_str() == "Zzzzqx" {
            return Err(AppError::LocationNotFound);
        }
        Ok(WeatherSnapshot {
            temperature_celsius: 27.0,
            humidity_percent: 80,
            conditions: "haze".to_string(),
            icon: "50d".to_string(),
            wind_speed_mps: 1.5,
            pressure_hpa: 1009,
        })
    }
}

struct StaticAdvisor;

#[async_trait]
impl SoilAdvisor for StaticAdvisor {
    async fn discover_soil_types(&self, _location: &LocationQuery) -> AppResult<Vec<SoilTypeOption>> {
        Ok(vec![
            SoilTypeOption {
                id: "alluvial".to_string(),
                name: "Alluvial".to_string(),
                description: "River deposits".to_string(),
            },
            SoilTypeOption {
                id: "black".to_string(),
                name: "Black Cotton".to_string(),
                description: "Clay rich".to_string(),
            },
        ])
    }

    async fn detail_soil(
        &self,
        _location: &LocationQuery,
        soil_type: &SoilTypeOption,
    ) -> AppResult<SoilDetail> {
        Ok(SoilDetail {
            soil_type: soil_type.name.clone(),
            characteristics: "Fertile".to_string(),
            suitable_crops: vec!["Rice".to_string()],
        })
    }

    async fn recommend_crops(
        &self,
        _location: &LocationQuery,
        soil: &SoilDetail,
        _weather: &WeatherSnapshot,
    ) -> AppResult<Vec<CropRecommendation>> {
        Ok(vec![CropRecommendation {
            crop: format!("Rice on {}", soil.soil_type),
            suitability: Suitability::High,
            rationale: "Humid".to_string(),
        }])
    }
}

struct NoLocations;

#[async_trait]
impl LocationStore for NoLocations {
    async fn load(&self, _user_id: Uuid) -> AppResult<Option<LocationQuery>> {
        Ok(None)
    }

    async fn save(&self, _user_id: Uuid, _location: &LocationQuery) -> AppResult<()> {
        Ok(())
    }
}

fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "postgres://localhost/cropwise_test".to_string(),
            max_connections: 1,
            min_connections: 0,
        },
        jwt: JwtConfig {
            secret: SECRET.to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        },
        weather: WeatherConfig {
            api_endpoint: "http://127.0.0.1:1".to_string(),
            api_key: "unused".to_string(),
            timeout_secs: 1,
        },
        generative: GenerativeConfig {
            api_endpoint: "http://127.0.0.1:1".to_string(),
            api_key: "unused".to_string(),
            model: "gemini-2.0-flash-lite".to_string(),
            recommendation_model: None,
            temperature: 0.2,
            max_output_tokens: 1000,
            timeout_secs: 1,
        },
    }
}

fn app() -> Router {
    let config = test_config();
    let db = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .unwrap();
    let pipelines = PipelineRegistry::new(
        Arc::new(StaticWeather),
        Arc::new(StaticAdvisor),
        Arc::new(NoLocations),
    );

    create_app(AppState {
        db,
        config: Arc::new(config),
        pipelines: Arc::new(pipelines),
    })
}

fn token_for(user_id: Uuid) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        email: "farmer@example.com".to_string(),
        exp: now + 600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_analysis_requires_token() {
    let (status, body) = send(app(), Method::GET, "/api/v1/analysis", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_token_with_wrong_secret_is_rejected() {
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        email: "farmer@example.com".to_string(),
        exp: chrono::Utc::now().timestamp() + 600,
        iat: chrono::Utc::now().timestamp(),
    };
    let forged = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"not-the-secret"),
    )
    .unwrap();

    let (status, _) = send(app(), Method::GET, "/api/v1/analysis", Some(&forged), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_submit_and_select_through_api() {
    let app = app();
    let token = token_for(Uuid::new_v4());

    let (status, view) = send(
        app.clone(),
        Method::POST,
        "/api/v1/analysis",
        Some(&token),
        Some(json!({"location": "Patna"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["phase"], "ready");
    assert_eq!(view["location"], "Patna");
    assert_eq!(view["selected_soil_type"], "alluvial");
    assert_eq!(view["recommendations"][0]["crop"], "Rice on Alluvial");
    assert_eq!(view["recommendations"][0]["suitability"], "High");

    let (status, view) = send(
        app.clone(),
        Method::POST,
        "/api/v1/analysis/soil",
        Some(&token),
        Some(json!({"soil_type_id": "black"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["soil_detail"]["soil_type"], "Black Cotton");

    let (status, view) = send(app, Method::GET, "/api/v1/analysis", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["selected_soil_type"], "black");
}

#[tokio::test]
async fn test_provider_failure_is_reported_in_view() {
    let token = token_for(Uuid::new_v4());

    let (status, view) = send(
        app(),
        Method::POST,
        "/api/v1/analysis",
        Some(&token),
        Some(json!({"location": "Zzzzqx"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["phase"], "failed");
    assert_eq!(view["failure"]["code"], "LOCATION_NOT_FOUND");
    assert_eq!(view["soil_types"], json!([]));
}

#[tokio::test]
async fn test_blank_location_is_bad_request() {
    let token = token_for(Uuid::new_v4());

    let (status, body) = send(
        app(),
        Method::POST,
        "/api/v1/analysis",
        Some(&token),
        Some(json!({"location": "  "})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "location");
    assert_eq!(
        body["error"]["message"],
        "Please enter a location to get soil data."
    );
}

#[tokio::test]
async fn test_select_before_submit_is_unprocessable() {
    let token = token_for(Uuid::new_v4());

    let (status, body) = send(
        app(),
        Method::POST,
        "/api/v1/analysis/soil",
        Some(&token),
        Some(json!({"soil_type_id": "alluvial"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_STATE_TRANSITION");
}

#[tokio::test]
async fn test_category_options_are_public() {
    let (status, body) = send(
        app(),
        Method::GET,
        "/api/v1/market/categories/Fruit",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["categories"],
        json!(["Citrus", "Berry", "Tropical", "Stone Fruit", "Pome Fruit", "Other"])
    );

    let (status, _) = send(
        app(),
        Method::GET,
        "/api/v1/market/categories/Mineral",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blank_market_search_is_rejected() {
    let (status, body) = send(app(), Method::GET, "/api/v1/market/search?q=%20", None, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "q");
}

#[tokio::test]
async fn test_listings_require_token() {
    let (status, _) = send(app(), Method::GET, "/api/v1/listings", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
