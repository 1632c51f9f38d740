//! Seams between the pipeline and the outside world
//!
//! Production implementations live in `external` and `services`; tests plug in
//! in-memory fakes.

use async_trait::async_trait;
use shared::{CropRecommendation, LocationQuery, SoilDetail, SoilTypeOption, WeatherSnapshot};
use uuid::Uuid;

use crate::error::AppResult;
use crate::external::WeatherClient;

/// Source of current weather conditions
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, location: &LocationQuery) -> AppResult<WeatherSnapshot>;
}

/// Source of AI-generated soil and crop advice
#[async_trait]
pub trait SoilAdvisor: Send + Sync {
    /// Candidate soil categories for a location
    async fn discover_soil_types(&self, location: &LocationQuery) -> AppResult<Vec<SoilTypeOption>>;

    /// Characteristics of one soil category at a location
    async fn detail_soil(
        &self,
        location: &LocationQuery,
        soil_type: &SoilTypeOption,
    ) -> AppResult<SoilDetail>;

    /// Crops ranked against a soil detail and the current weather
    async fn recommend_crops(
        &self,
        location: &LocationQuery,
        soil: &SoilDetail,
        weather: &WeatherSnapshot,
    ) -> AppResult<Vec<CropRecommendation>>;
}

/// Durable per-user "last location"
#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn load(&self, user_id: Uuid) -> AppResult<Option<LocationQuery>>;

    async fn save(&self, user_id: Uuid, location: &LocationQuery) -> AppResult<()>;
}

#[async_trait]
impl WeatherProvider for WeatherClient {
    async fn current_weather(&self, location: &LocationQuery) -> AppResult<WeatherSnapshot> {
        self.get_current_weather(location).await
    }
}
