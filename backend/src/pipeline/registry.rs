//! One analysis pipeline per authenticated user

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::orchestrator::AnalysisPipeline;
use super::providers::{LocationStore, SoilAdvisor, WeatherProvider};

pub struct PipelineRegistry {
    weather: Arc<dyn WeatherProvider>,
    advisor: Arc<dyn SoilAdvisor>,
    locations: Arc<dyn LocationStore>,
    pipelines: RwLock<HashMap<Uuid, Arc<AnalysisPipeline>>>,
}

impl PipelineRegistry {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        advisor: Arc<dyn SoilAdvisor>,
        locations: Arc<dyn LocationStore>,
    ) -> Self {
        Self {
            weather,
            advisor,
            locations,
            pipelines: RwLock::new(HashMap::new()),
        }
    }

    /// The user's pipeline, restoring their last location on first use
    pub async fn get_or_create(&self, user_id: Uuid) -> Arc<AnalysisPipeline> {
        if let Some(pipeline) = self.pipelines.read().await.get(&user_id) {
            return pipeline.clone();
        }

        let restored = Arc::new(
            AnalysisPipeline::restore(
                user_id,
                self.weather.clone(),
                self.advisor.clone(),
                self.locations.clone(),
            )
            .await,
        );

        // Another request may have raced us here; keep whichever landed first
        self.pipelines
            .write()
            .await
            .entry(user_id)
            .or_insert(restored)
            .clone()
    }

    /// Drop the user's pipeline; the next session starts from the restored location
    pub async fn remove(&self, user_id: Uuid) -> bool {
        let removed = self.pipelines.write().await.remove(&user_id).is_some();
        if removed {
            tracing::debug!(user_id = %user_id, "Analysis session ended");
        }
        removed
    }
}
