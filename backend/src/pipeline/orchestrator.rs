//! Dependent-fetch orchestration for one user's analysis
//!
//! Weather and soil discovery run together on submit; the first soil type is
//! then auto-selected, detailed, and used with the weather snapshot to rank
//! crops. Every in-flight stage holds a ticket (run id, selection id) and its
//! result is applied only while that ticket is still current. The state lock
//! is never held across a provider call.

use std::sync::Arc;

use shared::{LocationQuery, SoilTypeOption, WeatherSnapshot};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::providers::{LocationStore, SoilAdvisor, WeatherProvider};
use super::state::{AnalysisState, AnalysisView, Phase, PipelineFailure, Stage};
use crate::error::{AppError, AppResult};

/// Identifies the selection a stage-3/4 result belongs to
#[derive(Debug, Clone)]
struct SelectionTicket {
    run_id: u64,
    selection_id: u64,
    location: LocationQuery,
    soil_type: SoilTypeOption,
    weather: WeatherSnapshot,
}

impl SelectionTicket {
    fn is_current(&self, state: &AnalysisState) -> bool {
        state.run_id == self.run_id && state.selection_id == self.selection_id
    }
}

/// Analysis pipeline for a single user
pub struct AnalysisPipeline {
    user_id: Uuid,
    weather: Arc<dyn WeatherProvider>,
    advisor: Arc<dyn SoilAdvisor>,
    locations: Arc<dyn LocationStore>,
    state: Mutex<AnalysisState>,
}

impl AnalysisPipeline {
    /// Create a pipeline whose input field starts at `restored_location`.
    /// Nothing is fetched until the first submit.
    pub fn new(
        user_id: Uuid,
        weather: Arc<dyn WeatherProvider>,
        advisor: Arc<dyn SoilAdvisor>,
        locations: Arc<dyn LocationStore>,
        restored_location: Option<LocationQuery>,
    ) -> Self {
        Self {
            user_id,
            weather,
            advisor,
            locations,
            state: Mutex::new(AnalysisState::new(restored_location)),
        }
    }

    /// Create a pipeline with the user's last location loaded from the store
    pub async fn restore(
        user_id: Uuid,
        weather: Arc<dyn WeatherProvider>,
        advisor: Arc<dyn SoilAdvisor>,
        locations: Arc<dyn LocationStore>,
    ) -> Self {
        let restored = match locations.load(user_id).await {
            Ok(location) => location,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to restore last location");
                None
            }
        };
        Self::new(user_id, weather, advisor, locations, restored)
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Current snapshot of the analysis
    pub async fn view(&self) -> AnalysisView {
        self.state.lock().await.view()
    }

    /// Start a new analysis for `raw_location`.
    ///
    /// Blank input is rejected without touching state. Provider failures are
    /// reported through the returned view, not as errors.
    pub async fn submit(&self, raw_location: &str) -> AppResult<AnalysisView> {
        let location = LocationQuery::parse(raw_location)?;

        let run_id = {
            let mut state = self.state.lock().await;
            state.run_id += 1;
            state.selection_id += 1;
            state.reset_derived();
            state.location_input = Some(location.clone());
            state.active_location = Some(location.clone());
            state.phase = Phase::Fetching;
            state.run_id
        };

        tracing::info!(user_id = %self.user_id, run_id, location = %location, "Starting analysis");

        let (weather, soil_types) = tokio::join!(
            self.weather.current_weather(&location),
            self.advisor.discover_soil_types(&location),
        );

        let outcome = match (weather, soil_types) {
            (Ok(_), Ok(soil_types)) if soil_types.is_empty() => Err(
                AppError::MalformedModelResponse("no soil types for this location".to_string()),
            ),
            (Ok(weather), Ok(soil_types)) => Ok((weather, soil_types)),
            (Err(e), _) | (_, Err(e)) => Err(e),
        };

        let ticket = {
            let mut state = self.state.lock().await;
            if state.run_id != run_id {
                tracing::debug!(user_id = %self.user_id, run_id, "Discarding stale analysis result");
                return Ok(state.view());
            }

            let (weather, soil_types) = match outcome {
                Ok(results) => results,
                Err(e) => {
                    tracing::warn!(
                        user_id = %self.user_id,
                        run_id,
                        code = e.code(),
                        error = %e,
                        "Analysis failed"
                    );
                    state.phase = Phase::Failed;
                    state.failure = Some(PipelineFailure::new(Stage::Analyze, &e));
                    return Ok(state.view());
                }
            };

            let first = soil_types[0].clone();
            state.weather = Some(weather);
            state.soil_types = soil_types;
            state.phase = Phase::AwaitingSoilSelection;
            Self::begin_selection(&mut state, first)?
        };

        if let Err(e) = self.locations.save(self.user_id, &location).await {
            tracing::warn!(user_id = %self.user_id, error = %e, "Failed to persist last location");
        }

        Ok(self.run_selection(ticket).await)
    }

    /// Switch to another discovered soil type, refetching detail and
    /// recommendations for it.
    pub async fn select_soil_type(&self, soil_type_id: &str) -> AppResult<AnalysisView> {
        let ticket = {
            let mut state = self.state.lock().await;
            if state.soil_types.is_empty() {
                return Err(AppError::InvalidStateTransition(
                    "no soil types to choose from; analyze a location first".to_string(),
                ));
            }
            let option = state
                .soil_types
                .iter()
                .find(|option| option.id == soil_type_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound("Soil type".to_string()))?;
            Self::begin_selection(&mut state, option)?
        };

        Ok(self.run_selection(ticket).await)
    }

    /// Clear the previous detail and recommendations and issue a new ticket
    fn begin_selection(
        state: &mut AnalysisState,
        soil_type: SoilTypeOption,
    ) -> AppResult<SelectionTicket> {
        let (Some(location), Some(weather)) = (state.active_location.clone(), state.weather.clone())
        else {
            return Err(AppError::InvalidStateTransition(
                "analysis has no weather snapshot".to_string(),
            ));
        };

        state.selection_id += 1;
        state.selected_soil_type = Some(soil_type.id.clone());
        state.soil_detail = None;
        state.recommendations.clear();
        state.failure = None;
        state.phase = Phase::FetchingSoilDetail;

        Ok(SelectionTicket {
            run_id: state.run_id,
            selection_id: state.selection_id,
            location,
            soil_type,
            weather,
        })
    }

    /// Fetch soil detail, then recommendations, applying each result only
    /// while the ticket is current
    async fn run_selection(&self, ticket: SelectionTicket) -> AnalysisView {
        tracing::debug!(
            user_id = %self.user_id,
            soil_type = %ticket.soil_type.id,
            selection_id = ticket.selection_id,
            "Fetching soil detail"
        );

        let detail = self
            .advisor
            .detail_soil(&ticket.location, &ticket.soil_type)
            .await;

        let detail = {
            let mut state = self.state.lock().await;
            if !ticket.is_current(&state) {
                tracing::debug!(
                    user_id = %self.user_id,
                    selection_id = ticket.selection_id,
                    "Discarding stale soil detail"
                );
                return state.view();
            }
            match detail {
                Ok(detail) => {
                    state.soil_detail = Some(detail.clone());
                    state.phase = Phase::FetchingRecommendations;
                    detail
                }
                Err(e) => {
                    tracing::warn!(user_id = %self.user_id, code = e.code(), error = %e, "Soil detail failed");
                    state.phase = Phase::Failed;
                    state.failure = Some(PipelineFailure::new(Stage::SoilDetail, &e));
                    return state.view();
                }
            }
        };

        let recommendations = self
            .advisor
            .recommend_crops(&ticket.location, &detail, &ticket.weather)
            .await;

        let mut state = self.state.lock().await;
        if !ticket.is_current(&state) {
            tracing::debug!(
                user_id = %self.user_id,
                selection_id = ticket.selection_id,
                "Discarding stale crop recommendations"
            );
            return state.view();
        }
        match recommendations {
            Ok(recommendations) => {
                tracing::info!(
                    user_id = %self.user_id,
                    soil_type = %ticket.soil_type.id,
                    count = recommendations.len(),
                    "Analysis ready"
                );
                state.recommendations = recommendations;
                state.phase = Phase::Ready;
            }
            Err(e) => {
                tracing::warn!(user_id = %self.user_id, code = e.code(), error = %e, "Crop recommendations failed");
                state.phase = Phase::Failed;
                state.failure = Some(PipelineFailure::new(Stage::Recommendations, &e));
            }
        }
        state.view()
    }
}
