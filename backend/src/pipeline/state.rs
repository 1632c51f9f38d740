//! Pipeline phases and the per-user analysis state

use serde::Serialize;
use shared::{CropRecommendation, LocationQuery, SoilDetail, SoilTypeOption, WeatherSnapshot};

use crate::error::AppError;

/// Where an analysis currently stands
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Fetching,
    AwaitingSoilSelection,
    FetchingSoilDetail,
    FetchingRecommendations,
    Ready,
    Failed,
}

impl Phase {
    /// True while a provider call is outstanding
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Phase::Fetching | Phase::FetchingSoilDetail | Phase::FetchingRecommendations
        )
    }
}

/// Stage that produced a failure
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Analyze,
    SoilDetail,
    Recommendations,
}

impl Stage {
    /// Banner shown to the user when this stage fails
    pub fn banner(&self) -> &'static str {
        match self {
            Stage::Analyze => {
                "Failed to fetch data for this location. Please try again or check the location name."
            }
            Stage::SoilDetail => "Failed to fetch detailed soil information. Please try again.",
            Stage::Recommendations => "Failed to fetch crop recommendations. Please try again.",
        }
    }
}

/// A failed stage as reported to the client
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PipelineFailure {
    pub stage: Stage,
    pub message: String,
    pub detail: String,
    pub code: String,
}

impl PipelineFailure {
    pub fn new(stage: Stage, error: &AppError) -> Self {
        Self {
            stage,
            message: stage.banner().to_string(),
            detail: error.user_message(),
            code: error.code().to_string(),
        }
    }
}

/// Mutable analysis state for one user
#[derive(Debug, Clone)]
pub(crate) struct AnalysisState {
    pub phase: Phase,
    pub location_input: Option<LocationQuery>,
    pub active_location: Option<LocationQuery>,
    pub weather: Option<WeatherSnapshot>,
    pub soil_types: Vec<SoilTypeOption>,
    pub selected_soil_type: Option<String>,
    pub soil_detail: Option<SoilDetail>,
    pub recommendations: Vec<CropRecommendation>,
    pub failure: Option<PipelineFailure>,
    pub run_id: u64,
    pub selection_id: u64,
}

impl AnalysisState {
    pub fn new(restored_location: Option<LocationQuery>) -> Self {
        Self {
            phase: Phase::Idle,
            location_input: restored_location,
            active_location: None,
            weather: None,
            soil_types: Vec::new(),
            selected_soil_type: None,
            soil_detail: None,
            recommendations: Vec::new(),
            failure: None,
            run_id: 0,
            selection_id: 0,
        }
    }

    /// Drop everything derived from a previous analysis
    pub fn reset_derived(&mut self) {
        self.active_location = None;
        self.weather = None;
        self.soil_types.clear();
        self.selected_soil_type = None;
        self.soil_detail = None;
        self.recommendations.clear();
        self.failure = None;
    }

    pub fn view(&self) -> AnalysisView {
        AnalysisView {
            phase: self.phase,
            location: self.location_input.as_ref().map(|l| l.to_string()),
            weather: self.weather.clone(),
            soil_types: self.soil_types.clone(),
            selected_soil_type: self.selected_soil_type.clone(),
            soil_detail: self.soil_detail.clone(),
            recommendations: self.recommendations.clone(),
            failure: self.failure.clone(),
            run_id: self.run_id,
        }
    }
}

/// Serializable snapshot of a user's analysis
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalysisView {
    pub phase: Phase,
    pub location: Option<String>,
    pub weather: Option<WeatherSnapshot>,
    pub soil_types: Vec<SoilTypeOption>,
    pub selected_soil_type: Option<String>,
    pub soil_detail: Option<SoilDetail>,
    pub recommendations: Vec<CropRecommendation>,
    pub failure: Option<PipelineFailure>,
    pub run_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_serializes_snake_case() {
        let json = serde_json::to_string(&Phase::AwaitingSoilSelection).unwrap();
        assert_eq!(json, "\"awaiting_soil_selection\"");
    }

    #[test]
    fn test_in_flight_phases() {
        assert!(Phase::Fetching.is_in_flight());
        assert!(Phase::FetchingRecommendations.is_in_flight());
        assert!(!Phase::AwaitingSoilSelection.is_in_flight());
        assert!(!Phase::Failed.is_in_flight());
    }

    #[test]
    fn test_failure_carries_banner_and_detail() {
        let failure = PipelineFailure::new(Stage::Analyze, &AppError::LocationNotFound);
        assert!(failure.message.starts_with("Failed to fetch data for this location"));
        assert!(failure.detail.contains("Location not found"));
        assert_eq!(failure.code, "LOCATION_NOT_FOUND");
    }

    #[test]
    fn test_restored_location_starts_idle() {
        let state = AnalysisState::new(Some(LocationQuery::parse("Nairobi").unwrap()));
        let view = state.view();
        assert_eq!(view.phase, Phase::Idle);
        assert_eq!(view.location.as_deref(), Some("Nairobi"));
        assert!(view.weather.is_none());
    }
}
