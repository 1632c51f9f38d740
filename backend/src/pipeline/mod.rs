//! Location analysis pipeline
//!
//! Turns a free-text location into weather, soil, and crop advice in four
//! dependent stages.

mod orchestrator;
mod providers;
mod registry;
mod state;

pub use orchestrator::AnalysisPipeline;
pub use providers::{LocationStore, SoilAdvisor, WeatherProvider};
pub use registry::PipelineRegistry;
pub use state::{AnalysisView, Phase, PipelineFailure, Stage};
