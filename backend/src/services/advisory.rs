//! Soil and crop advisory service
//!
//! Builds prompts for the generative model and turns its replies into
//! validated domain types.

use async_trait::async_trait;
use shared::{
    decode_reply, normalize_crop_recommendations, normalize_soil_detail, normalize_soil_options,
    CropRecommendation, JsonShape, LocationQuery, ModelCropRecommendation, ModelSoilDetail,
    ModelSoilOption, SoilDetail, SoilTypeOption, WeatherSnapshot,
};

use crate::config::GenerativeConfig;
use crate::error::{AppError, AppResult};
use crate::external::GenerativeClient;
use crate::pipeline::SoilAdvisor;

const RAW_JSON_ONLY: &str = "Format as proper JSON with no markdown or explanations outside the JSON.";

/// Soil advisory service backed by a generative model
#[derive(Clone)]
pub struct SoilAdvisoryService {
    client: GenerativeClient,
    model: String,
    recommendation_model: String,
}

impl SoilAdvisoryService {
    pub fn new(client: GenerativeClient, config: &GenerativeConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            recommendation_model: config.recommendation_model().to_string(),
        }
    }

    /// Use explicit model ids (for testing)
    pub fn with_models(client: GenerativeClient, model: &str, recommendation_model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            recommendation_model: recommendation_model.to_string(),
        }
    }

    fn soil_types_prompt(location: &LocationQuery) -> String {
        format!(
            "Based on the geographic location {location}, provide a JSON array of common soil types found in this region.\n\
             Include 3-5 soil types with these fields for each: \
             id (a short identifier), name (the soil type name), and description (brief characteristics of the soil).\n\
             {RAW_JSON_ONLY} Just return a raw JSON array."
        )
    }

    fn soil_detail_prompt(location: &LocationQuery, soil_type: &SoilTypeOption) -> String {
        format!(
            "Provide detailed information about {name} soil in {location}.\n\
             Give the response as a JSON object with these fields: \
             type (full soil name), \
             characteristics (detailed description of properties), \
             and suitableCrops (an array of strings listing crops that grow well in this soil).\n\
             {RAW_JSON_ONLY}",
            name = soil_type.name,
        )
    }

    fn recommendation_prompt(
        location: &LocationQuery,
        soil: &SoilDetail,
        weather: &WeatherSnapshot,
    ) -> String {
        format!(
            "Based on the following soil and weather data for {location}, recommend 3-5 suitable crops for farming.\n\
             Soil type: {soil_type}\n\
             Soil characteristics: {characteristics}\n\
             Current temperature: {temperature}°C\n\
             Current humidity: {humidity}%\n\
             Current weather conditions: {conditions}\n\n\
             Provide the response as a JSON array of objects with these fields for each crop: \
             crop (name of the crop), \
             suitability (either \"High\", \"Medium\", or \"Low\" based on the match with conditions), \
             description (why this crop is suitable given the soil and current weather).\n\
             {RAW_JSON_ONLY}",
            soil_type = soil.soil_type,
            characteristics = soil.characteristics,
            temperature = weather.temperature_celsius,
            humidity = weather.humidity_percent,
            conditions = weather.conditions,
        )
    }

    /// Candidate soil categories for a location
    pub async fn discover_soil_types(
        &self,
        location: &LocationQuery,
    ) -> AppResult<Vec<SoilTypeOption>> {
        let reply = self
            .client
            .generate(&self.model, &Self::soil_types_prompt(location))
            .await?;

        let raw: Vec<ModelSoilOption> = decode_reply(&reply, JsonShape::Array)?;
        let received = raw.len();
        let options = normalize_soil_options(raw);

        if options.is_empty() {
            return Err(AppError::MalformedModelResponse(
                "model returned no usable soil types".to_string(),
            ));
        }
        if options.len() != received {
            tracing::debug!(
                location = %location,
                received,
                kept = options.len(),
                "Normalized soil type candidates"
            );
        }

        Ok(options)
    }

    /// Characteristics of the selected soil category
    pub async fn detail_soil(
        &self,
        location: &LocationQuery,
        soil_type: &SoilTypeOption,
    ) -> AppResult<SoilDetail> {
        let reply = self
            .client
            .generate(&self.model, &Self::soil_detail_prompt(location, soil_type))
            .await?;

        let raw: ModelSoilDetail = decode_reply(&reply, JsonShape::Object)?;
        Ok(normalize_soil_detail(raw, soil_type))
    }

    /// Crops ranked against the given soil detail and weather snapshot
    pub async fn recommend_crops(
        &self,
        location: &LocationQuery,
        soil: &SoilDetail,
        weather: &WeatherSnapshot,
    ) -> AppResult<Vec<CropRecommendation>> {
        let reply = self
            .client
            .generate(
                &self.recommendation_model,
                &Self::recommendation_prompt(location, soil, weather),
            )
            .await?;

        let raw: Vec<ModelCropRecommendation> = decode_reply(&reply, JsonShape::Array)?;
        for rec in raw.iter().filter(|rec| rec.tier().is_none()) {
            tracing::warn!(
                crop = %rec.crop,
                suitability = %rec.suitability,
                "Unknown suitability tier, treating as Low"
            );
        }

        let recommendations = normalize_crop_recommendations(raw);
        if recommendations.is_empty() {
            return Err(AppError::MalformedModelResponse(
                "model returned no usable crop recommendations".to_string(),
            ));
        }

        Ok(recommendations)
    }
}

#[async_trait]
impl SoilAdvisor for SoilAdvisoryService {
    async fn discover_soil_types(&self, location: &LocationQuery) -> AppResult<Vec<SoilTypeOption>> {
        SoilAdvisoryService::discover_soil_types(self, location).await
    }

    async fn detail_soil(
        &self,
        location: &LocationQuery,
        soil_type: &SoilTypeOption,
    ) -> AppResult<SoilDetail> {
        SoilAdvisoryService::detail_soil(self, location, soil_type).await
    }

    async fn recommend_crops(
        &self,
        location: &LocationQuery,
        soil: &SoilDetail,
        weather: &WeatherSnapshot,
    ) -> AppResult<Vec<CropRecommendation>> {
        SoilAdvisoryService::recommend_crops(self, location, soil, weather).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> LocationQuery {
        LocationQuery::parse("Nairobi").unwrap()
    }

    #[test]
    fn test_recommendation_prompt_embeds_inputs() {
        let soil = SoilDetail {
            soil_type: "Red Volcanic".to_string(),
            characteristics: "Well drained, acidic".to_string(),
            suitable_crops: vec!["Tea".to_string()],
        };
        let weather = WeatherSnapshot {
            temperature_celsius: 21.5,
            humidity_percent: 70,
            conditions: "light rain".to_string(),
            icon: "10d".to_string(),
            wind_speed_mps: 2.0,
            pressure_hpa: 1012,
        };

        let prompt = SoilAdvisoryService::recommendation_prompt(&location(), &soil, &weather);
        assert!(prompt.contains("Nairobi"));
        assert!(prompt.contains("Soil type: Red Volcanic"));
        assert!(prompt.contains("Soil characteristics: Well drained, acidic"));
        assert!(prompt.contains("Current temperature: 21.5°C"));
        assert!(prompt.contains("Current humidity: 70%"));
        assert!(prompt.contains("Current weather conditions: light rain"));
    }

    #[test]
    fn test_soil_detail_prompt_names_selection() {
        let option = SoilTypeOption {
            id: "loam".to_string(),
            name: "Loam".to_string(),
            description: String::new(),
        };
        let prompt = SoilAdvisoryService::soil_detail_prompt(&location(), &option);
        assert!(prompt.starts_with("Provide detailed information about Loam soil in Nairobi."));
        assert!(prompt.contains("suitableCrops"));
    }
}
