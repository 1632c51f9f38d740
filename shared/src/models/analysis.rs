//! Soil and crop analysis models
//!
//! The `Model*` types mirror what the generative model is asked to emit. They
//! deserialize leniently since model output is untrusted; the `normalize_*`
//! functions turn them into the validated domain types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::types::{slugify, MAX_CANDIDATES};

/// Current conditions at the analysed location (metric units)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSnapshot {
    pub temperature_celsius: f64,
    pub humidity_percent: i32,
    pub conditions: String,
    pub icon: String,
    pub wind_speed_mps: f64,
    pub pressure_hpa: i32,
}

/// One candidate soil category for a location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SoilTypeOption {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Detailed characteristics of the selected soil category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SoilDetail {
    pub soil_type: String,
    pub characteristics: String,
    pub suitable_crops: Vec<String>,
}

/// How well a crop matches the soil and current weather
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Suitability {
    High,
    Medium,
    Low,
}

impl Suitability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Suitability::High => "High",
            Suitability::Medium => "Medium",
            Suitability::Low => "Low",
        }
    }
}

impl fmt::Display for Suitability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Suitability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Suitability::High),
            "medium" => Ok(Suitability::Medium),
            "low" => Ok(Suitability::Low),
            other => Err(format!("unknown suitability tier: {}", other)),
        }
    }
}

/// A crop ranked against a (weather, soil) pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropRecommendation {
    pub crop: String,
    pub suitability: Suitability,
    pub rationale: String,
}

// ============================================================================
// Generative model output
// ============================================================================

/// Soil option as emitted by the model
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelSoilOption {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
}

/// Soil detail as emitted by the model
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "SoilDetailKeys")]
pub struct ModelSoilDetail {
    pub soil_type: String,
    pub characteristics: String,
    pub suitable_crops: Vec<String>,
}

/// Every key a soil detail reply has been seen to use; `type` and
/// `suitableCrops` win when several are present
#[derive(Deserialize)]
struct SoilDetailKeys {
    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    kind: String,
    #[serde(default, deserialize_with = "lenient_text")]
    soil_type: String,
    #[serde(default, deserialize_with = "lenient_text")]
    name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    characteristics: String,
    #[serde(rename = "suitableCrops", default, deserialize_with = "lenient_list")]
    suitable_crops_camel: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    suitable_crops: Vec<String>,
}

impl From<SoilDetailKeys> for ModelSoilDetail {
    fn from(keys: SoilDetailKeys) -> Self {
        let suitable_crops = if keys.suitable_crops_camel.is_empty() {
            keys.suitable_crops
        } else {
            keys.suitable_crops_camel
        };
        Self {
            soil_type: first_filled([keys.kind, keys.soil_type, keys.name]),
            characteristics: keys.characteristics,
            suitable_crops,
        }
    }
}

/// Crop recommendation as emitted by the model
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "CropRecommendationKeys")]
pub struct ModelCropRecommendation {
    pub crop: String,
    pub suitability: String,
    pub description: String,
}

/// `crop` wins over `name`, `description` over `rationale`
#[derive(Deserialize)]
struct CropRecommendationKeys {
    #[serde(default, deserialize_with = "lenient_text")]
    crop: String,
    #[serde(default, deserialize_with = "lenient_text")]
    name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    suitability: String,
    #[serde(default, deserialize_with = "lenient_text")]
    description: String,
    #[serde(default, deserialize_with = "lenient_text")]
    rationale: String,
}

impl From<CropRecommendationKeys> for ModelCropRecommendation {
    fn from(keys: CropRecommendationKeys) -> Self {
        Self {
            crop: first_filled([keys.crop, keys.name]),
            suitability: keys.suitability,
            description: first_filled([keys.description, keys.rationale]),
        }
    }
}

/// First value that is not blank, or an empty string
fn first_filled<const N: usize>(candidates: [String; N]) -> String {
    candidates
        .into_iter()
        .find(|value| !value.trim().is_empty())
        .unwrap_or_default()
}

impl ModelCropRecommendation {
    /// Parsed tier, or `None` when the model produced something outside High/Medium/Low
    pub fn tier(&self) -> Option<Suitability> {
        self.suitability.parse().ok()
    }
}

/// Trim, fill in missing ids, drop duplicates, and cap the candidate list.
///
/// Ids and names are compared case-insensitively; the first occurrence wins.
/// Options without a usable name are dropped.
pub fn normalize_soil_options(raw: Vec<ModelSoilOption>) -> Vec<SoilTypeOption> {
    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();
    let mut options = Vec::new();

    for option in raw {
        let name = option.name.trim().to_string();
        if name.is_empty() {
            continue;
        }
        let id = match option.id.trim() {
            "" => slugify(&name),
            id => id.to_string(),
        };
        if id.is_empty() {
            continue;
        }
        if !seen_ids.insert(id.to_lowercase()) || !seen_names.insert(name.to_lowercase()) {
            continue;
        }
        options.push(SoilTypeOption {
            id,
            name,
            description: option.description.trim().to_string(),
        });
        if options.len() == MAX_CANDIDATES {
            break;
        }
    }

    options
}

/// Clean a model soil detail; falls back to the selected option's name when
/// the model left the type blank
pub fn normalize_soil_detail(raw: ModelSoilDetail, selected: &SoilTypeOption) -> SoilDetail {
    let soil_type = match raw.soil_type.trim() {
        "" => selected.name.clone(),
        name => name.to_string(),
    };

    let mut seen = HashSet::new();
    let suitable_crops = raw
        .suitable_crops
        .into_iter()
        .map(|crop| crop.trim().to_string())
        .filter(|crop| !crop.is_empty() && seen.insert(crop.to_lowercase()))
        .collect();

    SoilDetail {
        soil_type,
        characteristics: raw.characteristics.trim().to_string(),
        suitable_crops,
    }
}

/// Convert model recommendations into domain recommendations.
///
/// Unknown suitability values fall back to `Low`; entries without a crop name
/// are dropped and the list is capped.
pub fn normalize_crop_recommendations(raw: Vec<ModelCropRecommendation>) -> Vec<CropRecommendation> {
    raw.into_iter()
        .filter(|rec| !rec.crop.trim().is_empty())
        .take(MAX_CANDIDATES)
        .map(|rec| CropRecommendation {
            suitability: rec.tier().unwrap_or(Suitability::Low),
            crop: rec.crop.trim().to_string(),
            rationale: rec.description.trim().to_string(),
        })
        .collect()
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .map(value_to_text)
        .unwrap_or_default())
}

/// Accepts an array of scalars or a single comma-separated string
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(values)) => values.into_iter().map(value_to_text).collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(other) => vec![value_to_text(other)],
    };
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{decode_reply, JsonShape};

    fn option(id: &str, name: &str) -> ModelSoilOption {
        ModelSoilOption {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_suitability_parse_is_lenient_about_case() {
        assert_eq!("High".parse::<Suitability>().unwrap(), Suitability::High);
        assert_eq!(" medium ".parse::<Suitability>().unwrap(), Suitability::Medium);
        assert_eq!("LOW".parse::<Suitability>().unwrap(), Suitability::Low);
        assert!("Excellent".parse::<Suitability>().is_err());
    }

    #[test]
    fn test_soil_options_deduplicated_by_id_and_name() {
        let options = normalize_soil_options(vec![
            option("loam", "Loam"),
            option("LOAM", "Loamy soil"),
            option("clay", "Clay"),
            option("clay-2", "clay"),
        ]);
        let ids: Vec<_> = options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["loam", "clay"]);
    }

    #[test]
    fn test_soil_options_fill_missing_id_and_drop_nameless() {
        let options = normalize_soil_options(vec![
            option("", "Black Cotton"),
            option("ghost", "   "),
        ]);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].id, "black-cotton");
    }

    #[test]
    fn test_soil_options_capped() {
        let raw = (0..8).map(|i| option(&format!("s{}", i), &format!("Soil {}", i))).collect();
        assert_eq!(normalize_soil_options(raw).len(), MAX_CANDIDATES);
    }

    #[test]
    fn test_model_soil_option_accepts_numeric_id() {
        let raw: ModelSoilOption =
            serde_json::from_str(r#"{"id": 3, "name": "Sandy", "description": null}"#).unwrap();
        assert_eq!(raw.id, "3");
        assert_eq!(raw.description, "");
    }

    #[test]
    fn test_model_soil_detail_field_names() {
        let raw: ModelSoilDetail = serde_json::from_str(
            r#"{"type": "Red Laterite", "characteristics": "Iron rich", "suitableCrops": ["Cashew", " Tea ", "cashew", ""]}"#,
        )
        .unwrap();
        let selected = SoilTypeOption {
            id: "red".into(),
            name: "Red".into(),
            description: String::new(),
        };
        let detail = normalize_soil_detail(raw, &selected);
        assert_eq!(detail.soil_type, "Red Laterite");
        assert_eq!(detail.suitable_crops, vec!["Cashew", "Tea"]);
    }

    #[test]
    fn test_model_soil_detail_comma_separated_crops_and_blank_type() {
        let raw: ModelSoilDetail =
            serde_json::from_str(r#"{"characteristics": "Fine", "suitableCrops": "Rice, Jute"}"#)
                .unwrap();
        let selected = SoilTypeOption {
            id: "alluvial".into(),
            name: "Alluvial".into(),
            description: String::new(),
        };
        let detail = normalize_soil_detail(raw, &selected);
        assert_eq!(detail.soil_type, "Alluvial");
        assert_eq!(detail.suitable_crops, vec!["Rice", "Jute"]);
    }

    #[test]
    fn test_model_soil_detail_prefers_type_over_name() {
        let raw: ModelSoilDetail = decode_reply(
            r#"Sure! {"name": "Red Soil", "type": "Laterite", "characteristics": "Iron rich", "suitableCrops": ["Tea"], "suitable_crops": ["Rubber"]}"#,
            JsonShape::Object,
        )
        .unwrap();
        assert_eq!(raw.soil_type, "Laterite");
        assert_eq!(raw.suitable_crops, vec!["Tea"]);

        let raw: ModelSoilDetail =
            serde_json::from_str(r#"{"name": "Red Soil", "type": " ", "suitable_crops": ["Rubber"]}"#)
                .unwrap();
        assert_eq!(raw.soil_type, "Red Soil");
        assert_eq!(raw.suitable_crops, vec!["Rubber"]);
    }

    #[test]
    fn test_model_crop_recommendation_with_both_rationale_keys() {
        let raw: Vec<ModelCropRecommendation> = serde_json::from_str(
            r#"[{"crop": "Maize", "suitability": "High", "description": "warm", "rationale": "good soil"},
                {"name": "Sorghum", "suitability": "Low", "rationale": "dry spell"}]"#,
        )
        .unwrap();
        assert_eq!(raw[0].crop, "Maize");
        assert_eq!(raw[0].description, "warm");
        assert_eq!(raw[1].crop, "Sorghum");
        assert_eq!(raw[1].description, "dry spell");
    }

    #[test]
    fn test_unknown_suitability_falls_back_to_low() {
        let recs = normalize_crop_recommendations(vec![
            ModelCropRecommendation {
                crop: "Maize".into(),
                suitability: "Very High".into(),
                description: "Warm".into(),
            },
            ModelCropRecommendation {
                crop: "  ".into(),
                suitability: "High".into(),
                description: String::new(),
            },
            ModelCropRecommendation {
                crop: "Beans".into(),
                suitability: "high".into(),
                description: "Fixes nitrogen".into(),
            },
        ]);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].suitability, Suitability::Low);
        assert_eq!(recs[1].suitability, Suitability::High);
        assert_eq!(recs[1].rationale, "Fixes nitrogen");
    }
}
