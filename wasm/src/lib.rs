//! WebAssembly module for the Cropwise advisory platform
//!
//! Provides client-side helpers for:
//! - Location and listing form validation
//! - Decoding generative-model replies into soil and crop data
//! - Product category and unit options

use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;
use wasm_bindgen::prelude::*;

use shared::{
    decode_reply, normalize_crop_recommendations, normalize_soil_detail, normalize_soil_options,
    validate_location, validate_market_price, validate_product_type, JsonShape,
    ModelCropRecommendation, ModelSoilDetail, ModelSoilOption, SoilTypeOption, Unit,
    ValidationFailure,
};

/// Outcome of a form field check, serialized for JavaScript
#[derive(Debug, Serialize, PartialEq)]
struct FieldCheck {
    valid: bool,
    field: Option<&'static str>,
    message: Option<&'static str>,
}

impl From<Result<(), ValidationFailure>> for FieldCheck {
    fn from(result: Result<(), ValidationFailure>) -> Self {
        match result {
            Ok(()) => FieldCheck {
                valid: true,
                field: None,
                message: None,
            },
            Err(failure) => FieldCheck {
                valid: false,
                field: Some(failure.field),
                message: Some(failure.message),
            },
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

fn check_location(raw: &str) -> Result<String, String> {
    to_json(&FieldCheck::from(validate_location(raw)))
}

fn check_market_price(raw: &str) -> Result<String, String> {
    let check = match Decimal::from_str(raw.trim()) {
        Ok(price) => FieldCheck::from(validate_market_price(price)),
        Err(_) => FieldCheck::from(Err::<(), _>(ValidationFailure::new(
            "market_price",
            "Market price must be a number",
        ))),
    };
    to_json(&check)
}

fn soil_types_from_reply(reply: &str) -> Result<String, String> {
    let raw: Vec<ModelSoilOption> =
        decode_reply(reply, JsonShape::Array).map_err(|e| e.to_string())?;
    let options = normalize_soil_options(raw);
    if options.is_empty() {
        return Err("model returned no usable soil types".to_string());
    }
    to_json(&options)
}

fn soil_detail_from_reply(reply: &str, selected_json: &str) -> Result<String, String> {
    let selected: SoilTypeOption =
        serde_json::from_str(selected_json).map_err(|e| format!("Invalid soil type JSON: {}", e))?;
    let raw: ModelSoilDetail = decode_reply(reply, JsonShape::Object).map_err(|e| e.to_string())?;
    to_json(&normalize_soil_detail(raw, &selected))
}

fn recommendations_from_reply(reply: &str) -> Result<String, String> {
    let raw: Vec<ModelCropRecommendation> =
        decode_reply(reply, JsonShape::Array).map_err(|e| e.to_string())?;
    let recommendations = normalize_crop_recommendations(raw);
    if recommendations.is_empty() {
        return Err("model returned no usable crop recommendations".to_string());
    }
    to_json(&recommendations)
}

fn categories_for(product_type: &str) -> &'static [&'static str] {
    validate_product_type(product_type)
        .map(|t| t.categories())
        .unwrap_or(&[])
}

fn warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

fn into_js(result: Result<String, String>, context: &str) -> Result<String, JsValue> {
    result.map_err(|e| {
        warn(&format!("{}: {}", context, e));
        JsValue::from_str(&e)
    })
}

/// Check a location before submitting it; returns `{valid, field, message}` JSON
#[wasm_bindgen]
pub fn validate_location_input(raw: &str) -> Result<String, JsValue> {
    into_js(check_location(raw), "location check")
}

/// Check a market price entered as text; returns `{valid, field, message}` JSON
#[wasm_bindgen]
pub fn validate_price_input(raw: &str) -> Result<String, JsValue> {
    into_js(check_market_price(raw), "price check")
}

/// Decode a soil-type discovery reply into normalized options JSON
#[wasm_bindgen]
pub fn decode_soil_types(reply: &str) -> Result<String, JsValue> {
    into_js(soil_types_from_reply(reply), "soil types reply")
}

/// Decode a soil-detail reply; `selected_json` is the chosen option
#[wasm_bindgen]
pub fn decode_soil_detail(reply: &str, selected_json: &str) -> Result<String, JsValue> {
    into_js(soil_detail_from_reply(reply, selected_json), "soil detail reply")
}

/// Decode a crop recommendation reply into normalized recommendations JSON
#[wasm_bindgen]
pub fn decode_crop_recommendations(reply: &str) -> Result<String, JsValue> {
    into_js(recommendations_from_reply(reply), "crop recommendations reply")
}

/// Categories allowed for a product type; empty for unknown types
#[wasm_bindgen]
pub fn category_options(product_type: &str) -> js_sys::Array {
    categories_for(product_type)
        .iter()
        .map(|c| JsValue::from_str(c))
        .collect()
}

/// Units a market price can be quoted in
#[wasm_bindgen]
pub fn unit_options() -> js_sys::Array {
    Unit::ALL
        .iter()
        .map(|u| JsValue::from_str(u.as_str()))
        .collect()
}
