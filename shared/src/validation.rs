//! Validation utilities for the Cropwise platform
//!
//! Checks that run identically in the backend and in the browser build.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{ProductType, Unit};

/// Maximum accepted length of a location query, in characters
pub const MAX_LOCATION_LEN: usize = 120;

/// Maximum accepted length of a listing name, in characters
pub const MAX_LISTING_NAME_LEN: usize = 120;

/// A failed field check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationFailure {
    pub field: &'static str,
    pub message: &'static str,
}

impl ValidationFailure {
    pub const fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

// ============================================================================
// Analysis Validations
// ============================================================================

/// Validate a free-text location before any provider is contacted
pub fn validate_location(location: &str) -> Result<(), ValidationFailure> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(ValidationFailure::new(
            "location",
            "Please enter a location to get soil data.",
        ));
    }
    if trimmed.chars().count() > MAX_LOCATION_LEN {
        return Err(ValidationFailure::new(
            "location",
            "Location must be at most 120 characters",
        ));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(ValidationFailure::new(
            "location",
            "Location cannot contain control characters",
        ));
    }
    Ok(())
}

// ============================================================================
// Market Listing Validations
// ============================================================================

/// Validate a listing name
pub fn validate_listing_name(name: &str) -> Result<(), ValidationFailure> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationFailure::new("name", "Product name is required"));
    }
    if trimmed.chars().count() > MAX_LISTING_NAME_LEN {
        return Err(ValidationFailure::new(
            "name",
            "Product name must be at most 120 characters",
        ));
    }
    Ok(())
}

/// Validate a market price (strictly positive, at most two decimal places)
pub fn validate_market_price(price: Decimal) -> Result<(), ValidationFailure> {
    if price <= Decimal::ZERO {
        return Err(ValidationFailure::new(
            "market_price",
            "Market price must be greater than zero",
        ));
    }
    if price.normalize().scale() > 2 {
        return Err(ValidationFailure::new(
            "market_price",
            "Market price can have at most two decimal places",
        ));
    }
    Ok(())
}

/// Validate a unit string and return the parsed unit
pub fn validate_unit(unit: &str) -> Result<Unit, ValidationFailure> {
    unit.parse::<Unit>()
        .map_err(|_| ValidationFailure::new("unit", "Unknown unit of sale"))
}

/// Validate a product type string and return the parsed type
pub fn validate_product_type(product_type: &str) -> Result<ProductType, ValidationFailure> {
    product_type
        .parse::<ProductType>()
        .map_err(|_| ValidationFailure::new("product_type", "Unknown product type"))
}

/// Validate that a category belongs to the given product type
pub fn validate_category(
    product_type: ProductType,
    category: &str,
) -> Result<(), ValidationFailure> {
    if category.trim().is_empty() {
        return Ok(());
    }
    if product_type.accepts_category(category) {
        Ok(())
    } else {
        Err(ValidationFailure::new(
            "category",
            "Category is not valid for this product type",
        ))
    }
}

/// Validate a market search term
pub fn validate_search_term(term: &str) -> Result<(), ValidationFailure> {
    if term.trim().is_empty() {
        return Err(ValidationFailure::new(
            "q",
            "Please enter a crop name to search",
        ));
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), ValidationFailure> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationFailure::new("email", "Invalid email format"));
    };
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.')
    {
        return Err(ValidationFailure::new("email", "Invalid email format"));
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), ValidationFailure> {
    if password.chars().count() < 8 {
        return Err(ValidationFailure::new(
            "password",
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_validate_location() {
        assert!(validate_location("Nairobi").is_ok());
        assert!(validate_location("  São Paulo  ").is_ok());
        let err = validate_location("   ").unwrap_err();
        assert_eq!(err.field, "location");
        assert!(validate_location(&"x".repeat(121)).is_err());
        assert!(validate_location("Nai\u{0007}robi").is_err());
    }

    #[test]
    fn test_validate_market_price() {
        assert!(validate_market_price(dec("12.50")).is_ok());
        assert!(validate_market_price(dec("3")).is_ok());
        assert!(validate_market_price(dec("0")).is_err());
        assert!(validate_market_price(dec("-1")).is_err());
        assert!(validate_market_price(dec("1.005")).is_err());
    }

    #[test]
    fn test_validate_unit_and_type() {
        assert_eq!(validate_unit("kg").unwrap(), Unit::Kg);
        assert!(validate_unit("barrel").is_err());
        assert_eq!(validate_product_type("Fruit").unwrap(), ProductType::Fruit);
        assert!(validate_product_type("Mineral").is_err());
    }

    #[test]
    fn test_validate_category() {
        assert!(validate_category(ProductType::Crop, "Grain").is_ok());
        assert!(validate_category(ProductType::Crop, "").is_ok());
        assert!(validate_category(ProductType::Crop, "Citrus").is_err());
        assert!(validate_category(ProductType::Fruit, "Citrus").is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("farmer@example.com").is_ok());
        assert!(validate_email("farmer.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("farmer@example").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
    }

    proptest! {
        #[test]
        fn prop_non_blank_short_locations_accepted(location in "[A-Za-z][A-Za-z ,.-]{0,60}") {
            prop_assert!(validate_location(&location).is_ok());
        }

        #[test]
        fn prop_whitespace_locations_rejected(location in "[ \t\n]{0,20}") {
            prop_assert!(validate_location(&location).is_err());
        }
    }
}
