//! Market listing service
//!
//! Vendors manage their own price listings; everyone can search them by name.
//! Every owner-scoped statement filters on both the listing id and the owner
//! id, so another user's listing looks exactly like a missing one.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    validate_category, validate_listing_name, validate_market_price, validate_product_type,
    validate_search_term, validate_unit, ProductType,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Upper bound on public search results
const SEARCH_LIMIT: i64 = 100;

/// Market listing service
#[derive(Clone)]
pub struct MarketListingService {
    db: PgPool,
}

/// A vendor's price listing
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Listing {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub market_price: Decimal,
    pub unit: String,
    pub product_type: String,
    pub category: Option<String>,
    pub variety: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a listing
#[derive(Debug, Deserialize, Validate)]
pub struct CreateListingInput {
    pub name: String,
    pub market_price: Decimal,
    pub unit: String,
    pub product_type: String,
    pub category: Option<String>,
    #[validate(length(max = 120))]
    pub variety: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// Partial update of a listing; absent fields keep their value
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateListingInput {
    pub name: Option<String>,
    pub market_price: Option<Decimal>,
    pub unit: Option<String>,
    pub product_type: Option<String>,
    pub category: Option<String>,
    #[validate(length(max = 120))]
    pub variety: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// Fully validated listing fields ready to be written
#[derive(Debug, Clone, PartialEq)]
struct ListingFields {
    name: String,
    market_price: Decimal,
    unit: String,
    product_type: String,
    category: Option<String>,
    variety: Option<String>,
    description: Option<String>,
}

impl ListingFields {
    fn validate(
        name: &str,
        market_price: Decimal,
        unit: &str,
        product_type: &str,
        category: Option<&str>,
        variety: Option<String>,
        description: Option<String>,
    ) -> AppResult<Self> {
        validate_listing_name(name)?;
        validate_market_price(market_price)?;
        let unit = validate_unit(unit)?;
        let product_type = validate_product_type(product_type)?;
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        if let Some(category) = category {
            validate_category(product_type, category)?;
        }

        Ok(Self {
            name: name.trim().to_string(),
            market_price: market_price.normalize(),
            unit: unit.as_str().to_string(),
            product_type: product_type.as_str().to_string(),
            category: category.map(|c| canonical_category(product_type, c)),
            variety: non_blank(variety),
            description: non_blank(description),
        })
    }

    fn from_create(input: CreateListingInput) -> AppResult<Self> {
        input.validate()?;
        Self::validate(
            &input.name,
            input.market_price,
            &input.unit,
            &input.product_type,
            input.category.as_deref(),
            input.variety,
            input.description,
        )
    }

    /// Overlay an update onto the stored listing
    fn merge(existing: Listing, input: UpdateListingInput) -> AppResult<Self> {
        input.validate()?;
        let product_type_changed = input.product_type.is_some();
        // A new type invalidates the old category unless a new one is given
        let category = match (input.category, product_type_changed) {
            (Some(category), _) => Some(category),
            (None, true) => None,
            (None, false) => existing.category,
        };

        Self::validate(
            input.name.as_deref().unwrap_or(&existing.name),
            input.market_price.unwrap_or(existing.market_price),
            input.unit.as_deref().unwrap_or(&existing.unit),
            input.product_type.as_deref().unwrap_or(&existing.product_type),
            category.as_deref(),
            input.variety.or(existing.variety),
            input.description.or(existing.description),
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Stored spelling of a category, e.g. "stone fruit" becomes "Stone Fruit"
fn canonical_category(product_type: ProductType, category: &str) -> String {
    product_type
        .categories()
        .iter()
        .find(|c| c.eq_ignore_ascii_case(category))
        .map(|c| c.to_string())
        .unwrap_or_else(|| category.to_string())
}

/// Escape LIKE wildcards so user input only ever matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl MarketListingService {
    /// Create a new MarketListingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a listing owned by `user_id`
    pub async fn create(&self, user_id: Uuid, input: CreateListingInput) -> AppResult<Listing> {
        let fields = ListingFields::from_create(input)?;

        let listing = sqlx::query_as::<_, Listing>(
            r#"
            INSERT INTO user_products (user_id, name, market_price, unit, product_type,
                                       category, variety, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, name, market_price, unit, product_type,
                      category, variety, description, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&fields.name)
        .bind(fields.market_price)
        .bind(&fields.unit)
        .bind(&fields.product_type)
        .bind(&fields.category)
        .bind(&fields.variety)
        .bind(&fields.description)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(user_id = %user_id, listing_id = %listing.id, "Listing created");
        Ok(listing)
    }

    /// Listings owned by `user_id`, newest first
    pub async fn list_own(&self, user_id: Uuid) -> AppResult<Vec<Listing>> {
        let listings = sqlx::query_as::<_, Listing>(
            r#"
            SELECT id, user_id, name, market_price, unit, product_type,
                   category, variety, description, created_at, updated_at
            FROM user_products
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(listings)
    }

    /// Update one of the owner's listings
    pub async fn update(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
        input: UpdateListingInput,
    ) -> AppResult<Listing> {
        let existing = sqlx::query_as::<_, Listing>(
            r#"
            SELECT id, user_id, name, market_price, unit, product_type,
                   category, variety, description, created_at, updated_at
            FROM user_products
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(listing_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Listing".to_string()))?;

        let fields = ListingFields::merge(existing, input)?;

        let listing = sqlx::query_as::<_, Listing>(
            r#"
            UPDATE user_products
            SET name = $3, market_price = $4, unit = $5, product_type = $6,
                category = $7, variety = $8, description = $9, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, market_price, unit, product_type,
                      category, variety, description, created_at, updated_at
            "#,
        )
        .bind(listing_id)
        .bind(user_id)
        .bind(&fields.name)
        .bind(fields.market_price)
        .bind(&fields.unit)
        .bind(&fields.product_type)
        .bind(&fields.category)
        .bind(&fields.variety)
        .bind(&fields.description)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Listing".to_string()))?;

        tracing::info!(user_id = %user_id, listing_id = %listing_id, "Listing updated");
        Ok(listing)
    }

    /// Delete one of the owner's listings
    pub async fn delete(&self, user_id: Uuid, listing_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM user_products WHERE id = $1 AND user_id = $2")
            .bind(listing_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Listing".to_string()));
        }

        tracing::info!(user_id = %user_id, listing_id = %listing_id, "Listing deleted");
        Ok(())
    }

    /// Public case-insensitive search on listing names
    pub async fn search(&self, term: &str) -> AppResult<Vec<Listing>> {
        validate_search_term(term)?;
        let pattern = format!("%{}%", escape_like(term.trim()));

        let listings = sqlx::query_as::<_, Listing>(
            r#"
            SELECT id, user_id, name, market_price, unit, product_type,
                   category, variety, description, created_at, updated_at
            FROM user_products
            WHERE name ILIKE $1 ESCAPE '\'
            ORDER BY name ASC, market_price ASC
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.db)
        .await?;

        Ok(listings)
    }

    /// Categories a listing of `product_type` may use
    pub fn category_options(product_type: &str) -> AppResult<&'static [&'static str]> {
        Ok(validate_product_type(product_type)?.categories())
    }
}
