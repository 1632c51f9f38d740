//! HTTP request handlers

pub mod analysis;
pub mod auth;
pub mod health;
pub mod listing;

pub use analysis::{get_analysis, select_soil_type, submit_location};
pub use auth::{login, logout, me, refresh, register};
pub use health::health_check;
pub use listing::{
    create_listing, delete_listing, get_category_options, list_listings, search_market,
    update_listing,
};
