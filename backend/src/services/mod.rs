//! Business logic services for the Cropwise advisory platform

pub mod advisory;
pub mod auth;
pub mod listing;
pub mod location;

pub use advisory::SoilAdvisoryService;
pub use auth::AuthService;
pub use listing::MarketListingService;
pub use location::PgLocationStore;
