//! Domain models for the Cropwise platform

mod analysis;
mod listing;

pub use analysis::*;
pub use listing::*;
