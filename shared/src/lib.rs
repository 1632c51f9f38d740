//! Shared types and models for the Cropwise advisory platform
//!
//! This crate contains the I/O-free pieces shared between the backend and the
//! browser (via WASM): domain models, input validation, and decoding of
//! generative-model replies.

pub mod extraction;
pub mod models;
pub mod types;
pub mod validation;

pub use extraction::*;
pub use models::*;
pub use types::*;
pub use validation::*;
