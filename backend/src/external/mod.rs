//! External API integrations

pub mod generative;
pub mod weather;

pub use generative::GenerativeClient;
pub use weather::WeatherClient;
