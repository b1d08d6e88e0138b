//! Clients for the third-party Instagram scraping APIs

pub mod apify;
pub mod error;
pub mod format;
pub mod rapidapi;
pub mod service;

pub use apify::ApifyClient;
pub use error::ScraperError;
pub use rapidapi::RapidApiClient;
pub use service::InstagramService;
