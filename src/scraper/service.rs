//! Facade over the scraper clients used by the command handlers.
//!
//! Handlers never see scraper errors: failures are logged here and turned into
//! the same placeholders the user would see for missing data.

use crate::instagram::models::{MediaBundle, Post, Profile, Reel, Story};
use crate::scraper::apify::ApifyClient;
use crate::scraper::format::fallback_profile;
use crate::scraper::rapidapi::RapidApiClient;

#[derive(Default)]
pub struct InstagramService {
    apify: Option<ApifyClient>,
    rapidapi: Option<RapidApiClient>,
}

impl InstagramService {
    pub fn new(apify: Option<ApifyClient>, rapidapi: Option<RapidApiClient>) -> Self {
        Self { apify, rapidapi }
    }

    /// Builds whichever clients the environment has credentials for.
    pub fn from_env() -> Self {
        let apify = match ApifyClient::from_env() {
            Ok(client) => Some(client),
            Err(e) => {
                log::warn!("Apify disabled: {}", e);
                None
            }
        };
        let rapidapi = match RapidApiClient::from_env() {
            Ok(client) => Some(client),
            Err(e) => {
                log::info!("RapidAPI fallback disabled: {}", e);
                None
            }
        };
        Self { apify, rapidapi }
    }

    /// True when the Apify-backed commands can run.
    pub fn is_configured(&self) -> bool {
        self.apify.is_some()
    }

    pub fn has_media_fallback(&self) -> bool {
        self.rapidapi.is_some()
    }

    /// Never fails: errors and empty results become [`fallback_profile`].
    pub async fn profile(&self, username: &str) -> Profile {
        let Some(apify) = &self.apify else {
            return fallback_profile(username);
        };
        match apify.profile(username).await {
            Ok(profile) => profile,
            Err(e) => {
                log::error!("Profile fetch error for {}: {}", username, e);
                fallback_profile(username)
            }
        }
    }

    pub async fn stories(&self, username: &str) -> Vec<Story> {
        let Some(apify) = &self.apify else {
            return Vec::new();
        };
        apify.stories(username).await.unwrap_or_else(|e| {
            log::error!("Story fetch error for {}: {}", username, e);
            Vec::new()
        })
    }

    pub async fn reel(&self, url: &str) -> Option<Reel> {
        let apify = self.apify.as_ref()?;
        apify.reel(url).await.unwrap_or_else(|e| {
            log::error!("Reel fetch error for {}: {}", url, e);
            None
        })
    }

    pub async fn post(&self, url: &str) -> Option<Post> {
        let apify = self.apify.as_ref()?;
        apify.post(url).await.unwrap_or_else(|e| {
            log::error!("Post fetch error for {}: {}", url, e);
            None
        })
    }

    /// Direct media URLs for a link, when the RapidAPI fallback is configured.
    pub async fn media(&self, url: &str) -> Option<MediaBundle> {
        let rapidapi = self.rapidapi.as_ref()?;
        match rapidapi.media(url).await {
            Ok(bundle) if !bundle.media_urls.is_empty() => Some(bundle),
            Ok(_) => {
                log::warn!("RapidAPI returned no media for {}", url);
                None
            }
            Err(e) => {
                log::error!("RapidAPI error for {}: {}", url, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_service_returns_placeholders() {
        let service = InstagramService::default();
        assert!(!service.is_configured());
        assert!(!service.has_media_fallback());
        assert_eq!(service.profile("natgeo").await, fallback_profile("natgeo"));
        assert!(service.stories("natgeo").await.is_empty());
        assert_eq!(service.reel("https://instagram.com/reel/A").await, None);
        assert_eq!(service.post("https://instagram.com/p/B").await, None);
        assert_eq!(service.media("https://instagram.com/p/B").await, None);
    }
}
