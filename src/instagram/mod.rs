//! Instagram link parsing and data model

pub mod models;
pub mod url;

pub use models::{BundleKind, CarouselItem, MediaBundle, MediaType, Post, Profile, RecentPost, Reel, Story};
pub use url::{extract_instagram_url, extract_profile_username, InstagramLink};
