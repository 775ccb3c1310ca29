//! Sitemapper Core Library
//!
//! Entry types, normalization, validation and configuration for sitemap
//! generation.

pub mod config;
pub mod entry;
pub mod error;
pub mod normalize;
pub mod validate;

pub use config::SitemapConfig;
pub use entry::{
    AlternateLink, ChangeFreq, Image, LooseEntry, LooseImage, LooseUrl, LooseVideo, Relationship,
    UrlEntry, Video, VideoPlatform, VideoPrice, VideoRestriction, YesNo, MAX_SITEMAP_URLS,
};
pub use error::{CoreError, Result, ViolationKind};
pub use normalize::{EntryMap, Normalizer};
pub use validate::{validate, ValidationLevel};
