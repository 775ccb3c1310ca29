//! Sitemapper Generator Library
//!
//! Sitemap XML emission engine.
//!
//! # Modules
//!
//! - [`xml`] - shared XML rendering primitives
//! - [`builder`] - in-memory document with cached serialization
//! - [`stream`] - push-based streaming emitter
//! - [`index`] - URL-set partitioning and sitemap-index generation

pub mod builder;
pub mod index;
pub mod stream;
pub mod xml;

pub use builder::SitemapDocument;
pub use index::{IndexError, IndexRef, IndexSummary, SitemapIndex, SitemapIndexWriter};
pub use stream::SitemapStream;
