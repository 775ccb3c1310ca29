//! In-memory sitemap document with cached serialization.

use std::{
    fmt,
    io::Write,
    time::{Duration, Instant},
};

use flate2::{write::GzEncoder, Compression};
use tracing::debug;

use sitemapper_core::{
    normalize::EntryMap, validate, LooseEntry, Normalizer, Result, SitemapConfig, UrlEntry,
    ValidationLevel,
};

use crate::xml;

struct CacheSlot {
    xml: String,
    at: Instant,
}

/// An insertion-ordered, URL-deduplicated sitemap document.
///
/// Serialization is cached for the configured TTL; a zero TTL disables
/// caching so every [`to_xml`](Self::to_xml) call reserializes. Adds and
/// deletes do not invalidate the cache (it is purely time-based); callers
/// needing eager invalidation use [`clear_cache`](Self::clear_cache).
pub struct SitemapDocument {
    normalizer: Normalizer,
    validation: ValidationLevel,
    entries: EntryMap,
    namespace_attrs: Option<String>,
    xsl: Option<String>,
    cache_ttl: Duration,
    cache: Option<CacheSlot>,
}

impl fmt::Debug for SitemapDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SitemapDocument")
            .field("entries", &self.entries.len())
            .field("cache_ttl", &self.cache_ttl)
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl SitemapDocument {
    /// Create an empty document from configuration.
    pub fn new(config: &SitemapConfig) -> Result<Self> {
        Ok(Self {
            normalizer: config.normalizer()?,
            validation: config.validation,
            entries: EntryMap::default(),
            namespace_attrs: None,
            xsl: config.xsl.clone(),
            cache_ttl: config.cache_ttl(),
            cache: None,
        })
    }

    /// Create a document with initial entries.
    pub fn with_entries(
        config: &SitemapConfig,
        entries: impl IntoIterator<Item = impl Into<LooseEntry>>,
    ) -> Result<Self> {
        let mut document = Self::new(config)?;
        for entry in entries {
            document.add(entry)?;
        }
        Ok(document)
    }

    /// Replace the default namespace declarations with exactly this
    /// attribute string.
    #[must_use]
    pub fn with_namespace_attrs(mut self, attrs: impl Into<String>) -> Self {
        self.namespace_attrs = Some(attrs.into());
        self
    }

    /// Set the XSL stylesheet href.
    #[must_use]
    pub fn with_xsl(mut self, href: impl Into<String>) -> Self {
        self.xsl = Some(href.into());
        self
    }

    /// Override the validation level used on admission.
    #[must_use]
    pub fn with_validation(mut self, level: ValidationLevel) -> Self {
        self.validation = level;
        self
    }

    /// Normalize, validate and insert an entry. An entry whose resolved URL
    /// is already present is replaced in place. Returns the new entry count.
    pub fn add(&mut self, entry: impl Into<LooseEntry>) -> Result<usize> {
        let strict = self.normalizer.normalize(entry)?;
        validate(&strict, self.validation)?;
        self.entries.insert(strict);
        Ok(self.entries.len())
    }

    /// Whether an entry with this URL (resolved first) is present.
    pub fn contains(&self, url: &str) -> Result<bool> {
        let resolved = self.normalizer.normalize(url)?;
        Ok(self.entries.contains(&resolved.loc))
    }

    /// Remove an entry by URL (resolved first). Reports whether an entry
    /// existed.
    pub fn del(&mut self, url: &str) -> Result<bool> {
        let resolved = self.normalizer.normalize(url)?;
        Ok(self.entries.remove(&resolved.loc).is_some())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the document is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &UrlEntry> {
        self.entries.iter()
    }

    /// Serialize the document, serving the cached string while it is
    /// within the TTL window.
    pub fn to_xml(&mut self) -> Result<String> {
        if self.cache_ttl > Duration::ZERO {
            if let Some(slot) = &self.cache {
                if slot.at.elapsed() < self.cache_ttl {
                    debug!(entries = self.entries.len(), "serving cached sitemap XML");
                    return Ok(slot.xml.clone());
                }
            }
        }

        let xml = self.render();
        if self.cache_ttl > Duration::ZERO {
            self.cache = Some(CacheSlot {
                xml: xml.clone(),
                at: Instant::now(),
            });
        }
        Ok(xml)
    }

    /// Serialize and gzip-compress the document.
    pub fn to_gzip(&mut self) -> Result<Vec<u8>> {
        let xml = self.to_xml()?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(xml.as_bytes())?;
        Ok(encoder.finish()?)
    }

    /// Serialize and write the gzip-compressed document to a writer.
    pub fn write_gzip<W: Write>(&mut self, writer: W) -> Result<()> {
        let xml = self.to_xml()?;
        let mut encoder = GzEncoder::new(writer, Compression::default());
        encoder.write_all(xml.as_bytes())?;
        encoder.finish()?;
        Ok(())
    }

    /// Drop the cached serialization immediately.
    pub fn clear_cache(&mut self) {
        self.cache = None;
    }

    fn render(&self) -> String {
        debug!(entries = self.entries.len(), "serializing sitemap document");

        let mut xml = xml::document_head(self.xsl.as_deref(), self.namespace_attrs.as_deref());
        for entry in self.entries.iter() {
            xml.push_str(&xml::entry_to_xml(entry));
        }
        xml.push_str(xml::document_close());
        xml
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::GzDecoder;
    use sitemapper_core::LooseUrl;

    use super::*;

    fn config() -> SitemapConfig {
        SitemapConfig {
            base_url: Some("https://example.com".to_string()),
            ..SitemapConfig::default()
        }
    }

    fn document() -> SitemapDocument {
        SitemapDocument::new(&config()).unwrap()
    }

    #[test]
    fn test_add_and_serialize() {
        let mut doc = document();
        assert_eq!(doc.add("/page").unwrap(), 1);
        assert_eq!(doc.add("/other").unwrap(), 2);

        let xml = doc.to_xml().unwrap();
        assert!(xml.starts_with(xml::PREAMBLE));
        assert!(xml.contains("<loc>https://example.com/page</loc>"));
        assert!(xml.contains("<loc>https://example.com/other</loc>"));
        assert!(xml.ends_with("</urlset>\n"));
    }

    #[test]
    fn test_duplicate_add_replaces() {
        let mut doc = document();
        let mut first = LooseUrl::new("/page");
        first.priority = Some(0.3);
        let mut second = LooseUrl::new("/page");
        second.priority = Some(0.9);

        assert_eq!(doc.add(LooseEntry::from(first)).unwrap(), 1);
        assert_eq!(doc.add(LooseEntry::from(second)).unwrap(), 1);

        let xml = doc.to_xml().unwrap();
        assert!(xml.contains("<priority>0.9</priority>"));
        assert!(!xml.contains("<priority>0.3</priority>"));
    }

    #[test]
    fn test_contains_and_del() {
        let mut doc = document();
        doc.add("/page").unwrap();

        assert!(doc.contains("/page").unwrap());
        assert!(doc.del("/page").unwrap());
        assert!(!doc.contains("/page").unwrap());
        assert!(!doc.del("/page").unwrap());
    }

    #[test]
    fn test_cache_serves_stale_view_within_ttl() {
        let mut config = config();
        config.cache_ttl_ms = 60_000;
        let mut doc = SitemapDocument::new(&config).unwrap();
        doc.add("/page").unwrap();

        let first = doc.to_xml().unwrap();
        doc.add("/late").unwrap();
        let second = doc.to_xml().unwrap();
        // Mutation does not invalidate the cache.
        assert_eq!(first, second);

        doc.clear_cache();
        let third = doc.to_xml().unwrap();
        assert!(third.contains("/late"));
    }

    #[test]
    fn test_expired_cache_regenerates() {
        let mut config = config();
        config.cache_ttl_ms = 50;
        let mut doc = SitemapDocument::new(&config).unwrap();
        doc.add("/page").unwrap();

        let first = doc.to_xml().unwrap();
        doc.add("/late").unwrap();
        // Still cached.
        assert_eq!(doc.to_xml().unwrap(), first);

        std::thread::sleep(Duration::from_millis(80));

        // After the TTL window, serialization reflects the mutation.
        let regenerated = doc.to_xml().unwrap();
        assert_ne!(regenerated, first);
        assert!(regenerated.contains("/late"));

        // Unchanged state stays content-identical across another expiry.
        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(doc.to_xml().unwrap(), regenerated);
    }

    #[test]
    fn test_zero_ttl_disables_caching() {
        let mut doc = document();
        doc.add("/page").unwrap();

        let first = doc.to_xml().unwrap();
        doc.add("/late").unwrap();
        let second = doc.to_xml().unwrap();
        assert_ne!(first, second);
        assert!(second.contains("/late"));
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let mut doc = document();
        doc.add("/a").unwrap();
        doc.add("/b").unwrap();

        assert_eq!(doc.to_xml().unwrap(), doc.to_xml().unwrap());
    }

    #[test]
    fn test_namespace_override_is_verbatim() {
        let mut doc = document().with_namespace_attrs(r#"xmlns="urn:custom""#);
        doc.add("/page").unwrap();

        let xml = doc.to_xml().unwrap();
        assert!(xml.contains(r#"<urlset xmlns="urn:custom">"#));
        assert!(!xml.contains("xmlns:image"));
    }

    #[test]
    fn test_xsl_processing_instruction() {
        let mut doc = document().with_xsl("/sitemap-style.xsl");
        doc.add("/page").unwrap();

        let xml = doc.to_xml().unwrap();
        assert!(xml.contains(r#"<?xml-stylesheet type="text/xsl" href="/sitemap-style.xsl"?>"#));
    }

    #[test]
    fn test_gzip_roundtrip() {
        let mut doc = document();
        doc.add("/page").unwrap();

        let compressed = doc.to_gzip().unwrap();
        let mut decoder = GzDecoder::new(compressed.as_slice());
        let mut decompressed = String::new();
        decoder.read_to_string(&mut decompressed).unwrap();

        assert_eq!(decompressed, doc.to_xml().unwrap());
    }

    #[test]
    fn test_error_level_rejects_bad_entry() {
        let mut doc = document().with_validation(ValidationLevel::Error);
        let mut bad = LooseUrl::new("/page");
        bad.priority = Some(2.0);

        assert!(doc.add(LooseEntry::from(bad)).is_err());
        assert_eq!(doc.len(), 0);
    }
}
