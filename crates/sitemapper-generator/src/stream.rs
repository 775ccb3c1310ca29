//! Streaming sitemap emission.
//!
//! A push-based transform over any [`Write`] sink for URL sets too large
//! to hold in memory as one document. Each pushed entry is normalized and
//! written immediately; at most one entry is ever held. Backpressure is
//! the sink's own: a blocking or bounded writer suspends the producer.

use std::io::Write;

use tracing::debug;

use sitemapper_core::{
    validate, LooseEntry, Normalizer, Result, SitemapConfig, ValidationLevel,
};

use crate::xml;

/// Push-based sitemap emitter writing XML fragments to a sink.
///
/// The document head is emitted lazily, before the first entry fragment;
/// with zero entries pushed the output is exactly the root closing tag.
pub struct SitemapStream<W: Write> {
    sink: W,
    normalizer: Normalizer,
    validation: Option<ValidationLevel>,
    xsl: Option<String>,
    namespace_attrs: Option<String>,
    started: bool,
    count: usize,
}

impl<W: Write> SitemapStream<W> {
    /// Create a stream writing to `sink`.
    pub fn new(config: &SitemapConfig, sink: W) -> Result<Self> {
        Ok(Self {
            sink,
            normalizer: config.normalizer()?,
            validation: None,
            xsl: config.xsl.clone(),
            namespace_attrs: None,
            started: false,
            count: 0,
        })
    }

    /// Validate entries at this level before emission. Without this the
    /// stream performs no validation.
    #[must_use]
    pub fn with_validation(mut self, level: ValidationLevel) -> Self {
        self.validation = Some(level);
        self
    }

    /// Replace the default namespace declarations.
    #[must_use]
    pub fn with_namespace_attrs(mut self, attrs: impl Into<String>) -> Self {
        self.namespace_attrs = Some(attrs.into());
        self
    }

    /// Normalize one entry and write its fragment, emitting the document
    /// head first if this is the first entry.
    pub fn push(&mut self, entry: impl Into<LooseEntry>) -> Result<()> {
        let strict = self.normalizer.normalize(entry)?;
        if let Some(level) = self.validation {
            validate(&strict, level)?;
        }

        if !self.started {
            let head =
                xml::document_head(self.xsl.as_deref(), self.namespace_attrs.as_deref());
            self.sink.write_all(head.as_bytes())?;
            self.started = true;
        }

        self.sink.write_all(xml::entry_to_xml(&strict).as_bytes())?;
        self.count += 1;
        Ok(())
    }

    /// Number of entries emitted so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Emit the root closing tag, flush and return the sink.
    pub fn finish(mut self) -> Result<W> {
        self.sink.write_all(xml::document_close().as_bytes())?;
        self.sink.flush()?;
        debug!(count = self.count, "finished sitemap stream");
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use sitemapper_core::LooseUrl;

    use super::*;

    fn config() -> SitemapConfig {
        SitemapConfig {
            base_url: Some("https://example.com".to_string()),
            ..SitemapConfig::default()
        }
    }

    fn emit(entries: &[&str]) -> String {
        let mut stream = SitemapStream::new(&config(), Vec::new()).unwrap();
        for entry in entries {
            stream.push(*entry).unwrap();
        }
        String::from_utf8(stream.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_zero_entries_emits_only_closing_tag() {
        assert_eq!(emit(&[]), "</urlset>\n");
    }

    #[test]
    fn test_single_entry_layout() {
        let output = emit(&["/page"]);

        assert!(output.starts_with(xml::PREAMBLE));
        assert!(output.ends_with("</urlset>\n"));
        let head_pos = output.find("<urlset").unwrap();
        let entry_pos = output.find("<url>").unwrap();
        assert!(head_pos < entry_pos);
        assert!(output.contains("<loc>https://example.com/page</loc>"));
    }

    #[test]
    fn test_entries_preserve_push_order() {
        let output = emit(&["/a", "/b", "/c"]);

        let a = output.find("/a</loc>").unwrap();
        let b = output.find("/b</loc>").unwrap();
        let c = output.find("/c</loc>").unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_no_validation_by_default() {
        let mut stream = SitemapStream::new(&config(), Vec::new()).unwrap();
        let mut bad = LooseUrl::new("/page");
        bad.priority = Some(7.5);

        // Out-of-range priority passes through untouched without an
        // explicitly configured level.
        stream.push(LooseEntry::from(bad)).unwrap();
        let output = String::from_utf8(stream.finish().unwrap()).unwrap();
        assert!(output.contains("<priority>7.5</priority>"));
    }

    #[test]
    fn test_explicit_error_level_rejects() {
        let mut stream = SitemapStream::new(&config(), Vec::new())
            .unwrap()
            .with_validation(ValidationLevel::Error);
        let mut bad = LooseUrl::new("/page");
        bad.priority = Some(7.0);

        assert!(stream.push(LooseEntry::from(bad)).is_err());
    }

    #[test]
    fn test_bad_url_halts_entry() {
        let stream_config = SitemapConfig::default();
        let mut stream = SitemapStream::new(&stream_config, Vec::new()).unwrap();

        assert!(stream.push("/relative-without-base").is_err());
        // Nothing was emitted for the failed entry.
        assert_eq!(stream.count(), 0);
        let output = String::from_utf8(stream.finish().unwrap()).unwrap();
        assert_eq!(output, "</urlset>\n");
    }
}
