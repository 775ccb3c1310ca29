//! Sitemap index generation and URL-set partitioning.
//!
//! Splits a URL set into consecutive documents of bounded size, streams
//! each to disk (optionally gzipped) and writes a `sitemapindex` document
//! referencing them.

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{SecondsFormat, Utc};
use flate2::{write::GzEncoder, Compression};
use thiserror::Error;
use tracing::{debug, info};

use sitemapper_core::{CoreError, LooseEntry, SitemapConfig};

use crate::{stream::SitemapStream, xml::escape_xml, xml::PREAMBLE};

/// Index generation errors.
#[derive(Debug, Error)]
pub enum IndexError {
    /// No target directory was configured before partitioning.
    #[error("no target directory configured")]
    MissingTargetDir,

    /// No public base URL was configured for index locations.
    #[error("no public base URL configured for sitemap locations")]
    MissingBaseUrl,

    /// Core error (normalization, validation, configuration).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// File system I/O error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// One reference inside a sitemap index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRef {
    /// Absolute URL of the referenced sitemap document.
    pub loc: String,

    /// Last-modified timestamp, ISO-8601.
    pub lastmod: Option<String>,
}

/// An in-memory `sitemapindex` document.
#[derive(Debug, Clone, Default)]
pub struct SitemapIndex {
    refs: Vec<IndexRef>,
}

impl SitemapIndex {
    /// Empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document reference.
    pub fn add_ref(&mut self, loc: impl Into<String>, lastmod: Option<String>) {
        self.refs.push(IndexRef {
            loc: loc.into(),
            lastmod,
        });
    }

    /// Number of references.
    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// References in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexRef> {
        self.refs.iter()
    }

    /// Serialize as a `sitemapindex` document.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(PREAMBLE);
        xml.push('\n');
        xml.push_str(r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
        xml.push('\n');

        for reference in &self.refs {
            xml.push_str("  <sitemap>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&reference.loc)));
            if let Some(lastmod) = &reference.lastmod {
                xml.push_str(&format!(
                    "    <lastmod>{}</lastmod>\n",
                    escape_xml(lastmod)
                ));
            }
            xml.push_str("  </sitemap>\n");
        }

        xml.push_str("</sitemapindex>\n");
        xml
    }
}

/// Outcome of a partitioned write.
#[derive(Debug, Clone)]
pub struct IndexSummary {
    /// Paths of the written sitemap parts, in order.
    pub parts: Vec<PathBuf>,

    /// Public locations referenced by the index, in order.
    pub locations: Vec<String>,

    /// Path of the written index document.
    pub index: PathBuf,

    /// Total number of URL entries written.
    pub url_count: usize,
}

enum PartSink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Write for PartSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(writer) => writer.write(buf),
            Self::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(writer) => writer.flush(),
            Self::Gzip(encoder) => encoder.flush(),
        }
    }
}

impl PartSink {
    fn finish(self) -> io::Result<()> {
        match self {
            Self::Plain(mut writer) => writer.flush(),
            Self::Gzip(encoder) => {
                let mut inner = encoder.finish()?;
                inner.flush()
            }
        }
    }
}

/// Partitions URL sets across sitemap files and writes the index.
#[derive(Debug)]
pub struct SitemapIndexWriter {
    config: SitemapConfig,
    target_dir: Option<PathBuf>,
    stem: String,
}

impl SitemapIndexWriter {
    /// Create a writer from configuration. The target directory must be
    /// set before anything can be written.
    #[must_use]
    pub fn new(config: SitemapConfig) -> Self {
        Self {
            config,
            target_dir: None,
            stem: "sitemap".to_string(),
        }
    }

    /// Set the directory sitemap files are written into.
    #[must_use]
    pub fn with_target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.target_dir = Some(dir.into());
        self
    }

    /// Set the file-name stem (default "sitemap"), producing
    /// `<stem>-<n>.xml[.gz]` parts and `<stem>-index.xml`.
    #[must_use]
    pub fn with_stem(mut self, stem: impl Into<String>) -> Self {
        self.stem = stem.into();
        self
    }

    /// Partition `entries` into documents of at most the configured size,
    /// write each part and the index document.
    ///
    /// Fails before any file is touched when the target directory or the
    /// public base URL is unconfigured. A failure on a later part leaves
    /// earlier parts on disk; partial completion is a visible outcome.
    pub fn write_all(
        &self,
        entries: impl IntoIterator<Item = impl Into<LooseEntry>>,
    ) -> Result<IndexSummary> {
        let target_dir = self
            .target_dir
            .as_deref()
            .ok_or(IndexError::MissingTargetDir)?;
        let base_url = self
            .config
            .base_url
            .as_deref()
            .ok_or(IndexError::MissingBaseUrl)?;
        self.config.validate()?;

        fs::create_dir_all(target_dir)?;

        let limit = self.config.sitemap_size;
        let mut parts = Vec::new();
        let mut locations = Vec::new();
        let mut url_count = 0usize;
        let mut iter = entries.into_iter();

        while let Some(first) = iter.next() {
            let (mut stream, path) = self.open_part(target_dir, parts.len())?;
            stream.push(first)?;

            while stream.count() < limit {
                match iter.next() {
                    Some(entry) => stream.push(entry)?,
                    None => break,
                }
            }

            let written = stream.count();
            url_count += written;
            self.finish_part(stream, &path, written)?;
            locations.push(self.public_location(base_url, &path));
            parts.push(path);
        }

        let lastmod = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut index = SitemapIndex::new();
        for location in &locations {
            index.add_ref(location.clone(), Some(lastmod.clone()));
        }

        let index_path = target_dir.join(format!("{}-index.xml", self.stem));
        fs::write(&index_path, index.to_xml())?;

        info!(
            parts = parts.len(),
            urls = url_count,
            index = %index_path.display(),
            "wrote partitioned sitemap"
        );

        Ok(IndexSummary {
            parts,
            locations,
            index: index_path,
            url_count,
        })
    }

    fn open_part(
        &self,
        target_dir: &Path,
        part_index: usize,
    ) -> Result<(SitemapStream<PartSink>, PathBuf)> {
        let extension = if self.config.gzip { "xml.gz" } else { "xml" };
        let path = target_dir.join(format!("{}-{}.{}", self.stem, part_index, extension));

        let file = BufWriter::new(File::create(&path)?);
        let sink = if self.config.gzip {
            PartSink::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            PartSink::Plain(file)
        };

        let stream =
            SitemapStream::new(&self.config, sink)?.with_validation(self.config.validation);
        Ok((stream, path))
    }

    fn finish_part(
        &self,
        stream: SitemapStream<PartSink>,
        path: &Path,
        count: usize,
    ) -> Result<()> {
        let sink = stream.finish()?;
        sink.finish()?;
        debug!(path = %path.display(), count, "wrote sitemap part");
        Ok(())
    }

    fn public_location(&self, base_url: &str, path: &Path) -> String {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}/{}", base_url.trim_end_matches('/'), name)
    }
}
