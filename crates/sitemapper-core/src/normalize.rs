//! Entry normalization.
//!
//! Converts loose, permissive URL entries into strict, fully resolved
//! records. Everything downstream of this module sees one fixed shape.

use std::{
    collections::HashMap,
    fmt, fs,
    io,
    path::Path,
    time::SystemTime,
};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use tracing::debug;
use url::Url;

use crate::{
    entry::{
        AlternateLink, BoolOrKeyword, Image, LooseEntry, LooseImage, LooseUrl, LooseVideo,
        NumberOrString, OneOrMany, UrlEntry, Video, YesNo,
    },
    error::{CoreError, Result},
};

/// Injected collaborator resolving a path to its modification time.
///
/// Keeps the normalizer testable without touching the real file system.
pub type MtimeSource = Box<dyn Fn(&Path) -> io::Result<SystemTime> + Send + Sync>;

/// Strict-entry names the normalizer computes; extension fields may not
/// shadow these.
const COMPUTED_FIELDS: &[&str] = &[
    "loc",
    "url",
    "images",
    "img",
    "videos",
    "video",
    "links",
    "lastmod",
    "changefreq",
    "priority",
];

/// Converts loose entries into strict [`UrlEntry`] records.
pub struct Normalizer {
    base: Option<Url>,
    mtime_source: MtimeSource,
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl Normalizer {
    /// Create a normalizer, optionally resolving relative URLs against
    /// `base` (e.g. "https://example.com").
    pub fn new(base: Option<&str>) -> Result<Self> {
        let base = match base {
            Some(raw) => Some(Url::parse(raw).map_err(|source| CoreError::InvalidUrl {
                url: raw.to_string(),
                source,
            })?),
            None => None,
        };

        Ok(Self {
            base,
            mtime_source: Box::new(|path| fs::metadata(path)?.modified()),
        })
    }

    /// Replace the file-modification-time collaborator.
    #[must_use]
    pub fn with_mtime_source(
        mut self,
        source: impl Fn(&Path) -> io::Result<SystemTime> + Send + Sync + 'static,
    ) -> Self {
        self.mtime_source = Box::new(source);
        self
    }

    /// Normalize one loose entry into its strict form.
    ///
    /// Fails on unparsable URLs, unparsable dates and enumeration keywords
    /// outside their protocol vocabulary; no partial result is produced.
    pub fn normalize(&self, input: impl Into<LooseEntry>) -> Result<UrlEntry> {
        match input.into() {
            LooseEntry::Url(url) => Ok(UrlEntry::new(self.resolve(&url)?)),
            LooseEntry::Full(loose) => self.normalize_full(loose),
        }
    }

    /// Normalize a batch, folding into an insertion-ordered map keyed by
    /// resolved URL. A later duplicate overwrites the earlier entry while
    /// keeping its original position.
    pub fn normalize_all(
        &self,
        inputs: impl IntoIterator<Item = impl Into<LooseEntry>>,
    ) -> Result<EntryMap> {
        let mut map = EntryMap::default();
        for input in inputs {
            map.insert(self.normalize(input)?);
        }
        debug!(count = map.len(), "normalized entry batch");
        Ok(map)
    }

    fn normalize_full(&self, loose: LooseUrl) -> Result<UrlEntry> {
        let loc = self.resolve(&loose.url)?;
        // Resolved while `loose` is still whole; the list fields are moved
        // out below.
        let lastmod = self.resolve_lastmod(&loose)?;

        let images = loose
            .img
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(|img| self.normalize_image(img))
            .collect::<Result<Vec<_>>>()?;

        let videos = loose
            .video
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(|video| self.normalize_video(video))
            .collect::<Result<Vec<_>>>()?;

        let links = loose
            .links
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(|link| {
                Ok(AlternateLink {
                    lang: link.lang,
                    url: self.resolve(&link.url)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let changefreq = loose
            .changefreq
            .as_deref()
            .map(str::parse)
            .transpose()?;

        let mut extensions = loose.extensions;
        extensions.retain(|key, _| !COMPUTED_FIELDS.contains(&key.as_str()));

        Ok(UrlEntry {
            loc,
            images,
            videos,
            links,
            lastmod,
            changefreq,
            priority: loose.priority,
            extensions,
        })
    }

    fn normalize_image(&self, loose: LooseImage) -> Result<Image> {
        let mut image = match loose {
            LooseImage::Url(url) => Image::new(url),
            LooseImage::Full(image) => image,
        };
        image.loc = self.resolve(&image.loc)?;
        Ok(image)
    }

    fn normalize_video(&self, loose: LooseVideo) -> Result<Video> {
        let rating = match loose.rating {
            Some(NumberOrString::Number(n)) => Some(n as f32),
            Some(NumberOrString::Text(text)) => {
                Some(text.trim().parse::<f32>().map_err(|_| {
                    CoreError::invalid_value("video.rating", format!("not a number: {text:?}"))
                })?)
            }
            None => None,
        };

        let view_count = match loose.view_count {
            Some(NumberOrString::Number(n)) => Some(n as u64),
            Some(NumberOrString::Text(text)) => {
                Some(text.trim().parse::<u64>().map_err(|_| {
                    CoreError::invalid_value("video.view_count", format!("not a count: {text:?}"))
                })?)
            }
            None => None,
        };

        let content_loc = loose
            .content_loc
            .as_deref()
            .map(|url| self.resolve(url))
            .transpose()?;
        let player_loc = loose
            .player_loc
            .as_deref()
            .map(|url| self.resolve(url))
            .transpose()?;

        // An absent thumbnail stays empty rather than resolving to the
        // bare base URL; the validator reports it as a missing field.
        let thumbnail_loc = if loose.thumbnail_loc.is_empty() {
            String::new()
        } else {
            self.resolve(&loose.thumbnail_loc)?
        };

        Ok(Video {
            thumbnail_loc,
            title: loose.title,
            description: loose.description,
            content_loc,
            player_loc,
            duration: loose.duration,
            rating,
            view_count,
            publication_date: loose.publication_date,
            family_friendly: normalize_flag(loose.family_friendly)?,
            live: normalize_flag(loose.live)?,
            requires_subscription: normalize_flag(loose.requires_subscription)?,
            restriction: loose.restriction,
            platform: loose.platform,
            price: loose.price,
            tags: loose.tag.map(OneOrMany::into_vec).unwrap_or_default(),
        })
    }

    /// Last-modified precedence: file mtime, then `lastmodISO`, then
    /// `lastmod`.
    fn resolve_lastmod(&self, loose: &LooseUrl) -> Result<Option<String>> {
        if let Some(path) = &loose.lastmod_file {
            let mtime = (self.mtime_source)(path)?;
            let datetime: DateTime<Utc> = mtime.into();
            return Ok(Some(datetime.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }

        let raw = loose.lastmod_iso.as_deref().or(loose.lastmod.as_deref());
        raw.map(parse_date).transpose()
    }

    fn resolve(&self, url: &str) -> Result<String> {
        match Url::parse(url) {
            Ok(parsed) => Ok(parsed.to_string()),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base {
                Some(base) => {
                    base.join(url)
                        .map(|joined| joined.to_string())
                        .map_err(|source| CoreError::InvalidUrl {
                            url: url.to_string(),
                            source,
                        })
                }
                None => Err(CoreError::InvalidUrl {
                    url: url.to_string(),
                    source: url::ParseError::RelativeUrlWithoutBase,
                }),
            },
            Err(source) => Err(CoreError::InvalidUrl {
                url: url.to_string(),
                source,
            }),
        }
    }
}

/// Parse an ISO-8601 timestamp or a bare `YYYY-MM-DD` date, rendered back
/// as UTC RFC 3339 with seconds precision.
fn parse_date(raw: &str) -> Result<String> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Ok(datetime
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let datetime = date.and_time(chrono::NaiveTime::MIN).and_utc();
        return Ok(datetime.to_rfc3339_opts(SecondsFormat::Secs, true));
    }

    Err(CoreError::invalid_value(
        "lastmod",
        format!("unparsable date {raw:?}"),
    ))
}

fn normalize_flag(flag: Option<BoolOrKeyword>) -> Result<Option<YesNo>> {
    match flag {
        Some(BoolOrKeyword::Flag(value)) => Ok(Some(value.into())),
        Some(BoolOrKeyword::Keyword(keyword)) => keyword.parse().map(Some),
        None => Ok(None),
    }
}

/// Insertion-ordered collection of strict entries keyed by resolved URL.
///
/// Re-inserting an existing URL replaces the entry in place; the original
/// position is kept.
#[derive(Debug, Clone, Default)]
pub struct EntryMap {
    order: Vec<String>,
    entries: HashMap<String, UrlEntry>,
}

impl EntryMap {
    /// Insert or replace an entry, returning the displaced entry if any.
    pub fn insert(&mut self, entry: UrlEntry) -> Option<UrlEntry> {
        let loc = entry.loc.clone();
        let previous = self.entries.insert(loc.clone(), entry);
        if previous.is_none() {
            self.order.push(loc);
        }
        previous
    }

    /// Remove an entry by resolved URL.
    pub fn remove(&mut self, loc: &str) -> Option<UrlEntry> {
        let removed = self.entries.remove(loc);
        if removed.is_some() {
            self.order.retain(|key| key != loc);
        }
        removed
    }

    /// Whether an entry with this resolved URL exists.
    #[must_use]
    pub fn contains(&self, loc: &str) -> bool {
        self.entries.contains_key(loc)
    }

    /// Look up an entry by resolved URL.
    #[must_use]
    pub fn get(&self, loc: &str) -> Option<&UrlEntry> {
        self.entries.get(loc)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &UrlEntry> {
        self.order.iter().map(|loc| &self.entries[loc])
    }
}

impl IntoIterator for EntryMap {
    type Item = UrlEntry;
    type IntoIter = std::vec::IntoIter<UrlEntry>;

    fn into_iter(mut self) -> Self::IntoIter {
        self.order
            .iter()
            .filter_map(|loc| self.entries.remove(loc))
            .collect::<Vec<_>>()
            .into_iter()
    }
}
