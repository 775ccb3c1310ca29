//! Sitemap entry types.
//!
//! Two representations live here: the *loose* shape accepted at the API
//! boundary (string-or-object, scalar-or-list fields, permissive flag
//! values) and the *strict* shape every downstream component operates on.
//! The normalizer is the only way to get from one to the other.

use std::{collections::BTreeMap, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ViolationKind};

/// Maximum number of URL entries a single sitemap document may hold.
pub const MAX_SITEMAP_URLS: usize = 50_000;

/// Maximum length of a `<loc>` value.
pub const MAX_URL_LEN: usize = 2048;

/// Maximum number of images per URL entry.
pub const MAX_IMAGES_PER_ENTRY: usize = 1000;

/// Maximum number of tags per video.
pub const MAX_VIDEO_TAGS: usize = 32;

/// Maximum video duration in seconds (8 hours).
pub const MAX_VIDEO_DURATION_SECS: u32 = 28_800;

/// Change frequency for sitemap entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    /// The protocol keyword for this frequency.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl FromStr for ChangeFreq {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "never" => Ok(Self::Never),
            other => Err(CoreError::validation(
                "changefreq",
                ViolationKind::InvalidEnum,
                format!("unknown change frequency {other:?}"),
            )),
        }
    }
}

/// Yes/no tri-state encoding used by several video flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    /// The protocol keyword.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }
}

impl FromStr for YesNo {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            other => Err(CoreError::validation(
                "yes/no flag",
                ViolationKind::InvalidEnum,
                format!("expected yes or no, got {other:?}"),
            )),
        }
    }
}

/// Allow/deny relationship used by video restriction and platform lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Allow,
    Deny,
}

impl Relationship {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

/// A strict image descriptor attached to a URL entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Absolute image URL.
    pub loc: String,

    /// Caption text.
    #[serde(default)]
    pub caption: Option<String>,

    /// Image title.
    #[serde(default)]
    pub title: Option<String>,

    /// License URL.
    #[serde(default)]
    pub license: Option<String>,

    /// Geographic location text (e.g. "Limerick, Ireland").
    #[serde(default)]
    pub geo_location: Option<String>,
}

impl Image {
    /// Image with only a location.
    #[must_use]
    pub fn new(loc: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            ..Self::default()
        }
    }
}

/// Country restriction for a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRestriction {
    /// Whether the listed countries are allowed or denied.
    pub relationship: Relationship,

    /// Space-separated ISO 3166 country codes.
    pub countries: String,
}

/// Platform restriction for a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoPlatform {
    /// Whether the listed platforms are allowed or denied.
    pub relationship: Relationship,

    /// Space-separated platform names (web, mobile, tv).
    pub platforms: String,
}

/// Purchase or rental price for a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoPrice {
    /// Price value, rendered as the element text.
    pub value: String,

    /// ISO 4217 currency code.
    pub currency: String,

    /// "rent" or "own".
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    /// "hd" or "sd".
    #[serde(default)]
    pub resolution: Option<String>,
}

/// A strict video descriptor attached to a URL entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Video {
    /// Absolute thumbnail URL. Required by the protocol.
    pub thumbnail_loc: String,

    /// Video title. Required by the protocol.
    pub title: String,

    /// Video description. Required by the protocol.
    pub description: String,

    /// Absolute URL of the media file.
    #[serde(default)]
    pub content_loc: Option<String>,

    /// Absolute URL of the player page.
    #[serde(default)]
    pub player_loc: Option<String>,

    /// Duration in seconds.
    #[serde(default)]
    pub duration: Option<u32>,

    /// Rating in [0.0, 5.0].
    #[serde(default)]
    pub rating: Option<f32>,

    /// View count, emitted in decimal form.
    #[serde(default)]
    pub view_count: Option<u64>,

    /// Publication date, ISO-8601.
    #[serde(default)]
    pub publication_date: Option<String>,

    /// Family-friendly flag.
    #[serde(default)]
    pub family_friendly: Option<YesNo>,

    /// Live-stream flag.
    #[serde(default)]
    pub live: Option<YesNo>,

    /// Subscription-required flag.
    #[serde(default)]
    pub requires_subscription: Option<YesNo>,

    /// Country restriction.
    #[serde(default)]
    pub restriction: Option<VideoRestriction>,

    /// Platform restriction.
    #[serde(default)]
    pub platform: Option<VideoPlatform>,

    /// Price information.
    #[serde(default)]
    pub price: Option<VideoPrice>,

    /// Descriptive tags, at most [`MAX_VIDEO_TAGS`].
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An alternate-language link for a URL entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternateLink {
    /// Language code (e.g. "en", "zh").
    #[serde(alias = "hreflang")]
    pub lang: String,

    /// Absolute URL for this language version.
    #[serde(alias = "href")]
    pub url: String,
}

/// A fully normalized URL entry, the unit of a sitemap document.
///
/// Every URL field is absolute. Instances come out of
/// [`Normalizer::normalize`](crate::normalize::Normalizer::normalize) and
/// are not mutated afterwards except by whole-entry replacement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UrlEntry {
    /// Absolute page URL.
    pub loc: String,

    /// Image descriptors, insertion order.
    pub images: Vec<Image>,

    /// Video descriptors, insertion order.
    pub videos: Vec<Video>,

    /// Alternate-language links, insertion order.
    pub links: Vec<AlternateLink>,

    /// Resolved last-modified timestamp, ISO-8601.
    pub lastmod: Option<String>,

    /// Change frequency.
    pub changefreq: Option<ChangeFreq>,

    /// Priority in [0.0, 1.0].
    pub priority: Option<f32>,

    /// Extension fields carried through from the loose input. Not rendered
    /// into the XML output.
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl UrlEntry {
    /// Entry with only a location.
    #[must_use]
    pub fn new(loc: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            ..Self::default()
        }
    }
}

/// One value or a list of values; loose inputs accept either.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Collapse into a vector.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        value.into_vec()
    }
}

/// Boolean-like flag value: a native bool or an already-encoded keyword.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BoolOrKeyword {
    Flag(bool),
    Keyword(String),
}

/// Numeric value that may arrive as a number or its string form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(f64),
    Text(String),
}

/// A loose image descriptor: a bare URL string or a full record.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LooseImage {
    Url(String),
    Full(Image),
}

/// A loose video descriptor.
///
/// The protocol-required fields default to empty strings when absent so
/// that missing data reaches the validator as a policy matter instead of
/// failing at parse time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LooseVideo {
    #[serde(default)]
    pub thumbnail_loc: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content_loc: Option<String>,
    #[serde(default)]
    pub player_loc: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub rating: Option<NumberOrString>,
    #[serde(default)]
    pub view_count: Option<NumberOrString>,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub family_friendly: Option<BoolOrKeyword>,
    #[serde(default)]
    pub live: Option<BoolOrKeyword>,
    #[serde(default)]
    pub requires_subscription: Option<BoolOrKeyword>,
    #[serde(default)]
    pub restriction: Option<VideoRestriction>,
    #[serde(default)]
    pub platform: Option<VideoPlatform>,
    #[serde(default)]
    pub price: Option<VideoPrice>,
    #[serde(default)]
    pub tag: Option<OneOrMany<String>>,
}

/// The object form of a loose URL entry. All fields optional except `url`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LooseUrl {
    /// Page URL, absolute or relative to the configured base.
    pub url: String,

    /// One image or a list of images.
    #[serde(default)]
    pub img: Option<OneOrMany<LooseImage>>,

    /// One video or a list of videos.
    #[serde(default)]
    pub video: Option<OneOrMany<LooseVideo>>,

    /// One alternate link or a list of them.
    #[serde(default)]
    pub links: Option<OneOrMany<AlternateLink>>,

    /// Last-modified date, ISO string or `YYYY-MM-DD`.
    #[serde(default)]
    pub lastmod: Option<String>,

    /// Last-modified date, strict ISO string. Wins over `lastmod`.
    #[serde(default, rename = "lastmodISO")]
    pub lastmod_iso: Option<String>,

    /// Path whose file modification time supplies lastmod. Wins over both
    /// date fields.
    #[serde(default, rename = "lastmodfile")]
    pub lastmod_file: Option<PathBuf>,

    /// Change frequency keyword.
    #[serde(default)]
    pub changefreq: Option<String>,

    /// Priority in [0.0, 1.0].
    #[serde(default)]
    pub priority: Option<f32>,

    /// Unrecognized keys, carried onto the strict entry.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl LooseUrl {
    /// Loose entry with only a URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// A caller-supplied URL entry: a bare URL string or a partial record.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LooseEntry {
    Url(String),
    Full(LooseUrl),
}

impl From<&str> for LooseEntry {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for LooseEntry {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<LooseUrl> for LooseEntry {
    fn from(value: LooseUrl) -> Self {
        Self::Full(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changefreq_roundtrip() {
        assert_eq!("weekly".parse::<ChangeFreq>().unwrap(), ChangeFreq::Weekly);
        assert_eq!(ChangeFreq::Weekly.as_str(), "weekly");
        assert!("fortnightly".parse::<ChangeFreq>().is_err());
    }

    #[test]
    fn test_changefreq_parse_error_kind() {
        let err = "sometimes".parse::<ChangeFreq>().unwrap_err();
        assert_eq!(err.violation_kind(), Some(ViolationKind::InvalidEnum));
    }

    #[test]
    fn test_yes_no_from_bool() {
        assert_eq!(YesNo::from(true), YesNo::Yes);
        assert_eq!(YesNo::from(false), YesNo::No);
        assert_eq!("YES".parse::<YesNo>().unwrap(), YesNo::Yes);
        assert!("maybe".parse::<YesNo>().is_err());
    }

    #[test]
    fn test_loose_entry_from_json_string() {
        let entry: LooseEntry = serde_json::from_str(r#""https://example.com/page""#).unwrap();
        assert!(matches!(entry, LooseEntry::Url(url) if url == "https://example.com/page"));
    }

    #[test]
    fn test_loose_entry_from_json_object() {
        let entry: LooseEntry = serde_json::from_str(
            r#"{
                "url": "/page",
                "changefreq": "daily",
                "priority": 0.7,
                "img": "https://example.com/shot.png",
                "news": {"publication": "Example"}
            }"#,
        )
        .unwrap();

        let LooseEntry::Full(loose) = entry else {
            panic!("expected object form");
        };
        assert_eq!(loose.url, "/page");
        assert_eq!(loose.changefreq.as_deref(), Some("daily"));
        assert!(matches!(loose.img, Some(OneOrMany::One(_))));
        assert!(loose.extensions.contains_key("news"));
    }

    #[test]
    fn test_loose_video_missing_required_fields_parses() {
        let entry: LooseEntry = serde_json::from_str(
            r#"{
                "url": "/watch",
                "video": {"content_loc": "https://example.com/clip.mp4"}
            }"#,
        )
        .unwrap();

        // Absent protocol-required fields arrive empty; whether that is
        // fatal is the validator's call.
        let LooseEntry::Full(loose) = entry else {
            panic!("expected object form");
        };
        let Some(OneOrMany::One(video)) = loose.video else {
            panic!("expected single video");
        };
        assert!(video.thumbnail_loc.is_empty());
        assert!(video.title.is_empty());
        assert!(video.description.is_empty());
    }

    #[test]
    fn test_one_or_many() {
        let one: OneOrMany<u32> = serde_json::from_str("3").unwrap();
        assert_eq!(one.into_vec(), vec![3]);
        let many: OneOrMany<u32> = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(many.into_vec(), vec![1, 2]);
    }
}
