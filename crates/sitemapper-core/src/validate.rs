//! Entry validation against protocol constraints.
//!
//! Checks run after normalization, gated by a configurable strictness
//! level: `silent` skips them, `warn` logs violations and admits the
//! entry, `error` fails on the first violation.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    entry::{UrlEntry, MAX_IMAGES_PER_ENTRY, MAX_URL_LEN, MAX_VIDEO_DURATION_SECS, MAX_VIDEO_TAGS},
    error::{CoreError, Result, ViolationKind},
};

/// How strictly entries are validated on admission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// Run no checks at all.
    Silent,

    /// Log violations through `tracing` and admit the entry.
    #[default]
    Warn,

    /// Fail admission on the first violation.
    Error,
}

/// A single protocol violation found on an entry.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Dotted path of the offending field.
    pub field: &'static str,

    /// Violation class.
    pub kind: ViolationKind,

    /// Human-readable detail.
    pub detail: String,
}

impl Violation {
    fn new(field: &'static str, kind: ViolationKind, detail: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            detail: detail.into(),
        }
    }
}

/// Validate an entry at the given level.
///
/// At [`ValidationLevel::Error`] the first violation is returned as a
/// [`CoreError::Validation`]; at [`ValidationLevel::Warn`] every violation
/// is logged and the entry is admitted.
pub fn validate(entry: &UrlEntry, level: ValidationLevel) -> Result<()> {
    match level {
        ValidationLevel::Silent => Ok(()),
        ValidationLevel::Warn => {
            for violation in check(entry) {
                warn!(
                    loc = %entry.loc,
                    field = violation.field,
                    detail = %violation.detail,
                    "sitemap entry violates protocol constraint"
                );
            }
            Ok(())
        }
        ValidationLevel::Error => match check(entry).into_iter().next() {
            Some(violation) => Err(CoreError::validation(
                violation.field,
                violation.kind,
                violation.detail,
            )),
            None => Ok(()),
        },
    }
}

/// Run the canonical check list, collecting every violation.
pub fn check(entry: &UrlEntry) -> Vec<Violation> {
    let mut violations = Vec::new();

    if entry.loc.len() > MAX_URL_LEN {
        violations.push(Violation::new(
            "loc",
            ViolationKind::OutOfRange,
            format!("URL is {} chars, limit is {MAX_URL_LEN}", entry.loc.len()),
        ));
    }

    if let Some(priority) = entry.priority {
        if !(0.0..=1.0).contains(&priority) {
            violations.push(Violation::new(
                "priority",
                ViolationKind::OutOfRange,
                format!("priority {priority} outside [0.0, 1.0]"),
            ));
        }
    }

    if entry.images.len() > MAX_IMAGES_PER_ENTRY {
        violations.push(Violation::new(
            "images",
            ViolationKind::OutOfRange,
            format!(
                "{} images, limit is {MAX_IMAGES_PER_ENTRY}",
                entry.images.len()
            ),
        ));
    }

    for image in &entry.images {
        if image.loc.is_empty() {
            violations.push(Violation::new(
                "image.loc",
                ViolationKind::MissingField,
                "image location is empty",
            ));
        }
    }

    for video in &entry.videos {
        if video.thumbnail_loc.is_empty() {
            violations.push(Violation::new(
                "video.thumbnail_loc",
                ViolationKind::MissingField,
                "video thumbnail location is empty",
            ));
        }
        if video.title.is_empty() {
            violations.push(Violation::new(
                "video.title",
                ViolationKind::MissingField,
                "video title is empty",
            ));
        }
        if video.description.is_empty() {
            violations.push(Violation::new(
                "video.description",
                ViolationKind::MissingField,
                "video description is empty",
            ));
        }

        if let Some(rating) = video.rating {
            if !(0.0..=5.0).contains(&rating) {
                violations.push(Violation::new(
                    "video.rating",
                    ViolationKind::OutOfRange,
                    format!("rating {rating} outside [0.0, 5.0]"),
                ));
            }
        }

        if let Some(duration) = video.duration {
            if duration == 0 || duration > MAX_VIDEO_DURATION_SECS {
                violations.push(Violation::new(
                    "video.duration",
                    ViolationKind::OutOfRange,
                    format!("duration {duration}s outside [1, {MAX_VIDEO_DURATION_SECS}]"),
                ));
            }
        }

        if video.tags.len() > MAX_VIDEO_TAGS {
            violations.push(Violation::new(
                "video.tag",
                ViolationKind::OutOfRange,
                format!("{} tags, limit is {MAX_VIDEO_TAGS}", video.tags.len()),
            ));
        }

        if let Some(restriction) = &video.restriction {
            if restriction.countries.trim().is_empty() {
                violations.push(Violation::new(
                    "video.restriction",
                    ViolationKind::MissingField,
                    "restriction present but country list is empty",
                ));
            }
        }

        if let Some(platform) = &video.platform {
            if platform.platforms.trim().is_empty() {
                violations.push(Violation::new(
                    "video.platform",
                    ViolationKind::MissingField,
                    "platform restriction present but platform list is empty",
                ));
            }
        }
    }

    for link in &entry.links {
        if link.lang.is_empty() {
            violations.push(Violation::new(
                "link.lang",
                ViolationKind::MissingField,
                "alternate link language is empty",
            ));
        }
        if link.url.is_empty() {
            violations.push(Violation::new(
                "link.url",
                ViolationKind::MissingField,
                "alternate link URL is empty",
            ));
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use crate::entry::{Image, Relationship, Video, VideoRestriction};

    use super::*;

    fn entry() -> UrlEntry {
        UrlEntry::new("https://example.com/page")
    }

    #[test]
    fn test_clean_entry_passes_all_levels() {
        let entry = entry();
        assert!(check(&entry).is_empty());
        assert!(validate(&entry, ValidationLevel::Error).is_ok());
    }

    #[test]
    fn test_priority_out_of_range() {
        let mut entry = entry();
        entry.priority = Some(1.5);

        let violations = check(&entry);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::OutOfRange);

        let err = validate(&entry, ValidationLevel::Error).unwrap_err();
        assert_eq!(err.violation_kind(), Some(ViolationKind::OutOfRange));
    }

    #[test]
    fn test_warn_level_admits_violating_entry() {
        let mut entry = entry();
        entry.priority = Some(-0.1);
        assert!(validate(&entry, ValidationLevel::Warn).is_ok());
    }

    #[test]
    fn test_silent_level_skips_checks() {
        let mut entry = entry();
        entry.priority = Some(99.0);
        entry.images = vec![Image::new("")];
        assert!(validate(&entry, ValidationLevel::Silent).is_ok());
    }

    #[test]
    fn test_video_required_fields() {
        let mut entry = entry();
        entry.videos = vec![Video {
            thumbnail_loc: "https://example.com/t.jpg".to_string(),
            title: String::new(),
            description: "desc".to_string(),
            ..Video::default()
        }];

        let err = validate(&entry, ValidationLevel::Error).unwrap_err();
        assert_eq!(err.violation_kind(), Some(ViolationKind::MissingField));
        assert!(err.to_string().contains("video.title"));
    }

    #[test]
    fn test_video_rating_and_duration_ranges() {
        let mut entry = entry();
        entry.videos = vec![Video {
            thumbnail_loc: "https://example.com/t.jpg".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            rating: Some(5.5),
            duration: Some(30_000),
            ..Video::default()
        }];

        let violations = check(&entry);
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.kind == ViolationKind::OutOfRange));
    }

    #[test]
    fn test_restriction_requires_country_list() {
        let mut entry = entry();
        entry.videos = vec![Video {
            thumbnail_loc: "https://example.com/t.jpg".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            restriction: Some(VideoRestriction {
                relationship: Relationship::Allow,
                countries: "  ".to_string(),
            }),
            ..Video::default()
        }];

        let err = validate(&entry, ValidationLevel::Error).unwrap_err();
        assert_eq!(err.violation_kind(), Some(ViolationKind::MissingField));
    }

    #[test]
    fn test_url_length_limit() {
        let mut entry = entry();
        entry.loc = format!("https://example.com/{}", "a".repeat(MAX_URL_LEN));

        let violations = check(&entry);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "loc");
    }
}
