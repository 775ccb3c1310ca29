//! XML rendering primitives shared by the document builder and the
//! streaming emitter.

use sitemapper_core::entry::{Image, UrlEntry, Video};

/// Fixed document preamble.
pub const PREAMBLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// The five standard namespace declarations for a `urlset` root.
pub const DEFAULT_NAMESPACE_ATTRS: &str = concat!(
    r#"xmlns="http://www.sitemaps.org/schemas/sitemap/0.9" "#,
    r#"xmlns:news="http://www.google.com/schemas/sitemap-news/0.9" "#,
    r#"xmlns:xhtml="http://www.w3.org/1999/xhtml" "#,
    r#"xmlns:image="http://www.google.com/schemas/sitemap-image/1.1" "#,
    r#"xmlns:video="http://www.google.com/schemas/sitemap-video/1.1""#
);

/// Escape special XML characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Render the document head: preamble, optional stylesheet processing
/// instruction and the `urlset` open tag.
pub fn document_head(xsl: Option<&str>, namespace_attrs: Option<&str>) -> String {
    let mut xml = String::from(PREAMBLE);
    xml.push('\n');

    if let Some(href) = xsl {
        xml.push_str(&format!(
            r#"<?xml-stylesheet type="text/xsl" href="{}"?>"#,
            escape_xml(href)
        ));
        xml.push('\n');
    }

    xml.push_str("<urlset ");
    xml.push_str(namespace_attrs.unwrap_or(DEFAULT_NAMESPACE_ATTRS));
    xml.push_str(">\n");
    xml
}

/// The `urlset` closing tag.
pub fn document_close() -> &'static str {
    "</urlset>\n"
}

/// Render one entry as a `<url>` fragment.
///
/// Sub-elements follow a fixed order: loc, lastmod, changefreq, priority,
/// images, videos, alternate links.
pub fn entry_to_xml(entry: &UrlEntry) -> String {
    let mut xml = String::from("  <url>\n");

    xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));

    if let Some(lastmod) = &entry.lastmod {
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", escape_xml(lastmod)));
    }

    if let Some(changefreq) = entry.changefreq {
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            changefreq.as_str()
        ));
    }

    if let Some(priority) = entry.priority {
        xml.push_str(&format!("    <priority>{priority}</priority>\n"));
    }

    for image in &entry.images {
        push_image(&mut xml, image);
    }

    for video in &entry.videos {
        push_video(&mut xml, video);
    }

    for link in &entry.links {
        xml.push_str(&format!(
            "    <xhtml:link rel=\"alternate\" hreflang=\"{}\" href=\"{}\"/>\n",
            escape_xml(&link.lang),
            escape_xml(&link.url)
        ));
    }

    xml.push_str("  </url>\n");
    xml
}

fn push_image(xml: &mut String, image: &Image) {
    xml.push_str("    <image:image>\n");
    xml.push_str(&format!(
        "      <image:loc>{}</image:loc>\n",
        escape_xml(&image.loc)
    ));
    if let Some(caption) = &image.caption {
        xml.push_str(&format!(
            "      <image:caption>{}</image:caption>\n",
            escape_xml(caption)
        ));
    }
    if let Some(geo_location) = &image.geo_location {
        xml.push_str(&format!(
            "      <image:geo_location>{}</image:geo_location>\n",
            escape_xml(geo_location)
        ));
    }
    if let Some(title) = &image.title {
        xml.push_str(&format!(
            "      <image:title>{}</image:title>\n",
            escape_xml(title)
        ));
    }
    if let Some(license) = &image.license {
        xml.push_str(&format!(
            "      <image:license>{}</image:license>\n",
            escape_xml(license)
        ));
    }
    xml.push_str("    </image:image>\n");
}

fn push_video(xml: &mut String, video: &Video) {
    xml.push_str("    <video:video>\n");
    xml.push_str(&format!(
        "      <video:thumbnail_loc>{}</video:thumbnail_loc>\n",
        escape_xml(&video.thumbnail_loc)
    ));
    xml.push_str(&format!(
        "      <video:title>{}</video:title>\n",
        escape_xml(&video.title)
    ));
    xml.push_str(&format!(
        "      <video:description>{}</video:description>\n",
        escape_xml(&video.description)
    ));

    if let Some(content_loc) = &video.content_loc {
        xml.push_str(&format!(
            "      <video:content_loc>{}</video:content_loc>\n",
            escape_xml(content_loc)
        ));
    }
    if let Some(player_loc) = &video.player_loc {
        xml.push_str(&format!(
            "      <video:player_loc>{}</video:player_loc>\n",
            escape_xml(player_loc)
        ));
    }
    if let Some(duration) = video.duration {
        xml.push_str(&format!(
            "      <video:duration>{duration}</video:duration>\n"
        ));
    }
    if let Some(rating) = video.rating {
        xml.push_str(&format!("      <video:rating>{rating}</video:rating>\n"));
    }
    if let Some(view_count) = video.view_count {
        xml.push_str(&format!(
            "      <video:view_count>{view_count}</video:view_count>\n"
        ));
    }
    if let Some(publication_date) = &video.publication_date {
        xml.push_str(&format!(
            "      <video:publication_date>{}</video:publication_date>\n",
            escape_xml(publication_date)
        ));
    }
    if let Some(family_friendly) = video.family_friendly {
        xml.push_str(&format!(
            "      <video:family_friendly>{}</video:family_friendly>\n",
            family_friendly.as_str()
        ));
    }
    for tag in &video.tags {
        xml.push_str(&format!("      <video:tag>{}</video:tag>\n", escape_xml(tag)));
    }
    if let Some(restriction) = &video.restriction {
        xml.push_str(&format!(
            "      <video:restriction relationship=\"{}\">{}</video:restriction>\n",
            restriction.relationship.as_str(),
            escape_xml(&restriction.countries)
        ));
    }
    if let Some(price) = &video.price {
        let mut attrs = format!(" currency=\"{}\"", escape_xml(&price.currency));
        if let Some(kind) = &price.kind {
            attrs.push_str(&format!(" type=\"{}\"", escape_xml(kind)));
        }
        if let Some(resolution) = &price.resolution {
            attrs.push_str(&format!(" resolution=\"{}\"", escape_xml(resolution)));
        }
        xml.push_str(&format!(
            "      <video:price{attrs}>{}</video:price>\n",
            escape_xml(&price.value)
        ));
    }
    if let Some(requires_subscription) = video.requires_subscription {
        xml.push_str(&format!(
            "      <video:requires_subscription>{}</video:requires_subscription>\n",
            requires_subscription.as_str()
        ));
    }
    if let Some(platform) = &video.platform {
        xml.push_str(&format!(
            "      <video:platform relationship=\"{}\">{}</video:platform>\n",
            platform.relationship.as_str(),
            escape_xml(&platform.platforms)
        ));
    }
    if let Some(live) = video.live {
        xml.push_str(&format!("      <video:live>{}</video:live>\n", live.as_str()));
    }

    xml.push_str("    </video:video>\n");
}

#[cfg(test)]
mod tests {
    use sitemapper_core::entry::{AlternateLink, ChangeFreq};

    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("<tag>"), "&lt;tag&gt;");
        assert_eq!(escape_xml("\"quoted\""), "&quot;quoted&quot;");
    }

    #[test]
    fn test_document_head_default_namespaces() {
        let head = document_head(None, None);
        assert!(head.starts_with(PREAMBLE));
        assert!(head.contains(r#"xmlns="http://www.sitemaps.org/schemas/sitemap/0.9""#));
        assert!(head.contains("xmlns:video"));
        assert!(head.ends_with(">\n"));
    }

    #[test]
    fn test_document_head_namespace_override() {
        let head = document_head(None, Some(r#"xmlns="urn:custom""#));
        assert!(head.contains(r#"<urlset xmlns="urn:custom">"#));
        assert!(!head.contains("xmlns:video"));
    }

    #[test]
    fn test_document_head_stylesheet() {
        let head = document_head(Some("/style.xsl"), None);
        let pi_pos = head.find("xml-stylesheet").unwrap();
        let root_pos = head.find("<urlset").unwrap();
        assert!(pi_pos < root_pos);
    }

    #[test]
    fn test_entry_fragment() {
        let mut entry = UrlEntry::new("https://example.com/page?a=1&b=2");
        entry.lastmod = Some("2024-03-15T00:00:00Z".to_string());
        entry.changefreq = Some(ChangeFreq::Weekly);
        entry.priority = Some(0.7);
        entry.links = vec![AlternateLink {
            lang: "de".to_string(),
            url: "https://example.com/de/page".to_string(),
        }];

        let xml = entry_to_xml(&entry);
        assert!(xml.contains("<loc>https://example.com/page?a=1&amp;b=2</loc>"));
        assert!(xml.contains("<lastmod>2024-03-15T00:00:00Z</lastmod>"));
        assert!(xml.contains("<changefreq>weekly</changefreq>"));
        assert!(xml.contains("<priority>0.7</priority>"));
        assert!(xml.contains(r#"hreflang="de""#));
    }

    #[test]
    fn test_priority_emitted_verbatim() {
        let mut entry = UrlEntry::new("https://example.com/page");
        entry.priority = Some(0.55);

        let xml = entry_to_xml(&entry);
        assert!(xml.contains("<priority>0.55</priority>"));
    }

    #[test]
    fn test_video_rating_text_is_plain_numeral() {
        let mut entry = UrlEntry::new("https://example.com/watch");
        entry.videos = vec![Video {
            thumbnail_loc: "https://example.com/t.jpg".to_string(),
            title: "Title".to_string(),
            description: "Description".to_string(),
            rating: Some(4.5),
            view_count: Some(1234),
            ..Video::default()
        }];

        let xml = entry_to_xml(&entry);
        assert!(xml.contains("<video:rating>4.5</video:rating>"));
        assert!(xml.contains("<video:view_count>1234</video:view_count>"));
    }
}
