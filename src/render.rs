//! XML serialization of an assembled feed.

use std::borrow::Cow;
use std::io::Write;

use chrono::{DateTime, Utc};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::Writer;

use crate::assembler::{ChannelHeader, FeedDocument, FeedItem};
use crate::error::Result;

pub const ITUNES_NS: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";
pub const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";

/// Render a document as a complete RSS 2.0 feed.
pub fn render(doc: &FeedDocument) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut rss_start = BytesStart::new("rss");
    rss_start.push_attribute(("version", "2.0"));
    rss_start.push_attribute(("xmlns:itunes", ITUNES_NS));
    rss_start.push_attribute(("xmlns:content", CONTENT_NS));
    writer.write_event(Event::Start(rss_start))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    write_header(&mut writer, &doc.header, &doc.last_build_date)?;
    for item in &doc.items {
        write_item(&mut writer, item)?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    let mut out = writer.into_inner();
    out.push(b'\n');
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn write_header<W: Write>(w: &mut Writer<W>, header: &ChannelHeader, built: &DateTime<Utc>) -> Result<()> {
    write_text_element(w, "title", &header.title)?;
    write_text_element(w, "link", &header.link)?;
    write_text_element(w, "language", &header.language)?;
    write_text_element(w, "copyright", &header.copyright)?;
    write_text_element(w, "lastBuildDate", &built.to_rfc2822())?;
    write_text_element(w, "itunes:author", &header.author)?;
    write_text_element(w, "description", &header.description)?;
    write_text_element(w, "itunes:type", header.podcast_type)?;
    write_text_element(w, "itunes:summary", &header.summary)?;

    w.write_event(Event::Start(BytesStart::new("itunes:owner")))?;
    write_text_element(w, "itunes:name", &header.owner_name)?;
    write_text_element(w, "itunes:email", &header.owner_email)?;
    w.write_event(Event::End(BytesEnd::new("itunes:owner")))?;

    let mut image = BytesStart::new("itunes:image");
    image.push_attribute(("href", header.image_url.as_str()));
    w.write_event(Event::Empty(image))?;

    let mut category = BytesStart::new("itunes:category");
    category.push_attribute(("text", header.category.as_str()));
    w.write_event(Event::Start(category))?;
    let mut subcategory = BytesStart::new("itunes:category");
    subcategory.push_attribute(("text", header.subcategory.as_str()));
    w.write_event(Event::Empty(subcategory))?;
    w.write_event(Event::End(BytesEnd::new("itunes:category")))?;
    Ok(())
}

fn write_item<W: Write>(w: &mut Writer<W>, item: &FeedItem) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new("item")))?;
    write_text_element(w, "itunes:episodeType", item.episode_type)?;
    write_text_element(w, "itunes:episode", &item.episode.to_string())?;
    write_text_element(w, "itunes:season", &item.season.to_string())?;
    write_raw_element(w, "title", &item.title)?;
    write_cdata_element(w, "description", &item.description)?;

    let mut image = BytesStart::new("itunes:image");
    image.push_attribute(raw_attribute("href", &item.image_href));
    w.write_event(Event::Empty(image))?;

    write_raw_element(w, "link", &item.link)?;

    let mut enclosure = BytesStart::new("enclosure");
    enclosure.push_attribute(("type", item.enclosure.mime_type));
    enclosure.push_attribute(("url", item.enclosure.url.as_str()));
    w.write_event(Event::Empty(enclosure))?;

    write_text_element(w, "guid", &item.guid)?;
    write_text_element(w, "pubDate", &item.pub_date.to_rfc2822())?;
    write_text_element(w, "itunes:explicit", if item.explicit { "true" } else { "false" })?;
    w.write_event(Event::End(BytesEnd::new("item")))?;
    Ok(())
}

// Plain text, XML-escaped on write.
fn write_text_element<W: Write>(w: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

// Already entity-encoded text, written as is.
fn write_raw_element<W: Write>(w: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::from_escaped(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_cdata_element<W: Write>(w: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    for section in cdata_sections(text) {
        w.write_event(Event::CData(BytesCData::new(section)))?;
    }
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn raw_attribute<'a>(key: &'a str, value: &'a str) -> Attribute<'a> {
    Attribute {
        key: QName(key.as_bytes()),
        value: Cow::Borrowed(value.as_bytes()),
    }
}

/// Split text so no CDATA section contains the `]]>` terminator.
fn cdata_sections(text: &str) -> Vec<String> {
    let parts: Vec<&str> = text.split("]]>").collect();
    let last = parts.len() - 1;
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let mut section = String::new();
            if i > 0 {
                section.push('>');
            }
            section.push_str(part);
            if i < last {
                section.push_str("]]");
            }
            section
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{assemble, ChannelHeader};
    use crate::config::ChannelConfig;
    use crate::model::{parse_local, parse_utc, EpisodeRecord, FeedVariant, PublishStatus};
    use crate::ranker::rank;

    fn doc(records: Vec<EpisodeRecord>) -> FeedDocument {
        let ranked = rank(records).unwrap();
        let header = ChannelHeader::from_config(&ChannelConfig::default());
        let resolver = |u: &str| -> Result<String> { Ok(u.to_string()) };
        assemble(
            &ranked,
            FeedVariant::Public,
            header,
            parse_utc("2024-03-04T05:06:07").unwrap(),
            &resolver,
        )
        .unwrap()
    }

    fn record(id: u64, title: &str, excerpt: &str, audio: Option<&str>) -> EpisodeRecord {
        EpisodeRecord {
            id,
            status: PublishStatus::Publish,
            title: title.to_string(),
            excerpt: excerpt.to_string(),
            audio_url: audio.map(str::to_string),
            image_url: Some("https://img.example.com/a.png?x=1&y=2".to_string()),
            link: Some("https://example.com/ep".to_string()),
            date: parse_local("2023-01-01T10:00:00").unwrap(),
            date_gmt: parse_utc("2023-01-01T15:00:00").unwrap(),
        }
    }

    #[test]
    fn renders_header_and_namespaces() {
        let xml = render(&doc(vec![record(1, "T", "<p>d</p>", Some("https://a/1.mp3"))])).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("xmlns:itunes=\"http://www.itunes.com/dtds/podcast-1.0.dtd\""));
        assert!(xml.contains("xmlns:content=\"http://purl.org/rss/1.0/modules/content/\""));
        assert!(xml.contains("<title>Software Daily</title>"));
        assert!(xml.contains("<itunes:type>serial</itunes:type>"));
        assert!(xml.contains("<lastBuildDate>Mon, 4 Mar 2024 05:06:07 +0000</lastBuildDate>"));
        assert!(xml.contains("<itunes:category text=\"News\">"));
        assert!(xml.contains("<itunes:category text=\"Tech News\"/>"));
        assert!(xml.contains("<itunes:email>jeff@softwareengineeringdaily.com</itunes:email>"));
    }

    #[test]
    fn renders_item_fields() {
        let xml = render(&doc(vec![record(
            1234,
            "Rust &#8211; Ownership",
            "<p>x Download Q&amp;A<br></p>",
            Some("https://a/1.mp3"),
        )]))
        .unwrap();
        assert!(xml.contains("<itunes:episodeType>full</itunes:episodeType>"));
        assert!(xml.contains("<itunes:episode>1</itunes:episode>"));
        assert!(xml.contains("<itunes:season>0</itunes:season>"));
        assert!(xml.contains("<title>Rust &#8211; Ownership</title>"));
        assert!(xml.contains("<description><![CDATA[Q&A]]></description>"));
        assert!(xml.contains("<itunes:image href=\"https://img.example.com/a.png?x=1&#038;y=2\"/>"));
        assert!(xml.contains("<link>https://example.com/ep</link>"));
        assert!(xml.contains("<enclosure type=\"audio/mpeg\" url=\"https://a/1.mp3\"/>"));
        assert!(xml.contains("<guid>ya</guid>"));
        assert!(xml.contains("<pubDate>Sun, 1 Jan 2023 15:00:00 +0000</pubDate>"));
        assert!(xml.contains("<itunes:explicit>false</itunes:explicit>"));
    }

    #[test]
    fn items_without_audio_are_absent() {
        let xml = render(&doc(vec![
            record(1, "With audio", "", Some("https://a/1.mp3")),
            record(2, "No audio", "", None),
        ]))
        .unwrap();
        assert_eq!(xml.matches("<item>").count(), 1);
        assert!(!xml.contains("No audio"));
    }

    #[test]
    fn cdata_terminator_is_split() {
        assert_eq!(cdata_sections("plain"), vec!["plain"]);
        assert_eq!(cdata_sections("a]]>b"), vec!["a]]", ">b"]);
        assert_eq!(cdata_sections("]]>"), vec!["]]", ">"]);
    }
}
