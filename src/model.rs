//! Episode records as read from the store, and the ranked form built from them.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::error::{FeedError, Result};

/// Publication state of a post. Only [`PublishStatus::Publish`] is eligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    Publish,
    Draft,
    Pending,
    Private,
    Future,
    Other(String),
}

impl From<&str> for PublishStatus {
    fn from(s: &str) -> Self {
        match s {
            "publish" => PublishStatus::Publish,
            "draft" => PublishStatus::Draft,
            "pending" => PublishStatus::Pending,
            "private" => PublishStatus::Private,
            "future" => PublishStatus::Future,
            other => PublishStatus::Other(other.to_string()),
        }
    }
}

/// Which of the two feeds is being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedVariant {
    /// Regular feed, original audio.
    Public,
    /// Ad-free feed, audio URL rewritten by the resolver.
    Private,
}

/// `{ "rendered": "..." }` wrapper used by the store for rich text fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: Option<String>,
}

/// Record ids arrive either as numbers or as numeric strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(u64),
    Text(String),
}

/// Episode record exactly as the store serves it. Every field is optional so
/// one bad record never fails decoding of the whole batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEpisode {
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub title: Rendered,
    #[serde(default)]
    pub excerpt: Rendered,
    #[serde(default)]
    pub mp3: Option<String>,
    #[serde(default, rename = "mainImage")]
    pub main_image: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub date_gmt: Option<String>,
}

/// A validated episode record.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord {
    pub id: u64,
    pub status: PublishStatus,
    pub title: String,
    pub excerpt: String,
    pub audio_url: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    /// Site-local publish time. Drives ordering.
    pub date: NaiveDateTime,
    /// Publish time in UTC. Drives seasons and `pubDate`.
    pub date_gmt: DateTime<Utc>,
}

impl TryFrom<RawEpisode> for EpisodeRecord {
    type Error = FeedError;

    fn try_from(raw: RawEpisode) -> Result<Self> {
        let id = match raw.id {
            Some(RawId::Number(n)) => n,
            Some(RawId::Text(s)) => s.trim().parse::<u64>().map_err(|_| FeedError::MalformedRecord {
                id: Some(s.clone()),
                reason: "id is not a non-negative integer".to_string(),
            })?,
            None => {
                return Err(FeedError::MalformedRecord {
                    id: None,
                    reason: "missing id".to_string(),
                })
            }
        };

        let malformed = |reason: String| FeedError::MalformedRecord {
            id: Some(id.to_string()),
            reason,
        };

        let date = raw
            .date
            .as_deref()
            .ok_or_else(|| malformed("missing date".to_string()))
            .and_then(|d| parse_local(d).map_err(|e| malformed(e.to_string())))?;
        let date_gmt = raw
            .date_gmt
            .as_deref()
            .ok_or_else(|| malformed("missing date_gmt".to_string()))
            .and_then(|d| parse_utc(d).map_err(|e| malformed(e.to_string())))?;

        Ok(EpisodeRecord {
            id,
            status: raw.status.as_deref().map(PublishStatus::from).unwrap_or(PublishStatus::Other(String::new())),
            title: raw.title.rendered.unwrap_or_default(),
            excerpt: raw.excerpt.rendered.unwrap_or_default(),
            audio_url: raw.mp3,
            image_url: raw.main_image,
            link: raw.link,
            date,
            date_gmt,
        })
    }
}

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Parse a site-local timestamp. An explicit offset is accepted and kept as
/// wall-clock time in that offset.
pub fn parse_local(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local());
    }
    parse_naive(raw)
}

/// Parse a UTC timestamp. A timestamp without an offset is taken to be UTC.
pub fn parse_utc(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    parse_naive(raw).map(|n| n.and_utc())
}

fn parse_naive(raw: &str) -> Result<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .ok_or_else(|| FeedError::InvalidDate { value: raw.to_string() })
}

/// An episode after selection and ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEpisode {
    pub record: EpisodeRecord,
    /// `total` for the newest episode down to 1 for the oldest.
    pub episode_number: usize,
    /// Years between the reference year and this episode's year.
    pub season_offset: i32,
    /// Plain text pulled out of the excerpt, or the title.
    pub short_description: String,
    pub sanitized_title: String,
    pub sanitized_link: String,
    pub sanitized_image_url: String,
}

impl RankedEpisode {
    /// Original audio URL, if the record has a non-empty one.
    pub fn audio_url(&self) -> Option<&str> {
        self.record.audio_url.as_deref().filter(|u| !u.trim().is_empty())
    }

    /// Whether this episode is emitted as a feed item.
    pub fn is_eligible(&self) -> bool {
        self.audio_url().is_some()
    }
}
