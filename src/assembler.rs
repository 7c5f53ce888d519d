//! Builds the document tree for one feed variant.

use chrono::{DateTime, Utc};

use crate::config::ChannelConfig;
use crate::error::Result;
use crate::model::{FeedVariant, RankedEpisode};
use crate::resolver::AudioUrlResolver;
use crate::sanitize::to_base36;

pub const EPISODE_TYPE: &str = "full";
pub const AUDIO_MIME_TYPE: &str = "audio/mpeg";
pub const PODCAST_TYPE: &str = "serial";

/// Channel header. Identical for both variants.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelHeader {
    pub title: String,
    pub link: String,
    pub language: String,
    pub copyright: String,
    pub author: String,
    pub description: String,
    pub podcast_type: &'static str,
    pub summary: String,
    pub owner_name: String,
    pub owner_email: String,
    pub image_url: String,
    pub category: String,
    pub subcategory: String,
}

impl ChannelHeader {
    /// Build a fresh header from configuration.
    pub fn from_config(config: &ChannelConfig) -> Self {
        Self {
            title: config.title.clone(),
            link: config.link.clone(),
            language: config.language.clone(),
            copyright: config.copyright.clone(),
            author: config.author.clone(),
            description: config.description.clone(),
            podcast_type: PODCAST_TYPE,
            summary: config.summary.clone().unwrap_or_else(|| config.description.clone()),
            owner_name: config.owner_name.clone(),
            owner_email: config.owner_email.clone(),
            image_url: config.image_url.clone(),
            category: config.category.clone(),
            subcategory: config.subcategory.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enclosure {
    pub url: String,
    pub mime_type: &'static str,
}

/// One `<item>`.
///
/// `title` is the rendered title as stored; `image_href` and `link` are
/// already entity-encoded. All of them are written verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub episode_type: &'static str,
    pub episode: usize,
    pub season: i32,
    pub title: String,
    /// Emitted as CDATA.
    pub description: String,
    pub image_href: String,
    pub link: String,
    pub enclosure: Enclosure,
    pub guid: String,
    pub pub_date: DateTime<Utc>,
    pub explicit: bool,
}

/// Complete tree for one variant, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedDocument {
    pub variant: FeedVariant,
    pub header: ChannelHeader,
    pub last_build_date: DateTime<Utc>,
    pub items: Vec<FeedItem>,
}

/// Assemble one variant from the ranked episodes, keeping their order.
///
/// Ineligible episodes are skipped without renumbering. The resolver is only
/// consulted for [`FeedVariant::Private`].
pub fn assemble<R>(
    ranked: &[RankedEpisode],
    variant: FeedVariant,
    header: ChannelHeader,
    last_build_date: DateTime<Utc>,
    resolver: &R,
) -> Result<FeedDocument>
where
    R: AudioUrlResolver + ?Sized,
{
    let mut items = Vec::with_capacity(ranked.len());
    for episode in ranked {
        if let Some(item) = build_item(episode, variant, resolver)? {
            items.push(item);
        }
    }

    Ok(FeedDocument {
        variant,
        header,
        last_build_date,
        items,
    })
}

/// Build the item for one episode. Everything except the enclosure URL is
/// independent of `variant`.
pub fn build_item<R>(episode: &RankedEpisode, variant: FeedVariant, resolver: &R) -> Result<Option<FeedItem>>
where
    R: AudioUrlResolver + ?Sized,
{
    let Some(audio_url) = episode.audio_url() else {
        return Ok(None);
    };

    let enclosure_url = match variant {
        FeedVariant::Public => audio_url.to_string(),
        FeedVariant::Private => resolver.resolve(audio_url)?,
    };

    let description = if episode.short_description.is_empty() {
        episode.record.title.clone()
    } else {
        episode.short_description.clone()
    };

    Ok(Some(FeedItem {
        episode_type: EPISODE_TYPE,
        episode: episode.episode_number,
        season: episode.season_offset,
        title: episode.record.title.clone(),
        description,
        image_href: episode.sanitized_image_url.clone(),
        link: episode.sanitized_link.clone(),
        enclosure: Enclosure {
            url: enclosure_url,
            mime_type: AUDIO_MIME_TYPE,
        },
        guid: to_base36(episode.record.id),
        pub_date: episode.record.date_gmt,
        explicit: false,
    }))
}
