//! podfeed rebuilds a public podcast feed and an ad-free private feed from
//! published episode records.
//!
//! A run fetches one snapshot of records, ranks them newest first, assembles
//! both variants from the same ranked list and renders them as RSS 2.0.
//! The two documents differ only in enclosure URLs.

pub mod assembler;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod ranker;
pub mod render;
pub mod resolver;
pub mod sanitize;
pub mod source;

pub use assembler::{assemble, ChannelHeader, Enclosure, FeedDocument, FeedItem};
pub use config::Config;
pub use error::{FeedError, Result};
pub use model::{EpisodeRecord, FeedVariant, PublishStatus, RankedEpisode, RawEpisode};
pub use pipeline::{build_pair, FeedPair, FeedPipeline, FeedStore};
pub use ranker::rank;
pub use render::render;
pub use resolver::{AudioUrlResolver, RewriteResolver};
pub use sanitize::{decode, encode};
pub use source::{EpisodeSource, HttpEpisodeSource, JsonFileSource, StaticSource};
