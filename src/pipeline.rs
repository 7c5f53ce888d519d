//! One feed rebuild: fetch, rank, assemble both variants, render, publish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::assembler::{assemble, ChannelHeader};
use crate::config::ChannelConfig;
use crate::error::Result;
use crate::model::{FeedVariant, RankedEpisode};
use crate::ranker::rank;
use crate::render::render;
use crate::resolver::AudioUrlResolver;
use crate::source::{validate, EpisodeSource};

/// The two rendered documents of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPair {
    pub public: String,
    pub private: String,
}

impl FeedPair {
    pub fn get(&self, variant: FeedVariant) -> &str {
        match variant {
            FeedVariant::Public => &self.public,
            FeedVariant::Private => &self.private,
        }
    }
}

/// Render both variants from one ranked list and one build timestamp.
///
/// Nothing is returned unless both documents rendered.
pub fn build_pair<R>(
    ranked: &[RankedEpisode],
    channel: &ChannelConfig,
    built_at: DateTime<Utc>,
    resolver: &R,
) -> Result<FeedPair>
where
    R: AudioUrlResolver + ?Sized,
{
    let public = assemble(ranked, FeedVariant::Public, ChannelHeader::from_config(channel), built_at, resolver)?;
    let private = assemble(ranked, FeedVariant::Private, ChannelHeader::from_config(channel), built_at, resolver)?;
    Ok(FeedPair {
        public: render(&public)?,
        private: render(&private)?,
    })
}

/// Rebuilds both feeds from a source.
pub struct FeedPipeline<S, R> {
    source: S,
    resolver: R,
    channel: ChannelConfig,
    next_seq: AtomicU64,
}

impl<S, R> FeedPipeline<S, R>
where
    S: EpisodeSource,
    R: AudioUrlResolver,
{
    pub fn new(source: S, resolver: R, channel: ChannelConfig) -> Self {
        Self {
            source,
            resolver,
            channel,
            next_seq: AtomicU64::new(1),
        }
    }

    /// Build both documents from a fresh snapshot of the source.
    pub fn run(&self) -> Result<FeedPair> {
        let (fetched, ranked) = self.snapshot()?;
        let eligible = ranked.iter().filter(|e| e.is_eligible()).count();

        let pair = build_pair(&ranked, &self.channel, Utc::now(), &self.resolver)?;
        info!(
            "rebuilt feeds: {} record(s) fetched, {} ranked, {} item(s) per feed",
            fetched,
            ranked.len(),
            eligible
        );
        Ok(pair)
    }

    /// Build only `variant`. The resolver is consulted only for the private feed.
    pub fn run_variant(&self, variant: FeedVariant) -> Result<String> {
        let (fetched, ranked) = self.snapshot()?;
        let header = ChannelHeader::from_config(&self.channel);
        let doc = assemble(&ranked, variant, header, Utc::now(), &self.resolver)?;
        info!(
            "rebuilt {:?} feed: {} record(s) fetched, {} ranked, {} item(s)",
            variant,
            fetched,
            ranked.len(),
            doc.items.len()
        );
        render(&doc)
    }

    fn snapshot(&self) -> Result<(usize, Vec<RankedEpisode>)> {
        let raw = self.source.fetch()?;
        let fetched = raw.len();
        Ok((fetched, rank(validate(raw))?))
    }

    /// Run and hand the result to `store`.
    ///
    /// The run sequence is taken before fetching, so a slow run that finishes
    /// after a newer one is discarded by the store. On error the store keeps
    /// whatever it already had.
    pub fn run_and_publish(&self, store: &FeedStore) -> Result<u64> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let pair = self.run()?;
        store.publish(seq, pair);
        Ok(seq)
    }
}

#[derive(Debug)]
struct Snapshot {
    seq: u64,
    feeds: Arc<FeedPair>,
}

/// Latest published pair of documents, replaced as a unit.
#[derive(Debug, Default)]
pub struct FeedStore {
    latest: Mutex<Option<Snapshot>>,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `feeds` unless a run with a higher sequence was already stored.
    /// Returns whether the pair was accepted.
    pub fn publish(&self, seq: u64, feeds: FeedPair) -> bool {
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = latest.as_ref() {
            if current.seq >= seq {
                debug!(seq, current = current.seq, "discarding stale feed run");
                return false;
            }
        }
        *latest = Some(Snapshot {
            seq,
            feeds: Arc::new(feeds),
        });
        true
    }

    /// Both documents from the latest accepted run.
    pub fn latest(&self) -> Option<Arc<FeedPair>> {
        let latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        latest.as_ref().map(|s| Arc::clone(&s.feeds))
    }

    /// Sequence number of the latest accepted run.
    pub fn latest_seq(&self) -> Option<u64> {
        let latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        latest.as_ref().map(|s| s.seq)
    }
}
