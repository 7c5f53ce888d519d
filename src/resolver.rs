//! Ad-free audio URL resolution for the private feed.

use url::Url;

use crate::config::AudioConfig;
use crate::error::{FeedError, Result};

/// Maps an episode's original audio URL to its ad-free counterpart.
///
/// Implementations must be deterministic. A failure aborts the whole run.
pub trait AudioUrlResolver {
    fn resolve(&self, url: &str) -> Result<String>;
}

impl<F> AudioUrlResolver for F
where
    F: Fn(&str) -> Result<String>,
{
    fn resolve(&self, url: &str) -> Result<String> {
        self(url)
    }
}

/// Swap a known URL prefix for the ad-free one.
///
/// An unconfigured resolver fails on the first enclosure it is asked for, so
/// only the private variant depends on `[audio]` being set.
#[derive(Debug, Clone, Default)]
pub struct RewriteResolver {
    prefixes: Option<(String, String)>,
}

impl RewriteResolver {
    pub fn new(from: &str, to: &str) -> Result<Self> {
        let from = from.trim();
        let to = to.trim();
        if from.is_empty() || to.is_empty() {
            return Err(FeedError::Config(
                "audio.ad_free_from and audio.ad_free_to must both be set".to_string(),
            ));
        }
        Url::parse(from)?;
        Url::parse(to)?;
        Ok(Self {
            prefixes: Some((from.to_string(), to.to_string())),
        })
    }

    /// Unconfigured when `[audio]` is left unset. Setting only one prefix is an error.
    pub fn from_config(config: &AudioConfig) -> Result<Self> {
        if config.ad_free_from.trim().is_empty() && config.ad_free_to.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::new(&config.ad_free_from, &config.ad_free_to)
    }

    pub fn is_configured(&self) -> bool {
        self.prefixes.is_some()
    }
}

impl AudioUrlResolver for RewriteResolver {
    fn resolve(&self, url: &str) -> Result<String> {
        let (from, to) = self.prefixes.as_ref().ok_or_else(|| FeedError::AudioResolution {
            url: url.to_string(),
            reason: "no ad-free rewrite configured under [audio]".to_string(),
        })?;
        let rest = url.strip_prefix(from.as_str()).ok_or_else(|| FeedError::AudioResolution {
            url: url.to_string(),
            reason: format!("does not start with {}", from),
        })?;
        let rewritten = format!("{}{}", to, rest);
        Url::parse(&rewritten).map_err(|e| FeedError::AudioResolution {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(rewritten)
    }
}
