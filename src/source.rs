//! Episode record sources.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::{debug, warn};
use url::Url;

use crate::error::Result;
use crate::model::{EpisodeRecord, RawEpisode};

/// Read-only query returning every published episode record in one snapshot.
pub trait EpisodeSource {
    fn fetch(&self) -> Result<Vec<RawEpisode>>;
}

impl<S: EpisodeSource + ?Sized> EpisodeSource for &S {
    fn fetch(&self) -> Result<Vec<RawEpisode>> {
        (**self).fetch()
    }
}

/// In-memory records, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<RawEpisode>,
}

impl StaticSource {
    pub fn new(records: Vec<RawEpisode>) -> Self {
        Self { records }
    }
}

impl EpisodeSource for StaticSource {
    fn fetch(&self) -> Result<Vec<RawEpisode>> {
        Ok(self.records.clone())
    }
}

/// A JSON file holding an array of records.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl EpisodeSource for JsonFileSource {
    fn fetch(&self) -> Result<Vec<RawEpisode>> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// An HTTP endpoint returning a JSON array of records.
pub struct HttpEpisodeSource {
    client: Client,
    url: Url,
}

impl HttpEpisodeSource {
    pub fn new(url: &str, timeout_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            url: Url::parse(url)?,
        })
    }
}

impl EpisodeSource for HttpEpisodeSource {
    fn fetch(&self) -> Result<Vec<RawEpisode>> {
        debug!(url = %self.url, "fetching episode records");
        let resp = self
            .client
            .get(self.url.as_str())
            .header(USER_AGENT, concat!("podfeed/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/json")
            .send()?
            .error_for_status()?;
        let body = resp.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Open a source from a CLI argument: `http(s)://` URLs go over the network,
/// anything else is read as a file path.
pub fn open(location: &str, timeout_ms: u64) -> Result<Box<dyn EpisodeSource>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpEpisodeSource::new(location, timeout_ms)?))
    } else {
        Ok(Box::new(JsonFileSource::new(location)))
    }
}

/// Convert raw records, skipping malformed ones with a warning.
pub fn validate(raw: Vec<RawEpisode>) -> Vec<EpisodeRecord> {
    let total = raw.len();
    let records: Vec<EpisodeRecord> = raw
        .into_iter()
        .filter_map(|r| match EpisodeRecord::try_from(r) {
            Ok(rec) => Some(rec),
            Err(e) => {
                warn!("skipping record: {}", e);
                None
            }
        })
        .collect();
    if records.len() < total {
        warn!("skipped {} of {} record(s)", total - records.len(), total);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const RECORDS: &str = r#"[
        {"id": 1, "status": "publish", "title": {"rendered": "One"}, "excerpt": {"rendered": ""},
         "mp3": "https://a/1.mp3", "date": "2022-01-01T00:00:00", "date_gmt": "2022-01-01T00:00:00"},
        {"id": 2, "status": "publish", "title": {"rendered": "Two"},
         "mp3": null, "date": "2022-02-01T00:00:00"},
        {"status": "publish", "title": {"rendered": "No id"},
         "date": "2022-03-01T00:00:00", "date_gmt": "2022-03-01T00:00:00"}
    ]"#;

    #[test]
    fn file_source_reads_array() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(RECORDS.as_bytes()).unwrap();
        let raw = JsonFileSource::new(file.path()).fetch().unwrap();
        assert_eq!(raw.len(), 3);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let raw: Vec<RawEpisode> = serde_json::from_str(RECORDS).unwrap();
        let records = validate(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 1);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        assert!(matches!(JsonFileSource::new(file.path()).fetch(), Err(FeedError::Json(_))));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(matches!(
            JsonFileSource::new("/nonexistent/episodes.json").fetch(),
            Err(FeedError::Io(_))
        ));
    }

    #[test]
    fn open_picks_source_by_scheme() {
        assert!(open("episodes.json", 1000).is_ok());
        assert!(open("https://example.com/wp-json/episodes", 1000).is_ok());
    }
}
