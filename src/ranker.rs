//! Episode selection, ordering and numbering.

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{FeedError, Result};
use crate::model::{EpisodeRecord, PublishStatus, RankedEpisode};
use crate::sanitize::{decode, encode, encode_opt};

// Text right before the trailing download link, e.g. "... Download MyShow Ep 1<br>"
static RE_DOWNLOAD_DESC: Lazy<Regex> = Lazy::new(|| Regex::new(r" Download (.*?)<").unwrap());
// First tag-delimited text span
static RE_FIRST_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r">(.*?)<").unwrap());

/// Select publishable records and rank them newest first.
///
/// The newest episode gets number `total`, the oldest gets 1. Episodes without
/// audio keep their slot so numbers stay stable across runs; they are only
/// skipped when items are emitted.
///
/// The season reference year is the UTC year of whichever record ends up at the
/// head of the sorted list, not the calendar maximum. The WordPress cron job
/// this replaces read the year from the *last* record instead, which numbers
/// seasons 0, -1, -2 going back in time. Offsets here count up (0, 1, 2) and are
/// never negative; do not switch back to the tail.
pub fn rank(records: Vec<EpisodeRecord>) -> Result<Vec<RankedEpisode>> {
    let mut published: Vec<EpisodeRecord> = records
        .into_iter()
        .filter(|r| r.status == PublishStatus::Publish)
        .collect();

    // stable: equal timestamps keep input order
    published.sort_by(|a, b| b.date.cmp(&a.date));

    let season_year = published.first().ok_or(FeedError::EmptyInput)?.date_gmt.year();
    let total = published.len();

    let ranked = published
        .into_iter()
        .enumerate()
        .map(|(idx, record)| {
            let episode_number = total - idx;
            let season_offset = season_year - record.date_gmt.year();
            let short_description = extract_short_description(&record.excerpt, &record.title);
            if record.audio_url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                debug!(id = record.id, episode_number, "episode has no audio, it will not be emitted");
            }
            RankedEpisode {
                sanitized_title: encode(&record.title),
                sanitized_link: encode_opt(record.link.as_deref()),
                sanitized_image_url: encode_opt(record.image_url.as_deref()),
                short_description,
                episode_number,
                season_offset,
                record,
            }
        })
        .collect();

    Ok(ranked)
}

/// Pull a short plain-text description out of a rendered excerpt.
///
/// The download-link pattern wins whenever it matches; the first text span is
/// only consulted when it does not. An empty capture falls back to the title.
pub fn extract_short_description(excerpt: &str, title: &str) -> String {
    let captured = RE_DOWNLOAD_DESC
        .captures(excerpt)
        .or_else(|| RE_FIRST_SPAN.captures(excerpt))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty());

    match captured {
        Some(text) => decode(text),
        None => title.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_local;
    use crate::model::parse_utc;

    fn record(id: u64, date: &str, audio: Option<&str>) -> EpisodeRecord {
        EpisodeRecord {
            id,
            status: PublishStatus::Publish,
            title: format!("Episode {}", id),
            excerpt: format!("<p>About episode {}</p>", id),
            audio_url: audio.map(str::to_string),
            image_url: Some(format!("https://img.example.com/{}.png?a=1&b=2", id)),
            link: Some(format!("https://example.com/{}", id)),
            date: parse_local(date).unwrap(),
            date_gmt: parse_utc(date).unwrap(),
        }
    }

    #[test]
    fn worked_example_numbers_and_seasons() {
        let input = vec![
            record(1, "2021-03-01T00:00:00", Some("https://a/1.mp3")),
            record(3, "2023-01-01T00:00:00", Some("https://a/3.mp3")),
            record(2, "2022-06-01T00:00:00", Some("https://a/2.mp3")),
        ];
        let ranked = rank(input).unwrap();
        let ids: Vec<u64> = ranked.iter().map(|e| e.record.id).collect();
        let numbers: Vec<usize> = ranked.iter().map(|e| e.episode_number).collect();
        let seasons: Vec<i32> = ranked.iter().map(|e| e.season_offset).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(numbers, vec![3, 2, 1]);
        assert_eq!(seasons, vec![0, 1, 2]);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(rank(Vec::new()), Err(FeedError::EmptyInput)));
    }

    #[test]
    fn only_unpublished_input_is_an_error() {
        let mut draft = record(1, "2021-03-01T00:00:00", Some("https://a/1.mp3"));
        draft.status = PublishStatus::Draft;
        assert!(matches!(rank(vec![draft]), Err(FeedError::EmptyInput)));
    }

    #[test]
    fn non_published_records_are_filtered() {
        let mut draft = record(9, "2024-01-01T00:00:00", Some("https://a/9.mp3"));
        draft.status = PublishStatus::Draft;
        let input = vec![draft, record(1, "2021-03-01T00:00:00", Some("https://a/1.mp3"))];
        let ranked = rank(input).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].record.id, 1);
        assert_eq!(ranked[0].episode_number, 1);
    }

    #[test]
    fn missing_audio_still_consumes_a_number() {
        let input = vec![
            record(1, "2020-01-01T00:00:00", Some("https://a/1.mp3")),
            record(2, "2020-02-01T00:00:00", None),
            record(3, "2020-03-01T00:00:00", Some("")),
            record(4, "2020-04-01T00:00:00", Some("https://a/4.mp3")),
        ];
        let ranked = rank(input).unwrap();
        let numbers: Vec<usize> = ranked.iter().map(|e| e.episode_number).collect();
        assert_eq!(numbers, vec![4, 3, 2, 1]);
        let eligible: Vec<u64> = ranked.iter().filter(|e| e.is_eligible()).map(|e| e.record.id).collect();
        assert_eq!(eligible, vec![4, 1]);
    }

    #[test]
    fn numbers_are_contiguous_and_descending() {
        let input: Vec<EpisodeRecord> = (0..25u64)
            .map(|i| {
                let date = format!("20{:02}-0{}-15T12:00:00", 10 + (i * 7) % 13, 1 + i % 9);
                let audio = if i % 4 == 0 { None } else { Some("https://a/x.mp3") };
                record(i, &date, audio)
            })
            .collect();
        let ranked = rank(input).unwrap();
        for (idx, ep) in ranked.iter().enumerate() {
            assert_eq!(ep.episode_number, 25 - idx);
        }
        for pair in ranked.windows(2) {
            assert!(pair[0].record.date >= pair[1].record.date);
            assert!(pair[0].season_offset <= pair[1].season_offset);
        }
        assert!(ranked.iter().all(|e| e.season_offset >= 0));
    }

    #[test]
    fn ties_keep_input_order() {
        let input = vec![
            record(10, "2022-01-01T00:00:00", Some("https://a/10.mp3")),
            record(11, "2022-01-01T00:00:00", Some("https://a/11.mp3")),
        ];
        let ranked = rank(input).unwrap();
        assert_eq!(ranked[0].record.id, 10);
        assert_eq!(ranked[0].episode_number, 2);
        assert_eq!(ranked[1].record.id, 11);
    }

    #[test]
    fn season_year_comes_from_head_of_sort_order() {
        // local date orders the records; the head's UTC year is the reference
        let mut newest = record(2, "2022-01-01T00:00:00", Some("https://a/2.mp3"));
        newest.date_gmt = parse_utc("2021-12-31T19:00:00").unwrap();
        let mut older = record(1, "2021-12-31T22:00:00", Some("https://a/1.mp3"));
        older.date_gmt = parse_utc("2022-01-01T03:00:00").unwrap();
        let ranked = rank(vec![older, newest]).unwrap();
        assert_eq!(ranked[0].record.id, 2);
        assert_eq!(ranked[0].season_offset, 0);
        assert_eq!(ranked[1].season_offset, -1);
    }

    #[test]
    fn sanitized_fields_are_encoded() {
        let ranked = rank(vec![record(5, "2022-01-01T00:00:00", Some("https://a/5.mp3"))]).unwrap();
        assert_eq!(ranked[0].sanitized_image_url, "https://img.example.com/5.png?a=1&#038;b=2");
        assert_eq!(ranked[0].sanitized_link, "https://example.com/5");
    }

    #[test]
    fn description_from_download_link() {
        let excerpt = "<p>We talk about things. Download MyShow Ep 1<br></p>";
        assert_eq!(extract_short_description(excerpt, "Title"), "MyShow Ep 1");
    }

    #[test]
    fn description_from_first_span() {
        let excerpt = "<p>Kubernetes &amp; the cloud&nbsp;</p>\n<p>more</p>";
        assert_eq!(extract_short_description(excerpt, "Title"), "Kubernetes & the cloud");
    }

    #[test]
    fn description_falls_back_to_title() {
        assert_eq!(extract_short_description("plain text, no tags", "Title"), "Title");
        assert_eq!(extract_short_description("", "Title"), "Title");
        // the first span is empty, so the title wins
        assert_eq!(extract_short_description("<p><em>x</em></p>", "Title"), "Title");
    }

    #[test]
    fn download_pattern_is_decoded() {
        let excerpt = "<p>intro Download Q&amp;A Special<a href=\"x\">mp3</a></p>";
        assert_eq!(extract_short_description(excerpt, "Title"), "Q&A Special");
    }
}
