//! Synthetic update records.
//!
//! An [`UpdateRecord`] is the compact payload downstream consumers already
//! understand: the same JSON field names the real feeder publishes for each
//! matched post. The [`Synthesizer`] owns the id counter, so two synthesizers
//! never share state and concurrent callers on one synthesizer always get
//! distinct ids.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lexicon::{Lexicon, TextSource};
use crate::ranking::RankingEntry;

/// First id handed out is this value plus [`RECORD_ID_STEP`].
///
/// Roughly where real status ids were when the feeder was first written.
pub const INITIAL_RECORD_ID: u64 = 769_706_198_425_825_280;

/// Amount the id counter advances on every synthesis.
pub const RECORD_ID_STEP: u64 = 42;

/// Avatar used when none is configured.
pub const DEFAULT_AVATAR_URL: &str =
    "https://abs.twimg.com/sticky/default_profile_images/default_profile_normal.png";

/// One synthetic activity record, as published to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecord {
    /// Stringified id from the synthesizer's counter.
    pub id: String,
    /// Generated sentence followed by the glyph.
    pub text: String,
    /// Placeholder account handle.
    #[serde(rename = "screen_name")]
    pub author_handle: String,
    /// Placeholder display name.
    #[serde(rename = "name")]
    pub author_name: String,
    /// Always empty for synthetic records.
    pub links: Vec<String>,
    /// Avatar image URL.
    #[serde(rename = "profile_image_url")]
    pub avatar_url: String,
    /// Wall-clock time of synthesis.
    pub created_at: DateTime<Utc>,
}

impl UpdateRecord {
    /// Serialize to the compact JSON wire format.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the record cannot be represented.
    /// Callers treat this as fatal.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Builds [`UpdateRecord`]s for ranking entries.
pub struct Synthesizer {
    last_id: AtomicU64,
    avatar_url: String,
    text: Box<dyn TextSource>,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Synthesizer {
    /// A synthesizer with the default counter start, avatar, and [`Lexicon`].
    pub fn new() -> Self {
        Self {
            last_id: AtomicU64::new(INITIAL_RECORD_ID),
            avatar_url: DEFAULT_AVATAR_URL.to_owned(),
            text: Box::new(Lexicon::new()),
        }
    }

    /// Start the counter at `last_id`; the first record gets `last_id + 42`.
    #[must_use]
    pub fn starting_at(self, last_id: u64) -> Self {
        Self {
            last_id: AtomicU64::new(last_id),
            ..self
        }
    }

    /// Use a different avatar URL for every record.
    #[must_use]
    pub fn with_avatar_url(self, avatar_url: impl Into<String>) -> Self {
        Self {
            avatar_url: avatar_url.into(),
            ..self
        }
    }

    /// Replace the text generator.
    #[must_use]
    pub fn with_text_source(self, text: Box<dyn TextSource>) -> Self {
        Self { text, ..self }
    }

    /// The most recently issued id (or the start value if none yet).
    pub fn last_id(&self) -> u64 {
        self.last_id.load(Ordering::Relaxed)
    }

    /// Synthesize a record for `entry`, advancing the id counter.
    pub fn synthesize(&self, entry: &RankingEntry) -> UpdateRecord {
        let id = self
            .last_id
            .fetch_add(RECORD_ID_STEP, Ordering::Relaxed)
            .wrapping_add(RECORD_ID_STEP);

        UpdateRecord {
            id: id.to_string(),
            text: format!("{} {}", self.text.sentence(), entry.glyph),
            author_handle: self.text.user_name(),
            author_name: self.text.full_name(),
            links: Vec::new(),
            avatar_url: self.avatar_url.clone(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use super::*;

    struct FixedText;

    impl TextSource for FixedText {
        fn sentence(&self) -> String {
            String::from("Best coffee ever.")
        }
        fn user_name(&self) -> String {
            String::from("sunnyotter7")
        }
        fn full_name(&self) -> String {
            String::from("Mei Tanaka")
        }
    }

    fn fire() -> RankingEntry {
        RankingEntry::new("🔥", "1F525", "FIRE", 12)
    }

    #[test]
    fn ids_advance_by_fixed_step() {
        let synth = Synthesizer::new();
        let first = synth.synthesize(&fire());
        let second = synth.synthesize(&fire());

        let a: u64 = first.id.parse().expect("numeric id");
        let b: u64 = second.id.parse().expect("numeric id");
        assert_eq!(a, INITIAL_RECORD_ID + RECORD_ID_STEP);
        assert_eq!(b, a + RECORD_ID_STEP);
        assert_eq!(synth.last_id(), b);
    }

    #[test]
    fn counters_are_per_instance() {
        let a = Synthesizer::new().starting_at(0);
        let b = Synthesizer::new().starting_at(0);
        assert_eq!(a.synthesize(&fire()).id, "42");
        assert_eq!(a.synthesize(&fire()).id, "84");
        assert_eq!(b.synthesize(&fire()).id, "42");
    }

    #[test]
    fn record_fields_follow_entry_and_defaults() {
        let synth = Synthesizer::new().with_text_source(Box::new(FixedText));
        let before = Utc::now();
        let record = synth.synthesize(&fire());

        assert_eq!(record.text, "Best coffee ever. 🔥");
        assert_eq!(record.author_handle, "sunnyotter7");
        assert_eq!(record.author_name, "Mei Tanaka");
        assert!(record.links.is_empty());
        assert_eq!(record.avatar_url, DEFAULT_AVATAR_URL);
        assert!(record.created_at >= before);
    }

    #[test]
    fn avatar_url_is_overridable() {
        let synth = Synthesizer::new().with_avatar_url("https://example.test/a.png");
        assert_eq!(synth.synthesize(&fire()).avatar_url, "https://example.test/a.png");
    }

    #[test]
    fn wire_format_uses_stable_field_names() {
        let synth = Synthesizer::new()
            .starting_at(0)
            .with_text_source(Box::new(FixedText));
        let encoded = synth.synthesize(&fire()).encode().expect("encodable");
        let value: serde_json::Value = serde_json::from_str(&encoded).expect("valid json");

        let obj = value.as_object().expect("json object");
        let keys: BTreeSet<&str> = obj.keys().map(String::as_str).collect();
        let expected: BTreeSet<&str> = [
            "id",
            "text",
            "screen_name",
            "name",
            "links",
            "profile_image_url",
            "created_at",
        ]
        .into_iter()
        .collect();
        assert_eq!(keys, expected);
        assert_eq!(value["id"], "42");
        assert_eq!(value["links"], serde_json::json!([]));
        assert!(value["created_at"].as_str().is_some_and(|s| s.contains('T')));
    }

    #[test]
    fn concurrent_synthesis_yields_unique_ids() {
        let synth = Arc::new(Synthesizer::new().starting_at(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let synth = Arc::clone(&synth);
                std::thread::spawn(move || {
                    (0..250)
                        .map(|_| synth.synthesize(&fire()).id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = BTreeSet::new();
        for handle in handles {
            for id in handle.join().expect("thread finished") {
                assert!(ids.insert(id), "duplicate id");
            }
        }
        assert_eq!(ids.len(), 2000);
        assert_eq!(synth.last_id(), 2000 * RECORD_ID_STEP);
    }
}
