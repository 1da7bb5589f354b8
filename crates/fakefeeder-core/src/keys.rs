//! Store key and channel names.
//!
//! Downstream consumers subscribe to and read these exact names.
//!
//! | Name | Type | Description |
//! |------|------|-------------|
//! | `emojitrack_score` | Sorted set | member = glyph id, score = cumulative count |
//! | `stream.score_updates` | Channel | glyph id, once per update |
//! | `emojitrack_tweets_{id}` | List | latest 10 records, most recent first |
//! | `stream.tweet_updates.{id}` | Channel | serialized record, once per update |

/// Sorted set of glyph scores.
pub const SCORE_KEY: &str = "emojitrack_score";

/// Channel announcing which glyph's score changed.
pub const SCORE_CHANNEL: &str = "stream.score_updates";

/// Prefix of the per-glyph history lists.
pub const HISTORY_KEY_PREFIX: &str = "emojitrack_tweets_";

/// Prefix of the per-glyph record channels.
pub const RECORD_CHANNEL_PREFIX: &str = "stream.tweet_updates.";

/// Maximum number of records kept in each history list.
pub const HISTORY_LIMIT: usize = 10;

/// History list key for `glyph_id`.
pub fn history_key(glyph_id: &str) -> String {
    format!("{HISTORY_KEY_PREFIX}{glyph_id}")
}

/// Record channel for `glyph_id`.
pub fn record_channel(glyph_id: &str) -> String {
    format!("{RECORD_CHANNEL_PREFIX}{glyph_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_glyph_names() {
        assert_eq!(history_key("1F602"), "emojitrack_tweets_1F602");
        assert_eq!(record_channel("1F602"), "stream.tweet_updates.1F602");
    }
}
