//! Placeholder text for synthesized records.
//!
//! Nothing downstream parses the generated prose; it only has to look like
//! something a person might post. [`TextSource`] is the seam, [`Lexicon`] the
//! default word-list implementation.

use rand::Rng;
use rand::seq::IndexedRandom;

/// Produces plausible strings for synthetic records.
pub trait TextSource: Send + Sync {
    /// A short sentence, capitalized and terminated with a period.
    fn sentence(&self) -> String;

    /// An account handle such as `quietfox42`.
    fn user_name(&self) -> String;

    /// A display name such as `Maria Lindqvist`.
    fn full_name(&self) -> String;
}

const WORDS: &[&str] = &[
    "about", "after", "again", "all", "always", "and", "another", "around", "back", "bad",
    "because", "before", "best", "better", "both", "bring", "call", "came", "can", "cannot",
    "coffee", "could", "day", "did", "done", "down", "every", "feel", "find", "first", "friday",
    "friends", "funny", "game", "getting", "gonna", "good", "great", "happy", "have", "here",
    "home", "honestly", "know", "last", "late", "later", "life", "like", "literally", "little",
    "long", "look", "love", "made", "make", "many", "maybe", "miss", "more", "morning", "much",
    "music", "need", "never", "new", "night", "nothing", "now", "off", "old", "only", "other",
    "people", "play", "pretty", "probably", "really", "right", "said", "same", "school", "see",
    "show", "sleep", "some", "soon", "still", "such", "summer", "sure", "take", "tell", "than",
    "thing", "think", "this", "time", "today", "tomorrow", "tonight", "too", "try", "very",
    "want", "watch", "weekend", "well", "what", "when", "why", "with", "work", "world", "would",
    "year", "yes", "yesterday",
];

const ADJECTIVES: &[&str] = &[
    "amber", "bold", "brave", "breezy", "calm", "clever", "cosmic", "crimson", "dizzy", "eager",
    "fancy", "fuzzy", "gentle", "golden", "happy", "hidden", "jolly", "lucky", "mellow", "misty",
    "noble", "quiet", "rapid", "rusty", "silent", "sleepy", "snowy", "sunny", "tiny", "wild",
];

const NOUNS: &[&str] = &[
    "badger", "bear", "comet", "coyote", "dragon", "falcon", "fox", "gecko", "harbor", "hawk",
    "island", "koala", "lantern", "lynx", "meadow", "moose", "otter", "owl", "panda", "pebble",
    "pixel", "raven", "river", "rocket", "sparrow", "tiger", "turtle", "walrus", "whale", "wolf",
];

const FIRST_NAMES: &[&str] = &[
    "Aaliyah", "Ahmed", "Aiko", "Alex", "Amara", "Ana", "Ben", "Carlos", "Chen", "Chloe",
    "Daniel", "Elena", "Emma", "Fatima", "Grace", "Hana", "Isabel", "Jamal", "Jordan", "Kai",
    "Leila", "Liam", "Lucas", "Maria", "Mateo", "Mei", "Noah", "Olivia", "Priya", "Sam",
    "Sofia", "Tariq", "Yuki", "Zoe",
];

const LAST_NAMES: &[&str] = &[
    "Adeyemi", "Alvarez", "Brown", "Chen", "Costa", "Dubois", "Garcia", "Haddad", "Ivanova",
    "Johnson", "Kim", "Kowalski", "Lindqvist", "Martin", "Moreau", "Nakamura", "Nguyen",
    "Okafor", "Patel", "Rossi", "Schmidt", "Silva", "Smith", "Tanaka", "Williams", "Yilmaz",
];

/// Word-list backed [`TextSource`] using the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lexicon;

impl Lexicon {
    /// Create a lexicon.
    pub const fn new() -> Self {
        Self
    }
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, list: &[&'a str]) -> &'a str {
    list.choose(rng).copied().unwrap_or_default()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl TextSource for Lexicon {
    fn sentence(&self) -> String {
        let mut rng = rand::rng();
        let len = rng.random_range(4..=10_usize);
        let words: Vec<&str> = (0..len).map(|_| pick(&mut rng, WORDS)).collect();
        let body = words.join(" ");
        format!("{}.", capitalize(&body))
    }

    fn user_name(&self) -> String {
        let mut rng = rand::rng();
        let suffix: u16 = rng.random_range(0..1000);
        format!(
            "{}{}{suffix}",
            pick(&mut rng, ADJECTIVES),
            pick(&mut rng, NOUNS)
        )
    }

    fn full_name(&self) -> String {
        let mut rng = rand::rng();
        format!(
            "{} {}",
            pick(&mut rng, FIRST_NAMES),
            pick(&mut rng, LAST_NAMES)
        )
    }
}
