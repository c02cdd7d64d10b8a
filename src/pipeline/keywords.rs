//! Case-insensitive keyword sets.

use std::sync::LazyLock;

use regex::RegexSet;

/// Keywords whose presence signals alignment with the mission.
pub const MISSION_KEYWORDS: [&str; 5] = ["privacy", "security", "rights", "accessibility", "ethics"];

/// Phrases the monitor watches for when deciding whether a record is relevant.
pub const WATCH_PHRASES: [&str; 9] = [
    "privacy breach",
    "security vulnerability",
    "data leak",
    "ai ethics",
    "platform accountability",
    "digital rights",
    "accessibility",
    "open source",
    "regulation",
];

pub(crate) static MISSION: LazyLock<KeywordSet> = LazyLock::new(|| {
    KeywordSet::new(&MISSION_KEYWORDS).expect("escaped literal keywords always compile")
});

pub(crate) static WATCH: LazyLock<KeywordSet> = LazyLock::new(|| {
    KeywordSet::new(&WATCH_PHRASES).expect("escaped literal phrases always compile")
});

/// A set of literal keywords matched case-insensitively as substrings.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    set: RegexSet,
}

impl KeywordSet {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Result<Self, regex::Error> {
        let patterns = keywords
            .iter()
            .map(|k| format!("(?i){}", regex::escape(k.as_ref())));
        Ok(Self {
            set: RegexSet::new(patterns)?,
        })
    }

    /// Number of distinct keywords present in `text`. Repeats count once.
    pub fn hits(&self, text: &str) -> usize {
        self.set.matches(text).iter().count()
    }

    pub fn any(&self, text: &str) -> bool {
        self.set.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_are_case_insensitive_and_distinct() {
        let text = "PRIVACY matters. Privacy again, and Security too.";
        assert_eq!(MISSION.hits(text), 2);
    }

    #[test]
    fn keywords_match_inside_words() {
        // "rights" inside "copyrights" still counts, like a substring check
        assert_eq!(MISSION.hits("copyrights"), 1);
    }

    #[test]
    fn keyword_metacharacters_are_literal() {
        let set = KeywordSet::new(&["c++", "a.b"]).unwrap();
        assert_eq!(set.hits("I write C++"), 1);
        assert!(!set.any("axb"));
    }

    #[test]
    fn watch_phrases_match_multiword() {
        assert!(WATCH.any("A new Data Leak was reported"));
        assert!(!WATCH.any("weather forecast"));
    }
}
