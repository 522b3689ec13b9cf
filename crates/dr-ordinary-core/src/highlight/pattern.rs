//! Word sets and the whole-word match pattern built from them.

use regex::{Regex, RegexBuilder};

use super::{HighlightError, HighlightResult};

/// Deduplicated, lower-cased set of names to search for in one scan pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordSet {
    words: Vec<String>,
}

impl WordSet {
    /// Build a word set, trimming, lower-casing and dropping empty entries.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for word in words {
            let normalized = word.as_ref().trim().to_lowercase();
            if !normalized.is_empty() && !out.contains(&normalized) {
                out.push(normalized);
            }
        }
        Self { words: out }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn contains(&self, word: &str) -> bool {
        let lower = word.trim().to_lowercase();
        self.words.iter().any(|w| *w == lower)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for WordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// A single match inside one text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Byte offset of the first matched byte
    pub start: usize,
    /// Byte offset one past the last matched byte
    pub end: usize,
    /// Matched text with its original casing
    pub text: String,
}

/// Case-insensitive whole-word alternation over a [`WordSet`].
#[derive(Debug, Clone)]
pub struct MatchPattern {
    regex: Regex,
}

impl MatchPattern {
    pub fn new(words: &WordSet) -> HighlightResult<Self> {
        if words.is_empty() {
            return Err(HighlightError::EmptyWordSet);
        }

        // Longest first, so a phrase wins over its own prefix at the same offset.
        let mut ordered: Vec<&str> = words.iter().collect();
        ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternation = ordered
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");
        let source = format!(r"\b(?:{alternation})\b");

        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// All non-overlapping matches in `text`, in order.
    pub fn find_all(&self, text: &str) -> Vec<Match> {
        self.regex
            .find_iter(text)
            .map(|m| Match {
                start: m.start(),
                end: m.end(),
                text: m.as_str().to_owned(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_set_normalizes_and_dedups() {
        let set = WordSet::new(["Aspirin", " aspirin ", "", "  ", "WARFARIN"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("aspirin"));
        assert!(set.contains("Warfarin"));
    }

    #[test]
    fn test_pattern_is_case_insensitive_and_whole_word() {
        let pattern = MatchPattern::new(&WordSet::new(["aspirin"])).unwrap();

        assert_eq!(pattern.find_all("Aspirin").len(), 1);
        assert_eq!(pattern.find_all("ASPIRIN").len(), 1);
        assert!(pattern.find_all("aspirins").is_empty());
        assert!(pattern.find_all("baspirin").is_empty());
    }

    #[test]
    fn test_pattern_escapes_metacharacters() {
        let pattern = MatchPattern::new(&WordSet::new(["vitamin b.12"])).unwrap();
        assert_eq!(pattern.find_all("take vitamin b.12 daily").len(), 1);
        assert!(pattern.find_all("take vitamin bx12 daily").is_empty());
    }

    #[test]
    fn test_pattern_prefers_longer_phrase_at_same_offset() {
        let pattern =
            MatchPattern::new(&WordSet::new(["ibuprofen", "ibuprofen sodium"])).unwrap();

        let matches = pattern.find_all("ibuprofen sodium and ibuprofen");
        let texts: Vec<&str> = matches.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["ibuprofen sodium", "ibuprofen"]);
    }

    #[test]
    fn test_match_offsets_keep_original_casing() {
        let pattern = MatchPattern::new(&WordSet::new(["warfarin"])).unwrap();
        let matches = pattern.find_all("On Warfarin now");
        assert_eq!(
            matches,
            vec![Match {
                start: 3,
                end: 11,
                text: "Warfarin".into()
            }]
        );
    }

    #[test]
    fn test_empty_word_set_has_no_pattern() {
        assert!(matches!(
            MatchPattern::new(&WordSet::default()),
            Err(HighlightError::EmptyWordSet)
        ));
    }
}
