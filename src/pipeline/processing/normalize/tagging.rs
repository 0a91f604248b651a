//! Word-level language capabilities used to disambiguate schedule letters.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{Result, ScraperError};

/// Coarse part-of-speech classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosTag {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Adposition,
    Conjunction,
    Determiner,
    Pronoun,
    Numeral,
    Particle,
}

/// Tags a single word out of context.
pub trait Tagger: Send + Sync {
    fn tag(&self, word: &str) -> PosTag;
}

/// Membership test against a reference list of ordinary English words.
pub trait WordSet: Send + Sync {
    fn contains(&self, word: &str) -> bool;
}

/// Closed-class lexicon backed by English suffix rules; anything else is
/// tagged as a noun.
#[derive(Debug, Clone)]
pub struct LexiconTagger {
    lexicon: HashMap<String, PosTag>,
}

const ADPOSITIONS: &[&str] = &[
    "about", "above", "across", "after", "against", "along", "among", "around", "at", "before",
    "behind", "below", "beside", "between", "by", "during", "except", "for", "from", "in",
    "inside", "into", "near", "of", "off", "on", "onto", "out", "over", "per", "since", "through",
    "throughout", "till", "to", "toward", "towards", "under", "until", "upon", "via", "with",
    "within", "without",
];
const CONJUNCTIONS: &[&str] = &[
    "and", "but", "or", "nor", "so", "yet", "because", "although", "though", "if", "unless",
    "whereas", "while", "whether", "og", "eller",
];
const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "each", "every", "some", "any", "no",
    "all", "both", "either", "neither",
];
const PRONOUNS: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "who", "which",
    "what", "there",
];
const VERBS: &[&str] = &[
    "is", "are", "was", "were", "be", "been", "being", "has", "have", "had", "do", "does", "did",
    "will", "would", "can", "could", "may", "might", "must", "shall", "should", "see", "take",
    "takes", "give", "gives", "make", "makes", "use", "uses", "follow", "follows", "meet",
    "meets",
];
const ADVERBS: &[&str] = &[
    "also", "only", "very", "not", "then", "here", "always", "never", "often", "usually", "well",
];
const PARTICLES: &[&str] = &["up", "down", "away", "back"];

/// Inflectional and derivational endings, checked in order.
const SUFFIXES: &[(&str, PosTag)] = &[
    ("ing", PosTag::Verb),
    ("ed", PosTag::Verb),
    ("en", PosTag::Verb),
    ("ly", PosTag::Adverb),
    ("ous", PosTag::Adjective),
    ("ive", PosTag::Adjective),
    ("al", PosTag::Adjective),
];

/// Shortest stem a suffix rule may leave behind.
const MIN_STEM_CHARS: usize = 3;

impl Default for LexiconTagger {
    fn default() -> Self {
        let classes: [(&[&str], PosTag); 7] = [
            (ADPOSITIONS, PosTag::Adposition),
            (CONJUNCTIONS, PosTag::Conjunction),
            (DETERMINERS, PosTag::Determiner),
            (PRONOUNS, PosTag::Pronoun),
            (VERBS, PosTag::Verb),
            (ADVERBS, PosTag::Adverb),
            (PARTICLES, PosTag::Particle),
        ];
        let lexicon = classes
            .iter()
            .flat_map(|(words, tag)| words.iter().map(move |w| (w.to_string(), *tag)))
            .collect();
        Self { lexicon }
    }
}

impl LexiconTagger {
    /// Adds or overrides lexicon entries.
    pub fn with_entries<'a>(mut self, entries: impl IntoIterator<Item = (&'a str, PosTag)>) -> Self {
        for (word, tag) in entries {
            self.lexicon.insert(word.to_lowercase(), tag);
        }
        self
    }
}

impl Tagger for LexiconTagger {
    fn tag(&self, word: &str) -> PosTag {
        if word.chars().all(|c| c.is_ascii_digit()) && !word.is_empty() {
            return PosTag::Numeral;
        }
        let word = word.to_lowercase();
        if let Some(tag) = self.lexicon.get(&word) {
            return *tag;
        }
        SUFFIXES
            .iter()
            .find(|(suffix, _)| {
                word.strip_suffix(suffix)
                    .is_some_and(|stem| stem.chars().count() >= MIN_STEM_CHARS)
            })
            .map_or(PosTag::Noun, |(_, tag)| *tag)
    }
}

/// In-memory word list.
#[derive(Debug, Clone, Default)]
pub struct StaticWordSet {
    words: HashSet<String>,
}

const EMBEDDED_WORDS: &str = include_str!("english_words.txt");

impl StaticWordSet {
    /// The compact list compiled into the binary.
    pub fn embedded() -> Self {
        Self::from_lines(EMBEDDED_WORDS)
    }

    /// Loads a newline-separated list; blank lines and `#` comments are ignored.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read word list '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::from_lines(&content))
    }

    pub fn from_lines(content: &str) -> Self {
        let words = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_lowercase)
            .collect();
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl WordSet for StaticWordSet {
    fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_words_are_nouns() {
        let tagger = LexiconTagger::default();
        assert_eq!(tagger.tag("and"), PosTag::Conjunction);
        assert_eq!(tagger.tag("In"), PosTag::Adposition);
        assert_eq!(tagger.tag("skemagruppe"), PosTag::Noun);
        assert_eq!(tagger.tag("42"), PosTag::Numeral);
    }

    #[test]
    fn test_suffix_rules() {
        let tagger = LexiconTagger::default();
        assert_eq!(tagger.tag("written"), PosTag::Verb);
        assert_eq!(tagger.tag("Scheduled"), PosTag::Verb);
        assert_eq!(tagger.tag("teaching"), PosTag::Verb);
        assert_eq!(tagger.tag("weekly"), PosTag::Adverb);
        assert_eq!(tagger.tag("tutorial"), PosTag::Adjective);
        assert_eq!(tagger.tag("intensive"), PosTag::Adjective);
        // too short to carry a suffix
        assert_eq!(tagger.tag("ten"), PosTag::Noun);
        assert_eq!(tagger.tag("seminar"), PosTag::Noun);
    }

    #[test]
    fn test_lexicon_override() {
        let tagger = LexiconTagger::default().with_entries([("lecture", PosTag::Verb)]);
        assert_eq!(tagger.tag("lecture"), PosTag::Verb);
    }

    #[test]
    fn test_embedded_words() {
        let words = StaticWordSet::embedded();
        assert!(!words.is_empty());
        assert!(words.contains("lecture"));
        assert!(words.contains("Week"));
        assert!(words.contains("seminar"));
        assert!(words.contains("report"));
        assert!(words.len() > 2000);
        assert!(!words.contains("skemagruppe"));
    }

    #[test]
    fn test_load_word_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, "# list\nalpha\n\nBeta\n").unwrap();

        let words = StaticWordSet::load(&path).unwrap();
        assert_eq!(words.len(), 2);
        assert!(words.contains("beta"));
    }
}
