use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{DedupError, Result};

/// Negated auxiliaries: `don't` → `do` + `n't`, `can't` → `ca` + `n't`.
static NEGATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+)(n['’]t)$").expect("static regex"));

/// Trailing clitics: `she's` → `she` + `'s`, `we'll` → `we` + `'ll`.
static CLITIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)(['’](?:s|m|d|ll|re|ve))$").expect("static regex")
});

/// English stopword list (NLTK `stopwords.words('english')`).
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// Which stopwords to strip during normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopwordPolicy {
    /// Keep every token.
    #[default]
    None,
    /// Built-in English list.
    Default,
    /// Caller-supplied words, compared case-insensitively.
    Custom(Vec<String>),
}

impl StopwordPolicy {
    /// Build a policy from its name (`none`, `default`, `custom`).
    /// `custom` takes its words from `words`; the other policies ignore them.
    pub fn from_name(name: &str, words: Vec<String>) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "default" => Ok(Self::Default),
            "custom" => Ok(Self::Custom(words)),
            other => Err(DedupError::UnknownStopwordPolicy(other.to_string())),
        }
    }

    pub fn resolve(&self) -> Stopwords {
        match self {
            Self::None => Stopwords::none(),
            Self::Default => Stopwords::english(),
            Self::Custom(words) => Stopwords::custom(words),
        }
    }
}

/// A resolved, lowercased stopword set.
#[derive(Debug, Clone, Default)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Stopwords {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn english() -> Self {
        Self {
            words: ENGLISH_STOPWORDS.iter().map(|w| (*w).to_string()).collect(),
        }
    }

    /// User-supplied words: trimmed, lowercased, blanks dropped.
    pub fn custom<S: AsRef<str>>(words: &[S]) -> Self {
        Self {
            words: words
                .iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, token: &str) -> bool {
        !self.words.is_empty() && self.words.contains(&token.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Split text into lexical tokens on Unicode word boundaries.
///
/// Punctuation survives as standalone tokens, whitespace is dropped, and
/// English clitics are split off the way the Penn Treebank tokenizer does.
/// Hyphenated compounds (`well-known`, `state-of-the-art`) stay one token.
pub fn word_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for span in hyphenated_spans(text) {
        push_with_clitic(&text[span.0..span.1], &mut tokens);
    }
    tokens
}

/// Byte ranges of the non-whitespace word-bound segments, with
/// `word-word` runs merged into one range.
fn hyphenated_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans: Vec<(usize, usize)> = Vec::new();
    // The last span ends with a hyphen that directly follows a word.
    let mut open_hyphen = false;

    for (start, segment) in text.split_word_bound_indices() {
        if segment.chars().all(char::is_whitespace) {
            close_hyphen(&mut spans, &mut open_hyphen);
            continue;
        }
        let end = start + segment.len();
        let adjacent = spans.last().is_some_and(|last| last.1 == start);

        if open_hyphen && adjacent && starts_with_word(segment) {
            if let Some(last) = spans.last_mut() {
                last.1 = end;
            }
            open_hyphen = false;
            continue;
        }
        close_hyphen(&mut spans, &mut open_hyphen);

        let after_word = spans
            .last()
            .is_some_and(|last| last.1 == start && ends_with_word(&text[last.0..last.1]));
        if segment == "-" && after_word {
            if let Some(last) = spans.last_mut() {
                last.1 = end;
            }
            open_hyphen = true;
        } else {
            spans.push((start, end));
        }
    }
    close_hyphen(&mut spans, &mut open_hyphen);
    spans
}

/// A trailing hyphen with no word after it goes back to being its own token.
fn close_hyphen(spans: &mut Vec<(usize, usize)>, open_hyphen: &mut bool) {
    if !std::mem::take(open_hyphen) {
        return;
    }
    if let Some(last) = spans.last_mut() {
        last.1 -= 1;
        let hyphen = (last.1, last.1 + 1);
        spans.push(hyphen);
    }
}

fn starts_with_word(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_alphanumeric)
}

fn ends_with_word(s: &str) -> bool {
    s.chars().next_back().is_some_and(char::is_alphanumeric)
}

fn push_with_clitic<'a>(word: &'a str, out: &mut Vec<&'a str>) {
    let split_at = NEGATION
        .captures(word)
        .or_else(|| CLITIC.captures(word))
        .and_then(|caps| caps.get(2))
        .map(|m| m.start());

    match split_at {
        Some(at) => {
            out.push(&word[..at]);
            out.push(&word[at..]);
        }
        None => out.push(word),
    }
}

/// Tokenize, drop stopwords, and rejoin the survivors with single spaces.
/// Surviving tokens keep their original case.
pub fn normalize(raw_text: &str, stopwords: &Stopwords) -> String {
    word_tokens(raw_text)
        .into_iter()
        .filter(|t| !stopwords.contains(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The set of whitespace-separated tokens of a normalized text.
pub fn token_set(clean_text: &str) -> HashSet<String> {
    clean_text.split_whitespace().map(str::to_string).collect()
}
