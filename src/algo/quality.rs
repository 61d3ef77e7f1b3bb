use serde::Serialize;
use std::collections::HashMap;

/// Text quality scores for one normalized document.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct QualityScore {
    /// Shannon entropy (bits) of the character distribution.
    pub entropy: f64,
    pub word_count: usize,
    pub char_count: usize,
}

/// Score a normalized text. Stateless; empty text scores all zeros.
pub fn score(clean_text: &str) -> QualityScore {
    let mut freq: HashMap<char, usize> = HashMap::new();
    let mut char_count = 0usize;
    for c in clean_text.chars() {
        *freq.entry(c).or_insert(0) += 1;
        char_count += 1;
    }

    QualityScore {
        entropy: shannon_entropy(freq.values().copied(), char_count),
        word_count: clean_text.split_whitespace().count(),
        char_count,
    }
}

/// `Σ p·log2(1/p)` over non-zero counts. Zero total yields 0.
fn shannon_entropy(counts: impl Iterator<Item = usize>, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .filter(|&c| c > 0)
        .map(|c| {
            let c = c as f64;
            (c / total) * (total / c).log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_scores_zero() {
        let s = score("");
        assert_eq!(s.entropy, 0.0);
        assert_eq!(s.word_count, 0);
        assert_eq!(s.char_count, 0);
    }

    #[test]
    fn single_repeated_char_zero_entropy() {
        let s = score("aaaa");
        assert_eq!(s.entropy, 0.0);
        assert_eq!(s.word_count, 1);
        assert_eq!(s.char_count, 4);
    }

    #[test]
    fn two_equiprobable_chars_one_bit() {
        assert!((score("abab").entropy - 1.0).abs() < 1e-12);
    }

    #[test]
    fn whitespace_counts_as_symbol() {
        // 'a', ' ', 'b' each once → log2(3)
        let s = score("a b");
        assert!((s.entropy - 3f64.log2()).abs() < 1e-12);
        assert_eq!(s.word_count, 2);
        assert_eq!(s.char_count, 3);
    }

    #[test]
    fn counts_unicode_scalars() {
        let s = score("héllo wörld");
        assert_eq!(s.char_count, 11);
        assert_eq!(s.word_count, 2);
        assert!(s.entropy > 0.0);
    }

    #[test]
    fn entropy_bounded_by_alphabet() {
        let text = "the quick brown fox jumps over the lazy dog";
        let s = score(text);
        let distinct = text.chars().collect::<std::collections::HashSet<_>>().len();
        assert!(s.entropy > 0.0);
        assert!(s.entropy <= (distinct as f64).log2() + 1e-12);
    }
}
