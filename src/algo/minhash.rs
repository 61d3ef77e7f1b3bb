use siphasher::sip::SipHasher13;
use std::collections::HashSet;
use std::hash::Hasher;

pub const DEFAULT_NUM_PERM: usize = 128;
pub const DEFAULT_SEED: u64 = 1;

/// Mersenne prime 2^61 - 1, modulus of the permutation family.
const MERSENNE_PRIME: u64 = (1 << 61) - 1;

/// Keys of the single base hash applied to every token.
const TOKEN_KEYS: (u64, u64) = (0x006d_696e_6861_7368, 0x0000_0074_6f6b_656e);

/// Value held at every position of an empty set's signature. Permutation
/// outputs are always below `MERSENNE_PRIME`, so it never collides with a
/// real minimum.
pub const EMPTY_SLOT: u64 = u64::MAX;

/// MinHash signature: one minimum per permutation.
pub type Signature = Vec<u64>;

/// MinHash signature generator.
///
/// Each token is hashed once with SipHash-1-3, then pushed through
/// `num_perm` universal hash permutations `(a·h + b) mod (2^61 - 1)`.
/// Two signatures can be compared with Jaccard estimation:
/// J(A,B) ≈ (number of matching positions) / num_perm
#[derive(Debug, Clone)]
pub struct MinHasher {
    num_perm: usize,
    /// `(a, b)` coefficients, one pair per permutation.
    coefficients: Vec<(u64, u64)>,
}

impl MinHasher {
    pub fn new(num_perm: usize) -> Self {
        Self::with_seed(num_perm, DEFAULT_SEED)
    }

    /// Coefficients are drawn from a SplitMix64 stream so the same seed
    /// always yields the same permutations.
    pub fn with_seed(num_perm: usize, seed: u64) -> Self {
        let mut rng = SplitMix64::new(seed);
        let coefficients = (0..num_perm)
            .map(|_| {
                let a = rng.next() % (MERSENNE_PRIME - 1) + 1;
                let b = rng.next() % MERSENNE_PRIME;
                (a, b)
            })
            .collect();

        Self {
            num_perm,
            coefficients,
        }
    }

    pub fn with_default_perm() -> Self {
        Self::new(DEFAULT_NUM_PERM)
    }

    /// Compute the MinHash signature of a token set.
    ///
    /// An empty set yields `EMPTY_SLOT` at every position.
    pub fn signature(&self, tokens: &HashSet<String>) -> Signature {
        let mut sig = vec![EMPTY_SLOT; self.num_perm];

        for token in tokens {
            let h = token_hash(token);
            for (slot, &(a, b)) in sig.iter_mut().zip(&self.coefficients) {
                let v = permute(h, a, b);
                if v < *slot {
                    *slot = v;
                }
            }
        }

        sig
    }

    pub fn num_perm(&self) -> usize {
        self.num_perm
    }
}

impl Default for MinHasher {
    fn default() -> Self {
        Self::with_default_perm()
    }
}

/// Estimate Jaccard similarity between two signatures.
///
/// Panics when the lengths differ.
pub fn jaccard(sig_a: &[u64], sig_b: &[u64]) -> f64 {
    assert_eq!(
        sig_a.len(),
        sig_b.len(),
        "signature length mismatch: {} vs {}",
        sig_a.len(),
        sig_b.len()
    );
    if sig_a.is_empty() {
        return 0.0;
    }
    let matches = sig_a
        .iter()
        .zip(sig_b.iter())
        .filter(|(a, b)| a == b)
        .count();
    matches as f64 / sig_a.len() as f64
}

/// Exact Jaccard similarity of two token sets. Two empty sets score 1.0.
pub fn true_jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

fn token_hash(token: &str) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(TOKEN_KEYS.0, TOKEN_KEYS.1);
    hasher.write(token.as_bytes());
    hasher.finish()
}

#[inline]
fn permute(h: u64, a: u64, b: u64) -> u64 {
    ((a as u128 * h as u128 + b as u128) % MERSENNE_PRIME as u128) as u64
}

/// SplitMix64 PRNG for permutation coefficients.
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tokens: &[&str]) -> HashSet<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn numbered(prefix: &str, range: std::ops::Range<usize>) -> HashSet<String> {
        range.map(|i| format!("{prefix}_{i}")).collect()
    }

    #[test]
    fn identical_sets_jaccard_one() {
        let mh = MinHasher::new(128);
        let a = mh.signature(&set(&["a", "b", "c"]));
        let b = mh.signature(&set(&["c", "b", "a"]));
        assert_eq!(a, b);
        assert!((jaccard(&a, &b) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn estimate_tracks_true_jaccard_on_average() {
        let mh = MinHasher::new(128);
        let mut total_error = 0.0;
        let mut pairs = 0;
        // Overlaps from 0 to 90 out of 100-token sets.
        for (p, shared) in (0..=90).step_by(10).enumerate() {
            let a = numbered(&format!("p{p}"), 0..100);
            let mut b = numbered(&format!("p{p}"), 0..shared);
            b.extend(numbered(&format!("q{p}"), shared..100));
            let expected = true_jaccard(&a, &b);
            let est = jaccard(&mh.signature(&a), &mh.signature(&b));
            total_error += (est - expected).abs();
            pairs += 1;
        }
        let mean_error = total_error / pairs as f64;
        assert!(mean_error < 0.05, "mean abs error {mean_error}");
    }

    #[test]
    fn estimate_close_with_many_permutations() {
        let mh = MinHasher::new(1024);
        let a = numbered("t", 0..100);
        let b = numbered("t", 20..120);
        // |A∩B| = 80, |A∪B| = 120
        let expected = 80.0 / 120.0;
        let est = jaccard(&mh.signature(&a), &mh.signature(&b));
        assert!((est - expected).abs() < 0.05, "estimate {est} vs {expected}");
    }

    #[test]
    fn disjoint_sets_low_jaccard() {
        let mh = MinHasher::new(128);
        let sig_a = mh.signature(&set(&["a", "b", "c"]));
        let sig_b = mh.signature(&set(&["x", "y", "z"]));
        let j = jaccard(&sig_a, &sig_b);
        assert!(j < 0.2, "Expected low Jaccard, got {j}");
    }

    #[test]
    fn deterministic() {
        let tokens = set(&["hello", "world"]);
        let s1 = MinHasher::with_seed(64, 7).signature(&tokens);
        let s2 = MinHasher::with_seed(64, 7).signature(&tokens);
        assert_eq!(s1, s2);
    }

    #[test]
    fn seed_changes_permutations() {
        let tokens = set(&["hello", "world"]);
        let s1 = MinHasher::with_seed(64, 1).signature(&tokens);
        let s2 = MinHasher::with_seed(64, 2).signature(&tokens);
        assert_ne!(s1, s2);
    }

    #[test]
    fn single_token_signature() {
        let mh = MinHasher::new(32);
        let sig = mh.signature(&set(&["solo"]));
        assert_eq!(sig.len(), 32);
        assert!(sig.iter().all(|&v| v < MERSENNE_PRIME));
    }

    #[test]
    fn empty_tokens_signature() {
        let mh = MinHasher::new(16);
        let sig = mh.signature(&HashSet::new());
        assert_eq!(sig.len(), 16);
        assert!(sig.iter().all(|&v| v == EMPTY_SLOT));
    }

    #[test]
    fn empty_matches_only_empty() {
        let mh = MinHasher::new(64);
        let empty = mh.signature(&HashSet::new());
        let other = mh.signature(&set(&["x"]));
        assert_eq!(jaccard(&empty, &empty), 1.0);
        assert_eq!(jaccard(&empty, &other), 0.0);
    }

    #[test]
    fn jaccard_symmetry() {
        let mh = MinHasher::new(128);
        let sig_a = mh.signature(&set(&["a", "b", "c"]));
        let sig_b = mh.signature(&set(&["b", "c", "d"]));
        assert!((jaccard(&sig_a, &sig_b) - jaccard(&sig_b, &sig_a)).abs() < 1e-10);
    }

    #[test]
    #[should_panic(expected = "signature length mismatch")]
    fn jaccard_length_mismatch_panics() {
        jaccard(&[1, 2, 3], &[1, 2]);
    }

    #[test]
    fn true_jaccard_basic() {
        let a = set(&["a", "b", "c"]);
        let b = set(&["a", "b", "c", "d"]);
        assert!((true_jaccard(&a, &b) - 0.75).abs() < 1e-12);
        assert_eq!(true_jaccard(&HashSet::new(), &HashSet::new()), 1.0);
    }

    #[test]
    fn default_perm_count() {
        let mh = MinHasher::with_default_perm();
        assert_eq!(mh.num_perm(), 128);
    }
}
