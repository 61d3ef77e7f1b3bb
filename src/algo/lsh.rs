use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

use super::minhash::Signature;
use super::RowId;

/// Locality-Sensitive Hashing index for fast near-neighbor search.
///
/// Splits MinHash signatures into `bands` bands of `rows` rows each.
/// Each band has its own bucket table keyed by the exact band slice, so two
/// items are candidates iff at least one band slice is identical.
///
/// Banding approximates a similarity threshold: pairs below it can still
/// collide (false positive) and pairs above it can miss every band (false
/// negative). See [`candidate_probability`].
pub struct LshIndex {
    bands: usize,
    rows: usize,
    /// band_idx → band slice → item IDs
    buckets: Vec<HashMap<Box<[u64]>, Vec<RowId>>>,
    /// Every inserted signature, owned for the index's lifetime.
    signatures: HashMap<RowId, Signature>,
}

impl LshIndex {
    /// Create an empty index.
    ///
    /// * `bands` - Number of bands to split signature into.
    /// * `rows` - Number of rows per band.
    ///
    /// Signatures inserted or queried must have exactly `bands * rows` values.
    pub fn new(bands: usize, rows: usize) -> Self {
        assert!(bands > 0 && rows > 0, "bands and rows must be non-zero");
        Self {
            bands,
            rows,
            buckets: (0..bands).map(|_| HashMap::new()).collect(),
            signatures: HashMap::new(),
        }
    }

    /// Index for `num_perm`-long signatures tuned to `threshold`.
    pub fn with_threshold(num_perm: usize, threshold: f64) -> Self {
        let (bands, rows) = optimal_split(num_perm, threshold);
        Self::new(bands, rows)
    }

    /// Insert an item's MinHash signature.
    pub fn insert(&mut self, row_id: RowId, signature: Signature) {
        self.check_len(&signature);
        assert!(
            !self.signatures.contains_key(&row_id),
            "row_id {row_id} inserted twice"
        );

        for (band_idx, table) in self.buckets.iter_mut().enumerate() {
            let start = band_idx * self.rows;
            table
                .entry(signature[start..start + self.rows].into())
                .or_default()
                .push(row_id);
        }
        self.signatures.insert(row_id, signature);
    }

    /// Bulk insert. Band tables are filled in parallel, one task per band;
    /// the call returns once every band holds every entry.
    pub fn extend(&mut self, entries: Vec<(RowId, Signature)>) {
        let mut seen: HashSet<RowId> = HashSet::with_capacity(entries.len());
        for (row_id, signature) in &entries {
            self.check_len(signature);
            assert!(
                !self.signatures.contains_key(row_id) && seen.insert(*row_id),
                "row_id {row_id} inserted twice"
            );
        }

        let rows = self.rows;
        self.buckets
            .par_iter_mut()
            .enumerate()
            .for_each(|(band_idx, table)| {
                let start = band_idx * rows;
                for (row_id, signature) in &entries {
                    table
                        .entry(signature[start..start + rows].into())
                        .or_default()
                        .push(*row_id);
                }
            });

        self.signatures.extend(entries);
    }

    /// Query for candidate near-neighbors of a signature.
    /// Returns item IDs that share at least one band slice.
    pub fn query(&self, signature: &[u64]) -> HashSet<RowId> {
        self.check_len(signature);
        let mut candidates = HashSet::new();

        for (band_idx, table) in self.buckets.iter().enumerate() {
            let start = band_idx * self.rows;
            if let Some(items) = table.get(&signature[start..start + self.rows]) {
                candidates.extend(items.iter().copied());
            }
        }

        candidates
    }

    /// Signature stored for `row_id`.
    pub fn signature(&self, row_id: RowId) -> Option<&[u64]> {
        self.signatures.get(&row_id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn bands(&self) -> usize {
        self.bands
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn num_perm(&self) -> usize {
        self.bands * self.rows
    }

    fn check_len(&self, signature: &[u64]) {
        assert_eq!(
            signature.len(),
            self.num_perm(),
            "signature length {} does not match index width {} ({} bands x {} rows)",
            signature.len(),
            self.num_perm(),
            self.bands,
            self.rows
        );
    }
}

/// Split `num_perm` into `(bands, rows)` with `bands * rows == num_perm`.
///
/// The S-curve `1 - (1 - s^r)^b` crosses 0.5 near `(1/b)^(1/r)`. Among the
/// exact divisor splits this picks the one whose midpoint is the highest
/// value not above `threshold`, so pairs at the threshold are retrieved more
/// often than not. If every midpoint lies above the threshold the lowest is
/// used.
pub fn optimal_split(num_perm: usize, threshold: f64) -> (usize, usize) {
    let splits: Vec<(usize, usize, f64)> = (1..=num_perm)
        .filter(|b| num_perm % b == 0)
        .map(|b| {
            let r = num_perm / b;
            (b, r, s_curve_midpoint(b, r))
        })
        .collect();

    splits
        .iter()
        .filter(|(_, _, mid)| *mid <= threshold)
        .max_by(|x, y| x.2.total_cmp(&y.2))
        .or_else(|| splits.iter().min_by(|x, y| x.2.total_cmp(&y.2)))
        .map(|&(b, r, _)| (b, r))
        .unwrap_or((1, num_perm))
}

/// Similarity at which a pair becomes a candidate with ~50% probability.
pub fn s_curve_midpoint(bands: usize, rows: usize) -> f64 {
    (1.0 / bands as f64).powf(1.0 / rows as f64)
}

/// Probability that two items with Jaccard similarity `s` share a band.
pub fn candidate_probability(s: f64, bands: usize, rows: usize) -> f64 {
    1.0 - (1.0 - s.powi(rows as i32)).powi(bands as i32)
}
