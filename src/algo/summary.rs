//! Aggregate views over an annotated table: label distribution, entropy
//! statistics and histogram, and label counts per metadata group.

use serde::Serialize;
use std::collections::BTreeMap;

use super::classify::DupType;

pub const DEFAULT_BINS: usize = 30;

/// Per-label counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DupCounts {
    pub unique: usize,
    pub near_duplicate: usize,
    pub exact_duplicate: usize,
}

impl DupCounts {
    pub fn add(&mut self, dup_type: DupType) {
        match dup_type {
            DupType::Unique => self.unique += 1,
            DupType::NearDuplicate => self.near_duplicate += 1,
            DupType::ExactDuplicate => self.exact_duplicate += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.unique + self.near_duplicate + self.exact_duplicate
    }
}

/// The fields of one annotated row that the summary reads.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub dup_type: DupType,
    pub entropy: f64,
    pub word_count: usize,
    /// Value of the group-by column, if one was requested.
    pub group: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EntropyStats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DedupSummary {
    pub total: usize,
    #[serde(flatten)]
    pub counts: DupCounts,
    /// Share of rows that are near or exact duplicates.
    pub duplicate_ratio: f64,
    pub entropy: EntropyStats,
    pub mean_word_count: f64,
    pub histogram: Vec<HistogramBin>,
    pub groups: BTreeMap<String, DupCounts>,
}

pub fn summarize(rows: &[SummaryRow], bins: usize) -> DedupSummary {
    let total = rows.len();
    let mut counts = DupCounts::default();
    let mut groups: BTreeMap<String, DupCounts> = BTreeMap::new();
    for row in rows {
        counts.add(row.dup_type);
        if let Some(group) = &row.group {
            groups.entry(group.clone()).or_default().add(row.dup_type);
        }
    }

    if total == 0 {
        return DedupSummary {
            total,
            counts,
            duplicate_ratio: 0.0,
            entropy: EntropyStats::default(),
            mean_word_count: 0.0,
            histogram: Vec::new(),
            groups,
        };
    }

    let entropies: Vec<f64> = rows.iter().map(|r| r.entropy).collect();
    let min = entropies.iter().copied().fold(f64::INFINITY, f64::min);
    let max = entropies.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = entropies.iter().sum::<f64>() / total as f64;
    let words: usize = rows.iter().map(|r| r.word_count).sum();

    DedupSummary {
        total,
        counts,
        duplicate_ratio: (counts.near_duplicate + counts.exact_duplicate) as f64 / total as f64,
        entropy: EntropyStats { min, mean, max },
        mean_word_count: words as f64 / total as f64,
        histogram: histogram(&entropies, min, max, bins.max(1)),
        groups,
    }
}

/// Equal-width bins over `[min, max]`; the last bin is closed on the right.
fn histogram(values: &[f64], min: f64, max: f64, bins: usize) -> Vec<HistogramBin> {
    let span = max - min;
    if span <= 0.0 {
        return vec![HistogramBin {
            start: min,
            end: max,
            count: values.len(),
        }];
    }

    let width = span / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + i as f64 * width,
            end: if i + 1 == bins {
                max
            } else {
                min + (i + 1) as f64 * width
            },
            count: 0,
        })
        .collect();

    for &v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(dup_type: DupType, entropy: f64, group: Option<&str>) -> SummaryRow {
        SummaryRow {
            dup_type,
            entropy,
            word_count: 2,
            group: group.map(str::to_string),
        }
    }

    #[test]
    fn counts_and_ratio() {
        let rows = vec![
            row(DupType::ExactDuplicate, 2.0, None),
            row(DupType::ExactDuplicate, 2.0, None),
            row(DupType::Unique, 3.0, None),
            row(DupType::NearDuplicate, 4.0, None),
        ];
        let s = summarize(&rows, 10);
        assert_eq!(s.total, 4);
        assert_eq!(s.counts.exact_duplicate, 2);
        assert_eq!(s.counts.unique, 1);
        assert_eq!(s.counts.near_duplicate, 1);
        assert!((s.duplicate_ratio - 0.75).abs() < 1e-12);
        assert_eq!(s.entropy.min, 2.0);
        assert_eq!(s.entropy.max, 4.0);
        assert!((s.entropy.mean - 2.75).abs() < 1e-12);
        assert!((s.mean_word_count - 2.0).abs() < 1e-12);
    }

    #[test]
    fn histogram_covers_all_rows() {
        let rows: Vec<SummaryRow> = (0..=10)
            .map(|i| row(DupType::Unique, i as f64 * 0.5, None))
            .collect();
        let s = summarize(&rows, 4);
        assert_eq!(s.histogram.len(), 4);
        assert_eq!(s.histogram.iter().map(|b| b.count).sum::<usize>(), 11);
        assert_eq!(s.histogram[0].start, 0.0);
        assert_eq!(s.histogram[3].end, 5.0);
    }

    #[test]
    fn histogram_single_value() {
        let rows = vec![row(DupType::Unique, 1.5, None), row(DupType::Unique, 1.5, None)];
        let s = summarize(&rows, 8);
        assert_eq!(s.histogram.len(), 1);
        assert_eq!(s.histogram[0].count, 2);
    }

    #[test]
    fn groups_split_counts() {
        let rows = vec![
            row(DupType::ExactDuplicate, 1.0, Some("news")),
            row(DupType::Unique, 1.0, Some("news")),
            row(DupType::Unique, 1.0, Some("blog")),
        ];
        let s = summarize(&rows, 5);
        assert_eq!(s.groups.len(), 2);
        assert_eq!(s.groups["news"].total(), 2);
        assert_eq!(s.groups["news"].exact_duplicate, 1);
        assert_eq!(s.groups["blog"].unique, 1);
    }

    #[test]
    fn empty_summary() {
        let s = summarize(&[], 5);
        assert_eq!(s.total, 0);
        assert!(s.histogram.is_empty());
        assert_eq!(s.duplicate_ratio, 0.0);
    }

    #[test]
    fn serializes_flat_counts() {
        let s = summarize(&[row(DupType::Unique, 0.0, None)], 1);
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["unique"], 1);
        assert_eq!(v["total"], 1);
        assert!(v["histogram"].is_array());
    }
}
