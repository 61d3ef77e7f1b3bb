//! Typed engine configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::algo::lsh;
use crate::algo::minhash::{DEFAULT_NUM_PERM, DEFAULT_SEED};
use crate::algo::tokenizer::StopwordPolicy;
use crate::error::{DedupError, Result};

pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Engine configuration. Every field has a default, so a config file only
/// needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Signature length (number of MinHash permutations).
    pub num_perm: usize,
    /// Target Jaccard similarity the band split is tuned to.
    pub threshold: f64,
    /// Explicit band count; derived from `threshold` when unset.
    pub bands: Option<usize>,
    /// Seed of the permutation family.
    pub seed: u64,
    pub stopwords: StopwordPolicy,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            num_perm: DEFAULT_NUM_PERM,
            threshold: DEFAULT_THRESHOLD,
            bands: None,
            seed: DEFAULT_SEED,
            stopwords: StopwordPolicy::None,
        }
    }
}

impl DedupConfig {
    /// Read a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Check every field and return the `(bands, rows)` split.
    pub fn validate(&self) -> Result<(usize, usize)> {
        if self.num_perm == 0 {
            return Err(DedupError::ZeroPermutations);
        }
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(DedupError::InvalidThreshold(self.threshold));
        }
        match self.bands {
            Some(bands) if bands == 0 || self.num_perm % bands != 0 => {
                Err(DedupError::IndivisibleBands {
                    num_perm: self.num_perm,
                    bands,
                })
            }
            Some(bands) => Ok((bands, self.num_perm / bands)),
            None => Ok(lsh::optimal_split(self.num_perm, self.threshold)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = DedupConfig::default();
        assert_eq!(config.num_perm, 128);
        assert_eq!(config.threshold, 0.8);
        assert_eq!(config.validate().unwrap(), (16, 8));
    }

    #[test]
    fn explicit_bands() {
        let config = DedupConfig {
            bands: Some(32),
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap(), (32, 4));
    }

    #[test]
    fn indivisible_bands_rejected() {
        let config = DedupConfig {
            bands: Some(7),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DedupError::IndivisibleBands { num_perm: 128, bands: 7 })
        ));
        let zero = DedupConfig {
            bands: Some(0),
            ..Default::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn bad_threshold_rejected() {
        for threshold in [0.0, -0.5, 1.5, f64::NAN] {
            let config = DedupConfig {
                threshold,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(DedupError::InvalidThreshold(_))
            ));
        }
    }

    #[test]
    fn zero_perm_rejected() {
        let config = DedupConfig {
            num_perm: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DedupError::ZeroPermutations)));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: DedupConfig =
            serde_json::from_str(r#"{"threshold": 0.5, "stopwords": "default"}"#).unwrap();
        assert_eq!(config.num_perm, 128);
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.stopwords, StopwordPolicy::Default);
        assert_eq!(config.validate().unwrap(), (32, 4));
    }
}
