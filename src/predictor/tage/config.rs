
use crate::predictor::*;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Per-component index widths, in order of increasing history length.
pub const INDEX_BITS: [u8; 12] = [10, 10, 11, 11, 11, 11, 10, 10, 10, 10, 9, 9];

/// Per-component tag widths, in order of increasing history length.
pub const TAG_BITS: [u8; 12] = [7, 7, 8, 8, 9, 10, 11, 12, 12, 13, 14, 15];

/// Upper bound on the number of tagged components.
pub const MAX_COMPONENTS: usize = 32;

/// Errors produced while building a [`TAGEPredictor`] from a [`TAGEConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("a TAGE predictor needs at least one tagged component")]
    NoComponents,

    #[error("too many tagged components ({0}, at most 32)")]
    TooManyComponents(usize),

    #[error("{what} has {have} entries, but {need} components are configured")]
    MissingWidths { what: &'static str, have: usize, need: usize },

    #[error("component {component}: index width {bits} is outside 1..=24")]
    IndexWidth { component: usize, bits: u8 },

    #[error("component {component}: tag width {bits} is outside 2..=32")]
    TagWidth { component: usize, bits: u8 },

    #[error("longest history ({need} bits) exceeds the global history register ({have} bits)")]
    HistoryTooShort { need: usize, have: usize },

    #[error("at most 64 path history bits can be used per component ({0} requested)")]
    PathHistoryWidth(usize),

    #[error("the bimodal table must have at least one entry")]
    EmptyBimodal,

    #[error("history growth factor {0} must be finite and positive")]
    HistoryAlpha(f64),

    #[error("the usefulness reset interval must be non-zero")]
    ZeroResetInterval,

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration for a [`TAGEBaseComponent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TAGEBaseConfig {
    /// Number of entries
    pub size: usize,

    /// Initial value of every counter
    pub init: u8,
}
impl TAGEBaseConfig {
    /// Get the [approximate] number of storage bits.
    pub fn storage_bits(&self) -> usize {
        2 * self.size
    }

    /// Use this configuration to create a new [`TAGEBaseComponent`].
    pub fn build(self) -> TAGEBaseComponent {
        TAGEBaseComponent {
            data: vec![BimodalCounter::new(self.init); self.size],
            cfg: self,
        }
    }
}

/// Configuration for a [`TAGEComponent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TAGEComponentConfig {
    /// Position of this component, starting at 1 for the shortest history
    pub number: usize,

    /// Number of bits of global history used to form an index and tag
    pub history_length: usize,

    /// Number of index bits (the table has `2^index_bits` entries)
    pub index_bits: usize,

    /// Number of tag bits
    pub tag_bits: usize,

    /// Upper bound on the number of path history bits used to form an index
    pub max_path_bits: usize,
}
impl TAGEComponentConfig {
    /// Number of entries
    ///
    /// # Panics
    ///
    /// Panics if `index_bits` doesn't fit in a `usize` shift. Configurations
    /// produced by [`TAGEConfig::validate`] keep it within `1..=24`.
    pub fn size(&self) -> usize {
        1 << self.index_bits
    }

    /// Get the [approximate] number of storage bits.
    pub fn storage_bits(&self) -> usize {
        let entry_size = 3 + 2 + self.tag_bits;
        entry_size * self.size()
    }

    /// Use this configuration to create a new [`TAGEComponent`].
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`TAGEComponentConfig::size`].
    pub fn build(self) -> TAGEComponent {
        TAGEComponent {
            data: vec![TAGEEntry::new(); self.size()],
            cfg: self,
        }
    }
}


/// Configuration for a [`TAGEPredictor`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TAGEConfig {
    /// Number of tagged components
    pub components: usize,

    /// Number of entries in the bimodal table
    pub bimodal_size: usize,

    /// History length of the shortest tagged component
    pub min_history_length: usize,

    /// Growth factor between the history lengths of successive components
    pub history_alpha: f64,

    /// Number of updates between each pass that ages the 'useful' counters
    pub reset_useful_interval: usize,

    /// Capacity of the global history register
    pub global_history_bits: usize,

    /// Capacity of the path history register
    pub path_history_bits: usize,

    /// Upper bound on the path history bits used by a single component
    pub max_path_history_bits: usize,

    /// Index width of each tagged component
    pub index_bits: Vec<u8>,

    /// Tag width of each tagged component
    pub tag_bits: Vec<u8>,
}

impl Default for TAGEConfig {
    fn default() -> Self {
        Self {
            components: 8,
            bimodal_size: 16384,
            min_history_length: 4,
            history_alpha: 1.6,
            reset_useful_interval: 512_000,
            global_history_bits: 1024,
            path_history_bits: 32,
            max_path_history_bits: 16,
            index_bits: INDEX_BITS.to_vec(),
            tag_bits: TAG_BITS.to_vec(),
        }
    }
}

impl TAGEConfig {
    /// Read a configuration from a JSON file. Missing fields take their
    /// default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Geometric series of history lengths, one per tagged component.
    pub fn history_lengths(&self) -> Vec<usize> {
        let mut power = 1.0;
        let mut res = Vec::with_capacity(self.components);
        for _ in 0..self.components {
            res.push((self.min_history_length as f64 * power + 0.5) as usize);
            power *= self.history_alpha;
        }
        res
    }

    /// Check that this configuration describes a usable predictor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.components == 0 {
            return Err(ConfigError::NoComponents);
        }
        if self.components > MAX_COMPONENTS {
            return Err(ConfigError::TooManyComponents(self.components));
        }
        if self.bimodal_size == 0 {
            return Err(ConfigError::EmptyBimodal);
        }
        if !(self.history_alpha.is_finite() && self.history_alpha > 0.0) {
            return Err(ConfigError::HistoryAlpha(self.history_alpha));
        }
        if self.reset_useful_interval == 0 {
            return Err(ConfigError::ZeroResetInterval);
        }
        if self.max_path_history_bits > 64 {
            return Err(ConfigError::PathHistoryWidth(self.max_path_history_bits));
        }

        for (what, widths) in [("index_bits", &self.index_bits), ("tag_bits", &self.tag_bits)] {
            if widths.len() < self.components {
                return Err(ConfigError::MissingWidths {
                    what, have: widths.len(), need: self.components
                });
            }
        }
        for c in 0..self.components {
            let (ibits, tbits) = (self.index_bits[c], self.tag_bits[c]);
            if !(1..=24).contains(&ibits) {
                return Err(ConfigError::IndexWidth { component: c + 1, bits: ibits });
            }
            if !(2..=32).contains(&tbits) {
                return Err(ConfigError::TagWidth { component: c + 1, bits: tbits });
            }
        }

        let longest = self.history_lengths().into_iter().max().unwrap_or(0);
        if longest > self.global_history_bits {
            return Err(ConfigError::HistoryTooShort {
                need: longest, have: self.global_history_bits
            });
        }
        Ok(())
    }

    pub fn base_config(&self) -> TAGEBaseConfig {
        TAGEBaseConfig { size: self.bimodal_size, init: BIMODAL_INIT }
    }

    /// Configurations for each tagged component, in order of increasing
    /// history length.
    pub fn component_configs(&self) -> Vec<TAGEComponentConfig> {
        self.history_lengths().into_iter().enumerate()
            .map(|(i, history_length)| TAGEComponentConfig {
                number: i + 1,
                history_length,
                index_bits: self.index_bits[i] as usize,
                tag_bits: self.tag_bits[i] as usize,
                max_path_bits: self.max_path_history_bits,
            })
            .collect()
    }

    pub fn total_entries(&self) -> usize {
        let c: usize = self.component_configs().iter().map(|c| c.size()).sum();
        self.bimodal_size + c
    }

    /// Get the [approximate] number of storage bits.
    pub fn storage_bits(&self) -> usize {
        let c: usize = self.component_configs().iter()
            .map(|c| c.storage_bits()).sum();
        c + self.base_config().storage_bits()
    }

    /// Use this configuration to create a new [`TAGEPredictor`] whose
    /// allocation policy draws from an entropy-seeded generator.
    pub fn build(self) -> Result<TAGEPredictor<StdRng>, ConfigError> {
        self.build_with_rng(StdRng::from_entropy())
    }

    /// Use this configuration to create a new [`TAGEPredictor`] whose
    /// allocation policy draws from the provided generator.
    pub fn build_with_rng<R: RngCore>(self, rng: R)
        -> Result<TAGEPredictor<R>, ConfigError>
    {
        self.validate()?;
        Ok(TAGEPredictor::from_parts(self, rng))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_history_lengths_are_geometric() {
        let cfg = TAGEConfig::default();
        assert_eq!(cfg.history_lengths(), vec![4, 6, 10, 16, 26, 42, 67, 107]);
    }

    #[test]
    fn default_components_use_width_tables() {
        let comps = TAGEConfig::default().component_configs();
        assert_eq!(comps.len(), 8);
        assert_eq!(comps[0].number, 1);
        assert_eq!(comps[0].size(), 1024);
        assert_eq!(comps[2].size(), 2048);
        assert_eq!(comps[7].tag_bits, 12);
        assert!(TAGEConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_configs() {
        let cfg = TAGEConfig { components: 0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::NoComponents)));

        let cfg = TAGEConfig { components: 13, ..Default::default() };
        assert!(matches!(cfg.validate(),
            Err(ConfigError::MissingWidths { what: "index_bits", .. })));

        let cfg = TAGEConfig { global_history_bits: 64, ..Default::default() };
        assert!(matches!(cfg.validate(),
            Err(ConfigError::HistoryTooShort { need: 107, have: 64 })));

        let mut cfg = TAGEConfig::default();
        cfg.tag_bits[3] = 1;
        assert!(matches!(cfg.validate(),
            Err(ConfigError::TagWidth { component: 4, bits: 1 })));

        let cfg = TAGEConfig { reset_useful_interval: 0, ..Default::default() };
        assert!(matches!(cfg.build(), Err(ConfigError::ZeroResetInterval)));
    }

    #[test]
    fn json_fields_default_when_missing() {
        let cfg: TAGEConfig = serde_json::from_str(
            r#"{ "components": 4, "reset_useful_interval": 1000 }"#
        ).unwrap();
        assert_eq!(cfg.components, 4);
        assert_eq!(cfg.reset_useful_interval, 1000);
        assert_eq!(cfg.bimodal_size, 16384);
        assert_eq!(cfg.history_lengths(), vec![4, 6, 10, 16]);
    }
}
