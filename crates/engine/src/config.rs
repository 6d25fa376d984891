//! Configuration system for the pattern engine.
//!
//! This module defines the structure used to parameterize the engine. It
//! provides:
//! 1. **Defaults:** Baseline table geometry and discovery timing constants.
//! 2. **Structure:** A flat, serde-deserializable [`EngineConfig`] fixed at
//!    construction — there is no runtime reconfiguration.
//! 3. **Validation:** [`EngineConfig::validate`], the crate's single
//!    fallible path, run by the engine constructor.
//!
//! Configuration is supplied as JSON by the host simulator or built in code
//! from `EngineConfig::default()`.

use serde::Deserialize;

use crate::common::{ConfigError, Pc, Tick};

/// Default configuration constants for the engine.
///
/// These values define the baseline table geometry when not explicitly
/// overridden in the host's configuration file.
mod defaults {
    /// Index Delta Table entry count.
    ///
    /// Number of index PCs whose loaded-value delta sequences are tracked
    /// concurrently.
    pub const INDEX_TABLE_SIZE: usize = 32;

    /// Target Delta Table entry count.
    pub const TARGET_TABLE_SIZE: usize = 32;

    /// Length of an index delta sequence (ring capacity per entry).
    ///
    /// Longer than the target sequence so the matcher has a window to
    /// slide across.
    pub const INDEX_DIFF_NUM: usize = 16;

    /// Length of a target delta sequence (ring capacity per entry).
    pub const TARGET_DIFF_NUM: usize = 8;

    /// Index Candidate Queue entry count.
    pub const INDEX_QUEUE_SIZE: usize = 128;

    /// Range Classifier capacity in tracked PCs.
    ///
    /// Each tracked PC owns one entry per shift amount, so the physical
    /// table holds `RANGE_TABLE_SIZE * shift_set.len()` entries.
    pub const RANGE_TABLE_SIZE: usize = 8;

    /// Indirect Candidate Scoreboard entry count.
    pub const SCOREBOARD_SIZE: usize = 64;

    /// Relation Table entry count.
    pub const RELATION_TABLE_SIZE: usize = 48;

    /// Miss-PC candidates tracked per scoreboard entry.
    pub const CANDIDATE_NUM: usize = 4;

    /// Miss count at which a scoreboard candidate is promoted to a target.
    pub const MISS_THRESHOLD: u32 = 4;

    /// Shift amounts tried when comparing delta sequences and when
    /// reconstructing addresses (index scaling by 1, 2, 4, 8 bytes).
    pub const SHIFT_SET: [u32; 4] = [0, 1, 2, 3];

    /// Quantization unit for completed range-run lengths.
    pub const RANGE_UNIT: u64 = 4;

    /// Number of quantized histogram buckets per range entry.
    pub const RANGE_LEVELS: usize = 4;

    /// Interval between index-pick callbacks, in host ticks.
    pub const DETECT_PERIOD: u64 = 16384;

    /// Cache block size in bytes.
    pub const BLOCK_SIZE: u64 = 64;

    /// Words read ahead from fill data for a range-type relation.
    pub const RANGE_DEGREE: usize = 4;

    /// Priority-counter decrement between consecutive range relations.
    ///
    /// Keeps a whole range burst contiguous in priority order while still
    /// ranking earlier-discovered ranges above later ones.
    pub const RANGE_GROUP_SIZE: i32 = 64;
}

/// Engine configuration, fixed at construction.
///
/// All fields have serde defaults, so a host may supply only the fields it
/// cares about:
///
/// ```
/// use ixfetch_core::config::EngineConfig;
///
/// let json = r#"{
///     "index_diff_num": 12,
///     "target_diff_num": 6,
///     "shift_set": [0, 2, 3],
///     "detect_period": 4096,
///     "auto_detect": true
/// }"#;
///
/// let config = EngineConfig::from_json(json).unwrap();
/// assert_eq!(config.index_diff_num, 12);
/// assert_eq!(config.shift_set, vec![0, 2, 3]);
/// assert_eq!(config.relation_table_size, 48);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Index Delta Table capacity (tracked index PCs).
    #[serde(default = "EngineConfig::default_index_table_size")]
    pub index_table_size: usize,

    /// Target Delta Table capacity (tracked target PCs).
    #[serde(default = "EngineConfig::default_target_table_size")]
    pub target_table_size: usize,

    /// Ring capacity of each index delta sequence.
    #[serde(default = "EngineConfig::default_index_diff_num")]
    pub index_diff_num: usize,

    /// Ring capacity of each target delta sequence. Must not exceed
    /// `index_diff_num`.
    #[serde(default = "EngineConfig::default_target_diff_num")]
    pub target_diff_num: usize,

    /// Index Candidate Queue capacity.
    #[serde(default = "EngineConfig::default_index_queue_size")]
    pub index_queue_size: usize,

    /// Range Classifier capacity in tracked PCs (one entry per shift each).
    #[serde(default = "EngineConfig::default_range_table_size")]
    pub range_table_size: usize,

    /// Indirect Candidate Scoreboard capacity.
    #[serde(default = "EngineConfig::default_scoreboard_size")]
    pub scoreboard_size: usize,

    /// Relation Table capacity.
    #[serde(default = "EngineConfig::default_relation_table_size")]
    pub relation_table_size: usize,

    /// Miss-PC candidates tracked per scoreboard entry.
    #[serde(default = "EngineConfig::default_candidate_num")]
    pub candidate_num: usize,

    /// Miss count at which a scoreboard candidate becomes a target.
    #[serde(default = "EngineConfig::default_miss_threshold")]
    pub miss_threshold: u32,

    /// Shift amounts tried by the matcher and the address generator.
    /// Every shift must be below 32.
    #[serde(default = "EngineConfig::default_shift_set")]
    pub shift_set: Vec<u32>,

    /// Quantization unit for completed range-run lengths.
    #[serde(default = "EngineConfig::default_range_unit")]
    pub range_unit: u64,

    /// Histogram bucket count per range entry.
    #[serde(default = "EngineConfig::default_range_levels")]
    pub range_levels: usize,

    /// Interval between index-pick callbacks, in host ticks.
    #[serde(default = "EngineConfig::default_detect_period")]
    pub detect_period: Tick,

    /// Enable the discovery pipeline (queue, picker, scoreboard). When
    /// false, the seed lists below populate the tables once at start-up.
    #[serde(default = "EngineConfig::default_auto_detect")]
    pub auto_detect: bool,

    /// Cache block size in bytes. Must be a power of two.
    #[serde(default = "EngineConfig::default_block_size")]
    pub block_size: u64,

    /// Words read ahead from fill data for a range-type relation.
    #[serde(default = "EngineConfig::default_range_degree")]
    pub range_degree: usize,

    /// Priority-counter decrement between consecutive range relations.
    #[serde(default = "EngineConfig::default_range_group_size")]
    pub range_group_size: i32,

    /// Index PCs pre-seeded into the Index Delta Table when `auto_detect`
    /// is off.
    #[serde(default)]
    pub index_seeds: Vec<Pc>,

    /// Target PCs pre-seeded into the Target Delta Table when `auto_detect`
    /// is off.
    #[serde(default)]
    pub target_seeds: Vec<Pc>,

    /// PCs pre-seeded into the Range Classifier (one entry per shift) when
    /// `auto_detect` is off.
    #[serde(default)]
    pub range_seeds: Vec<Pc>,
}

impl EngineConfig {
    /// Parses a JSON configuration and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed JSON, or any validation
    /// error from [`Self::validate`].
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for shapes the engine cannot operate on.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first rejected field: a zero
    /// capacity/length/period, a target sequence longer than the index
    /// sequence, an empty shift set, a shift of 32 or more, or a
    /// non-power-of-two block size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_zero: [(u64, &'static str); 14] = [
            (self.index_table_size as u64, "index_table_size"),
            (self.target_table_size as u64, "target_table_size"),
            (self.index_diff_num as u64, "index_diff_num"),
            (self.target_diff_num as u64, "target_diff_num"),
            (self.index_queue_size as u64, "index_queue_size"),
            (self.range_table_size as u64, "range_table_size"),
            (self.scoreboard_size as u64, "scoreboard_size"),
            (self.relation_table_size as u64, "relation_table_size"),
            (self.candidate_num as u64, "candidate_num"),
            (u64::from(self.miss_threshold), "miss_threshold"),
            (self.range_unit, "range_unit"),
            (self.range_levels as u64, "range_levels"),
            (self.detect_period, "detect_period"),
            (self.range_degree as u64, "range_degree"),
        ];
        for (value, field) in non_zero {
            if value == 0 {
                return Err(ConfigError::ZeroField { field });
            }
        }
        if self.range_group_size <= 0 {
            return Err(ConfigError::ZeroField {
                field: "range_group_size",
            });
        }
        if self.target_diff_num > self.index_diff_num {
            return Err(ConfigError::WindowInverted {
                index: self.index_diff_num,
                target: self.target_diff_num,
            });
        }
        if self.shift_set.is_empty() {
            return Err(ConfigError::EmptyShiftSet);
        }
        if let Some(&shift) = self.shift_set.iter().find(|&&s| s >= 32) {
            return Err(ConfigError::ShiftTooLarge(shift));
        }
        if self.block_size == 0 || !self.block_size.is_power_of_two() {
            return Err(ConfigError::BlockNotPowerOfTwo(self.block_size));
        }
        Ok(())
    }

    /// Returns the default index table capacity.
    fn default_index_table_size() -> usize {
        defaults::INDEX_TABLE_SIZE
    }

    /// Returns the default target table capacity.
    fn default_target_table_size() -> usize {
        defaults::TARGET_TABLE_SIZE
    }

    /// Returns the default index sequence length.
    fn default_index_diff_num() -> usize {
        defaults::INDEX_DIFF_NUM
    }

    /// Returns the default target sequence length.
    fn default_target_diff_num() -> usize {
        defaults::TARGET_DIFF_NUM
    }

    /// Returns the default index queue capacity.
    fn default_index_queue_size() -> usize {
        defaults::INDEX_QUEUE_SIZE
    }

    /// Returns the default range classifier capacity.
    fn default_range_table_size() -> usize {
        defaults::RANGE_TABLE_SIZE
    }

    /// Returns the default scoreboard capacity.
    fn default_scoreboard_size() -> usize {
        defaults::SCOREBOARD_SIZE
    }

    /// Returns the default relation table capacity.
    fn default_relation_table_size() -> usize {
        defaults::RELATION_TABLE_SIZE
    }

    /// Returns the default per-entry candidate capacity.
    fn default_candidate_num() -> usize {
        defaults::CANDIDATE_NUM
    }

    /// Returns the default promotion threshold.
    fn default_miss_threshold() -> u32 {
        defaults::MISS_THRESHOLD
    }

    /// Returns the default shift set.
    fn default_shift_set() -> Vec<u32> {
        defaults::SHIFT_SET.to_vec()
    }

    /// Returns the default range quantization unit.
    fn default_range_unit() -> u64 {
        defaults::RANGE_UNIT
    }

    /// Returns the default histogram bucket count.
    fn default_range_levels() -> usize {
        defaults::RANGE_LEVELS
    }

    /// Returns the default discovery-timer period.
    fn default_detect_period() -> Tick {
        defaults::DETECT_PERIOD
    }

    /// Discovery is on unless the host pins the tables manually.
    fn default_auto_detect() -> bool {
        true
    }

    /// Returns the default cache block size.
    fn default_block_size() -> u64 {
        defaults::BLOCK_SIZE
    }

    /// Returns the default range read-ahead degree.
    fn default_range_degree() -> usize {
        defaults::RANGE_DEGREE
    }

    /// Returns the default range priority group size.
    fn default_range_group_size() -> i32 {
        defaults::RANGE_GROUP_SIZE
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_table_size: defaults::INDEX_TABLE_SIZE,
            target_table_size: defaults::TARGET_TABLE_SIZE,
            index_diff_num: defaults::INDEX_DIFF_NUM,
            target_diff_num: defaults::TARGET_DIFF_NUM,
            index_queue_size: defaults::INDEX_QUEUE_SIZE,
            range_table_size: defaults::RANGE_TABLE_SIZE,
            scoreboard_size: defaults::SCOREBOARD_SIZE,
            relation_table_size: defaults::RELATION_TABLE_SIZE,
            candidate_num: defaults::CANDIDATE_NUM,
            miss_threshold: defaults::MISS_THRESHOLD,
            shift_set: defaults::SHIFT_SET.to_vec(),
            range_unit: defaults::RANGE_UNIT,
            range_levels: defaults::RANGE_LEVELS,
            detect_period: defaults::DETECT_PERIOD,
            auto_detect: true,
            block_size: defaults::BLOCK_SIZE,
            range_degree: defaults::RANGE_DEGREE,
            range_group_size: defaults::RANGE_GROUP_SIZE,
            index_seeds: Vec::new(),
            target_seeds: Vec::new(),
            range_seeds: Vec::new(),
        }
    }
}
