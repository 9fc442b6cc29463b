//! Operator configuration
//!
//! Every derivation, query and stream operator takes its configuration
//! explicitly. A [`ChoraConfig`] bundles them and loads from YAML:
//!
//! ```yaml
//! familiarity:
//!   half_life_days: 14.0
//! practices:
//!   min_occurrences: 3
//!   classification:
//!     routine_regularity: 0.8
//! dwell:
//!   dwell_radius_m: 50.0
//! ```
//!
//! Missing sections and fields take their defaults.

use crate::error::{ChoraError, ChoraResult};
use crate::model::{FAMILIAR_THRESHOLD, NOVEL_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn invalid(msg: String) -> ChoraError {
    ChoraError::InvalidConfiguration(msg)
}

fn require_positive(field: &str, value: f64) -> ChoraResult<()> {
    if value.is_nan() || value <= 0.0 {
        return Err(invalid(format!("{} must be > 0 (got {}).", field, value)));
    }
    Ok(())
}

fn require_unit(field: &str, value: f64) -> ChoraResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(format!("{} must be in [0, 1] (got {}).", field, value)));
    }
    Ok(())
}

/// Top-level configuration, one section per operator family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoraConfig {
    #[serde(default)]
    pub familiarity: FamiliarityConfig,
    #[serde(default)]
    pub practices: PracticeConfig,
    #[serde(default)]
    pub sequences: SequenceConfig,
    #[serde(default)]
    pub place: PlaceConfig,
    #[serde(default)]
    pub similarity: SimilarityWeights,
    #[serde(default)]
    pub practice_similarity: PracticeSimilarityWeights,
    #[serde(default)]
    pub dwell: DwellConfig,
    #[serde(default)]
    pub trace: TraceExtractionConfig,
    #[serde(default)]
    pub liminality: LiminalityConfig,
}

impl ChoraConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> ChoraResult<Self> {
        let config: ChoraConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> ChoraResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn validate(&self) -> ChoraResult<()> {
        self.familiarity.validate()?;
        self.practices.validate()?;
        self.sequences.validate()?;
        self.place.validate()?;
        self.similarity.validate()?;
        self.practice_similarity.validate()?;
        self.dwell.validate()?;
        self.trace.validate()?;
        self.liminality.validate()
    }
}

/// Familiarity decay and reinforcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamiliarityConfig {
    /// Days for an unreinforced value to halve (default: 14).
    #[serde(default = "default_half_life_days")]
    pub half_life_days: f64,
    /// Share of the remaining headroom one full-strength encounter closes (default: 0.25).
    #[serde(default = "default_reinforcement_rate")]
    pub reinforcement_rate: f64,
    /// Duration at which reinforcement reaches ~76% of its ceiling (default: 1h).
    #[serde(default = "default_duration_scale_hours")]
    pub duration_scale_hours: f64,
    /// Duration assumed for encounters with no end time (default: 1h).
    #[serde(default = "default_duration_hours")]
    pub default_duration_hours: f64,
}

impl Default for FamiliarityConfig {
    fn default() -> Self {
        Self {
            half_life_days: default_half_life_days(),
            reinforcement_rate: default_reinforcement_rate(),
            duration_scale_hours: default_duration_scale_hours(),
            default_duration_hours: default_duration_hours(),
        }
    }
}

fn default_half_life_days() -> f64 {
    14.0
}
fn default_reinforcement_rate() -> f64 {
    0.25
}
fn default_duration_scale_hours() -> f64 {
    1.0
}
fn default_duration_hours() -> f64 {
    1.0
}

impl FamiliarityConfig {
    pub fn validate(&self) -> ChoraResult<()> {
        require_positive("familiarity.half_life_days", self.half_life_days)?;
        require_unit("familiarity.reinforcement_rate", self.reinforcement_rate)?;
        require_positive("familiarity.duration_scale_hours", self.duration_scale_hours)?;
        if self.default_duration_hours.is_nan() || self.default_duration_hours < 0.0 {
            return Err(invalid(format!(
                "familiarity.default_duration_hours must be >= 0 (got {}).",
                self.default_duration_hours
            )));
        }
        Ok(())
    }
}

/// Boundaries between routine, habit and ritual.
///
/// The reference defaults are informal; all of them are tunable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationThresholds {
    /// Minimum regularity for a routine (default: 0.8).
    #[serde(default = "default_routine_regularity")]
    pub routine_regularity: f64,
    /// Share of the analysis range a routine must span (default: 0.5).
    #[serde(default = "default_routine_coverage")]
    pub routine_coverage: f64,
    /// Lower regularity bound of a habit; the upper bound is `routine_regularity` (default: 0.3).
    #[serde(default = "default_habit_regularity")]
    pub habit_regularity: f64,
    /// Occurrence count at or above which a pattern is "frequent" (default: 5).
    #[serde(default = "default_frequent_threshold")]
    pub frequent_threshold: u32,
    /// Minimum regularity within a ritual's own narrow window (default: 0.8).
    #[serde(default = "default_ritual_regularity")]
    pub ritual_regularity: f64,
    /// Most distinct weekdays a ritual may fall on (default: 2).
    #[serde(default = "default_ritual_max_weekdays")]
    pub ritual_max_weekdays: usize,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            routine_regularity: default_routine_regularity(),
            routine_coverage: default_routine_coverage(),
            habit_regularity: default_habit_regularity(),
            frequent_threshold: default_frequent_threshold(),
            ritual_regularity: default_ritual_regularity(),
            ritual_max_weekdays: default_ritual_max_weekdays(),
        }
    }
}

fn default_routine_regularity() -> f64 {
    0.8
}
fn default_routine_coverage() -> f64 {
    0.5
}
fn default_habit_regularity() -> f64 {
    0.3
}
fn default_frequent_threshold() -> u32 {
    5
}
fn default_ritual_regularity() -> f64 {
    0.8
}
fn default_ritual_max_weekdays() -> usize {
    2
}

impl ClassificationThresholds {
    pub fn validate(&self) -> ChoraResult<()> {
        require_unit("practices.classification.routine_regularity", self.routine_regularity)?;
        require_unit("practices.classification.routine_coverage", self.routine_coverage)?;
        require_unit("practices.classification.habit_regularity", self.habit_regularity)?;
        require_unit("practices.classification.ritual_regularity", self.ritual_regularity)?;
        if self.habit_regularity > self.routine_regularity {
            return Err(invalid(format!(
                "practices.classification.habit_regularity ({}) must not exceed routine_regularity ({}).",
                self.habit_regularity, self.routine_regularity
            )));
        }
        if self.ritual_max_weekdays == 0 || self.ritual_max_weekdays > 7 {
            return Err(invalid(format!(
                "practices.classification.ritual_max_weekdays must be in 1..=7 (got {}).",
                self.ritual_max_weekdays
            )));
        }
        Ok(())
    }
}

/// Temporal practice detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeConfig {
    /// Patterns seen fewer times are never reported (default: 3).
    #[serde(default = "default_min_occurrences")]
    pub min_occurrences: u32,
    /// Days before the agent's latest encounter that are analysed (default: 30).
    #[serde(default = "default_time_window_days")]
    pub time_window_days: u32,
    /// Hours within which two visits count as "the same time of day" (default: 1).
    #[serde(default = "default_time_tolerance_hours")]
    pub time_tolerance_hours: f64,
    /// Patterns below this regularity are never reported (default: 0.5).
    #[serde(default = "default_min_regularity")]
    pub min_regularity: f64,
    #[serde(default)]
    pub classification: ClassificationThresholds,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            min_occurrences: default_min_occurrences(),
            time_window_days: default_time_window_days(),
            time_tolerance_hours: default_time_tolerance_hours(),
            min_regularity: default_min_regularity(),
            classification: ClassificationThresholds::default(),
        }
    }
}

fn default_min_occurrences() -> u32 {
    3
}
fn default_time_window_days() -> u32 {
    30
}
fn default_time_tolerance_hours() -> f64 {
    1.0
}
fn default_min_regularity() -> f64 {
    0.5
}

impl PracticeConfig {
    pub fn validate(&self) -> ChoraResult<()> {
        if self.min_occurrences == 0 {
            return Err(invalid("practices.min_occurrences must be > 0.".to_string()));
        }
        if self.time_window_days == 0 {
            return Err(invalid("practices.time_window_days must be > 0.".to_string()));
        }
        require_positive("practices.time_tolerance_hours", self.time_tolerance_hours)?;
        if self.time_tolerance_hours > 12.0 {
            return Err(invalid(format!(
                "practices.time_tolerance_hours must be <= 12 (got {}).",
                self.time_tolerance_hours
            )));
        }
        require_unit("practices.min_regularity", self.min_regularity)?;
        self.classification.validate()
    }
}

/// Place-to-place sequence mining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Minimum motif occurrences to report (default: 2).
    #[serde(default = "default_min_support")]
    pub min_support: u32,
    /// Longest gap between consecutive stops of one trip (default: 3h).
    #[serde(default = "default_max_gap_hours")]
    pub max_gap_hours: f64,
    /// Longest motif mined, in stops (default: 3).
    #[serde(default = "default_max_motif_len")]
    pub max_motif_len: usize,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            min_support: default_min_support(),
            max_gap_hours: default_max_gap_hours(),
            max_motif_len: default_max_motif_len(),
        }
    }
}

fn default_min_support() -> u32 {
    2
}
fn default_max_gap_hours() -> f64 {
    3.0
}
fn default_max_motif_len() -> usize {
    3
}

impl SequenceConfig {
    pub fn validate(&self) -> ChoraResult<()> {
        if self.min_support == 0 {
            return Err(invalid("sequences.min_support must be > 0.".to_string()));
        }
        require_positive("sequences.max_gap_hours", self.max_gap_hours)?;
        if self.max_motif_len < 2 {
            return Err(invalid(format!(
                "sequences.max_motif_len must be >= 2 (got {}).",
                self.max_motif_len
            )));
        }
        Ok(())
    }
}

/// Emergent place synthesis and character labelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceConfig {
    /// Half-life for decaying familiarity and weighting affect (default: 14 days).
    #[serde(default = "default_half_life_days")]
    pub half_life_days: f64,
    /// Familiarity at or above which a place is "familiar" (default: 0.5).
    #[serde(default = "default_familiar_threshold")]
    pub familiar_threshold: f64,
    /// Familiarity below which a place is "novel" (default: 0.2).
    #[serde(default = "default_novel_threshold")]
    pub novel_threshold: f64,
    /// Mean valence above which a place is "positive" (default: 0.3).
    #[serde(default = "default_positive_valence")]
    pub positive_valence: f64,
    /// Mean valence below which a place is "negative" (default: -0.3).
    #[serde(default = "default_negative_valence")]
    pub negative_valence: f64,
    /// Liminality intensity at or above which a place is "liminal" (default: 0.5).
    #[serde(default = "default_liminal_threshold")]
    pub liminal_threshold: f64,
    /// Reinforcement rate used when replaying history up to an earlier instant (default: 0.25).
    #[serde(default = "default_reinforcement_rate")]
    pub reinforcement_rate: f64,
    /// Duration scale used when replaying history (default: 1h).
    #[serde(default = "default_duration_scale_hours")]
    pub duration_scale_hours: f64,
    /// Duration assumed for open encounters when replaying history (default: 1h).
    #[serde(default = "default_duration_hours")]
    pub default_duration_hours: f64,
}

impl Default for PlaceConfig {
    fn default() -> Self {
        Self {
            half_life_days: default_half_life_days(),
            reinforcement_rate: default_reinforcement_rate(),
            duration_scale_hours: default_duration_scale_hours(),
            default_duration_hours: default_duration_hours(),
            familiar_threshold: default_familiar_threshold(),
            novel_threshold: default_novel_threshold(),
            positive_valence: default_positive_valence(),
            negative_valence: default_negative_valence(),
            liminal_threshold: default_liminal_threshold(),
        }
    }
}

fn default_familiar_threshold() -> f64 {
    FAMILIAR_THRESHOLD
}
fn default_novel_threshold() -> f64 {
    NOVEL_THRESHOLD
}
fn default_positive_valence() -> f64 {
    0.3
}
fn default_negative_valence() -> f64 {
    -0.3
}
fn default_liminal_threshold() -> f64 {
    0.5
}

impl PlaceConfig {
    /// The familiarity model places are evaluated with
    pub fn familiarity(&self) -> FamiliarityConfig {
        FamiliarityConfig {
            half_life_days: self.half_life_days,
            reinforcement_rate: self.reinforcement_rate,
            duration_scale_hours: self.duration_scale_hours,
            default_duration_hours: self.default_duration_hours,
        }
    }

    pub fn validate(&self) -> ChoraResult<()> {
        require_positive("place.half_life_days", self.half_life_days)?;
        require_unit("place.reinforcement_rate", self.reinforcement_rate)?;
        require_positive("place.duration_scale_hours", self.duration_scale_hours)?;
        if self.default_duration_hours.is_nan() || self.default_duration_hours < 0.0 {
            return Err(invalid(format!(
                "place.default_duration_hours must be >= 0 (got {}).",
                self.default_duration_hours
            )));
        }
        require_unit("place.familiar_threshold", self.familiar_threshold)?;
        require_unit("place.novel_threshold", self.novel_threshold)?;
        require_unit("place.liminal_threshold", self.liminal_threshold)?;
        if self.novel_threshold > self.familiar_threshold {
            return Err(invalid(format!(
                "place.novel_threshold ({}) must not exceed familiar_threshold ({}).",
                self.novel_threshold, self.familiar_threshold
            )));
        }
        if self.negative_valence > self.positive_valence {
            return Err(invalid(format!(
                "place.negative_valence ({}) must not exceed positive_valence ({}).",
                self.negative_valence, self.positive_valence
            )));
        }
        Ok(())
    }
}

fn validate_weights(section: &str, weights: &[(&str, f64)]) -> ChoraResult<()> {
    for (name, w) in weights {
        if w.is_nan() || *w < 0.0 {
            return Err(invalid(format!("{}.{} must be >= 0 (got {}).", section, name, w)));
        }
    }
    if weights.iter().map(|(_, w)| w).sum::<f64>() <= 0.0 {
        return Err(invalid(format!("{} weights must not all be zero.", section)));
    }
    Ok(())
}

/// Weights for `place_similarity`; normalized by their sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    #[serde(default = "default_familiarity_weight")]
    pub familiarity: f64,
    #[serde(default = "default_valence_weight")]
    pub valence: f64,
    #[serde(default = "default_arousal_weight")]
    pub arousal: f64,
    /// Jaccard overlap of meaning symbols
    #[serde(default = "default_symbols_weight")]
    pub symbols: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            familiarity: default_familiarity_weight(),
            valence: default_valence_weight(),
            arousal: default_arousal_weight(),
            symbols: default_symbols_weight(),
        }
    }
}

fn default_familiarity_weight() -> f64 {
    0.4
}
fn default_valence_weight() -> f64 {
    0.2
}
fn default_arousal_weight() -> f64 {
    0.1
}
fn default_symbols_weight() -> f64 {
    0.3
}

impl SimilarityWeights {
    pub fn validate(&self) -> ChoraResult<()> {
        validate_weights(
            "similarity",
            &[
                ("familiarity", self.familiarity),
                ("valence", self.valence),
                ("arousal", self.arousal),
                ("symbols", self.symbols),
            ],
        )
    }
}

/// Weights for `practice_similarity`; normalized by their sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeSimilarityWeights {
    #[serde(default = "default_regularity_weight")]
    pub regularity: f64,
    #[serde(default = "default_frequency_weight")]
    pub frequency: f64,
    /// Closeness of typical time-of-day windows
    #[serde(default = "default_time_of_day_weight")]
    pub time_of_day: f64,
    /// Jaccard overlap of practice labels
    #[serde(default = "default_labels_weight")]
    pub labels: f64,
}

impl Default for PracticeSimilarityWeights {
    fn default() -> Self {
        Self {
            regularity: default_regularity_weight(),
            frequency: default_frequency_weight(),
            time_of_day: default_time_of_day_weight(),
            labels: default_labels_weight(),
        }
    }
}

fn default_regularity_weight() -> f64 {
    0.3
}
fn default_frequency_weight() -> f64 {
    0.2
}
fn default_time_of_day_weight() -> f64 {
    0.2
}
fn default_labels_weight() -> f64 {
    0.3
}

impl PracticeSimilarityWeights {
    pub fn validate(&self) -> ChoraResult<()> {
        validate_weights(
            "practice_similarity",
            &[
                ("regularity", self.regularity),
                ("frequency", self.frequency),
                ("time_of_day", self.time_of_day),
                ("labels", self.labels),
            ],
        )
    }
}

/// Streaming dwell detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DwellConfig {
    /// Radius around the running centroid that counts as "staying" (default: 50m).
    #[serde(default = "default_dwell_radius_m")]
    pub dwell_radius_m: f64,
    /// Time inside the radius before MOVING becomes DWELLING (default: 60s).
    #[serde(default = "default_dwell_time_s")]
    pub dwell_time_s: f64,
    /// Dwell duration at which an encounter is written (default: 300s).
    #[serde(default = "default_min_dwell_for_encounter_s")]
    pub min_dwell_for_encounter_s: f64,
    /// Radius for matching a dwell centroid to an existing point extent (default: 50m).
    #[serde(default = "default_extent_match_radius_m")]
    pub extent_match_radius_m: f64,
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            dwell_radius_m: default_dwell_radius_m(),
            dwell_time_s: default_dwell_time_s(),
            min_dwell_for_encounter_s: default_min_dwell_for_encounter_s(),
            extent_match_radius_m: default_extent_match_radius_m(),
        }
    }
}

fn default_dwell_radius_m() -> f64 {
    50.0
}
fn default_dwell_time_s() -> f64 {
    60.0
}
fn default_min_dwell_for_encounter_s() -> f64 {
    300.0
}
fn default_extent_match_radius_m() -> f64 {
    50.0
}

impl DwellConfig {
    pub fn validate(&self) -> ChoraResult<()> {
        require_positive("dwell.dwell_radius_m", self.dwell_radius_m)?;
        if self.dwell_time_s.is_nan() || self.dwell_time_s < 0.0 {
            return Err(invalid(format!("dwell.dwell_time_s must be >= 0 (got {}).", self.dwell_time_s)));
        }
        if self.min_dwell_for_encounter_s.is_nan() || self.min_dwell_for_encounter_s < self.dwell_time_s {
            return Err(invalid(format!(
                "dwell.min_dwell_for_encounter_s ({}) must be >= dwell_time_s ({}).",
                self.min_dwell_for_encounter_s, self.dwell_time_s
            )));
        }
        if self.extent_match_radius_m.is_nan() || self.extent_match_radius_m < 0.0 {
            return Err(invalid(format!(
                "dwell.extent_match_radius_m must be >= 0 (got {}).",
                self.extent_match_radius_m
            )));
        }
        Ok(())
    }
}

/// Batch encounter extraction from location traces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceExtractionConfig {
    /// Shortest stay that becomes an encounter (default: 60s).
    #[serde(default = "default_min_duration_s")]
    pub min_duration_s: f64,
    /// Longest gap between points of one stay (default: 30 min).
    #[serde(default = "default_max_gap_s")]
    pub max_gap_s: f64,
    /// Greedy clustering radius (default: 50m).
    #[serde(default = "default_cluster_radius_m")]
    pub cluster_radius_m: f64,
    /// Fewest points in a cluster (default: 2).
    #[serde(default = "default_min_points")]
    pub min_points: usize,
}

impl Default for TraceExtractionConfig {
    fn default() -> Self {
        Self {
            min_duration_s: default_min_duration_s(),
            max_gap_s: default_max_gap_s(),
            cluster_radius_m: default_cluster_radius_m(),
            min_points: default_min_points(),
        }
    }
}

fn default_min_duration_s() -> f64 {
    60.0
}
fn default_max_gap_s() -> f64 {
    1800.0
}
fn default_cluster_radius_m() -> f64 {
    50.0
}
fn default_min_points() -> usize {
    2
}

impl TraceExtractionConfig {
    pub fn validate(&self) -> ChoraResult<()> {
        if self.min_duration_s.is_nan() || self.min_duration_s < 0.0 {
            return Err(invalid(format!(
                "trace.min_duration_s must be >= 0 (got {}).",
                self.min_duration_s
            )));
        }
        require_positive("trace.max_gap_s", self.max_gap_s)?;
        require_positive("trace.cluster_radius_m", self.cluster_radius_m)?;
        if self.min_points == 0 {
            return Err(invalid("trace.min_points must be > 0.".to_string()));
        }
        Ok(())
    }
}

/// Liminality inference from short transit stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiminalityConfig {
    /// Stops shorter than this between two differently typed extents are crossings (default: 5 min).
    #[serde(default = "default_max_transit_minutes")]
    pub max_transit_minutes: f64,
    /// Crossings needed before an extent is called liminal (default: 3).
    #[serde(default = "default_min_transitions")]
    pub min_transitions: u32,
}

impl Default for LiminalityConfig {
    fn default() -> Self {
        Self {
            max_transit_minutes: default_max_transit_minutes(),
            min_transitions: default_min_transitions(),
        }
    }
}

fn default_max_transit_minutes() -> f64 {
    5.0
}
fn default_min_transitions() -> u32 {
    3
}

impl LiminalityConfig {
    pub fn validate(&self) -> ChoraResult<()> {
        require_positive("liminality.max_transit_minutes", self.max_transit_minutes)?;
        if self.min_transitions == 0 {
            return Err(invalid("liminality.min_transitions must be > 0.".to_string()));
        }
        Ok(())
    }
}
