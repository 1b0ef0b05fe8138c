use std::path::Path;

use serde::Deserialize;

use crate::error::ScoringError;

/// Every tunable weight, threshold and discount used by the scorer.
///
/// Deserializes from JSON with per-section defaults, so a config file only
/// needs to name the values it overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub phoneme: PhonemeConfig,
    pub pause: PauseConfig,
    pub baseline: BaselineConfig,
    pub aggregate: AggregateConfig,
}

impl ScoringConfig {
    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| ScoringError::io("read scoring config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| ScoringError::json("parse scoring config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        for (name, window) in [
            ("pause.comma_window", self.pause.comma_window),
            ("pause.period_window", self.pause.period_window),
        ] {
            if !(window.min > 0.0 && window.min <= window.max) {
                return Err(ScoringError::invalid_input(format!(
                    "{name} must satisfy 0 < min <= max (got {}..{})",
                    window.min, window.max
                )));
            }
        }
        if self.pause.rate_scale_min > self.pause.rate_scale_max {
            return Err(ScoringError::invalid_input(
                "pause.rate_scale_min exceeds pause.rate_scale_max",
            ));
        }
        if self.pause.base_inter_word_gap <= 0.0 {
            return Err(ScoringError::invalid_input(
                "pause.base_inter_word_gap must be positive",
            ));
        }
        if self.phoneme.length_tolerance <= 0.0 {
            return Err(ScoringError::invalid_input(
                "phoneme.length_tolerance must be positive",
            ));
        }
        if self.aggregate.rhythm_penalty_scale <= 0.0 {
            return Err(ScoringError::invalid_input(
                "aggregate.rhythm_penalty_scale must be positive",
            ));
        }
        Ok(())
    }
}

/// Directional substitution softness: cost multiplier for `expected -> observed`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccentSubstitution {
    pub expected: String,
    pub observed: String,
    pub factor: f64,
}

impl AccentSubstitution {
    fn new(expected: &str, observed: &str, factor: f64) -> Self {
        Self {
            expected: expected.to_string(),
            observed: observed.to_string(),
            factor,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhonemeConfig {
    /// Selects `AccentTolerantCostModel` over `StrictCostModel` by default.
    pub accent_tolerant: bool,
    pub accent_substitutions: Vec<AccentSubstitution>,
    pub substitution_cost: f64,
    pub insertion_cost: f64,
    pub deletion_cost: f64,
    pub primary_stress_vowel_multiplier: f64,
    pub vowel_multiplier: f64,
    pub final_voiceless_stops: Vec<String>,
    pub final_voiceless_discount: f64,
    pub final_voiced_stops: Vec<String>,
    pub final_voiced_discount: f64,
    /// Max cost per expected phone used to normalize intelligibility.
    pub length_tolerance: f64,
}

impl PhonemeConfig {
    pub fn accent_factor(&self, expected: &str, observed: &str) -> Option<f64> {
        self.accent_substitutions
            .iter()
            .find(|s| s.expected == expected && s.observed == observed)
            .map(|s| s.factor)
    }

    pub fn is_known_accent_pair(&self, expected: &str, observed: &str) -> bool {
        self.accent_factor(expected, observed).is_some()
    }
}

impl Default for PhonemeConfig {
    fn default() -> Self {
        Self {
            accent_tolerant: true,
            accent_substitutions: vec![
                AccentSubstitution::new("TH", "T", 0.4),
                AccentSubstitution::new("TH", "D", 0.4),
                AccentSubstitution::new("DH", "D", 0.4),
                AccentSubstitution::new("DH", "T", 0.5),
                AccentSubstitution::new("V", "W", 0.3),
                AccentSubstitution::new("W", "V", 0.6),
                AccentSubstitution::new("Z", "S", 0.4),
                AccentSubstitution::new("ZH", "SH", 0.5),
            ],
            substitution_cost: 1.0,
            insertion_cost: 1.0,
            deletion_cost: 1.0,
            primary_stress_vowel_multiplier: 1.4,
            vowel_multiplier: 1.2,
            final_voiceless_stops: ["T", "K", "P"].map(String::from).to_vec(),
            final_voiceless_discount: 0.3,
            final_voiced_stops: ["D", "B", "G"].map(String::from).to_vec(),
            final_voiced_discount: 0.7,
            length_tolerance: 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PauseWindow {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PauseConfig {
    pub comma_window: PauseWindow,
    pub period_window: PauseWindow,
    pub missed_comma_penalty: f64,
    pub missed_period_penalty: f64,
    /// Short-pause deviation ratio ignored before any penalty applies.
    pub short_soft_floor: f64,
    pub short_penalty_max: f64,
    pub comma_short_factor: f64,
    pub long_penalty_floor: f64,
    /// Gaps above this many seconds always take the full penalty.
    pub max_pause_duration: f64,
    pub base_inter_word_gap: f64,
    pub rate_scale_min: f64,
    pub rate_scale_max: f64,
    pub function_words: Vec<String>,
    pub function_word_factor: f64,
    pub repetition_factor: f64,
    pub cluster_window: f64,
    pub cluster_step: f64,
    pub max_aggregate_penalty: f64,
}

impl PauseConfig {
    pub fn window_for(&self, punctuation: &str) -> PauseWindow {
        match punctuation {
            "." => self.period_window,
            _ => self.comma_window,
        }
    }

    pub fn is_function_word(&self, word: &str) -> bool {
        self.function_words
            .iter()
            .any(|w| w.eq_ignore_ascii_case(word))
    }
}

impl Default for PauseConfig {
    fn default() -> Self {
        Self {
            comma_window: PauseWindow { min: 0.3, max: 0.5 },
            period_window: PauseWindow { min: 0.6, max: 1.0 },
            missed_comma_penalty: 0.05,
            missed_period_penalty: 0.3,
            short_soft_floor: 0.3,
            short_penalty_max: 0.3,
            comma_short_factor: 0.5,
            long_penalty_floor: 0.5,
            max_pause_duration: 1.5,
            base_inter_word_gap: 0.25,
            rate_scale_min: 0.5,
            rate_scale_max: 2.0,
            function_words: [
                "a", "an", "the", "of", "to", "in", "on", "at", "for", "with", "by", "from", "as",
                "is", "was", "are", "were",
            ]
            .map(String::from)
            .to_vec(),
            function_word_factor: 0.6,
            repetition_factor: 1.5,
            cluster_window: 2.0,
            cluster_step: 0.2,
            max_aggregate_penalty: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct IntelligibilityWeights {
    pub speech_rate: f64,
    pub pause_patterns: f64,
    pub vowel_quality: f64,
    pub phone_coverage: f64,
    pub consistency: f64,
}

impl Default for IntelligibilityWeights {
    fn default() -> Self {
        Self {
            speech_rate: 0.25,
            pause_patterns: 0.20,
            vowel_quality: 0.20,
            phone_coverage: 0.15,
            consistency: 0.20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    pub window_secs: f64,
    pub min_phones: usize,
    pub default_speech_rate: f64,
    pub default_median_vowel: f64,
    pub default_median_consonant: f64,
    pub default_avg_pause: f64,
    pub default_vowel_ratio: f64,
    pub native_vowel_median: f64,
    pub native_consonant_median: f64,
    /// Expected duration for phones missing from the native duration table.
    pub default_expected_duration: f64,
    pub duration_std_fraction: f64,
    pub duration_z_threshold: f64,
    pub min_speech_rate: f64,
    pub max_speech_rate: f64,
    pub max_average_pause: f64,
    pub vowel_ratio_min: f64,
    pub vowel_ratio_max: f64,
    pub full_coverage_phones: usize,
    pub intelligibility_weights: IntelligibilityWeights,
    pub intelligible_confidence: f64,
    pub intelligibility_floor: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            window_secs: 3.0,
            min_phones: 10,
            default_speech_rate: 10.0,
            default_median_vowel: 0.10,
            default_median_consonant: 0.06,
            default_avg_pause: 0.1,
            default_vowel_ratio: 0.4,
            native_vowel_median: 0.12,
            native_consonant_median: 0.06,
            default_expected_duration: 0.08,
            duration_std_fraction: 0.25,
            duration_z_threshold: 2.0,
            min_speech_rate: 5.0,
            max_speech_rate: 20.0,
            max_average_pause: 0.5,
            vowel_ratio_min: 0.2,
            vowel_ratio_max: 0.7,
            full_coverage_phones: 20,
            intelligibility_weights: IntelligibilityWeights::default(),
            intelligible_confidence: 0.6,
            intelligibility_floor: 0.55,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BandThreshold {
    pub min_score: f64,
    pub band: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    pub phone_weight: f64,
    pub stress_weight: f64,
    pub rhythm_weight: f64,
    pub consistency_weight: f64,
    /// Pause contribution that maps to a rhythm of zero.
    pub rhythm_penalty_scale: f64,
    pub pte_scale: f64,
    pub pte_offset: f64,
    pub pte_max: f64,
    /// Descending thresholds; the first one met wins.
    pub bands: Vec<BandThreshold>,
    pub fallback_band: u32,
    pub bonus_per_occurrence: f64,
    pub bonus_min_count: u32,
    pub bonus_cap: f64,
    /// Only reward patterns listed in `PhonemeConfig::accent_substitutions`.
    pub bonus_known_pairs_only: bool,
    pub mispronounced_threshold: f64,
    pub feedback_cap: usize,
    pub top_errors: usize,
    pub stress_guidance_threshold: f64,
    pub rhythm_guidance_threshold: f64,
    pub final_stop_drop_threshold: f64,
    pub strong_phone_threshold: f64,
    pub strong_stress_threshold: f64,
    pub consistent_bonus_threshold: f64,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            phone_weight: 0.55,
            stress_weight: 0.25,
            rhythm_weight: 0.10,
            consistency_weight: 0.10,
            rhythm_penalty_scale: 0.3,
            pte_scale: 90.0,
            pte_offset: 10.0,
            pte_max: 90.0,
            bands: [
                (90.0, 90),
                (85.0, 85),
                (80.0, 79),
                (75.0, 73),
                (70.0, 65),
                (60.0, 58),
                (50.0, 50),
                (45.0, 45),
            ]
            .map(|(min_score, band)| BandThreshold { min_score, band })
            .to_vec(),
            fallback_band: 30,
            bonus_per_occurrence: 0.02,
            bonus_min_count: 3,
            bonus_cap: 0.10,
            bonus_known_pairs_only: false,
            mispronounced_threshold: 0.75,
            feedback_cap: 5,
            top_errors: 3,
            stress_guidance_threshold: 0.75,
            rhythm_guidance_threshold: 0.75,
            final_stop_drop_threshold: 0.2,
            strong_phone_threshold: 0.75,
            strong_stress_threshold: 0.8,
            consistent_bonus_threshold: 0.06,
        }
    }
}
