use crate::config::PhonemeConfig;
use crate::phonetics::PhoneLabel;
use crate::pipeline::traits::CostModel;

/// Accent-tolerant costs: directional softness table, stress-aware vowel
/// weighting and word-final stop discounts.
#[derive(Debug, Clone)]
pub struct AccentTolerantCostModel {
    config: PhonemeConfig,
}

impl AccentTolerantCostModel {
    pub fn new(config: PhonemeConfig) -> Self {
        Self { config }
    }
}

impl Default for AccentTolerantCostModel {
    fn default() -> Self {
        Self::new(PhonemeConfig::default())
    }
}

impl CostModel for AccentTolerantCostModel {
    fn substitution(&self, expected: &PhoneLabel, observed: &PhoneLabel) -> f64 {
        weighted_substitution(&self.config, expected, observed, true)
    }

    fn deletion(&self, expected: &PhoneLabel, word_final: bool) -> f64 {
        discounted_deletion(&self.config, expected, word_final)
    }

    fn insertion(&self, _observed: &PhoneLabel) -> f64 {
        self.config.insertion_cost
    }

    fn name(&self) -> &'static str {
        "accent_tolerant"
    }
}

/// Same as the accent-tolerant model minus the directional softness table.
#[derive(Debug, Clone)]
pub struct StrictCostModel {
    config: PhonemeConfig,
}

impl StrictCostModel {
    pub fn new(config: PhonemeConfig) -> Self {
        Self { config }
    }
}

impl Default for StrictCostModel {
    fn default() -> Self {
        Self::new(PhonemeConfig::default())
    }
}

impl CostModel for StrictCostModel {
    fn substitution(&self, expected: &PhoneLabel, observed: &PhoneLabel) -> f64 {
        weighted_substitution(&self.config, expected, observed, false)
    }

    fn deletion(&self, expected: &PhoneLabel, word_final: bool) -> f64 {
        discounted_deletion(&self.config, expected, word_final)
    }

    fn insertion(&self, _observed: &PhoneLabel) -> f64 {
        self.config.insertion_cost
    }

    fn name(&self) -> &'static str {
        "strict"
    }
}

/// Builds the cost model named by `config.accent_tolerant`.
pub fn cost_model_for(config: &PhonemeConfig) -> Box<dyn CostModel> {
    if config.accent_tolerant {
        Box::new(AccentTolerantCostModel::new(config.clone()))
    } else {
        Box::new(StrictCostModel::new(config.clone()))
    }
}

fn weighted_substitution(
    config: &PhonemeConfig,
    expected: &PhoneLabel,
    observed: &PhoneLabel,
    accent_tolerant: bool,
) -> f64 {
    if expected.same_base(observed) {
        return 0.0;
    }
    let mut cost = config.substitution_cost;
    if expected.is_silence() || observed.is_silence() {
        return cost;
    }
    if accent_tolerant {
        if let Some(factor) = config.accent_factor(expected.base(), observed.base()) {
            cost *= factor;
        }
    }
    if expected.is_primary_stressed_vowel() {
        cost *= config.primary_stress_vowel_multiplier;
    } else if expected.is_vowel() {
        cost *= config.vowel_multiplier;
    }
    cost
}

fn discounted_deletion(config: &PhonemeConfig, expected: &PhoneLabel, word_final: bool) -> f64 {
    let cost = config.deletion_cost;
    if !word_final {
        return cost;
    }
    let base = expected.base();
    if config.final_voiceless_stops.iter().any(|p| p == base) {
        cost * config.final_voiceless_discount
    } else if config.final_voiced_stops.iter().any(|p| p == base) {
        cost * config.final_voiced_discount
    } else {
        cost
    }
}
