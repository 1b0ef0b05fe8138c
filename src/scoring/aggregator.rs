use std::collections::BTreeMap;

use crate::alignment::phoneme::{PhoneError, SubstitutionPattern};
use crate::config::{AggregateConfig, ScoringConfig};
use crate::report::mean;
use crate::scoring::feedback::generate_feedback;
use crate::types::{UtteranceScoreSummary, WordScore};

/// Additive bonus for systematic substitutions: `bonus_per_occurrence * count`
/// for every pattern seen at least `bonus_min_count` times, capped.
pub fn consistency_bonus(
    patterns: &BTreeMap<SubstitutionPattern, u32>,
    config: &ScoringConfig,
) -> f64 {
    let aggregate = &config.aggregate;
    let bonus: f64 = patterns
        .iter()
        .filter(|(_, &count)| count >= aggregate.bonus_min_count)
        .filter(|(pattern, _)| {
            !aggregate.bonus_known_pairs_only
                || config
                    .phoneme
                    .is_known_accent_pair(&pattern.expected, &pattern.observed)
        })
        .map(|(_, &count)| aggregate.bonus_per_occurrence * f64::from(count))
        .sum();
    bonus.min(aggregate.bonus_cap)
}

/// Rhythm component from the aggregated pause penalty.
pub fn rhythm_from_pause_penalty(pause_penalty: f64, config: &AggregateConfig) -> f64 {
    (1.0 - pause_penalty / config.rhythm_penalty_scale).clamp(0.0, 1.0)
}

/// Weighted component score mapped to the 10..=90 scale.
pub fn pte_score(
    phone: f64,
    stress: f64,
    rhythm: f64,
    consistency_bonus: f64,
    config: &AggregateConfig,
) -> f64 {
    let score = config.phone_weight * phone.clamp(0.0, 1.0)
        + config.stress_weight * stress.clamp(0.0, 1.0)
        + config.rhythm_weight * rhythm.clamp(0.0, 1.0)
        + config.consistency_weight * consistency_bonus.clamp(0.0, 1.0);
    (score * config.pte_scale + config.pte_offset).min(config.pte_max)
}

pub fn band_for(score: f64, config: &AggregateConfig) -> u32 {
    config
        .bands
        .iter()
        .find(|b| score >= b.min_score)
        .map_or(config.fallback_band, |b| b.band)
}

/// Everything the aggregator needs from the per-word and pause stages.
#[derive(Debug, Clone, Copy)]
pub struct UtteranceEvidence<'a> {
    /// Phone-scored words only; out-of-vocabulary words are not included.
    pub word_scores: &'a [WordScore],
    pub patterns: &'a BTreeMap<SubstitutionPattern, u32>,
    pub errors: &'a [PhoneError],
    pub pause_penalty: f64,
    pub final_stop_drop_rate: Option<f64>,
}

pub fn summarize(evidence: &UtteranceEvidence<'_>, config: &ScoringConfig) -> UtteranceScoreSummary {
    let aggregate = &config.aggregate;
    let phone_scores: Vec<f64> = evidence
        .word_scores
        .iter()
        .map(|w| w.phone_intelligibility)
        .collect();
    let stress_scores: Vec<f64> = evidence
        .word_scores
        .iter()
        .map(|w| w.stress_accuracy)
        .collect();

    let phone = mean(&phone_scores);
    let stress = mean(&stress_scores);
    let rhythm = rhythm_from_pause_penalty(evidence.pause_penalty, aggregate);
    let bonus = consistency_bonus(evidence.patterns, config);

    let score_pte = if evidence.word_scores.is_empty() {
        tracing::warn!("no phone-scored words; score falls to the floor");
        aggregate.pte_offset
    } else {
        pte_score(phone, stress, rhythm, bonus, aggregate)
    };

    let mut summary = UtteranceScoreSummary {
        phone,
        stress,
        rhythm,
        consistency_bonus: bonus,
        score_pte,
        band: band_for(score_pte, aggregate),
        feedback: Vec::new(),
    };
    summary.feedback = generate_feedback(
        &summary,
        evidence.patterns,
        evidence.errors,
        evidence.final_stop_drop_rate,
        aggregate,
    );
    tracing::debug!(
        phone,
        stress,
        rhythm,
        consistency_bonus = bonus,
        score_pte,
        band = summary.band,
        "utterance summarized"
    );
    summary
}
