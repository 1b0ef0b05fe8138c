use std::cmp::Ordering;

use serde::Serialize;

use crate::types::{WordReport, WordStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreStats {
    pub total_words: u32,
    pub correct: u32,
    pub mispronounced: u32,
    pub missed: u32,
    pub repeated: u32,
    pub substituted: u32,
    /// Percentage of `correct` words over all word entries.
    pub accuracy: f64,
    /// Mean phone intelligibility over correct words that were phone-scored.
    pub mean_correct_intelligibility: f64,
}

pub fn compute_stats(words: &[WordReport]) -> ScoreStats {
    let count = |status: WordStatus| to_u32(words.iter().filter(|w| w.status == status).count());

    let total_words = to_u32(words.len());
    let correct = count(WordStatus::Correct);
    let correct_scores: Vec<f64> = words
        .iter()
        .filter(|w| w.status == WordStatus::Correct)
        .filter_map(|w| w.phone_intelligibility)
        .collect();

    ScoreStats {
        total_words,
        correct,
        mispronounced: count(WordStatus::Mispronounced),
        missed: count(WordStatus::Missed),
        repeated: count(WordStatus::Repeated),
        substituted: count(WordStatus::Substituted),
        accuracy: if total_words > 0 {
            f64::from(correct) / f64::from(total_words) * 100.0
        } else {
            0.0
        },
        mean_correct_intelligibility: mean(&correct_scores),
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Median of a slice that is not yet sorted.
pub(crate) fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    median_sorted(&sorted)
}

pub(crate) fn median_sorted(sorted_values: &[f64]) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    let mid = sorted_values.len() / 2;
    if sorted_values.len() % 2 == 0 {
        (sorted_values[mid - 1] + sorted_values[mid]) / 2.0
    } else {
        sorted_values[mid]
    }
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
