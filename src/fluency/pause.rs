use crate::config::PauseConfig;
use crate::types::{PauseEvaluation, PauseStatus, RecognizedWord};

/// Threshold scale from the mean positive inter-word gap, clamped to the
/// configured range. Fewer than two words (or no positive gap) gives 1.0.
pub fn speech_rate_scale(words: &[RecognizedWord], config: &PauseConfig) -> f64 {
    if words.len() < 2 {
        return 1.0;
    }
    let gaps: Vec<f64> = words
        .windows(2)
        .map(|pair| pair[1].start - pair[0].end)
        .filter(|gap| *gap > 0.0)
        .collect();
    if gaps.is_empty() {
        return 1.0;
    }
    let avg_gap = gaps.iter().sum::<f64>() / gaps.len() as f64;
    (avg_gap / config.base_inter_word_gap).clamp(config.rate_scale_min, config.rate_scale_max)
}

/// Where a punctuation mark sits in the aligned stream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PauseContext<'a> {
    pub token_index: usize,
    /// End of the last recognized word before the mark.
    pub prev_end: Option<f64>,
    /// Start of the first recognized word after the mark.
    pub next_start: Option<f64>,
    pub prev_word: Option<&'a str>,
    pub after_repetition: bool,
}

impl PauseContext<'_> {
    pub fn gap(&self) -> Option<f64> {
        match (self.prev_end, self.next_start) {
            (Some(prev), Some(next)) => Some((next - prev).max(0.0)),
            _ => None,
        }
    }
}

pub fn evaluate_pause(
    punctuation: &str,
    context: &PauseContext<'_>,
    rate_scale: f64,
    config: &PauseConfig,
) -> PauseEvaluation {
    let window = config.window_for(punctuation);
    let min_pause = window.min * rate_scale;
    let max_pause = window.max * rate_scale;
    let is_comma = punctuation == ",";
    let duration = context.gap();

    let (status, mut penalty) = match duration {
        None => {
            let penalty = if is_comma {
                config.missed_comma_penalty * rate_scale
            } else {
                config.missed_period_penalty
            };
            (PauseStatus::Missed, penalty)
        }
        Some(gap) if gap < min_pause => {
            let ratio = (min_pause - gap) / min_pause;
            let mut penalty = if ratio <= config.short_soft_floor {
                0.0
            } else {
                (ratio - config.short_soft_floor) / (1.0 - config.short_soft_floor)
                    * config.short_penalty_max
            };
            if is_comma {
                penalty *= config.comma_short_factor;
            }
            (PauseStatus::Short, penalty.min(config.short_penalty_max))
        }
        Some(gap) if gap > max_pause => {
            let penalty = if gap > config.max_pause_duration {
                1.0
            } else {
                let excess = ((gap - max_pause) / max_pause).min(1.0);
                config.long_penalty_floor + excess * (1.0 - config.long_penalty_floor)
            };
            (PauseStatus::Long, penalty)
        }
        Some(_) => (PauseStatus::Correct, 0.0),
    };

    if context
        .prev_word
        .is_some_and(|w| config.is_function_word(w))
    {
        penalty *= config.function_word_factor;
    }
    if context.after_repetition {
        penalty *= config.repetition_factor;
    }

    PauseEvaluation {
        token_index: context.token_index,
        punctuation: punctuation.to_string(),
        duration,
        status,
        penalty: penalty.clamp(0.0, 1.0),
        expected_range: (min_pause, max_pause),
        start: context.prev_end,
        end: context.next_start,
        cluster_size: None,
    }
}
