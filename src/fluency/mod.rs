use crate::alignment::content::AlignedToken;
use crate::config::PauseConfig;
use crate::types::{AlignmentOp, PauseEvaluation, RecognizedWord};

mod hesitation;
mod pause;

pub use hesitation::{aggregate_pause_penalty, apply_hesitation_clustering};
pub use pause::{evaluate_pause, speech_rate_scale, PauseContext};

/// Evaluates every punctuation mark of the aligned stream, then applies
/// hesitation clustering. Results are in stream order.
pub fn evaluate_pauses(
    stream: &[AlignedToken],
    recognized: &[RecognizedWord],
    config: &PauseConfig,
) -> Vec<PauseEvaluation> {
    let rate_scale = speech_rate_scale(recognized, config);

    let mut pauses = Vec::new();
    let mut last_word_end: Option<f64> = None;
    let mut prev_word: Option<&str> = None;

    for (idx, token) in stream.iter().enumerate() {
        if token.is_punctuation() {
            let Some(reference) = token.reference.as_ref() else {
                continue;
            };
            let Some(token_index) = token.op.ref_index() else {
                continue;
            };
            let next_start = stream[idx + 1..].iter().find_map(|t| t.start);
            let mut spoken_before = stream[..idx]
                .iter()
                .rev()
                .filter(|t| !t.is_punctuation() && t.start.is_some())
                .filter_map(|t| t.spoken.as_deref());
            // The same word spoken twice in a row right before the mark.
            let after_repetition = matches!(
                (spoken_before.next(), spoken_before.next()),
                (Some(last), Some(before)) if last == before
            );

            let context = PauseContext {
                token_index,
                prev_end: last_word_end,
                next_start,
                prev_word,
                after_repetition,
            };
            pauses.push(evaluate_pause(&reference.text, &context, rate_scale, config));
            continue;
        }

        match token.op {
            AlignmentOp::Match { .. } | AlignmentOp::Substitute { .. } => {
                if token.end.is_some() {
                    last_word_end = token.end;
                }
                prev_word = token.reference.as_ref().map(|t| t.text.as_str());
            }
            AlignmentOp::Insert { .. } => {
                if token.end.is_some() {
                    last_word_end = token.end;
                }
                prev_word = token.spoken.as_deref();
            }
            AlignmentOp::Delete { .. } => {}
        }
    }

    apply_hesitation_clustering(&mut pauses, config);
    tracing::debug!(
        pauses = pauses.len(),
        rate_scale,
        "pause evaluation complete"
    );
    pauses
}
