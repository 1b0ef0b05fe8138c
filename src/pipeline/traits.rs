use crate::error::ScoringError;
use crate::phonetics::PhoneLabel;
use crate::types::{AlignmentOp, PhoneInterval, WordSpan};

/// Word-level edit-distance alignment of reference against recognized words.
///
/// Returned indices must lie inside `reference` and `hypothesis`. Ops that
/// point past either slice are dropped from the aligned stream with a warning.
pub trait ContentAligner: Send + Sync {
    fn align(&self, reference: &[&str], hypothesis: &[&str]) -> Vec<AlignmentOp>;
}

/// Edit costs of the phoneme aligner.
pub trait CostModel: Send + Sync {
    fn substitution(&self, expected: &PhoneLabel, observed: &PhoneLabel) -> f64;
    fn deletion(&self, expected: &PhoneLabel, word_final: bool) -> f64;
    fn insertion(&self, observed: &PhoneLabel) -> f64;
    fn name(&self) -> &'static str;
}

/// Produces the observed phone sequence of one recognized word.
pub trait PhonemeRecognizer: Send + Sync {
    fn observed_phones(
        &self,
        span: &WordSpan,
        intervals: &[PhoneInterval],
    ) -> Result<Vec<PhoneLabel>, ScoringError>;
}

impl<F> PhonemeRecognizer for F
where
    F: Fn(&WordSpan, &[PhoneInterval]) -> Result<Vec<PhoneLabel>, ScoringError> + Send + Sync,
{
    fn observed_phones(
        &self,
        span: &WordSpan,
        intervals: &[PhoneInterval],
    ) -> Result<Vec<PhoneLabel>, ScoringError> {
        self(span, intervals)
    }
}
