use crate::alignment::content::align_tokens;
use crate::error::ScoringError;
use crate::phonetics::PhoneLabel;
use crate::pipeline::traits::{ContentAligner, PhonemeRecognizer};
use crate::types::{AlignmentOp, PhoneInterval, WordSpan};

pub struct EditDistanceAligner;

impl ContentAligner for EditDistanceAligner {
    fn align(&self, reference: &[&str], hypothesis: &[&str]) -> Vec<AlignmentOp> {
        align_tokens(reference, hypothesis)
    }
}

/// Reads observed phones from forced-aligner intervals contained in the word
/// span, allowing `tolerance` seconds of slack on both edges.
pub struct IntervalPhoneRecognizer {
    pub tolerance: f64,
}

impl IntervalPhoneRecognizer {
    pub const DEFAULT_TOLERANCE: f64 = 0.01;
}

impl Default for IntervalPhoneRecognizer {
    fn default() -> Self {
        Self {
            tolerance: Self::DEFAULT_TOLERANCE,
        }
    }
}

impl PhonemeRecognizer for IntervalPhoneRecognizer {
    fn observed_phones(
        &self,
        span: &WordSpan,
        intervals: &[PhoneInterval],
    ) -> Result<Vec<PhoneLabel>, ScoringError> {
        let (Some(start), Some(end)) = (span.start, span.end) else {
            return Ok(Vec::new());
        };
        Ok(intervals_within(intervals, start, end, self.tolerance)
            .map(|p| PhoneLabel::parse(&p.label))
            .filter(|label| !label.is_silence())
            .collect())
    }
}

pub(crate) fn intervals_within(
    intervals: &[PhoneInterval],
    start: f64,
    end: f64,
    tolerance: f64,
) -> impl Iterator<Item = &PhoneInterval> {
    intervals
        .iter()
        .filter(move |p| p.start >= start - tolerance && p.end <= end + tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(label: &str, start: f64, end: f64) -> PhoneInterval {
        PhoneInterval {
            label: label.to_string(),
            start,
            end,
        }
    }

    fn span(start: Option<f64>, end: Option<f64>) -> WordSpan {
        WordSpan {
            word: "cat".to_string(),
            start,
            end,
        }
    }

    #[test]
    fn edit_distance_aligner_delegates() {
        let ops = EditDistanceAligner.align(&["a", "b"], &["a", "c"]);
        assert_eq!(
            ops,
            vec![
                AlignmentOp::Match {
                    ref_index: 0,
                    hyp_index: 0
                },
                AlignmentOp::Substitute {
                    ref_index: 1,
                    hyp_index: 1
                },
            ]
        );
    }

    #[test]
    fn interval_recognizer_keeps_contained_speech_phones() {
        let intervals = [
            interval("SIL", 0.0, 0.5),
            interval("K", 0.5, 0.6),
            interval("AE1", 0.6, 0.75),
            interval("sp", 0.75, 0.8),
            interval("T", 0.8, 0.905),
            interval("DH", 0.9, 1.0),
        ];
        let phones = IntervalPhoneRecognizer::default()
            .observed_phones(&span(Some(0.5), Some(0.9)), &intervals)
            .unwrap();
        let labels: Vec<String> = phones.iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["K", "AE1", "T"]);
    }

    #[test]
    fn unrecognized_span_has_no_phones() {
        let intervals = [interval("K", 0.5, 0.6)];
        let phones = IntervalPhoneRecognizer::default()
            .observed_phones(&span(None, None), &intervals)
            .unwrap();
        assert!(phones.is_empty());
    }

    #[test]
    fn closures_are_recognizers() {
        let recognizer = |_: &WordSpan, _: &[PhoneInterval]| -> Result<Vec<PhoneLabel>, ScoringError> {
            Err(ScoringError::recognizer("offline"))
        };
        let dyn_recognizer: &dyn PhonemeRecognizer = &recognizer;
        assert!(dyn_recognizer
            .observed_phones(&span(Some(0.0), Some(1.0)), &[])
            .is_err());
    }
}
