use serde::{Deserialize, Serialize};

use crate::baseline::{IntelligibilityAssessment, SpeakerBaseline};
use crate::phonetics::PhoneLabel;
use crate::report::ScoreStats;

/// Issue tags attached to word scores.
pub mod issue {
    pub const OOV: &str = "oov";
    pub const NO_PHONES: &str = "no_phones";
    pub const RECOGNIZER_ERROR: &str = "recognizer_error";
    pub const PHONE_SHORTENED: &str = "phone_shortened";
    pub const PHONE_LENGTHENED: &str = "phone_lengthened";
    pub const STRESSED_VOWEL_SHORTENED: &str = "stressed_vowel_shortened";
    pub const FINAL_STOP_DELETION: &str = "final_stop_deletion";
    pub const INTELLIGIBILITY_FLOOR: &str = "intelligibility_floor";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub text: String,
    pub is_punctuation: bool,
}

/// Word emitted by the external speech recognizer, times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedWord {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Phone interval emitted by the external forced aligner, times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneInterval {
    pub label: String,
    pub start: f64,
    pub end: f64,
}

impl PhoneInterval {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentOp {
    Match { ref_index: usize, hyp_index: usize },
    Substitute { ref_index: usize, hyp_index: usize },
    Delete { ref_index: usize },
    Insert { hyp_index: usize },
}

impl AlignmentOp {
    pub fn ref_index(&self) -> Option<usize> {
        match *self {
            Self::Match { ref_index, .. }
            | Self::Substitute { ref_index, .. }
            | Self::Delete { ref_index } => Some(ref_index),
            Self::Insert { .. } => None,
        }
    }

    pub fn hyp_index(&self) -> Option<usize> {
        match *self {
            Self::Match { hyp_index, .. }
            | Self::Substitute { hyp_index, .. }
            | Self::Insert { hyp_index } => Some(hyp_index),
            Self::Delete { .. } => None,
        }
    }
}

/// Timing of a word in the aligned stream; `None` bounds mean "not recognized".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordSpan {
    pub word: String,
    pub start: Option<f64>,
    pub end: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PhoneAlignmentStep {
    Match {
        expected: PhoneLabel,
        observed: PhoneLabel,
    },
    Substitute {
        expected: PhoneLabel,
        observed: PhoneLabel,
    },
    Delete {
        expected: PhoneLabel,
    },
    Insert {
        observed: PhoneLabel,
    },
}

impl PhoneAlignmentStep {
    pub fn expected(&self) -> Option<&PhoneLabel> {
        match self {
            Self::Match { expected, .. }
            | Self::Substitute { expected, .. }
            | Self::Delete { expected } => Some(expected),
            Self::Insert { .. } => None,
        }
    }

    pub fn observed(&self) -> Option<&PhoneLabel> {
        match self {
            Self::Match { observed, .. }
            | Self::Substitute { observed, .. }
            | Self::Insert { observed } => Some(observed),
            Self::Delete { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseStatus {
    Correct,
    Short,
    Long,
    Missed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PauseEvaluation {
    /// Index of the punctuation token in the reference token stream.
    pub token_index: usize,
    pub punctuation: String,
    pub duration: Option<f64>,
    pub status: PauseStatus,
    pub penalty: f64,
    pub expected_range: (f64, f64),
    /// End of the previous recognized word.
    pub start: Option<f64>,
    /// Start of the next recognized word.
    pub end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordScore {
    pub word: String,
    pub phone_intelligibility: f64,
    pub stress_accuracy: f64,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WordStatus {
    Correct,
    Missed,
    Substituted,
    Repeated,
    Mispronounced,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordReport {
    pub word: String,
    pub status: WordStatus,
    pub start: Option<f64>,
    pub end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spoken: Option<String>,
    pub phone_intelligibility: Option<f64>,
    pub stress_accuracy: Option<f64>,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtteranceScoreSummary {
    pub phone: f64,
    pub stress: f64,
    pub rhythm: f64,
    pub consistency_bonus: f64,
    pub score_pte: f64,
    pub band: u32,
    pub feedback: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringInput {
    pub reference_text: String,
    #[serde(default)]
    pub recognized_words: Vec<RecognizedWord>,
    #[serde(default)]
    pub phone_intervals: Vec<PhoneInterval>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoringOutput {
    pub words: Vec<WordReport>,
    pub pauses: Vec<PauseEvaluation>,
    pub summary: UtteranceScoreSummary,
    pub stats: ScoreStats,
    pub baseline: SpeakerBaseline,
    pub assessment: IntelligibilityAssessment,
}
