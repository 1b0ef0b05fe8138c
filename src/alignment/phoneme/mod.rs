use std::collections::BTreeMap;

use crate::config::PhonemeConfig;
use crate::phonetics::PhoneLabel;
use crate::pipeline::traits::CostModel;
use crate::types::{issue, PhoneAlignmentStep, WordScore};

mod cost_model;

pub use cost_model::{cost_model_for, AccentTolerantCostModel, StrictCostModel};

const STEP_DIAG: u8 = 0;
const STEP_DELETE: u8 = 1;
const STEP_INSERT: u8 = 2;
const TIE_EPS: f64 = 1e-9;

/// Base-phone substitution `expected -> observed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubstitutionPattern {
    pub expected: String,
    pub observed: String,
}

/// A substitution or a deletion (`observed == None`) taken from an alignment path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhoneError {
    pub expected: String,
    pub observed: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhoneAlignment {
    pub path: Vec<PhoneAlignmentStep>,
    pub total_cost: f64,
    pub expected_len: usize,
    pub observed_len: usize,
    pub patterns: BTreeMap<SubstitutionPattern, u32>,
    pub errors: Vec<PhoneError>,
}

impl PhoneAlignment {
    /// `true`/`false` when the expected pronunciation ends in a stop, `None` otherwise.
    pub fn final_stop_dropped(&self, config: &PhonemeConfig) -> Option<bool> {
        let last = self.path.iter().rev().find(|s| s.expected().is_some())?;
        let expected = last.expected()?;
        let is_stop = config
            .final_voiceless_stops
            .iter()
            .chain(config.final_voiced_stops.iter())
            .any(|p| p == expected.base());
        is_stop.then(|| matches!(last, PhoneAlignmentStep::Delete { .. }))
    }
}

/// Weighted edit-distance alignment of expected against observed phones.
///
/// Ties prefer the diagonal step, then delete, then insert. The deletion of
/// the last expected phone is priced as word-final.
pub fn align_phones(
    expected: &[PhoneLabel],
    observed: &[PhoneLabel],
    cost_model: &dyn CostModel,
) -> PhoneAlignment {
    let n = expected.len();
    let m = observed.len();
    let width = m + 1;

    let mut cost = vec![0.0f64; (n + 1) * width];
    let mut bp = vec![STEP_DIAG; (n + 1) * width];
    for i in 1..=n {
        cost[i * width] = cost[(i - 1) * width] + cost_model.deletion(&expected[i - 1], i == n);
        bp[i * width] = STEP_DELETE;
    }
    for j in 1..=m {
        cost[j] = cost[j - 1] + cost_model.insertion(&observed[j - 1]);
        bp[j] = STEP_INSERT;
    }

    for i in 1..=n {
        let exp = &expected[i - 1];
        let del_cost = cost_model.deletion(exp, i == n);
        for j in 1..=m {
            let obs = &observed[j - 1];
            let diag = cost[(i - 1) * width + j - 1] + cost_model.substitution(exp, obs);
            let delete = cost[(i - 1) * width + j] + del_cost;
            let insert = cost[i * width + j - 1] + cost_model.insertion(obs);

            let (best, step) = if diag <= delete + TIE_EPS && diag <= insert + TIE_EPS {
                (diag, STEP_DIAG)
            } else if delete <= insert + TIE_EPS {
                (delete, STEP_DELETE)
            } else {
                (insert, STEP_INSERT)
            };
            cost[i * width + j] = best;
            bp[i * width + j] = step;
        }
    }

    let mut path = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        match bp[i * width + j] {
            STEP_DIAG => {
                let (e, o) = (expected[i - 1].clone(), observed[j - 1].clone());
                if e.same_base(&o) {
                    path.push(PhoneAlignmentStep::Match {
                        expected: e,
                        observed: o,
                    });
                } else {
                    path.push(PhoneAlignmentStep::Substitute {
                        expected: e,
                        observed: o,
                    });
                }
                i -= 1;
                j -= 1;
            }
            STEP_DELETE => {
                path.push(PhoneAlignmentStep::Delete {
                    expected: expected[i - 1].clone(),
                });
                i -= 1;
            }
            _ => {
                path.push(PhoneAlignmentStep::Insert {
                    observed: observed[j - 1].clone(),
                });
                j -= 1;
            }
        }
    }
    path.reverse();

    let (errors, patterns) = extract_errors_and_patterns(&path);
    PhoneAlignment {
        path,
        total_cost: cost[n * width + m],
        expected_len: n,
        observed_len: m,
        patterns,
        errors,
    }
}

/// Substitution/deletion errors in path order plus per-pair substitution counts.
pub fn extract_errors_and_patterns(
    path: &[PhoneAlignmentStep],
) -> (Vec<PhoneError>, BTreeMap<SubstitutionPattern, u32>) {
    let mut errors = Vec::new();
    let mut patterns: BTreeMap<SubstitutionPattern, u32> = BTreeMap::new();
    for step in path {
        match step {
            PhoneAlignmentStep::Substitute { expected, observed } => {
                errors.push(PhoneError {
                    expected: expected.base().to_string(),
                    observed: Some(observed.base().to_string()),
                });
                *patterns
                    .entry(SubstitutionPattern {
                        expected: expected.base().to_string(),
                        observed: observed.base().to_string(),
                    })
                    .or_default() += 1;
            }
            PhoneAlignmentStep::Delete { expected } => errors.push(PhoneError {
                expected: expected.base().to_string(),
                observed: None,
            }),
            PhoneAlignmentStep::Match { .. } | PhoneAlignmentStep::Insert { .. } => {}
        }
    }
    (errors, patterns)
}

/// `clamp01(1 - total_cost / (expected_len * length_tolerance))`.
///
/// Both sides empty scores 1.0; either side empty scores 0.0.
pub fn intelligibility(alignment: &PhoneAlignment, length_tolerance: f64) -> f64 {
    match (alignment.expected_len, alignment.observed_len) {
        (0, 0) => return 1.0,
        (0, _) | (_, 0) => return 0.0,
        _ => {}
    }
    let max_cost = alignment.expected_len as f64 * length_tolerance;
    if max_cost <= 0.0 {
        return 1.0;
    }
    (1.0 - alignment.total_cost / max_cost).clamp(0.0, 1.0)
}

/// Fraction of expected primary-stressed vowels realised with the same base vowel.
pub fn stress_accuracy(path: &[PhoneAlignmentStep]) -> f64 {
    let mut total = 0usize;
    let mut correct = 0usize;
    for step in path {
        let Some(expected) = step.expected() else {
            continue;
        };
        if !expected.is_primary_stressed_vowel() {
            continue;
        }
        total += 1;
        if step.observed().is_some_and(|o| o.same_base(expected)) {
            correct += 1;
        }
    }
    if total == 0 {
        1.0
    } else {
        correct as f64 / total as f64
    }
}

/// Phone-level result for one word against its best alternate pronunciation.
#[derive(Debug, Clone, PartialEq)]
pub struct WordPhoneScore {
    pub score: WordScore,
    pub alignment: PhoneAlignment,
    pub pronunciation_index: usize,
    pub final_stop_dropped: Option<bool>,
}

/// Aligns `observed` against every alternate in `pronunciations` and keeps the
/// one with the highest intelligibility (lowest index on ties).
///
/// Returns `None` when there is no pronunciation to score against.
pub fn score_word(
    word: &str,
    pronunciations: &[Vec<PhoneLabel>],
    observed: &[PhoneLabel],
    cost_model: &dyn CostModel,
    config: &PhonemeConfig,
) -> Option<WordPhoneScore> {
    let observed: Vec<PhoneLabel> = observed
        .iter()
        .filter(|p| !p.is_silence())
        .cloned()
        .collect();

    let mut best: Option<(usize, PhoneAlignment, f64)> = None;
    for (idx, expected) in pronunciations.iter().enumerate() {
        let alignment = align_phones(expected, &observed, cost_model);
        let score = intelligibility(&alignment, config.length_tolerance);
        let better = best
            .as_ref()
            .map_or(true, |(_, _, best_score)| score > *best_score);
        if better {
            best = Some((idx, alignment, score));
        }
    }
    let (pronunciation_index, alignment, phone_intelligibility) = best?;

    let mut issues = Vec::new();
    if observed.is_empty() {
        issues.push(issue::NO_PHONES.to_string());
    }
    let final_stop_dropped = alignment.final_stop_dropped(config);
    if final_stop_dropped == Some(true) {
        issues.push(issue::FINAL_STOP_DELETION.to_string());
    }

    tracing::debug!(
        word,
        pronunciation_index,
        alternates = pronunciations.len(),
        total_cost = alignment.total_cost,
        phone_intelligibility,
        "phoneme alignment scored"
    );

    Some(WordPhoneScore {
        score: WordScore {
            word: word.to_string(),
            phone_intelligibility,
            stress_accuracy: stress_accuracy(&alignment.path),
            issues,
        },
        alignment,
        pronunciation_index,
        final_stop_dropped,
    })
}
