use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;

use crate::alignment::content::{align_stream, AlignedToken};
use crate::alignment::phoneme::{score_word, PhoneError, SubstitutionPattern};
use crate::alignment::tokenization::{tokenize_recognized, tokenize_reference};
use crate::baseline::{assess_intelligibility, duration_issues, SpeakerBaseline};
use crate::config::ScoringConfig;
use crate::error::ScoringError;
use crate::fluency::{aggregate_pause_penalty, evaluate_pauses};
use crate::phonetics::PronunciationDictionary;
use crate::pipeline::defaults::{intervals_within, IntervalPhoneRecognizer};
use crate::pipeline::traits::{ContentAligner, CostModel, PhonemeRecognizer};
use crate::report::compute_stats;
use crate::scoring::{summarize, UtteranceEvidence};
use crate::types::{
    issue, AlignmentOp, PhoneInterval, RecognizedWord, ScoringInput, ScoringOutput, WordReport,
    WordScore, WordStatus,
};

pub struct Scorer {
    config: ScoringConfig,
    dictionary: Arc<PronunciationDictionary>,
    cost_model: Box<dyn CostModel>,
    content_aligner: Box<dyn ContentAligner>,
    recognizer: Box<dyn PhonemeRecognizer>,
    parallel: bool,
}

pub(crate) struct ScorerParts {
    pub config: ScoringConfig,
    pub dictionary: Arc<PronunciationDictionary>,
    pub cost_model: Box<dyn CostModel>,
    pub content_aligner: Box<dyn ContentAligner>,
    pub recognizer: Box<dyn PhonemeRecognizer>,
    pub parallel: bool,
}

/// Phoneme-stage result for one matched reference word.
#[derive(Debug, Clone, Default)]
struct WordOutcome {
    /// `None` for out-of-vocabulary words, which are not phone-scored.
    score: Option<WordScore>,
    has_phones: bool,
    patterns: BTreeMap<SubstitutionPattern, u32>,
    errors: Vec<PhoneError>,
    final_stop_dropped: Option<bool>,
}

impl Scorer {
    pub(crate) fn from_parts(parts: ScorerParts) -> Self {
        Self {
            config: parts.config,
            dictionary: parts.dictionary,
            cost_model: parts.cost_model,
            content_aligner: parts.content_aligner,
            recognizer: parts.recognizer,
            parallel: parts.parallel,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn cost_model_name(&self) -> &'static str {
        self.cost_model.name()
    }

    pub fn score(&self, input: &ScoringInput) -> Result<ScoringOutput, ScoringError> {
        validate_timings(&input.recognized_words, &input.phone_intervals)?;

        let reference = tokenize_reference(&input.reference_text);
        let recognized = tokenize_recognized(&input.recognized_words);
        let stream = align_stream(self.content_aligner.as_ref(), &reference, &recognized);

        let baseline = SpeakerBaseline::estimate(&input.phone_intervals, &self.config.baseline);
        let assessment =
            assess_intelligibility(&input.phone_intervals, &baseline, &self.config.baseline);

        let matched: Vec<usize> = stream
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_punctuation() && matches!(t.op, AlignmentOp::Match { .. }))
            .map(|(idx, _)| idx)
            .collect();
        let score_one =
            |&idx: &usize| self.score_matched(&stream[idx], &input.phone_intervals, &baseline);
        let outcomes: Vec<WordOutcome> = if self.parallel {
            matched.par_iter().map(score_one).collect()
        } else {
            matched.iter().map(score_one).collect()
        };
        let mut outcomes: BTreeMap<usize, WordOutcome> =
            matched.into_iter().zip(outcomes).collect();

        let floor_applies = assessment.confidence >= self.config.baseline.intelligible_confidence
            && baseline.measured;
        if floor_applies {
            let floor = self.config.baseline.intelligibility_floor;
            for outcome in outcomes.values_mut().filter(|o| o.has_phones) {
                if let Some(score) = outcome.score.as_mut() {
                    if score.phone_intelligibility < floor {
                        score.phone_intelligibility = floor;
                        score.issues.push(issue::INTELLIGIBILITY_FLOOR.to_string());
                    }
                }
            }
        }

        let mut word_scores = Vec::new();
        let mut patterns: BTreeMap<SubstitutionPattern, u32> = BTreeMap::new();
        let mut errors = Vec::new();
        let (mut final_stop_words, mut final_stop_drops) = (0usize, 0usize);
        for outcome in outcomes.values() {
            let Some(score) = outcome.score.as_ref() else {
                continue;
            };
            word_scores.push(score.clone());
            for (pattern, count) in &outcome.patterns {
                *patterns.entry(pattern.clone()).or_insert(0) += count;
            }
            errors.extend(outcome.errors.iter().cloned());
            if let Some(dropped) = outcome.final_stop_dropped {
                final_stop_words += 1;
                final_stop_drops += usize::from(dropped);
            }
        }
        let final_stop_drop_rate =
            (final_stop_words > 0).then(|| final_stop_drops as f64 / final_stop_words as f64);

        let pauses = evaluate_pauses(&stream, &recognized, &self.config.pause);
        let pause_penalty = aggregate_pause_penalty(&pauses, &self.config.pause);

        let summary = summarize(
            &UtteranceEvidence {
                word_scores: &word_scores,
                patterns: &patterns,
                errors: &errors,
                pause_penalty,
                final_stop_drop_rate,
            },
            &self.config,
        );

        let words = self.word_reports(&stream, &mut outcomes);
        let stats = compute_stats(&words);

        tracing::debug!(
            reference_tokens = reference.len(),
            recognized_words = recognized.len(),
            scored_words = word_scores.len(),
            pauses = pauses.len(),
            score_pte = summary.score_pte,
            band = summary.band,
            "utterance scored"
        );

        Ok(ScoringOutput {
            words,
            pauses,
            summary,
            stats,
            baseline,
            assessment,
        })
    }

    fn score_matched(
        &self,
        token: &AlignedToken,
        intervals: &[PhoneInterval],
        baseline: &SpeakerBaseline,
    ) -> WordOutcome {
        let word = token.word();
        let Some(pronunciations) = self.dictionary.lookup(word) else {
            tracing::warn!(word, "word missing from pronunciation dictionary");
            return WordOutcome::default();
        };

        let span = token.span();
        let observed = match self.recognizer.observed_phones(&span, intervals) {
            Ok(observed) => observed,
            Err(err) => {
                tracing::warn!(
                    word,
                    error = %err,
                    "phoneme recognizer failed; scoring word as unintelligible"
                );
                return WordOutcome {
                    score: Some(WordScore {
                        word: word.to_string(),
                        phone_intelligibility: 0.0,
                        stress_accuracy: 0.0,
                        issues: vec![issue::RECOGNIZER_ERROR.to_string()],
                    }),
                    ..WordOutcome::default()
                };
            }
        };

        let Some(scored) = score_word(
            word,
            pronunciations,
            &observed,
            self.cost_model.as_ref(),
            &self.config.phoneme,
        ) else {
            return WordOutcome::default();
        };

        let mut score = scored.score;
        if let (Some(start), Some(end)) = (span.start, span.end) {
            let word_intervals: Vec<PhoneInterval> = intervals_within(
                intervals,
                start,
                end,
                IntervalPhoneRecognizer::DEFAULT_TOLERANCE,
            )
            .cloned()
            .collect();
            score.issues.extend(duration_issues(
                &word_intervals,
                baseline,
                &self.config.baseline,
            ));
        }

        WordOutcome {
            has_phones: scored.alignment.observed_len > 0,
            patterns: scored.alignment.patterns,
            errors: scored.alignment.errors,
            final_stop_dropped: scored.final_stop_dropped,
            score: Some(score),
        }
    }

    fn word_reports(
        &self,
        stream: &[AlignedToken],
        outcomes: &mut BTreeMap<usize, WordOutcome>,
    ) -> Vec<WordReport> {
        let threshold = self.config.aggregate.mispronounced_threshold;
        stream
            .iter()
            .enumerate()
            .filter(|(_, token)| !token.is_punctuation())
            .map(|(idx, token)| {
                let mut report = WordReport {
                    word: token.word().to_string(),
                    status: WordStatus::Correct,
                    start: token.start,
                    end: token.end,
                    spoken: None,
                    phone_intelligibility: None,
                    stress_accuracy: None,
                    issues: Vec::new(),
                };
                match token.op {
                    AlignmentOp::Match { .. } => {
                        match outcomes.remove(&idx).and_then(|o| o.score) {
                            Some(score) => {
                                if score.phone_intelligibility < threshold {
                                    report.status = WordStatus::Mispronounced;
                                }
                                report.phone_intelligibility = Some(score.phone_intelligibility);
                                report.stress_accuracy = Some(score.stress_accuracy);
                                report.issues = score.issues;
                            }
                            None => report.issues.push(issue::OOV.to_string()),
                        }
                    }
                    AlignmentOp::Substitute { .. } => {
                        report.status = WordStatus::Substituted;
                        report.spoken = token.spoken.clone();
                    }
                    AlignmentOp::Delete { .. } => report.status = WordStatus::Missed,
                    AlignmentOp::Insert { .. } => report.status = WordStatus::Repeated,
                }
                report
            })
            .collect()
    }
}

fn validate_timings(
    words: &[RecognizedWord],
    intervals: &[PhoneInterval],
) -> Result<(), ScoringError> {
    let spans = words
        .iter()
        .map(|w| (w.text.as_str(), w.start, w.end))
        .chain(intervals.iter().map(|p| (p.label.as_str(), p.start, p.end)));
    for (label, start, end) in spans {
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end < 0.0 {
            return Err(ScoringError::invalid_input(format!(
                "'{label}' has a negative or non-finite time ({start}..{end})"
            )));
        }
        if start > end {
            return Err(ScoringError::invalid_input(format!(
                "'{label}' starts after it ends ({start} > {end})"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::builder::ScorerBuilder;
    use crate::types::PauseStatus;

    fn dictionary() -> Arc<PronunciationDictionary> {
        Arc::new(PronunciationDictionary::from_entries([
            ("i", vec![vec!["AY1"]]),
            ("like", vec![vec!["L", "AY1", "K"]]),
            ("cats", vec![vec!["K", "AE1", "T", "S"]]),
            ("think", vec![vec!["TH", "IH1", "NG", "K"]]),
        ]))
    }

    fn scorer() -> Scorer {
        ScorerBuilder::new(ScoringConfig::default())
            .with_dictionary(dictionary())
            .build()
            .unwrap()
    }

    fn word(text: &str, start: f64, end: f64) -> RecognizedWord {
        RecognizedWord {
            text: text.to_string(),
            start,
            end,
        }
    }

    fn phone(label: &str, start: f64, end: f64) -> PhoneInterval {
        PhoneInterval {
            label: label.to_string(),
            start,
            end,
        }
    }

    fn perfect_input() -> ScoringInput {
        ScoringInput {
            reference_text: "I like cats.".to_string(),
            recognized_words: vec![
                word("I", 0.0, 0.2),
                word("like", 0.25, 0.5),
                word("cats", 0.55, 0.9),
            ],
            phone_intervals: vec![
                phone("AY1", 0.0, 0.2),
                phone("L", 0.25, 0.33),
                phone("AY1", 0.33, 0.42),
                phone("K", 0.42, 0.5),
                phone("K", 0.55, 0.63),
                phone("AE1", 0.63, 0.75),
                phone("T", 0.75, 0.82),
                phone("S", 0.82, 0.9),
            ],
        }
    }

    #[test]
    fn perfect_reading() {
        let output = scorer().score(&perfect_input()).unwrap();
        assert_eq!(output.words.len(), 3);
        for report in &output.words {
            assert_eq!(report.status, WordStatus::Correct);
            assert_eq!(report.phone_intelligibility, Some(1.0));
            assert_eq!(report.stress_accuracy, Some(1.0));
        }
        assert_eq!(output.pauses.len(), 1);
        assert_eq!(output.pauses[0].status, PauseStatus::Missed);
        assert!((output.pauses[0].penalty - 0.3).abs() < 1e-12);
        assert_eq!(output.summary.phone, 1.0);
        assert_eq!(output.summary.rhythm, 0.0);
        assert!((output.summary.score_pte - 82.0).abs() < 1e-9);
        assert_eq!(output.summary.band, 79);
        assert_eq!(output.stats.correct, 3);
        assert!(!output.baseline.measured);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let parallel = scorer().score(&perfect_input()).unwrap();
        let sequential = ScorerBuilder::new(ScoringConfig::default())
            .with_dictionary(dictionary())
            .with_parallelism(false)
            .build()
            .unwrap()
            .score(&perfect_input())
            .unwrap();
        assert_eq!(parallel.words, sequential.words);
        assert_eq!(parallel.summary, sequential.summary);
    }

    fn statuses(reference: &str, recognized: &[&str]) -> Vec<(String, WordStatus)> {
        let input = ScoringInput {
            reference_text: reference.to_string(),
            recognized_words: recognized
                .iter()
                .enumerate()
                .map(|(i, text)| word(text, i as f64 * 0.5, i as f64 * 0.5 + 0.3))
                .collect(),
            phone_intervals: Vec::new(),
        };
        scorer()
            .score(&input)
            .unwrap()
            .words
            .into_iter()
            .map(|w| (w.word, w.status))
            .collect()
    }

    #[test]
    fn word_status_merge() {
        use WordStatus::*;
        let owned = |items: &[(&str, WordStatus)]| -> Vec<(String, WordStatus)> {
            items.iter().map(|(w, s)| (w.to_string(), *s)).collect()
        };

        // matched words without phone intervals score zero intelligibility
        assert_eq!(
            statuses("I like cats", &["I", "like", "dogs"]),
            owned(&[("i", Mispronounced), ("like", Mispronounced), ("cats", Substituted)])
        );
        assert_eq!(
            statuses("I like cats", &["I", "cats"]),
            owned(&[("i", Mispronounced), ("like", Missed), ("cats", Mispronounced)])
        );
        assert_eq!(
            statuses("I like cats", &["I", "like", "cats", "cats"]),
            owned(&[
                ("i", Mispronounced),
                ("like", Mispronounced),
                ("cats", Repeated),
                ("cats", Mispronounced),
            ])
        );
    }

    #[test]
    fn substitution_keeps_spoken_word() {
        let input = ScoringInput {
            reference_text: "I like cats".to_string(),
            recognized_words: vec![
                word("I", 0.0, 0.2),
                word("like", 0.3, 0.5),
                word("Dogs", 0.6, 0.9),
            ],
            phone_intervals: Vec::new(),
        };
        let output = scorer().score(&input).unwrap();
        assert_eq!(output.words[2].spoken.as_deref(), Some("dogs"));
        assert_eq!(output.words[2].phone_intelligibility, None);
        assert_eq!(output.words[0].issues, vec![issue::NO_PHONES.to_string()]);
        assert_eq!(output.stats.substituted, 1);
        assert_eq!(output.stats.mispronounced, 2);
    }

    #[test]
    fn out_of_vocabulary_words_are_not_scored() {
        let input = ScoringInput {
            reference_text: "I like dogs".to_string(),
            recognized_words: vec![
                word("i", 0.0, 0.2),
                word("like", 0.25, 0.5),
                word("dogs", 0.55, 0.9),
            ],
            phone_intervals: vec![
                phone("AY1", 0.0, 0.2),
                phone("L", 0.25, 0.33),
                phone("AY1", 0.33, 0.42),
                phone("K", 0.42, 0.5),
            ],
        };
        let output = scorer().score(&input).unwrap();
        let dogs = &output.words[2];
        assert_eq!(dogs.status, WordStatus::Correct);
        assert_eq!(dogs.phone_intelligibility, None);
        assert_eq!(dogs.issues, vec![issue::OOV.to_string()]);
        assert_eq!(output.summary.phone, 1.0);
    }

    #[test]
    fn recognizer_failure_falls_back_per_word() {
        let failing = |span: &crate::types::WordSpan,
                       intervals: &[PhoneInterval]|
         -> Result<Vec<crate::phonetics::PhoneLabel>, ScoringError> {
            if span.word == "like" {
                Err(ScoringError::recognizer("backend offline"))
            } else {
                IntervalPhoneRecognizer::default().observed_phones(span, intervals)
            }
        };
        let output = ScorerBuilder::new(ScoringConfig::default())
            .with_dictionary(dictionary())
            .with_recognizer(Box::new(failing))
            .build()
            .unwrap()
            .score(&perfect_input())
            .unwrap();
        let like = &output.words[1];
        assert_eq!(like.status, WordStatus::Mispronounced);
        assert_eq!(like.phone_intelligibility, Some(0.0));
        assert_eq!(like.issues, vec![issue::RECOGNIZER_ERROR.to_string()]);
        assert_eq!(output.words[2].status, WordStatus::Correct);
    }

    #[test]
    fn empty_recognition_scores_the_floor() {
        let input = ScoringInput {
            reference_text: "I like cats.".to_string(),
            ..ScoringInput::default()
        };
        let output = scorer().score(&input).unwrap();
        assert!(output.words.iter().all(|w| w.status == WordStatus::Missed));
        assert_eq!(output.summary.score_pte, 10.0);
        assert_eq!(output.summary.band, 30);
        assert_eq!(output.stats.accuracy, 0.0);
    }

    const CATS: &[(&str, f64)] = &[("K", 0.07), ("AE1", 0.11), ("T", 0.06), ("S", 0.08)];
    const SILENT: &[(&str, f64)] = &[];
    const THINK_AS_SOMP: &[(&str, f64)] = &[("S", 0.08), ("AA1", 0.12), ("M", 0.07), ("P", 0.06)];

    /// Lays the words out back to back with 0.1 s between them. A word with no
    /// phones is still recognized for 0.3 s.
    fn read_aloud(reference: &str, words: &[(&str, &[(&str, f64)])]) -> ScoringInput {
        let mut input = ScoringInput {
            reference_text: reference.to_string(),
            ..ScoringInput::default()
        };
        let mut t = 0.0;
        for (text, phones) in words {
            let start = t;
            for (label, duration) in phones.iter() {
                input.phone_intervals.push(phone(label, t, t + duration));
                t += duration;
            }
            if phones.is_empty() {
                t += 0.3;
            }
            input.recognized_words.push(word(text, start, t));
            t += 0.1;
        }
        input
    }

    fn has_issue(report: &WordReport, tag: &str) -> bool {
        report.issues.iter().any(|i| i == tag)
    }

    #[test]
    fn intelligibility_floor_lifts_badly_read_word() {
        let input = read_aloud(
            "cats cats cats think",
            &[("cats", CATS), ("cats", CATS), ("cats", CATS), ("think", THINK_AS_SOMP)],
        );
        let output = scorer().score(&input).unwrap();
        assert!(output.baseline.measured);
        assert!(output.assessment.confidence >= 0.6);

        let think = &output.words[3];
        assert_eq!(think.phone_intelligibility, Some(0.55));
        assert!(has_issue(think, issue::INTELLIGIBILITY_FLOOR));
        for cats in &output.words[..3] {
            assert_eq!(cats.phone_intelligibility, Some(1.0));
            assert!(!has_issue(cats, issue::INTELLIGIBILITY_FLOOR));
        }
    }

    #[test]
    fn intelligibility_floor_needs_a_measured_baseline() {
        let input = read_aloud("cats think", &[("cats", CATS), ("think", THINK_AS_SOMP)]);
        let output = scorer().score(&input).unwrap();
        assert!(!output.baseline.measured);

        let think = &output.words[1];
        assert!(think.phone_intelligibility.unwrap_or(1.0) < 0.55);
        assert!(!has_issue(think, issue::INTELLIGIBILITY_FLOOR));
        assert_eq!(think.status, WordStatus::Mispronounced);
    }

    #[test]
    fn intelligibility_floor_skips_words_without_phones() {
        let input = read_aloud(
            "cats cats cats think",
            &[("cats", CATS), ("cats", CATS), ("cats", CATS), ("think", SILENT)],
        );
        let output = scorer().score(&input).unwrap();
        assert!(output.baseline.measured);
        assert!(output.assessment.confidence >= 0.6);

        let think = &output.words[3];
        assert_eq!(think.phone_intelligibility, Some(0.0));
        assert_eq!(think.issues, vec![issue::NO_PHONES.to_string()]);
    }

    #[test]
    fn invalid_timings_are_rejected() {
        let mut input = perfect_input();
        input.recognized_words[1].end = 0.1;
        assert!(matches!(
            scorer().score(&input),
            Err(ScoringError::InvalidInput { .. })
        ));

        let mut input = perfect_input();
        input.phone_intervals[0].start = -0.5;
        assert!(scorer().score(&input).is_err());

        let mut input = perfect_input();
        input.phone_intervals[0].end = f64::NAN;
        assert!(scorer().score(&input).is_err());
    }
}
