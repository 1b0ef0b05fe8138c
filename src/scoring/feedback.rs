use std::collections::{BTreeMap, HashMap};

use crate::alignment::phoneme::{PhoneError, SubstitutionPattern};
use crate::config::AggregateConfig;
use crate::types::UtteranceScoreSummary;

/// Builds ordered learner feedback: consistent accent patterns first, then
/// strengths, then the most frequent phone errors, then general guidance.
/// The list is truncated to `feedback_cap` entries.
pub fn generate_feedback(
    summary: &UtteranceScoreSummary,
    patterns: &BTreeMap<SubstitutionPattern, u32>,
    errors: &[PhoneError],
    final_stop_drop_rate: Option<f64>,
    config: &AggregateConfig,
) -> Vec<String> {
    let mut feedback = Vec::new();

    let mut consistent: Vec<(&SubstitutionPattern, u32)> = patterns
        .iter()
        .filter(|(_, &count)| count >= config.bonus_min_count)
        .map(|(pattern, &count)| (pattern, count))
        .collect();
    consistent.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    for (pattern, _) in consistent {
        feedback.push(format!(
            "Consistent accent pattern: {} pronounced as {}",
            pattern.expected, pattern.observed
        ));
    }

    if summary.phone >= config.strong_phone_threshold {
        if summary.stress >= config.strong_stress_threshold {
            feedback.push("Your vowel clarity is strong, especially on stressed syllables.".into());
        } else {
            feedback.push("Your pronunciation is generally clear and easy to follow.".into());
        }
    }
    if summary.consistency_bonus >= config.consistent_bonus_threshold {
        feedback.push("Your pronunciation is consistent, indicating a stable accent.".into());
    }

    for error in top_errors(errors, config.top_errors) {
        feedback.push(match &error.observed {
            Some(observed) => format!("{} sounded like {}", error.expected, observed),
            None => format!("Missed sound: {}", error.expected),
        });
    }

    if summary.stress < config.stress_guidance_threshold {
        feedback.push("Try to maintain stress on important words for higher scores.".into());
    }
    if summary.rhythm < config.rhythm_guidance_threshold {
        feedback.push("Try to keep your rhythm smooth by avoiding long or frequent pauses.".into());
    }
    if final_stop_drop_rate.is_some_and(|rate| rate >= config.final_stop_drop_threshold) {
        feedback.push("Final consonants are sometimes dropped, which slightly affects clarity.".into());
    }

    feedback.truncate(config.feedback_cap);
    feedback
}

/// Most frequent distinct errors; ties keep first-seen order.
fn top_errors(errors: &[PhoneError], limit: usize) -> Vec<&PhoneError> {
    let mut counts: HashMap<&PhoneError, (usize, usize)> = HashMap::new();
    for (position, error) in errors.iter().enumerate() {
        counts.entry(error).or_insert((0, position)).0 += 1;
    }
    let mut ranked: Vec<(&PhoneError, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked.into_iter().take(limit).map(|(error, _)| error).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(phone: f64, stress: f64, rhythm: f64, bonus: f64) -> UtteranceScoreSummary {
        UtteranceScoreSummary {
            phone,
            stress,
            rhythm,
            consistency_bonus: bonus,
            score_pte: 0.0,
            band: 0,
            feedback: Vec::new(),
        }
    }

    fn substitution(expected: &str, observed: &str) -> PhoneError {
        PhoneError {
            expected: expected.to_string(),
            observed: Some(observed.to_string()),
        }
    }

    fn deletion(expected: &str) -> PhoneError {
        PhoneError {
            expected: expected.to_string(),
            observed: None,
        }
    }

    #[test]
    fn strong_reading_gets_positive_feedback_only() {
        let config = AggregateConfig::default();
        let feedback = generate_feedback(
            &summary(0.95, 0.9, 1.0, 0.0),
            &BTreeMap::new(),
            &[],
            Some(0.0),
            &config,
        );
        assert_eq!(
            feedback,
            vec!["Your vowel clarity is strong, especially on stressed syllables.".to_string()]
        );
    }

    #[test]
    fn ordering_is_patterns_strengths_errors_guidance() {
        let config = AggregateConfig::default();
        let mut patterns = BTreeMap::new();
        patterns.insert(
            SubstitutionPattern {
                expected: "TH".into(),
                observed: "T".into(),
            },
            3,
        );
        let errors = [substitution("TH", "T"), deletion("D")];
        let feedback = generate_feedback(
            &summary(0.8, 0.7, 1.0, 0.06),
            &patterns,
            &errors,
            None,
            &config,
        );
        assert_eq!(
            feedback,
            vec![
                "Consistent accent pattern: TH pronounced as T".to_string(),
                "Your pronunciation is generally clear and easy to follow.".to_string(),
                "Your pronunciation is consistent, indicating a stable accent.".to_string(),
                "TH sounded like T".to_string(),
                "Missed sound: D".to_string(),
            ]
        );
    }

    #[test]
    fn weak_reading_gets_guidance_and_is_capped() {
        let config = AggregateConfig::default();
        let errors = [
            deletion("T"),
            substitution("V", "W"),
            substitution("V", "W"),
            substitution("AE", "EH"),
            deletion("K"),
        ];
        let feedback = generate_feedback(
            &summary(0.5, 0.5, 0.5, 0.0),
            &BTreeMap::new(),
            &errors,
            Some(0.5),
            &config,
        );
        assert_eq!(feedback.len(), 5);
        assert_eq!(feedback[0], "V sounded like W");
        assert_eq!(feedback[1], "Missed sound: T");
        assert_eq!(feedback[2], "AE sounded like EH");
        assert_eq!(
            feedback[3],
            "Try to maintain stress on important words for higher scores."
        );
        assert_eq!(
            feedback[4],
            "Try to keep your rhythm smooth by avoiding long or frequent pauses."
        );
    }

    #[test]
    fn dropped_final_stops_are_mentioned() {
        let config = AggregateConfig::default();
        let feedback = generate_feedback(
            &summary(0.9, 0.9, 1.0, 0.0),
            &BTreeMap::new(),
            &[],
            Some(0.25),
            &config,
        );
        assert_eq!(
            feedback.last().map(String::as_str),
            Some("Final consonants are sometimes dropped, which slightly affects clarity.")
        );
    }
}
