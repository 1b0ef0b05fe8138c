use serde::Serialize;

use crate::config::BaselineConfig;
use crate::phonetics::PhoneLabel;
use crate::report::{mean, median, sample_std_dev};
use crate::types::{issue, PhoneInterval};

/// Native expected durations (seconds) by base phone.
const NATIVE_PHONE_DURATIONS: [(&str, f64); 39] = [
    ("AA", 0.125),
    ("AE", 0.110),
    ("AH", 0.095),
    ("AO", 0.120),
    ("AW", 0.160),
    ("AY", 0.155),
    ("EH", 0.105),
    ("ER", 0.115),
    ("EY", 0.130),
    ("IH", 0.085),
    ("IY", 0.125),
    ("OW", 0.135),
    ("OY", 0.170),
    ("UH", 0.090),
    ("UW", 0.130),
    ("B", 0.045),
    ("CH", 0.090),
    ("D", 0.050),
    ("DH", 0.045),
    ("F", 0.070),
    ("G", 0.055),
    ("HH", 0.060),
    ("JH", 0.095),
    ("K", 0.065),
    ("L", 0.075),
    ("M", 0.070),
    ("N", 0.065),
    ("NG", 0.085),
    ("P", 0.060),
    ("R", 0.070),
    ("S", 0.085),
    ("SH", 0.095),
    ("T", 0.055),
    ("TH", 0.075),
    ("V", 0.065),
    ("W", 0.060),
    ("Y", 0.060),
    ("Z", 0.065),
    ("ZH", 0.085),
];

fn native_duration(base: &str) -> Option<f64> {
    NATIVE_PHONE_DURATIONS
        .iter()
        .find(|(phone, _)| *phone == base)
        .map(|(_, d)| *d)
}

/// Per-utterance timing statistics of the speaker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeakerBaseline {
    /// Phones per second.
    pub speech_rate: f64,
    pub median_vowel_duration: f64,
    pub median_consonant_duration: f64,
    pub avg_pause_duration: f64,
    pub vowel_ratio: f64,
    pub phone_count: usize,
    /// `false` when the values are the configured defaults.
    pub measured: bool,
}

impl SpeakerBaseline {
    pub fn defaults(config: &BaselineConfig) -> Self {
        Self {
            speech_rate: config.default_speech_rate,
            median_vowel_duration: config.default_median_vowel,
            median_consonant_duration: config.default_median_consonant,
            avg_pause_duration: config.default_avg_pause,
            vowel_ratio: config.default_vowel_ratio,
            phone_count: 0,
            measured: false,
        }
    }

    /// Estimates the baseline from the speech phones that start inside the
    /// first `window_secs` seconds. Too few phones yields the defaults.
    pub fn estimate(intervals: &[PhoneInterval], config: &BaselineConfig) -> Self {
        let mut phones: Vec<(&PhoneInterval, PhoneLabel)> = intervals
            .iter()
            .filter(|p| p.start < config.window_secs)
            .map(|p| (p, PhoneLabel::parse(&p.label)))
            .filter(|(_, label)| !label.is_silence())
            .collect();
        phones.sort_by(|a, b| a.0.start.total_cmp(&b.0.start));

        if phones.len() < config.min_phones {
            tracing::warn!(
                phones = phones.len(),
                min_phones = config.min_phones,
                "too few phones for a speaker baseline; using defaults"
            );
            return Self {
                phone_count: phones.len(),
                ..Self::defaults(config)
            };
        }

        let first_start = phones[0].0.start;
        let last_end = phones[phones.len() - 1].0.end;
        let span = (last_end - first_start).min(config.window_secs);
        let speech_rate = if span > 0.0 {
            phones.len() as f64 / span
        } else {
            config.default_speech_rate
        };

        let mut vowel_durations = Vec::new();
        let mut consonant_durations = Vec::new();
        let mut total_duration = 0.0;
        for (interval, label) in &phones {
            let d = interval.duration();
            total_duration += d;
            if label.is_vowel() {
                vowel_durations.push(d);
            } else if label.is_consonant() {
                consonant_durations.push(d);
            }
        }
        let total_vowel: f64 = vowel_durations.iter().sum();

        let gaps: Vec<f64> = phones
            .windows(2)
            .map(|pair| pair[1].0.start - pair[0].0.end)
            .filter(|gap| *gap > 0.0)
            .collect();

        let baseline = Self {
            speech_rate,
            median_vowel_duration: if vowel_durations.is_empty() {
                config.default_median_vowel
            } else {
                median(&vowel_durations)
            },
            median_consonant_duration: if consonant_durations.is_empty() {
                config.default_median_consonant
            } else {
                median(&consonant_durations)
            },
            avg_pause_duration: if gaps.is_empty() {
                config.default_avg_pause
            } else {
                mean(&gaps)
            },
            vowel_ratio: if total_duration > 0.0 {
                total_vowel / total_duration
            } else {
                config.default_vowel_ratio
            },
            phone_count: phones.len(),
            measured: true,
        };
        tracing::debug!(
            speech_rate = baseline.speech_rate,
            median_vowel = baseline.median_vowel_duration,
            median_consonant = baseline.median_consonant_duration,
            phone_count = baseline.phone_count,
            "speaker baseline estimated"
        );
        baseline
    }

    /// Speaker median over native median for the phone's class; `None` for
    /// phones that are neither vowels nor consonants.
    pub fn scaling_factor(&self, label: &PhoneLabel, config: &BaselineConfig) -> Option<f64> {
        let (speaker, native) = if label.is_vowel() {
            (self.median_vowel_duration, config.native_vowel_median)
        } else if label.is_consonant() {
            (self.median_consonant_duration, config.native_consonant_median)
        } else {
            return None;
        };
        Some(if native > 0.0 { speaker / native } else { 1.0 })
    }

    /// Duration z-score of one phone against its speaker-scaled native expectation.
    pub fn duration_z_score(
        &self,
        label: &PhoneLabel,
        duration: f64,
        config: &BaselineConfig,
    ) -> f64 {
        let native = native_duration(label.base()).unwrap_or(config.default_expected_duration);
        let factor = self.scaling_factor(label, config).unwrap_or(1.0);
        let std = native * config.duration_std_fraction * factor;
        if std <= 0.0 {
            return 0.0;
        }
        (duration - native * factor) / std
    }
}

/// Duration outlier issues for the phones of one word; each tag appears once.
pub fn duration_issues(
    intervals: &[PhoneInterval],
    baseline: &SpeakerBaseline,
    config: &BaselineConfig,
) -> Vec<String> {
    let mut issues: Vec<String> = Vec::new();
    for interval in intervals {
        let label = PhoneLabel::parse(&interval.label);
        if label.is_silence() {
            continue;
        }
        let z = baseline.duration_z_score(&label, interval.duration(), config);
        if z.abs() <= config.duration_z_threshold {
            continue;
        }
        let tag = if z > 0.0 {
            issue::PHONE_LENGTHENED
        } else if label.is_primary_stressed_vowel() {
            issue::STRESSED_VOWEL_SHORTENED
        } else {
            issue::PHONE_SHORTENED
        };
        if !issues.iter().any(|i| i == tag) {
            issues.push(tag.to_string());
        }
    }
    issues
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntelligibilityFactors {
    pub speech_rate: f64,
    pub pause_patterns: f64,
    pub vowel_quality: f64,
    pub phone_coverage: f64,
    pub consistency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntelligibilityAssessment {
    pub is_intelligible: bool,
    pub confidence: f64,
    pub factors: IntelligibilityFactors,
}

/// Utterance-level intelligibility heuristics over the baseline and all phones.
pub fn assess_intelligibility(
    intervals: &[PhoneInterval],
    baseline: &SpeakerBaseline,
    config: &BaselineConfig,
) -> IntelligibilityAssessment {
    let rate = baseline.speech_rate;
    let speech_rate = if (config.min_speech_rate..=config.max_speech_rate).contains(&rate) {
        1.0
    } else if rate < config.min_speech_rate {
        (rate / config.min_speech_rate).max(0.3)
    } else {
        (config.max_speech_rate / rate).max(0.3)
    };

    let pause_patterns = if baseline.avg_pause_duration <= config.max_average_pause {
        1.0
    } else {
        (config.max_average_pause / baseline.avg_pause_duration).max(0.2)
    };

    let ratio = baseline.vowel_ratio;
    let vowel_quality = if (config.vowel_ratio_min..=config.vowel_ratio_max).contains(&ratio) {
        1.0
    } else if ratio < config.vowel_ratio_min {
        (ratio / config.vowel_ratio_min).max(0.3)
    } else {
        ((1.0 - ratio) / (1.0 - config.vowel_ratio_max)).max(0.3)
    };

    let count = baseline.phone_count;
    let phone_coverage = if count >= config.full_coverage_phones {
        1.0
    } else if count >= config.min_phones {
        count as f64 / config.full_coverage_phones as f64
    } else {
        (count as f64 / config.min_phones.max(1) as f64).max(0.2)
    };

    let consistency = if intervals.is_empty() {
        0.0
    } else {
        let durations: Vec<f64> = intervals
            .iter()
            .filter(|p| !PhoneLabel::parse(&p.label).is_silence())
            .map(PhoneInterval::duration)
            .collect();
        match durations.len() {
            0 => 0.5,
            1 => 1.0,
            _ => {
                let m = mean(&durations);
                let cv = if m > 0.0 { sample_std_dev(&durations) / m } else { 1.0 };
                (1.0 - cv.min(1.0)).max(0.3)
            }
        }
    };

    let factors = IntelligibilityFactors {
        speech_rate,
        pause_patterns,
        vowel_quality,
        phone_coverage,
        consistency,
    };
    let w = &config.intelligibility_weights;
    let confidence = w.speech_rate * factors.speech_rate
        + w.pause_patterns * factors.pause_patterns
        + w.vowel_quality * factors.vowel_quality
        + w.phone_coverage * factors.phone_coverage
        + w.consistency * factors.consistency;

    IntelligibilityAssessment {
        is_intelligible: confidence >= config.intelligible_confidence,
        confidence,
        factors,
    }
}
