use std::fmt;

use serde::{Deserialize, Serialize};

pub const VOWELS: [&str; 15] = [
    "AA", "AE", "AH", "AO", "AW", "AY", "EH", "ER", "EY", "IH", "IY", "OW", "OY", "UH", "UW",
];

pub const CONSONANTS: [&str; 24] = [
    "B", "CH", "D", "DH", "F", "G", "HH", "JH", "K", "L", "M", "N", "NG", "P", "R", "S", "SH",
    "T", "TH", "V", "W", "Y", "Z", "ZH",
];

const SILENCE_LABELS: [&str; 3] = ["SP", "SIL", "SPN"];

/// Stress marker carried by an ARPAbet vowel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stress {
    Unstressed,
    Primary,
    Secondary,
}

impl Stress {
    fn from_digit(c: char) -> Option<Self> {
        match c {
            '0' => Some(Self::Unstressed),
            '1' => Some(Self::Primary),
            '2' => Some(Self::Secondary),
            _ => None,
        }
    }

    fn digit(self) -> char {
        match self {
            Self::Unstressed => '0',
            Self::Primary => '1',
            Self::Secondary => '2',
        }
    }
}

/// Normalized phone label: upper-case base phone plus optional stress digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PhoneLabel {
    base: String,
    stress: Option<Stress>,
}

impl PhoneLabel {
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_ascii_uppercase();
        let mut chars = upper.chars();
        let (base, stress) = match chars.next_back().and_then(Stress::from_digit) {
            Some(stress) if upper.len() > 1 => (chars.as_str().to_string(), Some(stress)),
            _ => (upper, None),
        };
        let base = match base.as_str() {
            "AX" => "AH".to_string(),
            "AXR" => "ER".to_string(),
            _ => base,
        };
        Self { base, stress }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn stress(&self) -> Option<Stress> {
        self.stress
    }

    pub fn is_vowel(&self) -> bool {
        VOWELS.contains(&self.base.as_str())
    }

    pub fn is_consonant(&self) -> bool {
        CONSONANTS.contains(&self.base.as_str())
    }

    pub fn is_primary_stressed_vowel(&self) -> bool {
        self.is_vowel() && self.stress == Some(Stress::Primary)
    }

    pub fn is_silence(&self) -> bool {
        self.base.is_empty() || SILENCE_LABELS.contains(&self.base.as_str())
    }

    pub fn same_base(&self, other: &PhoneLabel) -> bool {
        self.base == other.base
    }
}

impl fmt::Display for PhoneLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)?;
        if let Some(stress) = self.stress {
            write!(f, "{}", stress.digit())?;
        }
        Ok(())
    }
}

impl From<String> for PhoneLabel {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for PhoneLabel {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<PhoneLabel> for String {
    fn from(value: PhoneLabel) -> Self {
        value.to_string()
    }
}

pub fn parse_phones<S: AsRef<str>>(labels: &[S]) -> Vec<PhoneLabel> {
    labels.iter().map(|l| PhoneLabel::parse(l.as_ref())).collect()
}
