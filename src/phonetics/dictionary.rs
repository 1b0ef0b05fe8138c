use std::collections::HashMap;
use std::path::Path;

use crate::alignment::tokenization::normalize_token;
use crate::error::ScoringError;
use crate::phonetics::phone::PhoneLabel;

/// Read-only word → pronunciations map.
///
/// Built once (from a CMU-style file or from in-memory entries) and shared by
/// reference across scoring requests; there is no interior mutability.
#[derive(Debug, Clone, Default)]
pub struct PronunciationDictionary {
    entries: HashMap<String, Vec<Vec<PhoneLabel>>>,
}

impl PronunciationDictionary {
    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| ScoringError::io("read pronunciation dictionary", e))?;
        Self::parse(&data)
    }

    /// Parses CMU dictionary text: `WORD  PH1 PH2 ...`, `;;;` comments and
    /// `WORD(2)` alternate markers.
    pub fn parse(data: &str) -> Result<Self, ScoringError> {
        let mut entries: HashMap<String, Vec<Vec<PhoneLabel>>> = HashMap::new();
        for (line_idx, line) in data.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(";;;") {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(word_raw) = parts.next() else {
                continue;
            };
            let phones: Vec<PhoneLabel> = parts.map(PhoneLabel::parse).collect();
            if phones.is_empty() {
                return Err(ScoringError::dictionary(
                    line_idx + 1,
                    format!("entry '{word_raw}' has no phones"),
                ));
            }

            let word_raw = word_raw.split('(').next().unwrap_or(word_raw);
            let word = normalize_token(word_raw);
            if word.is_empty() {
                continue;
            }
            entries.entry(word).or_default().push(phones);
        }

        tracing::debug!(words = entries.len(), "dictionary: parsed entries");
        Ok(Self { entries })
    }

    pub fn from_entries<W, P, S>(entries: impl IntoIterator<Item = (W, P)>) -> Self
    where
        W: AsRef<str>,
        P: IntoIterator<Item = Vec<S>>,
        S: AsRef<str>,
    {
        let mut map: HashMap<String, Vec<Vec<PhoneLabel>>> = HashMap::new();
        for (word, pronunciations) in entries {
            let key = normalize_token(word.as_ref());
            if key.is_empty() {
                continue;
            }
            let slot = map.entry(key).or_default();
            for pron in pronunciations {
                let phones: Vec<PhoneLabel> =
                    pron.iter().map(|p| PhoneLabel::parse(p.as_ref())).collect();
                if !phones.is_empty() {
                    slot.push(phones);
                }
            }
        }
        map.retain(|_, prons| !prons.is_empty());
        Self { entries: map }
    }

    /// All known pronunciations of `word` (case-insensitive), in file order.
    pub fn lookup(&self, word: &str) -> Option<&[Vec<PhoneLabel>]> {
        self.entries
            .get(&normalize_token(word))
            .map(|prons| prons.as_slice())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.lookup(word).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
