use crate::types::{RecognizedWord, Token};

pub const PAUSE_PUNCTUATION: [char; 2] = [',', '.'];

pub fn is_pause_punctuation(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if PAUSE_PUNCTUATION.contains(&c))
}

/// Lower-cases and strips everything outside `[a-z0-9']`. A standalone
/// pause mark is returned unchanged.
pub fn normalize_token(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    if is_pause_punctuation(&lowered) {
        return lowered;
    }
    lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '\'')
        .collect()
}

/// Splits reference text into word tokens and pause punctuation tokens.
///
/// Trailing `,`/`.` on a whitespace-separated chunk become their own tokens in
/// their original order; chunks that normalize to nothing are dropped.
pub fn tokenize_reference(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for chunk in text.split_whitespace() {
        let word = chunk.trim_end_matches(PAUSE_PUNCTUATION);
        let trailing = &chunk[word.len()..];

        let normalized = normalize_token(word);
        if !normalized.is_empty() {
            tokens.push(Token {
                text: normalized,
                is_punctuation: false,
            });
        }
        tokens.extend(trailing.chars().map(|c| Token {
            text: c.to_string(),
            is_punctuation: true,
        }));
    }
    tokens
}

/// Normalizes recognizer output. Punctuation is discarded, and words that
/// normalize to nothing are dropped together with their timing.
pub fn tokenize_recognized(words: &[RecognizedWord]) -> Vec<RecognizedWord> {
    words
        .iter()
        .filter_map(|w| {
            let text: String = normalize_token(&w.text)
                .chars()
                .filter(|c| !PAUSE_PUNCTUATION.contains(c))
                .collect();
            (!text.is_empty()).then(|| RecognizedWord {
                text,
                start: w.start,
                end: w.end,
            })
        })
        .collect()
}
