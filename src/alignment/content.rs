use crate::pipeline::traits::ContentAligner;
use crate::types::{AlignmentOp, RecognizedWord, Token, WordSpan};

const STEP_DIAG: u8 = 0;
const STEP_DELETE: u8 = 1;
const STEP_INSERT: u8 = 2;

/// Minimum edit-distance alignment (insert 1, delete 1, substitute 0/1).
///
/// Ties prefer the diagonal step, then delete, then insert. Empty inputs give
/// an all-insert or all-delete path.
pub fn align_tokens<R, H>(reference: &[R], hypothesis: &[H]) -> Vec<AlignmentOp>
where
    R: AsRef<str>,
    H: AsRef<str>,
{
    let n = reference.len();
    let m = hypothesis.len();
    let width = m + 1;

    let mut cost = vec![0usize; (n + 1) * width];
    let mut bp = vec![STEP_DIAG; (n + 1) * width];
    for i in 1..=n {
        cost[i * width] = i;
        bp[i * width] = STEP_DELETE;
    }
    for j in 1..=m {
        cost[j] = j;
        bp[j] = STEP_INSERT;
    }

    for i in 1..=n {
        let r = reference[i - 1].as_ref();
        for j in 1..=m {
            let sub = usize::from(r != hypothesis[j - 1].as_ref());
            let diag = cost[(i - 1) * width + j - 1] + sub;
            let delete = cost[(i - 1) * width + j] + 1;
            let insert = cost[i * width + j - 1] + 1;

            let (best, step) = if diag <= delete && diag <= insert {
                (diag, STEP_DIAG)
            } else if delete <= insert {
                (delete, STEP_DELETE)
            } else {
                (insert, STEP_INSERT)
            };
            cost[i * width + j] = best;
            bp[i * width + j] = step;
        }
    }

    let mut ops = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        match bp[i * width + j] {
            STEP_DIAG => {
                let (ref_index, hyp_index) = (i - 1, j - 1);
                if reference[ref_index].as_ref() == hypothesis[hyp_index].as_ref() {
                    ops.push(AlignmentOp::Match { ref_index, hyp_index });
                } else {
                    ops.push(AlignmentOp::Substitute { ref_index, hyp_index });
                }
                i -= 1;
                j -= 1;
            }
            STEP_DELETE => {
                ops.push(AlignmentOp::Delete { ref_index: i - 1 });
                i -= 1;
            }
            _ => {
                ops.push(AlignmentOp::Insert { hyp_index: j - 1 });
                j -= 1;
            }
        }
    }
    ops.reverse();
    ops
}

/// One position of the aligned reference/recognized stream.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedToken {
    pub op: AlignmentOp,
    pub reference: Option<Token>,
    pub spoken: Option<String>,
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl AlignedToken {
    pub fn is_punctuation(&self) -> bool {
        self.reference.as_ref().is_some_and(|t| t.is_punctuation)
    }

    /// Reference text for reference-carrying ops, spoken text for inserts.
    pub fn word(&self) -> &str {
        self.reference
            .as_ref()
            .map(|t| t.text.as_str())
            .or(self.spoken.as_deref())
            .unwrap_or_default()
    }

    pub fn span(&self) -> WordSpan {
        WordSpan {
            word: self.word().to_string(),
            start: self.start,
            end: self.end,
        }
    }
}

/// Aligns the word tokens of `reference` against `recognized` and rebuilds the
/// full token stream.
///
/// Punctuation tokens never take part in the edit distance. Each one is
/// emitted as a `Delete` right before the op carrying the next reference word,
/// i.e. after any insertions spoken in between.
pub fn align_stream(
    aligner: &dyn ContentAligner,
    reference: &[Token],
    recognized: &[RecognizedWord],
) -> Vec<AlignedToken> {
    let word_positions: Vec<usize> = reference
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.is_punctuation)
        .map(|(idx, _)| idx)
        .collect();
    let ref_words: Vec<&str> = word_positions
        .iter()
        .map(|&idx| reference[idx].text.as_str())
        .collect();
    let hyp_words: Vec<&str> = recognized.iter().map(|w| w.text.as_str()).collect();

    let word_ops = aligner.align(&ref_words, &hyp_words);

    let mut stream = Vec::with_capacity(reference.len() + recognized.len());
    let mut next_token = 0usize;
    for op in word_ops {
        let Some((token_index, hyp)) = resolve_op(&op, &word_positions, recognized) else {
            tracing::warn!(
                ?op,
                reference_words = word_positions.len(),
                recognized_words = recognized.len(),
                "content aligner returned an out-of-range index; op skipped"
            );
            continue;
        };
        if let Some(idx) = token_index {
            flush_punctuation(&mut stream, reference, &mut next_token, idx);
        }
        let op = match (op, token_index) {
            (AlignmentOp::Match { hyp_index, .. }, Some(ref_index)) => {
                AlignmentOp::Match { ref_index, hyp_index }
            }
            (AlignmentOp::Substitute { hyp_index, .. }, Some(ref_index)) => {
                AlignmentOp::Substitute { ref_index, hyp_index }
            }
            (AlignmentOp::Delete { .. }, Some(ref_index)) => AlignmentOp::Delete { ref_index },
            (other, _) => other,
        };
        stream.push(AlignedToken {
            op,
            reference: token_index.map(|idx| reference[idx].clone()),
            spoken: hyp.map(|w| w.text.clone()),
            start: hyp.map(|w| w.start),
            end: hyp.map(|w| w.end),
        });
        if let Some(idx) = token_index {
            next_token = next_token.max(idx + 1);
        }
    }
    flush_punctuation(&mut stream, reference, &mut next_token, reference.len());

    tracing::debug!(
        reference_tokens = reference.len(),
        recognized_words = recognized.len(),
        stream_len = stream.len(),
        "content alignment complete"
    );
    stream
}

/// Maps an op's word index to its reference token position and fetches the
/// recognized word it consumes. `None` when either index is out of range.
fn resolve_op<'a>(
    op: &AlignmentOp,
    word_positions: &[usize],
    recognized: &'a [RecognizedWord],
) -> Option<(Option<usize>, Option<&'a RecognizedWord>)> {
    let token_index = match op.ref_index() {
        Some(w) => Some(*word_positions.get(w)?),
        None => None,
    };
    let hyp = match op.hyp_index() {
        Some(h) => Some(recognized.get(h)?),
        None => None,
    };
    Some((token_index, hyp))
}

fn flush_punctuation(
    stream: &mut Vec<AlignedToken>,
    reference: &[Token],
    next_token: &mut usize,
    until: usize,
) {
    while *next_token < until {
        let token = &reference[*next_token];
        if token.is_punctuation {
            stream.push(AlignedToken {
                op: AlignmentOp::Delete {
                    ref_index: *next_token,
                },
                reference: Some(token.clone()),
                spoken: None,
                start: None,
                end: None,
            });
        }
        *next_token += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::tokenization::tokenize_reference;
    use crate::pipeline::defaults::EditDistanceAligner;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn word(text: &str, start: f64, end: f64) -> RecognizedWord {
        RecognizedWord {
            text: text.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn identical_sequences_are_all_matches() {
        let ops = align_tokens(&["a", "b", "c"], &["a", "b", "c"]);
        assert_eq!(
            ops,
            vec![
                AlignmentOp::Match { ref_index: 0, hyp_index: 0 },
                AlignmentOp::Match { ref_index: 1, hyp_index: 1 },
                AlignmentOp::Match { ref_index: 2, hyp_index: 2 },
            ]
        );
    }

    #[test]
    fn empty_inputs_are_total() {
        let none: [&str; 0] = [];
        assert!(align_tokens(&none, &none).is_empty());
        assert_eq!(
            align_tokens(&["a", "b"], &none),
            vec![
                AlignmentOp::Delete { ref_index: 0 },
                AlignmentOp::Delete { ref_index: 1 },
            ]
        );
        assert_eq!(
            align_tokens(&none, &["x"]),
            vec![AlignmentOp::Insert { hyp_index: 0 }]
        );
    }

    #[test]
    fn substitution_preferred_over_delete_insert() {
        let ops = align_tokens(&["cat"], &["hat"]);
        assert_eq!(
            ops,
            vec![AlignmentOp::Substitute { ref_index: 0, hyp_index: 0 }]
        );
    }

    #[test]
    fn repetition_becomes_insert() {
        let ops = align_tokens(&["i", "like", "cats"], &["i", "i", "like", "cats"]);
        let inserts: Vec<_> = ops
            .iter()
            .filter(|op| matches!(op, AlignmentOp::Insert { .. }))
            .collect();
        assert_eq!(inserts.len(), 1);
        assert_eq!(ops.len(), 4);
    }

    #[test]
    fn every_index_covered_exactly_once() {
        let mut rng = StdRng::seed_from_u64(17);
        let vocab = ["a", "b", "c", "d"];
        for _ in 0..200 {
            let n = rng.gen_range(0..8);
            let m = rng.gen_range(0..8);
            let reference: Vec<&str> = (0..n).map(|_| vocab[rng.gen_range(0..4)]).collect();
            let hypothesis: Vec<&str> = (0..m).map(|_| vocab[rng.gen_range(0..4)]).collect();
            let ops = align_tokens(&reference, &hypothesis);

            let mut ref_seen = vec![0usize; n];
            let mut hyp_seen = vec![0usize; m];
            for op in &ops {
                if let Some(r) = op.ref_index() {
                    ref_seen[r] += 1;
                }
                if let Some(h) = op.hyp_index() {
                    hyp_seen[h] += 1;
                }
            }
            assert!(ref_seen.iter().all(|&c| c == 1));
            assert!(hyp_seen.iter().all(|&c| c == 1));
        }
    }

    #[test]
    fn stream_places_punctuation_after_trailing_insertions() {
        let tokens = tokenize_reference("I like cats. Dogs");
        let recognized = vec![
            word("i", 0.0, 0.2),
            word("like", 0.25, 0.5),
            word("cats", 0.55, 0.9),
            word("um", 1.0, 1.3),
            word("dogs", 2.0, 2.4),
        ];
        let stream = align_stream(&EditDistanceAligner, &tokens, &recognized);
        let words: Vec<&str> = stream.iter().map(|t| t.word()).collect();
        assert_eq!(words, ["i", "like", "cats", "um", ".", "dogs"]);
        assert!(matches!(stream[3].op, AlignmentOp::Insert { hyp_index: 3 }));
        assert_eq!(stream[4].op, AlignmentOp::Delete { ref_index: 3 });
        assert_eq!(stream[5].op, AlignmentOp::Match { ref_index: 4, hyp_index: 4 });
    }

    #[test]
    fn stream_with_no_recognized_words_is_all_delete() {
        let tokens = tokenize_reference("I like cats.");
        let stream = align_stream(&EditDistanceAligner, &tokens, &[]);
        assert_eq!(stream.len(), 4);
        assert!(stream
            .iter()
            .all(|t| matches!(t.op, AlignmentOp::Delete { .. }) && t.start.is_none()));
    }

    #[test]
    fn trailing_punctuation_is_flushed() {
        let tokens = tokenize_reference("I like cats.");
        let recognized = vec![
            word("i", 0.0, 0.2),
            word("like", 0.25, 0.5),
            word("cats", 0.55, 0.9),
        ];
        let stream = align_stream(&EditDistanceAligner, &tokens, &recognized);
        let matches = stream
            .iter()
            .filter(|t| matches!(t.op, AlignmentOp::Match { .. }))
            .count();
        assert_eq!(matches, 3);
        assert!(stream[3].is_punctuation());
        assert_eq!(stream[2].span().end, Some(0.9));
    }

    struct OffByOneAligner;

    impl ContentAligner for OffByOneAligner {
        fn align(&self, reference: &[&str], hypothesis: &[&str]) -> Vec<AlignmentOp> {
            vec![
                AlignmentOp::Match { ref_index: 0, hyp_index: 0 },
                AlignmentOp::Match { ref_index: reference.len(), hyp_index: 1 },
                AlignmentOp::Insert { hyp_index: hypothesis.len() },
                AlignmentOp::Delete { ref_index: 1 },
            ]
        }
    }

    #[test]
    fn out_of_range_ops_from_custom_aligner_are_skipped() {
        let tokens = tokenize_reference("I like.");
        let recognized = vec![word("i", 0.0, 0.2), word("like", 0.25, 0.5)];
        let stream = align_stream(&OffByOneAligner, &tokens, &recognized);
        let words: Vec<&str> = stream.iter().map(|t| t.word()).collect();
        assert_eq!(words, ["i", "like", "."]);
        assert_eq!(stream[0].op, AlignmentOp::Match { ref_index: 0, hyp_index: 0 });
        assert_eq!(stream[1].op, AlignmentOp::Delete { ref_index: 1 });
        assert!(stream[2].is_punctuation());
    }
}
