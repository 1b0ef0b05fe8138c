mod aggregator;
mod feedback;

pub use aggregator::{
    band_for, consistency_bonus, pte_score, rhythm_from_pause_penalty, summarize,
    UtteranceEvidence,
};
pub use feedback::generate_feedback;
