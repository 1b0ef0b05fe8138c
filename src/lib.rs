pub mod alignment;
pub mod baseline;
pub mod config;
pub mod error;
pub mod fluency;
pub mod phonetics;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod types;

pub use config::ScoringConfig;
pub use error::ScoringError;
pub use phonetics::{PhoneLabel, PronunciationDictionary};
pub use pipeline::builder::ScorerBuilder;
pub use pipeline::runtime::Scorer;
pub use pipeline::traits::{ContentAligner, CostModel, PhonemeRecognizer};
pub use types::{ScoringInput, ScoringOutput, UtteranceScoreSummary, WordReport, WordStatus};
