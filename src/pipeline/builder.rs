use std::sync::Arc;

use crate::alignment::phoneme::cost_model_for;
use crate::config::ScoringConfig;
use crate::error::ScoringError;
use crate::phonetics::PronunciationDictionary;
use crate::pipeline::defaults::{EditDistanceAligner, IntervalPhoneRecognizer};
use crate::pipeline::runtime::{Scorer, ScorerParts};
use crate::pipeline::traits::{ContentAligner, CostModel, PhonemeRecognizer};

pub struct ScorerBuilder {
    config: ScoringConfig,
    dictionary: Option<Arc<PronunciationDictionary>>,
    cost_model: Option<Box<dyn CostModel>>,
    content_aligner: Option<Box<dyn ContentAligner>>,
    recognizer: Option<Box<dyn PhonemeRecognizer>>,
    parallel: bool,
}

impl ScorerBuilder {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            dictionary: None,
            cost_model: None,
            content_aligner: None,
            recognizer: None,
            parallel: true,
        }
    }

    pub fn with_dictionary(mut self, dictionary: Arc<PronunciationDictionary>) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    pub fn with_cost_model(mut self, cost_model: Box<dyn CostModel>) -> Self {
        self.cost_model = Some(cost_model);
        self
    }

    pub fn with_content_aligner(mut self, content_aligner: Box<dyn ContentAligner>) -> Self {
        self.content_aligner = Some(content_aligner);
        self
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn PhonemeRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Per-word phoneme scoring runs on the rayon pool when enabled (default).
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn build(self) -> Result<Scorer, ScoringError> {
        self.config.validate()?;
        let dictionary = self.dictionary.ok_or_else(|| {
            ScoringError::invalid_input("a pronunciation dictionary is required")
        })?;
        let cost_model = self
            .cost_model
            .unwrap_or_else(|| cost_model_for(&self.config.phoneme));

        tracing::debug!(
            dictionary_entries = dictionary.len(),
            cost_model = cost_model.name(),
            parallel = self.parallel,
            "scorer built"
        );

        Ok(Scorer::from_parts(ScorerParts {
            config: self.config,
            dictionary,
            cost_model,
            content_aligner: self
                .content_aligner
                .unwrap_or_else(|| Box::new(EditDistanceAligner)),
            recognizer: self
                .recognizer
                .unwrap_or_else(|| Box::new(IntervalPhoneRecognizer::default())),
            parallel: self.parallel,
        }))
    }
}
