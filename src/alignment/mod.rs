pub mod content;
pub mod phoneme;
pub mod tokenization;
