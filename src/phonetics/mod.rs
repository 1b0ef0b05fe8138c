pub mod dictionary;
pub mod phone;

pub use dictionary::PronunciationDictionary;
pub use phone::{parse_phones, PhoneLabel, Stress};
