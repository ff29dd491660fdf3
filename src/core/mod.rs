// Core algorithm exports
pub mod clarify;
pub mod error;
pub mod extractor;
pub mod filters;
pub mod matcher;
pub mod scoring;
pub mod text;
pub mod vocabulary;

pub use clarify::{apply_clarification, choose_clarifying_question, ClarifyField, ClarifyingQuestion};
pub use error::MatchError;
pub use extractor::{hash_identifier, ExtractionConfig, Extractor, IdentifierRules};
pub use filters::{is_eligible_candidate, meets_threshold, rank_order};
pub use matcher::{AttributeProvider, MatchConfig, MatchResult, Matcher};
pub use scoring::{calculate_match_score, explain_match, validate_weights, Scorer};
pub use vocabulary::{Lexicon, PhraseTable, Vocabulary, VocabularyEntry};
