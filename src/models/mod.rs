pub mod analysis;
pub mod answer;
pub mod evaluation;

pub use analysis::{DeckDocument, PitchDeckAnalysis, MAX_INVESTOR_QUESTIONS, MIN_INVESTOR_QUESTIONS};
pub use answer::{render_transcript, AnswerRecord};
pub use evaluation::{round_to_tenth, CategoryScores, EvaluationResult, StoredEvaluationRecord};
