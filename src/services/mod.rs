pub mod evaluator;
pub mod json_store;
pub mod llm_evaluator;
pub mod rest_store;
pub mod result_store;
pub mod transcriber;

pub use evaluator::{AnswerScore, Evaluator, EvaluatorError, SessionScores};
pub use json_store::JsonFileStore;
pub use llm_evaluator::LlmEvaluator;
pub use rest_store::RestStore;
pub use result_store::{ResultStore, StoreError};
pub use transcriber::{
    collect_final_text, listen_once, RecognizerState, Transcriber, TranscriptEvent,
};
