pub mod session;

pub use session::{Phase, SessionOrchestrator, SubmitOutcome};
