mod job;
mod state;

pub use job::{TranscriptResult, TranscriptionJob};
pub use state::{JobState, StateMachine, Transition, classify_remote_status};
