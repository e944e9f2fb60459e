// Chat domain: the conversation model and the session that streams into it

mod conversation;
mod prompts;
mod session;

pub use conversation::{Message, Role};
pub use prompts::{EXAMPLE_PROMPTS, SYSTEM_PREAMBLE};
pub use session::{ChatSession, SessionEnd, StreamEvent, SubmitOutcome, FAILURE_MESSAGE};
