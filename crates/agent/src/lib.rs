//! AI fallback responder. Free text that the menu cannot interpret is
//! delegated to a hosted generative model; any failure on that path turns
//! into a fixed apology rather than an error the dialogue would have to
//! handle.

pub mod fallback;
pub mod llm;

pub use fallback::FallbackResponder;
pub use llm::{HostedLlmClient, LlmClient, StaticLlmClient};
