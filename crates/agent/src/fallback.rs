use std::sync::Arc;

use tracing::warn;

use crate::llm::LlmClient;

const DEFAULT_APOLOGY: &str =
    "Sorry, I could not process that message right now. Please try again in a moment, \
     or type \"menu\" to see the options.";

/// Fails open: whatever goes wrong underneath (network, quota, empty
/// completion), the user gets one generic apology and the conversation
/// continues. Raw failures never reach the chat.
pub struct FallbackResponder {
    client: Option<Arc<dyn LlmClient>>,
    apology: String,
}

impl FallbackResponder {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client: Some(client), apology: DEFAULT_APOLOGY.to_string() }
    }

    /// No model configured at all; every question gets the apology.
    pub fn disabled() -> Self {
        Self { client: None, apology: DEFAULT_APOLOGY.to_string() }
    }

    pub async fn answer(&self, question: &str) -> String {
        let Some(client) = &self.client else {
            return self.apology.clone();
        };

        match client.answer(question).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => self.apology.clone(),
            Err(error) => {
                warn!(
                    event_name = "agent.fallback.answer_failed",
                    error = %error,
                    "llm fallback failed; replying with apology"
                );
                self.apology.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{FallbackResponder, DEFAULT_APOLOGY};
    use crate::llm::StaticLlmClient;

    #[tokio::test]
    async fn relays_the_model_answer() {
        let responder = FallbackResponder::new(Arc::new(StaticLlmClient {
            answer: Some("Our dock opens at 07:30.".into()),
        }));

        assert_eq!(responder.answer("when do you open?").await, "Our dock opens at 07:30.");
    }

    #[tokio::test]
    async fn fails_open_on_error_and_blank_output() {
        let failing = FallbackResponder::new(Arc::new(StaticLlmClient { answer: None }));
        assert_eq!(failing.answer("hello?").await, DEFAULT_APOLOGY);

        let blank =
            FallbackResponder::new(Arc::new(StaticLlmClient { answer: Some("   ".into()) }));
        assert_eq!(blank.answer("hello?").await, DEFAULT_APOLOGY);

        assert_eq!(FallbackResponder::disabled().answer("hello?").await, DEFAULT_APOLOGY);
    }
}
