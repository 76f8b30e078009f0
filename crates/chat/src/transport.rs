use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dialogue::DialogueEngine;

/// One message from the network: who sent it, what they are called there
/// (best effort), and the raw text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: String,
    pub display_name: Option<String>,
    pub text: String,
}

impl InboundMessage {
    /// The transport may not know a display name; fall back to a generic
    /// label rather than leaking the raw sender id into replies.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or("visitor")
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport send failed: {0}")]
    Send(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
}

/// The messaging network boundary. Delivery ordering per sender is the
/// transport's promise; the dialogue does not re-order.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_message(&self) -> Result<Option<InboundMessage>, TransportError>;
    async fn reply(&self, sender: &str, text: &str) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

/// Development stand-in: connects, delivers nothing, exits cleanly.
#[derive(Default)]
pub struct NoopChatTransport;

#[async_trait]
impl ChatTransport for NoopChatTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_message(&self) -> Result<Option<InboundMessage>, TransportError> {
        Ok(None)
    }

    async fn reply(&self, _sender: &str, _text: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Pumps the transport into the dialogue engine, reconnecting with
/// exponential backoff when the connection drops.
pub struct ChatRunner {
    transport: Arc<dyn ChatTransport>,
    engine: Arc<DialogueEngine>,
    reconnect_policy: ReconnectPolicy,
}

impl ChatRunner {
    pub fn new(transport: Arc<dyn ChatTransport>, engine: Arc<DialogueEngine>) -> Self {
        Self { transport, engine, reconnect_policy: ReconnectPolicy::default() }
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect_policy = policy;
        self
    }

    pub async fn start(&self) -> Result<()> {
        for attempt in 0..=self.reconnect_policy.max_retries {
            match self.connect_and_pump(attempt).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "chat transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "chat transport retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn connect_and_pump(&self, attempt: u32) -> Result<(), TransportError> {
        self.transport.connect().await?;
        info!(attempt, "chat transport connected");

        loop {
            let Some(message) = self.transport.next_message().await? else {
                debug!("chat transport stream ended");
                self.transport.disconnect().await?;
                return Ok(());
            };

            let reply = self.engine.handle_message(&message).await;
            self.transport.reply(&message.sender, &reply).await?;
        }
    }
}

/// Collapses a raw sender id to a local two-part phone rendering,
/// `(dd) ddddd-dddd`. Ids with fewer than eleven digits come back as-is.
pub fn format_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 11 {
        return raw.to_string();
    }
    let tail = &digits[digits.len() - 11..];
    format!("({}) {}-{}", &tail[..2], &tail[2..7], &tail[7..])
}
