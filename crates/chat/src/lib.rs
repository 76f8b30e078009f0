//! Chat interface for dockbook:
//! - **Transport seam** (`transport`) - inbound/outbound message types and
//!   the runner that pumps a [`ChatTransport`](transport::ChatTransport)
//! - **Sessions** (`session`) - per-sender conversational state
//! - **Dialogue** (`dialogue`) - the scripted booking and admin flows
//! - **Menu** (`menu`) - reply text rendering
//!
//! The real messaging network (delivery, sender identity, pairing) lives
//! behind the transport trait; everything in this crate only sees a sender
//! id, a display name, and text.

pub mod dialogue;
pub mod menu;
pub mod session;
pub mod transport;

pub use dialogue::{DialogueEngine, DialoguePolicy};
pub use session::SessionStore;
pub use transport::{ChatRunner, ChatTransport, InboundMessage, NoopChatTransport};
