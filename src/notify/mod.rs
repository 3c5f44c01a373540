//! Boundary to the message-delivery capability. Delivery is best-effort and
//! decoupled from state correctness: a failed send is logged by the caller
//! and never blocks persistence.

mod telegram;

pub use telegram::TelegramChannel;

use async_trait::async_trait;
use std::fmt;

#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn deliver(&self, message: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug)]
pub enum DeliveryError {
    /// Credentials absent. A valid configuration state, reported so the
    /// caller can log the skip.
    NotConfigured,
    Transport { source: reqwest::Error },
    Rejected { status: u16, body: String },
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::NotConfigured => {
                write!(f, "delivery credentials not configured; skipping")
            }
            DeliveryError::Transport { source } => write!(f, "delivery transport failure: {source}"),
            DeliveryError::Rejected { status, body } => {
                write!(f, "delivery rejected with HTTP {status}: {body}")
            }
        }
    }
}

impl std::error::Error for DeliveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeliveryError::Transport { source } => Some(source),
            _ => None,
        }
    }
}
