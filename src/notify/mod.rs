//! Outbound notifications
//!
//! A single `Notifier` is built at start-up from configuration and shared by
//! every service. Delivery is best effort: callers get one attempt and an
//! error if it fails, never a retry.

mod http;
pub mod templates;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use http::HttpMailNotifier;

/// Notifier errors
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Mail relay request failed: {0}")]
    Transport(String),

    #[error("Mail relay rejected message with status {0}")]
    Rejected(u16),

    #[error("Notification timed out after {0} ms")]
    Timeout(u64),
}

/// Body of an outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Html(String),
    Text(String),
}

/// Rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub body: MessageBody,
}

/// Message addressed to a recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub message: Message,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Notifier that only writes the message to the log.
///
/// Used when no mail relay is configured.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            to = %notification.to,
            subject = %notification.message.subject,
            "Mail relay not configured, notification logged only"
        );
        Ok(())
    }
}

/// Send through `notifier`, giving up after `timeout`.
pub async fn send_bounded(
    notifier: &dyn Notifier,
    notification: &Notification,
    timeout: Duration,
) -> Result<(), NotifyError> {
    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

    tokio::time::timeout(timeout, notifier.send(notification))
        .await
        .map_err(|_| NotifyError::Timeout(timeout_ms))?
}
