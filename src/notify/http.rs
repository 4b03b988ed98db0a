use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{MessageBody, Notification, Notifier, NotifyError};
use crate::config::MailConfig;

/// Delivers mail through an HTTP relay that accepts a JSON envelope.
pub struct HttpMailNotifier {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    from_address: String,
}

#[derive(Serialize)]
struct RelayEnvelope<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

impl HttpMailNotifier {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        from_address: String,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(format!("failed to build mail client: {}", e)))?;

        Ok(Self {
            client,
            api_url,
            api_key,
            from_address,
        })
    }

    /// Build from mail settings; `Ok(None)` when no relay URL is configured.
    pub fn from_config(mail: &MailConfig, timeout: Duration) -> Result<Option<Self>, NotifyError> {
        mail.api_url
            .as_ref()
            .map(|url| {
                Self::new(
                    url.clone(),
                    mail.api_key.clone(),
                    mail.from_address.clone(),
                    timeout,
                )
            })
            .transpose()
    }
}

#[async_trait]
impl Notifier for HttpMailNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let (html, text) = match &notification.message.body {
            MessageBody::Html(body) => (Some(body.as_str()), None),
            MessageBody::Text(body) => (None, Some(body.as_str())),
        };

        let envelope = RelayEnvelope {
            from: &self.from_address,
            to: &notification.to,
            subject: &notification.message.subject,
            html,
            text,
        };

        let mut request = self.client.post(&self.api_url).json(&envelope);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }

        tracing::debug!(to = %notification.to, subject = %notification.message.subject, "Notification delivered");
        Ok(())
    }
}
