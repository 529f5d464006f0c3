//! Notification sinks
//!
//! A [`Notifier`] delivers one composed message. Delivery failures are
//! logged and swallowed; a failed post never stops the cycle.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::TrackerResult;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str);
}

/// Writes messages to the log; used when no webhook is configured
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) {
        info!(target: "overhead_tracker::announce", "{}", message);
    }
}

#[derive(Serialize)]
struct StatusPost<'a> {
    status: &'a str,
}

/// Posts `{"status": message}` to a webhook, with an optional bearer token
pub struct WebhookNotifier {
    http_client: Client,
    url: String,
    token: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, token: Option<String>) -> TrackerResult<Self> {
        let http_client = Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;

        Ok(Self {
            http_client,
            url: url.into(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    async fn post(&self, message: &str) -> TrackerResult<()> {
        let mut request = self
            .http_client
            .post(&self.url)
            .json(&StatusPost { status: message });

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        request.send().await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &str) {
        match self.post(message).await {
            Ok(()) => info!("Posted: {}", message),
            Err(e) => error!("Failed to post notification: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_body_shape() {
        let body = serde_json::to_value(StatusPost { status: "hello" }).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "hello" }));
    }

    #[test]
    fn test_empty_token_ignored() {
        let notifier = WebhookNotifier::new("http://localhost:9", Some(String::new())).unwrap();
        assert!(notifier.token.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_webhook_does_not_panic() {
        // Port 9 (discard) is closed on test hosts; the error is logged and dropped
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/post", None).unwrap();
        notifier.notify("test").await;
    }
}
