//! Telegram Bot API delivery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::dispatch::{Delivery, SendOptions};
use crate::error::DispatchError;

/// Sends plain-text messages through `sendMessage`.
pub struct TelegramClient {
    client: Client,
    api_url: String,
    bot_token: String,
    closed: AtomicBool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramClient {
    pub fn new(client: Client, api_url: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            closed: AtomicBool::new(false),
        }
    }

    /// Build a client whose every Bot API call gives up after `timeout`.
    pub fn with_timeout(
        api_url: impl Into<String>,
        bot_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DispatchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client, api_url, bot_token))
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }
}

#[async_trait]
impl Delivery for TelegramClient {
    async fn send(
        &self,
        destination: &str,
        text: &str,
        options: SendOptions,
    ) -> Result<(), DispatchError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DispatchError::Closed);
        }

        let resp = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": destination,
                "text": text,
                "disable_web_page_preview": options.disable_link_preview,
            }))
            .send()
            .await?;

        let status = resp.status();
        let body: ApiResponse = resp.json().await?;
        if !body.ok {
            return Err(DispatchError::Api {
                code: body.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                description: body.description.unwrap_or_else(|| status.to_string()),
            });
        }

        Ok(())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("telegram session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_url_strips_trailing_slash() {
        let client = TelegramClient::new(Client::new(), "https://api.telegram.org/", "123:abc");
        assert_eq!(
            client.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn api_error_body_parses() {
        let body = r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#;
        let parsed: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(!parsed.ok);
        assert_eq!(parsed.error_code, Some(400));
        assert_eq!(parsed.description.as_deref(), Some("Bad Request: chat not found"));
    }

    #[tokio::test]
    async fn send_after_close_is_rejected() {
        // Unroutable address: the closed check must fire before any request.
        let client = TelegramClient::new(Client::new(), "http://127.0.0.1:9", "t");
        client.close().await;

        let err = client
            .send("-100", "hello", SendOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Closed));
    }

    #[tokio::test]
    async fn unanswered_request_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold the connection without ever answering.
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            std::future::pending::<()>().await;
            drop(socket);
        });

        let client =
            TelegramClient::with_timeout(format!("http://{addr}"), "t", Duration::from_millis(200))
                .unwrap();
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            client.send("-100", "hello", SendOptions::default()),
        )
        .await
        .expect("client timeout fires first");

        assert!(matches!(result, Err(DispatchError::Http(ref e)) if e.is_timeout()));
        server.abort();
    }
}
