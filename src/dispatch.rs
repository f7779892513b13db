//! Message composition and fan-out to destinations.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::DispatchError;
use crate::source::Article;

/// Shown when an article has no title.
const UNTITLED: &str = "(untitled)";

/// Per-message delivery flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub disable_link_preview: bool,
}

/// Outbound message transport.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Send `text` to one destination.
    async fn send(
        &self,
        destination: &str,
        text: &str,
        options: SendOptions,
    ) -> Result<(), DispatchError>;

    /// Release the transport session.  Called once at shutdown.
    async fn close(&self) {}
}

/// Build the message body for one article.
pub fn compose_message(article: &Article, feed_title: &str) -> String {
    let title = article
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(UNTITLED);
    let link = article.link.as_deref().unwrap_or_default();
    format!("{feed_title} has new content!\n\n{title}\n\n{link}")
}

/// Outcome of delivering one article to every destination.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub delivered: Vec<String>,
    pub failed: Vec<(String, DispatchError)>,
}

impl DeliveryReport {
    pub fn all_failed(&self) -> bool {
        self.delivered.is_empty() && !self.failed.is_empty()
    }
}

/// Sends articles to destinations one after another.
#[derive(Clone)]
pub struct Dispatcher {
    delivery: Arc<dyn Delivery>,
    options: SendOptions,
}

impl Dispatcher {
    pub fn new(delivery: Arc<dyn Delivery>, options: SendOptions) -> Self {
        Self { delivery, options }
    }

    /// Deliver `article` to each destination in order.
    ///
    /// A failing destination is logged and skipped; it never stops delivery
    /// to the ones after it.
    pub async fn deliver(
        &self,
        article: &Article,
        feed_title: &str,
        destinations: &[String],
    ) -> DeliveryReport {
        let text = compose_message(article, feed_title);
        let mut report = DeliveryReport::default();

        for destination in destinations {
            match self.delivery.send(destination, &text, self.options).await {
                Ok(()) => {
                    debug!(destination = %destination, "message sent");
                    report.delivered.push(destination.clone());
                }
                Err(e) => {
                    error!(destination = %destination, error = %e, "failed to send message");
                    report.failed.push((destination.clone(), e));
                }
            }
        }

        report
    }

    pub async fn close(&self) {
        self.delivery.close().await;
    }
}
