//! In-memory collaborators shared by the unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::Notify;

use crate::dispatch::{Delivery, SendOptions};
use crate::error::{DispatchError, FetchError};
use crate::source::{Article, Feed, FeedSource};

pub fn article(id: &str) -> Article {
    Article {
        title: Some(format!("Post {id}")),
        link: Some(format!("https://example.com/{id}")),
        guid: Some(id.to_string()),
    }
}

/// Feed whose items are `ids`, newest first.
pub fn feed(title: &str, ids: &[&str]) -> Feed {
    Feed {
        title: title.to_string(),
        items: ids.iter().map(|id| article(id)).collect(),
    }
}

#[derive(Clone)]
enum Reply {
    Feed(Feed),
    Fail(StatusCode),
}

/// Answers fetches from a per-URL script.  The last reply for a URL repeats.
#[derive(Default)]
pub struct ScriptedSource {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
    hold: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each fetch signals `entered`, then waits for `release`.
    pub fn held(entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            hold: Some((entered, release)),
            ..Self::default()
        }
    }

    pub fn push_feed(&self, url: &str, feed: Feed) {
        self.push(url, Reply::Feed(feed));
    }

    pub fn push_failure(&self, url: &str, status: StatusCode) {
        self.push(url, Reply::Fail(status));
    }

    fn push(&self, url: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedSource for ScriptedSource {
    async fn fetch(&self, url: &str) -> Result<Feed, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some((entered, release)) = &self.hold {
            entered.notify_one();
            release.notified().await;
        }

        let mut replies = self.replies.lock().unwrap();
        let queue = replies.entry(url.to_string()).or_default();
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match reply {
            Some(Reply::Feed(feed)) => Ok(feed),
            Some(Reply::Fail(status)) => Err(FetchError::Status(status)),
            None => Err(FetchError::Status(StatusCode::NOT_FOUND)),
        }
    }
}

/// Records every successful send; destinations in `fail` always error.
#[derive(Default)]
pub struct RecordingDelivery {
    fail: HashSet<String>,
    sent: Mutex<Vec<(String, String)>>,
    attempts: AtomicUsize,
    closed: AtomicBool,
}

impl RecordingDelivery {
    pub fn failing(destinations: &[&str]) -> Self {
        Self {
            fail: destinations.iter().map(|d| d.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn send(
        &self,
        destination: &str,
        text: &str,
        _options: SendOptions,
    ) -> Result<(), DispatchError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) {
            return Err(DispatchError::Closed);
        }
        if self.fail.contains(destination) {
            return Err(DispatchError::Api {
                code: 403,
                description: "Forbidden: bot was kicked from the group chat".into(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), text.to_string()));
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
