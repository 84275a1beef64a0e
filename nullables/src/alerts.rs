//! Nullable alert sink: records messages instead of posting them.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use vigil_alerts::{AlertError, AlertMessage, AlertSink};

#[derive(Default)]
pub struct NullAlertSink {
    posts: Mutex<Vec<(String, AlertMessage)>>,
    failing: AtomicBool,
}

impl NullAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent post fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All `(channel, message)` pairs posted, in order.
    pub fn posts(&self) -> Vec<(String, AlertMessage)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<AlertMessage> {
        self.posts().into_iter().map(|(_, m)| m).collect()
    }

    pub fn count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    /// Number of messages whose text or blocks contain `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, m)| m.contains(needle))
            .count()
    }

    pub fn clear(&self) {
        self.posts.lock().unwrap().clear();
    }
}

#[async_trait]
impl AlertSink for NullAlertSink {
    async fn post_message(&self, channel: &str, message: &AlertMessage) -> Result<(), AlertError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AlertError::Unreachable("null sink set to fail".to_string()));
        }
        self.posts
            .lock()
            .unwrap()
            .push((channel.to_string(), message.clone()));
        Ok(())
    }
}
