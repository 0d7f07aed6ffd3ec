//! User-facing notifications for action outcomes and refresh failures.

use cf_api_types::{Notification, NotificationLevel};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

use crate::FarmError;

pub trait Notifier: Send + Sync {
    fn success(&self, title: &str, message: &str);
    fn error(&self, title: &str, err: &FarmError);
}

/// Writes notifications to the log only.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, title: &str, message: &str) {
        info!("{title}: {message}");
    }

    fn error(&self, title: &str, err: &FarmError) {
        warn!(kind = err.kind(), "{title}: {err}");
    }
}

/// Keeps the most recent notifications for callers to read back.
pub struct MemoryNotifier {
    capacity: usize,
    entries: Mutex<VecDeque<Notification>>,
}

impl MemoryNotifier {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn recent(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    fn push(&self, notification: Notification) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(notification);
    }
}

impl Notifier for MemoryNotifier {
    fn success(&self, title: &str, message: &str) {
        TracingNotifier.success(title, message);
        self.push(Notification {
            level: NotificationLevel::Success,
            title: title.to_owned(),
            message: message.to_owned(),
        });
    }

    fn error(&self, title: &str, err: &FarmError) {
        TracingNotifier.error(title, err);
        self.push(Notification {
            level: NotificationLevel::Error,
            title: title.to_owned(),
            message: format!("[{}] {err}", err.kind()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_notifier_keeps_only_the_newest() {
        let notifier = MemoryNotifier::new(2);
        notifier.success("Stake", "Staked 1 CHEDDAR");
        notifier.error("Unstake", &FarmError::Validation("Unstake a positive amount".to_owned()));
        notifier.success("Refresh", "done");

        let recent = notifier.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].level, NotificationLevel::Error);
        assert_eq!(recent[0].message, "[validation] Unstake a positive amount");
        assert_eq!(recent[1].title, "Refresh");
    }
}
