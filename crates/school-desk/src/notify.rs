use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// A transient user-facing notification ("toast").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

/// Outbound notification hook so screens stay renderer-agnostic.
pub trait Notifier: Send + Sync {
    fn publish(&self, notice: Notice);
}

/// Queues notices until a front end drains and renders them.
#[derive(Debug, Default)]
pub struct NoticeQueue {
    pending: Mutex<Vec<Notice>>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notice> {
        let mut guard = self.pending.lock().expect("notice mutex poisoned");
        std::mem::take(&mut *guard)
    }

    pub fn snapshot(&self) -> Vec<Notice> {
        self.pending.lock().expect("notice mutex poisoned").clone()
    }
}

impl Notifier for NoticeQueue {
    fn publish(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => tracing::warn!(message = %notice.message, "notice"),
            _ => tracing::debug!(message = %notice.message, "notice"),
        }
        let mut guard = self.pending.lock().expect("notice mutex poisoned");
        guard.push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_queue() {
        let queue = NoticeQueue::new();
        queue.publish(Notice::success("saved"));
        queue.publish(Notice::error("failed"));

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NoticeLevel::Success);
        assert!(queue.snapshot().is_empty());
    }
}
