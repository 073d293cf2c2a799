//! Panel-scoped transient messages.
//!
//! Each panel shows at most one notice at a time. A notice is cleared
//! automatically after the panel's TTL unless a newer notice replaced it
//! first; a stale clear timer never clears a newer notice.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::constants::NOTICE_HISTORY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

#[derive(Debug)]
struct NoticesInner {
    current: watch::Sender<Option<Notice>>,
    generation: AtomicU64,
    history: Mutex<VecDeque<Notice>>,
    ttl: Duration,
}

/// A panel's notice surface. Clones share the same surface.
#[derive(Debug, Clone)]
pub struct Notices {
    inner: Arc<NoticesInner>,
}

impl Notices {
    pub fn new(ttl: Duration) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            inner: Arc::new(NoticesInner {
                current,
                generation: AtomicU64::new(0),
                history: Mutex::new(VecDeque::with_capacity(NOTICE_HISTORY)),
                ttl,
            }),
        }
    }

    /// Show a notice and schedule its removal.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn notice(&self, kind: NoticeKind, text: impl Into<String>) {
        let notice = Notice { kind, text: text.into() };
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut history = self.inner.history.lock();
            if history.len() == NOTICE_HISTORY {
                history.pop_front();
            }
            history.push_back(notice.clone());
        }
        self.inner.current.send_replace(Some(notice));

        let inner = Arc::downgrade(&self.inner);
        let ttl = self.inner.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = inner.upgrade() {
                if inner.generation.load(Ordering::SeqCst) == generation {
                    inner.current.send_replace(None);
                }
            }
        });
    }

    pub fn info(&self, text: impl Into<String>) {
        self.notice(NoticeKind::Info, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.notice(NoticeKind::Error, text);
    }

    /// The notice currently showing, if any.
    pub fn current(&self) -> Option<Notice> {
        self.inner.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Notice>> {
        self.inner.current.subscribe()
    }

    /// Recent notices, oldest first, including cleared ones.
    pub fn history(&self) -> Vec<Notice> {
        self.inner.history.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_notice_auto_clears() {
        let notices = Notices::new(Duration::from_secs(5));
        notices.error("too big");
        assert_eq!(notices.current().unwrap().text, "too big");

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(notices.current(), None);
        assert_eq!(notices.history().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_keeps_newer_notice() {
        let notices = Notices::new(Duration::from_secs(5));
        notices.error("first");
        tokio::time::sleep(Duration::from_secs(3)).await;
        notices.info("second");

        // First notice's timer fires at 5s; second must survive it.
        tokio::time::sleep(Duration::from_secs(3)).await;
        let current = notices.current().unwrap();
        assert_eq!(current.kind, NoticeKind::Info);
        assert_eq!(current.text, "second");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(notices.current(), None);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(NoticeKind::Error.to_string(), "error");
        assert_eq!(NoticeKind::Info.as_ref(), "info");
    }
}
