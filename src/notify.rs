//! Transient toasts. Operations push notices here; the next response drains
//! them into the page, and the browser dismisses each one after
//! [`NOTICE_DISPLAY_SECS`].

use super::config::NOTICE_DISPLAY_SECS;
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
            NoticeKind::Info => "info",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.raised_at >= Duration::seconds(NOTICE_DISPLAY_SECS)
    }
}

#[derive(Debug, Default)]
pub struct Notifier {
    next_id: u64,
    pending: VecDeque<Notice>,
}

impl Notifier {
    pub fn push(
        &mut self,
        kind: NoticeKind,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.next_id += 1;
        self.pending.push_back(Notice {
            id: self.next_id,
            kind,
            message: message.into(),
            raised_at: now,
        });
    }

    /// Hand every pending notice to the caller exactly once. Notices whose
    /// display window already passed before anyone could see them are
    /// dropped.
    pub fn drain(&mut self, now: DateTime<Utc>) -> Vec<Notice> {
        self.pending
            .drain(..)
            .filter(|n| !n.is_expired(now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_delivers_once() {
        let now = Utc::now();
        let mut notifier = Notifier::default();
        notifier.push(NoticeKind::Success, "Session saved successfully!", now);
        notifier.push(NoticeKind::Info, "No saved session found", now);

        let drained = notifier.drain(now);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].kind, NoticeKind::Success);
        assert_ne!(drained[0].id, drained[1].id);
        assert!(notifier.drain(now).is_empty());
    }

    #[test]
    fn test_stale_notices_are_dropped() {
        let then = Utc::now();
        let mut notifier = Notifier::default();
        notifier.push(NoticeKind::Error, "Error loading session", then);
        let later = then + Duration::seconds(NOTICE_DISPLAY_SECS);
        assert!(notifier.drain(later).is_empty());
    }
}
