//! Short-lived messages shown over the current section.

use chrono::{DateTime, Duration, Utc};

use crate::error::ClientError;

pub const NOTICE_TTL_SECS: i64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub expires_at: DateTime<Utc>,
}

impl Notice {
    pub fn success(text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::new(NoticeKind::Success, text.into(), now)
    }

    pub fn from_error(err: &ClientError, now: DateTime<Utc>) -> Self {
        let text = match err {
            ClientError::Server { status: 404, .. } => "That name is not on the roster".to_string(),
            ClientError::Server { status: 409, .. } => "You already did that".to_string(),
            ClientError::Server { status: 400, body } if !body.is_empty() => body.clone(),
            ClientError::Server { status: 502, .. } => {
                "The photo could not be uploaded, try again".to_string()
            }
            ClientError::Http(_) => "Could not reach the server".to_string(),
            _ => "Something went wrong, try again".to_string(),
        };
        Self::new(NoticeKind::Error, text, now)
    }

    fn new(kind: NoticeKind, text: String, now: DateTime<Utc>) -> Self {
        Self {
            kind,
            text,
            expires_at: now + Duration::seconds(NOTICE_TTL_SECS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Default)]
pub struct Notices {
    items: Vec<Notice>,
}

impl Notices {
    pub fn push(&mut self, notice: Notice) {
        self.items.push(notice);
    }

    /// Drops expired notices and returns the rest, oldest first.
    pub fn active(&mut self, now: DateTime<Utc>) -> &[Notice] {
        self.items.retain(|notice| !notice.is_expired(now));
        &self.items
    }
}
