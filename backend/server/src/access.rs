//! # Access Log
//!
//! One record per login, appended and never touched again. Admins read it
//! newest first, optionally narrowed to names starting with a prefix.
use std::collections::HashSet;

use serde::Serialize;

use crate::{
    error::AppError,
    models::AccessRecord,
    store::Store,
    utils::voter_key,
};

/// Coarse client classification shown next to each access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    Mobile,
    Chrome,
    Firefox,
    Safari,
    Desktop,
    Unknown,
}

impl Browser {
    /// Checks run in order, so a mobile Chrome is `Mobile` and desktop Chrome
    /// (whose UA also mentions Safari) is `Chrome`.
    pub fn from_user_agent(user_agent: &str) -> Self {
        if user_agent.trim().is_empty() {
            Self::Unknown
        } else if user_agent.contains("Mobile") {
            Self::Mobile
        } else if user_agent.contains("Chrome") {
            Self::Chrome
        } else if user_agent.contains("Firefox") {
            Self::Firefox
        } else if user_agent.contains("Safari") {
            Self::Safari
        } else {
            Self::Desktop
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct AccessEntry {
    #[serde(flatten)]
    pub record: AccessRecord,
    pub browser: Browser,
}

#[derive(Clone, Debug, Serialize)]
pub struct AccessLog {
    pub total: usize,
    pub unique_participants: usize,
    pub latest: Option<String>,
    pub records: Vec<AccessEntry>,
}

pub async fn record_access(store: &dyn Store, record: &AccessRecord) -> Result<(), AppError> {
    store.append_access(record).await?;
    Ok(())
}

/// Totals cover the whole log; only `records` is narrowed by the prefix.
pub async fn list_accesses(
    store: &dyn Store,
    name_prefix: Option<&str>,
) -> Result<AccessLog, AppError> {
    let mut records = store.accesses().await?;
    // stable, so records sharing a timestamp keep newest-appended first
    records.reverse();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let unique_participants = records
        .iter()
        .map(|r| voter_key(&r.name))
        .collect::<HashSet<_>>()
        .len();

    let total = records.len();
    let latest = records.first().map(|r| r.name.clone());

    let prefix = name_prefix.map(voter_key).filter(|p| !p.is_empty());
    let records = records
        .into_iter()
        .filter(|r| match &prefix {
            Some(prefix) => voter_key(&r.name).starts_with(prefix.as_str()),
            None => true,
        })
        .map(|record| AccessEntry {
            browser: Browser::from_user_agent(&record.user_agent),
            record,
        })
        .collect();

    Ok(AccessLog {
        total,
        unique_participants,
        latest,
        records,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::{models::Participant, store::MemoryStore};

    fn record(name: &str, minutes_ago: i64) -> AccessRecord {
        let mut record = AccessRecord::new(
            &Participant {
                name: name.into(),
                is_admin: false,
            },
            "Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
        );
        record.timestamp = Utc::now() - Duration::minutes(minutes_ago);
        record
    }

    #[tokio::test]
    async fn newest_first_with_unique_count() {
        let store = MemoryStore::new();
        for r in [record("Ana", 30), record("Luis", 20), record("ana", 10)] {
            record_access(&store, &r).await.unwrap();
        }

        let log = list_accesses(&store, None).await.unwrap();
        assert_eq!(log.total, 3);
        assert_eq!(log.unique_participants, 2);
        assert_eq!(log.latest.as_deref(), Some("ana"));

        let names: Vec<_> = log.records.iter().map(|e| e.record.name.as_str()).collect();
        assert_eq!(names, ["ana", "Luis", "Ana"]);
        assert_eq!(log.records[0].browser, Browser::Firefox);
    }

    #[tokio::test]
    async fn prefix_filter_is_case_insensitive() {
        let store = MemoryStore::new();
        for r in [record("Ana", 30), record("Luis", 20), record("Anabel", 10)] {
            record_access(&store, &r).await.unwrap();
        }

        let log = list_accesses(&store, Some("AN")).await.unwrap();
        let names: Vec<_> = log.records.iter().map(|e| e.record.name.as_str()).collect();
        assert_eq!(names, ["Anabel", "Ana"]);
        assert_eq!(log.total, 3);

        let log = list_accesses(&store, Some("  ")).await.unwrap();
        assert_eq!(log.records.len(), 3);
    }

    #[test]
    fn browser_classification() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
        let chrome = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
        let safari = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

        assert_eq!(Browser::from_user_agent(iphone), Browser::Mobile);
        assert_eq!(Browser::from_user_agent(chrome), Browser::Chrome);
        assert_eq!(Browser::from_user_agent(safari), Browser::Safari);
        assert_eq!(Browser::from_user_agent("curl/8.5.0"), Browser::Desktop);
        assert_eq!(Browser::from_user_agent(""), Browser::Unknown);
    }
}
