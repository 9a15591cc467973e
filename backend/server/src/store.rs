//! # Document Store
//!
//! Logical collections behind the contest:
//!
//! - roster: single document holding the participant list
//! - accesses: append-only login log
//! - tapas: dishes, kept in insertion order
//! - votos: votes, one document per (dish, voter) key
//! - asistencias: attendance records keyed by participant name
//!
//! [`Store`] is the seam between the services and the backing database.
//! Production uses Redis ([`crate::database::RedisStore`]); tests and local
//! runs use [`MemoryStore`].
//!
//! The only strict mutual exclusion the contest needs is vote uniqueness, so
//! [`Store::insert_vote`] must be an atomic insert-if-absent. Everything else
//! is last-writer-wins.
use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::{AccessRecord, AttendanceRecord, Dish, Participant, Vote};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// `None` when no roster document has ever been written.
    async fn roster(&self) -> Result<Option<Vec<Participant>>, StoreError>;

    async fn put_roster(&self, roster: &[Participant]) -> Result<(), StoreError>;

    async fn append_access(&self, record: &AccessRecord) -> Result<(), StoreError>;

    async fn accesses(&self) -> Result<Vec<AccessRecord>, StoreError>;

    async fn insert_dish(&self, dish: &Dish) -> Result<(), StoreError>;

    /// Overwrites an existing dish. Returns `false` if the dish is unknown.
    async fn update_dish(&self, dish: &Dish) -> Result<bool, StoreError>;

    async fn dish(&self, id: &str) -> Result<Option<Dish>, StoreError>;

    /// All dishes in insertion order.
    async fn dishes(&self) -> Result<Vec<Dish>, StoreError>;

    /// Writes the vote only if no vote exists under its key. Returns `false`
    /// when the key was already taken.
    async fn insert_vote(&self, vote: &Vote) -> Result<bool, StoreError>;

    async fn vote(&self, dish_id: &str, voter: &str) -> Result<Option<Vote>, StoreError>;

    async fn votes(&self, dish_id: &str) -> Result<Vec<Vote>, StoreError>;

    async fn put_attendance(&self, record: &AttendanceRecord) -> Result<(), StoreError>;

    /// Returns `false` if there was nothing to delete.
    async fn delete_attendance(&self, name: &str) -> Result<bool, StoreError>;

    async fn attendance(&self) -> Result<Vec<AttendanceRecord>, StoreError>;
}

#[derive(Default)]
struct Collections {
    roster: Option<Vec<Participant>>,
    accesses: Vec<AccessRecord>,
    dishes: Vec<Dish>,
    votes: HashMap<String, Vote>,
    attendance: HashMap<String, AttendanceRecord>,
}

/// In-process store. A single lock guards every collection, which makes the
/// vote insert atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn roster(&self) -> Result<Option<Vec<Participant>>, StoreError> {
        Ok(self.inner.lock().await.roster.clone())
    }

    async fn put_roster(&self, roster: &[Participant]) -> Result<(), StoreError> {
        self.inner.lock().await.roster = Some(roster.to_vec());
        Ok(())
    }

    async fn append_access(&self, record: &AccessRecord) -> Result<(), StoreError> {
        self.inner.lock().await.accesses.push(record.clone());
        Ok(())
    }

    async fn accesses(&self) -> Result<Vec<AccessRecord>, StoreError> {
        Ok(self.inner.lock().await.accesses.clone())
    }

    async fn insert_dish(&self, dish: &Dish) -> Result<(), StoreError> {
        self.inner.lock().await.dishes.push(dish.clone());
        Ok(())
    }

    async fn update_dish(&self, dish: &Dish) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.dishes.iter_mut().find(|d| d.id == dish.id) {
            Some(existing) => {
                *existing = dish.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn dish(&self, id: &str) -> Result<Option<Dish>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.dishes.iter().find(|d| d.id == id).cloned())
    }

    async fn dishes(&self) -> Result<Vec<Dish>, StoreError> {
        Ok(self.inner.lock().await.dishes.clone())
    }

    async fn insert_vote(&self, vote: &Vote) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let key = Vote::key(&vote.dish_id, &vote.voter);
        if inner.votes.contains_key(&key) {
            return Ok(false);
        }
        inner.votes.insert(key, vote.clone());
        Ok(true)
    }

    async fn vote(&self, dish_id: &str, voter: &str) -> Result<Option<Vote>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.votes.get(&Vote::key(dish_id, voter)).cloned())
    }

    async fn votes(&self, dish_id: &str) -> Result<Vec<Vote>, StoreError> {
        let inner = self.inner.lock().await;
        let mut votes: Vec<Vote> = inner
            .votes
            .values()
            .filter(|v| v.dish_id == dish_id)
            .cloned()
            .collect();
        votes.sort_by_key(|v| v.cast_at);
        Ok(votes)
    }

    async fn put_attendance(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .attendance
            .insert(record.participant_name.clone(), record.clone());
        Ok(())
    }

    async fn delete_attendance(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.inner.lock().await.attendance.remove(name).is_some())
    }

    async fn attendance(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self.inner.lock().await.attendance.values().cloned().collect())
    }
}
