//! # Redis
//!
//! Production document store.
//!
//! ## Layout
//!
//! - `roster`: string, JSON array of participants, rewritten whole on every edit
//! - `accesses`: list of JSON access records, RPUSH only
//! - `tapas`: hash of dish id to JSON dish
//! - `tapas:order`: list of dish ids in insertion order
//! - `votos:{dish}`: hash of voter key to JSON vote
//! - `asistencias`: hash of participant name to JSON attendance record
//!
//! ## Vote uniqueness
//!
//! Votes are written with HSETNX on the voter key. Redis runs commands one at
//! a time, so two near-simultaneous casts from the same participant race on a
//! single field and exactly one of them sets it.
//!
//! ## Decoding
//!
//! Documents are decoded into typed records on read. A document that does not
//! decode is logged and skipped.
use std::collections::HashMap;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::{
    models::{AccessRecord, AttendanceRecord, Dish, Participant, Vote},
    store::{Store, StoreError},
    utils::voter_key,
};

const ROSTER_KEY: &str = "roster";
const ACCESSES_KEY: &str = "accesses";
const DISHES_KEY: &str = "tapas";
const DISH_ORDER_KEY: &str = "tapas:order";
const ATTENDANCE_KEY: &str = "asistencias";

fn votes_key(dish_id: &str) -> String {
    format!("votos:{dish_id}")
}

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, StoreError> {
    let client = Client::open(redis_url)?;
    let connection_manager = ConnectionManager::new(client).await?;

    info!("Connected to Redis at {redis_url}");

    Ok(connection_manager)
}

fn decode_all<T: DeserializeOwned>(collection: &str, raw: Vec<String>) -> Vec<T> {
    raw.into_iter()
        .filter_map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| warn!(collection, error = %e, "Skipping malformed document"))
                .ok()
        })
        .collect()
}

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        Ok(Self::new(init_redis(redis_url).await?))
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn roster(&self) -> Result<Option<Vec<Participant>>, StoreError> {
        let mut con = self.connection.clone();
        let raw: Option<String> = con.get(ROSTER_KEY).await?;

        Ok(match raw {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        })
    }

    async fn put_roster(&self, roster: &[Participant]) -> Result<(), StoreError> {
        let mut con = self.connection.clone();
        let json = serde_json::to_string(roster)?;
        let _: () = con.set(ROSTER_KEY, json).await?;

        Ok(())
    }

    async fn append_access(&self, record: &AccessRecord) -> Result<(), StoreError> {
        let mut con = self.connection.clone();
        let _: () = con
            .rpush(ACCESSES_KEY, serde_json::to_string(record)?)
            .await?;

        Ok(())
    }

    async fn accesses(&self) -> Result<Vec<AccessRecord>, StoreError> {
        let mut con = self.connection.clone();
        let raw: Vec<String> = con.lrange(ACCESSES_KEY, 0, -1).await?;

        Ok(decode_all(ACCESSES_KEY, raw))
    }

    async fn insert_dish(&self, dish: &Dish) -> Result<(), StoreError> {
        let mut con = self.connection.clone();
        let json = serde_json::to_string(dish)?;

        let _: () = redis::pipe()
            .atomic()
            .hset(DISHES_KEY, &dish.id, json)
            .ignore()
            .rpush(DISH_ORDER_KEY, &dish.id)
            .ignore()
            .query_async(&mut con)
            .await?;

        Ok(())
    }

    async fn update_dish(&self, dish: &Dish) -> Result<bool, StoreError> {
        let mut con = self.connection.clone();
        let exists: bool = con.hexists(DISHES_KEY, &dish.id).await?;
        if !exists {
            return Ok(false);
        }

        let _: () = con
            .hset(DISHES_KEY, &dish.id, serde_json::to_string(dish)?)
            .await?;

        Ok(true)
    }

    async fn dish(&self, id: &str) -> Result<Option<Dish>, StoreError> {
        let mut con = self.connection.clone();
        let raw: Option<String> = con.hget(DISHES_KEY, id).await?;

        Ok(match raw {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        })
    }

    async fn dishes(&self) -> Result<Vec<Dish>, StoreError> {
        let mut con = self.connection.clone();
        let order: Vec<String> = con.lrange(DISH_ORDER_KEY, 0, -1).await?;
        let mut by_id: HashMap<String, String> = con.hgetall(DISHES_KEY).await?;

        let raw = order
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();

        Ok(decode_all(DISHES_KEY, raw))
    }

    async fn insert_vote(&self, vote: &Vote) -> Result<bool, StoreError> {
        let mut con = self.connection.clone();
        let inserted: bool = con
            .hset_nx(
                votes_key(&vote.dish_id),
                vote.voter_key(),
                serde_json::to_string(vote)?,
            )
            .await?;

        Ok(inserted)
    }

    async fn vote(&self, dish_id: &str, voter: &str) -> Result<Option<Vote>, StoreError> {
        let mut con = self.connection.clone();
        let raw: Option<String> = con.hget(votes_key(dish_id), voter_key(voter)).await?;

        Ok(match raw {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        })
    }

    async fn votes(&self, dish_id: &str) -> Result<Vec<Vote>, StoreError> {
        let mut con = self.connection.clone();
        let raw: Vec<String> = con.hvals(votes_key(dish_id)).await?;

        let mut votes: Vec<Vote> = decode_all("votos", raw);
        votes.sort_by_key(|v| v.cast_at);

        Ok(votes)
    }

    async fn put_attendance(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        let mut con = self.connection.clone();
        let _: () = con
            .hset(
                ATTENDANCE_KEY,
                &record.participant_name,
                serde_json::to_string(record)?,
            )
            .await?;

        Ok(())
    }

    async fn delete_attendance(&self, name: &str) -> Result<bool, StoreError> {
        let mut con = self.connection.clone();
        let removed: u32 = con.hdel(ATTENDANCE_KEY, name).await?;

        Ok(removed > 0)
    }

    async fn attendance(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut con = self.connection.clone();
        let raw: Vec<String> = con.hvals(ATTENDANCE_KEY).await?;

        Ok(decode_all(ATTENDANCE_KEY, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_documents_are_skipped() {
        let raw = vec![
            r#"{"participant_name":"Ana","confirmed_at":"2025-11-14T20:00:00Z"}"#.to_string(),
            "{ not json".to_string(),
            r#"{"participant_name":"Luis"}"#.to_string(),
            r#"{"participant_name":"Marta","confirmed_at":"2025-11-14T21:30:00Z"}"#.to_string(),
        ];

        let records: Vec<AttendanceRecord> = decode_all(ATTENDANCE_KEY, raw);
        let names: Vec<_> = records.iter().map(|r| r.participant_name.as_str()).collect();
        assert_eq!(names, ["Ana", "Marta"]);
    }

    #[test]
    fn votes_key_is_per_dish() {
        assert_eq!(votes_key("abc"), "votos:abc");
    }
}
