//! # Records
//!
//! Typed entities stored in the document store and returned by the API.
//!
//! Everything read back from the store goes through serde into these types.
//! Scores are validated on the way in and on the way out, so a record with a
//! score outside 1..=5 never decodes.
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::voter_key;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub is_admin: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub participant_name: String,
    pub is_admin: bool,
    pub login_timestamp: DateTime<Utc>,
    pub session_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub id: String,
    pub name: String,
    pub is_admin: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub user_agent: String,
}

impl AccessRecord {
    pub fn new(participant: &Participant, user_agent: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: participant.name.clone(),
            is_admin: participant.is_admin,
            timestamp: Utc::now(),
            user_agent: user_agent.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dish {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
}

/// A 1 to 5 star rating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Score {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!(
                "score must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            ))
        }
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    pub dish_id: String,
    pub voter: String,
    pub score: Score,
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    /// Deterministic document key for a (dish, voter) pair. Two casts from the
    /// same participant on the same dish always target the same key.
    pub fn key(dish_id: &str, voter: &str) -> String {
        format!("{dish_id}:{}", voter_key(voter))
    }

    pub fn voter_key(&self) -> String {
        voter_key(&self.voter)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub participant_name: String,
    pub confirmed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DishAggregate {
    pub dish_id: String,
    pub mean_score: f64,
    pub vote_count: u32,
}

impl DishAggregate {
    pub fn empty(dish_id: &str) -> Self {
        Self {
            dish_id: dish_id.to_string(),
            mean_score: 0.0,
            vote_count: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedDish {
    pub dish: Dish,
    pub aggregate: DishAggregate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_bounds() {
        assert!(Score::try_from(0).is_err());
        assert!(Score::try_from(6).is_err());
        assert_eq!(Score::try_from(1).unwrap().get(), 1);
        assert_eq!(Score::try_from(5).unwrap().get(), 5);
    }

    #[test]
    fn score_rejected_on_decode() {
        let json = r#"{"id":"d:ana","dish_id":"d","voter":"Ana","score":9,"cast_at":"2026-01-05T18:00:00Z"}"#;
        assert!(serde_json::from_str::<Vote>(json).is_err());
    }

    #[test]
    fn vote_key_folds_voter_name() {
        assert_eq!(Vote::key("d1", "  Ana   María "), "d1:ana maría");
        assert_eq!(Vote::key("d1", "ANA MARÍA"), Vote::key("d1", "ana maría"));
    }

    #[test]
    fn dish_missing_optional_fields() {
        let json = r#"{"id":"d","name":"Croqueta","created_at":"2026-01-05T18:00:00Z"}"#;
        let dish: Dish = serde_json::from_str(json).unwrap();
        assert_eq!(dish.photo_url, "");
        assert_eq!(dish.description, "");
    }
}
