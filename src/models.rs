//! Client-side views of the server's JSON documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub is_admin: bool,
}

/// What the browser keeps between reloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub participant_name: String,
    pub is_admin: bool,
    pub login_timestamp: DateTime<Utc>,
    pub session_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    pub dish_id: String,
    pub voter: String,
    pub score: u8,
    pub cast_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct VoteStatus {
    pub voted: bool,
    pub vote: Option<Vote>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DishAggregate {
    pub dish_id: String,
    pub mean_score: f64,
    pub vote_count: u32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RankedDish {
    pub dish: Dish,
    pub aggregate: DishAggregate,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AccessEntry {
    pub id: String,
    pub name: String,
    pub is_admin: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub user_agent: String,
    pub browser: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AccessLog {
    pub total: usize,
    pub unique_participants: usize,
    pub latest: Option<String>,
    pub records: Vec<AccessEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AttendanceRecord {
    pub participant_name: String,
    pub confirmed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AttendanceStats {
    pub total_confirmed: usize,
    pub is_caller_confirmed: bool,
    pub participation_percent: u32,
    pub confirmed: Vec<AttendanceRecord>,
}
