//! # Attendance
//!
//! RSVP records keyed by participant name. Confirming twice just refreshes the
//! timestamp; cancelling something that was never confirmed does nothing.
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::{
    error::AppError,
    models::AttendanceRecord,
    store::Store,
    utils::normalize_name,
};

#[derive(Clone, Debug, Serialize)]
pub struct AttendanceStats {
    pub total_confirmed: usize,
    pub is_caller_confirmed: bool,
    /// Confirmed participants over roster size, capped at 100.
    pub participation_percent: u32,
    pub confirmed: Vec<AttendanceRecord>,
}

pub async fn confirm(store: &dyn Store, name: &str) -> Result<AttendanceRecord, AppError> {
    let name = normalize_name(name);
    if name.is_empty() {
        return Err(AppError::Validation("Participant name is required".into()));
    }

    let record = AttendanceRecord {
        participant_name: name,
        confirmed_at: Utc::now(),
    };
    store.put_attendance(&record).await?;
    info!(name = %record.participant_name, "Attendance confirmed");

    Ok(record)
}

pub async fn cancel(store: &dyn Store, name: &str) -> Result<(), AppError> {
    let name = normalize_name(name);
    if store.delete_attendance(&name).await? {
        info!(name = %name, "Attendance cancelled");
    }

    Ok(())
}

pub async fn stats(
    store: &dyn Store,
    roster_size: usize,
    caller: Option<&str>,
) -> Result<AttendanceStats, AppError> {
    let mut confirmed = store.attendance().await?;
    confirmed.sort_by(|a, b| b.confirmed_at.cmp(&a.confirmed_at));

    let caller = caller.map(normalize_name);
    let is_caller_confirmed = caller
        .as_deref()
        .is_some_and(|caller| confirmed.iter().any(|r| r.participant_name == caller));

    let participation_percent = if roster_size == 0 {
        0
    } else {
        ((confirmed.len() * 100 + roster_size / 2) / roster_size).min(100) as u32
    };

    Ok(AttendanceStats {
        total_confirmed: confirmed.len(),
        is_caller_confirmed,
        participation_percent,
        confirmed,
    })
}
