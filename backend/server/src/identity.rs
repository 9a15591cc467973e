//! # Identity
//!
//! Login is name selection. The participant picks their name from the roster,
//! the server writes an access record and hands back a session. The client
//! keeps the session in local storage and restores it on reload without
//! coming back here, so a participant removed from the roster keeps their
//! session until they log out.
use tracing::{info, warn};

use crate::{
    access::record_access,
    config::Config,
    error::AppError,
    models::{AccessRecord, Participant, Session},
    roster::list_participants,
    store::Store,
};

/// The stored roster, or the configured bootstrap admin alone while the stored
/// roster is missing or empty.
pub async fn load_roster(store: &dyn Store, config: &Config) -> Result<Vec<Participant>, AppError> {
    list_participants(store, &config.bootstrap_admin).await
}

/// Exact, case-sensitive lookup.
pub fn resolve_participant<'a>(
    roster: &'a [Participant],
    name: &str,
) -> Result<&'a Participant, AppError> {
    roster
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| AppError::NotFound(format!("Participant {name}")))
}

pub async fn login(
    store: &dyn Store,
    config: &Config,
    name: &str,
    user_agent: &str,
) -> Result<Session, AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Select your name to log in".into()));
    }

    let roster = load_roster(store, config).await?;
    let participant = resolve_participant(&roster, name)?;

    let record = AccessRecord::new(participant, user_agent);
    if let Err(e) = record_access(store, &record).await {
        warn!(name, error = %e, "Failed to record access, continuing login");
    }

    info!(name, is_admin = participant.is_admin, "Participant logged in");

    Ok(Session {
        participant_name: participant.name.clone(),
        is_admin: participant.is_admin,
        login_timestamp: record.timestamp,
        session_id: record.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn roster() -> Vec<Participant> {
        vec![
            Participant {
                name: "Ana".into(),
                is_admin: false,
            },
            Participant {
                name: "Luis".into(),
                is_admin: true,
            },
        ]
    }

    #[tokio::test]
    async fn login_writes_access_record() {
        let store = MemoryStore::new();
        store.put_roster(&roster()).await.unwrap();

        let session = login(&store, &Config::default(), "Luis", "Firefox")
            .await
            .unwrap();
        assert_eq!(session.participant_name, "Luis");
        assert!(session.is_admin);

        let accesses = store.accesses().await.unwrap();
        assert_eq!(accesses.len(), 1);
        assert_eq!(accesses[0].id, session.session_id);
        assert_eq!(accesses[0].user_agent, "Firefox");
    }

    #[tokio::test]
    async fn login_rejects_blank_and_unknown() {
        let store = MemoryStore::new();
        store.put_roster(&roster()).await.unwrap();
        let config = Config::default();

        assert!(matches!(
            login(&store, &config, "  ", "").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            login(&store, &config, "ana", "").await,
            Err(AppError::NotFound(_))
        ));
        assert!(store.accesses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_roster_falls_back_to_bootstrap_admin() {
        let store = MemoryStore::new();
        let config = Config {
            bootstrap_admin: "Alba".into(),
            ..Config::default()
        };

        let roster = load_roster(&store, &config).await.unwrap();
        assert_eq!(roster.len(), 1);
        assert!(roster[0].is_admin);

        let session = login(&store, &config, "Alba", "").await.unwrap();
        assert!(session.is_admin);

        store.put_roster(&[]).await.unwrap();
        assert!(login(&store, &config, "Alba", "").await.is_ok());
    }
}
