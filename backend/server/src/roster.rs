//! # Roster
//!
//! The participant list is one document. Every edit reads it, changes it in
//! memory and writes the whole list back, so two admins editing at the same
//! time race and the last write wins.
//!
//! Until a non-empty roster is stored, the roster is the bootstrap admin alone.
//! Edits start from that same list, so indices always match what
//! [`list_participants`] returned and the first write keeps the bootstrap admin.
use tracing::{debug, info};

use crate::{
    error::AppError,
    models::Participant,
    store::Store,
    utils::{normalize_name, same_name},
};

pub async fn list_participants(
    store: &dyn Store,
    bootstrap_admin: &str,
) -> Result<Vec<Participant>, AppError> {
    match store.roster().await? {
        Some(roster) if !roster.is_empty() => Ok(roster),
        _ => {
            debug!(bootstrap_admin, "No roster stored, using bootstrap admin");
            Ok(vec![Participant {
                name: bootstrap_admin.to_string(),
                is_admin: true,
            }])
        }
    }
}

/// Index of `name` in the roster, compared case-insensitively.
pub fn position(roster: &[Participant], name: &str) -> Option<usize> {
    roster.iter().position(|p| same_name(&p.name, name))
}

pub async fn add_participant(
    store: &dyn Store,
    bootstrap_admin: &str,
    name: &str,
    is_admin: bool,
) -> Result<Vec<Participant>, AppError> {
    let name = normalize_name(name);
    if name.is_empty() {
        return Err(AppError::Validation("Participant name is required".into()));
    }

    let mut roster = list_participants(store, bootstrap_admin).await?;
    if position(&roster, &name).is_some() {
        return Err(AppError::DuplicateName(name));
    }

    info!(name = %name, is_admin, "Adding participant");
    roster.push(Participant { name, is_admin });
    store.put_roster(&roster).await?;

    Ok(roster)
}

pub async fn remove_participant(
    store: &dyn Store,
    bootstrap_admin: &str,
    index: usize,
) -> Result<Vec<Participant>, AppError> {
    let mut roster = list_participants(store, bootstrap_admin).await?;
    if index >= roster.len() {
        return Err(AppError::NotFound(format!("Participant #{index}")));
    }

    let removed = roster.remove(index);
    info!(name = %removed.name, "Removing participant");
    store.put_roster(&roster).await?;

    Ok(roster)
}

pub async fn toggle_admin(
    store: &dyn Store,
    bootstrap_admin: &str,
    index: usize,
) -> Result<Vec<Participant>, AppError> {
    let mut roster = list_participants(store, bootstrap_admin).await?;
    let participant = roster
        .get_mut(index)
        .ok_or_else(|| AppError::NotFound(format!("Participant #{index}")))?;

    participant.is_admin = !participant.is_admin;
    info!(
        name = %participant.name,
        is_admin = participant.is_admin,
        "Toggled admin"
    );
    store.put_roster(&roster).await?;

    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const ADMIN: &str = "Admin";

    fn names(roster: &[Participant]) -> Vec<&str> {
        roster.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test]
    async fn duplicate_names_are_case_insensitive() {
        let store = MemoryStore::new();
        add_participant(&store, ADMIN, "Ana", false).await.unwrap();

        let err = add_participant(&store, ADMIN, "ana", true).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateName(_)));
        assert!(matches!(
            add_participant(&store, ADMIN, "ADMIN", false).await,
            Err(AppError::DuplicateName(_))
        ));
        assert_eq!(names(&list_participants(&store, ADMIN).await.unwrap()), ["Admin", "Ana"]);
    }

    #[tokio::test]
    async fn names_are_normalized_and_required() {
        let store = MemoryStore::new();
        let roster = add_participant(&store, ADMIN, "  Luis   Pérez ", true).await.unwrap();
        assert_eq!(roster[1].name, "Luis Pérez");

        assert!(matches!(
            add_participant(&store, ADMIN, "   ", false).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn edits_on_empty_store_match_listing() {
        let store = MemoryStore::new();
        let listed = list_participants(&store, ADMIN).await.unwrap();
        assert_eq!(names(&listed), ["Admin"]);
        assert!(listed[0].is_admin);

        let roster = toggle_admin(&store, ADMIN, 0).await.unwrap();
        assert_eq!(names(&roster), ["Admin"]);
        assert!(!roster[0].is_admin);
        assert_eq!(store.roster().await.unwrap(), Some(roster));

        let store = MemoryStore::new();
        let roster = add_participant(&store, ADMIN, "Ana", false).await.unwrap();
        assert_eq!(names(&roster), ["Admin", "Ana"]);
        assert!(roster[0].is_admin);
    }

    #[tokio::test]
    async fn removing_everyone_brings_back_bootstrap_admin() {
        let store = MemoryStore::new();
        let roster = remove_participant(&store, ADMIN, 0).await.unwrap();
        assert!(roster.is_empty());

        let listed = list_participants(&store, ADMIN).await.unwrap();
        assert_eq!(names(&listed), ["Admin"]);
        assert!(listed[0].is_admin);
    }

    #[tokio::test]
    async fn remove_and_toggle_by_index() {
        let store = MemoryStore::new();
        for name in ["Ana", "Luis", "Marta"] {
            add_participant(&store, ADMIN, name, false).await.unwrap();
        }

        let roster = toggle_admin(&store, ADMIN, 3).await.unwrap();
        assert!(roster[3].is_admin);
        let roster = toggle_admin(&store, ADMIN, 3).await.unwrap();
        assert!(!roster[3].is_admin);

        let roster = remove_participant(&store, ADMIN, 1).await.unwrap();
        assert_eq!(names(&roster), ["Admin", "Luis", "Marta"]);
        assert_eq!(position(&roster, "MARTA"), Some(2));

        assert!(matches!(
            remove_participant(&store, ADMIN, 5).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            toggle_admin(&store, ADMIN, 3).await,
            Err(AppError::NotFound(_))
        ));
    }
}
