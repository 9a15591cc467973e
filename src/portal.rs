//! Login, session restore and gated navigation for one browser tab.

use chrono::Utc;
use tracing::{info, warn};

use crate::{
    client::Gateway,
    error::ClientError,
    models::Session,
    notice::{Notice, Notices},
    session::SessionStorage,
    shell::{HistoryCommand, Section, Shell, Transition},
};

pub struct Portal<G, S> {
    gateway: G,
    storage: S,
    session: Option<Session>,
    shell: Shell,
    notices: Notices,
}

impl<G: Gateway, S: SessionStorage> Portal<G, S> {
    /// Picks up a stored session without calling the server. Storage that
    /// cannot be read starts the tab logged out.
    pub fn restore(gateway: G, storage: S) -> Self {
        let session = storage.load().unwrap_or_else(|e| {
            warn!("Failed to read stored session: {e}");
            None
        });

        Self {
            gateway,
            storage,
            session,
            shell: Shell::new(),
            notices: Notices::default(),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(|session| session.is_admin)
    }

    pub fn section(&self) -> Section {
        self.shell.current()
    }

    pub async fn login(&mut self, name: &str, user_agent: &str) -> Result<&Session, ClientError> {
        let session = match self.gateway.login(name, user_agent).await {
            Ok(session) => session,
            Err(e) => {
                self.notices.push(Notice::from_error(&e, Utc::now()));
                return Err(e);
            }
        };

        // a session that only lives in memory is still usable for this tab
        if let Err(e) = self.storage.save(&session) {
            warn!("Failed to persist session: {e}");
        }

        info!(name = %session.participant_name, admin = session.is_admin, "logged in");
        self.shell.reset();
        Ok(&*self.session.insert(session))
    }

    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.session = None;
        self.shell.reset();
        self.storage.clear()
    }

    pub fn navigate(&mut self, target: Section) -> (Transition, Option<HistoryCommand>) {
        let is_admin = self.is_admin();
        self.shell.navigate(target, is_admin)
    }

    pub fn on_pop(&mut self, fragment: Option<&str>) -> Section {
        let is_admin = self.is_admin();
        self.shell.on_pop(fragment, is_admin)
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn notices(&mut self) -> &[Notice] {
        self.notices.active(Utc::now())
    }
}
