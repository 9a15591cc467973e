//! # Tapas client
//!
//! Everything the browser side does that is not drawing: keeping the session
//! across reloads, deciding which section can be shown, rendering star
//! ratings and talking to the server.
//!
//! ## Sections
//! - Home, Submit, Browse, Rank and Attendance are open to every participant
//! - AccessLog and Roster need an admin session
//! - `#rank` and `#access-log` in the URL open those sections directly
//!
//! ## Sessions
//! A successful login is written to [`session::SessionStorage`]. A reload reads
//! it back and never calls the server, so a participant removed from the
//! roster stays logged in until they log out.
//!
//! ## Live aggregates
//! [`client::ApiClient::watch_aggregate`] follows a dish's mean and vote count
//! as votes land. Drop the stream to stop.
//!
//! ## Example
//! ```no_run
//! # async fn run() -> Result<(), tapas::error::ClientError> {
//! use tapas::{client::ApiClient, portal::Portal, session::FileStorage, shell::Section};
//!
//! let api = ApiClient::new("http://localhost:1111")?;
//! let mut portal = Portal::restore(api, FileStorage::new("session.json"));
//! if portal.session().is_none() {
//!     portal.login("Ana", "cli").await?;
//! }
//! portal.navigate(Section::Rank);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod live;
pub mod models;
pub mod notice;
pub mod portal;
pub mod session;
pub mod shell;
pub mod stars;
