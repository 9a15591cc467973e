//! Documentation of the tapas contest voting platform.
//!
//! Participants pick their name, upload dishes with a photo and rate every
//! dish from 1 to 5 stars. Admins manage the roster and read the access log.
//!
//!
//!
//! # General Infrastructure
//! - Browser frontend talks to this server over JSON and server-sent events
//! - Redis holds every document: roster, accesses, dishes, votes, attendance
//! - Photos are pushed to ImgBB, only the hosted URL is stored
//! - One server instance owns the live aggregate channels
//!
//!
//!
//! # Votes
//!
//! **Goal**: one vote per participant per dish, even when the same participant
//! double-clicks or votes from two devices at once.
//!
//! - Voter identity is the participant name, folded to lowercase with collapsed whitespace
//! - Each vote lives under `{dish}:{voter}` and is written with an insert-if-absent
//! - The second write for the same key is rejected with 409
//! - Aggregates (mean, count) are recomputed from the full vote set after every write
//! - Live aggregates are served at `/dishes/{id}/aggregate/stream`
//!
//! See [`ledger`] for the details.
//!
//!
//!
//! # Notes
//!
//! ## Trust model
//! Admin screens are hidden by the frontend only. Every endpoint here is open to
//! whoever can reach the server, which matches the earlier setup where the
//! browser wrote straight to the database. Put the server behind something that
//! authenticates if that matters.
//!
//! ## Roster
//! The roster is a single document rewritten on every edit. Two admins editing
//! at once race, last write wins.
//!
//!
//!
//! # Setup
//!
//! Run with a local Redis.
//! ```sh
//! docker run -d -p 6379:6379 redis
//! RUST_LOG=info cargo run -p tapas-backend
//! ```
//!
//! Environment
//! - `RUST_PORT` (default 1111)
//! - `REDIS_URL` (default `redis://127.0.0.1:6379`)
//! - `IMGBB_URL` (default `https://api.imgbb.com/1/upload`)
//! - `IMGBB_API_KEY`, read from `/run/secrets/IMGBB_API_KEY` first
//! - `MAX_PHOTO_BYTES` (default 5 MiB)
//! - `BOOTSTRAP_ADMIN`, the admin allowed in before any roster is saved
//!
//! Seed the roster.
//! ```sh
//! cargo run -p roster -- add "Ana" --admin
//! cargo run -p roster -- list
//! ```
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header::CONTENT_TYPE},
    routing::{delete, get, post, put},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod access;
pub mod attendance;
pub mod config;
pub mod database;
pub mod error;
pub mod identity;
pub mod imgbb;
pub mod ledger;
pub mod models;
pub mod roster;
pub mod routes;
pub mod state;
pub mod store;
pub mod submission;
pub mod utils;

use routes::{
    accesses_handler, add_participant_handler, aggregate_handler, aggregate_stream_handler,
    attendance_handler, cancel_handler, confirm_handler, dishes_handler, login_handler,
    participants_handler, photo_handler, ranking_handler, remove_participant_handler,
    submit_handler, toggle_admin_handler, vote_handler, vote_status_handler,
};
use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    // multipart framing on top of the photo itself
    let body_limit = state.config.max_photo_bytes * 2;

    Router::new()
        .route("/participants", get(participants_handler).post(add_participant_handler))
        .route("/participants/{index}", delete(remove_participant_handler))
        .route("/participants/{index}/admin", post(toggle_admin_handler))
        .route("/login", post(login_handler))
        .route("/accesses", get(accesses_handler))
        .route("/dishes", get(dishes_handler).post(submit_handler))
        .route("/dishes/ranking", get(ranking_handler))
        .route("/dishes/{id}/photo", put(photo_handler))
        .route("/dishes/{id}/votes", post(vote_handler))
        .route("/dishes/{id}/votes/{voter}", get(vote_status_handler))
        .route("/dishes/{id}/aggregate", get(aggregate_handler))
        .route("/dishes/{id}/aggregate/stream", get(aggregate_stream_handler))
        .route("/attendance", get(attendance_handler))
        .route(
            "/attendance/{name}",
            put(confirm_handler).delete(cancel_handler),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await?;

    info!("Starting server...");
    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
