use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode, header::USER_AGENT},
    response::sse::{Event, KeepAlive, Sse},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_stream::{Stream, StreamExt, wrappers::WatchStream};

use crate::{
    access::{AccessLog, list_accesses},
    attendance::{self, AttendanceStats},
    error::AppError,
    identity::{load_roster, login},
    models::{AttendanceRecord, Dish, DishAggregate, Participant, RankedDish, Session, Vote},
    roster,
    state::AppState,
    submission::{NewDish, Photo, attach_photo, list_dishes, submit},
};

type AppResult<T> = Result<T, AppError>;

#[derive(Deserialize)]
pub struct LoginRequest {
    name: String,
    user_agent: Option<String>,
}

#[derive(Deserialize)]
pub struct NewParticipant {
    name: String,
    #[serde(default)]
    is_admin: bool,
}

#[derive(Deserialize)]
pub struct VoteRequest {
    voter: String,
    score: Value,
}

/// Whole numbers that fit a `u8`. Range is checked by the ledger.
fn whole_score(score: &Value) -> AppResult<u8> {
    score
        .as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .or_else(|| score.as_i64().map(|_| 0))
        .ok_or_else(|| AppError::Validation(format!("score must be a whole number, got {score}")))
}

#[derive(Serialize)]
pub struct VoteStatus {
    voted: bool,
    vote: Option<Vote>,
}

#[derive(Deserialize)]
pub struct AccessQuery {
    prefix: Option<String>,
}

#[derive(Deserialize)]
pub struct AttendanceQuery {
    name: Option<String>,
}

#[derive(Default)]
struct DishForm {
    name: String,
    description: String,
    photo: Option<Photo>,
}

/// Reads `name`, `description` and `photo` parts. An empty file part counts as
/// no photo, which is what browsers send when nothing was picked.
async fn read_dish_form(mut multipart: Multipart) -> AppResult<DishForm> {
    let mut form = DishForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::MalformedPayload)?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => form.name = field.text().await.map_err(|_| AppError::MalformedPayload)?,
            "description" => {
                form.description = field.text().await.map_err(|_| AppError::MalformedPayload)?
            }
            "photo" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|_| AppError::MalformedPayload)?;
                if !bytes.is_empty() {
                    form.photo = Some(Photo {
                        bytes: bytes.to_vec(),
                        content_type,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

pub async fn participants_handler(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<Participant>>> {
    Ok(Json(load_roster(state.store.as_ref(), &state.config).await?))
}

pub async fn add_participant_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewParticipant>,
) -> AppResult<(StatusCode, Json<Vec<Participant>>)> {
    let roster = roster::add_participant(
        state.store.as_ref(),
        &state.config.bootstrap_admin,
        &payload.name,
        payload.is_admin,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(roster)))
}

pub async fn remove_participant_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> AppResult<Json<Vec<Participant>>> {
    let roster = roster::remove_participant(
        state.store.as_ref(),
        &state.config.bootstrap_admin,
        index,
    )
    .await?;

    Ok(Json(roster))
}

pub async fn toggle_admin_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> AppResult<Json<Vec<Participant>>> {
    let roster =
        roster::toggle_admin(state.store.as_ref(), &state.config.bootstrap_admin, index).await?;

    Ok(Json(roster))
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<Session>> {
    let user_agent = payload.user_agent.unwrap_or_else(|| {
        headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    });

    let session = login(
        state.store.as_ref(),
        &state.config,
        &payload.name,
        &user_agent,
    )
    .await?;

    Ok(Json(session))
}

pub async fn accesses_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccessQuery>,
) -> AppResult<Json<AccessLog>> {
    Ok(Json(
        list_accesses(state.store.as_ref(), query.prefix.as_deref()).await?,
    ))
}

pub async fn dishes_handler(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Dish>>> {
    Ok(Json(list_dishes(state.store.as_ref()).await?))
}

pub async fn submit_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<Dish>)> {
    let form = read_dish_form(multipart).await?;

    let dish = submit(
        state.store.as_ref(),
        state.image_host.as_ref(),
        state.config.max_photo_bytes,
        NewDish {
            name: form.name,
            description: form.description,
            photo: form.photo,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(dish)))
}

pub async fn photo_handler(
    State(state): State<Arc<AppState>>,
    Path(dish_id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<Dish>> {
    let photo = read_dish_form(multipart)
        .await?
        .photo
        .ok_or_else(|| AppError::Validation("Photo is required".into()))?;

    let dish = attach_photo(
        state.store.as_ref(),
        state.image_host.as_ref(),
        state.config.max_photo_bytes,
        &dish_id,
        photo,
    )
    .await?;

    Ok(Json(dish))
}

pub async fn ranking_handler(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<RankedDish>>> {
    Ok(Json(state.ledger.ranking().await?))
}

pub async fn vote_status_handler(
    State(state): State<Arc<AppState>>,
    Path((dish_id, voter)): Path<(String, String)>,
) -> AppResult<Json<VoteStatus>> {
    let vote = state.ledger.has_voted(&dish_id, &voter).await?;

    Ok(Json(VoteStatus {
        voted: vote.is_some(),
        vote,
    }))
}

pub async fn vote_handler(
    State(state): State<Arc<AppState>>,
    Path(dish_id): Path<String>,
    Json(payload): Json<VoteRequest>,
) -> AppResult<(StatusCode, Json<Vote>)> {
    let score = whole_score(&payload.score)?;
    let vote = state
        .ledger
        .cast_vote(&dish_id, &payload.voter, score)
        .await?;

    Ok((StatusCode::CREATED, Json(vote)))
}

pub async fn aggregate_handler(
    State(state): State<Arc<AppState>>,
    Path(dish_id): Path<String>,
) -> AppResult<Json<DishAggregate>> {
    Ok(Json(state.ledger.aggregate(&dish_id).await?))
}

/// Server-sent events, one `aggregate` event per snapshot. The watch channel
/// is released when the client disconnects.
pub async fn aggregate_stream_handler(
    State(state): State<Arc<AppState>>,
    Path(dish_id): Path<String>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let receiver = state.ledger.watch_aggregate(&dish_id).await?;

    let stream = WatchStream::new(receiver)
        .map(|aggregate| Event::default().event("aggregate").json_data(aggregate));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

pub async fn attendance_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AttendanceQuery>,
) -> AppResult<Json<AttendanceStats>> {
    let roster_size = load_roster(state.store.as_ref(), &state.config).await?.len();
    let stats = attendance::stats(state.store.as_ref(), roster_size, query.name.as_deref()).await?;

    Ok(Json(stats))
}

pub async fn confirm_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<AttendanceRecord>> {
    Ok(Json(attendance::confirm(state.store.as_ref(), &name).await?))
}

pub async fn cancel_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<StatusCode> {
    attendance::cancel(state.store.as_ref(), &name).await?;

    Ok(StatusCode::NO_CONTENT)
}
