use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use server::{
    build_router,
    config::Config,
    imgbb::{ImageHost, UploadError},
    models::Dish,
    state::AppState,
    store::{MemoryStore, Store},
};
use tapas::client::ApiClient;
use tokio::net::TcpListener;

struct NoUploads;

#[async_trait]
impl ImageHost for NoUploads {
    async fn upload(&self, _image: &[u8]) -> Result<String, UploadError> {
        Err(UploadError::Disabled)
    }
}

async fn spawn_server(dish_id: &str) -> ApiClient {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_dish(&Dish {
            id: dish_id.to_string(),
            name: "Croquetas".into(),
            description: String::new(),
            photo_url: String::new(),
            created_at: Utc::now(),
        })
        .await
        .expect("insert dish");

    let state = AppState::with_parts(Config::default(), store, Arc::new(NoUploads));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, build_router(state))
            .await
            .expect("serve");
    });

    ApiClient::new(&format!("http://{addr}")).expect("client")
}

#[tokio::test]
async fn stream_follows_votes() {
    let api = spawn_server("croquetas").await;
    api.cast_vote("croquetas", "Ana", 3).await.unwrap();

    let mut live = api.watch_aggregate("croquetas").await.unwrap();
    let first = live.next().await.unwrap().unwrap();
    assert_eq!(first.dish_id, "croquetas");
    assert_eq!(first.vote_count, 1);

    api.cast_vote("croquetas", "Luis", 5).await.unwrap();
    let next = live.next().await.unwrap().unwrap();
    assert_eq!(next.vote_count, 2);
    assert_eq!(next.mean_score, 4.0);
}

#[tokio::test]
async fn unknown_dish_is_not_found() {
    let api = spawn_server("croquetas").await;
    let err = api.watch_aggregate("missing").await.err().unwrap();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn separate_streams_per_dish_viewer() {
    let api = spawn_server("croquetas").await;

    let mut first = api.watch_aggregate("croquetas").await.unwrap();
    let mut second = api.watch_aggregate("croquetas").await.unwrap();
    assert_eq!(first.next().await.unwrap().unwrap().vote_count, 0);
    assert_eq!(second.next().await.unwrap().unwrap().vote_count, 0);

    drop(first);
    api.cast_vote("croquetas", "Marta", 4).await.unwrap();
    assert_eq!(second.next().await.unwrap().unwrap().vote_count, 1);
}
