//! # Submissions
//!
//! A dish is written only after its photo upload has finished, or when no
//! photo was attached at all. A failed upload leaves the store untouched.
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    imgbb::ImageHost,
    models::Dish,
    store::Store,
    utils::normalize_name,
};

pub struct Photo {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

pub struct NewDish {
    pub name: String,
    pub description: String,
    pub photo: Option<Photo>,
}

pub fn validate_photo(photo: &Photo, max_bytes: usize) -> Result<(), AppError> {
    if photo.bytes.is_empty() {
        return Err(AppError::Validation("Photo is empty".into()));
    }

    if photo.bytes.len() > max_bytes {
        return Err(AppError::Validation(format!(
            "Photo is {} bytes, limit is {max_bytes}",
            photo.bytes.len()
        )));
    }

    if !photo.content_type.starts_with("image/") {
        return Err(AppError::Validation(format!(
            "Unsupported file type {:?}",
            photo.content_type
        )));
    }

    Ok(())
}

async fn upload(
    image_host: &dyn ImageHost,
    photo: &Photo,
    max_bytes: usize,
) -> Result<String, AppError> {
    validate_photo(photo, max_bytes)?;
    Ok(image_host.upload(&photo.bytes).await?)
}

pub async fn submit(
    store: &dyn Store,
    image_host: &dyn ImageHost,
    max_photo_bytes: usize,
    new_dish: NewDish,
) -> Result<Dish, AppError> {
    let name = normalize_name(&new_dish.name);
    if name.is_empty() {
        return Err(AppError::Validation("Dish name is required".into()));
    }

    let photo_url = match &new_dish.photo {
        Some(photo) => upload(image_host, photo, max_photo_bytes).await?,
        None => String::new(),
    };

    let dish = Dish {
        id: Uuid::new_v4().to_string(),
        name,
        description: new_dish.description.trim().to_string(),
        photo_url,
        created_at: Utc::now(),
    };
    store.insert_dish(&dish).await?;

    info!(id = %dish.id, name = %dish.name, has_photo = !dish.photo_url.is_empty(), "Dish submitted");

    Ok(dish)
}

/// Adds or replaces the photo of an existing dish.
pub async fn attach_photo(
    store: &dyn Store,
    image_host: &dyn ImageHost,
    max_photo_bytes: usize,
    dish_id: &str,
    photo: Photo,
) -> Result<Dish, AppError> {
    let mut dish = store
        .dish(dish_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Dish {dish_id}")))?;

    dish.photo_url = upload(image_host, &photo, max_photo_bytes).await?;

    if !store.update_dish(&dish).await? {
        return Err(AppError::NotFound(format!("Dish {dish_id}")));
    }
    info!(id = %dish.id, url = %dish.photo_url, "Photo attached");

    Ok(dish)
}

pub async fn list_dishes(store: &dyn Store) -> Result<Vec<Dish>, AppError> {
    Ok(store.dishes().await?)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{imgbb::UploadError, store::MemoryStore};

    /// Image host double: hands out numbered URLs or fails every upload.
    #[derive(Default)]
    pub(crate) struct FakeImageHost {
        pub fail: bool,
        pub uploads: AtomicUsize,
    }

    impl FakeImageHost {
        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ImageHost for FakeImageHost {
        async fn upload(&self, _image: &[u8]) -> Result<String, UploadError> {
            if self.fail {
                return Err(UploadError::Rejected("400: Invalid API v1 key.".into()));
            }
            let n = self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(format!("https://i.ibb.co/{n}/tapa.jpg"))
        }
    }

    fn jpeg() -> Photo {
        Photo {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
            content_type: "image/jpeg".into(),
        }
    }

    fn new_dish(name: &str, photo: Option<Photo>) -> NewDish {
        NewDish {
            name: name.into(),
            description: " jamón y bechamel ".into(),
            photo,
        }
    }

    #[tokio::test]
    async fn submit_with_photo() {
        let store = MemoryStore::new();
        let host = FakeImageHost::default();

        let dish = submit(&store, &host, 1024, new_dish("Croquetas", Some(jpeg())))
            .await
            .unwrap();
        assert_eq!(dish.photo_url, "https://i.ibb.co/0/tapa.jpg");
        assert_eq!(dish.description, "jamón y bechamel");
        assert_eq!(store.dishes().await.unwrap(), vec![dish]);
    }

    #[tokio::test]
    async fn submit_without_photo_skips_upload() {
        let store = MemoryStore::new();
        let host = FakeImageHost::failing();

        let dish = submit(&store, &host, 1024, new_dish("Gilda", None)).await.unwrap();
        assert_eq!(dish.photo_url, "");
        assert_eq!(host.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_upload_writes_nothing() {
        let store = MemoryStore::new();
        let host = FakeImageHost::failing();

        let err = submit(&store, &host, 1024, new_dish("Croquetas", Some(jpeg())))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
        assert!(store.dishes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_bad_input_before_upload() {
        let store = MemoryStore::new();
        let host = FakeImageHost::default();

        assert!(matches!(
            submit(&store, &host, 1024, new_dish("  ", None)).await,
            Err(AppError::Validation(_))
        ));

        let pdf = Photo {
            bytes: vec![1, 2, 3],
            content_type: "application/pdf".into(),
        };
        assert!(matches!(
            submit(&store, &host, 1024, new_dish("Gilda", Some(pdf))).await,
            Err(AppError::Validation(_))
        ));

        let big = Photo {
            bytes: vec![0; 2048],
            content_type: "image/png".into(),
        };
        assert!(matches!(
            submit(&store, &host, 1024, new_dish("Gilda", Some(big))).await,
            Err(AppError::Validation(_))
        ));

        assert_eq!(host.uploads.load(Ordering::SeqCst), 0);
        assert!(store.dishes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn attach_photo_later() {
        let store = MemoryStore::new();
        let host = FakeImageHost::default();
        let dish = submit(&store, &host, 1024, new_dish("Gilda", None)).await.unwrap();

        let updated = attach_photo(&store, &host, 1024, &dish.id, jpeg())
            .await
            .unwrap();
        assert_eq!(updated.photo_url, "https://i.ibb.co/0/tapa.jpg");
        assert_eq!(store.dish(&dish.id).await.unwrap(), Some(updated));

        assert!(matches!(
            attach_photo(&store, &host, 1024, "missing", jpeg()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn failed_attach_keeps_old_photo() {
        let store = MemoryStore::new();
        let dish = submit(&store, &FakeImageHost::default(), 1024, new_dish("Gilda", Some(jpeg())))
            .await
            .unwrap();

        let err = attach_photo(&store, &FakeImageHost::failing(), 1024, &dish.id, jpeg())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
        assert_eq!(store.dish(&dish.id).await.unwrap(), Some(dish));
    }
}
