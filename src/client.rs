//! HTTP client for the tapas server.

use async_trait::async_trait;
use reqwest::{
    Client, Response, Url,
    header::ACCEPT,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::{
    error::ClientError,
    live::AggregateStream,
    models::{
        AccessLog, AttendanceRecord, AttendanceStats, Dish, DishAggregate, Participant,
        RankedDish, Session, Vote, VoteStatus,
    },
};

/// The one call the portal needs from the network.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn login(&self, name: &str, user_agent: &str) -> Result<Session, ClientError>;
}

pub struct Photo {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn participants(&self) -> Result<Vec<Participant>, ClientError> {
        let res = self.client.get(self.endpoint(&["participants"])?).send().await?;
        read_json(res).await
    }

    pub async fn add_participant(
        &self,
        name: &str,
        is_admin: bool,
    ) -> Result<Vec<Participant>, ClientError> {
        let res = self
            .client
            .post(self.endpoint(&["participants"])?)
            .json(&json!({ "name": name, "is_admin": is_admin }))
            .send()
            .await?;
        read_json(res).await
    }

    pub async fn remove_participant(&self, index: usize) -> Result<Vec<Participant>, ClientError> {
        let res = self
            .client
            .delete(self.endpoint(&["participants", &index.to_string()])?)
            .send()
            .await?;
        read_json(res).await
    }

    pub async fn toggle_admin(&self, index: usize) -> Result<Vec<Participant>, ClientError> {
        let res = self
            .client
            .post(self.endpoint(&["participants", &index.to_string(), "admin"])?)
            .send()
            .await?;
        read_json(res).await
    }

    pub async fn accesses(&self, prefix: Option<&str>) -> Result<AccessLog, ClientError> {
        let mut request = self.client.get(self.endpoint(&["accesses"])?);
        if let Some(prefix) = prefix {
            request = request.query(&[("prefix", prefix)]);
        }
        read_json(request.send().await?).await
    }

    pub async fn dishes(&self) -> Result<Vec<Dish>, ClientError> {
        let res = self.client.get(self.endpoint(&["dishes"])?).send().await?;
        read_json(res).await
    }

    pub async fn submit_dish(
        &self,
        name: &str,
        description: &str,
        photo: Option<Photo>,
    ) -> Result<Dish, ClientError> {
        let mut form = Form::new()
            .text("name", name.to_string())
            .text("description", description.to_string());
        if let Some(photo) = photo {
            form = form.part("photo", photo_part(photo)?);
        }

        let res = self
            .client
            .post(self.endpoint(&["dishes"])?)
            .multipart(form)
            .send()
            .await?;
        read_json(res).await
    }

    pub async fn attach_photo(&self, dish_id: &str, photo: Photo) -> Result<Dish, ClientError> {
        let form = Form::new().part("photo", photo_part(photo)?);
        let res = self
            .client
            .put(self.endpoint(&["dishes", dish_id, "photo"])?)
            .multipart(form)
            .send()
            .await?;
        read_json(res).await
    }

    pub async fn ranking(&self) -> Result<Vec<RankedDish>, ClientError> {
        let res = self
            .client
            .get(self.endpoint(&["dishes", "ranking"])?)
            .send()
            .await?;
        read_json(res).await
    }

    pub async fn vote_status(&self, dish_id: &str, voter: &str) -> Result<VoteStatus, ClientError> {
        let res = self
            .client
            .get(self.endpoint(&["dishes", dish_id, "votes", voter])?)
            .send()
            .await?;
        read_json(res).await
    }

    /// A second vote for the same dish comes back as a 409, see
    /// [`ClientError::is_conflict`].
    pub async fn cast_vote(&self, dish_id: &str, voter: &str, score: u8) -> Result<Vote, ClientError> {
        let res = self
            .client
            .post(self.endpoint(&["dishes", dish_id, "votes"])?)
            .json(&json!({ "voter": voter, "score": score }))
            .send()
            .await?;
        read_json(res).await
    }

    pub async fn aggregate(&self, dish_id: &str) -> Result<DishAggregate, ClientError> {
        let res = self
            .client
            .get(self.endpoint(&["dishes", dish_id, "aggregate"])?)
            .send()
            .await?;
        read_json(res).await
    }

    /// Opens the live aggregate for a dish. The first item is the current
    /// snapshot.
    pub async fn watch_aggregate(&self, dish_id: &str) -> Result<AggregateStream, ClientError> {
        let res = self
            .client
            .get(self.endpoint(&["dishes", dish_id, "aggregate", "stream"])?)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        Ok(AggregateStream::new(check_status(res).await?))
    }

    pub async fn attendance(&self, caller: Option<&str>) -> Result<AttendanceStats, ClientError> {
        let mut request = self.client.get(self.endpoint(&["attendance"])?);
        if let Some(name) = caller {
            request = request.query(&[("name", name)]);
        }
        read_json(request.send().await?).await
    }

    pub async fn confirm_attendance(&self, name: &str) -> Result<AttendanceRecord, ClientError> {
        let res = self
            .client
            .put(self.endpoint(&["attendance", name])?)
            .send()
            .await?;
        read_json(res).await
    }

    pub async fn cancel_attendance(&self, name: &str) -> Result<(), ClientError> {
        let res = self
            .client
            .delete(self.endpoint(&["attendance", name])?)
            .send()
            .await?;
        check_status(res).await.map(|_| ())
    }
}

#[async_trait]
impl Gateway for ApiClient {
    async fn login(&self, name: &str, user_agent: &str) -> Result<Session, ClientError> {
        debug!(name = %name, "logging in");
        let res = self
            .client
            .post(self.endpoint(&["login"])?)
            .json(&json!({ "name": name, "user_agent": user_agent }))
            .send()
            .await?;
        read_json(res).await
    }
}

fn photo_part(photo: Photo) -> Result<Part, ClientError> {
    Ok(Part::bytes(photo.bytes)
        .file_name(photo.file_name)
        .mime_str(&photo.content_type)?)
}

async fn check_status(res: Response) -> Result<Response, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    Err(ClientError::Server {
        status: status.as_u16(),
        body,
    })
}

async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    let text = check_status(res).await?.text().await?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_encodes_segments() {
        let client = ApiClient::new("http://localhost:1111").unwrap();
        let url = client.endpoint(&["attendance", "Ana García"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:1111/attendance/Ana%20Garc%C3%ADa");
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let client = ApiClient::new("https://tapas.example.org/api/").unwrap();
        let url = client.endpoint(&["dishes", "ranking"]).unwrap();
        assert_eq!(url.as_str(), "https://tapas.example.org/api/dishes/ranking");
    }

    #[test]
    fn rejects_bad_base() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            ApiClient::new("mailto:ana@example.org"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn conflict_detection() {
        let err = ClientError::Server {
            status: 409,
            body: "already voted".into(),
        };
        assert!(err.is_conflict());
        assert_eq!(err.status(), Some(409));
    }
}
