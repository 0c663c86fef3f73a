//! `reqwest` implementation of the backend traits.

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{ApiError, CollectionApi, CommunityApi, ProfileApi};
use crate::models::{
    Collection, NewReview, Outfit, OutfitItem, Profile, Review, ReviewAnswer, ReviewPage,
};
use crate::reconcile::CollectionProjection;

/// Body of `POST /collections/{id}/outfits` and `PUT /outfits/{id}`.
#[derive(Debug, Serialize)]
struct OutfitBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    description: &'a str,
    #[serde(rename = "imageURL")]
    image_url: &'a str,
}

impl<'a> From<&'a Outfit> for OutfitBody<'a> {
    fn from(outfit: &'a Outfit) -> Self {
        Self {
            id: outfit.id,
            description: &outfit.description,
            image_url: &outfit.image_url,
        }
    }
}

/// Body of `POST /outfits/{id}/items` and `PUT /outfit-items/{id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutfitItemBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(rename = "imageURL")]
    image_url: &'a str,
    product_link: &'a str,
    store_name: &'a str,
}

impl<'a> From<&'a OutfitItem> for OutfitItemBody<'a> {
    fn from(item: &'a OutfitItem) -> Self {
        Self {
            id: item.id,
            image_url: &item.image_url,
            product_link: &item.product_link,
            store_name: &item.store_name,
        }
    }
}

#[derive(Debug, Serialize)]
struct AnswerBody<'a> {
    text: &'a str,
}

/// HTTP client for the Lookbook REST API.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpApi {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpApi {
    /// Creates an anonymous client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Attaches a bearer token to every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds an absolute URL for a given path.
    fn build_url(&self, path: &str) -> String {
        let base_url = if !self.base_url.starts_with("http://")
            && !self.base_url.starts_with("https://")
        {
            format!("http://{}", self.base_url)
        } else {
            self.base_url.clone()
        };

        format!("{}{}", base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.build_url(path);
        tracing::debug!("{} {}", method, url);

        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::check(builder.send().await?).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_empty(builder: RequestBuilder) -> Result<(), ApiError> {
        Self::check(builder.send().await?).await?;
        Ok(())
    }

    /// Turns a non-success response into `ApiError::Status`, preferring the
    /// server's `message` field when the body is JSON.
    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["message"].as_str().map(str::to_string))
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                } else {
                    body
                }
            });

        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

impl CollectionApi for HttpApi {
    async fn fetch_collection_detail(
        &self,
        collection_id: i64,
        actor_id: i64,
    ) -> Result<Collection, ApiError> {
        let builder = self
            .request(Method::GET, &format!("/collections/{}", collection_id))
            .query(&[("userId", actor_id)]);
        Self::send_json(builder).await
    }

    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError> {
        Self::send_json(self.request(Method::GET, "/collections")).await
    }

    async fn update_collection(
        &self,
        collection_id: i64,
        projection: &CollectionProjection,
    ) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, &format!("/collections/{}", collection_id))
            .json(projection);
        Self::send_empty(builder).await
    }

    async fn delete_collection(&self, collection_id: i64) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("/collections/{}", collection_id));
        Self::send_empty(builder).await
    }

    async fn create_outfit(&self, collection_id: i64, outfit: &Outfit) -> Result<Outfit, ApiError> {
        let builder = self
            .request(
                Method::POST,
                &format!("/collections/{}/outfits", collection_id),
            )
            .json(&OutfitBody::from(outfit));
        Self::send_json(builder).await
    }

    async fn update_outfit(&self, outfit: &Outfit) -> Result<(), ApiError> {
        let id = outfit.id.ok_or(ApiError::MissingId("update outfit"))?;
        let builder = self
            .request(Method::PUT, &format!("/outfits/{}", id))
            .json(&OutfitBody::from(outfit));
        Self::send_empty(builder).await
    }

    async fn delete_outfit(&self, outfit_id: i64) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("/outfits/{}", outfit_id));
        Self::send_empty(builder).await
    }

    async fn create_outfit_item(
        &self,
        outfit_id: i64,
        item: &OutfitItem,
    ) -> Result<OutfitItem, ApiError> {
        let builder = self
            .request(Method::POST, &format!("/outfits/{}/items", outfit_id))
            .json(&OutfitItemBody::from(item));
        Self::send_json(builder).await
    }

    async fn update_outfit_item(&self, item: &OutfitItem) -> Result<(), ApiError> {
        let id = item.id.ok_or(ApiError::MissingId("update outfit item"))?;
        let builder = self
            .request(Method::PUT, &format!("/outfit-items/{}", id))
            .json(&OutfitItemBody::from(item));
        Self::send_empty(builder).await
    }

    async fn delete_outfit_item(&self, item_id: i64) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("/outfit-items/{}", item_id));
        Self::send_empty(builder).await
    }
}

impl ProfileApi for HttpApi {
    async fn me(&self) -> Result<Profile, ApiError> {
        Self::send_json(self.request(Method::GET, "/me")).await
    }
}

impl CommunityApi for HttpApi {
    async fn list_reviews(
        &self,
        collection_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<ReviewPage, ApiError> {
        let builder = self
            .request(
                Method::GET,
                &format!("/collections/{}/reviews", collection_id),
            )
            .query(&[("page", page), ("limit", limit)]);
        Self::send_json(builder).await
    }

    async fn post_review(&self, collection_id: i64, review: &NewReview) -> Result<Review, ApiError> {
        let builder = self
            .request(
                Method::POST,
                &format!("/collections/{}/reviews", collection_id),
            )
            .json(review);
        Self::send_json(builder).await
    }

    async fn post_answer(&self, review_id: i64, text: &str) -> Result<ReviewAnswer, ApiError> {
        let builder = self
            .request(Method::POST, &format!("/reviews/{}/answer", review_id))
            .json(&AnswerBody { text });
        Self::send_json(builder).await
    }

    async fn follow(&self, creator_id: i64) -> Result<(), ApiError> {
        let builder = self.request(Method::PUT, &format!("/creators/{}/follow", creator_id));
        Self::send_empty(builder).await
    }

    async fn unfollow(&self, creator_id: i64) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("/creators/{}/follow", creator_id));
        Self::send_empty(builder).await
    }

    async fn subscribe(&self, creator_id: i64) -> Result<(), ApiError> {
        let builder = self.request(
            Method::PUT,
            &format!("/creators/{}/subscription", creator_id),
        );
        Self::send_empty(builder).await
    }

    async fn unsubscribe(&self, creator_id: i64) -> Result<(), ApiError> {
        let builder = self.request(
            Method::DELETE,
            &format!("/creators/{}/subscription", creator_id),
        );
        Self::send_empty(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let api = HttpApi::new("http://localhost:8080");
        assert_eq!(api.build_url("/me"), "http://localhost:8080/me");

        let api = HttpApi::new("https://api.lookbook.example/");
        assert_eq!(
            api.build_url("/collections/3"),
            "https://api.lookbook.example/collections/3"
        );

        let api = HttpApi::new("localhost:8080");
        assert_eq!(api.build_url("/me"), "http://localhost:8080/me");
    }

    #[test]
    fn test_outfit_body_shape() {
        let outfit = Outfit::new("Look", "https://img/1.png")
            .with_id(4)
            .with_items(vec![OutfitItem::new("u", "Shop", "https://shop/a")]);
        let json = serde_json::to_value(OutfitBody::from(&outfit)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 4, "description": "Look", "imageURL": "https://img/1.png"})
        );
    }

    #[test]
    fn test_item_body_shape() {
        let item = OutfitItem::new("u", "Shop", "https://shop/a").with_outfit_id(4);
        let json = serde_json::to_value(OutfitItemBody::from(&item)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"imageURL": "u", "productLink": "https://shop/a", "storeName": "Shop"})
        );
    }

    #[tokio::test]
    async fn test_update_without_id_fails_before_sending() {
        let api = HttpApi::new("http://127.0.0.1:9");
        let err = api
            .update_outfit(&Outfit::new("Look", "u"))
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::MissingId("update outfit"));
    }
}
