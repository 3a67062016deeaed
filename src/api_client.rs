//! # Backend API Client
//!
//! Thin async wrapper over the backend HTTP API. Every method performs
//! exactly one request; privileged methods take the caller's access token
//! explicitly and send it as a bearer `Authorization` header. The client
//! itself holds no credential.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::api_errors::ApiError;
use crate::models::{AuthTokens, CartItem, PlantingRecord, Product, Profile, RegistrationForm};

pub const DEFAULT_PAYMENT_METHOD: &str = "payme";

/// Stateless client bound to one backend base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange username and password for access tokens
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthTokens, ApiError> {
        let result: Result<AuthTokens, ApiError> = async {
            let response = self
                .client
                .post(self.url("/api/login/"))
                .form(&[("username", username), ("password", password)])
                .send()
                .await?;
            decode(ensure_success(response).await?).await
        }
        .await;
        log_outcome("login", result)
    }

    /// Create an account; validation failures come back as `ApiError::Rejected`
    pub async fn register(&self, form: &RegistrationForm) -> Result<AuthTokens, ApiError> {
        let result: Result<AuthTokens, ApiError> = async {
            let response = self
                .client
                .post(self.url("/register/"))
                .form(&form.form_fields())
                .send()
                .await?;

            let status = response.status();
            if status != StatusCode::BAD_REQUEST && !status.is_success() {
                return Err(status_error(response).await);
            }

            let body = response.text().await?;
            let payload: Value = serde_json::from_str(&body)
                .map_err(|e| ApiError::Decode(e.to_string()))?;
            if status.is_success() {
                if let Ok(tokens) = serde_json::from_value::<AuthTokens>(payload.clone()) {
                    return Ok(tokens);
                }
            }
            Err(ApiError::Rejected(rejection_detail(&payload)))
        }
        .await;
        log_outcome("register", result)
    }

    /// Public product catalog
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        let result: Result<Vec<Product>, ApiError> = async {
            let response = self.client.get(self.url("/api/products/")).send().await?;
            decode(ensure_success(response).await?).await
        }
        .await;
        log_outcome("products", result)
    }

    pub async fn add_to_cart(
        &self,
        token: &str,
        product_id: i64,
        count: u32,
    ) -> Result<Value, ApiError> {
        let result = self
            .post_json(
                token,
                "/api/addToCart/",
                json!({ "product_id": product_id, "count": count }),
            )
            .await;
        log_outcome("add_to_cart", result)
    }

    /// Pending buckets of the authenticated user
    pub async fn cart_items(&self, token: &str) -> Result<Vec<CartItem>, ApiError> {
        let result: Result<Vec<CartItem>, ApiError> = async {
            let response = self
                .client
                .get(self.url("/api/get/my/trees/"))
                .bearer_auth(token)
                .send()
                .await?;
            decode(ensure_success(response).await?).await
        }
        .await;
        log_outcome("cart_items", result)
    }

    /// Change a cart line's quantity by `delta` (may be negative)
    pub async fn update_cart_quantity(
        &self,
        token: &str,
        bucket_id: i64,
        delta: i32,
    ) -> Result<(), ApiError> {
        let result = self
            .post_json(
                token,
                "/api/update/cart/",
                json!({ "bucket_id": bucket_id, "delta": delta }),
            )
            .await
            .map(|_| ());
        log_outcome("update_cart_quantity", result)
    }

    pub async fn remove_from_cart(&self, token: &str, bucket_id: i64) -> Result<(), ApiError> {
        let result = self
            .post_json(token, "/api/remove/cart/", json!({ "bucket_id": bucket_id }))
            .await
            .map(|_| ());
        log_outcome("remove_from_cart", result)
    }

    pub async fn checkout(&self, token: &str, payment_method: &str) -> Result<Value, ApiError> {
        let result = self
            .post_json(
                token,
                "/api/checkout/",
                json!({ "payment_method": payment_method }),
            )
            .await;
        log_outcome("checkout", result)
    }

    pub async fn profile(&self, token: &str) -> Result<Profile, ApiError> {
        let result: Result<Profile, ApiError> = async {
            let response = self
                .client
                .get(self.url("/api/get/me/"))
                .bearer_auth(token)
                .send()
                .await?;
            decode(ensure_success(response).await?).await
        }
        .await;
        log_outcome("profile", result)
    }

    /// Submit a planting report as multipart form data
    pub async fn plant_tree(
        &self,
        token: &str,
        record: PlantingRecord,
        planted_at: &str,
    ) -> Result<Value, ApiError> {
        let result: Result<Value, ApiError> = async {
            let photo = Part::bytes(record.photo)
                .file_name("planted.jpg")
                .mime_str("image/jpeg")?;
            let form = Form::new()
                .text("bucket", record.bucket)
                .text("latitude", record.latitude.to_string())
                .text("longitude", record.longitude.to_string())
                .text("plantingDate", planted_at.to_string())
                .part("images", photo);

            let response = self
                .client
                .post(self.url("/api/plant/tree/"))
                .bearer_auth(token)
                .multipart(form)
                .send()
                .await?;
            decode(ensure_success(response).await?).await
        }
        .await;
        log_outcome("plant_tree", result)
    }

    /// Invalidate the access token on the backend
    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let result: Result<(), ApiError> = async {
            let response = self
                .client
                .post(self.url("/logout/"))
                .bearer_auth(token)
                .send()
                .await?;
            ensure_success(response).await.map(|_| ())
        }
        .await;
        log_outcome("logout", result)
    }

    async fn post_json(&self, token: &str, path: &str, body: Value) -> Result<Value, ApiError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let body = ensure_success(response).await?.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(status_error(response).await)
    }
}

async fn status_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ApiError::Status { status, body }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// The `error` member of a validation payload, or the whole payload
fn rejection_detail(payload: &Value) -> String {
    match payload.get("error") {
        Some(Value::String(msg)) => msg.clone(),
        Some(other) => other.to_string(),
        None => payload.to_string(),
    }
}

fn log_outcome<T>(endpoint: &'static str, result: Result<T, ApiError>) -> Result<T, ApiError> {
    match &result {
        Ok(_) => debug!(endpoint, "Backend call succeeded"),
        Err(e) => warn!(endpoint, error = %e, "Backend call failed"),
    }
    result
}
