//! Session backend client

use crate::error::StoreError;
use crate::session::state::User;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Whole-request deadline for session calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote session endpoints. The backend issues an HTTP-only session
/// cookie on login/signup; implementations carry it between calls.
#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<User, StoreError>;
    async fn signup(&self, email: &str, password: &str, username: &str)
        -> Result<User, StoreError>;
    async fn current_session(&self) -> Result<Option<User>, StoreError>;
    async fn logout(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: SessionApi + ?Sized> SessionApi for Arc<T> {
    async fn login(&self, email: &str, password: &str) -> Result<User, StoreError> {
        (**self).login(email, password).await
    }

    async fn signup(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<User, StoreError> {
        (**self).signup(email, password, username).await
    }

    async fn current_session(&self) -> Result<Option<User>, StoreError> {
        (**self).current_session().await
    }

    async fn logout(&self) -> Result<(), StoreError> {
        (**self).logout().await
    }
}

/// Session API over HTTP with a cookie jar for the session cookie.
pub struct HttpSessionApi {
    client: Client,
    base_url: String,
}

impl HttpSessionApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post_user(&self, path: &str, body: serde_json::Value) -> Result<User, StoreError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(StoreError::from_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(StoreError::from_transport)?;

        if !status.is_success() {
            return Err(StoreError::from_status(status, &body));
        }

        let payload: UserPayload = serde_json::from_str(&body)
            .map_err(|e| StoreError::unknown(format!("Failed to parse session response: {e}")))?;
        Ok(payload.user)
    }
}

#[derive(Deserialize)]
struct UserPayload {
    user: User,
}

#[derive(Deserialize)]
struct SessionPayload {
    user: Option<User>,
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn login(&self, email: &str, password: &str) -> Result<User, StoreError> {
        self.post_user("/auth/login", json!({ "email": email, "password": password }))
            .await
    }

    async fn signup(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<User, StoreError> {
        self.post_user(
            "/auth/signup",
            json!({ "email": email, "password": password, "username": username }),
        )
        .await
    }

    async fn current_session(&self) -> Result<Option<User>, StoreError> {
        let response = self
            .client
            .get(format!("{}/auth/session", self.base_url))
            .send()
            .await
            .map_err(StoreError::from_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(StoreError::from_transport)?;

        if !status.is_success() {
            return Err(StoreError::from_status(status, &body));
        }

        let payload: SessionPayload = serde_json::from_str(&body)
            .map_err(|e| StoreError::unknown(format!("Failed to parse session response: {e}")))?;
        Ok(payload.user)
    }

    async fn logout(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .post(format!("{}/auth/logout", self.base_url))
            .send()
            .await
            .map_err(StoreError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::from_status(status, &body));
        }
        Ok(())
    }
}
