//! Client for the external identity provider (a GoTrue-compatible auth API).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ServiceError;

/// A user as known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens issued by a successful password sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: IdentityUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a bearer token to its user; invalid tokens are `Unauthorized`.
    async fn verify_token(&self, token: &str) -> Result<IdentityUser, ServiceError>;

    /// Password grant. Bad credentials are `Unauthorized`.
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionTokens, ServiceError>;

    /// Sends an invitation e-mail and returns the user created for it.
    async fn invite_user(&self, email: &str, metadata: Value) -> Result<IdentityUser, ServiceError>;

    /// Revokes the session behind `token`.
    async fn sign_out(&self, token: &str) -> Result<(), ServiceError>;
}

/// HTTP implementation of [`IdentityProvider`].
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    base_url: Url,
    service_key: String,
    anon_key: String,
    invite_redirect_url: Option<String>,
}

impl HttpIdentityProvider {
    pub fn new(
        base_url: &str,
        service_key: impl Into<String>,
        anon_key: Option<String>,
        invite_redirect_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base).map_err(|e| {
            ServiceError::InternalError(format!("invalid identity provider url: {}", e))
        })?;
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            ServiceError::InternalError(format!("failed to build http client: {}", e))
        })?;
        let service_key = service_key.into();

        Ok(Self {
            client,
            base_url,
            anon_key: anon_key.unwrap_or_else(|| service_key.clone()),
            service_key,
            invite_redirect_url,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        Self::new(
            &config.identity_provider_url,
            config.identity_provider_service_key.clone(),
            config.identity_provider_anon_key.clone(),
            config.invite_redirect_url.clone(),
            Duration::from_secs(config.identity_request_timeout_secs),
        )
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|e| ServiceError::InternalError(format!("invalid identity endpoint: {}", e)))
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ServiceError> {
        request.send().await.map_err(|e| {
            error!(error = %e, "identity provider unreachable");
            ServiceError::ExternalServiceError(e.to_string())
        })
    }
}

/// Reads an unexpected response into an `ExternalServiceError`.
async fn upstream_failure(operation: &str, response: reqwest::Response) -> ServiceError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!(operation, %status, body = %body, "identity provider request failed");
    ServiceError::ExternalServiceError(format!("{} failed with status {}", operation, status))
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[instrument(skip_all)]
    async fn verify_token(&self, token: &str) -> Result<IdentityUser, ServiceError> {
        let request = self
            .client
            .get(self.endpoint("auth/v1/user")?)
            .header("apikey", &self.anon_key)
            .bearer_auth(token);
        let response = self.send(request).await?;

        match response.status() {
            s if s.is_success() => response
                .json::<IdentityUser>()
                .await
                .map_err(|e| ServiceError::ExternalServiceError(e.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ServiceError::Unauthorized("Invalid token".to_string()))
            }
            _ => Err(upstream_failure("token verification", response).await),
        }
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionTokens, ServiceError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let request = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }));
        let response = self.send(request).await?;

        match response.status() {
            s if s.is_success() => response
                .json::<SessionTokens>()
                .await
                .map_err(|e| ServiceError::ExternalServiceError(e.to_string())),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                warn!(email, "sign-in rejected by identity provider");
                Err(ServiceError::Unauthorized("Invalid credentials".to_string()))
            }
            _ => Err(upstream_failure("sign-in", response).await),
        }
    }

    #[instrument(skip(self, metadata))]
    async fn invite_user(&self, email: &str, metadata: Value) -> Result<IdentityUser, ServiceError> {
        let mut url = self.endpoint("auth/v1/invite")?;
        if let Some(redirect) = &self.invite_redirect_url {
            url.query_pairs_mut().append_pair("redirect_to", redirect);
        }
        let request = self
            .client
            .post(url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&json!({ "email": email, "data": metadata }));
        let response = self.send(request).await?;

        if response.status().is_success() {
            response
                .json::<IdentityUser>()
                .await
                .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))
        } else {
            Err(upstream_failure("invite", response).await)
        }
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, token: &str) -> Result<(), ServiceError> {
        let request = self
            .client
            .post(self.endpoint("auth/v1/logout")?)
            .header("apikey", &self.anon_key)
            .bearer_auth(token);
        let response = self.send(request).await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            // An already-expired session is as good as signed out.
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(()),
            _ => Err(upstream_failure("sign-out", response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> HttpIdentityProvider {
        HttpIdentityProvider::new(
            &server.uri(),
            "service-key",
            Some("anon-key".into()),
            Some("https://depot.example.com/set-password".into()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn verify_token_returns_user() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer good-token"))
            .and(header("apikey", "anon-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": id, "email": "ana@example.com", "role": "authenticated" })),
            )
            .mount(&server)
            .await;

        let user = provider(&server).verify_token("good-token").await.unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));
    }

    #[tokio::test]
    async fn rejected_token_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        assert_matches!(
            provider(&server).verify_token("stale").await,
            Err(ServiceError::Unauthorized(_))
        );
    }

    #[tokio::test]
    async fn sign_in_uses_password_grant() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(body_partial_json(json!({ "email": "ana@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt",
                "token_type": "bearer",
                "expires_in": 3600,
                "refresh_token": "refresh",
                "user": { "id": id, "email": "ana@example.com" }
            })))
            .mount(&server)
            .await;

        let tokens = provider(&server)
            .sign_in("ana@example.com", "secret")
            .await
            .unwrap();
        assert_eq!(tokens.access_token, "jwt");
        assert_eq!(tokens.user.id, id);
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        assert_matches!(
            provider(&server).sign_in("ana@example.com", "wrong").await,
            Err(ServiceError::Unauthorized(_))
        );
    }

    #[tokio::test]
    async fn invite_sends_service_key_and_redirect() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/auth/v1/invite"))
            .and(header("authorization", "Bearer service-key"))
            .and(query_param("redirect_to", "https://depot.example.com/set-password"))
            .and(body_partial_json(json!({ "email": "new@example.com", "data": { "role": "Driver" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": id, "email": "new@example.com" })))
            .mount(&server)
            .await;

        let user = provider(&server)
            .invite_user("new@example.com", json!({ "role": "Driver" }))
            .await
            .unwrap();
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn upstream_errors_are_external_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/invite"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert_matches!(
            provider(&server)
                .invite_user("new@example.com", json!({}))
                .await,
            Err(ServiceError::ExternalServiceError(_))
        );
    }
}
