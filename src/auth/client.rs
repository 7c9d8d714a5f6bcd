//! HTTP client for the auth service REST API. Requests carry the app API key in
//! `Authorization` and, when acting for a signed-in user, the session token in
//! the `Session` header. Neither value is ever logged.

use crate::{
    auth::{
        service::{AuthService, ServiceError},
        types::{AuthGrant, AuthUser, ServiceErrors, Session},
    },
    APP_USER_AGENT,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const SIGN_IN_PATH: &str = "/_api/rest/v1/auth/signin-email";
const SIGN_UP_PATH: &str = "/_api/rest/v1/auth/signup-email";
const GRANT_PATH: &str = "/_api/rest/v1/auth/grant";
const SIGN_OUT_PATH: &str = "/_api/rest/v1/auth/signout";
const SESSIONS_PATH: &str = "/_api/rest/v1/auth/sessions";
const USER_PATH: &str = "/_api/rest/v1/auth/user";

const SESSION_HEADER: &str = "Session";
/// Maximum number of error body characters surfaced to the UI.
const MAX_ERROR_CHARS: usize = 200;

pub struct HttpAuthService {
    client: Client,
    base_url: Url,
    api_key: SecretString,
}

impl HttpAuthService {
    /// Builds a client with a fixed per-request timeout.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        base_url: Url,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}"))
            .map_err(|err| ServiceError::Network(format!("Invalid service URL: {err}")))
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        session_token: Option<&str>,
    ) -> Result<RequestBuilder, ServiceError> {
        let url = self.endpoint(path)?;
        let mut builder = self
            .client
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, self.api_key.expose_secret());

        if let Some(token) = session_token {
            builder = builder.header(SESSION_HEADER, token);
        }

        Ok(builder)
    }
}

impl std::fmt::Debug for HttpAuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAuthService")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"***")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    #[instrument(skip(self, password))]
    async fn sign_in_with_email(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthGrant, ServiceError> {
        let body = json!({ "email": email, "password": password.expose_secret() });
        let builder = self.request(Method::POST, SIGN_IN_PATH, None)?.json(&body);
        send_json(builder).await
    }

    #[instrument(skip(self, password))]
    async fn sign_up_with_email(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthGrant, ServiceError> {
        let body = json!({ "email": email, "password": password.expose_secret() });
        let builder = self.request(Method::POST, SIGN_UP_PATH, None)?.json(&body);
        send_json(builder).await
    }

    #[instrument(skip_all)]
    async fn get_auth_grant(&self, token: &str) -> Result<AuthGrant, ServiceError> {
        let builder = self
            .request(Method::GET, GRANT_PATH, None)?
            .query(&[("key", token)]);
        send_json(builder).await
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, session_token: &str) -> Result<(), ServiceError> {
        let builder = self.request(Method::POST, SIGN_OUT_PATH, Some(session_token))?;
        let response = builder.send().await.map_err(transport_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(rejection(response).await)
        }
    }

    #[instrument(skip_all)]
    async fn get_all_sessions(&self, session_token: &str) -> Result<Vec<Session>, ServiceError> {
        let builder = self.request(Method::GET, SESSIONS_PATH, Some(session_token))?;
        send_json(builder).await
    }

    #[instrument(skip_all)]
    async fn get_user_by_session(
        &self,
        session_token: &str,
    ) -> Result<Option<AuthUser>, ServiceError> {
        let builder = self.request(Method::GET, USER_PATH, Some(session_token))?;
        let response = builder.send().await.map_err(transport_error)?;

        // An unknown or expired session is an answer, not a failure.
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND
        ) {
            return Ok(None);
        }

        decode(response).await.map(Some)
    }
}

async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ServiceError> {
    let response = builder.send().await.map_err(transport_error)?;
    decode(response).await
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    if !response.status().is_success() {
        return Err(rejection(response).await);
    }

    response
        .json::<T>()
        .await
        .map_err(|err| ServiceError::Parse(format!("Failed to decode response: {err}")))
}

/// Turns a non-2xx response into `Rejected`, keeping the service payload when
/// it is well-formed and falling back to a truncated body otherwise.
async fn rejection(response: Response) -> ServiceError {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => return transport_error(err),
    };

    debug!("Auth service responded with {status}");

    let errors = match serde_json::from_str::<ServiceErrors>(&body) {
        Ok(mut errors) if !errors.items.is_empty() || errors.status.is_some() => {
            errors.status.get_or_insert(status.as_u16());
            errors
        }
        _ => {
            let message: String = body.chars().take(MAX_ERROR_CHARS).collect();
            let message = if message.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                message
            };
            ServiceErrors::from_message(Some(status.as_u16()), message)
        }
    };

    ServiceError::Rejected(errors)
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout(err.to_string())
    } else {
        ServiceError::Network(err.to_string())
    }
}
