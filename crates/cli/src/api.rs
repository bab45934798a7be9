//! HTTP calls to `/auth/*`.
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use towernotes_common::{
    CredentialFileError, CredentialsRequest, ErrorBody, RefreshRequest, TokenPair,
};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx answer. `code` is empty when the body was not an error envelope.
    #[error("{message} ({status} {code})")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },

    #[error(transparent)]
    Credentials(#[from] CredentialFileError),
}

/// The server operations the CLI drives
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn register(&self, username: &str, password: &str) -> Result<TokenPair, ClientError>;
    async fn login(&self, username: &str, password: &str) -> Result<TokenPair, ClientError>;
    async fn logout(&self, refresh_token: &str) -> Result<(), ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
}

impl HttpAuthApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B>(&self, path: &str, body: &B) -> Result<Response, ClientError>
    where
        B: Serialize + Sync,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(rejection(response).await)
    }
}

async fn rejection(response: Response) -> ClientError {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => ClientError::Rejected {
            status: status.as_u16(),
            code: body.error.code,
            message: body.error.message,
        },
        Err(_) => ClientError::Rejected {
            status: status.as_u16(),
            code: String::new(),
            message: status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string(),
        },
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn register(&self, username: &str, password: &str) -> Result<TokenPair, ClientError> {
        let body = CredentialsRequest::new(username, password);
        let response = self.post("/auth/register", &body).await?;
        Ok(response.json().await?)
    }

    async fn login(&self, username: &str, password: &str) -> Result<TokenPair, ClientError> {
        let body = CredentialsRequest::new(username, password);
        let response = self.post("/auth/login", &body).await?;
        Ok(response.json().await?)
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), ClientError> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.post("/auth/logout", &body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let api = HttpAuthApi::new("http://localhost:3000/").unwrap();
        assert_eq!(api.base_url(), "http://localhost:3000");
    }

    #[test]
    fn rejection_reads_like_the_server_message() {
        let err = ClientError::Rejected {
            status: 401,
            code: "AUTH_001".into(),
            message: "Invalid credentials".into(),
        };
        assert_eq!(err.to_string(), "Invalid credentials (401 AUTH_001)");
    }
}
