//! HTTP implementation of [`Store`].
//!
//! Reads are `GET <endpoint>`, writes are `POST <endpoint>` with a JSON body.
//! Any non-success status is a failure; the body is kept for the alert.

use std::time::Duration;

use livecast_core::{RemoteSnapshot, StoreError, StoreRequest, WriteReply};

use crate::{RuntimeError, Store};

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Store reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpStore {
    /// Build a store for the given stats endpoint.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::StoreSetup`] if the endpoint is not a valid URL or the
    /// HTTP client cannot be built.
    pub fn new(endpoint: &str) -> Result<Self, RuntimeError> {
        let endpoint = reqwest::Url::parse(endpoint)
            .map_err(|e| RuntimeError::StoreSetup(format!("invalid endpoint {endpoint:?}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RuntimeError::StoreSetup(e.to_string()))?;
        Ok(Self { client, endpoint })
    }

    /// Endpoint every request goes to.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

impl Store for HttpStore {
    async fn fetch_snapshot(&self) -> Result<RemoteSnapshot, StoreError> {
        let response =
            self.client.get(self.endpoint.clone()).send().await.map_err(transport_error)?;
        let body = success_body(response).await?;
        RemoteSnapshot::from_json(&body)
    }

    async fn submit(&self, request: StoreRequest) -> Result<WriteReply, StoreError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        let body = success_body(response).await?;
        request.decode_reply(&body)
    }
}

async fn success_body(response: reqwest::Response) -> Result<Vec<u8>, StoreError> {
    let status = response.status();
    let body = response.bytes().await.map_err(transport_error)?;
    if !status.is_success() {
        return Err(StoreError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    Ok(body.to_vec())
}

#[allow(clippy::needless_pass_by_value, reason = "used as a map_err adapter")]
fn transport_error(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}
