#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use reqwest::Response;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_derive::Deserialize;
use serde_json::Value;

use crate::domain::models::ApiError;
use crate::domain::models::ErrorResponse;
use crate::domain::models::InvalidatorBox;
use crate::domain::models::SessionContext;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub service: String,
}

/// The one HTTP client every store goes through. Requests carry the bearer
/// token the session context holds at the moment they are dispatched. Any 401
/// tears the session down through the injected invalidator before the error
/// reaches the caller.
#[derive(Clone)]
pub struct ApiClient {
    url: String,
    http: reqwest::Client,
    context: SessionContext,
    invalidator: InvalidatorBox,
}

impl ApiClient {
    pub fn new(
        url: &str,
        context: SessionContext,
        invalidator: InvalidatorBox,
    ) -> Result<ApiClient> {
        return ApiClient::with_timeout(url, REQUEST_TIMEOUT, context, invalidator);
    }

    fn with_timeout(
        url: &str,
        timeout: Duration,
        context: SessionContext,
        invalidator: InvalidatorBox,
    ) -> Result<ApiClient> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        return Ok(ApiClient {
            url: url.trim_end_matches('/').to_string(),
            http,
            context,
            invalidator,
        });
    }

    pub fn url(&self) -> &str {
        return &self.url;
    }

    pub fn context(&self) -> &SessionContext {
        return &self.context;
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Response, ApiError> {
        let mut req = self
            .http
            .request(method.clone(), format!("{url}{path}", url = self.url));

        if let Some(authorization) = self.context.authorization() {
            req = req.header(AUTHORIZATION, authorization);
        }

        if let Some(body) = body {
            req = req.json(&body);
        }

        tracing::debug!(method = %method, path = path, "Sending request");

        let res = match req.send().await {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, method = %method, path = path, "Request did not complete");
                return Err(ApiError::from(err));
            }
        };

        return self.intercept(path, res).await;
    }

    async fn intercept(&self, path: &str, res: Response) -> Result<Response, ApiError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let message = match res.text().await {
            Ok(body) => serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .map(|err| return err.message)
                .filter(|msg| return !msg.is_empty()),
            Err(_) => None,
        };

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(path = path, "Backend rejected the session, tearing it down");
            self.invalidator.invalidate().await;
            return Err(ApiError::Unauthorized { message });
        }

        tracing::error!(status = status.as_u16(), path = path, message = ?message, "Request failed");
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    /// Empty bodies and a JSON `null` both decode as `None`.
    async fn decode<T: DeserializeOwned>(res: Response) -> Result<Option<T>, ApiError> {
        let body = res.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        return serde_json::from_str::<Option<T>>(&body)
            .map_err(|err| return ApiError::Decode(err.to_string()));
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        let res = self.request(Method::GET, path, None).await?;
        return ApiClient::decode(res).await;
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, ApiError> {
        let body = serde_json::to_value(body)?;
        let res = self.request(Method::POST, path, Some(body)).await?;
        return ApiClient::decode(res).await;
    }

    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let body = serde_json::to_value(body)?;
        self.request(Method::PUT, path, Some(body)).await?;
        return Ok(());
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request(Method::DELETE, path, None).await?;
        return Ok(());
    }

    pub async fn health_check(&self) -> Result<HealthResponse, ApiError> {
        let res = self.get::<HealthResponse>("/health").await?;
        return Ok(res.unwrap_or_default());
    }
}
