use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};

use super::transport::{ApiRequest, ApiResponse, Method, Transport};
use crate::core::NumeratorOptions;
use crate::error::{ErrorBody, ErrorCode, NumeratorError, Result};
use crate::utils::snake_case_keys;

pub const API_KEY_HEADER: &str = "X-NUM-API-KEY";

/// reqwest-backed [`Transport`] talking to the Numerator service.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(options: &NumeratorOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| {
                NumeratorError::with_source(ErrorCode::HttpClientInit, "Failed to create HTTP client", e)
            })?;

        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            api_key: options.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    async fn handle_response(&self, response: reqwest::Response) -> ApiResponse {
        let status = response.status();
        let headers = response.headers().clone();

        if status == StatusCode::NOT_MODIFIED {
            return ApiResponse {
                headers,
                ..Default::default()
            };
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to read response body: {}", e);
                return ApiResponse::failure(NumeratorError::unknown());
            }
        };

        if status.is_success() {
            if body.is_empty() {
                return ApiResponse {
                    headers,
                    ..Default::default()
                };
            }

            return match serde_json::from_slice::<serde_json::Value>(&body) {
                Ok(serde_json::Value::Null) => ApiResponse {
                    headers,
                    ..Default::default()
                },
                Ok(data) => ApiResponse {
                    data: Some(data),
                    error: None,
                    headers,
                },
                Err(e) => ApiResponse::failure(
                    NumeratorError::with_source(
                        ErrorCode::InvalidResponse,
                        format!("Failed to parse response: {}", e),
                        e,
                    )
                    .with_status(status.as_u16()),
                ),
            };
        }

        let error = match serde_json::from_slice::<ErrorBody>(&body) {
            Ok(error_body) => NumeratorError::application(error_body, status.as_u16()),
            Err(_) => NumeratorError::unknown(),
        };
        ApiResponse {
            data: None,
            error: Some(error),
            headers,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: ApiRequest) -> ApiResponse {
        let url = self.url(&request.endpoint);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        }
        .header(CONTENT_TYPE, "application/json")
        .header(API_KEY_HEADER, &self.api_key)
        .headers(request.headers);

        if let Some(data) = request.data {
            builder = builder.json(&snake_case_keys(data));
        }

        match builder.send().await {
            Ok(response) => self.handle_response(response).await,
            Err(e) => {
                tracing::warn!("{} {} failed: {}", request.method.as_str(), url, e);
                ApiResponse::failure(NumeratorError::unknown())
            }
        }
    }
}
