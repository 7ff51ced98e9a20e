use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::context::EvaluationContext;
use crate::core::NumeratorOptions;
use crate::error::{ErrorCode, NumeratorError, Result};
use crate::http::{get_header_value, ApiRequest, ApiResponse, HttpTransport, Transport};
use crate::types::{
    FlagConfig, FlagVariationValue, ListingRequest, ListingResponse, PollingBody,
    PollingRequest, PollingResult, ValueByKeyRequest,
};

pub const END_POINT_BASE: &str = "api/sdk/feature-flag";
pub const END_POINT_CONFIG_LISTING: &str = "api/sdk/feature-flag/listing";
pub const END_POINT_CONFIG_BY_KEY: &str = "api/sdk/feature-flag/detail-by-key";
pub const END_POINT_VALUE_BY_KEY: &str = "api/sdk/feature-flag/by-key";
pub const END_POINT_POLLING: &str = "api/sdk/feature-flag/polling";

/// Page size used when walking the whole flag listing.
pub const LISTING_PAGE_SIZE: u32 = 200;

const ETAG_HEADER: &str = "ETag";
const IF_NONE_MATCH_HEADER: &str = "If-None-Match";

/// Typed wrapper over the four flag service operations.
///
/// Every call maps 1:1 onto a transport request and turns the transport's
/// `{data, error}` envelope into a `Result`.
#[derive(Clone)]
pub struct NumeratorClient {
    transport: Arc<dyn Transport>,
}

impl NumeratorClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Builds a client over [`HttpTransport`].
    pub fn from_options(options: &NumeratorOptions) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(options)?)))
    }

    /// Fetches one page of flag configs. An empty body reads as an empty page.
    pub async fn flag_config_listing(
        &self,
        page: u32,
        size: u32,
    ) -> Result<ListingResponse<FlagConfig>> {
        let body = serde_json::to_value(ListingRequest { page, size }).map_err(encode_error)?;
        let response = self
            .transport
            .request(ApiRequest::post(END_POINT_CONFIG_LISTING, body))
            .await;

        match unwrap_envelope(response, "flag_config_listing")? {
            (Some(data), _) => decode(data),
            (None, _) => Ok(ListingResponse {
                count: 0,
                data: Vec::new(),
            }),
        }
    }

    /// Walks the listing page by page until the reported count is reached.
    pub async fn all_flag_configs(&self) -> Result<Vec<FlagConfig>> {
        let mut page = 0;
        let mut configs: Vec<FlagConfig> = Vec::new();

        loop {
            let listing = self
                .flag_config_listing(page, LISTING_PAGE_SIZE)
                .await
                .map_err(|e| {
                    tracing::error!("Error fetching all flag configs: {}", e);
                    e
                })?;
            page += 1;

            let page_len = listing.data.len();
            configs.extend(listing.data);

            if configs.len() >= listing.count {
                break;
            }
            // A short server count would otherwise spin forever on empty pages.
            if page_len == 0 {
                tracing::warn!(
                    "Flag listing reported {} configs but returned an empty page after {}",
                    listing.count,
                    configs.len()
                );
                break;
            }
        }

        Ok(configs)
    }

    pub async fn flag_config_by_key(&self, key: &str) -> Result<FlagConfig> {
        let encoded: String = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
        let endpoint = format!("{}?key={}", END_POINT_CONFIG_BY_KEY, encoded);
        let response = self.transport.request(ApiRequest::get(endpoint)).await;

        match unwrap_envelope(response, "flag_config_by_key")? {
            (Some(data), _) => decode(data),
            (None, _) => Err(NumeratorError::flag_not_found()),
        }
    }

    /// Evaluates one flag's variation for the request's context.
    pub async fn evaluate_by_key(&self, request: &ValueByKeyRequest) -> Result<FlagVariationValue> {
        let body = serde_json::to_value(request).map_err(encode_error)?;
        let response = self
            .transport
            .request(ApiRequest::post(END_POINT_VALUE_BY_KEY, body))
            .await;

        match unwrap_envelope(response, "evaluate_by_key")? {
            (Some(data), _) => decode(data),
            (None, _) => Err(NumeratorError::flag_not_found()),
        }
    }

    /// Fetches the full flag collection for `context`.
    ///
    /// `etag` is sent as `If-None-Match`. The returned `flags` is `None` when
    /// the server reports the collection unchanged, whether by a 304, an
    /// absent `flags` field, or an empty one.
    pub async fn poll_collection(
        &self,
        context: &EvaluationContext,
        properties: Option<&HashMap<String, Value>>,
        etag: Option<&str>,
    ) -> Result<PollingResult> {
        let body = serde_json::to_value(PollingRequest { context, properties })
            .map_err(encode_error)?;
        let mut request = ApiRequest::post(END_POINT_POLLING, body);
        if let Some(tag) = etag.filter(|t| !t.is_empty()) {
            request = request.header(IF_NONE_MATCH_HEADER, tag);
        }

        let response = self.transport.request(request).await;
        let (data, headers) = unwrap_envelope(response, "poll_collection")?;

        let flags = match data {
            Some(data) => decode::<PollingBody>(data)?.flags,
            None => None,
        };

        Ok(PollingResult {
            flags: flags.filter(|f| !f.is_empty()),
            etag: get_header_value(&headers, ETAG_HEADER),
        })
    }
}

fn unwrap_envelope(
    response: ApiResponse,
    operation: &str,
) -> Result<(Option<Value>, reqwest::header::HeaderMap)> {
    match response.error {
        Some(error) => {
            tracing::warn!("Error in {} due to: [{}]", operation, error);
            Err(error)
        }
        None => Ok((response.data, response.headers)),
    }
}

fn decode<T: DeserializeOwned>(data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|e| {
        NumeratorError::with_source(
            ErrorCode::InvalidResponse,
            format!("Failed to decode response: {}", e),
            e,
        )
    })
}

fn encode_error(e: serde_json::Error) -> NumeratorError {
    NumeratorError::with_source(ErrorCode::InvalidResponse, "Failed to encode request", e)
}
