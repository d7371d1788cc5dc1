use std::collections::HashMap;
use std::time::Duration;

use harvest_core::{AppDetails, AppId};
use reqwest::Url;
use serde::Deserialize;

use crate::{CatalogPage, DetailPayload, EngineEvent, FailureKind, FetchError};

/// Catalog listing endpoint settings. The listing path carries a total
/// request timeout so a stuck page cannot stall enumeration forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSettings {
    pub endpoint: String,
    pub api_key: String,
    pub page_size: u32,
    pub page_delay: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.steampowered.com/IStoreService/GetAppList/v1/".to_string(),
            api_key: String::new(),
            page_size: 10_000,
            page_delay: Duration::from_millis(500),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Detail endpoint settings. No total request timeout by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSettings {
    pub endpoint: String,
    pub country_code: String,
    pub language: String,
    pub connect_timeout: Duration,
    pub request_timeout: Option<Duration>,
}

impl Default for DetailSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://store.steampowered.com/api/appdetails".to_string(),
            country_code: "us".to_string(),
            language: "english".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn emit(&self, _event: EngineEvent) {}
}

/// Forward-only cursor listing of catalog identifiers.
#[async_trait::async_trait]
pub trait CatalogLister: Send + Sync {
    /// Items with an identifier strictly greater than `after`.
    async fn list_page(&self, after: AppId) -> Result<CatalogPage, FetchError>;
}

#[async_trait::async_trait]
pub trait DetailFetcher: Send + Sync {
    async fn fetch_details(&self, app_id: AppId) -> Result<DetailPayload, FetchError>;
}

/// reqwest-backed client for both store endpoints.
#[derive(Debug, Clone)]
pub struct StoreClient {
    listing: ListingSettings,
    detail: DetailSettings,
    listing_url: Url,
    detail_url: Url,
    listing_client: reqwest::Client,
    detail_client: reqwest::Client,
}

impl StoreClient {
    pub fn new(listing: ListingSettings, detail: DetailSettings) -> Result<Self, FetchError> {
        let listing_url = parse_endpoint(&listing.endpoint)?;
        let detail_url = parse_endpoint(&detail.endpoint)?;

        let listing_client = reqwest::Client::builder()
            .connect_timeout(listing.connect_timeout)
            .timeout(listing.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;

        let mut detail_builder = reqwest::Client::builder().connect_timeout(detail.connect_timeout);
        if let Some(timeout) = detail.request_timeout {
            detail_builder = detail_builder.timeout(timeout);
        }
        let detail_client = detail_builder
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            listing,
            detail,
            listing_url,
            detail_url,
            listing_client,
            detail_client,
        })
    }

    fn listing_request_url(&self, after: AppId) -> Url {
        let mut url = self.listing_url.clone();
        url.query_pairs_mut()
            .append_pair("key", &self.listing.api_key)
            .append_pair("include_games", "true")
            .append_pair("include_dlc", "false")
            .append_pair("include_software", "false")
            .append_pair("include_videos", "false")
            .append_pair("include_hardware", "false")
            .append_pair("last_appid", &after.to_string())
            .append_pair("max_results", &self.listing.page_size.to_string());
        url
    }

    fn detail_request_url(&self, app_id: AppId) -> Url {
        let mut url = self.detail_url.clone();
        url.query_pairs_mut()
            .append_pair("appids", &app_id.to_string())
            .append_pair("cc", &self.detail.country_code)
            .append_pair("l", &self.detail.language);
        url
    }
}

#[async_trait::async_trait]
impl CatalogLister for StoreClient {
    async fn list_page(&self, after: AppId) -> Result<CatalogPage, FetchError> {
        let response = self
            .listing_client
            .get(self.listing_request_url(after))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16(), status.to_string()));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        parse_listing(&body)
    }
}

#[async_trait::async_trait]
impl DetailFetcher for StoreClient {
    async fn fetch_details(&self, app_id: AppId) -> Result<DetailPayload, FetchError> {
        let response = self
            .detail_client
            .get(self.detail_request_url(app_id))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16(), status.to_string()));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        parse_details(app_id, &body)
    }
}

#[derive(Debug, Deserialize)]
struct ListingEnvelope {
    response: Option<ListingBody>,
}

#[derive(Debug, Deserialize)]
struct ListingBody {
    #[serde(default)]
    apps: Option<Vec<ListingEntry>>,
    have_more_results: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ListingEntry {
    appid: AppId,
}

/// An absent or empty `apps` list is the end-of-catalog marker, not an error.
pub(crate) fn parse_listing(body: &[u8]) -> Result<CatalogPage, FetchError> {
    let envelope: ListingEnvelope = serde_json::from_slice(body)
        .map_err(|err| FetchError::new(FailureKind::MalformedResponse, err.to_string()))?;
    let listing = envelope.response.ok_or_else(|| {
        FetchError::new(FailureKind::MalformedResponse, "missing `response` object")
    })?;
    Ok(CatalogPage {
        app_ids: listing
            .apps
            .unwrap_or_default()
            .into_iter()
            .map(|entry| entry.appid)
            .collect(),
        have_more_results: listing.have_more_results,
    })
}

#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    #[serde(default)]
    success: bool,
    data: Option<serde_json::Value>,
}

pub(crate) fn parse_details(app_id: AppId, body: &[u8]) -> Result<DetailPayload, FetchError> {
    let entries: Option<HashMap<String, DetailEnvelope>> = serde_json::from_slice(body)
        .map_err(|err| FetchError::new(FailureKind::MalformedResponse, err.to_string()))?;

    let Some(entry) = entries.and_then(|mut map| map.remove(&app_id.to_string())) else {
        return Ok(DetailPayload::Unavailable);
    };
    let data = match entry.data {
        Some(data) if entry.success => data,
        _ => return Ok(DetailPayload::Unavailable),
    };

    serde_json::from_value::<AppDetails>(data)
        .map(DetailPayload::Available)
        .map_err(|err| FetchError::new(FailureKind::MalformedResponse, err.to_string()))
}

fn parse_endpoint(endpoint: &str) -> Result<Url, FetchError> {
    Url::parse(endpoint).map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
