//! HTTP client for the business directory REST API.
//!
//! Two endpoints are used: `GET {base}/cities` for the city picker and
//! `GET {base}/companies?city=` for the records of one city. Records are
//! normalized here, once, so the view engine never sees wire strings.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use bizmap_core::{normalize_records, AppConfig, BusinessRecord, RawBusinessRecord};
use bizmap_view::RecordSource;
use reqwest::{Client, StatusCode, Url};

use crate::error::DirectoryError;
use crate::retry::retry_with_backoff;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 500;

/// Client for the directory API.
///
/// Use [`DirectoryClient::new`] with the loaded [`AppConfig`], or
/// [`DirectoryClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl DirectoryClient {
    /// Builds a client from application config, including its retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`DirectoryError::InvalidBaseUrl`] if the
    /// configured base URL does not parse.
    pub fn new(config: &AppConfig) -> Result<Self, DirectoryError> {
        Ok(Self::with_base_url(
            &config.api_base_url,
            config.request_timeout_secs,
            &config.user_agent,
        )?
        .with_retry(config.max_retries, config.retry_backoff_base_ms))
    }

    /// Creates a client with an explicit base URL and default retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`DirectoryError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash, so relative joins append to the path
        // instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| DirectoryError::InvalidBaseUrl(format!("'{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Replaces the retry policy. `max_retries = 0` disables retrying.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Lists the cities the directory knows about, trimmed, de-duplicated
    /// and sorted.
    ///
    /// # Errors
    ///
    /// - [`DirectoryError::Http`] on network failure.
    /// - [`DirectoryError::UnexpectedStatus`] on any non-2xx status.
    /// - [`DirectoryError::Deserialize`] if the body is not a string array.
    pub async fn fetch_city_list(&self) -> Result<Vec<String>, DirectoryError> {
        let url = self.endpoint("cities", &[])?;
        let body = self
            .get_text(&url)
            .await?
            .ok_or_else(|| DirectoryError::UnexpectedStatus {
                status: StatusCode::NOT_FOUND.as_u16(),
                url: url.to_string(),
            })?;

        let names: Vec<String> =
            serde_json::from_str(&body).map_err(|e| DirectoryError::Deserialize {
                context: "cities".to_owned(),
                source: e,
            })?;

        let cities: BTreeSet<String> = names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();
        tracing::debug!(count = cities.len(), "fetched city list");
        Ok(cities.into_iter().collect())
    }

    /// Fetches and normalizes every record registered in `city`.
    ///
    /// An unknown city (404) yields an empty list. Elements that do not look
    /// like a record are skipped individually.
    ///
    /// # Errors
    ///
    /// - [`DirectoryError::Http`] on network failure.
    /// - [`DirectoryError::UnexpectedStatus`] on a non-2xx status other than 404.
    /// - [`DirectoryError::Deserialize`] if the body is not a JSON array.
    pub async fn fetch_records_by_city(
        &self,
        city: &str,
    ) -> Result<Vec<BusinessRecord>, DirectoryError> {
        let url = self.endpoint("companies", &[("city", city.trim())])?;
        let Some(body) = self.get_text(&url).await? else {
            tracing::info!(city, "directory has no records for city");
            return Ok(Vec::new());
        };

        let elements: Vec<serde_json::Value> =
            serde_json::from_str(&body).map_err(|e| DirectoryError::Deserialize {
                context: format!("companies(city={city})"),
                source: e,
            })?;

        // A malformed element costs only that record, never the city.
        let raws: Vec<RawBusinessRecord> = elements
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                serde_json::from_value(value)
                    .inspect_err(|e| {
                        tracing::warn!(city, index, error = %e, "skipping malformed record");
                    })
                    .ok()
            })
            .collect();

        let fetched = raws.len();
        let records = normalize_records(raws);
        tracing::debug!(city, fetched, kept = records.len(), "fetched city records");
        Ok(records)
    }

    /// Joins `path` onto the base URL and appends percent-encoded query pairs.
    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, DirectoryError> {
        let mut url = self.base_url.join(path).map_err(|e| {
            DirectoryError::InvalidBaseUrl(format!("'{}' + '{path}': {e}", self.base_url))
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends a GET with retries and returns the body, or `None` for 404.
    async fn get_text(&self, url: &Url) -> Result<Option<String>, DirectoryError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || self.get_once(url)).await
    }

    async fn get_once(&self, url: &Url) -> Result<Option<String>, DirectoryError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(DirectoryError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(Some(response.text().await?))
    }
}

#[async_trait]
impl RecordSource for DirectoryClient {
    type Error = DirectoryError;

    async fn fetch_records_by_city(&self, city: &str) -> Result<Vec<BusinessRecord>, Self::Error> {
        DirectoryClient::fetch_records_by_city(self, city).await
    }

    async fn fetch_city_list(&self) -> Result<Vec<String>, Self::Error> {
        DirectoryClient::fetch_city_list(self).await
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
