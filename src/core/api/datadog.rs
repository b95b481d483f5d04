//! Interact with the DataDog v1 REST API.
//!
//! Only the read-only endpoints needed to size the current estate are used:
//! host search, timeseries queries and the dashboard list.

use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, trace, warn};
use reqwest::{header, Url};
use serde::de::DeserializeOwned;

use crate::core::models::{DashboardList, Host, HostList, MetricQuery};

/// Largest page the host search endpoint will return.
pub const HOST_PAGE_SIZE: u64 = 1000;
/// Upper bound on host search pages fetched in one listing.
const MAX_HOST_PAGES: u64 = 1000;

/// Configuration for interacting with the DataDog API.
pub struct DatadogApiConfig {
    /// URL endpoint, e.g. `https://api.datadoghq.com`. Any path is kept as a
    /// prefix of the API paths.
    pub base_url: Url,
    /// HTTP client
    pub client: reqwest::Client,
}

impl DatadogApiConfig {
    /// Configure HTTP client with API/application keys, user-agent, and timeout.
    pub fn new_with_params(
        base_url: Url,
        api_key: &str,
        app_key: &str,
        timeout: u64,
    ) -> Result<Self> {
        let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"),);
        let mut headers = header::HeaderMap::new();
        let mut api_key = header::HeaderValue::from_str(api_key)?;
        api_key.set_sensitive(true);
        headers.insert("DD-API-KEY", api_key);
        let mut app_key = header::HeaderValue::from_str(app_key)?;
        app_key.set_sensitive(true);
        headers.insert("DD-APPLICATION-KEY", app_key);
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .default_headers(headers)
                .timeout(Duration::from_secs(timeout))
                .build()?,
            base_url: with_trailing_slash(base_url),
        })
    }

    pub fn new(base_url: Url, api_key: &str, app_key: &str) -> Result<Self> {
        let timeout = 30;
        Self::new_with_params(base_url, api_key, app_key, timeout)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Invalid DataDog API path {}", path))
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Send a request and deserialize its JSON body.
async fn send_json<T: DeserializeOwned>(req_builder: reqwest::RequestBuilder) -> Result<T> {
    let response = req_builder.send().await?;
    response.error_for_status_ref()?;

    debug!("status: {}", response.status());
    let content = response.text().await?;
    debug!("content: {}", content);

    let parsed: T = serde_json::from_str(&content)
        .with_context(|| format!("JSON from DataDog API was malformed: {}", &content))?;
    Ok(parsed)
}

/// Get one page of hosts reporting to DataDog.
///
/// # Errors
///
/// Returns an error if DataDog returns a non-200 response (e.g. if the API or
/// application key is invalid, if the site is unreachable) or if the returned
/// data is malformed.
pub async fn hosts_search(
    configuration: &DatadogApiConfig,
    start: u64,
    count: u64,
) -> Result<HostList> {
    debug!("building hosts search request: start={} count={}", start, count);
    let req_builder = configuration
        .client
        .get(configuration.endpoint("api/v1/hosts")?)
        .query(&[("start", start), ("count", count)]);
    send_json(req_builder).await
}

/// Get every host reporting to DataDog, following pagination.
///
/// Stops early if the server sends the same page twice, which happens when it
/// ignores `start`.
///
/// # Errors
///
/// Same as [hosts_search], for any page.
pub async fn hosts_all(configuration: &DatadogApiConfig) -> Result<Vec<Host>> {
    let mut hosts: Vec<Host> = Vec::new();
    let mut previous_page: Vec<Host> = Vec::new();
    for page_number in 1..=MAX_HOST_PAGES {
        let page = hosts_search(configuration, hosts.len() as u64, HOST_PAGE_SIZE).await?;
        if !page.host_list.is_empty() && page.host_list == previous_page {
            warn!(
                "DataDog returned the same hosts for start={}, stopping pagination",
                hosts.len()
            );
            break;
        }
        let returned = page.host_list.len() as u64;
        hosts.extend(page.host_list.iter().cloned());
        previous_page = page.host_list;

        let seen_all = page
            .total_matching
            .map_or(false, |total| hosts.len() as u64 >= total);
        if returned < HOST_PAGE_SIZE || seen_all {
            break;
        }
        if page_number == MAX_HOST_PAGES {
            warn!(
                "Stopped listing DataDog hosts after {} pages",
                MAX_HOST_PAGES
            );
        }
    }
    debug!(
        "found {} hosts ({} up)",
        hosts.len(),
        hosts.iter().filter(|h| h.up.unwrap_or(true)).count()
    );
    trace!(
        "hosts: {:?}",
        hosts
            .iter()
            .filter_map(|h| h.host_name.as_deref())
            .collect::<Vec<_>>()
    );
    Ok(hosts)
}

/// Query a timeseries between two Unix timestamps (seconds).
///
/// # Errors
///
/// Returns an error if DataDog returns a non-200 response (e.g. invalid
/// query, rate limiting) or if the returned data is malformed.
pub async fn metric_query(
    configuration: &DatadogApiConfig,
    from: i64,
    to: i64,
    query: &str,
) -> Result<MetricQuery> {
    debug!("building metric query request: {} [{}, {}]", query, from, to);
    let req_builder = configuration
        .client
        .get(configuration.endpoint("api/v1/query")?)
        .query(&[("from", from.to_string()), ("to", to.to_string())])
        .query(&[("query", query)]);
    send_json(req_builder).await
}

/// List all dashboards in the organisation.
///
/// # Errors
///
/// Returns an error if DataDog returns a non-200 response or if the returned
/// data is malformed.
pub async fn dashboards_list(configuration: &DatadogApiConfig) -> Result<DashboardList> {
    debug!("building dashboards list request");
    let req_builder = configuration
        .client
        .get(configuration.endpoint("api/v1/dashboard")?);
    send_json(req_builder).await
}
