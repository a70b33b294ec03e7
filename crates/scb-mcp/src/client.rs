// SCB MCP - Statistics Sweden Model Context Protocol bridge
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP access to the PxWebApi 2.0 statistics API.
//!
//! [`StatisticsApi`] is the seam the rest of the server talks to;
//! [`HttpStatisticsApi`] is the `reqwest` implementation. Calls are not
//! retried and every request carries the configured timeout.

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response};
use scb_core::{ApiConfig, Dataset, ScbError, ScbResult, Selection, TableList, TableSummary, UpstreamFailure};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// Default upstream base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.scb.se/OV0104/v2beta/api/v2";

/// Longest encoded query string sent as a GET before switching to POST.
pub const DEFAULT_POST_THRESHOLD: usize = 2000;

const OUTPUT_FORMAT: &str = "json-stat2";

/// Parameters of a table search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableQuery {
    pub query: Option<String>,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    pub lang: Option<String>,
    pub past_days: Option<u32>,
    pub include_discontinued: Option<bool>,
}

/// Operations the server needs from the statistics API.
#[async_trait]
pub trait StatisticsApi: Send + Sync {
    /// `GET /config`
    async fn get_config(&self) -> ScbResult<ApiConfig>;

    /// `GET /tables`
    async fn search_tables(&self, query: &TableQuery) -> ScbResult<TableList>;

    /// `GET /tables/{id}`
    async fn get_table(&self, table_id: &str, lang: &str) -> ScbResult<TableSummary>;

    /// `GET /tables/{id}/metadata`, as a JSON-stat2 dataset without values.
    async fn get_metadata(&self, table_id: &str, lang: &str) -> ScbResult<Dataset>;

    /// `GET` or `POST /tables/{id}/data` for an already translated selection.
    async fn get_data(&self, table_id: &str, lang: &str, selection: &Selection) -> ScbResult<Dataset>;
}

/// How a data request goes over the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum DataRequest {
    Get(Url),
    Post(Url, JsonValue),
}

/// `reqwest`-backed [`StatisticsApi`].
#[derive(Debug, Clone)]
pub struct HttpStatisticsApi {
    client: Client,
    base_url: Url,
    timeout: Duration,
    post_threshold: usize,
}

impl HttpStatisticsApi {
    pub fn new(base_url: &str, timeout: Duration) -> ScbResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ScbError::Transport(format!("invalid base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ScbError::Transport(format!(
                "base URL '{}' cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("scb-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScbError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout,
            post_threshold: DEFAULT_POST_THRESHOLD,
        })
    }

    pub fn with_post_threshold(mut self, threshold: usize) -> Self {
        self.post_threshold = threshold;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with `segments` appended to its path.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Builds the data request, choosing POST when the GET query would be
    /// longer than the threshold.
    pub fn data_request(&self, table_id: &str, lang: &str, selection: &Selection) -> DataRequest {
        let mut url = self.endpoint(&["tables", table_id, "data"]);
        url.query_pairs_mut()
            .append_pair("lang", lang)
            .append_pair("outputFormat", OUTPUT_FORMAT);
        let base = url.clone();

        url.query_pairs_mut().extend_pairs(selection.query_pairs());
        if url.query().map_or(0, str::len) > self.post_threshold {
            DataRequest::Post(base, selection.to_request_body())
        } else {
            DataRequest::Get(url)
        }
    }

    async fn execute(&self, method: &str, request: RequestBuilder, path: &str) -> ScbResult<JsonValue> {
        let started = Instant::now();
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        debug!(
            method,
            path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream call"
        );

        if !status.is_success() {
            let retry_after = retry_after(&response);
            let body = response.text().await.unwrap_or_default();
            let failure = UpstreamFailure::from_response(
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                body,
            )
            .with_retry_after(retry_after);
            return Err(ScbError::from_upstream(failure));
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&body).map_err(|e| {
            ScbError::InvalidDataset(format!("{} returned a body that is not JSON: {}", path, e))
        })
    }

    async fn get_json(&self, url: Url) -> ScbResult<JsonValue> {
        let path = url.path().to_string();
        self.execute("GET", self.client.get(url), &path).await
    }

    fn transport_error(&self, e: reqwest::Error) -> ScbError {
        if e.is_timeout() {
            ScbError::Transport(format!("request timed out after {}s", self.timeout.as_secs()))
        } else {
            ScbError::Transport(format!("request failed: {}", e))
        }
    }
}

fn retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn decode<T: DeserializeOwned>(what: &str, value: JsonValue) -> ScbResult<T> {
    serde_json::from_value(value)
        .map_err(|e| ScbError::InvalidDataset(format!("unexpected {} payload: {}", what, e)))
}

#[async_trait]
impl StatisticsApi for HttpStatisticsApi {
    async fn get_config(&self) -> ScbResult<ApiConfig> {
        let value = self.get_json(self.endpoint(&["config"])).await?;
        decode("config", value)
    }

    async fn search_tables(&self, query: &TableQuery) -> ScbResult<TableList> {
        let mut url = self.endpoint(&["tables"]);
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(q) = query.query.as_deref().filter(|q| !q.trim().is_empty()) {
                pairs.append_pair("query", q);
            }
            if let Some(n) = query.page_number {
                pairs.append_pair("pageNumber", &n.to_string());
            }
            if let Some(n) = query.page_size {
                pairs.append_pair("pageSize", &n.to_string());
            }
            if let Some(lang) = &query.lang {
                pairs.append_pair("lang", lang);
            }
            if let Some(days) = query.past_days {
                pairs.append_pair("pastDays", &days.to_string());
            }
            if let Some(flag) = query.include_discontinued {
                pairs.append_pair("includeDiscontinued", if flag { "true" } else { "false" });
            }
        }
        let value = self.get_json(url).await?;
        decode("table list", value)
    }

    async fn get_table(&self, table_id: &str, lang: &str) -> ScbResult<TableSummary> {
        let mut url = self.endpoint(&["tables", table_id]);
        url.query_pairs_mut().append_pair("lang", lang);
        let value = self.get_json(url).await?;
        decode("table", value)
    }

    async fn get_metadata(&self, table_id: &str, lang: &str) -> ScbResult<Dataset> {
        let mut url = self.endpoint(&["tables", table_id, "metadata"]);
        url.query_pairs_mut()
            .append_pair("lang", lang)
            .append_pair("outputFormat", OUTPUT_FORMAT);
        let value = self.get_json(url).await?;
        Dataset::from_json(value)
    }

    async fn get_data(&self, table_id: &str, lang: &str, selection: &Selection) -> ScbResult<Dataset> {
        let value = match self.data_request(table_id, lang, selection) {
            DataRequest::Get(url) => self.get_json(url).await?,
            DataRequest::Post(url, body) => {
                let path = url.path().to_string();
                self.execute("POST", self.client.post(url).json(&body), &path)
                    .await?
            }
        };
        Dataset::from_json(value)
    }
}
