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

//! In-memory statistics API for server tests.

#![allow(dead_code)]

use async_trait::async_trait;
use scb_core::{
    ApiConfig, Dataset, ScbError, ScbResult, Selection, TableList, TableSummary, UpstreamFailure,
};
use scb_mcp::{
    CallToolResult, JsonRpcRequest, McpServer, McpServerConfig, StatisticsApi, TableQuery,
};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Tables the fake knows about. Both share the population metadata.
pub const TABLES: [&str; 2] = ["TAB638", "TAB1776"];

pub struct FakeApi {
    calls: Mutex<Vec<String>>,
    selections: Mutex<Vec<Selection>>,
    config: Option<ApiConfig>,
    metadata: HashMap<String, Dataset>,
    data: Dataset,
}

impl FakeApi {
    /// Reports a quota of 5 calls per 60 seconds and a 1000-cell limit.
    pub fn new() -> Self {
        let config: ApiConfig = serde_json::from_value(json!({
            "apiName": "PxAPI",
            "apiVersion": "2.0.0",
            "defaultLanguage": "sv",
            "languages": [{ "id": "sv", "label": "Svenska" }, { "id": "en", "label": "English" }],
            "maxDataCells": 1000,
            "maxCallsPerTimeWindow": 5,
            "timeWindow": 60
        }))
        .unwrap();
        Self::with_config(Some(config))
    }

    /// `/config` fails, so the fallback quota stays in force.
    pub fn without_config() -> Self {
        Self::with_config(None)
    }

    fn with_config(config: Option<ApiConfig>) -> Self {
        let metadata = TABLES
            .iter()
            .map(|id| (id.to_string(), population_metadata()))
            .collect();
        Self {
            calls: Mutex::new(Vec::new()),
            selections: Mutex::new(Vec::new()),
            config,
            metadata,
            data: population_data(),
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    /// Number of recorded calls whose name starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Selection of the most recent data request.
    pub fn last_selection(&self) -> Option<Selection> {
        self.selections.lock().unwrap().last().cloned()
    }

    fn not_found(what: &str) -> ScbError {
        let body = json!({
            "type": "https://tools.ietf.org/html/rfc7231#section-6.5.4",
            "title": "Not Found",
            "status": 404,
            "detail": format!("{} does not exist", what)
        });
        ScbError::from_upstream(UpstreamFailure::from_response(404, "Not Found", body.to_string()))
    }
}

#[async_trait]
impl StatisticsApi for FakeApi {
    async fn get_config(&self) -> ScbResult<ApiConfig> {
        self.record("config".to_string());
        self.config
            .clone()
            .ok_or_else(|| ScbError::Transport("connection refused".to_string()))
    }

    async fn search_tables(&self, query: &TableQuery) -> ScbResult<TableList> {
        self.record(format!("search:{}", query.query.clone().unwrap_or_default()));
        let tables: Vec<TableSummary> = TABLES
            .iter()
            .map(|id| {
                serde_json::from_value(json!({
                    "id": id,
                    "label": "Population by region, sex and year",
                    "description": "",
                    "updated": "2024-02-21T08:00:00Z",
                    "firstPeriod": "2022",
                    "lastPeriod": "2023",
                    "variableNames": ["region", "sex", "observations", "year"],
                    "links": []
                }))
                .unwrap()
            })
            .collect();
        Ok(TableList {
            language: query.lang.clone(),
            page: serde_json::from_value(json!({
                "pageNumber": query.page_number.unwrap_or(1),
                "pageSize": query.page_size.unwrap_or(20),
                "totalElements": tables.len(),
                "totalPages": 1
            }))
            .unwrap(),
            tables,
        })
    }

    async fn get_table(&self, table_id: &str, _lang: &str) -> ScbResult<TableSummary> {
        self.record(format!("table:{}", table_id));
        let list = self.search_tables(&TableQuery::default()).await?;
        list.tables
            .into_iter()
            .find(|t| t.id == table_id)
            .ok_or_else(|| Self::not_found(table_id))
    }

    async fn get_metadata(&self, table_id: &str, _lang: &str) -> ScbResult<Dataset> {
        self.record(format!("metadata:{}", table_id));
        self.metadata
            .get(table_id)
            .cloned()
            .ok_or_else(|| Self::not_found(table_id))
    }

    async fn get_data(&self, table_id: &str, _lang: &str, selection: &Selection) -> ScbResult<Dataset> {
        self.record(format!("data:{}", table_id));
        self.selections.lock().unwrap().push(selection.clone());
        if !self.metadata.contains_key(table_id) {
            return Err(Self::not_found(table_id));
        }
        Ok(self.data.clone())
    }
}

pub fn population_metadata() -> Dataset {
    Dataset::from_json(json!({
        "version": "2.0",
        "class": "dataset",
        "label": "Population by region, sex and year",
        "source": "Statistics Sweden",
        "updated": "2024-02-21T08:00:00Z",
        "id": ["Region", "Kon", "ContentsCode", "Tid"],
        "size": [6, 2, 1, 2],
        "dimension": {
            "Region": {
                "label": "region",
                "category": {
                    "index": { "00": 0, "01": 1, "0180": 2, "03": 3, "0380": 4, "1480": 5 },
                    "label": {
                        "00": "Sweden",
                        "01": "Stockholms län",
                        "0180": "Stockholm",
                        "03": "Uppsala län",
                        "0380": "Uppsala",
                        "1480": "Göteborg"
                    }
                }
            },
            "Kon": {
                "label": "sex",
                "category": { "index": { "1": 0, "2": 1 }, "label": { "1": "men", "2": "women" } }
            },
            "ContentsCode": {
                "label": "observations",
                "category": { "index": { "BE0101N1": 0 }, "label": { "BE0101N1": "Population" } }
            },
            "Tid": {
                "label": "year",
                "category": { "index": ["2022", "2023"] },
                "extension": { "elimination": false }
            }
        },
        "role": { "time": ["Tid"], "geo": ["Region"], "metric": ["ContentsCode"] }
    }))
    .unwrap()
}

/// Stockholm by sex for two years, with one suppressed cell.
pub fn population_data() -> Dataset {
    Dataset::from_json(json!({
        "label": "Population by region, sex and year",
        "source": "Statistics Sweden",
        "id": ["Region", "Kon", "Tid"],
        "size": [1, 2, 2],
        "dimension": {
            "Region": { "label": "region", "category": { "index": { "0180": 0 }, "label": { "0180": "Stockholm" } } },
            "Kon": { "label": "sex", "category": { "index": { "1": 0, "2": 1 }, "label": { "1": "men", "2": "women" } } },
            "Tid": { "label": "year", "category": { "index": ["2022", "2023"] } }
        },
        "value": [487000, 489123, null, 496500],
        "role": { "time": ["Tid"], "geo": ["Region"] }
    }))
    .unwrap()
}

pub fn server_with(api: Arc<FakeApi>) -> McpServer {
    McpServer::with_api(McpServerConfig::default(), api)
}

/// Call a tool and return the parsed JSON payload and the error flag.
pub async fn call_tool(server: &mut McpServer, name: &str, arguments: JsonValue) -> (JsonValue, bool) {
    let response = server
        .handle_request(JsonRpcRequest::new(
            1,
            "tools/call",
            Some(json!({ "name": name, "arguments": arguments })),
        ))
        .await;
    assert!(response.error.is_none(), "protocol error: {:?}", response.error);

    let result: CallToolResult = serde_json::from_value(response.result.unwrap()).unwrap();
    let payload = serde_json::from_str(result.text().unwrap()).unwrap();
    (payload, result.is_error.unwrap_or(false))
}
