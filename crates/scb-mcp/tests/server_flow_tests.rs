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

//! Protocol and tool flows against an in-memory statistics API.

mod common;

use common::{call_tool, server_with, FakeApi};
use scb_mcp::JsonRpcRequest;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_initialize_handshake() {
    let mut server = server_with(Arc::new(FakeApi::new()));
    let response = server
        .handle_request(JsonRpcRequest::new(
            1,
            "initialize",
            Some(json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "test-client", "version": "0.1" }
            })),
        ))
        .await;

    let result = response.result.unwrap();
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "scb-mcp");
    assert!(result["capabilities"]["tools"].is_object());
    assert!(server.is_initialized());

    let response = server
        .handle_request(JsonRpcRequest::new(2, "shutdown", None))
        .await;
    assert!(response.error.is_none());
    assert!(!server.is_initialized());
}

#[tokio::test]
async fn test_initialize_requires_params() {
    let mut server = server_with(Arc::new(FakeApi::new()));
    let response = server
        .handle_request(JsonRpcRequest::new(1, "initialize", None))
        .await;
    assert_eq!(response.error.unwrap().code, -32602);
}

#[tokio::test]
async fn test_tools_list() {
    let mut server = server_with(Arc::new(FakeApi::new()));
    let response = server
        .handle_request(JsonRpcRequest::new(1, "tools/list", None))
        .await;
    let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
    assert_eq!(tools.len(), 12);
    assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
}

#[tokio::test]
async fn test_unknown_tool_is_a_tool_error() {
    let mut server = server_with(Arc::new(FakeApi::new()));
    let (payload, is_error) = call_tool(&mut server, "scb_does_not_exist", json!({})).await;
    assert!(is_error);
    assert_eq!(payload["error"]["kind"], "ToolNotFound");
}

#[tokio::test]
async fn test_search_tables() {
    let api = Arc::new(FakeApi::new());
    let mut server = server_with(api.clone());
    let (payload, is_error) =
        call_tool(&mut server, "scb_search_tables", json!({ "query": "befolkning" })).await;

    assert!(!is_error, "{}", payload);
    assert_eq!(payload["query"], "befolkning");
    assert_eq!(payload["returned"], 2);
    assert_eq!(payload["tables"][0]["id"], "TAB638");
    assert_eq!(payload["tables"][0]["last_period"], "2023");
    assert_eq!(payload["language"], "en");
    assert_eq!(api.count("search:befolkning"), 1);
}

#[tokio::test]
async fn test_table_metadata_describes_dimensions() {
    let mut server = server_with(Arc::new(FakeApi::new()));
    let (payload, is_error) =
        call_tool(&mut server, "scb_get_table_metadata", json!({ "table_id": "TAB638" })).await;

    assert!(!is_error, "{}", payload);
    let dims = payload["dimensions"].as_array().unwrap();
    assert_eq!(dims.len(), 4);
    assert_eq!(dims[0]["code"], "Region");
    assert_eq!(dims[0]["role"], "geo");
    assert_eq!(dims[0]["size"], 6);
    assert_eq!(dims[0]["sample_categories"].as_array().unwrap().len(), 5);
    assert_eq!(dims[3]["base_name"], "period");
    assert_eq!(dims[3]["mandatory"], true);
}

#[tokio::test]
async fn test_table_variables_filter() {
    let mut server = server_with(Arc::new(FakeApi::new()));
    let (payload, is_error) = call_tool(
        &mut server,
        "scb_get_table_variables",
        json!({ "table_id": "TAB638", "variable": "kön", "show_all_values": true }),
    )
    .await;

    assert!(!is_error, "{}", payload);
    let vars = payload["variables"].as_array().unwrap();
    assert_eq!(vars.len(), 1);
    assert_eq!(vars[0]["code"], "Kon");
    assert_eq!(vars[0]["values"][1]["label"], "women");
    assert_eq!(vars[0]["truncated"], false);
}

#[tokio::test]
async fn test_validate_selection_translates_names() {
    let api = Arc::new(FakeApi::new());
    let mut server = server_with(api.clone());
    let (payload, is_error) = call_tool(
        &mut server,
        "scb_validate_selection",
        json!({
            "table_id": "TAB638",
            "selection": { "kommun": "Stockholm", "kön": ["kvinnor", "män"], "år": "*" }
        }),
    )
    .await;

    assert!(!is_error, "{}", payload);
    let report = &payload["validation"];
    assert_eq!(report["isValid"], true);
    assert_eq!(
        report["translatedSelection"],
        json!({ "Region": ["0180"], "Kon": ["2", "1"], "Tid": ["*"] })
    );
    assert_eq!(report["unspecifiedDimensions"], json!(["ContentsCode"]));
    assert_eq!(api.count("data:"), 0);
}

#[tokio::test]
async fn test_validate_selection_suggests_corrections() {
    let mut server = server_with(Arc::new(FakeApi::new()));
    let (payload, is_error) = call_tool(
        &mut server,
        "scb_validate_selection",
        json!({ "table_id": "TAB638", "selection": { "regoin": ["Stokholm"] } }),
    )
    .await;

    assert!(!is_error, "{}", payload);
    let report = &payload["validation"];
    assert_eq!(report["isValid"], false);
    assert!(report.get("translatedSelection").is_none());
    let suggestions = report["suggestions"].to_string();
    assert!(suggestions.contains("'Region'"));
    assert!(suggestions.contains("Stockholm"));
}

#[tokio::test]
async fn test_get_table_data_echoes_requested_table_id() {
    let api = Arc::new(FakeApi::new());
    let mut server = server_with(api.clone());
    let (payload, is_error) = call_tool(
        &mut server,
        "scb_get_table_data",
        json!({
            "table_id": "TAB1776",
            "selection": { "Region": ["0180"], "Kon": "*", "Tid": ["2022", "2023"] }
        }),
    )
    .await;

    assert!(!is_error, "{}", payload);
    assert_eq!(payload["query"]["table_id"], "TAB1776");
    assert_eq!(payload["query"]["selection"]["Kon"], json!(["*"]));
    assert!(payload["query"].get("translated_selection").is_none());
    assert_eq!(payload["summary"]["total_records"], 4);
    assert_eq!(payload["summary"]["null_count"], 1);
    assert_eq!(payload["data"][0]["region"], "Stockholm");
    assert_eq!(payload["data"][0]["sex"], "men");
    assert_eq!(payload["data"][0]["period"], "2022");
    assert!(payload["data"][2]["value"].is_null());

    let sent = api.last_selection().unwrap();
    assert!(sent.get("Kon").unwrap().is_all());
}

#[tokio::test]
async fn test_get_table_data_echoes_selection_as_written() {
    let api = Arc::new(FakeApi::new());
    let mut server = server_with(api.clone());
    let (payload, is_error) = call_tool(
        &mut server,
        "scb_get_table_data",
        json!({
            "table_id": "TAB638",
            "selection": { "kommun": ["Stockholm"], "år": ["2022", "2023"] }
        }),
    )
    .await;

    assert!(!is_error, "{}", payload);
    assert_eq!(
        payload["query"]["selection"],
        json!({ "kommun": ["Stockholm"], "år": ["2022", "2023"] })
    );
    assert_eq!(
        payload["query"]["translated_selection"],
        json!({ "Region": ["0180"], "Tid": ["2022", "2023"] })
    );
    assert_eq!(payload["query"]["table_id"], "TAB638");
}

#[tokio::test]
async fn test_invalid_selection_makes_no_data_request() {
    let api = Arc::new(FakeApi::new());
    let mut server = server_with(api.clone());
    let (payload, is_error) = call_tool(
        &mut server,
        "scb_get_table_data",
        json!({ "table_id": "TAB638", "selection": { "Region": ["Atlantis"] } }),
    )
    .await;

    assert!(is_error);
    assert_eq!(payload["error"]["kind"], "SelectionInvalid");
    assert!(payload["error"]["errors"][0].as_str().unwrap().contains("Atlantis"));
    assert_eq!(api.count("metadata:"), 1);
    assert_eq!(api.count("data:"), 0);
}

#[tokio::test]
async fn test_preview_restricts_unspecified_dimensions() {
    let api = Arc::new(FakeApi::new());
    let mut server = server_with(api.clone());
    let (payload, is_error) = call_tool(
        &mut server,
        "scb_preview_data",
        json!({ "table_id": "TAB638", "selection": { "region": "0180" }, "rows": 2 }),
    )
    .await;

    assert!(!is_error, "{}", payload);
    assert_eq!(payload["data"].as_array().unwrap().len(), 2);
    assert_eq!(payload["summary"]["truncated"], true);
    assert_eq!(payload["summary"]["total_records"], 4);
    assert_eq!(payload["query"]["selection"], json!({ "region": ["0180"] }));

    let sent = serde_json::to_value(api.last_selection().unwrap()).unwrap();
    assert_eq!(
        sent,
        json!({ "Region": ["0180"], "Kon": ["1"], "ContentsCode": ["BE0101N1"], "Tid": ["2022"] })
    );
}

#[tokio::test]
async fn test_missing_table_is_upstream_not_found() {
    let mut server = server_with(Arc::new(FakeApi::new()));
    let (payload, is_error) =
        call_tool(&mut server, "scb_get_table_info", json!({ "table_id": "TAB0000" })).await;

    assert!(is_error);
    assert_eq!(payload["error"]["kind"], "UpstreamNotFound");
    assert_eq!(payload["error"]["http_status"], 404);
    assert!(payload["error"]["message"].as_str().unwrap().contains("TAB0000"));
}

#[tokio::test]
async fn test_blank_table_id_is_an_argument_error() {
    let api = Arc::new(FakeApi::new());
    let mut server = server_with(api.clone());
    let (payload, is_error) =
        call_tool(&mut server, "scb_get_table_info", json!({ "table_id": "  " })).await;

    assert!(is_error);
    assert_eq!(payload["error"]["kind"], "InvalidArguments");
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn test_browse_folders_is_unavailable_without_upstream_call() {
    let api = Arc::new(FakeApi::new());
    let mut server = server_with(api.clone());
    let (payload, is_error) =
        call_tool(&mut server, "scb_browse_folders", json!({ "folder_id": "BE" })).await;

    assert!(is_error);
    assert_eq!(payload["error"]["kind"], "FeatureUnavailable");
    assert_eq!(payload["error"]["feature"], "browse_folders");
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn test_find_region_code() {
    let mut server = server_with(Arc::new(FakeApi::new()));
    let (payload, is_error) =
        call_tool(&mut server, "scb_find_region_code", json!({ "name": "Stockholm" })).await;

    assert!(!is_error, "{}", payload);
    assert_eq!(payload["found"], true);
    assert_eq!(payload["dimension"], "Region");
    let codes: Vec<&str> = payload["matches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["01", "0180"]);
    assert_eq!(payload["matches"][0]["region_type"], "county");
}

#[tokio::test]
async fn test_search_regions_tolerates_missing_diacritics() {
    let mut server = server_with(Arc::new(FakeApi::new()));
    let (payload, is_error) =
        call_tool(&mut server, "scb_search_regions", json!({ "query": "Goteborg" })).await;

    assert!(!is_error, "{}", payload);
    assert_eq!(payload["regions"][0]["code"], "1480");
    assert_eq!(payload["regions"][0]["region_type"], "municipality");
}
