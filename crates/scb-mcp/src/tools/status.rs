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

//! API status, quota usage and folder browsing.

use crate::error::McpResult;
use crate::protocol::CallToolResult;
use crate::service::ScbService;
use crate::tools::helpers::parse_args;
use crate::tools::types::BrowseFoldersArgs;
use scb_core::ScbError;
use serde_json::{json, Value as JsonValue};

/// Execute scb_get_api_status tool.
pub async fn execute_get_api_status(service: &ScbService) -> McpResult<CallToolResult> {
    let status = service.api_status().await?;
    CallToolResult::json(&status)
}

/// Execute scb_check_usage tool. Reads the local governor only.
pub fn execute_check_usage(service: &ScbService) -> McpResult<CallToolResult> {
    let usage = service.usage();
    let utilisation = if usage.max_calls_per_window == 0 {
        0.0
    } else {
        f64::from(usage.request_count) / f64::from(usage.max_calls_per_window)
    };
    let near_limit = usage.remaining <= usage.max_calls_per_window / 10;
    CallToolResult::json(&json!({
        "usage": usage,
        "utilisation": utilisation,
        "near_limit": near_limit,
    }))
}

/// Execute scb_browse_folders tool.
///
/// The v2 API has no folder navigation endpoint, so this always answers
/// `FeatureUnavailable` and never calls upstream.
pub fn execute_browse_folders(args: Option<JsonValue>) -> McpResult<CallToolResult> {
    let args: BrowseFoldersArgs = parse_args(args)?;
    let target = args
        .folder_id
        .map(|id| format!(" (requested folder '{}')", id))
        .unwrap_or_default();
    Err(ScbError::feature_unavailable(
        "browse_folders",
        format!(
            "Folder browsing is not offered by PxWebApi 2.0{}. Use scb_search_tables to find tables by keyword instead.",
            target
        ),
    )
    .into())
}
