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

//! Region name lookups against the reference table.

use crate::error::McpResult;
use crate::protocol::CallToolResult;
use crate::service::ScbService;
use crate::tools::helpers::{parse_args, require};
use crate::tools::types::{FindRegionArgs, RegionSearchArgs};
use serde_json::{json, Value as JsonValue};

/// Execute scb_search_regions tool.
pub async fn execute_search_regions(
    args: Option<JsonValue>,
    service: &ScbService,
) -> McpResult<CallToolResult> {
    let args: RegionSearchArgs = parse_args(args)?;
    let query = require("query", &args.query)?;
    let lookup = service
        .search_regions(query, args.limit.clamp(1, 100), args.language.as_deref())
        .await?;

    CallToolResult::json(&json!({
        "query": query,
        "table_id": lookup.table_id,
        "dimension": lookup.dimension,
        "count": lookup.matches.len(),
        "regions": lookup.matches,
    }))
}

/// Execute scb_find_region_code tool.
pub async fn execute_find_region_code(
    args: Option<JsonValue>,
    service: &ScbService,
) -> McpResult<CallToolResult> {
    let args: FindRegionArgs = parse_args(args)?;
    let name = require("name", &args.name)?;
    let lookup = service
        .find_region_code(name, args.language.as_deref())
        .await?;

    let hint = if lookup.matches.is_empty() {
        Some("No exact match. Try scb_search_regions for fuzzy matches.")
    } else {
        None
    };

    CallToolResult::json(&json!({
        "name": name,
        "table_id": lookup.table_id,
        "dimension": lookup.dimension,
        "found": !lookup.matches.is_empty(),
        "matches": lookup.matches,
        "hint": hint,
    }))
}
