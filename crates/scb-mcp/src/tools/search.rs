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

//! Table search.

use crate::client::TableQuery;
use crate::error::McpResult;
use crate::protocol::CallToolResult;
use crate::service::ScbService;
use crate::tools::helpers::parse_args;
use crate::tools::types::SearchTablesArgs;
use serde_json::{json, Value as JsonValue};

/// Execute scb_search_tables tool.
pub async fn execute_search_tables(
    args: Option<JsonValue>,
    service: &ScbService,
) -> McpResult<CallToolResult> {
    let args: SearchTablesArgs = parse_args(args)?;
    let query = TableQuery {
        query: args.query.clone(),
        page_number: args.page_number,
        page_size: Some(args.page_size.clamp(1, 100)),
        lang: args.language,
        past_days: args.past_days,
        include_discontinued: args.include_discontinued,
    };

    let list = service.search_tables(query).await?;
    let tables: Vec<JsonValue> = list
        .tables
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "label": t.label,
                "description": t.description,
                "updated": t.updated,
                "first_period": t.first_period,
                "last_period": t.last_period,
                "time_unit": t.time_unit,
                "variables": t.variable_names,
                "discontinued": t.discontinued.unwrap_or(false),
            })
        })
        .collect();

    CallToolResult::json(&json!({
        "query": args.query,
        "language": list.language,
        "page": list.page,
        "returned": tables.len(),
        "tables": tables,
    }))
}
