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

//! Data retrieval: validate, fetch and flatten.

use crate::error::McpResult;
use crate::protocol::CallToolResult;
use crate::service::ScbService;
use crate::tools::helpers::{parse_args, require};
use crate::tools::types::{DataArgs, PreviewArgs, MAX_PREVIEW_ROWS};
use scb_core::FlattenOptions;
use serde_json::Value as JsonValue;

/// Execute scb_get_table_data tool.
pub async fn execute_get_table_data(
    args: Option<JsonValue>,
    service: &ScbService,
) -> McpResult<CallToolResult> {
    let args: DataArgs = parse_args(args)?;
    let table_id = require("table_id", &args.table_id)?;
    let options = FlattenOptions {
        max_records: args.max_records,
    };

    let data = service
        .query_data(table_id, &args.selection, args.language.as_deref(), &options)
        .await?;
    CallToolResult::json(&data)
}

/// Execute scb_preview_data tool.
pub async fn execute_preview_data(
    args: Option<JsonValue>,
    service: &ScbService,
) -> McpResult<CallToolResult> {
    let args: PreviewArgs = parse_args(args)?;
    let table_id = require("table_id", &args.table_id)?;
    let rows = args.rows.clamp(1, MAX_PREVIEW_ROWS);

    let data = service
        .preview(table_id, &args.selection, args.language.as_deref(), rows)
        .await?;
    CallToolResult::json(&data)
}
