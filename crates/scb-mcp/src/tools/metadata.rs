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

//! Table information, dimension structure and selection validation.

use crate::error::McpResult;
use crate::protocol::CallToolResult;
use crate::service::ScbService;
use crate::tools::helpers::{parse_args, require};
use crate::tools::types::{SelectionArgs, TableArgs, VariablesArgs, DEFAULT_VALUE_SAMPLE};
use scb_core::synonyms::base_name;
use scb_core::{
    translate_variable_name, validate_selection, Dataset, Dimension, ScbError, Selection,
    ValidationOptions, ValueSelection,
};
use serde_json::{json, Value as JsonValue};

const SAMPLE_CATEGORIES: usize = 5;

/// Execute scb_get_table_info tool.
pub async fn execute_get_table_info(
    args: Option<JsonValue>,
    service: &ScbService,
) -> McpResult<CallToolResult> {
    let args: TableArgs = parse_args(args)?;
    let table_id = require("table_id", &args.table_id)?;
    let table = service.table_info(table_id, args.language.as_deref()).await?;
    CallToolResult::json(&table)
}

/// Execute scb_get_table_metadata tool.
pub async fn execute_get_table_metadata(
    args: Option<JsonValue>,
    service: &ScbService,
) -> McpResult<CallToolResult> {
    let args: TableArgs = parse_args(args)?;
    let table_id = require("table_id", &args.table_id)?;
    let metadata = service.metadata(table_id, args.language.as_deref()).await?;

    let dimensions: Vec<JsonValue> = metadata
        .dimensions()
        .map(|(code, dim)| {
            json!({
                "code": code,
                "label": dim.label_or(code),
                "base_name": base_name(code, Some(&metadata)),
                "role": role_of(&metadata, code),
                "mandatory": !dim.is_eliminable(),
                "size": dim.category.len(),
                "sample_categories": categories(dim, Some(SAMPLE_CATEGORIES)),
            })
        })
        .collect();

    CallToolResult::json(&json!({
        "table_id": table_id,
        "label": metadata.label,
        "source": metadata.source,
        "updated": metadata.updated,
        "dimensions": dimensions,
        "notes": metadata.note,
    }))
}

/// Execute scb_get_table_variables tool.
pub async fn execute_get_table_variables(
    args: Option<JsonValue>,
    service: &ScbService,
) -> McpResult<CallToolResult> {
    let args: VariablesArgs = parse_args(args)?;
    let table_id = require("table_id", &args.table_id)?;
    let metadata = service.metadata(table_id, args.language.as_deref()).await?;

    let wanted = match args.variable.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(name) => Some(resolve_variable(&metadata, name)?),
        None => None,
    };
    let limit = (!args.show_all_values).then_some(DEFAULT_VALUE_SAMPLE);

    let variables: Vec<JsonValue> = metadata
        .dimensions()
        .filter(|(code, _)| wanted.as_deref().map_or(true, |w| w == *code))
        .map(|(code, dim)| {
            let total = dim.category.len();
            json!({
                "code": code,
                "label": dim.label_or(code),
                "mandatory": !dim.is_eliminable(),
                "value_count": total,
                "values": categories(dim, limit),
                "truncated": limit.is_some_and(|n| total > n),
            })
        })
        .collect();

    CallToolResult::json(&json!({
        "table_id": table_id,
        "variables": variables,
    }))
}

/// Execute scb_validate_selection tool. Fetches metadata only.
pub async fn execute_validate_selection(
    args: Option<JsonValue>,
    service: &ScbService,
) -> McpResult<CallToolResult> {
    let args: SelectionArgs = parse_args(args)?;
    let table_id = require("table_id", &args.table_id)?;
    let (_, report) = service
        .validate(table_id, &args.selection, args.language.as_deref())
        .await?;

    CallToolResult::json(&json!({
        "table_id": table_id,
        "validation": report,
    }))
}

/// Dimension code for a variable filter, or `SelectionInvalid` with
/// suggestions when nothing matches.
fn resolve_variable(metadata: &Dataset, name: &str) -> McpResult<String> {
    let lookup: Selection = std::iter::once((name.to_string(), ValueSelection::All)).collect();
    let report = validate_selection(metadata, &lookup, &ValidationOptions::default());
    if !report.is_valid {
        return Err(ScbError::SelectionInvalid {
            message: report.error_summary(),
            errors: report.errors,
            suggestions: report.suggestions,
        }
        .into());
    }
    Ok(translate_variable_name(name, metadata))
}

fn role_of(metadata: &Dataset, code: &str) -> Option<&'static str> {
    if metadata.is_time_dimension(code) {
        Some("time")
    } else if metadata.is_geo_dimension(code) {
        Some("geo")
    } else if metadata.is_metric_dimension(code) {
        Some("metric")
    } else {
        None
    }
}

fn categories(dim: &Dimension, limit: Option<usize>) -> Vec<JsonValue> {
    dim.category
        .codes()
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|code| json!({ "code": code, "label": dim.category.label_of(code) }))
        .collect()
}
