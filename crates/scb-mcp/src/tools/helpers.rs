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

//! Helper functions shared across tools.

use crate::error::{McpError, McpResult};
use crate::protocol::CallToolResult;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Parse JSON arguments into a typed structure.
pub fn parse_args<T: for<'de> Deserialize<'de>>(args: Option<JsonValue>) -> McpResult<T> {
    let args = args.unwrap_or(JsonValue::Object(serde_json::Map::new()));
    serde_json::from_value(args).map_err(|e| McpError::InvalidArguments(e.to_string()))
}

/// Trimmed `value`, or an argument error naming `field` when it is blank.
pub fn require<'a>(field: &str, value: &'a str) -> McpResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(McpError::InvalidArguments(format!("'{}' must not be empty", field)))
    } else {
        Ok(trimmed)
    }
}

/// Turn a tool outcome into the result sent to the client. Failures are
/// reported inside the result with `isError` set, not as protocol errors.
pub fn into_tool_result(name: &str, outcome: McpResult<CallToolResult>) -> CallToolResult {
    outcome.unwrap_or_else(|e| {
        tracing::warn!("Tool {} failed: {}", name, e);
        CallToolResult::from_error(&e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::{PreviewArgs, SearchTablesArgs};
    use serde_json::json;

    #[test]
    fn test_parse_args_defaults() {
        let args: SearchTablesArgs = parse_args(None).unwrap();
        assert_eq!(args.page_size, 20);
        assert!(args.query.is_none());

        let args: PreviewArgs = parse_args(Some(json!({ "table_id": "TAB638" }))).unwrap();
        assert_eq!(args.rows, 10);
        assert!(args.selection.is_empty());
    }

    #[test]
    fn test_parse_args_missing_required_field() {
        let err = parse_args::<PreviewArgs>(Some(json!({}))).unwrap_err();
        assert!(matches!(err, McpError::InvalidArguments(ref m) if m.contains("table_id")));
    }

    #[test]
    fn test_parse_args_rejects_bad_selection() {
        let err = parse_args::<PreviewArgs>(Some(json!({
            "table_id": "TAB638",
            "selection": { "Region": { "nested": true } }
        })))
        .unwrap_err();
        assert!(matches!(err, McpError::InvalidArguments(_)));
    }

    #[test]
    fn test_require() {
        assert_eq!(require("table_id", " TAB638 ").unwrap(), "TAB638");
        assert!(require("table_id", "   ").is_err());
    }

    #[test]
    fn test_into_tool_result_marks_errors() {
        let result = into_tool_result("scb_x", Err(McpError::ToolNotFound("scb_x".into())));
        assert_eq!(result.is_error, Some(true));
    }
}
