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

//! Statistics Sweden tools for the MCP server.
//!
//! Available tools:
//! - `scb_search_tables`: Full-text table search with paging
//! - `scb_get_table_info`: Summary of one table
//! - `scb_get_table_metadata`: Dimension structure of a table
//! - `scb_get_table_variables`: Variables and their values
//! - `scb_validate_selection`: Translate and validate a selection
//! - `scb_get_table_data`: Fetch and flatten data
//! - `scb_preview_data`: Small sample of a table's data
//! - `scb_get_api_status`: Upstream configuration and quota usage
//! - `scb_check_usage`: Local quota usage
//! - `scb_search_regions`: Fuzzy region name search
//! - `scb_find_region_code`: Exact region name lookup
//! - `scb_browse_folders`: Not available in API v2

mod data;
mod helpers;
mod metadata;
mod regions;
#[macro_use]
mod schema_macros;
mod search;
mod status;
mod types;

pub use data::{execute_get_table_data, execute_preview_data};
pub use helpers::into_tool_result;
pub use metadata::{
    execute_get_table_info, execute_get_table_metadata, execute_get_table_variables,
    execute_validate_selection,
};
pub use regions::{execute_find_region_code, execute_search_regions};
pub use search::execute_search_tables;
pub use status::{execute_browse_folders, execute_check_usage, execute_get_api_status};
pub use types::{DEFAULT_PREVIEW_ROWS, MAX_PREVIEW_ROWS};

use crate::error::{McpError, McpResult};
use crate::protocol::{CallToolResult, Tool};
use crate::service::ScbService;
use serde_json::Value as JsonValue;

const SELECTION_HELP: &str = "Selection: dimension -> category codes. Dimension and category names may be codes, labels or common Swedish/English names (e.g. 'kommun', 'sex', 'women', 'totalt'). Use \"*\" for all categories, or expressions such as 'top(5)' or 'from(2020)'.";

/// Get all available tools.
pub fn get_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "scb_search_tables".to_string(),
            description: "Search Statistics Sweden's tables by keyword. Returns table ids, titles, periods covered and variable names, one page at a time.".to_string(),
            input_schema: tool_schema! {
                required: [],
                properties: {
                    query: schema_string!("Search text, e.g. 'population' or 'befolkning'"),
                    page_number: schema_integer!("Page number, starting at 1"),
                    page_size: schema_integer!("Tables per page", default: 20, minimum: 1, maximum: 100),
                    language: language_arg!(),
                    past_days: schema_integer!("Only tables updated in the last N days"),
                    include_discontinued: schema_bool!("Include tables that are no longer updated", default: false)
                }
            },
        },
        Tool {
            name: "scb_get_table_info".to_string(),
            description: "Get the summary of one table: title, description, time span, update date and variable names.".to_string(),
            input_schema: tool_schema! {
                required: ["table_id"],
                properties: {
                    table_id: table_id_arg!(),
                    language: language_arg!()
                }
            },
        },
        Tool {
            name: "scb_get_table_metadata".to_string(),
            description: "Get a table's dimensions: codes, labels, roles, category counts, whether each is mandatory, and sample categories.".to_string(),
            input_schema: tool_schema! {
                required: ["table_id"],
                properties: {
                    table_id: table_id_arg!(),
                    language: language_arg!()
                }
            },
        },
        Tool {
            name: "scb_get_table_variables".to_string(),
            description: "List a table's variables with their values. Values are sampled unless show_all_values is set; pass variable to list just one.".to_string(),
            input_schema: tool_schema! {
                required: ["table_id"],
                properties: {
                    table_id: table_id_arg!(),
                    language: language_arg!(),
                    variable: schema_string!("Only this variable (code, label or common name such as 'region')"),
                    show_all_values: schema_bool!("List every value instead of a sample", default: false)
                }
            },
        },
        Tool {
            name: "scb_validate_selection".to_string(),
            description: "Check a selection against a table without fetching data. Translates names to codes and reports errors with suggestions, unspecified dimensions and the estimated cell count.".to_string(),
            input_schema: tool_schema! {
                required: ["table_id", "selection"],
                properties: {
                    table_id: table_id_arg!(),
                    selection: selection_arg!(SELECTION_HELP),
                    language: language_arg!()
                }
            },
        },
        Tool {
            name: "scb_get_table_data".to_string(),
            description: "Fetch data for a selection and return one flat record per cell with labels, codes and the value, plus summary statistics. Invalid selections are rejected before any data request.".to_string(),
            input_schema: tool_schema! {
                required: ["table_id"],
                properties: {
                    table_id: table_id_arg!(),
                    selection: selection_arg!(SELECTION_HELP),
                    language: language_arg!(),
                    max_records: schema_integer!("Return at most this many records; the summary still covers all", minimum: 1, maximum: 1000000)
                }
            },
        },
        Tool {
            name: "scb_preview_data".to_string(),
            description: "Preview a few rows of a table. Dimensions not in the selection are limited to their first category.".to_string(),
            input_schema: tool_schema! {
                required: ["table_id"],
                properties: {
                    table_id: table_id_arg!(),
                    selection: selection_arg!(SELECTION_HELP),
                    language: language_arg!(),
                    rows: schema_integer!("Rows to return", default: DEFAULT_PREVIEW_ROWS, minimum: 1, maximum: MAX_PREVIEW_ROWS)
                }
            },
        },
        Tool {
            name: "scb_get_api_status".to_string(),
            description: "Get the statistics API's configuration (version, languages, cell limit, call quota) and current quota usage.".to_string(),
            input_schema: tool_schema! {
                required: [],
                properties: {}
            },
        },
        Tool {
            name: "scb_check_usage".to_string(),
            description: "Report how many calls are left in the current quota window. Does not call the API.".to_string(),
            input_schema: tool_schema! {
                required: [],
                properties: {}
            },
        },
        Tool {
            name: "scb_search_regions".to_string(),
            description: "Fuzzy search for Swedish regions (country, counties, municipalities) by name. Tolerates misspellings and missing å/ä/ö.".to_string(),
            input_schema: tool_schema! {
                required: ["query"],
                properties: {
                    query: schema_string!("Region name or part of one, e.g. 'Goteborg'"),
                    limit: schema_integer!("Maximum matches", default: types::DEFAULT_REGION_LIMIT, minimum: 1, maximum: 100),
                    language: language_arg!()
                }
            },
        },
        Tool {
            name: "scb_find_region_code".to_string(),
            description: "Look up the code of a region by its exact name, e.g. 'Stockholm' or 'Uppsala län'. Returns every match with its type.".to_string(),
            input_schema: tool_schema! {
                required: ["name"],
                properties: {
                    name: schema_string!("Region name"),
                    language: language_arg!()
                }
            },
        },
        Tool {
            name: "scb_browse_folders".to_string(),
            description: "Browse the subject folder tree. Not supported by API v2; always reports the feature as unavailable.".to_string(),
            input_schema: tool_schema! {
                required: [],
                properties: {
                    folder_id: schema_string!("Folder id")
                }
            },
        },
    ]
}

/// Execute a tool by name.
pub async fn execute_tool(
    name: &str,
    arguments: Option<JsonValue>,
    service: &ScbService,
) -> McpResult<CallToolResult> {
    match name {
        "scb_search_tables" => execute_search_tables(arguments, service).await,
        "scb_get_table_info" => execute_get_table_info(arguments, service).await,
        "scb_get_table_metadata" => execute_get_table_metadata(arguments, service).await,
        "scb_get_table_variables" => execute_get_table_variables(arguments, service).await,
        "scb_validate_selection" => execute_validate_selection(arguments, service).await,
        "scb_get_table_data" => execute_get_table_data(arguments, service).await,
        "scb_preview_data" => execute_preview_data(arguments, service).await,
        "scb_get_api_status" => execute_get_api_status(service).await,
        "scb_check_usage" => execute_check_usage(service),
        "scb_search_regions" => execute_search_regions(arguments, service).await,
        "scb_find_region_code" => execute_find_region_code(arguments, service).await,
        "scb_browse_folders" => execute_browse_folders(arguments),
        _ => Err(McpError::ToolNotFound(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_tools_returns_all_tools() {
        let tools = get_tools();
        assert_eq!(tools.len(), 12);

        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"scb_search_tables"));
        assert!(names.contains(&"scb_validate_selection"));
        assert!(names.contains(&"scb_get_table_data"));
        assert!(names.contains(&"scb_preview_data"));
        assert!(names.contains(&"scb_check_usage"));
        assert!(names.contains(&"scb_find_region_code"));
        assert!(names.contains(&"scb_browse_folders"));
    }

    #[test]
    fn test_tool_names_are_unique() {
        let tools = get_tools();
        let mut names: Vec<_> = tools.iter().map(|t| t.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), tools.len());
    }

    #[test]
    fn test_tool_descriptions_not_empty() {
        for tool in &get_tools() {
            assert!(
                !tool.description.is_empty(),
                "Tool {} has empty description",
                tool.name
            );
        }
    }

    #[test]
    fn test_tool_schemas_valid() {
        for tool in &get_tools() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(tool.input_schema["properties"].is_object(), "{}", tool.name);

            let properties = tool.input_schema["properties"].as_object().unwrap();
            for required in tool.input_schema["required"].as_array().unwrap() {
                let key = required.as_str().unwrap();
                assert!(properties.contains_key(key), "{} requires unknown {}", tool.name, key);
            }
        }
    }

    #[test]
    fn test_preview_schema_bounds() {
        let tools = get_tools();
        let preview = tools.iter().find(|t| t.name == "scb_preview_data").unwrap();
        let rows = &preview.input_schema["properties"]["rows"];
        assert_eq!(rows["default"], 10);
        assert_eq!(rows["maximum"], 50);
    }
}
