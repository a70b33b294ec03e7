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

//! Declarative macros for JSON schema generation.
//!
//! Tool input schemas are built from these so that the shape of common
//! arguments (table ids, languages, selections) is declared once.
//!
//! ```text
//! let schema = tool_schema! {
//!     required: ["table_id"],
//!     properties: {
//!         table_id: table_id_arg!(),
//!         language: language_arg!(),
//!         max_records: schema_integer!("Maximum records to return", minimum: 1, maximum: 100000)
//!     }
//! };
//! ```

/// Generate a JSON schema object with type "string" and description.
#[macro_export]
macro_rules! schema_string {
    ($description:expr) => {
        serde_json::json!({
            "type": "string",
            "description": $description
        })
    };
}

/// Generate a JSON schema object with type "boolean" and optional default.
#[macro_export]
macro_rules! schema_bool {
    ($description:expr) => {
        serde_json::json!({
            "type": "boolean",
            "description": $description
        })
    };
    ($description:expr, default: $default:expr) => {
        serde_json::json!({
            "type": "boolean",
            "description": $description,
            "default": $default
        })
    };
}

/// Generate a JSON schema object with type "integer" and optional constraints.
///
/// ```text
/// schema_integer!("Page number")
/// schema_integer!("Rows", minimum: 1, maximum: 50)
/// schema_integer!("Rows", default: 10, minimum: 1, maximum: 50)
/// ```
#[macro_export]
macro_rules! schema_integer {
    ($description:expr) => {
        serde_json::json!({
            "type": "integer",
            "description": $description
        })
    };
    ($description:expr, minimum: $min:expr, maximum: $max:expr) => {
        serde_json::json!({
            "type": "integer",
            "description": $description,
            "minimum": $min,
            "maximum": $max
        })
    };
    ($description:expr, default: $default:expr, minimum: $min:expr, maximum: $max:expr) => {
        serde_json::json!({
            "type": "integer",
            "description": $description,
            "default": $default,
            "minimum": $min,
            "maximum": $max
        })
    };
}

/// Generate a JSON schema object with string enum constraints.
#[macro_export]
macro_rules! schema_enum {
    ([$($variant:expr),+ $(,)?], $description:expr) => {
        serde_json::json!({
            "type": "string",
            "enum": [$($variant),+],
            "description": $description
        })
    };
    ([$($variant:expr),+ $(,)?], $description:expr, default: $default:expr) => {
        serde_json::json!({
            "type": "string",
            "enum": [$($variant),+],
            "description": $description,
            "default": $default
        })
    };
}

/// Generate a complete tool schema with properties and required fields.
/// Tools without arguments pass an empty property list.
#[macro_export]
macro_rules! tool_schema {
    (
        required: [$($req:expr),* $(,)?],
        properties: {
            $($field:ident: $schema:expr),* $(,)?
        }
    ) => {
        serde_json::json!({
            "type": "object",
            "properties": {
                $(stringify!($field): $schema),*
            },
            "required": [$($req),*]
        })
    };
}

/// Schema for the table id argument.
#[macro_export]
macro_rules! table_id_arg {
    () => {
        $crate::schema_string!("Table id, e.g. 'TAB638'")
    };
    ($description:expr) => {
        $crate::schema_string!($description)
    };
}

/// Schema for the response language argument.
#[macro_export]
macro_rules! language_arg {
    () => {
        $crate::schema_enum!(
            ["en", "sv"],
            "Response language. Defaults to the server's configured language"
        )
    };
}

/// Schema for a selection: dimension name -> category codes or names.
///
/// Values may be an array, a single string, a comma-separated string or
/// `"*"` for every category.
#[macro_export]
macro_rules! selection_arg {
    ($description:expr) => {
        serde_json::json!({
            "type": "object",
            "description": $description,
            "additionalProperties": {
                "oneOf": [
                    { "type": "string" },
                    { "type": "array", "items": { "type": ["string", "integer"] } }
                ]
            }
        })
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_tool_schema_without_properties() {
        let schema = tool_schema! {
            required: [],
            properties: {}
        };
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"].as_object().unwrap().is_empty());
        assert!(schema["required"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_integer_with_default_and_bounds() {
        let schema = schema_integer!("Rows", default: 10, minimum: 1, maximum: 50);
        assert_eq!(schema["default"], 10);
        assert_eq!(schema["maximum"], 50);
    }

    #[test]
    fn test_domain_arguments() {
        let schema = tool_schema! {
            required: ["table_id"],
            properties: {
                table_id: table_id_arg!(),
                language: language_arg!(),
                selection: selection_arg!("Selection")
            }
        };
        assert_eq!(schema["properties"]["table_id"]["type"], "string");
        assert_eq!(schema["properties"]["language"]["enum"][1], "sv");
        assert_eq!(schema["properties"]["selection"]["type"], "object");
        assert_eq!(schema["required"][0], "table_id");
    }
}
