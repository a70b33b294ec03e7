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

//! Caller-supplied data selections.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// Marker meaning "every category of this dimension".
pub const WILDCARD: &str = "*";

/// Requested categories for one dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSelection {
    /// The wildcard marker. Sent upstream as-is, never expanded.
    All,
    /// Explicit category codes, aliases or upstream value expressions.
    Values(Vec<String>),
}

impl ValueSelection {
    /// Accepts `"*"`, `"a,b"`, `["a", "b"]` and arrays holding numbers
    /// (years are often written as integers).
    pub fn from_json(value: &JsonValue) -> Result<Self, String> {
        let items: Vec<String> = match value {
            JsonValue::String(s) => s
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            JsonValue::Number(n) => vec![n.to_string()],
            JsonValue::Array(arr) => arr
                .iter()
                .map(|v| match v {
                    JsonValue::String(s) => Ok(s.trim().to_string()),
                    JsonValue::Number(n) => Ok(n.to_string()),
                    other => Err(format!("selection values must be strings, got {}", other)),
                })
                .collect::<Result<_, _>>()?,
            other => {
                return Err(format!(
                    "selection entry must be a string or array of strings, got {}",
                    other
                ))
            }
        };

        if items.len() == 1 && items[0] == WILDCARD {
            Ok(Self::All)
        } else {
            Ok(Self::Values(items))
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Codes as sent upstream.
    pub fn codes(&self) -> Vec<String> {
        match self {
            Self::All => vec![WILDCARD.to_string()],
            Self::Values(v) => v.clone(),
        }
    }
}

impl Serialize for ValueSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.codes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ValueSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        Self::from_json(&value).map_err(de::Error::custom)
    }
}

/// Whether a value is an upstream selection expression rather than a
/// category code: `top(n)`, `bottom(n)`, `from(x)`, `to(x)`, `range(x,y)`,
/// or a pattern with `*` / `?`.
pub fn is_expression(value: &str) -> bool {
    let lower = value.trim().to_ascii_lowercase();
    let is_call = ["top(", "bottom(", "from(", "to(", "range("]
        .iter()
        .any(|p| lower.starts_with(p))
        && lower.ends_with(')');
    is_call || (value != WILDCARD && (value.contains('*') || value.contains('?')))
}

/// Dimension -> requested categories, in caller order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(IndexMap<String, ValueSelection>);

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dimension: impl Into<String>, values: ValueSelection) {
        self.0.insert(dimension.into(), values);
    }

    pub fn get(&self, dimension: &str) -> Option<&ValueSelection> {
        self.0.get(dimension)
    }

    pub fn contains(&self, dimension: &str) -> bool {
        self.0.contains_key(dimension)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ValueSelection)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `valuecodes[DIM]=a,b` pairs for a GET data request.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(dim, values)| (format!("valuecodes[{}]", dim), values.codes().join(",")))
            .collect()
    }

    /// Body for a POST data request.
    pub fn to_request_body(&self) -> JsonValue {
        let selection: Vec<JsonValue> = self
            .0
            .iter()
            .map(|(dim, values)| {
                json!({
                    "variableCode": dim,
                    "valueCodes": values.codes()
                })
            })
            .collect();
        json!({ "selection": selection })
    }
}

impl FromIterator<(String, ValueSelection)> for Selection {
    fn from_iter<I: IntoIterator<Item = (String, ValueSelection)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
