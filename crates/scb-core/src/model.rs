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

//! Upstream payload types: table listings, API configuration and the
//! JSON-stat2 dataset used for both metadata and data responses.

use crate::error::{ScbError, ScbResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

// ============ Table listing ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hreflang: Option<String>,
    pub href: String,
}

/// One entry of a table search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variable_names: Vec<String>,
    #[serde(default)]
    pub discontinued: Option<bool>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
}

/// Response of the table search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableList {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub tables: Vec<TableSummary>,
    #[serde(default)]
    pub page: PageInfo,
}

// ============ API configuration ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

/// Self-reported configuration of the upstream API, including its quota.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    #[serde(default)]
    pub api_name: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub default_language: Option<String>,
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub max_data_cells: Option<u64>,
    #[serde(default)]
    pub max_calls_per_time_window: Option<u32>,
    /// Window length in seconds.
    #[serde(default)]
    pub time_window: Option<u64>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub default_data_format: Option<String>,
    #[serde(default)]
    pub data_formats: Vec<String>,
}

// ============ JSON-stat2 ============

/// Category index in either of the two JSON-stat2 encodings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryIndex {
    /// `{ "code": ordinal, ... }`
    Map(IndexMap<String, usize>),
    /// `[ "code", ... ]`, ordinal is the array position.
    List(Vec<String>),
}

impl Default for CategoryIndex {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub index: CategoryIndex,
    #[serde(default)]
    pub label: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<JsonValue>,
}

impl Category {
    pub fn len(&self) -> usize {
        match &self.index {
            CategoryIndex::Map(m) => m.len(),
            CategoryIndex::List(l) => l.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ordinal position of a category code.
    pub fn position(&self, code: &str) -> Option<usize> {
        match &self.index {
            CategoryIndex::Map(m) => m.get(code).copied(),
            CategoryIndex::List(l) => l.iter().position(|c| c == code),
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.position(code).is_some()
    }

    /// Display label, falling back to the code.
    pub fn label_of<'a>(&'a self, code: &'a str) -> &'a str {
        self.label.get(code).map(String::as_str).unwrap_or(code)
    }

    /// Category codes ordered by ordinal position.
    ///
    /// For a map index the ordinals are assumed dense; call
    /// [`Category::ordinal_table`] first when that has not been checked.
    pub fn codes(&self) -> Vec<String> {
        match &self.index {
            CategoryIndex::List(l) => l.clone(),
            CategoryIndex::Map(m) => {
                let mut pairs: Vec<(&String, usize)> = m.iter().map(|(c, i)| (c, *i)).collect();
                pairs.sort_by_key(|(_, i)| *i);
                pairs.into_iter().map(|(c, _)| c.clone()).collect()
            }
        }
    }

    /// Invert the index into an ordinal -> code table, checking that the
    /// ordinals form a permutation of `0..expected`.
    pub fn ordinal_table(&self, dimension: &str, expected: usize) -> ScbResult<Vec<String>> {
        if self.len() != expected {
            return Err(ScbError::InvalidDataset(format!(
                "dimension '{}' declares size {} but has {} categories",
                dimension,
                expected,
                self.len()
            )));
        }

        match &self.index {
            CategoryIndex::List(l) => Ok(l.clone()),
            CategoryIndex::Map(m) => {
                let mut table: Vec<Option<String>> = vec![None; expected];
                for (code, &ordinal) in m {
                    let slot = table.get_mut(ordinal).ok_or_else(|| {
                        ScbError::InvalidDataset(format!(
                            "category '{}' of dimension '{}' has ordinal {} outside 0..{}",
                            code, dimension, ordinal, expected
                        ))
                    })?;
                    if slot.is_some() {
                        return Err(ScbError::InvalidDataset(format!(
                            "dimension '{}' repeats ordinal {}",
                            dimension, ordinal
                        )));
                    }
                    *slot = Some(code.clone());
                }
                // Length matched and no slot was reused, so every slot is filled.
                Ok(table.into_iter().flatten().collect())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<JsonValue>,
}

impl Dimension {
    pub fn label_or<'a>(&'a self, code: &'a str) -> &'a str {
        self.label.as_deref().unwrap_or(code)
    }

    /// Whether the dimension may be left out of a selection. The upstream
    /// marks mandatory dimensions with `extension.elimination = false`.
    pub fn is_eliminable(&self) -> bool {
        self.extension
            .as_ref()
            .and_then(|e| e.get("elimination"))
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub geo: Vec<String>,
    #[serde(default)]
    pub metric: Vec<String>,
}

/// Cell values, dense or sparse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Values {
    Dense(Vec<Option<f64>>),
    Sparse(BTreeMap<String, Option<f64>>),
}

impl Default for Values {
    fn default() -> Self {
        Self::Dense(Vec::new())
    }
}

/// A JSON-stat2 dataset. Metadata responses use the same shape with no
/// values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    pub id: Vec<String>,
    pub size: Vec<usize>,
    pub dimension: IndexMap<String, Dimension>,
    #[serde(default)]
    pub value: Option<Values>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<JsonValue>,
}

impl Dataset {
    /// Parse a JSON body into a dataset, reporting shape problems as
    /// `InvalidDataset`.
    pub fn from_json(value: JsonValue) -> ScbResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| ScbError::InvalidDataset(format!("not a JSON-stat2 dataset: {}", e)))
    }

    pub fn dimension(&self, code: &str) -> Option<&Dimension> {
        self.dimension.get(code)
    }

    /// Dimensions in axis order.
    pub fn dimensions(&self) -> impl Iterator<Item = (&str, &Dimension)> {
        self.id
            .iter()
            .filter_map(|code| self.dimension.get(code).map(|d| (code.as_str(), d)))
    }

    /// Total number of cells described by `size`.
    pub fn cell_count(&self) -> usize {
        self.size.iter().product()
    }

    pub fn is_time_dimension(&self, code: &str) -> bool {
        self.role.as_ref().is_some_and(|r| r.time.iter().any(|c| c == code))
    }

    pub fn is_geo_dimension(&self, code: &str) -> bool {
        self.role.as_ref().is_some_and(|r| r.geo.iter().any(|c| c == code))
    }

    pub fn is_metric_dimension(&self, code: &str) -> bool {
        self.role.as_ref().is_some_and(|r| r.metric.iter().any(|c| c == code))
    }

    /// Check the axis invariants and return, per axis, the ordinal -> code
    /// table.
    pub fn axis_tables(&self) -> ScbResult<Vec<Vec<String>>> {
        if self.id.len() != self.size.len() {
            return Err(ScbError::InvalidDataset(format!(
                "id has {} entries but size has {}",
                self.id.len(),
                self.size.len()
            )));
        }

        self.id
            .iter()
            .zip(&self.size)
            .map(|(code, &size)| {
                let dim = self.dimension.get(code).ok_or_else(|| {
                    ScbError::InvalidDataset(format!("dimension '{}' listed in id is not described", code))
                })?;
                dim.category.ordinal_table(code, size)
            })
            .collect()
    }

    /// Cell values as a dense vector of `cell_count()` entries. Sparse
    /// values are expanded with nulls.
    pub fn dense_values(&self) -> ScbResult<Vec<Option<f64>>> {
        let expected = self.cell_count();
        match &self.value {
            None => Ok(Vec::new()),
            Some(Values::Dense(values)) => {
                if values.len() != expected {
                    return Err(ScbError::InvalidDataset(format!(
                        "value has {} cells but size describes {}",
                        values.len(),
                        expected
                    )));
                }
                Ok(values.clone())
            }
            Some(Values::Sparse(cells)) => {
                let mut dense = vec![None; expected];
                for (key, value) in cells {
                    let index: usize = key.parse().map_err(|_| {
                        ScbError::InvalidDataset(format!("sparse value key '{}' is not an index", key))
                    })?;
                    let slot = dense.get_mut(index).ok_or_else(|| {
                        ScbError::InvalidDataset(format!(
                            "sparse value index {} outside 0..{}",
                            index, expected
                        ))
                    })?;
                    *slot = *value;
                }
                Ok(dense)
            }
        }
    }
}
