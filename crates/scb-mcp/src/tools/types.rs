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

//! Argument structures for the tools.

use scb_core::Selection;
use serde::Deserialize;

/// Largest preview the preview tool will return.
pub const MAX_PREVIEW_ROWS: usize = 50;

pub const DEFAULT_PREVIEW_ROWS: usize = 10;

pub const DEFAULT_REGION_LIMIT: usize = 10;

/// Categories listed per variable unless all are requested.
pub const DEFAULT_VALUE_SAMPLE: usize = 10;

// ============ Argument Structures ============

#[derive(Debug, Deserialize)]
pub struct SearchTablesArgs {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub language: Option<String>,
    /// Only tables updated within this many days.
    #[serde(default)]
    pub past_days: Option<u32>,
    #[serde(default)]
    pub include_discontinued: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct TableArgs {
    pub table_id: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VariablesArgs {
    pub table_id: String,
    #[serde(default)]
    pub language: Option<String>,
    /// Restrict the listing to one variable (code, label or alias).
    #[serde(default)]
    pub variable: Option<String>,
    #[serde(default)]
    pub show_all_values: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectionArgs {
    pub table_id: String,
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DataArgs {
    pub table_id: String,
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub max_records: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewArgs {
    pub table_id: String,
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "default_preview_rows")]
    pub rows: usize,
}

#[derive(Debug, Deserialize)]
pub struct RegionSearchArgs {
    pub query: String,
    #[serde(default = "default_region_limit")]
    pub limit: usize,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FindRegionArgs {
    pub name: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BrowseFoldersArgs {
    #[serde(default)]
    pub folder_id: Option<String>,
}

// ============ Default Value Functions ============

fn default_page_size() -> u32 {
    20
}

fn default_preview_rows() -> usize {
    DEFAULT_PREVIEW_ROWS
}

fn default_region_limit() -> usize {
    DEFAULT_REGION_LIMIT
}
