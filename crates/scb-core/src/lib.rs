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

//! Core logic for querying Statistics Sweden's PxWebApi.
//!
//! This crate does no I/O. It holds the upstream data model, the
//! selection translator, the JSON-stat2 reshaper and the call governor;
//! `scb-mcp` wires them to HTTP and the Model Context Protocol.
//!
//! # Selection translation
//!
//! Callers name dimensions and categories the way people do ("kommun",
//! "municipality", "Stockholm", "män"). [`translate`] resolves those names
//! against a table's metadata using a bilingual alias table ([`synonyms`])
//! and reports unknown names with ranked suggestions ([`matching`]).
//!
//! # Reshaping
//!
//! [`reshape`] turns a JSON-stat2 dataset into one record per cell with
//! labels, codes and the value, plus summary statistics.
//!
//! ```
//! use scb_core::{transform_to_structured_data, Dataset, FlattenOptions};
//! use serde_json::json;
//!
//! let dataset = Dataset::from_json(json!({
//!     "id": ["Region", "Tid"],
//!     "size": [1, 2],
//!     "dimension": {
//!         "Region": { "category": { "index": ["0180"], "label": { "0180": "Stockholm" } } },
//!         "Tid": { "category": { "index": ["2022", "2023"] } }
//!     },
//!     "value": [975551, null]
//! }))
//! .unwrap();
//!
//! let out = transform_to_structured_data(&dataset, "TAB638", None, &FlattenOptions::default())
//!     .unwrap();
//! assert_eq!(out.summary.total_records, 2);
//! assert_eq!(out.data[0]["region"], "Stockholm");
//! assert!(out.data[1]["value"].is_null());
//! ```

mod error;
pub mod matching;
pub mod model;
pub mod rate;
pub mod region;
pub mod reshape;
pub mod selection;
pub mod synonyms;
pub mod translate;

pub use error::{ErrorKind, ScbError, ScbResult, UpstreamFailure};
pub use model::{ApiConfig, Category, CategoryIndex, Dataset, Dimension, TableList, TableSummary};
pub use rate::{Admission, RateGovernor, RateLimitState, UsageSnapshot};
pub use region::{find_region_code, region_dimension, search_regions, RegionMatch, RegionType};
pub use reshape::{
    decompose, encode, transform_to_structured_data, FlattenOptions, Record, StructuredData,
};
pub use selection::{Selection, ValueSelection, WILDCARD};
pub use translate::{
    translate_value, translate_variable_name, validate_selection, ValidationOptions,
    ValidationReport,
};
