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

//! Flattening of JSON-stat2 datasets into labeled records.
//!
//! A dataset's `value` array is row-major over `id`, last axis fastest. Flat
//! index `i` maps to per-axis ordinals by mixed-radix decomposition over
//! `size`; each ordinal is then looked up in the axis' inverted category
//! index. Every cell becomes one record, nulls included.

use crate::error::{ScbError, ScbResult};
use crate::model::{Dataset, Role};
use crate::selection::Selection;
use crate::synonyms::base_name;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tracing::debug;

/// Key holding the cell value in every record.
pub const VALUE_KEY: &str = "value";

/// One flattened cell: `<base>`, `<base>_code` per dimension, then `value`.
pub type Record = IndexMap<String, JsonValue>;

/// Per-axis ordinals of flat index `flat`, or `None` when out of range.
pub fn decompose(flat: usize, size: &[usize]) -> Option<Vec<usize>> {
    let mut coords = vec![0; size.len()];
    decompose_into(flat, size, &mut coords).then_some(coords)
}

/// Allocation-free form of [`decompose`]. `coords` must have one slot per
/// axis; returns `false` when `flat` is out of range.
pub fn decompose_into(flat: usize, size: &[usize], coords: &mut [usize]) -> bool {
    debug_assert_eq!(size.len(), coords.len());
    let mut rest = flat;
    for (slot, &radix) in coords.iter_mut().zip(size).rev() {
        if radix == 0 {
            return false;
        }
        *slot = rest % radix;
        rest /= radix;
    }
    rest == 0
}

/// Flat index of per-axis ordinals; the inverse of [`decompose`].
pub fn encode(coords: &[usize], size: &[usize]) -> Option<usize> {
    if coords.len() != size.len() {
        return None;
    }
    coords.iter().zip(size).try_fold(0_usize, |acc, (&c, &radix)| {
        if c >= radix {
            return None;
        }
        acc.checked_mul(radix)?.checked_add(c)
    })
}

#[derive(Debug, Clone, Default)]
pub struct FlattenOptions {
    /// Keep at most this many records; the summary still covers every cell.
    pub max_records: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryEcho {
    pub table_id: String,
    /// The selection as the caller wrote it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
    /// The selection sent upstream, when it differs from the caller's.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_selection: Option<Selection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionInfo {
    pub code: String,
    pub label: String,
    pub base_name: String,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    pub dimensions: Vec<DimensionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_records: usize,
    pub returned_records: usize,
    pub truncated: bool,
    pub dimensions: Vec<String>,
    pub null_count: usize,
    pub numeric_count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

/// A dataset reshaped for analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredData {
    pub query: QueryEcho,
    pub data: Vec<Record>,
    pub metadata: DatasetMetadata,
    pub summary: Summary,
}

/// Record keys for each axis. Base names that collide with [`VALUE_KEY`],
/// with each other, or with another axis' `_code` key fall back to the raw
/// dimension code.
pub fn record_keys(dataset: &Dataset) -> Vec<String> {
    let bases: Vec<String> = dataset
        .id
        .iter()
        .map(|code| base_name(code, Some(dataset)))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for base in &bases {
        *counts.entry(base.as_str()).or_default() += 1;
    }

    let clashes = |base: &str| {
        base == VALUE_KEY
            || counts.get(base).copied().unwrap_or(0) > 1
            || bases.iter().any(|other| format!("{}_code", other) == base)
    };

    dataset
        .id
        .iter()
        .zip(&bases)
        .map(|(code, base)| {
            if clashes(base) {
                code.clone()
            } else {
                base.clone()
            }
        })
        .collect()
}

/// Flatten `dataset` into records.
///
/// `table_id` is echoed as given; dimension codes and dataset labels are
/// never used in its place. Datasets that break the axis invariants are
/// rejected whole.
pub fn transform_to_structured_data(
    dataset: &Dataset,
    table_id: &str,
    selection: Option<&Selection>,
    options: &FlattenOptions,
) -> ScbResult<StructuredData> {
    let axes = dataset.axis_tables()?;
    if dataset.value.is_none() {
        return Err(ScbError::InvalidDataset(
            "dataset carries no values".to_string(),
        ));
    }
    let values = dataset.dense_values()?;
    let keys = record_keys(dataset);

    let labels: Vec<Vec<JsonValue>> = dataset
        .dimensions()
        .zip(&axes)
        .map(|((_, dim), codes)| {
            codes
                .iter()
                .map(|c| JsonValue::String(dim.category.label_of(c).to_string()))
                .collect()
        })
        .collect();
    let code_keys: Vec<String> = keys.iter().map(|k| format!("{}_code", k)).collect();

    let total = values.len();
    let limit = options.max_records.map_or(total, |m| m.min(total));
    let mut data = Vec::with_capacity(limit);
    let mut coords = vec![0; dataset.size.len()];

    for (flat, value) in values.iter().take(limit).enumerate() {
        if !decompose_into(flat, &dataset.size, &mut coords) {
            return Err(ScbError::InvalidDataset(format!(
                "cell {} outside the dataset shape",
                flat
            )));
        }
        let mut record = Record::with_capacity(keys.len() * 2 + 1);
        for (axis, &ordinal) in coords.iter().enumerate() {
            record.insert(keys[axis].clone(), labels[axis][ordinal].clone());
            record.insert(
                code_keys[axis].clone(),
                JsonValue::String(axes[axis][ordinal].clone()),
            );
        }
        record.insert(VALUE_KEY.to_string(), cell_json(*value));
        data.push(record);
    }

    let summary = summarize(&values, limit, keys.clone());
    debug!(
        "flattened {}: {} of {} records, {} nulls",
        table_id, summary.returned_records, summary.total_records, summary.null_count
    );

    let dimensions = dataset
        .dimensions()
        .zip(&keys)
        .zip(&dataset.size)
        .map(|(((code, dim), key), &size)| DimensionInfo {
            code: code.to_string(),
            label: dim.label_or(code).to_string(),
            base_name: key.clone(),
            size,
        })
        .collect();

    Ok(StructuredData {
        query: QueryEcho {
            table_id: table_id.to_string(),
            selection: selection.cloned(),
            translated_selection: None,
        },
        data,
        metadata: DatasetMetadata {
            label: dataset.label.clone(),
            source: dataset.source.clone(),
            updated: dataset.updated.clone(),
            dimensions,
            notes: dataset.note.clone(),
            role: dataset.role.clone(),
            extension: dataset.extension.clone(),
        },
        summary,
    })
}

fn cell_json(value: Option<f64>) -> JsonValue {
    // Non-finite numbers have no JSON form and become null as well.
    value.map_or(JsonValue::Null, JsonValue::from)
}

fn summarize(values: &[Option<f64>], returned: usize, dimensions: Vec<String>) -> Summary {
    let numbers: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    let numeric_count = numbers.len();
    let (min, max, mean) = if numbers.is_empty() {
        (None, None, None)
    } else {
        let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = numbers.iter().sum::<f64>() / numeric_count as f64;
        (Some(min), Some(max), Some(mean))
    };

    Summary {
        total_records: values.len(),
        returned_records: returned,
        truncated: returned < values.len(),
        dimensions,
        null_count: values.len() - numeric_count,
        numeric_count,
        min,
        max,
        mean,
    }
}
