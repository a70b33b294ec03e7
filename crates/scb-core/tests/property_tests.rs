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

//! Property-based tests for mixed-radix indexing and flattening.
//!
//! # Properties Tested
//!
//! 1. **Inverse**: `encode(decompose(i)) == i` for every in-range index
//! 2. **Bounds**: every decomposed ordinal is below its axis size
//! 3. **Cardinality**: flattening yields exactly `product(size)` records
//! 4. **Null Preservation**: null cells stay null, never zero

use proptest::prelude::*;
use scb_core::{decompose, encode, transform_to_structured_data, Dataset, FlattenOptions};
use serde_json::{json, Map, Value as JsonValue};

fn dataset_with_shape(size: &[usize], values: Vec<Option<f64>>) -> Dataset {
    let ids: Vec<String> = (0..size.len()).map(|i| format!("D{}", i)).collect();
    let mut dimension = Map::new();
    for (id, &n) in ids.iter().zip(size) {
        let index: Vec<String> = (0..n).map(|c| format!("c{}", c)).collect();
        dimension.insert(id.clone(), json!({ "category": { "index": index } }));
    }
    Dataset::from_json(json!({
        "id": ids,
        "size": size,
        "dimension": dimension,
        "value": values
    }))
    .unwrap()
}

fn shape() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1_usize..6, 1..5)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Property: encoding a decomposed index gives the index back.
    #[test]
    fn prop_decompose_encode_inverse(size in shape(), seed in any::<usize>()) {
        let total: usize = size.iter().product();
        let flat = seed % total;

        let coords = decompose(flat, &size).unwrap();
        prop_assert_eq!(coords.len(), size.len());
        for (c, s) in coords.iter().zip(&size) {
            prop_assert!(c < s);
        }
        prop_assert_eq!(encode(&coords, &size), Some(flat));
    }

    /// Property: indexes past the last cell have no coordinates.
    #[test]
    fn prop_decompose_out_of_range(size in shape(), extra in 0_usize..100) {
        let total: usize = size.iter().product();
        prop_assert_eq!(decompose(total + extra, &size), None);
    }

    /// Property: one record per cell, nulls preserved.
    #[test]
    fn prop_flatten_cardinality(
        size in shape(),
        mask in prop::collection::vec(any::<bool>(), 625)
    ) {
        let total: usize = size.iter().product();
        let values: Vec<Option<f64>> = (0..total)
            .map(|i| if mask[i % mask.len()] { Some(i as f64) } else { None })
            .collect();
        let expected_nulls = values.iter().filter(|v| v.is_none()).count();

        let ds = dataset_with_shape(&size, values);
        let out = transform_to_structured_data(&ds, "TAB1", None, &FlattenOptions::default()).unwrap();

        prop_assert_eq!(out.data.len(), total);
        prop_assert_eq!(out.summary.total_records, total);
        prop_assert_eq!(out.summary.null_count, expected_nulls);

        let null_records = out.data.iter().filter(|r| r["value"] == JsonValue::Null).count();
        prop_assert_eq!(null_records, expected_nulls);
    }
}
