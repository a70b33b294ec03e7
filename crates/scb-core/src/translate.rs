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

//! Translation of human-friendly names to upstream codes, and validation
//! of a selection against a table's metadata.
//!
//! Translation never fails: a name that cannot be resolved is returned
//! unchanged and left for validation to report.

use crate::matching::{fold, rank};
use crate::model::{Dataset, Dimension};
use crate::selection::{is_expression, Selection, ValueSelection};
use crate::synonyms::{base_name, dimension_alias, resolve_alias, value_aliases};
use serde::Serialize;
use tracing::debug;

/// Default number of valid values offered for an invalid one.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;

/// Resolve a caller-supplied variable name to a dimension code of
/// `metadata`.
///
/// Precedence: code (case-insensitive), label (case-insensitive), bilingual
/// alias table. Unresolved names are returned unchanged.
pub fn translate_variable_name(name: &str, metadata: &Dataset) -> String {
    let folded = fold(name);

    if let Some(code) = metadata.id.iter().find(|c| fold(c) == folded) {
        return code.clone();
    }

    if let Some((code, _)) = metadata
        .dimensions()
        .find(|(_, d)| d.label.as_deref().is_some_and(|l| fold(l) == folded))
    {
        return code.to_string();
    }

    if let Some(code) = dimension_alias(name).and_then(|alias| resolve_alias(alias, metadata)) {
        return code.to_string();
    }

    name.to_string()
}

/// Resolve a caller-supplied category name within `dimension_code`.
///
/// Precedence: exact code, code ignoring case, label (case-insensitive,
/// also with a leading code stripped, as in `"0180 Stockholm"`), alias
/// table. Unresolved values are returned unchanged.
pub fn translate_value(dimension_code: &str, value: &str, metadata: &Dataset) -> String {
    let Some(dimension) = metadata.dimension(dimension_code) else {
        return value.to_string();
    };
    let category = &dimension.category;

    if category.contains(value) {
        return value.to_string();
    }

    let folded = fold(value);
    let codes = category.codes();

    if let Some(code) = codes.iter().find(|c| fold(c) == folded) {
        return code.clone();
    }

    if let Some(code) = codes.iter().find(|c| label_matches(category.label_of(c), c, &folded)) {
        return code.clone();
    }

    let base = base_name(dimension_code, Some(metadata));
    for alias in value_aliases(&base, value) {
        if let Some(code) = alias.codes.iter().find(|c| category.contains(c)) {
            return code.to_string();
        }
        let by_label = codes.iter().find(|c| {
            let label = fold(category.label_of(c));
            alias.label_prefixes.iter().any(|p| label.starts_with(p))
        });
        if let Some(code) = by_label {
            return code.clone();
        }
    }

    value.to_string()
}

fn label_matches(label: &str, code: &str, folded_query: &str) -> bool {
    let label = fold(label);
    if label == folded_query {
        return true;
    }
    let folded_code = fold(code);
    label
        .strip_prefix(&folded_code)
        .map(str::trim_start)
        .is_some_and(|rest| rest == folded_query)
}

/// Limits applied while validating.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    pub max_suggestions: usize,
    /// Upstream cell limit per request, if known.
    pub max_cells: Option<u64>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            max_cells: None,
        }
    }
}

/// A name that was rewritten during translation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    /// `"variable"` or `"value"`.
    pub kind: &'static str,
    pub dimension: String,
    pub from: String,
    pub to: String,
}

/// Outcome of validating a selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub suggestions: Vec<String>,
    pub warnings: Vec<String>,
    /// Fully resolved selection, present only when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_selection: Option<Selection>,
    pub translations: Vec<Translation>,
    pub unspecified_dimensions: Vec<String>,
    pub estimated_cells: u64,
}

impl ValidationReport {
    pub fn error_summary(&self) -> String {
        match self.errors.len() {
            0 => "selection is valid".to_string(),
            1 => self.errors[0].clone(),
            n => format!("{} problems found; first: {}", n, self.errors[0]),
        }
    }
}

/// Validate and translate `selection` against a table's metadata.
pub fn validate_selection(
    metadata: &Dataset,
    selection: &Selection,
    options: &ValidationOptions,
) -> ValidationReport {
    let mut errors = Vec::new();
    let mut suggestions = Vec::new();
    let mut warnings = Vec::new();
    let mut translations = Vec::new();
    let mut translated = Selection::new();

    for (name, requested) in selection.iter() {
        let code = translate_variable_name(name, metadata);

        let Some(dimension) = metadata.dimension(&code) else {
            errors.push(format!("Unknown variable '{}'", name));
            suggest_dimension(metadata, name, requested, options, &mut suggestions);
            continue;
        };

        if code != *name {
            translations.push(Translation {
                kind: "variable",
                dimension: code.clone(),
                from: name.clone(),
                to: code.clone(),
            });
        }

        if translated.contains(&code) {
            errors.push(format!(
                "Variable '{}' is given more than once (as '{}')",
                code, name
            ));
            continue;
        }

        let values = match requested {
            ValueSelection::All => ValueSelection::All,
            ValueSelection::Values(values) if values.is_empty() => {
                errors.push(format!("No values given for variable '{}'", code));
                suggestions.push(sample_values(&code, dimension, options.max_suggestions));
                continue;
            }
            ValueSelection::Values(values) => {
                let mut resolved: Vec<String> = Vec::with_capacity(values.len());
                for value in values {
                    if is_expression(value) {
                        push_unique(&mut resolved, value.clone());
                        continue;
                    }
                    let code_value = translate_value(&code, value, metadata);
                    if dimension.category.contains(&code_value) {
                        if code_value != *value {
                            translations.push(Translation {
                                kind: "value",
                                dimension: code.clone(),
                                from: value.clone(),
                                to: code_value.clone(),
                            });
                        }
                        push_unique(&mut resolved, code_value);
                    } else {
                        errors.push(format!(
                            "Invalid value '{}' for variable '{}'",
                            value, code
                        ));
                        suggest_values(&code, dimension, value, options, &mut suggestions);
                    }
                }
                ValueSelection::Values(resolved)
            }
        };

        translated.insert(code, values);
    }

    let unspecified_dimensions: Vec<String> = metadata
        .id
        .iter()
        .filter(|code| !translated.contains(code))
        .cloned()
        .collect();

    for code in &unspecified_dimensions {
        if let Some(dim) = metadata.dimension(code) {
            if !dim.is_eliminable() {
                warnings.push(format!(
                    "Variable '{}' ({}) is mandatory and was not selected; the table's default values will be used",
                    code,
                    dim.label_or(code)
                ));
            }
        }
    }

    let estimated_cells = estimate_cells(metadata, &translated);
    if let Some(max) = options.max_cells {
        if estimated_cells > max {
            errors.push(format!(
                "Selection would return about {} cells, above the limit of {}",
                estimated_cells, max
            ));
            suggestions.push(
                "Narrow the selection: pick fewer values or use top(n) on the time variable"
                    .to_string(),
            );
        }
    }

    let is_valid = errors.is_empty();
    debug!(
        "validated selection: {} variables, {} errors, ~{} cells",
        selection.len(),
        errors.len(),
        estimated_cells
    );

    ValidationReport {
        is_valid,
        errors,
        suggestions,
        warnings,
        translated_selection: is_valid.then_some(translated),
        translations,
        unspecified_dimensions,
        estimated_cells,
    }
}

/// Upper-bound cell estimate. Wildcards and expressions count the full
/// category set; unselected dimensions count 1 when they can be eliminated
/// and their full size otherwise.
pub fn estimate_cells(metadata: &Dataset, selection: &Selection) -> u64 {
    metadata
        .dimensions()
        .map(|(code, dim)| {
            let full = dim.category.len() as u64;
            match selection.get(code) {
                Some(ValueSelection::All) => full,
                Some(ValueSelection::Values(values)) => {
                    if values.iter().any(|v| is_expression(v)) {
                        full
                    } else {
                        values.len() as u64
                    }
                }
                None if dim.is_eliminable() => 1,
                None => full,
            }
        })
        .fold(1_u64, |acc, n| acc.saturating_mul(n.max(1)))
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

fn suggest_dimension(
    metadata: &Dataset,
    name: &str,
    requested: &ValueSelection,
    options: &ValidationOptions,
    suggestions: &mut Vec<String>,
) {
    let candidates: Vec<(&str, &Dimension)> = metadata.dimensions().collect();
    let ranked = rank(name, candidates, |(code, dim)| {
        let mut names = vec![code.to_string()];
        if let Some(label) = &dim.label {
            names.push(label.clone());
        }
        names
    });

    match ranked.first() {
        Some(best) => {
            let (code, dim) = best.item;
            suggestions.push(format!(
                "Did you mean variable '{}' ({}) instead of '{}'?",
                code,
                dim.label_or(code),
                name
            ));
            // Check the values against the likely dimension too, so the
            // caller can fix both in one round trip.
            if let ValueSelection::Values(values) = requested {
                for value in values.iter().filter(|v| !is_expression(v)) {
                    let resolved = translate_value(code, value, metadata);
                    if !dim.category.contains(&resolved) {
                        suggest_values(code, dim, value, options, suggestions);
                    }
                }
            }
        }
        None => {
            let available: Vec<String> = metadata
                .dimensions()
                .map(|(code, dim)| format!("{} ({})", code, dim.label_or(code)))
                .collect();
            suggestions.push(format!("Available variables: {}", available.join(", ")));
        }
    }
}

fn suggest_values(
    code: &str,
    dimension: &Dimension,
    value: &str,
    options: &ValidationOptions,
    suggestions: &mut Vec<String>,
) {
    let category = &dimension.category;
    let ranked = rank(value, category.codes(), |c| {
        vec![c.clone(), category.label_of(c).to_string()]
    });

    if ranked.is_empty() {
        suggestions.push(sample_values(code, dimension, options.max_suggestions));
        return;
    }

    for candidate in ranked.iter().take(options.max_suggestions) {
        suggestions.push(format!(
            "For '{}' in '{}', did you mean '{}' ({})?",
            value,
            code,
            candidate.item,
            category.label_of(&candidate.item)
        ));
    }
}

fn sample_values(code: &str, dimension: &Dimension, limit: usize) -> String {
    let category = &dimension.category;
    let samples: Vec<String> = category
        .codes()
        .into_iter()
        .take(limit)
        .map(|c| format!("{} ({})", c, category.label_of(&c)))
        .collect();
    format!(
        "Valid values for '{}' include: {}{}",
        code,
        samples.join(", "),
        if category.len() > limit { ", ..." } else { "" }
    )
}
