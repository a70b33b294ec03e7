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

//! Name folding and closest-match ranking.
//!
//! Ranking is deterministic: names are folded (lower case, diacritics
//! removed via canonical decomposition, whitespace collapsed), then scored with
//! Jaro-Winkler similarity. Exact matches after folding score 1.0, prefix
//! matches 0.95 and substring matches 0.9. Candidates under
//! [`MIN_SIMILARITY`] are dropped and ties are broken by key.

use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowest score a candidate needs to be suggested.
pub const MIN_SIMILARITY: f64 = 0.75;

/// Fold a name for comparison.
pub fn fold(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_space = true;
    let decomposed = s
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase);
    for c in decomposed {
        let mapped = match c {
            // No canonical decomposition
            'ø' => 'o',
            'æ' => 'a',
            '_' | '-' => ' ',
            other => other,
        };
        if mapped.is_whitespace() {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(mapped);
            last_space = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Similarity of two already-folded names in `0.0..=1.0`.
pub fn similarity(query: &str, candidate: &str) -> f64 {
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    // Very short candidates (single-digit codes) would otherwise prefix-match
    // almost any query.
    let reverse = candidate.chars().count() >= 3;
    if query == candidate {
        1.0
    } else if candidate.starts_with(query) || (reverse && query.starts_with(candidate)) {
        0.95
    } else if candidate.contains(query) || (reverse && query.contains(candidate)) {
        0.9
    } else {
        strsim::jaro_winkler(query, candidate)
    }
}

/// A ranked candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub item: T,
    pub score: f64,
}

/// Rank candidates against a query.
///
/// Each candidate contributes one or more names (e.g. code and label); its
/// score is the best over those names. `key` orders ties.
pub fn rank<T, F>(query: &str, candidates: impl IntoIterator<Item = T>, names: F) -> Vec<Ranked<T>>
where
    T: Clone,
    F: Fn(&T) -> Vec<String>,
{
    let folded = fold(query);
    let mut ranked: Vec<(Ranked<T>, String)> = candidates
        .into_iter()
        .filter_map(|item| {
            let item_names = names(&item);
            let key = item_names.first().cloned().unwrap_or_default();
            let score = item_names
                .iter()
                .map(|n| similarity(&folded, &fold(n)))
                .fold(0.0_f64, f64::max);
            (score >= MIN_SIMILARITY).then_some((Ranked { item, score }, key))
        })
        .collect();

    ranked.sort_by(|(a, ka), (b, kb)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| ka.cmp(kb))
    });
    ranked.into_iter().map(|(r, _)| r).collect()
}
