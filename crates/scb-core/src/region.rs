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

//! Region lookup over a reference table's region dimension.

use crate::matching::{fold, rank};
use crate::model::{Dataset, Dimension};
use crate::synonyms::{dimension_alias, resolve_alias};
use serde::Serialize;
use std::fmt;

/// Administrative level, derived from the shape of the region code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionType {
    /// `00`, the whole country.
    Country,
    /// Two-digit county (län) codes.
    County,
    /// Four-digit municipality (kommun) codes.
    Municipality,
    Other,
}

impl RegionType {
    pub fn from_code(code: &str) -> Self {
        let digits = code.chars().all(|c| c.is_ascii_digit());
        match (digits, code.len()) {
            (true, 2) if code == "00" => Self::Country,
            (true, 2) => Self::County,
            (true, 4) => Self::Municipality,
            _ if code.eq_ignore_ascii_case("SE") => Self::Country,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Country => write!(f, "country"),
            Self::County => write!(f, "county"),
            Self::Municipality => write!(f, "municipality"),
            Self::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionMatch {
    pub code: String,
    pub name: String,
    pub region_type: RegionType,
    pub score: f64,
}

/// The region dimension of `metadata`: `hint` if it names a dimension,
/// otherwise the one the region alias resolves to.
pub fn region_dimension<'a>(metadata: &'a Dataset, hint: Option<&str>) -> Option<(&'a str, &'a Dimension)> {
    let code = hint
        .and_then(|h| metadata.id.iter().find(|c| c.as_str() == h).map(String::as_str))
        .or_else(|| dimension_alias("region").and_then(|alias| resolve_alias(alias, metadata)))?;
    metadata.dimension(code).map(|dim| (code, dim))
}

/// Drop the administrative suffix from a folded name, so that
/// "Stockholms län" and "Uppsala kommun" compare as "stockholm" and "uppsala".
fn strip_suffix(folded: &str) -> &str {
    if let Some(rest) = folded.strip_suffix(" kommun") {
        return rest;
    }
    match folded.strip_suffix(" lan") {
        // Genitive s on the county name: "stockholms lan"
        Some(rest) => rest.strip_suffix('s').filter(|r| r.len() > 2).unwrap_or(rest),
        None => folded,
    }
}

fn region_names(code: &str, dimension: &Dimension) -> Vec<String> {
    let label = dimension.category.label_of(code);
    let mut names = vec![label.to_string()];
    let folded = fold(label);
    let stripped = strip_suffix(&folded);
    if stripped != folded {
        names.push(stripped.to_string());
    }
    names
}

/// Fuzzy search of region names, best first.
pub fn search_regions(dimension: &Dimension, query: &str, limit: usize) -> Vec<RegionMatch> {
    let category = &dimension.category;
    rank(query, category.codes(), |code| region_names(code, dimension))
        .into_iter()
        .take(limit)
        .map(|ranked| RegionMatch {
            name: category.label_of(&ranked.item).to_string(),
            region_type: RegionType::from_code(&ranked.item),
            code: ranked.item,
            score: ranked.score,
        })
        .collect()
}

/// The level a folded name asks for through its own suffix, if any.
fn requested_type(folded: &str) -> Option<RegionType> {
    if folded.ends_with(" kommun") {
        Some(RegionType::Municipality)
    } else if folded.ends_with(" lan") {
        Some(RegionType::County)
    } else {
        None
    }
}

/// Exact region lookup: the folded name must equal the folded label, with
/// or without its county or municipality suffix. Several codes can match
/// (Stockholm is both a county and a municipality); counties come first.
/// A name carrying "län" or "kommun" only matches that level.
pub fn find_region_code(dimension: &Dimension, name: &str) -> Vec<RegionMatch> {
    let folded = fold(name);
    let wanted = strip_suffix(&folded);
    let level = requested_type(&folded);
    // Genitive before an explicit suffix: "stockholms kommun"
    let genitive = level
        .and_then(|_| wanted.strip_suffix('s'))
        .filter(|r| r.len() > 2);
    let category = &dimension.category;

    let mut matches: Vec<RegionMatch> = category
        .codes()
        .into_iter()
        .filter(|code| {
            let label = fold(category.label_of(code));
            let bare = strip_suffix(&label);
            label == folded || bare == wanted || Some(bare) == genitive
        })
        .map(|code| RegionMatch {
            name: category.label_of(&code).to_string(),
            region_type: RegionType::from_code(&code),
            score: 1.0,
            code,
        })
        .filter(|m| level.map_or(true, |t| m.region_type == t))
        .collect();

    matches.sort_by_key(|m| (type_order(m.region_type), m.code.clone()));
    matches
}

fn type_order(region_type: RegionType) -> u8 {
    match region_type {
        RegionType::Country => 0,
        RegionType::County => 1,
        RegionType::Municipality => 2,
        RegionType::Other => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn regions() -> Dataset {
        Dataset::from_json(json!({
            "id": ["Region", "Tid"],
            "size": [6, 1],
            "dimension": {
                "Region": {
                    "label": "region",
                    "category": {
                        "index": ["00", "01", "0180", "03", "0380", "1480"],
                        "label": {
                            "00": "Riket",
                            "01": "Stockholms län",
                            "0180": "Stockholm",
                            "03": "Uppsala län",
                            "0380": "Uppsala",
                            "1480": "Göteborg"
                        }
                    }
                },
                "Tid": { "category": { "index": ["2023"] } }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_region_type_from_code() {
        assert_eq!(RegionType::from_code("00"), RegionType::Country);
        assert_eq!(RegionType::from_code("01"), RegionType::County);
        assert_eq!(RegionType::from_code("0180"), RegionType::Municipality);
        assert_eq!(RegionType::from_code("0180K"), RegionType::Other);
    }

    #[test]
    fn test_region_dimension_resolution() {
        let md = regions();
        assert_eq!(region_dimension(&md, None).map(|(c, _)| c), Some("Region"));
        assert_eq!(region_dimension(&md, Some("Tid")).map(|(c, _)| c), Some("Tid"));
        assert_eq!(region_dimension(&md, Some("Nope")).map(|(c, _)| c), Some("Region"));
    }

    #[test]
    fn test_find_region_code_county_and_municipality() {
        let md = regions();
        let (_, dim) = region_dimension(&md, None).unwrap();

        let found = find_region_code(dim, "Stockholm");
        let codes: Vec<_> = found.iter().map(|m| m.code.as_str()).collect();
        assert_eq!(codes, vec!["01", "0180"]);
        assert_eq!(found[0].region_type, RegionType::County);

        let county = find_region_code(dim, "uppsala län");
        assert_eq!(county.len(), 1);
        assert_eq!(county[0].code, "03");
        assert_eq!(county[0].region_type, RegionType::County);

        let municipality = find_region_code(dim, "Stockholms kommun");
        let codes: Vec<_> = municipality.iter().map(|m| m.code.as_str()).collect();
        assert_eq!(codes, vec!["0180"]);

        assert_eq!(find_region_code(dim, "Uppsala").len(), 2);
        assert_eq!(find_region_code(dim, "Goteborg")[0].code, "1480");
        assert!(find_region_code(dim, "Atlantis").is_empty());
    }

    #[test]
    fn test_search_regions_fuzzy() {
        let md = regions();
        let (_, dim) = region_dimension(&md, None).unwrap();

        let hits = search_regions(dim, "Stokholm", 3);
        assert!(!hits.is_empty());
        assert!(hits[0].name.starts_with("Stockholm"));
        assert!(hits.len() <= 3);
        assert!(search_regions(dim, "xyzzy", 5).is_empty());
    }
}
