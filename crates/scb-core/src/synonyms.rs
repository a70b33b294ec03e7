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

//! Bilingual (Swedish/English) alias table for dimensions and categories.
//!
//! The same table drives both directions: caller names are resolved to a
//! table's dimension codes, and dimension codes are mapped back to a stable
//! logical name when datasets are flattened.

use crate::matching::fold;
use crate::model::Dataset;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Which JSON-stat2 role a logical dimension usually carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleHint {
    Time,
    Geo,
    Metric,
    None,
}

/// A logical dimension and the names it goes by.
#[derive(Debug)]
pub struct DimensionAlias {
    /// Stable logical name used in flattened records.
    pub base_name: &'static str,
    /// Upstream dimension codes seen across tables.
    pub codes: &'static [&'static str],
    /// Swedish and English names, already folded.
    pub names: &'static [&'static str],
    pub role: RoleHint,
}

/// Category alias: names that mean one of several candidate codes.
#[derive(Debug)]
pub struct ValueAlias {
    /// Logical dimension this applies to; `None` for any dimension.
    pub base_name: Option<&'static str>,
    pub names: &'static [&'static str],
    /// Codes tried in order against the table's categories.
    pub codes: &'static [&'static str],
    /// Folded label prefixes tried when no code matches.
    pub label_prefixes: &'static [&'static str],
}

static DIMENSION_ALIASES: &[DimensionAlias] = &[
    DimensionAlias {
        base_name: "region",
        codes: &["Region", "Lan", "Kommun"],
        names: &[
            "region", "kommun", "kommuner", "municipality", "municipalities", "lan", "county",
            "counties", "omrade", "area", "geography", "geografi", "location", "plats", "place",
        ],
        role: RoleHint::Geo,
    },
    DimensionAlias {
        base_name: "period",
        codes: &["Tid"],
        names: &[
            "tid", "time", "period", "year", "years", "ar", "month", "manad", "quarter", "kvartal",
            "date", "datum", "week", "vecka",
        ],
        role: RoleHint::Time,
    },
    DimensionAlias {
        base_name: "measure",
        codes: &["ContentsCode"],
        names: &[
            "contents", "contentscode", "tabellinnehall", "innehall", "measure", "measures",
            "indicator", "matt", "statistic", "observations",
        ],
        role: RoleHint::Metric,
    },
    DimensionAlias {
        base_name: "sex",
        codes: &["Kon"],
        names: &["kon", "sex", "gender"],
        role: RoleHint::None,
    },
    DimensionAlias {
        base_name: "age",
        codes: &["Alder", "AlderFem"],
        names: &["alder", "age", "aldersgrupp", "age group", "age groups"],
        role: RoleHint::None,
    },
    DimensionAlias {
        base_name: "marital_status",
        codes: &["Civilstand"],
        names: &["civilstand", "marital status", "civil status"],
        role: RoleHint::None,
    },
    DimensionAlias {
        base_name: "education",
        codes: &["UtbildningsNiva", "Utbniva", "SUN2000Niva"],
        names: &["utbildningsniva", "utbildning", "education", "education level", "educational attainment"],
        role: RoleHint::None,
    },
    DimensionAlias {
        base_name: "industry",
        codes: &["SNI2007", "SNI2002"],
        names: &["industry", "bransch", "naringsgren", "sni", "sector"],
        role: RoleHint::None,
    },
    DimensionAlias {
        base_name: "occupation",
        codes: &["Yrke2012", "Yrke"],
        names: &["yrke", "occupation", "profession", "ssyk"],
        role: RoleHint::None,
    },
    DimensionAlias {
        base_name: "birth_region",
        codes: &["Fodelseregion", "Fodelseland"],
        names: &["fodelseregion", "fodelseland", "birth region", "country of birth", "born"],
        role: RoleHint::None,
    },
    DimensionAlias {
        base_name: "household",
        codes: &["Hushallstyp"],
        names: &["hushallstyp", "hushall", "household", "household type"],
        role: RoleHint::None,
    },
];

static VALUE_ALIASES: &[ValueAlias] = &[
    ValueAlias {
        base_name: Some("sex"),
        names: &["men", "man", "male", "males", "pojkar", "boys"],
        codes: &["1"],
        label_prefixes: &["men", "man"],
    },
    ValueAlias {
        base_name: Some("sex"),
        names: &["women", "woman", "female", "females", "kvinnor", "kvinna", "flickor", "girls"],
        codes: &["2"],
        label_prefixes: &["women", "kvinnor"],
    },
    ValueAlias {
        base_name: Some("sex"),
        names: &["both", "both sexes", "bada konen", "total", "totalt", "all"],
        codes: &["1+2", "TOT"],
        label_prefixes: &["total", "bada"],
    },
    ValueAlias {
        base_name: Some("region"),
        names: &["sweden", "sverige", "riket", "hela riket", "whole country", "the whole country", "national"],
        codes: &["00", "SE"],
        label_prefixes: &["riket", "sweden", "sverige", "the whole country"],
    },
    ValueAlias {
        base_name: None,
        names: &["total", "totalt", "all", "samtliga", "alla", "sum", "summa"],
        codes: &["TOT", "TOTALT", "tot", "Totalt", "1+2", "00"],
        label_prefixes: &["total", "samtliga", "alla", "summa"],
    },
];

/// Folded alias name -> index into `DIMENSION_ALIASES`.
static NAME_INDEX: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for (i, alias) in DIMENSION_ALIASES.iter().enumerate() {
        for name in alias.names {
            index.entry(*name).or_insert(i);
        }
    }
    index
});

/// Folded dimension code -> index into `DIMENSION_ALIASES`.
static CODE_INDEX: Lazy<HashMap<String, usize>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for (i, alias) in DIMENSION_ALIASES.iter().enumerate() {
        for code in alias.codes {
            index.entry(fold(code)).or_insert(i);
        }
    }
    index
});

/// All dimension aliases.
pub fn dimension_aliases() -> &'static [DimensionAlias] {
    DIMENSION_ALIASES
}

/// Look up a dimension alias by caller-supplied name.
pub fn dimension_alias(name: &str) -> Option<&'static DimensionAlias> {
    let folded = fold(name);
    NAME_INDEX
        .get(folded.as_str())
        .or_else(|| CODE_INDEX.get(&folded))
        .map(|&i| &DIMENSION_ALIASES[i])
}

/// Find the dimension of `metadata` an alias refers to.
///
/// Tried in order: a known upstream code, the JSON-stat2 role, then a
/// dimension whose label is one of the alias names.
pub fn resolve_alias<'a>(alias: &DimensionAlias, metadata: &'a Dataset) -> Option<&'a str> {
    let by_code = metadata.id.iter().find(|code| {
        let folded = fold(code);
        alias.codes.iter().any(|c| fold(c) == folded)
    });
    if let Some(code) = by_code {
        return Some(code.as_str());
    }

    let by_role = metadata.id.iter().find(|code| match alias.role {
        RoleHint::Time => metadata.is_time_dimension(code),
        RoleHint::Geo => metadata.is_geo_dimension(code),
        RoleHint::Metric => metadata.is_metric_dimension(code),
        RoleHint::None => false,
    });
    if let Some(code) = by_role {
        return Some(code.as_str());
    }

    metadata
        .dimensions()
        .find(|(_, dim)| {
            dim.label
                .as_deref()
                .map(fold)
                .is_some_and(|label| alias.names.contains(&label.as_str()))
        })
        .map(|(code, _)| code)
}

/// Logical name for a dimension code, used as the record key when
/// flattening. Unknown codes are lower-cased.
pub fn base_name(code: &str, dataset: Option<&Dataset>) -> String {
    if let Some(&i) = CODE_INDEX.get(&fold(code)) {
        return DIMENSION_ALIASES[i].base_name.to_string();
    }

    if let Some(ds) = dataset {
        let role = if ds.is_time_dimension(code) {
            RoleHint::Time
        } else if ds.is_geo_dimension(code) {
            RoleHint::Geo
        } else if ds.is_metric_dimension(code) {
            RoleHint::Metric
        } else {
            RoleHint::None
        };
        if role != RoleHint::None {
            if let Some(alias) = DIMENSION_ALIASES.iter().find(|a| a.role == role) {
                return alias.base_name.to_string();
            }
        }
    }

    fold(code).replace(' ', "_")
}

/// Value aliases applicable to a dimension with the given logical name.
pub fn value_aliases(base_name: &str, value: &str) -> impl Iterator<Item = &'static ValueAlias> {
    let folded = fold(value);
    let base = base_name.to_string();
    VALUE_ALIASES.iter().filter(move |alias| {
        alias.base_name.map_or(true, |b| b == base) && alias.names.contains(&folded.as_str())
    })
}
