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

//! Query pipeline shared by the tools.
//!
//! Every upstream call passes through the rate governor first. The
//! governor's quota comes from the upstream `/config`, fetched once on
//! first use; until then (or if that fetch fails) the fallback quota
//! applies.

use crate::client::{StatisticsApi, TableQuery};
use scb_core::{
    find_region_code, region_dimension, search_regions, transform_to_structured_data,
    validate_selection, ApiConfig, Dataset, FlattenOptions, RateGovernor, RateLimitState,
    RegionMatch, ScbError, ScbResult, Selection, StructuredData, TableList, TableSummary,
    UsageSnapshot, ValidationOptions, ValidationReport, ValueSelection,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Settings the pipeline needs from the server configuration.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub language: String,
    pub fallback_max_calls: u32,
    pub fallback_window_secs: u64,
    /// Table whose region dimension backs the region lookups.
    pub region_table: String,
    pub region_dimension: Option<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            fallback_max_calls: scb_core::rate::DEFAULT_MAX_CALLS,
            fallback_window_secs: scb_core::rate::DEFAULT_WINDOW_SECS,
            region_table: "TAB638".to_string(),
            region_dimension: None,
        }
    }
}

/// Upstream configuration plus local quota usage.
#[derive(Debug, Clone, Serialize)]
pub struct ApiStatus {
    pub config: ApiConfig,
    pub usage: UsageSnapshot,
}

/// Region lookup outcome, with the table and dimension searched.
#[derive(Debug, Clone, Serialize)]
pub struct RegionLookup {
    pub table_id: String,
    pub dimension: String,
    pub matches: Vec<RegionMatch>,
}

pub struct ScbService {
    api: Arc<dyn StatisticsApi>,
    governor: Arc<RateGovernor>,
    upstream_config: OnceCell<Option<ApiConfig>>,
    settings: ServiceSettings,
}

impl ScbService {
    pub fn new(api: Arc<dyn StatisticsApi>, settings: ServiceSettings) -> Self {
        let governor = RateGovernor::new(RateLimitState::new(
            settings.fallback_max_calls,
            settings.fallback_window_secs,
        ));
        Self::with_governor(api, Arc::new(governor), settings)
    }

    pub fn with_governor(
        api: Arc<dyn StatisticsApi>,
        governor: Arc<RateGovernor>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            api,
            governor,
            upstream_config: OnceCell::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn governor(&self) -> &RateGovernor {
        &self.governor
    }

    fn lang<'a>(&'a self, lang: Option<&'a str>) -> &'a str {
        lang.filter(|l| !l.trim().is_empty())
            .unwrap_or(self.settings.language.as_str())
    }

    /// The upstream configuration, fetched on first use. The fetch is
    /// counted against the fallback quota.
    async fn upstream_config(&self) -> Option<&ApiConfig> {
        self.upstream_config
            .get_or_init(|| async {
                if let Err(e) = self.governor.try_admit() {
                    warn!("Skipping upstream config fetch: {}", e);
                    return None;
                }
                match self.api.get_config().await {
                    Ok(config) => {
                        self.apply_quota(&config);
                        Some(config)
                    }
                    Err(e) => {
                        warn!(
                            "Could not load upstream config, keeping fallback quota of {} calls per {}s: {}",
                            self.settings.fallback_max_calls, self.settings.fallback_window_secs, e
                        );
                        None
                    }
                }
            })
            .await
            .as_ref()
    }

    fn apply_quota(&self, config: &ApiConfig) {
        let max = config
            .max_calls_per_time_window
            .unwrap_or(self.settings.fallback_max_calls);
        let window = config
            .time_window
            .unwrap_or(self.settings.fallback_window_secs);
        info!("Upstream quota: {} calls per {}s", max, window);
        self.governor.reconfigure(max, window);
    }

    /// Load the quota if needed, then count one call.
    async fn admit(&self) -> ScbResult<()> {
        self.upstream_config().await;
        self.governor.try_admit().map(|_| ())
    }

    pub async fn search_tables(&self, mut query: TableQuery) -> ScbResult<TableList> {
        if query.lang.is_none() {
            query.lang = Some(self.settings.language.clone());
        }
        self.admit().await?;
        self.api.search_tables(&query).await
    }

    pub async fn table_info(&self, table_id: &str, lang: Option<&str>) -> ScbResult<TableSummary> {
        self.admit().await?;
        self.api.get_table(table_id, self.lang(lang)).await
    }

    pub async fn metadata(&self, table_id: &str, lang: Option<&str>) -> ScbResult<Dataset> {
        self.admit().await?;
        self.api.get_metadata(table_id, self.lang(lang)).await
    }

    /// Fetch metadata and validate `selection` against it. No data is fetched.
    pub async fn validate(
        &self,
        table_id: &str,
        selection: &Selection,
        lang: Option<&str>,
    ) -> ScbResult<(Dataset, ValidationReport)> {
        let metadata = self.metadata(table_id, lang).await?;
        let options = ValidationOptions {
            max_cells: self.upstream_config().await.and_then(|c| c.max_data_cells),
            ..Default::default()
        };
        let report = validate_selection(&metadata, selection, &options);
        debug!(
            table_id,
            valid = report.is_valid,
            errors = report.errors.len(),
            "Validated selection"
        );
        Ok((metadata, report))
    }

    /// Validate, fetch and flatten. An invalid selection fails before any
    /// data request is made.
    pub async fn query_data(
        &self,
        table_id: &str,
        selection: &Selection,
        lang: Option<&str>,
        options: &FlattenOptions,
    ) -> ScbResult<StructuredData> {
        let (_, report) = self.validate(table_id, selection, lang).await?;
        let translated = into_translated(report)?;
        self.fetch_and_flatten(table_id, selection, &translated, lang, options)
            .await
    }

    /// Like [`ScbService::query_data`], but every dimension the caller left
    /// out is restricted to its first category and at most `rows` records
    /// are returned.
    pub async fn preview(
        &self,
        table_id: &str,
        selection: &Selection,
        lang: Option<&str>,
        rows: usize,
    ) -> ScbResult<StructuredData> {
        let (metadata, report) = self.validate(table_id, selection, lang).await?;
        let unspecified = report.unspecified_dimensions.clone();
        let mut translated = into_translated(report)?;

        for code in unspecified {
            if let Some(first) = metadata
                .dimension(&code)
                .and_then(|d| d.category.codes().into_iter().next())
            {
                translated.insert(code, ValueSelection::Values(vec![first]));
            }
        }

        let options = FlattenOptions {
            max_records: Some(rows),
        };
        self.fetch_and_flatten(table_id, selection, &translated, lang, &options)
            .await
    }

    /// Fetch `sent` and flatten it. The echo keeps the caller's `requested`
    /// selection and reports `sent` alongside when the two differ.
    async fn fetch_and_flatten(
        &self,
        table_id: &str,
        requested: &Selection,
        sent: &Selection,
        lang: Option<&str>,
        options: &FlattenOptions,
    ) -> ScbResult<StructuredData> {
        self.admit().await?;
        let dataset = self.api.get_data(table_id, self.lang(lang), sent).await?;
        let mut out = transform_to_structured_data(&dataset, table_id, Some(requested), options)?;
        if sent != requested {
            out.query.translated_selection = Some(sent.clone());
        }
        Ok(out)
    }

    /// Fresh upstream configuration, re-applying its quota.
    pub async fn api_status(&self) -> ScbResult<ApiStatus> {
        self.admit().await?;
        let config = self.api.get_config().await?;
        self.apply_quota(&config);
        Ok(ApiStatus {
            config,
            usage: self.governor.snapshot(),
        })
    }

    /// Local quota usage. Makes no upstream call.
    pub fn usage(&self) -> UsageSnapshot {
        self.governor.snapshot()
    }

    pub async fn search_regions(
        &self,
        query: &str,
        limit: usize,
        lang: Option<&str>,
    ) -> ScbResult<RegionLookup> {
        self.lookup_regions(lang, |dim| search_regions(dim, query, limit))
            .await
    }

    pub async fn find_region_code(&self, name: &str, lang: Option<&str>) -> ScbResult<RegionLookup> {
        self.lookup_regions(lang, |dim| find_region_code(dim, name))
            .await
    }

    async fn lookup_regions<F>(&self, lang: Option<&str>, lookup: F) -> ScbResult<RegionLookup>
    where
        F: FnOnce(&scb_core::Dimension) -> Vec<RegionMatch>,
    {
        let table_id = self.settings.region_table.as_str();
        let metadata = self.metadata(table_id, lang).await?;
        let (code, dimension) = region_dimension(&metadata, self.settings.region_dimension.as_deref())
            .ok_or_else(|| {
                ScbError::InvalidDataset(format!("table {} has no region dimension", table_id))
            })?;

        Ok(RegionLookup {
            table_id: table_id.to_string(),
            dimension: code.to_string(),
            matches: lookup(dimension),
        })
    }
}

fn into_translated(report: ValidationReport) -> ScbResult<Selection> {
    let message = report.error_summary();
    match report.translated_selection {
        Some(selection) if report.is_valid => Ok(selection),
        _ => Err(ScbError::SelectionInvalid {
            message,
            errors: report.errors,
            suggestions: report.suggestions,
        }),
    }
}
