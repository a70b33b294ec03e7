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

//! Statistics Sweden Model Context Protocol (MCP) Server
//!
//! This crate exposes Statistics Sweden's public PxWebApi 2.0 as MCP tools
//! for AI/LLM clients. Key features:
//!
//! - **Search tables** and inspect their dimensions
//! - **Validate selections** written with Swedish or English names, with
//!   ranked suggestions for misspellings
//! - **Fetch data** as flat labeled records with summary statistics
//! - **Look up regions** by name
//! - **Respect the upstream call quota** with a shared rate governor
//!
//! The upstream is reached through the [`StatisticsApi`] trait, so the
//! server can run against any implementation of it.

mod client;
mod error;
mod protocol;
mod server;
mod service;
pub mod tools;

pub use client::{
    DataRequest, HttpStatisticsApi, StatisticsApi, TableQuery, DEFAULT_BASE_URL,
    DEFAULT_POST_THRESHOLD,
};
pub use error::{McpError, McpResult};
pub use protocol::*;
pub use server::{McpServer, McpServerConfig};
pub use service::{ApiStatus, RegionLookup, ScbService, ServiceSettings};
pub use tools::{execute_tool, get_tools};

/// MCP Server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name for MCP protocol
pub const SERVER_NAME: &str = "scb-mcp";
