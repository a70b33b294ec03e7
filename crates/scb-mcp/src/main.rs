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

//! SCB MCP Server binary.
//!
//! Exposes Statistics Sweden's PxWebApi 2.0 as MCP tools over stdio.
//!
//! # Usage
//!
//! ```bash
//! # Run with default settings
//! scb-mcp
//!
//! # Swedish labels and a longer timeout
//! scb-mcp --language sv --timeout-secs 60
//!
//! # Run with debug logging
//! RUST_LOG=scb_mcp=debug scb-mcp
//! ```

use clap::Parser;
use scb_mcp::{McpServer, McpServerConfig};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scb-mcp")]
#[command(author = "Dweve B.V.")]
#[command(version)]
#[command(about = "Statistics Sweden (SCB) Model Context Protocol (MCP) Server")]
struct Cli {
    /// Base URL of the PxWebApi 2.0 endpoint
    #[arg(long, env = "SCB_API_BASE_URL", default_value = scb_mcp::DEFAULT_BASE_URL)]
    base_url: String,

    /// Timeout for each upstream request, in seconds
    #[arg(long, env = "SCB_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Default response language
    #[arg(long, env = "SCB_LANGUAGE", default_value = "en", value_parser = ["en", "sv"])]
    language: String,

    /// Reference table for the region tools
    #[arg(long, env = "SCB_REGION_TABLE", default_value = "TAB638")]
    region_table: String,

    /// Region dimension code in the reference table (detected when unset)
    #[arg(long)]
    region_dimension: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("scb_mcp=info".parse().expect("valid log directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = McpServerConfig {
        base_url: cli.base_url,
        timeout: Duration::from_secs(cli.timeout_secs.max(1)),
        language: cli.language,
        region_table: cli.region_table,
        region_dimension: cli.region_dimension,
        ..Default::default()
    };

    let mut server = McpServer::new(config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async { server.run_stdio().await })?;

    Ok(())
}
