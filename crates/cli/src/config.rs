// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Common configuration options for commands in the SOAR CLI.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use clap::Args;
use soar_ledger::{DecodedSettlement, SettlementDocument};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Common configuration options for all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalConfig {
    /// Log level (error, warn, info, debug, trace)
    #[clap(long, env = "LOG_LEVEL", global = true, default_value = "info")]
    pub log_level: LevelFilter,

    /// Whether to log in JSON format.
    #[clap(long, env = "LOG_JSON", global = true, default_value_t = false)]
    pub log_json: bool,
}

impl GlobalConfig {
    /// Install the global tracing subscriber.
    ///
    /// `RUST_LOG` directives take precedence over [Self::log_level]. Logs go to stderr so that
    /// command output on stdout stays machine readable.
    pub fn init_tracing(&self) {
        let filter =
            EnvFilter::builder().with_default_directive(self.log_level.into()).from_env_lossy();

        let builder = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .with_env_filter(filter);
        if self.log_json {
            builder.json().init();
        } else {
            builder.init();
        }
    }
}

/// Read and decode a settlement document from `path`.
pub fn read_document(path: &Path) -> Result<DecodedSettlement> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read settlement document {}", path.display()))?;
    let document = SettlementDocument::from_json(&json)
        .with_context(|| format!("failed to parse settlement document {}", path.display()))?;
    document.decode().context("failed to decode settlement document")
}
