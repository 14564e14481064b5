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

use std::path::PathBuf;

use alloy_primitives::Address;
use anyhow::Context;
use clap::Args;
use soar_ledger::{select_checkpoints, settle_claim, SettlementJournal};

use super::RewardRange;
use crate::config::{read_document, GlobalConfig};

/// Command to compute the reward entitlement of a user over a document's ledger.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct Settle {
    /// Path to the settlement document whose ledger is settled.
    #[clap(long)]
    pub input: PathBuf,

    /// User to settle.
    #[clap(long)]
    pub user: Address,

    #[clap(flatten)]
    pub range: RewardRange,

    /// Also print the ABI-encoded settlement journal.
    #[clap(long)]
    pub journal: bool,
}

impl Settle {
    /// Run the [Settle] command.
    pub fn run(&self, _global_config: &GlobalConfig) -> anyhow::Result<()> {
        let decoded = read_document(&self.input)?;
        decoded.snapshot.verify().context("ledger failed chain verification")?;

        let claim = select_checkpoints(&decoded.snapshot, self.user, &self.range.policy())
            .context("failed to select checkpoints")?;
        let expected = settle_claim(&decoded.snapshot, &claim).context("failed to settle claim")?;
        tracing::info!("Settled {} for {}", expected.total_rewards, self.user);

        println!("{}", serde_json::to_string_pretty(&expected)?);
        if self.journal {
            let journal = SettlementJournal::from(&expected);
            println!("journal: 0x{}", hex::encode(journal.encode()));
        }
        Ok(())
    }
}
