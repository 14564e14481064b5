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

use anyhow::{bail, ensure, Context};
use clap::Args;
use soar_ledger::settle_claim;

use crate::config::{read_document, GlobalConfig};

/// Command to check a settlement document against its own ledger.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct Verify {
    /// Path to the settlement document.
    #[clap(long)]
    pub input: PathBuf,
}

impl Verify {
    /// Run the [Verify] command.
    pub fn run(&self, _global_config: &GlobalConfig) -> anyhow::Result<()> {
        let decoded = read_document(&self.input)?;
        ensure!(
            decoded.claim.user == decoded.user,
            "claim is for {} but the document is for {}",
            decoded.claim.user,
            decoded.user
        );

        let heads = decoded.snapshot.verify().context("ledger failed chain verification")?;
        decoded.snapshot.check_conservation().context("ledger failed balance checks")?;
        tracing::debug!("Stake chain head {}, reward chain head {}", heads.stake, heads.reward);

        let recomputed =
            settle_claim(&decoded.snapshot, &decoded.claim).context("failed to settle claim")?;
        if recomputed != decoded.expected {
            bail!(
                "recorded settlement for {} does not match: recorded {}, computed {}",
                decoded.user,
                decoded.expected.total_rewards,
                recomputed.total_rewards
            );
        }

        println!("Verified settlement of {} for {}", recomputed.total_rewards, recomputed.user);
        Ok(())
    }
}
