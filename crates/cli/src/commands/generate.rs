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

use std::{fs, path::PathBuf};

use alloy_primitives::Address;
use anyhow::Context;
use clap::Args;
use soar_ledger::{select_checkpoints, settle_claim, SettlementDocument};
use soar_test_utils::{Simulator, SimulatorConfig};

use super::RewardRange;
use crate::config::GlobalConfig;

/// Command to simulate a ledger and write a settlement document for one user.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct Generate {
    /// Seed for the workload simulator.
    #[clap(long, default_value_t = 0)]
    pub seed: u64,

    /// Number of simulated stake, unstake and reward actions.
    #[clap(long, default_value_t = 100)]
    pub iterations: usize,

    /// Number of simulated users.
    #[clap(long, default_value_t = 19)]
    pub users: usize,

    /// User to settle. Defaults to the first simulated user.
    #[clap(long)]
    pub subject: Option<Address>,

    /// Path to write the settlement document to.
    #[clap(long)]
    pub output: PathBuf,

    #[clap(flatten)]
    pub range: RewardRange,
}

impl Generate {
    /// Run the [Generate] command.
    pub fn run(&self, _global_config: &GlobalConfig) -> anyhow::Result<()> {
        let config = SimulatorConfig {
            iterations: self.iterations,
            users: self.users,
            ..Default::default()
        };
        let ledger = Simulator::new(config, self.seed)?.run()?;
        let snapshot = ledger.snapshot()?;
        snapshot.verify().context("simulated ledger failed verification")?;

        let subject = match self.subject {
            Some(subject) => subject,
            None => *ledger.users.first().context("simulation produced no users")?,
        };
        let claim = select_checkpoints(&snapshot, subject, &self.range.policy())
            .context("failed to select checkpoints")?;
        let expected = settle_claim(&snapshot, &claim).context("failed to settle claim")?;

        let json = SettlementDocument::new(&snapshot, &claim, &expected).to_json()?;
        fs::write(&self.output, json)
            .with_context(|| format!("failed to write {}", self.output.display()))?;

        tracing::info!(
            "Wrote settlement of {} for {subject} over {} reward events to {}",
            expected.total_rewards,
            expected.contributions.len(),
            self.output.display()
        );
        Ok(())
    }
}
