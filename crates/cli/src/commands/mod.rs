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

//! Commands of the SOAR CLI.

mod generate;
mod settle;
mod verify;

pub use generate::Generate;
pub use settle::Settle;
pub use verify::Verify;

use clap::{Args, Subcommand};
use soar_ledger::{Bound, SelectionPolicy};

use crate::config::GlobalConfig;

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Simulate a ledger, settle one user, and write a settlement document.
    Generate(Generate),
    /// Verify the chains and the recorded settlement in a settlement document.
    Verify(Verify),
    /// Settle rewards for any user of a settlement document.
    Settle(Settle),
}

impl Command {
    /// Run the command.
    pub fn run(&self, global_config: &GlobalConfig) -> anyhow::Result<()> {
        match self {
            Self::Generate(cmd) => cmd.run(global_config),
            Self::Verify(cmd) => cmd.run(global_config),
            Self::Settle(cmd) => cmd.run(global_config),
        }
    }
}

/// Reward chain positions bounding a settlement.
#[derive(Args, Clone, Debug, Default)]
pub struct RewardRange {
    /// Position of the reward event the interval starts after. Defaults to the first reward
    /// at or after the user's first stake.
    #[clap(long)]
    pub from_reward_index: Option<usize>,

    /// Position of the last reward event in the interval. Defaults to the last reward.
    #[clap(long)]
    pub to_reward_index: Option<usize>,
}

impl RewardRange {
    pub fn policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            from_reward: self.from_reward_index.map(Bound::Index).unwrap_or_default(),
            to_reward: self.to_reward_index.map(Bound::Index).unwrap_or_default(),
            ..Default::default()
        }
    }
}
