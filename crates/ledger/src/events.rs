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

//! Stake and reward chain event records.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// The hashed fields of a stake chain event, without the chain linkage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeFields {
    pub user: Address,
    pub is_stake: bool,
    pub amount: U256,
    /// Global stake after this event.
    pub total_staked: U256,
    /// Stake held by `user` after this event.
    pub total_user_stake: U256,
    pub timestamp: U256,
}

/// A stake or unstake action recorded on the global stake chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeEvent {
    pub user: Address,
    pub is_stake: bool,
    pub amount: U256,
    /// Global stake after this event.
    pub total_staked: U256,
    /// Stake held by `user` after this event.
    pub total_user_stake: U256,
    pub timestamp: U256,
    pub previous_chain_hash: B256,
    pub current_chain_hash: B256,
}

impl StakeEvent {
    /// The hashed fields of this event.
    pub fn fields(&self) -> StakeFields {
        StakeFields {
            user: self.user,
            is_stake: self.is_stake,
            amount: self.amount,
            total_staked: self.total_staked,
            total_user_stake: self.total_user_stake,
            timestamp: self.timestamp,
        }
    }

    /// An all-zero event, used on the wire in place of an absent checkpoint.
    pub const fn sentinel() -> Self {
        Self {
            user: Address::ZERO,
            is_stake: false,
            amount: U256::ZERO,
            total_staked: U256::ZERO,
            total_user_stake: U256::ZERO,
            timestamp: U256::ZERO,
            previous_chain_hash: B256::ZERO,
            current_chain_hash: B256::ZERO,
        }
    }
}

/// The hashed fields of a reward chain event, without the chain linkage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardFields {
    pub amount: U256,
    /// Cumulative rewards including this event.
    pub total_rewards: U256,
    pub timestamp: U256,
}

/// A reward distribution recorded on the reward chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardEvent {
    pub amount: U256,
    /// Cumulative rewards including this event.
    pub total_rewards: U256,
    pub timestamp: U256,
    pub previous_reward_chain_hash: B256,
    pub current_reward_chain_hash: B256,
}

impl RewardEvent {
    pub fn fields(&self) -> RewardFields {
        RewardFields {
            amount: self.amount,
            total_rewards: self.total_rewards,
            timestamp: self.timestamp,
        }
    }

    pub const fn sentinel() -> Self {
        Self {
            amount: U256::ZERO,
            total_rewards: U256::ZERO,
            timestamp: U256::ZERO,
            previous_reward_chain_hash: B256::ZERO,
            current_reward_chain_hash: B256::ZERO,
        }
    }
}
