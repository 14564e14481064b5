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

use alloy_primitives::{Address, U256};
use soar_ledger::{
    AppendError, EventSource, LedgerSnapshot, LedgerState, RewardEvent, SnapshotError, StakeEvent,
};

/// An in-memory stand-in for the staking and reward contracts.
///
/// Appends go through [LedgerState], so every event carries a valid link. The oracle keeps
/// accepting appends after a snapshot has been captured from it.
#[derive(Debug, Clone, Default)]
pub struct MemoryOracle {
    state: LedgerState,
    stake_events: Vec<StakeEvent>,
    reward_events: Vec<RewardEvent>,
}

impl MemoryOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn stake(
        &mut self,
        user: Address,
        amount: U256,
        timestamp: U256,
    ) -> Result<StakeEvent, AppendError> {
        let event = self.state.stake(user, amount, timestamp)?;
        self.stake_events.push(event);
        Ok(event)
    }

    pub fn unstake(
        &mut self,
        user: Address,
        amount: U256,
        timestamp: U256,
    ) -> Result<StakeEvent, AppendError> {
        let event = self.state.unstake(user, amount, timestamp)?;
        self.stake_events.push(event);
        Ok(event)
    }

    pub fn add_rewards(
        &mut self,
        amount: U256,
        timestamp: U256,
    ) -> Result<RewardEvent, AppendError> {
        let event = self.state.add_rewards(amount, timestamp)?;
        self.reward_events.push(event);
        Ok(event)
    }

    /// Push a raw event, bypassing the append contract.
    pub fn push_stake_event(&mut self, event: StakeEvent) {
        self.stake_events.push(event);
    }

    pub fn push_reward_event(&mut self, event: RewardEvent) {
        self.reward_events.push(event);
    }

    pub fn snapshot(&self) -> Result<LedgerSnapshot, SnapshotError> {
        LedgerSnapshot::capture(self)
    }
}

impl EventSource for MemoryOracle {
    fn stake_event_count(&self) -> usize {
        self.stake_events.len()
    }

    fn stake_event(&self, index: usize) -> Option<StakeEvent> {
        self.stake_events.get(index).copied()
    }

    fn reward_event_count(&self) -> usize {
        self.reward_events.len()
    }

    fn reward_event(&self, index: usize) -> Option<RewardEvent> {
        self.reward_events.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_ignores_later_appends() {
        let user = Address::repeat_byte(1);
        let mut oracle = MemoryOracle::new();
        oracle.stake(user, U256::from(10), U256::from(1)).unwrap();
        oracle.add_rewards(U256::from(5), U256::from(2)).unwrap();

        let snapshot = oracle.snapshot().unwrap();
        oracle.stake(user, U256::from(10), U256::from(3)).unwrap();
        oracle.add_rewards(U256::from(5), U256::from(4)).unwrap();

        assert_eq!(snapshot.stake_events().len(), 1);
        assert_eq!(snapshot.reward_events().len(), 1);
        assert_eq!(oracle.stake_event_count(), 2);
        assert_eq!(oracle.snapshot().unwrap().stake_events()[..1], snapshot.stake_events()[..]);
    }
}
