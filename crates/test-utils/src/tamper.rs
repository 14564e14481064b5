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

//! Helpers that corrupt a ledger in controlled ways.

use alloy_primitives::{B256, U256};
use anyhow::{bail, Context};
use soar_ledger::{LedgerSnapshot, RewardEvent, StakeEvent, GENESIS_HASH};

/// Add one wei to the amount of stake event `index` without rehashing it.
pub fn alter_stake_amount(
    snapshot: &LedgerSnapshot,
    index: usize,
) -> anyhow::Result<LedgerSnapshot> {
    let mut stakes = snapshot.stake_events().to_vec();
    let event = stakes.get_mut(index).with_context(|| format!("no stake event {index}"))?;
    event.amount += U256::from(1);
    Ok(LedgerSnapshot::new(stakes, snapshot.reward_events().to_vec()))
}

/// Add one wei to the amount of reward event `index` without rehashing it.
pub fn alter_reward_amount(
    snapshot: &LedgerSnapshot,
    index: usize,
) -> anyhow::Result<LedgerSnapshot> {
    let mut rewards = snapshot.reward_events().to_vec();
    let event = rewards.get_mut(index).with_context(|| format!("no reward event {index}"))?;
    event.amount += U256::from(1);
    Ok(LedgerSnapshot::new(snapshot.stake_events().to_vec(), rewards))
}

/// Point stake event `index` at a foreign predecessor and rehash it, so only the link breaks.
pub fn break_stake_link(
    snapshot: &LedgerSnapshot,
    index: usize,
) -> anyhow::Result<LedgerSnapshot> {
    let mut stakes = snapshot.stake_events().to_vec();
    let Some(event) = stakes.get_mut(index) else {
        bail!("no stake event {index}");
    };
    *event = event.fields().link(B256::repeat_byte(0xee));
    Ok(LedgerSnapshot::new(stakes, snapshot.reward_events().to_vec()))
}

/// Recompute every link of `events` from genesis.
///
/// Used to build chains whose hashes are valid but whose balances are not.
pub fn relink_stakes(events: &mut [StakeEvent]) {
    let mut head = GENESIS_HASH;
    for event in events {
        *event = event.fields().link(head);
        head = event.current_chain_hash;
    }
}

pub fn relink_rewards(events: &mut [RewardEvent]) {
    let mut head = GENESIS_HASH;
    for event in events {
        *event = event.fields().link(head);
        head = event.current_reward_chain_hash;
    }
}

#[cfg(test)]
mod tests {
    use soar_ledger::{ChainKind, LinkFault};

    use super::*;
    use crate::fixtures;

    #[test]
    fn altered_amount_breaks_hash() {
        let scenario = fixtures::long_chain().unwrap();
        let tampered = alter_stake_amount(&scenario.snapshot, 2).unwrap();
        let err = tampered.verify().unwrap_err();
        assert_eq!(err.kind, ChainKind::Stake);
        assert_eq!(err.index, 2);
        assert!(matches!(err.fault, LinkFault::HashMismatch { .. }));
        assert!(alter_stake_amount(&scenario.snapshot, 100).is_err());
    }

    #[test]
    fn broken_link_is_reported() {
        let scenario = fixtures::long_chain().unwrap();
        let tampered = break_stake_link(&scenario.snapshot, 3).unwrap();
        let err = tampered.verify().unwrap_err();
        assert_eq!(err.index, 3);
        assert!(matches!(err.fault, LinkFault::BrokenLink { .. }));
    }

    #[test]
    fn relinked_chain_verifies() {
        let scenario = fixtures::long_chain().unwrap();
        let mut stakes = scenario.snapshot.stake_events().to_vec();
        let mut rewards = scenario.snapshot.reward_events().to_vec();
        stakes[1].total_staked += U256::from(1);
        rewards[0].total_rewards += U256::from(1);
        relink_stakes(&mut stakes);
        relink_rewards(&mut rewards);

        let relinked = LedgerSnapshot::new(stakes, rewards);
        relinked.verify().unwrap();
        assert!(relinked.check_conservation().is_err());
    }
}
