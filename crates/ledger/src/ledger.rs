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

//! Ledger views over the stake and reward chains.

use std::collections::{BTreeSet, HashMap};

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{
    chain::{verify_chain, ChainKind, GENESIS_HASH},
    error::{
        AppendError, ChainIntegrityError, ConservationError, ConservationFault,
        InsufficientBalanceError, SnapshotError,
    },
    events::{RewardEvent, RewardFields, StakeEvent, StakeFields},
};

/// An ordered, replayable source of ledger events, such as the staking and reward contracts.
///
/// Indices are positions in each chain, starting from genesis. A source may grow while a
/// session is running; reads below a previously reported count must keep returning the same
/// events.
pub trait EventSource {
    fn stake_event_count(&self) -> usize;

    fn stake_event(&self, index: usize) -> Option<StakeEvent>;

    fn reward_event_count(&self) -> usize;

    fn reward_event(&self, index: usize) -> Option<RewardEvent>;
}

/// Chain heads after verifying a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainHeads {
    pub stake: B256,
    pub reward: B256,
}

/// A fixed prefix of both chains, read once at the start of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    stake_events: Vec<StakeEvent>,
    reward_events: Vec<RewardEvent>,
}

impl LedgerSnapshot {
    pub fn new(stake_events: Vec<StakeEvent>, reward_events: Vec<RewardEvent>) -> Self {
        Self { stake_events, reward_events }
    }

    /// Capture the events currently visible in `source`.
    ///
    /// Both chain lengths are read before any event, and only that prefix is read. Events
    /// appended to the source afterwards are not part of the snapshot.
    pub fn capture<S: EventSource + ?Sized>(source: &S) -> Result<Self, SnapshotError> {
        let stake_count = source.stake_event_count();
        let reward_count = source.reward_event_count();

        let stake_events = (0..stake_count)
            .map(|index| {
                source.stake_event(index).ok_or(SnapshotError::Truncated {
                    kind: ChainKind::Stake,
                    index,
                    count: stake_count,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let reward_events = (0..reward_count)
            .map(|index| {
                source.reward_event(index).ok_or(SnapshotError::Truncated {
                    kind: ChainKind::Reward,
                    index,
                    count: reward_count,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            "Captured ledger snapshot with {} stake events and {} reward events",
            stake_events.len(),
            reward_events.len()
        );
        Ok(Self { stake_events, reward_events })
    }

    pub fn stake_events(&self) -> &[StakeEvent] {
        &self.stake_events
    }

    pub fn reward_events(&self) -> &[RewardEvent] {
        &self.reward_events
    }

    /// The per-user view of the global stake chain, with global positions.
    pub fn user_stake_events(
        &self,
        user: Address,
    ) -> impl DoubleEndedIterator<Item = (usize, &StakeEvent)> + '_ {
        self.stake_events.iter().enumerate().filter(move |(_, event)| event.user == user)
    }

    /// All users that appear on the stake chain.
    pub fn users(&self) -> BTreeSet<Address> {
        self.stake_events.iter().map(|event| event.user).collect()
    }

    /// Re-derive both chains from genesis.
    pub fn verify(&self) -> Result<ChainHeads, ChainIntegrityError> {
        let stake = verify_chain(&self.stake_events)?;
        let reward = verify_chain(&self.reward_events)?;
        Ok(ChainHeads { stake, reward })
    }

    /// Check the balance invariants of both chains over every prefix.
    pub fn check_conservation(&self) -> Result<(), ConservationError> {
        check_stake_conservation(&self.stake_events)?;
        check_reward_conservation(&self.reward_events)
    }
}

impl EventSource for LedgerSnapshot {
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

/// Check that every stake event moves its user's stake by exactly its amount, and that the
/// global total equals the sum of all user stakes after every event.
pub fn check_stake_conservation(events: &[StakeEvent]) -> Result<(), ConservationError> {
    let mut user_stakes: HashMap<Address, U256> = HashMap::new();
    let mut sum = U256::ZERO;

    for (index, event) in events.iter().enumerate() {
        let fail = |fault| ConservationError { kind: ChainKind::Stake, index, fault };
        let prior = user_stakes.get(&event.user).copied().unwrap_or(U256::ZERO);

        let expected = if event.is_stake {
            prior.checked_add(event.amount)
        } else {
            prior.checked_sub(event.amount)
        }
        .ok_or_else(|| {
            fail(ConservationFault::Underflow {
                user: event.user,
                amount: event.amount,
                available: prior,
            })
        })?;
        if expected != event.total_user_stake {
            return Err(fail(ConservationFault::UserStake {
                user: event.user,
                expected,
                found: event.total_user_stake,
            }));
        }

        sum = (sum - prior)
            .checked_add(expected)
            .ok_or_else(|| fail(ConservationFault::Overflow("total staked")))?;
        if sum != event.total_staked {
            return Err(fail(ConservationFault::TotalStaked {
                expected: sum,
                found: event.total_staked,
            }));
        }
        user_stakes.insert(event.user, expected);
    }
    Ok(())
}

/// Check that the cumulative reward total equals the running sum of reward amounts.
pub fn check_reward_conservation(events: &[RewardEvent]) -> Result<(), ConservationError> {
    let mut sum = U256::ZERO;
    for (index, event) in events.iter().enumerate() {
        let fail = |fault| ConservationError { kind: ChainKind::Reward, index, fault };
        sum = sum
            .checked_add(event.amount)
            .ok_or_else(|| fail(ConservationFault::Overflow("total rewards")))?;
        if sum != event.total_rewards {
            return Err(fail(ConservationFault::TotalRewards {
                expected: sum,
                found: event.total_rewards,
            }));
        }
    }
    Ok(())
}

/// Running state of both chains, threaded explicitly through every append.
///
/// This is the append side of the ledger contract: each operation derives the post-event totals
/// and the next link from the current heads.
#[derive(Debug, Clone)]
pub struct LedgerState {
    user_stakes: HashMap<Address, U256>,
    total_staked: U256,
    total_rewards: U256,
    stake_head: B256,
    reward_head: B256,
    stake_timestamp: U256,
    reward_timestamp: U256,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerState {
    pub fn new() -> Self {
        Self {
            user_stakes: HashMap::new(),
            total_staked: U256::ZERO,
            total_rewards: U256::ZERO,
            stake_head: GENESIS_HASH,
            reward_head: GENESIS_HASH,
            stake_timestamp: U256::ZERO,
            reward_timestamp: U256::ZERO,
        }
    }

    /// Current stake held by `user`.
    pub fn staked(&self, user: &Address) -> U256 {
        self.user_stakes.get(user).copied().unwrap_or(U256::ZERO)
    }

    pub fn total_staked(&self) -> U256 {
        self.total_staked
    }

    pub fn total_rewards(&self) -> U256 {
        self.total_rewards
    }

    pub fn stake_head(&self) -> B256 {
        self.stake_head
    }

    pub fn reward_head(&self) -> B256 {
        self.reward_head
    }

    /// Record a deposit of `amount` by `user` at `timestamp`.
    pub fn stake(
        &mut self,
        user: Address,
        amount: U256,
        timestamp: U256,
    ) -> Result<StakeEvent, AppendError> {
        let user_stake =
            self.staked(&user).checked_add(amount).ok_or(AppendError::Overflow("user stake"))?;
        let total_staked =
            self.total_staked.checked_add(amount).ok_or(AppendError::Overflow("global stake"))?;
        self.append_stake(user, true, amount, user_stake, total_staked, timestamp)
    }

    /// Record a withdrawal of `amount` by `user` at `timestamp`.
    ///
    /// Fails without changing any state if `amount` exceeds the user's stake.
    pub fn unstake(
        &mut self,
        user: Address,
        amount: U256,
        timestamp: U256,
    ) -> Result<StakeEvent, AppendError> {
        let available = self.staked(&user);
        let user_stake = available.checked_sub(amount).ok_or(InsufficientBalanceError {
            user,
            requested: amount,
            available,
        })?;
        // The global total always covers every user stake.
        let total_staked = self.total_staked - amount;
        self.append_stake(user, false, amount, user_stake, total_staked, timestamp)
    }

    /// Record a reward distribution of `amount` at `timestamp`.
    pub fn add_rewards(
        &mut self,
        amount: U256,
        timestamp: U256,
    ) -> Result<RewardEvent, AppendError> {
        if timestamp < self.reward_timestamp {
            return Err(AppendError::TimestampRegression {
                kind: ChainKind::Reward,
                timestamp,
                head: self.reward_timestamp,
            });
        }
        let total_rewards =
            self.total_rewards.checked_add(amount).ok_or(AppendError::Overflow("reward"))?;

        let event = RewardFields { amount, total_rewards, timestamp }.link(self.reward_head);
        self.total_rewards = total_rewards;
        self.reward_head = event.current_reward_chain_hash;
        self.reward_timestamp = timestamp;
        tracing::trace!("Reward chain extended to {}", self.reward_head);
        Ok(event)
    }

    fn append_stake(
        &mut self,
        user: Address,
        is_stake: bool,
        amount: U256,
        total_user_stake: U256,
        total_staked: U256,
        timestamp: U256,
    ) -> Result<StakeEvent, AppendError> {
        if timestamp < self.stake_timestamp {
            return Err(AppendError::TimestampRegression {
                kind: ChainKind::Stake,
                timestamp,
                head: self.stake_timestamp,
            });
        }

        let fields =
            StakeFields { user, is_stake, amount, total_staked, total_user_stake, timestamp };
        let event = fields.link(self.stake_head);
        self.user_stakes.insert(user, total_user_stake);
        self.total_staked = total_staked;
        self.stake_head = event.current_chain_hash;
        self.stake_timestamp = timestamp;
        tracing::trace!("Stake chain extended to {}", self.stake_head);
        Ok(event)
    }
}
