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

//! Selection of the chain positions that bound a settlement.
//!
//! A [SettlementClaim] holds up to six checkpoints: a "from" and "to" position on the global
//! stake chain, on the reward chain, and on the subject's view of the stake chain. The reward
//! checkpoints bound the interval that is settled, "from" exclusive and "to" inclusive. The
//! stake checkpoints anchor the subject's position on the stake chain and are chosen
//! independently of the reward interval.
//!
//! Bounds are given explicitly through a [SelectionPolicy]. With [Bound::Default] everywhere:
//!
//! * reward "from" is the first reward event at or after the subject first holds a non-zero
//!   stake;
//! * reward "to" is the last reward event;
//! * stake "from" is the subject's first event on the global stake chain;
//! * stake "to" is the last stake event;
//! * each user stake checkpoint is the subject's last event at or before the corresponding
//!   global stake checkpoint.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{
    chain::{ChainKind, ChainLink},
    error::CheckpointError,
    events::{RewardEvent, StakeEvent},
    ledger::LedgerSnapshot,
};

/// A reference to one event of a chain by its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint<E> {
    pub position: usize,
    pub event: E,
}

impl<E: ChainLink> Checkpoint<E> {
    pub fn hash(&self) -> B256 {
        self.event.current_hash()
    }
}

/// Hash of an optional checkpoint, using the zero digest for an absent one.
pub fn checkpoint_hash<E: ChainLink>(checkpoint: Option<&Checkpoint<E>>) -> B256 {
    checkpoint.map(Checkpoint::hash).unwrap_or(B256::ZERO)
}

/// The checkpoints bounding a settlement for `user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementClaim {
    pub user: Address,
    pub from_stake_checkpoint: Option<Checkpoint<StakeEvent>>,
    pub to_stake_checkpoint: Option<Checkpoint<StakeEvent>>,
    pub from_reward_checkpoint: Option<Checkpoint<RewardEvent>>,
    pub to_reward_checkpoint: Option<Checkpoint<RewardEvent>>,
    pub from_user_stake_checkpoint: Option<Checkpoint<StakeEvent>>,
    pub to_user_stake_checkpoint: Option<Checkpoint<StakeEvent>>,
}

impl SettlementClaim {
    /// A claim with no checkpoints.
    pub fn empty(user: Address) -> Self {
        Self {
            user,
            from_stake_checkpoint: None,
            to_stake_checkpoint: None,
            from_reward_checkpoint: None,
            to_reward_checkpoint: None,
            from_user_stake_checkpoint: None,
            to_user_stake_checkpoint: None,
        }
    }
}

/// How one end of an interval is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bound {
    /// The documented default rule for this end of the interval.
    #[default]
    Default,
    /// No checkpoint. As a "from" bound the interval starts at genesis.
    Genesis,
    /// The event at this position.
    Index(usize),
    /// The last event with a timestamp at or before this one.
    AtOrBefore(U256),
    /// The last event in the snapshot.
    Latest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPolicy {
    pub from_reward: Bound,
    pub to_reward: Bound,
    pub from_stake: Bound,
    pub to_stake: Bound,
}

impl SelectionPolicy {
    /// Settle the reward events in `(from, to]` by position.
    pub fn reward_interval(from: Option<usize>, to: usize) -> Self {
        Self {
            from_reward: from.map(Bound::Index).unwrap_or(Bound::Default),
            to_reward: Bound::Index(to),
            ..Default::default()
        }
    }
}

fn resolve<E: ChainLink>(
    bound: Bound,
    events: &[E],
    default: impl FnOnce() -> Option<usize>,
) -> Result<Option<usize>, CheckpointError> {
    match bound {
        Bound::Default => Ok(default()),
        Bound::Genesis => Ok(None),
        Bound::Index(index) if index < events.len() => Ok(Some(index)),
        Bound::Index(index) => {
            Err(CheckpointError::OutOfRange { kind: E::KIND, index, len: events.len() })
        }
        Bound::AtOrBefore(timestamp) => {
            Ok(events.iter().rposition(|event| event.timestamp() <= timestamp))
        }
        Bound::Latest => Ok(events.len().checked_sub(1)),
    }
}

/// Reject an interval whose "from" bound lies after its "to" bound.
pub(crate) fn ensure_ordered(
    kind: ChainKind,
    from: Option<usize>,
    to: Option<usize>,
) -> Result<(), CheckpointError> {
    match (from, to) {
        (Some(from_pos), Some(to_pos)) if from_pos > to_pos => {
            Err(CheckpointError::InvertedInterval { kind, from, to })
        }
        (Some(_), None) => Err(CheckpointError::InvertedInterval { kind, from, to }),
        _ => Ok(()),
    }
}

/// Select the settlement checkpoints for `subject` over `snapshot`.
pub fn select_checkpoints(
    snapshot: &LedgerSnapshot,
    subject: Address,
    policy: &SelectionPolicy,
) -> Result<SettlementClaim, CheckpointError> {
    let stakes = snapshot.stake_events();
    let rewards = snapshot.reward_events();

    // First moment the subject holds a non-zero stake.
    let first_held = snapshot
        .user_stake_events(subject)
        .find(|(_, event)| event.total_user_stake > U256::ZERO)
        .map(|(_, event)| event.timestamp);

    let from_reward = resolve(policy.from_reward, rewards, || {
        let held_since = first_held?;
        rewards.iter().position(|reward| reward.timestamp >= held_since)
    })?;
    let to_reward = resolve(policy.to_reward, rewards, || rewards.len().checked_sub(1))?;
    ensure_ordered(ChainKind::Reward, from_reward, to_reward)?;

    let from_stake = resolve(policy.from_stake, stakes, || {
        snapshot.user_stake_events(subject).next().map(|(position, _)| position)
    })?;
    let to_stake = resolve(policy.to_stake, stakes, || stakes.len().checked_sub(1))?;
    ensure_ordered(ChainKind::Stake, from_stake, to_stake)?;

    let user_at_or_before = |bound: Option<usize>| {
        let bound = bound?;
        snapshot
            .user_stake_events(subject)
            .rev()
            .find(|(position, _)| *position <= bound)
            .map(|(position, event)| Checkpoint { position, event: *event })
    };
    let stake_at = |position: Option<usize>| {
        position.map(|position| Checkpoint { position, event: stakes[position] })
    };
    let reward_at = |position: Option<usize>| {
        position.map(|position| Checkpoint { position, event: rewards[position] })
    };

    let claim = SettlementClaim {
        user: subject,
        from_stake_checkpoint: stake_at(from_stake),
        to_stake_checkpoint: stake_at(to_stake),
        from_reward_checkpoint: reward_at(from_reward),
        to_reward_checkpoint: reward_at(to_reward),
        from_user_stake_checkpoint: user_at_or_before(from_stake),
        to_user_stake_checkpoint: user_at_or_before(to_stake),
    };
    tracing::debug!(
        "Selected checkpoints for {subject}: rewards ({from_reward:?}, {to_reward:?}], \
         stakes [{from_stake:?}, {to_stake:?}]"
    );
    Ok(claim)
}
