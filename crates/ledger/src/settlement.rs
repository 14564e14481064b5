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

//! Pro-rata reward settlement over a reward interval.

use alloy_primitives::{Address, B256, U256, U512};
use serde::{Deserialize, Serialize};

use crate::{
    chain::{ChainKind, ChainLink},
    checkpoint::{checkpoint_hash, ensure_ordered, Checkpoint, SettlementClaim},
    error::{CheckpointError, SettlementError},
    events::{RewardEvent, StakeEvent},
    ledger::LedgerSnapshot,
};

/// The subject's share of a single reward event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardContribution {
    pub reward_event: RewardEvent,
    /// Subject stake effective at the reward timestamp.
    pub user_stake_at_time: U256,
    /// Global stake effective at the reward timestamp.
    pub total_staked_at_time: U256,
    pub contribution: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub user: Address,
    pub total_rewards: U256,
    pub contributions: Vec<RewardContribution>,
}

/// The settled total for a claim together with the hashes of its six checkpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedResult {
    pub user: Address,
    pub total_rewards: U256,
    pub from_reward_chain_hash: B256,
    pub to_reward_chain_hash: B256,
    pub from_stake_chain_hash: B256,
    pub to_stake_chain_hash: B256,
    pub from_user_stake_chain_hash: B256,
    pub to_user_stake_chain_hash: B256,
    pub contributions: Vec<RewardContribution>,
}

/// `floor(amount * user_stake / total_staked)`, computed with a 512-bit intermediate product.
///
/// Returns zero when `total_staked` is zero.
pub fn pro_rata_share(
    amount: U256,
    user_stake: U256,
    total_staked: U256,
) -> Result<U256, SettlementError> {
    if total_staked.is_zero() {
        return Ok(U256::ZERO);
    }
    if user_stake > total_staked {
        return Err(SettlementError::StakeExceedsTotal {
            user_stake,
            total_staked,
            timestamp: U256::ZERO,
        });
    }
    let product: U512 = amount.widening_mul(user_stake);
    let quotient = product / U512::from(total_staked);
    // user_stake <= total_staked bounds the quotient by amount.
    Ok(quotient.to::<U256>())
}

fn ensure_chronological<E: ChainLink>(events: &[E]) -> Result<(), SettlementError> {
    match events.windows(2).position(|pair| pair[1].timestamp() < pair[0].timestamp()) {
        Some(index) => Err(SettlementError::Unordered { kind: E::KIND, index: index + 1 }),
        None => Ok(()),
    }
}

/// Settle `rewards` for `subject` against the global stake history.
///
/// Each reward is paired with the latest stake event whose timestamp is at or before the
/// reward timestamp. Both inputs must be ordered by timestamp.
pub fn settle(
    subject: Address,
    rewards: &[RewardEvent],
    stakes: &[StakeEvent],
) -> Result<Settlement, SettlementError> {
    ensure_chronological(rewards)?;
    ensure_chronological(stakes)?;

    let mut cursor = 0;
    let mut user_stake = U256::ZERO;
    let mut total_staked = U256::ZERO;
    let mut total_rewards = U256::ZERO;
    let mut contributions = Vec::with_capacity(rewards.len());

    for reward in rewards {
        while let Some(stake) = stakes.get(cursor).filter(|s| s.timestamp <= reward.timestamp) {
            if stake.user == subject {
                user_stake = stake.total_user_stake;
            }
            total_staked = stake.total_staked;
            cursor += 1;
        }

        let contribution =
            pro_rata_share(reward.amount, user_stake, total_staked).map_err(|err| match err {
                SettlementError::StakeExceedsTotal { user_stake, total_staked, .. } => {
                    SettlementError::StakeExceedsTotal {
                        user_stake,
                        total_staked,
                        timestamp: reward.timestamp,
                    }
                }
                other => other,
            })?;
        total_rewards =
            total_rewards.checked_add(contribution).ok_or(SettlementError::Overflow)?;
        contributions.push(RewardContribution {
            reward_event: *reward,
            user_stake_at_time: user_stake,
            total_staked_at_time: total_staked,
            contribution,
        });
    }

    tracing::debug!(
        "Settled {} reward events for {subject}: total {total_rewards}",
        contributions.len()
    );
    Ok(Settlement { user: subject, total_rewards, contributions })
}

/// The reward events after the "from" checkpoint, up to and including the "to" checkpoint.
///
/// An absent "from" starts at genesis. An absent "to" selects nothing.
pub fn reward_interval<'a>(
    rewards: &'a [RewardEvent],
    claim: &SettlementClaim,
) -> Result<&'a [RewardEvent], CheckpointError> {
    let from = claim.from_reward_checkpoint.as_ref().map(|checkpoint| checkpoint.position);
    let Some(to) = claim.to_reward_checkpoint.as_ref().map(|checkpoint| checkpoint.position) else {
        if from.is_some() {
            let kind = ChainKind::Reward;
            return Err(CheckpointError::InvertedInterval { kind, from, to: None });
        }
        return Ok(&[]);
    };
    if to >= rewards.len() {
        return Err(CheckpointError::OutOfRange {
            kind: ChainKind::Reward,
            index: to,
            len: rewards.len(),
        });
    }
    match from {
        Some(from_pos) if from_pos > to => Err(CheckpointError::InvertedInterval {
            kind: ChainKind::Reward,
            from,
            to: Some(to),
        }),
        Some(from_pos) => Ok(&rewards[from_pos + 1..=to]),
        None => Ok(&rewards[..=to]),
    }
}

fn check_against<E: ChainLink + PartialEq>(
    checkpoint: Option<&Checkpoint<E>>,
    events: &[E],
) -> Result<(), SettlementError> {
    let Some(checkpoint) = checkpoint else { return Ok(()) };
    match events.get(checkpoint.position) {
        Some(event) if *event == checkpoint.event => Ok(()),
        _ => Err(SettlementError::CheckpointMismatch {
            kind: E::KIND,
            position: checkpoint.position,
        }),
    }
}

fn check_subject(
    checkpoint: Option<&Checkpoint<StakeEvent>>,
    subject: Address,
) -> Result<(), SettlementError> {
    match checkpoint {
        Some(checkpoint) if checkpoint.event.user != subject => {
            Err(SettlementError::ForeignUserCheckpoint {
                position: checkpoint.position,
                subject,
                found: checkpoint.event.user,
            })
        }
        _ => Ok(()),
    }
}

/// Settle `claim` against `snapshot` and produce the expected result.
///
/// Every checkpoint in the claim must reference the event at its position in the snapshot,
/// the user stake checkpoints must belong to the claim's user, and neither stake interval may
/// be inverted.
pub fn settle_claim(
    snapshot: &LedgerSnapshot,
    claim: &SettlementClaim,
) -> Result<ExpectedResult, SettlementError> {
    let stakes = snapshot.stake_events();
    let rewards = snapshot.reward_events();

    check_against(claim.from_stake_checkpoint.as_ref(), stakes)?;
    check_against(claim.to_stake_checkpoint.as_ref(), stakes)?;
    check_against(claim.from_user_stake_checkpoint.as_ref(), stakes)?;
    check_against(claim.to_user_stake_checkpoint.as_ref(), stakes)?;
    check_against(claim.from_reward_checkpoint.as_ref(), rewards)?;
    check_against(claim.to_reward_checkpoint.as_ref(), rewards)?;
    check_subject(claim.from_user_stake_checkpoint.as_ref(), claim.user)?;
    check_subject(claim.to_user_stake_checkpoint.as_ref(), claim.user)?;

    let position = |checkpoint: &Option<Checkpoint<StakeEvent>>| {
        checkpoint.as_ref().map(|checkpoint| checkpoint.position)
    };
    ensure_ordered(
        ChainKind::Stake,
        position(&claim.from_stake_checkpoint),
        position(&claim.to_stake_checkpoint),
    )?;
    ensure_ordered(
        ChainKind::Stake,
        position(&claim.from_user_stake_checkpoint),
        position(&claim.to_user_stake_checkpoint),
    )?;

    let interval = reward_interval(rewards, claim)?;
    let settlement = settle(claim.user, interval, stakes)?;

    Ok(ExpectedResult {
        user: claim.user,
        total_rewards: settlement.total_rewards,
        from_reward_chain_hash: checkpoint_hash(claim.from_reward_checkpoint.as_ref()),
        to_reward_chain_hash: checkpoint_hash(claim.to_reward_checkpoint.as_ref()),
        from_stake_chain_hash: checkpoint_hash(claim.from_stake_checkpoint.as_ref()),
        to_stake_chain_hash: checkpoint_hash(claim.to_stake_checkpoint.as_ref()),
        from_user_stake_chain_hash: checkpoint_hash(claim.from_user_stake_checkpoint.as_ref()),
        to_user_stake_chain_hash: checkpoint_hash(claim.to_user_stake_checkpoint.as_ref()),
        contributions: settlement.contributions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        checkpoint::{select_checkpoints, SelectionPolicy},
        events::RewardFields,
        ledger::LedgerState,
    };

    const U1: Address = Address::repeat_byte(0x01);
    const U2: Address = Address::repeat_byte(0x02);
    const U3: Address = Address::repeat_byte(0x03);

    fn u(value: u64) -> U256 {
        U256::from(value)
    }

    #[test]
    fn two_stakers_split_a_reward() {
        let mut state = LedgerState::new();
        let stakes =
            vec![state.stake(U1, u(10), u(100)).unwrap(), state.stake(U2, u(20), u(110)).unwrap()];
        let rewards = vec![state.add_rewards(u(9), u(120)).unwrap()];

        let first = settle(U1, &rewards, &stakes).unwrap();
        let second = settle(U2, &rewards, &stakes).unwrap();
        assert_eq!(first.total_rewards, u(3));
        assert_eq!(second.total_rewards, u(6));
        assert_eq!(first.contributions[0].user_stake_at_time, u(10));
        assert_eq!(first.contributions[0].total_staked_at_time, u(30));
    }

    #[test]
    fn stake_at_reward_timestamp_is_effective() {
        let mut state = LedgerState::new();
        let stakes =
            vec![state.stake(U1, u(10), u(100)).unwrap(), state.stake(U2, u(10), u(120)).unwrap()];
        let rewards = vec![state.add_rewards(u(10), u(120)).unwrap()];

        assert_eq!(settle(U1, &rewards, &stakes).unwrap().total_rewards, u(5));
        assert_eq!(settle(U2, &rewards, &stakes).unwrap().total_rewards, u(5));
    }

    #[test]
    fn zero_total_stake_contributes_nothing() {
        let rewards = vec![RewardFields { amount: u(50), total_rewards: u(50), timestamp: u(10) }
            .link(B256::ZERO)];
        let settlement = settle(U1, &rewards, &[]).unwrap();
        assert_eq!(settlement.total_rewards, U256::ZERO);
        assert_eq!(settlement.contributions.len(), 1);
        assert_eq!(pro_rata_share(u(50), U256::ZERO, U256::ZERO).unwrap(), U256::ZERO);
    }

    #[test]
    fn user_stake_above_total_is_rejected() {
        assert!(matches!(
            pro_rata_share(u(1), u(2), u(1)),
            Err(SettlementError::StakeExceedsTotal { .. })
        ));
    }

    #[test]
    fn large_amounts_do_not_overflow() {
        let share = pro_rata_share(U256::MAX, U256::MAX - u(1), U256::MAX).unwrap();
        assert_eq!(share, U256::MAX - u(1));
    }

    #[test]
    fn unordered_rewards_are_rejected() {
        let first = RewardFields { amount: u(1), total_rewards: u(1), timestamp: u(20) }
            .link(B256::ZERO);
        let second = RewardFields { amount: u(1), total_rewards: u(2), timestamp: u(10) }
            .link(first.current_reward_chain_hash);
        assert_eq!(
            settle(U1, &[first, second], &[]),
            Err(SettlementError::Unordered { kind: ChainKind::Reward, index: 1 })
        );
    }

    fn scenario() -> LedgerSnapshot {
        let mut state = LedgerState::new();
        let stakes = vec![
            state.stake(U1, u(10), u(100)).unwrap(),
            state.stake(U2, u(30), u(110)).unwrap(),
            state.unstake(U1, u(10), u(130)).unwrap(),
        ];
        let rewards = vec![
            state.add_rewards(u(8), u(105)).unwrap(),
            state.add_rewards(u(8), u(120)).unwrap(),
            state.add_rewards(u(8), u(140)).unwrap(),
        ];
        LedgerSnapshot::new(stakes, rewards)
    }

    #[test]
    fn settle_claim_uses_exclusive_from() {
        let snapshot = scenario();
        let claim = select_checkpoints(&snapshot, U1, &SelectionPolicy::default()).unwrap();
        let expected = settle_claim(&snapshot, &claim).unwrap();

        // Interval is (0, 2]: reward 1 pays 8 * 10 / 40, reward 2 pays nothing.
        assert_eq!(expected.contributions.len(), 2);
        assert_eq!(expected.total_rewards, u(2));
        let stakes = snapshot.stake_events();
        assert_eq!(
            expected.to_reward_chain_hash,
            snapshot.reward_events()[2].current_reward_chain_hash
        );
        assert_eq!(expected.from_user_stake_chain_hash, stakes[0].current_chain_hash);
        assert_eq!(expected.to_user_stake_chain_hash, stakes[2].current_chain_hash);
    }

    #[test]
    fn subject_without_stake_settles_to_zero() {
        let snapshot = scenario();
        let claim = select_checkpoints(&snapshot, U3, &SelectionPolicy::default()).unwrap();
        let expected = settle_claim(&snapshot, &claim).unwrap();

        assert_eq!(expected.total_rewards, U256::ZERO);
        assert_eq!(expected.from_user_stake_chain_hash, B256::ZERO);
        assert_eq!(expected.to_user_stake_chain_hash, B256::ZERO);
        assert_eq!(expected.from_reward_chain_hash, B256::ZERO);
    }

    #[test]
    fn mismatched_checkpoints_are_rejected() {
        let snapshot = scenario();
        let mut claim = select_checkpoints(&snapshot, U1, &SelectionPolicy::default()).unwrap();
        claim.to_reward_checkpoint.as_mut().unwrap().event.amount = u(1000);
        assert_eq!(
            settle_claim(&snapshot, &claim),
            Err(SettlementError::CheckpointMismatch { kind: ChainKind::Reward, position: 2 })
        );

        let mut claim = select_checkpoints(&snapshot, U1, &SelectionPolicy::default()).unwrap();
        claim.to_user_stake_checkpoint =
            Some(Checkpoint { position: 1, event: snapshot.stake_events()[1] });
        assert_eq!(
            settle_claim(&snapshot, &claim),
            Err(SettlementError::ForeignUserCheckpoint { position: 1, subject: U1, found: U2 })
        );
    }

    #[test]
    fn inverted_stake_intervals_are_rejected() {
        let snapshot = scenario();
        let claim = select_checkpoints(&snapshot, U1, &SelectionPolicy::default()).unwrap();
        let inverted = |from, to| -> Result<ExpectedResult, SettlementError> {
            Err(SettlementError::Interval(CheckpointError::InvertedInterval {
                kind: ChainKind::Stake,
                from,
                to,
            }))
        };

        let mut swapped = claim.clone();
        std::mem::swap(&mut swapped.from_stake_checkpoint, &mut swapped.to_stake_checkpoint);
        assert_eq!(settle_claim(&snapshot, &swapped), inverted(Some(2), Some(0)));

        let mut swapped = claim.clone();
        std::mem::swap(
            &mut swapped.from_user_stake_checkpoint,
            &mut swapped.to_user_stake_checkpoint,
        );
        assert_eq!(settle_claim(&snapshot, &swapped), inverted(Some(2), Some(0)));

        let mut open = claim;
        open.to_user_stake_checkpoint = None;
        assert_eq!(settle_claim(&snapshot, &open), inverted(Some(0), None));
    }

    #[test]
    fn interval_bounds() {
        let snapshot = scenario();
        let rewards = snapshot.reward_events();
        let mut claim = SettlementClaim::empty(U1);
        assert!(reward_interval(rewards, &claim).unwrap().is_empty());

        claim.to_reward_checkpoint = Some(Checkpoint { position: 1, event: rewards[1] });
        assert_eq!(reward_interval(rewards, &claim).unwrap(), &rewards[..2]);

        claim.from_reward_checkpoint = Some(Checkpoint { position: 1, event: rewards[1] });
        assert!(reward_interval(rewards, &claim).unwrap().is_empty());

        claim.from_reward_checkpoint = Some(Checkpoint { position: 2, event: rewards[2] });
        assert!(matches!(
            reward_interval(rewards, &claim),
            Err(CheckpointError::InvertedInterval { .. })
        ));
    }
}
