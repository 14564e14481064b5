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

//! Construction and verification of the stake and reward hash chains.
//!
//! Each link is the keccak256 hash of the tightly packed event fields followed by the previous
//! link, matching Solidity's `keccak256(abi.encodePacked(...))` as emitted by the staking and
//! reward contracts:
//!
//! ```text
//! stake:  address user | bool isStake | uint256 amount | uint256 totalStaked
//!         | uint256 totalUserStake | uint256 timestamp | bytes32 previous    (181 bytes)
//! reward: uint256 amount | uint256 totalRewards | uint256 timestamp
//!         | bytes32 previous                                                 (128 bytes)
//! ```
//!
//! The first link of either chain uses the all-zero digest as its previous hash.

use std::{fmt, marker::PhantomData};

use alloy_primitives::{keccak256, B256, U256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ChainIntegrityError, LinkFault},
    events::{RewardEvent, RewardFields, StakeEvent, StakeFields},
};

/// Previous hash of the first event in a chain.
pub const GENESIS_HASH: B256 = B256::ZERO;

/// Packed preimage length of a stake link.
pub const STAKE_PREIMAGE_LEN: usize = 20 + 1 + 4 * 32 + 32;
/// Packed preimage length of a reward link.
pub const REWARD_PREIMAGE_LEN: usize = 3 * 32 + 32;

/// Identifies one of the two independently linked chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    Stake,
    Reward,
}

impl ChainKind {
    /// Length of the packed preimage hashed for each link of this chain.
    pub const fn preimage_len(self) -> usize {
        match self {
            ChainKind::Stake => STAKE_PREIMAGE_LEN,
            ChainKind::Reward => REWARD_PREIMAGE_LEN,
        }
    }
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainKind::Stake => f.write_str("stake"),
            ChainKind::Reward => f.write_str("reward"),
        }
    }
}

/// Hash a packed link preimage for the given chain.
///
/// The preimage length is fixed per chain, so a preimage assembled from the other chain's
/// fields (or a mix of both) is rejected rather than hashed.
pub fn hash_preimage(kind: ChainKind, preimage: &[u8]) -> Result<B256, LinkFault> {
    if preimage.len() != kind.preimage_len() {
        return Err(LinkFault::PreimageLength {
            expected: kind.preimage_len(),
            actual: preimage.len(),
        });
    }
    Ok(keccak256(preimage))
}

pub fn stake_preimage(fields: &StakeFields, previous: B256) -> Vec<u8> {
    (
        fields.user,
        fields.is_stake,
        fields.amount,
        fields.total_staked,
        fields.total_user_stake,
        fields.timestamp,
        previous,
    )
        .abi_encode_packed()
}

pub fn reward_preimage(fields: &RewardFields, previous: B256) -> Vec<u8> {
    (fields.amount, fields.total_rewards, fields.timestamp, previous).abi_encode_packed()
}

/// Derive the stake link that follows `previous` for the given fields.
pub fn stake_link_hash(fields: &StakeFields, previous: B256) -> B256 {
    keccak256(stake_preimage(fields, previous))
}

/// Derive the reward link that follows `previous` for the given fields.
pub fn reward_link_hash(fields: &RewardFields, previous: B256) -> B256 {
    keccak256(reward_preimage(fields, previous))
}

impl StakeFields {
    /// Append these fields to a stake chain whose head is `previous`.
    pub fn link(self, previous: B256) -> StakeEvent {
        let current = stake_link_hash(&self, previous);
        StakeEvent {
            user: self.user,
            is_stake: self.is_stake,
            amount: self.amount,
            total_staked: self.total_staked,
            total_user_stake: self.total_user_stake,
            timestamp: self.timestamp,
            previous_chain_hash: previous,
            current_chain_hash: current,
        }
    }
}

impl RewardFields {
    /// Append these fields to a reward chain whose head is `previous`.
    pub fn link(self, previous: B256) -> RewardEvent {
        let current = reward_link_hash(&self, previous);
        RewardEvent {
            amount: self.amount,
            total_rewards: self.total_rewards,
            timestamp: self.timestamp,
            previous_reward_chain_hash: previous,
            current_reward_chain_hash: current,
        }
    }
}

/// An event that forms one link of a hash chain.
pub trait ChainLink {
    const KIND: ChainKind;

    /// The packed preimage built from this event's fields and its claimed previous hash.
    fn preimage(&self) -> Vec<u8>;

    fn previous_hash(&self) -> B256;

    fn current_hash(&self) -> B256;

    fn timestamp(&self) -> U256;

    /// Recompute the link hash from the event's fields.
    fn compute_hash(&self) -> Result<B256, LinkFault> {
        hash_preimage(Self::KIND, &self.preimage())
    }

    /// Check that this event extends a chain whose head is `prior` and that its stored hash is
    /// the one derived from its fields.
    fn check_link(&self, prior: B256) -> Result<(), LinkFault> {
        if self.previous_hash() != prior {
            return Err(LinkFault::BrokenLink { expected: prior, found: self.previous_hash() });
        }
        let computed = self.compute_hash()?;
        if computed != self.current_hash() {
            return Err(LinkFault::HashMismatch { computed, stored: self.current_hash() });
        }
        Ok(())
    }
}

impl ChainLink for StakeEvent {
    const KIND: ChainKind = ChainKind::Stake;

    fn preimage(&self) -> Vec<u8> {
        stake_preimage(&self.fields(), self.previous_chain_hash)
    }

    fn previous_hash(&self) -> B256 {
        self.previous_chain_hash
    }

    fn current_hash(&self) -> B256 {
        self.current_chain_hash
    }

    fn timestamp(&self) -> U256 {
        self.timestamp
    }
}

impl ChainLink for RewardEvent {
    const KIND: ChainKind = ChainKind::Reward;

    fn preimage(&self) -> Vec<u8> {
        reward_preimage(&self.fields(), self.previous_reward_chain_hash)
    }

    fn previous_hash(&self) -> B256 {
        self.previous_reward_chain_hash
    }

    fn current_hash(&self) -> B256 {
        self.current_reward_chain_hash
    }

    fn timestamp(&self) -> U256 {
        self.timestamp
    }
}

/// Returns true if `event` is a valid successor of `prior`.
pub fn verify_link<E: ChainLink>(event: &E, prior: B256) -> bool {
    event.check_link(prior).is_ok()
}

/// Incremental verifier for a chain, starting at genesis.
///
/// Once a link fails, the verifier stays failed and reports the first failure for every
/// subsequent event.
#[derive(Debug, Clone)]
pub struct ChainVerifier<E> {
    head: B256,
    verified: usize,
    failure: Option<ChainIntegrityError>,
    _event: PhantomData<fn(&E)>,
}

impl<E: ChainLink> Default for ChainVerifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ChainLink> ChainVerifier<E> {
    pub const fn new() -> Self {
        Self { head: GENESIS_HASH, verified: 0, failure: None, _event: PhantomData }
    }

    /// Verify the next event in the chain and advance the head.
    pub fn push(&mut self, event: &E) -> Result<(), ChainIntegrityError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        match event.check_link(self.head) {
            Ok(()) => {
                self.head = event.current_hash();
                self.verified += 1;
                Ok(())
            }
            Err(fault) => {
                let err = ChainIntegrityError { kind: E::KIND, index: self.verified, fault };
                tracing::warn!("{err}");
                self.failure = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Hash of the last verified event, or the genesis hash.
    pub fn head(&self) -> B256 {
        self.head
    }

    /// Number of events verified so far.
    pub fn verified(&self) -> usize {
        self.verified
    }
}

/// Re-derive every link of `events` from genesis and return the chain head.
pub fn verify_chain<'a, E, I>(events: I) -> Result<B256, ChainIntegrityError>
where
    E: ChainLink + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let mut verifier = ChainVerifier::<E>::new();
    for event in events {
        verifier.push(event)?;
    }
    tracing::debug!("Verified {} {} events", verifier.verified(), E::KIND);
    Ok(verifier.head())
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, Address, U256};
    use tracing_test::traced_test;

    use super::*;

    const USER: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

    fn stake_fields(amount: u64, total_staked: u64, total_user: u64, ts: u64) -> StakeFields {
        StakeFields {
            user: USER,
            is_stake: true,
            amount: U256::from(amount),
            total_staked: U256::from(total_staked),
            total_user_stake: U256::from(total_user),
            timestamp: U256::from(ts),
        }
    }

    fn reward_chain(amounts: &[u64]) -> Vec<RewardEvent> {
        let mut head = GENESIS_HASH;
        let mut total = U256::ZERO;
        amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                total += U256::from(*amount);
                let event = RewardFields {
                    amount: U256::from(*amount),
                    total_rewards: total,
                    timestamp: U256::from(1_000 + i as u64),
                }
                .link(head);
                head = event.current_reward_chain_hash;
                event
            })
            .collect()
    }

    #[test]
    fn stake_preimage_is_tightly_packed() {
        let fields = stake_fields(10, 10, 10, 100);
        let preimage = stake_preimage(&fields, GENESIS_HASH);
        assert_eq!(preimage.len(), STAKE_PREIMAGE_LEN);

        let mut expected = Vec::new();
        expected.extend_from_slice(USER.as_slice());
        expected.push(1);
        for value in [10u64, 10, 10, 100] {
            expected.extend_from_slice(&U256::from(value).to_be_bytes::<32>());
        }
        expected.extend_from_slice(GENESIS_HASH.as_slice());
        assert_eq!(preimage, expected);
    }

    #[test]
    fn genesis_stake_link() {
        let fields = stake_fields(10, 10, 10, 100);
        let event = fields.link(GENESIS_HASH);

        let expected = keccak256(stake_preimage(&fields, B256::ZERO));
        assert_eq!(event.current_chain_hash, expected);
        assert_eq!(event.previous_chain_hash, B256::ZERO);
        assert!(verify_link(&event, GENESIS_HASH));
    }

    #[test]
    fn reward_preimage_is_tightly_packed() {
        let fields = RewardFields {
            amount: U256::from(9),
            total_rewards: U256::from(9),
            timestamp: U256::from(200),
        };
        assert_eq!(reward_preimage(&fields, GENESIS_HASH).len(), REWARD_PREIMAGE_LEN);
    }

    #[test]
    fn hashing_is_deterministic() {
        let a = stake_fields(5, 5, 5, 42).link(GENESIS_HASH);
        let b = stake_fields(5, 5, 5, 42).link(GENESIS_HASH);
        assert_eq!(a.current_chain_hash, b.current_chain_hash);

        let c = stake_fields(5, 5, 5, 43).link(GENESIS_HASH);
        assert_ne!(a.current_chain_hash, c.current_chain_hash);
    }

    #[test]
    fn mixed_preimages_are_rejected() {
        let stake = stake_fields(1, 1, 1, 1).link(GENESIS_HASH);
        let reward = reward_chain(&[1]).remove(0);

        assert_eq!(
            hash_preimage(ChainKind::Reward, &stake.preimage()),
            Err(LinkFault::PreimageLength {
                expected: REWARD_PREIMAGE_LEN,
                actual: STAKE_PREIMAGE_LEN
            })
        );
        assert!(hash_preimage(ChainKind::Stake, &reward.preimage()).is_err());

        let mut mixed = stake.preimage()[..21].to_vec();
        mixed.extend_from_slice(&reward.preimage());
        assert!(hash_preimage(ChainKind::Stake, &mixed).is_err());
        assert!(hash_preimage(ChainKind::Reward, &mixed).is_err());
    }

    #[test]
    fn verify_rejects_wrong_prior() {
        let first = stake_fields(10, 10, 10, 100).link(GENESIS_HASH);
        let second = stake_fields(5, 15, 15, 101).link(first.current_chain_hash);

        assert!(verify_link(&second, first.current_chain_hash));
        assert!(!verify_link(&second, GENESIS_HASH));
        assert!(matches!(second.check_link(GENESIS_HASH), Err(LinkFault::BrokenLink { .. })));
    }

    #[test]
    fn verify_rejects_altered_fields() {
        let mut event = stake_fields(10, 10, 10, 100).link(GENESIS_HASH);
        event.amount = U256::from(11);
        assert!(matches!(event.check_link(GENESIS_HASH), Err(LinkFault::HashMismatch { .. })));
    }

    #[test]
    fn verify_reward_chain() {
        let chain = reward_chain(&[9, 3, 7, 1]);
        let head = verify_chain(&chain).unwrap();
        assert_eq!(head, chain.last().unwrap().current_reward_chain_hash);
        assert_eq!(verify_chain::<RewardEvent, _>(&[]).unwrap(), GENESIS_HASH);
    }

    #[test]
    fn verification_fails_at_first_bad_link() {
        let mut chain = reward_chain(&[1, 2, 3, 4, 5, 6, 7, 8]);
        chain[5].current_reward_chain_hash = B256::repeat_byte(0xab);

        let err = verify_chain(&chain).unwrap_err();
        assert_eq!(err.kind, ChainKind::Reward);
        assert_eq!(err.index, 5);
        assert!(matches!(err.fault, LinkFault::HashMismatch { .. }));
    }

    #[test]
    #[traced_test]
    fn verifier_stays_failed() {
        let mut chain = reward_chain(&[1, 2, 3]);
        chain[1].amount = U256::from(100);

        let mut verifier = ChainVerifier::new();
        verifier.push(&chain[0]).unwrap();
        let first = verifier.push(&chain[1]).unwrap_err();
        let second = verifier.push(&chain[2]).unwrap_err();
        assert_eq!(first, second);
        assert_eq!(verifier.verified(), 1);
        assert_eq!(verifier.head(), chain[0].current_reward_chain_hash);
        assert!(logs_contain("reward chain integrity failure at index 1"));
    }
}
