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

//! Canonical encoding of ledger records for consumption by an external verifier.
//!
//! Every field is encoded according to its [FieldKind]:
//!
//! * `uint256` as four 64-bit words, least significant word first;
//! * `address` as exactly 20 bytes and `digest` as exactly 32 bytes;
//! * `bool` as `0` or `1`.
//!
//! Records are encoded into serde-serializable wire structs through [CanonicalEncode]. Absent
//! checkpoints are encoded with a presence flag of `0`, an all-zero position, and an all-zero
//! event, so that absence can never be confused with a checkpoint at genesis. The
//! [DocumentSchema] names every field of every record, including nested records and lists.

use std::fmt;

use alloy_primitives::{Address, B256, U256};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use self::FieldShape::{List, Record, Value};
use crate::{
    checkpoint::{Checkpoint, SettlementClaim},
    error::EncodingError,
    events::{RewardEvent, StakeEvent},
    ledger::LedgerSnapshot,
    settlement::{ExpectedResult, RewardContribution},
};

/// Version of the [SettlementDocument] layout produced by this encoder.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Address,
    Uint256,
    Digest,
    Bool,
}

impl FieldKind {
    /// Width of the field in the packed hash preimage.
    pub const fn packed_len(self) -> usize {
        match self {
            FieldKind::Address => 20,
            FieldKind::Uint256 | FieldKind::Digest => 32,
            FieldKind::Bool => 1,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Address => "address",
            FieldKind::Uint256 => "uint256",
            FieldKind::Digest => "digest",
            FieldKind::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// The shape of a record field: a primitive value, a nested record, or a list of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Value(FieldKind),
    Record(&'static str),
    List(&'static str),
}

/// A primitive with a canonical wire form.
pub trait Canonical: Sized {
    const KIND: FieldKind;

    type Wire: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned;

    fn encode(&self) -> Self::Wire;

    /// Decode a wire value, naming `field` in any error.
    fn decode(field: &'static str, wire: &Self::Wire) -> Result<Self, EncodingError>;
}

impl Canonical for U256 {
    const KIND: FieldKind = FieldKind::Uint256;
    type Wire = [u64; 4];

    fn encode(&self) -> [u64; 4] {
        *self.as_limbs()
    }

    fn decode(_field: &'static str, wire: &[u64; 4]) -> Result<Self, EncodingError> {
        Ok(U256::from_limbs(*wire))
    }
}

fn check_len(field: &'static str, kind: FieldKind, bytes: &[u8]) -> Result<(), EncodingError> {
    if bytes.len() != kind.packed_len() {
        return Err(EncodingError::Length {
            field,
            kind,
            expected: kind.packed_len(),
            actual: bytes.len(),
        });
    }
    Ok(())
}

impl Canonical for Address {
    const KIND: FieldKind = FieldKind::Address;
    type Wire = Vec<u8>;

    fn encode(&self) -> Vec<u8> {
        self.to_vec()
    }

    fn decode(field: &'static str, wire: &Vec<u8>) -> Result<Self, EncodingError> {
        check_len(field, Self::KIND, wire)?;
        Ok(Address::from_slice(wire))
    }
}

impl Canonical for B256 {
    const KIND: FieldKind = FieldKind::Digest;
    type Wire = Vec<u8>;

    fn encode(&self) -> Vec<u8> {
        self.to_vec()
    }

    fn decode(field: &'static str, wire: &Vec<u8>) -> Result<Self, EncodingError> {
        check_len(field, Self::KIND, wire)?;
        Ok(B256::from_slice(wire))
    }
}

impl Canonical for bool {
    const KIND: FieldKind = FieldKind::Bool;
    type Wire = u8;

    fn encode(&self) -> u8 {
        u8::from(*self)
    }

    fn decode(field: &'static str, wire: &u8) -> Result<Self, EncodingError> {
        match wire {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(EncodingError::InvalidBool { field, value: *value }),
        }
    }
}

/// Decode a hex identifier of exactly `N` bytes, with or without a `0x` prefix.
pub fn hex_to_fixed<const N: usize>(
    field: &'static str,
    kind: FieldKind,
    value: &str,
) -> Result<[u8; N], EncodingError> {
    let bytes = hex::decode(value.strip_prefix("0x").unwrap_or(value))
        .map_err(|source| EncodingError::InvalidHex { field, source })?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| EncodingError::Length {
        field,
        kind,
        expected: N,
        actual: bytes.len(),
    })
}

pub fn parse_address(field: &'static str, value: &str) -> Result<Address, EncodingError> {
    hex_to_fixed::<20>(field, FieldKind::Address, value).map(Address::from)
}

pub fn parse_digest(field: &'static str, value: &str) -> Result<B256, EncodingError> {
    hex_to_fixed::<32>(field, FieldKind::Digest, value).map(B256::from)
}

/// A record with a canonical wire form.
pub trait CanonicalEncode: Sized {
    /// Record name used in the document schema.
    const RECORD: &'static str;

    /// Field names and shapes, in wire order.
    const FIELDS: &'static [(&'static str, FieldShape)];

    type Encoded: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned;

    fn encode(&self) -> Self::Encoded;

    fn decode(encoded: &Self::Encoded) -> Result<Self, EncodingError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedStakeEvent {
    pub user: Vec<u8>,
    pub is_stake: u8,
    pub amount: [u64; 4],
    pub total_staked: [u64; 4],
    pub total_user_stake: [u64; 4],
    pub timestamp: [u64; 4],
    pub previous_chain_hash: Vec<u8>,
    pub current_chain_hash: Vec<u8>,
}

impl CanonicalEncode for StakeEvent {
    const RECORD: &'static str = "stakeEvent";
    const FIELDS: &'static [(&'static str, FieldShape)] = &[
        ("user", Value(FieldKind::Address)),
        ("isStake", Value(FieldKind::Bool)),
        ("amount", Value(FieldKind::Uint256)),
        ("totalStaked", Value(FieldKind::Uint256)),
        ("totalUserStake", Value(FieldKind::Uint256)),
        ("timestamp", Value(FieldKind::Uint256)),
        ("previousChainHash", Value(FieldKind::Digest)),
        ("currentChainHash", Value(FieldKind::Digest)),
    ];
    type Encoded = EncodedStakeEvent;

    fn encode(&self) -> EncodedStakeEvent {
        EncodedStakeEvent {
            user: self.user.encode(),
            is_stake: self.is_stake.encode(),
            amount: self.amount.encode(),
            total_staked: self.total_staked.encode(),
            total_user_stake: self.total_user_stake.encode(),
            timestamp: self.timestamp.encode(),
            previous_chain_hash: self.previous_chain_hash.encode(),
            current_chain_hash: self.current_chain_hash.encode(),
        }
    }

    fn decode(encoded: &EncodedStakeEvent) -> Result<Self, EncodingError> {
        Ok(StakeEvent {
            user: Address::decode("user", &encoded.user)?,
            is_stake: bool::decode("isStake", &encoded.is_stake)?,
            amount: U256::decode("amount", &encoded.amount)?,
            total_staked: U256::decode("totalStaked", &encoded.total_staked)?,
            total_user_stake: U256::decode("totalUserStake", &encoded.total_user_stake)?,
            timestamp: U256::decode("timestamp", &encoded.timestamp)?,
            previous_chain_hash: B256::decode("previousChainHash", &encoded.previous_chain_hash)?,
            current_chain_hash: B256::decode("currentChainHash", &encoded.current_chain_hash)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedRewardEvent {
    pub amount: [u64; 4],
    pub total_rewards: [u64; 4],
    pub timestamp: [u64; 4],
    pub previous_reward_chain_hash: Vec<u8>,
    pub current_reward_chain_hash: Vec<u8>,
}

impl CanonicalEncode for RewardEvent {
    const RECORD: &'static str = "rewardEvent";
    const FIELDS: &'static [(&'static str, FieldShape)] = &[
        ("amount", Value(FieldKind::Uint256)),
        ("totalRewards", Value(FieldKind::Uint256)),
        ("timestamp", Value(FieldKind::Uint256)),
        ("previousRewardChainHash", Value(FieldKind::Digest)),
        ("currentRewardChainHash", Value(FieldKind::Digest)),
    ];
    type Encoded = EncodedRewardEvent;

    fn encode(&self) -> EncodedRewardEvent {
        EncodedRewardEvent {
            amount: self.amount.encode(),
            total_rewards: self.total_rewards.encode(),
            timestamp: self.timestamp.encode(),
            previous_reward_chain_hash: self.previous_reward_chain_hash.encode(),
            current_reward_chain_hash: self.current_reward_chain_hash.encode(),
        }
    }

    fn decode(encoded: &EncodedRewardEvent) -> Result<Self, EncodingError> {
        Ok(RewardEvent {
            amount: U256::decode("amount", &encoded.amount)?,
            total_rewards: U256::decode("totalRewards", &encoded.total_rewards)?,
            timestamp: U256::decode("timestamp", &encoded.timestamp)?,
            previous_reward_chain_hash: B256::decode(
                "previousRewardChainHash",
                &encoded.previous_reward_chain_hash,
            )?,
            current_reward_chain_hash: B256::decode(
                "currentRewardChainHash",
                &encoded.current_reward_chain_hash,
            )?,
        })
    }
}

/// An event that can stand in for an absent checkpoint.
pub trait SentinelEvent: CanonicalEncode + Copy + PartialEq {
    /// Record name of a checkpoint over this event.
    const CHECKPOINT: &'static str;

    fn sentinel() -> Self;
}

impl SentinelEvent for StakeEvent {
    const CHECKPOINT: &'static str = "stakeCheckpoint";

    fn sentinel() -> Self {
        StakeEvent::sentinel()
    }
}

impl SentinelEvent for RewardEvent {
    const CHECKPOINT: &'static str = "rewardCheckpoint";

    fn sentinel() -> Self {
        RewardEvent::sentinel()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedCheckpoint<E> {
    pub present: u8,
    pub position: [u64; 4],
    pub event: E,
}

impl<E: SentinelEvent> CanonicalEncode for Option<Checkpoint<E>> {
    const RECORD: &'static str = E::CHECKPOINT;
    const FIELDS: &'static [(&'static str, FieldShape)] = &[
        ("present", Value(FieldKind::Bool)),
        ("position", Value(FieldKind::Uint256)),
        ("event", Record(E::RECORD)),
    ];
    type Encoded = EncodedCheckpoint<E::Encoded>;

    fn encode(&self) -> Self::Encoded {
        match self {
            Some(checkpoint) => EncodedCheckpoint {
                present: 1,
                position: U256::from(checkpoint.position).encode(),
                event: checkpoint.event.encode(),
            },
            None => EncodedCheckpoint {
                present: 0,
                position: U256::ZERO.encode(),
                event: E::sentinel().encode(),
            },
        }
    }

    fn decode(encoded: &Self::Encoded) -> Result<Self, EncodingError> {
        let event = E::decode(&encoded.event)?;
        let position = U256::decode("position", &encoded.position)?;
        match encoded.present {
            0 if position.is_zero() && event == E::sentinel() => Ok(None),
            0 => Err(EncodingError::NonEmptyAbsent { field: E::CHECKPOINT }),
            1 => {
                let overflow =
                    || EncodingError::PositionOverflow { field: "position", value: position };
                let [low, 0, 0, 0] = encoded.position else {
                    return Err(overflow());
                };
                let position = usize::try_from(low).map_err(|_| overflow())?;
                Ok(Some(Checkpoint { position, event }))
            }
            value => Err(EncodingError::InvalidFlag { field: "present", value }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedClaim {
    pub user: Vec<u8>,
    pub from_stake_checkpoint: EncodedCheckpoint<EncodedStakeEvent>,
    pub to_stake_checkpoint: EncodedCheckpoint<EncodedStakeEvent>,
    pub from_reward_checkpoint: EncodedCheckpoint<EncodedRewardEvent>,
    pub to_reward_checkpoint: EncodedCheckpoint<EncodedRewardEvent>,
    pub from_user_stake_checkpoint: EncodedCheckpoint<EncodedStakeEvent>,
    pub to_user_stake_checkpoint: EncodedCheckpoint<EncodedStakeEvent>,
}

impl CanonicalEncode for SettlementClaim {
    const RECORD: &'static str = "claim";
    const FIELDS: &'static [(&'static str, FieldShape)] = &[
        ("user", Value(FieldKind::Address)),
        ("fromStakeCheckpoint", Record(StakeEvent::CHECKPOINT)),
        ("toStakeCheckpoint", Record(StakeEvent::CHECKPOINT)),
        ("fromRewardCheckpoint", Record(RewardEvent::CHECKPOINT)),
        ("toRewardCheckpoint", Record(RewardEvent::CHECKPOINT)),
        ("fromUserStakeCheckpoint", Record(StakeEvent::CHECKPOINT)),
        ("toUserStakeCheckpoint", Record(StakeEvent::CHECKPOINT)),
    ];
    type Encoded = EncodedClaim;

    fn encode(&self) -> EncodedClaim {
        EncodedClaim {
            user: self.user.encode(),
            from_stake_checkpoint: self.from_stake_checkpoint.encode(),
            to_stake_checkpoint: self.to_stake_checkpoint.encode(),
            from_reward_checkpoint: self.from_reward_checkpoint.encode(),
            to_reward_checkpoint: self.to_reward_checkpoint.encode(),
            from_user_stake_checkpoint: self.from_user_stake_checkpoint.encode(),
            to_user_stake_checkpoint: self.to_user_stake_checkpoint.encode(),
        }
    }

    fn decode(encoded: &EncodedClaim) -> Result<Self, EncodingError> {
        type Stake = Option<Checkpoint<StakeEvent>>;
        type Reward = Option<Checkpoint<RewardEvent>>;

        Ok(SettlementClaim {
            user: Address::decode("user", &encoded.user)?,
            from_stake_checkpoint: Stake::decode(&encoded.from_stake_checkpoint)?,
            to_stake_checkpoint: Stake::decode(&encoded.to_stake_checkpoint)?,
            from_reward_checkpoint: Reward::decode(&encoded.from_reward_checkpoint)?,
            to_reward_checkpoint: Reward::decode(&encoded.to_reward_checkpoint)?,
            from_user_stake_checkpoint: Stake::decode(&encoded.from_user_stake_checkpoint)?,
            to_user_stake_checkpoint: Stake::decode(&encoded.to_user_stake_checkpoint)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedContribution {
    pub reward_event: EncodedRewardEvent,
    pub user_stake_at_time: [u64; 4],
    pub total_staked_at_time: [u64; 4],
    pub contribution: [u64; 4],
}

impl CanonicalEncode for RewardContribution {
    const RECORD: &'static str = "contribution";
    const FIELDS: &'static [(&'static str, FieldShape)] = &[
        ("rewardEvent", Record(RewardEvent::RECORD)),
        ("userStakeAtTime", Value(FieldKind::Uint256)),
        ("totalStakedAtTime", Value(FieldKind::Uint256)),
        ("contribution", Value(FieldKind::Uint256)),
    ];
    type Encoded = EncodedContribution;

    fn encode(&self) -> EncodedContribution {
        EncodedContribution {
            reward_event: self.reward_event.encode(),
            user_stake_at_time: self.user_stake_at_time.encode(),
            total_staked_at_time: self.total_staked_at_time.encode(),
            contribution: self.contribution.encode(),
        }
    }

    fn decode(encoded: &EncodedContribution) -> Result<Self, EncodingError> {
        Ok(RewardContribution {
            reward_event: RewardEvent::decode(&encoded.reward_event)?,
            user_stake_at_time: U256::decode("userStakeAtTime", &encoded.user_stake_at_time)?,
            total_staked_at_time: U256::decode("totalStakedAtTime", &encoded.total_staked_at_time)?,
            contribution: U256::decode("contribution", &encoded.contribution)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedExpectedResult {
    pub user: Vec<u8>,
    pub total_rewards: [u64; 4],
    pub from_reward_chain_hash: Vec<u8>,
    pub to_reward_chain_hash: Vec<u8>,
    pub from_stake_chain_hash: Vec<u8>,
    pub to_stake_chain_hash: Vec<u8>,
    pub from_user_stake_chain_hash: Vec<u8>,
    pub to_user_stake_chain_hash: Vec<u8>,
    pub contributions: Vec<EncodedContribution>,
}

impl CanonicalEncode for ExpectedResult {
    const RECORD: &'static str = "expectedResult";
    const FIELDS: &'static [(&'static str, FieldShape)] = &[
        ("user", Value(FieldKind::Address)),
        ("totalRewards", Value(FieldKind::Uint256)),
        ("fromRewardChainHash", Value(FieldKind::Digest)),
        ("toRewardChainHash", Value(FieldKind::Digest)),
        ("fromStakeChainHash", Value(FieldKind::Digest)),
        ("toStakeChainHash", Value(FieldKind::Digest)),
        ("fromUserStakeChainHash", Value(FieldKind::Digest)),
        ("toUserStakeChainHash", Value(FieldKind::Digest)),
        ("contributions", List(RewardContribution::RECORD)),
    ];
    type Encoded = EncodedExpectedResult;

    fn encode(&self) -> EncodedExpectedResult {
        EncodedExpectedResult {
            user: self.user.encode(),
            total_rewards: self.total_rewards.encode(),
            from_reward_chain_hash: self.from_reward_chain_hash.encode(),
            to_reward_chain_hash: self.to_reward_chain_hash.encode(),
            from_stake_chain_hash: self.from_stake_chain_hash.encode(),
            to_stake_chain_hash: self.to_stake_chain_hash.encode(),
            from_user_stake_chain_hash: self.from_user_stake_chain_hash.encode(),
            to_user_stake_chain_hash: self.to_user_stake_chain_hash.encode(),
            contributions: self.contributions.iter().map(CanonicalEncode::encode).collect(),
        }
    }

    fn decode(encoded: &EncodedExpectedResult) -> Result<Self, EncodingError> {
        Ok(ExpectedResult {
            user: Address::decode("user", &encoded.user)?,
            total_rewards: U256::decode("totalRewards", &encoded.total_rewards)?,
            from_reward_chain_hash: B256::decode(
                "fromRewardChainHash",
                &encoded.from_reward_chain_hash,
            )?,
            to_reward_chain_hash: B256::decode("toRewardChainHash", &encoded.to_reward_chain_hash)?,
            from_stake_chain_hash: B256::decode(
                "fromStakeChainHash",
                &encoded.from_stake_chain_hash,
            )?,
            to_stake_chain_hash: B256::decode("toStakeChainHash", &encoded.to_stake_chain_hash)?,
            from_user_stake_chain_hash: B256::decode(
                "fromUserStakeChainHash",
                &encoded.from_user_stake_chain_hash,
            )?,
            to_user_stake_chain_hash: B256::decode(
                "toUserStakeChainHash",
                &encoded.to_user_stake_chain_hash,
            )?,
            contributions: encoded
                .contributions
                .iter()
                .map(RewardContribution::decode)
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Owned form of [FieldShape] as it appears in a [DocumentSchema].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Value(FieldKind),
    Record(String),
    List(String),
}

impl From<FieldShape> for FieldType {
    fn from(shape: FieldShape) -> Self {
        match shape {
            FieldShape::Value(kind) => FieldType::Value(kind),
            FieldShape::Record(record) => FieldType::Record(record.to_string()),
            FieldShape::List(record) => FieldType::List(record.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<FieldSchema>,
}

impl RecordSchema {
    pub fn of<T: CanonicalEncode>() -> Self {
        Self {
            name: T::RECORD.to_string(),
            fields: T::FIELDS
                .iter()
                .map(|(name, shape)| FieldSchema { name: name.to_string(), ty: (*shape).into() })
                .collect(),
        }
    }
}

/// Describes the fields of every record in a [SettlementDocument].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSchema {
    pub version: u32,
    pub records: Vec<RecordSchema>,
}

impl DocumentSchema {
    pub fn current() -> Self {
        Self {
            version: SCHEMA_VERSION,
            records: vec![
                RecordSchema::of::<StakeEvent>(),
                RecordSchema::of::<RewardEvent>(),
                RecordSchema::of::<Option<Checkpoint<StakeEvent>>>(),
                RecordSchema::of::<Option<Checkpoint<RewardEvent>>>(),
                RecordSchema::of::<SettlementClaim>(),
                RecordSchema::of::<RewardContribution>(),
                RecordSchema::of::<ExpectedResult>(),
            ],
        }
    }

    /// Check that a decoded schema matches this encoder.
    pub fn check(&self) -> Result<(), EncodingError> {
        if self.version != SCHEMA_VERSION {
            return Err(EncodingError::UnsupportedVersion {
                expected: SCHEMA_VERSION,
                found: self.version,
            });
        }
        let current = Self::current();
        for expected in &current.records {
            let found = self.records.iter().find(|record| record.name == expected.name);
            if found != Some(expected) {
                return Err(EncodingError::SchemaMismatch { record: record_name(&expected.name) });
            }
        }
        Ok(())
    }
}

fn record_name(name: &str) -> &'static str {
    [
        StakeEvent::RECORD,
        RewardEvent::RECORD,
        StakeEvent::CHECKPOINT,
        RewardEvent::CHECKPOINT,
        SettlementClaim::RECORD,
        RewardContribution::RECORD,
        ExpectedResult::RECORD,
    ]
    .into_iter()
    .find(|record| *record == name)
    .unwrap_or("unknown")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementInput {
    pub user: Vec<u8>,
    pub stake_events: Vec<EncodedStakeEvent>,
    pub reward_events: Vec<EncodedRewardEvent>,
    pub claim: EncodedClaim,
}

/// A self-describing settlement: the ledger, the claim, and the expected result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementDocument {
    pub schema: DocumentSchema,
    pub input: SettlementInput,
    pub output: EncodedExpectedResult,
}

/// The decoded contents of a [SettlementDocument].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSettlement {
    pub user: Address,
    pub snapshot: LedgerSnapshot,
    pub claim: SettlementClaim,
    pub expected: ExpectedResult,
}

impl SettlementDocument {
    pub fn new(
        snapshot: &LedgerSnapshot,
        claim: &SettlementClaim,
        expected: &ExpectedResult,
    ) -> Self {
        Self {
            schema: DocumentSchema::current(),
            input: SettlementInput {
                user: claim.user.encode(),
                stake_events: snapshot.stake_events().iter().map(CanonicalEncode::encode).collect(),
                reward_events: snapshot
                    .reward_events()
                    .iter()
                    .map(CanonicalEncode::encode)
                    .collect(),
                claim: claim.encode(),
            },
            output: expected.encode(),
        }
    }

    /// Check the schema and decode every record.
    pub fn decode(&self) -> Result<DecodedSettlement, EncodingError> {
        self.schema.check()?;
        let stake_events = self
            .input
            .stake_events
            .iter()
            .map(StakeEvent::decode)
            .collect::<Result<Vec<_>, _>>()?;
        let reward_events = self
            .input
            .reward_events
            .iter()
            .map(RewardEvent::decode)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DecodedSettlement {
            user: Address::decode("user", &self.input.user)?,
            snapshot: LedgerSnapshot::new(stake_events, reward_events),
            claim: SettlementClaim::decode(&self.input.claim)?,
            expected: ExpectedResult::decode(&self.output)?,
        })
    }

    pub fn to_json(&self) -> Result<String, EncodingError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, EncodingError> {
        Ok(serde_json::from_str(json)?)
    }
}
