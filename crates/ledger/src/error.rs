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

//! Error types for ledger verification, checkpoint selection, settlement and encoding.

use alloy_primitives::{Address, B256, U256};
use thiserror::Error;

use crate::{chain::ChainKind, encoding::FieldKind};

/// The way a single link in a chain failed verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkFault {
    #[error("previous hash {found} does not match chain head {expected}")]
    BrokenLink { expected: B256, found: B256 },

    #[error("recomputed hash {computed} does not match stored hash {stored}")]
    HashMismatch { computed: B256, stored: B256 },

    #[error("preimage is {actual} bytes, expected {expected}")]
    PreimageLength { expected: usize, actual: usize },
}

/// A fatal integrity failure. The ledger is untrusted from `index` onward.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} chain integrity failure at index {index}: {fault}")]
pub struct ChainIntegrityError {
    pub kind: ChainKind,
    pub index: usize,
    pub fault: LinkFault,
}

/// An unstake that exceeds the user's staked amount.
///
/// Only produced by [LedgerState::unstake][crate::ledger::LedgerState::unstake]; callers driving
/// a workload are expected to recover from it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("insufficient stake for {user}: requested {requested}, available {available}")]
pub struct InsufficientBalanceError {
    pub user: Address,
    pub requested: U256,
    pub available: U256,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppendError {
    #[error(transparent)]
    InsufficientBalance(#[from] InsufficientBalanceError),

    #[error("{kind} timestamp {timestamp} precedes chain head timestamp {head}")]
    TimestampRegression { kind: ChainKind, timestamp: U256, head: U256 },

    #[error("{0} total overflowed")]
    Overflow(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("event source reported {count} {kind} events but index {index} is missing")]
    Truncated { kind: ChainKind, index: usize, count: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConservationFault {
    #[error("user {user} stake moved to {found}, expected {expected}")]
    UserStake { user: Address, expected: U256, found: U256 },

    #[error("user {user} unstaked {amount} with only {available} staked")]
    Underflow { user: Address, amount: U256, available: U256 },

    #[error("total staked is {found}, sum of user stakes is {expected}")]
    TotalStaked { expected: U256, found: U256 },

    #[error("total rewards is {found}, running sum is {expected}")]
    TotalRewards { expected: U256, found: U256 },

    #[error("running sum of {0} overflows uint256")]
    Overflow(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} chain conservation failure at index {index}: {fault}")]
pub struct ConservationError {
    pub kind: ChainKind,
    pub index: usize,
    pub fault: ConservationFault,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("{kind} checkpoint index {index} is out of range for {len} events")]
    OutOfRange { kind: ChainKind, index: usize, len: usize },

    #[error("{kind} checkpoint interval is inverted: from {from:?} is after to {to:?}")]
    InvertedInterval { kind: ChainKind, from: Option<usize>, to: Option<usize> },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("{kind} events are not ordered by timestamp at index {index}")]
    Unordered { kind: ChainKind, index: usize },

    #[error("user stake {user_stake} exceeds total stake {total_staked} at reward {timestamp}")]
    StakeExceedsTotal { user_stake: U256, total_staked: U256, timestamp: U256 },

    #[error("{kind} checkpoint at position {position} does not match the ledger")]
    CheckpointMismatch { kind: ChainKind, position: usize },

    #[error("user stake checkpoint at position {position} belongs to {found}, not {subject}")]
    ForeignUserCheckpoint { position: usize, subject: Address, found: Address },

    #[error(transparent)]
    Interval(#[from] CheckpointError),

    #[error("reward total overflowed")]
    Overflow,
}

/// Errors produced by the canonical encoder.
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("{field}: expected {expected} bytes for {kind}, got {actual}")]
    Length { field: &'static str, kind: FieldKind, expected: usize, actual: usize },

    #[error("{field}: invalid hex: {source}")]
    InvalidHex {
        field: &'static str,
        #[source]
        source: hex::FromHexError,
    },

    #[error("{field}: boolean must be encoded as 0 or 1, got {value}")]
    InvalidBool { field: &'static str, value: u8 },

    #[error("{field}: presence flag must be 0 or 1, got {value}")]
    InvalidFlag { field: &'static str, value: u8 },

    #[error("{field}: absent value carries a non-zero payload")]
    NonEmptyAbsent { field: &'static str },

    #[error("{field}: position {value} does not fit this platform")]
    PositionOverflow { field: &'static str, value: U256 },

    #[error("unsupported document schema version {found}, expected {expected}")]
    UnsupportedVersion { expected: u32, found: u32 },

    #[error("document schema for {record} does not match this encoder")]
    SchemaMismatch { record: &'static str },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ABI error: {0}")]
    Abi(#[from] alloy_sol_types::Error),
}

/// Umbrella error for callers that drive a whole session through one result type.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error(transparent)]
    Integrity(#[from] ChainIntegrityError),

    #[error(transparent)]
    Conservation(#[from] ConservationError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}
