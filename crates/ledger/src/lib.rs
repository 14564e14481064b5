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

//! Hash-chained stake and reward ledgers, and pro-rata reward settlement over them.

// Declare modules
pub mod chain;
pub mod checkpoint;
pub mod encoding;
pub mod error;
pub mod events;
pub mod journal;
pub mod ledger;
pub mod settlement;

// Re-export commonly used types
pub use chain::{
    hash_preimage, reward_link_hash, stake_link_hash, verify_chain, verify_link, ChainKind,
    ChainLink, ChainVerifier, GENESIS_HASH,
};

pub use checkpoint::{
    checkpoint_hash, select_checkpoints, Bound, Checkpoint, SelectionPolicy, SettlementClaim,
};

pub use encoding::{
    Canonical, CanonicalEncode, DecodedSettlement, DocumentSchema, FieldKind, FieldShape,
    FieldType, SettlementDocument, SCHEMA_VERSION,
};

pub use error::{
    AppendError, ChainIntegrityError, CheckpointError, ConservationError, EncodingError,
    InsufficientBalanceError, LedgerError, LinkFault, SettlementError, SnapshotError,
};

pub use events::{RewardEvent, RewardFields, StakeEvent, StakeFields};

pub use journal::SettlementJournal;

pub use ledger::{ChainHeads, EventSource, LedgerSnapshot, LedgerState};

pub use settlement::{
    pro_rata_share, reward_interval, settle, settle_claim, ExpectedResult, RewardContribution,
    Settlement,
};
