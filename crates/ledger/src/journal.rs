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

//! ABI encoding of a settlement's public values for an on-chain verifier.

use alloy_sol_types::{sol, SolValue};

use crate::{error::EncodingError, settlement::ExpectedResult};

sol!(
    #![sol(extra_derives(Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize))]
    /// Public values committed by a settlement.
    struct SettlementJournal {
        address user;
        uint256 totalRewards;
        bytes32 fromRewardChainHash;
        bytes32 toRewardChainHash;
        bytes32 fromStakeChainHash;
        bytes32 toStakeChainHash;
        bytes32 fromUserStakeChainHash;
        bytes32 toUserStakeChainHash;
    }
);

impl From<&ExpectedResult> for SettlementJournal {
    fn from(result: &ExpectedResult) -> Self {
        Self {
            user: result.user,
            totalRewards: result.total_rewards,
            fromRewardChainHash: result.from_reward_chain_hash,
            toRewardChainHash: result.to_reward_chain_hash,
            fromStakeChainHash: result.from_stake_chain_hash,
            toStakeChainHash: result.to_stake_chain_hash,
            fromUserStakeChainHash: result.from_user_stake_chain_hash,
            toUserStakeChainHash: result.to_user_stake_chain_hash,
        }
    }
}

impl SettlementJournal {
    pub fn encode(&self) -> Vec<u8> {
        self.abi_encode()
    }

    pub fn decode(data: &[u8]) -> Result<Self, EncodingError> {
        Ok(<Self as SolValue>::abi_decode(data)?)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, B256, U256};

    use super::*;

    #[test]
    fn journal_matches_expected_result() {
        let result = ExpectedResult {
            user: Address::repeat_byte(0x11),
            total_rewards: U256::from(42),
            from_reward_chain_hash: B256::repeat_byte(1),
            to_reward_chain_hash: B256::repeat_byte(2),
            from_stake_chain_hash: B256::repeat_byte(3),
            to_stake_chain_hash: B256::repeat_byte(4),
            from_user_stake_chain_hash: B256::ZERO,
            to_user_stake_chain_hash: B256::repeat_byte(6),
            contributions: vec![],
        };
        let journal = SettlementJournal::from(&result);
        let bytes = journal.encode();

        // Eight static words.
        assert_eq!(bytes.len(), 8 * 32);
        assert_eq!(&bytes[12..32], result.user.as_slice());
        assert_eq!(U256::from_be_slice(&bytes[32..64]), U256::from(42));
        assert_eq!(SettlementJournal::decode(&bytes).unwrap(), journal);

        let json = serde_json::to_string(&journal).unwrap();
        assert!(json.contains("\"totalRewards\""));
        assert_eq!(serde_json::from_str::<SettlementJournal>(&json).unwrap(), journal);
    }

    #[test]
    fn truncated_journal_is_rejected() {
        let journal = SettlementJournal::from(&ExpectedResult {
            user: Address::ZERO,
            total_rewards: U256::ZERO,
            from_reward_chain_hash: B256::ZERO,
            to_reward_chain_hash: B256::ZERO,
            from_stake_chain_hash: B256::ZERO,
            to_stake_chain_hash: B256::ZERO,
            from_user_stake_chain_hash: B256::ZERO,
            to_user_stake_chain_hash: B256::ZERO,
            contributions: vec![],
        });
        let bytes = journal.encode();
        assert!(matches!(
            SettlementJournal::decode(&bytes[..100]),
            Err(EncodingError::Abi(_))
        ));
    }
}
