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

//! End-to-end tests of verification and settlement over simulated and hand-built ledgers.

use alloy_primitives::{keccak256, Address, B256, U256};
use soar_ledger::{
    select_checkpoints, settle, settle_claim, Bound, ChainKind, EventSource, ExpectedResult,
    LedgerError, LedgerSnapshot, LinkFault, SelectionPolicy, SettlementDocument,
    SettlementJournal,
};
use soar_test_utils::{
    fixtures::{self, ALICE, BOB, CAROL},
    tamper, MemoryOracle, Simulator, SimulatorConfig,
};

#[test]
fn genesis_stake_hash() -> anyhow::Result<()> {
    let scenario = fixtures::genesis_stake()?;
    let event = scenario.snapshot.stake_events()[0];

    let mut preimage = Vec::new();
    preimage.extend_from_slice(ALICE.as_slice());
    preimage.push(1);
    for value in [10u64, 10, 10, 100] {
        preimage.extend_from_slice(&U256::from(value).to_be_bytes::<32>());
    }
    preimage.extend_from_slice(&[0u8; 32]);

    assert_eq!(event.previous_chain_hash, B256::ZERO);
    assert_eq!(event.current_chain_hash, keccak256(&preimage));
    assert_eq!(scenario.snapshot.verify()?.stake, event.current_chain_hash);
    Ok(())
}

#[test]
fn pro_rata_split() -> anyhow::Result<()> {
    let scenario = fixtures::two_stakers()?;
    let snapshot = &scenario.snapshot;

    let alice = settle(ALICE, snapshot.reward_events(), snapshot.stake_events())?;
    let bob = settle(BOB, snapshot.reward_events(), snapshot.stake_events())?;
    assert_eq!(alice.total_rewards, U256::from(3));
    assert_eq!(bob.total_rewards, U256::from(6));
    Ok(())
}

#[test]
fn subject_without_stake_events() -> anyhow::Result<()> {
    let scenario = fixtures::absent_subject()?;
    let claim = select_checkpoints(&scenario.snapshot, CAROL, &SelectionPolicy::default())?;
    let expected = settle_claim(&scenario.snapshot, &claim)?;

    assert_eq!(expected.total_rewards, U256::ZERO);
    assert!(claim.from_user_stake_checkpoint.is_none());
    assert!(claim.to_user_stake_checkpoint.is_none());
    assert_eq!(expected.from_user_stake_chain_hash, B256::ZERO);
    assert_eq!(expected.to_user_stake_chain_hash, B256::ZERO);
    Ok(())
}

#[test]
fn tampered_event_fails_at_its_index() -> anyhow::Result<()> {
    let scenario = fixtures::long_chain()?;
    assert!(scenario.snapshot.stake_events().len() > 6);

    let tampered = tamper::alter_stake_amount(&scenario.snapshot, 5)?;
    let err = tampered.verify().unwrap_err();
    assert_eq!(err.kind, ChainKind::Stake);
    assert_eq!(err.index, 5);
    assert!(matches!(err.fault, LinkFault::HashMismatch { .. }));

    let tampered = tamper::alter_reward_amount(&scenario.snapshot, 2)?;
    let err = tampered.verify().unwrap_err();
    assert_eq!((err.kind, err.index), (ChainKind::Reward, 2));
    Ok(())
}

#[test]
fn shares_never_exceed_rewards() -> anyhow::Result<()> {
    let scenario = fixtures::long_chain()?;
    let snapshot = &scenario.snapshot;

    let mut total = U256::ZERO;
    for user in &scenario.users {
        total += settle(*user, snapshot.reward_events(), snapshot.stake_events())?.total_rewards;
    }
    let distributed = snapshot.reward_events().last().map(|e| e.total_rewards).unwrap();
    assert!(total <= distributed);
    Ok(())
}

#[test]
fn simulated_ledger_settles_every_user() -> anyhow::Result<()> {
    let ledger = Simulator::new(SimulatorConfig::default(), 1234)?.run()?;
    let snapshot = ledger.snapshot()?;
    snapshot.verify()?;
    snapshot.check_conservation()?;

    let rewards = snapshot.reward_events();
    let mut settled = U256::ZERO;
    let policy = SelectionPolicy {
        from_reward: Bound::Genesis,
        to_reward: Bound::Latest,
        ..Default::default()
    };
    for user in &ledger.users {
        let claim = select_checkpoints(&snapshot, *user, &policy)?;
        let expected = settle_claim(&snapshot, &claim)?;
        assert_eq!(expected.contributions.len(), rewards.len());
        for contribution in &expected.contributions {
            assert!(contribution.user_stake_at_time <= contribution.total_staked_at_time);
            assert!(contribution.contribution <= contribution.reward_event.amount);
        }
        settled += expected.total_rewards;
    }

    // Rounding only ever loses value.
    let distributed = rewards.last().map(|e| e.total_rewards).unwrap_or_default();
    assert!(settled <= distributed);
    Ok(())
}

#[test]
fn snapshot_isolation() -> anyhow::Result<()> {
    let mut oracle = MemoryOracle::new();
    oracle.stake(ALICE, U256::from(10), U256::from(1))?;
    oracle.add_rewards(U256::from(10), U256::from(2))?;
    let snapshot = LedgerSnapshot::capture(&oracle)?;

    let claim = select_checkpoints(&snapshot, ALICE, &SelectionPolicy::default())?;
    let before = settle_claim(&snapshot, &claim)?;

    oracle.stake(BOB, U256::from(10), U256::from(3))?;
    oracle.add_rewards(U256::from(10), U256::from(4))?;
    assert_eq!(oracle.reward_event_count(), 2);

    let after = settle_claim(&snapshot, &claim)?;
    assert_eq!(before, after);
    assert_eq!(snapshot.reward_events().len(), 1);
    Ok(())
}

#[test]
fn document_and_journal_round_trip() -> anyhow::Result<()> {
    let ledger = Simulator::new(SimulatorConfig::default(), 99)?.run()?;
    let snapshot = ledger.snapshot()?;
    let subject: Address = ledger.users[3];

    let claim = select_checkpoints(&snapshot, subject, &SelectionPolicy::default())?;
    let expected = settle_claim(&snapshot, &claim)?;
    let json = SettlementDocument::new(&snapshot, &claim, &expected).to_json()?;

    let decoded = SettlementDocument::from_json(&json)?.decode()?;
    assert_eq!(decoded.user, subject);
    assert_eq!(decoded.snapshot, snapshot);
    assert_eq!(settle_claim(&decoded.snapshot, &decoded.claim)?, decoded.expected);

    let journal = SettlementJournal::from(&decoded.expected);
    assert_eq!(SettlementJournal::decode(&journal.encode())?, journal);
    assert_eq!(journal.totalRewards, expected.total_rewards);
    Ok(())
}

fn settle_document(json: &str) -> Result<ExpectedResult, LedgerError> {
    let decoded = SettlementDocument::from_json(json)?.decode()?;
    decoded.snapshot.verify()?;
    decoded.snapshot.check_conservation()?;
    Ok(settle_claim(&decoded.snapshot, &decoded.claim)?)
}

#[test]
fn one_error_type_per_session() -> anyhow::Result<()> {
    let scenario = fixtures::long_chain()?;
    let claim = select_checkpoints(&scenario.snapshot, BOB, &SelectionPolicy::default())?;
    let expected = settle_claim(&scenario.snapshot, &claim)?;

    let json = SettlementDocument::new(&scenario.snapshot, &claim, &expected).to_json()?;
    assert_eq!(settle_document(&json)?, expected);

    let tampered = tamper::alter_stake_amount(&scenario.snapshot, 3)?;
    let json = SettlementDocument::new(&tampered, &claim, &expected).to_json()?;
    assert!(matches!(
        settle_document(&json),
        Err(LedgerError::Integrity(err)) if err.index == 3
    ));
    assert!(matches!(settle_document("{}"), Err(LedgerError::Encoding(_))));
    Ok(())
}
