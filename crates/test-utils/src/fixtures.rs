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

//! Small hand-built ledgers with known settlements.

use alloy_primitives::{address, Address, U256};
use anyhow::Context;
use soar_ledger::LedgerSnapshot;

use crate::oracle::MemoryOracle;

pub const ALICE: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
pub const BOB: Address = address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");
pub const CAROL: Address = address!("0x90F79bf6EB2c4f870365E785982E1f101E93b906");

#[derive(Debug, Clone)]
pub struct Scenario {
    pub users: Vec<Address>,
    pub snapshot: LedgerSnapshot,
}

fn u(value: u64) -> U256 {
    U256::from(value)
}

fn build(
    users: &[Address],
    actions: impl FnOnce(&mut MemoryOracle) -> anyhow::Result<()>,
) -> anyhow::Result<Scenario> {
    let mut oracle = MemoryOracle::new();
    actions(&mut oracle).context("failed to build fixture")?;
    Ok(Scenario { users: users.to_vec(), snapshot: oracle.snapshot()? })
}

/// A single stake of 10 by Alice at timestamp 100, from genesis.
pub fn genesis_stake() -> anyhow::Result<Scenario> {
    build(&[ALICE], |oracle| {
        oracle.stake(ALICE, u(10), u(100))?;
        Ok(())
    })
}

/// Alice stakes 10 and Bob 20 before a reward of 9, which settles to 3 and 6.
pub fn two_stakers() -> anyhow::Result<Scenario> {
    build(&[ALICE, BOB], |oracle| {
        oracle.stake(ALICE, u(10), u(100))?;
        oracle.stake(BOB, u(20), u(110))?;
        oracle.add_rewards(u(9), u(120))?;
        Ok(())
    })
}

/// Alice and Bob stake and receive rewards while Carol never stakes.
pub fn absent_subject() -> anyhow::Result<Scenario> {
    build(&[ALICE, BOB, CAROL], |oracle| {
        oracle.stake(ALICE, u(10), u(100))?;
        oracle.add_rewards(u(4), u(105))?;
        oracle.stake(BOB, u(30), u(110))?;
        oracle.add_rewards(u(8), u(120))?;
        Ok(())
    })
}

/// Eight stake events and four rewards across three users.
pub fn long_chain() -> anyhow::Result<Scenario> {
    build(&[ALICE, BOB, CAROL], |oracle| {
        oracle.stake(ALICE, u(100), u(10))?;
        oracle.stake(BOB, u(50), u(20))?;
        oracle.add_rewards(u(30), u(25))?;
        oracle.stake(CAROL, u(50), u(30))?;
        oracle.unstake(ALICE, u(40), u(40))?;
        oracle.add_rewards(u(60), u(45))?;
        oracle.stake(BOB, u(10), u(50))?;
        oracle.unstake(CAROL, u(50), u(60))?;
        oracle.add_rewards(u(90), u(60))?;
        oracle.stake(CAROL, u(20), u(70))?;
        oracle.unstake(BOB, u(60), u(80))?;
        oracle.add_rewards(u(12), u(90))?;
        Ok(())
    })
}
