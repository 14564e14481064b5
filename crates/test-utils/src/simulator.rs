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

//! Deterministic workload simulator for the staking and reward contracts.
//!
//! The simulator plays the oracle: it drives a [MemoryOracle] through the ledger's append
//! operations with a seeded [StdRng], so a seed always yields the same ledger.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use anyhow::{ensure, Context};
use rand::{rngs::StdRng, Rng, SeedableRng};
use soar_ledger::{AppendError, Bound, EventSource, LedgerSnapshot, SelectionPolicy};

use crate::oracle::MemoryOracle;

/// Smallest amount the simulator moves: 0.01 tokens with 18 decimals.
pub const CENT: u64 = 10_000_000_000_000_000;

/// `amount` whole tokens, with 18 decimals.
pub fn tokens(amount: u64) -> U256 {
    U256::from(amount) * U256::from(100u64) * U256::from(CENT)
}

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Number of stake, unstake or reward actions to attempt.
    pub iterations: usize,
    pub users: usize,
    /// Initial wallet balance of every user.
    pub wallet: U256,
    pub max_stake: U256,
    pub max_reward: U256,
    /// Upper bound (exclusive) on the seconds between two actions.
    pub max_time_step: u64,
    /// Probability that an action touches the stake chain rather than the reward chain.
    pub stake_chain_probability: f64,
    /// Probability that a stake chain action is a deposit.
    pub deposit_probability: f64,
    pub start_timestamp: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            users: 19,
            wallet: tokens(1000),
            max_stake: tokens(10),
            max_reward: tokens(100),
            max_time_step: 86_400,
            stake_chain_probability: 0.67,
            deposit_probability: 0.5,
            start_timestamp: 1_735_689_600,
        }
    }
}

/// The result of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulatedLedger {
    pub users: Vec<Address>,
    pub oracle: MemoryOracle,
}

impl SimulatedLedger {
    pub fn snapshot(&self) -> anyhow::Result<LedgerSnapshot> {
        self.oracle.snapshot().context("failed to capture simulated ledger")
    }
}

pub struct Simulator {
    config: SimulatorConfig,
    rng: StdRng,
    oracle: MemoryOracle,
    users: Vec<Address>,
    wallets: HashMap<Address, U256>,
    clock: u64,
}

impl Simulator {
    pub fn new(config: SimulatorConfig, seed: u64) -> anyhow::Result<Self> {
        ensure!(config.users > 0, "simulation needs at least one user");
        ensure!(config.max_time_step > 0, "max time step must be positive");
        for probability in [config.stake_chain_probability, config.deposit_probability] {
            ensure!((0.0..=1.0).contains(&probability), "invalid probability {probability}");
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let users: Vec<Address> = (0..config.users)
            .map(|_| {
                let mut bytes = [0u8; 20];
                rng.fill(&mut bytes);
                Address::from(bytes)
            })
            .collect();
        let wallets = users.iter().map(|user| (*user, config.wallet)).collect();
        let clock = config.start_timestamp;

        Ok(Self { config, rng, oracle: MemoryOracle::new(), users, wallets, clock })
    }

    /// Run all configured iterations.
    pub fn run(mut self) -> anyhow::Result<SimulatedLedger> {
        for iteration in 0..self.config.iterations {
            self.step().with_context(|| format!("simulation failed at iteration {iteration}"))?;
        }
        tracing::info!(
            "Simulated {} stake events and {} reward events for {} users",
            self.oracle.stake_event_count(),
            self.oracle.reward_event_count(),
            self.users.len()
        );
        Ok(SimulatedLedger { users: self.users, oracle: self.oracle })
    }

    /// Advance the clock and perform one action.
    pub fn step(&mut self) -> anyhow::Result<()> {
        self.clock += self.rng.random_range(0..self.config.max_time_step);
        let timestamp = U256::from(self.clock);

        let total_staked = self.oracle.state().total_staked();
        if total_staked.is_zero() || self.rng.random_bool(self.config.stake_chain_probability) {
            self.stake_action(timestamp)
        } else {
            let amount = self.random_amount(self.config.max_reward);
            tracing::debug!("Adding reward of {amount} at {timestamp}");
            self.oracle.add_rewards(amount, timestamp)?;
            Ok(())
        }
    }

    fn stake_action(&mut self, timestamp: U256) -> anyhow::Result<()> {
        let user = self.users[self.rng.random_range(0..self.users.len())];
        let amount = self.random_amount(self.config.max_stake);
        let staked = self.oracle.state().staked(&user);
        let balance = self.wallet(&user);

        let mut deposit = self.rng.random_bool(self.config.deposit_probability);
        if !deposit && staked <= amount {
            deposit = true;
        }
        if deposit && balance <= amount {
            deposit = false;
        }

        if deposit {
            return self.deposit(user, amount, timestamp);
        }
        match self.oracle.unstake(user, amount, timestamp) {
            Ok(_) => {
                self.wallets.insert(user, balance + amount);
                tracing::debug!("{user} unstaked {amount} at {timestamp}");
                Ok(())
            }
            Err(AppendError::InsufficientBalance(err)) if balance > amount => {
                tracing::debug!("{err}, staking instead");
                self.deposit(user, amount, timestamp)
            }
            Err(AppendError::InsufficientBalance(err)) => {
                tracing::debug!("{err}, skipping");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn deposit(&mut self, user: Address, amount: U256, timestamp: U256) -> anyhow::Result<()> {
        let balance = self.wallet(&user);
        self.oracle.stake(user, amount, timestamp)?;
        self.wallets.insert(user, balance - amount);
        tracing::debug!("{user} staked {amount} at {timestamp}");
        Ok(())
    }

    fn wallet(&self, user: &Address) -> U256 {
        self.wallets.get(user).copied().unwrap_or(U256::ZERO)
    }

    /// A random amount up to `max`, in whole cents.
    fn random_amount(&mut self, max: U256) -> U256 {
        let cents = (max / U256::from(CENT)).saturating_to::<u64>();
        U256::from(self.rng.random_range(0..=cents)) * U256::from(CENT)
    }
}

/// A random, always valid, reward interval over `snapshot`.
pub fn random_policy(rng: &mut impl Rng, snapshot: &LedgerSnapshot) -> SelectionPolicy {
    let rewards = snapshot.reward_events().len();
    if rewards == 0 {
        return SelectionPolicy::default();
    }
    let to = rng.random_range(0..rewards);
    let from = rng.random_bool(0.5).then(|| rng.random_range(0..=to));
    SelectionPolicy {
        from_reward: from.map(Bound::Index).unwrap_or(Bound::Genesis),
        to_reward: Bound::Index(to),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;
    use soar_ledger::{select_checkpoints, settle_claim};
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn simulation_is_deterministic() {
        let first = Simulator::new(SimulatorConfig::default(), 7).unwrap().run().unwrap();
        let second = Simulator::new(SimulatorConfig::default(), 7).unwrap().run().unwrap();
        assert_eq!(first.users, second.users);
        assert_eq!(first.snapshot().unwrap(), second.snapshot().unwrap());

        // Every staker comes from the configured population.
        assert_eq!(first.users.len(), SimulatorConfig::default().users);
        let stakers = first.snapshot().unwrap().users();
        assert!(stakers.iter().all(|user| first.users.contains(user)));

        let other = Simulator::new(SimulatorConfig::default(), 8).unwrap().run().unwrap();
        assert_ne!(first.snapshot().unwrap(), other.snapshot().unwrap());
    }

    #[test]
    #[traced_test]
    fn simulated_ledger_is_consistent() {
        let ledger = Simulator::new(SimulatorConfig::default(), 42).unwrap().run().unwrap();
        let snapshot = ledger.snapshot().unwrap();

        assert!(!snapshot.stake_events().is_empty());
        assert_eq!(snapshot.stake_events()[0].previous_chain_hash, B256::ZERO);
        snapshot.verify().unwrap();
        snapshot.check_conservation().unwrap();
        for event in snapshot.stake_events() {
            assert!(event.total_user_stake <= event.total_staked);
            assert_eq!(event.amount % U256::from(CENT), U256::ZERO);
        }
        assert!(logs_contain("for 19 users"));
    }

    #[test]
    fn wallets_bound_deposits() {
        let config = SimulatorConfig {
            iterations: 200,
            users: 1,
            wallet: tokens(5),
            stake_chain_probability: 1.0,
            ..Default::default()
        };
        let ledger = Simulator::new(config, 3).unwrap().run().unwrap();
        let user = ledger.users[0];
        assert!(ledger.oracle.state().staked(&user) < tokens(5));
    }

    #[test]
    fn random_policies_are_valid() {
        let ledger = Simulator::new(SimulatorConfig::default(), 11).unwrap().run().unwrap();
        let snapshot = ledger.snapshot().unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..20 {
            let policy = random_policy(&mut rng, &snapshot);
            let claim = select_checkpoints(&snapshot, ledger.users[0], &policy).unwrap();
            settle_claim(&snapshot, &claim).unwrap();
        }
    }

    #[test]
    fn rejects_empty_population() {
        let config = SimulatorConfig { users: 0, ..Default::default() };
        assert!(Simulator::new(config, 0).is_err());
    }
}
