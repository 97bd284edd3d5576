//! # rf-tumble-sim — Batch simulator for the tumble engine
//!
//! Plays millions of independent rounds in parallel and aggregates RTP,
//! hit rate, feature frequency and cascade statistics. A round is one base
//! spin (or one bonus purchase) followed by every free spin it awards.
//!
//! Every round draws from its own `ChaCha8Rng` stream derived from
//! `(seed, round index)`, so results do not depend on the thread count.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rf_tumble::{
    EngineError, SessionController, SessionOrigin, SpinOutcome, TumbleEngine, WinTier,
};

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Unknown bonus tier: {0}")]
    UnknownBonusTier(String),

    #[error("Invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Rounds to play
    pub rounds: u64,
    /// Bet per spin
    pub bet: f64,
    /// Master seed; round `i` uses stream `i` of this seed
    pub seed: u64,
    /// Worker threads (defaults to the CPU count)
    pub threads: Option<usize>,
    /// Buy this tier every round instead of playing base spins
    pub bonus_tier: Option<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rounds: 100_000,
            bet: 1.0,
            seed: 0,
            threads: None,
            bonus_tier: None,
        }
    }
}

impl SimConfig {
    pub fn with_rounds(mut self, rounds: u64) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads.max(1));
        self
    }

    pub fn with_bonus_tier(mut self, tier: impl Into<String>) -> Self {
        self.bonus_tier = Some(tier.into());
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATISTICS
// ═══════════════════════════════════════════════════════════════════════════════

/// Aggregated simulation results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimStats {
    pub rounds: u64,
    pub base_spins: u64,
    pub free_spins: u64,
    pub total_bet: f64,
    pub total_win: f64,
    pub base_win: f64,
    pub free_spin_win: f64,
    /// Rounds that returned anything
    pub winning_rounds: u64,
    pub triggers: u64,
    pub retriggers: u64,
    pub big_wins: u64,
    pub capped_spins: u64,
    pub total_cascade_depth: u64,
    pub max_win_ratio: f64,
    /// Symbol counts over every initial grid
    pub symbol_counts: BTreeMap<String, u64>,
}

impl SimStats {
    /// Return to player, percent
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0.0 {
            (self.total_win / self.total_bet) * 100.0
        } else {
            0.0
        }
    }

    /// Winning rounds, percent
    pub fn hit_rate(&self) -> f64 {
        if self.rounds > 0 {
            (self.winning_rounds as f64 / self.rounds as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Rounds per free-spin trigger
    pub fn trigger_frequency(&self) -> Option<f64> {
        (self.triggers > 0).then(|| self.rounds as f64 / self.triggers as f64)
    }

    pub fn avg_cascade_depth(&self) -> f64 {
        let spins = self.base_spins + self.free_spins;
        if spins > 0 {
            self.total_cascade_depth as f64 / spins as f64
        } else {
            0.0
        }
    }

    /// Share of a symbol among all initial-grid cells
    pub fn symbol_frequency(&self, symbol: &str) -> f64 {
        let total: u64 = self.symbol_counts.values().sum();
        if total == 0 {
            return 0.0;
        }
        self.symbol_counts.get(symbol).copied().unwrap_or(0) as f64 / total as f64
    }

    /// Combine two partial results
    pub fn merge(mut self, other: Self) -> Self {
        self.rounds += other.rounds;
        self.base_spins += other.base_spins;
        self.free_spins += other.free_spins;
        self.total_bet += other.total_bet;
        self.total_win += other.total_win;
        self.base_win += other.base_win;
        self.free_spin_win += other.free_spin_win;
        self.winning_rounds += other.winning_rounds;
        self.triggers += other.triggers;
        self.retriggers += other.retriggers;
        self.big_wins += other.big_wins;
        self.capped_spins += other.capped_spins;
        self.total_cascade_depth += other.total_cascade_depth;
        self.max_win_ratio = self.max_win_ratio.max(other.max_win_ratio);
        for (symbol, count) in other.symbol_counts {
            *self.symbol_counts.entry(symbol).or_default() += count;
        }
        self
    }

    fn record_spin(&mut self, outcome: &SpinOutcome) {
        self.total_cascade_depth += outcome.cascade_depth() as u64;
        if outcome.cascade_capped {
            self.capped_spins += 1;
        }
        if outcome.win_tier >= WinTier::BigWin {
            self.big_wins += 1;
        }
        if let Some(grid) = outcome.initial_grid() {
            for symbol in grid.iter().flatten().flatten() {
                *self
                    .symbol_counts
                    .entry(symbol.as_str().to_string())
                    .or_default() += 1;
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIMULATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Parallel round simulator
pub struct Simulator {
    engine: Arc<TumbleEngine>,
}

impl Simulator {
    pub fn new(engine: Arc<TumbleEngine>) -> Self {
        Self { engine }
    }

    /// Play `config.rounds` rounds and aggregate the results
    pub fn run(&self, config: &SimConfig) -> Result<SimStats, SimError> {
        if !config.bet.is_finite() || config.bet <= 0.0 {
            return Err(SimError::InvalidConfig(format!("bet {} must be > 0", config.bet)));
        }
        if let Some(tier) = &config.bonus_tier {
            if self.engine.config().bonus_tier(tier).is_none() {
                return Err(SimError::UnknownBonusTier(tier.clone()));
            }
        }

        let threads = config.threads.unwrap_or_else(num_cpus::get).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| SimError::ThreadPool(e.to_string()))?;

        info!(
            "Simulating {} rounds at bet {} on {} threads (seed {})",
            config.rounds, config.bet, threads, config.seed
        );

        let stats = pool.install(|| {
            (0..config.rounds)
                .into_par_iter()
                .map(|index| self.play_round(config, index))
                .try_reduce(SimStats::default, |a, b| Ok(a.merge(b)))
        })?;

        info!(
            "Simulation done: RTP {:.3}%, hit rate {:.2}%, {} triggers",
            stats.rtp(),
            stats.hit_rate(),
            stats.triggers
        );
        Ok(stats)
    }

    /// One round on its own RNG stream
    fn play_round(&self, config: &SimConfig, index: u64) -> Result<SimStats, SimError> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        rng.set_stream(index);

        let mut stats = SimStats {
            rounds: 1,
            ..SimStats::default()
        };
        let mut ctl = SessionController::new(Arc::clone(&self.engine));
        let mut round_win = 0.0;
        let mut round_cost = config.bet;

        match &config.bonus_tier {
            None => {
                let outcome = ctl.play_standard(config.bet, &mut rng)?;
                stats.base_spins += 1;
                stats.base_win += outcome.total_return();
                round_win += outcome.total_return();
                if outcome.free_spins.is_some() {
                    stats.triggers += 1;
                }
                stats.record_spin(&outcome);
            }
            Some(tier_id) => {
                let tier = self
                    .engine
                    .config()
                    .bonus_tier(tier_id)
                    .ok_or_else(|| SimError::UnknownBonusTier(tier_id.clone()))?;
                round_cost = tier.cost(config.bet);
                ctl.start_session(
                    tier.spins,
                    config.bet,
                    SessionOrigin::Purchase {
                        tier: tier.id.clone(),
                        cost: round_cost,
                    },
                )?;
                stats.triggers += 1;
            }
        }

        while !ctl.is_complete() {
            let outcome = ctl.consume_one_spin(config.bet, &mut rng)?;
            stats.free_spins += 1;
            stats.free_spin_win += outcome.total_return();
            round_win += outcome.total_return();
            if outcome.free_spins.is_some() {
                stats.retriggers += 1;
            }
            stats.record_spin(&outcome);
        }

        stats.total_bet = round_cost;
        stats.total_win = round_win;
        if round_win > 0.0 {
            stats.winning_rounds = 1;
        }
        stats.max_win_ratio = round_win / config.bet;
        Ok(stats)
    }
}
