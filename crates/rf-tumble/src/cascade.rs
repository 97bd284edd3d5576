//! Cascade state machine
//!
//! ```text
//! Sampling → Detecting ─┬─ clusters ──→ Paying → Clearing → Refilling ─┐
//!                       │                                              │
//!                       └─ none ──────→ Settled        Detecting ←─────┘
//! ```
//!
//! A [`Cascade`] owns its grid and symbol source and yields one
//! [`CascadeStep`] per paying pass, then a final settle step. It is consumed
//! once; an error ends it with a single `SpinFailed`.

use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::cluster::{CarrierHit, ClusterDetector, ClusterResult};
use crate::engine::TumbleEngine;
use crate::error::{EngineError, EngineResult};
use crate::grid::{Coord, Grid, GridSnapshot};
use crate::payout;
use crate::sampler::SymbolSource;
use crate::spin::{FreeSpinsAwarded, SpinContext, SpinOutcome, WinTier};

/// Cascade states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadePhase {
    Sampling,
    Detecting,
    Paying,
    Clearing,
    Refilling,
    Settled,
}

/// A cluster together with what it paid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaidCluster {
    #[serde(flatten)]
    pub cluster: ClusterResult,
    pub payout: f64,
}

/// Immutable record of one detection pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStep {
    pub index: u32,
    /// Grid as detected, before clearing
    pub grid_before: GridSnapshot,
    pub clusters: Vec<PaidCluster>,
    /// Carriers counted (and consumed) this step
    pub carriers: Vec<CarrierHit>,
    /// Sum of cluster payouts
    pub payout: f64,
    /// Multiplier added this step, if any carrier was present
    pub multiplier_contributed: Option<f64>,
    /// After clearing and gravity, before refill
    pub grid_collapsed: GridSnapshot,
    /// After refill
    pub grid_after: GridSnapshot,
}

impl CascadeStep {
    /// The terminal pass that found nothing to pay
    pub fn is_settle(&self) -> bool {
        self.clusters.is_empty()
    }

    fn settle(index: u32, grid: &Grid) -> Self {
        let snapshot = grid.snapshot();
        Self {
            index,
            grid_before: snapshot.clone(),
            clusters: Vec::new(),
            carriers: Vec::new(),
            payout: 0.0,
            multiplier_contributed: None,
            grid_collapsed: snapshot.clone(),
            grid_after: snapshot,
        }
    }
}

/// Lazy, non-restartable sequence of cascade steps for one spin
pub struct Cascade<'e, S: SymbolSource> {
    engine: &'e TumbleEngine,
    source: S,
    grid: Grid,
    bet: f64,
    ctx: SpinContext,
    phase: CascadePhase,
    index: u32,
    paying_steps: u32,
    raw_win: f64,
    multiplier: f64,
    initial_scatters: u32,
    capped: bool,
    failed: bool,
}

impl<'e, S: SymbolSource> Cascade<'e, S> {
    pub(crate) fn new(engine: &'e TumbleEngine, grid: Grid, source: S, bet: f64, ctx: SpinContext) -> Self {
        Self {
            engine,
            source,
            grid,
            bet,
            ctx,
            phase: CascadePhase::Sampling,
            index: 0,
            paying_steps: 0,
            raw_win: 0.0,
            multiplier: ctx.carried_multiplier,
            initial_scatters: 0,
            capped: false,
            failed: false,
        }
    }

    pub fn phase(&self) -> CascadePhase {
        self.phase
    }

    /// Raw win accumulated so far
    pub fn raw_win(&self) -> f64 {
        self.raw_win
    }

    /// Multiplier accumulator so far
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Drive the cascade to completion and compose the outcome
    pub fn into_outcome(mut self) -> EngineResult<SpinOutcome> {
        let mut steps = Vec::new();
        for step in self.by_ref() {
            steps.push(step?);
        }
        if self.failed || self.phase != CascadePhase::Settled {
            return Err(EngineError::spin_failed("cascade did not settle"));
        }

        let config = self.engine.config();
        let final_payout = payout::compose_final(self.raw_win, self.multiplier);
        let scatter_payout =
            payout::scatter_payout(&config.scatter_pays, self.initial_scatters, self.bet);

        Ok(SpinOutcome {
            bet: self.bet,
            steps,
            raw_win: self.raw_win,
            multiplier_accumulated: self.multiplier,
            multiplier: payout::applied_multiplier(self.multiplier),
            final_payout,
            scatter_count: self.initial_scatters,
            scatter_payout,
            free_spins: self.free_spins_awarded(),
            win_tier: WinTier::classify(final_payout, self.bet, &config.win_tiers),
            cascade_capped: self.capped,
            is_free_spin: self.ctx.in_session,
        })
    }

    fn free_spins_awarded(&self) -> Option<FreeSpinsAwarded> {
        let scatter = self.engine.catalog().scatter()?;
        let rules = &self.engine.config().free_spins;
        let (threshold, spins) = if self.ctx.in_session {
            (rules.retrigger_count, rules.retrigger_spins)
        } else {
            (rules.trigger_count, rules.spins_awarded)
        };
        if self.initial_scatters < threshold || spins == 0 {
            return None;
        }
        Some(FreeSpinsAwarded {
            symbol: scatter.id.clone(),
            count: self.initial_scatters,
            spins,
            retrigger: self.ctx.in_session,
        })
    }

    fn detector(&self) -> ClusterDetector<'e> {
        ClusterDetector::new(self.engine.catalog(), self.engine.paytable())
    }

    fn sample(&mut self) -> EngineResult<()> {
        self.grid
            .fill_empty_cells(&mut self.source, self.engine.catalog())?;
        self.initial_scatters = self.detector().scatter_count(&self.grid);
        self.phase = CascadePhase::Detecting;
        Ok(())
    }

    fn step(&mut self) -> EngineResult<CascadeStep> {
        if self.phase == CascadePhase::Sampling {
            self.sample()?;
        }

        let index = self.index;
        self.index += 1;

        let detector = self.detector();
        let found = detector.detect(&self.grid);
        if found.is_empty() {
            // Carriers only count in a paying pass; any left here stay unspent
            self.phase = CascadePhase::Settled;
            return Ok(CascadeStep::settle(index, &self.grid));
        }
        if self.paying_steps >= self.engine.max_cascade_steps() {
            // Winning clusters stay on the grid unpaid
            self.capped = true;
            self.phase = CascadePhase::Settled;
            debug!("Cascade capped after {} paying steps", self.paying_steps);
            return Ok(CascadeStep::settle(index, &self.grid));
        }

        self.phase = CascadePhase::Paying;
        let grid_before = self.grid.snapshot();
        let mut clusters = Vec::with_capacity(found.len());
        let mut step_payout = 0.0;
        for cluster in found {
            let amount = payout::payout_for(&cluster, self.engine.paytable(), self.bet)?;
            step_payout += amount;
            clusters.push(PaidCluster {
                cluster,
                payout: amount,
            });
        }
        let carriers = detector.carriers(&self.grid);
        let contributed = (!carriers.is_empty()).then(|| payout::carrier_total(&carriers));
        self.raw_win += step_payout;
        self.multiplier += contributed.unwrap_or(0.0);

        self.phase = CascadePhase::Clearing;
        let spent: Vec<Coord> = clusters
            .iter()
            .flat_map(|c| c.cluster.cells.iter().copied())
            .chain(carriers.iter().map(|c| c.coord))
            .collect();
        self.grid.clear(&spent);

        self.phase = CascadePhase::Refilling;
        self.grid.apply_gravity();
        let grid_collapsed = self.grid.snapshot();
        self.grid
            .fill_empty_cells(&mut self.source, self.engine.catalog())?;
        self.paying_steps += 1;
        self.phase = CascadePhase::Detecting;

        debug!(
            "Cascade step {}: {} clusters, payout {:.2}, multiplier {:.1}",
            index,
            clusters.len(),
            step_payout,
            self.multiplier
        );

        Ok(CascadeStep {
            index,
            grid_before,
            clusters,
            carriers,
            payout: step_payout,
            multiplier_contributed: contributed,
            grid_collapsed,
            grid_after: self.grid.snapshot(),
        })
    }
}

impl<S: SymbolSource> Iterator for Cascade<'_, S> {
    type Item = EngineResult<CascadeStep>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.phase == CascadePhase::Settled {
            return None;
        }
        match self.step() {
            Ok(step) => Some(Ok(step)),
            Err(e) => {
                let e = e.into_spin_failed();
                error!("Spin failed at cascade step {}: {}", self.index, e);
                self.failed = true;
                self.phase = CascadePhase::Settled;
                Some(Err(e))
            }
        }
    }
}
