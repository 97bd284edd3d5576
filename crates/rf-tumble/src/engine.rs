//! Tumble Engine — cascade entry points
//!
//! The engine is immutable after construction and holds no randomness of
//! its own: every spin is resolved from a host-supplied RNG or symbol source,
//! so one instance can be shared across threads behind an `Arc`.

use log::error;
use rand::Rng;

use crate::cascade::Cascade;
use crate::config::EngineConfig;
use crate::error::{ConfigError, EngineError, EngineResult};
use crate::grid::Grid;
use crate::paytable::Paytable;
use crate::sampler::{SymbolSource, WeightedSampler};
use crate::spin::{SpinContext, SpinOutcome};
use crate::symbols::SymbolCatalog;

/// Cascading cluster-pays outcome engine
#[derive(Debug, Clone)]
pub struct TumbleEngine {
    config: EngineConfig,
    catalog: SymbolCatalog,
}

impl TumbleEngine {
    /// Validate `config` and build an engine. Any violation refuses to start.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let catalog = config.validate()?;
        log::info!(
            "Tumble engine '{}' ready: {}x{} grid, {} symbols, threshold {}",
            config.name,
            config.grid.columns,
            config.grid.rows,
            catalog.len(),
            config.cluster_threshold
        );
        Ok(Self { config, catalog })
    }

    /// Engine with the built-in Sweet-Bonanza style configuration
    pub fn sweet_bonanza() -> Result<Self, ConfigError> {
        Self::new(EngineConfig::sweet_bonanza())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    pub fn paytable(&self) -> &Paytable {
        &self.config.paytable
    }

    /// Paying steps allowed before a spin is forced to settle
    pub fn max_cascade_steps(&self) -> u32 {
        self.config.max_cascade_steps()
    }

    /// Base-game spin on a freshly sampled grid
    pub fn spin<R: Rng>(&self, bet: f64, rng: &mut R) -> EngineResult<SpinOutcome> {
        self.spin_with(bet, SpinContext::base(), rng)
    }

    /// Free spin whose accumulator starts at `carried_multiplier`
    pub fn spin_carrying<R: Rng>(
        &self,
        bet: f64,
        carried_multiplier: f64,
        rng: &mut R,
    ) -> EngineResult<SpinOutcome> {
        self.spin_with(bet, SpinContext::free_spin(carried_multiplier), rng)
    }

    pub fn spin_with<R: Rng>(
        &self,
        bet: f64,
        ctx: SpinContext,
        rng: &mut R,
    ) -> EngineResult<SpinOutcome> {
        let grid = Grid::empty(self.config.grid);
        self.run(bet, grid, WeightedSampler::new(rng), ctx)
    }

    /// Resolve a forced initial grid, refilling from `source`
    pub fn resolve<S: SymbolSource>(
        &self,
        bet: f64,
        grid: Grid,
        source: S,
        ctx: SpinContext,
    ) -> EngineResult<SpinOutcome> {
        if grid.spec() != self.config.grid {
            return Err(EngineError::spin_failed(format!(
                "grid is {}x{}, engine expects {}x{}",
                grid.columns(),
                grid.rows(),
                self.config.grid.columns,
                self.config.grid.rows
            )));
        }
        if let Some((coord, symbol)) = grid.occupied().find(|(_, s)| !self.catalog.contains(s)) {
            return Err(EngineError::spin_failed(format!(
                "unknown symbol {symbol} at column {} row {}",
                coord.column, coord.row
            )));
        }
        self.run(bet, grid, source, ctx)
    }

    /// Lazy cascade over `grid`; empty cells are sampled from `source` first
    pub fn cascade<S: SymbolSource>(
        &self,
        bet: f64,
        grid: Grid,
        source: S,
        ctx: SpinContext,
    ) -> Cascade<'_, S> {
        Cascade::new(self, grid, source, bet, ctx)
    }

    fn run<S: SymbolSource>(
        &self,
        bet: f64,
        grid: Grid,
        source: S,
        ctx: SpinContext,
    ) -> EngineResult<SpinOutcome> {
        if !bet.is_finite() || bet <= 0.0 {
            error!("Rejected spin with bet {bet}");
            return Err(EngineError::spin_failed(format!("invalid bet {bet}")));
        }
        if !ctx.carried_multiplier.is_finite() || ctx.carried_multiplier < 0.0 {
            return Err(EngineError::spin_failed(format!(
                "invalid carried multiplier {}",
                ctx.carried_multiplier
            )));
        }
        self.cascade(bet, grid, source, ctx).into_outcome()
    }
}
