//! Weighted symbol sampling
//!
//! The sampler is the only randomness boundary of the engine. Every empty
//! cell is filled through a [`SymbolSource`]; live play uses a
//! [`WeightedSampler`] over a host-supplied RNG, replays and tests use a
//! [`ScriptedSource`].

use std::collections::VecDeque;

use rand::Rng;

use crate::error::{EngineError, EngineResult};
use crate::symbols::{SymbolCatalog, SymbolDef, SymbolId};

/// Supplies one symbol per empty cell
pub trait SymbolSource {
    fn next_symbol(&mut self, catalog: &SymbolCatalog) -> EngineResult<SymbolId>;
}

impl<S: SymbolSource + ?Sized> SymbolSource for &mut S {
    fn next_symbol(&mut self, catalog: &SymbolCatalog) -> EngineResult<SymbolId> {
        (**self).next_symbol(catalog)
    }
}

/// Cumulative-weight draw.
///
/// Draws a uniform integer in `[0, total)` and returns the first symbol (in
/// catalog order) whose cumulative weight exceeds it. Zero-weight symbols
/// are never returned.
pub fn draw<'c, R: Rng + ?Sized>(catalog: &'c SymbolCatalog, rng: &mut R) -> &'c SymbolDef {
    let roll = rng.random_range(0..catalog.total_weight());
    let mut cumulative = 0u64;
    for def in catalog.iter() {
        cumulative += u64::from(def.rarity);
        if roll < cumulative {
            return def;
        }
    }
    // roll < total_weight, so the walk always returns above
    &catalog.symbols()[catalog.len() - 1]
}

/// Live symbol source over a host-supplied RNG
#[derive(Debug)]
pub struct WeightedSampler<R> {
    rng: R,
}

impl<R: Rng> WeightedSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: Rng> SymbolSource for WeightedSampler<R> {
    fn next_symbol(&mut self, catalog: &SymbolCatalog) -> EngineResult<SymbolId> {
        Ok(draw(catalog, &mut self.rng).id.clone())
    }
}

/// Pre-recorded symbol queue (audit replay, deterministic tests)
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    queue: VecDeque<SymbolId>,
}

impl ScriptedSource {
    pub fn new<I, T>(symbols: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SymbolId>,
    {
        Self {
            queue: symbols.into_iter().map(Into::into).collect(),
        }
    }

    /// Append more symbols to the queue
    pub fn extend<I, T>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<SymbolId>,
    {
        self.queue.extend(symbols.into_iter().map(Into::into));
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl SymbolSource for ScriptedSource {
    fn next_symbol(&mut self, catalog: &SymbolCatalog) -> EngineResult<SymbolId> {
        let symbol = self
            .queue
            .pop_front()
            .ok_or_else(|| EngineError::spin_failed("scripted symbol source exhausted"))?;
        if !catalog.contains(&symbol) {
            return Err(EngineError::spin_failed(format!(
                "scripted symbol {symbol} is not in the catalog"
            )));
        }
        Ok(symbol)
    }
}
