//! Shared fixtures for the integration suites

#![allow(dead_code)]

use rf_tumble::{
    EngineConfig, GridSpec, PayEntry, Paytable, SymbolCatalog, SymbolDef, TumbleEngine,
};

pub const BET: f64 = 10.0;

/// Standard A–F, one scatter and two carriers (X5, X12)
pub fn test_catalog() -> Vec<SymbolDef> {
    let mut symbols: Vec<SymbolDef> = ["A", "B", "C", "D", "E", "F"]
        .into_iter()
        .map(|id| SymbolDef::standard(id, 2.0, 10))
        .collect();
    symbols.push(SymbolDef::scatter("S", 1));
    symbols.push(SymbolDef::carrier("X5", 5.0, 1));
    symbols.push(SymbolDef::carrier("X12", 12.0, 1));
    symbols
}

/// `count × 2.0 × bet / 10` for every standard symbol, minimum 8
pub fn test_paytable() -> Paytable {
    ["A", "B", "C", "D", "E", "F"]
        .into_iter()
        .fold(Paytable::new(), |table, id| {
            table.with(id, PayEntry::linear(8, 2.0, 10.0))
        })
}

pub fn test_config() -> EngineConfig {
    EngineConfig {
        name: "Integration".into(),
        grid: GridSpec::standard_6x5(),
        cluster_threshold: 8,
        catalog: test_catalog(),
        paytable: test_paytable(),
        scatter_pays: Vec::new(),
        ..EngineConfig::sweet_bonanza()
    }
}

pub fn test_engine() -> TumbleEngine {
    TumbleEngine::new(test_config()).unwrap()
}

/// Catalog the sampler can only ever fill with `A`
pub fn single_symbol_engine(max_cascade_steps: Option<u32>) -> TumbleEngine {
    let catalog = vec![SymbolDef::standard("A", 1.0, 1)];
    let paytable = Paytable::linear_from_catalog(&SymbolCatalog::new(catalog.clone()).unwrap(), 8, 1.0);
    TumbleEngine::new(EngineConfig {
        name: "Single".into(),
        catalog,
        paytable,
        scatter_pays: Vec::new(),
        bonus_tiers: Vec::new(),
        max_cascade_steps,
        ..EngineConfig::sweet_bonanza()
    })
    .unwrap()
}

/// Split a row string like "A B C D E F" into symbols
pub fn rows(lines: &[&str]) -> Vec<Vec<String>> {
    lines
        .iter()
        .map(|line| line.split_whitespace().map(str::to_string).collect())
        .collect()
}
