//! Paytable and pay curves

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::symbols::{SymbolCatalog, SymbolDef, SymbolId, SymbolRole};

/// One band of a tiered curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayTier {
    /// Smallest count that pays this tier
    pub min_count: u32,
    /// Bet multiplier paid for the band
    pub multiplier: f64,
}

impl PayTier {
    pub fn new(min_count: u32, multiplier: f64) -> Self {
        Self {
            min_count,
            multiplier,
        }
    }
}

/// Payout as a function of (cluster size, bet)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayCurve {
    /// `size × per_unit × bet / bet_divisor`
    Linear {
        per_unit: f64,
        #[serde(default = "default_bet_divisor")]
        bet_divisor: f64,
    },
    /// Highest band whose `min_count <= size` pays `multiplier × bet`
    Tiered { tiers: Vec<PayTier> },
}

fn default_bet_divisor() -> f64 {
    1.0
}

impl PayCurve {
    /// Payout for a cluster of `size` cells at `bet`
    pub fn amount(&self, size: u32, bet: f64) -> f64 {
        match self {
            Self::Linear {
                per_unit,
                bet_divisor,
            } => size as f64 * per_unit * bet / bet_divisor,
            Self::Tiered { tiers } => tiered_amount(tiers, size, bet),
        }
    }

    /// Largest bet multiplier this curve can pay on a grid of `cells` cells
    pub fn max_multiplier(&self, cells: usize) -> f64 {
        match self {
            Self::Linear {
                per_unit,
                bet_divisor,
            } => cells as f64 * per_unit / bet_divisor,
            Self::Tiered { tiers } => tiers.last().map(|t| t.multiplier).unwrap_or(0.0),
        }
    }

    fn validate(&self, symbol: &SymbolId, min_cluster: u32) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidCurve {
            symbol: symbol.clone(),
            reason,
        };

        match self {
            Self::Linear {
                per_unit,
                bet_divisor,
            } => {
                if !per_unit.is_finite() || *per_unit < 0.0 {
                    return Err(invalid(format!("per_unit {per_unit} must be >= 0")));
                }
                if !bet_divisor.is_finite() || *bet_divisor <= 0.0 {
                    return Err(invalid(format!("bet_divisor {bet_divisor} must be > 0")));
                }
            }
            Self::Tiered { tiers } => {
                validate_tiers(tiers).map_err(invalid)?;
                if let Some(first) = tiers.first() {
                    if first.min_count != min_cluster {
                        return Err(invalid(format!(
                            "first tier starts at {}, minimum cluster is {}",
                            first.min_count, min_cluster
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Payout of a tiered table (0 below the first band)
pub fn tiered_amount(tiers: &[PayTier], count: u32, bet: f64) -> f64 {
    tiers
        .iter()
        .rev()
        .find(|t| t.min_count <= count)
        .map(|t| t.multiplier * bet)
        .unwrap_or(0.0)
}

/// Tiers must be non-empty, strictly ascending in count and non-decreasing
/// in multiplier, so payout never drops as a cluster grows.
pub(crate) fn validate_tiers(tiers: &[PayTier]) -> Result<(), String> {
    if tiers.is_empty() {
        return Err("no tiers".into());
    }
    for tier in tiers {
        if tier.min_count == 0 {
            return Err("tier min_count must be >= 1".into());
        }
        if !tier.multiplier.is_finite() || tier.multiplier < 0.0 {
            return Err(format!("tier multiplier {} must be >= 0", tier.multiplier));
        }
    }
    for pair in tiers.windows(2) {
        if pair[1].min_count <= pair[0].min_count {
            return Err(format!(
                "tier counts not ascending ({} after {})",
                pair[1].min_count, pair[0].min_count
            ));
        }
        if pair[1].multiplier < pair[0].multiplier {
            return Err(format!(
                "payout decreases from {} to {} at {} cells",
                pair[0].multiplier, pair[1].multiplier, pair[1].min_count
            ));
        }
    }
    Ok(())
}

/// Paytable entry for one standard symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayEntry {
    /// Minimum cluster size that pays
    pub min_cluster: u32,
    /// Payout curve
    pub curve: PayCurve,
}

impl PayEntry {
    pub fn linear(min_cluster: u32, per_unit: f64, bet_divisor: f64) -> Self {
        Self {
            min_cluster,
            curve: PayCurve::Linear {
                per_unit,
                bet_divisor,
            },
        }
    }

    /// Tiered entry; the minimum cluster is the first band's count
    pub fn tiered(tiers: &[(u32, f64)]) -> Self {
        let tiers: Vec<PayTier> = tiers.iter().map(|&(c, m)| PayTier::new(c, m)).collect();
        Self {
            min_cluster: tiers.first().map(|t| t.min_count).unwrap_or(0),
            curve: PayCurve::Tiered { tiers },
        }
    }

    pub fn amount(&self, size: u32, bet: f64) -> f64 {
        if size < self.min_cluster {
            return 0.0;
        }
        self.curve.amount(size, bet)
    }
}

/// Complete paytable: standard symbol → pay entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Paytable {
    entries: BTreeMap<SymbolId, PayEntry>,
}

impl Paytable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add an entry
    pub fn with(mut self, symbol: impl Into<SymbolId>, entry: PayEntry) -> Self {
        self.insert(symbol, entry);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<SymbolId>, entry: PayEntry) {
        self.entries.insert(symbol.into(), entry);
    }

    /// Linear paytable derived from each standard symbol's pay weight
    pub fn linear_from_catalog(catalog: &SymbolCatalog, min_cluster: u32, bet_divisor: f64) -> Self {
        let entries = catalog
            .standard()
            .map(|def: &SymbolDef| {
                (
                    def.id.clone(),
                    PayEntry::linear(min_cluster, def.pay_weight, bet_divisor),
                )
            })
            .collect();
        Self { entries }
    }

    /// Sweet-Bonanza style bands (8-9, 10-11, 12+) for the built-in catalog
    pub fn sweet_bonanza() -> Self {
        Self::new()
            .with("HEART", PayEntry::tiered(&[(8, 10.0), (10, 25.0), (12, 50.0)]))
            .with("PURPLE", PayEntry::tiered(&[(8, 2.5), (10, 10.0), (12, 25.0)]))
            .with("GREEN", PayEntry::tiered(&[(8, 2.0), (10, 5.0), (12, 15.0)]))
            .with("BLUE", PayEntry::tiered(&[(8, 1.5), (10, 2.0), (12, 12.0)]))
            .with("APPLE", PayEntry::tiered(&[(8, 1.0), (10, 1.5), (12, 10.0)]))
            .with("PLUM", PayEntry::tiered(&[(8, 0.8), (10, 1.2), (12, 8.0)]))
            .with("WATERMELON", PayEntry::tiered(&[(8, 0.5), (10, 1.0), (12, 5.0)]))
            .with("GRAPES", PayEntry::tiered(&[(8, 0.4), (10, 0.9), (12, 4.0)]))
            .with("BANANA", PayEntry::tiered(&[(8, 0.25), (10, 0.75), (12, 2.0)]))
    }

    pub fn get(&self, symbol: &SymbolId) -> Option<&PayEntry> {
        self.entries.get(symbol)
    }

    /// Minimum paying cluster for a symbol
    pub fn min_cluster(&self, symbol: &SymbolId) -> Option<u32> {
        self.entries.get(symbol).map(|e| e.min_cluster)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SymbolId, &PayEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check the paytable against the catalog and grid
    pub fn validate(
        &self,
        catalog: &SymbolCatalog,
        threshold: u32,
        cells: usize,
    ) -> Result<(), ConfigError> {
        for def in catalog.standard() {
            if !self.entries.contains_key(&def.id) {
                return Err(ConfigError::MissingPaytableEntry(def.id.clone()));
            }
        }

        for (symbol, entry) in &self.entries {
            let def = catalog
                .get(symbol)
                .ok_or_else(|| ConfigError::UnknownSymbol(symbol.clone()))?;
            match def.role {
                SymbolRole::Standard => {}
                SymbolRole::Scatter | SymbolRole::MultiplierCarrier => {
                    return Err(ConfigError::NotPayable(symbol.clone()));
                }
            }
            if entry.min_cluster < threshold {
                return Err(ConfigError::MinClusterBelowThreshold {
                    symbol: symbol.clone(),
                    min_cluster: entry.min_cluster,
                    threshold,
                });
            }
            if entry.min_cluster as usize > cells {
                return Err(ConfigError::MinClusterExceedsGrid {
                    symbol: symbol.clone(),
                    min_cluster: entry.min_cluster,
                    cells,
                });
            }
            entry.curve.validate(symbol, entry.min_cluster)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_curve() {
        let entry = PayEntry::linear(8, 2.0, 10.0);
        assert_eq!(entry.amount(8, 10.0), 16.0);
        assert_eq!(entry.amount(7, 10.0), 0.0);
        assert_eq!(entry.amount(12, 10.0), 24.0);
    }

    #[test]
    fn test_tiered_curve() {
        let entry = PayEntry::tiered(&[(8, 10.0), (10, 25.0), (12, 50.0)]);
        assert_eq!(entry.min_cluster, 8);
        assert_eq!(entry.amount(7, 1.0), 0.0);
        assert_eq!(entry.amount(9, 1.0), 10.0);
        assert_eq!(entry.amount(10, 2.0), 50.0);
        assert_eq!(entry.amount(30, 1.0), 50.0);
    }

    #[test]
    fn test_sweet_bonanza_paytable_is_valid() {
        let catalog = SymbolCatalog::sweet_bonanza();
        let paytable = Paytable::sweet_bonanza();
        assert!(paytable.validate(&catalog, 8, 30).is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_entries() {
        let catalog = SymbolCatalog::new(vec![
            SymbolDef::standard("A", 2.0, 10),
            SymbolDef::standard("B", 1.0, 10),
            SymbolDef::scatter("S", 1),
        ])
        .unwrap();

        let missing = Paytable::new().with("A", PayEntry::linear(8, 2.0, 10.0));
        assert_eq!(
            missing.validate(&catalog, 8, 30).unwrap_err(),
            ConfigError::MissingPaytableEntry("B".into())
        );

        let below = Paytable::linear_from_catalog(&catalog, 5, 10.0);
        assert!(matches!(
            below.validate(&catalog, 8, 30),
            Err(ConfigError::MinClusterBelowThreshold { .. })
        ));

        let scatter_entry = Paytable::linear_from_catalog(&catalog, 8, 10.0)
            .with("S", PayEntry::linear(8, 1.0, 1.0));
        assert_eq!(
            scatter_entry.validate(&catalog, 8, 30).unwrap_err(),
            ConfigError::NotPayable("S".into())
        );

        let decreasing = Paytable::linear_from_catalog(&catalog, 8, 10.0)
            .with("A", PayEntry::tiered(&[(8, 5.0), (10, 4.0)]));
        assert!(matches!(
            decreasing.validate(&catalog, 8, 30),
            Err(ConfigError::InvalidCurve { .. })
        ));

        let too_big = Paytable::linear_from_catalog(&catalog, 31, 10.0);
        assert!(matches!(
            too_big.validate(&catalog, 8, 30),
            Err(ConfigError::MinClusterExceedsGrid { .. })
        ));
    }

    #[test]
    fn test_tiered_amount_below_first_band() {
        let tiers = [PayTier::new(4, 3.0), PayTier::new(5, 5.0), PayTier::new(6, 100.0)];
        assert_eq!(tiered_amount(&tiers, 3, 1.0), 0.0);
        assert_eq!(tiered_amount(&tiers, 4, 2.0), 6.0);
        assert_eq!(tiered_amount(&tiers, 9, 1.0), 100.0);
    }
}
