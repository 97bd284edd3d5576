//! Symbol definitions and the symbol catalog

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Catalog identifier of a symbol (e.g. "HEART", "SCATTER", "X5")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub String);

impl SymbolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SymbolId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SymbolId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Symbol role classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolRole {
    /// Pays in clusters
    Standard,
    /// Counted anywhere on the initial grid, triggers free spins
    Scatter,
    /// Adds its value to the spin multiplier, never part of a cluster
    MultiplierCarrier,
}

/// A symbol definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolDef {
    /// Unique symbol ID
    pub id: SymbolId,
    /// Symbol role
    pub role: SymbolRole,
    /// Payout weight. For standard symbols: bet multiplier per matching unit.
    /// For multiplier carriers: the additive multiplier contribution.
    #[serde(default)]
    pub pay_weight: f64,
    /// Relative sampling probability
    pub rarity: u32,
}

impl SymbolDef {
    /// Create a standard (cluster-paying) symbol
    pub fn standard(id: impl Into<SymbolId>, pay_weight: f64, rarity: u32) -> Self {
        Self {
            id: id.into(),
            role: SymbolRole::Standard,
            pay_weight,
            rarity,
        }
    }

    /// Create a scatter symbol
    pub fn scatter(id: impl Into<SymbolId>, rarity: u32) -> Self {
        Self {
            id: id.into(),
            role: SymbolRole::Scatter,
            pay_weight: 0.0,
            rarity,
        }
    }

    /// Create a multiplier carrier contributing `value` to the spin multiplier
    pub fn carrier(id: impl Into<SymbolId>, value: f64, rarity: u32) -> Self {
        Self {
            id: id.into(),
            role: SymbolRole::MultiplierCarrier,
            pay_weight: value,
            rarity,
        }
    }

    /// Multiplier contribution if this is a carrier
    pub fn carrier_value(&self) -> Option<f64> {
        match self.role {
            SymbolRole::MultiplierCarrier => Some(self.pay_weight),
            SymbolRole::Standard | SymbolRole::Scatter => None,
        }
    }

    /// Check if this is a special symbol (scatter or carrier)
    pub fn is_special(&self) -> bool {
        !matches!(self.role, SymbolRole::Standard)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.role {
            SymbolRole::MultiplierCarrier => {
                if !self.pay_weight.is_finite() || self.pay_weight < 1.0 {
                    return Err(ConfigError::InvalidCarrierValue {
                        symbol: self.id.clone(),
                        value: self.pay_weight,
                    });
                }
            }
            SymbolRole::Standard | SymbolRole::Scatter => {
                if !self.pay_weight.is_finite() || self.pay_weight < 0.0 {
                    return Err(ConfigError::InvalidPayWeight {
                        symbol: self.id.clone(),
                        value: self.pay_weight,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Validated, immutable symbol catalog.
///
/// Catalog order is significant: detection results and sampling walk the
/// symbols in this order, which keeps replays exact.
#[derive(Debug, Clone)]
pub struct SymbolCatalog {
    symbols: Vec<SymbolDef>,
    index: HashMap<SymbolId, usize>,
    total_weight: u64,
}

impl SymbolCatalog {
    /// Build a catalog, rejecting anything that would make sampling or
    /// detection ill-defined
    pub fn new(symbols: Vec<SymbolDef>) -> Result<Self, ConfigError> {
        if symbols.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        let mut index = HashMap::with_capacity(symbols.len());
        let mut total_weight = 0u64;
        let mut scatters = 0usize;

        for (pos, def) in symbols.iter().enumerate() {
            def.validate()?;
            if index.insert(def.id.clone(), pos).is_some() {
                return Err(ConfigError::DuplicateSymbol(def.id.clone()));
            }
            if def.role == SymbolRole::Scatter {
                scatters += 1;
            }
            total_weight += u64::from(def.rarity);
        }

        if !symbols.iter().any(|s| s.role == SymbolRole::Standard) {
            return Err(ConfigError::NoStandardSymbol);
        }
        if scatters > 1 {
            return Err(ConfigError::MultipleScatters);
        }
        if total_weight == 0 {
            return Err(ConfigError::ZeroTotalWeight);
        }

        Ok(Self {
            symbols,
            index,
            total_weight,
        })
    }

    /// Sweet-Bonanza style catalog: nine candies/fruits, one scatter and a
    /// ladder of multiplier bombs
    pub fn sweet_bonanza() -> Self {
        let symbols = vec![
            // High paying
            SymbolDef::standard("HEART", 50.0, 45),
            SymbolDef::standard("PURPLE", 25.0, 60),
            SymbolDef::standard("GREEN", 15.0, 70),
            SymbolDef::standard("BLUE", 12.0, 80),
            // Low paying
            SymbolDef::standard("APPLE", 10.0, 130),
            SymbolDef::standard("PLUM", 8.0, 140),
            SymbolDef::standard("WATERMELON", 5.0, 150),
            SymbolDef::standard("GRAPES", 4.0, 160),
            SymbolDef::standard("BANANA", 2.0, 170),
            // Special
            SymbolDef::scatter("SCATTER", 12),
            SymbolDef::carrier("X2", 2.0, 6),
            SymbolDef::carrier("X3", 3.0, 5),
            SymbolDef::carrier("X5", 5.0, 4),
            SymbolDef::carrier("X10", 10.0, 3),
            SymbolDef::carrier("X25", 25.0, 2),
            SymbolDef::carrier("X50", 50.0, 1),
            SymbolDef::carrier("X100", 100.0, 1),
        ];

        match Self::new(symbols) {
            Ok(catalog) => catalog,
            Err(e) => unreachable!("built-in catalog is valid: {e}"),
        }
    }

    /// Get symbol by ID
    pub fn get(&self, id: &SymbolId) -> Option<&SymbolDef> {
        self.index.get(id).map(|&pos| &self.symbols[pos])
    }

    /// Catalog position of a symbol
    pub fn position(&self, id: &SymbolId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &SymbolId) -> bool {
        self.index.contains_key(id)
    }

    /// All symbols in catalog order
    pub fn symbols(&self) -> &[SymbolDef] {
        &self.symbols
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolDef> {
        self.symbols.iter()
    }

    /// Standard symbols in catalog order
    pub fn standard(&self) -> impl Iterator<Item = &SymbolDef> {
        self.symbols
            .iter()
            .filter(|s| s.role == SymbolRole::Standard)
    }

    /// Multiplier carriers in catalog order
    pub fn carriers(&self) -> impl Iterator<Item = &SymbolDef> {
        self.symbols
            .iter()
            .filter(|s| s.role == SymbolRole::MultiplierCarrier)
    }

    /// The scatter symbol, if the catalog has one
    pub fn scatter(&self) -> Option<&SymbolDef> {
        self.symbols.iter().find(|s| s.role == SymbolRole::Scatter)
    }

    /// Sum of all rarity weights (always > 0)
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carrier_value() {
        let bomb = SymbolDef::carrier("X5", 5.0, 3);
        assert_eq!(bomb.carrier_value(), Some(5.0));
        assert!(bomb.is_special());

        let apple = SymbolDef::standard("APPLE", 1.0, 10);
        assert_eq!(apple.carrier_value(), None);
        assert!(!apple.is_special());
    }

    #[test]
    fn test_sweet_bonanza_catalog() {
        let catalog = SymbolCatalog::sweet_bonanza();
        assert_eq!(catalog.standard().count(), 9);
        assert_eq!(catalog.carriers().count(), 7);
        assert_eq!(catalog.scatter().map(|s| s.id.as_str()), Some("SCATTER"));
        assert_eq!(catalog.position(&"HEART".into()), Some(0));
        assert!(catalog.total_weight() > 0);
    }

    #[test]
    fn test_catalog_rejects_invalid_input() {
        assert_eq!(SymbolCatalog::new(vec![]).unwrap_err(), ConfigError::EmptyCatalog);

        let only_special = vec![SymbolDef::scatter("S", 1)];
        assert_eq!(
            SymbolCatalog::new(only_special).unwrap_err(),
            ConfigError::NoStandardSymbol
        );

        let dup = vec![
            SymbolDef::standard("A", 1.0, 1),
            SymbolDef::standard("A", 2.0, 1),
        ];
        assert!(matches!(
            SymbolCatalog::new(dup),
            Err(ConfigError::DuplicateSymbol(_))
        ));

        let zero = vec![SymbolDef::standard("A", 1.0, 0)];
        assert_eq!(SymbolCatalog::new(zero).unwrap_err(), ConfigError::ZeroTotalWeight);

        let weak_bomb = vec![
            SymbolDef::standard("A", 1.0, 1),
            SymbolDef::carrier("X0", 0.5, 1),
        ];
        assert!(matches!(
            SymbolCatalog::new(weak_bomb),
            Err(ConfigError::InvalidCarrierValue { .. })
        ));

        let two_scatters = vec![
            SymbolDef::standard("A", 1.0, 1),
            SymbolDef::scatter("S1", 1),
            SymbolDef::scatter("S2", 1),
        ];
        assert_eq!(
            SymbolCatalog::new(two_scatters).unwrap_err(),
            ConfigError::MultipleScatters
        );
    }
}
