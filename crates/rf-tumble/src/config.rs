//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paytable::{validate_tiers, PayTier, Paytable};
use crate::symbols::{SymbolCatalog, SymbolDef};

/// Grid specification (columns × rows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of columns (reels)
    pub columns: u8,
    /// Number of rows per column
    pub rows: u8,
}

impl GridSpec {
    pub fn new(columns: u8, rows: u8) -> Self {
        Self { columns, rows }
    }

    /// Standard 6×5 tumble grid
    pub fn standard_6x5() -> Self {
        Self::new(6, 5)
    }

    /// Total grid positions
    pub fn total_cells(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(ConfigError::InvalidGrid(format!(
                "{}x{} has no cells",
                self.columns, self.rows
            )));
        }
        Ok(())
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::standard_6x5()
    }
}

/// How a free-spin session carries the multiplier accumulator between spins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplierCarryOver {
    /// Every spin starts from an empty accumulator
    #[default]
    FreshPerSpin,
    /// The session keeps a running accumulator seeding the next spin
    Cumulative,
}

/// Free spins configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeSpinRules {
    /// Scatters on the initial grid needed to trigger a session
    pub trigger_count: u32,
    /// Spins awarded by a trigger
    pub spins_awarded: u32,
    /// Scatters needed to retrigger during a session
    pub retrigger_count: u32,
    /// Extra spins on retrigger
    pub retrigger_spins: u32,
    /// Session multiplier policy
    pub carry_over: MultiplierCarryOver,
}

impl Default for FreeSpinRules {
    fn default() -> Self {
        Self {
            trigger_count: 4,
            spins_awarded: 10,
            retrigger_count: 3,
            retrigger_spins: 5,
            carry_over: MultiplierCarryOver::FreshPerSpin,
        }
    }
}

impl FreeSpinRules {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.trigger_count == 0 || self.retrigger_count == 0 {
            return Err(ConfigError::InvalidFreeSpins(
                "scatter counts must be >= 1".into(),
            ));
        }
        if self.spins_awarded == 0 {
            return Err(ConfigError::InvalidFreeSpins(
                "a trigger must award at least one spin".into(),
            ));
        }
        Ok(())
    }
}

/// A directly purchasable free-spin session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusTier {
    /// Tier identifier used in purchase requests
    pub id: String,
    /// Cost as a multiple of the bet
    pub cost_multiplier: f64,
    /// Fixed session length
    pub spins: u32,
}

impl BonusTier {
    pub fn new(id: impl Into<String>, cost_multiplier: f64, spins: u32) -> Self {
        Self {
            id: id.into(),
            cost_multiplier,
            spins,
        }
    }

    /// Purchase cost at `bet`
    pub fn cost(&self, bet: f64) -> f64 {
        self.cost_multiplier * bet
    }
}

/// Thresholds for categorizing wins (bet multiples)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinTierThresholds {
    /// Minimum ratio for "big win"
    pub big_win: f64,
    /// Minimum ratio for "mega win"
    pub mega_win: f64,
    /// Minimum ratio for "epic win"
    pub epic_win: f64,
    /// Minimum ratio for "ultra win"
    pub ultra_win: f64,
}

impl Default for WinTierThresholds {
    fn default() -> Self {
        Self {
            big_win: 15.0,
            mega_win: 25.0,
            epic_win: 50.0,
            ultra_win: 100.0,
        }
    }
}

impl WinTierThresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        let ladder = [self.big_win, self.mega_win, self.epic_win, self.ultra_win];
        if ladder.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            return Err(ConfigError::InvalidWinTiers("thresholds must be > 0".into()));
        }
        if ladder.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ConfigError::InvalidWinTiers(
                "thresholds must be strictly ascending".into(),
            ));
        }
        Ok(())
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Game name
    pub name: String,
    /// Grid specification
    #[serde(default)]
    pub grid: GridSpec,
    /// Smallest cluster any paytable entry may pay
    #[serde(default = "default_cluster_threshold")]
    pub cluster_threshold: u32,
    /// Symbol catalog, in catalog order
    pub catalog: Vec<SymbolDef>,
    /// Standard symbol payouts
    pub paytable: Paytable,
    /// Scatter payout bands (empty = scatters do not pay)
    #[serde(default)]
    pub scatter_pays: Vec<PayTier>,
    /// Free spins configuration
    #[serde(default)]
    pub free_spins: FreeSpinRules,
    /// Purchasable sessions
    #[serde(default)]
    pub bonus_tiers: Vec<BonusTier>,
    /// Win tier thresholds
    #[serde(default)]
    pub win_tiers: WinTierThresholds,
    /// Cascade depth cap (defaults to the grid's cell count)
    #[serde(default)]
    pub max_cascade_steps: Option<u32>,
}

fn default_cluster_threshold() -> u32 {
    8
}

impl EngineConfig {
    /// Sweet-Bonanza style 6×5 game with two purchasable tiers
    pub fn sweet_bonanza() -> Self {
        Self {
            name: "Sweet Tumble".into(),
            grid: GridSpec::standard_6x5(),
            cluster_threshold: 8,
            catalog: SymbolCatalog::sweet_bonanza().symbols().to_vec(),
            paytable: Paytable::sweet_bonanza(),
            scatter_pays: vec![
                PayTier::new(4, 3.0),
                PayTier::new(5, 5.0),
                PayTier::new(6, 100.0),
            ],
            free_spins: FreeSpinRules::default(),
            bonus_tiers: vec![
                BonusTier::new("standard", 100.0, 10),
                BonusTier::new("super", 500.0, 10),
            ],
            win_tiers: WinTierThresholds::default(),
            max_cascade_steps: None,
        }
    }

    /// Effective cascade depth cap
    pub fn max_cascade_steps(&self) -> u32 {
        self.max_cascade_steps
            .unwrap_or(self.grid.total_cells() as u32)
    }

    /// Look up a purchasable tier
    pub fn bonus_tier(&self, id: &str) -> Option<&BonusTier> {
        self.bonus_tiers.iter().find(|t| t.id == id)
    }

    /// Validate the whole configuration, returning the built catalog
    pub fn validate(&self) -> Result<SymbolCatalog, ConfigError> {
        self.grid.validate()?;
        if self.cluster_threshold == 0 {
            return Err(ConfigError::InvalidThreshold(self.cluster_threshold));
        }

        let catalog = SymbolCatalog::new(self.catalog.clone())?;
        self.paytable
            .validate(&catalog, self.cluster_threshold, self.grid.total_cells())?;

        if !self.scatter_pays.is_empty() {
            if catalog.scatter().is_none() {
                return Err(ConfigError::InvalidScatterPays(
                    "scatter pays configured without a scatter symbol".into(),
                ));
            }
            validate_tiers(&self.scatter_pays).map_err(ConfigError::InvalidScatterPays)?;
        }

        self.free_spins.validate()?;

        for (i, tier) in self.bonus_tiers.iter().enumerate() {
            let invalid = |reason: &str| ConfigError::InvalidBonusTier {
                id: tier.id.clone(),
                reason: reason.into(),
            };
            if tier.spins == 0 {
                return Err(invalid("session must have at least one spin"));
            }
            if !tier.cost_multiplier.is_finite() || tier.cost_multiplier <= 0.0 {
                return Err(invalid("cost multiplier must be > 0"));
            }
            if self.bonus_tiers[..i].iter().any(|t| t.id == tier.id) {
                return Err(invalid("duplicate tier id"));
            }
        }

        self.win_tiers.validate()?;

        if self.max_cascade_steps == Some(0) {
            return Err(ConfigError::InvalidGrid(
                "max_cascade_steps must be >= 1".into(),
            ));
        }

        Ok(catalog)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::sweet_bonanza()
    }
}
