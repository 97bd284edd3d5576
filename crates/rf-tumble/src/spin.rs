//! Spin requests and outcomes

use serde::{Deserialize, Serialize};

use crate::cascade::CascadeStep;
use crate::config::WinTierThresholds;
use crate::grid::GridSnapshot;
use crate::symbols::SymbolId;

/// How a spin request should be resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinMode {
    /// Paid base-game spin (debit = bet)
    Standard,
    /// One spin of the player's active free-spin session (debit = 0)
    FreeSpinConsume,
    /// Buy a free-spin session of the given tier (debit = tier cost)
    BonusPurchase(String),
}

/// A spin request from the trusted caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinRequest {
    pub player_id: String,
    pub bet: f64,
    pub mode: SpinMode,
}

impl SpinRequest {
    pub fn standard(player_id: impl Into<String>, bet: f64) -> Self {
        Self {
            player_id: player_id.into(),
            bet,
            mode: SpinMode::Standard,
        }
    }

    pub fn free_spin(player_id: impl Into<String>, bet: f64) -> Self {
        Self {
            player_id: player_id.into(),
            bet,
            mode: SpinMode::FreeSpinConsume,
        }
    }

    pub fn purchase(player_id: impl Into<String>, bet: f64, tier: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            bet,
            mode: SpinMode::BonusPurchase(tier.into()),
        }
    }
}

/// Per-spin context passed explicitly into the engine
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpinContext {
    /// Starting value of the multiplier accumulator
    pub carried_multiplier: f64,
    /// Spin belongs to a free-spin session (scatters retrigger instead of trigger)
    pub in_session: bool,
}

impl SpinContext {
    /// Base-game spin
    pub fn base() -> Self {
        Self::default()
    }

    /// Free spin, seeding the accumulator with `carried`
    pub fn free_spin(carried: f64) -> Self {
        Self {
            carried_multiplier: carried,
            in_session: true,
        }
    }
}

/// Free spins awarded by the initial grid's scatters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeSpinsAwarded {
    /// Scatter symbol that fired
    pub symbol: SymbolId,
    /// Scatters on the initial grid
    pub count: u32,
    /// Spins awarded
    pub spins: u32,
    /// Awarded during a session (extends it)
    pub retrigger: bool,
}

/// Celebration tier by win-to-bet ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinTier {
    None,
    Win,
    BigWin,
    MegaWin,
    EpicWin,
    UltraWin,
}

impl WinTier {
    pub fn classify(payout: f64, bet: f64, thresholds: &WinTierThresholds) -> Self {
        if payout <= 0.0 {
            return Self::None;
        }
        let ratio = if bet > 0.0 { payout / bet } else { 0.0 };
        if ratio >= thresholds.ultra_win {
            Self::UltraWin
        } else if ratio >= thresholds.epic_win {
            Self::EpicWin
        } else if ratio >= thresholds.mega_win {
            Self::MegaWin
        } else if ratio >= thresholds.big_win {
            Self::BigWin
        } else {
            Self::Win
        }
    }
}

/// Complete, replayable result of one spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    /// Bet amount
    pub bet: f64,
    /// Every cascade step, ending with the settle step
    pub steps: Vec<CascadeStep>,
    /// Sum of step payouts
    pub raw_win: f64,
    /// Multiplier accumulator at settle (carried value + carriers)
    pub multiplier_accumulated: f64,
    /// Multiplier applied to the raw win, `max(1, accumulated)`
    pub multiplier: f64,
    /// `raw_win × multiplier`
    pub final_payout: f64,
    /// Scatters on the initial grid
    pub scatter_count: u32,
    /// Scatter pays (outside the raw win, never multiplied)
    pub scatter_payout: f64,
    /// Free spin trigger or retrigger
    pub free_spins: Option<FreeSpinsAwarded>,
    pub win_tier: WinTier,
    /// Cascade stopped at the depth guard
    pub cascade_capped: bool,
    /// Is this a free spin (within a session)?
    pub is_free_spin: bool,
}

impl SpinOutcome {
    pub fn is_win(&self) -> bool {
        self.total_return() > 0.0
    }

    /// Everything credited for this spin
    pub fn total_return(&self) -> f64 {
        self.final_payout + self.scatter_payout
    }

    /// Paying cascade steps (the settle step excluded)
    pub fn cascade_depth(&self) -> usize {
        self.steps.iter().filter(|s| !s.is_settle()).count()
    }

    /// Sampled grid before any cascading
    pub fn initial_grid(&self) -> Option<&GridSnapshot> {
        self.steps.first().map(|s| &s.grid_before)
    }

    /// Grid the spin settled on
    pub fn final_grid(&self) -> Option<&GridSnapshot> {
        self.steps.last().map(|s| &s.grid_after)
    }

    pub fn win_ratio(&self) -> f64 {
        if self.bet > 0.0 {
            self.total_return() / self.bet
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_tier_classification() {
        let t = WinTierThresholds::default();
        assert_eq!(WinTier::classify(0.0, 1.0, &t), WinTier::None);
        assert_eq!(WinTier::classify(2.0, 1.0, &t), WinTier::Win);
        assert_eq!(WinTier::classify(15.0, 1.0, &t), WinTier::BigWin);
        assert_eq!(WinTier::classify(30.0, 1.0, &t), WinTier::MegaWin);
        assert_eq!(WinTier::classify(50.0, 1.0, &t), WinTier::EpicWin);
        assert_eq!(WinTier::classify(5000.0, 1.0, &t), WinTier::UltraWin);
    }

    #[test]
    fn test_request_constructors() {
        let req = SpinRequest::purchase("p1", 5.0, "standard");
        assert_eq!(req.mode, SpinMode::BonusPurchase("standard".into()));

        let json = serde_json::to_string(&SpinMode::FreeSpinConsume).unwrap();
        assert_eq!(json, "\"free_spin_consume\"");
    }

    #[test]
    fn test_spin_context() {
        let ctx = SpinContext::free_spin(7.0);
        assert!(ctx.in_session);
        assert_eq!(ctx.carried_multiplier, 7.0);
        assert!(!SpinContext::base().in_session);
    }
}
