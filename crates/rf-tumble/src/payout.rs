//! Payout calculation
//!
//! All monetary composition lives here so the trace identities
//! (`sum(step payouts) == raw_win`, `final == raw × max(1, multiplier)`)
//! are computed the same way everywhere.

use crate::cluster::{CarrierHit, ClusterResult};
use crate::error::{EngineError, EngineResult};
use crate::paytable::{tiered_amount, PayTier, Paytable};

/// Payout for one cluster.
///
/// Rejects clusters the detector should never produce instead of paying
/// them: unknown symbol, size below the entry's minimum, or a size that
/// disagrees with the cell list.
pub fn payout_for(cluster: &ClusterResult, paytable: &Paytable, bet: f64) -> EngineResult<f64> {
    let invalid = |reason: String| EngineError::InvalidCluster {
        symbol: cluster.symbol.clone(),
        size: cluster.size,
        reason,
    };

    let entry = paytable
        .get(&cluster.symbol)
        .ok_or_else(|| invalid("no paytable entry".into()))?;
    if cluster.size as usize != cluster.cells.len() {
        return Err(invalid(format!(
            "size does not match {} listed cells",
            cluster.cells.len()
        )));
    }
    if cluster.size < entry.min_cluster {
        return Err(invalid(format!("below minimum {}", entry.min_cluster)));
    }

    Ok(entry.curve.amount(cluster.size, bet))
}

/// Scatter payout for the initial grid's scatter count (0 when unconfigured)
pub fn scatter_payout(scatter_pays: &[PayTier], count: u32, bet: f64) -> f64 {
    tiered_amount(scatter_pays, count, bet)
}

/// Sum of carrier contributions
pub fn carrier_total(carriers: &[CarrierHit]) -> f64 {
    carriers.iter().map(|c| c.value).sum()
}

/// Multiplier actually applied to the raw win
pub fn applied_multiplier(accumulated: f64) -> f64 {
    accumulated.max(1.0)
}

/// Final payout: raw win × max(1, accumulated multiplier)
pub fn compose_final(raw_win: f64, accumulated: f64) -> f64 {
    raw_win * applied_multiplier(accumulated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Coord;
    use crate::paytable::PayEntry;
    use crate::symbols::SymbolId;

    fn cluster(symbol: &str, size: u32) -> ClusterResult {
        ClusterResult {
            symbol: SymbolId::new(symbol),
            cells: (0..size).map(|i| Coord::new(0, i as u8)).collect(),
            size,
        }
    }

    fn paytable() -> Paytable {
        Paytable::new().with("A", PayEntry::linear(8, 2.0, 10.0))
    }

    #[test]
    fn test_payout_for_linear() {
        let payout = payout_for(&cluster("A", 8), &paytable(), 10.0).unwrap();
        assert!((payout - 16.0).abs() < 0.001);
    }

    #[test]
    fn test_rejects_malformed_clusters() {
        let paytable = paytable();

        let err = payout_for(&cluster("A", 7), &paytable, 10.0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidCluster { size: 7, .. }));

        assert!(payout_for(&cluster("Z", 8), &paytable, 10.0).is_err());

        let mut lying = cluster("A", 8);
        lying.size = 9;
        assert!(payout_for(&lying, &paytable, 10.0).is_err());
    }

    #[test]
    fn test_scatter_payout_bands() {
        let pays = [PayTier::new(4, 3.0), PayTier::new(6, 100.0)];
        assert_eq!(scatter_payout(&pays, 3, 2.0), 0.0);
        assert_eq!(scatter_payout(&pays, 5, 2.0), 6.0);
        assert_eq!(scatter_payout(&pays, 7, 2.0), 200.0);
        assert_eq!(scatter_payout(&[], 7, 2.0), 0.0);
    }

    #[test]
    fn test_compose_final() {
        assert_eq!(compose_final(16.0, 0.0), 16.0);
        assert_eq!(compose_final(16.0, 0.5), 16.0);
        assert_eq!(compose_final(32.0, 17.0), 544.0);
        assert_eq!(compose_final(0.0, 17.0), 0.0);
    }
}
