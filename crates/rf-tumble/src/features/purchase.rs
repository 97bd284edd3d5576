//! Bonus purchase
//!
//! Buying a session skips the scatter trigger: the tier's cost is debited
//! first and only an accepted debit creates the session.

use log::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::ledger::Ledger;

use super::session::{FeatureSession, SessionController, SessionOrigin};

impl SessionController {
    /// Buy the session of `tier_id` at `bet`
    pub fn purchase<L: Ledger + ?Sized>(
        &mut self,
        player_id: &str,
        tier_id: &str,
        bet: f64,
        ledger: &L,
    ) -> EngineResult<&FeatureSession> {
        let tier = self
            .engine
            .config()
            .bonus_tier(tier_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownBonusTier(tier_id.to_string()))?;
        if self.session.is_some() {
            warn!("Player {player_id} tried to buy '{tier_id}' during an active session");
            return Err(EngineError::SessionAlreadyActive);
        }
        if !bet.is_finite() || bet <= 0.0 {
            return Err(EngineError::spin_failed(format!("invalid bet {bet}")));
        }

        let cost = tier.cost(bet);
        ledger.debit(player_id, cost).map_err(|e| {
            warn!("Purchase of '{tier_id}' by {player_id} rejected: {e}");
            e.into_engine_error(player_id, cost)
        })?;

        info!("Player {player_id} bought '{}' for {cost:.2}", tier.id);
        self.start_session(
            tier.spins,
            bet,
            SessionOrigin::Purchase {
                tier: tier.id,
                cost,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::engine::TumbleEngine;
    use crate::ledger::{EntryKind, InMemoryLedger};

    fn controller() -> SessionController {
        SessionController::new(Arc::new(TumbleEngine::sweet_bonanza().unwrap()))
    }

    #[test]
    fn test_purchase_debits_then_creates_session() {
        let ledger = InMemoryLedger::new().with_account("p1", 1000.0);
        let mut ctl = controller();

        let session = ctl.purchase("p1", "standard", 5.0, &ledger).unwrap();
        assert_eq!(session.remaining, 10);
        assert_eq!(session.bet, 5.0);
        assert_eq!(
            session.origin,
            SessionOrigin::Purchase {
                tier: "standard".into(),
                cost: 500.0
            }
        );

        assert_eq!(ledger.balance("p1"), Some(500.0));
        let journal = ledger.journal();
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0].kind, EntryKind::Debit);
        assert_eq!(journal[0].amount, 500.0);
    }

    #[test]
    fn test_rejected_debit_creates_no_session() {
        let ledger = InMemoryLedger::new().with_account("p1", 499.0);
        let mut ctl = controller();

        let err = ctl.purchase("p1", "standard", 5.0, &ledger).unwrap_err();
        assert!(matches!(err, EngineError::LedgerRejected { amount, .. } if amount == 500.0));
        assert!(!ctl.is_active());
        assert_eq!(ledger.balance("p1"), Some(499.0));
    }

    #[test]
    fn test_unknown_tier_and_nesting() {
        let ledger = InMemoryLedger::new().with_account("p1", 10_000.0);
        let mut ctl = controller();

        assert_eq!(
            ctl.purchase("p1", "mythic", 1.0, &ledger).unwrap_err(),
            EngineError::UnknownBonusTier("mythic".into())
        );

        ctl.purchase("p1", "standard", 1.0, &ledger).unwrap();
        assert_eq!(
            ctl.purchase("p1", "super", 1.0, &ledger).unwrap_err(),
            EngineError::SessionAlreadyActive
        );
        // Only the first purchase was charged
        assert_eq!(ledger.balance("p1"), Some(9_900.0));
    }
}
