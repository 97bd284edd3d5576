//! Spin service — trusted host-side façade
//!
//! Resolves spin requests for many players concurrently against one shared
//! engine. Each player has at most one request in flight; the player's
//! session is checked out of the map, advanced outside the lock and written
//! back only when the whole request succeeded. A spin's bet and return reach
//! the ledger as one settlement, so a refused settlement changes nothing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::TumbleEngine;
use crate::error::{EngineError, EngineResult};
use crate::features::{FeatureSession, SessionController, SessionSummary};
use crate::ledger::Ledger;
use crate::spin::{SpinMode, SpinOutcome, SpinRequest};

/// Audit envelope for one handled request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinRecord {
    /// Unique identifier (UUID v4)
    pub spin_id: String,
    pub player_id: String,
    pub mode: SpinMode,
    pub bet: f64,
    /// When the request was resolved
    pub recorded_at: DateTime<Utc>,
    /// Amount debited for this request
    pub debit: f64,
    /// Amount credited for this request
    pub credit: f64,
    /// Spin result (None for a bonus purchase)
    #[serde(default)]
    pub outcome: Option<SpinOutcome>,
    /// Player's session after the request
    #[serde(default)]
    pub session: Option<FeatureSession>,
    /// Set when this request finished the player's session
    #[serde(default)]
    pub session_summary: Option<SessionSummary>,
}

#[derive(Debug, Default)]
struct PlayerSlot {
    in_flight: bool,
    session: Option<FeatureSession>,
}

/// Releases a player's in-flight flag on every exit path
pub(crate) struct InFlightGuard<'s> {
    players: &'s Mutex<HashMap<String, PlayerSlot>>,
    player_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(slot) = self.players.lock().get_mut(&self.player_id) {
            slot.in_flight = false;
        }
    }
}

/// Concurrent spin service over a shared engine
pub struct SpinService {
    engine: Arc<TumbleEngine>,
    players: Mutex<HashMap<String, PlayerSlot>>,
}

impl SpinService {
    pub fn new(engine: Arc<TumbleEngine>) -> Self {
        Self {
            engine,
            players: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &Arc<TumbleEngine> {
        &self.engine
    }

    /// Player's active session, if any
    pub fn session(&self, player_id: &str) -> Option<FeatureSession> {
        self.players
            .lock()
            .get(player_id)
            .and_then(|slot| slot.session.clone())
    }

    /// Handle a request with a fresh OS-seeded generator
    pub fn handle<L: Ledger + ?Sized>(
        &self,
        request: &SpinRequest,
        ledger: &L,
    ) -> EngineResult<SpinRecord> {
        let mut rng = ChaCha20Rng::from_os_rng();
        self.handle_with_rng(request, ledger, &mut rng)
    }

    /// Handle a request drawing from a host-supplied generator
    pub fn handle_with_rng<L: Ledger + ?Sized, R: Rng>(
        &self,
        request: &SpinRequest,
        ledger: &L,
        rng: &mut R,
    ) -> EngineResult<SpinRecord> {
        let (guard, session) = self.acquire(&request.player_id)?;

        let mut controller = SessionController::new(Arc::clone(&self.engine));
        if let Some(session) = session {
            controller.restore(session)?;
        }

        let player_id = request.player_id.as_str();
        let (debit, outcome) = match &request.mode {
            SpinMode::Standard => {
                let outcome = controller.play_standard(request.bet, rng)?;
                (request.bet, Some(outcome))
            }
            SpinMode::FreeSpinConsume => {
                let outcome = controller.consume_one_spin(request.bet, rng)?;
                (0.0, Some(outcome))
            }
            SpinMode::BonusPurchase(tier) => {
                controller.purchase(player_id, tier, request.bet, ledger)?;
                let cost = self
                    .engine
                    .config()
                    .bonus_tier(tier)
                    .map_or(0.0, |t| t.cost(request.bet));
                (cost, None)
            }
        };

        let credit = outcome.as_ref().map(SpinOutcome::total_return).unwrap_or(0.0);
        // Purchases are charged by the controller
        if outcome.is_some() && (debit > 0.0 || credit > 0.0) {
            ledger.settle(player_id, debit, credit).map_err(|e| {
                warn!("Settlement for {player_id} rejected (debit {debit}, credit {credit}): {e}");
                e.into_engine_error(player_id, credit - debit)
            })?;
        }

        let session = controller.snapshot();
        if let Some(slot) = self.players.lock().get_mut(player_id) {
            slot.session = session.clone();
        }
        drop(guard);

        debug!(
            "Player {player_id} {:?}: debit {debit:.2}, credit {credit:.2}",
            request.mode
        );

        Ok(SpinRecord {
            spin_id: Uuid::new_v4().to_string(),
            player_id: request.player_id.clone(),
            mode: request.mode.clone(),
            bet: request.bet,
            recorded_at: Utc::now(),
            debit,
            credit,
            outcome,
            session,
            session_summary: controller.take_finished(),
        })
    }

    /// Mark `player_id` as in flight, checking out the stored session
    pub(crate) fn acquire(
        &self,
        player_id: &str,
    ) -> EngineResult<(InFlightGuard<'_>, Option<FeatureSession>)> {
        let mut players = self.players.lock();
        let slot = players.entry(player_id.to_string()).or_default();
        if slot.in_flight {
            warn!("Rejected concurrent request for player {player_id}");
            return Err(EngineError::SpinInProgress(player_id.to_string()));
        }
        slot.in_flight = true;
        let session = slot.session.clone();
        Ok((
            InFlightGuard {
                players: &self.players,
                player_id: player_id.to_string(),
            },
            session,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{InMemoryLedger, LedgerError};
    use rand_chacha::ChaCha8Rng;

    fn service() -> SpinService {
        SpinService::new(Arc::new(TumbleEngine::sweet_bonanza().unwrap()))
    }

    /// Account service that refuses to pay anything out
    struct NoPayouts(InMemoryLedger);

    impl Ledger for NoPayouts {
        fn debit(&self, player_id: &str, amount: f64) -> Result<(), LedgerError> {
            self.0.debit(player_id, amount)
        }

        fn credit(&self, _player_id: &str, amount: f64) -> Result<(), LedgerError> {
            Err(LedgerError::InvalidAmount(amount))
        }

        fn settle(&self, player_id: &str, debit: f64, credit: f64) -> Result<(), LedgerError> {
            if credit > 0.0 {
                return Err(LedgerError::InvalidAmount(credit));
            }
            self.0.settle(player_id, debit, credit)
        }
    }

    #[test]
    fn test_one_request_in_flight_per_player() {
        let service = service();
        let ledger = InMemoryLedger::new().with_account("p1", 100.0);

        let held = service.acquire("p1").unwrap();
        let err = service
            .handle(&SpinRequest::standard("p1", 1.0), &ledger)
            .unwrap_err();
        assert_eq!(err, EngineError::SpinInProgress("p1".into()));

        // Other players are unaffected
        assert!(service.acquire("p2").is_ok());

        drop(held);
        assert!(service.handle(&SpinRequest::standard("p1", 1.0), &ledger).is_ok());
    }

    #[test]
    fn test_failed_request_releases_slot() {
        let service = service();
        let ledger = InMemoryLedger::new().with_account("p1", 100.0);

        let err = service
            .handle(&SpinRequest::free_spin("p1", 1.0), &ledger)
            .unwrap_err();
        assert_eq!(err, EngineError::NoActiveSession);
        assert!(service.acquire("p1").is_ok());
    }

    #[test]
    fn test_standard_spin_settles_ledger() {
        let service = service();
        let ledger = InMemoryLedger::new().with_account("p1", 100.0);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let record = service
            .handle_with_rng(&SpinRequest::standard("p1", 2.0), &ledger, &mut rng)
            .unwrap();
        let outcome = record.outcome.as_ref().unwrap();
        assert_eq!(record.debit, 2.0);
        assert!((record.credit - outcome.total_return()).abs() < 1e-9);
        assert!((ledger.balance("p1").unwrap() - (98.0 + record.credit)).abs() < 1e-9);
        assert!(Uuid::parse_str(&record.spin_id).is_ok());
    }

    #[test]
    fn test_rejected_standard_debit_changes_nothing() {
        let service = service();
        let ledger = InMemoryLedger::new().with_account("p1", 0.5);

        let err = service
            .handle(&SpinRequest::standard("p1", 1.0), &ledger)
            .unwrap_err();
        assert!(matches!(err, EngineError::LedgerRejected { .. }));
        assert!(service.session("p1").is_none());
        assert!(ledger.journal().is_empty());
    }

    #[test]
    fn test_purchase_then_consume() {
        let service = service();
        let ledger = InMemoryLedger::new().with_account("p1", 1000.0);
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        let record = service
            .handle(&SpinRequest::purchase("p1", 5.0, "standard"), &ledger)
            .unwrap();
        assert_eq!(record.debit, 500.0);
        assert!(record.outcome.is_none());
        assert_eq!(record.session.as_ref().map(|s| s.remaining), Some(10));

        let record = service
            .handle_with_rng(&SpinRequest::free_spin("p1", 5.0), &ledger, &mut rng)
            .unwrap();
        assert_eq!(record.debit, 0.0);
        assert!(record.outcome.unwrap().is_free_spin);
        let stored = service.session("p1").unwrap();
        assert!(stored.spins_played == 1 && stored.remaining >= 9);
    }

    #[test]
    fn test_refused_settlement_changes_nothing() {
        let service = service();
        let players: Vec<String> = (0..200).map(|i| format!("p{i}")).collect();
        let ledger = NoPayouts(
            players
                .iter()
                .fold(InMemoryLedger::new(), |l, p| l.with_account(p.as_str(), 100.0)),
        );

        let mut refused = 0;
        for (seed, player) in players.iter().enumerate() {
            let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
            let request = SpinRequest::standard(player.as_str(), 1.0);
            match service.handle_with_rng(&request, &ledger, &mut rng) {
                Ok(record) => {
                    assert_eq!(record.credit, 0.0);
                    assert_eq!(ledger.0.balance(player), Some(99.0));
                }
                Err(err) => {
                    assert!(matches!(err, EngineError::LedgerRejected { .. }));
                    assert_eq!(ledger.0.balance(player), Some(100.0));
                    assert!(service.session(player).is_none());
                    assert!(service.acquire(player).is_ok());
                    refused += 1;
                }
            }
        }
        assert!(refused > 0);
        assert!(ledger.0.journal().iter().all(|e| e.amount == 1.0));
    }

    #[test]
    fn test_free_spins_play_at_purchase_bet() {
        let service = service();
        let ledger = InMemoryLedger::new().with_account("p1", 10.0);
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        let record = service
            .handle(&SpinRequest::purchase("p1", 0.01, "standard"), &ledger)
            .unwrap();
        assert!((record.debit - 1.0).abs() < 1e-9);
        let session = service.session("p1").unwrap();
        assert_eq!(session.bet, 0.01);

        let err = service
            .handle_with_rng(&SpinRequest::free_spin("p1", 1000.0), &ledger, &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::BetMismatch {
                expected: 0.01,
                requested: 1000.0
            }
        );
        assert_eq!(service.session("p1"), Some(session));
        assert_eq!(ledger.journal().len(), 1);

        let record = service
            .handle_with_rng(&SpinRequest::free_spin("p1", 0.01), &ledger, &mut rng)
            .unwrap();
        assert_eq!(record.outcome.unwrap().bet, 0.01);
    }
}
