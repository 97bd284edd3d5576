//! Feature session state and controller

use std::sync::Arc;

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::MultiplierCarryOver;
use crate::engine::TumbleEngine;
use crate::error::{EngineError, EngineResult};
use crate::grid::Grid;
use crate::sampler::{SymbolSource, WeightedSampler};
use crate::spin::{FreeSpinsAwarded, SpinContext, SpinOutcome};

// ═══════════════════════════════════════════════════════════════════════════════
// SESSION STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// How a session came to be
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionOrigin {
    ScatterTrigger { scatters: u32 },
    Purchase { tier: String, cost: f64 },
}

/// One player's bonus run (serializable so the host can persist it)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSession {
    pub origin: SessionOrigin,
    /// Bet every spin of the session plays at
    pub bet: f64,
    /// Spins granted, including retriggers
    pub total_spins: u32,
    /// Spins left to play
    pub remaining: u32,
    pub spins_played: u32,
    /// Sum of spin returns so far
    pub cumulative_payout: f64,
    pub carry_over: MultiplierCarryOver,
    /// Accumulator after the last spin (seeds the next one when cumulative)
    pub multiplier: f64,
    pub peak_multiplier: f64,
    pub retriggers: u32,
}

impl FeatureSession {
    pub fn new(
        spins: u32,
        bet: f64,
        origin: SessionOrigin,
        carry_over: MultiplierCarryOver,
    ) -> Self {
        Self {
            origin,
            bet,
            total_spins: spins,
            remaining: spins,
            spins_played: 0,
            cumulative_payout: 0.0,
            carry_over,
            multiplier: 0.0,
            peak_multiplier: 0.0,
            retriggers: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    /// Accumulator the next spin starts from
    pub fn carried_multiplier(&self) -> f64 {
        match self.carry_over {
            MultiplierCarryOver::FreshPerSpin => 0.0,
            MultiplierCarryOver::Cumulative => self.multiplier,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            origin: self.origin.clone(),
            spins_played: self.spins_played,
            total_payout: self.cumulative_payout,
            peak_multiplier: self.peak_multiplier,
            retriggers: self.retriggers,
        }
    }

    fn record(&mut self, outcome: &SpinOutcome) {
        self.remaining = self.remaining.saturating_sub(1);
        self.spins_played += 1;
        self.cumulative_payout += outcome.total_return();
        self.multiplier = outcome.multiplier_accumulated;
        self.peak_multiplier = self.peak_multiplier.max(outcome.multiplier_accumulated);

        if let Some(award) = outcome.free_spins.as_ref().filter(|a| a.retrigger) {
            self.extend(award.spins);
        }
    }

    fn extend(&mut self, spins: u32) {
        self.remaining += spins;
        self.total_spins += spins;
        self.retriggers += 1;
    }
}

/// Report of a session (running or finished)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub origin: SessionOrigin,
    pub spins_played: u32,
    pub total_payout: f64,
    pub peak_multiplier: f64,
    pub retriggers: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTROLLER
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-player session controller
#[derive(Debug, Clone)]
pub struct SessionController {
    pub(super) engine: Arc<TumbleEngine>,
    pub(super) session: Option<FeatureSession>,
    last_summary: Option<SessionSummary>,
}

impl SessionController {
    pub fn new(engine: Arc<TumbleEngine>) -> Self {
        Self {
            engine,
            session: None,
            last_summary: None,
        }
    }

    pub fn engine(&self) -> &Arc<TumbleEngine> {
        &self.engine
    }

    /// Active session, if any
    pub fn session(&self) -> Option<&FeatureSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// True when no spins are left (or no session exists)
    pub fn is_complete(&self) -> bool {
        self.session.as_ref().is_none_or(FeatureSession::is_complete)
    }

    /// Open a session of `trigger_spins` spins played at `bet`
    pub fn start_session(
        &mut self,
        trigger_spins: u32,
        bet: f64,
        origin: SessionOrigin,
    ) -> EngineResult<&FeatureSession> {
        if self.session.is_some() {
            return Err(EngineError::SessionAlreadyActive);
        }
        if trigger_spins == 0 {
            return Err(EngineError::InvalidSessionLength(trigger_spins));
        }
        let carry_over = self.engine.config().free_spins.carry_over;
        info!("Free spin session started: {trigger_spins} spins at bet {bet} ({origin:?})");
        Ok(&*self
            .session
            .insert(FeatureSession::new(trigger_spins, bet, origin, carry_over)))
    }

    /// Turn a spin's scatter award into a new session or an extension.
    /// `bet` is the triggering spin's bet; a retrigger keeps the session's.
    pub fn apply_trigger(&mut self, award: &FreeSpinsAwarded, bet: f64) -> EngineResult<()> {
        if award.retrigger {
            let session = self.session.as_mut().ok_or(EngineError::NoActiveSession)?;
            session.extend(award.spins);
            info!("Free spins retriggered: +{} ({} remaining)", award.spins, session.remaining);
            return Ok(());
        }
        self.start_session(
            award.spins,
            bet,
            SessionOrigin::ScatterTrigger {
                scatters: award.count,
            },
        )?;
        Ok(())
    }

    /// Paid base-game spin; a scatter trigger opens a session
    pub fn play_standard<R: Rng>(&mut self, bet: f64, rng: &mut R) -> EngineResult<SpinOutcome> {
        self.play_standard_with(bet, WeightedSampler::new(rng))
    }

    pub fn play_standard_with<S: SymbolSource>(
        &mut self,
        bet: f64,
        source: S,
    ) -> EngineResult<SpinOutcome> {
        if self.session.is_some() {
            return Err(EngineError::SessionAlreadyActive);
        }
        let grid = Grid::empty(self.engine.config().grid);
        let outcome = self.engine.resolve(bet, grid, source, SpinContext::base())?;
        if let Some(award) = &outcome.free_spins {
            self.apply_trigger(award, bet)?;
        }
        Ok(outcome)
    }

    /// Play one spin of the active session
    pub fn consume_one_spin<R: Rng>(&mut self, bet: f64, rng: &mut R) -> EngineResult<SpinOutcome> {
        self.consume_one_spin_with(bet, WeightedSampler::new(rng))
    }

    /// Play one spin of the active session from an explicit symbol source.
    /// `bet` must equal the session's bet. A failed spin leaves the session
    /// untouched.
    pub fn consume_one_spin_with<S: SymbolSource>(
        &mut self,
        bet: f64,
        source: S,
    ) -> EngineResult<SpinOutcome> {
        let carried = match &self.session {
            Some(session) if !session.is_complete() => {
                if bet != session.bet {
                    return Err(EngineError::BetMismatch {
                        expected: session.bet,
                        requested: bet,
                    });
                }
                session.carried_multiplier()
            }
            _ => return Err(EngineError::NoActiveSession),
        };

        let grid = Grid::empty(self.engine.config().grid);
        let outcome = self
            .engine
            .resolve(bet, grid, source, SpinContext::free_spin(carried))?;

        if let Some(session) = self.session.as_mut() {
            session.record(&outcome);
            debug!(
                "Free spin {}: returned {:.2}, {} remaining",
                session.spins_played,
                outcome.total_return(),
                session.remaining
            );
            if session.is_complete() {
                self.finish();
            }
        }
        Ok(outcome)
    }

    /// Serializable copy of the active session
    pub fn snapshot(&self) -> Option<FeatureSession> {
        self.session.clone()
    }

    /// Reinstate a persisted session
    pub fn restore(&mut self, session: FeatureSession) -> EngineResult<()> {
        if self.session.is_some() {
            return Err(EngineError::SessionAlreadyActive);
        }
        if !session.is_complete() {
            self.session = Some(session);
        }
        Ok(())
    }

    /// Summary of the active session, or of the last finished one
    pub fn summary(&self) -> Option<SessionSummary> {
        self.session
            .as_ref()
            .map(FeatureSession::summary)
            .or_else(|| self.last_summary.clone())
    }

    /// Take the summary of the last finished session
    pub fn take_finished(&mut self) -> Option<SessionSummary> {
        self.last_summary.take()
    }

    fn finish(&mut self) {
        if let Some(session) = self.session.take() {
            let summary = session.summary();
            info!(
                "Free spin session complete: {} spins, paid {:.2}, peak multiplier {:.1}",
                summary.spins_played, summary.total_payout, summary.peak_multiplier
            );
            self.last_summary = Some(summary);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn controller(carry_over: MultiplierCarryOver) -> SessionController {
        let mut config = EngineConfig::sweet_bonanza();
        config.free_spins.carry_over = carry_over;
        config.free_spins.retrigger_count = 99;
        SessionController::new(Arc::new(TumbleEngine::new(config).unwrap()))
    }

    #[test]
    fn test_sessions_do_not_nest() {
        let mut ctl = controller(MultiplierCarryOver::FreshPerSpin);
        ctl.start_session(10, 1.0, SessionOrigin::ScatterTrigger { scatters: 4 })
            .unwrap();
        let err = ctl
            .start_session(10, 1.0, SessionOrigin::ScatterTrigger { scatters: 5 })
            .unwrap_err();
        assert_eq!(err, EngineError::SessionAlreadyActive);

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(
            ctl.play_standard(1.0, &mut rng).unwrap_err(),
            EngineError::SessionAlreadyActive
        );
    }

    #[test]
    fn test_consume_without_session() {
        let mut ctl = controller(MultiplierCarryOver::FreshPerSpin);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(ctl.is_complete());
        assert_eq!(
            ctl.consume_one_spin(1.0, &mut rng).unwrap_err(),
            EngineError::NoActiveSession
        );
    }

    #[test]
    fn test_session_runs_to_completion() {
        let mut ctl = controller(MultiplierCarryOver::FreshPerSpin);
        ctl.start_session(3, 1.0, SessionOrigin::ScatterTrigger { scatters: 4 })
            .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let mut paid = 0.0;
        for expected_remaining in [2, 1] {
            paid += ctl.consume_one_spin(1.0, &mut rng).unwrap().total_return();
            assert_eq!(ctl.session().unwrap().remaining, expected_remaining);
        }
        let last = ctl.consume_one_spin(1.0, &mut rng).unwrap();
        paid += last.total_return();
        assert!(last.is_free_spin);

        assert!(ctl.is_complete());
        assert!(ctl.session().is_none());
        let summary = ctl.summary().unwrap();
        assert_eq!(summary.spins_played, 3);
        assert!((summary.total_payout - paid).abs() < 1e-9);
    }

    #[test]
    fn test_failed_spin_leaves_session_untouched() {
        let mut ctl = controller(MultiplierCarryOver::FreshPerSpin);
        ctl.start_session(2, 1.0, SessionOrigin::ScatterTrigger { scatters: 4 })
            .unwrap();
        let before = ctl.snapshot();

        let err = ctl
            .consume_one_spin_with(1.0, crate::sampler::ScriptedSource::default())
            .unwrap_err();
        assert!(err.is_spin_failure());
        assert_eq!(ctl.snapshot(), before);
    }

    #[test]
    fn test_empty_session_rejected() {
        let mut ctl = controller(MultiplierCarryOver::FreshPerSpin);
        let err = ctl
            .start_session(0, 1.0, SessionOrigin::ScatterTrigger { scatters: 4 })
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidSessionLength(0));
        assert!(!err.is_spin_failure());
        assert!(!ctl.is_active());
    }

    #[test]
    fn test_free_spins_keep_session_bet() {
        let mut ctl = controller(MultiplierCarryOver::FreshPerSpin);
        ctl.start_session(2, 0.5, SessionOrigin::ScatterTrigger { scatters: 4 })
            .unwrap();
        let before = ctl.snapshot();
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let err = ctl.consume_one_spin(1000.0, &mut rng).unwrap_err();
        assert_eq!(
            err,
            EngineError::BetMismatch {
                expected: 0.5,
                requested: 1000.0
            }
        );
        assert_eq!(ctl.snapshot(), before);

        let outcome = ctl.consume_one_spin(0.5, &mut rng).unwrap();
        assert_eq!(outcome.bet, 0.5);
        assert_eq!(ctl.session().unwrap().remaining, 1);
    }

    #[test]
    fn test_retrigger_extends_session() {
        let mut ctl = controller(MultiplierCarryOver::FreshPerSpin);
        ctl.start_session(2, 1.0, SessionOrigin::ScatterTrigger { scatters: 4 })
            .unwrap();
        let award = FreeSpinsAwarded {
            symbol: "SCATTER".into(),
            count: 3,
            spins: 5,
            retrigger: true,
        };
        ctl.apply_trigger(&award, 1.0).unwrap();

        let session = ctl.session().unwrap();
        assert_eq!(session.remaining, 7);
        assert_eq!(session.total_spins, 7);
        assert_eq!(session.retriggers, 1);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut ctl = controller(MultiplierCarryOver::Cumulative);
        ctl.start_session(5, 2.0, SessionOrigin::Purchase {
            tier: "standard".into(),
            cost: 100.0,
        })
        .unwrap();
        let json = serde_json::to_string(&ctl.snapshot().unwrap()).unwrap();

        let mut other = controller(MultiplierCarryOver::Cumulative);
        other.restore(serde_json::from_str(&json).unwrap()).unwrap();
        assert_eq!(other.snapshot(), ctl.snapshot());
        assert!(other.restore(ctl.snapshot().unwrap()).is_err());
    }

    #[test]
    fn test_carry_over_policy() {
        let mut session = FeatureSession::new(
            3,
            1.0,
            SessionOrigin::ScatterTrigger { scatters: 4 },
            MultiplierCarryOver::Cumulative,
        );
        session.multiplier = 12.0;
        assert_eq!(session.carried_multiplier(), 12.0);

        session.carry_over = MultiplierCarryOver::FreshPerSpin;
        assert_eq!(session.carried_multiplier(), 0.0);
    }
}
