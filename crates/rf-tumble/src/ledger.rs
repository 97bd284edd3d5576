//! Ledger boundary
//!
//! The account service owns authoritative balances. The engine asks it to
//! debit a purchase cost and to settle each spin's bet and return together.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::EngineError;

/// Ledger refusals
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Unknown player: {0}")]
    UnknownPlayer(String),

    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: f64, required: f64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),
}

impl LedgerError {
    pub fn into_engine_error(self, player_id: &str, amount: f64) -> EngineError {
        EngineError::LedgerRejected {
            player_id: player_id.to_string(),
            amount,
            reason: self.to_string(),
        }
    }
}

/// Account service as seen from the engine
pub trait Ledger: Send + Sync {
    fn debit(&self, player_id: &str, amount: f64) -> Result<(), LedgerError>;

    fn credit(&self, player_id: &str, amount: f64) -> Result<(), LedgerError>;

    /// Apply `debit` and `credit` as one movement. On error neither is applied.
    fn settle(&self, player_id: &str, debit: f64, credit: f64) -> Result<(), LedgerError>;
}

/// Direction of a ledger movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Debit,
    Credit,
}

/// One applied movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub player_id: String,
    pub kind: EntryKind,
    pub amount: f64,
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<String, f64>,
    journal: Vec<LedgerEntry>,
}

/// Thread-safe in-memory ledger (tests, simulations, demos)
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: open an account with a starting balance
    pub fn with_account(self, player_id: impl Into<String>, balance: f64) -> Self {
        self.state.lock().balances.insert(player_id.into(), balance);
        self
    }

    pub fn balance(&self, player_id: &str) -> Option<f64> {
        self.state.lock().balances.get(player_id).copied()
    }

    /// Applied movements, oldest first
    pub fn journal(&self) -> Vec<LedgerEntry> {
        self.state.lock().journal.clone()
    }

    fn check_amount(amount: f64) -> Result<(), LedgerError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        Ok(())
    }
}

impl Ledger for InMemoryLedger {
    fn debit(&self, player_id: &str, amount: f64) -> Result<(), LedgerError> {
        Self::check_amount(amount)?;
        let mut state = self.state.lock();
        let balance = state
            .balances
            .get_mut(player_id)
            .ok_or_else(|| LedgerError::UnknownPlayer(player_id.to_string()))?;
        if *balance < amount {
            return Err(LedgerError::InsufficientFunds {
                balance: *balance,
                required: amount,
            });
        }
        *balance -= amount;
        state.journal.push(LedgerEntry {
            player_id: player_id.to_string(),
            kind: EntryKind::Debit,
            amount,
        });
        Ok(())
    }

    fn credit(&self, player_id: &str, amount: f64) -> Result<(), LedgerError> {
        Self::check_amount(amount)?;
        let mut state = self.state.lock();
        let balance = state
            .balances
            .get_mut(player_id)
            .ok_or_else(|| LedgerError::UnknownPlayer(player_id.to_string()))?;
        *balance += amount;
        state.journal.push(LedgerEntry {
            player_id: player_id.to_string(),
            kind: EntryKind::Credit,
            amount,
        });
        Ok(())
    }

    fn settle(&self, player_id: &str, debit: f64, credit: f64) -> Result<(), LedgerError> {
        Self::check_amount(debit)?;
        Self::check_amount(credit)?;
        let mut state = self.state.lock();
        let balance = state
            .balances
            .get_mut(player_id)
            .ok_or_else(|| LedgerError::UnknownPlayer(player_id.to_string()))?;
        if *balance < debit {
            return Err(LedgerError::InsufficientFunds {
                balance: *balance,
                required: debit,
            });
        }
        *balance += credit - debit;

        // Zero legs are not journaled
        for (kind, amount) in [(EntryKind::Debit, debit), (EntryKind::Credit, credit)] {
            if amount > 0.0 {
                state.journal.push(LedgerEntry {
                    player_id: player_id.to_string(),
                    kind,
                    amount,
                });
            }
        }
        Ok(())
    }
}
