//! Error types for the tumble engine

use thiserror::Error;

use crate::symbols::SymbolId;

/// Configuration errors. Fatal at load time: an engine is never built from
/// a configuration that produced one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Symbol catalog is empty")]
    EmptyCatalog,

    #[error("Symbol catalog has no standard symbol")]
    NoStandardSymbol,

    #[error("Symbol catalog has more than one scatter symbol")]
    MultipleScatters,

    #[error("Duplicate symbol id: {0}")]
    DuplicateSymbol(SymbolId),

    #[error("Rarity weights sum to zero")]
    ZeroTotalWeight,

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(SymbolId),

    #[error("Invalid pay weight for {symbol}: {value}")]
    InvalidPayWeight { symbol: SymbolId, value: f64 },

    #[error("Multiplier carrier {symbol} has value {value}, must be >= 1")]
    InvalidCarrierValue { symbol: SymbolId, value: f64 },

    #[error("Standard symbol {0} has no paytable entry")]
    MissingPaytableEntry(SymbolId),

    #[error("Paytable entry for non-standard symbol {0}")]
    NotPayable(SymbolId),

    #[error("Minimum cluster for {symbol} is {min_cluster}, below threshold {threshold}")]
    MinClusterBelowThreshold {
        symbol: SymbolId,
        min_cluster: u32,
        threshold: u32,
    },

    #[error("Minimum cluster for {symbol} is {min_cluster}, grid only has {cells} cells")]
    MinClusterExceedsGrid {
        symbol: SymbolId,
        min_cluster: u32,
        cells: usize,
    },

    #[error("Invalid pay curve for {symbol}: {reason}")]
    InvalidCurve { symbol: SymbolId, reason: String },

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid cluster threshold: {0}")]
    InvalidThreshold(u32),

    #[error("Invalid scatter pays: {0}")]
    InvalidScatterPays(String),

    #[error("Invalid free spin rules: {0}")]
    InvalidFreeSpins(String),

    #[error("Invalid bonus tier {id}: {reason}")]
    InvalidBonusTier { id: String, reason: String },

    #[error("Invalid win tier thresholds: {0}")]
    InvalidWinTiers(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Runtime errors surfaced by the engine, the session controller and the
/// spin service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The calculator received a cluster that the detector should never emit
    #[error("Invalid cluster of {symbol} ({size} cells): {reason}")]
    InvalidCluster {
        symbol: SymbolId,
        size: u32,
        reason: String,
    },

    #[error("A free spin session is already active")]
    SessionAlreadyActive,

    #[error("No active free spin session")]
    NoActiveSession,

    #[error("Invalid session length: {0} spins")]
    InvalidSessionLength(u32),

    /// Free spins play at the bet the session was opened with
    #[error("Bet mismatch: session plays at {expected}, request bet {requested}")]
    BetMismatch { expected: f64, requested: f64 },

    #[error("Unknown bonus tier: {0}")]
    UnknownBonusTier(String),

    #[error("Ledger rejected {amount} for player {player_id}: {reason}")]
    LedgerRejected {
        player_id: String,
        amount: f64,
        reason: String,
    },

    #[error("A spin is already in progress for player {0}")]
    SpinInProgress(String),

    /// The spin did not resolve; the bet must be treated as unresolved
    #[error("Spin failed: {reason}")]
    SpinFailed { reason: String },
}

impl EngineError {
    pub fn spin_failed(reason: impl Into<String>) -> Self {
        Self::SpinFailed {
            reason: reason.into(),
        }
    }

    /// Collapse any error raised inside a cascade into a single `SpinFailed`.
    pub fn into_spin_failed(self) -> Self {
        match self {
            Self::SpinFailed { .. } => self,
            other => Self::SpinFailed {
                reason: other.to_string(),
            },
        }
    }

    /// Whether the bet behind the failing request is left unresolved
    pub fn is_spin_failure(&self) -> bool {
        matches!(self, Self::SpinFailed { .. })
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_spin_failed_wraps_once() {
        let err = EngineError::InvalidCluster {
            symbol: SymbolId::new("A"),
            size: 3,
            reason: "below minimum 8".into(),
        };
        let failed = err.into_spin_failed();
        assert!(failed.is_spin_failure());
        assert!(failed.to_string().contains("Invalid cluster of A"));

        let again = failed.clone().into_spin_failed();
        assert_eq!(again, failed);
    }

    #[test]
    fn test_config_error_converts() {
        let err: EngineError = ConfigError::EmptyCatalog.into();
        assert!(matches!(err, EngineError::Configuration(ConfigError::EmptyCatalog)));
    }
}
