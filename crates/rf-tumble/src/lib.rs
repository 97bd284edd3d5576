//! # rf-tumble — Cascading cluster-pays outcome engine
//!
//! Server-authoritative engine for tumble-style games: samples a symbol
//! grid, pays clusters by raw count, clears and refills them until the grid
//! settles, accumulates multiplier carriers and reports a complete,
//! replayable trace of every intermediate grid.
//!
//! ## Features
//!
//! - **Weighted Sampling**: Cumulative-weight draws from a host-supplied RNG
//! - **Cascade Engine**: Lazy detect → pay → clear → gravity → refill loop
//! - **Multiplier Carriers**: Additive accumulator applied once at settle
//! - **Free Spin Sessions**: Scatter triggers, retriggers and bonus purchase
//! - **Spin Service**: Per-player in-flight guard and audit records
//!
//! ## Architecture
//!
//! ```text
//! SpinService
//!     │
//!     └── SessionController (per player)
//!           │
//!           v
//!     TumbleEngine (Arc, immutable)
//!     │
//!     ├── SymbolCatalog (roles, pay weights, rarity)
//!     ├── Paytable (min cluster, pay curve)
//!     └── Cascade ── Grid ── SymbolSource
//!           │
//!           v
//!     SpinOutcome → Vec<CascadeStep>
//! ```

pub mod cascade;
pub mod cluster;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod grid;
pub mod ledger;
pub mod parser;
pub mod payout;
pub mod paytable;
pub mod sampler;
pub mod service;
pub mod spin;
pub mod symbols;

pub use cascade::*;
pub use cluster::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use features::*;
pub use grid::*;
pub use ledger::*;
pub use parser::*;
pub use payout::payout_for;
pub use paytable::*;
pub use sampler::*;
pub use service::*;
pub use spin::*;
pub use symbols::*;
