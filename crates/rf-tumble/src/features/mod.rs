//! Free-spin sessions
//!
//! ## Architecture
//!
//! ```text
//! SessionController (one per player)
//!     │
//!     ├── play_standard ──→ scatter trigger ──→ start_session
//!     ├── purchase ───────→ ledger debit ─────→ start_session
//!     └── consume_one_spin ─→ TumbleEngine (retrigger extends the session)
//! ```
//!
//! Sessions never nest. A player's controller is owned exclusively by that
//! player's request context.

mod purchase;
mod session;

pub use session::*;
