//! # cascade-engine: cluster-pays cascade slot engine
//!
//! Resolves one play round on a match-and-cascade grid: winning clusters are
//! paid, removed and refilled until the grid settles, then the golden-square
//! feature reveals coins, clovers and collectors over every position that won
//! during the spin. Scatters open and extend free-spin bonus sessions.
//!
//! ## Architecture
//!
//! ```text
//! CascadeGame (immutable GameConfig)
//!     │
//!     ├── PayTable (cluster detector, scatter count)
//!     ├── SymbolGenerator (weighted fill, trigger singleton rule)
//!     ├── FeatureResolver (reveal / clover / collector chain)
//!     └── BonusConfig (tiers, retriggers, upgrades)
//!           │
//!           v
//!     spin(&mut EngineState, &mut impl RandomSource, bet) → SpinResult
//! ```
//!
//! All state that survives between spins lives in [`EngineState`], which the
//! caller owns.

pub mod bonus;
pub mod cascade;
pub mod config;
pub mod engine;
pub mod error;
pub mod feature;
pub mod ledger;
pub mod paytable;
pub mod sim;
pub mod spin;
pub mod symbols;

pub use bonus::*;
pub use cascade::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use feature::*;
pub use ledger::*;
pub use paytable::*;
pub use sim::*;
pub use spin::*;
pub use symbols::*;
