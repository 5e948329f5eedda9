//! cascade-core: Shared primitives for the cascade engine
//!
//! This crate provides the foundational types used by the game engine:
//! the grid and its position sets, the random source contract, and the
//! weighted table that every stochastic draw in the engine goes through.

mod error;
mod grid;
mod position;
mod rng;
mod weighted;

pub use error::*;
pub use grid::*;
pub use position::*;
pub use rng::*;
pub use weighted::*;
