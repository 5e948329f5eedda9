//! Golden-square feature
//!
//! Every position that won during a spin becomes a golden square. When the
//! settled grid also holds the trigger symbol, each golden square reveals a
//! coin, a clover or a collector:
//!
//! - clovers multiply coins and full collectors in their 8-neighbourhood
//! - collectors, in FIFO order, absorb every coin and every other full
//!   collector on the board and multiply the sum by their own value
//! - cells freed by absorption are revealed again, which can queue new
//!   collectors and apply new clovers

mod board;
mod resolver;
mod types;

pub use board::*;
pub use resolver::*;
pub use types::*;
