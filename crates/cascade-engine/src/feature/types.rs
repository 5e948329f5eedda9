//! Feature event records

use cascade_core::Position;
use serde::{Deserialize, Serialize};

/// What a golden square turned into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RevealOutcome {
    /// Coin worth `value` bet multiples
    Coin { value: f64 },
    /// Clover multiplying its neighbours
    Clover { multiplier: f64 },
    /// Empty collector waiting to activate
    Collector,
}

impl RevealOutcome {
    pub fn is_collector(&self) -> bool {
        matches!(self, Self::Collector)
    }
}

/// Outcome class drawn before its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealKind {
    Coin,
    Clover,
    Collector,
}

/// A single reveal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reveal {
    pub position: Position,
    pub outcome: RevealOutcome,
}

/// A clover boosting one target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CloverApplication {
    pub clover: Position,
    pub target: Position,
    pub multiplier: f64,
    pub before: f64,
    pub after: f64,
}

/// A value taken off the board by a collector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Absorbed {
    pub position: Position,
    pub value: f64,
    /// True when the source was a full collector rather than a coin
    pub from_collector: bool,
}

/// One collector activation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionStep {
    pub collector: Position,
    pub absorbed: Vec<Absorbed>,
    /// Sum of absorbed values
    pub absorbed_total: f64,
    /// Collector's own multiplier
    pub multiplier: f64,
    /// Value the collector holds afterwards
    pub value: f64,
    /// Freed cells revealed again
    pub re_reveals: Vec<Reveal>,
    /// Boosts from clovers among the re-reveals
    pub clover_applications: Vec<CloverApplication>,
}

/// One reveal/collection round; never mutated once appended to a timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRound {
    pub index: u32,
    pub reveals: Vec<Reveal>,
    pub clover_applications: Vec<CloverApplication>,
    pub collections: Vec<CollectionStep>,
    /// Collected value before the cap
    pub collected: f64,
    /// Collected value after the cap, in bet multiples
    pub total: f64,
    pub capped: bool,
}

impl FeatureRound {
    pub fn activations(&self) -> usize {
        self.collections.len()
    }
}

/// Every round run for one activation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureOutcome {
    pub rounds: Vec<FeatureRound>,
    /// Sum of round totals, in bet multiples
    pub total: f64,
}
