//! Spin result payload

use cascade_core::{Grid, Position};
use serde::{Deserialize, Serialize};

use crate::bonus::{BonusTrigger, Retrigger, SessionAdvance, TierId};
use crate::cascade::CascadeMoves;
use crate::feature::FeatureOutcome;
use crate::paytable::{Cluster, ScatterResult};

/// Complete spin result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    /// Bet amount in credits
    pub bet: f64,
    /// Tier of the session this spin was played in
    pub free_spin_tier: Option<TierId>,
    /// Grid as first generated
    pub initial_grid: Grid,
    /// Settled grid after the last cascade
    pub grid: Grid,
    /// Trigger forced onto the grid by a guaranteed-trigger tier
    pub forced_trigger: Option<Position>,
    /// Winning positions of the first detection pass
    pub initial_win_positions: Vec<Position>,
    /// Golden squares after the cascade loop
    pub golden_squares: Vec<Position>,
    /// Cascade steps in order
    pub cascades: Vec<CascadeStep>,
    /// True when the cascade cap stopped the loop
    pub cascade_capped: bool,
    /// Cluster payout in bet multiples
    pub cluster_payout: f64,
    /// Feature payout in bet multiples
    pub feature_payout: f64,
    /// Total win in credits, rounded to 2 decimals
    pub win_amount: f64,
    pub scatters: ScatterResult,
    /// Feature timeline, when the feature ran
    pub feature: Option<FeatureOutcome>,
    /// Session opened by this spin
    pub bonus_triggered: Option<BonusTrigger>,
    /// Extra spins granted during a session
    pub retrigger: Option<Retrigger>,
    /// Session bookkeeping after a free spin
    pub session: Option<SessionAdvance>,
}

impl SpinResult {
    pub fn cascade_count(&self) -> usize {
        self.cascades.len()
    }

    pub fn is_free_spin(&self) -> bool {
        self.free_spin_tier.is_some()
    }

    pub fn is_win(&self) -> bool {
        self.win_amount > 0.0
    }

    /// Total win in bet multiples
    pub fn total_multiplier(&self) -> f64 {
        self.cluster_payout + self.feature_payout
    }

    pub fn win_ratio(&self) -> f64 {
        if self.bet > 0.0 {
            self.win_amount / self.bet
        } else {
            0.0
        }
    }

    /// Serialize for replay comparison and external collaborators
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// One win → remove → gravity → refill cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStep {
    pub index: u32,
    pub clusters: Vec<Cluster>,
    /// Payout of this step in bet multiples
    pub payout: f64,
    pub grid_before: Grid,
    pub grid_after: Grid,
    pub moves: CascadeMoves,
}
