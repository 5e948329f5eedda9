//! Session statistics and RTP simulation

use cascade_core::SeededRandom;
use serde::{Deserialize, Serialize};

use crate::engine::CascadeGame;
use crate::error::SpinError;
use crate::spin::SpinResult;

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub base_spins: u64,
    pub free_spins: u64,
    /// Credits charged (free spins cost nothing)
    pub total_bet: f64,
    pub total_win: f64,
    pub wins: u64,
    pub losses: u64,
    /// Spins with at least one cascade
    pub cascade_chains: u64,
    pub total_cascades: u64,
    pub feature_rounds: u64,
    /// Credits won by the feature
    pub feature_win: f64,
    pub bonuses_triggered: u64,
    pub bonuses_completed: u64,
    pub retriggers: u64,
    pub max_win_ratio: f64,
}

impl SessionStats {
    /// Record one spin that cost `charged` credits
    pub fn record(&mut self, result: &SpinResult, charged: f64) {
        self.total_spins += 1;
        if result.is_free_spin() {
            self.free_spins += 1;
        } else {
            self.base_spins += 1;
        }

        self.total_bet += charged;
        self.total_win += result.win_amount;
        if result.is_win() {
            self.wins += 1;
        } else {
            self.losses += 1;
        }

        if !result.cascades.is_empty() {
            self.cascade_chains += 1;
        }
        self.total_cascades += result.cascades.len() as u64;

        if let Some(feature) = &result.feature {
            self.feature_rounds += feature.rounds.len() as u64;
            self.feature_win += feature.total * result.bet;
        }

        self.bonuses_triggered += u64::from(result.bonus_triggered.is_some());
        self.retriggers += u64::from(result.retrigger.is_some());
        self.bonuses_completed += u64::from(result.session.as_ref().is_some_and(|s| s.ended));
        self.max_win_ratio = self.max_win_ratio.max(result.win_ratio());
    }

    /// Calculate RTP
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0.0 {
            (self.total_win / self.total_bet) * 100.0
        } else {
            0.0
        }
    }

    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.wins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Fold another run's counters into this one
    pub fn merge(&mut self, other: &SessionStats) {
        self.total_spins += other.total_spins;
        self.base_spins += other.base_spins;
        self.free_spins += other.free_spins;
        self.total_bet += other.total_bet;
        self.total_win += other.total_win;
        self.wins += other.wins;
        self.losses += other.losses;
        self.cascade_chains += other.cascade_chains;
        self.total_cascades += other.total_cascades;
        self.feature_rounds += other.feature_rounds;
        self.feature_win += other.feature_win;
        self.bonuses_triggered += other.bonuses_triggered;
        self.bonuses_completed += other.bonuses_completed;
        self.retriggers += other.retriggers;
        self.max_win_ratio = self.max_win_ratio.max(other.max_win_ratio);
    }
}

/// Outcome of a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Seeds that produced this report
    pub seeds: Vec<u64>,
    pub stats: SessionStats,
    /// Configured target (0.0 - 1.0)
    pub target_rtp: f64,
}

impl SimulationReport {
    /// Measured RTP as a fraction
    pub fn measured_rtp(&self) -> f64 {
        self.stats.rtp() / 100.0
    }

    /// Measured minus target
    pub fn deviation(&self) -> f64 {
        self.measured_rtp() - self.target_rtp
    }

    pub fn within(&self, tolerance: f64) -> bool {
        self.deviation().abs() <= tolerance
    }

    /// Combine reports from independent runs
    pub fn merge(reports: impl IntoIterator<Item = SimulationReport>) -> Option<SimulationReport> {
        reports.into_iter().reduce(|mut acc, report| {
            acc.seeds.extend(report.seeds);
            acc.stats.merge(&report.stats);
            acc
        })
    }
}

/// Play `rounds` paid spins from `seed`, finishing every bonus session they open
///
/// Base spins are charged `bet`; free spins are played at the same bet
/// without charge.
pub fn simulate(
    game: &CascadeGame,
    seed: u64,
    rounds: u64,
    bet: f64,
) -> Result<SimulationReport, SpinError> {
    let mut rng = SeededRandom::new(seed);
    let mut state = game.new_state();
    let mut stats = SessionStats::default();

    for _ in 0..rounds {
        let result = game.spin(&mut state, &mut rng, bet)?;
        stats.record(&result, bet);

        while state.in_bonus() {
            let free = game.spin(&mut state, &mut rng, bet)?;
            stats.record(&free, 0.0);
        }
    }

    log::debug!(
        "Seed {seed}: {} spins, RTP {:.2}%, hit rate {:.2}%",
        stats.total_spins,
        stats.rtp(),
        stats.hit_rate()
    );

    Ok(SimulationReport {
        seeds: vec![seed],
        stats,
        target_rtp: game.config().target_rtp,
    })
}
