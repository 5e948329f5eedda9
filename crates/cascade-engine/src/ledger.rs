//! Credit ledger collaborator contract
//!
//! The engine never talks to the ledger itself; callers report a finished
//! spin through a [`CreditLedger`] after the result is computed, and the
//! result does not depend on the ledger's response.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spin::SpinResult;

/// Win report sent after a spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinReport {
    pub bet_amount: f64,
    pub win_amount: f64,
    pub game_id: String,
    /// Session tier name for free spins, `None` in the base game
    pub bonus_type: Option<String>,
}

impl WinReport {
    /// Build a report from a spin; `bonus_type` names the session tier
    pub fn from_spin(
        result: &SpinResult,
        game_id: impl Into<String>,
        bonus_type: Option<String>,
    ) -> Self {
        Self {
            bet_amount: if result.is_free_spin() { 0.0 } else { result.bet },
            win_amount: result.win_amount,
            game_id: game_id.into(),
            bonus_type,
        }
    }
}

/// Ledger acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerReceipt {
    pub remaining_credits: f64,
}

/// Player balance as the ledger sees it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub remaining_credits: f64,
    pub daily_budget: f64,
}

/// Ledger failures; none of them affect game state
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    #[error("Insufficient credits: need {needed}, have {available}")]
    InsufficientCredits { needed: f64, available: f64 },
}

/// External player-credit ledger
pub trait CreditLedger {
    fn report_win(&mut self, report: &WinReport) -> Result<LedgerReceipt, LedgerError>;

    fn player_state(&self) -> Result<PlayerState, LedgerError>;
}

/// Ledger kept in memory (simulation and tests)
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryLedger {
    credits: f64,
    daily_budget: f64,
    reports: Vec<WinReport>,
}

impl InMemoryLedger {
    pub fn new(daily_budget: f64) -> Self {
        Self {
            credits: daily_budget,
            daily_budget,
            reports: Vec::new(),
        }
    }

    pub fn reports(&self) -> &[WinReport] {
        &self.reports
    }

    /// Restore the daily allowance
    pub fn reset_daily(&mut self) {
        self.credits = self.daily_budget;
    }
}

impl CreditLedger for InMemoryLedger {
    fn report_win(&mut self, report: &WinReport) -> Result<LedgerReceipt, LedgerError> {
        if report.bet_amount > self.credits {
            return Err(LedgerError::InsufficientCredits {
                needed: report.bet_amount,
                available: self.credits,
            });
        }
        let credits = self.credits - report.bet_amount + report.win_amount;
        self.credits = (credits * 100.0).round() / 100.0;
        self.reports.push(report.clone());
        Ok(LedgerReceipt {
            remaining_credits: self.credits,
        })
    }

    fn player_state(&self) -> Result<PlayerState, LedgerError> {
        Ok(PlayerState {
            remaining_credits: self.credits,
            daily_budget: self.daily_budget,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CascadeGame;
    use cascade_core::SeededRandom;

    #[test]
    fn test_report_tracks_credits() {
        let mut ledger = InMemoryLedger::new(100.0);
        let report = WinReport {
            bet_amount: 2.0,
            win_amount: 5.5,
            game_id: "test".into(),
            bonus_type: None,
        };
        let receipt = ledger.report_win(&report).unwrap();
        approx::assert_abs_diff_eq!(receipt.remaining_credits, 103.5);
        assert_eq!(ledger.reports().len(), 1);

        ledger.reset_daily();
        approx::assert_abs_diff_eq!(ledger.player_state().unwrap().remaining_credits, 100.0);
    }

    #[test]
    fn test_insufficient_credits() {
        let mut ledger = InMemoryLedger::new(1.0);
        let report = WinReport {
            bet_amount: 2.0,
            win_amount: 0.0,
            game_id: "test".into(),
            bonus_type: None,
        };
        assert!(matches!(ledger.report_win(&report), Err(LedgerError::InsufficientCredits { .. })));
        assert!(ledger.reports().is_empty());
    }

    #[test]
    fn test_report_from_spin() {
        let game = CascadeGame::standard();
        let mut state = game.new_state();
        let result = game.spin(&mut state, &mut SeededRandom::new(4), 1.5).unwrap();

        let report = WinReport::from_spin(&result, &game.config().game_id, None);
        approx::assert_abs_diff_eq!(report.bet_amount, 1.5);
        approx::assert_abs_diff_eq!(report.win_amount, result.win_amount);
        assert_eq!(report.game_id, "golden-cascade");
    }
}
