//! Free-spin bonus tiers and the bonus session state machine
//!
//! A session is opened by a qualifying scatter count in the base game or by a
//! bonus buy. While it lives, scatters of 2+ grant extra spins (applied before
//! the completing spin is counted) and may upgrade the tier. The session ends
//! once its remaining count reaches 0 after a spin is scored.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// TIERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Bonus tier identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierId(pub u8);

impl std::fmt::Display for TierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One free-spin tier; all behaviour differences are data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusTier {
    pub id: TierId,
    /// Display name
    pub name: String,
    /// Scatters needed to open this tier from the base game
    pub scatter_threshold: usize,
    /// Free spins awarded on entry
    pub spins: u32,
    /// Keep golden squares across spins, including after a feature round
    pub persist_golden_squares: bool,
    /// Force a trigger symbol onto every free spin that lacks one
    pub guaranteed_trigger: bool,
    /// Draw coin values from the premium table
    pub premium_coins: bool,
    /// Bonus buy price as a multiple of the bet
    pub buy_cost_multiplier: f64,
}

/// Extra spins for a scatter count during an active session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetriggerRule {
    pub min_scatters: usize,
    pub extra_spins: u32,
}

/// Session upgrade from one tier to another on a retrigger
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierUpgrade {
    pub from: TierId,
    pub to: TierId,
    pub min_scatters: usize,
}

/// Tier table plus retrigger and upgrade mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusConfig {
    pub tiers: Vec<BonusTier>,
    pub retriggers: Vec<RetriggerRule>,
    pub upgrades: Vec<TierUpgrade>,
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                BonusTier {
                    id: TierId(1),
                    name: "Lucky Streak".into(),
                    scatter_threshold: 3,
                    spins: 8,
                    persist_golden_squares: false,
                    guaranteed_trigger: false,
                    premium_coins: false,
                    buy_cost_multiplier: 100.0,
                },
                BonusTier {
                    id: TierId(2),
                    name: "Golden Glow".into(),
                    scatter_threshold: 4,
                    spins: 12,
                    persist_golden_squares: false,
                    guaranteed_trigger: true,
                    premium_coins: false,
                    buy_cost_multiplier: 250.0,
                },
                BonusTier {
                    id: TierId(3),
                    name: "Rainbow Treasure".into(),
                    scatter_threshold: 5,
                    spins: 12,
                    persist_golden_squares: false,
                    guaranteed_trigger: true,
                    premium_coins: true,
                    buy_cost_multiplier: 500.0,
                },
            ],
            retriggers: vec![
                RetriggerRule {
                    min_scatters: 2,
                    extra_spins: 2,
                },
                RetriggerRule {
                    min_scatters: 3,
                    extra_spins: 4,
                },
            ],
            upgrades: vec![TierUpgrade {
                from: TierId(1),
                to: TierId(2),
                min_scatters: 4,
            }],
        }
    }
}

impl BonusConfig {
    pub fn tier(&self, id: TierId) -> Option<&BonusTier> {
        self.tiers.iter().find(|t| t.id == id)
    }

    /// Tier opened by `scatters` in the base game (highest threshold met)
    pub fn tier_for_scatters(&self, scatters: usize) -> Option<&BonusTier> {
        self.tiers
            .iter()
            .filter(|t| scatters >= t.scatter_threshold)
            .max_by_key(|t| t.scatter_threshold)
    }

    /// Extra spins for `scatters` during a session (0 when no rule applies)
    pub fn retrigger_spins(&self, scatters: usize) -> u32 {
        self.retriggers
            .iter()
            .filter(|r| scatters >= r.min_scatters)
            .max_by_key(|r| r.min_scatters)
            .map(|r| r.extra_spins)
            .unwrap_or(0)
    }

    /// Upgrade available from `from` with `scatters`
    pub fn upgrade_for(&self, from: TierId, scatters: usize) -> Option<&TierUpgrade> {
        self.upgrades
            .iter()
            .filter(|u| u.from == from && scatters >= u.min_scatters)
            .max_by_key(|u| u.min_scatters)
    }

    /// Buy offers at a given bet
    pub fn buy_offers(&self, bet: f64) -> Vec<BonusBuyOffer> {
        self.tiers
            .iter()
            .map(|t| BonusBuyOffer {
                tier: t.id,
                name: t.name.clone(),
                spins: t.spins,
                cost: round_credits(t.buy_cost_multiplier * bet),
            })
            .collect()
    }
}

/// Round a credit amount to 2 decimals
pub(crate) fn round_credits(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

// ═══════════════════════════════════════════════════════════════════════════════
// SESSION
// ═══════════════════════════════════════════════════════════════════════════════

/// Live free-spin session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusSession {
    pub tier: TierId,
    pub tier_name: String,
    pub spins_remaining: u32,
    pub spins_completed: u32,
    /// Credits won during the session
    pub total_won: f64,
    pub persist_golden_squares: bool,
    pub guaranteed_trigger: bool,
    pub premium_coins: bool,
    pub retriggers: u32,
}

impl BonusSession {
    /// Open a session at `tier`
    pub fn open(tier: &BonusTier) -> Self {
        Self {
            tier: tier.id,
            tier_name: tier.name.clone(),
            spins_remaining: tier.spins,
            spins_completed: 0,
            total_won: 0.0,
            persist_golden_squares: tier.persist_golden_squares,
            guaranteed_trigger: tier.guaranteed_trigger,
            premium_coins: tier.premium_coins,
            retriggers: 0,
        }
    }

    /// Switch to another tier, keeping spin counts and winnings
    pub fn upgrade_to(&mut self, tier: &BonusTier) {
        self.tier = tier.id;
        self.tier_name = tier.name.clone();
        self.persist_golden_squares = tier.persist_golden_squares;
        self.guaranteed_trigger = tier.guaranteed_trigger;
        self.premium_coins = tier.premium_coins;
    }

    /// Score one completed spin; returns true when the session is over
    pub fn complete_spin(&mut self, win: f64) -> bool {
        self.spins_remaining = self.spins_remaining.saturating_sub(1);
        self.spins_completed += 1;
        self.total_won = round_credits(self.total_won + win);
        self.spins_remaining == 0
    }
}

/// Price of entering a tier directly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusBuyOffer {
    pub tier: TierId,
    pub name: String,
    pub spins: u32,
    /// Credits at the quoted bet
    pub cost: f64,
}

/// Session opened by a spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusTrigger {
    pub tier: TierId,
    pub name: String,
    pub spins: u32,
    pub scatters: usize,
}

/// Extra spins (and possibly an upgrade) granted during a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retrigger {
    pub scatters: usize,
    pub extra_spins: u32,
    pub upgraded_from: Option<TierId>,
    pub upgraded_to: Option<TierId>,
    pub spins_remaining: u32,
}

/// Session bookkeeping after a free spin is scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAdvance {
    pub tier: TierId,
    pub spins_remaining: u32,
    pub spins_completed: u32,
    pub total_won: f64,
    pub ended: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_for_scatters() {
        let config = BonusConfig::default();
        assert!(config.tier_for_scatters(2).is_none());
        assert_eq!(config.tier_for_scatters(3).map(|t| t.id), Some(TierId(1)));
        assert_eq!(config.tier_for_scatters(4).map(|t| t.id), Some(TierId(2)));
        assert_eq!(config.tier_for_scatters(5).map(|t| t.id), Some(TierId(3)));
        assert_eq!(config.tier_for_scatters(9).map(|t| t.id), Some(TierId(3)));
    }

    #[test]
    fn test_retrigger_spins() {
        let config = BonusConfig::default();
        assert_eq!(config.retrigger_spins(0), 0);
        assert_eq!(config.retrigger_spins(1), 0);
        assert_eq!(config.retrigger_spins(2), 2);
        assert_eq!(config.retrigger_spins(3), 4);
        assert_eq!(config.retrigger_spins(6), 4);
    }

    #[test]
    fn test_upgrade_mapping() {
        let config = BonusConfig::default();
        assert!(config.upgrade_for(TierId(1), 3).is_none());
        assert_eq!(config.upgrade_for(TierId(1), 4).map(|u| u.to), Some(TierId(2)));
        assert!(config.upgrade_for(TierId(2), 5).is_none());
    }

    #[test]
    fn test_buy_offers() {
        let offers = BonusConfig::default().buy_offers(0.5);
        let costs: Vec<f64> = offers.iter().map(|o| o.cost).collect();
        assert_eq!(costs, vec![50.0, 125.0, 250.0]);
    }

    #[test]
    fn test_session_completes() {
        let config = BonusConfig::default();
        let mut session = BonusSession::open(config.tier(TierId(1)).unwrap());
        assert_eq!(session.spins_remaining, 8);

        for _ in 0..7 {
            assert!(!session.complete_spin(1.25));
        }
        assert!(session.complete_spin(0.0));
        assert_eq!(session.spins_completed, 8);
        approx::assert_abs_diff_eq!(session.total_won, 8.75);
    }

    #[test]
    fn test_upgrade_keeps_counts() {
        let config = BonusConfig::default();
        let mut session = BonusSession::open(config.tier(TierId(1)).unwrap());
        session.complete_spin(2.0);
        session.upgrade_to(config.tier(TierId(2)).unwrap());

        assert_eq!(session.tier, TierId(2));
        assert_eq!(session.spins_remaining, 7);
        assert_eq!(session.spins_completed, 1);
        assert!(session.guaranteed_trigger);
    }
}
