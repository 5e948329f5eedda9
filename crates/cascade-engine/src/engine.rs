//! Spin orchestrator
//!
//! `GENERATE → (CASCADE)* → FEATURE_RESOLVE → BONUS_ADVANCE → DONE`
//!
//! [`CascadeGame`] holds only immutable configuration. Everything that
//! carries over between spins (grid, golden squares, bonus session) lives in
//! an [`EngineState`] owned by the caller, so independent sessions never
//! share anything and a state can be snapshotted and replayed.

use cascade_core::{Grid, PositionSet, RandomSource};
use serde::{Deserialize, Serialize};

use crate::bonus::{
    BonusBuyOffer, BonusSession, BonusTier, BonusTrigger, Retrigger, SessionAdvance, TierId,
    round_credits,
};
use crate::cascade::SymbolGenerator;
use crate::config::{GameConfig, GridSpec};
use crate::error::{BonusError, ConfigResult, SpinError};
use crate::feature::{FeatureContext, FeatureResolver};
use crate::paytable::PayTable;
use crate::spin::{CascadeStep, SpinResult};

// ═══════════════════════════════════════════════════════════════════════════════
// STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-player state carried between spins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    /// Grid left by the last spin
    pub grid: Grid,
    /// Positions charged for the feature
    pub golden_squares: PositionSet,
    /// Live free-spin session
    pub session: Option<BonusSession>,
}

impl EngineState {
    pub fn new(grid: GridSpec) -> Self {
        Self {
            grid: Grid::new(grid.width, grid.height),
            golden_squares: PositionSet::new(grid.width, grid.height),
            session: None,
        }
    }

    pub fn in_bonus(&self) -> bool {
        self.session.is_some()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GAME
// ═══════════════════════════════════════════════════════════════════════════════

/// A configured cascade game
#[derive(Debug, Clone)]
pub struct CascadeGame {
    config: GameConfig,
    paytable: PayTable,
    base_symbols: SymbolGenerator,
    free_spin_symbols: SymbolGenerator,
    resolver: FeatureResolver,
}

impl CascadeGame {
    /// Validate `config` and build a game from it
    pub fn new(config: GameConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// The reference game
    pub fn standard() -> Self {
        Self::build(GameConfig::default())
    }

    fn build(config: GameConfig) -> Self {
        let mut paytable = PayTable::new(config.symbols.clone());
        paytable.min_cluster_size = config.min_cluster_size;

        Self {
            base_symbols: SymbolGenerator::new(config.base_symbol_weights.clone(), &config.symbols),
            free_spin_symbols: SymbolGenerator::new(
                config.free_spin_symbol_weights.clone(),
                &config.symbols,
            ),
            resolver: FeatureResolver::new(config.feature.clone()),
            paytable,
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn paytable(&self) -> &PayTable {
        &self.paytable
    }

    pub fn resolver(&self) -> &FeatureResolver {
        &self.resolver
    }

    /// Fresh state sized for this game
    pub fn new_state(&self) -> EngineState {
        EngineState::new(self.config.grid)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BONUS API
    // ═══════════════════════════════════════════════════════════════════════════

    /// Buy prices per tier; does not touch any state
    pub fn bonus_buy_offers(&self, bet: f64) -> Vec<BonusBuyOffer> {
        self.config.bonus.buy_offers(bet)
    }

    /// Enter a session directly (bonus buy)
    pub fn start_bonus_mode<'s>(
        &self,
        state: &'s mut EngineState,
        tier: TierId,
    ) -> Result<&'s BonusSession, BonusError> {
        if let Some(active) = &state.session {
            return Err(BonusError::SessionAlreadyActive(active.tier));
        }
        let tier = self.config.bonus.tier(tier).ok_or(BonusError::UnknownTier(tier))?;
        Ok(Self::open_session(state, tier))
    }

    /// Score one completed free spin
    pub fn advance_free_spins(
        &self,
        state: &mut EngineState,
        win: f64,
    ) -> Result<SessionAdvance, BonusError> {
        let session = state.session.as_mut().ok_or(BonusError::NoActiveSession)?;
        let ended = session.complete_spin(win);
        let advance = SessionAdvance {
            tier: session.tier,
            spins_remaining: session.spins_remaining,
            spins_completed: session.spins_completed,
            total_won: session.total_won,
            ended,
        };

        if ended {
            log::info!(
                "Bonus session tier {} ended after {} spins, won {:.2}",
                advance.tier,
                advance.spins_completed,
                advance.total_won
            );
            state.session = None;
            state.golden_squares.clear();
        }
        Ok(advance)
    }

    /// Grant extra spins (and maybe an upgrade) for scatters during a session
    pub fn handle_free_spins_retrigger(
        &self,
        state: &mut EngineState,
        scatters: usize,
    ) -> Result<Option<Retrigger>, BonusError> {
        let session = state.session.as_mut().ok_or(BonusError::NoActiveSession)?;
        let bonus = &self.config.bonus;

        let extra_spins = bonus.retrigger_spins(scatters);
        let upgrade = bonus
            .upgrade_for(session.tier, scatters)
            .and_then(|u| bonus.tier(u.to));
        if extra_spins == 0 && upgrade.is_none() {
            return Ok(None);
        }

        let mut upgraded_from = None;
        if let Some(tier) = upgrade {
            log::info!("Bonus session upgraded from tier {} to tier {}", session.tier, tier.id);
            upgraded_from = Some(session.tier);
            session.upgrade_to(tier);
        }
        session.spins_remaining += extra_spins;
        session.retriggers += 1;

        Ok(Some(Retrigger {
            scatters,
            extra_spins,
            upgraded_from,
            upgraded_to: upgrade.map(|t| t.id),
            spins_remaining: session.spins_remaining,
        }))
    }

    fn open_session<'s>(state: &'s mut EngineState, tier: &BonusTier) -> &'s BonusSession {
        log::info!("Bonus session opened: tier {} ({}), {} spins", tier.id, tier.name, tier.spins);
        state.golden_squares.clear();
        state.session.insert(BonusSession::open(tier))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPIN
    // ═══════════════════════════════════════════════════════════════════════════

    /// Play one spin
    ///
    /// Only an out-of-range bet is rejected, before any state is touched.
    /// Free spins use the same bet as the spin that opened the session.
    pub fn spin<R: RandomSource + ?Sized>(
        &self,
        state: &mut EngineState,
        rng: &mut R,
        bet: f64,
    ) -> Result<SpinResult, SpinError> {
        if !self.config.bet.contains(bet) {
            return Err(SpinError::InvalidBet {
                bet,
                min: self.config.bet.min,
                max: self.config.bet.max,
            });
        }

        let GridSpec { width, height } = self.config.grid;
        if state.golden_squares.width() != width || state.golden_squares.height() != height {
            state.golden_squares = PositionSet::new(width, height);
        }

        let session = state.session.as_ref();
        let free_spin_tier = session.map(|s| s.tier);
        let guaranteed_trigger = session.is_some_and(|s| s.guaranteed_trigger);
        let persist = session.is_some_and(|s| s.persist_golden_squares);
        let ctx = FeatureContext {
            free_spins: session.is_some(),
            premium_coins: session.is_some_and(|s| s.premium_coins),
        };
        let symbols = if ctx.free_spins {
            &self.free_spin_symbols
        } else {
            &self.base_symbols
        };

        // Generate
        let mut grid = symbols.generate(width, height, rng);
        let forced_trigger = if guaranteed_trigger {
            symbols.force_trigger(&mut grid, rng)
        } else {
            None
        };
        let initial_grid = grid.clone();

        // Cascade loop
        let mut cascades: Vec<CascadeStep> = Vec::new();
        let mut cluster_payout = 0.0;
        let mut initial_win_positions = Vec::new();
        let mut cascade_capped = false;

        loop {
            let wins = self.paytable.find_wins(&grid);
            if !wins.is_win() {
                break;
            }
            if cascades.len() >= self.config.max_cascades as usize {
                log::warn!("Cascade cap {} reached, settling grid", self.config.max_cascades);
                cascade_capped = true;
                break;
            }
            if cascades.is_empty() {
                initial_win_positions = wins.win_positions.to_vec();
            }

            state.golden_squares.union_with(&wins.win_positions);
            cluster_payout += wins.total_payout;

            let grid_before = grid.clone();
            let moves = symbols.execute_cascade(&mut grid, &wins.win_positions, rng);
            log::debug!(
                "Cascade {}: {} cluster(s), {} cells, {:.2}x",
                cascades.len() + 1,
                wins.clusters.len(),
                wins.win_positions.len(),
                wins.total_payout
            );

            cascades.push(CascadeStep {
                index: cascades.len() as u32,
                clusters: wins.clusters,
                payout: wins.total_payout,
                grid_before,
                grid_after: grid.clone(),
                moves,
            });
        }

        let golden_squares = state.golden_squares.to_vec();
        let scatters = self.paytable.find_scatters(&grid);

        // Feature
        let feature = if !state.golden_squares.is_empty() && symbols.has_trigger(&grid) {
            Some(self.resolver.resolve(&state.golden_squares, ctx, rng))
        } else {
            None
        };
        if !persist {
            state.golden_squares.clear();
        }
        let feature_payout = feature.as_ref().map(|f| f.total).unwrap_or(0.0);
        let win_amount = round_credits((cluster_payout + feature_payout) * bet);

        // Bonus advance
        let mut bonus_triggered = None;
        let mut retrigger = None;
        let mut session_advance = None;
        if state.in_bonus() {
            retrigger = self.handle_free_spins_retrigger(state, scatters.count).unwrap_or_default();
            session_advance = self.advance_free_spins(state, win_amount).ok();
        } else if let Some(tier) = self.config.bonus.tier_for_scatters(scatters.count) {
            Self::open_session(state, tier);
            bonus_triggered = Some(BonusTrigger {
                tier: tier.id,
                name: tier.name.clone(),
                spins: tier.spins,
                scatters: scatters.count,
            });
        }

        state.grid = grid.clone();

        Ok(SpinResult {
            bet,
            free_spin_tier,
            initial_grid,
            grid,
            forced_trigger,
            initial_win_positions,
            golden_squares,
            cascades,
            cascade_capped,
            cluster_payout,
            feature_payout,
            win_amount,
            scatters,
            feature,
            bonus_triggered,
            retrigger,
            session: session_advance,
        })
    }
}

impl Default for CascadeGame {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::{ScriptedRandom, SeededRandom, WeightedTable};

    /// Every draw lands on CROWN, so every grid is one big cluster
    fn all_crowns() -> GameConfig {
        GameConfig {
            base_symbol_weights: WeightedTable::single(8),
            free_spin_symbol_weights: WeightedTable::from_pairs([(8, 1), (11, 1)]).unwrap(),
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_invalid_bet_rejected() {
        let game = CascadeGame::standard();
        let mut state = game.new_state();
        let before = state.clone();
        let mut rng = SeededRandom::new(1);

        for bet in [0.0, 0.05, 100.01, f64::NAN] {
            assert!(matches!(
                game.spin(&mut state, &mut rng, bet),
                Err(SpinError::InvalidBet { .. })
            ));
        }
        assert_eq!(state, before);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_spin_settles_grid() {
        let game = CascadeGame::standard();
        let mut state = game.new_state();
        let mut rng = SeededRandom::new(2024);

        for _ in 0..200 {
            let result = game.spin(&mut state, &mut rng, 1.0).unwrap();
            assert!(result.grid.is_settled());
            assert!(result.grid.count(11) <= 1);
            assert_eq!(state.grid, result.grid);
            assert!(result.cascade_count() <= 20);
            assert!(result.win_amount >= 0.0);
        }
    }

    #[test]
    fn test_cascade_cap() {
        let game = CascadeGame::new(all_crowns()).unwrap();
        let mut state = game.new_state();
        let result = game.spin(&mut state, &mut ScriptedRandom::default(), 1.0).unwrap();

        assert!(result.cascade_capped);
        assert_eq!(result.cascade_count(), 20);
        approx::assert_abs_diff_eq!(result.cluster_payout, 20.0 * 125.0);
        assert_eq!(result.golden_squares.len(), 30);
        assert!(result.feature.is_none());
        // Base game squares never carry over
        assert!(state.golden_squares.is_empty());
    }

    #[test]
    fn test_guaranteed_trigger_runs_feature() {
        let game = CascadeGame::new(all_crowns()).unwrap();
        let mut state = game.new_state();
        game.start_bonus_mode(&mut state, TierId(2)).unwrap();

        let result = game.spin(&mut state, &mut ScriptedRandom::default(), 1.0).unwrap();

        assert_eq!(result.free_spin_tier, Some(TierId(2)));
        assert_eq!(result.forced_trigger, Some(cascade_core::Position::new(0, 0)));
        assert_eq!(result.grid.count(11), 1);
        assert_eq!(result.golden_squares.len(), 30);

        // 30 reveals, all landing on the cheapest coin
        let feature = result.feature.as_ref().unwrap();
        assert_eq!(feature.rounds.len(), 1);
        assert_eq!(feature.rounds[0].reveals.len(), 30);
        approx::assert_abs_diff_eq!(result.feature_payout, 1.5, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(result.win_amount, 2501.5);

        let advance = result.session.unwrap();
        assert_eq!(advance.spins_remaining, 11);
        assert!(!advance.ended);
        assert!(state.golden_squares.is_empty());
    }

    #[test]
    fn test_persisting_tier_keeps_squares_after_feature() {
        let mut config = all_crowns();
        for tier in &mut config.bonus.tiers {
            tier.persist_golden_squares = true;
        }
        let game = CascadeGame::new(config).unwrap();
        let mut state = game.new_state();
        game.start_bonus_mode(&mut state, TierId(2)).unwrap();

        let result = game.spin(&mut state, &mut ScriptedRandom::default(), 1.0).unwrap();
        assert!(result.feature.is_some());
        assert_eq!(state.golden_squares.len(), 30);
    }

    #[test]
    fn test_start_bonus_mode_errors() {
        let game = CascadeGame::standard();
        let mut state = game.new_state();

        assert_eq!(
            game.start_bonus_mode(&mut state, TierId(7)).unwrap_err(),
            BonusError::UnknownTier(TierId(7))
        );
        assert_eq!(game.start_bonus_mode(&mut state, TierId(1)).unwrap().spins_remaining, 8);
        assert_eq!(
            game.start_bonus_mode(&mut state, TierId(3)).unwrap_err(),
            BonusError::SessionAlreadyActive(TierId(1))
        );
    }

    #[test]
    fn test_session_api_requires_session() {
        let game = CascadeGame::standard();
        let mut state = game.new_state();
        assert_eq!(game.advance_free_spins(&mut state, 1.0), Err(BonusError::NoActiveSession));
        assert_eq!(
            game.handle_free_spins_retrigger(&mut state, 3),
            Err(BonusError::NoActiveSession)
        );
    }

    #[test]
    fn test_retrigger_and_upgrade() {
        let game = CascadeGame::standard();
        let mut state = game.new_state();
        game.start_bonus_mode(&mut state, TierId(1)).unwrap();

        assert_eq!(game.handle_free_spins_retrigger(&mut state, 1).unwrap(), None);

        let small = game.handle_free_spins_retrigger(&mut state, 2).unwrap().unwrap();
        assert_eq!(small.extra_spins, 2);
        assert_eq!(small.spins_remaining, 10);
        assert_eq!(small.upgraded_to, None);

        let upgrade = game.handle_free_spins_retrigger(&mut state, 4).unwrap().unwrap();
        assert_eq!(upgrade.extra_spins, 4);
        assert_eq!(upgrade.upgraded_from, Some(TierId(1)));
        assert_eq!(upgrade.upgraded_to, Some(TierId(2)));

        let session = state.session.as_ref().unwrap();
        assert_eq!(session.tier, TierId(2));
        assert_eq!(session.spins_remaining, 14);
        assert!(session.guaranteed_trigger);
    }

    #[test]
    fn test_advance_ends_session() {
        let game = CascadeGame::standard();
        let mut state = game.new_state();
        game.start_bonus_mode(&mut state, TierId(1)).unwrap();
        state.golden_squares.insert(cascade_core::Position::new(1, 1));

        for spin in 1..=8 {
            let advance = game.advance_free_spins(&mut state, 0.5).unwrap();
            assert_eq!(advance.spins_completed, spin);
            assert_eq!(advance.ended, spin == 8);
        }
        assert!(state.session.is_none());
        assert!(state.golden_squares.is_empty());
    }

    #[test]
    fn test_bonus_buy_offers_pure() {
        let game = CascadeGame::standard();
        let offers = game.bonus_buy_offers(2.0);
        assert_eq!(offers.len(), 3);
        approx::assert_abs_diff_eq!(offers[2].cost, 1000.0);
    }
}
