//! Game configuration
//!
//! [`GameConfig::default`] is the reference game. Configs can be loaded from
//! JSON or YAML; missing sections fall back to the reference values and the
//! result is always validated before an engine is built from it.

use std::collections::HashSet;
use std::path::Path;

use cascade_core::{SymbolId, WeightedTable};
use serde::{Deserialize, Serialize};

use crate::bonus::BonusConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::paytable::MIN_CLUSTER_SIZE;
use crate::symbols::{SymbolCatalog, SymbolKind};

/// Hard cap on cascades per spin
pub const DEFAULT_MAX_CASCADES: u32 = 20;

/// Per-round cap on feature collection, in bet multiples
pub const DEFAULT_ROUND_CAP: f64 = 10_000.0;

// ═══════════════════════════════════════════════════════════════════════════════
// GRID AND BET
// ═══════════════════════════════════════════════════════════════════════════════

/// Grid dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Columns
    pub width: usize,
    /// Rows
    pub height: usize,
}

impl GridSpec {
    /// Reference 6×5 grid
    pub fn standard_6x5() -> Self {
        Self {
            width: 6,
            height: 5,
        }
    }

    pub fn total_positions(&self) -> usize {
        self.width * self.height
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::standard_6x5()
    }
}

/// Allowed bet range in credits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetLimits {
    pub min: f64,
    pub max: f64,
}

impl BetLimits {
    pub fn contains(&self, bet: f64) -> bool {
        bet.is_finite() && bet >= self.min && bet <= self.max
    }
}

impl Default for BetLimits {
    fn default() -> Self {
        Self {
            min: 0.10,
            max: 100.0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FEATURE
// ═══════════════════════════════════════════════════════════════════════════════

/// Reveal outcome probabilities before damping; coins take the remainder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeChances {
    pub clover: f64,
    pub collector: f64,
}

/// How many feature rounds a single activation may run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ChainMode {
    /// One round per activation
    #[default]
    Single,
    /// Keep running rounds while collectors keep activating
    MultiRound { max_rounds: u32 },
}

impl ChainMode {
    pub fn max_rounds(&self) -> u32 {
        match self {
            Self::Single => 1,
            Self::MultiRound { max_rounds } => *max_rounds,
        }
    }
}

/// Golden-square feature configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Outcome chances in the base game
    pub base_chances: OutcomeChances,
    /// Outcome chances during free spins
    pub free_spin_chances: OutcomeChances,
    /// Flat reduction applied to every collector chance
    pub global_reduction: f64,
    /// Collector chance multiplier per collector already on the board
    pub collector_decay: f64,
    /// Coin values in bet multiples
    pub coin_values: WeightedTable<f64>,
    /// Coin values for tiers with premium coins
    pub premium_coin_values: WeightedTable<f64>,
    /// Clover multipliers
    pub clover_multipliers: WeightedTable<f64>,
    /// Multiplier a collector applies to what it absorbs
    pub collector_base_value: f64,
    /// Maximum collected value per round, in bet multiples
    pub round_cap: f64,
    /// Maximum collector activations per round
    pub max_activations: usize,
    pub chain_mode: ChainMode,
}

impl FeatureConfig {
    /// Collector chance after damping for `collectors` already on the board
    pub fn adjusted_pot_chance(&self, base: f64, collectors: usize) -> f64 {
        adjusted_pot_chance(base, self.global_reduction, self.collector_decay, collectors)
    }

    pub fn chances(&self, free_spins: bool) -> OutcomeChances {
        if free_spins {
            self.free_spin_chances
        } else {
            self.base_chances
        }
    }

    pub fn coin_table(&self, premium: bool) -> &WeightedTable<f64> {
        if premium {
            &self.premium_coin_values
        } else {
            &self.coin_values
        }
    }
}

/// `base × global × decay^collectors`
pub fn adjusted_pot_chance(base: f64, global: f64, decay: f64, collectors: usize) -> f64 {
    base * global * decay.powi(collectors.min(i32::MAX as usize) as i32)
}

fn table(pairs: &[(f64, u32)]) -> WeightedTable<f64> {
    WeightedTable::from_pairs(pairs.iter().copied()).unwrap_or_else(|_| WeightedTable::single(1.0))
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            base_chances: OutcomeChances {
                clover: 0.15,
                collector: 0.05,
            },
            free_spin_chances: OutcomeChances {
                clover: 0.20,
                collector: 0.08,
            },
            global_reduction: 0.75,
            collector_decay: 0.6,
            coin_values: table(&[
                (0.05, 390),
                (0.1, 280),
                (0.2, 172),
                (0.5, 95),
                (1.0, 41),
                (2.0, 16),
                (5.0, 6),
            ]),
            premium_coin_values: table(&[
                (0.2, 300),
                (0.4, 250),
                (1.0, 200),
                (2.0, 130),
                (5.0, 70),
                (10.0, 35),
                (20.0, 15),
            ]),
            clover_multipliers: table(&[(2.0, 600), (3.0, 300), (5.0, 100)]),
            collector_base_value: 1.0,
            round_cap: DEFAULT_ROUND_CAP,
            max_activations: 25,
            chain_mode: ChainMode::Single,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GAME
// ═══════════════════════════════════════════════════════════════════════════════

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Identifier reported to the credit ledger
    pub game_id: String,
    pub grid: GridSpec,
    pub min_cluster_size: usize,
    pub max_cascades: u32,
    pub bet: BetLimits,
    pub symbols: SymbolCatalog,
    /// Symbol fill weights in the base game
    pub base_symbol_weights: WeightedTable<SymbolId>,
    /// Symbol fill weights during free spins
    pub free_spin_symbol_weights: WeightedTable<SymbolId>,
    pub feature: FeatureConfig,
    pub bonus: BonusConfig,
    /// Target return to player (0.0 - 1.0)
    pub target_rtp: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            game_id: "golden-cascade".into(),
            grid: GridSpec::standard_6x5(),
            min_cluster_size: MIN_CLUSTER_SIZE,
            max_cascades: DEFAULT_MAX_CASCADES,
            bet: BetLimits::default(),
            symbols: SymbolCatalog::standard(),
            base_symbol_weights: symbol_table(&[
                (1, 160),
                (2, 150),
                (3, 140),
                (4, 130),
                (5, 120),
                (6, 90),
                (7, 70),
                (8, 50),
                (9, 25),
                (10, 18),
                (11, 12),
            ]),
            free_spin_symbol_weights: symbol_table(&[
                (1, 150),
                (2, 145),
                (3, 135),
                (4, 125),
                (5, 115),
                (6, 95),
                (7, 75),
                (8, 55),
                (9, 35),
                (10, 14),
                (11, 20),
            ]),
            feature: FeatureConfig::default(),
            bonus: BonusConfig::default(),
            target_rtp: 0.96,
        }
    }
}

fn symbol_table(pairs: &[(SymbolId, u32)]) -> WeightedTable<SymbolId> {
    WeightedTable::from_pairs(pairs.iter().copied()).unwrap_or_else(|_| WeightedTable::single(1))
}

impl GameConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML config
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, picking the format from its extension
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the whole config
    pub fn validate(&self) -> ConfigResult<()> {
        self.validate_grid()?;
        self.validate_symbols()?;
        self.validate_tables()?;
        self.validate_feature()?;
        self.validate_bonus()?;

        if !(self.bet.min > 0.0 && self.bet.min <= self.bet.max && self.bet.max.is_finite()) {
            return Err(invalid("bet", format!("{}..={}", self.bet.min, self.bet.max)));
        }
        if !(self.target_rtp > 0.0 && self.target_rtp < 2.0) {
            return Err(invalid("target_rtp", self.target_rtp.to_string()));
        }
        Ok(())
    }

    fn validate_grid(&self) -> ConfigResult<()> {
        let GridSpec { width, height } = self.grid;
        if self.min_cluster_size == 0 {
            return Err(invalid("min_cluster_size", "must be at least 1".into()));
        }
        if width == 0 || height == 0 || width * height < self.min_cluster_size {
            return Err(ConfigError::GridTooSmall {
                width,
                height,
                min_cluster: self.min_cluster_size,
            });
        }
        if self.max_cascades == 0 {
            return Err(invalid("max_cascades", "must be at least 1".into()));
        }
        Ok(())
    }

    fn validate_symbols(&self) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for symbol in self.symbols.symbols() {
            if symbol.id == cascade_core::EMPTY {
                return Err(ConfigError::ReservedSymbol);
            }
            if !seen.insert(symbol.id) {
                return Err(ConfigError::DuplicateSymbol(symbol.id));
            }
            if symbol.pays.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(invalid("pays", format!("symbol {}", symbol.name)));
            }
        }

        let required = [
            (SymbolKind::Regular, "regular"),
            (SymbolKind::Scatter, "scatter"),
            (SymbolKind::Trigger, "trigger"),
        ];
        for (kind, name) in required {
            if self.symbols.first_of(kind).is_none() {
                return Err(ConfigError::MissingSymbolKind(name));
            }
        }
        Ok(())
    }

    fn validate_tables(&self) -> ConfigResult<()> {
        let tables = [
            (&self.base_symbol_weights, "base_symbol_weights"),
            (&self.free_spin_symbol_weights, "free_spin_symbol_weights"),
        ];
        for (table, name) in tables {
            if table.total_weight() == 0 {
                return Err(ConfigError::ZeroWeight(name));
            }
            for entry in table.entries() {
                if self.symbols.get(entry.value).is_none() {
                    return Err(ConfigError::UnknownSymbol(entry.value));
                }
            }
            let fillable =
                table.probability_of(|&id| self.symbols.kind(id) != Some(SymbolKind::Trigger));
            if fillable <= 0.0 {
                return Err(invalid(name, "needs at least one non-trigger symbol".into()));
            }
        }
        Ok(())
    }

    fn validate_feature(&self) -> ConfigResult<()> {
        let f = &self.feature;
        let value_tables = [
            (&f.coin_values, "coin_values"),
            (&f.premium_coin_values, "premium_coin_values"),
            (&f.clover_multipliers, "clover_multipliers"),
        ];
        for (table, name) in value_tables {
            if table.total_weight() == 0 {
                return Err(ConfigError::ZeroWeight(name));
            }
            if table.entries().iter().any(|e| !e.value.is_finite() || e.value < 0.0) {
                return Err(invalid(name, "values must be finite and non-negative".into()));
            }
        }

        let in_range = |p: f64| (0.0..=1.0).contains(&p);
        for (chances, name) in [
            (f.base_chances, "base_chances"),
            (f.free_spin_chances, "free_spin_chances"),
        ] {
            if !in_range(chances.clover)
                || !in_range(chances.collector)
                || chances.clover + chances.collector > 1.0
            {
                return Err(invalid(name, format!("{chances:?}")));
            }
        }

        if !(f.global_reduction > 0.0 && f.global_reduction <= 1.0) {
            return Err(invalid("global_reduction", f.global_reduction.to_string()));
        }
        if !(f.collector_decay > 0.0 && f.collector_decay <= 1.0) {
            return Err(invalid("collector_decay", f.collector_decay.to_string()));
        }
        if !(f.collector_base_value.is_finite() && f.collector_base_value > 0.0) {
            return Err(invalid("collector_base_value", f.collector_base_value.to_string()));
        }
        if !(f.round_cap.is_finite() && f.round_cap > 0.0) {
            return Err(invalid("round_cap", f.round_cap.to_string()));
        }
        if f.max_activations == 0 {
            return Err(invalid("max_activations", "must be at least 1".into()));
        }
        if f.chain_mode.max_rounds() == 0 {
            return Err(invalid("chain_mode", "max_rounds must be at least 1".into()));
        }
        Ok(())
    }

    fn validate_bonus(&self) -> ConfigResult<()> {
        let bonus = &self.bonus;
        if bonus.tiers.is_empty() {
            return Err(invalid("bonus.tiers", "at least one tier is required".into()));
        }

        let mut ids = HashSet::new();
        for tier in &bonus.tiers {
            if !ids.insert(tier.id) {
                return Err(invalid("bonus.tiers", format!("duplicate tier {}", tier.id)));
            }
            if tier.spins == 0 {
                return Err(invalid("bonus.tiers", format!("tier {} awards no spins", tier.id)));
            }
            if !(tier.buy_cost_multiplier.is_finite() && tier.buy_cost_multiplier >= 0.0) {
                return Err(invalid("bonus.tiers", format!("tier {} buy cost", tier.id)));
            }
        }

        for upgrade in &bonus.upgrades {
            for id in [upgrade.from, upgrade.to] {
                if bonus.tier(id).is_none() {
                    return Err(ConfigError::UnknownTier(id, "bonus.upgrades"));
                }
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidValue { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::{TierId, TierUpgrade};

    #[test]
    fn test_default_is_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn test_pot_chance_damping() {
        let feature = FeatureConfig::default();
        approx::assert_abs_diff_eq!(feature.adjusted_pot_chance(0.05, 0), 0.0375, epsilon = 1e-12);

        let mut previous = feature.adjusted_pot_chance(0.05, 0);
        for collectors in 1..20 {
            let p = feature.adjusted_pot_chance(0.05, collectors);
            assert!(p < previous);
            assert!(p > 0.0);
            previous = p;
        }
    }

    #[test]
    fn test_chain_mode_rounds() {
        assert_eq!(ChainMode::Single.max_rounds(), 1);
        assert_eq!(ChainMode::MultiRound { max_rounds: 4 }.max_rounds(), 4);
    }

    #[test]
    fn test_json_round_trip_and_partial() {
        let json = GameConfig::default().to_json().unwrap();
        let back = GameConfig::from_json_str(&json).unwrap();
        assert_eq!(back, GameConfig::default());

        let partial =
            GameConfig::from_json_str(r#"{"max_cascades": 5, "target_rtp": 0.94}"#).unwrap();
        assert_eq!(partial.max_cascades, 5);
        assert_eq!(partial.grid, GridSpec::standard_6x5());
    }

    #[test]
    fn test_yaml_config() {
        let yaml = "
game_id: yaml-test
grid:
  width: 7
  height: 7
feature:
  base_chances: { clover: 0.1, collector: 0.05 }
  free_spin_chances: { clover: 0.1, collector: 0.05 }
  global_reduction: 0.75
  collector_decay: 0.6
  coin_values: [{ value: 1.0, weight: 1 }]
  premium_coin_values: [{ value: 5.0, weight: 1 }]
  clover_multipliers: [{ value: 2.0, weight: 1 }]
  collector_base_value: 1.0
  round_cap: 500.0
  max_activations: 10
  chain_mode: { mode: multi_round, max_rounds: 3 }
";
        let config = GameConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.game_id, "yaml-test");
        assert_eq!(config.grid.total_positions(), 49);
        assert_eq!(config.feature.chain_mode, ChainMode::MultiRound { max_rounds: 3 });
    }

    #[test]
    fn test_rejects_unknown_symbol_in_table() {
        let mut config = GameConfig::default();
        config.base_symbol_weights = WeightedTable::from_pairs([(1, 10), (42, 5)]).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::UnknownSymbol(42))));
    }

    #[test]
    fn test_rejects_small_grid() {
        let mut config = GameConfig::default();
        config.grid = GridSpec { width: 2, height: 2 };
        assert!(matches!(config.validate(), Err(ConfigError::GridTooSmall { .. })));
    }

    #[test]
    fn test_rejects_bad_chances() {
        let mut config = GameConfig::default();
        config.feature.base_chances = OutcomeChances {
            clover: 0.7,
            collector: 0.5,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "base_chances", .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_upgrade_tier() {
        let mut config = GameConfig::default();
        config.bonus.upgrades.push(TierUpgrade {
            from: TierId(2),
            to: TierId(9),
            min_scatters: 5,
        });
        assert!(matches!(config.validate(), Err(ConfigError::UnknownTier(TierId(9), _))));
    }

    #[test]
    fn test_rejects_empty_table_in_json() {
        let json = r#"{"base_symbol_weights": []}"#;
        assert!(GameConfig::from_json_str(json).is_err());
    }
}
