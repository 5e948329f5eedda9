//! Reveal / clover / collector chain resolution

use std::collections::VecDeque;

use cascade_core::{Position, PositionSet, RandomSource, WeightedTable};

use super::board::{BoardCell, FeatureBoard};
use super::types::{CollectionStep, FeatureOutcome, FeatureRound, Reveal, RevealKind, RevealOutcome};
use crate::config::FeatureConfig;

/// Probabilities are turned into integer weights at this resolution
const WEIGHT_SCALE: f64 = 1_000_000.0;

/// Mode flags that change how squares reveal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureContext {
    /// Use free-spin outcome chances
    pub free_spins: bool,
    /// Draw coins from the premium table
    pub premium_coins: bool,
}

/// Golden-square feature resolver
#[derive(Debug, Clone)]
pub struct FeatureResolver {
    config: FeatureConfig,
}

impl FeatureResolver {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Outcome classification table with `collectors` already on the board
    ///
    /// Collector weight is the damped pot chance, clover weight the mode's
    /// clover chance, and coins take whatever is left.
    pub fn outcome_table(
        &self,
        ctx: FeatureContext,
        collectors: usize,
    ) -> WeightedTable<RevealKind> {
        let chances = self.config.chances(ctx.free_spins);
        let pot = self.config.adjusted_pot_chance(chances.collector, collectors);

        let scale = WEIGHT_SCALE as u32;
        let pot_weight = (pot * WEIGHT_SCALE).round().clamp(0.0, WEIGHT_SCALE) as u32;
        let clover_weight = (chances.clover * WEIGHT_SCALE).round().clamp(0.0, WEIGHT_SCALE) as u32;
        let coin_weight = scale.saturating_sub(pot_weight).saturating_sub(clover_weight);

        WeightedTable::from_pairs([
            (RevealKind::Coin, coin_weight),
            (RevealKind::Clover, clover_weight),
            (RevealKind::Collector, pot_weight),
        ])
        .unwrap_or_else(|_| WeightedTable::single(RevealKind::Coin))
    }

    /// Draw one reveal outcome for the current board
    pub fn reveal<R: RandomSource + ?Sized>(
        &self,
        board: &FeatureBoard,
        ctx: FeatureContext,
        rng: &mut R,
    ) -> RevealOutcome {
        let kind = *self.outcome_table(ctx, board.collector_count()).pick(rng);
        match kind {
            RevealKind::Coin => RevealOutcome::Coin {
                value: *self.config.coin_table(ctx.premium_coins).pick(rng),
            },
            RevealKind::Clover => RevealOutcome::Clover {
                multiplier: *self.config.clover_multipliers.pick(rng),
            },
            RevealKind::Collector => RevealOutcome::Collector,
        }
    }

    /// Run the feature over `golden` according to the chain mode
    pub fn resolve<R: RandomSource + ?Sized>(
        &self,
        golden: &PositionSet,
        ctx: FeatureContext,
        rng: &mut R,
    ) -> FeatureOutcome {
        let mut outcome = FeatureOutcome::default();
        if golden.is_empty() {
            return outcome;
        }

        for index in 0..self.config.chain_mode.max_rounds() {
            let round = self.resolve_round(index, golden, ctx, rng);
            let activated = round.activations() > 0;
            outcome.total += round.total;
            outcome.rounds.push(round);
            if !activated {
                break;
            }
        }

        log::debug!(
            "Feature resolved {} round(s) over {} squares, total {:.2}x",
            outcome.rounds.len(),
            golden.len(),
            outcome.total
        );
        outcome
    }

    /// One reveal/collection round
    pub fn resolve_round<R: RandomSource + ?Sized>(
        &self,
        index: u32,
        golden: &PositionSet,
        ctx: FeatureContext,
        rng: &mut R,
    ) -> FeatureRound {
        let mut board = FeatureBoard::new(golden.width(), golden.height());
        let mut queue = VecDeque::new();

        // Reveal every square before anything interacts
        let mut reveals = Vec::with_capacity(golden.len());
        for position in golden.iter() {
            let outcome = self.reveal(&board, ctx, rng);
            board.place(position, outcome.into());
            if outcome.is_collector() {
                queue.push_back(position);
            }
            reveals.push(Reveal { position, outcome });
        }

        let mut clover_applications = Vec::new();
        for reveal in &reveals {
            if let RevealOutcome::Clover { multiplier } = reveal.outcome {
                clover_applications.extend(board.apply_clover(reveal.position, multiplier));
            }
        }

        let mut collections = Vec::new();
        while let Some(collector) = queue.pop_front() {
            if collections.len() >= self.config.max_activations {
                log::warn!(
                    "Collector activation cap {} reached, {} collector(s) left idle",
                    self.config.max_activations,
                    queue.len() + 1
                );
                break;
            }
            if !matches!(board.get(collector), Some(BoardCell::Collector { full: false, .. })) {
                continue;
            }
            collections.push(self.activate(&mut board, collector, ctx, rng, &mut queue));
        }

        let collected = if collections.is_empty() {
            board.coin_total()
        } else {
            board.full_collector_total()
        };
        let capped = collected > self.config.round_cap;
        if capped {
            log::warn!(
                "Feature round collected {collected:.2}x, capped at {:.2}x",
                self.config.round_cap
            );
        }

        FeatureRound {
            index,
            reveals,
            clover_applications,
            collections,
            collected,
            total: collected.min(self.config.round_cap),
            capped,
        }
    }

    /// Absorb the board into `collector`, then re-reveal the freed cells
    fn activate<R: RandomSource + ?Sized>(
        &self,
        board: &mut FeatureBoard,
        collector: Position,
        ctx: FeatureContext,
        rng: &mut R,
        queue: &mut VecDeque<Position>,
    ) -> CollectionStep {
        let absorbed = board.absorb_all(collector);
        let absorbed_total: f64 = absorbed.iter().map(|a| a.value).sum();
        let multiplier = self.config.collector_base_value;
        let value = absorbed_total * multiplier;
        board.place(collector, BoardCell::Collector { value, full: true });

        let mut re_reveals = Vec::with_capacity(absorbed.len());
        for freed in &absorbed {
            let outcome = self.reveal(board, ctx, rng);
            board.place(freed.position, outcome.into());
            if outcome.is_collector() {
                queue.push_back(freed.position);
            }
            re_reveals.push(Reveal {
                position: freed.position,
                outcome,
            });
        }

        let mut clover_applications = Vec::new();
        for reveal in &re_reveals {
            if let RevealOutcome::Clover { multiplier } = reveal.outcome {
                clover_applications.extend(board.apply_clover(reveal.position, multiplier));
            }
        }

        log::debug!(
            "Collector at {collector} absorbed {} cell(s) worth {absorbed_total:.2}x",
            absorbed.len()
        );

        CollectionStep {
            collector,
            absorbed,
            absorbed_total,
            multiplier,
            value,
            re_reveals,
            clover_applications,
        }
    }
}
