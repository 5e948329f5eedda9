//! Grid generation, gravity and refill
//!
//! The trigger symbol is a singleton: after generation and after every
//! refill at most one instance may remain on the grid.

use cascade_core::{EMPTY, Grid, Position, PositionSet, RandomSource, SymbolId, WeightedTable};
use serde::{Deserialize, Serialize};

use crate::symbols::{SymbolCatalog, SymbolKind};

/// One cell moved down by gravity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMove {
    pub column: usize,
    pub from_row: usize,
    pub to_row: usize,
    pub symbol: SymbolId,
}

/// One freshly drawn cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refill {
    pub position: Position,
    pub symbol: SymbolId,
}

/// Everything that changed during one cascade, for animation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeMoves {
    /// Positions cleared before gravity, row-major
    pub removed: Vec<Position>,
    /// Cells that fell, column by column
    pub moves: Vec<CellMove>,
    /// Cells drawn into the freed space, row-major
    pub refills: Vec<Refill>,
    /// Extra trigger symbols rerolled by the singleton rule
    pub rerolled: Vec<Refill>,
}

/// Compact every column so non-empty cells rest at the bottom
///
/// Relative order inside a column is preserved; nothing ever crosses into
/// another column.
pub fn apply_gravity(grid: &mut Grid) -> Vec<CellMove> {
    let mut moves = Vec::new();

    for x in 0..grid.width() {
        let mut write = grid.height();
        for y in (0..grid.height()).rev() {
            let from = Position::new(x, y);
            let symbol = grid.get(from);
            if symbol == EMPTY {
                continue;
            }
            write -= 1;
            if write != y {
                grid.set(Position::new(x, write), symbol);
                grid.set(from, EMPTY);
                moves.push(CellMove {
                    column: x,
                    from_row: y,
                    to_row: write,
                    symbol,
                });
            }
        }
    }

    moves
}

/// Weighted symbol source for one game mode
#[derive(Debug, Clone)]
pub struct SymbolGenerator {
    table: WeightedTable<SymbolId>,
    no_trigger: WeightedTable<SymbolId>,
    trigger_ids: Vec<SymbolId>,
    regular_ids: Vec<SymbolId>,
}

impl SymbolGenerator {
    pub fn new(table: WeightedTable<SymbolId>, symbols: &SymbolCatalog) -> Self {
        let no_trigger = table.without(|&id| symbols.kind(id) != Some(SymbolKind::Trigger));
        Self {
            table,
            no_trigger,
            trigger_ids: symbols.ids_of(SymbolKind::Trigger),
            regular_ids: symbols.regular_ids(),
        }
    }

    pub fn table(&self) -> &WeightedTable<SymbolId> {
        &self.table
    }

    fn is_trigger(&self, id: SymbolId) -> bool {
        self.trigger_ids.contains(&id)
    }

    /// Draw one symbol; triggers only when `allow_trigger`
    pub fn draw<R: RandomSource + ?Sized>(&self, rng: &mut R, allow_trigger: bool) -> SymbolId {
        if allow_trigger {
            *self.table.pick(rng)
        } else {
            *self.no_trigger.pick(rng)
        }
    }

    /// Fill a fresh grid cell by cell, then apply the singleton rule
    pub fn generate<R: RandomSource + ?Sized>(
        &self,
        width: usize,
        height: usize,
        rng: &mut R,
    ) -> Grid {
        let mut grid = Grid::new(width, height);
        for pos in grid.positions() {
            grid.set(pos, self.draw(rng, true));
        }
        self.enforce_trigger_singleton(&mut grid, rng);
        grid
    }

    /// Positions holding a trigger symbol, row-major
    pub fn trigger_positions(&self, grid: &Grid) -> Vec<Position> {
        grid.positions().filter(|&p| self.is_trigger(grid.get(p))).collect()
    }

    pub fn has_trigger(&self, grid: &Grid) -> bool {
        grid.cells().iter().any(|&id| self.is_trigger(id))
    }

    /// Keep one randomly chosen trigger and reroll the rest
    pub fn enforce_trigger_singleton<R: RandomSource + ?Sized>(
        &self,
        grid: &mut Grid,
        rng: &mut R,
    ) -> Vec<Refill> {
        let triggers = self.trigger_positions(grid);
        if triggers.len() <= 1 {
            return Vec::new();
        }

        let keep = rng.next_int(0, triggers.len() as i64 - 1) as usize;
        let mut rerolled = Vec::with_capacity(triggers.len() - 1);
        for (i, position) in triggers.into_iter().enumerate() {
            if i == keep {
                continue;
            }
            let symbol = self.draw(rng, false);
            grid.set(position, symbol);
            rerolled.push(Refill { position, symbol });
        }

        log::debug!("Singleton rule rerolled {} trigger symbols", rerolled.len());
        rerolled
    }

    /// Place a trigger on a random regular cell if the grid has none
    pub fn force_trigger<R: RandomSource + ?Sized>(
        &self,
        grid: &mut Grid,
        rng: &mut R,
    ) -> Option<Position> {
        let trigger = *self.trigger_ids.first()?;
        if self.has_trigger(grid) {
            return None;
        }

        let eligible: Vec<Position> = grid
            .positions()
            .filter(|&p| self.regular_ids.contains(&grid.get(p)))
            .collect();
        if eligible.is_empty() {
            return None;
        }

        let position = eligible[rng.next_int(0, eligible.len() as i64 - 1) as usize];
        grid.set(position, trigger);
        Some(position)
    }

    /// Fill every empty cell top-down, row-major
    ///
    /// A trigger may be drawn only while the grid holds none, tracked as the
    /// fill proceeds.
    pub fn refill<R: RandomSource + ?Sized>(&self, grid: &mut Grid, rng: &mut R) -> Vec<Refill> {
        let mut trigger_present = self.has_trigger(grid);
        let mut refills = Vec::new();

        for position in grid.positions() {
            if grid.get(position) != EMPTY {
                continue;
            }
            let symbol = self.draw(rng, !trigger_present);
            trigger_present |= self.is_trigger(symbol);
            grid.set(position, symbol);
            refills.push(Refill { position, symbol });
        }

        refills
    }

    /// Remove positions, apply gravity, refill, re-enforce the singleton rule
    pub fn execute_cascade<R: RandomSource + ?Sized>(
        &self,
        grid: &mut Grid,
        remove: &PositionSet,
        rng: &mut R,
    ) -> CascadeMoves {
        let removed = remove.to_vec();
        for &pos in &removed {
            grid.set(pos, EMPTY);
        }

        let moves = apply_gravity(grid);
        let refills = self.refill(grid, rng);
        let rerolled = self.enforce_trigger_singleton(grid, rng);

        CascadeMoves {
            removed,
            moves,
            refills,
            rerolled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::{ScriptedRandom, SeededRandom};

    const R: SymbolId = 11;

    fn generator() -> SymbolGenerator {
        let symbols = SymbolCatalog::standard();
        let table = WeightedTable::from_pairs((1..=11).map(|id| (id, 10))).unwrap();
        SymbolGenerator::new(table, &symbols)
    }

    fn assert_columns_packed(grid: &Grid) {
        for x in 0..grid.width() {
            let column = grid.column(x);
            let first = column.iter().position(|&c| c != EMPTY).unwrap_or(column.len());
            assert!(column[first..].iter().all(|&c| c != EMPTY), "column {x}: {column:?}");
        }
    }

    #[test]
    fn test_gravity_preserves_order() {
        let mut grid = Grid::from_rows(&[
            vec![1, 0, 3],
            vec![0, 0, 4],
            vec![2, 7, 0],
            vec![0, 8, 5],
        ])
        .unwrap();
        let moves = apply_gravity(&mut grid);

        assert_eq!(grid.column(0), vec![0, 0, 1, 2]);
        assert_eq!(grid.column(1), vec![0, 0, 7, 8]);
        assert_eq!(grid.column(2), vec![0, 3, 4, 5]);
        assert_columns_packed(&grid);
        assert!(moves.iter().all(|m| m.to_row > m.from_row));
    }

    #[test]
    fn test_gravity_full_and_empty_columns() {
        let mut grid = Grid::from_rows(&[vec![1, 0], vec![2, 0], vec![3, 0]]).unwrap();
        let moves = apply_gravity(&mut grid);
        assert!(moves.is_empty());
        assert_eq!(grid.column(0), vec![1, 2, 3]);
        assert_eq!(grid.column(1), vec![0, 0, 0]);
    }

    #[test]
    fn test_gravity_random_grids() {
        let mut rng = SeededRandom::new(11);
        for _ in 0..500 {
            let cells: Vec<SymbolId> = (0..30).map(|_| rng.next_int(0, 3) as SymbolId).collect();
            let mut grid = Grid::from_cells(6, 5, cells).unwrap();
            let before: Vec<Vec<SymbolId>> = (0..6)
                .map(|x| grid.column(x).into_iter().filter(|&c| c != EMPTY).collect())
                .collect();

            apply_gravity(&mut grid);
            assert_columns_packed(&grid);
            for (x, expected) in before.iter().enumerate() {
                let after: Vec<SymbolId> =
                    grid.column(x).into_iter().filter(|&c| c != EMPTY).collect();
                assert_eq!(&after, expected);
            }
        }
    }

    #[test]
    fn test_cascade_refills_everything() {
        let source = generator();
        let mut rng = SeededRandom::new(5);
        let mut grid = source.generate(6, 5, &mut rng);

        let remove = PositionSet::from_positions(
            6,
            5,
            [Position::new(0, 4), Position::new(0, 3), Position::new(3, 0)],
        );
        let moves = source.execute_cascade(&mut grid, &remove, &mut rng);

        assert!(grid.is_settled());
        assert_eq!(moves.removed.len(), 3);
        assert_eq!(moves.refills.len(), 3);
        assert!(source.trigger_positions(&grid).len() <= 1);
    }

    #[test]
    fn test_cascade_moves_column_down() {
        let source = generator();
        let mut grid = Grid::from_rows(&[vec![1, 2], vec![3, 4], vec![5, 6]]).unwrap();
        let remove = PositionSet::from_positions(2, 3, [Position::new(0, 2)]);
        // Script exhausted -> every draw is the first table entry (TEN)
        let mut rng = ScriptedRandom::default();
        let moves = source.execute_cascade(&mut grid, &remove, &mut rng);

        assert_eq!(grid.column(0), vec![1, 1, 3]);
        assert_eq!(grid.column(1), vec![2, 4, 6]);
        assert_eq!(moves.moves.len(), 2);
        assert_eq!(moves.refills, vec![Refill { position: Position::new(0, 0), symbol: 1 }]);
    }

    #[test]
    fn test_singleton_keeps_exactly_one() {
        let source = generator();
        let mut grid = Grid::from_rows(&[vec![R, 1, R], vec![2, R, 3]]).unwrap();
        // Keep the second trigger, rerolls draw TEN (script exhausted)
        let mut rng = ScriptedRandom::new(vec![ScriptedRandom::int_draw(1, 0, 2)]);
        let rerolled = source.enforce_trigger_singleton(&mut grid, &mut rng);

        assert_eq!(rerolled.len(), 2);
        assert_eq!(source.trigger_positions(&grid), vec![Position::new(2, 0)]);
        assert!(rerolled.iter().all(|r| r.symbol != R));
    }

    #[test]
    fn test_refill_blocks_second_trigger() {
        let symbols = SymbolCatalog::standard();
        let only_triggers = WeightedTable::from_pairs([(R, 100), (1, 1)]).unwrap();
        let source = SymbolGenerator::new(only_triggers, &symbols);

        let mut grid = Grid::new(3, 3);
        let mut rng = SeededRandom::new(8);
        source.refill(&mut grid, &mut rng);

        assert!(grid.is_settled());
        assert!(grid.count(R) <= 1);
    }

    #[test]
    fn test_generation_singleton_random() {
        let source = generator();
        let mut rng = SeededRandom::new(77);
        for _ in 0..300 {
            let grid = source.generate(6, 5, &mut rng);
            assert!(grid.is_settled());
            assert!(grid.count(R) <= 1);
        }
    }

    #[test]
    fn test_force_trigger() {
        let source = generator();
        let mut grid = Grid::from_rows(&[vec![9, 10, 4], vec![9, 9, 10]]).unwrap();
        let mut rng = ScriptedRandom::default();
        let placed = source.force_trigger(&mut grid, &mut rng);

        // Only (2,0) holds a regular symbol
        assert_eq!(placed, Some(Position::new(2, 0)));
        assert_eq!(grid.get(Position::new(2, 0)), R);
        assert_eq!(source.force_trigger(&mut grid, &mut rng), None);
    }
}
