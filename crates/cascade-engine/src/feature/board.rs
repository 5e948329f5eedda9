//! Feature board: the revealed state of every golden square

use cascade_core::Position;
use serde::{Deserialize, Serialize};

use super::types::{Absorbed, CloverApplication, RevealOutcome};

/// Revealed content of one cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoardCell {
    Coin(f64),
    Clover(f64),
    Collector { value: f64, full: bool },
}

impl BoardCell {
    /// Value a clover can boost and a collector can absorb
    pub fn boostable_value(&self) -> Option<f64> {
        match *self {
            Self::Coin(value) => Some(value),
            Self::Collector { value, full: true } => Some(value),
            _ => None,
        }
    }

    fn scale(&mut self, multiplier: f64) {
        match self {
            Self::Coin(value) | Self::Collector { value, full: true } => *value *= multiplier,
            _ => {}
        }
    }
}

impl From<RevealOutcome> for BoardCell {
    fn from(outcome: RevealOutcome) -> Self {
        match outcome {
            RevealOutcome::Coin { value } => Self::Coin(value),
            RevealOutcome::Clover { multiplier } => Self::Clover(multiplier),
            RevealOutcome::Collector => Self::Collector {
                value: 0.0,
                full: false,
            },
        }
    }
}

/// Sparse grid of revealed cells
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBoard {
    width: usize,
    height: usize,
    cells: Vec<Option<BoardCell>>,
}

impl FeatureBoard {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    fn index(&self, pos: Position) -> Option<usize> {
        (pos.x < self.width && pos.y < self.height).then(|| pos.index(self.width))
    }

    pub fn get(&self, pos: Position) -> Option<BoardCell> {
        self.index(pos).and_then(|i| self.cells[i])
    }

    pub fn place(&mut self, pos: Position, cell: BoardCell) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = Some(cell);
        }
    }

    pub fn remove(&mut self, pos: Position) -> Option<BoardCell> {
        self.index(pos).and_then(|i| self.cells[i].take())
    }

    /// Occupied cells in row-major order
    pub fn occupied(&self) -> impl Iterator<Item = (Position, BoardCell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, c)| c.map(|cell| (Position::from_index(i, self.width), cell)))
    }

    /// Collectors on the board, empty or full
    pub fn collector_count(&self) -> usize {
        self.occupied()
            .filter(|(_, c)| matches!(c, BoardCell::Collector { .. }))
            .count()
    }

    /// Multiply every coin and full collector around `clover`
    pub fn apply_clover(&mut self, clover: Position, multiplier: f64) -> Vec<CloverApplication> {
        let mut applications = Vec::new();
        for target in clover.neighbors8(self.width, self.height) {
            let Some(i) = self.index(target) else { continue };
            let Some(cell) = self.cells[i].as_mut() else { continue };
            let Some(before) = cell.boostable_value() else { continue };

            cell.scale(multiplier);
            applications.push(CloverApplication {
                clover,
                target,
                multiplier,
                before,
                after: before * multiplier,
            });
        }
        applications
    }

    /// Take every coin and every full collector except `keep` off the board
    pub fn absorb_all(&mut self, keep: Position) -> Vec<Absorbed> {
        let mut absorbed = Vec::new();
        for i in 0..self.cells.len() {
            let position = Position::from_index(i, self.width);
            if position == keep {
                continue;
            }
            let Some(cell) = self.cells[i] else { continue };
            let Some(value) = cell.boostable_value() else { continue };

            self.cells[i] = None;
            absorbed.push(Absorbed {
                position,
                value,
                from_collector: matches!(cell, BoardCell::Collector { .. }),
            });
        }
        absorbed
    }

    /// Sum of full collector values
    pub fn full_collector_total(&self) -> f64 {
        self.occupied()
            .filter_map(|(_, c)| match c {
                BoardCell::Collector { value, full: true } => Some(value),
                _ => None,
            })
            .sum()
    }

    /// Sum of coin values
    pub fn coin_total(&self) -> f64 {
        self.occupied()
            .filter_map(|(_, c)| match c {
                BoardCell::Coin(value) => Some(value),
                _ => None,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clover_boosts_neighbours_only() {
        let mut board = FeatureBoard::new(4, 4);
        board.place(Position::new(0, 0), BoardCell::Coin(2.0));
        board.place(Position::new(1, 1), BoardCell::Clover(3.0));
        board.place(Position::new(3, 3), BoardCell::Coin(5.0));
        board.place(Position::new(2, 2), BoardCell::Collector { value: 0.0, full: false });

        let applied = board.apply_clover(Position::new(1, 1), 3.0);
        assert_eq!(applied.len(), 1);
        assert_eq!(board.get(Position::new(0, 0)), Some(BoardCell::Coin(6.0)));
        assert_eq!(board.get(Position::new(3, 3)), Some(BoardCell::Coin(5.0)));
    }

    #[test]
    fn test_clover_boosts_full_collector() {
        let mut board = FeatureBoard::new(3, 3);
        board.place(Position::new(1, 0), BoardCell::Collector { value: 10.0, full: true });
        board.apply_clover(Position::new(1, 1), 2.0);
        approx::assert_abs_diff_eq!(board.full_collector_total(), 20.0);
    }

    #[test]
    fn test_absorb_all_skips_keeper_and_clovers() {
        let mut board = FeatureBoard::new(3, 3);
        board.place(Position::new(0, 0), BoardCell::Coin(1.0));
        board.place(Position::new(1, 0), BoardCell::Clover(2.0));
        board.place(Position::new(2, 2), BoardCell::Collector { value: 4.0, full: true });
        board.place(Position::new(1, 1), BoardCell::Collector { value: 0.0, full: false });
        board.place(Position::new(0, 2), BoardCell::Collector { value: 0.0, full: false });

        let absorbed = board.absorb_all(Position::new(1, 1));
        let positions: Vec<Position> = absorbed.iter().map(|a| a.position).collect();
        assert_eq!(positions, vec![Position::new(0, 0), Position::new(2, 2)]);
        assert!(absorbed[1].from_collector);

        assert_eq!(board.collector_count(), 2);
        assert!(board.get(Position::new(1, 0)).is_some());
        approx::assert_abs_diff_eq!(board.coin_total(), 0.0);
    }
}
