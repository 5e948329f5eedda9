//! Symbol grid

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, Position};

/// Symbol identifier as stored in the grid
pub type SymbolId = u8;

/// The transient "no symbol" id, only present mid-cascade
pub const EMPTY: SymbolId = 0;

/// Fixed-size grid of symbol ids, row 0 at the top
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<SymbolId>,
}

impl Grid {
    /// Create an all-empty grid
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![EMPTY; width * height],
        }
    }

    /// Create from rows (top to bottom)
    pub fn from_rows(rows: &[Vec<SymbolId>]) -> CoreResult<Self> {
        let height = rows.len();
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        if rows.iter().any(|r| r.len() != width) {
            return Err(CoreError::CellCountMismatch {
                expected: width * height,
                actual: rows.iter().map(|r| r.len()).sum(),
            });
        }
        Ok(Self {
            width,
            height,
            cells: rows.concat(),
        })
    }

    /// Create from a flat row-major cell list
    pub fn from_cells(width: usize, height: usize, cells: Vec<SymbolId>) -> CoreResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        if cells.len() != width * height {
            return Err(CoreError::CellCountMismatch {
                expected: width * height,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major cells
    pub fn cells(&self) -> &[SymbolId] {
        &self.cells
    }

    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Symbol at `pos` (`EMPTY` when out of bounds)
    #[inline]
    pub fn get(&self, pos: Position) -> SymbolId {
        if self.contains(pos) {
            self.cells[pos.index(self.width)]
        } else {
            EMPTY
        }
    }

    /// Overwrite the symbol at `pos` (ignored when out of bounds)
    #[inline]
    pub fn set(&mut self, pos: Position, id: SymbolId) {
        if self.contains(pos) {
            let idx = pos.index(self.width);
            self.cells[idx] = id;
        }
    }

    /// Reset every cell to `EMPTY`
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = EMPTY);
    }

    /// All positions in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> + use<> {
        let width = self.width;
        (0..self.width * self.height).map(move |idx| Position::from_index(idx, width))
    }

    /// Column `x`, top to bottom
    pub fn column(&self, x: usize) -> Vec<SymbolId> {
        (0..self.height)
            .map(|y| self.get(Position::new(x, y)))
            .collect()
    }

    /// Rows, top to bottom
    pub fn rows(&self) -> Vec<Vec<SymbolId>> {
        self.cells.chunks(self.width).map(|r| r.to_vec()).collect()
    }

    /// Number of cells holding `id`
    pub fn count(&self, id: SymbolId) -> usize {
        self.cells.iter().filter(|&&c| c == id).count()
    }

    /// Row-major positions holding `id`
    pub fn positions_of(&self, id: SymbolId) -> Vec<Position> {
        self.positions().filter(|&p| self.get(p) == id).collect()
    }

    /// True when no cell is `EMPTY`
    pub fn is_settled(&self) -> bool {
        !self.cells.contains(&EMPTY)
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.chunks(self.width) {
            let line: Vec<String> = row.iter().map(|c| format!("{c:>2}")).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
