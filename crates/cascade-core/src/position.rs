//! Grid positions and position sets

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A cell coordinate; `x` is the column, `y` the row (0 = top)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Flat row-major index
    #[inline]
    pub fn index(&self, width: usize) -> usize {
        self.y * width + self.x
    }

    /// Inverse of [`index`](Self::index)
    #[inline]
    pub fn from_index(index: usize, width: usize) -> Self {
        Self {
            x: index % width,
            y: index / width,
        }
    }

    /// Orthogonal neighbours inside a `width` x `height` grid
    pub fn neighbors4(self, width: usize, height: usize) -> impl Iterator<Item = Position> {
        const DIRS: [(isize, isize); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];
        DIRS.into_iter()
            .filter_map(move |(dx, dy)| self.offset(dx, dy, width, height))
    }

    /// Moore neighbourhood (8 surrounding cells) inside the grid
    pub fn neighbors8(self, width: usize, height: usize) -> impl Iterator<Item = Position> {
        const DIRS: [(isize, isize); 8] = [
            (-1, -1),
            (0, -1),
            (1, -1),
            (-1, 0),
            (1, 0),
            (-1, 1),
            (0, 1),
            (1, 1),
        ];
        DIRS.into_iter()
            .filter_map(move |(dx, dy)| self.offset(dx, dy, width, height))
    }

    /// True if `other` is one of the 8 surrounding cells
    pub fn is_adjacent8(&self, other: &Position) -> bool {
        self != other && self.x.abs_diff(other.x) <= 1 && self.y.abs_diff(other.y) <= 1
    }

    fn offset(self, dx: isize, dy: isize, width: usize, height: usize) -> Option<Position> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        (x < width && y < height).then_some(Position { x, y })
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Set of positions on a fixed-size grid, stored as a bitset
///
/// Iteration order is row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPositionSet")]
pub struct PositionSet {
    width: usize,
    height: usize,
    bits: Vec<u64>,
}

/// Unchecked wire form of [`PositionSet`]
#[derive(Deserialize)]
struct RawPositionSet {
    width: usize,
    height: usize,
    bits: Vec<u64>,
}

impl TryFrom<RawPositionSet> for PositionSet {
    type Error = CoreError;

    /// One word per 64 cells, no bits past the last cell
    fn try_from(raw: RawPositionSet) -> CoreResult<Self> {
        let mismatch = || CoreError::BitsetMismatch {
            width: raw.width,
            height: raw.height,
        };
        let cells = raw.width.checked_mul(raw.height).ok_or_else(mismatch)?;
        if raw.bits.len() != cells.div_ceil(64) {
            return Err(mismatch());
        }
        let spare = cells % 64;
        if spare != 0 && raw.bits.last().is_some_and(|&w| w >> spare != 0) {
            return Err(mismatch());
        }
        Ok(Self {
            width: raw.width,
            height: raw.height,
            bits: raw.bits,
        })
    }
}

impl PositionSet {
    pub fn new(width: usize, height: usize) -> Self {
        let words = (width * height).div_ceil(64);
        Self {
            width,
            height,
            bits: vec![0; words],
        }
    }

    /// Build from an iterator of positions (out-of-bounds ones are ignored)
    pub fn from_positions(
        width: usize,
        height: usize,
        positions: impl IntoIterator<Item = Position>,
    ) -> Self {
        let mut set = Self::new(width, height);
        set.extend(positions);
        set
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn in_bounds(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Insert a position; returns true if it was newly added
    pub fn insert(&mut self, pos: Position) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        let idx = pos.index(self.width);
        let (word, mask) = (idx / 64, 1u64 << (idx % 64));
        let added = self.bits[word] & mask == 0;
        self.bits[word] |= mask;
        added
    }

    /// Remove a position; returns true if it was present
    pub fn remove(&mut self, pos: Position) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        let idx = pos.index(self.width);
        let (word, mask) = (idx / 64, 1u64 << (idx % 64));
        let present = self.bits[word] & mask != 0;
        self.bits[word] &= !mask;
        present
    }

    pub fn contains(&self, pos: Position) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        let idx = pos.index(self.width);
        self.bits[idx / 64] & (1u64 << (idx % 64)) != 0
    }

    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    pub fn clear(&mut self) {
        self.bits.iter_mut().for_each(|w| *w = 0);
    }

    /// Add every position of `other`
    pub fn union_with(&mut self, other: &PositionSet) {
        for pos in other.iter() {
            self.insert(pos);
        }
    }

    /// Positions in row-major order
    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        let width = self.width;
        let cells = self.width * self.height;
        (0..cells)
            .filter(move |&idx| self.bits[idx / 64] & (1u64 << (idx % 64)) != 0)
            .map(move |idx| Position::from_index(idx, width))
    }

    pub fn to_vec(&self) -> Vec<Position> {
        self.iter().collect()
    }
}

impl Extend<Position> for PositionSet {
    fn extend<I: IntoIterator<Item = Position>>(&mut self, iter: I) {
        for pos in iter {
            self.insert(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_order() {
        let mut positions = vec![
            Position::new(2, 1),
            Position::new(0, 2),
            Position::new(5, 0),
            Position::new(1, 1),
        ];
        positions.sort();
        assert_eq!(
            positions,
            vec![
                Position::new(5, 0),
                Position::new(1, 1),
                Position::new(2, 1),
                Position::new(0, 2),
            ]
        );
    }

    #[test]
    fn test_neighbors_clip_at_edges() {
        let corner = Position::new(0, 0);
        assert_eq!(corner.neighbors4(6, 5).count(), 2);
        assert_eq!(corner.neighbors8(6, 5).count(), 3);

        let middle = Position::new(2, 2);
        assert_eq!(middle.neighbors4(6, 5).count(), 4);
        assert_eq!(middle.neighbors8(6, 5).count(), 8);

        let far = Position::new(5, 4);
        assert!(far.neighbors8(6, 5).all(|p| p.x < 6 && p.y < 5));
    }

    #[test]
    fn test_adjacency() {
        let p = Position::new(3, 3);
        assert!(p.is_adjacent8(&Position::new(4, 4)));
        assert!(p.is_adjacent8(&Position::new(3, 2)));
        assert!(!p.is_adjacent8(&p));
        assert!(!p.is_adjacent8(&Position::new(5, 3)));
    }

    #[test]
    fn test_set_operations() {
        let mut set = PositionSet::new(6, 5);
        assert!(set.is_empty());
        assert!(set.insert(Position::new(1, 1)));
        assert!(!set.insert(Position::new(1, 1)));
        assert!(set.insert(Position::new(5, 4)));
        assert!(!set.insert(Position::new(6, 0)));
        assert_eq!(set.len(), 2);
        assert!(set.contains(Position::new(5, 4)));

        assert!(set.remove(Position::new(1, 1)));
        assert!(!set.remove(Position::new(1, 1)));
        assert_eq!(set.to_vec(), vec![Position::new(5, 4)]);

        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_set_spans_multiple_words() {
        // 10x10 = 100 cells, two u64 words
        let mut set = PositionSet::new(10, 10);
        set.extend([Position::new(9, 9), Position::new(0, 0), Position::new(3, 7)]);
        assert_eq!(
            set.to_vec(),
            vec![Position::new(0, 0), Position::new(3, 7), Position::new(9, 9)]
        );

        let mut other = PositionSet::new(10, 10);
        other.insert(Position::new(4, 4));
        set.union_with(&other);
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_serde_rejects_bits_outside_grid() {
        let set = PositionSet::from_positions(6, 5, [Position::new(2, 3)]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(serde_json::from_str::<PositionSet>(&json).unwrap(), set);

        for bad in [
            // 100 cells need two words
            r#"{"width":10,"height":10,"bits":[1]}"#,
            r#"{"width":6,"height":5,"bits":[0,0]}"#,
            // bit 30 is past the 30th cell
            r#"{"width":6,"height":5,"bits":[1073741824]}"#,
        ] {
            assert!(serde_json::from_str::<PositionSet>(bad).is_err(), "{bad}");
        }
    }
}
