//! Paytable and cluster win detection

use std::collections::VecDeque;

use cascade_core::{Grid, Position, PositionSet, SymbolId};
use serde::{Deserialize, Serialize};

use crate::symbols::{SymbolCatalog, SymbolKind};

/// Minimum connected cells for a winning cluster
pub const MIN_CLUSTER_SIZE: usize = 5;

/// Payout band for a cluster size
///
/// Exact bands for 5, 6, 7 and 8; merged bands for 9-10 and 11-12; one band
/// for 13 and above. Sizes below 5 have no band.
pub fn size_band(size: usize) -> Option<usize> {
    match size {
        0..=4 => None,
        5 => Some(0),
        6 => Some(1),
        7 => Some(2),
        8 => Some(3),
        9 | 10 => Some(4),
        11 | 12 => Some(5),
        _ => Some(6),
    }
}

/// A winning cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Colour the flood fill started from (a wild id for pure-wild clusters)
    pub symbol_id: SymbolId,
    /// Highest-paying symbol present, whose row priced the cluster
    pub paying_symbol_id: SymbolId,
    /// Member positions, row-major
    pub positions: Vec<Position>,
    /// Wild members
    pub wild_count: usize,
    /// Payout in bet multiples
    pub payout: f64,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.positions.len()
    }
}

/// Result of scanning a grid for clusters
#[derive(Debug, Clone, PartialEq)]
pub struct WinResult {
    pub clusters: Vec<Cluster>,
    /// Sum of cluster payouts in bet multiples
    pub total_payout: f64,
    /// Union of all cluster positions
    pub win_positions: PositionSet,
}

impl WinResult {
    pub fn is_win(&self) -> bool {
        !self.clusters.is_empty()
    }
}

/// Scatter count and positions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScatterResult {
    pub count: usize,
    pub positions: Vec<Position>,
}

/// Complete paytable
#[derive(Debug, Clone)]
pub struct PayTable {
    /// Symbol definitions
    pub symbols: SymbolCatalog,
    /// Minimum cluster size
    pub min_cluster_size: usize,
}

impl PayTable {
    pub fn new(symbols: SymbolCatalog) -> Self {
        Self {
            symbols,
            min_cluster_size: MIN_CLUSTER_SIZE,
        }
    }

    /// Create the reference paytable
    pub fn standard() -> Self {
        Self::new(SymbolCatalog::standard())
    }

    fn is_wild(&self, id: SymbolId) -> bool {
        self.symbols.kind(id) == Some(SymbolKind::Wild)
    }

    /// Can a cell holding `neighbor` join a flood fill of `color`?
    fn matches(&self, color: SymbolId, neighbor: SymbolId) -> bool {
        self.symbols.is_cluster_eligible(neighbor) && (neighbor == color || self.is_wild(neighbor))
    }

    /// Find every winning cluster on the grid
    ///
    /// Every unclaimed cluster-eligible cell, in row-major order, roots a
    /// flood fill of its own colour. A wild joins the first winning cluster
    /// that reaches it; a wild root only gathers other wilds. Regions that
    /// fall short of the minimum size release their wilds for later roots.
    pub fn find_wins(&self, grid: &Grid) -> WinResult {
        let width = grid.width();
        let height = grid.height();
        let mut claimed = vec![false; width * height];
        let mut clusters = Vec::new();

        for pos in grid.positions() {
            let id = grid.get(pos);
            if claimed[pos.index(width)] || !self.symbols.is_cluster_eligible(id) {
                continue;
            }

            let region = self.flood(grid, pos, id, &claimed);
            let record = region.len() >= self.min_cluster_size;
            for p in &region {
                if record || !self.is_wild(grid.get(*p)) {
                    claimed[p.index(width)] = true;
                }
            }
            if record {
                clusters.push(self.build_cluster(grid, id, region));
            }
        }

        let total_payout = clusters.iter().map(|c| c.payout).sum();
        let win_positions = PositionSet::from_positions(
            width,
            height,
            clusters.iter().flat_map(|c| c.positions.iter().copied()),
        );

        WinResult {
            clusters,
            total_payout,
            win_positions,
        }
    }

    /// Breadth-first flood over 4-neighbours from `root`
    fn flood(
        &self,
        grid: &Grid,
        root: Position,
        color: SymbolId,
        claimed: &[bool],
    ) -> Vec<Position> {
        let width = grid.width();
        let height = grid.height();
        let mut visited = vec![false; width * height];
        let mut queue = VecDeque::new();
        let mut region = Vec::new();

        visited[root.index(width)] = true;
        queue.push_back(root);

        while let Some(pos) = queue.pop_front() {
            region.push(pos);
            for n in pos.neighbors4(width, height) {
                let idx = n.index(width);
                if visited[idx] || claimed[idx] || !self.matches(color, grid.get(n)) {
                    continue;
                }
                visited[idx] = true;
                queue.push_back(n);
            }
        }

        region.sort();
        region
    }

    fn build_cluster(&self, grid: &Grid, color: SymbolId, positions: Vec<Position>) -> Cluster {
        let wild_count = positions.iter().filter(|p| self.is_wild(grid.get(**p))).count();

        let mut ids: Vec<SymbolId> = positions.iter().map(|p| grid.get(*p)).collect();
        ids.sort_unstable();
        ids.dedup();

        let paying = ids
            .iter()
            .filter_map(|&id| self.symbols.get(id))
            .fold(None, |best: Option<&crate::symbols::Symbol>, s| match best {
                Some(b) if b.rank_pay() >= s.rank_pay() => Some(b),
                _ => Some(s),
            });

        let (paying_symbol_id, payout) = match (paying, size_band(positions.len())) {
            (Some(symbol), Some(band)) => (symbol.id, symbol.pays[band]),
            (Some(symbol), None) => (symbol.id, 0.0),
            (None, _) => (color, 0.0),
        };

        Cluster {
            symbol_id: color,
            paying_symbol_id,
            positions,
            wild_count,
            payout,
        }
    }

    /// Payout for a cluster of `size` priced by `symbol_id`
    pub fn cluster_pay(&self, symbol_id: SymbolId, size: usize) -> f64 {
        match (self.symbols.get(symbol_id), size_band(size)) {
            (Some(symbol), Some(band)) => symbol.pays[band],
            _ => 0.0,
        }
    }

    /// Count scatter symbols anywhere on the grid
    pub fn find_scatters(&self, grid: &Grid) -> ScatterResult {
        let positions: Vec<Position> = grid
            .positions()
            .filter(|&p| self.symbols.kind(grid.get(p)) == Some(SymbolKind::Scatter))
            .collect();

        ScatterResult {
            count: positions.len(),
            positions,
        }
    }
}

impl Default for PayTable {
    fn default() -> Self {
        Self::standard()
    }
}
