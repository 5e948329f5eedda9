//! Symbol catalog

use cascade_core::SymbolId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of cluster-size payout bands: 5, 6, 7, 8, 9-10, 11-12, 13+
pub const PAY_BANDS: usize = 7;

/// Payout row in bet multiples, one value per size band
pub type PayRow = [f64; PAY_BANDS];

/// Symbol type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// Regular paying symbol
    Regular,
    /// Wild - joins clusters of any regular colour it touches
    Wild,
    /// Scatter - counted anywhere on the grid for free spins
    Scatter,
    /// Trigger ("rainbow") - at most one on the grid, arms the golden square feature
    Trigger,
}

impl SymbolKind {
    /// Can this symbol be part of a cluster?
    pub fn is_cluster_eligible(&self) -> bool {
        matches!(self, Self::Regular | Self::Wild)
    }
}

/// A symbol definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// Unique symbol ID (never 0)
    pub id: SymbolId,
    /// Display name
    pub name: String,
    /// Symbol type
    pub kind: SymbolKind,
    /// Cluster payout by size band
    #[serde(default)]
    pub pays: PayRow,
}

impl Symbol {
    /// Create a regular symbol
    pub fn regular(id: SymbolId, name: impl Into<String>, pays: PayRow) -> Self {
        Self {
            id,
            name: name.into(),
            kind: SymbolKind::Regular,
            pays,
        }
    }

    /// Create a wild symbol
    pub fn wild(id: SymbolId, name: impl Into<String>, pays: PayRow) -> Self {
        Self {
            id,
            name: name.into(),
            kind: SymbolKind::Wild,
            pays,
        }
    }

    /// Create a scatter symbol
    pub fn scatter(id: SymbolId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: SymbolKind::Scatter,
            pays: [0.0; PAY_BANDS],
        }
    }

    /// Create the trigger symbol
    pub fn trigger(id: SymbolId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: SymbolKind::Trigger,
            pays: [0.0; PAY_BANDS],
        }
    }

    /// Payout used to rank symbols within a cluster (the 5-cluster value)
    pub fn rank_pay(&self) -> f64 {
        self.pays[0]
    }
}

/// Symbol set with O(1) lookup by id
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolCatalog {
    symbols: Vec<Symbol>,
    index: Vec<Option<usize>>,
}

impl SymbolCatalog {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        let mut index = vec![None; 256];
        for (i, symbol) in symbols.iter().enumerate() {
            index[symbol.id as usize] = Some(i);
        }
        Self { symbols, index }
    }

    /// Reference catalog: 8 regular symbols, wild, scatter and rainbow
    pub fn standard() -> Self {
        Self::new(vec![
            // Low paying
            Symbol::regular(1, "TEN", [0.5, 0.75, 1.0, 1.5, 2.5, 5.0, 12.5]),
            Symbol::regular(2, "JACK", [0.5, 0.75, 1.25, 2.0, 3.0, 6.0, 15.0]),
            Symbol::regular(3, "QUEEN", [0.75, 1.0, 1.5, 2.5, 4.0, 7.5, 20.0]),
            Symbol::regular(4, "KING", [1.0, 1.25, 2.0, 3.0, 5.0, 10.0, 25.0]),
            Symbol::regular(5, "ACE", [1.25, 1.5, 2.5, 4.0, 6.0, 12.5, 30.0]),
            // High paying
            Symbol::regular(6, "HORSESHOE", [2.0, 2.5, 4.0, 6.0, 10.0, 20.0, 50.0]),
            Symbol::regular(7, "GOLD_BAR", [2.5, 3.75, 5.0, 7.5, 12.5, 25.0, 75.0]),
            Symbol::regular(8, "CROWN", [5.0, 7.5, 10.0, 15.0, 25.0, 50.0, 125.0]),
            // Special symbols
            Symbol::wild(9, "WILD", [1.5, 2.0, 3.0, 4.5, 7.5, 15.0, 40.0]),
            Symbol::scatter(10, "SCATTER"),
            Symbol::trigger(11, "RAINBOW"),
        ])
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Get symbol by ID
    #[inline]
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.index[id as usize].map(|i| &self.symbols[i])
    }

    #[inline]
    pub fn kind(&self, id: SymbolId) -> Option<SymbolKind> {
        self.get(id).map(|s| s.kind)
    }

    /// Regular or wild
    #[inline]
    pub fn is_cluster_eligible(&self, id: SymbolId) -> bool {
        self.kind(id).is_some_and(|k| k.is_cluster_eligible())
    }

    #[inline]
    pub fn is_regular(&self, id: SymbolId) -> bool {
        self.kind(id) == Some(SymbolKind::Regular)
    }

    /// All regular symbol IDs
    pub fn regular_ids(&self) -> Vec<SymbolId> {
        self.ids_of(SymbolKind::Regular)
    }

    /// First symbol of a kind
    pub fn first_of(&self, kind: SymbolKind) -> Option<SymbolId> {
        self.symbols.iter().find(|s| s.kind == kind).map(|s| s.id)
    }

    pub fn ids_of(&self, kind: SymbolKind) -> Vec<SymbolId> {
        self.symbols
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.id)
            .collect()
    }

    pub fn wild_id(&self) -> Option<SymbolId> {
        self.first_of(SymbolKind::Wild)
    }

    pub fn scatter_id(&self) -> Option<SymbolId> {
        self.first_of(SymbolKind::Scatter)
    }

    pub fn trigger_id(&self) -> Option<SymbolId> {
        self.first_of(SymbolKind::Trigger)
    }
}

impl Default for SymbolCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Serialize for SymbolCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.symbols.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SymbolCatalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Symbol>::deserialize(deserializer).map(Self::new)
    }
}
