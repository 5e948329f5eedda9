//! Weighted tables and the canonical weighted draw

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{CoreError, CoreResult, RandomSource};

/// A single `(value, weight)` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEntry<T> {
    pub value: T,
    pub weight: u32,
}

/// Non-empty list of weighted values
///
/// Used for symbol generation, coin values, clover multipliers and reveal
/// classification, so that all of them share one draw algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedTable<T> {
    entries: Vec<WeightedEntry<T>>,
}

impl<T> WeightedTable<T> {
    /// Create a table, rejecting an empty entry list
    pub fn new(entries: Vec<WeightedEntry<T>>) -> CoreResult<Self> {
        if entries.is_empty() {
            return Err(CoreError::EmptyTable);
        }
        Ok(Self { entries })
    }

    /// One-entry table that always yields `value`
    pub fn single(value: T) -> Self {
        Self {
            entries: vec![WeightedEntry { value, weight: 1 }],
        }
    }

    /// Build from `(value, weight)` pairs
    pub fn from_pairs(pairs: impl IntoIterator<Item = (T, u32)>) -> CoreResult<Self> {
        Self::new(
            pairs
                .into_iter()
                .map(|(value, weight)| WeightedEntry { value, weight })
                .collect(),
        )
    }

    pub fn entries(&self) -> &[WeightedEntry<T>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a constructed table
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all weights
    pub fn total_weight(&self) -> u64 {
        self.entries.iter().map(|e| e.weight as u64).sum()
    }

    /// First entry, the deterministic fallback for misconfigured tables
    pub fn first(&self) -> &T {
        &self.entries[0].value
    }

    /// Draw one value
    ///
    /// Sums all weights, draws an integer in `[0, total - 1]` and subtracts
    /// weights in table order until the remainder goes negative. A table
    /// whose weights sum to zero yields its first entry without drawing.
    pub fn pick<R: RandomSource + ?Sized>(&self, rng: &mut R) -> &T {
        let total = self.total_weight();
        if total == 0 {
            log::warn!("weighted table has zero total weight, using first entry");
            return self.first();
        }

        let mut remaining = rng.next_int(0, total as i64 - 1);
        for entry in &self.entries {
            remaining -= entry.weight as i64;
            if remaining < 0 {
                return &entry.value;
            }
        }
        self.first()
    }

    /// Probability that a draw lands on a value matching `pred`
    pub fn probability_of(&self, pred: impl Fn(&T) -> bool) -> f64 {
        let total = self.total_weight();
        if total == 0 {
            return 0.0;
        }
        let hit: u64 = self
            .entries
            .iter()
            .filter(|e| pred(&e.value))
            .map(|e| e.weight as u64)
            .sum();
        hit as f64 / total as f64
    }
}

impl<T: Clone> WeightedTable<T> {
    /// Copy of this table keeping only values matching `keep`
    ///
    /// Falls back to a full copy if nothing (or no positive weight) would
    /// remain, so the result is always drawable.
    pub fn without(&self, keep: impl Fn(&T) -> bool) -> Self {
        let entries: Vec<WeightedEntry<T>> =
            self.entries.iter().filter(|e| keep(&e.value)).cloned().collect();

        if entries.iter().all(|e| e.weight == 0) {
            log::warn!("filtered weighted table would be empty, keeping original");
            return self.clone();
        }
        Self { entries }
    }
}

impl<T: Serialize> Serialize for WeightedTable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for WeightedTable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<WeightedEntry<T>>::deserialize(deserializer)?;
        Self::new(entries).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ScriptedRandom, SeededRandom};

    fn table() -> WeightedTable<char> {
        WeightedTable::from_pairs([('a', 1), ('b', 2), ('c', 7)]).unwrap()
    }

    #[test]
    fn test_empty_rejected() {
        let result = WeightedTable::<u8>::new(Vec::new());
        assert_eq!(result.unwrap_err(), CoreError::EmptyTable);
    }

    #[test]
    fn test_pick_boundaries() {
        let t = table();
        // Roll 0 -> a, rolls 1..=2 -> b, rolls 3..=9 -> c
        let cases = [(0, 'a'), (1, 'b'), (2, 'b'), (3, 'c'), (9, 'c')];
        for (roll, expected) in cases {
            let mut rng = ScriptedRandom::new(vec![ScriptedRandom::int_draw(roll, 0, 9)]);
            assert_eq!(*t.pick(&mut rng), expected, "roll {roll}");
        }
    }

    #[test]
    fn test_zero_weight_falls_back_without_drawing() {
        let t = WeightedTable::from_pairs([(5u8, 0), (6u8, 0)]).unwrap();
        let mut rng = ScriptedRandom::new(vec![0.99]);
        assert_eq!(*t.pick(&mut rng), 5);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_zero_weight_entries_never_picked() {
        let t = WeightedTable::from_pairs([(1u8, 5), (2u8, 0), (3u8, 5)]).unwrap();
        let mut rng = SeededRandom::new(3);
        for _ in 0..1000 {
            assert_ne!(*t.pick(&mut rng), 2);
        }
    }

    #[test]
    fn test_distribution() {
        let t = table();
        let mut rng = SeededRandom::new(2024);
        let mut counts = [0u32; 3];
        let n = 50_000;
        for _ in 0..n {
            match t.pick(&mut rng) {
                'a' => counts[0] += 1,
                'b' => counts[1] += 1,
                _ => counts[2] += 1,
            }
        }
        approx::assert_abs_diff_eq!(counts[0] as f64 / n as f64, 0.1, epsilon = 0.01);
        approx::assert_abs_diff_eq!(counts[1] as f64 / n as f64, 0.2, epsilon = 0.01);
        approx::assert_abs_diff_eq!(counts[2] as f64 / n as f64, 0.7, epsilon = 0.01);
    }

    #[test]
    fn test_without() {
        let t = table().without(|&v| v != 'c');
        assert_eq!(t.len(), 2);
        assert_eq!(t.total_weight(), 3);

        // Filtering everything out keeps the original
        let all = table().without(|_| false);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_probability_of() {
        approx::assert_abs_diff_eq!(table().probability_of(|&v| v == 'b'), 0.2);
    }

    #[test]
    fn test_serde_rejects_empty() {
        let ok: WeightedTable<u8> =
            serde_json::from_str(r#"[{"value": 1, "weight": 3}]"#).unwrap();
        assert_eq!(ok.total_weight(), 3);

        let err = serde_json::from_str::<WeightedTable<u8>>("[]");
        assert!(err.is_err());
    }
}
