//! Execution result types.
//!
//! Bitstring ordering: the rightmost character is classical bit 0. The
//! string `"01"` means clbit 0 read `1` and clbit 1 read `0`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Measurement counts from circuit execution.
///
/// Serialises as a plain JSON object, bitstrings in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts {
    counts: BTreeMap<String, u64>,
}

impl Counts {
    /// Create empty counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create counts from (bitstring, count) pairs; duplicates accumulate.
    pub fn from_pairs(iter: impl IntoIterator<Item = (impl Into<String>, u64)>) -> Self {
        let mut counts = Self::new();
        for (k, v) in iter {
            counts.insert(k, v);
        }
        counts
    }

    /// Add `count` observations of a bitstring.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.counts.entry(bitstring.into()).or_default() += count;
    }

    /// Get the count for a bitstring.
    pub fn get(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Iterate over (bitstring, count) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.counts.iter()
    }

    /// Total number of observations.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Most frequent bitstring; ties resolve to the lexicographically first.
    pub fn most_frequent(&self) -> Option<(&String, &u64)> {
        self.counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
    }

    /// Number of distinct bitstrings.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Result of circuit execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement counts.
    pub counts: Counts,
    /// Number of shots executed.
    pub shots: u32,
    /// Execution time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl ExecutionResult {
    /// Create a new execution result.
    pub fn new(counts: Counts, shots: u32) -> Self {
        Self {
            counts,
            shots,
            execution_time_ms: None,
        }
    }

    /// Set the execution time.
    pub fn with_execution_time(mut self, time_ms: u64) -> Self {
        self.execution_time_ms = Some(time_ms);
        self
    }
}

/// Quasi-probability distribution over integer outcome indices, as
/// reported by runtime sampler primitives. Values may be slightly negative
/// after error mitigation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuasiDistribution {
    probabilities: BTreeMap<u64, f64>,
}

impl QuasiDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add probability mass to an outcome.
    pub fn insert(&mut self, outcome: u64, probability: f64) {
        *self.probabilities.entry(outcome).or_default() += probability;
    }

    /// Iterate over (outcome, probability) pairs in outcome order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.probabilities.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

impl FromIterator<(u64, f64)> for QuasiDistribution {
    fn from_iter<I: IntoIterator<Item = (u64, f64)>>(iter: I) -> Self {
        let mut dist = Self::new();
        for (k, v) in iter {
            dist.insert(k, v);
        }
        dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_basic() {
        let mut counts = Counts::new();
        counts.insert("00", 500);
        counts.insert("11", 400);
        counts.insert("11", 100);

        assert_eq!(counts.get("00"), 500);
        assert_eq!(counts.get("11"), 500);
        assert_eq!(counts.get("01"), 0);
        assert_eq!(counts.total(), 1000);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_counts_most_frequent() {
        let counts = Counts::from_pairs([("00", 100), ("11", 900)]);
        let (most, count) = counts.most_frequent().unwrap();
        assert_eq!(most, "11");
        assert_eq!(*count, 900);

        let tie = Counts::from_pairs([("10", 5), ("01", 5)]);
        assert_eq!(tie.most_frequent().unwrap().0, "01");
    }

    #[test]
    fn test_counts_serialize_as_object() {
        let counts = Counts::from_pairs([("11", 3), ("00", 1)]);
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"00":1,"11":3}"#);
    }

    #[test]
    fn test_execution_result() {
        let counts = Counts::from_pairs([("00", 500), ("11", 500)]);
        let result = ExecutionResult::new(counts, 1000).with_execution_time(42);
        assert_eq!(result.shots, 1000);
        assert_eq!(result.execution_time_ms, Some(42));
        assert_eq!(result.counts.total(), 1000);
    }

    #[test]
    fn test_quasi_distribution_accumulates() {
        let dist: QuasiDistribution = [(3, 0.25), (0, 0.5), (3, 0.25)].into_iter().collect();
        let pairs: Vec<_> = dist.iter().collect();
        assert_eq!(pairs, vec![(0, 0.5), (3, 0.5)]);
    }
}
