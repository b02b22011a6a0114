//! Execution results and their decoding.
//!
//! Bitstring keys hold one character per *measured* classical bit, ordered
//! by ascending classical-bit index from right to left: the rightmost
//! character is the lowest measured classical bit. The string `"01"` from a
//! circuit measuring `c0` and `c1` means `c0 = 1` and `c1 = 0`.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{HalError, HalResult};

/// Measurement counts from circuit execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts {
    counts: FxHashMap<String, u64>,
}

impl Counts {
    /// Create empty counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create counts from (bitstring, count) pairs. Duplicates are summed.
    pub fn from_pairs(iter: impl IntoIterator<Item = (impl Into<String>, u64)>) -> Self {
        let mut counts = Self::new();
        for (k, v) in iter {
            counts.insert(k, v);
        }
        counts
    }

    /// Convert a probability histogram into counts over `shots` samples.
    ///
    /// Uses largest-remainder rounding, so the counts sum to exactly
    /// `shots` whenever the probabilities sum to one. Zero-count entries are
    /// dropped.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn from_probabilities(
        probabilities: impl IntoIterator<Item = (impl Into<String>, f64)>,
        shots: u32,
    ) -> Self {
        let mut entries: Vec<(String, u64, f64)> = probabilities
            .into_iter()
            .map(|(k, p)| {
                let exact = p.clamp(0.0, 1.0) * f64::from(shots);
                let floor = exact.floor();
                (k.into(), floor as u64, exact - floor)
            })
            .collect();

        let assigned: u64 = entries.iter().map(|(_, c, _)| c).sum();
        let total: f64 = entries.iter().map(|(_, c, r)| *c as f64 + r).sum();
        let missing = (total.round() as u64).min(u64::from(shots)).saturating_sub(assigned);

        entries.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
        for entry in entries.iter_mut().take(missing as usize) {
            entry.1 += 1;
        }

        entries
            .into_iter()
            .filter(|(_, c, _)| *c > 0)
            .map(|(k, c, _)| (k, c))
            .collect()
    }

    /// Add `count` occurrences of a bitstring.
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

    /// Sum of all counts.
    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    /// The most frequent bitstring; ties go to the smallest key.
    pub fn most_frequent(&self) -> Option<(&String, &u64)> {
        self.sorted().into_iter().next()
    }

    /// Relative frequency of each bitstring.
    #[allow(clippy::cast_precision_loss)]
    pub fn probabilities(&self) -> FxHashMap<String, f64> {
        let total = self.total_shots() as f64;
        if total == 0.0 {
            return FxHashMap::default();
        }
        self.counts
            .iter()
            .map(|(k, &v)| (k.clone(), v as f64 / total))
            .collect()
    }

    /// Counts by descending frequency, then ascending bitstring.
    pub fn sorted(&self) -> Vec<(&String, &u64)> {
        let mut items: Vec<_> = self.counts.iter().collect();
        items.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        items
    }

    /// Number of distinct bitstrings.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if counts are empty.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut counts = Self::new();
        for (key, value) in iter {
            counts.insert(key, value);
        }
        counts
    }
}

/// Result of circuit execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement counts.
    pub counts: Counts,
    /// Number of shots requested.
    pub shots: u32,
    /// Execution time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    /// Additional backend metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl ExecutionResult {
    /// Create a new execution result.
    pub fn new(counts: Counts, shots: u32) -> Self {
        Self {
            counts,
            shots,
            execution_time_ms: None,
            metadata: serde_json::Value::Null,
        }
    }

    /// Set the execution time.
    #[must_use]
    pub fn with_execution_time(mut self, time_ms: u64) -> Self {
        self.execution_time_ms = Some(time_ms);
        self
    }

    /// Set metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// How strictly [`validate`] treats the shot total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// The counts may sum to fewer than the requested shots.
    #[default]
    Lenient,
    /// The counts must sum to exactly the requested shots.
    Strict,
}

/// Which end of a bitstring holds the most significant bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitOrder {
    /// Leftmost character is the most significant bit, so the lowest
    /// measured classical bit is the least significant.
    MsbFirst,
    /// Leftmost character is the least significant bit.
    LsbFirst,
}

/// Check a result against the request that produced it.
pub fn validate(
    result: &ExecutionResult,
    expected_bit_count: usize,
    expected_shots: u32,
    mode: ValidationMode,
) -> HalResult<()> {
    for key in result.counts.iter().map(|(k, _)| k) {
        if key.chars().count() != expected_bit_count {
            return Err(HalError::MalformedResult {
                expected: format!("{expected_bit_count}-bit keys"),
                observed: format!("key '{key}' with {} character(s)", key.chars().count()),
            });
        }
        if let Some(bad) = key.chars().find(|c| !matches!(c, '0' | '1')) {
            return Err(HalError::MalformedResult {
                expected: "binary keys".to_string(),
                observed: format!("character '{bad}' in key '{key}'"),
            });
        }
    }

    let total = result.counts.total_shots();
    let shots = u64::from(expected_shots);
    if total > shots {
        return Err(HalError::MalformedResult {
            expected: format!("at most {expected_shots} shots"),
            observed: format!("{total} shots"),
        });
    }
    if mode == ValidationMode::Strict && total != shots {
        return Err(HalError::MalformedResult {
            expected: format!("exactly {expected_shots} shots"),
            observed: format!("{total} shots"),
        });
    }
    Ok(())
}

/// Relative frequency of each bitstring, ordered by key.
pub fn to_distribution(result: &ExecutionResult) -> BTreeMap<String, f64> {
    result.counts.probabilities().into_iter().collect()
}

/// Decode a bitstring as an unsigned integer.
pub fn to_integer(bitstring: &str, order: BitOrder) -> HalResult<u64> {
    let len = bitstring.chars().count();
    if len > 64 {
        return Err(HalError::MalformedResult {
            expected: "at most 64 bits".to_string(),
            observed: format!("{len} bits"),
        });
    }

    let bit = |c: char| match c {
        '0' => Ok(0u64),
        '1' => Ok(1u64),
        other => Err(HalError::MalformedResult {
            expected: "binary digits".to_string(),
            observed: format!("character '{other}' in '{bitstring}'"),
        }),
    };

    let mut value = 0u64;
    match order {
        BitOrder::MsbFirst => {
            for c in bitstring.chars() {
                value = (value << 1) | bit(c)?;
            }
        }
        BitOrder::LsbFirst => {
            for (i, c) in bitstring.chars().enumerate() {
                value |= bit(c)? << i;
            }
        }
    }
    Ok(value)
}

/// Decode every key of a result, summing counts per integer.
pub fn to_integer_counts(result: &ExecutionResult, order: BitOrder) -> HalResult<BTreeMap<u64, u64>> {
    let mut decoded = BTreeMap::new();
    for (key, &count) in result.counts.iter() {
        *decoded.entry(to_integer(key, order)?).or_default() += count;
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bell_result() -> ExecutionResult {
        ExecutionResult::new(Counts::from_pairs([("00", 498), ("11", 502)]), 1000)
    }

    #[test]
    fn test_counts_basic() {
        let mut counts = Counts::new();
        counts.insert("00", 500);
        counts.insert("11", 400);
        counts.insert("11", 100);

        assert_eq!(counts.get("11"), 500);
        assert_eq!(counts.get("01"), 0);
        assert_eq!(counts.total_shots(), 1000);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_most_frequent_breaks_ties_by_key() {
        let counts = Counts::from_pairs([("11", 5), ("01", 5), ("00", 1)]);
        let (key, count) = counts.most_frequent().unwrap();
        assert_eq!(key, "01");
        assert_eq!(*count, 5);
        assert_eq!(counts.sorted().last().map(|(k, _)| k.as_str()), Some("00"));
    }

    #[test]
    fn test_from_probabilities_conserves_shots() {
        let counts = Counts::from_probabilities([("00", 0.333), ("01", 0.333), ("11", 0.334)], 1000);
        assert_eq!(counts.total_shots(), 1000);

        let counts = Counts::from_probabilities([("0", 0.5), ("1", 0.5)], 7);
        assert_eq!(counts.total_shots(), 7);

        let counts = Counts::from_probabilities([("0", 1.0), ("1", 0.0)], 10);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get("0"), 10);
    }

    #[test]
    fn test_validate_accepts_partial_total_when_lenient() {
        let result = ExecutionResult::new(Counts::from_pairs([("00", 900)]), 1000);
        assert!(validate(&result, 2, 1000, ValidationMode::Lenient).is_ok());
        assert!(matches!(
            validate(&result, 2, 1000, ValidationMode::Strict),
            Err(HalError::MalformedResult { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_keys() {
        let result = bell_result();
        assert!(validate(&result, 2, 1000, ValidationMode::Strict).is_ok());
        assert!(matches!(
            validate(&result, 3, 1000, ValidationMode::Lenient),
            Err(HalError::MalformedResult { .. })
        ));

        let result = ExecutionResult::new(Counts::from_pairs([("0x", 1)]), 10);
        assert!(validate(&result, 2, 10, ValidationMode::Lenient).is_err());
    }

    #[test]
    fn test_validate_rejects_excess_shots() {
        let result = bell_result();
        let err = validate(&result, 2, 999, ValidationMode::Lenient).unwrap_err();
        assert!(err.to_string().contains("1000 shots"));
    }

    #[test]
    fn test_distribution() {
        let dist = to_distribution(&bell_result());
        assert!((dist["00"] - 0.498).abs() < 1e-12);
        assert!((dist.values().sum::<f64>() - 1.0).abs() < 1e-12);

        let empty = ExecutionResult::new(Counts::new(), 10);
        assert!(to_distribution(&empty).is_empty());
    }

    #[test]
    fn test_to_integer_orders() {
        assert_eq!(to_integer("0110", BitOrder::MsbFirst).unwrap(), 6);
        assert_eq!(to_integer("0110", BitOrder::LsbFirst).unwrap(), 6);
        assert_eq!(to_integer("0001", BitOrder::MsbFirst).unwrap(), 1);
        assert_eq!(to_integer("0001", BitOrder::LsbFirst).unwrap(), 8);
        assert_eq!(to_integer("", BitOrder::MsbFirst).unwrap(), 0);
        assert_eq!(to_integer(&"1".repeat(64), BitOrder::MsbFirst).unwrap(), u64::MAX);
    }

    #[test]
    fn test_to_integer_errors() {
        assert!(to_integer("012", BitOrder::MsbFirst).is_err());
        assert!(to_integer(&"0".repeat(65), BitOrder::LsbFirst).is_err());
    }

    #[test]
    fn test_integer_counts() {
        let result = ExecutionResult::new(Counts::from_pairs([("10", 3), ("01", 2)]), 5);
        let decoded = to_integer_counts(&result, BitOrder::MsbFirst).unwrap();
        assert_eq!(decoded, BTreeMap::from([(1, 2), (2, 3)]));
    }

    proptest! {
        #[test]
        fn prop_from_probabilities_conserves_shots(
            weights in proptest::collection::vec(0.0f64..1.0, 1..16),
            shots in 1u32..100_000,
        ) {
            let total: f64 = weights.iter().sum();
            prop_assume!(total > 0.0);
            let probs = weights
                .iter()
                .enumerate()
                .map(|(i, w)| (format!("{i:04b}"), w / total));

            let counts = Counts::from_probabilities(probs, shots);
            prop_assert_eq!(counts.total_shots(), u64::from(shots));
            prop_assert!(counts.iter().all(|(_, &c)| c > 0));
        }

        #[test]
        fn prop_bit_orders_are_reverses(bits in "[01]{0,64}") {
            let reversed: String = bits.chars().rev().collect();
            prop_assert_eq!(
                to_integer(&bits, BitOrder::MsbFirst).unwrap(),
                to_integer(&reversed, BitOrder::LsbFirst).unwrap()
            );
        }

        #[test]
        fn prop_same_length_keys_decode_distinctly(
            (a, b) in (1usize..=64).prop_flat_map(|n| {
                let key = || proptest::string::string_regex(&format!("[01]{{{n}}}")).unwrap();
                (key(), key())
            }),
        ) {
            prop_assume!(a != b);
            for order in [BitOrder::MsbFirst, BitOrder::LsbFirst] {
                prop_assert_ne!(to_integer(&a, order).unwrap(), to_integer(&b, order).unwrap());
            }
        }
    }
}
