use anyhow::{anyhow, bail, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::cdf::distinct_values;
use crate::dice::Distribution;
use crate::verify::dominance::count_beats;

const MAX_MAGNITUDE: f64 = (1u64 << 53) as f64;

/// Integer-valued dice produced by [`Normalizer`], together with the linear
/// map `v -> factor * v + offset` applied before truncation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDice {
    pub factor: f64,
    pub offset: f64,
    pub dice: Vec<Vec<i64>>,
}

impl NormalizedDice {
    pub fn to_distributions(&self) -> Vec<Distribution> {
        self.dice
            .iter()
            .map(|values| Distribution::from_ints(values))
            .collect()
    }
}

/// Rescales dice so that every value is a positive integer and the smallest
/// value across all dice is 1.
pub struct Normalizer;

impl Normalizer {
    pub fn normalize<D>(dice: &[D], factor: f64) -> Result<NormalizedDice>
    where
        D: AsRef<[f64]>,
    {
        if !factor.is_finite() || factor <= 0.0 {
            bail!("Scale factor must be positive and finite, got {}", factor);
        }
        let scaled: Vec<Vec<f64>> = dice
            .iter()
            .map(|die| die.as_ref().iter().map(|v| factor * v).collect())
            .collect();
        let min_value = scaled
            .iter()
            .flat_map(|die| die.iter().copied())
            .reduce(f64::min)
            .ok_or_else(|| anyhow!("Cannot normalize dice without values"))?;
        let offset = 1.0 - min_value;

        let mut out = Vec::with_capacity(scaled.len());
        for die in scaled {
            let mut values = Vec::with_capacity(die.len());
            for value in die {
                let shifted = value + offset;
                if !shifted.is_finite() || shifted.abs() >= MAX_MAGNITUDE {
                    bail!(
                        "Normalized value {} exceeds the exactly representable integer range",
                        shifted
                    );
                }
                values.push(shifted.trunc() as i64);
            }
            out.push(values);
        }

        Ok(NormalizedDice {
            factor,
            offset,
            dice: out,
        })
    }

    /// True if every ordered pair keeps the side of 1/2 its win probability
    /// was on.
    pub fn preserves_dominance<L, R>(before: &[L], after: &[R]) -> bool
    where
        L: AsRef<[f64]>,
        R: AsRef<[f64]>,
    {
        if before.len() != after.len() {
            return false;
        }
        for i in 0..before.len() {
            for j in 0..before.len() {
                if i == j {
                    continue;
                }
                let old = dominance_sign(before[i].as_ref(), before[j].as_ref());
                let new = dominance_sign(after[i].as_ref(), after[j].as_ref());
                if old != new {
                    return false;
                }
            }
        }
        true
    }

    /// Normalize with `factor`, doubling it until all dominance relations
    /// survive truncation or `max_doublings` is exhausted.
    pub fn normalize_preserving<D>(
        dice: &[D],
        factor: f64,
        max_doublings: usize,
    ) -> Result<NormalizedDice>
    where
        D: AsRef<[f64]>,
    {
        let mut factor = factor;
        for attempt in 0..=max_doublings {
            let normalized = Self::normalize(dice, factor)?;
            let restored = normalized.to_distributions();
            if Self::preserves_dominance(dice, &restored) {
                return Ok(normalized);
            }
            debug!(
                "Normalization with factor {} changed a dominance relation (attempt {})",
                factor,
                attempt + 1
            );
            factor *= 2.0;
        }
        Err(anyhow!(
            "Dominance relations not preserved after {} doublings of the scale factor",
            max_doublings
        ))
    }

    /// A factor for which truncation keeps the order of all distinct values,
    /// so every pairwise probability stays exactly the same.
    pub fn order_preserving_factor<D>(dice: &[D]) -> f64
    where
        D: AsRef<[f64]>,
    {
        let slices: Vec<&[f64]> = dice.iter().map(|die| die.as_ref()).collect();
        let distinct = distinct_values(&slices);
        let min_gap = distinct
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .reduce(f64::min);
        match min_gap {
            Some(gap) if gap > 0.0 => (2.0 / gap).ceil().max(1.0),
            _ => 1.0,
        }
    }
}

fn dominance_sign(x: &[f64], y: &[f64]) -> std::cmp::Ordering {
    let count = count_beats(x, y);
    (2 * count.wins).cmp(&count.total)
}
