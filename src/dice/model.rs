use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::verify::dominance::DominanceMatrix;

/// Finite multiset of real-valued outcomes, i.e. the faces of a fair die.
///
/// Only multiplicities matter to the algorithms in this crate; the stored
/// order is kept so that printed dice look the way they were entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Distribution {
    values: Vec<f64>,
}

impl Distribution {
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if let Some(position) = values.iter().position(|v| !v.is_finite()) {
            return Err(anyhow!(
                "Distribution value at position {} is not finite: {}",
                position,
                values[position]
            ));
        }
        Ok(Self { values })
    }

    pub fn from_ints(values: &[i64]) -> Self {
        Self {
            values: values.iter().map(|&v| v as f64).collect(),
        }
    }

    /// Replicate three level values `low`, `middle`, `high` by their counts.
    pub fn from_levels(levels: [(f64, usize); 3]) -> Self {
        let total = levels.iter().map(|(_, count)| count).sum();
        let mut values = Vec::with_capacity(total);
        for (value, count) in levels {
            values.extend(std::iter::repeat(value).take(count));
        }
        Self { values }
    }

    /// Outcome distribution of a tuple of dice rolled together, where the
    /// result is the sum of the single faces.
    pub fn sum_of(dice: &[Distribution]) -> Result<Self> {
        if dice.is_empty() {
            return Err(anyhow!("Cannot sum an empty tuple of dice"));
        }
        let mut sums = vec![0.0];
        for die in dice {
            if die.is_empty() {
                return Err(anyhow!("Cannot sum a die without faces"));
            }
            let mut next = Vec::with_capacity(sums.len() * die.len());
            for partial in &sums {
                for face in die.iter() {
                    next.push(partial + face);
                }
            }
            sums = next;
        }
        Ok(Self { values: sums })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn min_value(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Values in ascending order.
    pub fn sorted(&self) -> Vec<f64> {
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        sorted
    }

    /// Replace every value `v` by `factor * v + offset`.
    pub fn mul_add(&self, factor: f64, offset: f64) -> Self {
        Self {
            values: self.values.iter().map(|v| factor * v + offset).collect(),
        }
    }

    pub fn is_integral(&self) -> bool {
        self.values.iter().all(|v| v.fract() == 0.0)
    }
}

impl Deref for Distribution {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl AsRef<[f64]> for Distribution {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

impl TryFrom<Vec<f64>> for Distribution {
    type Error = anyhow::Error;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::new(values)
    }
}

impl From<Distribution> for Vec<f64> {
    fn from(distribution: Distribution) -> Self {
        distribution.values
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, value) in self.values.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            if value.fract() == 0.0 {
                write!(f, "{}", value)?;
            } else {
                write!(f, "{:.3}", value)?;
            }
        }
        write!(f, "]")
    }
}

/// Named, ordered set of dice. The dominance matrix is computed on first use
/// and shared afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiceSet {
    pub name: String,
    dice: Vec<Distribution>,
    #[serde(skip)]
    matrix: OnceCell<Arc<DominanceMatrix>>,
}

impl DiceSet {
    pub fn new(name: impl Into<String>, dice: Vec<Distribution>) -> Self {
        Self {
            name: name.into(),
            dice,
            matrix: OnceCell::new(),
        }
    }

    pub fn from_int_rows(name: impl Into<String>, rows: &[&[i64]]) -> Self {
        let dice = rows.iter().map(|row| Distribution::from_ints(row)).collect();
        Self::new(name, dice)
    }

    pub fn len(&self) -> usize {
        self.dice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    pub fn dice(&self) -> &[Distribution] {
        &self.dice
    }

    pub fn get(&self, index: usize) -> Option<&Distribution> {
        self.dice.get(index)
    }

    pub fn into_dice(self) -> Vec<Distribution> {
        self.dice
    }

    pub fn min_value(&self) -> Option<f64> {
        self.dice.iter().filter_map(Distribution::min_value).reduce(f64::min)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.dice.iter().filter_map(Distribution::max_value).reduce(f64::max)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Apply `v -> factor * v + offset` to every face of every die.
    pub fn mul_add(&self, factor: f64, offset: f64) -> Self {
        let dice = self
            .dice
            .iter()
            .map(|die| die.mul_add(factor, offset))
            .collect();
        Self::new(self.name.clone(), dice)
    }

    pub fn dominance_matrix(&self) -> Arc<DominanceMatrix> {
        Arc::clone(
            self.matrix
                .get_or_init(|| Arc::new(DominanceMatrix::compute(&self.dice))),
        )
    }

    /// P(D_from beats D_to), served from the cached matrix.
    pub fn probability(&self, from: usize, to: usize) -> Option<f64> {
        let matrix = self.dominance_matrix();
        matrix.get(from, to)
    }
}

impl fmt::Display for DiceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        for (idx, die) in self.dice.iter().enumerate() {
            writeln!(f, " D{:02}: {}", idx, die)?;
        }
        Ok(())
    }
}

/// Sequence of die indices into a [`DiceSet`]. A path is closed when it ends
/// where it started, e.g. `0 1 2 3 0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DicePath(Vec<usize>);

impl DicePath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// Path `0, 1, ..., count - 1` followed by `0`.
    pub fn closed_sequence(count: usize) -> Self {
        let mut indices: Vec<usize> = (0..count).collect();
        if count > 0 {
            indices.push(0);
        }
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.0.len() > 1 && self.0.first() == self.0.last()
    }

    /// Consecutive `(from, to)` index pairs along the path.
    pub fn steps(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Distinct dice visited in path order; the closing index is not repeated.
    pub fn visited(&self) -> &[usize] {
        if self.is_closed() {
            &self.0[..self.0.len() - 1]
        } else {
            &self.0
        }
    }

    pub fn max_index(&self) -> Option<usize> {
        self.0.iter().copied().max()
    }
}

impl fmt::Display for DicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, die) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", die)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_values() {
        assert!(Distribution::new(vec![1.0, f64::NAN]).is_err());
        assert!(Distribution::new(vec![f64::INFINITY]).is_err());
        assert!(Distribution::new(vec![1.0, 2.5]).is_ok());
    }

    #[test]
    fn sum_of_enumerates_every_combination() {
        let a = Distribution::from_ints(&[1, 2]);
        let b = Distribution::from_ints(&[10, 20, 30]);
        let sum = Distribution::sum_of(&[a, b]).expect("sum");
        assert_eq!(sum.len(), 6);
        assert_eq!(sum.sorted(), vec![11.0, 12.0, 21.0, 22.0, 31.0, 32.0]);
    }

    #[test]
    fn levels_are_replicated_in_order() {
        let c = Distribution::from_levels([(-1.0, 2), (0.5, 1), (7.0, 2)]);
        assert_eq!(c.values(), &[-1.0, -1.0, 0.5, 7.0, 7.0]);
    }

    #[test]
    fn deserializes_from_plain_array() {
        let die: Distribution = serde_json::from_str("[3, 3, 8.5]").expect("parse");
        assert_eq!(die.values(), &[3.0, 3.0, 8.5]);
        assert_eq!(die.to_string(), "[3, 3, 8.500]");
    }

    #[test]
    fn path_steps_and_visited() {
        let path = DicePath::new(vec![0, 2, 1, 0]);
        assert!(path.is_closed());
        assert_eq!(path.visited(), &[0, 2, 1]);
        let steps: Vec<_> = path.steps().collect();
        assert_eq!(steps, vec![(0, 2), (2, 1), (1, 0)]);
        assert_eq!(path.to_string(), "0 2 1 0");
        assert!(!DicePath::new(vec![0, 1]).is_closed());
    }
}
