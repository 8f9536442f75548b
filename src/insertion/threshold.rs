use std::fmt::Write;

use anyhow::Result;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::cdf::{distinct_values, empirical_cdf, midpoint_thresholds, CdfCurve};
use crate::dice::Distribution;
use crate::insertion::error::{validate, InsertionError};
use crate::verify::dominance::count_beats;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsertionConfig {
    /// Offset of the middle level above the threshold. Clamped to half the
    /// distance between the threshold and the next distinct value.
    pub epsilon: f64,
    /// Distance of the low level below the smallest value of A and B.
    pub low_margin: f64,
    /// Distance of the high level above the largest value of A and B.
    pub high_margin: f64,
}

impl Default for InsertionConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            low_margin: 1.0,
            high_margin: 1.0,
        }
    }
}

impl InsertionConfig {
    /// Every setting must be finite and strictly positive, otherwise L, M0 or
    /// H would leave the open interval it belongs to.
    pub fn validate(&self) -> Result<(), InsertionError> {
        for (field, value) in [
            ("epsilon", self.epsilon),
            ("low_margin", self.low_margin),
            ("high_margin", self.high_margin),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(InsertionError::InvalidConfig { field, value });
            }
        }
        Ok(())
    }
}

/// How many faces of C sit on the low, middle and high level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSplit {
    pub low: usize,
    pub middle: usize,
    pub high: usize,
}

impl LevelSplit {
    pub fn total(&self) -> usize {
        self.low + self.middle + self.high
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Levels {
    pub low: f64,
    pub middle: f64,
    pub high: f64,
}

/// Everything computed for the accepted die C.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertionReport {
    pub threshold: f64,
    /// Largest value of A and B below the threshold.
    pub lower_bracket: f64,
    /// Smallest value of A and B above the threshold.
    pub upper_bracket: f64,
    pub p_a_above: f64,
    pub p_b_at_or_below: f64,
    pub levels: Levels,
    pub split: LevelSplit,
    pub p_ab: f64,
    pub p_ac: f64,
    pub p_cb: f64,
    pub thresholds_scanned: usize,
    pub splits_tried: usize,
}

impl InsertionReport {
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "P(A>B) = {:.3}, P(A>C) = {:.3}, P(C>B) = {:.3}",
            self.p_ab, self.p_ac, self.p_cb
        );
        let _ = writeln!(
            out,
            "t = {:.3}, P(A>t) = {:.3}, P(B<=t) = {:.3}",
            self.threshold, self.p_a_above, self.p_b_at_or_below
        );
        let _ = write!(
            out,
            "L = {}, mL = {}, M0 = {:.3}, mM = {}, H = {}, mH = {}",
            self.levels.low,
            self.split.low,
            self.levels.middle,
            self.split.middle,
            self.levels.high,
            self.split.high
        );
        out
    }
}

#[derive(Debug, Clone)]
pub struct Insertion {
    pub die: Distribution,
    pub report: InsertionReport,
}

impl Insertion {
    /// Integer-valued variant of C, valid whenever the inputs are integers
    /// and the bracket around the threshold leaves room for an integer.
    ///
    /// Every value strictly between the brackets compares the same way
    /// against all faces of A and B, so both probabilities are unchanged.
    pub fn integral(&self) -> Option<Distribution> {
        let report = &self.report;
        let middle = report.lower_bracket + 1.0;
        let integral = [report.levels.low, report.lower_bracket, report.levels.high]
            .iter()
            .all(|v| v.fract() == 0.0);
        if !integral || middle >= report.upper_bracket {
            return None;
        }
        Some(Distribution::from_levels([
            (report.levels.low, report.split.low),
            (middle, report.split.middle),
            (report.levels.high, report.split.high),
        ]))
    }

    /// CDF and survival curves of A, B and the inserted C.
    pub fn curve(&self, a: &[f64], b: &[f64]) -> Result<CdfCurve> {
        CdfCurve::around([("A", a), ("B", b), ("C", self.die.values())])
    }
}

/// Builds a three-level die C with A > C > B from a pair A > B.
///
/// Thresholds between consecutive distinct values of A and B are scanned in
/// ascending order; the first threshold and level split whose C validates
/// is returned.
#[derive(Debug, Clone, Default)]
pub struct ThresholdSearch {
    config: InsertionConfig,
}

impl ThresholdSearch {
    pub fn new(config: InsertionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InsertionConfig {
        &self.config
    }

    pub fn insert(&self, a: &[f64], b: &[f64]) -> Result<Insertion, InsertionError> {
        self.config.validate()?;
        validate(a, "A")?;
        validate(b, "B")?;

        let ab = count_beats(a, b);
        if !ab.dominates() {
            return Err(InsertionError::InvalidInput {
                probability: ab.probability(),
            });
        }

        let size = a.len();
        let distinct = distinct_values(&[a, b]);
        let thresholds = midpoint_thresholds(&distinct);
        let low = distinct[0] - self.config.low_margin;
        let high = distinct[distinct.len() - 1] + self.config.high_margin;
        let mut splits_tried = 0;

        for (idx, &threshold) in thresholds.iter().enumerate() {
            let cdf_a = empirical_cdf(a, threshold);
            let cdf_b = empirical_cdf(b, threshold);
            if cdf_a >= cdf_b {
                continue;
            }

            let p_a_above = 1.0 - cdf_a;
            let p_b_at_or_below = cdf_b;
            let lower_bracket = distinct[idx];
            let upper_bracket = distinct[idx + 1];
            let middle = threshold + self.config.epsilon.min((upper_bracket - threshold) / 2.0);

            for middle_count in 1..size {
                let Some(split) = feasible_split(size, middle_count, p_a_above, p_b_at_or_below)
                else {
                    continue;
                };
                splits_tried += 1;

                let candidate = Distribution::from_levels([
                    (low, split.low),
                    (middle, split.middle),
                    (high, split.high),
                ]);
                let ac = count_beats(a, &candidate);
                let cb = count_beats(&candidate, b);
                if !(ac.dominates() && cb.dominates()) {
                    trace!(
                        "t={:.3} split {:?} rejected: P(A>C)={:.3}, P(C>B)={:.3}",
                        threshold,
                        split,
                        ac.probability(),
                        cb.probability()
                    );
                    continue;
                }

                debug!(
                    "Inserted C at t={:.3} with split {:?} after {} splits",
                    threshold, split, splits_tried
                );
                let report = InsertionReport {
                    threshold,
                    lower_bracket,
                    upper_bracket,
                    p_a_above,
                    p_b_at_or_below,
                    levels: Levels { low, middle, high },
                    split,
                    p_ab: ab.probability(),
                    p_ac: ac.probability(),
                    p_cb: cb.probability(),
                    thresholds_scanned: idx + 1,
                    splits_tried,
                };
                return Ok(Insertion {
                    die: candidate,
                    report,
                });
            }
        }

        debug!(
            "No insertion found after {} thresholds and {} splits",
            thresholds.len(),
            splits_tried
        );
        Err(InsertionError::ConstructionExhausted {
            thresholds: thresholds.len(),
        })
    }
}

/// Insert C between A and B with the default configuration.
pub fn insert_three_level(a: &[f64], b: &[f64]) -> Result<Insertion, InsertionError> {
    ThresholdSearch::default().insert(a, b)
}

/// Smallest feasible low-level count for a given middle count, if any.
///
/// The bounds come from requiring C to beat B (at least `size/2 - mM*pA` low
/// faces would lose too much) and to lose to A.
fn feasible_split(
    size: usize,
    middle: usize,
    p_a_above: f64,
    p_b_at_or_below: f64,
) -> Option<LevelSplit> {
    let half = size as f64 / 2.0;
    let low_min = ((half - middle as f64 * p_a_above).floor() as i64 + 1).max(0);
    let low_max = ((half + middle as f64 * (1.0 - p_b_at_or_below)).floor() as i64)
        .min((size - middle) as i64);
    if low_min > low_max {
        return None;
    }
    let low = low_min as usize;
    Some(LevelSplit {
        low,
        middle,
        high: size - middle - low,
    })
}
