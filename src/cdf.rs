use anyhow::{anyhow, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Fraction of `values` that are less than or equal to `threshold`.
pub fn empirical_cdf(values: &[f64], threshold: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let at_or_below = values.iter().filter(|&&v| v <= threshold).count();
    at_or_below as f64 / values.len() as f64
}

/// Fraction of `values` strictly above `threshold`.
pub fn survival(values: &[f64], threshold: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    1.0 - empirical_cdf(values, threshold)
}

/// Sorted distinct values of the union of all inputs.
pub fn distinct_values(inputs: &[&[f64]]) -> Vec<f64> {
    let mut values: Vec<f64> = inputs.iter().flat_map(|v| v.iter().copied()).collect();
    values.sort_by(f64::total_cmp);
    values.dedup();
    values
}

/// Midpoints between consecutive distinct values, ascending.
pub fn midpoint_thresholds(distinct: &[f64]) -> Vec<f64> {
    distinct
        .windows(2)
        .map(|pair| (pair[0] + pair[1]) / 2.0)
        .collect()
}

/// Upper bound on the number of sampled thresholds of a [`CdfCurve`].
pub const MAX_CURVE_POINTS: usize = 100_000;

/// Step used by [`CdfCurve::around`] while the range allows it.
const CURVE_STEP: f64 = 0.01;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveSeries {
    pub cdf: Vec<f64>,
    pub survival: Vec<f64>,
}

/// CDF and survival values of named distributions sampled on a shared grid
/// of thresholds. Purely observational output meant for external plotting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdfCurve {
    pub thresholds: Vec<f64>,
    pub series: IndexMap<String, CurveSeries>,
}

impl CdfCurve {
    pub fn sample<'a, I>(distributions: I, start: f64, end: f64, step: f64) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a [f64])>,
    {
        if !step.is_finite() || step <= 0.0 {
            return Err(anyhow!("Curve step must be positive, got {}", step));
        }
        if !(start.is_finite() && end.is_finite()) || end < start {
            return Err(anyhow!("Invalid curve range [{}, {}]", start, end));
        }

        let span = ((end - start) / step).floor();
        if !span.is_finite() || span >= MAX_CURVE_POINTS as f64 {
            return Err(anyhow!(
                "Curve over [{}, {}] with step {} exceeds {} points",
                start,
                end,
                step,
                MAX_CURVE_POINTS
            ));
        }
        let points = span as usize + 1;
        let thresholds: Vec<f64> = (0..points).map(|i| start + i as f64 * step).collect();

        let mut series = IndexMap::new();
        for (name, values) in distributions {
            let cdf: Vec<f64> = thresholds
                .iter()
                .map(|&t| empirical_cdf(values, t))
                .collect();
            let survival = cdf.iter().map(|f| 1.0 - f).collect();
            series.insert(name.to_string(), CurveSeries { cdf, survival });
        }

        Ok(Self { thresholds, series })
    }

    /// Curve spanning one unit beyond the smallest and largest value of all
    /// inputs, with a step of 0.01. Wide ranges get a coarser step so the
    /// grid stays within [`MAX_CURVE_POINTS`].
    pub fn around<'a, I>(distributions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a [f64])> + Clone,
    {
        let all: Vec<f64> = distributions
            .clone()
            .into_iter()
            .flat_map(|(_, values)| values.iter().copied())
            .collect();
        let min = all
            .iter()
            .copied()
            .reduce(f64::min)
            .ok_or_else(|| anyhow!("Cannot sample a curve without values"))?;
        let max = all.iter().copied().reduce(f64::max).unwrap_or(min);
        let (start, end) = (min.floor() - 1.0, max.ceil() + 1.0);
        let step = CURVE_STEP.max((end - start) / (MAX_CURVE_POINTS - 1) as f64);
        Self::sample(distributions, start, end, step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_at_threshold_count_toward_cdf() {
        let x = [1.0, 2.0, 2.0, 5.0];
        assert_eq!(empirical_cdf(&x, 2.0), 0.75);
        assert_eq!(empirical_cdf(&x, 1.999), 0.25);
        assert_eq!(survival(&x, 2.0), 0.25);
    }

    #[test]
    fn cdf_limits() {
        let x = [3.0, -4.0, 10.0];
        assert_eq!(empirical_cdf(&x, f64::NEG_INFINITY), 0.0);
        assert_eq!(empirical_cdf(&x, f64::INFINITY), 1.0);
        assert_eq!(empirical_cdf(&x, -1e300), 0.0);
        assert_eq!(empirical_cdf(&x, 1e300), 1.0);
    }

    #[test]
    fn thresholds_sit_between_distinct_values() {
        let distinct = distinct_values(&[&[4.0, 4.0, 4.0], &[3.0, 8.0, 3.0]]);
        assert_eq!(distinct, vec![3.0, 4.0, 8.0]);
        assert_eq!(midpoint_thresholds(&distinct), vec![3.5, 6.0]);
        assert!(midpoint_thresholds(&[1.0]).is_empty());
    }

    #[test]
    fn curve_samples_every_series() {
        let a = [1.0, 2.0];
        let b = [0.0, 3.0];
        let curve =
            CdfCurve::sample([("A", &a[..]), ("B", &b[..])], 0.0, 3.0, 0.5).expect("curve");
        assert_eq!(curve.thresholds.len(), 7);
        let series_a = &curve.series["A"];
        assert_eq!(series_a.cdf.first(), Some(&0.0));
        assert_eq!(series_a.cdf.last(), Some(&1.0));
        assert_eq!(curve.series["B"].survival[0], 0.5);
        assert!(CdfCurve::sample([("A", &a[..])], 0.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn curve_grid_is_bounded() {
        let wide = [0.0, 1e9];
        let err = CdfCurve::sample([("A", &wide[..])], 0.0, 1e9, 0.01).unwrap_err();
        assert!(err.to_string().contains("exceeds"));

        let huge = [0.0, 1e18];
        let curve = CdfCurve::around([("A", &huge[..])]).expect("curve");
        assert!(curve.thresholds.len() <= MAX_CURVE_POINTS);
        let series = &curve.series["A"];
        assert_eq!(series.cdf.first(), Some(&0.0));
        assert_eq!(series.cdf.last(), Some(&1.0));

        let narrow = [1.0, 2.0];
        let curve = CdfCurve::around([("A", &narrow[..])]).expect("curve");
        assert_eq!(curve.thresholds.len(), 301);
    }
}
