use crate::dice::Distribution;
use crate::insertion::error::{validate, InsertionError};
use crate::verify::dominance::{count_beats, BeatCount};

/// Face-by-face construction of C for two equally sized dice with A > B.
///
/// Where `a[n] > b[n]`, C takes the truncated midpoint so A keeps winning
/// that face; where `a[n] < b[n]`, C takes `b[n] + 1` so C wins against B
/// there. Equal faces are copied. Cheaper than [`super::ThresholdSearch`]
/// but succeeds far less often; the result is validated before returning.
pub fn elementwise_midpoint(a: &[f64], b: &[f64]) -> Result<Distribution, InsertionError> {
    validate(a, "A")?;
    validate(b, "B")?;
    if a.len() != b.len() {
        return Err(InsertionError::SizeMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    let ab = count_beats(a, b);
    if !ab.dominates() {
        return Err(InsertionError::InvalidInput {
            probability: ab.probability(),
        });
    }

    let values = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| {
            if x > y {
                ((x + y) / 2.0).trunc()
            } else if x < y {
                y + 1.0
            } else {
                x
            }
        })
        .collect();
    let candidate =
        Distribution::new(values).map_err(|_| InsertionError::NonFinite { name: "C" })?;

    if count_beats(a, &candidate).dominates() && count_beats(&candidate, b).dominates() {
        Ok(candidate)
    } else {
        Err(InsertionError::MidpointRejected)
    }
}

/// Face-by-face truncated mean of two equally sized dice with P(A>B)
/// exactly 1/2. Accepted only when C keeps both P(A>C) and P(C>B) at
/// exactly 1/2.
pub fn tied_midpoint(a: &[f64], b: &[f64]) -> Result<Distribution, InsertionError> {
    validate(a, "A")?;
    validate(b, "B")?;
    if a.len() != b.len() {
        return Err(InsertionError::SizeMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    let ab = count_beats(a, b);
    if !is_even(ab) {
        return Err(InsertionError::InvalidInput {
            probability: ab.probability(),
        });
    }

    let values = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| ((x + y) / 2.0).trunc())
        .collect();
    let candidate =
        Distribution::new(values).map_err(|_| InsertionError::NonFinite { name: "C" })?;

    if is_even(count_beats(a, &candidate)) && is_even(count_beats(&candidate, b)) {
        Ok(candidate)
    } else {
        Err(InsertionError::MidpointRejected)
    }
}

fn is_even(count: BeatCount) -> bool {
    2 * count.wins == count.total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_between_shifted_dice() {
        let a = [10.0, 10.0, 10.0, 2.0];
        let b = [4.0, 4.0, 4.0, 4.0];
        let c = elementwise_midpoint(&a, &b).expect("midpoint");
        assert_eq!(c.values(), &[7.0, 7.0, 7.0, 5.0]);
    }

    #[test]
    fn requires_equal_sizes() {
        let err = elementwise_midpoint(&[3.0, 4.0], &[1.0]).unwrap_err();
        assert_eq!(err, InsertionError::SizeMismatch { left: 2, right: 1 });
    }

    #[test]
    fn rejects_when_relation_breaks() {
        let a = [2.0, 19.0, 22.0, 23.0, 29.0, 30.0];
        let b = [9.0, 16.0, 16.0, 19.0, 31.0, 38.0];
        assert_eq!(
            elementwise_midpoint(&a, &b).unwrap_err(),
            InsertionError::MidpointRejected
        );
    }

    #[test]
    fn tied_pair_keeps_both_relations_even() {
        let a = [1.0, 13.0];
        let b = [5.0, 9.0];
        let c = tied_midpoint(&a, &b).expect("tied midpoint");
        assert_eq!(c.values(), &[3.0, 11.0]);
        assert_eq!(count_beats(&a, &c).probability(), 0.5);
        assert_eq!(count_beats(&c, &b).probability(), 0.5);
    }

    #[test]
    fn tied_midpoint_needs_an_even_pair() {
        let err = tied_midpoint(&[10.0, 10.0], &[4.0, 4.0]).unwrap_err();
        assert_eq!(err, InsertionError::InvalidInput { probability: 1.0 });
        // P(A>B) = 1/2, but C = [1, 3] only beats B a quarter of the time.
        assert_eq!(
            tied_midpoint(&[1.0, 4.0], &[2.0, 3.0]).unwrap_err(),
            InsertionError::MidpointRejected
        );
    }
}
