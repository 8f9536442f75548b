use thiserror::Error;

/// Terminal failures of a single insertion attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InsertionError {
    /// A does not pairwise-dominate B, so no C with A > C > B is sought.
    #[error("P(A>B) must be greater than 1/2, got {probability:.3}")]
    InvalidInput { probability: f64 },

    /// Every threshold and level split was tried without A > C > B holding.
    #[error("no threshold and level split yields A > C > B ({thresholds} thresholds scanned)")]
    ConstructionExhausted { thresholds: usize },

    #[error("distribution {name} is empty")]
    EmptyDistribution { name: &'static str },

    #[error("distribution {name} contains a non-finite value")]
    NonFinite { name: &'static str },

    #[error("elementwise insertion needs dice of equal size, got {left} and {right}")]
    SizeMismatch { left: usize, right: usize },

    #[error("elementwise midpoint die does not satisfy A > C > B")]
    MidpointRejected,

    /// A search setting that would move a level onto or past its bracket.
    #[error("insertion setting {field} must be positive and finite, got {value}")]
    InvalidConfig { field: &'static str, value: f64 },
}

pub(crate) fn validate(values: &[f64], name: &'static str) -> Result<(), InsertionError> {
    if values.is_empty() {
        return Err(InsertionError::EmptyDistribution { name });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(InsertionError::NonFinite { name });
    }
    Ok(())
}
