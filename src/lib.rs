pub mod cdf;
pub mod dice;
pub mod insertion;
pub mod pipeline;
pub mod verify;

pub use cdf::{empirical_cdf, CdfCurve};
pub use dice::{
    DiceCatalog, DicePath, DiceSet, DiceSetLoader, DiceSetWriter, Distribution, InsertionRequest,
};
pub use insertion::{
    elementwise_midpoint, insert_three_level, tied_midpoint, Insertion, InsertionConfig,
    InsertionError, InsertionReport, NormalizedDice, Normalizer, ThresholdSearch,
};
pub use pipeline::{CycleExtension, ExtensionConfig, ExtensionStats, ExtensionSummary};
pub use verify::{
    probability_to_beat, search_cycles, CycleVerifier, DominanceChecker, DominanceGraph,
    DominanceMatrix, Orientation,
};
