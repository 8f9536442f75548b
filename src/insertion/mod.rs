pub mod error;
pub mod midpoint;
pub mod normalize;
pub mod threshold;

pub use error::InsertionError;
pub use midpoint::{elementwise_midpoint, tied_midpoint};
pub use normalize::{NormalizedDice, Normalizer};
pub use threshold::{
    insert_three_level, Insertion, InsertionConfig, InsertionReport, LevelSplit, Levels,
    ThresholdSearch,
};
