pub mod cycle;
pub mod dominance;

pub use cycle::{search_cycles, CycleVerification, CycleVerifier, DominanceGraph, Orientation};
pub use dominance::{
    count_beats, probability_to_beat, BeatCount, DominanceChecker, DominanceMatrix,
    DominanceReport,
};
