pub mod catalog;
pub mod model;
pub mod serialization;

pub use catalog::DiceCatalog;
pub use model::{DicePath, DiceSet, Distribution};
pub use serialization::{DiceSetLoader, DiceSetWriter, InsertionRequest};
