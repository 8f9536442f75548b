pub mod extension;

pub use extension::{CycleExtension, ExtensionConfig, ExtensionStats, ExtensionSummary};
