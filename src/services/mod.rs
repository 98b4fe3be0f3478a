//! Services for estimate normalization and merging

pub mod config_merge;
pub mod merger;
pub mod normalizer;

pub use config_merge::{ConfigMergeMode, ServiceFamily};
pub use merger::{MergeOptions, Merger};
pub use normalizer::{parse_cost, Normalizer};
