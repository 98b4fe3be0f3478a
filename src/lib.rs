//! Normalize loosely-typed cloud cost estimates and merge them into one

pub mod services;
pub mod sources;
pub mod types;
