//! Type definitions for estimerge

mod defaults;
mod error;
mod estimate;

pub use defaults::*;
pub use error::*;
pub use estimate::*;

/// Non-fatal conditions noticed while merging
#[derive(Debug, Clone, PartialEq)]
pub enum MergeWarning {
    /// Inputs declared more than one currency; amounts were summed as-is
    /// and the result labeled with the fallback currency
    MixedCurrencies {
        currencies: Vec<String>,
        fallback: String,
    },
}

impl std::fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeWarning::MixedCurrencies {
                currencies,
                fallback,
            } => write!(
                f,
                "mixed currencies ({}); amounts not converted, labeled {}",
                currencies.join(", "),
                fallback
            ),
        }
    }
}
