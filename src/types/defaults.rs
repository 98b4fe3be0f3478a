//! Fallback values used when a document leaves a field out

/// Placeholder for estimates without a name
pub const DEFAULT_ESTIMATE_NAME: &str = "Unnamed Estimate";

/// Placeholder for services without a name
pub const DEFAULT_SERVICE_NAME: &str = "Unknown Service";

/// Region assumed for services that don't declare one
pub const DEFAULT_REGION: &str = "us-east-1";

/// Currency assumed for estimates that don't declare one, and the
/// fallback when merged estimates disagree
pub const DEFAULT_CURRENCY: &str = "USD";

/// Table of fallback values consulted by the normalizer and merger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub estimate_name: String,
    pub service_name: String,
    pub region: String,
    pub currency: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            estimate_name: DEFAULT_ESTIMATE_NAME.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            region: DEFAULT_REGION.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl Defaults {
    /// Replace the fallback region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Replace the fallback currency
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}
