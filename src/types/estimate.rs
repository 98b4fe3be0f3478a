//! Canonical estimate types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form, service-specific configuration
pub type Config = Map<String, Value>;

/// One priced proposal: a named set of services in a single currency
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Estimate {
    pub name: String,
    pub currency: String,
    #[serde(default)]
    pub services: Vec<Service>,
}

impl Estimate {
    /// Sum costs over every service
    pub fn totals(&self) -> EstimateTotals {
        self.services
            .iter()
            .fold(EstimateTotals::default(), |mut totals, service| {
                totals.add(service);
                totals
            })
    }
}

/// One priced line item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub name: String,
    pub region: String,
    pub monthly_cost: f64,
    pub upfront_cost: f64,
    /// Explicit 12-month figure, when the source supplied one
    #[serde(default, rename = "yearly_cost", skip_serializing_if = "Option::is_none")]
    pub yearly_override: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: Config,
}

impl Service {
    /// Cost over twelve months.
    /// Uses the explicit figure when present, else `monthly * 12 + upfront`.
    pub fn yearly_cost(&self) -> f64 {
        self.yearly_override
            .unwrap_or(self.monthly_cost * 12.0 + self.upfront_cost)
    }

    /// Key under which services are merged together
    pub fn key(&self) -> ServiceKey {
        ServiceKey {
            name: self.name.clone(),
            region: self.region.clone(),
        }
    }
}

/// `(name, region)` grouping key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    pub name: String,
    pub region: String,
}

/// Cost totals across an estimate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct EstimateTotals {
    pub upfront: f64,
    pub monthly: f64,
    #[serde(rename = "12_months")]
    pub yearly: f64,
}

impl EstimateTotals {
    pub fn add(&mut self, service: &Service) {
        self.upfront += service.upfront_cost;
        self.monthly += service.monthly_cost;
        self.yearly += service.yearly_cost();
    }
}
