//! Estimate document normalization service
//!
//! Converts loosely-typed estimate documents into the canonical [`Estimate`]
//! shape so that documents from different sources can be merged.

use crate::types::{Config, Defaults, Estimate, EstimergeError, Result, Service};
use serde_json::{Map, Value};

const SERVICE_NAME_KEYS: &[&str] = &["name", "service_name"];
const MONTHLY_COST_KEYS: &[&str] = &["monthlyCost", "monthly_cost"];
const UPFRONT_COST_KEYS: &[&str] = &["upfrontCost", "upfront_cost"];
const YEARLY_COST_KEYS: &[&str] = &["yearlyCost", "yearly_cost", "12_months"];

/// Coerce a cost field to a number.
///
/// Numbers are copied as-is. Strings keep only digits and `.` before
/// parsing, so currency symbols, thousands separators and unit suffixes
/// are ignored. Anything unparsable or absent becomes `0.0`.
///
/// # Examples
/// ```
/// use estimerge::services::normalizer::parse_cost;
/// use serde_json::json;
///
/// assert_eq!(parse_cost(Some(&json!("$1,234.56"))), 1234.56);
/// assert_eq!(parse_cost(Some(&json!("1,234.56 USD"))), 1234.56);
/// assert_eq!(parse_cost(Some(&json!("garbage"))), 0.0);
/// assert_eq!(parse_cost(None), 0.0);
/// ```
pub fn parse_cost(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            cleaned.parse().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

/// Normalizer for raw estimate documents
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    defaults: Defaults,
}

impl Normalizer {
    /// Create a normalizer with the standard fallback values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a normalizer with custom fallback values
    pub fn with_defaults(defaults: Defaults) -> Self {
        Self { defaults }
    }

    /// Fallback values this normalizer applies
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Convert one raw document to canonical form.
    ///
    /// Fails only when the document is not an object, lacks a `services`
    /// array, or a service entry is not an object. Missing or malformed
    /// optional fields fall back to defaults.
    pub fn normalize(&self, raw: &Value) -> Result<Estimate> {
        let doc = raw
            .as_object()
            .ok_or_else(|| EstimergeError::Schema("estimate document must be an object".into()))?;

        let services = match doc.get("services") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(EstimergeError::Schema("`services` must be an array".into()));
            }
            None => return Err(EstimergeError::Schema("missing `services` array".into())),
        };

        let services = services
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                item.as_object()
                    .map(|obj| self.normalize_service(obj))
                    .ok_or_else(|| {
                        EstimergeError::Schema(format!("services[{}] must be an object", idx))
                    })
            })
            .collect::<Result<Vec<Service>>>()?;

        Ok(Estimate {
            name: non_empty_str(doc.get("name"))
                .unwrap_or(self.defaults.estimate_name.as_str())
                .to_string(),
            currency: non_empty_str(doc.get("currency"))
                .unwrap_or(self.defaults.currency.as_str())
                .to_string(),
            services,
        })
    }

    fn normalize_service(&self, raw: &Map<String, Value>) -> Service {
        let name = SERVICE_NAME_KEYS
            .iter()
            .find_map(|k| non_empty_str(raw.get(*k)))
            .unwrap_or(self.defaults.service_name.as_str());
        let region = non_empty_str(raw.get("region")).unwrap_or(self.defaults.region.as_str());

        let yearly_override = first_key(raw, YEARLY_COST_KEYS)
            .filter(|v| !is_blank(v))
            .map(|v| parse_cost(Some(v)));

        Service {
            name: name.to_string(),
            region: region.to_string(),
            monthly_cost: parse_cost(first_key(raw, MONTHLY_COST_KEYS)),
            upfront_cost: parse_cost(first_key(raw, UPFRONT_COST_KEYS)),
            yearly_override,
            description: raw
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            config: match raw.get("config") {
                Some(Value::Object(config)) => config.clone(),
                _ => Config::new(),
            },
        }
    }
}

/// First present, non-null value among alias keys
fn first_key<'a>(raw: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| !v.is_null())
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
