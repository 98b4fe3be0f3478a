//! Per-family configuration merge strategies
//!
//! Services are classified into a closed set of families by name. Each
//! family merges the ordered list of member configs its own way.

use crate::types::Config;
use serde_json::{Map, Number, Value};

/// How the default family treats non-numeric keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigMergeMode {
    /// Keep `serviceCode`, sum numeric keys, drop everything else
    #[default]
    Lossy,
    /// Like `Lossy`, but non-numeric keys are kept: one distinct value as a
    /// scalar, several as an array in first-seen order
    Strict,
}

/// Service classification that selects the config merge strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceFamily {
    /// EC2-like: instances counted per instance type
    Compute,
    /// S3-like: storage tiers summed
    ObjectStorage,
    /// RDS-like: instances counted per type plus summed storage
    RelationalStorage,
    /// DynamoDB-like: storage and capacity units summed
    KeyValueStore,
    /// Anything else
    Generic,
}

impl ServiceFamily {
    /// Classify by case-insensitive substring match on the service name.
    /// Checked in order: EC2, S3, RDS, DynamoDB.
    pub fn classify(service_name: &str) -> Self {
        let name = service_name.to_ascii_lowercase();
        if name.contains("ec2") {
            ServiceFamily::Compute
        } else if name.contains("s3") {
            ServiceFamily::ObjectStorage
        } else if name.contains("rds") {
            ServiceFamily::RelationalStorage
        } else if name.contains("dynamodb") {
            ServiceFamily::KeyValueStore
        } else {
            ServiceFamily::Generic
        }
    }

    /// Merge member configs in group order
    pub fn merge(self, configs: &[&Config], mode: ConfigMergeMode) -> Config {
        match self {
            ServiceFamily::Compute => merge_compute(configs),
            ServiceFamily::ObjectStorage => merge_object_storage(configs),
            ServiceFamily::RelationalStorage => merge_relational(configs),
            ServiceFamily::KeyValueStore => merge_key_value(configs),
            ServiceFamily::Generic => merge_generic(configs, mode),
        }
    }
}

/// Running sum that stays an integer until a float contributes
#[derive(Debug, Clone, Copy, PartialEq)]
enum NumericSum {
    Int(i64),
    Float(f64),
}

impl Default for NumericSum {
    fn default() -> Self {
        NumericSum::Int(0)
    }
}

impl NumericSum {
    /// Add a JSON value; non-numbers count as zero
    fn add(&mut self, value: Option<&Value>) {
        let Some(Value::Number(n)) = value else {
            return;
        };
        *self = match (*self, n.as_i64()) {
            (NumericSum::Int(acc), Some(i)) => match acc.checked_add(i) {
                Some(sum) => NumericSum::Int(sum),
                None => NumericSum::Float(acc as f64 + i as f64),
            },
            (acc, _) => NumericSum::Float(acc.as_f64() + n.as_f64().unwrap_or(0.0)),
        };
    }

    fn as_f64(self) -> f64 {
        match self {
            NumericSum::Int(i) => i as f64,
            NumericSum::Float(f) => f,
        }
    }

    fn into_value(self) -> Value {
        match self {
            NumericSum::Int(i) => Value::from(i),
            NumericSum::Float(f) => {
                let f = if f.is_finite() {
                    f
                } else {
                    tracing::warn!(sum = f, "config sum out of range, saturating");
                    if f.is_nan() {
                        0.0
                    } else {
                        f.clamp(f64::MIN, f64::MAX)
                    }
                };
                Number::from_f64(f).map_or(Value::Null, Value::Number)
            }
        }
    }
}

fn sum_field(configs: &[&Config], key: &str) -> Value {
    let mut sum = NumericSum::default();
    for config in configs {
        sum.add(config.get(key));
    }
    sum.into_value()
}

/// `{type: {count: N}}` in first-seen type order; count defaults to 1
fn count_instances(configs: &[&Config], unknown_type: &str) -> Value {
    let mut order: Vec<String> = Vec::new();
    let mut counts: Vec<NumericSum> = Vec::new();

    for config in configs {
        let instance_type = config
            .get("instanceType")
            .and_then(Value::as_str)
            .unwrap_or(unknown_type);
        let idx = match order.iter().position(|t| t == instance_type) {
            Some(idx) => idx,
            None => {
                order.push(instance_type.to_string());
                counts.push(NumericSum::default());
                order.len() - 1
            }
        };
        match config.get("count").filter(|v| v.is_number()) {
            Some(count) => counts[idx].add(Some(count)),
            None => counts[idx].add(Some(&Value::from(1))),
        }
    }

    let instances: Map<String, Value> = order
        .into_iter()
        .zip(counts)
        .map(|(instance_type, count)| {
            let mut entry = Map::new();
            entry.insert("count".into(), count.into_value());
            (instance_type, Value::Object(entry))
        })
        .collect();
    Value::Object(instances)
}

fn merge_compute(configs: &[&Config]) -> Config {
    let mut merged = Config::new();
    merged.insert("serviceCode".into(), Value::from("ec2"));
    merged.insert("instances".into(), count_instances(configs, "unknown"));
    merged
}

const STORAGE_TIERS: [&str; 4] = ["totalGB", "standardGB", "iaGB", "glacierGB"];

fn merge_object_storage(configs: &[&Config]) -> Config {
    let mut tiers = [NumericSum::default(); STORAGE_TIERS.len()];
    for config in configs {
        let storage = config.get("storage").and_then(Value::as_object);
        for (sum, tier) in tiers.iter_mut().zip(STORAGE_TIERS) {
            sum.add(storage.and_then(|s| s.get(tier)));
        }
    }

    let storage: Map<String, Value> = STORAGE_TIERS
        .iter()
        .zip(tiers)
        .map(|(tier, sum)| (tier.to_string(), sum.into_value()))
        .collect();

    let mut merged = Config::new();
    merged.insert("serviceCode".into(), Value::from("s3"));
    merged.insert("storage".into(), Value::Object(storage));
    merged
}

fn merge_relational(configs: &[&Config]) -> Config {
    let mut merged = Config::new();
    merged.insert("serviceCode".into(), Value::from("rds"));
    merged.insert("instances".into(), count_instances(configs, "db.unknown"));
    merged.insert("storageGB".into(), sum_field(configs, "storageGB"));
    merged
}

fn merge_key_value(configs: &[&Config]) -> Config {
    let mut merged = Config::new();
    merged.insert("serviceCode".into(), Value::from("dynamodb"));
    for key in ["totalStorage", "readCapacity", "writeCapacity"] {
        merged.insert(key.into(), sum_field(configs, key));
    }
    merged
}

fn merge_generic(configs: &[&Config], mode: ConfigMergeMode) -> Config {
    let mut merged = Config::new();

    if let Some(code) = configs.iter().find_map(|c| c.get("serviceCode")) {
        merged.insert("serviceCode".into(), code.clone());
    }

    // Keys in first-seen order; a key is numeric if any member has a number
    let mut keys: Vec<&str> = Vec::new();
    for config in configs {
        for key in config.keys() {
            if key != "serviceCode" && !keys.contains(&key.as_str()) {
                keys.push(key);
            }
        }
    }

    for key in keys {
        let numeric = configs
            .iter()
            .any(|c| c.get(key).is_some_and(Value::is_number));
        if numeric {
            merged.insert(key.to_string(), sum_field(configs, key));
        } else if mode == ConfigMergeMode::Strict {
            merged.insert(key.to_string(), distinct_values(configs, key));
        }
    }

    merged
}

fn distinct_values(configs: &[&Config], key: &str) -> Value {
    let mut values: Vec<Value> = Vec::new();
    for value in configs.iter().filter_map(|c| c.get(key)) {
        if !values.contains(value) {
            values.push(value.clone());
        }
    }
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    }
}
