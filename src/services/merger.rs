//! Merger service for combining estimates
//!
//! Services sharing a `(name, region)` key are collapsed into one entry with
//! summed costs, a combined description and a family-specific config merge.

use crate::services::config_merge::{ConfigMergeMode, ServiceFamily};
use crate::types::{
    Config, Estimate, EstimergeError, MergeWarning, Result, Service, ServiceKey, DEFAULT_CURRENCY,
};
use std::collections::HashMap;

/// Merge behavior knobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Currency used when inputs disagree
    pub fallback_currency: String,
    pub config_mode: ConfigMergeMode,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            fallback_currency: DEFAULT_CURRENCY.to_string(),
            config_mode: ConfigMergeMode::default(),
        }
    }
}

/// Merger for canonical estimates
#[derive(Debug, Clone, Default)]
pub struct Merger {
    options: MergeOptions,
}

impl Merger {
    /// Create a merger with the given options
    pub fn new(options: MergeOptions) -> Self {
        Self { options }
    }

    /// Merge estimates into one, discarding warnings (they are still logged)
    pub fn merge(&self, estimates: Vec<Estimate>) -> Result<Estimate> {
        self.merge_with_warnings(estimates).map(|(estimate, _)| estimate)
    }

    /// Merge estimates into one.
    ///
    /// A single estimate is returned unchanged. Returns `EmptyInput` when
    /// there is nothing to merge.
    pub fn merge_with_warnings(
        &self,
        mut estimates: Vec<Estimate>,
    ) -> Result<(Estimate, Vec<MergeWarning>)> {
        match estimates.len() {
            0 => return Err(EstimergeError::EmptyInput),
            1 => return Ok((estimates.remove(0), Vec::new())),
            _ => {}
        }

        let mut warnings = Vec::new();
        let name = merged_name(&estimates);
        let currency = match self.common_currency(&estimates) {
            Ok(currency) => currency,
            Err(warning) => {
                tracing::warn!(%warning, "merging estimates with different currencies");
                let fallback = self.options.fallback_currency.clone();
                warnings.push(warning);
                fallback
            }
        };
        let services = self.merge_services(estimates);

        Ok((
            Estimate {
                name,
                currency,
                services,
            },
            warnings,
        ))
    }

    /// The shared currency, or a warning listing the distinct ones
    fn common_currency(&self, estimates: &[Estimate]) -> std::result::Result<String, MergeWarning> {
        let mut currencies: Vec<&str> = Vec::new();
        for estimate in estimates {
            if !currencies.contains(&estimate.currency.as_str()) {
                currencies.push(&estimate.currency);
            }
        }

        match currencies.as_slice() {
            [only] => Ok(only.to_string()),
            _ => Err(MergeWarning::MixedCurrencies {
                currencies: currencies.iter().map(|c| c.to_string()).collect(),
                fallback: self.options.fallback_currency.clone(),
            }),
        }
    }

    /// Group by `(name, region)` in first-seen order and merge each group
    fn merge_services(&self, estimates: Vec<Estimate>) -> Vec<Service> {
        let mut index: HashMap<ServiceKey, usize> = HashMap::new();
        let mut groups: Vec<Vec<Service>> = Vec::new();

        for service in estimates.into_iter().flat_map(|e| e.services) {
            let idx = *index.entry(service.key()).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[idx].push(service);
        }

        groups
            .into_iter()
            .map(|group| self.merge_group(group))
            .collect()
    }

    fn merge_group(&self, mut group: Vec<Service>) -> Service {
        if group.len() == 1 {
            return group.remove(0);
        }

        let first = &group[0];
        let name = first.name.clone();
        let region = first.region.clone();

        let monthly_cost = group.iter().map(|s| s.monthly_cost).sum();
        let upfront_cost = group.iter().map(|s| s.upfront_cost).sum();
        let yearly_override = group
            .iter()
            .map(|s| s.yearly_override)
            .sum::<Option<f64>>();

        let description = merged_description(&group, &name, &region);

        let configs: Vec<&Config> = group.iter().map(|s| &s.config).collect();
        let config = ServiceFamily::classify(&name).merge(&configs, self.options.config_mode);

        Service {
            name,
            region,
            monthly_cost,
            upfront_cost,
            yearly_override,
            description,
            config,
        }
    }
}

/// "Merged: A + B", or "Merged: A + N others" beyond two inputs
fn merged_name(estimates: &[Estimate]) -> String {
    match estimates {
        [a, b] => format!("Merged: {} + {}", a.name, b.name),
        [first, rest @ ..] => format!("Merged: {} + {} others", first.name, rest.len()),
        [] => "Merged: ".to_string(),
    }
}

fn merged_description(group: &[Service], name: &str, region: &str) -> String {
    let mut descriptions: Vec<&str> = Vec::new();
    for service in group {
        let desc = service.description.as_str();
        if !desc.is_empty() && !descriptions.contains(&desc) {
            descriptions.push(desc);
        }
    }

    match descriptions.as_slice() {
        [] => format!("Merged {} in {}", name, region),
        [only] => only.to_string(),
        [a, b] => format!("Combined: {}, {}", a, b),
        [a, b, rest @ ..] => format!("Combined: {}, {} and {} more", a, b, rest.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_service(name: &str, region: &str, monthly: f64, upfront: f64, desc: &str) -> Service {
        Service {
            name: name.into(),
            region: region.into(),
            monthly_cost: monthly,
            upfront_cost: upfront,
            yearly_override: None,
            description: desc.into(),
            config: Config::new(),
        }
    }

    fn make_estimate(name: &str, currency: &str, services: Vec<Service>) -> Estimate {
        Estimate {
            name: name.into(),
            currency: currency.into(),
            services,
        }
    }

    // ========== Top level ==========

    #[test]
    fn test_merge_empty_is_error() {
        let err = Merger::default().merge(vec![]).unwrap_err();
        assert!(matches!(err, EstimergeError::EmptyInput));
    }

    #[test]
    fn test_merge_single_is_identity() {
        let estimate = make_estimate(
            "Only",
            "JPY",
            vec![make_service("AWS Lambda", "ap-northeast-1", 1.0, 0.0, "")],
        );
        let merged = Merger::default().merge(vec![estimate.clone()]).unwrap();
        assert_eq!(merged, estimate);
    }

    #[test]
    fn test_merged_name_two() {
        let estimates = vec![
            make_estimate("Estimate 1", "USD", vec![]),
            make_estimate("Estimate 2", "USD", vec![]),
        ];
        let merged = Merger::default().merge(estimates).unwrap();
        assert_eq!(merged.name, "Merged: Estimate 1 + Estimate 2");
    }

    #[test]
    fn test_merged_name_many() {
        let estimates = vec![
            make_estimate("Prod", "USD", vec![]),
            make_estimate("Dev", "USD", vec![]),
            make_estimate("Staging", "USD", vec![]),
            make_estimate("QA", "USD", vec![]),
        ];
        let merged = Merger::default().merge(estimates).unwrap();
        assert_eq!(merged.name, "Merged: Prod + 3 others");
    }

    #[test]
    fn test_empty_estimates_merge_to_zero_services() {
        let estimates = vec![
            make_estimate("A", "USD", vec![]),
            make_estimate("B", "USD", vec![]),
        ];
        let merged = Merger::default().merge(estimates).unwrap();
        assert!(merged.services.is_empty());
        assert_eq!(merged.totals().monthly, 0.0);
    }

    // ========== Currency ==========

    #[test]
    fn test_common_currency_kept() {
        let estimates = vec![
            make_estimate("A", "JPY", vec![]),
            make_estimate("B", "JPY", vec![]),
        ];
        let (merged, warnings) = Merger::default().merge_with_warnings(estimates).unwrap();
        assert_eq!(merged.currency, "JPY");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_mixed_currency_falls_back_with_warning() {
        let estimates = vec![
            make_estimate("A", "USD", vec![]),
            make_estimate("B", "JPY", vec![]),
        ];
        let (merged, warnings) = Merger::default().merge_with_warnings(estimates).unwrap();
        assert_eq!(merged.currency, "USD");
        assert_eq!(
            warnings,
            vec![MergeWarning::MixedCurrencies {
                currencies: vec!["USD".into(), "JPY".into()],
                fallback: "USD".into(),
            }]
        );
    }

    #[test]
    fn test_mixed_currency_custom_fallback() {
        let merger = Merger::new(MergeOptions {
            fallback_currency: "EUR".into(),
            ..MergeOptions::default()
        });
        let estimates = vec![
            make_estimate("A", "USD", vec![]),
            make_estimate("B", "JPY", vec![]),
        ];
        assert_eq!(merger.merge(estimates).unwrap().currency, "EUR");
    }

    // ========== Grouping ==========

    #[test]
    fn test_same_key_summed() {
        let estimates = vec![
            make_estimate(
                "A",
                "USD",
                vec![make_service("AWS Lambda", "ap-northeast-1", 50.0, 0.0, "")],
            ),
            make_estimate(
                "B",
                "USD",
                vec![make_service("AWS Lambda", "ap-northeast-1", 25.0, 10.0, "")],
            ),
        ];
        let merged = Merger::default().merge(estimates).unwrap();
        assert_eq!(merged.services.len(), 1);
        assert_eq!(merged.services[0].monthly_cost, 75.0);
        assert_eq!(merged.services[0].upfront_cost, 10.0);
    }

    #[test]
    fn test_different_regions_not_merged() {
        let estimates = vec![
            make_estimate(
                "A",
                "USD",
                vec![make_service("Amazon S3", "us-east-1", 10.0, 0.0, "")],
            ),
            make_estimate(
                "B",
                "USD",
                vec![make_service("Amazon S3", "eu-west-1", 20.0, 0.0, "")],
            ),
        ];
        let merged = Merger::default().merge(estimates).unwrap();
        assert_eq!(merged.services.len(), 2);
    }

    #[test]
    fn test_first_seen_order() {
        let estimates = vec![
            make_estimate(
                "A",
                "USD",
                vec![
                    make_service("AWS Lambda", "us-east-1", 1.0, 0.0, ""),
                    make_service("Amazon S3", "us-east-1", 1.0, 0.0, ""),
                ],
            ),
            make_estimate(
                "B",
                "USD",
                vec![
                    make_service("Amazon EC2", "us-east-1", 1.0, 0.0, ""),
                    make_service("AWS Lambda", "us-east-1", 1.0, 0.0, ""),
                ],
            ),
        ];
        let merged = Merger::default().merge(estimates).unwrap();
        let names: Vec<&str> = merged.services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["AWS Lambda", "Amazon S3", "Amazon EC2"]);
    }

    #[test]
    fn test_single_member_group_untouched() {
        let mut lone = make_service("Amazon S3", "us-east-1", 30.0, 0.0, "");
        lone.config.insert("storage".into(), json!("100GB"));
        let estimates = vec![
            make_estimate("A", "USD", vec![lone.clone()]),
            make_estimate("B", "USD", vec![]),
        ];
        let merged = Merger::default().merge(estimates).unwrap();
        // No synthesized description or s3 config for a group of one
        assert_eq!(merged.services, vec![lone]);
    }

    // ========== Yearly cost ==========

    #[test]
    fn test_yearly_override_summed_when_all_present() {
        let mut a = make_service("AWS Lambda", "us-east-1", 50.0, 0.0, "");
        let mut b = a.clone();
        a.yearly_override = Some(600.0);
        b.yearly_override = Some(300.0);
        let merged = Merger::default().merge_group(vec![a, b]);
        assert_eq!(merged.yearly_override, Some(900.0));
    }

    #[test]
    fn test_yearly_override_dropped_when_partial() {
        let mut a = make_service("AWS Lambda", "us-east-1", 50.0, 10.0, "");
        let b = make_service("AWS Lambda", "us-east-1", 25.0, 0.0, "");
        a.yearly_override = Some(700.0);
        let merged = Merger::default().merge_group(vec![a, b]);
        assert_eq!(merged.yearly_override, None);
        assert_eq!(merged.yearly_cost(), 75.0 * 12.0 + 10.0);
    }

    // ========== Descriptions ==========

    #[test]
    fn test_description_single_distinct() {
        let group = vec![
            make_service("AWS Lambda", "us-east-1", 1.0, 0.0, "API"),
            make_service("AWS Lambda", "us-east-1", 1.0, 0.0, "API"),
            make_service("AWS Lambda", "us-east-1", 1.0, 0.0, ""),
        ];
        assert_eq!(merged_description(&group, "AWS Lambda", "us-east-1"), "API");
    }

    #[test]
    fn test_description_two() {
        let group = vec![
            make_service("AWS Lambda", "us-east-1", 1.0, 0.0, "Lambda 1"),
            make_service("AWS Lambda", "us-east-1", 1.0, 0.0, "Lambda 2"),
        ];
        assert_eq!(
            merged_description(&group, "AWS Lambda", "us-east-1"),
            "Combined: Lambda 1, Lambda 2"
        );
    }

    #[test]
    fn test_description_more_than_two() {
        let group = vec![
            make_service("AWS Lambda", "us-east-1", 1.0, 0.0, "a"),
            make_service("AWS Lambda", "us-east-1", 1.0, 0.0, "b"),
            make_service("AWS Lambda", "us-east-1", 1.0, 0.0, "a"),
            make_service("AWS Lambda", "us-east-1", 1.0, 0.0, "c"),
            make_service("AWS Lambda", "us-east-1", 1.0, 0.0, "d"),
        ];
        assert_eq!(
            merged_description(&group, "AWS Lambda", "us-east-1"),
            "Combined: a, b and 2 more"
        );
    }

    #[test]
    fn test_description_synthesized() {
        let group = vec![
            make_service("AWS Lambda", "us-east-1", 1.0, 0.0, ""),
            make_service("AWS Lambda", "us-east-1", 1.0, 0.0, ""),
        ];
        assert_eq!(
            merged_description(&group, "AWS Lambda", "us-east-1"),
            "Merged AWS Lambda in us-east-1"
        );
    }

    // ========== Config dispatch ==========

    #[test]
    fn test_group_config_uses_family() {
        let mut a = make_service("Amazon EC2", "us-east-1", 1.0, 0.0, "");
        let mut b = a.clone();
        a.config.insert("instanceType".into(), json!("t3.micro"));
        b.config.insert("instanceType".into(), json!("t3.micro"));
        b.config.insert("count".into(), json!(2));
        let merged = Merger::default().merge_group(vec![a, b]);
        assert_eq!(
            serde_json::Value::Object(merged.config),
            json!({"serviceCode": "ec2", "instances": {"t3.micro": {"count": 3}}})
        );
    }

    #[test]
    fn test_strict_mode_threads_through() {
        let merger = Merger::new(MergeOptions {
            config_mode: ConfigMergeMode::Strict,
            ..MergeOptions::default()
        });
        let mut a = make_service("AWS Lambda", "us-east-1", 1.0, 0.0, "");
        let mut b = a.clone();
        a.config.insert("runtime".into(), json!("python3.12"));
        b.config.insert("runtime".into(), json!("nodejs20.x"));
        let merged = merger.merge_group(vec![a, b]);
        assert_eq!(
            merged.config.get("runtime"),
            Some(&json!(["python3.12", "nodejs20.x"]))
        );
    }
}
