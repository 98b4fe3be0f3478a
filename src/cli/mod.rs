use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use estimerge::services::{ConfigMergeMode, MergeOptions, Merger, Normalizer};
use estimerge::sources::{DocumentSource, JsonFileSource, RawDocument};
use estimerge::types::{Defaults, Estimate, EstimateTotals, EstimergeError, MergeWarning};
use serde::Serialize;
use std::fmt::Write as _;

/// Merge several cloud cost estimates into one
#[derive(Parser)]
#[command(name = "estimerge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize and merge estimate documents
    Merge {
        /// JSON files or glob patterns; `-` reads stdin
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Skip documents that are not estimates instead of failing
        #[arg(long)]
        skip_invalid: bool,

        /// Keep non-numeric config keys of unrecognized services
        #[arg(long)]
        strict_config: bool,

        #[command(flatten)]
        defaults: DefaultArgs,
    },

    /// Print the canonical form of each document as JSON
    Normalize {
        /// JSON files or glob patterns; `-` reads stdin
        #[arg(required = true)]
        inputs: Vec<String>,

        #[command(flatten)]
        defaults: DefaultArgs,
    },
}

#[derive(Args, Debug, Default)]
struct DefaultArgs {
    /// Region for services that don't declare one
    #[arg(long)]
    default_region: Option<String>,

    /// Currency for estimates that don't declare one, and the fallback
    /// when merged estimates disagree
    #[arg(long)]
    default_currency: Option<String>,
}

impl DefaultArgs {
    fn to_defaults(&self) -> Defaults {
        let mut defaults = Defaults::default();
        if let Some(region) = &self.default_region {
            defaults = defaults.with_region(region.clone());
        }
        if let Some(currency) = &self.default_currency {
            defaults = defaults.with_currency(currency.clone());
        }
        defaults
    }
}

/// JSON shape of `merge --json`
#[derive(Serialize)]
struct MergeOutput<'a> {
    #[serde(flatten)]
    estimate: &'a Estimate,
    total_cost: EstimateTotals,
    warnings: Vec<String>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Merge {
                inputs,
                json,
                skip_invalid,
                strict_config,
                defaults,
            } => {
                let normalizer = Normalizer::with_defaults(defaults.to_defaults());
                let docs = JsonFileSource::new(inputs).load()?;
                let estimates = normalize_all(&normalizer, docs, skip_invalid)?;

                let merger = Merger::new(MergeOptions {
                    fallback_currency: normalizer.defaults().currency.clone(),
                    config_mode: if strict_config {
                        ConfigMergeMode::Strict
                    } else {
                        ConfigMergeMode::Lossy
                    },
                });
                let (merged, warnings) = merger
                    .merge_with_warnings(estimates)
                    .context("nothing to merge")?;

                if json {
                    let output = MergeOutput {
                        estimate: &merged,
                        total_cost: merged.totals(),
                        warnings: warnings.iter().map(ToString::to_string).collect(),
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    print!("{}", render_text(&merged, &warnings));
                }
                Ok(())
            }
            Commands::Normalize { inputs, defaults } => {
                let normalizer = Normalizer::with_defaults(defaults.to_defaults());
                let docs = JsonFileSource::new(inputs).load()?;
                let estimates = normalize_all(&normalizer, docs, false)?;
                println!("{}", serde_json::to_string_pretty(&estimates)?);
                Ok(())
            }
        }
    }
}

/// Normalize documents in order. Schema errors abort unless `skip_invalid`.
fn normalize_all(
    normalizer: &Normalizer,
    docs: Vec<RawDocument>,
    skip_invalid: bool,
) -> anyhow::Result<Vec<Estimate>> {
    let mut estimates = Vec::with_capacity(docs.len());
    for doc in docs {
        match normalizer.normalize(&doc.value) {
            Ok(estimate) => estimates.push(estimate),
            Err(EstimergeError::Schema(reason)) if skip_invalid => {
                tracing::warn!(document = %doc.label(), %reason, "skipping invalid document");
            }
            Err(e) => return Err(e).with_context(|| format!("invalid estimate {}", doc.label())),
        }
    }
    Ok(estimates)
}

fn render_text(estimate: &Estimate, warnings: &[MergeWarning]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", estimate.name, estimate.currency);
    for service in &estimate.services {
        let _ = writeln!(
            out,
            "  {} [{}]  monthly {:.2}  upfront {:.2}",
            service.name, service.region, service.monthly_cost, service.upfront_cost
        );
        if !service.description.is_empty() {
            let _ = writeln!(out, "    {}", service.description);
        }
    }
    let totals = estimate.totals();
    let _ = writeln!(
        out,
        "Total  monthly {:.2}  upfront {:.2}  12 months {:.2}",
        totals.monthly, totals.upfront, totals.yearly
    );
    for warning in warnings {
        let _ = writeln!(out, "warning: {}", warning);
    }
    out
}
