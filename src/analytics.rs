use std::collections::BTreeMap;

use serde::Serialize;

use crate::transformer::TxnRecord;

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RuleEffectiveness {
    pub avg_confidence: f64,
    pub usage_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CoverageAnalysis {
    pub total_rules_defined: usize,
    pub rules_used: usize,
    pub rules_unused: usize,
    pub usage_percentage: f64,
    pub total_transactions: usize,
    pub transactions_with_rules: usize,
    pub transactions_without_rules: usize,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ConfigurationCleanup {
    pub removable_rules: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct RuleQuality {
    pub high_performing_rules: Vec<String>,
    pub low_performing_rules: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct Insights {
    pub configuration_cleanup: ConfigurationCleanup,
    pub rule_quality: RuleQuality,
}

/// Transaction counts by confidence band: high >= 0.9, medium in
/// [0.4, 0.9), low < 0.4.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct ConfidenceDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Rule usage and effectiveness report for one processed batch.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub rule_usage: BTreeMap<String, usize>,
    pub unused_rules: Vec<String>,
    pub rule_effectiveness: BTreeMap<String, RuleEffectiveness>,
    pub coverage_analysis: CoverageAnalysis,
    pub insights: Insights,
    pub confidence_distribution: ConfidenceDistribution,
}

/// Aggregate per-transaction records against the static rule catalog.
/// Single pass over the records; no dependency between rules.
pub fn build_report(catalog_keys: &[String], records: &[TxnRecord]) -> AnalyticsReport {
    let mut rule_usage: BTreeMap<String, usize> = BTreeMap::new();
    let mut confidence_sums: BTreeMap<String, f64> = BTreeMap::new();
    let mut matched_count = 0usize;
    let mut distribution = ConfidenceDistribution::default();

    for record in records {
        if record.confidence_score >= 0.9 {
            distribution.high += 1;
        } else if record.confidence_score >= 0.4 {
            distribution.medium += 1;
        } else {
            distribution.low += 1;
        }
        if !record.matched {
            continue;
        }
        matched_count += 1;
        *rule_usage.entry(record.rule_key.clone()).or_default() += 1;
        *confidence_sums.entry(record.rule_key.clone()).or_default() +=
            record.confidence_score;
    }

    let unused_rules: Vec<String> = catalog_keys
        .iter()
        .filter(|k| !rule_usage.contains_key(*k))
        .cloned()
        .collect();

    let rule_effectiveness: BTreeMap<String, RuleEffectiveness> = rule_usage
        .iter()
        .map(|(key, &count)| {
            let avg = round1(confidence_sums[key] / count as f64);
            (
                key.clone(),
                RuleEffectiveness {
                    avg_confidence: avg,
                    usage_count: count,
                },
            )
        })
        .collect();

    let total_rules = catalog_keys.len();
    let rules_used = rule_usage.len();
    let usage_percentage = if total_rules == 0 {
        0.0
    } else {
        round2(rules_used as f64 / total_rules as f64 * 100.0)
    };

    let mut quality = RuleQuality::default();
    for (key, eff) in &rule_effectiveness {
        if eff.avg_confidence >= 0.8 {
            quality.high_performing_rules.push(key.clone());
        } else if eff.avg_confidence < 0.5 {
            quality.low_performing_rules.push(key.clone());
        }
    }

    AnalyticsReport {
        coverage_analysis: CoverageAnalysis {
            total_rules_defined: total_rules,
            rules_used,
            rules_unused: unused_rules.len(),
            usage_percentage,
            total_transactions: records.len(),
            transactions_with_rules: matched_count,
            transactions_without_rules: records.len() - matched_count,
        },
        insights: Insights {
            configuration_cleanup: ConfigurationCleanup {
                removable_rules: unused_rules.clone(),
            },
            rule_quality: quality,
        },
        rule_usage,
        unused_rules,
        rule_effectiveness,
        confidence_distribution: distribution,
    }
}
