use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::config::RiskThresholds;

// ---------------------------------------------------------------------------
// Risk tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskTier {
    Safe,
    Warning,
    HighRisk,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Safe, RiskTier::Warning, RiskTier::HighRisk];

    /// `p > high` → high risk, `p > warning` → warning, else safe.
    pub fn classify(probability: f64, thresholds: &RiskThresholds) -> Self {
        if probability > thresholds.high {
            RiskTier::HighRisk
        } else if probability > thresholds.warning {
            RiskTier::Warning
        } else {
            RiskTier::Safe
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskTier::Safe => "safe",
            RiskTier::Warning => "warning",
            RiskTier::HighRisk => "high risk",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Per-row risk scores with summary statistics.
#[derive(Debug, Clone)]
pub struct RiskReport {
    pub probabilities: Vec<f64>,
    pub tiers: Vec<RiskTier>,
    pub thresholds: RiskThresholds,
    /// Rows above the warning threshold.
    pub risky: usize,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub tier_counts: BTreeMap<RiskTier, usize>,
}

impl RiskReport {
    pub fn new(probabilities: Vec<f64>, thresholds: RiskThresholds) -> Self {
        let tiers: Vec<RiskTier> = probabilities
            .iter()
            .map(|&p| RiskTier::classify(p, &thresholds))
            .collect();

        let mut tier_counts: BTreeMap<RiskTier, usize> =
            RiskTier::ALL.iter().map(|&t| (t, 0)).collect();
        for tier in &tiers {
            *tier_counts.entry(*tier).or_default() += 1;
        }

        let n = probabilities.len();
        let (mean, max, min) = if n == 0 {
            (0.0, 0.0, 0.0)
        } else {
            (
                probabilities.iter().sum::<f64>() / n as f64,
                probabilities.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                probabilities.iter().cloned().fold(f64::INFINITY, f64::min),
            )
        };

        RiskReport {
            risky: probabilities.iter().filter(|&&p| p > thresholds.warning).count(),
            probabilities,
            tiers,
            thresholds,
            mean,
            max,
            min,
            tier_counts,
        }
    }

    pub fn total(&self) -> usize {
        self.probabilities.len()
    }

    /// Statistics block written to the page log.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "Statistics:".to_string(),
            format!("Total samples: {}", self.total()),
            format!("Risky samples (p > {}): {}", self.thresholds.warning, self.risky),
            format!("Mean risk probability: {:.4}", self.mean),
            format!("Max risk probability: {:.4}", self.max),
            format!("Min risk probability: {:.4}", self.min),
        ];
        for (tier, count) in &self.tier_counts {
            lines.push(format!("  {tier}: {count}"));
        }
        lines
    }

    /// Indices of rows whose tier is selected. An empty selection shows
    /// nothing.
    pub fn rows_in_tiers(&self, selected: &BTreeSet<RiskTier>) -> Vec<usize> {
        self.tiers
            .iter()
            .enumerate()
            .filter(|(_, tier)| selected.contains(tier))
            .map(|(i, _)| i)
            .collect()
    }

    /// Counts of probabilities in `bins` equal-width bins over [0, 1].
    pub fn histogram(&self, bins: usize) -> Vec<usize> {
        let mut counts = vec![0; bins];
        if bins == 0 {
            return counts;
        }
        for &p in &self.probabilities {
            let bin = ((p.clamp(0.0, 1.0) * bins as f64).floor() as usize).min(bins - 1);
            counts[bin] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_tier_boundaries() {
        let t = RiskThresholds::default();
        assert_eq!(RiskTier::classify(0.5, &t), RiskTier::Safe);
        assert_eq!(RiskTier::classify(0.51, &t), RiskTier::Warning);
        assert_eq!(RiskTier::classify(0.7, &t), RiskTier::Warning);
        assert_eq!(RiskTier::classify(0.71, &t), RiskTier::HighRisk);
    }

    #[test]
    fn test_report_statistics() {
        let report = RiskReport::new(vec![0.1, 0.6, 0.9, 0.4], RiskThresholds::default());
        assert_eq!(report.total(), 4);
        assert_eq!(report.risky, 2);
        assert_abs_diff_eq!(report.mean, 0.5, epsilon = 1e-12);
        assert_eq!(report.max, 0.9);
        assert_eq!(report.min, 0.1);
        assert_eq!(report.tier_counts[&RiskTier::Safe], 2);
        assert_eq!(report.tier_counts[&RiskTier::Warning], 1);
        assert_eq!(report.tier_counts[&RiskTier::HighRisk], 1);
    }

    #[test]
    fn test_rows_in_tiers() {
        let report = RiskReport::new(vec![0.1, 0.6, 0.9, 0.4], RiskThresholds::default());
        let risky: BTreeSet<_> = [RiskTier::Warning, RiskTier::HighRisk].into();
        assert_eq!(report.rows_in_tiers(&risky), vec![1, 2]);
        assert!(report.rows_in_tiers(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_histogram_edges() {
        let report = RiskReport::new(vec![0.0, 0.05, 0.1, 0.99, 1.0], RiskThresholds::default());
        let hist = report.histogram(10);
        assert_eq!(hist.len(), 10);
        assert_eq!(hist[0], 2);
        assert_eq!(hist[1], 1);
        assert_eq!(hist[9], 2);
        assert_eq!(hist.iter().sum::<usize>(), 5);
    }

    #[test]
    fn test_empty_report() {
        let report = RiskReport::new(Vec::new(), RiskThresholds::default());
        assert_eq!(report.total(), 0);
        assert_eq!(report.mean, 0.0);
        assert_eq!(report.tier_counts.values().sum::<usize>(), 0);
    }
}
