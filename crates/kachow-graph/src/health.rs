use std::fmt;

use kachow_core::{MetricsRecord, ProjectMetrics};
use serde::{Deserialize, Serialize};

/// Project bug count above which a scan is flagged as a warning.
const HIGH_BUG_COUNT: u32 = 10;

/// Project health score: 100 minus the average code smells per file.
///
/// An empty file set scores 100. The result is rounded to two decimals and
/// never drops below 0.
///
/// # Examples
///
/// ```
/// use kachow_core::MetricsRecord;
/// use kachow_graph::health::health_score;
///
/// let mut noisy = MetricsRecord::perfect();
/// noisy.code_smells = 3;
/// let clean = MetricsRecord::perfect();
///
/// assert_eq!(health_score([&noisy, &clean]), 98.5);
/// assert_eq!(health_score(std::iter::empty::<&MetricsRecord>()), 100.0);
/// ```
pub fn health_score<'a, I>(file_metrics: I) -> f64
where
    I: IntoIterator<Item = &'a MetricsRecord>,
{
    let (total, count) = file_metrics
        .into_iter()
        .fold((0u64, 0u64), |(total, count), m| {
            (total + u64::from(m.code_smells), count + 1)
        });

    if count == 0 {
        return 100.0;
    }

    let score = 100.0 - total as f64 / count as f64;
    round2(score.max(0.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Overall outcome of a scan, derived from the project-level metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanVerdict {
    /// The project has open vulnerabilities.
    Critical,
    /// More than ten open bugs.
    Warning,
    Success,
}

impl ScanVerdict {
    /// Classify project metrics: vulnerabilities first, then bug count.
    ///
    /// # Examples
    ///
    /// ```
    /// use kachow_core::ProjectMetrics;
    /// use kachow_graph::health::ScanVerdict;
    ///
    /// let mut metrics = ProjectMetrics::default();
    /// assert_eq!(ScanVerdict::from_project(&metrics), ScanVerdict::Success);
    ///
    /// metrics.bugs = 11;
    /// assert_eq!(ScanVerdict::from_project(&metrics), ScanVerdict::Warning);
    ///
    /// metrics.vulnerabilities = 1;
    /// assert_eq!(ScanVerdict::from_project(&metrics), ScanVerdict::Critical);
    /// ```
    pub fn from_project(metrics: &ProjectMetrics) -> Self {
        if metrics.vulnerabilities > 0 {
            ScanVerdict::Critical
        } else if metrics.bugs > HIGH_BUG_COUNT {
            ScanVerdict::Warning
        } else {
            ScanVerdict::Success
        }
    }
}

impl fmt::Display for ScanVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanVerdict::Critical => write!(f, "critical"),
            ScanVerdict::Warning => write!(f, "warning"),
            ScanVerdict::Success => write!(f, "success"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_smells(smells: u32) -> MetricsRecord {
        MetricsRecord {
            code_smells: smells,
            ..MetricsRecord::perfect()
        }
    }

    #[test]
    fn zero_issues_is_perfect_health() {
        let records = vec![with_smells(0), with_smells(0), with_smells(0)];
        assert_eq!(health_score(&records), 100.0);
    }

    #[test]
    fn average_of_one_hundred_is_zero_health() {
        let records = vec![with_smells(50), with_smells(150)];
        assert_eq!(health_score(&records), 0.0);
    }

    #[test]
    fn score_is_rounded_to_two_decimals() {
        let records = vec![with_smells(1), with_smells(0), with_smells(0)];
        assert_eq!(health_score(&records), 99.67);
    }

    #[test]
    fn score_never_goes_negative() {
        let records = vec![with_smells(250)];
        assert_eq!(health_score(&records), 0.0);
    }

    #[test]
    fn bug_threshold_is_exclusive() {
        let metrics = ProjectMetrics {
            bugs: 10,
            ..ProjectMetrics::default()
        };
        assert_eq!(ScanVerdict::from_project(&metrics), ScanVerdict::Success);
    }
}
