use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Duplicated-lines density (%) above which a file fails its quality gate.
const MAX_DUPLICATION_DENSITY: f64 = 5.0;

/// Pass/fail verdict derived from metric thresholds.
///
/// Serialized as `"PASSED"` / `"FAILED"`.
///
/// # Examples
///
/// ```
/// use kachow_core::QualityGate;
///
/// let gate: QualityGate = "ERROR".parse().unwrap();
/// assert_eq!(gate, QualityGate::Failed);
/// assert_eq!(QualityGate::Passed.to_string(), "PASSED");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityGate {
    /// All thresholds satisfied.
    #[default]
    Passed,
    /// At least one threshold violated.
    Failed,
}

impl QualityGate {
    /// Per-file verdict: fails on any bug, any vulnerability, or duplication
    /// density above 5%.
    ///
    /// # Examples
    ///
    /// ```
    /// use kachow_core::QualityGate;
    ///
    /// assert_eq!(QualityGate::for_file(0, 0, 5.0), QualityGate::Passed);
    /// assert_eq!(QualityGate::for_file(1, 0, 0.0), QualityGate::Failed);
    /// assert_eq!(QualityGate::for_file(0, 0, 5.1), QualityGate::Failed);
    /// ```
    pub fn for_file(bugs: u32, vulnerabilities: u32, duplicated_lines_density: f64) -> Self {
        if bugs > 0 || vulnerabilities > 0 || duplicated_lines_density > MAX_DUPLICATION_DENSITY {
            QualityGate::Failed
        } else {
            QualityGate::Passed
        }
    }

    /// Returns `true` for [`QualityGate::Passed`].
    pub fn is_passed(self) -> bool {
        self == QualityGate::Passed
    }
}

impl fmt::Display for QualityGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityGate::Passed => write!(f, "PASSED"),
            QualityGate::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for QualityGate {
    type Err = String;

    /// Accepts both our own spelling and SonarQube's `alert_status` values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PASSED" | "OK" | "NONE" => Ok(QualityGate::Passed),
            "FAILED" | "ERROR" | "WARN" => Ok(QualityGate::Failed),
            other => Err(format!("unknown quality gate status: {other}")),
        }
    }
}

/// Quality counters attached to a single graph node.
///
/// Either fetched from a metrics provider, or the perfect-health placeholder
/// used for synthesized folders and for files whose metrics are unavailable.
///
/// # Examples
///
/// ```
/// use kachow_core::{MetricsRecord, QualityGate};
///
/// let record = MetricsRecord::perfect();
/// assert_eq!(record.code_smells, 0);
/// assert_eq!(record.coverage, 100.0);
/// assert_eq!(record.quality_gate, QualityGate::Passed);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRecord {
    /// Reliability defects.
    pub bugs: u32,
    /// Security vulnerabilities.
    pub vulnerabilities: u32,
    /// Maintainability issues. This is what the health score averages.
    pub code_smells: u32,
    /// Line coverage percentage (0–100).
    pub coverage: f64,
    /// Percentage of security hotspots reviewed (0–100).
    pub security_hotspots_reviewed: f64,
    /// Duplicated-lines density percentage (0–100).
    pub duplicated_lines_density: f64,
    /// Pass/fail verdict for this node.
    pub quality_gate: QualityGate,
}

impl MetricsRecord {
    /// The perfect-health placeholder: no issues, full coverage, gate passed.
    pub fn perfect() -> Self {
        Self {
            bugs: 0,
            vulnerabilities: 0,
            code_smells: 0,
            coverage: 100.0,
            security_hotspots_reviewed: 100.0,
            duplicated_lines_density: 0.0,
            quality_gate: QualityGate::Passed,
        }
    }

    /// Build a record from raw counters, deriving the quality gate with
    /// [`QualityGate::for_file`].
    ///
    /// # Examples
    ///
    /// ```
    /// use kachow_core::{MetricsRecord, QualityGate};
    ///
    /// let record = MetricsRecord::from_counts(2, 0, 7, 80.0, 100.0, 0.0);
    /// assert_eq!(record.code_smells, 7);
    /// assert_eq!(record.quality_gate, QualityGate::Failed);
    /// ```
    pub fn from_counts(
        bugs: u32,
        vulnerabilities: u32,
        code_smells: u32,
        coverage: f64,
        security_hotspots_reviewed: f64,
        duplicated_lines_density: f64,
    ) -> Self {
        Self {
            bugs,
            vulnerabilities,
            code_smells,
            coverage,
            security_hotspots_reviewed,
            duplicated_lines_density,
            quality_gate: QualityGate::for_file(bugs, vulnerabilities, duplicated_lines_density),
        }
    }
}

impl Default for MetricsRecord {
    fn default() -> Self {
        Self::perfect()
    }
}

/// Project-wide aggregate reported by the metrics provider.
///
/// Ratings follow the SonarQube scale where `1.0` is an A and `5.0` an E.
///
/// # Examples
///
/// ```
/// use kachow_core::ProjectMetrics;
///
/// let metrics = ProjectMetrics::default();
/// assert_eq!(metrics.security_rating, 1.0);
/// assert!(metrics.quality_gate.is_passed());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetrics {
    pub bugs: u32,
    pub vulnerabilities: u32,
    pub code_smells: u32,
    pub coverage: f64,
    pub duplicated_lines_density: f64,
    pub security_rating: f64,
    pub reliability_rating: f64,
    pub maintainability_rating: f64,
    /// Number of open security hotspots.
    pub security_hotspots: u32,
    /// Overall quality-gate status of the project.
    pub quality_gate: QualityGate,
}

impl Default for ProjectMetrics {
    fn default() -> Self {
        Self {
            bugs: 0,
            vulnerabilities: 0,
            code_smells: 0,
            coverage: 100.0,
            duplicated_lines_density: 0.0,
            security_rating: 1.0,
            reliability_rating: 1.0,
            maintainability_rating: 1.0,
            security_hotspots: 0,
            quality_gate: QualityGate::Passed,
        }
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use kachow_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tree and summary.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown architecture map.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
