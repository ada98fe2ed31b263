use async_trait::async_trait;

use crate::error::KachowError;
use crate::types::{MetricsRecord, ProjectMetrics};

/// A provider of per-file and per-project quality metrics.
///
/// Implementations validate whatever the backend returns into the fixed-shape
/// [`MetricsRecord`] / [`ProjectMetrics`] records. Errors are allowed here;
/// the scan engine turns them into placeholders and diagnostics, so a
/// provider outage never aborts a scan.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &'static str;

    /// Metrics for one file, addressed by its path relative to the scan root.
    async fn file_metrics(
        &self,
        relative_path: &str,
        project_key: &str,
    ) -> Result<MetricsRecord, KachowError>;

    /// Aggregate metrics for the whole project.
    async fn project_metrics(&self, project_key: &str) -> Result<ProjectMetrics, KachowError>;
}

/// A metrics source that reports perfect health for everything.
///
/// Used when no provider is configured.
///
/// # Examples
///
/// ```
/// use kachow_core::{MetricsSource, NoMetrics};
///
/// assert_eq!(NoMetrics.name(), "none");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetrics;

#[async_trait]
impl MetricsSource for NoMetrics {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn file_metrics(
        &self,
        _relative_path: &str,
        _project_key: &str,
    ) -> Result<MetricsRecord, KachowError> {
        Ok(MetricsRecord::perfect())
    }

    async fn project_metrics(&self, _project_key: &str) -> Result<ProjectMetrics, KachowError> {
        Ok(ProjectMetrics::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_metrics_reports_perfect_health() {
        let file = NoMetrics.file_metrics("src/app.py", "demo").await.unwrap();
        assert_eq!(file, MetricsRecord::perfect());

        let project = NoMetrics.project_metrics("demo").await.unwrap();
        assert_eq!(project, ProjectMetrics::default());
    }
}
