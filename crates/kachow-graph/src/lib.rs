//! Repository dependency graph via tree-sitter import extraction.
//!
//! Walks a source tree, names every file as a dotted module, extracts Python
//! imports with tree-sitter, resolves them back to repository files, and
//! rescues every nested file under a synthesized folder node. The finished
//! graph carries per-file metrics and an aggregate health score, and is
//! flattened into an architecture map for downstream tools.

pub mod graph;
pub mod health;
pub mod imports;
pub mod namer;
pub mod output;
pub mod resolver;
pub mod scan;
pub mod walker;

pub use graph::{DependencyGraph, GraphEdge, GraphNode, Layer, NodeKind, Relation};
pub use health::{health_score, ScanVerdict};
pub use scan::{scan_repository, DiagnosticStage, ScanDiagnostic, ScanResult};

use std::path::Path;

use kachow_core::{KachowError, MetricsSource, OutputFormat, ScanConfig};

/// Scan the repository at `root` and render the result in `format`.
///
/// # Errors
///
/// Returns [`KachowError`] if the root is missing or is not a directory, or
/// if JSON serialization fails.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use kachow_core::{NoMetrics, OutputFormat, ScanConfig};
/// use kachow_graph::generate_report;
///
/// # async fn run() -> kachow_core::Result<()> {
/// let report = generate_report(
///     Path::new("."),
///     &ScanConfig::default(),
///     &NoMetrics,
///     None,
///     OutputFormat::Text,
/// )
/// .await?;
/// println!("{report}");
/// # Ok(())
/// # }
/// ```
pub async fn generate_report(
    root: &Path,
    config: &ScanConfig,
    metrics: &dyn MetricsSource,
    project_key: Option<&str>,
    format: OutputFormat,
) -> Result<String, KachowError> {
    let result = scan_repository(root, config, metrics, project_key).await?;

    match format {
        OutputFormat::Text => Ok(output::format_tree(&result)),
        OutputFormat::Json => output::format_json(&result),
        OutputFormat::Markdown => Ok(output::format_markdown(&result)),
    }
}
