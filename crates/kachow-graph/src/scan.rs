//! The three-pass scan: map files, resolve imports, rescue orphans.

use std::fmt;
use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use kachow_core::{KachowError, MetricsRecord, MetricsSource, ProjectMetrics, ScanConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::graph::{DependencyGraph, GraphEdge, GraphNode, NodeKind, Relation};
use crate::health::{health_score, ScanVerdict};
use crate::imports::extract_imports;
use crate::namer::ModuleMap;
use crate::output;
use crate::resolver::resolve_import;
use crate::walker::{self, Language, SourceFile};

/// Stage of the scan at which a file degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticStage {
    /// Content could not be read; the file was mapped with empty content.
    Read,
    /// Content is not parseable; the file contributes no import edges.
    Parse,
    /// Metrics were unavailable; a placeholder record was used.
    Metrics,
    /// The architecture map could not be written.
    Map,
}

impl fmt::Display for DiagnosticStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticStage::Read => write!(f, "read"),
            DiagnosticStage::Parse => write!(f, "parse"),
            DiagnosticStage::Metrics => write!(f, "metrics"),
            DiagnosticStage::Map => write!(f, "map"),
        }
    }
}

/// A non-fatal problem recorded during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDiagnostic {
    /// Relative path the problem relates to (the map file for `map`, empty
    /// for project-level metrics).
    pub path: String,
    pub stage: DiagnosticStage,
    pub message: String,
}

/// The outcome of scanning one repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// Name of the scan root directory.
    pub project_name: String,
    /// Absolute, canonical scan root.
    pub project_root: PathBuf,
    /// File nodes in walk order, then folder nodes.
    pub nodes: Vec<GraphNode>,
    /// Import edges, then containment edges.
    pub edges: Vec<GraphEdge>,
    /// 0–100, see [`health_score`].
    pub health_score: f64,
    /// Project-level metrics and quality gate.
    pub system_health: ProjectMetrics,
    pub verdict: ScanVerdict,
    pub diagnostics: Vec<ScanDiagnostic>,
}

impl ScanResult {
    /// Number of file nodes.
    pub fn file_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::File)
            .count()
    }

    /// Edges with the given relation.
    pub fn edges_of(&self, relation: Relation) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |e| e.relation == relation)
    }
}

/// A walked file after its content read and metrics fetch have completed.
struct FetchedFile {
    file: SourceFile,
    content: Result<String, String>,
    metrics: Result<MetricsRecord, KachowError>,
}

/// A mapped file waiting for import resolution.
struct PendingFile {
    id: String,
    language: Language,
    content: String,
}

/// Mutable state of one scan. Built fresh per call and consumed by
/// [`ScanContext::finish`], so nothing leaks between repositories.
struct ScanContext {
    modules: ModuleMap,
    graph: DependencyGraph,
    pending: Vec<PendingFile>,
    diagnostics: Vec<ScanDiagnostic>,
}

impl ScanContext {
    fn new() -> Self {
        Self {
            modules: ModuleMap::default(),
            graph: DependencyGraph::new(),
            pending: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn diagnose(&mut self, path: &str, stage: DiagnosticStage, message: impl Into<String>) {
        let message = message.into();
        warn!(path, %stage, %message, "degraded during scan");
        self.diagnostics.push(ScanDiagnostic {
            path: path.to_string(),
            stage,
            message,
        });
    }

    /// Pass 1 reduction: register modules and insert file nodes.
    fn map_files(&mut self, fetched: Vec<FetchedFile>) {
        for FetchedFile {
            file,
            content,
            metrics,
        } in fetched
        {
            let (module, replaced) = self.modules.register(&file.relative);
            if let Some(previous) = replaced {
                debug!(%module, %previous, current = %file.relative, "module name collision");
            }

            let metrics = metrics.unwrap_or_else(|e| {
                self.diagnose(&file.relative, DiagnosticStage::Metrics, e.to_string());
                MetricsRecord::perfect()
            });

            let content = content.unwrap_or_else(|e| {
                self.diagnose(&file.relative, DiagnosticStage::Read, e);
                String::new()
            });

            self.graph.add_node(GraphNode::file(&file.relative, metrics));
            self.pending.push(PendingFile {
                id: file.relative,
                language: file.language,
                content,
            });
        }
        debug!(files = self.graph.node_count(), modules = self.modules.len(), "pass 1 complete");
    }

    /// Pass 2: extract and resolve imports. Content is dropped afterwards.
    fn resolve_imports(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for file in pending {
            let references = match extract_imports(&file.content, file.language) {
                Ok(refs) => refs,
                Err(e) => {
                    self.diagnose(&file.id, DiagnosticStage::Parse, e.to_string());
                    continue;
                }
            };

            for reference in &references {
                let Some(target) = resolve_import(&self.modules, reference) else {
                    continue;
                };
                if self.graph.add_edge(&file.id, target, Relation::Imports) {
                    debug!(source = %file.id, %target, %reference, "import edge");
                }
            }
        }
        debug!(edges = self.graph.edge_count(), "pass 2 complete");
    }

    /// Pass 3: give every file a containing folder node.
    fn rescue_orphans(&mut self) {
        for id in self.graph.file_ids() {
            let Some((parent, _)) = id.rsplit_once('/') else {
                continue;
            };
            if parent.is_empty() {
                continue;
            }
            if !self.graph.contains_node(parent) {
                self.graph.add_node(GraphNode::folder(parent));
            }
            self.graph.add_edge(parent, &id, Relation::Contains);
        }
        debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "pass 3 complete"
        );
    }
}

/// Scan the repository at `root` and build its dependency graph.
///
/// Runs the three passes in order. File reads and metric fetches of the
/// first pass run concurrently (at most `config.concurrency` at a time) and
/// are joined before any import is resolved. Unreadable files, unparseable
/// sources, metrics outages and map-write failures degrade into
/// [`ScanResult::diagnostics`] instead of failing the scan.
///
/// `project_key` addresses the project on the metrics provider and defaults
/// to the root directory's name.
///
/// # Errors
///
/// Returns [`KachowError::FileNotFound`] if `root` does not exist and
/// [`KachowError::NotADirectory`] if it is not a directory.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use kachow_core::{NoMetrics, ScanConfig};
/// use kachow_graph::scan_repository;
///
/// # async fn run() -> kachow_core::Result<()> {
/// let result = scan_repository(Path::new("."), &ScanConfig::default(), &NoMetrics, None).await?;
/// println!("{} nodes, health {}", result.nodes.len(), result.health_score);
/// # Ok(())
/// # }
/// ```
pub async fn scan_repository(
    root: &Path,
    config: &ScanConfig,
    metrics: &dyn MetricsSource,
    project_key: Option<&str>,
) -> Result<ScanResult, KachowError> {
    if !root.exists() {
        return Err(KachowError::FileNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(KachowError::NotADirectory(root.to_path_buf()));
    }
    let root = root.canonicalize()?;
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());
    let project_key = project_key.unwrap_or(&project_name).to_string();

    info!(
        project = %project_name,
        root = %root.display(),
        metrics = metrics.name(),
        "scanning repository"
    );

    let files = {
        let root = root.clone();
        let config = config.clone();
        tokio::task::spawn_blocking(move || {
            walker::walk_sources(&root, &config).collect::<Vec<_>>()
        })
        .await
        .map_err(|e| KachowError::Io(std::io::Error::other(e)))?
    };
    debug!(files = files.len(), "walk complete");

    let max_file_size = config.max_file_size;
    let fetched: Vec<FetchedFile> = stream::iter(files)
        .map(|file| fetch_file(file, max_file_size, metrics, &project_key))
        .buffered(config.concurrency.max(1))
        .collect()
        .await;

    let mut ctx = ScanContext::new();
    ctx.map_files(fetched);
    ctx.resolve_imports();
    ctx.rescue_orphans();

    ctx.finish(&root, project_name, &project_key, config, metrics)
        .await
}

impl ScanContext {
    /// Score, export the map, attach project metrics and freeze the result.
    async fn finish(
        mut self,
        root: &Path,
        project_name: String,
        project_key: &str,
        config: &ScanConfig,
        metrics: &dyn MetricsSource,
    ) -> Result<ScanResult, KachowError> {
        let score = health_score(
            self.graph
                .nodes()
                .filter(|n| n.kind == NodeKind::File)
                .map(|n| &n.metrics),
        );

        let (nodes, edges) = std::mem::take(&mut self.graph).into_parts();
        if config.write_map {
            match output::write_architecture_map(root, &nodes, &edges) {
                Ok(path) => debug!(path = %path.display(), "architecture map written"),
                Err(e) => self.diagnose(output::MAP_FILE_NAME, DiagnosticStage::Map, e.to_string()),
            }
        }

        let system_health = match metrics.project_metrics(project_key).await {
            Ok(m) => m,
            Err(e) => {
                self.diagnose("", DiagnosticStage::Metrics, e.to_string());
                ProjectMetrics::default()
            }
        };

        let verdict = ScanVerdict::from_project(&system_health);
        let files = nodes.iter().filter(|n| n.kind == NodeKind::File).count();
        match verdict {
            ScanVerdict::Critical => warn!(
                project = %project_name,
                vulnerabilities = system_health.vulnerabilities,
                "vulnerabilities detected, immediate review required"
            ),
            ScanVerdict::Warning => warn!(
                project = %project_name,
                bugs = system_health.bugs,
                "high bug count"
            ),
            ScanVerdict::Success => info!(
                project = %project_name,
                files,
                health = score,
                "knowledge graph ready"
            ),
        }

        Ok(ScanResult {
            project_name,
            project_root: root.to_path_buf(),
            nodes,
            edges,
            health_score: score,
            system_health,
            verdict,
            diagnostics: self.diagnostics,
        })
    }
}

async fn fetch_file(
    file: SourceFile,
    max_file_size: u64,
    metrics: &dyn MetricsSource,
    project_key: &str,
) -> FetchedFile {
    let (content, metrics) = tokio::join!(
        read_content(&file.path, max_file_size),
        metrics.file_metrics(&file.relative, project_key),
    );
    FetchedFile {
        file,
        content,
        metrics,
    }
}

/// Best-effort read. Invalid UTF-8 is replaced rather than rejected.
async fn read_content(path: &Path, max_file_size: u64) -> Result<String, String> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| format!("failed to stat file: {e}"))?;
    if metadata.len() > max_file_size {
        return Err(format!(
            "file is {} bytes, larger than the {max_file_size} byte limit",
            metadata.len()
        ));
    }
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("failed to read file: {e}"))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
