use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use kachow_core::KachowError;

use crate::graph::{GraphEdge, GraphNode, NodeKind, Relation};
use crate::scan::ScanResult;

/// Well-known name of the architecture map written at the scan root.
pub const MAP_FILE_NAME: &str = "_kachow_architecture_map.md";

const MAP_TITLE: &str = "# KA-CHOW System Architecture & Dependency Map";

/// Flatten nodes and edges into the architecture map document.
///
/// Downstream consumers parse this text, so the layout is fixed: a title,
/// one bullet per node under `## 1. File Modules`, one bullet per edge under
/// `## 2. Dependencies & Directory Tree`.
///
/// # Examples
///
/// ```
/// use kachow_core::MetricsRecord;
/// use kachow_graph::graph::{GraphEdge, GraphNode, Relation};
/// use kachow_graph::output::format_architecture_map;
///
/// let nodes = [GraphNode::file("app/main.py", MetricsRecord::perfect())];
/// let edges = [GraphEdge {
///     source: "app".into(),
///     target: "app/main.py".into(),
///     relation: Relation::Contains,
/// }];
///
/// let map = format_architecture_map(&nodes, &edges);
/// assert!(map.contains("- `app/main.py` (Type: file)"));
/// assert!(map.contains("- `app` -> contains -> `app/main.py`"));
/// ```
pub fn format_architecture_map<'a, N, E>(nodes: N, edges: E) -> String
where
    N: IntoIterator<Item = &'a GraphNode>,
    E: IntoIterator<Item = &'a GraphEdge>,
{
    let mut out = String::new();
    let _ = writeln!(out, "{MAP_TITLE}\n");

    out.push_str("## 1. File Modules\n");
    for node in nodes {
        let _ = writeln!(out, "- `{}` (Type: {})", node.id, node.kind);
    }

    out.push_str("\n## 2. Dependencies & Directory Tree\n");
    for edge in edges {
        let _ = writeln!(
            out,
            "- `{}` -> {} -> `{}`",
            edge.source, edge.relation, edge.target
        );
    }

    out
}

/// Write the architecture map to [`MAP_FILE_NAME`] under `root`, replacing
/// any previous map.
///
/// # Errors
///
/// Returns [`KachowError::Io`] if the file cannot be written.
pub fn write_architecture_map(
    root: &Path,
    nodes: &[GraphNode],
    edges: &[GraphEdge],
) -> Result<PathBuf, KachowError> {
    let path = root.join(MAP_FILE_NAME);
    std::fs::write(&path, format_architecture_map(nodes, edges))?;
    Ok(path)
}

/// Render a scan as a box-drawing tree: folders, their files, and each
/// file's import targets, followed by health and any diagnostics.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use kachow_core::ProjectMetrics;
/// use kachow_graph::health::ScanVerdict;
/// use kachow_graph::output::format_tree;
/// use kachow_graph::scan::ScanResult;
///
/// let result = ScanResult {
///     project_name: "empty".into(),
///     project_root: PathBuf::from("/tmp/empty"),
///     nodes: vec![],
///     edges: vec![],
///     health_score: 100.0,
///     system_health: ProjectMetrics::default(),
///     verdict: ScanVerdict::Success,
///     diagnostics: vec![],
/// };
/// let tree = format_tree(&result);
/// assert!(tree.starts_with("empty"));
/// assert!(tree.contains("no source files"));
/// ```
pub fn format_tree(result: &ScanResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({} files, health {:.2}, gate {}, {})",
        result.project_name,
        result.file_count(),
        result.health_score,
        result.system_health.quality_gate,
        result.verdict
    );

    let by_folder = files_by_folder(&result.nodes);
    if by_folder.is_empty() {
        out.push_str("  (no source files)\n");
    }

    let imports = import_targets(&result.edges);
    let folder_count = by_folder.len();
    for (folder_idx, (folder, files)) in by_folder.iter().enumerate() {
        let is_last_folder = folder_idx == folder_count - 1;
        let folder_prefix = if is_last_folder {
            "\u{2514}\u{2500}\u{2500} "
        } else {
            "\u{251c}\u{2500}\u{2500} "
        };
        let _ = writeln!(out, "{folder_prefix}{folder}/");

        let child_prefix = if is_last_folder { "    " } else { "\u{2502}   " };
        let file_count = files.len();
        for (file_idx, file) in files.iter().enumerate() {
            let is_last_file = file_idx == file_count - 1;
            let file_prefix = if is_last_file {
                "\u{2514}\u{2500}\u{2500} "
            } else {
                "\u{251c}\u{2500}\u{2500} "
            };
            let _ = write!(out, "{child_prefix}{file_prefix}{}", file.label);
            if file.metrics.code_smells > 0 {
                let _ = write!(out, " [{} smells]", file.metrics.code_smells);
            }
            if let Some(targets) = imports.get(file.id.as_str()) {
                let _ = write!(out, " -> {}", targets.join(", "));
            }
            out.push('\n');
        }
    }

    if !result.diagnostics.is_empty() {
        let _ = writeln!(out, "\n{} diagnostics:", result.diagnostics.len());
        for d in &result.diagnostics {
            let _ = writeln!(out, "  [{}] {}: {}", d.stage, d.path, d.message);
        }
    }

    out
}

/// Serialize the whole scan result as pretty JSON.
///
/// # Errors
///
/// Returns [`KachowError::Serialization`] if serialization fails.
pub fn format_json(result: &ScanResult) -> Result<String, KachowError> {
    serde_json::to_string_pretty(result).map_err(KachowError::from)
}

/// The architecture map followed by a health section.
pub fn format_markdown(result: &ScanResult) -> String {
    let mut out = format_architecture_map(&result.nodes, &result.edges);
    let metrics = &result.system_health;

    out.push_str("\n## 3. System Health\n");
    let _ = writeln!(out, "- Health score: {:.2}", result.health_score);
    let _ = writeln!(out, "- Verdict: {}", result.verdict);
    let _ = writeln!(out, "- Quality gate: {}", metrics.quality_gate);
    let _ = writeln!(out, "- Bugs: {}", metrics.bugs);
    let _ = writeln!(out, "- Vulnerabilities: {}", metrics.vulnerabilities);
    let _ = writeln!(out, "- Code smells: {}", metrics.code_smells);
    let _ = writeln!(out, "- Coverage: {:.1}%", metrics.coverage);

    if !result.diagnostics.is_empty() {
        out.push_str("\n## 4. Diagnostics\n");
        for d in &result.diagnostics {
            let _ = writeln!(out, "- `{}` ({}): {}", d.path, d.stage, d.message);
        }
    }

    out
}

/// File nodes grouped by containing folder; top-level files go under `.`.
fn files_by_folder(nodes: &[GraphNode]) -> BTreeMap<&str, Vec<&GraphNode>> {
    let mut by_folder: BTreeMap<&str, Vec<&GraphNode>> = BTreeMap::new();
    for node in nodes.iter().filter(|n| n.kind == NodeKind::File) {
        let folder = node.id.rsplit_once('/').map_or(".", |(parent, _)| parent);
        by_folder.entry(folder).or_default().push(node);
    }
    for files in by_folder.values_mut() {
        files.sort_by(|a, b| a.id.cmp(&b.id));
    }
    by_folder
}

fn import_targets(edges: &[GraphEdge]) -> BTreeMap<&str, Vec<&str>> {
    let mut targets: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for edge in edges.iter().filter(|e| e.relation == Relation::Imports) {
        targets
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::ScanVerdict;
    use crate::scan::{DiagnosticStage, ScanDiagnostic};
    use kachow_core::{MetricsRecord, ProjectMetrics};

    fn edge(source: &str, target: &str, relation: Relation) -> GraphEdge {
        GraphEdge {
            source: source.into(),
            target: target.into(),
            relation,
        }
    }

    fn sample() -> ScanResult {
        let mut smelly = MetricsRecord::perfect();
        smelly.code_smells = 4;
        ScanResult {
            project_name: "shop".into(),
            project_root: PathBuf::from("/srv/shop"),
            nodes: vec![
                GraphNode::file("main.py", MetricsRecord::perfect()),
                GraphNode::file("app/db.py", smelly),
                GraphNode::file("app/api.py", MetricsRecord::perfect()),
                GraphNode::folder("app"),
            ],
            edges: vec![
                edge("main.py", "app/api.py", Relation::Imports),
                edge("app/api.py", "app/db.py", Relation::Imports),
                edge("app", "app/db.py", Relation::Contains),
                edge("app", "app/api.py", Relation::Contains),
            ],
            health_score: 98.67,
            system_health: ProjectMetrics::default(),
            verdict: ScanVerdict::Success,
            diagnostics: vec![ScanDiagnostic {
                path: "main.py".into(),
                stage: DiagnosticStage::Parse,
                message: "syntax error near line 3".into(),
            }],
        }
    }

    #[test]
    fn architecture_map_layout() {
        let result = sample();
        let map = format_architecture_map(&result.nodes, &result.edges);
        let lines: Vec<&str> = map.lines().collect();

        assert_eq!(lines[0], MAP_TITLE);
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "## 1. File Modules");
        assert_eq!(lines[3], "- `main.py` (Type: file)");
        assert_eq!(lines[6], "- `app` (Type: folder)");
        assert_eq!(lines[7], "");
        assert_eq!(lines[8], "## 2. Dependencies & Directory Tree");
        assert_eq!(lines[9], "- `main.py` -> imports -> `app/api.py`");
        assert_eq!(lines[12], "- `app` -> contains -> `app/api.py`");
        assert_eq!(lines.len(), 13);
    }

    #[test]
    fn write_map_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MAP_FILE_NAME), "stale").unwrap();

        let result = sample();
        let path = write_architecture_map(dir.path(), &result.nodes, &result.edges).unwrap();
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.starts_with(MAP_TITLE));
        assert!(!written.contains("stale"));
    }

    #[test]
    fn tree_groups_files_by_folder() {
        let tree = format_tree(&sample());
        assert!(tree.starts_with("shop (3 files, health 98.67, gate PASSED, success)"));
        assert!(tree.contains("\u{251c}\u{2500}\u{2500} ./"));
        assert!(tree.contains("\u{2514}\u{2500}\u{2500} app/"));
        assert!(tree.contains("api.py -> app/db.py"));
        assert!(tree.contains("db.py [4 smells]"));
        assert!(tree.contains("[parse] main.py: syntax error near line 3"));
    }

    #[test]
    fn json_is_camel_case() {
        let json = format_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["projectName"], "shop");
        assert_eq!(value["healthScore"], 98.67);
        assert_eq!(value["systemHealth"]["qualityGate"], "PASSED");
        assert_eq!(value["nodes"][1]["metrics"]["codeSmells"], 4);
        assert_eq!(value["edges"][0]["relation"], "imports");
        assert_eq!(value["diagnostics"][0]["stage"], "parse");
    }

    #[test]
    fn markdown_appends_health_section() {
        let md = format_markdown(&sample());
        assert!(md.starts_with(MAP_TITLE));
        assert!(md.contains("## 3. System Health"));
        assert!(md.contains("- Health score: 98.67"));
        assert!(md.contains("## 4. Diagnostics"));
    }
}
