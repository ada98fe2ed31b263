use std::path::{Component, Path, PathBuf};

use kachow_core::{KachowError, ScanConfig};
use tracing::warn;

/// A file discovered during repository walking.
///
/// Content is not loaded here; the graph builder reads it during the scan
/// pass so reads can run concurrently with metric fetches.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use kachow_graph::walker::{Language, SourceFile};
///
/// let file = SourceFile {
///     path: PathBuf::from("/repo/app/main.py"),
///     relative: "app/main.py".into(),
///     language: Language::Python,
/// };
/// assert_eq!(file.language, Language::Python);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the scan root, always `/`-separated.
    pub relative: String,
    /// Language hint detected from the extension.
    pub language: Language,
}

/// Language hint detected from a file extension.
///
/// # Examples
///
/// ```
/// use kachow_graph::walker::Language;
///
/// assert_eq!(Language::from_extension("py"), Language::Python);
/// assert_eq!(Language::from_extension("tsx"), Language::TypeScript);
/// assert_eq!(Language::from_extension("css"), Language::Css);
/// assert_eq!(Language::from_extension("txt"), Language::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
    Go,
    Java,
    C,
    Cpp,
    Ruby,
    Html,
    Css,
    Unknown,
}

impl Language {
    /// Detect language from a file extension string (without the dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "py" => Language::Python,
            "ts" | "tsx" => Language::TypeScript,
            "js" | "jsx" => Language::JavaScript,
            "go" => Language::Go,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" => Language::Cpp,
            "rb" => Language::Ruby,
            "html" | "htm" => Language::Html,
            "css" => Language::Css,
            _ => Language::Unknown,
        }
    }

    /// Get the tree-sitter grammar used for import extraction.
    ///
    /// Only Python imports are extracted; every other language returns `None`
    /// and contributes nodes but no import edges.
    pub fn tree_sitter_language(&self) -> Option<tree_sitter::Language> {
        match self {
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            _ => None,
        }
    }
}

/// Lazy iterator over the eligible files under a root.
///
/// Created by [`walk_sources`].
pub struct SourceWalk {
    walk: ignore::Walk,
    root: PathBuf,
    config: ScanConfig,
}

impl Iterator for SourceWalk {
    type Item = SourceFile;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walk.next()? {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            let Some(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }

            let path = entry.path();
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if !self.config.accepts_extension(ext) {
                continue;
            }

            let relative = match path.strip_prefix(&self.root) {
                Ok(r) => to_slash_path(r),
                Err(_) => continue,
            };

            return Some(SourceFile {
                path: path.to_path_buf(),
                relative,
                language: Language::from_extension(ext),
            });
        }
    }
}

/// Walk `root`, yielding every file whose extension is allowed by `config`.
///
/// Directories named in the exclusion set are pruned without being entered.
/// Hidden files are included; `.gitignore` rules apply only when
/// `respect_gitignore` is set. Entries are visited in file-name order, so two
/// walks of an unchanged tree yield the same sequence.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use kachow_core::ScanConfig;
/// use kachow_graph::walker::walk_sources;
///
/// for file in walk_sources(Path::new("."), &ScanConfig::default()) {
///     println!("{} ({:?})", file.relative, file.language);
/// }
/// ```
pub fn walk_sources(root: &Path, config: &ScanConfig) -> SourceWalk {
    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b));

    if config.respect_gitignore {
        builder
            .git_ignore(true)
            .git_exclude(true)
            .git_global(true)
            .require_git(false);
    }

    let filter = config.clone();
    builder.filter_entry(move |entry| {
        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        if !is_dir || entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        !filter.is_excluded_dir(&name)
    });

    SourceWalk {
        walk: builder.build(),
        root: root.to_path_buf(),
        config: config.clone(),
    }
}

/// Read a file below `root` for display.
///
/// `relative` must stay inside the root once resolved; `..` escapes and
/// absolute paths outside the tree are rejected.
///
/// # Errors
///
/// Returns [`KachowError::FileNotFound`] if the file does not exist,
/// [`KachowError::Config`] if it resolves outside `root`, or
/// [`KachowError::Io`] if it cannot be read.
pub fn read_source(root: &Path, relative: &str) -> Result<String, KachowError> {
    let root = root
        .canonicalize()
        .map_err(|_| KachowError::FileNotFound(root.to_path_buf()))?;
    let candidate = root.join(relative);
    let resolved = candidate
        .canonicalize()
        .map_err(|_| KachowError::FileNotFound(candidate.clone()))?;

    if !resolved.starts_with(&root) {
        return Err(KachowError::Config(format!(
            "{relative} resolves outside of {}",
            root.display()
        )));
    }

    let bytes = std::fs::read(&resolved)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
