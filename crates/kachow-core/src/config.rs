use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::KachowError;

/// Extensions (without the dot) of files that become graph nodes.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "tsx", "jsx", "html", "css", "java", "cpp", "c", "go", "rb",
];

/// Directory names that are never descended into: version control metadata,
/// dependency caches, virtual environments, and IDE state.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "__pycache__",
    "venv",
    ".venv",
    ".idea",
    ".vscode",
];

/// Top-level configuration loaded from `.kachow.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
///
/// # Examples
///
/// ```
/// use kachow_core::KachowConfig;
///
/// let config = KachowConfig::default();
/// assert_eq!(config.scan.concurrency, 8);
/// assert!(config.scan.write_map);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KachowConfig {
    /// Repository walking and graph construction settings.
    #[serde(default)]
    pub scan: ScanConfig,
    /// Quality metrics provider settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Commit history settings.
    #[serde(default)]
    pub history: HistoryConfig,
}

impl KachowConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`KachowError::Io`] if the file cannot be read, or
    /// [`KachowError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use kachow_core::KachowConfig;
    /// use std::path::Path;
    ///
    /// let config = KachowConfig::from_file(Path::new(".kachow.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, KachowError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`KachowError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use kachow_core::KachowConfig;
    ///
    /// let toml = r#"
    /// [scan]
    /// concurrency = 2
    /// "#;
    /// let config = KachowConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.scan.concurrency, 2);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, KachowError> {
        let config: Self = toml::from_str(content)?;
        config.scan.validate()?;
        Ok(config)
    }
}

/// Settings for the source walker and graph builder.
///
/// # Examples
///
/// ```
/// use kachow_core::ScanConfig;
///
/// let config = ScanConfig::default();
/// assert!(config.is_excluded_dir("node_modules"));
/// assert!(config.accepts_extension("py"));
/// assert!(!config.accepts_extension("md"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// File extensions (without the dot) that become graph nodes.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Extra directory names to prune, on top of [`DEFAULT_EXCLUDED_DIRS`].
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
    /// Honor `.gitignore` files while walking (default: false).
    #[serde(default)]
    pub respect_gitignore: bool,
    /// Files larger than this many bytes keep their node but are not read.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Maximum number of in-flight file reads / metric fetches.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Write the architecture map file into the scan root (default: true).
    #[serde(default = "default_write_map")]
    pub write_map: bool,
}

impl ScanConfig {
    /// Returns `true` if a directory with this name must not be descended into.
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        DEFAULT_EXCLUDED_DIRS.contains(&name) || self.exclude_dirs.iter().any(|d| d == name)
    }

    /// Returns `true` if files with this extension are walked.
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }

    fn validate(&self) -> Result<(), KachowError> {
        if self.concurrency == 0 {
            return Err(KachowError::Config(
                "scan.concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect()
}

fn default_max_file_size() -> u64 {
    1_048_576
}

fn default_concurrency() -> usize {
    8
}

fn default_write_map() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude_dirs: Vec::new(),
            respect_gitignore: false,
            max_file_size: default_max_file_size(),
            concurrency: default_concurrency(),
            write_map: default_write_map(),
        }
    }
}

/// Which metrics backend to query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsProvider {
    /// A SonarQube / SonarCloud server.
    #[default]
    Sonar,
    /// No provider: every node gets perfect-health metrics.
    None,
}

/// Metrics provider configuration.
///
/// # Examples
///
/// ```
/// use kachow_core::{MetricsConfig, MetricsProvider};
///
/// let config = MetricsConfig::default();
/// assert_eq!(config.provider, MetricsProvider::Sonar);
/// assert_eq!(config.base_url, "http://localhost:9000");
/// assert_eq!(config.timeout_secs, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub provider: MetricsProvider,
    /// Server base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// User token, sent as the basic-auth user name.
    pub token: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Project key on the server (default: the scan root's directory name).
    pub project_key: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:9000".into()
}

fn default_timeout_secs() -> u64 {
    3
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            provider: MetricsProvider::default(),
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
            project_key: None,
        }
    }
}

/// Commit history configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Number of commits shown by `kachow history` (default: 10).
    #[serde(default = "default_max_commits")]
    pub max_commits: usize,
}

fn default_max_commits() -> usize {
    10
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_commits: default_max_commits(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = KachowConfig::default();
        assert_eq!(config.scan.extensions.len(), DEFAULT_EXTENSIONS.len());
        assert!(config.scan.exclude_dirs.is_empty());
        assert!(!config.scan.respect_gitignore);
        assert_eq!(config.scan.max_file_size, 1_048_576);
        assert_eq!(config.scan.concurrency, 8);
        assert!(config.scan.write_map);
        assert_eq!(config.metrics.provider, MetricsProvider::Sonar);
        assert!(config.metrics.token.is_none());
        assert!(config.metrics.project_key.is_none());
        assert_eq!(config.history.max_commits, 10);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[scan]
extensions = ["py", "rs"]
exclude_dirs = ["build", "dist"]
respect_gitignore = true
concurrency = 4
write_map = false

[metrics]
provider = "none"
base_url = "https://sonarcloud.io"
token = "squ_abc"
timeout_secs = 10
project_key = "acme_api"

[history]
max_commits = 25
"#;
        let config = KachowConfig::from_toml(toml).unwrap();
        assert_eq!(config.scan.extensions, vec!["py", "rs"]);
        assert!(config.scan.is_excluded_dir("dist"));
        assert!(config.scan.is_excluded_dir(".git"));
        assert!(config.scan.respect_gitignore);
        assert_eq!(config.scan.concurrency, 4);
        assert!(!config.scan.write_map);
        assert_eq!(config.metrics.provider, MetricsProvider::None);
        assert_eq!(config.metrics.token.as_deref(), Some("squ_abc"));
        assert_eq!(config.metrics.timeout_secs, 10);
        assert_eq!(config.metrics.project_key.as_deref(), Some("acme_api"));
        assert_eq!(config.history.max_commits, 25);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = KachowConfig::from_toml("").unwrap();
        assert_eq!(config.scan.concurrency, 8);
        assert_eq!(config.metrics.base_url, "http://localhost:9000");
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = KachowConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let result = KachowConfig::from_toml("[scan]\nconcurrency = 0\n");
        assert!(matches!(result, Err(KachowError::Config(_))));
    }

    #[test]
    fn extension_allow_list() {
        let config = ScanConfig::default();
        for ext in ["py", "tsx", "go", "rb", "css"] {
            assert!(config.accepts_extension(ext), "{ext} should be accepted");
        }
        assert!(!config.accepts_extension("md"));
        assert!(!config.accepts_extension("rs"));
    }
}
