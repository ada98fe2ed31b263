use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use miette::{Context, IntoDiagnostic, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use kachow_core::{KachowConfig, KachowError, OutputFormat};
use kachow_graph::{output, ScanVerdict};

const CONFIG_FILE_NAME: &str = ".kachow.toml";

#[derive(Parser)]
#[command(
    name = "kachow",
    version,
    about = "Repository dependency graphs with quality metrics",
    long_about = "KA-CHOW maps a repository into a graph of files and folders, resolves\n\
                   Python imports between files, attaches per-file quality metrics from\n\
                   SonarQube, and scores overall project health.\n\n\
                   Examples:\n  \
                     kachow scan --path .                Scan and print the dependency tree\n  \
                     kachow --format json scan           Full graph as JSON\n  \
                     kachow history --limit 5            Recent commits\n  \
                     kachow show app/main.py             Print a file from the scanned tree\n  \
                     kachow init                         Create a .kachow.toml config file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .kachow.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable trees and lists (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  Architecture map / Markdown tables"
    )]
    format: OutputFormat,

    /// Enable debug logging on stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build the dependency graph of a repository
    #[command(long_about = "Build the dependency graph of a repository.\n\n\
        Walks the tree, resolves imports between files, rescues nested files under\n\
        folder nodes, fetches quality metrics, and writes _kachow_architecture_map.md\n\
        at the repository root.\n\n\
        Examples:\n  kachow scan --path .\n  kachow scan --project-key shop --sonar-url http://sonar:9000\n  kachow --format markdown scan --no-map")]
    Scan {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Project key on the metrics server (default: directory name)
        #[arg(long)]
        project_key: Option<String>,

        /// Do not write the architecture map file
        #[arg(long)]
        no_map: bool,

        /// SonarQube base URL
        #[arg(long, env = "SONAR_URL")]
        sonar_url: Option<String>,

        /// SonarQube user token
        #[arg(long, env = "SONAR_TOKEN", hide_env_values = true)]
        sonar_token: Option<String>,
    },
    /// Show recent commits
    History {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Number of commits (default: history.max_commits from config)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List local branches
    Branches {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Print a file from the repository
    Show {
        /// File path relative to the repository root
        file: String,

        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Create a default .kachow.toml configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# KA-CHOW Configuration

[scan]
# extensions = ["py", "js", "ts", "tsx", "jsx", "html", "css", "java", "cpp", "c", "go", "rb"]
# Extra directory names to skip, on top of .git, node_modules, __pycache__, venv, ...
# exclude_dirs = ["build", "dist"]
# respect_gitignore = false
# max_file_size = 1048576
# concurrency = 8
# write_map = true

[metrics]
# provider = "sonar"    # or "none"
# base_url = "http://localhost:9000"   # or SONAR_URL
# token = ""                           # or SONAR_TOKEN
# timeout_secs = 3
# project_key = "my-project"           # default: repository directory name

[history]
# max_commits = 10
"#;

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!("kachow v{version}: repository dependency graphs with quality metrics\n");

    println!("Quick start:");
    println!("  kachow init                   Create a .kachow.toml config file");
    println!("  kachow scan --path .          Build the dependency graph\n");

    println!("All commands:");
    println!("  scan      Dependency graph, health score, architecture map");
    println!("  history   Recent commits");
    println!("  branches  Local branches");
    println!("  show      Print a file from the repository");
    println!("  init      Create default configuration\n");

    println!("Run 'kachow <command> --help' for details.");
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<KachowConfig> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let default_path = Path::new(CONFIG_FILE_NAME);
            if !default_path.exists() {
                return Ok(KachowConfig::default());
            }
            default_path
        }
    };
    debug!(path = %path.display(), "loading configuration");
    KachowConfig::from_file(path)
        .into_diagnostic()
        .wrap_err(format!("loading {}", path.display()))
}

fn spinner(message: &'static str) -> Option<ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})").ok()?;
    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

/// Turn a scan root error into a diagnostic with a hint.
fn root_error(err: KachowError) -> miette::Report {
    match err {
        KachowError::FileNotFound(path) => miette::miette!(
            help = "Pass --path pointing at an existing repository",
            "Repository path does not exist: {}",
            path.display()
        ),
        KachowError::NotADirectory(path) => miette::miette!(
            help = "--path must be a directory, not a file",
            "Not a directory: {}",
            path.display()
        ),
        other => miette::miette!("{other}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    debug!(format = %cli.format, "configuration ready");

    match cli.command {
        None => {
            print_welcome();
        }
        Some(Command::Scan {
            ref path,
            ref project_key,
            no_map,
            ref sonar_url,
            ref sonar_token,
        }) => {
            let mut scan_config = config.scan.clone();
            if no_map {
                scan_config.write_map = false;
            }

            let mut metrics_config = config.metrics.clone();
            if let Some(url) = sonar_url {
                metrics_config.base_url = url.clone();
            }
            if let Some(token) = sonar_token {
                metrics_config.token = Some(token.clone());
            }
            let project_key = project_key
                .as_deref()
                .or(metrics_config.project_key.as_deref());

            let metrics = kachow_metrics::source_from_config(&metrics_config).into_diagnostic()?;

            let pb = spinner("Building dependency graph...");
            let result = kachow_graph::scan_repository(
                path,
                &scan_config,
                metrics.as_ref(),
                project_key,
            )
            .await
            .inspect_err(|_e| {
                if let Some(pb) = &pb {
                    pb.finish_with_message("Failed");
                }
            })
            .map_err(root_error)?;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }

            match cli.format {
                OutputFormat::Json => println!("{}", output::format_json(&result).into_diagnostic()?),
                OutputFormat::Markdown => print!("{}", output::format_markdown(&result)),
                OutputFormat::Text => print!("{}", output::format_tree(&result)),
            }

            match result.verdict {
                ScanVerdict::Critical => eprintln!(
                    "CRITICAL: {} vulnerabilities detected, immediate review required.",
                    result.system_health.vulnerabilities
                ),
                ScanVerdict::Warning => eprintln!(
                    "WARNING: high bug count ({}), review recommended.",
                    result.system_health.bugs
                ),
                ScanVerdict::Success => {}
            }
            if !result.diagnostics.is_empty() {
                eprintln!(
                    "{} file(s) degraded during the scan; run with --verbose for details.",
                    result.diagnostics.len()
                );
            }
        }
        Some(Command::History { ref path, limit }) => {
            let limit = limit.unwrap_or(config.history.max_commits);
            let commits = kachow_history::recent_commits(path, limit).map_err(|e| {
                miette::miette!(
                    help = "Run kachow from inside a git repository, or specify --path to one",
                    "{e}"
                )
            })?;

            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&commits).into_diagnostic()?);
                }
                OutputFormat::Markdown => {
                    println!("| Commit | Date | Author | Message |");
                    println!("|--------|------|--------|---------|");
                    for c in &commits {
                        println!(
                            "| `{}` | {} | {} | {} |",
                            c.hash,
                            c.date,
                            c.author,
                            c.message.replace('|', "\\|")
                        );
                    }
                }
                OutputFormat::Text => {
                    if commits.is_empty() {
                        println!("No commits yet.");
                    }
                    for c in &commits {
                        println!("{}  {:<13}  {:<20}  {}", c.hash, c.date, c.author, c.message);
                    }
                }
            }
        }
        Some(Command::Branches { ref path }) => {
            let branches = kachow_history::local_branches(path);
            let current = kachow_history::current_branch(path);

            match cli.format {
                OutputFormat::Json => {
                    let json = serde_json::json!({
                        "current": current,
                        "branches": branches,
                    });
                    println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
                }
                OutputFormat::Markdown | OutputFormat::Text => {
                    for name in &branches {
                        let marker = if current.as_deref() == Some(name.as_str()) {
                            "*"
                        } else {
                            " "
                        };
                        println!("{marker} {name}");
                    }
                }
            }
        }
        Some(Command::Show { ref file, ref path }) => {
            let content = kachow_graph::walker::read_source(path, file)
                .into_diagnostic()
                .wrap_err(format!("reading {file}"))?;

            match cli.format {
                OutputFormat::Json => {
                    let json = serde_json::json!({ "path": file, "content": content });
                    println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
                }
                OutputFormat::Markdown => {
                    let lang = Path::new(file)
                        .extension()
                        .and_then(|e| e.to_str())
                        .unwrap_or("");
                    println!("## `{file}`\n\n```{lang}\n{}\n```", content.trim_end());
                }
                OutputFormat::Text => print!("{content}"),
            }
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE_NAME);
            if path.exists() {
                miette::bail!(miette::miette!(
                    help = "Edit the existing file or remove it first",
                    "{CONFIG_FILE_NAME} already exists"
                ));
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE_NAME} with default configuration");
        }
    }

    Ok(())
}
