use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use testcop_core::config::{Backend, Config, ProjectConfig, RuleParameters};
use testcop_core::tagger::LexiconTagger;
use testcop_core::{Cop, Extraction, ExtractionError, Extractor};

use testcop_bytecode::ClassFileExtractor;
use testcop_java::SourceExtractor;
use testcop_report::{json, text};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "TESTCOP_LOG";

#[derive(Parser)]
#[command(name = "testcop")]
#[command(about = "Audit JUnit test suites for naming and test-quality problems")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a project and exit with code 0 (clean) or 1 (complaints)
    Check {
        /// Path to the project root
        path: PathBuf,
        /// Config file path (defaults to .testcop.toml in the project or an ancestor)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Extraction backend, overriding the config file
        #[arg(long)]
        backend: Option<Backend>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Compact JSON output
        #[arg(long)]
        compact: bool,
        /// Rule parameters as name/value pairs, replacing the config file
        #[arg(long = "param", num_args = 2, value_names = ["NAME", "VALUE"])]
        params: Vec<String>,
        /// Rules to silence for the whole project, added to the config file
        #[arg(long = "exclude")]
        exclusions: Vec<String>,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Create a default .testcop.toml configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            path,
            config,
            backend,
            format,
            compact,
            params,
            exclusions,
            no_color,
        } => {
            if no_color {
                colored::control::set_override(false);
            }
            let options = CheckOptions {
                backend,
                format,
                compact,
                params,
                exclusions,
            };
            cmd_check(&path, config.as_deref(), &options)
        }
        Commands::Init { force } => cmd_init(force).map(|()| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(2);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

struct CheckOptions {
    backend: Option<Backend>,
    format: OutputFormat,
    compact: bool,
    params: Vec<String>,
    exclusions: Vec<String>,
}

/// Returns whether the project passed. Units that fail to extract are reported
/// after the complaints of the others and make the run fail.
fn cmd_check(path: &Path, config_path: Option<&Path>, options: &CheckOptions) -> Result<bool> {
    if !path.exists() {
        anyhow::bail!("path '{}' does not exist", path.display());
    }
    let config = load_config(path, config_path)?;
    let backend = options.backend.unwrap_or(config.project.backend);
    let Extraction { project, failures } = extract(path, &config, backend)?;

    let params = if options.params.is_empty() {
        config.rules.parameters()?
    } else {
        RuleParameters::from_pairs(&options.params).context("invalid --param values")?
    };
    let mut exclusions = config.suppressions.exclusions.clone();
    exclusions.extend(options.exclusions.iter().cloned());

    let mut cop = Cop::configured(
        params,
        &exclusions,
        config.suppressions.strict,
        &config.project.exclude_patterns,
    )?;
    if config.rules.experimental {
        match &config.rules.lexicon {
            Some(lexicon) => {
                cop = cop.with_tagger(Arc::new(LexiconTagger::load(&path.join(lexicon))?));
            }
            None => tracing::warn!("experimental rules need `rules.lexicon`, skipping them"),
        }
    }

    let complaints = cop.check_grouped(&project);
    match options.format {
        OutputFormat::Text => print!("{}", text::format_report(&complaints)),
        OutputFormat::Json => println!(
            "{}",
            json::format_report(&complaints, options.compact)
                .context("failed to serialize report")?
        ),
    }
    if !failures.is_empty() {
        report_failures(&failures);
        anyhow::bail!(
            "{} test unit(s) under '{}' could not be extracted ({backend} backend)",
            failures.len(),
            path.display()
        );
    }
    Ok(complaints.is_empty())
}

fn report_failures(failures: &[ExtractionError]) {
    eprintln!("Skipped {} test unit(s):", failures.len());
    for failure in failures {
        match std::error::Error::source(failure) {
            Some(cause) => eprintln!("  {failure}: {cause}"),
            None => eprintln!("  {failure}"),
        }
    }
}

fn extract(path: &Path, config: &Config, backend: Backend) -> Result<Extraction> {
    let extractor: Box<dyn Extractor> = match backend {
        Backend::Source => Box::new(
            SourceExtractor::new(path.join(&config.project.main), path.join(&config.project.test))
                .context("failed to initialize Java source extractor")?,
        ),
        Backend::Bytecode => {
            let (main, test) = ProjectConfig::bytecode_roots();
            Box::new(ClassFileExtractor::new(path.join(main), path.join(test)))
        }
    };
    extractor
        .project()
        .with_context(|| format!("failed to extract units from '{}'", path.display()))
}

fn cmd_init(force: bool) -> Result<()> {
    let target = PathBuf::from(".testcop.toml");
    if target.exists() && !force {
        anyhow::bail!(".testcop.toml already exists. Use --force to overwrite.");
    }
    std::fs::write(&target, Config::default_toml())?;
    println!("Created .testcop.toml with default configuration.");
    Ok(())
}

fn load_config(project_path: &Path, config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(p) => Config::load(p),
        None => Config::load_or_default(project_path),
    }
}
