use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::{ResolutionSession, SessionOptions};
use crate::emit::ContractSet;
use crate::errors::{ContractError, Diagnostic, Severity};
use crate::frontend::config::{Config, ConfigError, OutputFormat};
use crate::infrastructure::logging::{init_logging, LogConfig};
use crate::model::{ModelError, ModelLoader, TypeModel};
use crate::performance::ParallelResolver;

const USAGE: &str = "Usage: xmlcontract [OPTIONS] <model.json|dir>...

Resolves the data contracts of every type declared in the given models.

Options:
  --root <TYPE>        Resolve only from this type (repeatable)
  --format <json|text> Output format (default: json)
  --config <FILE>      Configuration file (default: nearest .xmlcontract.toml)
  --max-errors <N>     Maximum errors to report (default: 100)
  --workers <N>        Worker threads for parallel resolution (0 = one per core)
  --sequential         Resolve on the calling thread only
  --verbose            Debug logging on stderr
  --no-color           Disable colored diagnostics
  --help               Print this message
  --version            Print the version";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}\n\n{usage}", usage = USAGE)]
    Usage(String),

    #[error("path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliConfig {
    pub paths: Vec<PathBuf>,
    pub roots: Vec<String>,
    pub format: Option<OutputFormat>,
    pub config_path: Option<PathBuf>,
    pub max_errors: Option<usize>,
    pub workers: Option<usize>,
    pub sequential: bool,
    pub verbose: bool,
    pub no_color: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(CliConfig),
    Help,
    Version,
}

pub fn parse_args<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut config = CliConfig::default();
    let mut args = args.into_iter();

    fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, CliError> {
        args.next().ok_or_else(|| CliError::Usage(format!("{} requires an argument", flag)))
    }
    fn number(text: String, flag: &str) -> Result<usize, CliError> {
        text.parse().map_err(|_| CliError::Usage(format!("invalid value for {}: {}", flag, text)))
    }

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--root" => config.roots.push(value(&mut args, "--root")?),
            "--format" => {
                let format = value(&mut args, "--format")?;
                config.format = Some(format.parse().map_err(CliError::Usage)?);
            }
            "--config" => config.config_path = Some(PathBuf::from(value(&mut args, "--config")?)),
            "--max-errors" => config.max_errors = Some(number(value(&mut args, "--max-errors")?, "--max-errors")?),
            "--workers" => config.workers = Some(number(value(&mut args, "--workers")?, "--workers")?),
            "--sequential" => config.sequential = true,
            "--verbose" | "-v" => config.verbose = true,
            "--no-color" => config.no_color = true,
            flag if flag.starts_with('-') => return Err(CliError::Usage(format!("unknown option: {}", flag))),
            path => config.paths.push(PathBuf::from(path)),
        }
    }

    if config.paths.is_empty() {
        return Err(CliError::Usage("no model paths specified".to_string()));
    }
    Ok(Command::Run(config))
}

pub struct Cli {
    options: CliConfig,
    config: Config,
}

impl Cli {
    /// Merge command-line flags over the file configuration.
    pub fn new(options: CliConfig) -> Result<Self, CliError> {
        let mut config = match &options.config_path {
            Some(path) => Config::load(path)?,
            None => Config::discover(),
        };
        if let Some(max_errors) = options.max_errors {
            config.diagnostics.max_errors = max_errors;
        }
        if let Some(workers) = options.workers {
            config.resolve.workers = workers;
        }
        if options.sequential {
            config.resolve.parallel = false;
        }
        if let Some(format) = options.format {
            config.output.format = format;
        }
        if options.no_color {
            config.output.color = false;
        }
        Ok(Self { options, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Model files named on the command line, directories expanded.
    pub fn model_files(&self) -> Result<Vec<PathBuf>, CliError> {
        let mut files = Vec::new();
        for path in &self.options.paths {
            if path.is_file() {
                files.push(path.clone());
            } else if path.is_dir() {
                let mut found = Vec::new();
                for entry in glob::glob(&format!("{}/**/*.json", path.display()))? {
                    match entry {
                        Ok(file) if file.is_file() => {
                            let relative = file.strip_prefix(path).unwrap_or(&file);
                            if self.config.should_load(relative)? {
                                found.push(file);
                            }
                        }
                        Ok(_) => {}
                        Err(e) => tracing::warn!(error = %e, "skipping unreadable path"),
                    }
                }
                found.sort();
                files.extend(found);
            } else {
                return Err(CliError::PathNotFound(path.clone()));
            }
        }
        Ok(files)
    }

    /// Resolve and render; returns the process exit code.
    pub fn run_with(&self, out: &mut dyn Write, err: &mut dyn Write) -> Result<i32, CliError> {
        let files = self.model_files()?;
        let mut loader = ModelLoader::new();
        for file in &files {
            loader.add_file(file)?;
        }
        let model = Arc::new(loader.finish()?);
        info!(files = files.len(), types = model.declared_count(), "models loaded");

        let roots = if self.options.roots.is_empty() {
            model.roots()
        } else {
            self.options.roots.iter().map(|name| model.parse_type(name)).collect::<Result<Vec<_>, _>>()?
        };
        debug!(roots = roots.len(), parallel = self.config.resolve.parallel, "resolving");

        let session = ResolutionSession::with_options(model.clone(), SessionOptions::from(&self.config));
        let resolution = if self.config.resolve.parallel {
            ParallelResolver::new(self.config.resolve.workers).resolve(&session, &roots)?
        } else {
            session.resolve(&roots)?
        };
        let set = ContractSet::from_resolution(&session, &resolution);

        match self.config.output.format {
            OutputFormat::Json => writeln!(out, "{}", set.to_json()?)?,
            OutputFormat::Text => write!(out, "{}", set.render_text())?,
        }

        for diagnostic in &set.diagnostics {
            self.print_diagnostic(err, diagnostic)?;
        }
        self.print_summary(err, &set, &model)?;

        Ok(if resolution.has_errors() { 1 } else { 0 })
    }

    pub fn run(&self) -> Result<i32, CliError> {
        let stdout = io::stdout();
        let stderr = io::stderr();
        self.run_with(&mut stdout.lock(), &mut stderr.lock())
    }

    fn print_diagnostic(&self, err: &mut dyn Write, diagnostic: &Diagnostic) -> io::Result<()> {
        let color = match diagnostic.severity {
            Severity::Error => "31",
            Severity::Warning => "33",
            Severity::Info => "36",
        };
        if self.config.output.color {
            writeln!(err, "\x1b[{}m{}\x1b[0m", color, diagnostic)
        } else {
            writeln!(err, "{}", diagnostic)
        }
    }

    fn print_summary(&self, err: &mut dyn Write, set: &ContractSet, model: &TypeModel) -> io::Result<()> {
        let errors = set.diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
        let warnings = set.diagnostics.iter().filter(|d| d.severity == Severity::Warning).count();
        let summary = format!(
            "Resolved {} contract{} from {} declared type{}: {} error{}, {} warning{}",
            set.contracts.len(),
            plural(set.contracts.len()),
            model.declared_count(),
            plural(model.declared_count()),
            errors,
            plural(errors),
            warnings,
            plural(warnings)
        );
        match (self.config.output.color, errors) {
            (true, 0) => writeln!(err, "\x1b[32m{}\x1b[0m", summary),
            (true, _) => writeln!(err, "\x1b[31m{}\x1b[0m", summary),
            (false, _) => writeln!(err, "{}", summary),
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Entry point for CLI binary
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = match parse_args(std::env::args().skip(1))? {
        Command::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        Command::Version => {
            println!("xmlcontract {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Command::Run(options) => options,
    };

    let verbose = options.verbose;
    let cli = Cli::new(options)?;
    let _guard = init_logging(LogConfig::for_cli(verbose, cli.config().output.color));
    let exit_code = cli.run()?;
    drop(_guard);
    std::process::exit(exit_code);
}
