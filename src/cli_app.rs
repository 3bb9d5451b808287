//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{ColoredString, Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use file_insights::backend::http::HttpBackend;
use file_insights::core::config::Config;
use file_insights::core::errors::FinsError;
use file_insights::dashboard::controller::DashboardController;
use file_insights::dashboard::model::{FidelityMode, Outcome, Section};
use file_insights::dashboard::orchestrator::OperationError;
use file_insights::dashboard::render::{self, Line, RenderOptions, Tone};
use file_insights::dashboard::runtime::{self, RuntimeOptions};
use file_insights::logger::{self, DiagnosticSink};

/// File Insights: operator console for a remote file-indexing service.
#[derive(Debug, Parser)]
#[command(
    name = "file-insights",
    author,
    version,
    about = "File Insights - folder ingestion, metadata lookup and index analytics",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override the service base URL.
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Ask the service to ingest a folder.
    Process(PathArgs),
    /// List indexed metadata for a folder.
    Metadata(MetadataArgs),
    /// Delete indexed metadata for a folder.
    Delete(PathArgs),
    /// Show file counts by age and by type.
    Analytics,
    /// Interactive terminal dashboard.
    Dashboard(DashboardArgs),
    /// View configuration state.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct PathArgs {
    /// Folder path as known to the service.
    #[arg(value_name = "FOLDER")]
    path: String,
}

#[derive(Debug, Clone, Args)]
struct MetadataArgs {
    /// Folder path as known to the service.
    #[arg(value_name = "FOLDER")]
    path: String,
    /// Level of detail (defaults to `dashboard.default_fidelity`).
    #[arg(long, value_enum)]
    mode: Option<FidelityMode>,
}

#[derive(Debug, Clone, Args, Default)]
struct DashboardArgs {
    /// Section to open first (1-5).
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u8).range(1..=5))]
    section: Option<u8>,
    /// Initial metadata fidelity.
    #[arg(long, value_enum)]
    mode: Option<FidelityMode>,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or configuration.
    #[error("{0}")]
    User(String),
    /// Service or environment failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }

    fn from_operation(error: &OperationError) -> Self {
        match error {
            OperationError::Validation(message) | OperationError::EmptyResult(message) => {
                Self::User(message.clone())
            }
            OperationError::Transport(message) => Self::Runtime(message.clone()),
        }
    }
}

impl From<FinsError> for CliError {
    fn from(error: FinsError) -> Self {
        match error {
            FinsError::InvalidConfig { .. }
            | FinsError::MissingConfig { .. }
            | FinsError::ConfigParse { .. } => Self::User(error.to_string()),
            FinsError::Serialization { .. } => Self::Internal(error.to_string()),
            _ => Self::Runtime(error.to_string()),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Process(args) => run_one_shot(cli, OneShot::Process(&args.path)),
        Command::Metadata(args) => run_one_shot(cli, OneShot::Metadata(&args.path, args.mode)),
        Command::Delete(args) => run_one_shot(cli, OneShot::Delete(&args.path)),
        Command::Analytics => run_one_shot(cli, OneShot::Analytics),
        Command::Dashboard(args) => run_dashboard(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(base_url) = &cli.base_url {
        config.backend.base_url = base_url.trim().trim_end_matches('/').to_owned();
        config.validate()?;
    }
    Ok(config)
}

fn init_diagnostics(cli: &Cli, config: &Config, sink: &DiagnosticSink) -> Result<(), CliError> {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        config.logging.level.as_str()
    };
    logger::init_tracing(level, sink)?;
    Ok(())
}

fn new_runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(format!("tokio runtime: {e}")))
}

// ──────────────────── one-shot operations ────────────────────

#[derive(Debug, Clone, Copy)]
enum OneShot<'a> {
    Process(&'a str),
    Metadata(&'a str, Option<FidelityMode>),
    Delete(&'a str),
    Analytics,
}

impl OneShot<'_> {
    const fn label(self) -> &'static str {
        match self {
            Self::Process(_) => "process",
            Self::Metadata(..) => "metadata",
            Self::Delete(_) => "delete",
            Self::Analytics => "analytics",
        }
    }

    const fn section(self) -> Section {
        match self {
            Self::Process(_) => Section::Process,
            Self::Metadata(..) => Section::FindMetadata,
            Self::Delete(_) => Section::Delete,
            Self::Analytics => Section::Analytics,
        }
    }
}

fn run_one_shot(cli: &Cli, op: OneShot<'_>) -> Result<(), CliError> {
    let config = load_config(cli)?;
    init_diagnostics(cli, &config, &DiagnosticSink::Stderr)?;
    let backend = HttpBackend::from_config(&config.backend)?;
    let mut controller = DashboardController::from_config(backend, &config);
    controller.show(op.section());

    let outcome = new_runtime()?.block_on(async {
        match op {
            OneShot::Process(path) => controller.process_folder(path).await,
            OneShot::Metadata(path, mode) => {
                let mode = mode.unwrap_or(config.dashboard.default_fidelity);
                controller.fetch_metadata(path, mode).await
            }
            OneShot::Delete(path) => controller.delete_metadata(path).await,
            OneShot::Analytics => controller.fetch_analytics().await,
        }
    });

    match output_mode(cli) {
        OutputMode::Human => {
            if let Outcome::Succeeded(_) = &outcome {
                if let OneShot::Metadata(..) = op {
                    controller.expand_all_rows();
                }
                let options = RenderOptions {
                    width: usize::MAX,
                    chart_width: config.display.chart_width,
                };
                print_human(&controller, op, options)?;
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": op.label(),
                "ok": matches!(outcome, Outcome::Succeeded(_)),
                "snapshot": serde_json::to_value(controller.snapshot())?,
            });
            write_json_line(&payload)?;
        }
    }

    match outcome {
        Outcome::Succeeded(_) => Ok(()),
        Outcome::Failed(error) => Err(CliError::from_operation(&error)),
        Outcome::Idle | Outcome::Loading => Err(CliError::Internal(format!(
            "{} finished without an outcome",
            op.label()
        ))),
    }
}

fn print_human<B>(
    controller: &DashboardController<B>,
    op: OneShot<'_>,
    options: RenderOptions,
) -> Result<(), CliError>
where
    B: file_insights::backend::Backend,
{
    let model = controller.model();
    let mut lines = match op {
        OneShot::Metadata(..) => model
            .metadata
            .as_ref()
            .map(|list| render::metadata_lines(list, model))
            .unwrap_or_default(),
        OneShot::Analytics => render::render_section(model, options),
        OneShot::Process(_) | OneShot::Delete(_) => Vec::new(),
    };
    if let Some(banner) = render::banner(model.active_outcome()) {
        if !lines.is_empty() {
            lines.push(Line::new(Tone::Normal, ""));
        }
        lines.push(banner);
    }

    let mut stdout = io::stdout().lock();
    for line in &lines {
        writeln!(stdout, "{}", styled(line))?;
    }
    Ok(())
}

fn styled(line: &Line) -> ColoredString {
    let text = line.text.as_str();
    match line.tone {
        Tone::Normal => text.normal(),
        Tone::Heading => text.cyan().bold(),
        Tone::Muted => text.dimmed(),
        Tone::Accent => text.blue(),
        Tone::Success => text.green(),
        Tone::Error => text.red().bold(),
    }
}

// ──────────────────── dashboard ────────────────────

fn run_dashboard(cli: &Cli, args: &DashboardArgs) -> Result<(), CliError> {
    let mut config = load_config(cli)?;
    if let Some(section) = args.section.and_then(Section::from_number) {
        config.dashboard.start_section = section;
    }
    if let Some(mode) = args.mode {
        config.dashboard.default_fidelity = mode;
    }
    if !io::stdout().is_terminal() {
        return Err(CliError::User(
            "dashboard requires an interactive terminal; use the one-shot commands instead"
                .to_string(),
        ));
    }

    let sink = config
        .logging
        .log_file
        .clone()
        .map_or(DiagnosticSink::Discard, DiagnosticSink::File);
    init_diagnostics(cli, &config, &sink)?;

    let backend = HttpBackend::from_config(&config.backend)?;
    let controller = DashboardController::from_config(backend, &config);
    let options = RuntimeOptions {
        chart_width: config.display.chart_width,
        color: !cli.no_color && std::env::var_os("NO_COLOR").is_none(),
    };
    runtime::run_dashboard(controller, options)?;
    Ok(())
}

// ──────────────────── config ────────────────────

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = load_config(cli)?;

            match output_mode(cli) {
                OutputMode::Human => println!("{}", config.to_toml()?),
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match load_config(cli) {
            Ok(config) => {
                let hash = config.stable_hash()?;

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "path": config.paths.config_file.to_string_lossy(),
                            "hash": hash,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                if output_mode(cli) == OutputMode::Json {
                    let payload = json!({
                        "command": "config validate",
                        "valid": false,
                        "error": e.to_string(),
                    });
                    write_json_line(&payload)?;
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

// ──────────────────── output ────────────────────

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("FILE_INSIGHTS_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
