//! Flake Triage Core - CI failure-rate analysis
//!
//! The main entry point for ft-core, handling:
//! - Ranked failure-rate summaries with a chi-square homogeneity test
//! - The entity × bucket significance grid
//! - Single-entity and single-bucket drill-downs
//! - Build-log chunking

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use ft_common::error::format_error_human;
use ft_common::{Error, Outcome, OutputFormat, RankBy, StructuredError, SCHEMA_VERSION};
use ft_core::analysis::{entity_detail, run_analysis, AnalysisParams};
use ft_core::config::{load_config, ConfigError, Overrides, ProfileName, ResolvedConfig};
use ft_core::exit_codes::ExitCode;
use ft_core::logchunk::{chunk_log, tail_chars, LogChunk, DEFAULT_TAIL_CHARS};
use ft_core::logging::{
    emit, event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel,
    Stage,
};
use ft_core::output;
use ft_core::snapshots::{list_snapshots, SnapshotQuery};
use ft_core::source::JsonlEventSource;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Flake Triage Core - Find CI entities whose failure rate changes over time
#[derive(Parser)]
#[command(name = "ft-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to config.json (otherwise FT_CONFIG, FT_CONFIG_DIR, XDG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON-lines file of CI events
    #[arg(long, global = true, env = "FT_EVENTS")]
    events: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Anchor time for the lookback window (RFC 3339, default: now)
    #[arg(long, global = true)]
    now: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank entities by failure rate and build the significance grid
    Analyze(AnalyzeArgs),

    /// Summary and per-bucket breakdown for one entity
    Entity(EntityArgs),

    /// List the runs inside one grid cell
    Snapshots(SnapshotsArgs),

    /// Split a build log into its per-file sections
    Chunks(ChunksArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct AnalysisArgs {
    /// Lookback window: day, week, month, year
    #[arg(long)]
    since: Option<String>,

    /// Analyze the full history regardless of the configured lookback
    #[arg(long, conflicts_with = "since")]
    all_history: bool,

    /// Bucket granularity: day, week, month, year
    #[arg(long)]
    granularity: Option<String>,

    /// Buckets need strictly more events than this
    #[arg(long)]
    min_samples: Option<u64>,

    /// Rank by the worst bucket's excess over the overall rate
    #[arg(long)]
    spikes: bool,

    /// Analysis profile: interactive, batch
    #[arg(long)]
    profile: Option<String>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Restrict to a single entity
    #[arg(long)]
    entity: Option<String>,

    /// Keep only the top N ranked entities
    #[arg(long)]
    top_n: Option<usize>,

    #[command(flatten)]
    analysis: AnalysisArgs,
}

#[derive(Args, Debug)]
struct EntityArgs {
    /// Entity identifier
    id: String,

    #[command(flatten)]
    analysis: AnalysisArgs,
}

#[derive(Args, Debug)]
struct SnapshotsArgs {
    /// Entity identifier
    entity: String,

    /// Bucket label (YYYY-MM-DD)
    bucket: String,

    /// Bucket granularity: day, week, month, year
    #[arg(long, default_value = "month")]
    granularity: String,
}

#[derive(Args, Debug)]
struct ChunksArgs {
    /// Build log file
    log_file: PathBuf,

    /// Characters kept from the end of each section
    #[arg(long, default_value_t = DEFAULT_TAIL_CHARS, conflicts_with = "full")]
    tail: usize,

    /// Emit whole sections without truncation
    #[arg(long)]
    full: bool,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved analysis configuration
    Show,
}

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    // JSON payloads on stdout pair with JSONL diagnostics on stderr
    let cli_format = match cli.global.format {
        OutputFormat::Json => Some(LogFormat::Jsonl),
        _ => None,
    };
    init_logging(&LogConfig::from_env(cli_level, cli_format));

    let ctx = LogContext::new(generate_run_id());
    emit(&ctx.debug(event_names::RUN_STARTED, Stage::Init, "Starting ft-core"));

    let exit_code = match cli.command {
        None | Some(Commands::Version) => {
            print_version(&cli.global);
            ExitCode::Clean
        }
        Some(Commands::Analyze(args)) => run_analyze(&cli.global, &args, &ctx),
        Some(Commands::Entity(args)) => run_entity(&cli.global, &args, &ctx),
        Some(Commands::Snapshots(args)) => run_snapshots(&cli.global, &args, &ctx),
        Some(Commands::Chunks(args)) => run_chunks(&cli.global, &args, &ctx),
        Some(Commands::Config(args)) => run_config(&cli.global, &args, &ctx),
    };

    emit(
        &ctx.debug(event_names::RUN_FINISHED, Stage::Render, "Finished")
            .with_field("exit_code", exit_code.as_i32())
            .with_field("code_name", exit_code.code_name()),
    );
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Resolve the config file, or report the failure and return its exit code.
fn resolve_config(global: &GlobalOpts, ctx: &LogContext) -> Result<ResolvedConfig, ExitCode> {
    match load_config(global.config.as_deref()) {
        Ok(resolved) => {
            let (event, message) = match resolved.path {
                Some(_) => (event_names::CONFIG_LOADED, "Loaded configuration"),
                None => (event_names::CONFIG_DEFAULT_USED, "Using built-in configuration"),
            };
            emit(
                &ctx.debug(event, Stage::Init, message)
                    .with_field("source", resolved.source.to_string()),
            );
            Ok(resolved)
        }
        Err(e) => {
            emit(&ctx.error(event_names::CONFIG_ERROR, Stage::Init, e.to_string()));
            Err(output_config_error(global, ctx, &e))
        }
    }
}

fn event_source(global: &GlobalOpts) -> Result<JsonlEventSource, Error> {
    global
        .events
        .as_ref()
        .map(JsonlEventSource::new)
        .ok_or_else(|| {
            Error::InvalidArgument("no event source: pass --events or set FT_EVENTS".to_string())
        })
}

fn anchor_time(global: &GlobalOpts) -> Result<DateTime<Utc>, Error> {
    match &global.now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| Error::InvalidArgument(format!("--now {raw:?}: {e}"))),
        None => Ok(Utc::now()),
    }
}

fn overrides(args: &AnalysisArgs, top_n: Option<usize>) -> Result<Overrides, Error> {
    let profile = args
        .profile
        .as_deref()
        .map(|raw| {
            raw.parse::<ProfileName>()
                .map_err(|e| Error::InvalidArgument(e.to_string()))
        })
        .transpose()?;
    Ok(Overrides {
        profile,
        since: args.since.clone(),
        all_history: args.all_history,
        granularity: args.granularity.clone(),
        min_samples: args.min_samples,
        top_n,
        rank_by: args.spikes.then_some(RankBy::Spike),
    })
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("ft-core: failed to serialize output: {}", e),
    }
}

fn use_color(global: &GlobalOpts) -> bool {
    !global.no_color && std::io::stderr().is_terminal()
}

/// Report an engine error on stderr in the requested format.
fn output_error(global: &GlobalOpts, ctx: &LogContext, command: &str, error: &Error) -> ExitCode {
    let exit_code = ExitCode::from(error);
    emit(
        &ctx.error(event_names::INTERNAL_ERROR, Stage::Render, error.to_string())
            .with_field("code", error.code())
            .with_field("command", command),
    );

    match global.format {
        OutputFormat::Json => {
            let structured = StructuredError::from(error);
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": Utc::now().to_rfc3339(),
                "command": command,
                "status": "error",
                "exit_code": exit_code.code_name(),
                "error": structured,
            });
            match serde_json::to_string_pretty(&response) {
                Ok(text) => eprintln!("{}", text),
                Err(_) => eprintln!("{}", structured.to_json()),
            }
        }
        OutputFormat::Summary => {
            eprintln!("[{}] {} error: {}", ctx.run_id, command, error);
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            eprintln!("{}", format_error_human(error, use_color(global)));
        }
    }

    exit_code
}

fn output_config_error(global: &GlobalOpts, ctx: &LogContext, error: &ConfigError) -> ExitCode {
    let (error_code, exit) = match error {
        ConfigError::NotFound { .. } => (13, ExitCode::ConfigError),
        ConfigError::ParseError { .. } => (14, ExitCode::ConfigError),
        // Same code and exit as a bad --since/--granularity flag
        ConfigError::InvalidPeriod { .. } => (10, ExitCode::ArgsError),
        ConfigError::ValidationError(e) => (e.code(), ExitCode::ConfigError),
        ConfigError::IoError { .. } => (60, ExitCode::ConfigError),
    };

    let response = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "run_id": ctx.run_id,
        "generated_at": Utc::now().to_rfc3339(),
        "status": "error",
        "exit_code": exit.code_name(),
        "error": {
            "code": error_code,
            "category": "config",
            "message": error.to_string(),
        }
    });

    match global.format {
        OutputFormat::Json => match serde_json::to_string_pretty(&response) {
            Ok(text) => eprintln!("{}", text),
            Err(_) => eprintln!("config error: {}", error),
        },
        OutputFormat::Summary => {
            eprintln!("[{}] config error: {}", ctx.run_id, error);
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            eprintln!("# Configuration Error");
            eprintln!();
            eprintln!("Error: {}", error);
        }
    }

    exit
}

// ============================================================================
// Command implementations
// ============================================================================

fn analysis_params(
    global: &GlobalOpts,
    ctx: &LogContext,
    command: &str,
    args: &AnalysisArgs,
    entity: Option<String>,
    top_n: Option<usize>,
) -> Result<AnalysisParams, ExitCode> {
    let resolved = resolve_config(global, ctx)?;
    overrides(args, top_n)
        .and_then(|o| o.apply(&resolved.config))
        .map(|config| AnalysisParams::from_config(&config, entity))
        .map_err(|e| output_error(global, ctx, command, &e))
}

fn run_analyze(global: &GlobalOpts, args: &AnalyzeArgs, ctx: &LogContext) -> ExitCode {
    let params = match analysis_params(
        global,
        ctx,
        "analyze",
        &args.analysis,
        args.entity.clone(),
        args.top_n,
    ) {
        Ok(params) => params,
        Err(code) => return code,
    };
    let result = anchor_time(global).and_then(|now| {
        let source = event_source(global)?;
        run_analysis(&source, &params, now, ctx)
    });
    let report = match result {
        Ok(report) => report,
        Err(e) => return output_error(global, ctx, "analyze", &e),
    };

    match global.format {
        OutputFormat::Json => print_json(&output::analysis_json(&report, &ctx.run_id, Utc::now())),
        OutputFormat::Md => print!("{}", output::analysis_markdown(&report)),
        OutputFormat::Summary => println!("{}", output::analysis_summary(&report, &ctx.run_id)),
        OutputFormat::Exitcode => {}
    }

    ExitCode::from_anomalies(report.anomalies_found())
}

fn run_entity(global: &GlobalOpts, args: &EntityArgs, ctx: &LogContext) -> ExitCode {
    let params = match analysis_params(
        global,
        ctx,
        "entity",
        &args.analysis,
        Some(args.id.clone()),
        None,
    ) {
        Ok(params) => params,
        Err(code) => return code,
    };

    let result = anchor_time(global).and_then(|now| {
        let source = event_source(global)?;
        entity_detail(&source, &args.id, &params, now, ctx)
    });
    let detail = match result {
        Ok(detail) => detail,
        Err(e) => return output_error(global, ctx, "entity", &e),
    };

    match global.format {
        OutputFormat::Json => print_json(&output::entity_json(&detail, &ctx.run_id, Utc::now())),
        OutputFormat::Md => print!("{}", output::entity_markdown(&detail)),
        OutputFormat::Summary => println!("{}", output::entity_summary(&detail)),
        OutputFormat::Exitcode => {}
    }

    let differs = detail
        .summary
        .as_ref()
        .is_some_and(|s| s.verdict.differs());
    ExitCode::from_anomalies(differs)
}

fn run_snapshots(global: &GlobalOpts, args: &SnapshotsArgs, ctx: &LogContext) -> ExitCode {
    let resolved = match resolve_config(global, ctx) {
        Ok(resolved) => resolved,
        Err(code) => return code,
    };

    let result = SnapshotQuery::parse(&args.entity, &args.bucket, &args.granularity)
        .and_then(|query| {
            let source = event_source(global)?;
            list_snapshots(&source, &query, &resolved.config)
        });
    let rows = match result {
        Ok(rows) => rows,
        Err(e) => return output_error(global, ctx, "snapshots", &e),
    };

    match global.format {
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "entity_id": args.entity,
                "bucket": args.bucket,
                "granularity": args.granularity,
                "snapshots": rows,
            });
            let envelope = output::envelope("snapshots", &ctx.run_id, Utc::now());
            print_json(&output::merge(envelope, payload));
        }
        OutputFormat::Md => print!(
            "{}",
            output::snapshots_markdown(&args.entity, &args.bucket, &rows)
        ),
        OutputFormat::Summary => {
            let failed = rows.iter().filter(|r| r.status == Outcome::Failed).count();
            println!(
                "{} {}: {} runs, {} failed",
                args.entity,
                args.bucket,
                rows.len(),
                failed
            );
        }
        OutputFormat::Exitcode => {}
    }

    ExitCode::Clean
}

fn read_log(path: &Path) -> Result<String, Error> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn run_chunks(global: &GlobalOpts, args: &ChunksArgs, ctx: &LogContext) -> ExitCode {
    let log = match read_log(&args.log_file) {
        Ok(log) => log,
        Err(e) => return output_error(global, ctx, "chunks", &e),
    };

    let chunks: Vec<LogChunk<'_>> = chunk_log(&log)
        .into_iter()
        .map(|chunk| LogChunk {
            name: chunk.name,
            text: if args.full {
                chunk.text
            } else {
                tail_chars(chunk.text, args.tail)
            },
        })
        .collect();

    match global.format {
        OutputFormat::Json => {
            let tail = (!args.full).then_some(args.tail);
            let payload = serde_json::json!({
                "log_file": args.log_file.display().to_string(),
                "tail": tail,
                "chunks": chunks,
            });
            let envelope = output::envelope("chunks", &ctx.run_id, Utc::now());
            print_json(&output::merge(envelope, payload));
        }
        OutputFormat::Md => {
            for chunk in &chunks {
                println!("## {}", chunk.name);
                println!();
                println!("```");
                println!("{}", chunk.text.trim_end_matches('\n'));
                println!("```");
                println!();
            }
        }
        OutputFormat::Summary => {
            let names: Vec<&str> = chunks.iter().map(|c| c.name).collect();
            println!("{} chunks: {}", chunks.len(), names.join(", "));
        }
        OutputFormat::Exitcode => {}
    }

    ExitCode::Clean
}

fn run_config(global: &GlobalOpts, args: &ConfigArgs, ctx: &LogContext) -> ExitCode {
    match args.command {
        ConfigCommands::Show => {
            let resolved = match resolve_config(global, ctx) {
                Ok(resolved) => resolved,
                Err(code) => return code,
            };
            let path = resolved.path.as_ref().map(|p| p.display().to_string());

            match global.format {
                OutputFormat::Json => {
                    let payload = serde_json::json!({
                        "source": resolved.source.to_string(),
                        "path": path,
                        "config": resolved.config,
                    });
                    let envelope = output::envelope("config show", &ctx.run_id, Utc::now());
                    print_json(&output::merge(envelope, payload));
                }
                OutputFormat::Summary => {
                    println!(
                        "config: {} ({})",
                        path.as_deref().unwrap_or("built-in"),
                        resolved.source
                    );
                }
                OutputFormat::Exitcode => {}
                OutputFormat::Md => {
                    let c = &resolved.config;
                    println!("# Configuration");
                    println!();
                    println!("Source: {} ({})", resolved.source, path.as_deref().unwrap_or("built-in"));
                    println!();
                    println!("| Setting | Value |");
                    println!("|---|---|");
                    println!("| min_samples | {} |", c.min_samples);
                    println!("| granularity | {} |", c.granularity);
                    println!(
                        "| since | {} |",
                        c.since.map(|s| s.to_string()).unwrap_or_else(|| "all".to_string())
                    );
                    println!(
                        "| top_n | {} |",
                        c.top_n.map(|n| n.to_string()).unwrap_or_else(|| "all".to_string())
                    );
                    println!("| rank_by | {} |", c.rank_by);
                    println!("| log_url_template | {} |", c.log_url_template);
                }
            }
            ExitCode::Clean
        }
    }
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "ft_core_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json => print_json(&version_info),
        OutputFormat::Exitcode => {}
        _ => {
            println!("ft-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}
