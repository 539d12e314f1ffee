use std::any::Any;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use novelry_core::{
    ChapterNo, ErrorReport, FeedReport, NovelryConfig, NovelryError, Orchestrator, SearchReport, SeriesId, to_json,
};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Import web novel metadata and chapters as JSON
#[derive(Parser, Debug)]
#[command(name = "novelry")]
#[command(author = "Novelry Contributors")]
#[command(version)]
#[command(about = "Import web novel metadata and chapters as JSON", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP timeout in seconds
    #[arg(long, global = true, default_value = "10", value_name = "SECS")]
    timeout: u64,

    /// Page load timeout for headless rendering in seconds
    #[arg(long, global = true, default_value = "10", value_name = "SECS")]
    render_timeout: u64,

    /// Overall time limit for one command in seconds
    #[arg(long, global = true, default_value = "90", value_name = "SECS")]
    deadline: u64,

    /// Endpoint serving the proxy list
    #[arg(long, global = true, value_name = "URL")]
    proxy_list_url: Option<String>,

    /// Connect directly instead of through public proxies
    #[arg(long, global = true)]
    no_proxies: bool,

    /// Fixed User-Agent instead of a rotating browser identity
    #[arg(long, global = true, value_name = "UA")]
    user_agent: Option<String>,

    /// Seed for proxy and identity selection
    #[arg(long, global = true, value_name = "SEED")]
    seed: Option<u64>,

    /// Chromium executable for rendered sources
    #[arg(long, global = true, value_name = "PATH")]
    chromium: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completions: Option<clap_complete::Shell>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merged metadata for a series
    ImportNovel {
        /// Series slug, e.g. shadow-slave
        series_id: Option<String>,
    },
    /// Title and body of one chapter
    ImportChapter {
        /// Series slug, e.g. shadow-slave
        series_id: Option<String>,
        /// Chapter number, e.g. 12
        chapter_no: Option<String>,
    },
    /// Search the series finder
    Search {
        /// Free-text query
        query: Vec<String>,
    },
    /// Latest translated releases
    Feed,
}

/// A validated command.
#[derive(Debug)]
enum Action {
    Novel(SeriesId),
    Chapter(SeriesId, ChapterNo),
    Search(String),
    Feed,
}

impl Action {
    fn from_command(command: Option<Command>) -> Result<Self, ErrorReport> {
        let bad_input = |message: &str| ErrorReport::new(400, message);
        let invalid = |err: NovelryError| ErrorReport::from(&err);

        match command {
            None => Err(bad_input("No action provided")),
            Some(Command::ImportNovel { series_id: None }) => Err(bad_input("No series ID provided")),
            Some(Command::ImportNovel { series_id: Some(id) }) => Ok(Action::Novel(SeriesId::parse(&id).map_err(invalid)?)),
            Some(Command::ImportChapter { series_id: Some(id), chapter_no: Some(chapter) }) => Ok(Action::Chapter(
                SeriesId::parse(&id).map_err(invalid)?,
                ChapterNo::parse(&chapter).map_err(invalid)?,
            )),
            Some(Command::ImportChapter { .. }) => Err(bad_input("Invalid arguments for import-chapter")),
            Some(Command::Search { query }) => {
                let query = query.join(" ");
                if query.trim().is_empty() {
                    Err(bad_input("No search query provided"))
                } else {
                    Ok(Action::Search(query))
                }
            }
            Some(Command::Feed) => Ok(Action::Feed),
        }
    }

    fn describe(&self) -> String {
        match self {
            Action::Novel(id) => format!("Importing series {}", id.as_str().bright_white()),
            Action::Chapter(id, chapter) => {
                format!("Importing chapter {} of {}", chapter.to_string().bright_white(), id.as_str().bright_white())
            }
            Action::Search(query) => format!("Searching for {}", query.bright_white()),
            Action::Feed => "Reading latest releases".to_string(),
        }
    }
}

/// Maps a clap parse failure onto the 400 message callers expect.
fn usage_error(kind: ErrorKind, args: &[String]) -> ErrorReport {
    let message = if matches!(kind, ErrorKind::InvalidSubcommand) {
        "Invalid action".to_string()
    } else if let Some(action) = args.iter().find(|a| matches!(a.as_str(), "import-novel" | "import-chapter" | "search" | "feed")) {
        format!("Invalid arguments for {}", action)
    } else {
        "Invalid arguments".to_string()
    };
    ErrorReport::new(400, message)
}

fn build_config(cli: &Cli) -> NovelryConfig {
    let mut builder = NovelryConfig::builder()
        .http_timeout(Duration::from_secs(cli.timeout))
        .render_timeout(Duration::from_secs(cli.render_timeout))
        .deadline(Duration::from_secs(cli.deadline))
        .use_proxies(!cli.no_proxies);

    if let Some(url) = &cli.proxy_list_url {
        builder = builder.proxy_list_url(url);
    }
    if let Some(ua) = &cli.user_agent {
        builder = builder.user_agent(ua);
    }
    if let Some(seed) = cli.seed {
        builder = builder.seed(seed);
    }
    if let Some(path) = &cli.chromium {
        builder = builder.chromium_path(path);
    }

    builder.build()
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("novelry_core=debug,novelry=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

/// Runs one action to completion, rendering either outcome as JSON.
async fn run(orchestrator: Orchestrator, action: Action, pretty: bool) -> Result<String, ErrorReport> {
    let rendered = match action {
        Action::Novel(id) => {
            let record = orchestrator.get_series_info(&id).await.map_err(|e| ErrorReport::from(&e))?;
            to_json(&record, pretty)
        }
        Action::Chapter(id, chapter_no) => {
            let record = orchestrator
                .get_chapter(&id, &chapter_no)
                .await
                .map_err(|e| ErrorReport::from(&e).with_chapter(chapter_no.clone()))?;
            to_json(&record, pretty)
        }
        Action::Search(query) => {
            let results = orchestrator.search(&query).await.map_err(|e| ErrorReport::from(&e))?;
            to_json(&SearchReport::from(results), pretty)
        }
        Action::Feed => {
            let releases = orchestrator.latest_releases().await.map_err(|e| ErrorReport::from(&e))?;
            to_json(&FeedReport::from(releases), pretty)
        }
    };

    rendered.map_err(|e| ErrorReport::from(&e))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Report for a failure to set up clients before any action runs.
fn startup_error(err: &NovelryError) -> ErrorReport {
    ErrorReport::new(503, format!("Failed to initialize transports: {}", err))
}

/// Prints a report and picks the exit status: 1 for bad input, 0 otherwise.
fn emit_error(report: &ErrorReport, pretty: bool) -> anyhow::Result<ExitCode> {
    println!("{}", to_json(report, pretty).context("Failed to render error report")?);
    Ok(if report.status == 400 { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args: Vec<String> = std::env::args().collect();
    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => return emit_error(&usage_error(e.kind(), &args), false),
    };

    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "novelry", &mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    init_tracing(cli.verbose);
    if cli.verbose {
        echo::print_banner();
    }

    let config = build_config(&cli);
    let pretty = cli.pretty;
    let verbose = cli.verbose;

    let action = match Action::from_command(cli.command) {
        Ok(action) => action,
        Err(report) => {
            if verbose {
                echo::print_error(&report.error);
            }
            return emit_error(&report, pretty);
        }
    };

    if verbose {
        if !config.use_proxies {
            echo::print_warning("Proxies disabled, connecting directly");
        }
        echo::print_step(1, 2, &action.describe());
    }

    let orchestrator = match Orchestrator::from_config(config) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            let report = startup_error(&e);
            if verbose {
                echo::print_error(&report.error);
            }
            return emit_error(&report, pretty);
        }
    };
    let started = Instant::now();
    let outcome = match tokio::spawn(run(orchestrator, action, pretty)).await {
        Ok(outcome) => outcome,
        Err(join) if join.is_panic() => Err(ErrorReport::new(503, format!("Unexpected error: {}", panic_message(join.into_panic())))),
        Err(join) => Err(ErrorReport::new(503, format!("Unexpected error: {}", join))),
    };

    if verbose {
        echo::print_step(2, 2, "Writing output");
        echo::print_timing("Elapsed", started.elapsed());
    }

    match outcome {
        Ok(json) => {
            if verbose {
                echo::print_success(&format!("Done ({})", echo::format_size(json.len())));
            }
            println!("{}", json);
            Ok(ExitCode::SUCCESS)
        }
        Err(report) => {
            if verbose {
                echo::print_error(&format!("{} {}", report.status, report.error));
            }
            emit_error(&report, pretty)
        }
    }
}
