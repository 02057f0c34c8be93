//! Balance CLI - Command-line interface for Energy Balance
//!
//! Commands:
//! - report: Compute the energy-balance report over a data directory
//! - days: Print the merged daily rows
//! - config: Print the default configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use energy_balance::config::WeighTime;
use energy_balance::{
    parse_day, BalanceConfig, BalanceError, BalanceProcessor, DirectorySource, BALANCE_VERSION,
};

/// Balance - Daily health-sample aggregation and TDEE estimation
#[derive(Parser)]
#[command(name = "balance")]
#[command(version = BALANCE_VERSION)]
#[command(about = "Estimate energy expenditure from weight, body fat and intake", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the energy-balance report
    Report {
        /// Directory holding one dataset JSON file per metric
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// User timezone (IANA format, e.g., "Europe/London")
        #[arg(long)]
        timezone: Option<String>,

        /// When the daily weigh-in happens
        #[arg(long)]
        weigh_time: Option<WeighTimeArg>,

        /// First day to consider (DD/MM/YYYY)
        #[arg(long)]
        from: Option<String>,

        /// Last day to consider (DD/MM/YYYY)
        #[arg(long)]
        to: Option<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Print the merged daily rows as JSON
    Days {
        /// Directory holding one dataset JSON file per metric
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// User timezone
        #[arg(long)]
        timezone: Option<String>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Print the default configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum WeighTimeArg {
    /// Weighed before the day's intake
    Morning,
    /// Weighed after the day's intake
    Night,
}

impl From<WeighTimeArg> for WeighTime {
    fn from(arg: WeighTimeArg) -> Self {
        match arg {
            WeighTimeArg::Morning => WeighTime::Morning,
            WeighTimeArg::Night => WeighTime::Night,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Compact JSON report
    Json,
    /// Pretty-printed JSON report
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("energy_balance=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), BalanceCliError> {
    match cli.command {
        Commands::Report {
            data_dir,
            config,
            timezone,
            weigh_time,
            from,
            to,
            format,
            output,
        } => {
            let mut config = load_config(config.as_deref(), timezone)?;
            if let Some(weigh_time) = weigh_time {
                config.weigh_time = weigh_time.into();
            }
            if let Some(from) = from {
                config.window.from = Some(parse_day(&from)?);
            }
            if let Some(to) = to {
                config.window.to = Some(parse_day(&to)?);
            }
            cmd_report(&data_dir, config, format, &output)
        }

        Commands::Days {
            data_dir,
            config,
            timezone,
            output,
        } => {
            let config = load_config(config.as_deref(), timezone)?;
            cmd_days(&data_dir, config, &output)
        }

        Commands::Config => {
            println!("{}", BalanceConfig::default().to_json()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>, timezone: Option<String>) -> Result<BalanceConfig, BalanceCliError> {
    let mut config = match path {
        Some(path) => BalanceConfig::from_json(&fs::read_to_string(path)?)?,
        None => BalanceConfig::default(),
    };
    if let Some(timezone) = timezone {
        config.timezone = timezone;
    }
    Ok(config)
}

/// Nanosecond range covering the configured from/to days, unbounded otherwise
fn fetch_range(processor: &BalanceProcessor) -> Result<(i64, i64), BalanceCliError> {
    let window = &processor.config().window;
    let calendar = processor.calendar();

    let start = match window.from {
        Some(day) => calendar.day_start_nanos(day)?,
        None => 0,
    };
    let end = match window.to {
        Some(day) => calendar.day_end_nanos(day)?,
        None => i64::MAX,
    };
    Ok((start, end))
}

fn cmd_report(
    data_dir: &Path,
    config: BalanceConfig,
    format: OutputFormat,
    output: &Path,
) -> Result<(), BalanceCliError> {
    let source = DirectorySource::new(data_dir, &config.sources);
    let processor = BalanceProcessor::new(config)?;
    let (start, end) = fetch_range(&processor)?;

    let analysis = processor.run(&source, start, end)?;

    let output_data = match format {
        OutputFormat::Text => processor.summary_text(&analysis.report)?,
        OutputFormat::Json => processor.summary_json(&analysis.report, false)? + "\n",
        OutputFormat::JsonPretty => processor.summary_json(&analysis.report, true)? + "\n",
    };
    write_output(output, &output_data)
}

fn cmd_days(data_dir: &Path, config: BalanceConfig, output: &Path) -> Result<(), BalanceCliError> {
    let source = DirectorySource::new(data_dir, &config.sources);
    let processor = BalanceProcessor::new(config)?;
    let (start, end) = fetch_range(&processor)?;

    let series = processor.fetch_series(&source, start, end)?;
    let days = processor.daily_rows(&series)?;
    if days.is_empty() {
        return Err(BalanceCliError::NoDays);
    }

    write_output(output, &(serde_json::to_string_pretty(&days)? + "\n"))
}

fn write_output(output: &Path, data: &str) -> Result<(), BalanceCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

// Error handling

#[derive(Debug)]
enum BalanceCliError {
    Io(io::Error),
    Balance(BalanceError),
    Json(serde_json::Error),
    NoDays,
}

impl From<io::Error> for BalanceCliError {
    fn from(e: io::Error) -> Self {
        BalanceCliError::Io(e)
    }
}

impl From<BalanceError> for BalanceCliError {
    fn from(e: BalanceError) -> Self {
        BalanceCliError::Balance(e)
    }
}

impl From<serde_json::Error> for BalanceCliError {
    fn from(e: serde_json::Error) -> Self {
        BalanceCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<BalanceCliError> for CliError {
    fn from(e: BalanceCliError) -> Self {
        match e {
            BalanceCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            BalanceCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            BalanceCliError::NoDays => CliError {
                code: "NO_DAYS".to_string(),
                message: "No daily records found".to_string(),
                hint: Some("Ensure the data directory holds <metric>.json datasets".to_string()),
            },
            BalanceCliError::Balance(e) => {
                let (code, hint) = match &e {
                    BalanceError::InsufficientWindow { .. } => (
                        "INSUFFICIENT_WINDOW",
                        "Log weight, body fat and food on at least two days",
                    ),
                    BalanceError::InsufficientData(_) => (
                        "INSUFFICIENT_DATA",
                        "Check that the window holds intake and weight readings",
                    ),
                    BalanceError::UnknownSleepStage(_) => (
                        "UNKNOWN_SLEEP_STAGE",
                        "Sleep stage codes must be between 1 and 6",
                    ),
                    BalanceError::InvalidTimezone(_) => (
                        "INVALID_TIMEZONE",
                        "Use an IANA timezone name, e.g. \"Europe/London\"",
                    ),
                    BalanceError::DateParseError(_) => {
                        ("DATE_PARSE_ERROR", "Dates use the DD/MM/YYYY format")
                    }
                    BalanceError::InvalidConfig(_) => {
                        ("INVALID_CONFIG", "Run 'balance config' for a valid template")
                    }
                    BalanceError::Io(_) => ("IO_ERROR", "Check file paths and permissions"),
                    BalanceError::JsonError(_) => {
                        ("PARSE_ERROR", "Ensure datasets are health-platform dataset JSON")
                    }
                    BalanceError::Format(_) => ("FORMAT_ERROR", "Retry with --format json"),
                    BalanceError::MissingMetricData(_) => {
                        ("MISSING_DATA", "Check the data directory")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
        }
    }
}
