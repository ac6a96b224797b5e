use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use npecheck_core::config::{self, Config, ConfigError, CONFIG_FILE_NAME, DEFAULT_CONFIG_TOML};
use npecheck_core::orchestrator::{self, AnalysisOutput};
use npecheck_diagnostics::rules::{get_all_rules, get_rule};

#[derive(Parser)]
#[command(name = "npecheck")]
#[command(about = "Nil-chain dereference checker for Go")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze bridge output for unguarded pointer dereferences
    Check {
        /// Bridge JSON file (typed syntax trees of the Go package)
        input: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
        /// Max diagnostics to report (0 = unlimited)
        #[arg(long)]
        max_diagnostics: Option<usize>,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
        /// Directory that diagnostic file paths are relative to
        #[arg(long)]
        source_root: Option<PathBuf>,
        /// Explicit config file (default: nearest npecheck.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Explain a rule in detail
    Explain {
        /// Rule code (e.g., NPE001)
        rule: String,
    },
    /// Write a default npecheck.toml in the current directory
    Init,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Json,
    Sarif,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Log to stderr so stdout stays clean for machine output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    match cli.command {
        Commands::Check {
            input,
            format,
            max_diagnostics,
            no_color,
            source_root,
            config,
        } => run_check(CheckArgs {
            input,
            format,
            max_diagnostics,
            no_color,
            source_root,
            config,
        }),
        Commands::Explain { rule } => run_explain(&rule),
        Commands::Init => run_init(),
    }
}

struct CheckArgs {
    input: PathBuf,
    format: Format,
    max_diagnostics: Option<usize>,
    no_color: bool,
    source_root: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    match explicit {
        Some(path) => config::load_config_file(path),
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            config::load_config(&cwd)
        }
    }
}

fn run_check(args: CheckArgs) -> ExitCode {
    let mut config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    if let Some(max) = args.max_diagnostics {
        config.npecheck.max_diagnostics = max;
    }

    let output = match orchestrator::analyze_path(&args.input, &config) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    for name in &output.failed_functions {
        eprintln!("warning: analysis of `{name}` failed; skipped");
    }

    match render(&output, &args) {
        Ok(text) => print!("{text}"),
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    }

    // Exit code: 0 clean, 1 issues found
    if output.diagnostics.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn render(output: &AnalysisOutput, args: &CheckArgs) -> Result<String, serde_json::Error> {
    match args.format {
        Format::Json => {
            serde_json::to_string_pretty(&output.diagnostics).map(|json| format!("{json}\n"))
        }
        Format::Sarif => {
            let version = env!("CARGO_PKG_VERSION");
            npecheck_diagnostics::sarif::to_sarif(&output.diagnostics, version)
                .map(|sarif| format!("{sarif}\n"))
        }
        Format::Human => Ok(npecheck_diagnostics::human::format_human(
            &output.diagnostics,
            args.source_root.as_deref(),
            !args.no_color,
        )),
    }
}

fn run_explain(rule: &str) -> ExitCode {
    let Some(info) = get_rule(rule) else {
        let known: Vec<String> = get_all_rules().into_iter().map(|r| r.code).collect();
        eprintln!("Unknown rule: {rule}. Known rules: {}", known.join(", "));
        return ExitCode::from(2);
    };

    println!("{}: {}\n", info.code, info.name);
    println!("{}\n", info.description);
    println!("Severity: {}  Category: {}", info.severity, info.category);
    if let Some(bad) = &info.example_bad {
        println!("\nExample:\n{bad}");
    }
    if let Some(good) = &info.example_good {
        println!("\nFix:\n{good}");
    }
    if let Some(idiom) = &info.go_idiom {
        println!("\n{idiom}");
    }
    ExitCode::SUCCESS
}

fn run_init() -> ExitCode {
    if Path::new(CONFIG_FILE_NAME).exists() {
        eprintln!("{CONFIG_FILE_NAME} already exists");
        return ExitCode::from(2);
    }

    match std::fs::write(CONFIG_FILE_NAME, DEFAULT_CONFIG_TOML) {
        Ok(()) => {
            println!("Created {CONFIG_FILE_NAME}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
