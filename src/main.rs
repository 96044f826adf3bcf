use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use legacydoc::cli::Output;
use legacydoc::cli::commands::document::DocumentOptions;

#[derive(Parser)]
#[command(name = "legacydoc")]
#[command(
    version,
    about = "LLM-driven documentation generator for legacy source files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Extra config file merged after the project config
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate documentation for a file or directory
    Document {
        #[arg(help = "File or directory to document")]
        path: PathBuf,
        #[arg(long, help = "Also render a PDF next to each Markdown file")]
        pdf: bool,
        #[arg(long, short, help = "Descend into subdirectories")]
        recursive: bool,
        #[arg(long, short, help = "Output directory")]
        output: Option<PathBuf>,
        #[arg(long, help = "LLM provider (openai, anthropic, gemini, ollama)")]
        provider: Option<String>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
    },

    /// Show run history summary
    History {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json, yaml"
        )]
        format: String,
        #[arg(long, default_value = "10", help = "Number of recent runs to list")]
        recent: usize,
    },

    /// Export run history as CSV
    Export {
        #[arg(long, short, help = "CSV file to write")]
        output: Option<PathBuf>,
    },

    /// Initialize legacydoc in the current directory
    Init {
        #[arg(long, short, help = "Overwrite existing initialization")]
        force: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mlegacydoc encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }

        eprintln!("\n\x1b[33mRecords already in .legacydoc/run_history.jsonl are intact.\x1b[0m");
        eprintln!("\x1b[33mPlease report this issue with the command you ran.\x1b[0m");
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let out = Output::new(cli.quiet);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Document {
            path,
            pdf,
            recursive,
            output,
            provider,
            model,
        } => {
            let options = DocumentOptions {
                path,
                pdf,
                recursive,
                output,
                provider,
                model,
            };
            let all_succeeded =
                legacydoc::cli::commands::document::run(options, config_path, &out)?;
            if !all_succeeded {
                anyhow::bail!("some files failed; see the run history for details");
            }
        }
        Commands::History { format, recent } => {
            legacydoc::cli::commands::history::run(&format, recent, config_path, &out)?;
        }
        Commands::Export { output } => {
            legacydoc::cli::commands::export::run(output, config_path, &out)?;
        }
        Commands::Init { force } => {
            legacydoc::cli::commands::init::run(force, &out)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                legacydoc::cli::commands::config::show(global, &format, config_path, &out)?;
            }
            ConfigAction::Path => {
                legacydoc::cli::commands::config::path(config_path)?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    legacydoc::cli::commands::config::init_global(force, &out)?;
                } else {
                    legacydoc::cli::commands::config::init_project(force, &out)?;
                }
            }
        },
    }

    Ok(())
}
