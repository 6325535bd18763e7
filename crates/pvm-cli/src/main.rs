mod command_flows;
mod completion;
mod core_flows;
mod dispatch;
mod render;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use crate::dispatch::run_cli;
use crate::render::{render_error_lines, TerminalRenderer};

#[derive(Parser, Debug)]
#[command(name = "pvm", version)]
#[command(about = "PHP version manager for Windows", long_about = None)]
struct Cli {
    /// Print debug logs to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install a PHP release line, e.g. `pvm install 8.3`.
    #[command(visible_alias = "i")]
    Install { version: Option<String> },
    /// Remove an installed PHP version.
    #[command(visible_alias = "uni")]
    Uninstall { version: Option<String> },
    /// Point the active PHP link at an installed version.
    Use {
        version: Option<String>,
        /// Set by the relaunched elevated process.
        #[arg(long, hide = true)]
        elevated: bool,
    },
    /// List installed versions, or the releases available upstream.
    #[command(visible_alias = "ls")]
    List {
        #[arg(short, long)]
        available: bool,
    },
    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let renderer = TerminalRenderer::current();
    match run_cli(cli, renderer) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            for line in render_error_lines(renderer.style(), &err) {
                eprintln!("{line}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "pvm=debug"
    } else {
        "warn"
    }
}
