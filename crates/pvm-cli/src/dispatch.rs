use anyhow::Result;
use pvm_core::HostArch;
use pvm_installer::{probe_privilege, relaunch_elevated, PvmConfig};
use tracing::debug;

use crate::command_flows::{
    run_install_command, run_list_available_command, run_list_command, run_uninstall_command,
    run_use_command,
};
use crate::completion::write_completions_script;
use crate::core_flows::{catalog_source, download_release, fetch_catalog};
use crate::render::TerminalRenderer;
use crate::{Cli, Commands};

pub(crate) fn run_cli(cli: Cli, renderer: TerminalRenderer) -> Result<()> {
    match cli.command {
        Commands::Install { version } => {
            let config = PvmConfig::from_env()?;
            let source = catalog_source(&config);
            debug!(root = %config.layout.root().display(), arch = HostArch::current().as_str(), "install");
            let label = version.as_deref().unwrap_or_default().trim().to_string();
            run_install_command(
                &config.layout,
                version.as_deref(),
                renderer,
                || fetch_catalog(&source),
                |artifact, path| download_release(renderer, &format!("php {label}"), artifact, path),
            )
        }
        Commands::Uninstall { version } => {
            let config = PvmConfig::from_env()?;
            run_uninstall_command(&config.layout, version.as_deref(), renderer)
        }
        Commands::Use { version, elevated } => {
            let config = PvmConfig::from_env()?;
            run_use_command(
                &config.layout,
                version.as_deref(),
                elevated,
                renderer,
                probe_privilege,
                relaunch_elevated,
            )
        }
        Commands::List { available: false } => {
            let config = PvmConfig::from_env()?;
            run_list_command(&config.layout, renderer)
        }
        Commands::List { available: true } => {
            let config = PvmConfig::from_env()?;
            let source = catalog_source(&config);
            run_list_available_command(source.releases_url(), renderer, || {
                fetch_catalog(&source)
            })
        }
        Commands::Completions { shell } => {
            let mut stdout = std::io::stdout().lock();
            write_completions_script(shell, &mut stdout)
        }
    }
}
