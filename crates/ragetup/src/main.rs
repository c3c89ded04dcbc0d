//! ragetup CLI application.
//!
//! Installs prebuilt `rageta` release binaries: resolve the host platform
//! against a static release catalog, download the matching archive, verify
//! its SHA-256 digest, extract the binary, place it on the PATH, and run a
//! post-install smoke test.

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;
mod commands;
mod logging;

use cli::{CliError, Commands, EXIT_OK, exit_code_for, render_error};
use logging::{LogFormat, LoggingConfig};

/// Main entry point.
fn main() {
    // NOTE: Using eprintln! in the panic hook is intentional - the tracing
    // infrastructure may be corrupted during a panic.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    logging::init(LoggingConfig {
        format: if cli.json {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        },
        level: cli.level,
    });

    // Ensure a subcommand was provided
    let Some(command) = cli.command else {
        let err = CliError::config_with_help(
            "No subcommand provided",
            "Run 'ragetup --help' for usage information",
        );
        render_error(&err, cli.json);
        std::process::exit(exit_code_for(&err));
    };

    // Completions don't need the async runtime
    if let Commands::Completions { shell } = &command {
        cli::generate_completions(*shell);
        std::process::exit(EXIT_OK);
    }

    std::process::exit(run_with_tokio(command, cli.json));
}

/// Create the tokio runtime and run the command to completion.
fn run_with_tokio(command: Commands, json_mode: bool) -> i32 {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            // Tracing may not be functional this early in startup
            eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            return 1;
        }
    };

    rt.block_on(async {
        match execute_command(command, json_mode).await {
            Ok(()) => EXIT_OK,
            Err(err) => {
                render_error(&err, json_mode);
                exit_code_for(&err)
            }
        }
    })
}

/// Dispatch a parsed subcommand.
async fn execute_command(command: Commands, json_mode: bool) -> Result<(), CliError> {
    match command {
        Commands::Install {
            prefix,
            manifest,
            platform,
        } => commands::execute_install(prefix, manifest, platform, json_mode).await,
        Commands::Test { prefix, manifest } => {
            commands::execute_test(prefix, manifest, json_mode).await
        }
        Commands::Resolve { platform, manifest } => {
            commands::execute_resolve(platform, manifest, json_mode)
        }
        Commands::Catalog { manifest } => commands::execute_catalog(manifest, json_mode),
        Commands::Completions { shell } => {
            // Completions are handled early in main, this is just for exhaustiveness
            cli::generate_completions(shell);
            Ok(())
        }
    }
}
