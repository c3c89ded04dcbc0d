//! CLI argument parsing, exit codes, and error rendering.

use crate::logging::LogLevel;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use miette::{Diagnostic, Report};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;
/// Install failure exit code
pub const EXIT_INSTALL: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 2)
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(ragetup::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Install failure (exit code 3)
    #[error("Install error: {message}")]
    #[diagnostic(code(ragetup::cli::install))]
    Install {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Other unexpected error (exit code 3)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(ragetup::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new install error
    #[must_use]
    pub fn install(message: impl Into<String>) -> Self {
        Self::Install {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new install error with help text
    #[must_use]
    pub fn install_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Install {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new other error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }
}

/// Convert `ragetup_core::Error` to the appropriate `CliError` variant.
///
/// Platform and manifest problems are user-facing configuration issues
/// (exit code 2); everything that happens during the install sequence is an
/// install failure (exit code 3).
impl From<ragetup_core::Error> for CliError {
    fn from(err: ragetup_core::Error) -> Self {
        match &err {
            ragetup_core::Error::UnsupportedPlatform { .. } => Self::config_with_help(
                err.to_string(),
                "Run 'ragetup catalog' to list the platforms this release was built for",
            ),
            ragetup_core::Error::Manifest { .. } => Self::config(err.to_string()),
            ragetup_core::Error::Integrity { .. } => Self::install_with_help(
                err.to_string(),
                "The downloaded archive does not match the published digest; nothing was installed",
            ),
            _ => Self::install(err.to_string()),
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Install { .. } | CliError::Other { .. } => EXIT_INSTALL,
    }
}

/// Render error appropriately based on JSON flag
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "code": match err {
                CliError::Config { .. } => "config",
                CliError::Install { .. } => "install",
                CliError::Other { .. } => "other",
            },
            "message": err.to_string()
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        // Use miette for human-friendly error display
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        // Ensure output is flushed before potential process exit
        let _ = io::stderr().flush();
    }
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Main CLI entry point for ragetup.
#[derive(Parser, Debug)]
#[command(name = "ragetup")]
#[command(about = "Install prebuilt rageta release binaries for this host")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Emit JSON envelopes instead of human-readable output.
    #[arg(long, global = true, help = "Emit JSON envelopes instead of human-readable output")]
    pub json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download, verify, and install the release binary.
    #[command(about = "Download, verify, and install the release binary")]
    Install {
        /// Install root; the binary lands in <prefix>/bin.
        #[arg(long, help = "Install root; the binary lands in <prefix>/bin")]
        prefix: Option<PathBuf>,
        /// Release manifest file to use instead of the built-in catalog.
        #[arg(long, help = "Release manifest file to use instead of the built-in catalog")]
        manifest: Option<PathBuf>,
        /// Target platform override, e.g. "linux-amd64" (default: detect host).
        #[arg(long, help = "Target platform override, e.g. 'linux-amd64'")]
        platform: Option<String>,
    },
    /// Run the smoke test against an installed binary.
    #[command(about = "Run the smoke test against an installed binary")]
    Test {
        /// Install root the binary was installed under.
        #[arg(long, help = "Install root the binary was installed under")]
        prefix: Option<PathBuf>,
        /// Release manifest file to use instead of the built-in catalog.
        #[arg(long, help = "Release manifest file to use instead of the built-in catalog")]
        manifest: Option<PathBuf>,
    },
    /// Print the artifact a platform resolves to, without installing.
    #[command(about = "Print the artifact a platform resolves to, without installing")]
    Resolve {
        /// Target platform, e.g. "darwin-arm64" (default: detect host).
        #[arg(long, help = "Target platform, e.g. 'darwin-arm64'")]
        platform: Option<String>,
        /// Release manifest file to use instead of the built-in catalog.
        #[arg(long, help = "Release manifest file to use instead of the built-in catalog")]
        manifest: Option<PathBuf>,
    },
    /// List every platform the catalog has an artifact for.
    #[command(about = "List every platform the catalog has an artifact for")]
    Catalog {
        /// Release manifest file to use instead of the built-in catalog.
        #[arg(long, help = "Release manifest file to use instead of the built-in catalog")]
        manifest: Option<PathBuf>,
    },
    /// Generate shell completions.
    #[command(about = "Generate shell completions")]
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parse command line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Write completions for the given shell to stdout.
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "ragetup", &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_install_args() {
        let cli = Cli::try_parse_from([
            "ragetup",
            "install",
            "--prefix",
            "/opt/rageta",
            "--platform",
            "linux-amd64",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Install {
                prefix, platform, ..
            }) => {
                assert_eq!(prefix, Some(PathBuf::from("/opt/rageta")));
                assert_eq!(platform.as_deref(), Some("linux-amd64"));
            }
            _ => panic!("Expected install subcommand"),
        }
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from(["ragetup", "--json", "-L", "debug", "catalog"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.level, LogLevel::Debug);
    }

    #[test]
    fn test_parse_no_subcommand() {
        let cli = Cli::try_parse_from(["ragetup"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&CliError::config("x")), EXIT_CLI);
        assert_eq!(exit_code_for(&CliError::install("x")), EXIT_INSTALL);
        assert_eq!(exit_code_for(&CliError::other("x")), EXIT_INSTALL);
    }

    #[test]
    fn test_core_error_mapping() {
        use ragetup_core::{Arch, Os, ReleaseTarget, WordSize};

        let target = ReleaseTarget::new(Os::Linux, Arch::Arm64, WordSize::Bits32);
        let err: CliError = ragetup_core::Error::unsupported_platform(&target).into();
        assert!(matches!(err, CliError::Config { .. }));
        assert_eq!(exit_code_for(&err), EXIT_CLI);

        let err: CliError = ragetup_core::Error::integrity("a", "b", "u").into();
        assert!(matches!(err, CliError::Install { .. }));
        assert_eq!(exit_code_for(&err), EXIT_INSTALL);

        let err: CliError = ragetup_core::Error::network("timeout", "u").into();
        assert_eq!(exit_code_for(&err), EXIT_INSTALL);
    }

    #[test]
    fn test_ok_envelope_serialization() {
        let envelope = OkEnvelope::new(serde_json::json!({ "version": "0.0.17" }));
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"version\":\"0.0.17\""));
    }

    #[test]
    fn test_error_envelope_serialization() {
        let envelope = ErrorEnvelope::new(serde_json::json!({ "code": "config" }));
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"status\":\"error\""));
        assert!(json.contains("\"code\":\"config\""));
    }

    #[test]
    fn test_cli_error_help_text() {
        let err = CliError::config_with_help("bad flag", "try --help");
        match err {
            CliError::Config { help, .. } => assert_eq!(help.as_deref(), Some("try --help")),
            _ => panic!("Expected Config variant"),
        }
    }
}
