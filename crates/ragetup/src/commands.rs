//! Command implementations for the ragetup CLI.

use crate::cli::{CliError, OkEnvelope};
use ragetup_core::{Catalog, ReleaseTarget};
use ragetup_installer::{Installer, smoke_test};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Load the catalog: a manifest file when given, the built-in revision otherwise.
fn load_catalog(manifest: Option<&Path>) -> Result<Catalog, CliError> {
    match manifest {
        Some(path) => Catalog::load(path).map_err(CliError::from),
        None => Ok(Catalog::builtin()),
    }
}

/// Pick the release target: an explicit platform string or the detected host.
fn select_target(platform: Option<&str>) -> Result<ReleaseTarget, CliError> {
    match platform {
        Some(s) => ReleaseTarget::parse(s).ok_or_else(|| {
            CliError::config_with_help(
                format!("'{s}' is not a valid platform"),
                "Use '<os>-<arch>', e.g. 'linux-amd64' or 'darwin-arm64'",
            )
        }),
        None => Ok(ReleaseTarget::current()),
    }
}

/// Default install root when --prefix is not given.
fn default_prefix() -> Result<PathBuf, CliError> {
    dirs::home_dir().map(|home| home.join(".local")).ok_or_else(|| {
        CliError::config_with_help(
            "Could not determine a home directory",
            "Pass --prefix to choose the install root explicitly",
        )
    })
}

/// The bin directory under the chosen install root.
fn bin_dir(prefix: Option<PathBuf>) -> Result<PathBuf, CliError> {
    let prefix = match prefix {
        Some(p) => p,
        None => default_prefix()?,
    };
    Ok(prefix.join("bin"))
}

fn print_json<T: serde::Serialize>(data: T) -> Result<(), CliError> {
    let envelope = OkEnvelope::new(data);
    match serde_json::to_string(&envelope) {
        Ok(json) => {
            println!("{json}");
            Ok(())
        }
        Err(e) => Err(CliError::other(format!("JSON serialization failed: {e}"))),
    }
}

/// Execute the `install` command.
///
/// Resolves the target against the catalog, runs the install sequence, then
/// smoke-tests the installed binary. A smoke-test failure is surfaced as a
/// warning but does not undo the completed install.
///
/// # Errors
///
/// Returns an error if resolution or any install step fails.
pub async fn execute_install(
    prefix: Option<PathBuf>,
    manifest: Option<PathBuf>,
    platform: Option<String>,
    json_mode: bool,
) -> Result<(), CliError> {
    let catalog = load_catalog(manifest.as_deref())?;
    let target = select_target(platform.as_deref())?;
    let artifact = catalog.resolve(&target)?;

    let installer = Installer::new(bin_dir(prefix)?);
    let receipt = installer.install(&catalog, artifact).await?;

    let smoke_ok = match smoke_test(&receipt.binary_path).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Smoke test failed after install");
            false
        }
    };

    if json_mode {
        print_json(serde_json::json!({
            "name": catalog.name(),
            "version": receipt.version,
            "binary": receipt.binary_path,
            "sha256": receipt.sha256,
            "smoke_test": smoke_ok,
        }))?;
    } else {
        println!(
            "Installed {} v{} to {}",
            catalog.name(),
            receipt.version,
            receipt.binary_path.display()
        );
        if !smoke_ok {
            eprintln!(
                "warning: '{} -h' did not exit cleanly; the binary may not work on this host",
                receipt.binary_path.display()
            );
        }
    }

    Ok(())
}

/// Execute the `test` command.
///
/// Unlike the post-install check, a failure here is the command's whole
/// result and therefore fatal.
///
/// # Errors
///
/// Returns an install error if the binary is missing or exits non-zero.
pub async fn execute_test(
    prefix: Option<PathBuf>,
    manifest: Option<PathBuf>,
    json_mode: bool,
) -> Result<(), CliError> {
    let catalog = load_catalog(manifest.as_deref())?;
    let binary = bin_dir(prefix)?.join(catalog.name());

    smoke_test(&binary).await.map_err(CliError::from)?;

    if json_mode {
        print_json(serde_json::json!({
            "binary": binary,
            "smoke_test": true,
        }))?;
    } else {
        println!("{} ok", binary.display());
    }

    Ok(())
}

/// Execute the `resolve` command.
///
/// # Errors
///
/// Returns a configuration error for unknown platforms or manifests.
pub fn execute_resolve(
    platform: Option<String>,
    manifest: Option<PathBuf>,
    json_mode: bool,
) -> Result<(), CliError> {
    let catalog = load_catalog(manifest.as_deref())?;
    let target = select_target(platform.as_deref())?;
    let artifact = catalog.resolve(&target)?;

    if json_mode {
        print_json(serde_json::json!({
            "name": catalog.name(),
            "version": catalog.version(),
            "target": target.to_string(),
            "url": artifact.url,
            "sha256": artifact.sha256,
        }))?;
    } else {
        println!("{} v{} for {}", catalog.name(), catalog.version(), target);
        println!("  url:    {}", artifact.url);
        println!("  sha256: {}", artifact.sha256);
    }

    Ok(())
}

/// Execute the `catalog` command.
///
/// # Errors
///
/// Returns a configuration error if the manifest cannot be loaded.
pub fn execute_catalog(manifest: Option<PathBuf>, json_mode: bool) -> Result<(), CliError> {
    let catalog = load_catalog(manifest.as_deref())?;

    let mut entries: Vec<_> = catalog.entries().collect();
    entries.sort_by_key(|(target, _)| target.to_string());

    if json_mode {
        let artifacts: Vec<_> = entries
            .iter()
            .map(|(target, artifact)| {
                serde_json::json!({
                    "target": target.to_string(),
                    "url": artifact.url,
                    "sha256": artifact.sha256,
                })
            })
            .collect();
        print_json(serde_json::json!({
            "name": catalog.name(),
            "version": catalog.version(),
            "homepage": catalog.homepage(),
            "artifacts": artifacts,
        }))?;
    } else {
        match catalog.homepage() {
            Some(homepage) => println!("{} v{} ({homepage})", catalog.name(), catalog.version()),
            None => println!("{} v{}", catalog.name(), catalog.version()),
        }
        println!();
        for (target, artifact) in entries {
            println!(
                "  {:<14} {}  {}",
                target.to_string(),
                &artifact.sha256[..20],
                artifact.url
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_target_explicit() {
        let target = select_target(Some("linux-amd64")).unwrap();
        assert_eq!(target.to_string(), "linux-amd64");
    }

    #[test]
    fn test_select_target_invalid() {
        let err = select_target(Some("freebsd-sparc")).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[test]
    fn test_select_target_detects_host() {
        let target = select_target(None).unwrap();
        assert_eq!(target, ReleaseTarget::current());
    }

    #[test]
    fn test_bin_dir_with_prefix() {
        let dir = bin_dir(Some(PathBuf::from("/opt/rageta"))).unwrap();
        assert_eq!(dir, PathBuf::from("/opt/rageta/bin"));
    }

    #[test]
    fn test_load_catalog_builtin() {
        let catalog = load_catalog(None).unwrap();
        assert_eq!(catalog.name(), "rageta");
    }

    #[test]
    fn test_load_catalog_missing_file() {
        let err = load_catalog(Some(Path::new("/no/such/manifest.json"))).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[test]
    fn test_execute_catalog_builtin() {
        // Human-readable listing of the builtin catalog must not error
        execute_catalog(None, false).unwrap();
    }

    #[test]
    fn test_execute_resolve_unsupported_platform_is_config_error() {
        let err = execute_resolve(Some("linux-amd64".to_string()), None, false);
        assert!(err.is_ok());

        // A syntactically valid but unpopulated target comes from a manifest
        // narrower than the builtin one
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(
            &path,
            serde_json::json!({
                "name": "rageta",
                "version": "0.0.17",
                "artifacts": [{
                    "os": "linux",
                    "arch": "amd64",
                    "url": "https://example.com/rageta_0.0.17_linux_amd64.tar.gz",
                    "sha256": "a".repeat(64),
                }]
            })
            .to_string(),
        )
        .unwrap();

        let err = execute_resolve(Some("darwin-arm64".to_string()), Some(path), false).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }
}
