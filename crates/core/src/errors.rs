//! Error types for catalog resolution and binary installation.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::platform::ReleaseTarget;

/// Result type alias for ragetup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or installing a release artifact.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// No release artifact exists for the requested platform.
    #[error("No release artifact for platform {target}")]
    #[diagnostic(
        code(ragetup::resolve::unsupported_platform),
        help("Run 'ragetup catalog' to list the platforms this release was built for")
    )]
    UnsupportedPlatform {
        /// The target that had no catalog entry, e.g. "linux-arm64 (32-bit)".
        target: String,
    },

    /// Failed to read or parse a release manifest.
    #[error("Invalid release manifest: {message}")]
    #[diagnostic(
        code(ragetup::catalog::manifest),
        help("Ensure the manifest is valid JSON with one artifact per platform")
    )]
    Manifest {
        /// The error message
        message: String,
        /// The manifest path, if loaded from disk
        path: Option<PathBuf>,
    },

    /// Archive download failed.
    #[error("Download failed: {message}")]
    #[diagnostic(
        code(ragetup::install::network),
        help("Check network connectivity and that the release still exists upstream")
    )]
    Network {
        /// The error message
        message: String,
        /// The URL that failed to download
        url: String,
    },

    /// Downloaded bytes do not match the catalog checksum.
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    #[diagnostic(
        code(ragetup::install::integrity),
        help("The downloaded archive does not match the published digest; never install it")
    )]
    Integrity {
        /// The digest recorded in the catalog
        expected: String,
        /// The digest of the downloaded bytes
        actual: String,
        /// The URL the archive came from
        url: String,
    },

    /// The archive is corrupt or does not have the expected layout.
    #[error("Archive extraction failed: {message}")]
    #[diagnostic(code(ragetup::install::extraction))]
    Extraction {
        /// The error message
        message: String,
    },

    /// Placing the binary into the install directory failed.
    #[error("Filesystem error: {message}")]
    #[diagnostic(
        code(ragetup::install::filesystem),
        help("Check permissions on the install directory")
    )]
    Filesystem {
        /// The error message
        message: String,
        /// The path that caused the error
        path: PathBuf,
    },

    /// The installed binary failed its post-install check.
    #[error("Smoke test failed for {}: {status}", path.display())]
    #[diagnostic(
        code(ragetup::smoke_test),
        help("The binary was installed but did not exit cleanly; it may be broken for this host")
    )]
    SmokeTest {
        /// The installed binary that was exercised
        path: PathBuf,
        /// Exit status description, e.g. "exit code 1" or "failed to spawn"
        status: String,
    },

    /// Wrapped I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(ragetup::io))]
    Io(#[from] std::io::Error),

    /// Wrapped JSON error.
    #[error("JSON error: {0}")]
    #[diagnostic(code(ragetup::json))]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a new unsupported-platform error from the rejected target.
    #[must_use]
    pub fn unsupported_platform(target: &ReleaseTarget) -> Self {
        Self::UnsupportedPlatform {
            target: format!("{} ({}-bit)", target, target.word_size),
        }
    }

    /// Create a new manifest error.
    #[must_use]
    pub fn manifest(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Manifest {
            message: message.into(),
            path,
        }
    }

    /// Create a new network error.
    #[must_use]
    pub fn network(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create a new integrity error.
    #[must_use]
    pub fn integrity(
        expected: impl Into<String>,
        actual: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::Integrity {
            expected: expected.into(),
            actual: actual.into(),
            url: url.into(),
        }
    }

    /// Create a new extraction error.
    #[must_use]
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    /// Create a new filesystem error.
    #[must_use]
    pub fn filesystem(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Filesystem {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Create a new smoke-test error.
    #[must_use]
    pub fn smoke_test(path: impl Into<PathBuf>, status: impl Into<String>) -> Self {
        Self::SmokeTest {
            path: path.into(),
            status: status.into(),
        }
    }

    /// Stable machine-readable kind string, used for JSON error envelopes.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedPlatform { .. } => "unsupported_platform",
            Self::Manifest { .. } => "manifest",
            Self::Network { .. } => "network",
            Self::Integrity { .. } => "integrity",
            Self::Extraction { .. } => "extraction",
            Self::Filesystem { .. } => "filesystem",
            Self::SmokeTest { .. } => "smoke_test",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os, WordSize};

    #[test]
    fn test_unsupported_platform_message() {
        let target = ReleaseTarget::new(Os::Linux, Arch::Arm64, WordSize::Bits32);
        let err = Error::unsupported_platform(&target);
        assert_eq!(
            err.to_string(),
            "No release artifact for platform linux-arm64 (32-bit)"
        );
    }

    #[test]
    fn test_integrity_message_carries_both_digests() {
        let err = Error::integrity("aaaa", "bbbb", "https://example.com/x.tar.gz");
        let msg = err.to_string();
        assert!(msg.contains("aaaa"));
        assert!(msg.contains("bbbb"));
    }

    #[test]
    fn test_kind_strings() {
        let target = ReleaseTarget::new(Os::Darwin, Arch::Amd64, WordSize::Bits64);
        assert_eq!(
            Error::unsupported_platform(&target).kind(),
            "unsupported_platform"
        );
        assert_eq!(Error::manifest("bad", None).kind(), "manifest");
        assert_eq!(Error::network("timeout", "u").kind(), "network");
        assert_eq!(Error::integrity("a", "b", "u").kind(), "integrity");
        assert_eq!(Error::extraction("truncated").kind(), "extraction");
        assert_eq!(Error::filesystem("denied", "/bin").kind(), "filesystem");
        assert_eq!(Error::smoke_test("/bin/rageta", "exit code 1").kind(), "smoke_test");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }
}
