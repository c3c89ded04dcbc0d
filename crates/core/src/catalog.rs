//! The release catalog: a static table mapping release targets to artifacts.
//!
//! A catalog is one revision of the upstream release metadata. It is parsed
//! once from a JSON manifest (either the embedded built-in revision or a file
//! supplied by the operator), validated, and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::errors::{Error, Result};
use crate::platform::{Arch, Os, ReleaseTarget, WordSize};

/// The manifest shipped with this build, covering rageta v0.0.17.
const BUILTIN_MANIFEST: &str = include_str!("../manifests/rageta_0.0.17.json");

/// One downloadable archive bound to exactly one release target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseArtifact {
    /// Versioned download URL of the compressed archive
    pub url: String,
    /// Hex-encoded SHA-256 digest of the archive bytes
    pub sha256: String,
}

/// One artifact row in a release manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Operating system this artifact was built for
    pub os: Os,
    /// CPU architecture this artifact was built for
    pub arch: Arch,
    /// Pointer width, defaulting to 64 bits
    #[serde(default)]
    pub word_size: WordSize,
    /// Download URL of the archive
    pub url: String,
    /// Hex-encoded SHA-256 digest of the archive
    pub sha256: String,
}

/// A release manifest document as produced by the release pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Name of the installed binary (e.g. "rageta")
    pub name: String,
    /// Semantic version shared by every artifact in this revision
    pub version: String,
    /// Upstream project homepage
    #[serde(default)]
    pub homepage: Option<String>,
    /// One entry per supported platform
    pub artifacts: Vec<ManifestEntry>,
}

/// An immutable, validated lookup table from target to artifact.
#[derive(Debug, Clone)]
pub struct Catalog {
    name: String,
    version: String,
    homepage: Option<String>,
    entries: HashMap<ReleaseTarget, ReleaseArtifact>,
}

impl Catalog {
    /// The catalog embedded in this build.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn builtin() -> Self {
        // The embedded manifest is covered by tests; parsing cannot fail at runtime.
        let manifest: Manifest =
            serde_json::from_str(BUILTIN_MANIFEST).expect("embedded manifest is valid JSON");
        Self::from_manifest(manifest).expect("embedded manifest is a valid catalog")
    }

    /// Load and validate a catalog from a manifest file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Manifest` if the file cannot be read, is not valid
    /// JSON, or fails catalog validation.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::manifest(
                format!("failed to read manifest: {e}"),
                Some(path.to_path_buf()),
            )
        })?;
        let manifest: Manifest = serde_json::from_str(&raw).map_err(|e| {
            Error::manifest(format!("invalid JSON: {e}"), Some(path.to_path_buf()))
        })?;
        Self::from_manifest(manifest)
            .map_err(|e| match e {
                Error::Manifest { message, .. } => {
                    Error::manifest(message, Some(path.to_path_buf()))
                }
                other => other,
            })
    }

    /// Build a catalog from a parsed manifest, validating its invariants.
    ///
    /// # Errors
    ///
    /// Returns `Error::Manifest` if the version is not semver, an artifact
    /// digest is not a SHA-256 hex string, the artifact list is empty, or the
    /// same target appears twice.
    pub fn from_manifest(manifest: Manifest) -> Result<Self> {
        if semver::Version::parse(&manifest.version).is_err() {
            return Err(Error::manifest(
                format!("'{}' is not a semantic version", manifest.version),
                None,
            ));
        }
        if manifest.artifacts.is_empty() {
            return Err(Error::manifest("manifest lists no artifacts", None));
        }

        let mut entries = HashMap::with_capacity(manifest.artifacts.len());
        for entry in manifest.artifacts {
            if entry.sha256.len() != 64 || !entry.sha256.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::manifest(
                    format!("'{}' is not a SHA-256 hex digest", entry.sha256),
                    None,
                ));
            }
            let target = ReleaseTarget::new(entry.os, entry.arch, entry.word_size);
            let artifact = ReleaseArtifact {
                url: entry.url,
                sha256: entry.sha256,
            };
            if entries.insert(target, artifact).is_some() {
                return Err(Error::manifest(
                    format!("duplicate artifact for target {target}"),
                    None,
                ));
            }
        }

        Ok(Self {
            name: manifest.name,
            version: manifest.version,
            homepage: manifest.homepage,
            entries,
        })
    }

    /// Name of the binary this catalog installs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version shared by every artifact in this catalog.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Upstream project homepage, if the manifest declared one.
    #[must_use]
    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    /// Exact-match lookup of the artifact for a target.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedPlatform` when no entry matches; there is
    /// never a fallback to another artifact.
    pub fn resolve(&self, target: &ReleaseTarget) -> Result<&ReleaseArtifact> {
        self.entries
            .get(target)
            .ok_or_else(|| Error::unsupported_platform(target))
    }

    /// Iterate over every populated (target, artifact) pair.
    pub fn entries(&self) -> impl Iterator<Item = (&ReleaseTarget, &ReleaseArtifact)> {
        self.entries.iter()
    }

    /// Number of populated targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no populated targets (never true after validation).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
