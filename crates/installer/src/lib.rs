//! Download, verify, and install prebuilt rageta release binaries.
//!
//! The install sequence is deliberately linear, with no retries and no
//! caching:
//! 1. download the archive for the resolved platform
//! 2. verify its SHA-256 digest against the catalog
//! 3. extract the single binary from the tar.gz into a scoped staging dir
//! 4. move it atomically into the bin directory with mode 0o755
//!
//! Verification failures abort before anything touches the install target,
//! and staging directories are removed on every exit path.

use flate2::read::GzDecoder;
use ragetup_core::{Catalog, Error, ReleaseArtifact, Result};
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tar::Archive;
use tracing::{debug, info};

/// Result of a completed install.
#[derive(Debug, Clone)]
pub struct InstallReceipt {
    /// Final path of the installed executable.
    pub binary_path: PathBuf,
    /// SHA-256 digest of the archive that was installed.
    pub sha256: String,
    /// Version that was installed.
    pub version: String,
}

/// Downloads, verifies, and places release binaries into one bin directory.
pub struct Installer {
    client: Client,
    bin_dir: PathBuf,
}

impl Installer {
    /// Create a new installer targeting the given bin directory.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(bin_dir: impl Into<PathBuf>) -> Self {
        // Client::builder() with default TLS settings cannot fail.
        Self {
            client: Client::builder()
                .user_agent("ragetup")
                .build()
                .expect("Failed to create HTTP client - TLS backend initialization failed"),
            bin_dir: bin_dir.into(),
        }
    }

    /// The directory binaries are installed into.
    #[must_use]
    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Download, verify, extract, and place one release binary.
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` if the download fails, `Error::Integrity` if
    /// the archive does not match the catalog digest, `Error::Extraction` if
    /// the archive is corrupt or lacks the expected binary, and
    /// `Error::Filesystem` if placing the binary fails.
    pub async fn install(
        &self,
        catalog: &Catalog,
        artifact: &ReleaseArtifact,
    ) -> Result<InstallReceipt> {
        info!(
            name = %catalog.name(),
            version = %catalog.version(),
            url = %artifact.url,
            "Installing release binary"
        );
        let data = self.download(&artifact.url).await?;
        self.install_archive(catalog, artifact, &data)
    }

    /// Verify, extract, and place an already-downloaded archive.
    ///
    /// This is the tail of [`Installer::install`] after the network step;
    /// the same error contract applies, minus `Error::Network`.
    ///
    /// # Errors
    ///
    /// See [`Installer::install`].
    pub fn install_archive(
        &self,
        catalog: &Catalog,
        artifact: &ReleaseArtifact,
        data: &[u8],
    ) -> Result<InstallReceipt> {
        verify_checksum(data, &artifact.sha256, &artifact.url)?;

        // Scoped staging area; removed on every exit path when dropped.
        let staging = tempfile::tempdir()?;
        let staged = extract_binary(data, catalog.name(), staging.path())?;
        let binary_path = place_binary(&staged, &self.bin_dir, catalog.name())?;

        info!(binary = ?binary_path, "Installed release binary");

        Ok(InstallReceipt {
            binary_path,
            sha256: artifact.sha256.to_lowercase(),
            version: catalog.version().to_string(),
        })
    }

    /// Download an archive into memory.
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        debug!(%url, "Downloading release archive");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::network(e.to_string(), url))?;

        if !response.status().is_success() {
            return Err(Error::network(format!("HTTP {}", response.status()), url));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| Error::network(format!("failed to read body: {e}"), url))
    }
}

/// Compute the SHA-256 digest of a byte slice as lowercase hex.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Compare data against an expected hex digest.
///
/// # Errors
///
/// Returns `Error::Integrity` carrying both digests on mismatch.
pub fn verify_checksum(data: &[u8], expected: &str, url: &str) -> Result<()> {
    let actual = sha256_hex(data);
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(Error::integrity(expected.to_lowercase(), actual, url));
    }
    Ok(())
}

/// Extract the named binary from a gzip-compressed tar archive into `dest`.
fn extract_binary(data: &[u8], name: &str, dest: &Path) -> Result<PathBuf> {
    let decoder = GzDecoder::new(Cursor::new(data));
    let mut archive = Archive::new(decoder);

    let entries = archive
        .entries()
        .map_err(|e| Error::extraction(format!("failed to read archive: {e}")))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| Error::extraction(format!("failed to read archive entry: {e}")))?;

        let is_match = {
            let path = entry
                .path()
                .map_err(|e| Error::extraction(format!("invalid path in archive: {e}")))?;
            path.file_name().and_then(|s| s.to_str()) == Some(name)
        };
        if !is_match {
            continue;
        }

        let out = dest.join(name);
        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(|e| Error::extraction(format!("failed to read '{name}': {e}")))?;
        std::fs::write(&out, &content)?;
        return Ok(out);
    }

    Err(Error::extraction(format!(
        "binary '{name}' not found in archive"
    )))
}

/// Move the staged binary into the bin directory with mode 0o755.
///
/// The final path is only ever replaced by an atomic rename from a hidden
/// sibling, so a half-written binary is never visible at the install slot.
fn place_binary(staged: &Path, bin_dir: &Path, name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(bin_dir).map_err(|e| {
        Error::filesystem(format!("failed to create bin directory: {e}"), bin_dir)
    })?;

    let final_path = bin_dir.join(name);
    let tmp_path = bin_dir.join(format!(".{name}.tmp"));

    let place_result = (|| -> Result<()> {
        std::fs::copy(staged, &tmp_path)
            .map_err(|e| Error::filesystem(format!("failed to copy binary: {e}"), &tmp_path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&tmp_path)
                .map_err(|e| {
                    Error::filesystem(format!("failed to read permissions: {e}"), &tmp_path)
                })?
                .permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&tmp_path, perms).map_err(|e| {
                Error::filesystem(format!("failed to set permissions: {e}"), &tmp_path)
            })?;
        }

        std::fs::rename(&tmp_path, &final_path).map_err(|e| {
            Error::filesystem(format!("failed to move binary into place: {e}"), &final_path)
        })?;
        Ok(())
    })();

    // On failure, never leave the staging sibling behind
    if let Err(e) = place_result {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    Ok(final_path)
}

/// Run an installed binary with its help flag and require a zero exit.
///
/// This is a post-install sanity check, not a functional test of the binary
/// itself. A failure never rolls back a completed install.
///
/// # Errors
///
/// Returns `Error::SmokeTest` if the binary cannot be spawned or exits
/// non-zero.
pub async fn smoke_test(binary: &Path) -> Result<()> {
    debug!(binary = ?binary, "Running smoke test");

    let status = tokio::process::Command::new(binary)
        .arg("-h")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| Error::smoke_test(binary, format!("failed to spawn: {e}")))?;

    if !status.success() {
        let describe = status
            .code()
            .map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}"));
        return Err(Error::smoke_test(binary, describe));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    /// Build a gzip-compressed tar archive holding a single file.
    fn archive_with(name: &str, content: &[u8]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let mut header = tar::Header::new_gnu();
        header.set_path(name).unwrap();
        header.set_size(content.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append(&header, content).unwrap();

        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_sha256_hex_known_digest() {
        // Known hash for "hello world"
        assert_eq!(
            sha256_hex(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_verify_checksum_ok() {
        let digest = sha256_hex(b"payload");
        assert!(verify_checksum(b"payload", &digest, "u").is_ok());
    }

    #[test]
    fn test_verify_checksum_case_insensitive() {
        let digest = sha256_hex(b"payload").to_uppercase();
        assert!(verify_checksum(b"payload", &digest, "u").is_ok());
    }

    #[test]
    fn test_verify_checksum_mismatch() {
        let expected = sha256_hex(b"payload");
        let err = verify_checksum(b"tampered", &expected, "https://u").unwrap_err();
        match err {
            Error::Integrity {
                expected: e,
                actual,
                url,
            } => {
                assert_eq!(e, expected);
                assert_eq!(actual, sha256_hex(b"tampered"));
                assert_eq!(url, "https://u");
            }
            other => panic!("Expected Integrity error, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_binary() {
        let data = archive_with("rageta", b"#!/bin/sh\nexit 0\n");
        let dir = tempfile::tempdir().unwrap();

        let out = extract_binary(&data, "rageta", dir.path()).unwrap();
        assert_eq!(out, dir.path().join("rageta"));
        assert_eq!(std::fs::read(&out).unwrap(), b"#!/bin/sh\nexit 0\n");
    }

    #[test]
    fn test_extract_binary_nested_path() {
        // GoReleaser archives sometimes nest the binary under a directory.
        let data = archive_with("rageta_0.0.17/rageta", b"binary");
        let dir = tempfile::tempdir().unwrap();

        let out = extract_binary(&data, "rageta", dir.path()).unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"binary");
    }

    #[test]
    fn test_extract_binary_missing_entry() {
        let data = archive_with("readme.md", b"docs only");
        let dir = tempfile::tempdir().unwrap();

        let err = extract_binary(&data, "rageta", dir.path()).unwrap_err();
        assert!(err.to_string().contains("not found in archive"));
    }

    #[test]
    fn test_extract_binary_corrupt_archive() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_binary(b"definitely not a tar.gz", "rageta", dir.path()).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn test_place_binary_sets_exec_bit() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("staged");
        std::fs::write(&staged, b"binary").unwrap();
        let bin_dir = dir.path().join("bin");

        let installed = place_binary(&staged, &bin_dir, "rageta").unwrap();
        assert_eq!(installed, bin_dir.join("rageta"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&installed).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }

        // No staging sibling left behind
        assert!(!bin_dir.join(".rageta.tmp").exists());
    }

    #[test]
    fn test_place_binary_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("staged");
        std::fs::write(&staged, b"new").unwrap();
        let bin_dir = dir.path().join("bin");
        std::fs::create_dir_all(&bin_dir).unwrap();
        std::fs::write(bin_dir.join("rageta"), b"old").unwrap();

        let installed = place_binary(&staged, &bin_dir, "rageta").unwrap();
        assert_eq!(std::fs::read(&installed).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_smoke_test_zero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let binary = write_script(dir.path(), "ok", "#!/bin/sh\nexit 0\n");
        assert!(smoke_test(&binary).await.is_ok());
    }

    #[tokio::test]
    async fn test_smoke_test_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let binary = write_script(dir.path(), "bad", "#!/bin/sh\nexit 1\n");
        let err = smoke_test(&binary).await.unwrap_err();
        match err {
            Error::SmokeTest { status, .. } => assert_eq!(status, "exit code 1"),
            other => panic!("Expected SmokeTest error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_smoke_test_missing_binary() {
        let err = smoke_test(Path::new("/does/not/exist/rageta"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SmokeTest { .. }));
    }

    fn write_script(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).unwrap();
        }
        path
    }
}
