//! Platform identification for release targets.
//!
//! A `ReleaseTarget` is the key into the release catalog: operating system,
//! CPU architecture, and word size. Only the combinations the upstream
//! release pipeline actually builds are populated in catalog data; everything
//! else resolves to an unsupported-platform error.

use serde::{Deserialize, Serialize};

/// Operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// macOS
    Darwin,
    /// Linux
    Linux,
}

impl Os {
    /// Get the current OS.
    #[must_use]
    pub fn current() -> Self {
        #[cfg(target_os = "macos")]
        return Self::Darwin;
        #[cfg(target_os = "linux")]
        return Self::Linux;
        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        compile_error!("Unsupported OS");
    }

    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "darwin" | "macos" => Some(Self::Darwin),
            "linux" => Some(Self::Linux),
            _ => None,
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Darwin => write!(f, "darwin"),
            Self::Linux => write!(f, "linux"),
        }
    }
}

/// CPU architecture.
///
/// Display uses the GoReleaser spellings ("amd64", "arm64") so that target
/// strings line up with the archive names the release pipeline publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// x86-64 / Intel
    Amd64,
    /// ARM64 / aarch64
    Arm64,
}

impl Arch {
    /// Get the current architecture.
    #[must_use]
    pub fn current() -> Self {
        #[cfg(target_arch = "x86_64")]
        return Self::Amd64;
        #[cfg(target_arch = "aarch64")]
        return Self::Arm64;
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        compile_error!("Unsupported architecture");
    }

    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "amd64" | "x86_64" | "x64" | "intel" => Some(Self::Amd64),
            "arm64" | "aarch64" => Some(Self::Arm64),
            _ => None,
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Amd64 => write!(f, "amd64"),
            Self::Arm64 => write!(f, "arm64"),
        }
    }
}

/// Pointer width of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WordSize {
    /// 32-bit
    #[serde(rename = "32")]
    Bits32,
    /// 64-bit
    #[default]
    #[serde(rename = "64")]
    Bits64,
}

impl WordSize {
    /// Get the current word size.
    #[must_use]
    pub fn current() -> Self {
        #[cfg(target_pointer_width = "64")]
        return Self::Bits64;
        #[cfg(target_pointer_width = "32")]
        return Self::Bits32;
        #[cfg(not(any(target_pointer_width = "64", target_pointer_width = "32")))]
        compile_error!("Unsupported word size");
    }
}

impl std::fmt::Display for WordSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bits32 => write!(f, "32"),
            Self::Bits64 => write!(f, "64"),
        }
    }
}

/// Release target combining OS, architecture, and word size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseTarget {
    /// Operating system
    pub os: Os,
    /// CPU architecture
    pub arch: Arch,
    /// Pointer width
    #[serde(default)]
    pub word_size: WordSize,
}

impl ReleaseTarget {
    /// Create a new release target.
    #[must_use]
    pub const fn new(os: Os, arch: Arch, word_size: WordSize) -> Self {
        Self {
            os,
            arch,
            word_size,
        }
    }

    /// Get the target of the host this binary runs on.
    #[must_use]
    pub fn current() -> Self {
        Self {
            os: Os::current(),
            arch: Arch::current(),
            word_size: WordSize::current(),
        }
    }

    /// Parse from a string like "linux-amd64".
    ///
    /// The word size defaults to 64 bits, matching the only combinations the
    /// release pipeline publishes.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (os, arch) = s.split_once('-')?;
        Some(Self {
            os: Os::parse(os)?,
            arch: Arch::parse(arch)?,
            word_size: WordSize::Bits64,
        })
    }
}

impl std::fmt::Display for ReleaseTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}
