/// Host platform naming used in release artifact URLs
use anyhow::Result;

/// Operating system and CPU architecture in Go-style release naming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: &'static str,
    pub arch: &'static str,
}

impl Platform {
    /// Platform of the running binary
    pub fn current() -> Result<Self> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map Rust target names (`macos`, `x86_64`, ...) to release names
    pub fn from_parts(os: &str, arch: &str) -> Result<Self> {
        let os = match os {
            "linux" => "linux",
            "macos" => "darwin",
            "windows" => "windows",
            other => anyhow::bail!("unsupported operating system: {}", other),
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            "arm" => "arm",
            other => anyhow::bail!("unsupported architecture: {}", other),
        };
        Ok(Self { os, arch })
    }

    /// Suffix carried by executables on this platform
    pub fn exe_suffix(&self) -> &'static str {
        if self.os == "windows" {
            ".exe"
        } else {
            ""
        }
    }
}
