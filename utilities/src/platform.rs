use std::fmt;
use std::str::FromStr;

/// The operating system family the trust-store and proxy procedures target.
///
/// Detected once at startup and handed to whoever needs it; nothing below
/// this module asks the OS directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformKind {
    Windows,
    MacOs,
    Linux,
    Unsupported,
}

impl PlatformKind {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            PlatformKind::Windows
        } else if cfg!(target_os = "macos") {
            PlatformKind::MacOs
        } else if cfg!(target_os = "linux") {
            PlatformKind::Linux
        } else {
            PlatformKind::Unsupported
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlatformKind::Windows => "windows",
            PlatformKind::MacOs => "macos",
            PlatformKind::Linux => "linux",
            PlatformKind::Unsupported => "unsupported",
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, PlatformKind::Unsupported)
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "windows" | "win" => Ok(PlatformKind::Windows),
            "macos" | "mac" | "darwin" | "osx" => Ok(PlatformKind::MacOs),
            "linux" => Ok(PlatformKind::Linux),
            "unsupported" => Ok(PlatformKind::Unsupported),
            other => Err(format!(
                "unknown platform '{other}', expected windows|macos|linux|unsupported"
            )),
        }
    }
}
