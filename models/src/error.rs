use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the CA, trust-store and system-proxy primitives.
///
/// A command that runs and exits nonzero is not represented here; that is
/// reported as a plain `false`.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Key generation, certificate building, or PEM/DER parsing failed.
    #[error("crypto error: {0}")]
    Crypto(String),
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The external program could not be started at all.
    #[error("could not start `{program}`: {source}")]
    ExternalTool {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{operation} is not supported on platform '{platform}'")]
    UnsupportedPlatform {
        platform: String,
        operation: &'static str,
    },
    #[error("{operation} on {platform} requires a certificate fingerprint")]
    MissingFingerprint {
        platform: String,
        operation: &'static str,
    },
    #[error("`{program}` was cancelled before it finished")]
    Cancelled { program: String },
}

impl PlatformError {
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PlatformError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Classify an `io::Error` returned by a command runner.
    pub fn from_spawn(program: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::Interrupted {
            PlatformError::Cancelled {
                program: program.to_string(),
            }
        } else {
            PlatformError::ExternalTool {
                program: program.to_string(),
                source,
            }
        }
    }
}
