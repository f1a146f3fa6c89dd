use std::path::{Path, PathBuf};

/// Crate-wide error type.
///
/// Variants fall into three exit-code families so the binary can map any
/// error straight to a process exit code at a single boundary:
///
/// - `2`: file access and format problems
/// - `3`: lookups and fit input the data cannot satisfy
/// - `4`: capabilities that are declared but not implemented
#[derive(Clone)]
pub enum ScanError {
    /// A file could not be read or written.
    Io { path: PathBuf, message: String },
    /// A scan file violated the SPEC text format.
    Format {
        file: String,
        line: usize,
        message: String,
    },
    /// A caller-supplied setting was rejected before any work ran.
    Config { message: String },
    /// The requested scan number is not present in the file.
    ScanNotFound { scan: u32, file: String },
    /// The requested channel label is not present in the scan.
    ChannelNotFound { channel: String, scan: u32 },
    /// Fit input was rejected before the solver ran.
    FitInput { message: String },
    /// The operation belongs to a data source that is declared but not
    /// implemented.
    NotImplemented { what: String },
}

impl ScanError {
    pub fn io(path: impl AsRef<Path>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn format(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn fit_input(message: impl Into<String>) -> Self {
        Self::FitInput {
            message: message.into(),
        }
    }

    pub fn not_implemented(what: impl Into<String>) -> Self {
        Self::NotImplemented { what: what.into() }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Io { .. } | Self::Format { .. } | Self::Config { .. } => 2,
            Self::ScanNotFound { .. } | Self::ChannelNotFound { .. } | Self::FitInput { .. } => 3,
            Self::NotImplemented { .. } => 4,
        }
    }
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "cannot access '{}': {}", path.display(), message)
            }
            Self::Format {
                file,
                line,
                message,
            } => write!(f, "'{file}' line {line}: {message}"),
            Self::Config { message } => write!(f, "invalid configuration: {message}"),
            Self::ScanNotFound { scan, file } => {
                write!(f, "scan {scan} not found in '{file}'")
            }
            Self::ChannelNotFound { channel, scan } => {
                write!(f, "channel '{channel}' not found in scan {scan}")
            }
            Self::FitInput { message } => write!(f, "invalid fit input: {message}"),
            Self::NotImplemented { what } => write!(f, "{what} is not implemented"),
        }
    }
}

impl std::fmt::Debug for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScanError({self}, exit_code={})", self.exit_code())
    }
}

impl std::error::Error for ScanError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_group_by_family() {
        let io = ScanError::io("/tmp/missing.dat", std::io::Error::other("gone"));
        assert_eq!(io.exit_code(), 2);
        assert_eq!(ScanError::format("f.dat", 3, "bad row").exit_code(), 2);
        assert_eq!(ScanError::config("points must be >= 2").exit_code(), 2);
        assert_eq!(
            ScanError::ScanNotFound {
                scan: 7,
                file: "f.dat".into()
            }
            .exit_code(),
            3
        );
        assert_eq!(
            ScanError::ChannelNotFound {
                channel: "mu".into(),
                scan: 1
            }
            .exit_code(),
            3
        );
        assert_eq!(ScanError::fit_input("too short").exit_code(), 3);
        assert_eq!(
            ScanError::not_implemented("HDF5 channel source").exit_code(),
            4
        );
    }

    #[test]
    fn display_names_the_missing_identifier() {
        let err = ScanError::ChannelNotFound {
            channel: "I0".into(),
            scan: 12,
        };
        let text = err.to_string();
        assert!(text.contains("I0"));
        assert!(text.contains("12"));
    }
}
