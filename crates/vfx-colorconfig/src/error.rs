//! Error types for configuration loading, resolution and processing.
//!
//! Every failure is returned to the caller. [`OcioError::kind`] groups the
//! variants into the coarse categories callers branch on; in particular
//! [`ErrorKind::MissingFile`] stays visible through compilation wrappers so a
//! caller can retry a resolution under a different [`Context`](crate::Context).

use std::path::PathBuf;
use thiserror::Error;

/// Result type for color configuration operations.
pub type OcioResult<T> = Result<T, OcioError>;

/// Errors that can occur while loading configs or building processors.
#[derive(Debug, Error)]
pub enum OcioError {
    /// I/O error reading a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Config file not found.
    #[error("config file not found: {path}")]
    ConfigNotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// Invalid config version.
    #[error("unsupported config version: {version} (supported: 1, 2)")]
    UnsupportedVersion {
        /// Version string from config.
        version: String,
    },

    /// Structural or referential problem in a config.
    #[error("malformed config: {reason}")]
    MalformedConfig {
        /// Description of what's wrong.
        reason: String,
    },

    /// Color space or role not found.
    #[error("color space or role not found: {name}")]
    ColorSpaceNotFound {
        /// The unresolved identifier.
        name: String,
    },

    /// Display not found in config.
    #[error("display not found: {name}")]
    DisplayNotFound {
        /// Name of the missing display.
        name: String,
    },

    /// View not found for display.
    #[error("view '{view}' not found for display '{display}'")]
    ViewNotFound {
        /// Display name.
        display: String,
        /// View name.
        view: String,
    },

    /// Look not found in config.
    #[error("look not found: {name}")]
    LookNotFound {
        /// Name of the missing look.
        name: String,
    },

    /// File referenced by a transform could not be located.
    #[error("file '{file}' not found in search path [{}]", .searched.join(", "))]
    MissingFile {
        /// Filename after variable substitution.
        file: String,
        /// Directories that were searched, in order.
        searched: Vec<String>,
    },

    /// Image dimensions are not strictly positive.
    #[error("invalid image dimensions {width}x{height}: image dimensions must be positive")]
    InvalidDimensions {
        /// Image width.
        width: usize,
        /// Image height.
        height: usize,
    },

    /// Invalid argument passed to an operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Circular reference detected while compiling transforms.
    #[error("circular reference detected: {chain}")]
    CircularReference {
        /// Description of the circular chain.
        chain: String,
    },

    /// File exists but no loader could read it.
    #[error("unsupported file: {path}")]
    UnsupportedFile {
        /// Resolved path of the file.
        path: PathBuf,
    },

    /// Transform could not be compiled.
    #[error("transform error: {0}")]
    Transform(String),

    /// Processor compilation failed for a requested conversion.
    #[error("cannot build processor '{src}' -> '{dst}': {source}")]
    Compilation {
        /// Requested source identifier.
        src: String,
        /// Requested destination identifier.
        dst: String,
        /// Underlying failure.
        #[source]
        source: Box<OcioError>,
    },
}

/// Coarse classification of [`OcioError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Parse failure or referential problem in a config.
    MalformedConfig,
    /// Color space, role, display, view or look name not found.
    UnknownIdentifier,
    /// Referenced file not found after exhausting the search path.
    MissingFile,
    /// Bad argument (dimensions, channel counts, buffer sizes).
    InvalidArgument,
    /// Pipeline could not be built.
    Compilation,
    /// Operating system I/O failure.
    Io,
}

impl OcioError {
    /// Returns the classification of this error.
    ///
    /// Compilation wrappers report [`ErrorKind::Compilation`]; use
    /// [`root_cause`](Self::root_cause) or
    /// [`is_missing_file`](Self::is_missing_file) to look inside.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::Yaml(_)
            | Self::ConfigNotFound { .. }
            | Self::UnsupportedVersion { .. }
            | Self::MalformedConfig { .. } => ErrorKind::MalformedConfig,
            Self::ColorSpaceNotFound { .. }
            | Self::DisplayNotFound { .. }
            | Self::ViewNotFound { .. }
            | Self::LookNotFound { .. } => ErrorKind::UnknownIdentifier,
            Self::MissingFile { .. } => ErrorKind::MissingFile,
            Self::InvalidDimensions { .. } | Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::CircularReference { .. }
            | Self::UnsupportedFile { .. }
            | Self::Transform(_)
            | Self::Compilation { .. } => ErrorKind::Compilation,
        }
    }

    /// Innermost error, unwrapping nested compilation failures.
    pub fn root_cause(&self) -> &OcioError {
        let mut err = self;
        while let Self::Compilation { source, .. } = err {
            err = &**source;
        }
        err
    }

    /// True if the root cause is a missing file.
    pub fn is_missing_file(&self) -> bool {
        self.root_cause().kind() == ErrorKind::MissingFile
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedConfig { reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_visible_through_wrapper() {
        let inner = OcioError::MissingFile {
            file: "lg10.spi1d".into(),
            searched: vec!["/a".into(), "/b".into()],
        };
        let err = OcioError::Compilation {
            src: "lg10".into(),
            dst: "lnf".into(),
            source: Box::new(inner),
        };

        assert_eq!(err.kind(), ErrorKind::Compilation);
        assert!(err.is_missing_file());
        assert!(err.to_string().contains("lg10.spi1d"));
        assert!(err.to_string().contains("'lg10' -> 'lnf'"));
    }

    #[test]
    fn dimension_message() {
        let err = OcioError::InvalidDimensions { width: 0, height: 4 };
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn missing_file_lists_search_path() {
        let err = OcioError::MissingFile {
            file: "x.spi1d".into(),
            searched: vec!["/a".into(), "/b".into()],
        };
        assert_eq!(err.to_string(), "file 'x.spi1d' not found in search path [/a, /b]");
    }
}
