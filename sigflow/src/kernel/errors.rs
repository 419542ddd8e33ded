use core::fmt;

/// Validation errors raised at stage construction or reconfiguration time.
///
/// Setters and `try_new` constructors reject bad parameters synchronously
/// with one of these values and leave the stage state untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required input or configuration field is empty.
    EmptyInput {
        /// Name of the argument that is empty.
        arg: &'static str,
    },
    /// A configuration argument value is invalid.
    InvalidArgument {
        /// Name of the argument.
        arg: &'static str,
        /// Human readable reason.
        reason: &'static str,
    },
    /// A contiguous 1D slice view could not be obtained.
    NonContiguous {
        /// Name of the argument that is non-contiguous.
        arg: &'static str,
    },
    /// Output/input lengths did not match the required shape.
    LengthMismatch {
        /// Name of the argument.
        arg: &'static str,
        /// Required length.
        expected: usize,
        /// Received length.
        got: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyInput { arg } => write!(f, "Input `{arg}` was empty."),
            ConfigError::InvalidArgument { arg, reason } => {
                write!(f, "Invalid argument `{arg}`: {reason}")
            }
            ConfigError::NonContiguous { arg } => {
                write!(f, "Argument `{arg}` is not contiguous in memory.")
            }
            ConfigError::LengthMismatch { arg, expected, got } => {
                write!(
                    f,
                    "Length mismatch on `{arg}`. Expected {expected}, got {got}."
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failures surfaced by `process` calls on a streaming stage.
///
/// A realignment request is deliberately absent: zero consumed and zero
/// produced progress is a protocol signal, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// A lazy tap redesign produced an unusable coefficient set.
    DesignFailure {
        /// Human readable reason.
        reason: &'static str,
    },
    /// Output length mismatched the runtime contract of the stage.
    LengthMismatch {
        /// Name of the argument.
        arg: &'static str,
        /// Required length.
        expected: usize,
        /// Received length.
        got: usize,
    },
    /// Adapter binding or argument failure detected during processing.
    Config(ConfigError),
}

impl From<ConfigError> for StreamError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::DesignFailure { reason } => {
                write!(f, "Filter design failure: {reason}")
            }
            StreamError::LengthMismatch { arg, expected, got } => {
                write!(
                    f,
                    "Stream length mismatch on `{arg}`. Expected {expected}, got {got}."
                )
            }
            StreamError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for StreamError {}
