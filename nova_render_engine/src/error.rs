//! Error types for the Nova render engine
//!
//! One error enum covers the whole core, following the failure taxonomy of
//! the rendering system: precondition violations, native-call failures,
//! invalid parameters and initialization failures. Device loss is not a
//! separate variant; it is a flag on a native-call failure, because the same
//! native error is fatal or recoverable depending on where it is observed.

use std::fmt;

/// Result type for Nova engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Nova engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// A rendering-API precondition was violated (e.g. missing fragment
    /// program, mismatched hull/domain pair). Never retried.
    Precondition(String),

    /// A native device call failed. Carries the native error code, a
    /// description naming the attempted operation, and whether the code is a
    /// device-removal/reset signature.
    RenderingApi {
        code: i32,
        description: String,
        device_lost: bool,
    },

    /// An unknown name or out-of-range argument (e.g. unknown custom
    /// attribute)
    InvalidParams(String),

    /// Device or subsystem initialization failed
    InitializationFailed(String),
}

impl Error {
    /// True when this error carries the device-removal/reset signature.
    ///
    /// Checked only at the frame boundary; everywhere else the error
    /// propagates unchanged.
    pub fn is_device_loss(&self) -> bool {
        matches!(
            self,
            Error::RenderingApi {
                device_lost: true,
                ..
            }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Precondition(msg) => write!(f, "Precondition violated: {}", msg),
            Error::RenderingApi {
                code, description, ..
            } => {
                write!(f, "Rendering API error ({:#x}): {}", code, description)
            }
            Error::InvalidParams(msg) => write!(f, "Invalid parameters: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
