//! Error types for seekproxy.
//!
//! One enum covers every failure the client can hit: a bad menu choice, a
//! challenge page that cannot be solved, and transport failures while talking
//! to the proxy.  Whether an error is fatal depends on the phase that produced
//! it; see [`Error::exit_code`].

use std::error;
use std::fmt;
use std::io;
use std::sync::Arc;

use rustyline::error::ReadlineError;

/// Exit status used when the session handshake fails.
pub const BOOTSTRAP_EXIT_CODE: u8 = 2;

/// Exit status used when the user interrupts the program.
pub const INTERRUPT_EXIT_CODE: u8 = 130;

/// The main error type for seekproxy.
#[derive(Clone, Debug)]
pub enum Error {
    /// The menu input did not name a catalog entry.
    InvalidSelection {
        /// The raw text the user entered.
        input: String,
        /// Human-readable error message.
        message: String,
    },

    /// The challenge page could not be solved.
    Challenge {
        /// Human-readable error message.
        message: String,
    },

    /// The session handshake failed; wraps the underlying cause.
    Bootstrap {
        /// The error that stopped the handshake.
        source: Arc<Error>,
    },

    /// The server answered with a non-success status.
    Status {
        /// HTTP status code.
        status_code: u16,
        /// Human-readable error message.
        message: String,
    },

    /// A request timed out.
    Timeout {
        /// Human-readable error message.
        message: String,
        /// Duration of the timeout in seconds.
        duration: Option<f64>,
    },

    /// Request was aborted by the user.
    Abort {
        /// Human-readable error message.
        message: String,
    },

    /// Connection error.
    Connection {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// HTTP client error.
    HttpClient {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// I/O error.
    Io {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },

    /// Reading from the terminal failed.
    Terminal {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// A URL parsing or manipulation error.
    Url {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<url::ParseError>,
    },

    /// A configuration value was rejected.
    Validation {
        /// Human-readable error message.
        message: String,
        /// Parameter that failed validation.
        param: Option<String>,
    },
}

impl Error {
    /// Creates a new invalid selection error.
    pub fn invalid_selection(input: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidSelection {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Creates a new challenge error.
    pub fn challenge(message: impl Into<String>) -> Self {
        Error::Challenge {
            message: message.into(),
        }
    }

    /// Wraps an error raised during the session handshake.
    ///
    /// Wrapping an error that is already a bootstrap error returns it as is.
    pub fn bootstrap(source: Error) -> Self {
        match source {
            Error::Bootstrap { .. } => source,
            source => Error::Bootstrap {
                source: Arc::new(source),
            },
        }
    }

    /// Creates a new status error.
    pub fn status(status_code: u16, message: impl Into<String>) -> Self {
        Error::Status {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a new timeout error.
    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    /// Creates a new abort error.
    pub fn abort(message: impl Into<String>) -> Self {
        Error::Abort {
            message: message.into(),
        }
    }

    /// Creates a new connection error.
    pub fn connection(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new HTTP client error.
    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a new terminal error.
    pub fn terminal(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Terminal {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new URL error.
    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    /// Creates a new validation error.
    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    /// Returns true if this error is an invalid menu selection.
    pub fn is_invalid_selection(&self) -> bool {
        matches!(self, Error::InvalidSelection { .. })
    }

    /// Returns true if this error came from solving the challenge page.
    pub fn is_challenge(&self) -> bool {
        matches!(self, Error::Challenge { .. })
    }

    /// Returns true if this error stopped the session handshake.
    pub fn is_bootstrap(&self) -> bool {
        matches!(self, Error::Bootstrap { .. })
    }

    /// Returns true if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Returns true if this error is an abort.
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Abort { .. })
    }

    /// Returns true if this error happened on the wire.
    ///
    /// Transport errors during a chat turn are reported and the loop goes on.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Timeout { .. }
                | Error::Connection { .. }
                | Error::HttpClient { .. }
                | Error::Status { .. }
        )
    }

    /// Returns the status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Status { status_code, .. } => Some(*status_code),
            Error::Bootstrap { source } => source.status_code(),
            _ => None,
        }
    }

    /// Returns the process exit status for a fatal error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Bootstrap { .. } => BOOTSTRAP_EXIT_CODE,
            Error::Abort { .. } => INTERRUPT_EXIT_CODE,
            _ => 1,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidSelection { input, message } => {
                write!(f, "Invalid selection {input:?}: {message}")
            }
            Error::Challenge { message } => {
                write!(f, "Challenge error: {message}")
            }
            Error::Bootstrap { source } => {
                write!(f, "Session bootstrap failed: {source}")
            }
            Error::Status {
                status_code,
                message,
            } => {
                write!(f, "HTTP {status_code}: {message}")
            }
            Error::Timeout { message, duration } => {
                if let Some(duration) = duration {
                    write!(f, "Timeout error: {message} ({duration} seconds)")
                } else {
                    write!(f, "Timeout error: {message}")
                }
            }
            Error::Abort { message } => {
                write!(f, "Request aborted: {message}")
            }
            Error::Connection { message, .. } => {
                write!(f, "Connection error: {message}")
            }
            Error::HttpClient { message, .. } => {
                write!(f, "HTTP client error: {message}")
            }
            Error::Io { message, .. } => {
                write!(f, "I/O error: {message}")
            }
            Error::Terminal { message, .. } => {
                write!(f, "Terminal error: {message}")
            }
            Error::Url { message, .. } => {
                write!(f, "URL error: {message}")
            }
            Error::Validation { message, param } => {
                if let Some(param) = param {
                    write!(f, "Validation error: {message} (parameter: {param})")
                } else {
                    write!(f, "Validation error: {message}")
                }
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Bootstrap { source } => Some(source.as_ref()),
            Error::Connection { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::HttpClient { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source.as_ref()),
            Error::Terminal { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err.to_string(), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(format!("URL parse error: {err}"), Some(err))
    }
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::challenge(format!("token is not valid hex: {err}"))
    }
}

impl From<ReadlineError> for Error {
    fn from(err: ReadlineError) -> Self {
        Error::terminal(format!("failed to read input: {err}"), Some(Box::new(err)))
    }
}

/// A specialized Result type for seekproxy operations.
pub type Result<T> = std::result::Result<T, Error>;
