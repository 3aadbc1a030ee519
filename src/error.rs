use std::fmt;

/// Error taxonomy shared by the request path and both binaries.
///
/// The first three variants are recoverable: when they occur while a request
/// is being handled they are rendered as the HTML error page at the router
/// boundary and never terminate a server process. `Configuration` is fatal
/// and only produced before serving begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Bad multipart structure, missing form parameter, or truncated body.
    MalformedInput(String),
    /// Unknown identifier or databank name.
    NotFound(String),
    /// A required external binary is missing, exited non-zero, or could not
    /// be driven.
    ExternalTool(String),
    /// Startup-only: missing executable, databank directory, or an
    /// impossible process transition (fork, privilege drop).
    Configuration(String),
}

impl ServiceError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        ServiceError::MalformedInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ServiceError::NotFound(msg.into())
    }

    pub fn tool(msg: impl Into<String>) -> Self {
        ServiceError::ExternalTool(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        ServiceError::Configuration(msg.into())
    }

    /// True for errors that must abort startup rather than be rendered as an
    /// error page.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ServiceError::Configuration(_))
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::MalformedInput(msg) => write!(f, "malformed input: {msg}"),
            ServiceError::NotFound(msg) => write!(f, "not found: {msg}"),
            ServiceError::ExternalTool(msg) => write!(f, "external tool failure: {msg}"),
            ServiceError::Configuration(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::ExternalTool(err.to_string())
    }
}
