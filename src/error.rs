/// Error types shared by the lexicon, generator and pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JgError {
    /// Rejected input: empty lexicon entries, empty generator input
    Validation(String),
    /// Generated word still collides with the reserved set after disambiguation
    Collision(String),
    /// Filesystem failure (reading or persisting a document, temp files)
    Io(String),
    /// Malformed persisted document
    Parse(String),
    /// Invalid or missing configuration
    Config(String),
    /// An optional collaborator is not installed or could not start
    Unavailable(String),
    /// A collaborator failed while running a pipeline stage
    Stage(String),
    /// Network failure talking to a remote service
    Network(String),
}

impl std::fmt::Display for JgError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JgError::Validation(msg) => write!(f, "Validation error: {}", msg),
            JgError::Collision(msg) => write!(f, "Collision error: {}", msg),
            JgError::Io(msg) => write!(f, "I/O error: {}", msg),
            JgError::Parse(msg) => write!(f, "Parse error: {}", msg),
            JgError::Config(msg) => write!(f, "Configuration error: {}", msg),
            JgError::Unavailable(msg) => write!(f, "Unavailable: {}", msg),
            JgError::Stage(msg) => write!(f, "Stage failure: {}", msg),
            JgError::Network(msg) => write!(f, "Network error: {}", msg),
        }
    }
}

impl std::error::Error for JgError {}

impl From<std::io::Error> for JgError {
    fn from(err: std::io::Error) -> Self {
        JgError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for JgError {
    fn from(err: serde_json::Error) -> Self {
        JgError::Parse(err.to_string())
    }
}

/// Result type for jangaloga operations
pub type JgResult<T> = Result<T, JgError>;
