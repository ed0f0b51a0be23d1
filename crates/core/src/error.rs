use thiserror::Error;

/// Failures surfaced by the resolution pipeline. Every variant aborts
/// the whole run; no partial entity output is ever published.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("malformed input record '{party_id}': {reason}")]
    MalformedInput { party_id: String, reason: String },

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("resource exhausted during {stage}: {reason}")]
    ResourceExhausted { stage: &'static str, reason: String },

    #[error("run cancelled before {stage}")]
    Cancelled { stage: &'static str },
}

pub type Result<T> = std::result::Result<T, ResolveError>;
