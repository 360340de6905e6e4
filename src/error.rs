use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("SRT parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Model invocation error: {0}")]
    ModelInvocation(String),

    #[error("Invalid model response: {0}")]
    Validation(String),
}

impl SubsError {
    /// Failures of the model call itself, as opposed to a bad response
    pub fn is_invocation(&self) -> bool {
        matches!(self, Self::ModelInvocation(_) | Self::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, SubsError>;
