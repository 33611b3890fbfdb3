use thiserror::Error;

use crate::term::parse::TermParseError;

#[derive(Debug, Error)]
pub enum UnifConfigError {
    #[error("Invalid term in config: {0}")]
    Term(#[from] TermParseError),
    #[error("Invalid log level '{0}'")]
    InvalidLogLevel(String),
    #[error("Candidate {0} is configured more than once")]
    DuplicateCandidate(String),
    #[error("Candidate {0} has no condition enumerator and no default solution")]
    MissingDefault(String),
    #[cfg(feature = "toml")]
    #[error("An error reading a config file")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "toml")]
    #[error("Unable to parse config: {0}")]
    Parse(#[from] toml_edit::de::Error),
    #[cfg(feature = "toml")]
    #[error("Unable to write config: {0}")]
    Write(#[from] toml_edit::ser::Error),
}
