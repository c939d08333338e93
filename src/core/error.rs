use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HelmsmanError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("structural validation failed: {0}")]
    ValidationError(String),
    #[error("metadata validation failed: {0}")]
    MetadataError(String),
    #[error("unknown project type: {0}")]
    UnknownProjectType(String),
    #[error("{0}")]
    NotFound(String),
    #[error("transition error: {0}")]
    TransitionError(String),
    #[error("serialization error: {0}")]
    SerializationError(String),
}
