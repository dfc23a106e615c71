use thiserror::Error;

#[derive(Error, Debug)]
pub enum BytescopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("class path unresolved: no discovery strategy produced a usable path")]
    ClassPathUnresolved,
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
    #[error("unsupported source file: {0}")]
    UnsupportedSourceFile(String),
    #[error("no code recorded for line {line} of {class_signature}")]
    LocationNotFound { class_signature: String, line: u32 },
    #[error("no loaded class matches signature: {0}")]
    ClassNotLoaded(String),
    #[error("malformed class bytes: {0}")]
    ClassFormat(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, BytescopeError>;
