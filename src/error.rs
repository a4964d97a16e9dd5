use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported log revision: {0}")]
    UnsupportedRevision(u8),
    #[error("truncated data: {0}")]
    Truncated(&'static str),
    #[error("corrupt data: {0}")]
    Corrupt(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
