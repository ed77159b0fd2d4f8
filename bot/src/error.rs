use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("BSON serialization error: {0}")]
    Bson(#[from] mongodb::bson::ser::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("`{program}` gagal (exit {status}): {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("Dibatalkan oleh operator")]
    Aborted,
    #[error("Database sudah diprovisi: {0}")]
    AlreadyProvisioned(String),
    #[error("Index sudah ada dengan opsi berbeda: {0}")]
    IndexMismatch(String),
    #[error("Duplicate key: {0}")]
    Duplicate(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
