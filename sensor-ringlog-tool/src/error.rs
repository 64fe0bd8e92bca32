use thiserror::Error;

/// Errors that can occur while decoding captures or partition dumps, or while writing CSV.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to write CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("hex decoding error: {0}")]
    HexError(#[from] hex::FromHexError),

    #[error("invalid payload: {0}")]
    Payload(sensor_ringlog::Error),

    #[error("line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },

    #[error("metadata image: {0}")]
    Metadata(sensor_ringlog::Error),

    #[error("invalid partition size {0}: must be a multiple of 4096 bytes")]
    InvalidPartitionSize(usize),

    #[error("data image of {0} bytes holds no complete record")]
    EmptyImage(usize),

    #[error("invalid value: {0}")]
    InvalidValue(String),
}
