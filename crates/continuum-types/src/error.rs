/// Errors from the payload converter.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("payload declares no encoding")]
    MissingEncoding,
    #[error("unknown payload encoding {encoding:?}")]
    UnknownEncoding { encoding: String },
    #[error("malformed json payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from timestamp/duration conversion at the wire boundary.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("timestamp components out of range: seconds={seconds}, nanos={nanos}")]
    OutOfRange { seconds: i64, nanos: i32 },
}
