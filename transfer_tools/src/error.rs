use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach the transfer API: {0}")]
    RequestError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Transfer rejected. Error {status}. {message}")]
    TransferRejected { status: u16, message: String },
}
