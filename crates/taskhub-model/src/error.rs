use thiserror::Error;

#[derive(Error, Debug)]
pub enum MessageError {
    #[error("failed to encode message: {0}")]
    Encode(String),
    #[error("failed to decode message: {0}")]
    Decode(String),
    #[error("message must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}
