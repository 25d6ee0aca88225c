use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Webhook payload is missing required field `{0}`")]
    MalformedPayload(&'static str),
    #[error("Cannot deserialize webhook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("Unsupported event kind `{0}`")]
    UnknownEvent(String),
    #[error("Unknown dispatch strategy `{0}`")]
    UnknownStrategy(String),
}
