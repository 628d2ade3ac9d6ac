use serde_json::Value;
use thiserror::Error;

use crate::transport::TransportError;

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// A caller-supplied value failed local validation. Nothing was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("group_id is required")]
    MissingGroupId,
    #[error("you are not in this group: <{group_id}>")]
    NotAJoinedGroup { group_id: String },
    #[error("you are not the owner of this group: <{group_id}>")]
    NotGroupOwner { group_id: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The node answered with a non-success status. The payload is kept as
    /// the node sent it since its schema differs between node versions.
    #[error("node rejected request ({status}): {payload}")]
    NodeRejected { status: u16, payload: Value },
    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("media processing failed: {0:#}")]
    Media(anyhow::Error),
    #[error("failed to load config from {path}: {message}")]
    Config { path: String, message: String },
}

impl ClientError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
