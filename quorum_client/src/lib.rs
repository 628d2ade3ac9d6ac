//! Blocking client for the HTTP API of a quorum full node.
//!
//! [`FullNodeClient`] is the entry point. Feed payloads are built with
//! [`ContentPacker`] and posted through [`FullNodeClient::post_content`].

pub mod client;
pub mod config;
pub mod content;
pub mod endpoints;
pub mod error;
pub mod images;
pub mod membership;
pub mod models;
pub mod telemetry;
pub mod transport;
pub mod utils;

pub use client::FullNodeClient;
pub use config::{ClientConfig, ImageLimits};
pub use content::{AppConfigUpdate, ContentObject, ContentPacker, Note, Object, Profile};
pub use error::{ClientError, Result};
pub use images::{ImageInput, PackedImage};
pub use membership::{Access, MembershipGuard, MembershipSource};
pub use models::{
    Action, ConsensusOutcome, ConsensusType, ConsensusUpdate, ContentQuery, CreateGroupInput,
    EncryptionType, GroupInfo, PubQueueEntry, Role, TokenRequest, Trx, TrxAuth, TrxAuthMode,
    TrxType,
};
pub use quorum_media::{ImageCodec, MediaCodec};
pub use transport::{HttpTransport, Method, Request, Response, Transport, TransportError};
