//! Pure mapping from node operations to HTTP method and path.
//!
//! Identifiers interpolated into paths are percent-encoded; nothing here
//! validates them beyond that.

use serde_json::Value;

use crate::models::{ContentQuery, TrxType};
use crate::transport::{Method, Request};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Endpoint<'a> {
    Node,
    Network,
    NetworkPeers,
    NetworkRelay,
    PubkeyToAddr,

    Groups,
    Group { group_id: &'a str },
    Seed { group_id: &'a str, include_chain_url: bool },
    Block { group_id: &'a str, block_id: &'a str },
    CreateGroup,
    JoinGroup,
    LeaveGroup,
    ClearGroup,
    StartSync { group_id: &'a str },

    CreateToken,
    RefreshToken,
    ListToken,
    RevokeToken,
    RemoveToken,

    PubQueue { group_id: &'a str },
    TrxAck,
    Trx { group_id: &'a str, trx_id: &'a str },
    PostContent { group_id: &'a str },
    Content { group_id: &'a str, query: &'a ContentQuery },

    AppConfigKeyList { group_id: &'a str },
    AppConfigKey { group_id: &'a str, key: &'a str },
    AppConfig,

    TrxAuth { group_id: &'a str, trx_type: TrxType },
    ChainConfig,
    AllowList { group_id: &'a str },
    DenyList { group_id: &'a str },

    Announce,
    AnnouncedUsers { group_id: &'a str },
    AnnouncedUser { group_id: &'a str, pubkey: &'a str },
    AnnouncedProducers { group_id: &'a str },
    ApproveUser,
    UpdateUser,

    Consensus { group_id: &'a str },
    ConsensusReq { group_id: &'a str, req_id: &'a str },
    ConsensusLast { group_id: &'a str },
    ConsensusHistory { group_id: &'a str },
    ConsensusCurrent { group_id: &'a str },
    UpdateConsensus,
}

impl Endpoint<'_> {
    pub fn method(&self) -> Method {
        use Endpoint::*;
        match self {
            Node | Network | Groups | Group { .. } | Seed { .. } | Block { .. } | ListToken
            | PubQueue { .. } | Trx { .. } | Content { .. } | AppConfigKeyList { .. }
            | AppConfigKey { .. } | TrxAuth { .. } | AllowList { .. } | DenyList { .. }
            | AnnouncedUsers { .. } | AnnouncedUser { .. } | AnnouncedProducers { .. }
            | Consensus { .. } | ConsensusReq { .. } | ConsensusLast { .. }
            | ConsensusHistory { .. } | ConsensusCurrent { .. } => Method::Get,
            RemoveToken => Method::Delete,
            _ => Method::Post,
        }
    }

    pub fn path(&self) -> String {
        use Endpoint::*;
        match *self {
            Node => "/api/v1/node".into(),
            Network => "/api/v1/network".into(),
            NetworkPeers => "/api/v1/network/peers".into(),
            NetworkRelay => "/api/v1/network/relay".into(),
            PubkeyToAddr => "/api/v1/tools/pubkeytoaddr".into(),

            Groups => "/api/v1/groups".into(),
            Group { group_id } => format!("/api/v1/group/{}", seg(group_id)),
            Seed {
                group_id,
                include_chain_url,
            } => {
                let mut query = Query::new();
                query.push_bool("include_chain_url", include_chain_url);
                query.append_to(format!("/api/v1/group/{}/seed", seg(group_id)))
            }
            Block { group_id, block_id } => {
                format!("/api/v1/block/{}/{}", seg(group_id), seg(block_id))
            }
            CreateGroup => "/api/v1/group".into(),
            JoinGroup => "/api/v2/group/join".into(),
            LeaveGroup => "/api/v1/group/leave".into(),
            ClearGroup => "/api/v1/group/clear".into(),
            StartSync { group_id } => format!("/api/v1/group/{}/startsync", seg(group_id)),

            CreateToken => "/app/api/v1/token/create".into(),
            RefreshToken => "/app/api/v1/token/refresh".into(),
            ListToken => "/app/api/v1/token/list".into(),
            RevokeToken => "/app/api/v1/token/revoke".into(),
            RemoveToken => "/app/api/v1/token".into(),

            PubQueue { group_id } => format!("/api/v1/group/{}/pubqueue", seg(group_id)),
            TrxAck => "/api/v1/trx/ack".into(),
            Trx { group_id, trx_id } => {
                format!("/api/v1/trx/{}/{}", seg(group_id), seg(trx_id))
            }
            PostContent { group_id } => format!("/api/v1/group/{}/content", seg(group_id)),
            Content { group_id, query } => content_query(query)
                .append_to(format!("/api/v1/group/{}/content", seg(group_id))),

            AppConfigKeyList { group_id } => {
                format!("/api/v1/group/{}/appconfig/keylist", seg(group_id))
            }
            AppConfigKey { group_id, key } => {
                format!("/api/v1/group/{}/appconfig/{}", seg(group_id), seg(key))
            }
            AppConfig => "/api/v1/group/appconfig".into(),

            TrxAuth { group_id, trx_type } => format!(
                "/api/v1/group/{}/trx/auth/{}",
                seg(group_id),
                trx_type.as_str()
            ),
            ChainConfig => "/api/v1/group/chainconfig".into(),
            AllowList { group_id } => format!("/api/v1/group/{}/trx/allowlist", seg(group_id)),
            DenyList { group_id } => format!("/api/v1/group/{}/trx/denylist", seg(group_id)),

            Announce => "/api/v1/group/announce".into(),
            AnnouncedUsers { group_id } => {
                format!("/api/v1/group/{}/announced/users", seg(group_id))
            }
            AnnouncedUser { group_id, pubkey } => format!(
                "/api/v1/group/{}/announced/user/{}",
                seg(group_id),
                seg(pubkey)
            ),
            AnnouncedProducers { group_id } => {
                format!("/api/v1/group/{}/announced/producers", seg(group_id))
            }
            ApproveUser => "/api/v1/group/user".into(),
            UpdateUser => "/api/v1/group/upduser".into(),

            Consensus { group_id } => format!("/api/v1/group/{}/consensus", seg(group_id)),
            ConsensusReq { group_id, req_id } => format!(
                "/api/v1/group/{}/consensus/proof/{}",
                seg(group_id),
                seg(req_id)
            ),
            ConsensusLast { group_id } => {
                format!("/api/v1/group/{}/consensus/proof/last", seg(group_id))
            }
            ConsensusHistory { group_id } => {
                format!("/api/v1/group/{}/consensus/proof/history", seg(group_id))
            }
            ConsensusCurrent { group_id } => {
                format!("/api/v1/group/{}/consensus/current", seg(group_id))
            }
            UpdateConsensus => "/api/v1/group/updconsensus".into(),
        }
    }

    pub fn request(&self) -> Request {
        Request {
            method: self.method(),
            path: self.path(),
            body: None,
        }
    }

    pub fn request_with(&self, body: Value) -> Request {
        Request {
            body: Some(body),
            ..self.request()
        }
    }
}

fn seg(raw: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(raw)
}

/// Ordered query-string builder. Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: impl ToString) -> &mut Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Booleans go on the wire as JSON literals.
    pub fn push_bool(&mut self, key: &str, value: bool) -> &mut Self {
        self.push(key, if value { "true" } else { "false" })
    }

    /// One `key=value` pair per element.
    pub fn push_all<I, S>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for value in values {
            self.push(key, value.as_ref());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn encode(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn append_to(&self, path: String) -> String {
        if self.is_empty() {
            path
        } else {
            format!("{path}?{}", self.encode())
        }
    }
}

fn content_query(query: &ContentQuery) -> Query {
    let mut params = Query::new();
    params
        .push("num", query.num)
        .push_bool("reverse", query.reverse);
    if let Some(start_trx) = query.start_trx.as_deref().filter(|id| !id.is_empty()) {
        params
            .push("start_trx", start_trx)
            .push_bool("include_start_trx", query.include_start_trx);
    }
    params.push_all("senders", &query.senders);
    params
}
