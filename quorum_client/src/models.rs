use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClientError, Result};

/// Transaction kinds whose authorization mode can be configured per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrxType {
    Post,
    Announce,
    ReqBlockForward,
    ReqBlockBackward,
    BlockSynced,
    BlockProduced,
    AskPeerid,
}

impl TrxType {
    pub const ALL: [TrxType; 7] = [
        TrxType::Post,
        TrxType::Announce,
        TrxType::ReqBlockForward,
        TrxType::ReqBlockBackward,
        TrxType::BlockSynced,
        TrxType::BlockProduced,
        TrxType::AskPeerid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrxType::Post => "POST",
            TrxType::Announce => "ANNOUNCE",
            TrxType::ReqBlockForward => "REQ_BLOCK_FORWARD",
            TrxType::ReqBlockBackward => "REQ_BLOCK_BACKWARD",
            TrxType::BlockSynced => "BLOCK_SYNCED",
            TrxType::BlockProduced => "BLOCK_PRODUCED",
            TrxType::AskPeerid => "ASK_PEERID",
        }
    }
}

impl FromStr for TrxType {
    type Err = ClientError;

    /// Case-insensitive; `"post"` and `"Post"` both give [`TrxType::Post`].
    fn from_str(raw: &str) -> Result<Self> {
        let upper = raw.to_uppercase();
        TrxType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == upper)
            .ok_or_else(|| {
                let allowed: Vec<_> = TrxType::ALL.iter().map(TrxType::as_str).collect();
                ClientError::invalid(format!("{upper} must be one of {allowed:?}"))
            })
    }
}

impl fmt::Display for TrxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a transaction type follows the group's allow list or deny list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrxAuthMode {
    Allow,
    Deny,
}

impl TrxAuthMode {
    /// Canonical short form: `alw` or `dny`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrxAuthMode::Allow => "alw",
            TrxAuthMode::Deny => "dny",
        }
    }

    /// Value of `trx_auth_mode` in chain config, e.g. `follow_alw_list`.
    pub fn auth_mode(&self) -> String {
        format!("follow_{}_list", self.as_str())
    }

    /// Chain config type that edits this mode's list, e.g. `upd_dny_list`.
    pub fn list_update_type(&self) -> String {
        format!("upd_{}_list", self.as_str())
    }
}

impl FromStr for TrxAuthMode {
    type Err = ClientError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.to_lowercase().as_str() {
            "alw" | "allow" => Ok(TrxAuthMode::Allow),
            "dny" | "deny" => Ok(TrxAuthMode::Deny),
            _ => Err(ClientError::invalid(format!(
                "{raw} mode must be one of ['deny','allow']"
            ))),
        }
    }
}

impl fmt::Display for TrxAuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token role. Chain tokens are never scoped to a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Node,
    Chain,
}

impl FromStr for Role {
    type Err = ClientError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.to_lowercase().as_str() {
            "node" => Ok(Role::Node),
            "chain" => Ok(Role::Chain),
            _ => Err(ClientError::invalid("role must be one of ['node','chain']")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Add,
    Remove,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Remove => "remove",
        }
    }
}

impl FromStr for Action {
    type Err = ClientError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.to_lowercase().as_str() {
            "add" => Ok(Action::Add),
            "remove" => Ok(Action::Remove),
            _ => Err(ClientError::invalid("action must be add or remove")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusType {
    #[default]
    Poa,
    Pos,
}

impl FromStr for ConsensusType {
    type Err = ClientError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.to_lowercase().as_str() {
            "poa" => Ok(ConsensusType::Poa),
            "pos" => Ok(ConsensusType::Pos),
            _ => Err(ClientError::invalid("consensus_type must be one of ['poa','pos']")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionType {
    #[default]
    Public,
    Private,
}

impl FromStr for EncryptionType {
    type Err = ClientError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.to_lowercase().as_str() {
            "public" => Ok(EncryptionType::Public),
            "private" => Ok(EncryptionType::Private),
            _ => Err(ClientError::invalid(
                "encryption_type must be one of ['public','private']",
            )),
        }
    }
}

/// A group as reported by `/api/v1/groups` or `/api/v1/group/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupInfo {
    pub group_id: String,
    pub group_name: String,
    pub owner_pubkey: String,
    pub user_pubkey: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GroupInfo {
    pub fn is_owned(&self) -> bool {
        !self.user_pubkey.is_empty() && self.user_pubkey == self.owner_pubkey
    }
}

/// A transaction. `data` holds the decoded application payload when the
/// node shipped readable base64 JSON, and the raw wire value otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trx {
    #[serde(rename = "TrxId", default, deserialize_with = "null_as_empty")]
    pub trx_id: String,
    #[serde(rename = "Data", default)]
    pub data: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Trx {
    /// Reads one listing entry. An entry of unexpected shape is kept whole:
    /// object fields land in `extra`, anything else in `data`.
    pub fn from_entry(entry: Value) -> Self {
        match serde_json::from_value::<Trx>(entry.clone()) {
            Ok(trx) => trx,
            Err(err) => {
                tracing::warn!(error = %err, "keeping unreadable trx entry as is");
                match entry {
                    Value::Object(extra) => Trx {
                        extra,
                        ..Trx::default()
                    },
                    data => Trx {
                        data,
                        ..Trx::default()
                    },
                }
            }
        }
    }

    /// Replaces base64 `data` with the JSON it encodes. On failure `data` is
    /// left as it was.
    pub fn decode_data(&mut self) -> anyhow::Result<()> {
        let encoded = self
            .data
            .as_str()
            .ok_or_else(|| anyhow!("trx carries no encoded data"))?;
        let bytes = STANDARD.decode(encoded).context("data is not base64")?;
        self.data = serde_json::from_slice(&bytes).context("data is not JSON")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PubQueueEntry {
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "Trx", default)]
    pub trx: Trx,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PubQueueEntry {
    pub fn is_failed(&self) -> bool {
        self.state == "FAIL"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrxAuth {
    #[serde(rename = "TrxType")]
    pub trx_type: String,
    #[serde(rename = "AuthType")]
    pub auth_type: String,
}

/// Paging parameters for the content listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentQuery {
    pub num: u32,
    pub reverse: bool,
    pub start_trx: Option<String>,
    /// Only sent together with `start_trx`.
    pub include_start_trx: bool,
    pub senders: Vec<String>,
}

impl Default for ContentQuery {
    fn default() -> Self {
        Self {
            num: 20,
            reverse: false,
            start_trx: None,
            include_start_trx: false,
            senders: Vec::new(),
        }
    }
}

impl ContentQuery {
    pub fn starting_at(trx_id: impl Into<String>, include_start_trx: bool) -> Self {
        Self {
            start_trx: Some(trx_id.into()),
            include_start_trx,
            ..Self::default()
        }
    }

    pub fn num(mut self, num: u32) -> Self {
        self.num = num;
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn senders<I, S>(mut self, senders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.senders = senders.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateGroupInput {
    pub group_name: String,
    pub app_key: String,
    pub consensus_type: ConsensusType,
    pub encryption_type: EncryptionType,
    pub include_chain_url: bool,
}

impl CreateGroupInput {
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            app_key: "group_timeline".to_string(),
            consensus_type: ConsensusType::default(),
            encryption_type: EncryptionType::default(),
            include_chain_url: false,
        }
    }
}

/// Input for token creation. Unset fields get node-friendly defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRequest {
    pub role: Role,
    pub name: Option<String>,
    pub group_id: Option<String>,
    /// ISO-8601; defaults to five years from now.
    pub expires_at: Option<String>,
}

/// Overrides for the group's consensus tuning. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsensusUpdate {
    pub start_from_epoch: Option<u64>,
    pub trx_epoch_tick: Option<u64>,
    pub agreement_tick_length: Option<u64>,
    pub agreement_tick_count: Option<u64>,
    pub producer_pubkey: Option<Vec<String>>,
}

pub const MIN_TRX_EPOCH_TICK_MS: u64 = 500;
pub const MIN_AGREEMENT_TICK_LENGTH_MS: u64 = 1000;
pub const MIN_AGREEMENT_TICK_COUNT: u64 = 10;

impl ConsensusUpdate {
    pub fn validate(&self) -> Result<()> {
        let below = |value: Option<u64>, floor: u64| value.is_some_and(|v| v < floor);
        if below(self.trx_epoch_tick, MIN_TRX_EPOCH_TICK_MS) {
            return Err(ClientError::invalid(format!(
                "trx_epoch_tick should be at least {MIN_TRX_EPOCH_TICK_MS}(ms)"
            )));
        }
        if below(self.agreement_tick_length, MIN_AGREEMENT_TICK_LENGTH_MS) {
            return Err(ClientError::invalid(format!(
                "agreement_tick_length should be at least {MIN_AGREEMENT_TICK_LENGTH_MS}(ms)"
            )));
        }
        if below(self.agreement_tick_count, MIN_AGREEMENT_TICK_COUNT) {
            return Err(ClientError::invalid(format!(
                "agreement_tick_count should be at least {MIN_AGREEMENT_TICK_COUNT}"
            )));
        }
        Ok(())
    }
}

/// The consensus request a group is currently running, as stored in the
/// node's proof records. Zero means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsensusProofReq {
    #[serde(rename = "StartFromEpoch")]
    pub start_from_epoch: u64,
    #[serde(rename = "TrxEpochTickLenInMs")]
    pub trx_epoch_tick: u64,
    #[serde(rename = "AgreementTickLenInMs")]
    pub agreement_tick_length: u64,
    #[serde(rename = "AgreementTickCount")]
    pub agreement_tick_count: u64,
    #[serde(rename = "ProducerPubkeyList")]
    pub producer_pubkey: Vec<String>,
}

/// Body of `/api/v1/group/updconsensus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsensusParams {
    pub group_id: String,
    pub start_from_epoch: u64,
    pub trx_epoch_tick: u64,
    pub agreement_tick_length: u64,
    pub agreement_tick_count: u64,
    pub producer_pubkey: Vec<String>,
}

impl ConsensusParams {
    /// Current settings, with unset values replaced by the documented minimums.
    pub fn from_prior(group_id: &str, prior: &ConsensusProofReq) -> Self {
        let or = |value: u64, fallback: u64| if value == 0 { fallback } else { value };
        Self {
            group_id: group_id.to_string(),
            start_from_epoch: or(prior.start_from_epoch, 1),
            trx_epoch_tick: or(prior.trx_epoch_tick, MIN_TRX_EPOCH_TICK_MS),
            agreement_tick_length: or(prior.agreement_tick_length, MIN_AGREEMENT_TICK_LENGTH_MS),
            agreement_tick_count: or(prior.agreement_tick_count, MIN_AGREEMENT_TICK_COUNT),
            producer_pubkey: prior.producer_pubkey.clone(),
        }
    }

    pub fn apply(&self, update: &ConsensusUpdate) -> Self {
        Self {
            group_id: self.group_id.clone(),
            start_from_epoch: update.start_from_epoch.unwrap_or(self.start_from_epoch),
            trx_epoch_tick: update.trx_epoch_tick.unwrap_or(self.trx_epoch_tick),
            agreement_tick_length: update
                .agreement_tick_length
                .unwrap_or(self.agreement_tick_length),
            agreement_tick_count: update
                .agreement_tick_count
                .unwrap_or(self.agreement_tick_count),
            producer_pubkey: update
                .producer_pubkey
                .clone()
                .filter(|keys| !keys.is_empty())
                .unwrap_or_else(|| self.producer_pubkey.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsensusOutcome {
    /// The computed settings equal the running ones; nothing was sent.
    NothingToUpdate,
    Submitted(Value),
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
