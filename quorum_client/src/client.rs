use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::ClientConfig;
use crate::content::{AppConfigUpdate, ContentPacker};
use crate::endpoints::Endpoint;
use crate::error::{ClientError, Result};
use crate::images::ImageInput;
use crate::membership::{Access, MembershipGuard, MembershipSource};
use crate::models::{
    Action, ConsensusOutcome, ConsensusParams, ConsensusProofReq, ConsensusUpdate,
    CreateGroupInput, ContentQuery, GroupInfo, PubQueueEntry, Role, TokenRequest, Trx, TrxAuth,
    TrxAuthMode, TrxType,
};
use crate::transport::{HttpTransport, Request, Transport};
use crate::utils::iso_days_from_now;

const TOKEN_LIFETIME_DAYS: i64 = 5 * 365;

/// Typed access to one full node.
///
/// Group-scoped operations take an optional group id and fall back to the
/// current selection. Membership is checked against the node before the
/// request goes out.
pub struct FullNodeClient<T = HttpTransport> {
    transport: T,
    packer: ContentPacker,
    current_group_id: Option<String>,
}

impl FullNodeClient<HttpTransport> {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(transport).with_packer(ContentPacker::new(config.images)))
    }

    pub fn from_env() -> Result<Self> {
        Self::new(&ClientConfig::from_env()?)
    }
}

impl<T: Transport> FullNodeClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            packer: ContentPacker::default(),
            current_group_id: None,
        }
    }

    pub fn with_packer(mut self, packer: ContentPacker) -> Self {
        self.packer = packer;
        self
    }

    pub fn packer(&self) -> &ContentPacker {
        &self.packer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn group_id(&self) -> Option<&str> {
        self.current_group_id.as_deref()
    }

    pub fn set_group_id(&mut self, group_id: Option<String>) {
        self.current_group_id = group_id.filter(|id| !id.is_empty());
    }

    fn guard(&self) -> MembershipGuard<'_, Self> {
        MembershipGuard::new(self, self.current_group_id.as_deref())
    }

    fn group(&self, access: Access, group_id: Option<&str>) -> Result<String> {
        self.guard().resolve(access, group_id)
    }

    fn call(&self, request: Request) -> Result<Value> {
        let response = self.transport.execute(&request)?;
        if !response.is_success() {
            return Err(ClientError::NodeRejected {
                status: response.status,
                payload: response.body,
            });
        }
        Ok(response.body)
    }

    fn get(&self, endpoint: Endpoint<'_>) -> Result<Value> {
        self.call(endpoint.request())
    }

    fn post(&self, endpoint: Endpoint<'_>, body: Value) -> Result<Value> {
        self.call(endpoint.request_with(body))
    }

    // node and network

    pub fn node_info(&self) -> Result<Value> {
        self.get(Endpoint::Node)
    }

    pub fn network(&self) -> Result<Value> {
        self.get(Endpoint::Network)
    }

    /// `peers` are multiaddrs such as `/ip4/10.0.0.1/tcp/31124/p2p/16Uiu2H...`.
    pub fn connect_peers(&self, peers: &[String]) -> Result<Value> {
        self.post(Endpoint::NetworkPeers, json!(peers))
    }

    pub fn ask_for_relay(&self, peers: &[String]) -> Result<Value> {
        self.post(Endpoint::NetworkRelay, json!(peers))
    }

    pub fn pubkeytoaddr(&self, pubkey: &str) -> Result<Value> {
        let body = self.post(Endpoint::PubkeyToAddr, json!({ "encoded_pubkey": pubkey }))?;
        Ok(unwrap_scalar(body, "addr"))
    }

    /// Peers connected to the group, as reported by the node's network info.
    pub fn group_network(&self, group_id: Option<&str>) -> Result<Vec<String>> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        let network = self.network()?;
        let peers = network
            .get("groups")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find(|group| group.get("GroupId").and_then(Value::as_str) == Some(group_id.as_str()))
            .and_then(|group| group.get("Peers"))
            .cloned()
            .unwrap_or(Value::Null);
        list_or_empty(peers)
    }

    // groups

    pub fn groups(&self) -> Result<Vec<GroupInfo>> {
        envelope(self.get(Endpoint::Groups)?, "groups")
    }

    pub fn groups_id(&self) -> Result<Vec<String>> {
        Ok(self
            .groups()?
            .into_iter()
            .map(|group| group.group_id)
            .collect())
    }

    pub fn group_info(&self, group_id: Option<&str>) -> Result<GroupInfo> {
        let group_id = self.group(Access::IsJoined, group_id)?;
        self.fetch_group_info(&group_id)
    }

    /// Returns the node's answer, which carries the new group's seed.
    pub fn create_group(&self, input: &CreateGroupInput) -> Result<Value> {
        self.post(Endpoint::CreateGroup, serde_json::to_value(input)?)
    }

    pub fn seed(&self, group_id: Option<&str>, include_chain_url: bool) -> Result<Value> {
        let group_id = self.group(Access::IsJoined, group_id)?;
        let body = self.get(Endpoint::Seed {
            group_id: &group_id,
            include_chain_url,
        })?;
        Ok(unwrap_scalar(body, "seed"))
    }

    /// `seed` is the `rum://` string handed out by [`Self::seed`].
    pub fn join_group(&self, seed: &str) -> Result<Value> {
        self.post(Endpoint::JoinGroup, json!({ "seed": seed }))
    }

    pub fn leave_group(&self, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        self.post(Endpoint::LeaveGroup, json!({ "group_id": group_id }))
    }

    /// Drops the group's local data on the node.
    pub fn clear_group(&self, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        self.post(Endpoint::ClearGroup, json!({ "group_id": group_id }))
    }

    pub fn get_block(&self, block_id: &str, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.group(Access::IsJoined, group_id)?;
        self.get(Endpoint::Block {
            group_id: &group_id,
            block_id,
        })
    }

    pub fn startsync(&self, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.group(Access::IsJoined, group_id)?;
        self.call(Endpoint::StartSync { group_id: &group_id }.request())
    }

    // tokens

    /// Chain tokens are never scoped to a group; node tokens need one.
    pub fn create_token(&self, request: &TokenRequest) -> Result<Value> {
        let group_id = self.token_scope(request.role, request.group_id.as_deref())?;
        let name = request.name.clone().unwrap_or_else(|| match &group_id {
            Some(group_id) => format!("allow-{group_id}"),
            None => "allow-chain".to_string(),
        });
        let expires_at = request
            .expires_at
            .clone()
            .unwrap_or_else(|| iso_days_from_now(TOKEN_LIFETIME_DAYS));
        self.post(
            Endpoint::CreateToken,
            json!({
                "name": name,
                "role": request.role,
                "group_id": group_id,
                "expires_at": expires_at,
            }),
        )
    }

    pub fn refresh_token(&self) -> Result<Value> {
        self.call(Endpoint::RefreshToken.request())
    }

    pub fn list_token(&self) -> Result<Value> {
        self.get(Endpoint::ListToken)
    }

    /// Disables `token` and records it in the node's revoke list.
    pub fn revoke_token(&self, token: &str, role: Role, group_id: Option<&str>) -> Result<Value> {
        let body = self.token_body(token, role, group_id)?;
        self.post(Endpoint::RevokeToken, body)
    }

    /// Deletes `token` from the node's config.
    pub fn remove_token(&self, token: &str, role: Role, group_id: Option<&str>) -> Result<Value> {
        let body = self.token_body(token, role, group_id)?;
        self.post(Endpoint::RemoveToken, body)
    }

    fn token_scope(&self, role: Role, group_id: Option<&str>) -> Result<Option<String>> {
        match role {
            Role::Chain => Ok(None),
            Role::Node => self.group(Access::HasGroupId, group_id).map(Some),
        }
    }

    fn token_body(&self, token: &str, role: Role, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.token_scope(role, group_id)?;
        Ok(json!({ "role": role, "group_id": group_id, "token": token }))
    }

    // content

    /// Posts `data` as a new transaction. Only the group id is checked so
    /// that groups still syncing can be posted to.
    pub fn post_content<D: Serialize + ?Sized>(
        &self,
        data: &D,
        group_id: Option<&str>,
    ) -> Result<Value> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        self.post(
            Endpoint::PostContent { group_id: &group_id },
            json!({ "data": serde_json::to_value(data)? }),
        )
    }

    /// Lists transactions, decoding each `Data` payload where possible.
    /// Undecodable payloads (private groups) are left untouched.
    pub fn get_content(&self, query: &ContentQuery, group_id: Option<&str>) -> Result<Vec<Trx>> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        let body = self.get(Endpoint::Content {
            group_id: &group_id,
            query,
        })?;
        let entries: Vec<Value> = list_or_empty(body)?;
        Ok(entries
            .into_iter()
            .map(|entry| {
                let mut trx = Trx::from_entry(entry);
                decode_trx_data(&mut trx);
                trx
            })
            .collect())
    }

    /// Looks the transaction up through the content listing first and falls
    /// back to the by-id endpoint when the page does not hold it. An empty id
    /// yields an empty trx.
    pub fn trx(&self, trx_id: &str, group_id: Option<&str>) -> Result<Trx> {
        if trx_id.is_empty() {
            return Ok(Trx::default());
        }
        let query = ContentQuery::starting_at(trx_id, true).num(1);
        let listed = self.get_content(&query, group_id)?;
        match listed.into_iter().find(|trx| trx.trx_id == trx_id) {
            Some(trx) => Ok(trx),
            None => self.get_trx(trx_id, group_id),
        }
    }

    pub fn get_trx(&self, trx_id: &str, group_id: Option<&str>) -> Result<Trx> {
        let group_id = self.group(Access::IsJoined, group_id)?;
        let body = self.get(Endpoint::Trx {
            group_id: &group_id,
            trx_id,
        })?;
        let mut trx: Trx = serde_json::from_value(body)?;
        decode_trx_data(&mut trx);
        Ok(trx)
    }

    pub fn pubqueue(&self, group_id: Option<&str>) -> Result<Vec<PubQueueEntry>> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        envelope(self.get(Endpoint::PubQueue { group_id: &group_id })?, "Data")
    }

    /// Acknowledges queued transactions. An empty batch sends nothing and
    /// returns `None`.
    pub fn ack(&self, trx_ids: &[String]) -> Result<Option<Value>> {
        if trx_ids.is_empty() {
            return Ok(None);
        }
        self.post(Endpoint::TrxAck, json!({ "trx_ids": trx_ids }))
            .map(Some)
    }

    /// Acknowledges every failed entry of the publish queue.
    pub fn autoack(&self, group_id: Option<&str>) -> Result<Option<Value>> {
        let failed: Vec<String> = self
            .pubqueue(group_id)?
            .into_iter()
            .filter(PubQueueEntry::is_failed)
            .map(|entry| entry.trx.trx_id)
            .collect();
        self.ack(&failed)
    }

    // appconfig

    pub fn get_keylist(&self, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        self.get(Endpoint::AppConfigKeyList { group_id: &group_id })
    }

    pub fn get_key(&self, key: &str, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        self.get(Endpoint::AppConfigKey {
            group_id: &group_id,
            key,
        })
    }

    pub fn update_appconfig(
        &self,
        update: &AppConfigUpdate,
        group_id: Option<&str>,
    ) -> Result<Value> {
        let group_id = self.group(Access::IsOwner, group_id)?;
        let mut body = serde_json::to_value(update)?;
        body["group_id"] = json!(group_id);
        self.post(Endpoint::AppConfig, body)
    }

    /// Packs `icon` and stores it as the group's `group_icon` entry.
    pub fn set_group_icon(&self, icon: &ImageInput, group_id: Option<&str>) -> Result<Value> {
        let update = self.packer.group_icon(icon)?;
        self.update_appconfig(&update, group_id)
    }

    // chain config

    pub fn get_trx_auth(&self, trx_type: TrxType, group_id: Option<&str>) -> Result<TrxAuth> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        let body = self.get(Endpoint::TrxAuth {
            group_id: &group_id,
            trx_type,
        })?;
        Ok(serde_json::from_value(body)?)
    }

    /// Auth mode of every transaction type, keyed by type name.
    pub fn get_auth(&self, group_id: Option<&str>) -> Result<BTreeMap<String, String>> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        TrxType::ALL
            .into_iter()
            .map(|trx_type| -> Result<(String, String)> {
                let auth = self.get_trx_auth(trx_type, Some(&group_id))?;
                Ok((auth.trx_type, auth.auth_type))
            })
            .collect()
    }

    pub fn set_trx_auth(
        &self,
        trx_type: TrxType,
        mode: TrxAuthMode,
        memo: Option<&str>,
        group_id: Option<&str>,
    ) -> Result<Value> {
        let group_id = self.group(Access::IsOwner, group_id)?;
        let config = json!({ "trx_type": trx_type, "trx_auth_mode": mode.auth_mode() });
        self.post(
            Endpoint::ChainConfig,
            json!({
                "group_id": group_id,
                "type": "set_trx_auth_mode",
                "config": config.to_string(),
                "Memo": memo.unwrap_or("set trx auth type"),
            }),
        )
    }

    pub fn get_allow_list(&self, group_id: Option<&str>) -> Result<Vec<Value>> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        list_or_empty(self.get(Endpoint::AllowList { group_id: &group_id })?)
    }

    pub fn get_deny_list(&self, group_id: Option<&str>) -> Result<Vec<Value>> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        list_or_empty(self.get(Endpoint::DenyList { group_id: &group_id })?)
    }

    /// `trx_types` defaults to `[POST]` when empty.
    pub fn add_allow_list(
        &self,
        pubkey: &str,
        trx_types: &[TrxType],
        group_id: Option<&str>,
    ) -> Result<Value> {
        self.update_list(pubkey, TrxAuthMode::Allow, Action::Add, trx_types, group_id)
    }

    pub fn remove_allow_list(
        &self,
        pubkey: &str,
        trx_types: &[TrxType],
        group_id: Option<&str>,
    ) -> Result<Value> {
        self.update_list(pubkey, TrxAuthMode::Allow, Action::Remove, trx_types, group_id)
    }

    pub fn add_deny_list(
        &self,
        pubkey: &str,
        trx_types: &[TrxType],
        group_id: Option<&str>,
    ) -> Result<Value> {
        self.update_list(pubkey, TrxAuthMode::Deny, Action::Add, trx_types, group_id)
    }

    pub fn remove_deny_list(
        &self,
        pubkey: &str,
        trx_types: &[TrxType],
        group_id: Option<&str>,
    ) -> Result<Value> {
        self.update_list(pubkey, TrxAuthMode::Deny, Action::Remove, trx_types, group_id)
    }

    fn update_list(
        &self,
        pubkey: &str,
        mode: TrxAuthMode,
        action: Action,
        trx_types: &[TrxType],
        group_id: Option<&str>,
    ) -> Result<Value> {
        let group_id = self.group(Access::IsOwner, group_id)?;
        let trx_types = if trx_types.is_empty() {
            &[TrxType::Post][..]
        } else {
            trx_types
        };
        let list = match mode {
            TrxAuthMode::Allow => "allow",
            TrxAuthMode::Deny => "deny",
        };
        let config = json!({ "action": action, "pubkey": pubkey, "trx_type": trx_types });
        self.post(
            Endpoint::ChainConfig,
            json!({
                "group_id": group_id,
                "type": mode.list_update_type(),
                "config": config.to_string(),
                "Memo": format!("{} {list} list", action.as_str()),
            }),
        )
    }

    // producers and consensus

    pub fn producers(&self, group_id: Option<&str>) -> Result<Vec<String>> {
        let consensus = self.get_consensus(group_id)?;
        let producers: Vec<Value> = envelope(consensus, "producers")?;
        Ok(producers
            .iter()
            .filter_map(|producer| producer.get("ProducerPubkey").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    pub fn get_announced_producers(&self, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        self.get(Endpoint::AnnouncedProducers { group_id: &group_id })
    }

    pub fn add_producer(&self, pubkeys: &[String], group_id: Option<&str>) -> Result<Value> {
        self.update_producers(pubkeys, Action::Add, group_id)
    }

    pub fn remove_producer(&self, pubkeys: &[String], group_id: Option<&str>) -> Result<Value> {
        self.update_producers(pubkeys, Action::Remove, group_id)
    }

    fn update_producers(
        &self,
        pubkeys: &[String],
        action: Action,
        group_id: Option<&str>,
    ) -> Result<Value> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        self.post(
            Endpoint::UpdateConsensus,
            json!({ "producer_pubkey": pubkeys, "group_id": group_id, "action": action }),
        )
    }

    pub fn announce_as_producer(
        &self,
        memo: Option<&str>,
        group_id: Option<&str>,
    ) -> Result<Value> {
        self.announce(Action::Add, "producer", memo, "announce self as producer", group_id)
    }

    pub fn announce_as_producer_to_remove(
        &self,
        memo: Option<&str>,
        group_id: Option<&str>,
    ) -> Result<Value> {
        self.announce(
            Action::Remove,
            "producer",
            memo,
            "announce self as producer to remove",
            group_id,
        )
    }

    pub fn announce_as_user(&self, memo: Option<&str>, group_id: Option<&str>) -> Result<Value> {
        self.announce(Action::Add, "user", memo, "announce self as user", group_id)
    }

    fn announce(
        &self,
        action: Action,
        kind: &str,
        memo: Option<&str>,
        default_memo: &str,
        group_id: Option<&str>,
    ) -> Result<Value> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        self.post(
            Endpoint::Announce,
            json!({
                "group_id": group_id,
                "action": action,
                "type": kind,
                "memo": memo.unwrap_or(default_memo),
            }),
        )
    }

    pub fn get_consensus(&self, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        self.get(Endpoint::Consensus { group_id: &group_id })
    }

    pub fn get_consensus_req(&self, req_id: &str, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        self.get(Endpoint::ConsensusReq {
            group_id: &group_id,
            req_id,
        })
    }

    pub fn get_consensus_last(&self, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        self.get(Endpoint::ConsensusLast { group_id: &group_id })
    }

    pub fn get_consensus_history(&self, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        self.get(Endpoint::ConsensusHistory { group_id: &group_id })
    }

    pub fn get_consensus_current(&self, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        self.get(Endpoint::ConsensusCurrent { group_id: &group_id })
    }

    /// Applies `update` on top of the group's running consensus settings.
    ///
    /// Overrides are checked against the minimums before anything is sent.
    /// When the result equals the running settings no update is submitted.
    pub fn update_consensus(
        &self,
        update: &ConsensusUpdate,
        group_id: Option<&str>,
    ) -> Result<ConsensusOutcome> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        update.validate()?;

        let prior = self.current_proof_req(&group_id)?;
        let existing = ConsensusParams::from_prior(&group_id, &prior);
        let proposed = existing.apply(update);
        if proposed == existing {
            return Ok(ConsensusOutcome::NothingToUpdate);
        }
        if proposed.trx_epoch_tick < proposed.agreement_tick_length {
            tracing::warn!(
                trx_epoch_tick = proposed.trx_epoch_tick,
                agreement_tick_length = proposed.agreement_tick_length,
                "trx_epoch_tick should not be smaller than agreement_tick_length"
            );
        }
        let body = self.post(Endpoint::UpdateConsensus, serde_json::to_value(&proposed)?)?;
        Ok(ConsensusOutcome::Submitted(body))
    }

    fn current_proof_req(&self, group_id: &str) -> Result<ConsensusProofReq> {
        let consensus = self.get_consensus(Some(group_id))?;
        let req_id = consensus
            .get("proof_req_id")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if req_id.is_empty() {
            return Ok(ConsensusProofReq::default());
        }
        let proof = self.get_consensus_req(req_id, Some(group_id))?;
        let req = proof
            .get("resps")
            .and_then(Value::as_array)
            .and_then(|resps| resps.first())
            .and_then(|resp| resp.get("Req"))
            .cloned();
        match req {
            Some(req) => Ok(serde_json::from_value(req)?),
            None => Ok(ConsensusProofReq::default()),
        }
    }

    // users

    pub fn get_announced_users(&self, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        self.get(Endpoint::AnnouncedUsers { group_id: &group_id })
    }

    pub fn get_announced_user(&self, pubkey: &str, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.group(Access::HasGroupId, group_id)?;
        self.get(Endpoint::AnnouncedUser {
            group_id: &group_id,
            pubkey,
        })
    }

    /// Approves an announced user. A user already approved is returned as is
    /// without a new approval.
    pub fn add_user(&self, pubkey: &str, group_id: Option<&str>) -> Result<Value> {
        let status = probe("announced user status", || {
            self.get_announced_user(pubkey, group_id)
        });
        if let Some(status) = status {
            if status.get("Result").and_then(Value::as_str) == Some("APPROVED") {
                return Ok(status);
            }
        }
        self.approve_user(pubkey, Action::Add, group_id)
    }

    pub fn remove_user(&self, pubkey: &str, group_id: Option<&str>) -> Result<Value> {
        self.approve_user(pubkey, Action::Remove, group_id)
    }

    fn approve_user(&self, pubkey: &str, action: Action, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.group(Access::IsOwner, group_id)?;
        self.post(
            Endpoint::ApproveUser,
            json!({ "user_pubkey": pubkey, "group_id": group_id, "action": action }),
        )
    }

    /// Sends `payload` to the user update endpoint with the group id filled in.
    pub fn update_user(&self, payload: Value, group_id: Option<&str>) -> Result<Value> {
        let group_id = self.group(Access::IsOwner, group_id)?;
        let mut payload = match payload {
            Value::Object(map) => map,
            other => {
                return Err(ClientError::invalid(format!(
                    "user update must be a JSON object, got {other}"
                )))
            }
        };
        payload
            .entry("group_id")
            .or_insert_with(|| Value::String(group_id));
        self.post(Endpoint::UpdateUser, Value::Object(payload))
    }
}

impl<T: Transport> MembershipSource for FullNodeClient<T> {
    fn joined_group_ids(&self) -> Result<Vec<String>> {
        self.groups_id()
    }

    fn fetch_group_info(&self, group_id: &str) -> Result<GroupInfo> {
        let body = self.get(Endpoint::Group { group_id })?;
        Ok(serde_json::from_value(body)?)
    }
}

/// Runs a lookup whose failure should not stop the caller. Errors are logged
/// and turned into `None`.
fn probe<V>(what: &str, lookup: impl FnOnce() -> Result<V>) -> Option<V> {
    match lookup() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(error = %err, "{what} lookup failed, continuing");
            None
        }
    }
}

fn decode_trx_data(trx: &mut Trx) {
    if let Err(err) = trx.decode_data() {
        tracing::warn!(trx_id = %trx.trx_id, error = %err, "failed to decode trx data");
    }
}

/// Items under `key`, or nothing when the key is absent or null.
fn envelope<V: DeserializeOwned>(body: Value, key: &str) -> Result<Vec<V>> {
    let items = match body {
        Value::Object(mut map) => map.remove(key).unwrap_or(Value::Null),
        _ => Value::Null,
    };
    list_or_empty(items)
}

/// A bare list. Null and the empty object of an empty body count as empty.
fn list_or_empty<V: DeserializeOwned>(items: Value) -> Result<Vec<V>> {
    match items {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        other => Ok(serde_json::from_value(other)?),
    }
}

/// The value under `key`, or the whole body when a node version omits it.
fn unwrap_scalar(body: Value, key: &str) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key(key) => map.remove(key).unwrap_or(Value::Null),
        other => other,
    }
}
