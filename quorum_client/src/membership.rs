//! Client-side membership checks run before group-scoped requests.
//!
//! Each level includes the ones below it: an owner check first resolves the
//! group id, then confirms the node has joined the group, then compares the
//! caller's key with the owner's. Facts are fetched fresh from the node on
//! every check.

use crate::error::{ClientError, Result};
use crate::models::GroupInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Access {
    /// An explicit group id or the current group selection.
    HasGroupId,
    /// The group is in the node's joined-groups list.
    IsJoined,
    /// The caller's key in the group is the owner's key.
    IsOwner,
}

/// Where the guard gets its facts from.
pub trait MembershipSource {
    fn joined_group_ids(&self) -> Result<Vec<String>>;
    fn fetch_group_info(&self, group_id: &str) -> Result<GroupInfo>;
}

pub struct MembershipGuard<'a, S: MembershipSource + ?Sized> {
    source: &'a S,
    current_group_id: Option<&'a str>,
}

impl<'a, S: MembershipSource + ?Sized> MembershipGuard<'a, S> {
    pub fn new(source: &'a S, current_group_id: Option<&'a str>) -> Self {
        Self {
            source,
            current_group_id,
        }
    }

    /// Returns the group id the operation should target once `access` holds.
    pub fn resolve(&self, access: Access, group_id: Option<&str>) -> Result<String> {
        let group_id = self.has_group_id(group_id)?;
        if access >= Access::IsJoined {
            self.ensure_joined(&group_id)?;
        }
        if access >= Access::IsOwner {
            self.ensure_owner(&group_id)?;
        }
        Ok(group_id)
    }

    pub fn has_group_id(&self, group_id: Option<&str>) -> Result<String> {
        group_id
            .filter(|id| !id.is_empty())
            .or(self.current_group_id.filter(|id| !id.is_empty()))
            .map(str::to_string)
            .ok_or(ClientError::MissingGroupId)
    }

    pub fn is_joined(&self, group_id: Option<&str>) -> Result<String> {
        self.resolve(Access::IsJoined, group_id)
    }

    pub fn is_owner(&self, group_id: Option<&str>) -> Result<String> {
        self.resolve(Access::IsOwner, group_id)
    }

    fn ensure_joined(&self, group_id: &str) -> Result<()> {
        let joined = self.source.joined_group_ids()?;
        if joined.iter().any(|id| id == group_id) {
            Ok(())
        } else {
            Err(ClientError::NotAJoinedGroup {
                group_id: group_id.to_string(),
            })
        }
    }

    fn ensure_owner(&self, group_id: &str) -> Result<()> {
        if self.source.fetch_group_info(group_id)?.is_owned() {
            Ok(())
        } else {
            Err(ClientError::NotGroupOwner {
                group_id: group_id.to_string(),
            })
        }
    }
}
