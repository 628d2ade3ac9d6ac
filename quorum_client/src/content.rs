//! Feed payloads posted as group content, plus the app-config entries that
//! describe a group.

use std::sync::Arc;

use quorum_media::{ImageCodec, MediaCodec};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ImageLimits;
use crate::error::{ClientError, Result};
use crate::images::{self, ImageInput, PackedImage};
use crate::models::Action;

/// A social action as the node stores it inside a transaction's `Data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentObject {
    Create { object: Object },
    /// `object` points at the note being edited; `result` is its new body.
    Update { object: Object, result: Object },
    Delete { object: Object },
    Like { object: Object },
    Dislike { object: Object },
    Follow { object: Object },
    Block { object: Object },
    Undo { object: Box<ContentObject> },
}

impl ContentObject {
    pub fn del_post(post_id: impl Into<String>) -> Self {
        ContentObject::Delete {
            object: Object::note_ref(post_id),
        }
    }

    pub fn like(post_id: impl Into<String>) -> Self {
        ContentObject::Like {
            object: Object::note_ref(post_id),
        }
    }

    pub fn unlike(post_id: impl Into<String>) -> Self {
        Self::like(post_id).undo()
    }

    pub fn dislike(post_id: impl Into<String>) -> Self {
        ContentObject::Dislike {
            object: Object::note_ref(post_id),
        }
    }

    pub fn undislike(post_id: impl Into<String>) -> Self {
        Self::dislike(post_id).undo()
    }

    pub fn follow(addr: impl Into<String>) -> Self {
        ContentObject::Follow {
            object: Object::person(addr),
        }
    }

    pub fn unfollow(addr: impl Into<String>) -> Self {
        Self::follow(addr).undo()
    }

    pub fn block(addr: impl Into<String>) -> Self {
        ContentObject::Block {
            object: Object::person(addr),
        }
    }

    pub fn unblock(addr: impl Into<String>) -> Self {
        Self::block(addr).undo()
    }

    pub fn undo(self) -> Self {
        ContentObject::Undo {
            object: Box::new(self),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Object {
    Note(Note),
    Person { id: String },
    Profile(Profile),
}

impl Object {
    /// A bare `{type: Note, id}` reference to an existing post.
    pub fn note_ref(id: impl Into<String>) -> Self {
        Object::Note(Note {
            id: Some(id.into()),
            ..Note::default()
        })
    }

    pub fn person(id: impl Into<String>) -> Self {
        Object::Person { id: id.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image: Vec<PackedImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inreplyto: Option<Box<Object>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub describes: Box<Object>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image: Vec<PackedImage>,
}

/// Body of `/api/v1/group/appconfig`, minus the group id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfigUpdate {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub value: String,
    pub action: Action,
    pub memo: String,
}

impl AppConfigUpdate {
    /// A string entry; the memo defaults to `update {name}`.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            memo: format!("update {name}"),
            name,
            value_type: "string".to_string(),
            value: value.into(),
            action: Action::Add,
        }
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn group_desc(desc: impl Into<String>) -> Self {
        Self::string("group_desc", desc).memo("init group desc")
    }

    pub fn group_announcement(announcement: impl Into<String>) -> Self {
        Self::string("group_announcement", announcement).memo("init group announcement")
    }

    /// `permission` must be `WRITE` or `READ`, in any case.
    pub fn group_default_permission(permission: &str) -> Result<Self> {
        let permission = permission.to_uppercase();
        if permission != "WRITE" && permission != "READ" {
            return Err(ClientError::invalid(
                "default_permission must be one of these: WRITE,READ",
            ));
        }
        Ok(Self::string("group_default_permission", permission)
            .memo("init group default permission"))
    }
}

/// Builds feed payloads, running attached images through a [`MediaCodec`].
#[derive(Clone)]
pub struct ContentPacker {
    codec: Arc<dyn MediaCodec>,
    limits: ImageLimits,
}

impl Default for ContentPacker {
    fn default() -> Self {
        Self::new(ImageLimits::default())
    }
}

impl ContentPacker {
    pub fn new(limits: ImageLimits) -> Self {
        Self::with_codec(Arc::new(ImageCodec), limits)
    }

    pub fn with_codec(codec: Arc<dyn MediaCodec>, limits: ImageLimits) -> Self {
        Self { codec, limits }
    }

    pub fn limits(&self) -> &ImageLimits {
        &self.limits
    }

    pub fn pack_images(&self, images: &[ImageInput]) -> Result<Vec<PackedImage>> {
        images::pack_images(self.codec.as_ref(), &self.limits, images)
    }

    /// A new note. `post_id` defaults to a fresh UUID. Text is required even
    /// when images are attached.
    pub fn new_post(
        &self,
        content: &str,
        images: &[ImageInput],
        post_id: Option<&str>,
        name: Option<&str>,
    ) -> Result<ContentObject> {
        let note = self.note(content, images, post_id, name)?;
        Ok(ContentObject::Create {
            object: Object::Note(note),
        })
    }

    pub fn edit_post(
        &self,
        content: &str,
        images: &[ImageInput],
        post_id: &str,
        name: Option<&str>,
    ) -> Result<ContentObject> {
        if post_id.is_empty() {
            return Err(ClientError::invalid("post_id is required"));
        }
        let mut result = self.note(content, images, None, name)?;
        result.id = None;
        Ok(ContentObject::Update {
            object: Object::note_ref(post_id),
            result: Object::Note(result),
        })
    }

    pub fn reply(
        &self,
        content: &str,
        images: &[ImageInput],
        reply_id: &str,
        post_id: Option<&str>,
        name: Option<&str>,
    ) -> Result<ContentObject> {
        let mut note = self.note(content, images, post_id, name)?;
        note.inreplyto = Some(Box::new(Object::note_ref(reply_id)));
        Ok(ContentObject::Create {
            object: Object::Note(note),
        })
    }

    /// Profile of the user at `addr`. At least one of `name` and `avatar`
    /// must be given.
    pub fn profile(
        &self,
        name: Option<&str>,
        avatar: Option<&ImageInput>,
        addr: &str,
    ) -> Result<ContentObject> {
        let name = name.filter(|name| !name.is_empty());
        if name.is_none() && avatar.is_none() {
            return Err(ClientError::invalid("name and avatar are empty"));
        }
        let image = match avatar {
            Some(avatar) => self.pack_images(std::slice::from_ref(avatar))?,
            None => Vec::new(),
        };
        Ok(ContentObject::Create {
            object: Object::Profile(Profile {
                describes: Box::new(Object::person(addr)),
                name: name.map(str::to_string),
                image,
            }),
        })
    }

    /// Group icon as a `data:` URL, packed with the whole image budget.
    pub fn group_icon(&self, icon: &ImageInput) -> Result<AppConfigUpdate> {
        let packed = images::pack_one(self.codec.as_ref(), icon, self.limits.max_total_kb)?;
        let value = format!("data:{};base64,{}", packed.media_type, packed.content);
        Ok(AppConfigUpdate::string("group_icon", value).memo("init group icon"))
    }

    fn note(
        &self,
        content: &str,
        images: &[ImageInput],
        post_id: Option<&str>,
        name: Option<&str>,
    ) -> Result<Note> {
        if content.is_empty() {
            return Err(ClientError::invalid("content is empty"));
        }
        Ok(Note {
            content: Some(content.to_string()),
            image: self.pack_images(images)?,
            name: name.filter(|name| !name.is_empty()).map(str::to_string),
            id: Some(
                post_id
                    .filter(|id| !id.is_empty())
                    .map_or_else(|| Uuid::new_v4().to_string(), str::to_string),
            ),
            inreplyto: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::tests::{RecordingCodec, PNG_HEADER};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn packer() -> ContentPacker {
        ContentPacker::with_codec(Arc::new(RecordingCodec::default()), ImageLimits::default())
    }

    fn to_json(object: &ContentObject) -> Value {
        serde_json::to_value(object).unwrap()
    }

    #[test]
    fn del_post_is_a_bare_reference() {
        assert_eq!(
            to_json(&ContentObject::del_post("abc")),
            json!({"type": "Delete", "object": {"type": "Note", "id": "abc"}})
        );
    }

    #[test]
    fn new_post_requires_content() {
        let err = packer().new_post("", &[], None, None).unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));

        let images = [ImageInput::Bytes(PNG_HEADER.to_vec())];
        let with_image = packer().new_post("", &images, None, None);
        assert!(with_image.is_err());
    }

    #[test]
    fn new_post_gets_a_generated_id() {
        let value = to_json(&packer().new_post("x", &[], None, None).unwrap());
        let id = value["object"]["id"].as_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(
            value,
            json!({"type": "Create", "object": {"type": "Note", "content": "x", "id": id}})
        );
    }

    #[test]
    fn edit_moves_the_id_up_a_level() {
        let value = to_json(&packer().edit_post("fixed", &[], "p1", Some("title")).unwrap());
        assert_eq!(
            value,
            json!({
                "type": "Update",
                "object": {"type": "Note", "id": "p1"},
                "result": {"type": "Note", "content": "fixed", "name": "title"}
            })
        );
    }

    #[test]
    fn reply_references_its_parent() {
        let value = to_json(&packer().reply("me too", &[], "parent", Some("r1"), None).unwrap());
        assert_eq!(
            value,
            json!({
                "type": "Create",
                "object": {
                    "type": "Note",
                    "content": "me too",
                    "id": "r1",
                    "inreplyto": {"type": "Note", "id": "parent"}
                }
            })
        );
    }

    #[test]
    fn undo_wraps_the_original_action() {
        assert_eq!(
            to_json(&ContentObject::unlike("p1")),
            json!({
                "type": "Undo",
                "object": { "type": "Like", "object": { "type": "Note", "id": "p1" } }
            })
        );
        assert_eq!(
            to_json(&ContentObject::unblock("addr")),
            json!({
                "type": "Undo",
                "object": { "type": "Block", "object": { "type": "Person", "id": "addr" } }
            })
        );
        assert_eq!(
            to_json(&ContentObject::follow("addr")),
            json!({"type": "Follow", "object": {"type": "Person", "id": "addr"}})
        );
    }

    #[test]
    fn profile_needs_a_name_or_an_avatar() {
        let err = packer().profile(None, None, "addr").unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));

        let value = to_json(&packer().profile(Some("alice"), None, "addr").unwrap());
        assert_eq!(
            value,
            json!({
                "type": "Create",
                "object": {
                    "type": "Profile",
                    "describes": {"type": "Person", "id": "addr"},
                    "name": "alice"
                }
            })
        );

        let avatar = ImageInput::Bytes(PNG_HEADER.to_vec());
        let value = to_json(&packer().profile(None, Some(&avatar), "addr").unwrap());
        assert_eq!(value["object"]["image"][0]["mediaType"], json!("image/png"));
    }

    #[test]
    fn group_icon_is_a_data_url() {
        let icon = packer()
            .group_icon(&ImageInput::Bytes(PNG_HEADER.to_vec()))
            .unwrap();
        assert_eq!(icon.name, "group_icon");
        assert_eq!(icon.memo, "init group icon");
        assert!(icon.value.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn default_permission_is_normalized() {
        let update = AppConfigUpdate::group_default_permission("read").unwrap();
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({
                "name": "group_default_permission",
                "type": "string",
                "value": "READ",
                "action": "add",
                "memo": "init group default permission"
            })
        );
        assert!(AppConfigUpdate::group_default_permission("admin").is_err());
    }
}
