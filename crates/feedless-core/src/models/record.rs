use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::constants::content_types;

/// One immutable entry of the append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub key: String,
    pub value: RecordValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordValue {
    pub author: String,
    #[serde(default)]
    pub sequence: u64,
    /// Milliseconds since the Unix epoch, as claimed by the author.
    pub timestamp: i64,
    #[serde(default)]
    pub private: bool,
    pub content: Content,
}

impl LogRecord {
    pub fn author(&self) -> &str {
        &self.value.author
    }

    pub fn timestamp(&self) -> i64 {
        self.value.timestamp
    }

    pub fn is_private(&self) -> bool {
        self.value.private
    }

    pub fn content(&self) -> &Content {
        &self.value.content
    }

    pub fn as_post(&self) -> Option<&PostContent> {
        match &self.value.content {
            Content::Post(post) => Some(post),
            _ => None,
        }
    }

    /// True for an `about` record whose author describes themselves.
    pub fn is_self_assertion(&self) -> bool {
        matches!(&self.value.content, Content::About(about) if about.about == self.value.author)
    }
}

/// Record payload, discriminated by its `type` field.
///
/// Types the query layer does not interpret are kept verbatim in `Other`
/// so that the entry browser can still show them.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Post(PostContent),
    About(AboutContent),
    Contact(ContactContent),
    Delete(DeleteContent),
    Other { kind: String, body: Value },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostContent {
    #[serde(default)]
    pub text: String,
    /// Key of the thread root this post replies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recps: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AboutContent {
    pub about: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<AttributeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<AttributeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<AttributeValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactContent {
    pub contact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteContent {
    pub dest: String,
}

/// Value of a profile attribute inside an `about` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    /// Blob reference, e.g. `{"link": "&abc.sha256"}` for images.
    Link { link: String },
    /// `{"remove": true}` retracts the attribute; `{"remove": false}` is
    /// kept as an assertion without a usable value.
    Remove { remove: bool },
}

impl AttributeValue {
    pub fn is_removed(&self) -> bool {
        matches!(self, AttributeValue::Remove { remove: true })
    }

    /// The usable value, if this assertion carries one.
    pub fn value(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(text) => Some(text),
            AttributeValue::Link { link } => Some(link),
            AttributeValue::Remove { .. } => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl AboutContent {
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        match key {
            "name" => self.name.as_ref(),
            "image" => self.image.as_ref(),
            "description" => self.description.as_ref(),
            _ => None,
        }
    }

    /// The attribute as asserted by this record, unless it retracts it.
    pub fn current(&self, key: &str) -> Option<&AttributeValue> {
        self.attribute(key).filter(|value| !value.is_removed())
    }
}

impl Content {
    /// The `type` tag this content is stored under.
    pub fn kind(&self) -> &str {
        match self {
            Content::Post(_) => content_types::POST,
            Content::About(_) => content_types::ABOUT,
            Content::Contact(_) => content_types::CONTACT,
            Content::Delete(_) => content_types::DELETE,
            Content::Other { kind, .. } => kind.as_str(),
        }
    }
}

impl Serialize for Content {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = match self {
            Content::Post(post) => serde_json::to_value(post),
            Content::About(about) => serde_json::to_value(about),
            Content::Contact(contact) => serde_json::to_value(contact),
            Content::Delete(delete) => serde_json::to_value(delete),
            Content::Other { body, .. } => Ok(body.clone()),
        }
        .map_err(<S::Error as serde::ser::Error>::custom)?;

        if let Value::Object(map) = &mut value {
            map.insert("type".to_string(), Value::String(self.kind().to_string()));
        }
        value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let content = match kind.as_str() {
            content_types::POST => Content::Post(parse_body(value)?),
            content_types::ABOUT => Content::About(parse_body(value)?),
            content_types::CONTACT => Content::Contact(parse_body(value)?),
            content_types::DELETE => Content::Delete(parse_body(value)?),
            _ => Content::Other { kind, body: value },
        };
        Ok(content)
    }
}

fn parse_body<T: DeserializeOwned, E: serde::de::Error>(value: Value) -> Result<T, E> {
    serde_json::from_value(value).map_err(E::custom)
}
