use serde::{Deserialize, Serialize};
use serde_json::Value;

/// ========================================
/// Catalog records and completion wire protocol
/// ========================================

/// A catalog entry. Identity is `id`; everything else is display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub image: String,
}

/// Shape of the static catalog resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    pub messages: &'a [ChatMessage],
}

/// Pull `choices[0].message.content` out of a decoded response body.
///
/// Returns `None` when the path is missing, is not a string, or is empty.
pub fn reply_content(body: &Value) -> Option<&str> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .filter(|s| !s.is_empty())
}
