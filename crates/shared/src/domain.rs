use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Server-assigned message identifier. The board backend hands out either
/// document ids (strings) or numeric keys, so both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Number(i64),
    Text(String),
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Number(value) => write!(f, "{value}"),
            MessageId::Text(value) => f.write_str(value),
        }
    }
}

/// A board message as served by `GET <endpoint>`.
///
/// `data` is kept as the raw wire string: a malformed timestamp must still
/// produce a displayable row, so parsing happens at render time.
///
/// Decoding never fails on a field's type, since the backend stores records
/// unvalidated. A null or missing `nome` reads as empty; an `id`, `mensagem`
/// or `data` of the wrong type reads as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<MessageId>,
    #[serde(default, deserialize_with = "lenient_name")]
    pub nome: String,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub mensagem: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub data: Option<String>,
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<MessageId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => Some(match number.as_i64() {
            Some(value) => MessageId::Number(value),
            None => MessageId::Text(number.to_string()),
        }),
        Value::String(text) => Some(MessageId::Text(text)),
        _ => None,
    })
}

fn lenient_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

impl Message {
    /// Stable list key: the server id when present, otherwise the row position.
    pub fn list_key(&self, index: usize) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => format!("#{index}"),
        }
    }
}
