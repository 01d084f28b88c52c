use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ValidationError;

/// Body of `POST <endpoint>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub nome: String,
    pub mensagem: String,
    #[serde(serialize_with = "serialize_iso8601")]
    pub data: DateTime<Utc>,
}

impl NewMessage {
    /// Validates the form fields and builds the outbound record with both
    /// fields trimmed. The name is checked first.
    pub fn compose(
        name: &str,
        text: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let nome = name.trim();
        if nome.is_empty() {
            return Err(ValidationError::MissingName);
        }
        let mensagem = text.trim();
        if mensagem.is_empty() {
            return Err(ValidationError::MissingMessage);
        }
        Ok(Self {
            nome: nome.to_string(),
            mensagem: mensagem.to_string(),
            data: sent_at,
        })
    }
}

// Millisecond precision with a `Z` suffix, e.g. `2024-01-01T10:00:00.000Z`.
fn serialize_iso8601<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}
