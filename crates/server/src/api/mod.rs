use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    domain::{Message, MessageId},
    error::{ApiError, ErrorCode, ValidationError},
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory board; messages are kept in insertion order.
#[derive(Clone, Default)]
pub struct ApiContext {
    messages: Arc<RwLock<Vec<Message>>>,
}

/// Body accepted by `POST <board path>`. Only `nome` is mandatory; a missing
/// timestamp is stamped on arrival.
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateMessageRequest {
    pub nome: Option<String>,
    #[serde(default)]
    pub mensagem: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

pub async fn list_messages(ctx: &ApiContext) -> Vec<Message> {
    ctx.messages.read().await.clone()
}

pub async fn create_message(
    ctx: &ApiContext,
    request: CreateMessageRequest,
) -> Result<Message, ApiError> {
    let nome = request
        .nome
        .map(|nome| nome.trim().to_string())
        .filter(|nome| !nome.is_empty())
        .ok_or(ValidationError::MissingName)?;

    let message = Message {
        id: Some(MessageId::Text(Uuid::new_v4().to_string())),
        nome,
        mensagem: request.mensagem,
        data: Some(
            request
                .data
                .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        ),
    };
    ctx.messages.write().await.push(message.clone());
    Ok(message)
}

pub async fn find_message(ctx: &ApiContext, id: &str) -> Result<Message, ApiError> {
    ctx.messages
        .read()
        .await
        .iter()
        .find(|message| {
            message
                .id
                .as_ref()
                .is_some_and(|message_id| message_id.to_string() == id)
        })
        .cloned()
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, format!("message {id} not found")))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
