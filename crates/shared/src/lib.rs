pub mod domain;
pub mod error;
pub mod protocol;

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use crate::{
        domain::{Message, MessageId},
        error::ValidationError,
        protocol::NewMessage,
    };

    #[test]
    fn decodes_message_with_numeric_id() {
        let message: Message = serde_json::from_value(json!({
            "id": 1,
            "nome": "Ana",
            "mensagem": "Oi",
            "data": "2024-01-01T10:00:00Z"
        }))
        .expect("decode");
        assert_eq!(message.id, Some(MessageId::Number(1)));
        assert_eq!(message.mensagem.as_deref(), Some("Oi"));
        assert_eq!(message.list_key(4), "1");
    }

    #[test]
    fn decodes_message_with_document_id_and_null_body() {
        let message: Message = serde_json::from_value(json!({
            "id": "65a1f0c2",
            "nome": "Bruno",
            "mensagem": null,
            "data": "2024-01-01T10:00:00Z"
        }))
        .expect("decode");
        assert_eq!(message.id, Some(MessageId::Text("65a1f0c2".into())));
        assert!(message.mensagem.is_none());
    }

    #[test]
    fn missing_id_falls_back_to_position_key() {
        let message: Message =
            serde_json::from_value(json!({ "nome": "Ana", "data": "x" })).expect("decode");
        assert_eq!(message.list_key(3), "#3");
    }

    #[test]
    fn mistyped_fields_decode_instead_of_failing() {
        let message: Message = serde_json::from_value(json!({
            "id": { "oid": "65a1" },
            "nome": null,
            "mensagem": 42,
            "data": 1704103200000i64
        }))
        .expect("decode");
        assert_eq!(message.id, None);
        assert_eq!(message.nome, "");
        assert_eq!(message.mensagem, None);
        assert_eq!(message.data, None);

        let message: Message =
            serde_json::from_value(json!({ "nome": 7, "data": "2024-01-01T10:00:00Z" }))
                .expect("decode");
        assert_eq!(message.nome, "7");
    }

    #[test]
    fn compose_trims_fields_and_serializes_iso_timestamp() {
        let sent_at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let payload = NewMessage::compose("  Ana ", " Oi\n", sent_at).expect("valid");
        assert_eq!(
            serde_json::to_value(&payload).expect("encode"),
            json!({
                "nome": "Ana",
                "mensagem": "Oi",
                "data": "2024-01-01T10:00:00.000Z"
            })
        );
    }

    #[test]
    fn compose_checks_name_before_message() {
        let now = Utc::now();
        assert_eq!(
            NewMessage::compose("   ", "", now),
            Err(ValidationError::MissingName)
        );
        assert_eq!(
            NewMessage::compose("Ana", " \t ", now),
            Err(ValidationError::MissingMessage)
        );
    }
}
