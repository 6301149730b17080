use crate::error::{AppError, ErrorResponse};
use crate::types::{ModifyMessage, MAX_MESSAGE_CHAR_LENGTH};

const FIELD_MESSAGE: &str = "message";

/// Check the message content of a create or update.
///
/// Length is counted in Unicode scalar values, so multi-byte characters
/// count once. Grapheme clusters made of several code points count once
/// per code point.
pub fn validate_message(op: &'static str, candidate: &ModifyMessage) -> Result<(), AppError> {
    if candidate.message.is_empty() {
        return Err(AppError::invalid(op).with_response(ErrorResponse::field(
            FIELD_MESSAGE,
            "Message field cannot be blank.",
        )));
    }

    if candidate.message.chars().count() > MAX_MESSAGE_CHAR_LENGTH {
        return Err(AppError::invalid(op).with_response(ErrorResponse::field(
            FIELD_MESSAGE,
            format!(
                "Message cannot be longer than {} characters.",
                MAX_MESSAGE_CHAR_LENGTH
            ),
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn first_response(err: &AppError) -> &ErrorResponse {
        assert_eq!(err.kind(), ErrorKind::Invalid);
        err.responses().first().expect("response attached")
    }

    #[test]
    fn test_rejects_empty_message() {
        let err = validate_message("op", &ModifyMessage::new("")).unwrap_err();
        assert_eq!(
            first_response(&err),
            &ErrorResponse::field("message", "Message field cannot be blank.")
        );
        assert_eq!(err.op(), "op");
    }

    #[test]
    fn test_rejects_message_over_limit() {
        let msg = "m".repeat(MAX_MESSAGE_CHAR_LENGTH + 1);
        let err = validate_message("op", &ModifyMessage::new(msg)).unwrap_err();
        assert_eq!(
            first_response(&err),
            &ErrorResponse::field("message", "Message cannot be longer than 512 characters.")
        );
    }

    #[test]
    fn test_accepts_message_at_limit() {
        let msg = "m".repeat(MAX_MESSAGE_CHAR_LENGTH);
        assert!(validate_message("op", &ModifyMessage::new(msg)).is_ok());
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 4 bytes each in UTF-8
        let msg = "\u{1F600}".repeat(MAX_MESSAGE_CHAR_LENGTH);
        assert!(validate_message("op", &ModifyMessage::new(msg)).is_ok());

        let msg = "\u{00e9}".repeat(MAX_MESSAGE_CHAR_LENGTH + 1);
        assert!(validate_message("op", &ModifyMessage::new(msg)).is_err());
    }
}
