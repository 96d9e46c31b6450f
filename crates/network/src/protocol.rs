//! Response envelope of the race protocol
//!
//! Every response is a JSON object. An object carrying `err` is a failure,
//! optionally qualified by a numeric `code`; anything else is the payload.

use crate::error::{NetworkError, NetworkResult};
use serde::de::{DeserializeOwned, Error as _};
use serde_json::Value;
use std::fmt;

/// Well-known protocol error codes (errno-style)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No such game, player or contract
    NoEntry,
    /// Already exists
    Exists,
    /// Invalid argument
    Invalid,
    /// Any other code
    Other(i64),
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        match code {
            2 => ErrorCode::NoEntry,
            17 => ErrorCode::Exists,
            22 => ErrorCode::Invalid,
            other => ErrorCode::Other(other),
        }
    }
}

impl From<ErrorCode> for i64 {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::NoEntry => 2,
            ErrorCode::Exists => 17,
            ErrorCode::Invalid => 22,
            ErrorCode::Other(other) => other,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", i64::from(*self))
    }
}

/// Parses a response body into a JSON object, failing on `err` documents
pub fn parse_document(body: &str) -> NetworkResult<Value> {
    let document: Value = serde_json::from_str(body)?;
    if !document.is_object() {
        return Err(NetworkError::Decode(serde_json::Error::custom(
            "response is not a JSON object",
        )));
    }
    check_error(&document)?;
    Ok(document)
}

/// Turns an `err`/`code` document into a protocol error
pub fn check_error(document: &Value) -> NetworkResult<()> {
    let Some(err) = document.get("err") else {
        return Ok(());
    };
    let message = match err {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let code = document
        .get("code")
        .and_then(Value::as_i64)
        .map(ErrorCode::from);
    Err(NetworkError::Protocol { message, code })
}

/// Decodes a response body into a typed payload
pub fn decode<T: DeserializeOwned>(body: &str) -> NetworkResult<T> {
    let document = parse_document(body)?;
    Ok(serde_json::from_value(document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ris_core::{GameState, ResultReport};

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(ErrorCode::from(2), ErrorCode::NoEntry);
        assert_eq!(ErrorCode::from(17), ErrorCode::Exists);
        assert_eq!(ErrorCode::from(22), ErrorCode::Invalid);
        assert_eq!(ErrorCode::from(500), ErrorCode::Other(500));
        assert_eq!(i64::from(ErrorCode::Other(500)), 500);
    }

    #[test]
    fn test_err_document_with_code() {
        let err = decode::<GameState>(r#"{"err":"no such player","code":2}"#).unwrap_err();
        assert!(err.is_no_entry());
        assert_eq!(err.to_string(), "Error 2: no such player");
    }

    #[test]
    fn test_err_document_without_code() {
        let err = decode::<GameState>(r#"{"err":"game is full"}"#).unwrap_err();
        match err {
            NetworkError::Protocol { message, code } => {
                assert_eq!(message, "game is full");
                assert_eq!(code, None);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_object_is_decode_error() {
        assert!(matches!(
            parse_document("[1,2,3]"),
            Err(NetworkError::Decode(_))
        ));
        assert!(matches!(
            parse_document("not json"),
            Err(NetworkError::Decode(_))
        ));
    }

    #[test]
    fn test_bad_verdict_is_decode_error() {
        let body = r#"{"bob":{"date":{"year":1,"day":2},"first":"maybe"}}"#;
        assert!(matches!(
            decode::<ResultReport>(body),
            Err(NetworkError::Decode(_))
        ));
    }

    #[test]
    fn test_empty_object_is_an_empty_report() {
        let report = decode::<ResultReport>("{}").unwrap();
        assert!(report.is_empty());
    }
}
