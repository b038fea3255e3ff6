use fjall::UserValue;
use std::error::Error;
use tally::common::Document;
use tally::errors::{ErrorKind, TallyError};
use thiserror::Error;

/// Error type for counter record encoding in the Fjall adapter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FjallValueError {
    /// Deserialization of binary data failed
    #[error("Deserialization failed: {0}")]
    DeserializationError(String),
    /// Serialization of a document failed
    #[error("Serialization failed: {0}")]
    SerializationError(String),
    /// A partition key is not a valid UTF-8 sequence name
    #[error("Invalid UTF-8 in counter key: {0}")]
    InvalidUtf8(String),
}

impl From<FjallValueError> for TallyError {
    fn from(err: FjallValueError) -> Self {
        TallyError::new(&err.to_string(), ErrorKind::EncodingError)
    }
}

pub type FjallValueResult<T> = Result<T, FjallValueError>;

/// Byte form of a counter document as stored in the counters partition.
///
/// Documents are encoded with bincode's serde mode and legacy configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FjallValue(Vec<u8>);

impl FjallValue {
    #[inline]
    pub fn try_from_document(document: &Document) -> FjallValueResult<FjallValue> {
        bincode::serde::encode_to_vec(document, bincode::config::legacy())
            .map(FjallValue)
            .map_err(|e| FjallValueError::SerializationError(e.to_string()))
    }

    #[inline]
    pub fn try_into_document(self) -> FjallValueResult<Document> {
        bincode::serde::decode_from_slice(&self.0, bincode::config::legacy())
            .map(|(document, _)| document)
            .map_err(|e| FjallValueError::DeserializationError(e.to_string()))
    }
}

impl From<&UserValue> for FjallValue {
    #[inline]
    fn from(value: &UserValue) -> Self {
        FjallValue(value.to_vec())
    }
}

impl From<FjallValue> for UserValue {
    #[inline]
    fn from(val: FjallValue) -> Self {
        UserValue::from(val.0)
    }
}

impl AsRef<[u8]> for FjallValue {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Reads a sequence name back from a partition key.
pub(crate) fn decode_name(key: &[u8]) -> FjallValueResult<String> {
    String::from_utf8(key.to_vec()).map_err(|e| FjallValueError::InvalidUtf8(e.to_string()))
}

/// Converts Fjall backend errors to tally errors.
///
/// Errors mentioning a closed keyspace map to `StoreAlreadyClosed`, everything else to
/// `BackendError`.
pub(crate) fn to_tally_error(error: impl Error) -> TallyError {
    let error_msg = error.to_string();
    let error_kind = if error_msg.contains("closed") {
        ErrorKind::StoreAlreadyClosed
    } else {
        ErrorKind::BackendError
    };
    TallyError::new(&format!("Fjall Error: {}", error_msg), error_kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally::counter::Counter;
    use tally::doc;

    #[test]
    fn counter_document_survives_encoding() {
        let document = Counter::with_seq("cities", 42).to_document();
        let encoded = FjallValue::try_from_document(&document).unwrap();
        let decoded = encoded.try_into_document().unwrap();
        assert_eq!(Counter::from_document(&decoded).unwrap().seq(), 42);
    }

    #[test]
    fn user_value_conversion_keeps_bytes() {
        let encoded = FjallValue::try_from_document(&doc! { name: "cities", seq: 1 }).unwrap();
        let user_value: UserValue = encoded.clone().into();
        assert_eq!(FjallValue::from(&user_value), encoded);
    }

    #[test]
    fn corrupted_bytes_fail_to_decode() {
        let corrupted = FjallValue(vec![0xFF, 0xFF, 0xFF, 0xFF]);
        let err = corrupted.try_into_document().unwrap_err();
        assert!(matches!(err, FjallValueError::DeserializationError(_)));
        assert!(err.to_string().contains("Deserialization failed"));
    }

    #[test]
    fn empty_bytes_fail_to_decode() {
        let empty = FjallValue(vec![]);
        assert!(matches!(
            empty.try_into_document(),
            Err(FjallValueError::DeserializationError(_))
        ));
    }

    #[test]
    fn value_error_converts_to_encoding_error() {
        let err: TallyError = FjallValueError::SerializationError("boom".to_string()).into();
        assert_eq!(err.kind(), &ErrorKind::EncodingError);
        assert_eq!(err.message(), "Serialization failed: boom");
    }

    #[test]
    fn decode_name_rejects_invalid_utf8() {
        assert_eq!(decode_name(b"cities").unwrap(), "cities");
        assert!(matches!(
            decode_name(&[0xC3, 0x28]),
            Err(FjallValueError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn backend_errors_map_by_message() {
        let closed = std::io::Error::other("keyspace is closed");
        assert_eq!(to_tally_error(closed).kind(), &ErrorKind::StoreAlreadyClosed);
        let other = std::io::Error::other("disk detached");
        let err = to_tally_error(other);
        assert_eq!(err.kind(), &ErrorKind::BackendError);
        assert!(err.message().starts_with("Fjall Error:"));
    }
}
