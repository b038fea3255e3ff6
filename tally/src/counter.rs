use crate::common::{Document, Value, COUNTER_NAME_FIELD, COUNTER_SEQ_FIELD};
use crate::errors::{ErrorKind, TallyError, TallyResult};

/// The current value of one named sequence.
///
/// `seq` is the last value issued for `name`; a freshly provisioned counter starts at `0`,
/// so its first allocation yields `1`. Stores persist counters as documents
/// `{ "name": <name>, "seq": <seq> }` through [Counter::to_document] and
/// [Counter::from_document].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Counter {
    name: String,
    seq: u64,
}

impl Counter {
    /// A counter that has not issued any value yet.
    pub fn new(name: &str) -> Self {
        Counter {
            name: name.to_string(),
            seq: 0,
        }
    }

    pub fn with_seq(name: &str, seq: u64) -> Self {
        Counter {
            name: name.to_string(),
            seq,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns the counter advanced by one, or [ErrorKind::SequenceOverflow] at `u64::MAX`.
    pub fn incremented(&self) -> TallyResult<Counter> {
        match self.seq.checked_add(1) {
            Some(seq) => Ok(Counter {
                name: self.name.clone(),
                seq,
            }),
            None => Err(TallyError::overflow(&self.name)),
        }
    }

    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        // field names are non-empty constants
        let _ = document.put(COUNTER_NAME_FIELD, self.name.as_str());
        let _ = document.put(COUNTER_SEQ_FIELD, self.seq);
        document
    }

    /// Reads a counter back from its document form.
    ///
    /// Fails with [ErrorKind::EncodingError] if `name` is not a string or `seq` is not a
    /// non-negative integer.
    pub fn from_document(document: &Document) -> TallyResult<Counter> {
        let name = match document.get(COUNTER_NAME_FIELD) {
            Value::String(name) => name,
            other => {
                log::error!("Counter document has an invalid name field: {}", other);
                return Err(TallyError::new(
                    &format!("Counter document has an invalid name field: {}", other),
                    ErrorKind::EncodingError,
                ));
            }
        };

        let seq = match document.get(COUNTER_SEQ_FIELD).as_u64() {
            Some(seq) => seq,
            None => {
                log::error!("Counter document '{}' has an invalid seq field", name);
                return Err(TallyError::new(
                    &format!("Counter document '{}' has an invalid seq field", name),
                    ErrorKind::EncodingError,
                ));
            }
        };

        Ok(Counter { name, seq })
    }
}

/// Validates a sequence name: it must contain at least one non-whitespace character.
pub fn validate_name(name: &str) -> TallyResult<()> {
    if name.trim().is_empty() {
        log::error!("Sequence name cannot be empty");
        return Err(TallyError::new(
            "Sequence name cannot be empty",
            ErrorKind::InvalidName,
        ));
    }
    Ok(())
}
