use im::OrdMap;

use crate::common::Value;
use crate::errors::{ErrorKind, TallyError, TallyResult};
use std::borrow::Cow;
use std::fmt::{Display, Formatter};

/// A schema-free record: an ordered mapping from field name to [Value].
///
/// Counters live in the store as documents of the shape `{ "name": <string>, "seq": <u64> }`,
/// and [`crate::sequence::SequenceAllocator::assign_id`] stamps sequence values into caller
/// documents. Fields are kept in key order so two documents with the same content always
/// compare and serialize the same way.
///
/// ## Lock-Free Design
///
/// The fields live in an `im::OrdMap`, so cloning a document is O(1) and mutating a clone
/// never affects the original.
#[derive(Clone, Debug, PartialEq, Default, serde::Deserialize, serde::Serialize)]
pub struct Document {
    data: OrdMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates the specified [Value] with the specified key in this document.
    ///
    /// If the key already exists its value is replaced.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::InvalidOperation] if the key is empty.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let mut doc = Document::new();
    /// doc.put("name", "Santo André")?;
    /// doc.put("population", 710_210)?;
    /// assert_eq!(doc.size(), 2);
    /// ```
    pub fn put<'a, T: Into<Value>>(&mut self, key: impl Into<Cow<'a, str>>, value: T) -> TallyResult<()> {
        let key = key.into();
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(TallyError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        self.data = self.data.update(key.into_owned(), value.into());
        Ok(())
    }

    /// Returns the [Value] associated with `key`, or [Value::Null] if the document
    /// has no such field.
    pub fn get(&self, key: &str) -> Value {
        self.data.get(key).cloned().unwrap_or(Value::Null)
    }

    /// Removes a field and returns its previous value, if any.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Field names in ascending order.
    pub fn keys(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " \"{}\": {}", key, value)?;
        }
        if !self.data.is_empty() {
            write!(f, " ")?;
        }
        write!(f, "}}")
    }
}

/// Strips the surrounding quotes `stringify!` leaves on string-literal keys.
#[doc(hidden)]
pub fn normalize(key: &str) -> String {
    key.trim_matches('"').to_string()
}

/// Creates a [Document] from `key: value` pairs.
///
/// Keys may be bare identifiers or string literals. Values may be expressions,
/// nested `{ ... }` documents or `[ ... ]` arrays.
///
/// ```rust
/// use tally::doc;
///
/// let city = doc! {
///     name: "São Caetano do Sul",
///     population: 158024,
///     hdi: 0.862,
///     "lastCensus": 2015,
/// };
/// assert_eq!(city.size(), 4);
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::common::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            let mut doc = $crate::common::Document::new();
            $(
                doc.put($crate::common::normalize(stringify!($key)), $crate::doc_value!($value))
                    .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the doc! macro.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
