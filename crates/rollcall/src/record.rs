//! Person records stored in the directory.

use serde::{Deserialize, Serialize};

/// A single person entry.
///
/// `name` is the directory key. Records are never updated in place: once a
/// record is stored under a name it stays there for the lifetime of the
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonRecord {
    /// Unique name, used as the directory key
    pub name: String,
    /// Numeric identifier
    pub id: i32,
    /// Contact email
    pub email: String,
}

impl PersonRecord {
    /// Create a new record.
    pub fn new(name: impl Into<String>, id: i32, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id,
            email: email.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_flat_object() {
        let record = PersonRecord::new("Tom", 1, "tom@gmail.com");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Tom", "id": 1, "email": "tom@gmail.com"})
        );
    }
}
