use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::Deref;
use std::sync::Arc;

/// A single user as it appears in the fixture.
///
/// The record is an opaque JSON object; no field is required or interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord(Map<String, Value>);

impl UserRecord {
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Look up a field by name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}

impl TryFrom<Value> for UserRecord {
    type Error = Value;

    /// Accepts only JSON objects and hands any other value back unchanged.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

/// Ordered, read-only list of users shared across requests.
///
/// Cloning is an `Arc` bump; the records themselves are never copied or mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct UserCollection(Arc<[UserRecord]>);

impl UserCollection {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&UserRecord> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UserRecord> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[UserRecord] {
        &self.0
    }

    /// True when both handles point at the same underlying allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for UserCollection {
    type Target = [UserRecord];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<UserRecord>> for UserCollection {
    fn from(records: Vec<UserRecord>) -> Self {
        Self(records.into())
    }
}

impl FromIterator<UserRecord> for UserCollection {
    fn from_iter<I: IntoIterator<Item = UserRecord>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a UserCollection {
    type Item = &'a UserRecord;
    type IntoIter = std::slice::Iter<'a, UserRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
