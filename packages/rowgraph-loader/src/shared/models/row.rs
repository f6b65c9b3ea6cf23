use super::{FastIndexMap, Id, Value};
use crate::errors::{LoaderError, Result};

/// One flat row of a denormalized (joined) result
///
/// Columns are qualified as `<entity>.<column>`, e.g. `book.author_id`.
pub trait Row {
    /// Value of `column`, `None` when the row has no such column
    fn get(&self, column: &str) -> Option<&Value>;

    /// All column names carried by this row
    fn columns(&self) -> Vec<&str>;

    fn is_null(&self, column: &str) -> bool {
        self.get(column).map_or(true, Value::is_null)
    }

    /// Read `column` as an identity; missing and `Null` both yield `None`
    fn id(&self, column: &str) -> Result<Option<Id>> {
        match self.get(column) {
            Some(value) => value.as_id(column),
            None => Ok(None),
        }
    }
}

impl<R: Row + ?Sized> Row for &R {
    fn get(&self, column: &str) -> Option<&Value> {
        (**self).get(column)
    }

    fn columns(&self) -> Vec<&str> {
        (**self).columns()
    }
}

/// In-memory row keeping columns in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapRow {
    values: FastIndexMap<String, Value>,
}

impl MapRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set a column
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build a row from a flat JSON object (`{"author.id": 1, ...}`)
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Object(fields) => fields
                .into_iter()
                .map(|(column, value)| -> Result<(String, Value)> {
                    Ok((column, Value::from_json(value)?))
                })
                .collect(),
            other => Err(LoaderError::serialization(format!(
                "A row must be a JSON object, found {}",
                other
            ))),
        }
    }

    /// Parse a JSON array of flat objects into rows
    pub fn from_json_str(json: &str) -> Result<Vec<Self>> {
        let items: Vec<serde_json::Value> = serde_json::from_str(json)?;
        items.into_iter().map(Self::from_json).collect()
    }
}

impl Row for MapRow {
    fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    fn columns(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }
}

impl FromIterator<(String, Value)> for MapRow {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
