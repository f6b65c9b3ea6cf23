// Entity Descriptor
//
// Names one class of objects by its primary-key column and knows how to
// construct an object from a row. The loader calls `load` at most once per
// identity; later rows with the same identity are redundant fan-out.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::errors::{LoaderError, Result};
use crate::shared::models::{Id, Row};

/// Handle to a loaded object
///
/// Relation setters run after construction, so every object lives behind a
/// lock that the linking phase can write through.
pub type Shared<T> = Arc<RwLock<T>>;

/// Type-erased object slot; always an `RwLock<T>` of the owning entity's `T`
pub(crate) type AnyObject = Arc<dyn Any + Send + Sync>;

type Constructor<T> = dyn Fn(&dyn Row) -> Result<T> + Send + Sync;

static NEXT_ENTITY_KEY: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an entity descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(u64);

impl EntityKey {
    fn next() -> Self {
        Self(NEXT_ENTITY_KEY.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Qualify `column` with `name` unless it already carries a qualifier
pub(crate) fn qualify(name: &str, column: &str) -> String {
    if column.contains('.') {
        column.to_string()
    } else {
        format!("{}.{}", name, column)
    }
}

/// Mapping of one entity (table) to objects of type `T`
///
/// Clones share the same [`EntityKey`] and therefore describe the same entity.
pub struct Entity<T> {
    key: EntityKey,
    name: Arc<str>,
    primary_key: Arc<str>,
    construct: Arc<Constructor<T>>,
}

impl<T> Clone for Entity<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            name: Arc::clone(&self.name),
            primary_key: Arc::clone(&self.primary_key),
            construct: Arc::clone(&self.construct),
        }
    }
}

impl<T> fmt::Debug for Entity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("primary_key", &self.primary_key)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for Entity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl<T> Entity<T> {
    pub fn key(&self) -> EntityKey {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }
}

impl<T: Send + Sync + 'static> Entity<T> {
    /// Create an entity with an explicit constructor
    ///
    /// An unqualified `primary_key` is qualified with `name`.
    pub fn new<F>(name: impl AsRef<str>, primary_key: impl AsRef<str>, construct: F) -> Self
    where
        F: Fn(&dyn Row) -> Result<T> + Send + Sync + 'static,
    {
        let name = name.as_ref();
        Self {
            key: EntityKey::next(),
            name: Arc::from(name),
            primary_key: Arc::from(qualify(name, primary_key.as_ref())),
            construct: Arc::new(construct),
        }
    }

    /// Identity carried by `row`, `None` when the primary key is null or absent
    pub fn id_of(&self, row: &dyn Row) -> Result<Option<Id>> {
        row.id(&self.primary_key)
    }

    /// Construct a fresh object from `row`
    pub fn load(&self, row: &dyn Row) -> Result<T> {
        (self.construct)(row)
    }
}

impl<T: DeserializeOwned + Send + Sync + 'static> Entity<T> {
    /// Create an entity whose objects are deserialized from the row's
    /// `<name>.*` columns (qualifier stripped)
    pub fn deserialize(name: impl AsRef<str>, primary_key: impl AsRef<str>) -> Self {
        let prefix = format!("{}.", name.as_ref());
        Self::new(name, primary_key, move |row| deserialize_from_row(row, &prefix))
    }
}

fn deserialize_from_row<T: DeserializeOwned>(row: &dyn Row, prefix: &str) -> Result<T> {
    let mut fields = serde_json::Map::new();
    for column in row.columns() {
        if let (Some(field), Some(value)) = (column.strip_prefix(prefix), row.get(column)) {
            fields.insert(field.to_string(), value.to_json());
        }
    }

    serde_json::from_value(serde_json::Value::Object(fields)).map_err(|e| {
        LoaderError::row_construction(format!(
            "Cannot construct {} from row: {}",
            prefix.trim_end_matches('.'),
            e
        ))
        .with_source(e)
    })
}

/// Object-safe view of an entity used by the loader
pub(crate) trait ErasedEntity: Send + Sync {
    fn key(&self) -> EntityKey;
    fn name(&self) -> &str;
    fn primary_key(&self) -> &str;
    fn id_of(&self, row: &dyn Row) -> Result<Option<Id>>;
    fn construct(&self, row: &dyn Row) -> Result<AnyObject>;
}

impl<T: Send + Sync + 'static> ErasedEntity for Entity<T> {
    fn key(&self) -> EntityKey {
        self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    fn id_of(&self, row: &dyn Row) -> Result<Option<Id>> {
        row.id(&self.primary_key)
    }

    fn construct(&self, row: &dyn Row) -> Result<AnyObject> {
        let object: AnyObject = Arc::new(RwLock::new(self.load(row)?));
        Ok(object)
    }
}

/// Recover the typed handle from an erased slot
pub(crate) fn downcast<T: Send + Sync + 'static>(
    object: &AnyObject,
    entity: &str,
) -> Result<Shared<T>> {
    Arc::clone(object)
        .downcast::<RwLock<T>>()
        .map_err(|_| LoaderError::type_mismatch(entity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::shared::models::{MapRow, Value};
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Foo {
        id: i64,
        foo: i64,
        label: Option<String>,
    }

    #[test]
    fn test_getters() {
        let entity = Entity::<Foo>::deserialize("foo", "id");
        assert_eq!(entity.name(), "foo");
        assert_eq!(entity.primary_key(), "foo.id");
        assert_eq!(entity.to_string(), "foo");

        let qualified = Entity::<Foo>::deserialize("bar", "bar.id");
        assert_eq!(qualified.primary_key(), "bar.id");
        assert_ne!(entity.key(), qualified.key());
        assert_eq!(entity.key(), entity.clone().key());
    }

    #[test]
    fn test_accessors_need_no_bounds() {
        fn describe<T>(entity: &Entity<T>) -> (EntityKey, String) {
            (entity.key(), format!("{} {}", entity.name(), entity.primary_key()))
        }

        let entity = Entity::<Foo>::deserialize("foo", "id");
        assert_eq!(describe(&entity), (entity.key(), "foo foo.id".to_string()));
    }

    #[test]
    fn test_load_deserializes_own_columns() {
        let entity = Entity::<Foo>::deserialize("foo", "id");
        let row = MapRow::new()
            .with("foo.id", 1)
            .with("foo.foo", 2)
            .with("foo.label", Value::Null)
            .with("bar.id", 99);

        assert_eq!(entity.id_of(&row).unwrap(), Some(1));
        assert_eq!(
            entity.load(&row).unwrap(),
            Foo {
                id: 1,
                foo: 2,
                label: None
            }
        );
    }

    #[test]
    fn test_load_aliased_entity() {
        // Same struct, second alias of the same table in one join
        let alias = Entity::<Foo>::deserialize("bar", "id");
        let row = MapRow::new()
            .with("foo.id", 1)
            .with("foo.foo", 2)
            .with("bar.id", 3)
            .with("bar.foo", 4)
            .with("bar.label", "x");

        let loaded = alias.load(&row).unwrap();
        assert_eq!(loaded.id, 3);
        assert_eq!(loaded.label.as_deref(), Some("x"));
    }

    #[test]
    fn test_load_wrong_columns_fails() {
        let entity = Entity::<Foo>::deserialize("foo", "id");
        let row = MapRow::new().with("bar.id", 1).with("bar.foo", 1);

        let err = entity.load(&row).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RowConstruction);
        assert!(err.message.contains("foo"));
    }

    #[test]
    fn test_custom_constructor() {
        let entity = Entity::new("foo", "id", |row: &dyn Row| {
            Ok(row.id("foo.id")?.unwrap_or_default() * 10)
        });
        let row = MapRow::new().with("foo.id", 4);
        assert_eq!(entity.load(&row).unwrap(), 40);
    }

    #[test]
    fn test_erased_round_trip() {
        let entity = Entity::new("foo", "id", |_row: &dyn Row| Ok(String::from("x")));
        let row = MapRow::new().with("foo.id", 1);

        let erased: &dyn ErasedEntity = &entity;
        let object = erased.construct(&row).unwrap();

        let typed = downcast::<String>(&object, "foo").unwrap();
        assert_eq!(typed.read().as_str(), "x");

        let err = downcast::<i64>(&object, "foo").unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
    }
}
