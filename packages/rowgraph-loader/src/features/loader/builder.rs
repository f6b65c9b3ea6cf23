// Loader Builder
//
// Declarative description of a load: the main entity, the relations
// between entities, and how resolved objects are attached. Definition
// errors do not panic; the first one is kept and returned by build().

use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::debug;

use crate::config::{LoaderConfig, Validatable};
use crate::errors::{LoaderError, Result};
use crate::features::entity::{Entity, ErasedEntity, Shared};
use crate::features::loader::reducer::Loader;
use crate::features::relation::{
    Arity, ErasedRelation, PairExtractor, Relation, RelationShape, Setter,
};
use crate::shared::models::{IdPair, Row};

/// Table qualifier of a column (`book.author_id` -> `book`)
fn qualifier(column: &str) -> Option<&str> {
    column.rsplit_once('.').map(|(table, _)| table)
}

/// Table an entity reads its columns from
fn table_of<T>(entity: &Entity<T>) -> &str {
    qualifier(entity.primary_key()).unwrap_or(entity.name())
}

// ============================================================
// LoaderBuilder
// ============================================================

/// Builder returned by [`Loader::of`]
pub struct LoaderBuilder<T> {
    main: Entity<T>,
    entities: Vec<Arc<dyn ErasedEntity>>,
    relations: Vec<Arc<dyn ErasedRelation>>,
    config: LoaderConfig,
    error: Option<LoaderError>,
}

impl<T: Send + Sync + 'static> LoaderBuilder<T> {
    pub(crate) fn new(main: &Entity<T>) -> Self {
        let mut builder = Self {
            main: main.clone(),
            entities: Vec::new(),
            relations: Vec::new(),
            config: LoaderConfig::default(),
            error: None,
        };
        builder.add_entity(main);
        builder
    }

    /// Describe a relation between `left` and `right`
    ///
    /// Both entities take part in the load from now on.
    pub fn relation<L, R>(mut self, left: &Entity<L>, right: &Entity<R>) -> RelationBuilder<T, L, R>
    where
        L: Send + Sync + 'static,
        R: Send + Sync + 'static,
    {
        self.add_entity(left);
        self.add_entity(right);
        RelationBuilder::new(self, left.clone(), right.clone())
    }

    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Loader<T>> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Validatable::validate(&self.config)?;

        debug!(
            "Built loader for {}: {} entities, {} relations, {}",
            self.main,
            self.entities.len(),
            self.relations.len(),
            self.config.describe()
        );
        Ok(Loader {
            main: self.main,
            entities: self.entities,
            relations: self.relations,
            config: self.config,
            pool: OnceCell::new(),
        })
    }

    fn add_entity<E: Send + Sync + 'static>(&mut self, entity: &Entity<E>) {
        if self.entities.iter().any(|e| e.key() == entity.key()) {
            return;
        }
        if let Some(existing) = self
            .entities
            .iter()
            .find(|e| e.primary_key() == entity.primary_key())
        {
            let err = LoaderError::configuration(format!(
                "Distinct entities cannot refer to the same primary key: {} and {} both use {}",
                existing.name(),
                entity.name(),
                entity.primary_key()
            ));
            self.fail(err);
            return;
        }
        self.entities.push(Arc::new(entity.clone()));
    }

    fn fail(&mut self, err: LoaderError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

// ============================================================
// RelationBuilder
// ============================================================

/// Describes one relation; finish it with [`and`](Self::and) or [`build`](Self::build)
pub struct RelationBuilder<T, L, R> {
    builder: LoaderBuilder<T>,
    left: Entity<L>,
    right: Entity<R>,
    shape: Option<RelationShape>,
    left_setter: Option<Setter<L, R>>,
    right_setter: Option<Setter<R, L>>,
    extractor: Option<Arc<PairExtractor>>,
}

impl<T, L, R> RelationBuilder<T, L, R>
where
    T: Send + Sync + 'static,
    L: Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    fn new(builder: LoaderBuilder<T>, left: Entity<L>, right: Entity<R>) -> Self {
        Self {
            builder,
            left,
            right,
            shape: None,
            left_setter: None,
            right_setter: None,
            extractor: None,
        }
    }

    /// Shorthand for `.and().config(config)`, keeping this relation open
    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.builder.config = config;
        self
    }

    /// Shorthand for `.and().build()`
    pub fn build(self) -> Result<Loader<T>> {
        self.and().build()
    }

    /// Finish this relation and return to the loader builder
    pub fn and(mut self) -> LoaderBuilder<T> {
        if self.builder.error.is_some() {
            return self.builder;
        }

        let Some(shape) = self.shape.take() else {
            let err = LoaderError::configuration(format!(
                "Relationship type between {} and {} was never set",
                self.left, self.right
            ));
            self.builder.fail(err);
            return self.builder;
        };
        if self.left_setter.is_none() && self.right_setter.is_none() {
            let err = LoaderError::configuration(format!(
                "Relationship between {} and {} has no setters",
                self.left, self.right
            ));
            self.builder.fail(err);
            return self.builder;
        }

        let relation = Relation::new(
            self.left,
            self.right,
            shape,
            self.left_setter,
            self.right_setter,
            self.extractor,
        );
        self.builder.relations.push(Arc::new(relation));
        self.builder
    }

    // ------------------------------------------------------------
    // Relation type
    // ------------------------------------------------------------

    /// `fk` is a not-null foreign key of a one-to-many relation
    pub fn one_to_many(self, fk: &str) -> Self {
        self.set_foreign_key(fk, Arity::Many, Arity::One)
    }

    /// `fk` is a nullable foreign key of a one-to-many relation
    pub fn zero_or_one_to_many(self, fk: &str) -> Self {
        self.set_foreign_key(fk, Arity::Many, Arity::ZeroOrOne)
    }

    /// `fk` is a not-null foreign key of a one-to-one relation
    pub fn one_to_one(self, fk: &str) -> Self {
        self.set_foreign_key(fk, Arity::One, Arity::One)
    }

    /// `fk` is a not-null foreign key of an optional one-to-one relation
    pub fn one_to_zero_or_one(self, fk: &str) -> Self {
        self.set_foreign_key(fk, Arity::ZeroOrOne, Arity::One)
    }

    /// `fk` is a nullable foreign key of a one-to-one relation
    pub fn optional_one_to_one(self, fk: &str) -> Self {
        self.set_foreign_key(fk, Arity::ZeroOrOne, Arity::ZeroOrOne)
    }

    /// Link-table relation: `left_fk` references the left entity, `right_fk` the right one
    pub fn many_to_many(mut self, left_fk: &str, right_fk: &str) -> Self {
        match (qualifier(left_fk), qualifier(right_fk)) {
            (Some(a), Some(b)) if a == b => {}
            _ => {
                let err = LoaderError::configuration(format!(
                    "Fields defining a many-to-many relation should come from the same table: {} and {}",
                    left_fk, right_fk
                ));
                self.builder.fail(err);
                return self;
            }
        }
        self.set_shape(RelationShape {
            left_key: Arc::from(left_fk),
            right_key: Arc::from(right_fk),
            left_arity: Arity::Many,
            right_arity: Arity::Many,
        })
    }

    // The qualifier of `fk` names the referencing side; the other side is
    // the referenced one.
    fn set_foreign_key(mut self, fk: &str, referent: Arity, referenced: Arity) -> Self {
        let left_table = table_of(&self.left);
        let right_table = table_of(&self.right);

        let shape = match qualifier(fk) {
            Some(table) if table == right_table || table == left_table => {
                if table == left_table {
                    RelationShape {
                        left_key: Arc::from(self.left.primary_key()),
                        right_key: Arc::from(fk),
                        left_arity: referent,
                        right_arity: referenced,
                    }
                } else {
                    RelationShape {
                        left_key: Arc::from(fk),
                        right_key: Arc::from(self.right.primary_key()),
                        left_arity: referenced,
                        right_arity: referent,
                    }
                }
            }
            _ => {
                let err = LoaderError::configuration(format!(
                    "Foreign key {} should be a field of {} or {}",
                    fk, left_table, right_table
                ));
                self.builder.fail(err);
                return self;
            }
        };
        self.set_shape(shape)
    }

    fn set_shape(mut self, shape: RelationShape) -> Self {
        if self.shape.is_some() {
            let err = LoaderError::configuration(format!(
                "Relationship type between {} and {} already set",
                self.left, self.right
            ));
            self.builder.fail(err);
            return self;
        }
        self.shape = Some(shape);
        self
    }

    // ------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------

    /// Setter for the left side of a *-to-one relation
    pub fn set_one_left<F>(mut self, setter: F) -> Self
    where
        F: Fn(&mut L, Shared<R>) + Send + Sync + 'static,
    {
        if self.expect_arity("Right", |s| s.right_arity, Arity::One) {
            self.left_setter = Some(Setter::One(Arc::new(setter)));
        }
        self
    }

    /// Setter for the right side of a one-to-* relation
    pub fn set_one_right<F>(mut self, setter: F) -> Self
    where
        F: Fn(&mut R, Shared<L>) + Send + Sync + 'static,
    {
        if self.expect_arity("Left", |s| s.left_arity, Arity::One) {
            self.right_setter = Some(Setter::One(Arc::new(setter)));
        }
        self
    }

    /// Setter for the left side of a *-to-zero-or-one relation
    pub fn set_zero_or_one_left<F>(mut self, setter: F) -> Self
    where
        F: Fn(&mut L, Option<Shared<R>>) + Send + Sync + 'static,
    {
        if self.expect_arity("Right", |s| s.right_arity, Arity::ZeroOrOne) {
            self.left_setter = Some(Setter::ZeroOrOne(Arc::new(setter)));
        }
        self
    }

    /// Setter for the right side of a zero-or-one-to-* relation
    pub fn set_zero_or_one_right<F>(mut self, setter: F) -> Self
    where
        F: Fn(&mut R, Option<Shared<L>>) + Send + Sync + 'static,
    {
        if self.expect_arity("Left", |s| s.left_arity, Arity::ZeroOrOne) {
            self.right_setter = Some(Setter::ZeroOrOne(Arc::new(setter)));
        }
        self
    }

    /// Setter for the left side of a *-to-many relation
    pub fn set_many_left<F>(mut self, setter: F) -> Self
    where
        F: Fn(&mut L, Vec<Shared<R>>) + Send + Sync + 'static,
    {
        if self.expect_arity("Right", |s| s.right_arity, Arity::Many) {
            self.left_setter = Some(Setter::Many(Arc::new(setter)));
        }
        self
    }

    /// Setter for the right side of a many-to-* relation
    pub fn set_many_right<F>(mut self, setter: F) -> Self
    where
        F: Fn(&mut R, Vec<Shared<L>>) + Send + Sync + 'static,
    {
        if self.expect_arity("Left", |s| s.left_arity, Arity::Many) {
            self.right_setter = Some(Setter::Many(Arc::new(setter)));
        }
        self
    }

    /// Identify relation pairs with `extractor` instead of the key columns
    pub fn set_relation_loader<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&dyn Row) -> Result<Vec<IdPair>> + Send + Sync + 'static,
    {
        self.extractor = Some(Arc::new(extractor));
        self
    }

    fn expect_arity(
        &mut self,
        side: &str,
        arity: fn(&RelationShape) -> Arity,
        expected: Arity,
    ) -> bool {
        let actual = self.shape.as_ref().map(arity);
        if actual == Some(expected) {
            return true;
        }

        let actual = actual.map_or_else(|| "not set".to_string(), |a| a.to_string());
        let err = LoaderError::configuration(format!(
            "{} arity of relationship between {} and {} is {}, expected {}",
            side, self.left, self.right, actual, expected
        ));
        self.builder.fail(err);
        false
    }
}
