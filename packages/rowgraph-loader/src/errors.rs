//! Error types for rowgraph-loader
//!
//! Every failure is fatal to the whole load: there is no partial result.

use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;

/// Loader error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid loader definition (detected while building the loader)
    Configuration,
    /// A ONE / ZERO_OR_ONE side resolved to the wrong number of objects
    Cardinality,
    /// Key extraction or object construction failed for a row
    RowConstruction,
    /// A relation pair references an object that no row constructed
    MissingObject,
    /// A stored object does not have the type of its entity
    TypeMismatch,
    /// Serialization/deserialization errors
    Serialization,
    /// Dedicated rayon pool could not be created
    ThreadPool,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Cardinality => "cardinality",
            ErrorKind::RowConstruction => "row_construction",
            ErrorKind::MissingObject => "missing_object",
            ErrorKind::TypeMismatch => "type_mismatch",
            ErrorKind::Serialization => "serialization",
            ErrorKind::ThreadPool => "thread_pool",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Loader error type
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct LoaderError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl LoaderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn cardinality(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cardinality, message)
    }

    pub fn row_construction(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RowConstruction, message)
    }

    pub fn missing_object(relation: impl fmt::Display, entity: &str, id: i64) -> Self {
        Self::new(
            ErrorKind::MissingObject,
            format!(
                "{} references {} {}, but no row provided that object",
                relation, entity, id
            ),
        )
    }

    pub fn type_mismatch(entity: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("Object stored for entity {} has an unexpected type", entity),
        )
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    pub fn is_cardinality(&self) -> bool {
        self.kind == ErrorKind::Cardinality
    }
}

// JSON error conversions
impl From<serde_json::Error> for LoaderError {
    fn from(err: serde_json::Error) -> Self {
        LoaderError::serialization(format!("JSON error: {}", err)).with_source(err)
    }
}

impl From<rayon::ThreadPoolBuildError> for LoaderError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        LoaderError::new(ErrorKind::ThreadPool, format!("Thread pool error: {}", err))
            .with_source(err)
    }
}

impl From<ConfigError> for LoaderError {
    fn from(err: ConfigError) -> Self {
        LoaderError::configuration(err.to_string()).with_source(err)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, LoaderError>;
