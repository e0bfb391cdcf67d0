use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),
}

/// Malformed or unresolvable input detected while building the schema arena.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("reference target not found: {reference} (at {location})")]
    RefTargetNotFound { reference: String, location: String },

    #[error("invalid reference format: {reference} (at {location})")]
    InvalidRefFormat { reference: String, location: String },

    #[error("reference chain never reaches a schema: {0}")]
    CircularAlias(String),

    #[error("discriminator on {schema} maps `{key}` to a non-schema target {target}")]
    InvalidDiscriminatorTarget {
        schema: String,
        key: String,
        target: String,
    },
}

/// Two distinct operations resolved to the same name inside one output unit.
#[derive(Debug, Error)]
#[error(
    "operation name `{name}` is used twice in output unit `{unit}`: {first} and {second}"
)]
pub struct NamingCollisionError {
    pub name: String,
    pub unit: String,
    pub first: String,
    pub second: String,
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    NamingCollision(#[from] NamingCollisionError),

    #[error("invalid operation at {location}: {message}")]
    InvalidOperation { location: String, message: String },
}

/// Failure raised by a backend while rendering one output unit.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("unknown backend `{0}`")]
    UnknownBackend(String),

    #[error("template render failed: {0}")]
    Render(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("operation `{operation}`: {source}")]
    Operation {
        operation: String,
        #[source]
        source: Box<GeneratorError>,
    },

    #[error("output unit `{unit}`: {source}")]
    Unit {
        unit: String,
        #[source]
        source: Box<GeneratorError>,
    },
}

impl GeneratorError {
    pub fn for_operation(self, operation: &str) -> Self {
        GeneratorError::Operation {
            operation: operation.to_string(),
            source: Box::new(self),
        }
    }

    pub fn for_unit(self, unit: &str) -> Self {
        GeneratorError::Unit {
            unit: unit.to_string(),
            source: Box::new(self),
        }
    }
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that abort a whole generation run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl From<ResolveError> for PipelineError {
    fn from(err: ResolveError) -> Self {
        PipelineError::Transform(TransformError::Resolve(err))
    }
}

impl From<NamingCollisionError> for PipelineError {
    fn from(err: NamingCollisionError) -> Self {
        PipelineError::Transform(TransformError::NamingCollision(err))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },
}
