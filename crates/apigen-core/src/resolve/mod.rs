//! Schema resolution: component dereferencing, discriminator injection and reachability.

pub mod discriminator;
pub mod reachability;
pub mod refs;
pub mod walk;

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, info};

use crate::error::ResolveError;
use crate::parse::schema::{Schema, SchemaOrRef};
use crate::parse::OpenApiSpec;

pub use reachability::ReachabilitySet;
pub use refs::schema_ref_name;

/// The dereferenced document plus the arena of named schemas.
///
/// Parameter, request-body and response component references are inlined into
/// `spec.paths`. Schema references stay by name and always point into `arena`.
#[derive(Debug, Clone)]
pub struct ResolvedSpec {
    pub spec: OpenApiSpec,
    pub arena: SchemaArena,
}

impl ResolvedSpec {
    pub fn title(&self) -> &str {
        &self.spec.info.title
    }
}

/// Outcome of following a schema reference chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Deref<'a> {
    /// A concrete schema. `name` is the arena entry that holds it, if any.
    Schema {
        name: Option<&'a str>,
        schema: &'a Schema,
    },
    /// The chain reached a name that is already being expanded.
    Cycle(&'a str),
}

/// Named schemas keyed by their component name, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct SchemaArena {
    schemas: IndexMap<String, SchemaOrRef>,
}

impl SchemaArena {
    pub fn new(schemas: IndexMap<String, SchemaOrRef>) -> Self {
        Self { schemas }
    }

    pub fn get(&self, name: &str) -> Option<&SchemaOrRef> {
        self.schemas.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut SchemaOrRef> {
        self.schemas.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SchemaOrRef)> {
        self.schemas.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Follow `schema` through any chain of named aliases to a concrete schema.
    ///
    /// Returns [`Deref::Cycle`] instead of recursing when the chain touches a name in
    /// `in_progress`. Callers expanding a schema graph insert each name they enter.
    pub fn deref<'a>(
        &'a self,
        schema: &'a SchemaOrRef,
        in_progress: &HashSet<String>,
    ) -> Result<Deref<'a>, ResolveError> {
        let mut current = schema;
        let mut current_name: Option<&'a str> = None;
        let mut seen: HashSet<&'a str> = HashSet::new();

        loop {
            match current {
                SchemaOrRef::Schema(schema) => {
                    return Ok(Deref::Schema {
                        name: current_name,
                        schema,
                    });
                }
                SchemaOrRef::Ref { ref_path } => {
                    let name = schema_ref_name(ref_path).ok_or_else(|| {
                        ResolveError::InvalidRefFormat {
                            reference: ref_path.clone(),
                            location: "#/components/schemas".to_string(),
                        }
                    })?;
                    let (key, target) = self.schemas.get_key_value(name.as_str()).ok_or_else(
                        || ResolveError::RefTargetNotFound {
                            reference: ref_path.clone(),
                            location: "#/components/schemas".to_string(),
                        },
                    )?;
                    if in_progress.contains(key.as_str()) {
                        return Ok(Deref::Cycle(key.as_str()));
                    }
                    if !seen.insert(key.as_str()) {
                        return Err(ResolveError::CircularAlias(key.clone()));
                    }
                    current_name = Some(key.as_str());
                    current = target;
                }
            }
        }
    }

    /// Concrete schema stored under `name`, following aliases.
    pub fn concrete(&self, name: &str) -> Result<(&str, &Schema), ResolveError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = name.to_string();
        loop {
            let (key, target) = self.schemas.get_key_value(current.as_str()).ok_or_else(|| {
                ResolveError::RefTargetNotFound {
                    reference: format!("#/components/schemas/{current}"),
                    location: "#/components/schemas".to_string(),
                }
            })?;
            if !seen.insert(key.as_str()) {
                return Err(ResolveError::CircularAlias(key.clone()));
            }
            match target {
                SchemaOrRef::Schema(schema) => return Ok((key.as_str(), schema)),
                SchemaOrRef::Ref { ref_path } => {
                    current = schema_ref_name(ref_path).ok_or_else(|| {
                        ResolveError::InvalidRefFormat {
                            reference: ref_path.clone(),
                            location: "#/components/schemas".to_string(),
                        }
                    })?;
                }
            }
        }
    }
}

/// Resolve a parsed document into a [`ResolvedSpec`].
///
/// Dangling references are reported with the JSON pointer of the offending site.
/// Discriminator mappings are injected into their subtype schemas before returning.
pub fn resolve_spec(spec: &OpenApiSpec) -> Result<ResolvedSpec, ResolveError> {
    let resolver = refs::RefResolver::new(spec);
    let (document, schemas) = resolver.resolve_spec(spec)?;
    let mut arena = SchemaArena::new(schemas);

    // Alias chains that never reach a schema are rejected up front.
    for name in arena.names() {
        arena.concrete(name)?;
    }

    let injected = discriminator::inject_discriminators(&mut arena)?;
    debug!("injected {injected} discriminator properties");
    info!(
        "resolved {} schemas across {} paths",
        arena.len(),
        document.paths.len()
    );

    Ok(ResolvedSpec {
        spec: document,
        arena,
    })
}
