//! Error types surfaced by the mapper.
//!
//! Every error is synchronous and returned to the immediate caller. The mapper
//! never retries: routine builds are deterministic functions of the type
//! shapes, so a retry would reproduce the same error.
//!
//! Unmatched and incompatible properties are not errors; they are dropped from
//! the property plan.

use crate::key::TypePairKey;

/// The source instance handed to the mapper is absent.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    thiserror::Error,
)]
#[error("source instance is absent")]
pub struct NullSourceError;

/// The target type cannot be instantiated by the mapper.
///
/// Raised for types derived with `#[mappable(no_constructor)]` when a new
/// instance is required, either as the top-level target or as a nested one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("type `{type_name}` has no constructor and cannot be instantiated")]
pub struct ConstructionError {
    type_name: &'static str,
}

impl ConstructionError {
    /// Creates an error for the given type name.
    #[must_use]
    pub const fn new(type_name: &'static str) -> Self { Self { type_name } }

    /// The name of the type that could not be instantiated.
    #[must_use]
    pub const fn type_name(&self) -> &'static str { self.type_name }
}

/// A routine build required itself while
/// [`CyclePolicy::FailFast`](crate::CyclePolicy::FailFast) is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error(
    "cyclic type graph detected while building routine `{source_type} -> \
     {target_type}`"
)]
pub struct CyclicTypeError {
    source_type: &'static str,
    target_type: &'static str,
}

impl CyclicTypeError {
    /// Creates an error for the routine of the given key.
    #[must_use]
    pub fn new(key: &TypePairKey) -> Self {
        Self {
            source_type: key.source_name(),
            target_type: key.target_name(),
        }
    }

    /// The source type of the routine that required itself.
    #[must_use]
    pub const fn source_type(&self) -> &'static str { self.source_type }

    /// The target type of the routine that required itself.
    #[must_use]
    pub const fn target_type(&self) -> &'static str { self.target_type }
}

/// A type-erased accessor or routine received an instance of the wrong type.
///
/// The typed entry points of the [`Mapper`](crate::Mapper) never produce this
/// error; it guards the erased API ([`Routine`](crate::routine::Routine) and
/// [`Mapper::map_dyn`](crate::Mapper::map_dyn)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("expected an instance of `{expected}`")]
pub struct TypeMismatchError {
    expected: &'static str,
}

impl TypeMismatchError {
    /// Creates an error naming the expected type.
    #[must_use]
    pub const fn new(expected: &'static str) -> Self { Self { expected } }

    /// The name of the expected type.
    #[must_use]
    pub const fn expected(&self) -> &'static str { self.expected }
}

/// Any error raised while mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[allow(missing_docs)]
pub enum MapError {
    #[error(transparent)]
    NullSource(#[from] NullSourceError),

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    CyclicType(#[from] CyclicTypeError),

    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatchError),
}
