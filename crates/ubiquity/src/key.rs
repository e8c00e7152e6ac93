//! The composite identity of a mapping request.
//!
//! A [`TypePairKey`] names an ordered `(source type, target type)` pair and is
//! the key of the routine cache. Its hash is computed once at construction,
//! since a key is hashed on every cache lookup.

use std::hash::{Hash, Hasher};

use fxhash::FxHasher64;

use crate::descriptor::TypeHandle;

/// Written in place of a type identity for an absent component.
const ABSENT_SENTINEL: u64 = 0x9E37_79B9_7F4A_7C15;

/// An ordered pair of type handles with a precomputed hash.
///
/// Two keys are equal when both components are the same interned handle, in
/// the same order: `(A, B)` and `(B, A)` are different keys unless `A` is `B`.
/// Absent components are allowed and compare equal to each other.
#[derive(Clone)]
pub struct TypePairKey {
    source: Option<TypeHandle>,
    target: Option<TypeHandle>,
    hash: u64,
}

impl TypePairKey {
    /// Creates a key for mapping `source` into `target`.
    #[must_use]
    pub fn new(source: TypeHandle, target: TypeHandle) -> Self {
        Self::from_parts(Some(source), Some(target))
    }

    /// Creates a key whose components may be absent.
    #[must_use]
    pub fn from_parts(
        source: Option<TypeHandle>,
        target: Option<TypeHandle>,
    ) -> Self {
        let mut hasher = FxHasher64::default();
        hash_component(source.as_ref(), &mut hasher);
        hash_component(target.as_ref(), &mut hasher);

        Self { source, target, hash: hasher.finish() }
    }

    /// The source type.
    #[must_use]
    pub const fn source(&self) -> Option<&TypeHandle> { self.source.as_ref() }

    /// The target type.
    #[must_use]
    pub const fn target(&self) -> Option<&TypeHandle> { self.target.as_ref() }

    /// The name of the source type, or `"<absent>"`.
    #[must_use]
    pub fn source_name(&self) -> &'static str { component_name(&self.source) }

    /// The name of the target type, or `"<absent>"`.
    #[must_use]
    pub fn target_name(&self) -> &'static str { component_name(&self.target) }

    /// The precomputed hash.
    #[must_use]
    pub const fn hash_value(&self) -> u64 { self.hash }
}

fn hash_component(component: Option<&TypeHandle>, hasher: &mut FxHasher64) {
    match component {
        Some(handle) => handle.described_type_id().hash(hasher),
        None => hasher.write_u64(ABSENT_SENTINEL),
    }
}

fn component_name(component: &Option<TypeHandle>) -> &'static str {
    component.as_ref().map_or("<absent>", |handle| handle.name())
}

impl PartialEq for TypePairKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
            && self.source == other.source
            && self.target == other.target
    }
}

impl Eq for TypePairKey {}

impl Hash for TypePairKey {
    fn hash<H: Hasher>(&self, state: &mut H) { state.write_u64(self.hash); }
}

impl std::fmt::Debug for TypePairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.source_name(), self.target_name())
    }
}

#[cfg(test)]
mod test;
